use clap::{Parser, Subcommand};
use imgcascade::cascade::{CascadeSettings, CompressionRequest, build_profiles, classify};
use imgcascade::imaging::{OutputFormat, RustCodec};
use imgcascade::upload::{CompressPreference, PreparedUpload, UploadFile, prepare_upload};
use imgcascade::{config, output};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing_subscriber::EnvFilter;

type TaskError = Box<dyn std::error::Error + Send + Sync>;

/// Shared flags for commands that build a cascade.
#[derive(clap::Args, Clone, Copy)]
struct EncodeArgs {
    /// Target format: jpg, png, webp or avif
    #[arg(long, default_value = "jpg")]
    format: OutputFormat,

    /// Requested quality (1-100); the cascade lowers it for large inputs
    #[arg(long, default_value_t = 85, value_parser = clap::value_parser!(u32).range(1..=100))]
    quality: u32,
}

#[derive(Parser)]
#[command(name = "imgcascade")]
#[command(about = "Adaptive compression cascade for image uploads")]
#[command(long_about = "\
Adaptive compression cascade for image uploads

Each input is encoded through an ordered list of profiles, each smaller and
cheaper than the last:

  primary         requested format, quality capped by input size
  fallback        same format (WebP for PNG), lower quality, smaller bounds
  webp-fallback   WebP, lower quality again
  jpeg-emergency  JPEG, square bound, fastest settings

The first result at least 1% smaller than the input wins. Every attempt runs
under a wall-clock budget; timeouts and failures move on to the next profile.

Server tunables come from IMGCASCADE_* environment variables and an optional
TOML file. Run 'imgcascade gen-config' to print a documented template.")]
#[command(version)]
struct Cli {
    /// TOML file with compression tunables
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compress images through the cascade
    Compress {
        /// Files to compress; non-images are copied unchanged
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        #[command(flatten)]
        encode: EncodeArgs,

        /// Directory the results are written to
        #[arg(long, default_value = "compressed")]
        output_dir: PathBuf,

        /// Maximum number of files compressed at once
        #[arg(long, default_value_t = 4)]
        jobs: usize,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the profiles that would be attempted for a file, without encoding
    Plan {
        input: PathBuf,

        #[command(flatten)]
        encode: EncodeArgs,
    },
    /// Print a stock config file with all options documented
    GenConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Compress {
            inputs,
            encode,
            output_dir,
            jobs,
            json,
        } => {
            let settings = config::load_config(cli.config.as_deref())?.cascade_settings();
            tokio::fs::create_dir_all(&output_dir).await?;
            let failed = compress(inputs, encode, &output_dir, jobs, json, settings).await?;
            if failed > 0 {
                return Err(format!("{failed} input(s) failed").into());
            }
        }
        Command::Plan { input, encode } => {
            let settings = config::load_config(cli.config.as_deref())?.cascade_settings();
            let data = tokio::fs::read(&input).await?;
            let original_size = data.len();
            let request = CompressionRequest::new(data, encode.format, encode.quality, settings);
            output::print_plan(
                &input.display().to_string(),
                original_size,
                classify(&request),
                &build_profiles(&request),
            );
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log to stderr, filtered by `RUST_LOG` (default `warn`).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

struct Compressed {
    original_size: usize,
    written: PathBuf,
    prepared: PreparedUpload,
}

/// Compress every input, at most `jobs` at a time, and report in input order.
///
/// Returns the number of inputs that failed.
async fn compress(
    inputs: Vec<PathBuf>,
    encode: EncodeArgs,
    output_dir: &Path,
    jobs: usize,
    json: bool,
    settings: CascadeSettings,
) -> Result<usize, Box<dyn std::error::Error>> {
    let codec = Arc::new(RustCodec::new());
    let semaphore = Arc::new(Semaphore::new(jobs.max(1)));
    let preference = CompressPreference {
        enabled: true,
        quality: encode.quality,
        format: encode.format,
    };

    let handles: Vec<_> = inputs
        .iter()
        .cloned()
        .map(|input| {
            let codec = Arc::clone(&codec);
            let semaphore = Arc::clone(&semaphore);
            let output_dir = output_dir.to_path_buf();
            tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await?;
                compress_one(codec, input, &output_dir, preference, settings).await
            })
        })
        .collect();

    let mut failed = 0;
    let mut entries = Vec::new();
    for (input, handle) in inputs.iter().zip(handles) {
        let source = input.display().to_string();
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => Err(e.into()),
        };

        match result {
            Ok(done) => {
                if json {
                    entries.push(serde_json::json!({
                        "source": source,
                        "output": done.written.display().to_string(),
                        "mimeType": done.prepared.mime_type,
                        "applied": done.prepared.applied(),
                        "report": done.prepared.compression,
                    }));
                } else {
                    output::print_report(&source, &done.prepared, done.original_size);
                }
            }
            Err(e) => {
                failed += 1;
                tracing::error!(source = %source, error = %e, "input failed");
                if json {
                    entries.push(serde_json::json!({
                        "source": source,
                        "error": e.to_string(),
                    }));
                } else {
                    output::print_failure(&source, &e);
                }
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    }
    Ok(failed)
}

async fn compress_one(
    codec: Arc<RustCodec>,
    input: PathBuf,
    output_dir: &Path,
    preference: CompressPreference,
    settings: CascadeSettings,
) -> Result<Compressed, TaskError> {
    let data = tokio::fs::read(&input).await?;
    let original_size = data.len();
    let filename = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or("input has no file name")?;
    let mime_type = image::ImageFormat::from_path(&input)
        .ok()
        .map(|f| f.to_mime_type().to_string());

    let file = UploadFile {
        filename,
        mime_type,
        data,
    };
    let prepared = prepare_upload(codec, file, &preference, &settings).await?;

    let written = output_dir.join(&prepared.filename);
    tokio::fs::write(&written, &prepared.data).await?;
    tracing::info!(
        source = %input.display(),
        output = %written.display(),
        bytes = prepared.data.len(),
        "wrote result"
    );

    Ok(Compressed {
        original_size,
        written,
        prepared,
    })
}
