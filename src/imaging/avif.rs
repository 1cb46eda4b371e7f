//! AVIF input decoding: avif-parse for the container, rav1d for the AV1
//! payload.
//!
//! `image`'s `avif` feature only encodes; its decoder needs the C library
//! dav1d. rav1d is a pure Rust port of dav1d driven through the same C-style
//! API, so every call below is `unsafe` and every exit path releases what it
//! acquired.
//!
//! Only the primary item's color planes are decoded. Alpha items and
//! `irot`/`imir` transforms are ignored.

use super::codec::CodecError;
use image::DynamicImage;
use rav1d::include::dav1d::data::Dav1dData;
use rav1d::include::dav1d::dav1d::Dav1dSettings;
use rav1d::include::dav1d::headers::{
    DAV1D_PIXEL_LAYOUT_I400, DAV1D_PIXEL_LAYOUT_I420, DAV1D_PIXEL_LAYOUT_I422,
    DAV1D_PIXEL_LAYOUT_I444,
};
use rav1d::include::dav1d::picture::Dav1dPicture;
use rav1d::src::lib as dav1d;
use std::io::Cursor;
use std::ptr::NonNull;

/// Whether `source` is an ISO-BMFF container with the `avif` major brand.
pub(super) fn has_avif_brand(source: &[u8]) -> bool {
    source.get(4..12) == Some(b"ftypavif".as_slice())
}

/// Decode an AVIF upload to RGB8, checking the pixel ceiling against the
/// container metadata before any AV1 data is decoded.
pub(super) fn decode(source: &[u8], pixel_limit: u64) -> Result<DynamicImage, CodecError> {
    let avif = avif_parse::read_avif(&mut Cursor::new(source))
        .map_err(|e| CodecError::Decode(format!("invalid AVIF container: {e:?}")))?;
    let meta = avif
        .primary_item_metadata()
        .map_err(|e| CodecError::Decode(format!("invalid AVIF metadata: {e:?}")))?;

    let (width, height) = (meta.max_frame_width.get(), meta.max_frame_height.get());
    if u64::from(width) * u64::from(height) > pixel_limit {
        return Err(CodecError::PixelLimit {
            width,
            height,
            limit: pixel_limit,
        });
    }

    decode_av1(&avif.primary_item)
}

fn rav1d_err(call: &str, code: i32) -> CodecError {
    CodecError::Decode(format!("rav1d {call} failed ({code})"))
}

/// Run a single AV1 frame through rav1d and convert it to RGB8.
fn decode_av1(av1_bytes: &[u8]) -> Result<DynamicImage, CodecError> {
    let mut settings = std::mem::MaybeUninit::<Dav1dSettings>::uninit();
    unsafe { dav1d::dav1d_default_settings(NonNull::from(&mut settings).cast()) };
    let mut settings = unsafe { settings.assume_init() };
    settings.n_threads = 1;
    settings.max_frame_delay = 1;

    let mut ctx = None;
    let rc = unsafe { dav1d::dav1d_open(NonNull::new(&mut ctx), NonNull::new(&mut settings)) };
    if rc.0 != 0 {
        return Err(rav1d_err("open", rc.0));
    }

    let mut data = Dav1dData::default();
    let buf_ptr = unsafe { dav1d::dav1d_data_create(NonNull::new(&mut data), av1_bytes.len()) };
    if buf_ptr.is_null() {
        unsafe { dav1d::dav1d_close(NonNull::new(&mut ctx)) };
        return Err(CodecError::Decode("rav1d data_create failed".into()));
    }
    unsafe { std::ptr::copy_nonoverlapping(av1_bytes.as_ptr(), buf_ptr, av1_bytes.len()) };

    let rc = unsafe { dav1d::dav1d_send_data(ctx, NonNull::new(&mut data)) };
    if rc.0 != 0 {
        unsafe {
            dav1d::dav1d_data_unref(NonNull::new(&mut data));
            dav1d::dav1d_close(NonNull::new(&mut ctx));
        }
        return Err(rav1d_err("send_data", rc.0));
    }

    let mut pic: Dav1dPicture = unsafe { std::mem::zeroed() };
    let rc = unsafe { dav1d::dav1d_get_picture(ctx, NonNull::new(&mut pic)) };
    if rc.0 != 0 {
        unsafe { dav1d::dav1d_close(NonNull::new(&mut ctx)) };
        return Err(rav1d_err("get_picture", rc.0));
    }

    let converted = picture_to_rgb(&pic);

    unsafe {
        dav1d::dav1d_picture_unref(NonNull::new(&mut pic));
        dav1d::dav1d_close(NonNull::new(&mut ctx));
    }

    let (width, height, rgb) = converted?;
    image::RgbImage::from_raw(width, height, rgb)
        .map(DynamicImage::ImageRgb8)
        .ok_or_else(|| CodecError::Decode("decoded AVIF buffer has the wrong size".into()))
}

/// Read the planes of a decoded picture into interleaved RGB8.
fn picture_to_rgb(pic: &Dav1dPicture) -> Result<(u32, u32, Vec<u8>), CodecError> {
    let missing_plane = || CodecError::Decode("rav1d returned a picture without planes".into());

    let width = pic.p.w as u32;
    let height = pic.p.h as u32;
    let layout = pic.p.layout;
    let y_ptr = pic.data[0].ok_or_else(missing_plane)?.as_ptr() as *const u8;

    let planes = if layout == DAV1D_PIXEL_LAYOUT_I400 {
        YuvPlanes {
            y_ptr,
            u_ptr: y_ptr,
            v_ptr: y_ptr,
            y_stride: pic.stride[0],
            uv_stride: 0,
            width,
            height,
            bpc: pic.p.bpc as u32,
            ss_x: false,
            ss_y: false,
            monochrome: true,
        }
    } else {
        let (ss_x, ss_y) = match layout {
            DAV1D_PIXEL_LAYOUT_I420 => (true, true),
            DAV1D_PIXEL_LAYOUT_I422 => (true, false),
            DAV1D_PIXEL_LAYOUT_I444 => (false, false),
            _ => {
                return Err(CodecError::Decode(format!(
                    "unsupported AVIF pixel layout: {layout}"
                )));
            }
        };
        YuvPlanes {
            y_ptr,
            u_ptr: pic.data[1].ok_or_else(missing_plane)?.as_ptr() as *const u8,
            v_ptr: pic.data[2].ok_or_else(missing_plane)?.as_ptr() as *const u8,
            y_stride: pic.stride[0],
            uv_stride: pic.stride[1],
            width,
            height,
            bpc: pic.p.bpc as u32,
            ss_x,
            ss_y,
            monochrome: false,
        }
    };

    Ok((width, height, planes.to_rgb()))
}

/// Borrowed YUV planes of a decoded picture. Valid only until the picture is
/// unreferenced.
struct YuvPlanes {
    y_ptr: *const u8,
    u_ptr: *const u8,
    v_ptr: *const u8,
    y_stride: isize,
    uv_stride: isize,
    width: u32,
    height: u32,
    bpc: u32,
    /// Chroma subsampling (I420 = both, I422 = horizontal only)
    ss_x: bool,
    ss_y: bool,
    monochrome: bool,
}

impl YuvPlanes {
    /// BT.601 YCbCr to RGB8, scaling high bit depths down to 8 bits.
    fn to_rgb(&self) -> Vec<u8> {
        let max_val = ((1u32 << self.bpc) - 1) as f32;
        let center = (1u32 << (self.bpc - 1)) as f32;
        let scale = 255.0 / max_val;

        let mut rgb = Vec::with_capacity(self.width as usize * self.height as usize * 3);

        for row in 0..self.height {
            for col in 0..self.width {
                let y = read_sample(self.y_ptr, self.y_stride, col, row, self.bpc);

                let (r, g, b) = if self.monochrome {
                    let v = (y * scale).clamp(0.0, 255.0);
                    (v, v, v)
                } else {
                    let u_col = if self.ss_x { col / 2 } else { col };
                    let u_row = if self.ss_y { row / 2 } else { row };
                    let cb = read_sample(self.u_ptr, self.uv_stride, u_col, u_row, self.bpc)
                        - center;
                    let cr = read_sample(self.v_ptr, self.uv_stride, u_col, u_row, self.bpc)
                        - center;
                    (
                        ((y + 1.402 * cr) * scale).clamp(0.0, 255.0),
                        ((y - 0.344136 * cb - 0.714136 * cr) * scale).clamp(0.0, 255.0),
                        ((y + 1.772 * cb) * scale).clamp(0.0, 255.0),
                    )
                };

                rgb.extend_from_slice(&[r as u8, g as u8, b as u8]);
            }
        }

        rgb
    }
}

/// One sample from a plane. Depths above 8 bits are stored as u16.
#[inline]
fn read_sample(ptr: *const u8, stride: isize, x: u32, y: u32, bpc: u32) -> f32 {
    if bpc <= 8 {
        (unsafe { *ptr.offset(y as isize * stride + x as isize) }) as f32
    } else {
        let byte_offset = y as isize * stride + x as isize * 2;
        (unsafe { (ptr.offset(byte_offset) as *const u16).read_unaligned() }) as f32
    }
}
