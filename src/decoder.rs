//! Raw frame buffer to RGB bitmap conversion

use image::{ImageFormat, RgbImage};

use crate::error::SinkError;
use crate::frame::{ImagePayload, PixelFormat};

/// Decode a raw payload into an RGB bitmap of `width` x `height`
pub fn decode_frame(payload: &ImagePayload) -> Result<RgbImage, SinkError> {
    let (width, height) = (payload.width as usize, payload.height as usize);
    let data = &payload.data[..];
    let pixels = width
        .checked_mul(height)
        .ok_or_else(|| decode_error(payload, "dimensions overflow"))?;

    let rgb = match payload.format {
        PixelFormat::Mjpeg => {
            let decoded = image::load_from_memory_with_format(data, ImageFormat::Jpeg)?;
            return Ok(decoded.to_rgb8());
        }
        PixelFormat::Rgb24 => {
            expect_len(payload, scaled(payload, pixels, 3)?)?;
            data.to_vec()
        }
        PixelFormat::Bgr24 => {
            expect_len(payload, scaled(payload, pixels, 3)?)?;
            data.chunks_exact(3)
                .flat_map(|px| [px[2], px[1], px[0]])
                .collect()
        }
        PixelFormat::Yuyv4 => {
            if width % 2 != 0 {
                return Err(decode_error(payload, "odd width"));
            }
            expect_len(payload, scaled(payload, pixels, 2)?)?;
            let mut rgb = Vec::with_capacity(pixels * 3);
            for chunk in data.chunks_exact(4) {
                let (y0, u, y1, v) = (chunk[0], chunk[1], chunk[2], chunk[3]);
                rgb.extend_from_slice(&yuv_to_rgb(y0, u, v));
                rgb.extend_from_slice(&yuv_to_rgb(y1, u, v));
            }
            rgb
        }
        PixelFormat::Nv12 | PixelFormat::Nv21 => {
            if width % 2 != 0 || height % 2 != 0 {
                return Err(decode_error(payload, "odd dimensions"));
            }
            let luma = pixels;
            expect_len(payload, scaled(payload, luma, 3)? / 2)?;
            let (y_plane, uv_plane) = data.split_at(luma);
            let vu_order = payload.format == PixelFormat::Nv21;

            let mut rgb = Vec::with_capacity(luma * 3);
            for row in 0..height {
                for col in 0..width {
                    let y = y_plane[row * width + col];
                    let uv = (row / 2) * width + (col & !1);
                    let (u, v) = if vu_order {
                        (uv_plane[uv + 1], uv_plane[uv])
                    } else {
                        (uv_plane[uv], uv_plane[uv + 1])
                    };
                    rgb.extend_from_slice(&yuv_to_rgb(y, u, v));
                }
            }
            rgb
        }
    };

    RgbImage::from_raw(payload.width, payload.height, rgb)
        .ok_or_else(|| decode_error(payload, "buffer does not match dimensions"))
}

/// BT.601 full-range conversion
fn yuv_to_rgb(y: u8, u: u8, v: u8) -> [u8; 3] {
    let y = y as f32;
    let u = u as f32 - 128.0;
    let v = v as f32 - 128.0;

    let r = y + 1.402 * v;
    let g = y - 0.344_136 * u - 0.714_136 * v;
    let b = y + 1.772 * u;

    [clamp(r), clamp(g), clamp(b)]
}

fn clamp(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

fn scaled(payload: &ImagePayload, pixels: usize, factor: usize) -> Result<usize, SinkError> {
    pixels
        .checked_mul(factor)
        .ok_or_else(|| decode_error(payload, "dimensions overflow"))
}

fn expect_len(payload: &ImagePayload, expected: usize) -> Result<(), SinkError> {
    if payload.data.len() < expected {
        return Err(decode_error(
            payload,
            &format!("expected {} bytes, got {}", expected, payload.data.len()),
        ));
    }
    Ok(())
}

fn decode_error(payload: &ImagePayload, reason: &str) -> SinkError {
    SinkError::Decode {
        format: payload.format,
        reason: reason.to_string(),
    }
}
