//! RGB surface scaling (resolution conversion).
//!
//! Pure Rust stretch routines for packed RGB surfaces, used by the software
//! texture present path when the destination rectangle differs from the
//! texture's native size.

use crate::error::Result;
use crate::format::RgbFormat;

/// Scaling algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScaleAlgorithm {
    /// Nearest neighbor - fastest, pixelated results.
    #[default]
    NearestNeighbor,
    /// Bilinear interpolation - good quality/speed balance.
    Bilinear,
}

/// Scale a packed RGB surface to a new resolution.
///
/// Pitches of 0 derive the tight row width. Source and destination must use
/// the same pixel format; format changes belong to
/// [`convert_rgb`](super::convert_rgb).
#[allow(clippy::too_many_arguments)]
pub fn scale_rgb(
    format: RgbFormat,
    src_width: u32,
    src_height: u32,
    src: &[u8],
    src_pitch: usize,
    dst_width: u32,
    dst_height: u32,
    dst: &mut [u8],
    dst_pitch: usize,
    algorithm: ScaleAlgorithm,
) -> Result<()> {
    let bpp = format.bytes_per_pixel();
    let src_pitch = super::resolve_rgb_pitch(src_width, bpp, src_pitch)?;
    let dst_pitch = super::resolve_rgb_pitch(dst_width, bpp, dst_pitch)?;
    super::check_rgb_extent(src_width, src_height, bpp, src_pitch, src.len(), "source")?;
    super::check_rgb_extent(
        dst_width,
        dst_height,
        bpp,
        dst_pitch,
        dst.len(),
        "destination",
    )?;

    let in_w = src_width as usize;
    let in_h = src_height as usize;
    let out_w = dst_width as usize;
    let out_h = dst_height as usize;

    match algorithm {
        ScaleAlgorithm::NearestNeighbor => {
            for out_y in 0..out_h {
                let in_y = (out_y * in_h / out_h).min(in_h - 1);
                let src_row = &src[in_y * src_pitch..];
                let dst_row = &mut dst[out_y * dst_pitch..];
                for out_x in 0..out_w {
                    let in_x = (out_x * in_w / out_w).min(in_w - 1);
                    dst_row[out_x * bpp..out_x * bpp + bpp]
                        .copy_from_slice(&src_row[in_x * bpp..in_x * bpp + bpp]);
                }
            }
        }
        ScaleAlgorithm::Bilinear => {
            let x_ratio = (in_w as f32 - 1.0) / (out_w as f32).max(1.0);
            let y_ratio = (in_h as f32 - 1.0) / (out_h as f32).max(1.0);

            for out_y in 0..out_h {
                let src_y = out_y as f32 * y_ratio;
                let y0 = src_y.floor() as usize;
                let y1 = (y0 + 1).min(in_h - 1);
                let y_frac = src_y - y0 as f32;

                for out_x in 0..out_w {
                    let src_x = out_x as f32 * x_ratio;
                    let x0 = src_x.floor() as usize;
                    let x1 = (x0 + 1).min(in_w - 1);
                    let x_frac = src_x - x0 as f32;

                    for c in 0..bpp {
                        let p00 = src[y0 * src_pitch + x0 * bpp + c] as f32;
                        let p10 = src[y0 * src_pitch + x1 * bpp + c] as f32;
                        let p01 = src[y1 * src_pitch + x0 * bpp + c] as f32;
                        let p11 = src[y1 * src_pitch + x1 * bpp + c] as f32;

                        let top = p00 + x_frac * (p10 - p00);
                        let bottom = p01 + x_frac * (p11 - p01);
                        let value = top + y_frac * (bottom - top);

                        dst[out_y * dst_pitch + out_x * bpp + c] = value.round() as u8;
                    }
                }
            }
        }
    }
    Ok(())
}
