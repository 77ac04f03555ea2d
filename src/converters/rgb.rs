//! Packed RGB repacking.
//!
//! Generic conversion between the packed RGB layouts: channel swizzle
//! (R/B swap), alpha addition (opaque) and alpha removal. Used directly and
//! as the intermediate hop for conversions with no direct YUV kernel.

use crate::error::Result;
use crate::format::RgbFormat;

/// Convert between packed RGB formats at identical resolution.
///
/// Pitches of 0 derive the tight row width. Source alpha, if any, is
/// discarded; destination alpha, if any, is written as opaque (255).
#[allow(clippy::too_many_arguments)]
pub fn convert_rgb(
    width: u32,
    height: u32,
    src_format: RgbFormat,
    src: &[u8],
    src_pitch: usize,
    dst_format: RgbFormat,
    dst: &mut [u8],
    dst_pitch: usize,
) -> Result<()> {
    let src_bpp = src_format.bytes_per_pixel();
    let dst_bpp = dst_format.bytes_per_pixel();
    let src_pitch = super::resolve_rgb_pitch(width, src_bpp, src_pitch)?;
    let dst_pitch = super::resolve_rgb_pitch(width, dst_bpp, dst_pitch)?;
    super::check_rgb_extent(width, height, src_bpp, src_pitch, src.len(), "source")?;
    super::check_rgb_extent(width, height, dst_bpp, dst_pitch, dst.len(), "destination")?;

    let w = width as usize;
    let h = height as usize;

    if src_format == dst_format {
        let row_bytes = w * src_bpp;
        if src_pitch == dst_pitch && src_pitch == row_bytes {
            dst[..row_bytes * h].copy_from_slice(&src[..row_bytes * h]);
        } else {
            for row in 0..h {
                dst[row * dst_pitch..row * dst_pitch + row_bytes]
                    .copy_from_slice(&src[row * src_pitch..row * src_pitch + row_bytes]);
            }
        }
        return Ok(());
    }

    let (sr, sg, sb, _) = src_format.channel_offsets();
    let (dr, dg, db, da) = dst_format.channel_offsets();

    for row in 0..h {
        let src_row = &src[row * src_pitch..];
        let dst_row = &mut dst[row * dst_pitch..];
        for col in 0..w {
            let s = &src_row[col * src_bpp..col * src_bpp + src_bpp];
            let d = &mut dst_row[col * dst_bpp..col * dst_bpp + dst_bpp];
            d[dr] = s[sr];
            d[dg] = s[sg];
            d[db] = s[sb];
            if let Some(a) = da {
                d[a] = 255;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_bgr_swap() {
        let rgb = [255, 0, 0, 0, 255, 0, 0, 0, 255, 128, 128, 128];
        let mut bgr = vec![0u8; 12];
        convert_rgb(2, 2, RgbFormat::Rgb24, &rgb, 0, RgbFormat::Bgr24, &mut bgr, 0).unwrap();
        assert_eq!(bgr[0..3], [0, 0, 255]);
        assert_eq!(bgr[3..6], [0, 255, 0]);
        assert_eq!(bgr[6..9], [255, 0, 0]);
        assert_eq!(bgr[9..12], [128, 128, 128]);
    }

    #[test]
    fn test_add_remove_alpha() {
        let rgb = [255, 128, 64, 32, 64, 128, 100, 150, 200, 50, 100, 150];
        let mut rgba = vec![0u8; 16];
        let mut back = vec![0u8; 12];

        convert_rgb(2, 2, RgbFormat::Rgb24, &rgb, 0, RgbFormat::Rgba, &mut rgba, 0).unwrap();
        for px in rgba.chunks_exact(4) {
            assert_eq!(px[3], 255);
        }

        convert_rgb(2, 2, RgbFormat::Rgba, &rgba, 0, RgbFormat::Rgb24, &mut back, 0).unwrap();
        assert_eq!(rgb.as_slice(), back.as_slice());
    }

    #[test]
    fn test_same_format_respects_pitch() {
        // 2x2 RGBA with one byte of row padding on the source.
        let src = [
            1, 2, 3, 4, 5, 6, 7, 8, 99, //
            9, 10, 11, 12, 13, 14, 15, 16, 99,
        ];
        let mut dst = vec![0u8; 16];
        convert_rgb(2, 2, RgbFormat::Rgba, &src, 9, RgbFormat::Rgba, &mut dst, 0).unwrap();
        assert_eq!(
            dst,
            [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16]
        );
    }

    #[test]
    fn test_bgra_to_rgb24() {
        let bgra = [10, 20, 30, 40];
        let mut rgb = vec![0u8; 3];
        convert_rgb(1, 1, RgbFormat::Bgra, &bgra, 0, RgbFormat::Rgb24, &mut rgb, 0).unwrap();
        assert_eq!(rgb, [30, 20, 10]);
    }
}
