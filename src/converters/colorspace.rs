//! Colorspace conversion (YUV ↔ RGB).
//!
//! Fixed-point implementations of the full-range JPEG, BT.601 and BT.709
//! transforms. YUV → RGB uses 10-bit fixed point with rounding and
//! saturation; RGB → YUV uses 8-bit fixed point with coefficient tables
//! constructed so luma and chroma stay inside `[0, 255]` for every legal
//! RGB input, so no clamping is applied on that path.

use crate::converters::{kernels, rgb};
use crate::error::{Error, Result};
use crate::format::{ColorMatrix, ColorimetryMode, RgbFormat, YuvFormat};
use crate::layout::YuvLayout;

// ============================================================================
// Coefficient tables
// ============================================================================

/// YUV -> RGB coefficients, 10-bit fixed point.
#[derive(Debug, Clone, Copy)]
pub(crate) struct YuvToRgbCoeffs {
    y_scale: i32,
    y_offset: i32,
    v_r: i32,
    u_g: i32,
    v_g: i32,
    u_b: i32,
}

impl YuvToRgbCoeffs {
    /// Transform one sample triple. Saturates to `[0, 255]`.
    #[inline(always)]
    pub(crate) fn to_rgb(&self, y: i32, u: i32, v: i32) -> (u8, u8, u8) {
        let c = self.y_scale * (y - self.y_offset);
        let u = u - 128;
        let v = v - 128;
        let r = (c + self.v_r * v + 512) >> 10;
        let g = (c - self.u_g * u - self.v_g * v + 512) >> 10;
        let b = (c + self.u_b * u + 512) >> 10;
        (
            r.clamp(0, 255) as u8,
            g.clamp(0, 255) as u8,
            b.clamp(0, 255) as u8,
        )
    }
}

// Scaled by 1024. JPEG is full range (luma offset 0, unity luma scale);
// BT.601/BT.709 are studio range (luma offset 16, scale 255/219).
const YUV_TO_RGB_JPEG: YuvToRgbCoeffs = YuvToRgbCoeffs {
    y_scale: 1024, // 1.0
    y_offset: 0,
    v_r: 1436, // 1.402
    u_g: 352,  // 0.344136
    v_g: 731,  // 0.714136
    u_b: 1815, // 1.772
};

const YUV_TO_RGB_BT601: YuvToRgbCoeffs = YuvToRgbCoeffs {
    y_scale: 1192, // 1.164
    y_offset: 16,
    v_r: 1634, // 1.596
    u_g: 400,  // 0.391
    v_g: 833,  // 0.813
    u_b: 2066, // 2.018
};

const YUV_TO_RGB_BT709: YuvToRgbCoeffs = YuvToRgbCoeffs {
    y_scale: 1192, // 1.164
    y_offset: 16,
    v_r: 1836, // 1.793
    u_g: 218,  // 0.213
    v_g: 546,  // 0.533
    u_b: 2163, // 2.112
};

pub(crate) fn yuv_to_rgb_coeffs(matrix: ColorMatrix) -> &'static YuvToRgbCoeffs {
    match matrix {
        ColorMatrix::Jpeg => &YUV_TO_RGB_JPEG,
        ColorMatrix::Bt601 => &YUV_TO_RGB_BT601,
        ColorMatrix::Bt709 => &YUV_TO_RGB_BT709,
    }
}

/// RGB -> YUV coefficients, 8-bit fixed point.
///
/// Row sums are bounded so that `(dot + 128) >> 8` plus the offset lands in
/// `[0, 255]` for any RGB input; the chroma rows additionally sum to zero so
/// neutral gray maps to exactly 128.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RgbToYuvCoeffs {
    yr: i32,
    yg: i32,
    yb: i32,
    y_offset: i32,
    ur: i32,
    ug: i32,
    ub: i32,
    vr: i32,
    vg: i32,
    vb: i32,
}

impl RgbToYuvCoeffs {
    #[inline(always)]
    pub(crate) fn make_y(&self, r: i32, g: i32, b: i32) -> u8 {
        (((self.yr * r + self.yg * g + self.yb * b + 128) >> 8) + self.y_offset) as u8
    }

    #[inline(always)]
    pub(crate) fn make_u(&self, r: i32, g: i32, b: i32) -> u8 {
        (((self.ur * r + self.ug * g + self.ub * b + 128) >> 8) + 128) as u8
    }

    #[inline(always)]
    pub(crate) fn make_v(&self, r: i32, g: i32, b: i32) -> u8 {
        (((self.vr * r + self.vg * g + self.vb * b + 128) >> 8) + 128) as u8
    }

    #[cfg(test)]
    pub(crate) fn rows(&self) -> [(i32, i32, i32, i32); 3] {
        [
            (self.yr, self.yg, self.yb, self.y_offset),
            (self.ur, self.ug, self.ub, 128),
            (self.vr, self.vg, self.vb, 128),
        ]
    }
}

// Scaled by 256.
const RGB_TO_YUV_JPEG: RgbToYuvCoeffs = RgbToYuvCoeffs {
    yr: 77, // 0.299
    yg: 150, // 0.587
    yb: 29, // 0.114
    y_offset: 0,
    ur: -43, // -0.169
    ug: -84, // -0.331
    ub: 127, // 0.5 (kept below 128 so U never exceeds 255)
    vr: 127,
    vg: -107, // -0.419
    vb: -20,  // -0.081
};

const RGB_TO_YUV_BT601: RgbToYuvCoeffs = RgbToYuvCoeffs {
    yr: 66, // 0.257
    yg: 129, // 0.504
    yb: 25, // 0.098
    y_offset: 16,
    ur: -38, // -0.148
    ug: -74, // -0.291
    ub: 112, // 0.439
    vr: 112,
    vg: -94, // -0.368
    vb: -18, // -0.071
};

const RGB_TO_YUV_BT709: RgbToYuvCoeffs = RgbToYuvCoeffs {
    yr: 47, // 0.183
    yg: 157, // 0.614
    yb: 16, // 0.062
    y_offset: 16,
    ur: -26, // -0.101
    ug: -86, // -0.339
    ub: 112, // 0.439
    vr: 112,
    vg: -102, // -0.399
    vb: -10,  // -0.040
};

pub(crate) fn rgb_to_yuv_coeffs(matrix: ColorMatrix) -> &'static RgbToYuvCoeffs {
    match matrix {
        ColorMatrix::Jpeg => &RGB_TO_YUV_JPEG,
        ColorMatrix::Bt601 => &RGB_TO_YUV_BT601,
        ColorMatrix::Bt709 => &RGB_TO_YUV_BT709,
    }
}

/// Rounding average over however many samples a (possibly truncated) block
/// actually holds: 4 for a full 2x2, 2 for a 2x1/1x2 edge, 1 for a corner.
#[inline(always)]
pub(crate) fn avg_block(sum: u32, count: u32) -> i32 {
    ((sum + count / 2) / count) as i32
}

// ============================================================================
// YUV -> RGB
// ============================================================================

/// Convert a YUV frame to packed RGB.
///
/// `src_pitch` of 0 derives the native pitch, likewise `dst_pitch`. The
/// colorimetry matrix is resolved from `mode` and the frame height.
///
/// Direct kernels exist for the 32-bit destinations; 24-bit destinations are
/// converted through a temporary RGBA buffer. Sources with no kernel at all
/// fail with [`Error::UnsupportedConversion`].
#[allow(clippy::too_many_arguments)]
pub fn yuv_to_rgb(
    width: u32,
    height: u32,
    src_format: YuvFormat,
    src: &[u8],
    src_pitch: usize,
    dst_format: RgbFormat,
    dst: &mut [u8],
    dst_pitch: usize,
    mode: ColorimetryMode,
) -> Result<()> {
    let layout = YuvLayout::compute(src_format, width, height, src_pitch)?;
    layout.check_buffer(src.len())?;

    let bpp = dst_format.bytes_per_pixel();
    let dst_pitch = super::resolve_rgb_pitch(width, bpp, dst_pitch)?;
    super::check_rgb_extent(width, height, bpp, dst_pitch, dst.len(), "destination")?;

    if src_format == YuvFormat::P010 {
        return Err(unsupported(src_format.name(), dst_format.name()));
    }

    // No direct kernel for 24-bit destinations: go through the fixed RGBA
    // intermediate, then repack.
    if !dst_format.has_alpha() {
        let w = width as usize;
        let mut tmp = super::alloc_pixels(w * 4 * height as usize)?;
        yuv_to_rgb(
            width,
            height,
            src_format,
            src,
            src_pitch,
            RgbFormat::Rgba,
            &mut tmp,
            w * 4,
            mode,
        )?;
        return rgb::convert_rgb(
            width,
            height,
            RgbFormat::Rgba,
            &tmp,
            w * 4,
            dst_format,
            dst,
            dst_pitch,
        );
    }

    let co = yuv_to_rgb_coeffs(mode.resolve(height));
    let (r, g, b, a) = dst_format.channel_offsets();
    let ch = [r, g, b, a.expect("32-bit destination")];
    let w = width as usize;
    let h = height as usize;

    if let Some(offs) = src_format.packed_offsets() {
        let plane = &layout.planes[0];
        kernels::packed422_to_rgb32(
            w,
            h,
            layout.plane(src, 0),
            plane.pitch,
            offs,
            co,
            dst,
            dst_pitch,
            ch,
        );
        return Ok(());
    }

    let y_pitch = layout.planes[0].pitch;
    if let Some((ui, vi)) = layout.u_v_plane_indices() {
        kernels::planar420_to_rgb32(
            w,
            h,
            layout.plane(src, 0),
            y_pitch,
            layout.plane(src, ui),
            layout.plane(src, vi),
            layout.planes[1].pitch,
            1,
            co,
            dst,
            dst_pitch,
            ch,
        );
    } else {
        let uv = layout.plane(src, 1);
        let (u, v) = if src_format.u_before_v() {
            (uv, &uv[1..])
        } else {
            (&uv[1..], uv)
        };
        kernels::planar420_to_rgb32(
            w,
            h,
            layout.plane(src, 0),
            y_pitch,
            u,
            v,
            layout.planes[1].pitch,
            2,
            co,
            dst,
            dst_pitch,
            ch,
        );
    }
    Ok(())
}

// ============================================================================
// RGB -> YUV
// ============================================================================

/// Convert packed RGB to a YUV frame.
///
/// The direct path accepts [`RgbFormat::Rgba`] sources; any other RGB source
/// is first repacked to RGBA through a temporary buffer (a single
/// intermediate hop). Luma is written per pixel at full resolution; chroma
/// averages 2 horizontal pixels for packed destinations and a 2x2 block for
/// 4:2:0 destinations, degrading to smaller blocks at odd edges.
#[allow(clippy::too_many_arguments)]
pub fn rgb_to_yuv(
    width: u32,
    height: u32,
    src_format: RgbFormat,
    src: &[u8],
    src_pitch: usize,
    dst_format: YuvFormat,
    dst: &mut [u8],
    dst_pitch: usize,
    mode: ColorimetryMode,
) -> Result<()> {
    let bpp = src_format.bytes_per_pixel();
    let src_pitch = super::resolve_rgb_pitch(width, bpp, src_pitch)?;
    super::check_rgb_extent(width, height, bpp, src_pitch, src.len(), "source")?;

    if src_format != RgbFormat::Rgba {
        let w = width as usize;
        let mut tmp = super::alloc_pixels(w * 4 * height as usize)?;
        rgb::convert_rgb(
            width,
            height,
            src_format,
            src,
            src_pitch,
            RgbFormat::Rgba,
            &mut tmp,
            w * 4,
        )?;
        return rgb_to_yuv(
            width,
            height,
            RgbFormat::Rgba,
            &tmp,
            w * 4,
            dst_format,
            dst,
            dst_pitch,
            mode,
        );
    }

    if dst_format == YuvFormat::P010 {
        return Err(unsupported(src_format.name(), dst_format.name()));
    }

    let layout = YuvLayout::compute(dst_format, width, height, dst_pitch)?;
    layout.check_buffer(dst.len())?;

    let co = rgb_to_yuv_coeffs(mode.resolve(height));
    let w = width as usize;
    let h = height as usize;

    if let Some(offs) = dst_format.packed_offsets() {
        rgba_to_packed422(w, h, src, src_pitch, co, dst, &layout, offs);
    } else {
        rgba_to_planar420(w, h, src, src_pitch, co, dst, &layout);
    }
    Ok(())
}

#[inline(always)]
fn rgba_at(src: &[u8], pitch: usize, row: usize, col: usize) -> (i32, i32, i32) {
    let px = &src[row * pitch + col * 4..];
    (i32::from(px[0]), i32::from(px[1]), i32::from(px[2]))
}

fn rgba_to_packed422(
    w: usize,
    h: usize,
    src: &[u8],
    src_pitch: usize,
    co: &RgbToYuvCoeffs,
    dst: &mut [u8],
    layout: &YuvLayout,
    offs: [usize; 4],
) {
    let plane = layout.planes[0];
    for row in 0..h {
        let dst_row = &mut dst[plane.offset + row * plane.pitch..];
        let mut col = 0;
        while col < w {
            let n = (w - col).min(2);
            let mut sum = (0u32, 0u32, 0u32);
            for i in 0..n {
                let (r, g, b) = rgba_at(src, src_pitch, row, col + i);
                sum.0 += r as u32;
                sum.1 += g as u32;
                sum.2 += b as u32;
            }
            let (ar, ag, ab) = (
                avg_block(sum.0, n as u32),
                avg_block(sum.1, n as u32),
                avg_block(sum.2, n as u32),
            );

            let group = &mut dst_row[(col / 2) * 4..(col / 2) * 4 + 4];
            let (r0, g0, b0) = rgba_at(src, src_pitch, row, col);
            group[offs[0]] = co.make_y(r0, g0, b0);
            // A final single-column group duplicates its only luma sample.
            let (r1, g1, b1) = if n == 2 {
                rgba_at(src, src_pitch, row, col + 1)
            } else {
                (r0, g0, b0)
            };
            group[offs[2]] = co.make_y(r1, g1, b1);
            group[offs[1]] = co.make_u(ar, ag, ab);
            group[offs[3]] = co.make_v(ar, ag, ab);
            col += 2;
        }
    }
}

fn rgba_to_planar420(
    w: usize,
    h: usize,
    src: &[u8],
    src_pitch: usize,
    co: &RgbToYuvCoeffs,
    dst: &mut [u8],
    layout: &YuvLayout,
) {
    let y_plane = layout.planes[0];
    for row in 0..h {
        for col in 0..w {
            let (r, g, b) = rgba_at(src, src_pitch, row, col);
            dst[y_plane.offset + row * y_plane.pitch + col] = co.make_y(r, g, b);
        }
    }

    for cy in 0..layout.chroma_height {
        for cx in 0..layout.chroma_width {
            let rows = (h - cy * 2).min(2);
            let cols = (w - cx * 2).min(2);
            let mut sum = (0u32, 0u32, 0u32);
            for dy in 0..rows {
                for dx in 0..cols {
                    let (r, g, b) = rgba_at(src, src_pitch, cy * 2 + dy, cx * 2 + dx);
                    sum.0 += r as u32;
                    sum.1 += g as u32;
                    sum.2 += b as u32;
                }
            }
            let count = (rows * cols) as u32;
            let (ar, ag, ab) = (
                avg_block(sum.0, count),
                avg_block(sum.1, count),
                avg_block(sum.2, count),
            );
            let u = co.make_u(ar, ag, ab);
            let v = co.make_v(ar, ag, ab);

            if let Some((ui, vi)) = layout.u_v_plane_indices() {
                let up = layout.planes[ui];
                let vp = layout.planes[vi];
                dst[up.offset + cy * up.pitch + cx] = u;
                dst[vp.offset + cy * vp.pitch + cx] = v;
            } else {
                let uvp = layout.planes[1];
                let base = uvp.offset + cy * uvp.pitch + cx * 2;
                let u_off = if layout.format.u_before_v() { 0 } else { 1 };
                dst[base + u_off] = u;
                dst[base + 1 - u_off] = v;
            }
        }
    }
}

fn unsupported(src: &'static str, dst: &'static str) -> Error {
    Error::UnsupportedConversion { src, dst }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yuv_to_rgb_white_black() {
        let co = yuv_to_rgb_coeffs(ColorMatrix::Bt601);
        // Studio-range white and black.
        assert_eq!(co.to_rgb(235, 128, 128), (255, 255, 255));
        assert_eq!(co.to_rgb(16, 128, 128), (0, 0, 0));

        let co = yuv_to_rgb_coeffs(ColorMatrix::Jpeg);
        assert_eq!(co.to_rgb(255, 128, 128), (255, 255, 255));
        assert_eq!(co.to_rgb(0, 128, 128), (0, 0, 0));
    }

    /// The forward tables must keep Y/U/V inside a byte for every RGB input
    /// without clamping. The transform is affine in each channel, so the
    /// extrema occur at channel extremes; checking all 8 corners suffices.
    #[test]
    fn test_forward_coefficients_never_overflow() {
        for matrix in [ColorMatrix::Jpeg, ColorMatrix::Bt601, ColorMatrix::Bt709] {
            let co = rgb_to_yuv_coeffs(matrix);
            for (cr, cg, cb, offset) in co.rows() {
                for r in [0i32, 255] {
                    for g in [0i32, 255] {
                        for b in [0i32, 255] {
                            let value = ((cr * r + cg * g + cb * b + 128) >> 8) + offset;
                            assert!(
                                (0..=255).contains(&value),
                                "{matrix:?} produced {value} at rgb ({r},{g},{b})"
                            );
                        }
                    }
                }
            }
        }
    }

    /// Neutral gray must map to exactly (y, 128, 128) and back.
    #[test]
    fn test_gray_roundtrip_exact() {
        let fwd = rgb_to_yuv_coeffs(ColorMatrix::Jpeg);
        let bwd = yuv_to_rgb_coeffs(ColorMatrix::Jpeg);
        for gray in [0u8, 1, 37, 128, 200, 254, 255] {
            let g = i32::from(gray);
            let y = fwd.make_y(g, g, g);
            assert_eq!(y, gray);
            assert_eq!(fwd.make_u(g, g, g), 128);
            assert_eq!(fwd.make_v(g, g, g), 128);
            assert_eq!(bwd.to_rgb(i32::from(y), 128, 128), (gray, gray, gray));
        }
    }

    #[test]
    fn test_full_frame_gray_roundtrip() {
        let (w, h) = (6u32, 4u32);
        let mut rgba = vec![0u8; (w * h * 4) as usize];
        for (i, px) in rgba.chunks_exact_mut(4).enumerate() {
            let gray = ((i * 255) / ((w * h) as usize - 1)) as u8;
            px[0] = gray;
            px[1] = gray;
            px[2] = gray;
            px[3] = 255;
        }

        let (size, pitch) = crate::layout::compute_yuv_size(YuvFormat::I420, w, h).unwrap();
        let mut yuv = vec![0u8; size];
        rgb_to_yuv(
            w,
            h,
            RgbFormat::Rgba,
            &rgba,
            0,
            YuvFormat::I420,
            &mut yuv,
            pitch,
            ColorimetryMode::Jpeg,
        )
        .unwrap();

        let mut back = vec![0u8; (w * h * 4) as usize];
        yuv_to_rgb(
            w,
            h,
            YuvFormat::I420,
            &yuv,
            pitch,
            RgbFormat::Rgba,
            &mut back,
            0,
            ColorimetryMode::Jpeg,
        )
        .unwrap();

        for (a, b) in rgba.chunks_exact(4).zip(back.chunks_exact(4)) {
            for c in 0..3 {
                let diff = (i32::from(a[c]) - i32::from(b[c])).abs();
                assert!(diff <= 1, "channel diff {diff} at {a:?} vs {b:?}");
            }
            assert_eq!(b[3], 255);
        }
    }

    #[test]
    fn test_p010_conversion_unsupported() {
        let (size, pitch) = crate::layout::compute_yuv_size(YuvFormat::P010, 4, 4).unwrap();
        let yuv = vec![0u8; size];
        let mut rgb = vec![0u8; 4 * 4 * 4];
        assert!(matches!(
            yuv_to_rgb(
                4,
                4,
                YuvFormat::P010,
                &yuv,
                pitch,
                RgbFormat::Rgba,
                &mut rgb,
                0,
                ColorimetryMode::Automatic,
            ),
            Err(Error::UnsupportedConversion { .. })
        ));

        let mut yuv = vec![0u8; size];
        assert!(matches!(
            rgb_to_yuv(
                4,
                4,
                RgbFormat::Rgba,
                &rgb,
                0,
                YuvFormat::P010,
                &mut yuv,
                pitch,
                ColorimetryMode::Automatic,
            ),
            Err(Error::UnsupportedConversion { .. })
        ));
    }

    #[test]
    fn test_rgb24_goes_through_intermediate() {
        let (w, h) = (5u32, 3u32);
        let (size, pitch) = crate::layout::compute_yuv_size(YuvFormat::Yuy2, w, h).unwrap();
        let yuv: Vec<u8> = (0..size).map(|i| (i * 29 % 256) as u8).collect();

        let mut rgba = vec![0u8; (w * h * 4) as usize];
        yuv_to_rgb(
            w,
            h,
            YuvFormat::Yuy2,
            &yuv,
            pitch,
            RgbFormat::Rgba,
            &mut rgba,
            0,
            ColorimetryMode::Bt601,
        )
        .unwrap();

        let mut rgb24 = vec![0u8; (w * h * 3) as usize];
        yuv_to_rgb(
            w,
            h,
            YuvFormat::Yuy2,
            &yuv,
            pitch,
            RgbFormat::Rgb24,
            &mut rgb24,
            0,
            ColorimetryMode::Bt601,
        )
        .unwrap();

        for (px4, px3) in rgba.chunks_exact(4).zip(rgb24.chunks_exact(3)) {
            assert_eq!(&px4[..3], px3);
        }
    }

    #[test]
    fn test_bgra_source_hops_to_rgba() {
        let (w, h) = (4u32, 2u32);
        let mut bgra = vec![0u8; (w * h * 4) as usize];
        let mut rgba = vec![0u8; (w * h * 4) as usize];
        for (i, (b4, r4)) in bgra
            .chunks_exact_mut(4)
            .zip(rgba.chunks_exact_mut(4))
            .enumerate()
        {
            let (r, g, b) = ((i * 40) as u8, (i * 20) as u8, (i * 10) as u8);
            b4.copy_from_slice(&[b, g, r, 255]);
            r4.copy_from_slice(&[r, g, b, 255]);
        }

        let (size, pitch) = crate::layout::compute_yuv_size(YuvFormat::Nv12, w, h).unwrap();
        let mut from_bgra = vec![0u8; size];
        let mut from_rgba = vec![0u8; size];
        rgb_to_yuv(
            w,
            h,
            RgbFormat::Bgra,
            &bgra,
            0,
            YuvFormat::Nv12,
            &mut from_bgra,
            pitch,
            ColorimetryMode::Bt709,
        )
        .unwrap();
        rgb_to_yuv(
            w,
            h,
            RgbFormat::Rgba,
            &rgba,
            0,
            YuvFormat::Nv12,
            &mut from_rgba,
            pitch,
            ColorimetryMode::Bt709,
        )
        .unwrap();
        assert_eq!(from_bgra, from_rgba);
    }

    #[test]
    fn test_odd_edge_chroma_degrades() {
        // 3x3 RGBA with a hard color step in the last column/row: the final
        // chroma column averages 2 pixels, the corner averages 1.
        let (w, h) = (3u32, 3u32);
        let mut rgba = vec![0u8; (w * h * 4) as usize];
        for (i, px) in rgba.chunks_exact_mut(4).enumerate() {
            let v = if (i % 3) == 2 { 250 } else { 10 };
            px.copy_from_slice(&[v, v, v, 255]);
        }

        let (size, pitch) = crate::layout::compute_yuv_size(YuvFormat::I420, w, h).unwrap();
        let mut yuv = vec![0u8; size];
        rgb_to_yuv(
            w,
            h,
            RgbFormat::Rgba,
            &rgba,
            0,
            YuvFormat::I420,
            &mut yuv,
            pitch,
            ColorimetryMode::Jpeg,
        )
        .unwrap();

        // Gray input: all chroma neutral regardless of block size.
        assert!(yuv[9..].iter().all(|&c| c == 128));
        // Luma column 2 keeps the bright value at full resolution.
        assert_eq!(yuv[2], 250);
        assert_eq!(yuv[5], 250);
        assert_eq!(yuv[0], 10);
    }
}
