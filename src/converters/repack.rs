//! YUV layout transcoding (YUV ↔ YUV).
//!
//! Converts between YUV layouts of possibly different formats. The
//! operation is chosen by classifying the `(src, dst)` format pair, not by
//! a branch tree per combination:
//!
//! - identity: plane copy respecting possibly different pitches
//! - planar ↔ planar (4:2:0 family): U/V plane swap, 3-plane → 2-plane
//!   interleave, 2-plane → 3-plane split, or interleaved byte-pair swap
//! - planar ↔ packed: 2x2 luma blocks with their shared chroma reshaped
//!   into 2-pixel packed groups, or the reverse with chroma row averaging
//! - packed ↔ packed: pure 4-byte-group permutation
//!
//! Odd widths contribute a final half-sampled column and odd heights a
//! final half-sampled row; both are processed as truncated blocks.

use crate::converters::colorspace::avg_block;
use crate::converters::kernels;
use crate::error::{Error, Result};
use crate::format::YuvFormat;
use crate::layout::YuvLayout;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    /// 8-bit 4:2:0, planar or semi-planar.
    Planar420,
    /// 8-bit packed 4:2:2.
    Packed422,
    /// 16-bit semi-planar; identity copy only.
    Deep,
}

fn classify(format: YuvFormat) -> Class {
    match format {
        YuvFormat::P010 => Class::Deep,
        f if f.is_packed() => Class::Packed422,
        _ => Class::Planar420,
    }
}

/// Byte permutation mapping destination group bytes to source group bytes.
fn group_permutation(src: YuvFormat, dst: YuvFormat) -> [usize; 4] {
    let s = src.packed_offsets().expect("packed source");
    let d = dst.packed_offsets().expect("packed destination");
    let mut perm = [0usize; 4];
    for k in 0..4 {
        perm[d[k]] = s[k];
    }
    perm
}

/// Convert between YUV layouts into a separate destination buffer.
///
/// Pitches of 0 derive the native pitch for the respective format.
#[allow(clippy::too_many_arguments)]
pub fn yuv_to_yuv(
    width: u32,
    height: u32,
    src_format: YuvFormat,
    src: &[u8],
    src_pitch: usize,
    dst_format: YuvFormat,
    dst: &mut [u8],
    dst_pitch: usize,
) -> Result<()> {
    let sl = YuvLayout::compute(src_format, width, height, src_pitch)?;
    let dl = YuvLayout::compute(dst_format, width, height, dst_pitch)?;
    sl.check_buffer(src.len())?;
    dl.check_buffer(dst.len())?;

    if src_format == dst_format {
        copy_planes(src, &sl, dst, &dl);
        return Ok(());
    }

    match (classify(src_format), classify(dst_format)) {
        (Class::Planar420, Class::Planar420) => {
            copy_plane(src, &sl, 0, dst, &dl, 0);
            planar_chroma(src, &sl, dst, &dl);
            Ok(())
        }
        (Class::Packed422, Class::Packed422) => {
            let perm = group_permutation(src_format, dst_format);
            kernels::permute_packed(
                sl.chroma_width,
                sl.height,
                &src[sl.planes[0].range()],
                sl.planes[0].pitch,
                &mut dst[dl.planes[0].range()],
                dl.planes[0].pitch,
                perm,
            );
            Ok(())
        }
        (Class::Planar420, Class::Packed422) => {
            planar_to_packed(src, &sl, dst, &dl);
            Ok(())
        }
        (Class::Packed422, Class::Planar420) => {
            packed_to_planar(src, &sl, dst, &dl);
            Ok(())
        }
        _ => Err(Error::UnsupportedConversion {
            src: src_format.name(),
            dst: dst_format.name(),
        }),
    }
}

/// Convert between YUV layouts within a single buffer.
///
/// Packing and splitting route the chroma region through a temporary copy;
/// planar ↔ packed reshaping is not byte-compatible in place and fails with
/// [`Error::InPlaceUnsupported`].
pub fn yuv_to_yuv_inplace(
    width: u32,
    height: u32,
    src_format: YuvFormat,
    dst_format: YuvFormat,
    buf: &mut [u8],
    pitch: usize,
) -> Result<()> {
    let sl = YuvLayout::compute(src_format, width, height, pitch)?;
    let dl = YuvLayout::compute(dst_format, width, height, pitch)?;
    sl.check_buffer(buf.len())?;
    dl.check_buffer(buf.len())?;

    if src_format == dst_format {
        return Ok(());
    }

    match (classify(src_format), classify(dst_format)) {
        (Class::Planar420, Class::Planar420) => planar_chroma_inplace(buf, &sl, &dl),
        (Class::Packed422, Class::Packed422) => {
            let perm = group_permutation(src_format, dst_format);
            let plane = sl.planes[0];
            for row in 0..plane.rows {
                let base = plane.offset + row * plane.pitch;
                for g in 0..sl.chroma_width {
                    let o = base + g * 4;
                    let group: [u8; 4] = buf[o..o + 4].try_into().expect("group of 4");
                    for (i, &p) in perm.iter().enumerate() {
                        buf[o + i] = group[p];
                    }
                }
            }
            Ok(())
        }
        (Class::Planar420, Class::Packed422) | (Class::Packed422, Class::Planar420) => {
            Err(Error::InPlaceUnsupported)
        }
        _ => Err(Error::UnsupportedConversion {
            src: src_format.name(),
            dst: dst_format.name(),
        }),
    }
}

// ============================================================================
// Identity and plane copies
// ============================================================================

fn copy_planes(src: &[u8], sl: &YuvLayout, dst: &mut [u8], dl: &YuvLayout) {
    // Matching pitches mean matching offsets, so one bulk copy covers all
    // planes including any inter-row padding.
    let same_geometry = sl
        .planes
        .iter()
        .zip(dl.planes.iter())
        .all(|(a, b)| a == b);
    if same_geometry {
        let total = sl.total_size();
        dst[..total].copy_from_slice(&src[..total]);
        return;
    }
    for i in 0..sl.planes.len() {
        copy_plane(src, sl, i, dst, dl, i);
    }
}

fn copy_plane(
    src: &[u8],
    sl: &YuvLayout,
    src_index: usize,
    dst: &mut [u8],
    dl: &YuvLayout,
    dst_index: usize,
) {
    let sp = sl.planes[src_index];
    let dp = dl.planes[dst_index];
    let row_bytes = sp.width_bytes.min(dp.width_bytes);
    for row in 0..sp.rows.min(dp.rows) {
        let s = sp.offset + row * sp.pitch;
        let d = dp.offset + row * dp.pitch;
        dst[d..d + row_bytes].copy_from_slice(&src[s..s + row_bytes]);
    }
}

// ============================================================================
// Planar <-> planar chroma
// ============================================================================

/// Chroma conversion between the four 8-bit 4:2:0 layouts. Luma is handled
/// by the caller.
fn planar_chroma(src: &[u8], sl: &YuvLayout, dst: &mut [u8], dl: &YuvLayout) {
    match (sl.u_v_plane_indices(), dl.u_v_plane_indices()) {
        // 3-plane to 3-plane: route each chroma plane to its new slot.
        (Some((su, sv)), Some((du, dv))) => {
            copy_plane(src, sl, su, dst, dl, du);
            copy_plane(src, sl, sv, dst, dl, dv);
        }
        // 3-plane to 2-plane: interleave U and V into chroma pairs.
        (Some((su, sv)), None) => {
            let up = sl.planes[su];
            let vp = sl.planes[sv];
            let uvp = dl.planes[1];
            let u_off = usize::from(!dl.format.u_before_v());
            for row in 0..uvp.rows {
                for cx in 0..sl.chroma_width {
                    let d = uvp.offset + row * uvp.pitch + cx * 2;
                    dst[d + u_off] = src[up.offset + row * up.pitch + cx];
                    dst[d + 1 - u_off] = src[vp.offset + row * vp.pitch + cx];
                }
            }
        }
        // 2-plane to 3-plane: split chroma pairs into separate planes.
        (None, Some((du, dv))) => {
            let uvp = sl.planes[1];
            let up = dl.planes[du];
            let vp = dl.planes[dv];
            let u_off = usize::from(!sl.format.u_before_v());
            for row in 0..uvp.rows {
                for cx in 0..sl.chroma_width {
                    let s = uvp.offset + row * uvp.pitch + cx * 2;
                    dst[up.offset + row * up.pitch + cx] = src[s + u_off];
                    dst[vp.offset + row * vp.pitch + cx] = src[s + 1 - u_off];
                }
            }
        }
        // 2-plane to 2-plane with opposite order: swap each pair.
        (None, None) => {
            let sp = sl.planes[1];
            let dp = dl.planes[1];
            for row in 0..sp.rows {
                for cx in 0..sl.chroma_width {
                    let s = sp.offset + row * sp.pitch + cx * 2;
                    let d = dp.offset + row * dp.pitch + cx * 2;
                    let (a, b) = (src[s], src[s + 1]);
                    dst[d] = b;
                    dst[d + 1] = a;
                }
            }
        }
    }
}

/// In-place variant: straightforward interleave or split corrupts adjacent
/// reads, so pack/split stage the chroma region through a temporary copy.
fn planar_chroma_inplace(buf: &mut [u8], sl: &YuvLayout, dl: &YuvLayout) -> Result<()> {
    match (sl.u_v_plane_indices(), dl.u_v_plane_indices()) {
        // I420 <-> YV12: exchange the two chroma plane contents.
        (Some(_), Some(_)) => {
            let p1 = sl.planes[1];
            let p2 = sl.planes[2];
            for row in 0..p1.rows {
                for cx in 0..p1.width_bytes {
                    buf.swap(
                        p1.offset + row * p1.pitch + cx,
                        p2.offset + row * p2.pitch + cx,
                    );
                }
            }
            Ok(())
        }
        // NV12 <-> NV21: swap bytes within each chroma pair.
        (None, None) => {
            let sp = sl.planes[1];
            for row in 0..sp.rows {
                let base = sp.offset + row * sp.pitch;
                for cx in 0..sl.chroma_width {
                    buf.swap(base + cx * 2, base + cx * 2 + 1);
                }
            }
            Ok(())
        }
        // Pack or split: stage the whole chroma region.
        _ => {
            let chroma_base = sl.planes[1].offset;
            let end = sl
                .total_size()
                .max(dl.total_size());
            let tmp = {
                let mut t = crate::converters::alloc_pixels(end - chroma_base)?;
                t.copy_from_slice(&buf[chroma_base..end]);
                t
            };
            // Rebase the source layout's chroma planes onto the temp copy.
            let mut rebased = sl.clone();
            for plane in rebased.planes.iter_mut().skip(1) {
                plane.offset -= chroma_base;
            }
            let mut shifted_dst = dl.clone();
            for plane in shifted_dst.planes.iter_mut() {
                plane.offset = plane.offset.wrapping_sub(chroma_base);
            }
            // Only chroma is rewritten; operate on the tail of the buffer.
            planar_chroma(&tmp, &rebased, &mut buf[chroma_base..], &shifted_dst);
            Ok(())
        }
    }
}

// ============================================================================
// Planar <-> packed reshape
// ============================================================================

/// Chroma plane views: (u, v, pitch, step) over shifted slices, covering
/// both separate planes (step 1) and an interleaved pair (step 2).
fn chroma_views<'a>(buf: &'a [u8], layout: &YuvLayout) -> (&'a [u8], &'a [u8], usize, usize) {
    if let Some((ui, vi)) = layout.u_v_plane_indices() {
        (
            layout.plane(buf, ui),
            layout.plane(buf, vi),
            layout.planes[ui].pitch,
            1,
        )
    } else {
        let uv = layout.plane(buf, 1);
        let pitch = layout.planes[1].pitch;
        if layout.format.u_before_v() {
            (uv, &uv[1..], pitch, 2)
        } else {
            (&uv[1..], uv, pitch, 2)
        }
    }
}

fn planar_to_packed(src: &[u8], sl: &YuvLayout, dst: &mut [u8], dl: &YuvLayout) {
    let offs = dl.format.packed_offsets().expect("packed destination");
    let y_plane = sl.planes[0];
    let dst_plane = dl.planes[0];
    let (u_plane, v_plane, c_pitch, step) = chroma_views(src, sl);
    let w = sl.width;

    for cy in 0..sl.chroma_height {
        // Both rows of the 2x2 block share one chroma sample; an odd-height
        // tail has only the top row.
        let rows = (sl.height - cy * 2).min(2);
        for r in 0..rows {
            let row = cy * 2 + r;
            let y_base = y_plane.offset + row * y_plane.pitch;
            let d_base = dst_plane.offset + row * dst_plane.pitch;
            for cx in 0..sl.chroma_width {
                let u = u_plane[cy * c_pitch + cx * step];
                let v = v_plane[cy * c_pitch + cx * step];
                let y0 = src[y_base + cx * 2];
                let y1 = if cx * 2 + 1 < w {
                    src[y_base + cx * 2 + 1]
                } else {
                    y0
                };
                let group = &mut dst[d_base + cx * 4..d_base + cx * 4 + 4];
                group[offs[0]] = y0;
                group[offs[2]] = y1;
                group[offs[1]] = u;
                group[offs[3]] = v;
            }
        }
    }
}

fn packed_to_planar(src: &[u8], sl: &YuvLayout, dst: &mut [u8], dl: &YuvLayout) {
    let offs = sl.format.packed_offsets().expect("packed source");
    let src_plane = sl.planes[0];
    let y_plane = dl.planes[0];
    let w = dl.width;

    // Luma: copied per pixel at full resolution.
    for row in 0..dl.height {
        let s_base = src_plane.offset + row * src_plane.pitch;
        let d_base = y_plane.offset + row * y_plane.pitch;
        for cx in 0..dl.chroma_width {
            let group = &src[s_base + cx * 4..s_base + cx * 4 + 4];
            dst[d_base + cx * 2] = group[offs[0]];
            if cx * 2 + 1 < w {
                dst[d_base + cx * 2 + 1] = group[offs[2]];
            }
        }
    }

    // Chroma: the two packed rows feeding one 4:2:0 sample are averaged;
    // an odd-height tail contributes a single row.
    for cy in 0..dl.chroma_height {
        let rows = (dl.height - cy * 2).min(2);
        for cx in 0..dl.chroma_width {
            let mut sum_u = 0u32;
            let mut sum_v = 0u32;
            for r in 0..rows {
                let base = src_plane.offset + (cy * 2 + r) * src_plane.pitch + cx * 4;
                sum_u += u32::from(src[base + offs[1]]);
                sum_v += u32::from(src[base + offs[3]]);
            }
            let u = avg_block(sum_u, rows as u32) as u8;
            let v = avg_block(sum_v, rows as u32) as u8;

            if let Some((ui, vi)) = dl.u_v_plane_indices() {
                let up = dl.planes[ui];
                let vp = dl.planes[vi];
                dst[up.offset + cy * up.pitch + cx] = u;
                dst[vp.offset + cy * vp.pitch + cx] = v;
            } else {
                let uvp = dl.planes[1];
                let base = uvp.offset + cy * uvp.pitch + cx * 2;
                let u_off = usize::from(!dl.format.u_before_v());
                dst[base + u_off] = u;
                dst[base + 1 - u_off] = v;
            }
        }
    }
}
