//! Runtime-dispatched conversion kernels.
//!
//! The hot row loops live here, compiled three ways: a portable scalar
//! build, an x86-64 AVX2 build and an aarch64 NEON build. The vector builds
//! wrap the *same* `#[inline(always)]` body in a `#[target_feature]`
//! function, so the compiler may vectorize them while the integer semantics
//! stay identical to the scalar path. Kernel choice is a performance
//! decision only; all paths produce bit-identical output.
//!
//! The capability probe runs once per process and caches its result.

use std::sync::OnceLock;

use tracing::debug;

use super::colorspace::YuvToRgbCoeffs;

/// Which kernel build the probe selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Kernel {
    /// Portable scalar path, always available.
    Scalar,
    /// AVX2 build on x86-64.
    #[cfg(target_arch = "x86_64")]
    Avx2,
    /// NEON build on aarch64.
    #[cfg(target_arch = "aarch64")]
    Neon,
}

static ACTIVE: OnceLock<Kernel> = OnceLock::new();

/// The kernel selected for this process.
pub(crate) fn active() -> Kernel {
    *ACTIVE.get_or_init(probe)
}

fn probe() -> Kernel {
    #[cfg(target_arch = "x86_64")]
    if std::arch::is_x86_feature_detected!("avx2") {
        debug!(kernel = "avx2", "selected conversion kernel");
        return Kernel::Avx2;
    }
    #[cfg(target_arch = "aarch64")]
    if std::arch::is_aarch64_feature_detected!("neon") {
        debug!(kernel = "neon", "selected conversion kernel");
        return Kernel::Neon;
    }
    debug!(kernel = "scalar", "selected conversion kernel");
    Kernel::Scalar
}

#[inline(always)]
fn store_rgb32(px: &mut [u8], rgb: (u8, u8, u8), ch: [usize; 4]) {
    px[ch[0]] = rgb.0;
    px[ch[1]] = rgb.1;
    px[ch[2]] = rgb.2;
    px[ch[3]] = 255;
}

// ============================================================================
// 4:2:0 planar/semi-planar -> 32-bit RGB
// ============================================================================

/// Shared row loop. `uv_step` is 1 for separate chroma planes, 2 for an
/// interleaved pair; `v_plane` may be a one-byte-shifted view of the same
/// interleaved plane.
#[allow(clippy::too_many_arguments)]
#[inline(always)]
pub(crate) fn planar420_to_rgb32_body(
    width: usize,
    height: usize,
    y_plane: &[u8],
    y_pitch: usize,
    u_plane: &[u8],
    v_plane: &[u8],
    c_pitch: usize,
    uv_step: usize,
    co: &YuvToRgbCoeffs,
    dst: &mut [u8],
    dst_pitch: usize,
    ch: [usize; 4],
) {
    for row in 0..height {
        let y_row = &y_plane[row * y_pitch..];
        let c_base = (row / 2) * c_pitch;
        let u_row = &u_plane[c_base..];
        let v_row = &v_plane[c_base..];
        let dst_row = &mut dst[row * dst_pitch..];

        let mut col = 0;
        while col < width {
            // One chroma sample covers up to 2 horizontal luma samples.
            let u = i32::from(u_row[(col / 2) * uv_step]);
            let v = i32::from(v_row[(col / 2) * uv_step]);
            let n = (width - col).min(2);
            for i in 0..n {
                let y = i32::from(y_row[col + i]);
                let px = &mut dst_row[(col + i) * 4..(col + i) * 4 + 4];
                store_rgb32(px, co.to_rgb(y, u, v), ch);
            }
            col += 2;
        }
    }
}

#[cfg(target_arch = "x86_64")]
#[allow(clippy::too_many_arguments)]
#[target_feature(enable = "avx2")]
unsafe fn planar420_to_rgb32_avx2(
    width: usize,
    height: usize,
    y_plane: &[u8],
    y_pitch: usize,
    u_plane: &[u8],
    v_plane: &[u8],
    c_pitch: usize,
    uv_step: usize,
    co: &YuvToRgbCoeffs,
    dst: &mut [u8],
    dst_pitch: usize,
    ch: [usize; 4],
) {
    planar420_to_rgb32_body(
        width, height, y_plane, y_pitch, u_plane, v_plane, c_pitch, uv_step, co, dst, dst_pitch,
        ch,
    )
}

#[cfg(target_arch = "aarch64")]
#[allow(clippy::too_many_arguments)]
#[target_feature(enable = "neon")]
unsafe fn planar420_to_rgb32_neon(
    width: usize,
    height: usize,
    y_plane: &[u8],
    y_pitch: usize,
    u_plane: &[u8],
    v_plane: &[u8],
    c_pitch: usize,
    uv_step: usize,
    co: &YuvToRgbCoeffs,
    dst: &mut [u8],
    dst_pitch: usize,
    ch: [usize; 4],
) {
    planar420_to_rgb32_body(
        width, height, y_plane, y_pitch, u_plane, v_plane, c_pitch, uv_step, co, dst, dst_pitch,
        ch,
    )
}

/// Dispatched entry point for the 4:2:0 to 32-bit RGB kernel.
#[allow(clippy::too_many_arguments)]
pub(crate) fn planar420_to_rgb32(
    width: usize,
    height: usize,
    y_plane: &[u8],
    y_pitch: usize,
    u_plane: &[u8],
    v_plane: &[u8],
    c_pitch: usize,
    uv_step: usize,
    co: &YuvToRgbCoeffs,
    dst: &mut [u8],
    dst_pitch: usize,
    ch: [usize; 4],
) {
    match active() {
        #[cfg(target_arch = "x86_64")]
        // SAFETY: probe() verified AVX2 support.
        Kernel::Avx2 => unsafe {
            planar420_to_rgb32_avx2(
                width, height, y_plane, y_pitch, u_plane, v_plane, c_pitch, uv_step, co, dst,
                dst_pitch, ch,
            )
        },
        #[cfg(target_arch = "aarch64")]
        // SAFETY: probe() verified NEON support.
        Kernel::Neon => unsafe {
            planar420_to_rgb32_neon(
                width, height, y_plane, y_pitch, u_plane, v_plane, c_pitch, uv_step, co, dst,
                dst_pitch, ch,
            )
        },
        Kernel::Scalar => planar420_to_rgb32_body(
            width, height, y_plane, y_pitch, u_plane, v_plane, c_pitch, uv_step, co, dst,
            dst_pitch, ch,
        ),
    }
}

// ============================================================================
// Packed 4:2:2 -> 32-bit RGB
// ============================================================================

/// Shared row loop. `offs` holds the `[y0, u, y1, v]` byte positions within
/// one 4-byte group.
#[allow(clippy::too_many_arguments)]
#[inline(always)]
pub(crate) fn packed422_to_rgb32_body(
    width: usize,
    height: usize,
    src: &[u8],
    src_pitch: usize,
    offs: [usize; 4],
    co: &YuvToRgbCoeffs,
    dst: &mut [u8],
    dst_pitch: usize,
    ch: [usize; 4],
) {
    for row in 0..height {
        let src_row = &src[row * src_pitch..];
        let dst_row = &mut dst[row * dst_pitch..];

        let mut col = 0;
        while col < width {
            let group = &src_row[(col / 2) * 4..];
            let u = i32::from(group[offs[1]]);
            let v = i32::from(group[offs[3]]);

            let y0 = i32::from(group[offs[0]]);
            let px = &mut dst_row[col * 4..col * 4 + 4];
            store_rgb32(px, co.to_rgb(y0, u, v), ch);

            if col + 1 < width {
                let y1 = i32::from(group[offs[2]]);
                let px = &mut dst_row[(col + 1) * 4..(col + 1) * 4 + 4];
                store_rgb32(px, co.to_rgb(y1, u, v), ch);
            }
            col += 2;
        }
    }
}

#[cfg(target_arch = "x86_64")]
#[allow(clippy::too_many_arguments)]
#[target_feature(enable = "avx2")]
unsafe fn packed422_to_rgb32_avx2(
    width: usize,
    height: usize,
    src: &[u8],
    src_pitch: usize,
    offs: [usize; 4],
    co: &YuvToRgbCoeffs,
    dst: &mut [u8],
    dst_pitch: usize,
    ch: [usize; 4],
) {
    packed422_to_rgb32_body(width, height, src, src_pitch, offs, co, dst, dst_pitch, ch)
}

#[cfg(target_arch = "aarch64")]
#[allow(clippy::too_many_arguments)]
#[target_feature(enable = "neon")]
unsafe fn packed422_to_rgb32_neon(
    width: usize,
    height: usize,
    src: &[u8],
    src_pitch: usize,
    offs: [usize; 4],
    co: &YuvToRgbCoeffs,
    dst: &mut [u8],
    dst_pitch: usize,
    ch: [usize; 4],
) {
    packed422_to_rgb32_body(width, height, src, src_pitch, offs, co, dst, dst_pitch, ch)
}

/// Dispatched entry point for the packed 4:2:2 to 32-bit RGB kernel.
#[allow(clippy::too_many_arguments)]
pub(crate) fn packed422_to_rgb32(
    width: usize,
    height: usize,
    src: &[u8],
    src_pitch: usize,
    offs: [usize; 4],
    co: &YuvToRgbCoeffs,
    dst: &mut [u8],
    dst_pitch: usize,
    ch: [usize; 4],
) {
    match active() {
        #[cfg(target_arch = "x86_64")]
        // SAFETY: probe() verified AVX2 support.
        Kernel::Avx2 => unsafe {
            packed422_to_rgb32_avx2(width, height, src, src_pitch, offs, co, dst, dst_pitch, ch)
        },
        #[cfg(target_arch = "aarch64")]
        // SAFETY: probe() verified NEON support.
        Kernel::Neon => unsafe {
            packed422_to_rgb32_neon(width, height, src, src_pitch, offs, co, dst, dst_pitch, ch)
        },
        Kernel::Scalar => {
            packed422_to_rgb32_body(width, height, src, src_pitch, offs, co, dst, dst_pitch, ch)
        }
    }
}

// ============================================================================
// Packed 4:2:2 byte permutation
// ============================================================================

/// Shared row loop. `perm[i]` is the source byte index feeding destination
/// byte `i` within each 4-byte group.
#[inline(always)]
pub(crate) fn permute_packed_body(
    groups_per_row: usize,
    height: usize,
    src: &[u8],
    src_pitch: usize,
    dst: &mut [u8],
    dst_pitch: usize,
    perm: [usize; 4],
) {
    for row in 0..height {
        let src_row = &src[row * src_pitch..];
        let dst_row = &mut dst[row * dst_pitch..];
        for g in 0..groups_per_row {
            let s = &src_row[g * 4..g * 4 + 4];
            let d = &mut dst_row[g * 4..g * 4 + 4];
            d[0] = s[perm[0]];
            d[1] = s[perm[1]];
            d[2] = s[perm[2]];
            d[3] = s[perm[3]];
        }
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn permute_packed_avx2(
    groups_per_row: usize,
    height: usize,
    src: &[u8],
    src_pitch: usize,
    dst: &mut [u8],
    dst_pitch: usize,
    perm: [usize; 4],
) {
    permute_packed_body(groups_per_row, height, src, src_pitch, dst, dst_pitch, perm)
}

#[cfg(target_arch = "aarch64")]
#[target_feature(enable = "neon")]
unsafe fn permute_packed_neon(
    groups_per_row: usize,
    height: usize,
    src: &[u8],
    src_pitch: usize,
    dst: &mut [u8],
    dst_pitch: usize,
    perm: [usize; 4],
) {
    permute_packed_body(groups_per_row, height, src, src_pitch, dst, dst_pitch, perm)
}

/// Dispatched entry point for the packed group permutation kernel.
pub(crate) fn permute_packed(
    groups_per_row: usize,
    height: usize,
    src: &[u8],
    src_pitch: usize,
    dst: &mut [u8],
    dst_pitch: usize,
    perm: [usize; 4],
) {
    match active() {
        #[cfg(target_arch = "x86_64")]
        // SAFETY: probe() verified AVX2 support.
        Kernel::Avx2 => unsafe {
            permute_packed_avx2(groups_per_row, height, src, src_pitch, dst, dst_pitch, perm)
        },
        #[cfg(target_arch = "aarch64")]
        // SAFETY: probe() verified NEON support.
        Kernel::Neon => unsafe {
            permute_packed_neon(groups_per_row, height, src, src_pitch, dst, dst_pitch, perm)
        },
        Kernel::Scalar => {
            permute_packed_body(groups_per_row, height, src, src_pitch, dst, dst_pitch, perm)
        }
    }
}
