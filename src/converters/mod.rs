//! Pixel data converters.
//!
//! This module provides the conversion engine between YUV layouts and
//! to/from packed RGB:
//!
//! - [`yuv_to_rgb`] / [`rgb_to_yuv`]: colorspace transcoding with
//!   fixed-point BT.601 / BT.709 / full-range JPEG matrices
//! - [`yuv_to_yuv`] / [`yuv_to_yuv_inplace`]: layout transcoding between
//!   YUV formats (plane swap, interleave/split, 4:2:0 ↔ 4:2:2 reshape,
//!   packed byte permutation)
//! - [`convert_rgb`]: packed-RGB repacking (channel swizzle, alpha add/drop)
//! - [`scale_rgb`]: RGB surface stretching
//!
//! All converters operate on caller-supplied buffers and complete
//! synchronously; nothing here allocates beyond short-lived intermediate
//! buffers for fallback paths.
//!
//! # Example
//!
//! ```rust,ignore
//! use yuvkit::converters::yuv_to_rgb;
//! use yuvkit::format::{ColorimetryMode, RgbFormat, YuvFormat};
//!
//! yuv_to_rgb(
//!     1920, 1080,
//!     YuvFormat::Nv12, &frame, 1920,
//!     RgbFormat::Bgra, &mut out, 1920 * 4,
//!     ColorimetryMode::Automatic,
//! )?;
//! ```

pub(crate) mod colorspace;
pub(crate) mod kernels;
mod repack;
mod rgb;
mod scale;

pub use colorspace::{rgb_to_yuv, yuv_to_rgb};
pub use repack::{yuv_to_yuv, yuv_to_yuv_inplace};
pub use rgb::convert_rgb;
pub use scale::{scale_rgb, ScaleAlgorithm};

use crate::error::{Error, Result};

/// Resolve an RGB pitch argument (0 means "derive from width").
pub(crate) fn resolve_rgb_pitch(width: u32, bytes_per_pixel: usize, pitch: usize) -> Result<usize> {
    let row_bytes = width as usize * bytes_per_pixel;
    let pitch = if pitch == 0 { row_bytes } else { pitch };
    if pitch < row_bytes {
        return Err(Error::Config(format!(
            "pitch {pitch} smaller than row width {row_bytes}"
        )));
    }
    Ok(pitch)
}

/// Validate that an RGB buffer covers `height` rows at the given pitch.
pub(crate) fn check_rgb_extent(
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
    pitch: usize,
    len: usize,
    what: &str,
) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Error::Config(format!(
            "dimensions must be non-zero, got {width}x{height}"
        )));
    }
    let needed = (height as usize - 1) * pitch + width as usize * bytes_per_pixel;
    if len < needed {
        return Err(Error::Config(format!(
            "{what} buffer too small: {len} < {needed}"
        )));
    }
    Ok(())
}

/// Allocate a zeroed intermediate pixel buffer, surfacing allocation failure
/// instead of aborting.
pub(crate) fn alloc_pixels(len: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| Error::OutOfMemory)?;
    buf.resize(len, 0);
    Ok(buf)
}
