//! Pixel format descriptions.
//!
//! This module provides type-safe descriptions of the YUV and RGB pixel
//! formats handled by the converters, plus the colorimetry (color matrix)
//! selection used for YUV ↔ RGB transforms.
//!
//! # Design Principles
//!
//! - **Type safety**: Use enums instead of stringly-typed formats
//! - **Zero-cost**: Small, Copy types; all geometry derived from the tag
//! - **Explicit**: The format tag fully determines plane count, chroma
//!   subsampling, and byte layout

use crate::error::{Error, Result};

const fn fourcc(code: &[u8; 4]) -> u32 {
    u32::from_le_bytes(*code)
}

// ============================================================================
// YuvFormat
// ============================================================================

/// YUV pixel format enumeration.
///
/// All formats use 4:2:0 chroma subsampling (chroma halved on both axes)
/// except the packed variants, which use 4:2:2 (halved horizontally only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum YuvFormat {
    /// Planar 4:2:0: Y plane, then U plane, then V plane.
    I420,
    /// Planar 4:2:0: Y plane, then V plane, then U plane.
    Yv12,
    /// Semi-planar 4:2:0: Y plane, then interleaved U,V plane.
    Nv12,
    /// Semi-planar 4:2:0: Y plane, then interleaved V,U plane.
    Nv21,
    /// Semi-planar 4:2:0 with 16-bit samples: Y plane, then interleaved U,V.
    P010,
    /// Packed 4:2:2, groups of `[Y0 U Y1 V]` covering 2 pixels.
    Yuy2,
    /// Packed 4:2:2, groups of `[U Y0 V Y1]` covering 2 pixels.
    Uyvy,
    /// Packed 4:2:2, groups of `[Y0 V Y1 U]` covering 2 pixels.
    Yvyu,
}

impl YuvFormat {
    /// All supported YUV formats.
    pub const ALL: [YuvFormat; 8] = [
        YuvFormat::I420,
        YuvFormat::Yv12,
        YuvFormat::Nv12,
        YuvFormat::Nv21,
        YuvFormat::P010,
        YuvFormat::Yuy2,
        YuvFormat::Uyvy,
        YuvFormat::Yvyu,
    ];

    /// Parse a FourCC code (V4L2/DRM convention, little-endian byte order).
    pub fn from_fourcc(code: u32) -> Result<Self> {
        match code {
            c if c == fourcc(b"YU12") || c == fourcc(b"I420") => Ok(YuvFormat::I420),
            c if c == fourcc(b"YV12") => Ok(YuvFormat::Yv12),
            c if c == fourcc(b"NV12") => Ok(YuvFormat::Nv12),
            c if c == fourcc(b"NV21") => Ok(YuvFormat::Nv21),
            c if c == fourcc(b"P010") => Ok(YuvFormat::P010),
            c if c == fourcc(b"YUYV") || c == fourcc(b"YUY2") => Ok(YuvFormat::Yuy2),
            c if c == fourcc(b"UYVY") => Ok(YuvFormat::Uyvy),
            c if c == fourcc(b"YVYU") => Ok(YuvFormat::Yvyu),
            other => Err(Error::UnsupportedFormat(other)),
        }
    }

    /// The canonical FourCC code for this format.
    pub fn fourcc(&self) -> u32 {
        match self {
            YuvFormat::I420 => fourcc(b"YU12"),
            YuvFormat::Yv12 => fourcc(b"YV12"),
            YuvFormat::Nv12 => fourcc(b"NV12"),
            YuvFormat::Nv21 => fourcc(b"NV21"),
            YuvFormat::P010 => fourcc(b"P010"),
            YuvFormat::Yuy2 => fourcc(b"YUYV"),
            YuvFormat::Uyvy => fourcc(b"UYVY"),
            YuvFormat::Yvyu => fourcc(b"YVYU"),
        }
    }

    /// Short name, for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            YuvFormat::I420 => "I420",
            YuvFormat::Yv12 => "YV12",
            YuvFormat::Nv12 => "NV12",
            YuvFormat::Nv21 => "NV21",
            YuvFormat::P010 => "P010",
            YuvFormat::Yuy2 => "YUY2",
            YuvFormat::Uyvy => "UYVY",
            YuvFormat::Yvyu => "YVYU",
        }
    }

    /// Number of planes in a buffer of this format.
    pub fn plane_count(&self) -> usize {
        match self {
            YuvFormat::I420 | YuvFormat::Yv12 => 3,
            YuvFormat::Nv12 | YuvFormat::Nv21 | YuvFormat::P010 => 2,
            YuvFormat::Yuy2 | YuvFormat::Uyvy | YuvFormat::Yvyu => 1,
        }
    }

    /// True for the packed 4:2:2 formats.
    pub fn is_packed(&self) -> bool {
        self.plane_count() == 1
    }

    /// True for the semi-planar (interleaved-chroma) formats.
    pub fn is_semi_planar(&self) -> bool {
        self.plane_count() == 2
    }

    /// True for the 3-plane formats.
    pub fn is_three_plane(&self) -> bool {
        self.plane_count() == 3
    }

    /// Bytes per luma sample (2 for the 16-bit formats, otherwise 1).
    pub fn bytes_per_luma(&self) -> usize {
        match self {
            YuvFormat::P010 => 2,
            _ => 1,
        }
    }

    /// True if the U sample precedes the V sample in the byte layout.
    pub fn u_before_v(&self) -> bool {
        !matches!(self, YuvFormat::Yv12 | YuvFormat::Nv21 | YuvFormat::Yvyu)
    }

    /// Byte offsets `[y0, u, y1, v]` within one 4-byte packed group.
    ///
    /// Returns `None` for non-packed formats.
    pub fn packed_offsets(&self) -> Option<[usize; 4]> {
        match self {
            YuvFormat::Yuy2 => Some([0, 1, 2, 3]),
            YuvFormat::Uyvy => Some([1, 0, 3, 2]),
            YuvFormat::Yvyu => Some([0, 3, 2, 1]),
            _ => None,
        }
    }
}

// ============================================================================
// RgbFormat
// ============================================================================

/// Packed RGB pixel format enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RgbFormat {
    /// 4 bytes per pixel: R, G, B, A.
    ///
    /// This is also the fixed intermediate layout used when no direct
    /// conversion kernel exists for a format pair.
    Rgba,
    /// 4 bytes per pixel: B, G, R, A.
    Bgra,
    /// 3 bytes per pixel: R, G, B.
    Rgb24,
    /// 3 bytes per pixel: B, G, R.
    Bgr24,
}

impl RgbFormat {
    /// Bytes per pixel.
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            RgbFormat::Rgba | RgbFormat::Bgra => 4,
            RgbFormat::Rgb24 | RgbFormat::Bgr24 => 3,
        }
    }

    /// True if the format carries an alpha byte.
    pub fn has_alpha(&self) -> bool {
        self.bytes_per_pixel() == 4
    }

    /// Byte offsets of the R, G, B channels and alpha (if present).
    pub fn channel_offsets(&self) -> (usize, usize, usize, Option<usize>) {
        match self {
            RgbFormat::Rgba => (0, 1, 2, Some(3)),
            RgbFormat::Bgra => (2, 1, 0, Some(3)),
            RgbFormat::Rgb24 => (0, 1, 2, None),
            RgbFormat::Bgr24 => (2, 1, 0, None),
        }
    }

    /// Short name, for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            RgbFormat::Rgba => "RGBA",
            RgbFormat::Bgra => "BGRA",
            RgbFormat::Rgb24 => "RGB24",
            RgbFormat::Bgr24 => "BGR24",
        }
    }
}

// ============================================================================
// Colorimetry
// ============================================================================

/// Color matrix for YUV ↔ RGB conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMatrix {
    /// Full-range "JPEG" matrix (luma offset 0).
    Jpeg,
    /// Studio-range BT.601 (SD video, luma offset 16).
    Bt601,
    /// Studio-range BT.709 (HD video, luma offset 16).
    Bt709,
}

/// Frame height at or below which automatic mode selects BT.601.
const SD_HEIGHT_THRESHOLD: u32 = 576;

/// Colorimetry selection policy, threaded explicitly through every
/// conversion call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorimetryMode {
    /// Pick BT.601 for SD frame heights, BT.709 above.
    #[default]
    Automatic,
    /// Force the full-range JPEG matrix.
    Jpeg,
    /// Force studio-range BT.601.
    Bt601,
    /// Force studio-range BT.709.
    Bt709,
}

impl ColorimetryMode {
    /// Resolve the active color matrix for a frame of the given height.
    pub fn resolve(&self, height: u32) -> ColorMatrix {
        match self {
            ColorimetryMode::Jpeg => ColorMatrix::Jpeg,
            ColorimetryMode::Bt601 => ColorMatrix::Bt601,
            ColorimetryMode::Bt709 => ColorMatrix::Bt709,
            ColorimetryMode::Automatic => {
                if height <= SD_HEIGHT_THRESHOLD {
                    ColorMatrix::Bt601
                } else {
                    ColorMatrix::Bt709
                }
            }
        }
    }
}
