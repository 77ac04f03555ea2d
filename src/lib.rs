//! # yuvkit
//!
//! YUV pixel format and colorspace conversion for software video rendering.
//!
//! yuvkit converts chroma-subsampled video frames between YUV layouts
//! (planar, semi-planar, packed) and to/from RGB, operating purely on
//! caller-supplied in-memory buffers.
//!
//! ## Features
//!
//! - **Layout descriptors**: plane offsets/pitches computed per call, with
//!   overflow-checked size arithmetic usable before allocation
//! - **YUV ↔ RGB**: fixed-point BT.601 / BT.709 / full-range JPEG matrices,
//!   with runtime-dispatched vectorized kernels
//! - **YUV ↔ YUV**: plane swap, interleave/split, 4:2:0 ↔ 4:2:2 reshape,
//!   packed byte permutation
//! - **Software textures**: partial-rectangle uploads plus a present path
//!   that converts (and stretches, when needed) into an RGB destination
//!
//! ## Quick Start
//!
//! ```rust
//! use yuvkit::prelude::*;
//!
//! let (size, pitch) = compute_yuv_size(YuvFormat::I420, 640, 480)?;
//! let frame = vec![0u8; size];
//!
//! let mut rgb = vec![0u8; 640 * 480 * 4];
//! yuv_to_rgb(
//!     640, 480,
//!     YuvFormat::I420, &frame, pitch,
//!     RgbFormat::Rgba, &mut rgb, 640 * 4,
//!     ColorimetryMode::Automatic,
//! )?;
//! # Ok::<(), yuvkit::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod converters;
pub mod error;
pub mod format;
pub mod layout;
pub mod texture;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::converters::{rgb_to_yuv, yuv_to_rgb, yuv_to_yuv, yuv_to_yuv_inplace};
    pub use crate::error::{Error, Result};
    pub use crate::format::{ColorMatrix, ColorimetryMode, RgbFormat, YuvFormat};
    pub use crate::layout::{compute_yuv_size, YuvLayout};
    pub use crate::texture::{Rect, YuvTexture};
}

pub use error::{Error, Result};
