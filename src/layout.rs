//! Plane layout arithmetic.
//!
//! A [`YuvLayout`] describes where each plane of a YUV buffer lives: byte
//! offsets, pitches and row counts computed from a format tag, dimensions
//! and an optional caller-supplied pitch. Layouts are cheap, stack-only
//! values recomputed on every call — pitch and base buffer are call
//! parameters, so nothing here is worth caching.
//!
//! [`compute_yuv_size`] is the allocation-time companion: it returns the
//! byte size and native pitch for a format, with every intermediate
//! multiplication and addition overflow-checked. Partial products can wrap
//! long before the final sum does, so each step fails fast with
//! [`Error::Overflow`] instead of wrapping.

use crate::error::{Error, Result};
use crate::format::YuvFormat;
use smallvec::SmallVec;

/// One plane of a YUV buffer: an offset/pitch window into a shared buffer.
///
/// Offsets and lengths are indices into the caller-owned region, never raw
/// addresses; use [`YuvLayout::plane`] / [`YuvLayout::plane_mut`] to obtain
/// bounds-checked slices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plane {
    /// Byte offset of the plane's first row within the buffer.
    pub offset: usize,
    /// Byte distance between consecutive rows.
    pub pitch: usize,
    /// Number of rows in the plane.
    pub rows: usize,
    /// Bytes of pixel data per row (may be less than `pitch`).
    pub width_bytes: usize,
}

impl Plane {
    /// Byte range covered by this plane, excluding padding after the last row.
    pub fn range(&self) -> std::ops::Range<usize> {
        let end = self.offset + (self.rows - 1) * self.pitch + self.width_bytes;
        self.offset..end
    }
}

/// Derived plane layout for one (format, width, height, pitch) combination.
#[derive(Debug, Clone)]
pub struct YuvLayout {
    /// Format this layout was computed for.
    pub format: YuvFormat,
    /// Luma width in samples.
    pub width: usize,
    /// Luma height in rows.
    pub height: usize,
    /// Chroma plane width in samples, `ceil(width / 2)`.
    pub chroma_width: usize,
    /// Chroma plane height in rows: `ceil(height / 2)` for 4:2:0 layouts,
    /// `height` for packed 4:2:2.
    pub chroma_height: usize,
    /// Planes in buffer order.
    pub planes: SmallVec<[Plane; 3]>,
}

impl YuvLayout {
    /// Compute the layout for a buffer of `format` at `width` x `height`.
    ///
    /// A `pitch` of 0 derives the native pitch from the width. An explicit
    /// pitch must be at least the native row width in bytes.
    pub fn compute(format: YuvFormat, width: u32, height: u32, pitch: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::Config(format!(
                "dimensions must be non-zero, got {width}x{height}"
            )));
        }

        let w = width as usize;
        let h = height as usize;
        let cw = w.div_ceil(2);
        let bpl = format.bytes_per_luma();

        let native_pitch = if format.is_packed() {
            checked_mul(cw, 4)?
        } else {
            checked_mul(w, bpl)?
        };
        let pitch = if pitch == 0 { native_pitch } else { pitch };
        if pitch < native_pitch {
            return Err(Error::Config(format!(
                "pitch {pitch} smaller than native row width {native_pitch}"
            )));
        }

        let mut planes: SmallVec<[Plane; 3]> = SmallVec::new();
        let chroma_height;

        if format.is_packed() {
            chroma_height = h;
            planes.push(Plane {
                offset: 0,
                pitch,
                rows: h,
                width_bytes: native_pitch,
            });
        } else {
            let ch = h.div_ceil(2);
            chroma_height = ch;
            let luma_extent = checked_mul(pitch, h)?;
            planes.push(Plane {
                offset: 0,
                pitch,
                rows: h,
                width_bytes: checked_mul(w, bpl)?,
            });

            let half_pitch = pitch.div_ceil(2);
            if format.is_three_plane() {
                // One chroma sample per byte, two separate planes.
                let chroma_extent = checked_mul(half_pitch, ch)?;
                planes.push(Plane {
                    offset: luma_extent,
                    pitch: half_pitch,
                    rows: ch,
                    width_bytes: cw,
                });
                planes.push(Plane {
                    offset: checked_add(luma_extent, chroma_extent)?,
                    pitch: half_pitch,
                    rows: ch,
                    width_bytes: cw,
                });
            } else {
                // Interleaved chroma pairs in a single plane.
                let chroma_pitch = checked_mul(half_pitch, 2)?;
                planes.push(Plane {
                    offset: luma_extent,
                    pitch: chroma_pitch,
                    rows: ch,
                    width_bytes: checked_mul(cw, 2 * bpl)?,
                });
            }
        }

        // Validate the final extent is representable.
        let last = planes.last().expect("at least one plane");
        checked_add(
            last.offset,
            checked_add(checked_mul(last.rows - 1, last.pitch)?, last.width_bytes)?,
        )?;

        Ok(Self {
            format,
            width: w,
            height: h,
            chroma_width: cw,
            chroma_height,
            planes,
        })
    }

    /// Total byte extent of the layout (end of the last plane's pixel data).
    pub fn total_size(&self) -> usize {
        self.planes
            .iter()
            .map(|p| p.range().end)
            .max()
            .unwrap_or(0)
    }

    /// Validate that a buffer of `len` bytes covers the whole layout.
    pub fn check_buffer(&self, len: usize) -> Result<()> {
        let needed = self.total_size();
        if len < needed {
            return Err(Error::Config(format!(
                "buffer too small for {} layout: {len} < {needed}",
                self.format.name()
            )));
        }
        Ok(())
    }

    /// Borrow one plane out of a shared buffer.
    pub fn plane<'a>(&self, buf: &'a [u8], index: usize) -> &'a [u8] {
        &buf[self.planes[index].range()]
    }

    /// Mutably borrow one plane out of a shared buffer.
    pub fn plane_mut<'a>(&self, buf: &'a mut [u8], index: usize) -> &'a mut [u8] {
        &mut buf[self.planes[index].range()]
    }

    /// Plane indices of the U and V planes, in that order, for 3-plane formats.
    pub fn u_v_plane_indices(&self) -> Option<(usize, usize)> {
        if self.format.is_three_plane() {
            if self.format.u_before_v() {
                Some((1, 2))
            } else {
                Some((2, 1))
            }
        } else {
            None
        }
    }
}

/// Compute `(size_in_bytes, pitch_in_bytes)` for a frame of `format` at
/// `width` x `height`, without allocating.
///
/// Every arithmetic step is overflow-checked; the call fails with
/// [`Error::Overflow`] rather than wrapping.
///
/// - Packed 4:2:2: one 4-byte group per 2 horizontal luma samples, so
///   `pitch = ceil(w/2) * 4` and `size = pitch * h`.
/// - Planar and semi-planar 4:2:0: `size = w*h + 2*ceil(w/2)*ceil(h/2)`
///   (doubled, not tripled, for 2-plane layouts — both chroma channels share
///   one plane of that size). 16-bit variants double the byte totals.
pub fn compute_yuv_size(format: YuvFormat, width: u32, height: u32) -> Result<(usize, usize)> {
    if width == 0 || height == 0 {
        return Err(Error::Config(format!(
            "dimensions must be non-zero, got {width}x{height}"
        )));
    }

    let w = width as usize;
    let h = height as usize;
    let cw = w.div_ceil(2);

    if format.is_packed() {
        let pitch = checked_mul(cw, 4)?;
        let size = checked_mul(pitch, h)?;
        return Ok((size, pitch));
    }

    let ch = h.div_ceil(2);
    let luma = checked_mul(w, h)?;
    let chroma = checked_mul(2, checked_mul(cw, ch)?)?;
    let samples = checked_add(luma, chroma)?;

    let bpl = format.bytes_per_luma();
    let size = checked_mul(samples, bpl)?;
    let pitch = checked_mul(w, bpl)?;
    Ok((size, pitch))
}

fn checked_mul(a: usize, b: usize) -> Result<usize> {
    a.checked_mul(b).ok_or(Error::Overflow)
}

fn checked_add(a: usize, b: usize) -> Result<usize> {
    a.checked_add(b).ok_or(Error::Overflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_size() {
        // ceil(5/2) = 3 groups of 4 bytes per row.
        let (size, pitch) = compute_yuv_size(YuvFormat::Yuy2, 5, 2).unwrap();
        assert_eq!(pitch, 12);
        assert_eq!(size, 24);
    }

    #[test]
    fn test_planar_size_odd() {
        // 3x3: 9 luma + 2 * (2*2) chroma.
        let (size, pitch) = compute_yuv_size(YuvFormat::I420, 3, 3).unwrap();
        assert_eq!(size, 9 + 8);
        assert_eq!(pitch, 3);

        // Semi-planar has the same total: chroma interleaved in one plane.
        let (size, _) = compute_yuv_size(YuvFormat::Nv12, 3, 3).unwrap();
        assert_eq!(size, 17);
    }

    #[test]
    fn test_p010_doubles_bytes() {
        let (size, pitch) = compute_yuv_size(YuvFormat::P010, 4, 4).unwrap();
        let (base, base_pitch) = compute_yuv_size(YuvFormat::Nv12, 4, 4).unwrap();
        assert_eq!(size, base * 2);
        assert_eq!(pitch, base_pitch * 2);
    }

    #[test]
    fn test_size_overflow_detected() {
        for format in [YuvFormat::I420, YuvFormat::Nv12, YuvFormat::P010] {
            assert!(matches!(
                compute_yuv_size(format, u32::MAX, u32::MAX),
                Err(Error::Overflow)
            ));
        }
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(compute_yuv_size(YuvFormat::I420, 0, 4).is_err());
        assert!(YuvLayout::compute(YuvFormat::I420, 4, 0, 0).is_err());
    }

    #[test]
    fn test_layout_fits_computed_size() {
        // Layout plane extents must never exceed the computed size for the
        // native pitch, across all formats and odd/even dimensions.
        for format in YuvFormat::ALL {
            for w in 1..=9u32 {
                for h in 1..=9u32 {
                    let (size, pitch) = compute_yuv_size(format, w, h).unwrap();
                    let layout = YuvLayout::compute(format, w, h, pitch).unwrap();
                    assert!(
                        layout.total_size() <= size,
                        "{} {}x{}: layout {} > size {}",
                        format.name(),
                        w,
                        h,
                        layout.total_size(),
                        size
                    );
                    assert_eq!(layout.planes.len(), format.plane_count());
                }
            }
        }
    }

    #[test]
    fn test_three_plane_chroma_pitch() {
        // Explicit odd pitch: chroma pitch is ceil(pitch/2) per plane.
        let layout = YuvLayout::compute(YuvFormat::I420, 6, 4, 7).unwrap();
        assert_eq!(layout.planes[0].pitch, 7);
        assert_eq!(layout.planes[1].pitch, 4);
        assert_eq!(layout.planes[2].pitch, 4);
        assert_eq!(layout.planes[1].offset, 7 * 4);
        assert_eq!(layout.planes[2].offset, 7 * 4 + 4 * 2);
    }

    #[test]
    fn test_semi_planar_chroma_pitch() {
        // Interleaved pairs: chroma pitch is 2 * ceil(pitch/2).
        let layout = YuvLayout::compute(YuvFormat::Nv12, 6, 4, 7).unwrap();
        assert_eq!(layout.planes[1].pitch, 8);
        assert_eq!(layout.planes[1].offset, 7 * 4);
        assert_eq!(layout.planes[1].width_bytes, 6);
    }

    #[test]
    fn test_pitch_below_native_rejected() {
        assert!(YuvLayout::compute(YuvFormat::I420, 8, 8, 4).is_err());
    }

    #[test]
    fn test_u_v_plane_indices() {
        let i420 = YuvLayout::compute(YuvFormat::I420, 4, 4, 0).unwrap();
        assert_eq!(i420.u_v_plane_indices(), Some((1, 2)));
        let yv12 = YuvLayout::compute(YuvFormat::Yv12, 4, 4, 0).unwrap();
        assert_eq!(yv12.u_v_plane_indices(), Some((2, 1)));
        let nv12 = YuvLayout::compute(YuvFormat::Nv12, 4, 4, 0).unwrap();
        assert_eq!(nv12.u_v_plane_indices(), None);
    }
}
