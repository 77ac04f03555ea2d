//! Software YUV texture.
//!
//! A [`YuvTexture`] owns one heap buffer in a YUV format and fronts the
//! conversion engine for the common "update regions, then draw" pattern:
//! partial-rectangle uploads (combined or separate planes), direct locked
//! writes, and a present operation that converts to RGB — stretching
//! through a pair of lazily-created auxiliary surfaces when the destination
//! size differs from the texture's native size.
//!
//! Operations are synchronous and perform no internal locking; a texture
//! must not be used from two threads at once.

use tracing::trace;

use crate::converters::{self, scale_rgb, yuv_to_rgb, ScaleAlgorithm};
use crate::error::{Error, Result};
use crate::format::{ColorimetryMode, RgbFormat, YuvFormat};
use crate::layout::YuvLayout;

/// A rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Rect {
    /// Create a rectangle.
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// An owned packed-RGB surface used for the present stretch path.
struct RgbSurface {
    width: u32,
    height: u32,
    pitch: usize,
    pixels: Vec<u8>,
}

impl RgbSurface {
    fn new(format: RgbFormat, width: u32, height: u32) -> Result<Self> {
        let pitch = width as usize * format.bytes_per_pixel();
        let pixels = converters::alloc_pixels(pitch * height as usize)?;
        Ok(Self {
            width,
            height,
            pitch,
            pixels,
        })
    }
}

/// Auxiliary surfaces for size-changing presents. Either both exist and are
/// valid for `format`, or the cache is absent entirely.
struct DisplayCache {
    format: RgbFormat,
    native: RgbSurface,
    scaled: RgbSurface,
}

/// A software texture holding one YUV pixel buffer.
pub struct YuvTexture {
    format: YuvFormat,
    width: u32,
    height: u32,
    pitch: usize,
    mode: ColorimetryMode,
    pixels: Vec<u8>,
    display: Option<DisplayCache>,
}

impl YuvTexture {
    /// Create a texture with a zeroed backing buffer.
    pub fn new(
        format: YuvFormat,
        width: u32,
        height: u32,
        mode: ColorimetryMode,
    ) -> Result<Self> {
        let (size, pitch) = crate::layout::compute_yuv_size(format, width, height)?;
        let pixels = converters::alloc_pixels(size)?;
        Ok(Self {
            format,
            width,
            height,
            pitch,
            mode,
            pixels,
            display: None,
        })
    }

    /// The texture's pixel format.
    pub fn format(&self) -> YuvFormat {
        self.format
    }

    /// Texture width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Texture height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Luma pitch of the backing buffer.
    pub fn pitch(&self) -> usize {
        self.pitch
    }

    fn layout(&self) -> YuvLayout {
        // Infallible: the constructor validated these parameters.
        YuvLayout::compute(self.format, self.width, self.height, self.pitch)
            .expect("texture layout already validated")
    }

    fn check_rect(&self, rect: &Rect) -> Result<()> {
        let fits = rect.width >= 1
            && rect.height >= 1
            && rect.x.checked_add(rect.width).is_some_and(|r| r <= self.width)
            && rect.y.checked_add(rect.height).is_some_and(|b| b <= self.height);
        if !fits {
            return Err(Error::Config(format!(
                "rectangle {rect:?} outside {}x{} texture",
                self.width, self.height
            )));
        }
        Ok(())
    }

    fn is_full_rect(&self, rect: &Rect) -> bool {
        rect.x == 0 && rect.y == 0 && rect.width == self.width && rect.height == self.height
    }

    /// Update a sub-rectangle from a combined-plane buffer.
    ///
    /// `data` holds a complete frame of the texture's format at the
    /// rectangle's size; `pitch` is its luma pitch (0 derives it). A
    /// full-surface update with the native pitch is one bulk copy.
    pub fn update(&mut self, rect: &Rect, data: &[u8], pitch: usize) -> Result<()> {
        self.check_rect(rect)?;
        let src = YuvLayout::compute(self.format, rect.width, rect.height, pitch)?;
        src.check_buffer(data.len())?;

        if self.is_full_rect(rect) && src.planes[0].pitch == self.pitch {
            let total = src.total_size().min(self.pixels.len());
            self.pixels[..total].copy_from_slice(&data[..total]);
            return Ok(());
        }

        let dst = self.layout();
        for (i, sp) in src.planes.iter().enumerate() {
            let dp = dst.planes[i];
            let (row0, col_bytes) = self.plane_origin(i, rect);
            for row in 0..sp.rows {
                let s = sp.offset + row * sp.pitch;
                let d = dp.offset + (row0 + row) * dp.pitch + col_bytes;
                self.pixels[d..d + sp.width_bytes]
                    .copy_from_slice(&data[s..s + sp.width_bytes]);
            }
        }
        Ok(())
    }

    /// Byte origin of `rect` within plane `index`: (first row, byte offset
    /// into the row). Chroma origins round down to the containing block.
    fn plane_origin(&self, index: usize, rect: &Rect) -> (usize, usize) {
        let x = rect.x as usize;
        let y = rect.y as usize;
        let bpl = self.format.bytes_per_luma();
        if self.format.is_packed() {
            (y, (x / 2) * 4)
        } else if index == 0 {
            (y, x * bpl)
        } else if self.format.is_three_plane() {
            (y / 2, x / 2)
        } else {
            (y / 2, (x / 2) * 2 * bpl)
        }
    }

    /// Update a sub-rectangle from separate Y, U and V plane buffers.
    ///
    /// Only valid for the 3-plane formats; the U and V arguments are
    /// logical channels and are routed to the correct plane slots.
    #[allow(clippy::too_many_arguments)]
    pub fn update_planar(
        &mut self,
        rect: &Rect,
        y: &[u8],
        y_pitch: usize,
        u: &[u8],
        u_pitch: usize,
        v: &[u8],
        v_pitch: usize,
    ) -> Result<()> {
        if !self.format.is_three_plane() {
            return Err(Error::Config(format!(
                "separate Y/U/V update not valid for {}",
                self.format.name()
            )));
        }
        self.check_rect(rect)?;

        let dst = self.layout();
        let (ui, vi) = dst.u_v_plane_indices().expect("three-plane format");
        let cw = (rect.width as usize).div_ceil(2);
        let ch = (rect.height as usize).div_ceil(2);

        self.copy_into_plane(&dst, 0, rect, y, y_pitch, rect.width as usize, rect.height as usize)?;
        self.copy_into_plane(&dst, ui, rect, u, u_pitch, cw, ch)?;
        self.copy_into_plane(&dst, vi, rect, v, v_pitch, cw, ch)?;
        Ok(())
    }

    /// Update a sub-rectangle from separate Y and interleaved UV buffers.
    ///
    /// Only valid for the 2-plane formats.
    pub fn update_semiplanar(
        &mut self,
        rect: &Rect,
        y: &[u8],
        y_pitch: usize,
        uv: &[u8],
        uv_pitch: usize,
    ) -> Result<()> {
        if !self.format.is_semi_planar() {
            return Err(Error::Config(format!(
                "separate Y/UV update not valid for {}",
                self.format.name()
            )));
        }
        self.check_rect(rect)?;

        let dst = self.layout();
        let bpl = self.format.bytes_per_luma();
        let ch = (rect.height as usize).div_ceil(2);
        let uv_bytes = (rect.width as usize).div_ceil(2) * 2 * bpl;

        self.copy_into_plane(
            &dst,
            0,
            rect,
            y,
            y_pitch,
            rect.width as usize * bpl,
            rect.height as usize,
        )?;
        self.copy_into_plane(&dst, 1, rect, uv, uv_pitch, uv_bytes, ch)?;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn copy_into_plane(
        &mut self,
        dst: &YuvLayout,
        index: usize,
        rect: &Rect,
        data: &[u8],
        pitch: usize,
        row_bytes: usize,
        rows: usize,
    ) -> Result<()> {
        let pitch = if pitch == 0 { row_bytes } else { pitch };
        if pitch < row_bytes {
            return Err(Error::Config(format!(
                "plane pitch {pitch} smaller than row width {row_bytes}"
            )));
        }
        let needed = (rows - 1) * pitch + row_bytes;
        if data.len() < needed {
            return Err(Error::Config(format!(
                "plane buffer too small: {} < {needed}",
                data.len()
            )));
        }

        let dp = dst.planes[index];
        let (row0, col_bytes) = self.plane_origin(index, rect);
        for row in 0..rows {
            let s = row * pitch;
            let d = dp.offset + (row0 + row) * dp.pitch + col_bytes;
            self.pixels[d..d + row_bytes].copy_from_slice(&data[s..s + row_bytes]);
        }
        Ok(())
    }

    /// Lock a sub-rectangle for direct writes, returning the pixel window
    /// and the buffer pitch. The borrow end is the unlock.
    ///
    /// Packed 4:2:2 layouts support sub-rectangle locks at even x offsets;
    /// every other layout requires the full surface and fails with
    /// [`Error::PartialLockUnsupported`] otherwise.
    pub fn lock(&mut self, rect: &Rect) -> Result<(&mut [u8], usize)> {
        self.check_rect(rect)?;
        if self.format.is_packed() {
            if rect.x % 2 != 0 {
                return Err(Error::Config(format!(
                    "packed lock requires an even x offset, got {}",
                    rect.x
                )));
            }
            let offset = rect.y as usize * self.pitch + (rect.x as usize / 2) * 4;
            return Ok((&mut self.pixels[offset..], self.pitch));
        }
        if !self.is_full_rect(rect) {
            return Err(Error::PartialLockUnsupported);
        }
        Ok((&mut self.pixels[..], self.pitch))
    }

    /// Present the texture into an RGB destination buffer.
    ///
    /// With matching dimensions this converts directly into `dst`. With
    /// differing dimensions the texture converts into a native-size
    /// auxiliary surface, stretches into a destination-size one, and copies
    /// out; both surfaces are created lazily and invalidated when
    /// `dst_format` changes. A failed present leaves no half-built
    /// auxiliary state behind.
    pub fn present(
        &mut self,
        dst_format: RgbFormat,
        dst_width: u32,
        dst_height: u32,
        dst: &mut [u8],
        dst_pitch: usize,
    ) -> Result<()> {
        if dst_width == self.width && dst_height == self.height {
            return yuv_to_rgb(
                self.width,
                self.height,
                self.format,
                &self.pixels,
                self.pitch,
                dst_format,
                dst,
                dst_pitch,
                self.mode,
            );
        }

        let bpp = dst_format.bytes_per_pixel();
        let dst_pitch = converters::resolve_rgb_pitch(dst_width, bpp, dst_pitch)?;
        converters::check_rgb_extent(dst_width, dst_height, bpp, dst_pitch, dst.len(), "destination")?;

        // Invalidate cached surfaces on a format change; reuse them while
        // the format and destination size still match.
        let cache = match self.display.take() {
            Some(c) if c.format == dst_format => Some(c),
            Some(_) => {
                trace!("display format changed, rebuilding auxiliary surfaces");
                None
            }
            None => None,
        };
        let mut cache = match cache {
            Some(c) if c.scaled.width == dst_width && c.scaled.height == dst_height => c,
            reusable => {
                let native = match reusable {
                    Some(c) => c.native,
                    None => RgbSurface::new(dst_format, self.width, self.height)?,
                };
                let scaled = RgbSurface::new(dst_format, dst_width, dst_height)?;
                DisplayCache {
                    format: dst_format,
                    native,
                    scaled,
                }
            }
        };

        let result = yuv_to_rgb(
            self.width,
            self.height,
            self.format,
            &self.pixels,
            self.pitch,
            dst_format,
            &mut cache.native.pixels,
            cache.native.pitch,
            self.mode,
        )
        .and_then(|()| {
            scale_rgb(
                dst_format,
                cache.native.width,
                cache.native.height,
                &cache.native.pixels,
                cache.native.pitch,
                cache.scaled.width,
                cache.scaled.height,
                &mut cache.scaled.pixels,
                cache.scaled.pitch,
                ScaleAlgorithm::NearestNeighbor,
            )
        });
        // Keep the cache only when the whole pipeline succeeded, so a
        // failed present can retry from a clean slate.
        if let Err(err) = result {
            return Err(err);
        }

        let row_bytes = dst_width as usize * bpp;
        for row in 0..dst_height as usize {
            let s = row * cache.scaled.pitch;
            let d = row * dst_pitch;
            dst[d..d + row_bytes].copy_from_slice(&cache.scaled.pixels[s..s + row_bytes]);
        }
        self.display = Some(cache);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converters::colorspace::yuv_to_rgb_coeffs;
    use crate::format::ColorMatrix;
    use crate::layout::compute_yuv_size;

    fn checkerboard_i420(size: u32, a: (u8, u8, u8), b: (u8, u8, u8)) -> Vec<u8> {
        // 2x2-aligned checkerboard so each chroma sample covers one tile.
        let (bytes, _) = compute_yuv_size(YuvFormat::I420, size, size).unwrap();
        let mut buf = vec![0u8; bytes];
        let n = size as usize;
        for row in 0..n {
            for col in 0..n {
                let tile = ((row / 2) + (col / 2)) % 2 == 0;
                buf[row * n + col] = if tile { a.0 } else { b.0 };
            }
        }
        let cn = n / 2;
        for cy in 0..cn {
            for cx in 0..cn {
                let tile = (cy + cx) % 2 == 0;
                let (u, v) = if tile { (a.1, a.2) } else { (b.1, b.2) };
                buf[n * n + cy * cn + cx] = u;
                buf[n * n + cn * cn + cy * cn + cx] = v;
            }
        }
        buf
    }

    #[test]
    fn test_checkerboard_present_matches_reference_matrix() {
        let tile_a = (200u8, 90u8, 100u8);
        let tile_b = (60u8, 170u8, 150u8);
        let frame = checkerboard_i420(64, tile_a, tile_b);

        let mut tex = YuvTexture::new(YuvFormat::I420, 64, 64, ColorimetryMode::Bt601).unwrap();
        tex.update(&Rect::new(0, 0, 64, 64), &frame, 0).unwrap();

        let mut out = vec![0u8; 64 * 64 * 4];
        tex.present(RgbFormat::Rgba, 64, 64, &mut out, 0).unwrap();

        let co = yuv_to_rgb_coeffs(ColorMatrix::Bt601);
        let expect_a = co.to_rgb(tile_a.0 as i32, tile_a.1 as i32, tile_a.2 as i32);
        let expect_b = co.to_rgb(tile_b.0 as i32, tile_b.1 as i32, tile_b.2 as i32);

        for row in 0..64usize {
            for col in 0..64usize {
                let tile = ((row / 2) + (col / 2)) % 2 == 0;
                let expected = if tile { expect_a } else { expect_b };
                let px = &out[(row * 64 + col) * 4..][..4];
                assert_eq!(
                    (px[0], px[1], px[2], px[3]),
                    (expected.0, expected.1, expected.2, 255),
                    "pixel ({row},{col})"
                );
            }
        }
        // Same-size present never builds the stretch surfaces.
        assert!(tex.display.is_none());
    }

    #[test]
    fn test_present_before_update_reads_zeroed_buffer() {
        let mut tex = YuvTexture::new(YuvFormat::Yuy2, 4, 2, ColorimetryMode::Jpeg).unwrap();
        let mut out = vec![0u8; 4 * 2 * 4];
        tex.present(RgbFormat::Rgba, 4, 2, &mut out, 0).unwrap();
        // Y=0, U=V=0 is a legal (green-ish) color; just verify determinism
        // against the reference matrix.
        let expected = yuv_to_rgb_coeffs(ColorMatrix::Jpeg).to_rgb(0, 0, 0);
        for px in out.chunks_exact(4) {
            assert_eq!((px[0], px[1], px[2]), expected);
        }
    }

    #[test]
    fn test_present_stretch_path() {
        // 2x2 uniform gray texture presented at 4x4: nearest stretch of a
        // flat image stays flat.
        let mut tex = YuvTexture::new(YuvFormat::I420, 2, 2, ColorimetryMode::Jpeg).unwrap();
        let frame = [77u8, 77, 77, 77, 128, 128];
        tex.update(&Rect::new(0, 0, 2, 2), &frame, 0).unwrap();

        let mut out = vec![0u8; 4 * 4 * 4];
        tex.present(RgbFormat::Rgba, 4, 4, &mut out, 0).unwrap();
        for px in out.chunks_exact(4) {
            assert_eq!(px, [77, 77, 77, 255]);
        }
        assert!(tex.display.is_some());

        // Changing the destination format invalidates and rebuilds.
        let mut out = vec![0u8; 4 * 4 * 4];
        tex.present(RgbFormat::Bgra, 4, 4, &mut out, 0).unwrap();
        for px in out.chunks_exact(4) {
            assert_eq!(px, [77, 77, 77, 255]);
        }
        let cache = tex.display.as_ref().unwrap();
        assert_eq!(cache.format, RgbFormat::Bgra);
    }

    #[test]
    fn test_partial_update() {
        let mut tex = YuvTexture::new(YuvFormat::I420, 4, 4, ColorimetryMode::Jpeg).unwrap();
        // 2x2 patch at (2, 2): 4 luma bytes + 1 U + 1 V.
        let patch = [9u8, 9, 9, 9, 77, 99];
        tex.update(&Rect::new(2, 2, 2, 2), &patch, 0).unwrap();

        let n = 4usize;
        assert_eq!(tex.pixels[2 * n + 2], 9);
        assert_eq!(tex.pixels[3 * n + 3], 9);
        assert_eq!(tex.pixels[0], 0);
        // Chroma block (1,1).
        assert_eq!(tex.pixels[16 + 3], 77);
        assert_eq!(tex.pixels[16 + 4 + 3], 99);
    }

    #[test]
    fn test_update_rejects_out_of_bounds() {
        let mut tex = YuvTexture::new(YuvFormat::I420, 4, 4, ColorimetryMode::Jpeg).unwrap();
        let patch = [0u8; 6];
        assert!(tex.update(&Rect::new(3, 3, 2, 2), &patch, 0).is_err());
        assert!(tex.update(&Rect::new(0, 0, 0, 1), &patch, 0).is_err());
    }

    #[test]
    fn test_update_planar_routes_channels() {
        // YV12 stores V before U; logical U/V must land correctly.
        let mut tex = YuvTexture::new(YuvFormat::Yv12, 2, 2, ColorimetryMode::Jpeg).unwrap();
        let y = [1u8, 2, 3, 4];
        let u = [50u8];
        let v = [60u8];
        tex.update_planar(&Rect::new(0, 0, 2, 2), &y, 0, &u, 0, &v, 0)
            .unwrap();
        assert_eq!(&tex.pixels[..4], &y);
        assert_eq!(tex.pixels[4], 60); // V plane first
        assert_eq!(tex.pixels[5], 50);

        let mut nv = YuvTexture::new(YuvFormat::Nv12, 2, 2, ColorimetryMode::Jpeg).unwrap();
        assert!(nv
            .update_planar(&Rect::new(0, 0, 2, 2), &y, 0, &u, 0, &v, 0)
            .is_err());
    }

    #[test]
    fn test_update_semiplanar() {
        let mut tex = YuvTexture::new(YuvFormat::Nv21, 2, 2, ColorimetryMode::Jpeg).unwrap();
        let y = [1u8, 2, 3, 4];
        let uv = [60u8, 50];
        tex.update_semiplanar(&Rect::new(0, 0, 2, 2), &y, 0, &uv, 0)
            .unwrap();
        assert_eq!(&tex.pixels[..4], &y);
        assert_eq!(&tex.pixels[4..6], &uv);
    }

    #[test]
    fn test_partial_lock_rules() {
        let mut planar = YuvTexture::new(YuvFormat::Nv12, 4, 4, ColorimetryMode::Jpeg).unwrap();
        assert!(matches!(
            planar.lock(&Rect::new(0, 0, 2, 2)),
            Err(Error::PartialLockUnsupported)
        ));
        let (buf, pitch) = planar.lock(&Rect::new(0, 0, 4, 4)).unwrap();
        assert_eq!(pitch, 4);
        buf[0] = 42;
        assert_eq!(planar.pixels[0], 42);

        let mut packed = YuvTexture::new(YuvFormat::Yuy2, 4, 4, ColorimetryMode::Jpeg).unwrap();
        let (buf, pitch) = packed.lock(&Rect::new(2, 1, 2, 2)).unwrap();
        assert_eq!(pitch, 8);
        buf[0] = 7; // row 1, group 1
        assert_eq!(packed.pixels[8 + 4], 7);
        assert!(packed.lock(&Rect::new(1, 0, 2, 2)).is_err());
    }

    #[test]
    fn test_full_update_bulk_copy() {
        let mut tex = YuvTexture::new(YuvFormat::Uyvy, 2, 2, ColorimetryMode::Jpeg).unwrap();
        let frame: Vec<u8> = (1..=8).collect();
        tex.update(&Rect::new(0, 0, 2, 2), &frame, 0).unwrap();
        assert_eq!(tex.pixels, frame);
    }
}
