//! In-memory planes in controller RAM layout
//!
//! A [`Framebuffer`] owns one black plane and, on tri-color panels, one
//! color plane. Both use the controller's layout: `ceil(width / 8)` bytes per
//! row, MSB is the leftmost pixel. Plane buffers are provided by the caller
//! and never reallocated.
//!
//! All drawing takes logical coordinates and goes through
//! [`apply_rotation`], so pixels, rectangles and bitmaps agree on where a
//! point lands for every [`Rotation`]. Pixels outside the logical area are
//! dropped silently.
//!
//! ## Example
//!
//! ```
//! use epd_panel::{Color, Dimensions, Framebuffer, WriteMode};
//!
//! let dims = Dimensions::new(16, 4).unwrap();
//! let mut fb = Framebuffer::new(dims, [0xFF; 8], Some([0xFF; 8])).unwrap();
//!
//! fb.write_pixel(0, 0, Color::Red, WriteMode::Overwrite);
//! assert_eq!(fb.pixel(0, 0), Some(Color::Red));
//!
//! // Off-panel writes are ignored
//! fb.write_pixel(-1, 100, Color::Black, WriteMode::Overwrite);
//! ```

use crate::color::Color;
use crate::config::Dimensions;
use crate::error::BuilderError;
use crate::rotation::{Rotation, apply_rotation};

/// How a new bit is combined with the bit already in the plane
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WriteMode {
    /// new
    #[default]
    Overwrite,
    /// !new
    Invert,
    /// old ^ new
    Xor,
    /// old ^ !new
    InvertXor,
}

impl WriteMode {
    /// Combine a single bit
    pub fn combine(self, old: bool, new: bool) -> bool {
        match self {
            Self::Overwrite => new,
            Self::Invert => !new,
            Self::Xor => old ^ new,
            Self::InvertXor => old ^ !new,
        }
    }

    /// Combine eight bits at once
    pub fn combine_byte(self, old: u8, new: u8) -> u8 {
        match self {
            Self::Overwrite => new,
            Self::Invert => !new,
            Self::Xor => old ^ new,
            Self::InvertXor => old ^ !new,
        }
    }
}

/// Plane selector for raw bit access
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Plane {
    /// Black/white plane
    Black,
    /// Color (red) plane
    Color,
}

/// Black plane plus optional color plane
pub struct Framebuffer<B> {
    black: B,
    color: Option<B>,
    dimensions: Dimensions,
    rotation: Rotation,
}

impl<B> Framebuffer<B>
where
    B: AsRef<[u8]> + AsMut<[u8]>,
{
    /// Wrap caller-provided plane buffers
    ///
    /// Buffers may be larger than needed; only the first
    /// `dimensions.buffer_size()` bytes are used.
    ///
    /// # Errors
    ///
    /// Returns `BuilderError::BufferTooSmall` if a plane is too short.
    pub fn new(dimensions: Dimensions, black: B, color: Option<B>) -> Result<Self, BuilderError> {
        let required = dimensions.buffer_size();
        let planes = core::iter::once(&black).chain(color.as_ref());
        for plane in planes {
            let provided = plane.as_ref().len();
            if provided < required {
                return Err(BuilderError::BufferTooSmall { required, provided });
            }
        }
        Ok(Self {
            black,
            color,
            dimensions,
            rotation: Rotation::default(),
        })
    }

    /// Native dimensions
    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Current rotation
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Set the rotation used by every drawing call
    pub fn set_rotation(&mut self, rotation: Rotation) {
        self.rotation = rotation;
    }

    /// Logical (rotated) width and height
    pub fn logical_size(&self) -> (u16, u16) {
        self.rotation
            .logical_size(self.dimensions.width, self.dimensions.height)
    }

    /// Whether a color plane is present
    pub fn has_color(&self) -> bool {
        self.color.is_some()
    }

    /// The black plane in controller layout
    pub fn black_plane(&self) -> &[u8] {
        &self.black.as_ref()[..self.dimensions.buffer_size()]
    }

    /// The color plane in controller layout, if present
    pub fn color_plane(&self) -> Option<&[u8]> {
        let size = self.dimensions.buffer_size();
        self.color.as_ref().map(|plane| &plane.as_ref()[..size])
    }

    /// Mutable black plane, for loaders that write native layout directly
    pub fn black_plane_mut(&mut self) -> &mut [u8] {
        let size = self.dimensions.buffer_size();
        &mut self.black.as_mut()[..size]
    }

    /// Mutable color plane, if present
    pub fn color_plane_mut(&mut self) -> Option<&mut [u8]> {
        let size = self.dimensions.buffer_size();
        self.color.as_mut().map(|plane| &mut plane.as_mut()[..size])
    }

    /// Fill every pixel with one color
    pub fn fill(&mut self, color: Color) {
        self.black_plane_mut().fill(color.black_byte());
        if let Some(plane) = self.color_plane_mut() {
            plane.fill(color.color_byte());
        }
    }

    /// Write one logical pixel
    ///
    /// The color is resolved to a bit per plane and combined with the
    /// existing bit according to `mode`.
    pub fn write_pixel(&mut self, x: i32, y: i32, color: Color, mode: WriteMode) {
        let Dimensions { width, height } = self.dimensions;
        let Some((index, mask)) = apply_rotation(x, y, width, height, self.rotation) else {
            return;
        };
        write_bit(self.black.as_mut(), index, mask, color.black_bit(), mode);
        if let Some(plane) = self.color.as_mut() {
            write_bit(plane.as_mut(), index, mask, color.color_bit(), mode);
        }
    }

    /// Fill a logical rectangle
    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Color, mode: WriteMode) {
        let (lw, lh) = self.logical_size();
        // only walk the visible part
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = x.saturating_add(w).min(i32::from(lw));
        let y1 = y.saturating_add(h).min(i32::from(lh));
        for py in y0..y1 {
            for px in x0..x1 {
                self.write_pixel(px, py, color, mode);
            }
        }
    }

    /// Draw a 1-bpp MSB-first bitmap at a logical position
    ///
    /// Rows are `ceil(w / 8)` bytes. Set bits are drawn in `color`; with
    /// `invert` the cleared bits are drawn instead. Background bits leave the
    /// framebuffer untouched. Rows missing from a short `bitmap` are skipped.
    pub fn draw_bitmap(
        &mut self,
        x: i32,
        y: i32,
        bitmap: &[u8],
        w: u16,
        h: u16,
        color: Color,
        mode: WriteMode,
        invert: bool,
    ) {
        let stride = usize::from(w).div_ceil(8);
        for row in 0..h {
            let start = usize::from(row) * stride;
            let Some(line) = bitmap.get(start..start + stride) else {
                break;
            };
            for col in 0..w {
                let byte = line[usize::from(col) / 8];
                let set = byte & (0x80 >> (col % 8)) != 0;
                if set != invert {
                    self.write_pixel(
                        x.saturating_add(i32::from(col)),
                        y.saturating_add(i32::from(row)),
                        color,
                        mode,
                    );
                }
            }
        }
    }

    /// Read a raw plane bit at a logical position
    pub fn plane_bit(&self, plane: Plane, x: i32, y: i32) -> Option<bool> {
        let Dimensions { width, height } = self.dimensions;
        let (index, mask) = apply_rotation(x, y, width, height, self.rotation)?;
        let bytes = match plane {
            Plane::Black => self.black.as_ref(),
            Plane::Color => self.color.as_ref()?.as_ref(),
        };
        bytes.get(index).map(|byte| byte & mask != 0)
    }

    /// Resolve the color at a logical position
    pub fn pixel(&self, x: i32, y: i32) -> Option<Color> {
        let black = self.plane_bit(Plane::Black, x, y)?;
        let color = match self.color {
            Some(_) => self.plane_bit(Plane::Color, x, y)?,
            None => true,
        };
        Some(Color::from_bits(black, color))
    }

    /// Release the plane buffers
    pub fn release(self) -> (B, Option<B>) {
        (self.black, self.color)
    }
}

fn write_bit(plane: &mut [u8], index: usize, mask: u8, new: bool, mode: WriteMode) {
    let Some(byte) = plane.get_mut(index) else {
        return;
    };
    let old = *byte & mask != 0;
    if mode.combine(old, new) {
        *byte |= mask;
    } else {
        *byte &= !mask;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;

    const MODES: [WriteMode; 4] = [
        WriteMode::Overwrite,
        WriteMode::Invert,
        WriteMode::Xor,
        WriteMode::InvertXor,
    ];

    fn framebuffer(width: u16, height: u16) -> Framebuffer<Vec<u8>> {
        let dims = Dimensions::new(width, height).unwrap();
        let size = dims.buffer_size();
        Framebuffer::new(dims, vec![0xFF; size], Some(vec![0xFF; size])).unwrap()
    }

    #[test]
    fn test_new_rejects_short_planes() {
        let dims = Dimensions::new(16, 4).unwrap();
        assert!(matches!(
            Framebuffer::new(dims, vec![0u8; 7], None),
            Err(BuilderError::BufferTooSmall {
                required: 8,
                provided: 7
            })
        ));
        assert!(Framebuffer::new(dims, vec![0u8; 8], Some(vec![0u8; 2])).is_err());
    }

    #[test]
    fn test_write_modes_follow_combination_rule() {
        for mode in MODES {
            for old in [false, true] {
                for color in [Color::Black, Color::White] {
                    let mut fb = framebuffer(16, 4);
                    let seed = if old { Color::White } else { Color::Black };
                    fb.write_pixel(5, 2, seed, WriteMode::Overwrite);

                    fb.write_pixel(5, 2, color, mode);

                    let new = color.black_bit();
                    let expected = match mode {
                        WriteMode::Overwrite => new,
                        WriteMode::Invert => !new,
                        WriteMode::Xor => old ^ new,
                        WriteMode::InvertXor => old ^ !new,
                    };
                    assert_eq!(fb.plane_bit(Plane::Black, 5, 2), Some(expected));
                }
            }
        }
    }

    #[test]
    fn test_write_pixel_touches_only_its_bit() {
        let mut fb = framebuffer(16, 4);
        fb.write_pixel(9, 1, Color::Black, WriteMode::Overwrite);
        let plane = fb.black_plane();
        assert_eq!(plane[3], 0b1011_1111);
        assert_eq!(plane.iter().filter(|&&b| b != 0xFF).count(), 1);
        assert!(fb.color_plane().unwrap().iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_red_uses_color_plane() {
        let mut fb = framebuffer(16, 4);
        fb.write_pixel(0, 0, Color::Red, WriteMode::Overwrite);
        assert_eq!(fb.black_plane()[0], 0xFF);
        assert_eq!(fb.color_plane().unwrap()[0], 0x7F);
        assert_eq!(fb.pixel(0, 0), Some(Color::Red));
    }

    #[test]
    fn test_out_of_range_is_ignored() {
        let mut fb = framebuffer(16, 4);
        fb.write_pixel(16, 0, Color::Black, WriteMode::Overwrite);
        fb.write_pixel(0, 4, Color::Black, WriteMode::Overwrite);
        fb.write_pixel(-1, -1, Color::Black, WriteMode::Overwrite);
        assert!(fb.black_plane().iter().all(|&b| b == 0xFF));
        assert_eq!(fb.pixel(16, 0), None);
    }

    #[test]
    fn test_rotation_changes_logical_bounds() {
        let mut fb = framebuffer(16, 4);
        fb.set_rotation(Rotation::Rotate90);
        assert_eq!(fb.logical_size(), (4, 16));
        // (0,0) lands on the native top-right pixel
        fb.write_pixel(0, 0, Color::Black, WriteMode::Overwrite);
        assert_eq!(fb.black_plane()[1], 0xFE);
        // (10, 0) is outside once rotated
        fb.write_pixel(10, 0, Color::Black, WriteMode::Overwrite);
        assert_eq!(fb.black_plane().iter().filter(|&&b| b != 0xFF).count(), 1);
    }

    #[test]
    fn test_fill_rect_matches_pixels_under_rotation() {
        for rotation in [
            Rotation::Rotate0,
            Rotation::Rotate90,
            Rotation::Rotate180,
            Rotation::Rotate270,
        ] {
            let mut by_rect = framebuffer(16, 8);
            let mut by_pixel = framebuffer(16, 8);
            by_rect.set_rotation(rotation);
            by_pixel.set_rotation(rotation);

            by_rect.fill_rect(-2, 1, 5, 3, Color::Red, WriteMode::Overwrite);
            for y in 1..4 {
                for x in -2..3 {
                    by_pixel.write_pixel(x, y, Color::Red, WriteMode::Overwrite);
                }
            }
            assert_eq!(by_rect.black_plane(), by_pixel.black_plane());
            assert_eq!(by_rect.color_plane(), by_pixel.color_plane());
        }
    }

    #[test]
    fn test_draw_bitmap_draws_foreground_only() {
        let mut fb = framebuffer(16, 2);
        fb.fill(Color::Red);
        // 10 pixels wide: stride 2
        let bitmap = [0b1000_0000, 0b0100_0000, 0x00, 0x00];
        fb.draw_bitmap(0, 0, &bitmap, 10, 2, Color::Black, WriteMode::Overwrite, false);
        assert_eq!(fb.pixel(0, 0), Some(Color::Black));
        assert_eq!(fb.pixel(9, 0), Some(Color::Black));
        assert_eq!(fb.pixel(1, 0), Some(Color::Red));
        assert_eq!(fb.pixel(0, 1), Some(Color::Red));
    }

    #[test]
    fn test_draw_bitmap_inverted() {
        let mut fb = framebuffer(16, 1);
        let bitmap = [0xF0];
        fb.draw_bitmap(0, 0, &bitmap, 8, 1, Color::Black, WriteMode::Overwrite, true);
        assert_eq!(fb.black_plane()[0], 0xF0);
    }

    #[test]
    fn test_draw_bitmap_far_off_panel() {
        let mut fb = framebuffer(16, 1);
        let bitmap = [0xFF, 0xFF];
        fb.draw_bitmap(i32::MAX - 3, 0, &bitmap, 16, 1, Color::Black, WriteMode::Overwrite, false);
        fb.draw_bitmap(0, i32::MAX, &bitmap, 16, 1, Color::Black, WriteMode::Overwrite, false);
        assert_eq!(fb.black_plane(), &[0xFF, 0xFF]);
    }

    #[test]
    fn test_single_plane_framebuffer() {
        let dims = Dimensions::new(8, 1).unwrap();
        let mut fb = Framebuffer::new(dims, [0xFFu8; 1], None).unwrap();
        fb.write_pixel(0, 0, Color::Black, WriteMode::Overwrite);
        fb.write_pixel(1, 0, Color::Red, WriteMode::Overwrite);
        assert_eq!(fb.black_plane(), &[0x7F]);
        assert_eq!(fb.plane_bit(Plane::Color, 0, 0), None);
        assert_eq!(fb.pixel(1, 0), Some(Color::White));
    }
}
