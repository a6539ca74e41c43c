//! Coordinate rotation utilities
//!
//! Every primitive that addresses a plane directly (pixels, rectangle fills,
//! bitmap blits) goes through [`apply_rotation`], so they can never disagree
//! about where a logical pixel lands.
//!
//! E-paper RAM stores 8 horizontal pixels per byte, MSB first. Rotation is
//! applied to the coordinates first, then the physical position is turned
//! into a byte index and bit mask.
//!
//! ## Rotation Modes
//!
//! - **Rotate0**: Native orientation
//! - **Rotate90**: 90° clockwise, width and height swapped
//! - **Rotate180**: 180° rotation, origin at bottom-right
//! - **Rotate270**: 270° clockwise (or 90° counter-clockwise)
//!
//! ## Example
//!
//! ```
//! use epd_panel::{rotation::apply_rotation, Rotation};
//!
//! // For an 8x1 panel at native orientation, pixel (0,0) is at byte 0, bit 7 (MSB)
//! assert_eq!(apply_rotation(0, 0, 8, 1, Rotation::Rotate0), Some((0, 0x80)));
//!
//! // Pixel (7,0) is at byte 0, bit 0 (LSB)
//! assert_eq!(apply_rotation(7, 0, 8, 1, Rotation::Rotate0), Some((0, 0x01)));
//!
//! // Off-panel pixels have no address
//! assert_eq!(apply_rotation(8, 0, 8, 1, Rotation::Rotate0), None);
//! ```

use crate::window::Area;

/// Display rotation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Rotation {
    /// No rotation (0°)
    #[default]
    Rotate0,
    /// 90° clockwise
    Rotate90,
    /// 180°
    Rotate180,
    /// 270° clockwise
    Rotate270,
}

impl Rotation {
    /// Rotation from a quarter-turn count; only the low two bits are used
    pub fn from_quarter_turns(turns: u8) -> Self {
        match turns & 0x03 {
            0 => Self::Rotate0,
            1 => Self::Rotate90,
            2 => Self::Rotate180,
            _ => Self::Rotate270,
        }
    }

    /// Quarter-turn count, 0 to 3
    pub fn quarter_turns(self) -> u8 {
        match self {
            Self::Rotate0 => 0,
            Self::Rotate90 => 1,
            Self::Rotate180 => 2,
            Self::Rotate270 => 3,
        }
    }

    /// The next rotation clockwise
    pub fn next(self) -> Self {
        Self::from_quarter_turns(self.quarter_turns() + 1)
    }

    /// Whether logical width and height are swapped
    pub fn swaps_axes(self) -> bool {
        matches!(self, Self::Rotate90 | Self::Rotate270)
    }

    /// Logical size of a `width` x `height` panel under this rotation
    pub fn logical_size(self, width: u16, height: u16) -> (u16, u16) {
        if self.swaps_axes() {
            (height, width)
        } else {
            (width, height)
        }
    }
}

/// Map a logical pixel to panel-native coordinates
///
/// `width` and `height` are the native panel dimensions. Returns `None` when
/// the pixel is outside the rotated logical area.
pub fn to_physical(
    x: i32,
    y: i32,
    width: u16,
    height: u16,
    rotation: Rotation,
) -> Option<(u16, u16)> {
    let (lw, lh) = rotation.logical_size(width, height);
    let x = u16::try_from(x).ok().filter(|&x| x < lw)?;
    let y = u16::try_from(y).ok().filter(|&y| y < lh)?;
    let physical = match rotation {
        Rotation::Rotate0 => (x, y),
        Rotation::Rotate90 => (width - 1 - y, x),
        Rotation::Rotate180 => (width - 1 - x, height - 1 - y),
        Rotation::Rotate270 => (y, height - 1 - x),
    };
    Some(physical)
}

/// Inverse of [`to_physical`]
pub fn to_logical(
    px: u16,
    py: u16,
    width: u16,
    height: u16,
    rotation: Rotation,
) -> Option<(u16, u16)> {
    if px >= width || py >= height {
        return None;
    }
    let logical = match rotation {
        Rotation::Rotate0 => (px, py),
        Rotation::Rotate90 => (py, width - 1 - px),
        Rotation::Rotate180 => (width - 1 - px, height - 1 - py),
        Rotation::Rotate270 => (height - 1 - py, px),
    };
    Some(logical)
}

/// Byte index and bit mask of a panel-native pixel in a plane
pub fn bit_address(px: u16, py: u16, width: u16) -> (usize, u8) {
    let bytes_per_row = usize::from(width).div_ceil(8);
    let index = usize::from(px) / 8 + usize::from(py) * bytes_per_row;
    let bit = 0x80 >> (px % 8);
    (index, bit)
}

/// Apply rotation to get buffer index and bit mask
///
/// # Example
///
/// ```
/// use epd_panel::{rotation::apply_rotation, Rotation};
///
/// // 16x16 panel at 90°: the logical origin is the native top-right pixel
/// assert_eq!(apply_rotation(0, 0, 16, 16, Rotation::Rotate90), Some((1, 0x01)));
/// ```
pub fn apply_rotation(
    x: i32,
    y: i32,
    width: u16,
    height: u16,
    rotation: Rotation,
) -> Option<(usize, u8)> {
    let (px, py) = to_physical(x, y, width, height, rotation)?;
    Some(bit_address(px, py, width))
}

/// Map a logical rectangle to the native rectangle covering the same pixels
pub fn rotate_area(area: Area, width: u16, height: u16, rotation: Rotation) -> Area {
    let Area { x, y, w, h } = area;
    let (width, height) = (i32::from(width), i32::from(height));
    match rotation {
        Rotation::Rotate0 => area,
        Rotation::Rotate90 => Area::new(width.saturating_sub(y).saturating_sub(h), x, h, w),
        Rotation::Rotate180 => Area::new(
            width.saturating_sub(x).saturating_sub(w),
            height.saturating_sub(y).saturating_sub(h),
            w,
            h,
        ),
        Rotation::Rotate270 => Area::new(y, height.saturating_sub(x).saturating_sub(w), h, w),
    }
}
