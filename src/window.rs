//! Partial window geometry
//!
//! The controller addresses RAM in byte columns, so every window sent with
//! [`PARTIAL_WINDOW`](crate::command::PARTIAL_WINDOW) starts on a multiple of
//! 8 and ends on the last pixel of a byte. Rows are pixel exact.
//!
//! The number of bytes streamed after opening a window must equal
//! [`PartialWindow::byte_count`]. The controller cannot report a mismatch;
//! its write pointer simply drifts.

use crate::command::PARTIAL_SCAN_INSIDE;

/// Rectangle in panel-native pixel coordinates
///
/// Coordinates are signed so callers can pass rectangles that hang off the
/// panel; clipping happens in the driver.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Area {
    /// Left edge
    pub x: i32,
    /// Top edge
    pub y: i32,
    /// Width
    pub w: i32,
    /// Height
    pub h: i32,
}

impl Area {
    /// Create a new area
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Area covering a whole panel
    pub const fn full(width: u16, height: u16) -> Self {
        Self::new(0, 0, width as i32, height as i32)
    }

    /// Whether the area covers no pixels
    pub const fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }
}

/// Round `x` down to a byte column, towards negative infinity
pub(crate) const fn align_down(x: i32) -> i32 {
    x & !7
}

/// Byte-aligned window in controller RAM, inclusive bounds
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PartialWindow {
    x: u16,
    y: u16,
    x_end: u16,
    y_end: u16,
}

impl PartialWindow {
    /// Build a window from a pixel rectangle
    ///
    /// `x` is rounded down to a multiple of 8 and the right edge is extended
    /// to the last pixel of its byte, so the window always covers the
    /// requested columns. Returns `None` for an empty rectangle.
    ///
    /// ```
    /// use epd_panel::PartialWindow;
    ///
    /// let window = PartialWindow::aligned(3, 0, 10, 5).unwrap();
    /// assert_eq!(window.x(), 0);
    /// assert_eq!(window.x_end(), 15);
    /// assert_eq!(window.byte_count(), 2 * 5);
    /// ```
    pub fn aligned(x: u16, y: u16, w: u16, h: u16) -> Option<Self> {
        if w == 0 || h == 0 {
            return None;
        }
        let x_end = x.checked_add(w - 1)? | 0x07;
        let y_end = y.checked_add(h - 1)?;
        Some(Self {
            x: x & !0x07,
            y,
            x_end,
            y_end,
        })
    }

    /// Whole-panel window
    pub fn full(width: u16, height: u16) -> Option<Self> {
        Self::aligned(0, 0, width, height)
    }

    /// First column (multiple of 8)
    pub fn x(&self) -> u16 {
        self.x
    }

    /// First row
    pub fn y(&self) -> u16 {
        self.y
    }

    /// Last column, inclusive
    pub fn x_end(&self) -> u16 {
        self.x_end
    }

    /// Last row, inclusive
    pub fn y_end(&self) -> u16 {
        self.y_end
    }

    /// Width in pixels, always a multiple of 8
    pub fn width(&self) -> u16 {
        self.x_end - self.x + 1
    }

    /// Height in pixels
    pub fn height(&self) -> u16 {
        self.y_end - self.y + 1
    }

    /// Bytes per window row
    pub fn bytes_per_row(&self) -> usize {
        usize::from(self.width()).div_ceil(8)
    }

    /// Exact number of bytes one RAM plane stream must contain
    pub fn byte_count(&self) -> usize {
        self.bytes_per_row() * usize::from(self.height())
    }

    /// Parameter bytes for the partial window command
    ///
    /// `[HRST, HRED, VRST_H, VRST_L, VRED_H, VRED_L, PT_SCAN]`. The horizontal
    /// bounds are single bytes on this controller family.
    pub fn descriptor(&self) -> [u8; 7] {
        [
            (self.x & 0xFF) as u8,
            (self.x_end & 0xFF) as u8,
            (self.y >> 8) as u8,
            (self.y & 0xFF) as u8,
            (self.y_end >> 8) as u8,
            (self.y_end & 0xFF) as u8,
            PARTIAL_SCAN_INSIDE,
        ]
    }

    /// Area covered by this window
    pub fn area(&self) -> Area {
        Area::new(
            i32::from(self.x),
            i32::from(self.y),
            i32::from(self.width()),
            i32::from(self.height()),
        )
    }
}

/// Intersection of a byte-aligned source rectangle with the panel
///
/// `dx` and `dy` are how far the visible part starts inside the source; `dx`
/// is always a whole number of bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Clip {
    pub window: PartialWindow,
    pub dx_bytes: usize,
    pub dy: usize,
}

/// Clip a source rectangle placed at `(x, y)` against a `width` x `height` panel
///
/// `x` is rounded down to a byte column and `w` is padded to whole bytes, the
/// same way source bitmaps are padded. Returns `None` when nothing is visible.
pub(crate) fn clip_to_panel(
    x: i32,
    y: i32,
    w: i32,
    h: i32,
    width: u16,
    height: u16,
) -> Option<Clip> {
    if w <= 0 || h <= 0 {
        return None;
    }
    let x = i64::from(align_down(x));
    let y = i64::from(y);
    let w = (i64::from(w) + 7) / 8 * 8;
    let h = i64::from(h);

    let x1 = x.max(0);
    let y1 = y.max(0);
    let x2 = (x + w).min(i64::from(width));
    let y2 = (y + h).min(i64::from(height));
    if x2 <= x1 || y2 <= y1 {
        return None;
    }

    let window = PartialWindow::aligned(
        u16::try_from(x1).ok()?,
        u16::try_from(y1).ok()?,
        u16::try_from(x2 - x1).ok()?,
        u16::try_from(y2 - y1).ok()?,
    )?;
    Some(Clip {
        window,
        dx_bytes: usize::try_from((x1 - x) / 8).ok()?,
        dy: usize::try_from(y1 - y).ok()?,
    })
}

/// Clamp a refresh rectangle to the panel and align it to byte columns
///
/// Unlike [`clip_to_panel`] the source is not padded; the window is grown
/// only as far as needed to keep the requested right edge.
pub(crate) fn refresh_window(area: Area, width: u16, height: u16) -> Option<PartialWindow> {
    if area.is_empty() {
        return None;
    }
    let x1 = area.x.max(0);
    let y1 = area.y.max(0);
    let x2 = area.x.saturating_add(area.w).min(i32::from(width));
    let y2 = area.y.saturating_add(area.h).min(i32::from(height));
    if x2 <= x1 || y2 <= y1 {
        return None;
    }
    PartialWindow::aligned(
        u16::try_from(x1).ok()?,
        u16::try_from(y1).ok()?,
        u16::try_from(x2 - x1).ok()?,
        u16::try_from(y2 - y1).ok()?,
    )
}
