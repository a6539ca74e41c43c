//! Color types for tri-color and 7-color e-paper panels
//!
//! This module defines the [`Color`] enum for the black, white and red panels
//! driven by this crate, and [`SevenColor`] for the palette that 24-bit
//! bitmaps are decoded into.
//!
//! ## Plane polarity
//!
//! Each pixel is one bit in the black plane and one bit in the color plane.
//! A cleared bit (0) means ink:
//!
//! | Color | Black plane | Color plane |
//! |-------|-------------|-------------|
//! | Black | 0           | 1           |
//! | White | 1           | 1           |
//! | Red   | 1           | 0           |
//!
//! ## Example
//!
//! ```
//! use epd_panel::Color;
//!
//! assert_eq!(Color::Black.black_byte(), 0x00);
//! assert_eq!(Color::Red.color_byte(), 0x00);
//! assert_eq!(Color::from_bits(true, false), Color::Red);
//! ```

/// Colors of a tri-color panel
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Color {
    /// Black pixels
    Black,
    /// White pixels
    #[default]
    White,
    /// Red pixels (for tri-color panels)
    Red,
}

#[cfg(feature = "graphics")]
impl embedded_graphics_core::prelude::PixelColor for Color {
    type Raw = embedded_graphics_core::pixelcolor::raw::RawU8;
}

#[cfg(feature = "graphics")]
impl From<embedded_graphics_core::pixelcolor::BinaryColor> for Color {
    fn from(color: embedded_graphics_core::pixelcolor::BinaryColor) -> Self {
        match color {
            embedded_graphics_core::pixelcolor::BinaryColor::On => Self::Black,
            embedded_graphics_core::pixelcolor::BinaryColor::Off => Self::White,
        }
    }
}

impl Color {
    /// Bit value in the black plane
    pub fn black_bit(self) -> bool {
        !matches!(self, Self::Black)
    }

    /// Bit value in the color plane
    pub fn color_bit(self) -> bool {
        !matches!(self, Self::Red)
    }

    /// Fill byte for the black plane
    ///
    /// ```
    /// use epd_panel::Color;
    ///
    /// assert_eq!(Color::Black.black_byte(), 0x00);
    /// assert_eq!(Color::White.black_byte(), 0xFF);
    /// assert_eq!(Color::Red.black_byte(), 0xFF);
    /// ```
    pub fn black_byte(self) -> u8 {
        if self.black_bit() { 0xFF } else { 0x00 }
    }

    /// Fill byte for the color plane
    ///
    /// ```
    /// use epd_panel::Color;
    ///
    /// assert_eq!(Color::Black.color_byte(), 0xFF);
    /// assert_eq!(Color::White.color_byte(), 0xFF);
    /// assert_eq!(Color::Red.color_byte(), 0x00);
    /// ```
    pub fn color_byte(self) -> u8 {
        if self.color_bit() { 0xFF } else { 0x00 }
    }

    /// Resolve a pixel from its plane bits
    ///
    /// Red wins when both planes carry ink, matching what the controller
    /// shows in KWR mode.
    pub fn from_bits(black_bit: bool, color_bit: bool) -> Self {
        match (black_bit, color_bit) {
            (_, false) => Self::Red,
            (false, true) => Self::Black,
            (true, true) => Self::White,
        }
    }
}

/// Seven-entry palette used by 24-bit bitmap decoding
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum SevenColor {
    /// Black
    Black,
    /// White
    #[default]
    White,
    /// Green
    Green,
    /// Blue
    Blue,
    /// Red
    Red,
    /// Yellow
    Yellow,
    /// Orange
    Orange,
}

impl SevenColor {
    /// Match a pixel as stored in a 24-bit bitmap (blue, green, red order)
    ///
    /// Only exact palette entries match; anything else is white.
    ///
    /// ```
    /// use epd_panel::SevenColor;
    ///
    /// assert_eq!(SevenColor::from_bgr([0, 0, 255]), SevenColor::Red);
    /// assert_eq!(SevenColor::from_bgr([255, 0, 0]), SevenColor::Blue);
    /// assert_eq!(SevenColor::from_bgr([12, 34, 56]), SevenColor::White);
    /// ```
    pub fn from_bgr(bgr: [u8; 3]) -> Self {
        match bgr {
            [0, 0, 0] => Self::Black,
            [255, 255, 255] => Self::White,
            [0, 255, 0] => Self::Green,
            [255, 0, 0] => Self::Blue,
            [0, 0, 255] => Self::Red,
            [0, 255, 255] => Self::Yellow,
            [0, 128, 255] => Self::Orange,
            _ => Self::White,
        }
    }
}

/// Closest tri-color equivalent: warm colors print red, cool ones black
impl From<SevenColor> for Color {
    fn from(color: SevenColor) -> Self {
        match color {
            SevenColor::Black | SevenColor::Blue | SevenColor::Green => Color::Black,
            SevenColor::White => Color::White,
            SevenColor::Red | SevenColor::Orange | SevenColor::Yellow => Color::Red,
        }
    }
}
