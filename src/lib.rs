//! IL0373 E-Paper Panel Driver
//!
//! A driver for IL0373-family e-paper controllers (GDEW0213Z16 104x212
//! tri-color and relatives) built around partial updates: a byte-aligned RAM
//! window is written and refreshed instead of the whole panel.
//!
//! ## Features
//!
//! - `no_std` compatible
//! - `embedded-hal` v1.0 support
//! - `embedded-graphics` integration (with `graphics` feature)
//! - Partial window writes and refreshes with clipping
//! - Power and deep sleep state tracking with bounded busy waits
//! - Rotation support shared by every drawing primitive
//! - Uncompressed BMP loading (1, 4 and 24 bpp)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use core::convert::Infallible;
//! use embedded_hal::delay::DelayNs;
//! use embedded_hal::digital::{InputPin, OutputPin};
//! use embedded_hal::spi::{Operation, SpiDevice};
//! use epd_panel::{Area, Builder, Dimensions, Display, ImageWrite, Interface, Panel};
//!
//! # struct MockSpi;
//! # impl embedded_hal::spi::ErrorType for MockSpi { type Error = Infallible; }
//! # impl SpiDevice for MockSpi {
//! #     fn transaction(
//! #         &mut self,
//! #         _operations: &mut [Operation<'_, u8>],
//! #     ) -> Result<(), Self::Error> {
//! #         Ok(())
//! #     }
//! # }
//! # struct MockPin;
//! # impl embedded_hal::digital::ErrorType for MockPin { type Error = Infallible; }
//! # impl OutputPin for MockPin {
//! #     fn set_low(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! #     fn set_high(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! # impl InputPin for MockPin {
//! #     fn is_high(&mut self) -> Result<bool, Self::Error> { Ok(true) }
//! #     fn is_low(&mut self) -> Result<bool, Self::Error> { Ok(false) }
//! # }
//! # struct MockDelay;
//! # impl DelayNs for MockDelay { fn delay_ns(&mut self, _ns: u32) {} }
//! # let spi = MockSpi;
//! # let dc = MockPin;
//! # let rst = MockPin;
//! # let busy = MockPin;
//! # let mut delay = MockDelay;
//! let interface = Interface::new(spi, dc, rst, busy);
//! let dims = match Dimensions::new(104, 212) {
//!     Ok(dims) => dims,
//!     Err(_) => return,
//! };
//! let config = match Builder::new().dimensions(dims).build() {
//!     Ok(config) => config,
//!     Err(_) => return,
//! };
//!
//! let mut display = Display::new(interface, config);
//! let _ = display.init(&mut delay);
//!
//! // 16x2 black bar at (8, 100), then refresh only that area
//! let bar = [0x00u8; 4];
//! let image = ImageWrite {
//!     black: Some(&bar),
//!     area: Area::new(8, 100, 16, 2),
//!     ..ImageWrite::default()
//! };
//! let _ = display.draw_image(&image, &mut delay);
//! let _ = display.hibernate(&mut delay);
//! ```

#![no_std]

#[cfg(any(test, feature = "alloc"))]
extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

/// Bitmap file decoding
pub mod bmp;
/// Color types for tri-color and 7-color panels
pub mod color;
/// IL0373 command definitions
pub mod command;
/// Panel configuration types and builder
pub mod config;
/// IL0373 driver implementing [`Panel`]
pub mod display;
/// Error types for the driver
pub mod error;
/// Plane buffers and drawing primitives
pub mod framebuffer;
/// Hardware interface abstraction
pub mod interface;
/// Controller capability trait and transfer descriptions
pub mod panel;
/// Bounded busy polling
pub mod poll;
/// Coordinate rotation utilities
pub mod rotation;
/// Partial window geometry
pub mod window;

/// Graphics support via embedded-graphics (requires `graphics` feature)
#[cfg(feature = "graphics")]
pub mod graphics;

#[cfg(test)]
pub(crate) mod sim;

pub use color::{Color, SevenColor};
pub use config::{
    Builder, Config, Dimensions, Geometry, MAX_GATE_OUTPUTS, MAX_SOURCE_OUTPUTS, Timing,
};
pub use display::Display;
pub use error::{BmpError, BuilderError, Error, Operation};
pub use framebuffer::{Framebuffer, Plane, WriteMode};
pub use interface::InterfaceError;
pub use interface::{DisplayInterface, Interface};
pub use panel::{ImagePart, ImageWrite, Panel, PanelState, PlaneData};
pub use rotation::Rotation;
pub use window::{Area, PartialWindow};

#[cfg(feature = "graphics")]
pub use graphics::GraphicDisplay;
