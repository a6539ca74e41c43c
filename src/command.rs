//! IL0373 command definitions
//!
//! Command bytes for the IL0373 e-paper controller (and the UC8151-style
//! controllers that share its partial-window command set). Commands are sent
//! over SPI with the DC pin low; their parameters follow with DC high.
//!
//! ## Partial framing
//!
//! RAM writes to a sub-rectangle are framed as:
//!
//! 1. [`PARTIAL_IN`]
//! 2. [`PARTIAL_WINDOW`] + 7 descriptor bytes
//! 3. [`DATA_START_TRANSMISSION_1`] + black plane bytes
//! 4. [`DATA_START_TRANSMISSION_2`] + color plane bytes
//! 5. [`PARTIAL_OUT`]
//!
//! ## Example
//!
//! ```rust,no_run
//! use epd_panel::{command, DisplayInterface, Interface};
//! # use core::convert::Infallible;
//! # use embedded_hal::digital::{InputPin, OutputPin};
//! # use embedded_hal::spi::{Operation, SpiDevice};
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
//! # let mut interface = Interface::new(MockSpi, MockPin, MockPin, MockPin);
//! // Power the charge pump on
//! let _ = interface.send_command(command::POWER_ON);
//!
//! // Fill the black plane of the current window with white
//! let _ = interface.send_command(command::DATA_START_TRANSMISSION_1);
//! let _ = interface.send_data(&[0xFF; 13]);
//! ```

// Panel configuration

/// Panel setting command (0x00)
///
/// Resolution select, LUT source, KW/KWR mode, scan direction, booster switch
/// and soft reset. Requires 1 byte.
pub const PANEL_SETTING: u8 = 0x00;

/// Booster soft start command (0x06)
///
/// Soft start period, drive strength and off time for phases A, B and C.
/// Requires 3 bytes.
pub const BOOSTER_SOFT_START: u8 = 0x06;

/// VCOM and data interval setting command (0x50)
///
/// Border output selection, data polarity and VCOM/data interval.
/// Requires 1 byte.
pub const VCOM_DATA_INTERVAL: u8 = 0x50;

/// Resolution setting command (0x61)
///
/// Requires 3 bytes: [HRES, VRES (MSB), VRES (LSB)]. HRES is byte aligned.
pub const RESOLUTION_SETTING: u8 = 0x61;

// Power management

/// Power off command (0x02)
///
/// Turns the charge pump off. BUSY is asserted until the sequence completes.
pub const POWER_OFF: u8 = 0x02;

/// Power on command (0x04)
///
/// Turns the charge pump on. BUSY is asserted until the sequence completes.
pub const POWER_ON: u8 = 0x04;

/// Deep sleep command (0x07)
///
/// Enters deep sleep. Requires the check byte [`DEEP_SLEEP_CHECK`].
/// Only a hardware reset leaves this state.
pub const DEEP_SLEEP: u8 = 0x07;

/// Check code that must follow [`DEEP_SLEEP`]
pub const DEEP_SLEEP_CHECK: u8 = 0xA5;

// RAM access

/// Data start transmission 1 (0x10)
///
/// Streams bytes into the black/white RAM bank of the current window.
pub const DATA_START_TRANSMISSION_1: u8 = 0x10;

/// Data start transmission 2 (0x13)
///
/// Streams bytes into the color RAM bank of the current window.
pub const DATA_START_TRANSMISSION_2: u8 = 0x13;

/// Display refresh command (0x12)
///
/// Drives the panel from RAM. BUSY is asserted for the whole waveform.
pub const DISPLAY_REFRESH: u8 = 0x12;

// Partial window

/// Partial window command (0x90)
///
/// Requires 7 bytes: [HRST, HRED, VRST (MSB), VRST (LSB), VRED (MSB),
/// VRED (LSB), PT_SCAN]. Horizontal bounds are byte aligned.
pub const PARTIAL_WINDOW: u8 = 0x90;

/// Partial in command (0x91)
///
/// Subsequent RAM streams and refreshes are limited to the partial window.
pub const PARTIAL_IN: u8 = 0x91;

/// Partial out command (0x92)
///
/// Leaves partial mode; RAM addressing returns to the full panel.
pub const PARTIAL_OUT: u8 = 0x92;

/// PT_SCAN value: gates scan only inside the window
pub const PARTIAL_SCAN_INSIDE: u8 = 0x01;
