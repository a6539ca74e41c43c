//! Hardware interface abstraction
//!
//! This module provides the [`DisplayInterface`] trait and the [`Interface`] struct
//! for communicating with an IL0373-family controller over SPI.
//!
//! ## Hardware Requirements
//!
//! The controller requires:
//! - SPI bus (MOSI + SCK, CS handled by the [`SpiDevice`])
//! - 3 GPIO pins:
//!   - **DC**: Data/Command select (output)
//!   - **RST**: Reset (output, active low)
//!   - **BUSY**: Busy status (input, active low on IL0373 boards)
//!
//! The interface only samples BUSY. Bounded waiting lives in
//! [`crate::poll::poll_until`] so every operation shares one loop.
//!
//! ## Example
//!
//! ```rust,no_run
//! use embedded_hal::delay::DelayNs;
//! use embedded_hal::digital::{InputPin, OutputPin};
//! use embedded_hal::spi::{Operation, SpiDevice};
//! use epd_panel::{DisplayInterface, Interface};
//! # use core::convert::Infallible;
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
//! # let mut delay = MockDelay;
//! let mut interface = Interface::new(MockSpi, MockPin, MockPin, MockPin);
//!
//! let _ = interface.reset(&mut delay, 10);
//! let _ = interface.send_command(0x04); // Power on
//! let busy = interface.is_busy();
//! # let _ = busy;
//! ```

use core::fmt::Debug;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiDevice;

type InterfaceResult<T, E> = core::result::Result<T, E>;

/// Transport to an e-paper controller
///
/// This trait abstracts over different hardware implementations,
/// allowing the [`Display`](crate::display::Display) to work with any
/// SPI + GPIO implementation, a bit-banged bus, or a simulator.
///
/// ## Implementing
///
/// For most cases, use the provided [`Interface`] struct. If you need
/// custom behavior (e.g., a board without a reset line, or a 3-wire bus),
/// implement this trait on your own type.
pub trait DisplayInterface {
    /// Error type for interface operations
    ///
    /// Must implement [`Debug`] for error reporting.
    type Error: Debug;

    /// Send a command byte to the controller
    ///
    /// # Errors
    ///
    /// Returns an error if SPI communication or GPIO fails.
    fn send_command(&mut self, command: u8) -> InterfaceResult<(), Self::Error>;

    /// Send data bytes to the controller
    ///
    /// # Errors
    ///
    /// Returns an error if SPI communication or GPIO fails.
    fn send_data(&mut self, data: &[u8]) -> InterfaceResult<(), Self::Error>;

    /// Pulse the reset line
    ///
    /// Holds RST low for `duration_ms`, releases it, then waits the same
    /// duration for the controller to come back up.
    ///
    /// # Errors
    ///
    /// Returns an error if the reset pin cannot be driven.
    fn reset<D: DelayNs>(
        &mut self,
        delay: &mut D,
        duration_ms: u32,
    ) -> InterfaceResult<(), Self::Error>;

    /// Sample the BUSY line once
    ///
    /// Returns `true` while the controller is processing.
    ///
    /// # Errors
    ///
    /// Returns an error if the busy pin cannot be read.
    fn is_busy(&mut self) -> InterfaceResult<bool, Self::Error>;

    /// Whether a reset line is wired
    ///
    /// Deep sleep is only entered when this returns `true`, since nothing
    /// else can wake the controller.
    fn has_reset(&self) -> bool {
        true
    }
}

/// Errors that can occur at the interface level
///
/// Generic over SPI and GPIO error types.
#[derive(Debug)]
pub enum InterfaceError<SpiErr, PinErr> {
    /// SPI communication error
    Spi(SpiErr),
    /// GPIO pin error
    Pin(PinErr),
}

impl<SpiErr: Debug, PinErr: Debug> core::fmt::Display for InterfaceError<SpiErr, PinErr> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Spi(e) => write!(f, "SPI error: {e:?}"),
            Self::Pin(e) => write!(f, "Pin error: {e:?}"),
        }
    }
}

impl<SpiErr: Debug, PinErr: Debug> core::error::Error for InterfaceError<SpiErr, PinErr> {}

/// Hardware interface over embedded-hal v1.0 SPI and GPIO traits
///
/// ## Type Parameters
///
/// * `SPI` - SPI device implementing [`SpiDevice`]
/// * `DC` - Data/Command pin implementing [`OutputPin`]
/// * `RST` - Reset pin implementing [`OutputPin`]
/// * `BUSY` - Busy pin implementing [`InputPin`]
///
/// ## Example
///
/// ```rust,no_run
/// use epd_panel::{Builder, Dimensions, Display, Interface};
/// # use core::convert::Infallible;
/// # use embedded_hal::digital::{InputPin, OutputPin};
/// # use embedded_hal::spi::{Operation, SpiDevice};
/// # struct MockSpi;
/// # impl embedded_hal::spi::ErrorType for MockSpi { type Error = Infallible; }
/// # impl SpiDevice for MockSpi {
/// #     fn transaction(
/// #         &mut self,
/// #         _operations: &mut [Operation<'_, u8>],
/// #     ) -> Result<(), Self::Error> {
/// #         Ok(())
/// #     }
/// # }
/// # struct MockPin;
/// # impl embedded_hal::digital::ErrorType for MockPin { type Error = Infallible; }
/// # impl OutputPin for MockPin {
/// #     fn set_low(&mut self) -> Result<(), Self::Error> { Ok(()) }
/// #     fn set_high(&mut self) -> Result<(), Self::Error> { Ok(()) }
/// # }
/// # impl InputPin for MockPin {
/// #     fn is_high(&mut self) -> Result<bool, Self::Error> { Ok(true) }
/// #     fn is_low(&mut self) -> Result<bool, Self::Error> { Ok(false) }
/// # }
/// let interface = Interface::new(
///     MockSpi,  // SpiDevice
///     MockPin,  // DC
///     MockPin,  // RST
///     MockPin,  // BUSY
/// );
///
/// # let dims = match Dimensions::new(104, 212) {
/// #     Ok(dims) => dims,
/// #     Err(_) => return,
/// # };
/// # let config = match Builder::new().dimensions(dims).build() {
/// #     Ok(config) => config,
/// #     Err(_) => return,
/// # };
/// let _display = Display::new(interface, config);
/// ```
pub struct Interface<SPI, DC, RST, BUSY> {
    /// SPI device for communication
    spi: SPI,
    /// Data/Command select pin (low=command, high=data)
    dc: DC,
    /// Reset pin (active low)
    rst: RST,
    /// Busy pin
    busy: BUSY,
    /// Busy pin polarity (true = active high, false = active low)
    busy_active_high: bool,
}

impl<SPI, DC, RST, BUSY> Interface<SPI, DC, RST, BUSY>
where
    SPI: SpiDevice,
    DC: OutputPin,
    RST: OutputPin,
    BUSY: InputPin,
{
    /// Create a new Interface
    ///
    /// BUSY defaults to active-low, which is what IL0373 modules drive.
    pub fn new(spi: SPI, dc: DC, rst: RST, busy: BUSY) -> Self {
        Self {
            spi,
            dc,
            rst,
            busy,
            busy_active_high: false,
        }
    }

    /// Set busy pin polarity
    ///
    /// Set to true for boards that invert BUSY.
    pub fn set_busy_active_high(&mut self, active_high: bool) -> &mut Self {
        self.busy_active_high = active_high;
        self
    }

    /// Get busy pin polarity (true = active high)
    pub fn busy_active_high(&self) -> bool {
        self.busy_active_high
    }

    /// Release the bus and pins
    pub fn release(self) -> (SPI, DC, RST, BUSY) {
        (self.spi, self.dc, self.rst, self.busy)
    }
}

impl<SPI, DC, RST, BUSY, PinErr> DisplayInterface for Interface<SPI, DC, RST, BUSY>
where
    SPI: SpiDevice,
    SPI::Error: Debug,
    DC: OutputPin<Error = PinErr>,
    RST: OutputPin<Error = PinErr>,
    BUSY: InputPin<Error = PinErr>,
    PinErr: Debug,
{
    type Error = InterfaceError<SPI::Error, PinErr>;

    fn send_command(&mut self, command: u8) -> InterfaceResult<(), Self::Error> {
        self.dc.set_low().map_err(InterfaceError::Pin)?;
        self.spi.write(&[command]).map_err(InterfaceError::Spi)?;
        Ok(())
    }

    fn send_data(&mut self, data: &[u8]) -> InterfaceResult<(), Self::Error> {
        if data.is_empty() {
            return Ok(());
        }
        self.dc.set_high().map_err(InterfaceError::Pin)?;
        self.spi.write(data).map_err(InterfaceError::Spi)?;
        Ok(())
    }

    fn reset<D: DelayNs>(
        &mut self,
        delay: &mut D,
        duration_ms: u32,
    ) -> InterfaceResult<(), Self::Error> {
        self.rst.set_low().map_err(InterfaceError::Pin)?;
        delay.delay_ms(duration_ms);
        self.rst.set_high().map_err(InterfaceError::Pin)?;
        delay.delay_ms(duration_ms);
        Ok(())
    }

    fn is_busy(&mut self) -> InterfaceResult<bool, Self::Error> {
        if self.busy_active_high {
            self.busy.is_high().map_err(InterfaceError::Pin)
        } else {
            self.busy.is_low().map_err(InterfaceError::Pin)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };
    use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};

    fn idle_pin() -> PinMock {
        PinMock::new(&[])
    }

    #[test]
    fn test_command_then_data_framing() {
        let mut spi = SpiMock::new(&[
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(vec![0x10]),
            SpiTransaction::transaction_end(),
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(vec![0xFF, 0x00]),
            SpiTransaction::transaction_end(),
        ]);
        let mut dc = PinMock::new(&[
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ]);
        let mut rst = idle_pin();
        let mut busy = idle_pin();

        let mut interface = Interface::new(spi.clone(), dc.clone(), rst.clone(), busy.clone());
        interface.send_command(0x10).unwrap();
        interface.send_data(&[0xFF, 0x00]).unwrap();

        spi.done();
        dc.done();
        rst.done();
        busy.done();
    }

    #[test]
    fn test_empty_data_is_skipped() {
        let mut spi = SpiMock::new(&[]);
        let mut dc = idle_pin();
        let mut rst = idle_pin();
        let mut busy = idle_pin();

        let mut interface = Interface::new(spi.clone(), dc.clone(), rst.clone(), busy.clone());
        interface.send_data(&[]).unwrap();

        spi.done();
        dc.done();
        rst.done();
        busy.done();
    }

    #[test]
    fn test_reset_pulses_low_then_high() {
        let mut spi = SpiMock::new(&[]);
        let mut dc = idle_pin();
        let mut rst = PinMock::new(&[
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ]);
        let mut busy = idle_pin();

        let mut interface = Interface::new(spi.clone(), dc.clone(), rst.clone(), busy.clone());
        interface.reset(&mut NoopDelay, 10).unwrap();

        spi.done();
        dc.done();
        rst.done();
        busy.done();
    }

    #[test]
    fn test_busy_active_low_by_default() {
        let mut spi = SpiMock::new(&[]);
        let mut dc = idle_pin();
        let mut rst = idle_pin();
        let mut busy = PinMock::new(&[
            PinTransaction::get(PinState::Low),
            PinTransaction::get(PinState::High),
        ]);

        let mut interface = Interface::new(spi.clone(), dc.clone(), rst.clone(), busy.clone());
        assert!(!interface.busy_active_high());
        assert!(interface.is_busy().unwrap());
        assert!(!interface.is_busy().unwrap());

        spi.done();
        dc.done();
        rst.done();
        busy.done();
    }

    #[test]
    fn test_busy_polarity_can_be_inverted() {
        let mut spi = SpiMock::new(&[]);
        let mut dc = idle_pin();
        let mut rst = idle_pin();
        let mut busy = PinMock::new(&[PinTransaction::get(PinState::High)]);

        let mut interface = Interface::new(spi.clone(), dc.clone(), rst.clone(), busy.clone());
        interface.set_busy_active_high(true);
        assert!(interface.is_busy().unwrap());

        spi.done();
        dc.done();
        rst.done();
        busy.done();
    }

    #[test]
    fn test_busy_read_error_is_pin_error() {
        use embedded_hal_mock::eh1::MockError;
        use std::io::ErrorKind;

        let mut spi = SpiMock::new(&[]);
        let mut dc = idle_pin();
        let mut rst = idle_pin();
        let mut busy = PinMock::new(&[PinTransaction::get(PinState::Low)
            .with_error(MockError::Io(ErrorKind::NotConnected))]);

        let mut interface = Interface::new(spi.clone(), dc.clone(), rst.clone(), busy.clone());
        assert!(matches!(interface.is_busy(), Err(InterfaceError::Pin(_))));

        spi.done();
        dc.done();
        rst.done();
        busy.done();
    }
}
