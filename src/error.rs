//! Error types for the driver
//!
//! This module defines error types for configuration building ([`BuilderError`]),
//! panel operations ([`Error`]) and bitmap decoding ([`BmpError`]).
//!
//! ## Error Types
//!
//! - [`BuilderError`] - Errors during configuration construction
//! - [`Error`] - Runtime errors during panel operations
//! - [`BmpError`] - Bitmap header, format and length errors
//! - [`InterfaceError`](crate::interface::InterfaceError) - Low-level hardware communication errors
//!
//! Clipping is never an error: a rectangle that misses the panel is a
//! successful no-op.
//!
//! ## Example
//!
//! ```
//! use epd_panel::{Builder, Dimensions, BuilderError};
//!
//! // Missing dimensions
//! let result = Builder::new().build();
//! assert!(matches!(result, Err(BuilderError::MissingDimensions)));
//!
//! // Width must be byte aligned
//! let result = Dimensions::new(100, 212);
//! assert!(result.is_err());
//! ```

use crate::interface::DisplayInterface;

/// Maximum gate outputs (rows) supported by the IL0373 controller
pub const MAX_GATE_OUTPUTS: u16 = 296;

/// Maximum source outputs (columns) supported by the IL0373 controller
///
/// NOTE: Some panels wire fewer sources; configure [`crate::Dimensions`] accordingly.
pub const MAX_SOURCE_OUTPUTS: u16 = 160;

/// Blocking controller operation that waits on the BUSY line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    /// Charge pump power on
    PowerOn,
    /// Charge pump power off
    PowerOff,
    /// Refresh of a partial window
    PartialRefresh,
    /// Refresh of the whole panel
    FullRefresh,
}

impl core::fmt::Display for Operation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::PowerOn => "power on",
            Self::PowerOff => "power off",
            Self::PartialRefresh => "partial refresh",
            Self::FullRefresh => "full refresh",
        };
        f.write_str(name)
    }
}

/// Errors that can occur when interacting with the panel
///
/// Generic over the interface type to preserve the specific error type.
#[derive(Debug)]
pub enum Error<I: DisplayInterface> {
    /// Interface error (SPI/GPIO)
    ///
    /// Wraps the underlying hardware error from the [`DisplayInterface`] implementation.
    Interface(I::Error),
    /// BUSY did not clear within the operation's bound
    ///
    /// The controller may still finish the operation on its own. No state flag
    /// is updated; call [`crate::Panel::init`] to recover a known state.
    Timeout {
        /// Operation that was waiting
        operation: Operation,
        /// Bound that elapsed
        timeout_ms: u32,
    },
    /// The controller is in deep sleep
    ///
    /// Only [`crate::Panel::init`] (hardware reset) is accepted in this state.
    Hibernating,
    /// [`crate::Panel::init`] has not been called yet
    Uninitialized,
    /// Source or plane buffer is too small for the requested transfer
    BufferTooSmall {
        /// Required buffer size in bytes
        required: usize,
        /// Provided buffer size in bytes
        provided: usize,
    },
}

impl<I: DisplayInterface> core::fmt::Display for Error<I> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Interface(_) => write!(f, "Interface error"),
            Self::Timeout {
                operation,
                timeout_ms,
            } => write!(f, "Busy timeout during {operation} after {timeout_ms} ms"),
            Self::Hibernating => write!(f, "Panel is hibernating"),
            Self::Uninitialized => write!(f, "Panel is not initialized"),
            Self::BufferTooSmall { required, provided } => {
                write!(
                    f,
                    "Buffer too small: required {required} bytes, provided {provided}"
                )
            }
        }
    }
}

impl<I: DisplayInterface + core::fmt::Debug> core::error::Error for Error<I> {}

/// Errors that can occur when building configuration
///
/// These errors occur during the builder pattern before the display is created.
#[derive(Debug)]
pub enum BuilderError {
    /// Dimensions were not specified
    ///
    /// [`Builder::dimensions()`](crate::config::Builder::dimensions) must be called before building.
    MissingDimensions,
    /// Invalid dimensions provided
    ///
    /// See [`Dimensions::new()`](crate::config::Dimensions::new) for constraints.
    InvalidDimensions {
        /// Width requested
        width: u16,
        /// Height requested
        height: u16,
    },
    /// A plane buffer is smaller than the panel needs
    BufferTooSmall {
        /// Required buffer size in bytes
        required: usize,
        /// Provided buffer size in bytes
        provided: usize,
    },
}

impl core::fmt::Display for BuilderError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::MissingDimensions => write!(f, "Dimensions must be specified"),
            Self::InvalidDimensions { width, height } => write!(
                f,
                "Invalid dimensions {width}x{height} (max {MAX_SOURCE_OUTPUTS}x{MAX_GATE_OUTPUTS}, width must be multiple of 8)"
            ),
            Self::BufferTooSmall { required, provided } => write!(
                f,
                "Plane buffer too small: required {required} bytes, provided {provided}"
            ),
        }
    }
}

impl core::error::Error for BuilderError {}

/// Errors that can occur when decoding a bitmap file
///
/// Every variant except `Io` is reported before the destination is touched.
#[derive(Debug)]
pub enum BmpError {
    /// The file could not be read
    #[cfg(feature = "std")]
    Io(std::io::Error),
    /// The file is shorter than its headers claim
    Truncated {
        /// Bytes the headers require
        expected: usize,
        /// Bytes present
        available: usize,
    },
    /// The file does not start with `BM`
    InvalidSignature,
    /// Header fields are inconsistent (zero size, bad info header length)
    InvalidHeader,
    /// Compressed pixel data is not supported
    UnsupportedCompression(u32),
    /// The loader does not handle this bit depth
    UnsupportedBitDepth(u16),
    /// Destination buffer cannot hold the placed image
    BufferTooSmall {
        /// Required buffer size
        required: usize,
        /// Provided buffer size
        provided: usize,
    },
}

impl core::fmt::Display for BmpError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            #[cfg(feature = "std")]
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Truncated {
                expected,
                available,
            } => write!(
                f,
                "Truncated bitmap: expected {expected} bytes, found {available}"
            ),
            Self::InvalidSignature => write!(f, "Missing BM signature"),
            Self::InvalidHeader => write!(f, "Invalid bitmap header"),
            Self::UnsupportedCompression(c) => write!(f, "Unsupported compression {c}"),
            Self::UnsupportedBitDepth(bpp) => write!(f, "Unsupported bit depth {bpp}"),
            Self::BufferTooSmall { required, provided } => write!(
                f,
                "Buffer too small: required {required}, provided {provided}"
            ),
        }
    }
}

impl core::error::Error for BmpError {}

#[cfg(feature = "std")]
impl From<std::io::Error> for BmpError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
