//! Panel geometry, timing and controller configuration

pub use crate::error::{BuilderError, MAX_GATE_OUTPUTS, MAX_SOURCE_OUTPUTS};

/// Panel dimensions in native (unrotated) orientation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dimensions {
    /// Width in pixels (source outputs, byte addressed)
    pub width: u16,
    /// Height in pixels (gate outputs)
    pub height: u16,
}

impl Dimensions {
    /// Create new dimensions with validation
    ///
    /// # Errors
    ///
    /// Returns `BuilderError::InvalidDimensions` if:
    /// - width == 0 or width > MAX_SOURCE_OUTPUTS
    /// - width % 8 != 0 (the controller addresses RAM in byte columns)
    /// - height == 0 or height > MAX_GATE_OUTPUTS
    pub fn new(width: u16, height: u16) -> Result<Self, BuilderError> {
        if width == 0 || width > MAX_SOURCE_OUTPUTS || width % 8 != 0 {
            return Err(BuilderError::InvalidDimensions { width, height });
        }
        if height == 0 || height > MAX_GATE_OUTPUTS {
            return Err(BuilderError::InvalidDimensions { width, height });
        }
        Ok(Self { width, height })
    }

    /// Bytes per row of a plane
    pub fn bytes_per_row(&self) -> usize {
        (self.width as usize).div_ceil(8)
    }

    /// Size of one plane in bytes
    pub fn buffer_size(&self) -> usize {
        self.bytes_per_row() * self.height as usize
    }
}

/// Busy-wait bounds for each blocking controller operation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timing {
    /// Bound for the power-on sequence
    pub power_on_ms: u32,
    /// Bound for the power-off sequence
    pub power_off_ms: u32,
    /// Bound for a full refresh
    pub full_refresh_ms: u32,
    /// Bound for a partial refresh
    pub partial_refresh_ms: u32,
    /// Duration the reset line is held low, and the settle time after release
    pub reset_ms: u32,
    /// Interval between BUSY samples
    pub poll_interval_ms: u32,
}

impl Default for Timing {
    fn default() -> Self {
        // GDEW0213Z16 figures; tri-color waveforms take the same time either way
        Self {
            power_on_ms: 60,
            power_off_ms: 20,
            full_refresh_ms: 15_000,
            partial_refresh_ms: 15_000,
            reset_ms: 10,
            poll_interval_ms: 1,
        }
    }
}

/// Immutable per-panel-type facts exposed through [`crate::Panel`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Geometry {
    /// Native dimensions
    pub dimensions: Dimensions,
    /// Busy-wait bounds
    pub timing: Timing,
    /// Whether the panel has a second (color) RAM bank
    pub has_color: bool,
}

/// IL0373 controller configuration
///
/// Use [`Builder`] to create a Config.
#[derive(Clone, Debug)]
pub struct Config {
    /// Panel dimensions
    pub dimensions: Dimensions,
    /// Busy-wait bounds
    pub timing: Timing,
    /// Booster soft start phases A, B, C (command 0x06)
    pub booster_soft_start: [u8; 3],
    /// Panel setting register (command 0x00)
    pub panel_setting: u8,
    /// VCOM/border/data polarity register (command 0x50)
    pub vcom_data_interval: u8,
    /// Whether the panel has a color RAM bank
    pub has_color: bool,
    /// Wrap area refreshes in PARTIAL_IN / PARTIAL_OUT
    pub use_partial_window: bool,
    /// Fill value for the black RAM bank when clearing
    pub clear_black_value: u8,
    /// Fill value for the color RAM bank when clearing
    pub clear_color_value: u8,
}

impl Config {
    /// Panel geometry derived from this configuration
    pub fn geometry(&self) -> Geometry {
        Geometry {
            dimensions: self.dimensions,
            timing: self.timing,
            has_color: self.has_color,
        }
    }

    /// Parameter bytes for the resolution setting command
    pub fn resolution_bytes(&self) -> [u8; 3] {
        let Dimensions { width, height } = self.dimensions;
        [(width & 0xF8) as u8, (height >> 8) as u8, (height & 0xFF) as u8]
    }
}

/// Builder for constructing controller configuration
///
/// # Example
///
/// ```rust,no_run
/// use epd_panel::{Builder, Dimensions};
///
/// let dims = match Dimensions::new(104, 212) {
///     Ok(dims) => dims,
///     Err(_) => return,
/// };
/// let config = match Builder::new().dimensions(dims).build() {
///     Ok(config) => config,
///     Err(_) => return,
/// };
/// let _ = config;
/// ```
#[must_use]
pub struct Builder {
    dimensions: Option<Dimensions>,
    timing: Timing,
    booster_soft_start: [u8; 3],
    panel_setting: u8,
    vcom_data_interval: u8,
    has_color: bool,
    use_partial_window: bool,
    clear_black_value: u8,
    clear_color_value: u8,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            dimensions: None,
            timing: Timing::default(),
            // 10ms soft start, strength 3, 6.58us off time on all phases
            booster_soft_start: [0x17, 0x17, 0x17],
            // 128x296 resolution select, OTP LUT, KWR mode, scan up, shift right, booster on
            panel_setting: 0x8F,
            // Border = LUTW, red and black data polarity, 10 hsync interval
            vcom_data_interval: 0x77,
            has_color: true,
            use_partial_window: true,
            clear_black_value: 0xFF,
            clear_color_value: 0xFF,
        }
    }
}

impl Builder {
    /// Create a new Builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set panel dimensions (required)
    pub fn dimensions(mut self, dims: Dimensions) -> Self {
        self.dimensions = Some(dims);
        self
    }

    /// Set busy-wait bounds
    pub fn timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    /// Set booster soft-start parameters
    pub fn booster_soft_start(mut self, values: [u8; 3]) -> Self {
        self.booster_soft_start = values;
        self
    }

    /// Set the panel setting register
    pub fn panel_setting(mut self, value: u8) -> Self {
        self.panel_setting = value;
        self
    }

    /// Set the VCOM and data interval register
    pub fn vcom_data_interval(mut self, value: u8) -> Self {
        self.vcom_data_interval = value;
        self
    }

    /// Declare whether the panel has a color RAM bank
    ///
    /// Single-plane panels only ever receive the first data transmission.
    pub fn has_color(mut self, value: bool) -> Self {
        self.has_color = value;
        self
    }

    /// Set whether area refreshes are framed with PARTIAL_IN / PARTIAL_OUT
    pub fn use_partial_window(mut self, value: bool) -> Self {
        self.use_partial_window = value;
        self
    }

    /// Set the fill value used to clear the black RAM bank
    pub fn clear_black_value(mut self, value: u8) -> Self {
        self.clear_black_value = value;
        self
    }

    /// Set the fill value used to clear the color RAM bank
    pub fn clear_color_value(mut self, value: u8) -> Self {
        self.clear_color_value = value;
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    ///
    /// Returns `BuilderError::MissingDimensions` if dimensions were not set
    pub fn build(self) -> Result<Config, BuilderError> {
        Ok(Config {
            dimensions: self.dimensions.ok_or(BuilderError::MissingDimensions)?,
            timing: self.timing,
            booster_soft_start: self.booster_soft_start,
            panel_setting: self.panel_setting,
            vcom_data_interval: self.vcom_data_interval,
            has_color: self.has_color,
            use_partial_window: self.use_partial_window,
            clear_black_value: self.clear_black_value,
            clear_color_value: self.clear_color_value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions_reject_unaligned_width() {
        assert!(matches!(
            Dimensions::new(100, 212),
            Err(BuilderError::InvalidDimensions {
                width: 100,
                height: 212
            })
        ));
    }

    #[test]
    fn test_dimensions_reject_zero() {
        assert!(Dimensions::new(0, 10).is_err());
        assert!(Dimensions::new(8, 0).is_err());
    }

    #[test]
    fn test_buffer_size() {
        let dims = Dimensions::new(104, 212).unwrap();
        assert_eq!(dims.bytes_per_row(), 13);
        assert_eq!(dims.buffer_size(), 13 * 212);
    }

    #[test]
    fn test_builder_requires_dimensions() {
        assert!(matches!(
            Builder::new().build(),
            Err(BuilderError::MissingDimensions)
        ));
    }

    #[test]
    fn test_resolution_bytes_for_2in13() {
        let config = Builder::new()
            .dimensions(Dimensions::new(104, 212).unwrap())
            .build()
            .unwrap();
        assert_eq!(config.resolution_bytes(), [0x68, 0x00, 0xD4]);
    }

    #[test]
    fn test_geometry_carries_timing() {
        let timing = Timing {
            full_refresh_ms: 4_000,
            ..Timing::default()
        };
        let config = Builder::new()
            .dimensions(Dimensions::new(104, 212).unwrap())
            .timing(timing)
            .has_color(false)
            .build()
            .unwrap();
        let geometry = config.geometry();
        assert_eq!(geometry.timing.full_refresh_ms, 4_000);
        assert!(!geometry.has_color);
    }
}
