//! Panel capability interface
//!
//! [`Panel`] is what the framebuffer and graphics layers depend on. Each
//! controller family gets one implementation; [`Display`](crate::Display)
//! is the IL0373 one.
//!
//! ## State
//!
//! ```text
//!   Uninitialized --init--> PoweredOff <--power_on/power_off--> PoweredOn
//!                               |
//!                           hibernate --> Hibernating --init--> PoweredOff
//! ```
//!
//! `partial_mode_active` is only set between PARTIAL_IN and PARTIAL_OUT
//! inside a single call. `initial_write_done` records whether controller RAM
//! has been fully written since the last reset.

use embedded_hal::delay::DelayNs;

use crate::config::Geometry;
use crate::window::Area;

/// Mutable driver state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PanelState {
    /// `init` has completed at least once
    pub initialized: bool,
    /// The charge pump is on
    pub powered: bool,
    /// The controller is in deep sleep
    pub hibernating: bool,
    /// A partial window frame is open
    pub partial_mode_active: bool,
    /// Controller RAM has received a full-screen write since reset
    pub initial_write_done: bool,
}

/// Source of one RAM plane for a full-screen write
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaneData<'a> {
    /// Stream a plane buffer in controller layout
    Buffer(&'a [u8]),
    /// Stream one byte value for every position
    Fill(u8),
}

/// A source bitmap written to a panel rectangle
///
/// `black` and `color` are packed 1-bpp planes, `ceil(w / 8)` bytes per row.
/// A missing plane is streamed as `0xFF` (no ink).
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageWrite<'a> {
    /// Black plane of the source
    pub black: Option<&'a [u8]>,
    /// Color plane of the source
    pub color: Option<&'a [u8]>,
    /// Panel rectangle; `w` and `h` are also the source size
    pub area: Area,
    /// Complement every streamed byte
    pub invert: bool,
    /// Read source rows bottom-up
    pub mirror_y: bool,
}

/// A sub-rectangle of a larger source bitmap written to a panel rectangle
#[derive(Clone, Copy, Debug, Default)]
pub struct ImagePart<'a> {
    /// Black plane of the whole source bitmap
    pub black: Option<&'a [u8]>,
    /// Color plane of the whole source bitmap
    pub color: Option<&'a [u8]>,
    /// Left edge of the part inside the source
    pub x_part: i32,
    /// Top edge of the part inside the source
    pub y_part: i32,
    /// Width of the whole source bitmap
    pub w_bitmap: i32,
    /// Height of the whole source bitmap
    pub h_bitmap: i32,
    /// Panel rectangle receiving the part
    pub area: Area,
    /// Complement every streamed byte
    pub invert: bool,
    /// Address source rows bottom-up
    pub mirror_y: bool,
}

/// Operations every e-paper controller family provides
///
/// Rectangles that miss the panel are successful no-ops. Calls block until
/// the controller's BUSY line clears or the operation's bound elapses.
pub trait Panel {
    /// Error type for panel operations
    type Error;

    /// Immutable geometry and timing of this panel type
    fn geometry(&self) -> Geometry;

    /// Current driver state
    fn state(&self) -> PanelState;

    /// Reset the controller and load its configuration
    ///
    /// Required once before anything else, and to leave deep sleep.
    fn init<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Self::Error>;

    /// Turn the charge pump on; no-op when already on
    fn power_on<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Self::Error>;

    /// Turn the charge pump off
    fn power_off<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Self::Error>;

    /// Power off, then enter deep sleep if the reset line can wake it again
    fn hibernate<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Self::Error>;

    /// Write both RAM banks for the whole panel without refreshing
    fn write_screen_buffer<D: DelayNs>(
        &mut self,
        black: PlaneData<'_>,
        color: PlaneData<'_>,
        delay: &mut D,
    ) -> Result<(), Self::Error>;

    /// Write a bitmap into a panel rectangle without refreshing
    fn write_image<D: DelayNs>(
        &mut self,
        image: &ImageWrite<'_>,
        delay: &mut D,
    ) -> Result<(), Self::Error>;

    /// Write part of a larger bitmap into a panel rectangle without refreshing
    fn write_image_part<D: DelayNs>(
        &mut self,
        part: &ImagePart<'_>,
        delay: &mut D,
    ) -> Result<(), Self::Error>;

    /// Refresh one rectangle from RAM
    fn refresh_area<D: DelayNs>(&mut self, area: Area, delay: &mut D) -> Result<(), Self::Error>;

    /// Refresh the whole panel
    ///
    /// `partial_update_mode` selects the windowed path; otherwise a full
    /// refresh clears ghosting at the cost of time.
    fn refresh<D: DelayNs>(
        &mut self,
        partial_update_mode: bool,
        delay: &mut D,
    ) -> Result<(), Self::Error>;

    /// Fill both RAM banks with constants and refresh the whole panel
    fn clear_screen<D: DelayNs>(
        &mut self,
        black_value: u8,
        color_value: u8,
        delay: &mut D,
    ) -> Result<(), Self::Error>;

    /// [`write_image`](Self::write_image) then refresh the same rectangle
    fn draw_image<D: DelayNs>(
        &mut self,
        image: &ImageWrite<'_>,
        delay: &mut D,
    ) -> Result<(), Self::Error> {
        self.write_image(image, delay)?;
        self.refresh_area(image.area, delay)
    }

    /// [`write_image_part`](Self::write_image_part) then refresh the same rectangle
    fn draw_image_part<D: DelayNs>(
        &mut self,
        part: &ImagePart<'_>,
        delay: &mut D,
    ) -> Result<(), Self::Error> {
        self.write_image_part(part, delay)?;
        self.refresh_area(part.area, delay)
    }
}
