//! Graphics support via embedded-graphics
//!
//! This module provides the [`GraphicDisplay`] struct which pairs any
//! [`Panel`] with a [`Framebuffer`] and implements the
//! [`DrawTarget`](embedded_graphics_core::draw_target::DrawTarget) trait from
//! the embedded-graphics ecosystem.
//!
//! Drawing only touches the framebuffer. [`GraphicDisplay::update`] pushes it
//! to the panel: the whole buffer with a full refresh, or, after
//! [`GraphicDisplay::set_partial_window`], only the window with a partial
//! refresh.
//!
//! ## Example
//!
//! ```rust,no_run
//! use embedded_graphics::{
//!     mono_font::{ascii::FONT_6X10, MonoTextStyle},
//!     prelude::*,
//!     primitives::{Circle, Rectangle, PrimitiveStyle},
//!     text::Text,
//! };
//! use epd_panel::{Color, GraphicDisplay, Panel};
//! # use core::convert::Infallible;
//! # use embedded_hal::delay::DelayNs;
//! # use embedded_hal::digital::{InputPin, OutputPin};
//! # use embedded_hal::spi::{Operation, SpiDevice};
//! # use epd_panel::{Builder, Dimensions, Display, Interface};
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
//! # let interface = Interface::new(MockSpi, MockPin, MockPin, MockPin);
//! # let dims = match Dimensions::new(104, 212) {
//! #     Ok(dims) => dims,
//! #     Err(_) => return,
//! # };
//! # let config = match Builder::new().dimensions(dims).build() {
//! #     Ok(config) => config,
//! #     Err(_) => return,
//! # };
//! # let display_driver = Display::new(interface, config);
//! # let buffer_size = dims.buffer_size();
//! # let mut delay = MockDelay;
//! // Create graphic display with buffers
//! let mut display = match GraphicDisplay::new(
//!     display_driver,
//!     vec![0xFFu8; buffer_size],
//!     Some(vec![0xFFu8; buffer_size]),
//! ) {
//!     Ok(display) => display,
//!     Err(_) => return,
//! };
//! let _ = display.panel_mut().init(&mut delay);
//!
//! // Clear to white
//! display.clear(Color::White);
//!
//! // Draw shapes
//! let _ = Rectangle::new(Point::new(10, 10), Size::new(50, 30))
//!     .into_styled(PrimitiveStyle::with_fill(Color::Red))
//!     .draw(&mut display);
//!
//! let _ = Circle::new(Point::new(20, 60), 40)
//!     .into_styled(PrimitiveStyle::with_stroke(Color::Black, 2))
//!     .draw(&mut display);
//!
//! // Draw text
//! let _ = Text::new(
//!     "Hello, E-Paper!",
//!     Point::new(4, 120),
//!     MonoTextStyle::new(&FONT_6X10, Color::Black),
//! )
//! .draw(&mut display);
//!
//! // Update physical display
//! let _ = display.update(&mut delay);
//! ```

use core::convert::Infallible;
use embedded_graphics_core::{
    draw_target::DrawTarget,
    geometry::{OriginDimensions, Point, Size},
    prelude::Pixel,
};
use embedded_hal::delay::DelayNs;
use log::debug;

use crate::color::Color;
use crate::config::Dimensions;
use crate::error::BuilderError;
use crate::framebuffer::{Framebuffer, WriteMode};
use crate::panel::{ImagePart, Panel, PlaneData};
use crate::rotation::{Rotation, rotate_area};
use crate::window::{Area, PartialWindow, refresh_window};

/// What the next [`GraphicDisplay::update`] sends
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum UpdateRegion {
    Full,
    Window(PartialWindow),
    /// The requested window missed the panel
    Empty,
}

type GraphicsResult<P> = core::result::Result<(), <P as Panel>::Error>;

/// Panel with graphics buffers
///
/// ## Type Parameters
///
/// * `P` - Panel type implementing [`Panel`]
/// * `B` - Plane buffer type, sized for the **physical** dimensions
pub struct GraphicDisplay<P, B>
where
    P: Panel,
    B: AsRef<[u8]> + AsMut<[u8]>,
{
    /// The underlying panel driver
    panel: P,
    /// Black plane plus optional color plane
    framebuffer: Framebuffer<B>,
    /// How drawn pixels combine with the buffer
    write_mode: WriteMode,
    region: UpdateRegion,
}

impl<P, B> GraphicDisplay<P, B>
where
    P: Panel,
    B: AsRef<[u8]> + AsMut<[u8]>,
{
    /// Create a new GraphicDisplay
    ///
    /// # Arguments
    ///
    /// * `panel` - The panel driver
    /// * `black` - Black plane (at least `dimensions.buffer_size()` bytes)
    /// * `color` - Color plane, `None` on single-plane panels
    ///
    /// # Errors
    ///
    /// Returns `BuilderError::BufferTooSmall` if a plane is smaller than the
    /// size required by the panel's physical dimensions.
    pub fn new(panel: P, black: B, color: Option<B>) -> Result<Self, BuilderError> {
        let dimensions = panel.geometry().dimensions;
        let framebuffer = Framebuffer::new(dimensions, black, color)?;
        Ok(Self {
            panel,
            framebuffer,
            write_mode: WriteMode::default(),
            region: UpdateRegion::Full,
        })
    }

    /// Fill the whole framebuffer with one color
    pub fn clear(&mut self, color: Color) {
        self.framebuffer.fill(color);
    }

    /// Current rotation
    pub fn rotation(&self) -> Rotation {
        self.framebuffer.rotation()
    }

    /// Set rotation for subsequent drawing and windows
    pub fn set_rotation(&mut self, rotation: Rotation) {
        self.framebuffer.set_rotation(rotation);
    }

    /// Current write mode
    pub fn write_mode(&self) -> WriteMode {
        self.write_mode
    }

    /// Set how drawn pixels combine with the framebuffer
    pub fn set_write_mode(&mut self, mode: WriteMode) {
        self.write_mode = mode;
    }

    /// Restrict the next updates to a rectangle in rotated coordinates
    ///
    /// The rectangle is mapped to native coordinates and widened to byte
    /// columns. A rectangle that misses the panel makes updates no-ops until
    /// another window is set.
    pub fn set_partial_window(&mut self, x: i32, y: i32, w: i32, h: i32) {
        let Dimensions { width, height } = self.framebuffer.dimensions();
        let area = rotate_area(Area::new(x, y, w, h), width, height, self.rotation());
        self.region = match refresh_window(area, width, height) {
            Some(window) => UpdateRegion::Window(window),
            None => UpdateRegion::Empty,
        };
    }

    /// Make the next updates cover the whole panel
    pub fn set_full_window(&mut self) {
        self.region = UpdateRegion::Full;
    }

    /// Native window the next update sends, `None` for the whole panel
    pub fn partial_window(&self) -> Option<PartialWindow> {
        match self.region {
            UpdateRegion::Window(window) => Some(window),
            UpdateRegion::Full | UpdateRegion::Empty => None,
        }
    }

    fn write_full_buffer<D: DelayNs>(&mut self, delay: &mut D) -> GraphicsResult<P> {
        let black = PlaneData::Buffer(self.framebuffer.black_plane());
        let color = match self.framebuffer.color_plane() {
            Some(plane) => PlaneData::Buffer(plane),
            None => PlaneData::Fill(0xFF),
        };
        self.panel.write_screen_buffer(black, color, delay)
    }

    /// Push the framebuffer to the panel and refresh
    ///
    /// Without a partial window the whole buffer is written and a full
    /// refresh runs. With one, only the window is written and refreshed.
    pub fn update<D: DelayNs>(&mut self, delay: &mut D) -> GraphicsResult<P> {
        match self.region {
            UpdateRegion::Full => {
                debug!("update: full buffer, full refresh");
                self.write_full_buffer(delay)?;
                self.panel.refresh(false, delay)
            }
            UpdateRegion::Window(window) => {
                let Dimensions { width, height } = self.framebuffer.dimensions();
                let area = window.area();
                debug!("update: window {:?}", area);
                let part = ImagePart {
                    black: Some(self.framebuffer.black_plane()),
                    color: self.framebuffer.color_plane(),
                    x_part: area.x,
                    y_part: area.y,
                    w_bitmap: i32::from(width),
                    h_bitmap: i32::from(height),
                    area,
                    invert: false,
                    mirror_y: false,
                };
                self.panel.write_image_part(&part, delay)?;
                self.panel.refresh_area(area, delay)
            }
            UpdateRegion::Empty => Ok(()),
        }
    }

    /// Push the whole framebuffer and refresh it through the partial path
    ///
    /// Faster than a full refresh, but leaves ghosting behind.
    pub fn update_partial<D: DelayNs>(&mut self, delay: &mut D) -> GraphicsResult<P> {
        self.write_full_buffer(delay)?;
        self.panel.refresh(true, delay)
    }

    /// Get reference to the underlying panel
    pub fn panel(&self) -> &P {
        &self.panel
    }

    /// Get mutable reference to the underlying panel
    pub fn panel_mut(&mut self) -> &mut P {
        &mut self.panel
    }

    /// Get reference to the framebuffer
    pub fn framebuffer(&self) -> &Framebuffer<B> {
        &self.framebuffer
    }

    /// Get mutable reference to the framebuffer
    pub fn framebuffer_mut(&mut self) -> &mut Framebuffer<B> {
        &mut self.framebuffer
    }

    /// Give back the panel and the plane buffers
    pub fn release(self) -> (P, B, Option<B>) {
        let (black, color) = self.framebuffer.release();
        (self.panel, black, color)
    }
}

impl<P, B> DrawTarget for GraphicDisplay<P, B>
where
    P: Panel,
    B: AsRef<[u8]> + AsMut<[u8]>,
{
    type Color = Color;
    type Error = Infallible;

    fn draw_iter<Iter>(&mut self, pixels: Iter) -> Result<(), Self::Error>
    where
        Iter: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(Point { x, y }, color) in pixels {
            self.framebuffer.write_pixel(x, y, color, self.write_mode);
        }
        Ok(())
    }
}

impl<P, B> OriginDimensions for GraphicDisplay<P, B>
where
    P: Panel,
    B: AsRef<[u8]> + AsMut<[u8]>,
{
    fn size(&self) -> Size {
        let (width, height) = self.framebuffer.logical_size();
        Size::new(u32::from(width), u32::from(height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{DATA_START_TRANSMISSION_1, DISPLAY_REFRESH, PARTIAL_WINDOW};
    use crate::config::{Builder, Dimensions};
    use crate::display::Display;
    use crate::sim::{SimDelay, SimInterface};
    use alloc::vec;
    use alloc::vec::Vec;
    use embedded_graphics::{
        prelude::*,
        primitives::{PrimitiveStyle, Rectangle},
    };

    type TestDisplay = GraphicDisplay<Display<SimInterface>, Vec<u8>>;

    fn test_display(width: u16, height: u16) -> TestDisplay {
        let config = Builder::new()
            .dimensions(Dimensions::new(width, height).unwrap())
            .build()
            .unwrap();
        let mut panel = Display::new(SimInterface::new(width, height), config);
        panel.init(&mut SimDelay::default()).unwrap();
        let size = panel.dimensions().buffer_size();
        GraphicDisplay::new(panel, vec![0xFF; size], Some(vec![0xFF; size])).unwrap()
    }

    fn sim(display: &TestDisplay) -> &SimInterface {
        display.panel().interface()
    }

    #[test]
    fn test_new_rejects_small_buffers() {
        let config = Builder::new()
            .dimensions(Dimensions::new(104, 212).unwrap())
            .build()
            .unwrap();
        let panel = Display::new(SimInterface::new(104, 212), config);
        let result = GraphicDisplay::new(panel, vec![0u8; 2756], Some(vec![0u8; 2755]));
        assert!(matches!(
            result,
            Err(BuilderError::BufferTooSmall {
                required: 2756,
                provided: 2755
            })
        ));
    }

    #[test]
    fn test_size_follows_rotation() {
        let mut display = test_display(104, 212);
        assert_eq!(display.size(), Size::new(104, 212));
        display.set_rotation(Rotation::Rotate90);
        assert_eq!(display.size(), Size::new(212, 104));
        display.set_rotation(Rotation::Rotate180);
        assert_eq!(display.size(), Size::new(104, 212));
    }

    #[test]
    fn test_draw_rectangle_fills_framebuffer() {
        let mut display = test_display(16, 8);
        Rectangle::new(Point::new(8, 1), Size::new(8, 2))
            .into_styled(PrimitiveStyle::with_fill(Color::Red))
            .draw(&mut display)
            .unwrap();

        let fb = display.framebuffer();
        assert_eq!(fb.pixel(8, 1), Some(Color::Red));
        assert_eq!(fb.pixel(15, 2), Some(Color::Red));
        assert_eq!(fb.pixel(7, 1), Some(Color::White));
        assert_eq!(fb.color_plane().unwrap()[3], 0x00);
        assert_eq!(fb.black_plane()[3], 0xFF);
    }

    #[test]
    fn test_out_of_bounds_pixels_are_dropped() {
        let mut display = test_display(16, 8);
        Pixel(Point::new(-1, 0), Color::Black)
            .draw(&mut display)
            .unwrap();
        Pixel(Point::new(16, 8), Color::Black)
            .draw(&mut display)
            .unwrap();
        assert!(display.framebuffer().black_plane().iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_xor_mode_toggles() {
        let mut display = test_display(16, 8);
        display.set_write_mode(WriteMode::Xor);
        // white is a set bit, so XOR against a white buffer clears it
        Pixel(Point::new(0, 0), Color::White)
            .draw(&mut display)
            .unwrap();
        assert_eq!(display.framebuffer().black_plane()[0], 0x7F);
        Pixel(Point::new(0, 0), Color::White)
            .draw(&mut display)
            .unwrap();
        assert_eq!(display.framebuffer().black_plane()[0], 0xFF);
    }

    #[test]
    fn test_full_update_pushes_buffer() {
        let mut display = test_display(16, 8);
        display.clear(Color::White);
        Pixel(Point::new(0, 0), Color::Black)
            .draw(&mut display)
            .unwrap();
        display.update(&mut SimDelay::default()).unwrap();

        let sim = sim(&display);
        assert_eq!(sim.black_ram[0], 0x7F);
        assert!(sim.black_ram[1..].iter().all(|&b| b == 0xFF));
        assert!(sim.color_ram.iter().all(|&b| b == 0xFF));
        assert_eq!(*sim.commands.last().unwrap(), DISPLAY_REFRESH);
        // full refresh: the only window is the full-screen write
        assert_eq!(sim.count(PARTIAL_WINDOW), 1);
    }

    #[test]
    fn test_windowed_update_sends_only_window() {
        let mut display = test_display(16, 8);
        let mut delay = SimDelay::default();
        display.clear(Color::White);
        display.update(&mut delay).unwrap();
        display.panel_mut().interface_mut().clear_log();

        display.set_partial_window(8, 2, 8, 2);
        Pixel(Point::new(0, 0), Color::Black)
            .draw(&mut display)
            .unwrap();
        Pixel(Point::new(8, 2), Color::Black)
            .draw(&mut display)
            .unwrap();
        display.update(&mut delay).unwrap();

        let sim = sim(&display);
        // outside the window: drawn but not sent
        assert_eq!(sim.black_ram[0], 0xFF);
        assert_eq!(sim.black_ram[2 * 2 + 1], 0x7F);
        assert_eq!(
            sim.data_for(PARTIAL_WINDOW),
            vec![
                vec![0x08, 0x0F, 0x00, 0x02, 0x00, 0x03, 0x01],
                vec![0x08, 0x0F, 0x00, 0x02, 0x00, 0x03, 0x01]
            ]
        );
        assert_eq!(sim.count(DATA_START_TRANSMISSION_1), 1);
        assert_eq!(sim.count(DISPLAY_REFRESH), 1);
        assert_eq!(sim.overrun, 0);
    }

    #[test]
    fn test_partial_window_is_rotated() {
        let mut display = test_display(16, 8);
        display.set_rotation(Rotation::Rotate90);
        display.set_partial_window(0, 0, 8, 4);
        let window = display.partial_window().unwrap();
        assert_eq!(window.area(), Area::new(8, 0, 8, 8));

        display.set_full_window();
        assert!(display.partial_window().is_none());
    }

    #[test]
    fn test_window_outside_panel_makes_update_noop() {
        let mut display = test_display(16, 8);
        display.panel_mut().interface_mut().clear_log();
        display.set_partial_window(100, 100, 8, 8);
        display.update(&mut SimDelay::default()).unwrap();
        assert!(sim(&display).commands.is_empty());
    }

    #[test]
    fn test_far_away_window_in_every_rotation_is_noop() {
        let mut display = test_display(16, 8);
        for rotation in [
            Rotation::Rotate0,
            Rotation::Rotate90,
            Rotation::Rotate180,
            Rotation::Rotate270,
        ] {
            display.set_rotation(rotation);
            display.set_partial_window(i32::MAX - 3, 0, 16, 1);
            assert!(display.partial_window().is_none());
            display.set_partial_window(0, i32::MIN, 8, 8);
            assert!(display.partial_window().is_none());
        }
        display.panel_mut().interface_mut().clear_log();
        display.update(&mut SimDelay::default()).unwrap();
        assert!(sim(&display).commands.is_empty());
    }

    #[test]
    fn test_update_partial_refreshes_whole_panel() {
        let mut display = test_display(16, 8);
        display.update_partial(&mut SimDelay::default()).unwrap();
        let sim = sim(&display);
        assert_eq!(
            sim.data_for(PARTIAL_WINDOW).last().unwrap(),
            &vec![0x00, 0x0F, 0x00, 0x00, 0x00, 0x07, 0x01]
        );
        assert_eq!(sim.count(DISPLAY_REFRESH), 1);
    }

    #[test]
    fn test_single_plane_framebuffer_sends_white_color_bank() {
        let config = Builder::new()
            .dimensions(Dimensions::new(16, 8).unwrap())
            .build()
            .unwrap();
        let mut panel = Display::new(SimInterface::new(16, 8), config);
        panel.init(&mut SimDelay::default()).unwrap();
        let mut display: TestDisplay = GraphicDisplay::new(panel, vec![0x00; 16], None).unwrap();
        display.update(&mut SimDelay::default()).unwrap();
        let sim = sim(&display);
        assert!(sim.black_ram.iter().all(|&b| b == 0x00));
        assert!(sim.color_ram.iter().all(|&b| b == 0xFF));
    }
}
