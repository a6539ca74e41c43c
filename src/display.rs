//! IL0373 panel driver
//!
//! [`Display`] implements [`Panel`] for IL0373-family controllers such as the
//! GDEW0213Z16. It owns the transport, the configuration and the driver
//! state; the framebuffer lives elsewhere and is passed in as plane slices.
//!
//! Every RAM write is framed the same way:
//!
//! 1. reload the configuration registers and power on
//! 2. PARTIAL_IN, PARTIAL_WINDOW
//! 3. DATA_START_TRANSMISSION_1 (black), DATA_START_TRANSMISSION_2 (color)
//! 4. PARTIAL_OUT
//!
//! The first write after a reset also fills the rest of RAM, because
//! controller RAM is undefined outside anything written so far.

use embedded_hal::delay::DelayNs;
use log::{debug, trace, warn};

use crate::command::{
    BOOSTER_SOFT_START, DATA_START_TRANSMISSION_1, DATA_START_TRANSMISSION_2, DEEP_SLEEP,
    DEEP_SLEEP_CHECK, DISPLAY_REFRESH, PANEL_SETTING, PARTIAL_IN, PARTIAL_OUT, PARTIAL_WINDOW,
    POWER_OFF, POWER_ON, RESOLUTION_SETTING, VCOM_DATA_INTERVAL,
};
use crate::config::{Config, Dimensions, Geometry};
use crate::error::{Error, Operation};
use crate::interface::DisplayInterface;
use crate::panel::{ImagePart, ImageWrite, Panel, PanelState, PlaneData};
use crate::poll::poll_until;
use crate::window::{Area, Clip, PartialWindow, align_down, clip_to_panel, refresh_window};

type DisplayResult<I> = core::result::Result<(), Error<I>>;

/// Bytes buffered per SPI transfer when streaming generated data
const CHUNK_SIZE: usize = 64;

/// Batches single bytes into larger `send_data` calls
struct ChunkWriter<'a, I: DisplayInterface> {
    interface: &'a mut I,
    buf: [u8; CHUNK_SIZE],
    len: usize,
}

impl<'a, I: DisplayInterface> ChunkWriter<'a, I> {
    fn new(interface: &'a mut I) -> Self {
        Self {
            interface,
            buf: [0; CHUNK_SIZE],
            len: 0,
        }
    }

    fn push(&mut self, byte: u8) -> Result<(), I::Error> {
        self.buf[self.len] = byte;
        self.len += 1;
        if self.len == CHUNK_SIZE {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), I::Error> {
        if self.len > 0 {
            self.interface.send_data(&self.buf[..self.len])?;
            self.len = 0;
        }
        Ok(())
    }
}

/// Where the bytes of a clipped window come from in a source bitmap
#[derive(Clone, Copy, Debug)]
struct SourceLayout {
    /// Bytes per source row
    stride: usize,
    /// First source byte column of the part
    x_byte: usize,
    /// First source row of the part
    y_offset: usize,
    /// Rows in the whole source
    rows: usize,
    mirror_y: bool,
    invert: bool,
}

impl SourceLayout {
    fn index(&self, clip: &Clip, row: usize, col: usize) -> usize {
        let y = self.y_offset + clip.dy + row;
        let y = if self.mirror_y {
            self.rows.saturating_sub(1 + y)
        } else {
            y
        };
        y * self.stride + self.x_byte + clip.dx_bytes + col
    }

    fn byte(&self, plane: Option<&[u8]>, clip: &Clip, row: usize, col: usize) -> u8 {
        let Some(plane) = plane else {
            return 0xFF;
        };
        let byte = plane
            .get(self.index(clip, row, col))
            .copied()
            .unwrap_or(0xFF);
        if self.invert { !byte } else { byte }
    }
}

fn to_usize(value: i32) -> usize {
    usize::try_from(value).unwrap_or(0)
}

/// IL0373 controller-family driver
///
/// ## Example
///
/// ```rust,no_run
/// use epd_panel::{Builder, Dimensions, Display, Interface, Panel};
/// # use core::convert::Infallible;
/// # use embedded_hal::delay::DelayNs;
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
/// # struct MockDelay;
/// # impl DelayNs for MockDelay { fn delay_ns(&mut self, _ns: u32) {} }
/// # let mut delay = MockDelay;
/// let interface = Interface::new(MockSpi, MockPin, MockPin, MockPin);
/// let dims = match Dimensions::new(104, 212) {
///     Ok(dims) => dims,
///     Err(_) => return,
/// };
/// let config = match Builder::new().dimensions(dims).build() {
///     Ok(config) => config,
///     Err(_) => return,
/// };
/// let mut display = Display::new(interface, config);
///
/// if display.init(&mut delay).is_ok() {
///     let _ = display.clear_screen(0xFF, 0xFF, &mut delay);
///     let _ = display.hibernate(&mut delay);
/// }
/// ```
pub struct Display<I>
where
    I: DisplayInterface,
{
    /// Hardware interface
    interface: I,
    /// Panel configuration
    config: Config,
    /// Power, sleep and RAM bookkeeping
    state: PanelState,
}

impl<I> Display<I>
where
    I: DisplayInterface,
{
    /// Create a new Display instance
    ///
    /// Nothing is sent until [`Panel::init`].
    pub fn new(interface: I, config: Config) -> Self {
        Self {
            interface,
            config,
            state: PanelState::default(),
        }
    }

    /// Access the underlying configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get panel dimensions
    pub fn dimensions(&self) -> &Dimensions {
        &self.config.dimensions
    }

    /// Access the transport
    pub fn interface(&self) -> &I {
        &self.interface
    }

    /// Access the transport mutably
    pub fn interface_mut(&mut self) -> &mut I {
        &mut self.interface
    }

    /// Give the transport back
    pub fn release(self) -> I {
        self.interface
    }

    fn ensure_ready(&self) -> DisplayResult<I> {
        if self.state.hibernating {
            return Err(Error::Hibernating);
        }
        if !self.state.initialized {
            return Err(Error::Uninitialized);
        }
        Ok(())
    }

    /// Send a command to the controller
    fn send_command(&mut self, cmd: u8) -> DisplayResult<I> {
        self.interface.send_command(cmd).map_err(Error::Interface)
    }

    /// Send data to the controller
    fn send_data(&mut self, data: &[u8]) -> DisplayResult<I> {
        self.interface.send_data(data).map_err(Error::Interface)
    }

    /// Load booster, panel setting, VCOM interval and resolution
    fn send_config(&mut self) -> DisplayResult<I> {
        let booster = self.config.booster_soft_start;
        self.send_command(BOOSTER_SOFT_START)?;
        self.send_data(&booster)?;

        self.send_command(PANEL_SETTING)?;
        self.send_data(&[self.config.panel_setting])?;

        self.send_command(VCOM_DATA_INTERVAL)?;
        self.send_data(&[self.config.vcom_data_interval])?;

        let resolution = self.config.resolution_bytes();
        self.send_command(RESOLUTION_SETTING)?;
        self.send_data(&resolution)
    }

    /// Configuration reload and power on before any RAM access
    fn prepare_partial<D: DelayNs>(&mut self, delay: &mut D) -> DisplayResult<I> {
        self.send_config()?;
        self.power_on(delay)
    }

    fn wait_while_busy<D: DelayNs>(
        &mut self,
        operation: Operation,
        timeout_ms: u32,
        delay: &mut D,
    ) -> DisplayResult<I> {
        let interval_ms = self.config.timing.poll_interval_ms;
        let interface = &mut self.interface;
        let ready = poll_until(delay, interval_ms, timeout_ms, || {
            interface.is_busy().map(|busy| !busy)
        })
        .map_err(Error::Interface)?;

        if ready {
            Ok(())
        } else {
            warn!("busy timeout during {} after {} ms", operation, timeout_ms);
            Err(Error::Timeout {
                operation,
                timeout_ms,
            })
        }
    }

    fn set_window(&mut self, window: &PartialWindow) -> DisplayResult<I> {
        let descriptor = window.descriptor();
        trace!("partial window {:?} -> {:02x?}", window, descriptor);
        self.send_command(PARTIAL_WINDOW)?;
        self.send_data(&descriptor)
    }

    fn open_frame(&mut self, window: &PartialWindow) -> DisplayResult<I> {
        self.send_command(PARTIAL_IN)?;
        self.state.partial_mode_active = true;
        self.set_window(window)
    }

    fn close_frame(&mut self) -> DisplayResult<I> {
        self.send_command(PARTIAL_OUT)?;
        self.state.partial_mode_active = false;
        Ok(())
    }

    fn full_window(&self) -> Option<PartialWindow> {
        let Dimensions { width, height } = self.config.dimensions;
        PartialWindow::full(width, height)
    }

    fn check_source(plane: Option<&[u8]>, required: usize) -> DisplayResult<I> {
        match plane {
            Some(bytes) if bytes.len() < required => Err(Error::BufferTooSmall {
                required,
                provided: bytes.len(),
            }),
            _ => Ok(()),
        }
    }

    fn check_plane(&self, plane: PlaneData<'_>) -> DisplayResult<I> {
        match plane {
            PlaneData::Buffer(bytes) => {
                Self::check_source(Some(bytes), self.config.dimensions.buffer_size())
            }
            PlaneData::Fill(_) => Ok(()),
        }
    }

    /// Stream one whole plane into the open full-panel window
    fn stream_plane(&mut self, command: u8, plane: PlaneData<'_>) -> DisplayResult<I> {
        let size = self.config.dimensions.buffer_size();
        self.send_command(command)?;
        match plane {
            PlaneData::Buffer(bytes) => self.send_data(&bytes[..size]),
            PlaneData::Fill(value) => {
                let chunk = [value; CHUNK_SIZE];
                let mut remaining = size;
                while remaining > 0 {
                    let n = remaining.min(CHUNK_SIZE);
                    self.send_data(&chunk[..n])?;
                    remaining -= n;
                }
                Ok(())
            }
        }
    }

    /// Stream the clipped part of a source bitmap into the open window
    fn stream_window(
        &mut self,
        command: u8,
        plane: Option<&[u8]>,
        layout: &SourceLayout,
        clip: &Clip,
    ) -> DisplayResult<I> {
        self.send_command(command)?;
        let rows = usize::from(clip.window.height());
        let cols = clip.window.bytes_per_row();
        let mut writer = ChunkWriter::new(&mut self.interface);
        for row in 0..rows {
            for col in 0..cols {
                writer
                    .push(layout.byte(plane, clip, row, col))
                    .map_err(Error::Interface)?;
            }
        }
        writer.flush().map_err(Error::Interface)
    }

    fn write_full_frame<D: DelayNs>(
        &mut self,
        black: PlaneData<'_>,
        color: PlaneData<'_>,
        refresh: bool,
        delay: &mut D,
    ) -> DisplayResult<I> {
        self.ensure_ready()?;
        self.check_plane(black)?;
        if self.config.has_color {
            self.check_plane(color)?;
        }
        let Some(window) = self.full_window() else {
            return Ok(());
        };

        self.prepare_partial(delay)?;
        self.open_frame(&window)?;
        self.stream_plane(DATA_START_TRANSMISSION_1, black)?;
        if self.config.has_color {
            self.stream_plane(DATA_START_TRANSMISSION_2, color)?;
        }
        if refresh {
            debug!("refresh full panel through partial window");
            self.send_command(DISPLAY_REFRESH)?;
            let timeout_ms = self.config.timing.partial_refresh_ms;
            self.wait_while_busy(Operation::PartialRefresh, timeout_ms, delay)?;
        }
        self.close_frame()?;
        self.state.initial_write_done = true;
        Ok(())
    }

    fn ensure_initial_write<D: DelayNs>(&mut self, delay: &mut D) -> DisplayResult<I> {
        if self.state.initial_write_done {
            return Ok(());
        }
        debug!("first RAM write since reset, clearing both banks");
        let black = PlaneData::Fill(self.config.clear_black_value);
        let color = PlaneData::Fill(self.config.clear_color_value);
        self.write_full_frame(black, color, false, delay)
    }

    fn write_window<D: DelayNs>(
        &mut self,
        black: Option<&[u8]>,
        color: Option<&[u8]>,
        layout: &SourceLayout,
        clip: &Clip,
        delay: &mut D,
    ) -> DisplayResult<I> {
        self.prepare_partial(delay)?;
        self.open_frame(&clip.window)?;
        self.stream_window(DATA_START_TRANSMISSION_1, black, layout, clip)?;
        if self.config.has_color {
            self.stream_window(DATA_START_TRANSMISSION_2, color, layout, clip)?;
        }
        self.close_frame()
    }
}

impl<I> Panel for Display<I>
where
    I: DisplayInterface,
{
    type Error = Error<I>;

    fn geometry(&self) -> Geometry {
        self.config.geometry()
    }

    fn state(&self) -> PanelState {
        self.state
    }

    fn init<D: DelayNs>(&mut self, delay: &mut D) -> DisplayResult<I> {
        debug!("init: hardware reset and register load");
        self.interface
            .reset(delay, self.config.timing.reset_ms)
            .map_err(Error::Interface)?;
        // reset powers the controller down and leaves RAM undefined
        self.state = PanelState::default();
        self.send_config()?;
        self.state.initialized = true;
        Ok(())
    }

    fn power_on<D: DelayNs>(&mut self, delay: &mut D) -> DisplayResult<I> {
        self.ensure_ready()?;
        if self.state.powered {
            return Ok(());
        }
        debug!("power on");
        self.send_command(POWER_ON)?;
        let timeout_ms = self.config.timing.power_on_ms;
        self.wait_while_busy(Operation::PowerOn, timeout_ms, delay)?;
        self.state.powered = true;
        Ok(())
    }

    fn power_off<D: DelayNs>(&mut self, delay: &mut D) -> DisplayResult<I> {
        self.ensure_ready()?;
        debug!("power off");
        self.send_command(POWER_OFF)?;
        let timeout_ms = self.config.timing.power_off_ms;
        self.wait_while_busy(Operation::PowerOff, timeout_ms, delay)?;
        self.state.powered = false;
        Ok(())
    }

    fn hibernate<D: DelayNs>(&mut self, delay: &mut D) -> DisplayResult<I> {
        self.power_off(delay)?;
        if !self.interface.has_reset() {
            debug!("no reset line, staying out of deep sleep");
            return Ok(());
        }
        debug!("deep sleep");
        self.send_command(DEEP_SLEEP)?;
        self.send_data(&[DEEP_SLEEP_CHECK])?;
        self.state.hibernating = true;
        Ok(())
    }

    fn write_screen_buffer<D: DelayNs>(
        &mut self,
        black: PlaneData<'_>,
        color: PlaneData<'_>,
        delay: &mut D,
    ) -> DisplayResult<I> {
        self.write_full_frame(black, color, false, delay)
    }

    fn write_image<D: DelayNs>(
        &mut self,
        image: &ImageWrite<'_>,
        delay: &mut D,
    ) -> DisplayResult<I> {
        self.ensure_ready()?;
        let Area { x, y, w, h } = image.area;
        let stride = to_usize(w).div_ceil(8);
        let required = stride.saturating_mul(to_usize(h));
        Self::check_source(image.black, required)?;
        Self::check_source(image.color, required)?;

        self.ensure_initial_write(delay)?;

        let Dimensions { width, height } = self.config.dimensions;
        let Some(clip) = clip_to_panel(x, y, w, h, width, height) else {
            trace!("write_image outside panel: {:?}", image.area);
            return Ok(());
        };
        let layout = SourceLayout {
            stride,
            x_byte: 0,
            y_offset: 0,
            rows: to_usize(h),
            mirror_y: image.mirror_y,
            invert: image.invert,
        };
        self.write_window(image.black, image.color, &layout, &clip, delay)
    }

    fn write_image_part<D: DelayNs>(
        &mut self,
        part: &ImagePart<'_>,
        delay: &mut D,
    ) -> DisplayResult<I> {
        self.ensure_ready()?;
        let stride = to_usize(part.w_bitmap).div_ceil(8);
        let required = stride.saturating_mul(to_usize(part.h_bitmap));
        Self::check_source(part.black, required)?;
        Self::check_source(part.color, required)?;

        self.ensure_initial_write(delay)?;

        let Area { x, y, w, h } = part.area;
        if part.w_bitmap < 0 || part.h_bitmap < 0 || w < 0 || h < 0 {
            return Ok(());
        }
        if part.x_part < 0 || part.x_part >= part.w_bitmap {
            return Ok(());
        }
        if part.y_part < 0 || part.y_part >= part.h_bitmap {
            return Ok(());
        }
        let x_part = align_down(part.x_part);
        let w = w.min(part.w_bitmap - x_part);
        let h = h.min(part.h_bitmap - part.y_part);

        let Dimensions { width, height } = self.config.dimensions;
        let Some(clip) = clip_to_panel(x, y, w, h, width, height) else {
            trace!("write_image_part outside panel: {:?}", part.area);
            return Ok(());
        };
        let layout = SourceLayout {
            stride,
            x_byte: to_usize(x_part) / 8,
            y_offset: to_usize(part.y_part),
            rows: to_usize(part.h_bitmap),
            mirror_y: part.mirror_y,
            invert: part.invert,
        };
        self.write_window(part.black, part.color, &layout, &clip, delay)
    }

    fn refresh_area<D: DelayNs>(&mut self, area: Area, delay: &mut D) -> DisplayResult<I> {
        self.ensure_ready()?;
        let Dimensions { width, height } = self.config.dimensions;
        let Some(window) = refresh_window(area, width, height) else {
            trace!("refresh outside panel: {:?}", area);
            return Ok(());
        };

        self.prepare_partial(delay)?;
        let framed = self.config.use_partial_window && !self.state.partial_mode_active;
        if framed {
            self.send_command(PARTIAL_IN)?;
            self.state.partial_mode_active = true;
        }
        self.set_window(&window)?;

        debug!("partial refresh {:?}", window.area());
        self.send_command(DISPLAY_REFRESH)?;
        let timeout_ms = self.config.timing.partial_refresh_ms;
        self.wait_while_busy(Operation::PartialRefresh, timeout_ms, delay)?;

        if framed {
            self.close_frame()?;
        }
        Ok(())
    }

    fn refresh<D: DelayNs>(
        &mut self,
        partial_update_mode: bool,
        delay: &mut D,
    ) -> DisplayResult<I> {
        let Dimensions { width, height } = self.config.dimensions;
        if partial_update_mode {
            return self.refresh_area(Area::full(width, height), delay);
        }
        self.power_on(delay)?;
        debug!("full refresh");
        self.send_command(DISPLAY_REFRESH)?;
        let timeout_ms = self.config.timing.full_refresh_ms;
        self.wait_while_busy(Operation::FullRefresh, timeout_ms, delay)
    }

    fn clear_screen<D: DelayNs>(
        &mut self,
        black_value: u8,
        color_value: u8,
        delay: &mut D,
    ) -> DisplayResult<I> {
        self.write_full_frame(
            PlaneData::Fill(black_value),
            PlaneData::Fill(color_value),
            true,
            delay,
        )
    }
}
