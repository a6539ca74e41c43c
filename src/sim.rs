//! Controller RAM simulator used by the driver tests
//!
//! Records every command and data transfer like a plain mock, and also
//! models IL0373 RAM addressing: the partial window, partial mode and the
//! two data transmission banks. Streams that run past the window are counted
//! in `overrun` instead of wrapping.

use alloc::vec;
use alloc::vec::Vec;
use embedded_hal::delay::DelayNs;

use crate::command::{
    DATA_START_TRANSMISSION_1, DATA_START_TRANSMISSION_2, DISPLAY_REFRESH, PARTIAL_IN,
    PARTIAL_OUT, PARTIAL_WINDOW, POWER_OFF, POWER_ON,
};
use crate::interface::DisplayInterface;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct SimWindow {
    pub x: u16,
    pub y: u16,
    pub x_end: u16,
    pub y_end: u16,
}

impl SimWindow {
    fn bytes_per_row(&self) -> usize {
        usize::from(self.x_end / 8 - self.x / 8 + 1)
    }

    fn rows(&self) -> usize {
        usize::from(self.y_end - self.y + 1)
    }
}

/// A finished RAM stream: which bank, how many bytes, the window it targeted
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Stream {
    pub command: u8,
    pub bytes: usize,
    pub window_bytes: usize,
}

#[derive(Debug)]
pub(crate) struct SimInterface {
    pub width: u16,
    pub height: u16,
    pub black_ram: Vec<u8>,
    pub color_ram: Vec<u8>,
    pub commands: Vec<u8>,
    pub command_data: Vec<(u8, Vec<u8>)>,
    pub streams: Vec<Stream>,
    pub resets: usize,
    pub overrun: usize,
    /// BUSY samples reported as busy after each blocking command
    pub busy_polls: u32,
    /// BUSY never clears
    pub stuck_busy: bool,
    pub reset_line: bool,
    pub partial: bool,
    pub window: SimWindow,
    pending_busy: u32,
    current: Option<u8>,
    cursor: usize,
}

impl SimInterface {
    pub fn new(width: u16, height: u16) -> Self {
        let size = usize::from(width).div_ceil(8) * usize::from(height);
        Self {
            width,
            height,
            // power-up RAM content is undefined; make it visible
            black_ram: vec![0xA5; size],
            color_ram: vec![0xA5; size],
            commands: Vec::new(),
            command_data: Vec::new(),
            streams: Vec::new(),
            resets: 0,
            overrun: 0,
            busy_polls: 0,
            stuck_busy: false,
            reset_line: true,
            partial: false,
            window: Self::full_window(width, height),
            pending_busy: 0,
            current: None,
            cursor: 0,
        }
    }

    fn full_window(width: u16, height: u16) -> SimWindow {
        SimWindow {
            x: 0,
            y: 0,
            x_end: width - 1,
            y_end: height - 1,
        }
    }

    pub fn count(&self, command: u8) -> usize {
        self.commands.iter().filter(|&&c| c == command).count()
    }

    pub fn data_for(&self, command: u8) -> Vec<Vec<u8>> {
        self.command_data
            .iter()
            .filter(|(c, _)| *c == command)
            .map(|(_, d)| d.clone())
            .collect()
    }

    /// Forget recorded traffic; RAM and window are kept
    pub fn clear_log(&mut self) {
        self.commands.clear();
        self.command_data.clear();
        self.streams.clear();
    }

    fn active_window(&self) -> SimWindow {
        if self.partial {
            self.window
        } else {
            Self::full_window(self.width, self.height)
        }
    }

    fn finish_stream(&mut self) {
        if let Some(command @ (DATA_START_TRANSMISSION_1 | DATA_START_TRANSMISSION_2)) =
            self.current
        {
            let window = self.active_window();
            self.streams.push(Stream {
                command,
                bytes: self.cursor,
                window_bytes: window.bytes_per_row() * window.rows(),
            });
        }
    }

    fn write_ram(&mut self, command: u8, byte: u8) {
        let window = self.active_window();
        let per_row = window.bytes_per_row();
        let row = self.cursor / per_row;
        let col = self.cursor % per_row;
        self.cursor += 1;
        if row >= window.rows() {
            self.overrun += 1;
            return;
        }
        let panel_row = usize::from(self.width).div_ceil(8);
        let index = (usize::from(window.y) + row) * panel_row + usize::from(window.x / 8) + col;
        let ram = if command == DATA_START_TRANSMISSION_1 {
            &mut self.black_ram
        } else {
            &mut self.color_ram
        };
        if let Some(slot) = ram.get_mut(index) {
            *slot = byte;
        }
    }
}

impl DisplayInterface for SimInterface {
    type Error = core::convert::Infallible;

    fn send_command(&mut self, command: u8) -> Result<(), Self::Error> {
        self.finish_stream();
        self.commands.push(command);
        self.current = Some(command);
        self.cursor = 0;
        match command {
            PARTIAL_IN => self.partial = true,
            PARTIAL_OUT => self.partial = false,
            POWER_ON | POWER_OFF | DISPLAY_REFRESH => self.pending_busy = self.busy_polls,
            _ => {}
        }
        Ok(())
    }

    fn send_data(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        let Some(command) = self.current else {
            return Ok(());
        };
        match command {
            DATA_START_TRANSMISSION_1 | DATA_START_TRANSMISSION_2 => {
                for &byte in data {
                    self.write_ram(command, byte);
                }
            }
            _ => {
                match self.command_data.last_mut() {
                    Some((c, params)) if *c == command && self.cursor > 0 => {
                        params.extend_from_slice(data);
                    }
                    _ => self.command_data.push((command, data.to_vec())),
                }
                self.cursor += data.len();
                if command == PARTIAL_WINDOW {
                    if let Some((_, p)) = self.command_data.last() {
                        if p.len() >= 6 {
                            self.window = SimWindow {
                                x: u16::from(p[0]),
                                x_end: u16::from(p[1]),
                                y: u16::from_be_bytes([p[2], p[3]]),
                                y_end: u16::from_be_bytes([p[4], p[5]]),
                            };
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn reset<D: DelayNs>(&mut self, _delay: &mut D, _duration_ms: u32) -> Result<(), Self::Error> {
        self.finish_stream();
        self.current = None;
        self.resets += 1;
        self.partial = false;
        Ok(())
    }

    fn is_busy(&mut self) -> Result<bool, Self::Error> {
        if self.stuck_busy {
            return Ok(true);
        }
        if self.pending_busy > 0 {
            self.pending_busy -= 1;
            return Ok(true);
        }
        Ok(false)
    }

    fn has_reset(&self) -> bool {
        self.reset_line
    }
}

/// Delay that only counts milliseconds
#[derive(Debug, Default)]
pub(crate) struct SimDelay {
    pub elapsed_ms: u64,
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.elapsed_ms += u64::from(ns / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.elapsed_ms += u64::from(ms);
    }
}
