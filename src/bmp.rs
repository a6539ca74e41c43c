//! Uncompressed BMP decoding into plane buffers
//!
//! Three loaders place a bitmap at `(x, y)` in a caller-owned buffer,
//! clipping anything that falls outside it:
//!
//! - [`read_bmp_mono`]: 1 bpp, bytes copied into a controller-layout plane
//!   through a [`WriteMode`]
//! - [`read_bmp_4gray`]: 4 bpp, two pixels per byte
//! - [`read_bmp_rgb_7color`]: 24 bpp, each pixel matched to a [`SevenColor`]
//!
//! Rows are stored bottom-up (top-down when the header height is negative)
//! and padded to four bytes. Headers, bit depth, compression and lengths are
//! all checked before the destination is touched, so a failed read leaves it
//! unchanged.
//!
//! ## Example
//!
//! ```
//! use epd_panel::bmp::{BmpHeader, read_bmp_mono};
//! use epd_panel::WriteMode;
//!
//! # fn bmp() -> Vec<u8> {
//! #     let mut data = vec![0u8; 62];
//! #     data[0..2].copy_from_slice(b"BM");
//! #     data[10..14].copy_from_slice(&62u32.to_le_bytes());
//! #     data[14..18].copy_from_slice(&40u32.to_le_bytes());
//! #     data[18..22].copy_from_slice(&8i32.to_le_bytes());
//! #     data[22..26].copy_from_slice(&1i32.to_le_bytes());
//! #     data[26..28].copy_from_slice(&1u16.to_le_bytes());
//! #     data[28..30].copy_from_slice(&1u16.to_le_bytes());
//! #     data.extend_from_slice(&[0x0F, 0, 0, 0]);
//! #     data
//! # }
//! let data = bmp();
//! let header = BmpHeader::parse(&data).unwrap();
//! assert_eq!((header.width, header.height), (8, 1));
//!
//! let mut plane = [0xFFu8; 2];
//! read_bmp_mono(&data, &mut plane, 16, 1, 8, 0, WriteMode::Overwrite, false).unwrap();
//! assert_eq!(plane, [0xFF, 0x0F]);
//! ```

use log::debug;

use crate::color::SevenColor;
use crate::error::BmpError;
use crate::framebuffer::WriteMode;

const FILE_HEADER_LEN: usize = 14;
const INFO_HEADER_LEN: usize = 40;
const SIGNATURE: [u8; 2] = *b"BM";

fn le_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

fn le_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

fn le_i32(data: &[u8], offset: usize) -> i32 {
    le_u32(data, offset) as i32
}

/// File and info header fields the loaders need
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BmpHeader {
    /// Offset of the pixel data from the start of the file
    pub data_offset: usize,
    /// Image width in pixels
    pub width: usize,
    /// Image height in pixels
    pub height: usize,
    /// Rows are stored top row first
    pub top_down: bool,
    /// Bits per pixel
    pub bits_per_pixel: u16,
    /// Compression method; only 0 (none) is decoded
    pub compression: u32,
}

impl BmpHeader {
    /// Parse the 14-byte file header and the 40-byte info header
    ///
    /// # Errors
    ///
    /// `Truncated` when fewer than 54 bytes are present, `InvalidSignature`
    /// without the `BM` tag, `InvalidHeader` for a short info header, zero
    /// size or a pixel offset inside the headers.
    pub fn parse(data: &[u8]) -> Result<Self, BmpError> {
        let headers = FILE_HEADER_LEN + INFO_HEADER_LEN;
        if data.len() < headers {
            return Err(BmpError::Truncated {
                expected: headers,
                available: data.len(),
            });
        }
        if data[0..2] != SIGNATURE {
            return Err(BmpError::InvalidSignature);
        }

        let data_offset = le_u32(data, 10) as usize;
        let info_size = le_u32(data, 14) as usize;
        let width = le_i32(data, 18);
        let height = le_i32(data, 22);
        let bits_per_pixel = le_u16(data, 28);
        let compression = le_u32(data, 30);

        if info_size < INFO_HEADER_LEN || data_offset < FILE_HEADER_LEN + info_size {
            return Err(BmpError::InvalidHeader);
        }
        if width <= 0 || height == 0 {
            return Err(BmpError::InvalidHeader);
        }

        Ok(Self {
            data_offset,
            width: width.unsigned_abs() as usize,
            height: height.unsigned_abs() as usize,
            top_down: height < 0,
            bits_per_pixel,
            compression,
        })
    }

    /// Stored bytes per row, including padding to 4 bytes
    ///
    /// `None` when the row size does not fit in `usize`.
    pub fn row_stride(&self) -> Option<usize> {
        self.row_bits()?.div_ceil(32).checked_mul(4)
    }

    /// Meaningful bytes per row, without padding
    pub fn row_bytes(&self) -> Option<usize> {
        Some(self.row_bits()?.div_ceil(8))
    }

    /// Total file length the headers describe
    pub fn required_len(&self) -> Option<usize> {
        self.row_stride()?
            .checked_mul(self.height)?
            .checked_add(self.data_offset)
    }

    fn row_bits(&self) -> Option<usize> {
        self.width.checked_mul(usize::from(self.bits_per_pixel))
    }

    /// Image row (0 = top as displayed) held by storage row `stored`
    fn image_row(&self, stored: usize, mirror_y: bool) -> usize {
        let row = if self.top_down {
            stored
        } else {
            self.height - 1 - stored
        };
        if mirror_y { self.height - 1 - row } else { row }
    }

    /// Pixel data rows paired with the image row they display on
    fn rows(
        self,
        data: &[u8],
        mirror_y: bool,
    ) -> Result<impl Iterator<Item = (usize, &[u8])>, BmpError> {
        let (Some(stride), Some(row_bytes), Some(end)) =
            (self.row_stride(), self.row_bytes(), self.required_len())
        else {
            return Err(BmpError::InvalidHeader);
        };
        let pixels = data
            .get(self.data_offset..end)
            .ok_or(BmpError::Truncated {
                expected: end,
                available: data.len(),
            })?;
        Ok(pixels
            .chunks_exact(stride)
            .enumerate()
            .map(move |(stored, row)| (self.image_row(stored, mirror_y), &row[..row_bytes])))
    }
}

/// Parse and check everything a loader needs before writing
fn validate(
    data: &[u8],
    bits_per_pixel: u16,
    buffer_len: usize,
    buffer_required: usize,
) -> Result<BmpHeader, BmpError> {
    let header = BmpHeader::parse(data)?;
    debug!(
        "bmp {}x{}, {} bpp, compression {}",
        header.width, header.height, header.bits_per_pixel, header.compression
    );
    if header.compression != 0 {
        return Err(BmpError::UnsupportedCompression(header.compression));
    }
    if header.bits_per_pixel != bits_per_pixel {
        return Err(BmpError::UnsupportedBitDepth(header.bits_per_pixel));
    }
    let expected = header.required_len().ok_or(BmpError::InvalidHeader)?;
    if data.len() < expected {
        return Err(BmpError::Truncated {
            expected,
            available: data.len(),
        });
    }
    if buffer_len < buffer_required {
        return Err(BmpError::BufferTooSmall {
            required: buffer_required,
            provided: buffer_len,
        });
    }
    Ok(header)
}

/// Destination index of `offset` units past `origin`, if inside `0..limit`
fn place(origin: i32, offset: usize, limit: usize) -> Option<usize> {
    let pos = i64::from(origin) + i64::try_from(offset).ok()?;
    let pos = usize::try_from(pos).ok()?;
    (pos < limit).then_some(pos)
}

/// Decode a 1-bpp bitmap into a packed plane
///
/// `buffer` is `ceil(buf_width / 8)` bytes per row, MSB leftmost. `x` is
/// rounded down to a byte column; whole source bytes are combined with the
/// destination through `mode`. With `mirror_y` the image is flipped
/// vertically.
///
/// # Errors
///
/// Any [`BmpError`]; the buffer is unchanged on error.
pub fn read_bmp_mono(
    data: &[u8],
    buffer: &mut [u8],
    buf_width: u16,
    buf_height: u16,
    x: i32,
    y: i32,
    mode: WriteMode,
    mirror_y: bool,
) -> Result<(), BmpError> {
    let stride = usize::from(buf_width).div_ceil(8);
    let rows = usize::from(buf_height);
    let header = validate(data, 1, buffer.len(), stride * rows)?;

    let x_byte = (x & !7) / 8;
    for (image_row, src) in header.rows(data, mirror_y)? {
        let Some(dest_row) = place(y, image_row, rows) else {
            continue;
        };
        for (col, &byte) in src.iter().enumerate() {
            let Some(dest_col) = place(x_byte, col, stride) else {
                continue;
            };
            let slot = &mut buffer[dest_row * stride + dest_col];
            *slot = mode.combine_byte(*slot, byte);
        }
    }
    Ok(())
}

/// Decode a 4-bpp bitmap into a nibble-packed buffer
///
/// `buffer` is `ceil(buf_width / 2)` bytes per row, high nibble leftmost.
/// `x` is rounded down to an even column. With `invert` every byte is
/// complemented.
///
/// # Errors
///
/// Any [`BmpError`]; the buffer is unchanged on error.
pub fn read_bmp_4gray(
    data: &[u8],
    buffer: &mut [u8],
    buf_width: u16,
    buf_height: u16,
    x: i32,
    y: i32,
    invert: bool,
    mirror_y: bool,
) -> Result<(), BmpError> {
    let stride = usize::from(buf_width).div_ceil(2);
    let rows = usize::from(buf_height);
    let header = validate(data, 4, buffer.len(), stride * rows)?;

    let x_byte = (x & !1) / 2;
    let mask = if invert { 0xFF } else { 0x00 };
    for (image_row, src) in header.rows(data, mirror_y)? {
        let Some(dest_row) = place(y, image_row, rows) else {
            continue;
        };
        for (col, &byte) in src.iter().enumerate() {
            if let Some(dest_col) = place(x_byte, col, stride) {
                buffer[dest_row * stride + dest_col] = byte ^ mask;
            }
        }
    }
    Ok(())
}

/// Decode a 24-bpp bitmap into one [`SevenColor`] per pixel
///
/// `buffer` is `buf_width * buf_height` entries, row-major. Colors that are
/// not exact palette entries become [`SevenColor::White`].
///
/// # Errors
///
/// Any [`BmpError`]; the buffer is unchanged on error.
pub fn read_bmp_rgb_7color(
    data: &[u8],
    buffer: &mut [SevenColor],
    buf_width: u16,
    buf_height: u16,
    x: i32,
    y: i32,
    mirror_y: bool,
) -> Result<(), BmpError> {
    let stride = usize::from(buf_width);
    let rows = usize::from(buf_height);
    let header = validate(data, 24, buffer.len(), stride * rows)?;

    for (image_row, src) in header.rows(data, mirror_y)? {
        let Some(dest_row) = place(y, image_row, rows) else {
            continue;
        };
        for (col, bgr) in src.chunks_exact(3).enumerate() {
            if let Some(dest_col) = place(x, col, stride) {
                buffer[dest_row * stride + dest_col] =
                    SevenColor::from_bgr([bgr[0], bgr[1], bgr[2]]);
            }
        }
    }
    Ok(())
}

/// [`read_bmp_mono`] from a file
///
/// # Errors
///
/// `BmpError::Io` when the file cannot be read, otherwise as [`read_bmp_mono`].
#[cfg(feature = "std")]
pub fn read_bmp_mono_file<P: AsRef<std::path::Path>>(
    path: P,
    buffer: &mut [u8],
    buf_width: u16,
    buf_height: u16,
    x: i32,
    y: i32,
    mode: WriteMode,
    mirror_y: bool,
) -> Result<(), BmpError> {
    let data = std::fs::read(path)?;
    read_bmp_mono(&data, buffer, buf_width, buf_height, x, y, mode, mirror_y)
}

/// [`read_bmp_4gray`] from a file
///
/// # Errors
///
/// `BmpError::Io` when the file cannot be read, otherwise as [`read_bmp_4gray`].
#[cfg(feature = "std")]
pub fn read_bmp_4gray_file<P: AsRef<std::path::Path>>(
    path: P,
    buffer: &mut [u8],
    buf_width: u16,
    buf_height: u16,
    x: i32,
    y: i32,
    invert: bool,
    mirror_y: bool,
) -> Result<(), BmpError> {
    let data = std::fs::read(path)?;
    read_bmp_4gray(&data, buffer, buf_width, buf_height, x, y, invert, mirror_y)
}

/// [`read_bmp_rgb_7color`] from a file
///
/// # Errors
///
/// `BmpError::Io` when the file cannot be read, otherwise as
/// [`read_bmp_rgb_7color`].
#[cfg(feature = "std")]
pub fn read_bmp_rgb_7color_file<P: AsRef<std::path::Path>>(
    path: P,
    buffer: &mut [SevenColor],
    buf_width: u16,
    buf_height: u16,
    x: i32,
    y: i32,
    mirror_y: bool,
) -> Result<(), BmpError> {
    let data = std::fs::read(path)?;
    read_bmp_rgb_7color(&data, buffer, buf_width, buf_height, x, y, mirror_y)
}
