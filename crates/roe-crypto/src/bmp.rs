//! Bitmap container header
//!
//! Every container starts with a 54-byte `BITMAPFILEHEADER` + `BITMAPINFOHEADER`
//! describing a square, uncompressed, 32 bits-per-pixel image. The pixel-data
//! region that follows holds the encrypted payload and random filler.
//!
//! Layout (little-endian):
//! ```text
//! [0..2]   "BM"            [26..28] planes (1)
//! [2..6]   file size       [28..30] bits per pixel (32)
//! [6..10]  reserved (0)    [30..34] compression (0)
//! [10..14] data offset(54) [34..38] pixel-data size
//! [14..18] info size (40)  [38..46] resolution (0, 0)
//! [18..22] width           [46..54] palette colors (0, 0)
//! [22..26] height
//! ```

use std::io::{Read, Write};

use roe_core::{RoeError, RoeResult};

use crate::io::read_exact_or_truncated;

pub const SIGNATURE: [u8; 2] = *b"BM";
pub const HEADER_SIZE: usize = 54;
pub const INFO_HEADER_SIZE: u32 = 40;
pub const BITS_PER_PIXEL: u16 = 32;
pub const BYTES_PER_PIXEL: u64 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    pub signature: [u8; 2],
    pub file_size: u32,
    pub reserved1: u16,
    pub reserved2: u16,
    pub data_offset: u32,
    pub info_size: u32,
    pub width: u32,
    pub height: u32,
    pub planes: u16,
    pub bits_per_pixel: u16,
    pub compression: u32,
    pub image_size: u32,
    pub x_resolution: u32,
    pub y_resolution: u32,
    pub palette_colors: u32,
    pub important_colors: u32,
}

impl ContainerHeader {
    /// Header of a `side` x `side` image, or `PayloadTooLarge` if its sizes overflow 32 bits.
    pub fn square(side: u64) -> RoeResult<Self> {
        let image_size = side
            .checked_mul(side)
            .and_then(|px| px.checked_mul(BYTES_PER_PIXEL))
            .filter(|size| *size <= u64::from(u32::MAX) - HEADER_SIZE as u64)
            .ok_or(RoeError::PayloadTooLarge(
                side.saturating_mul(side).saturating_mul(BYTES_PER_PIXEL),
            ))?;
        // image_size fits in u32, so side does too
        let side = side as u32;
        let image_size = image_size as u32;

        Ok(Self {
            signature: SIGNATURE,
            file_size: HEADER_SIZE as u32 + image_size,
            reserved1: 0,
            reserved2: 0,
            data_offset: HEADER_SIZE as u32,
            info_size: INFO_HEADER_SIZE,
            width: side,
            height: side,
            planes: 1,
            bits_per_pixel: BITS_PER_PIXEL,
            compression: 0,
            image_size,
            x_resolution: 0,
            y_resolution: 0,
            palette_colors: 0,
            important_colors: 0,
        })
    }

    /// Smallest square container whose pixel data holds `payload_size` bytes.
    pub fn for_payload(payload_size: u64) -> RoeResult<Self> {
        Self::square(side_for(payload_size)).map_err(|_| RoeError::PayloadTooLarge(payload_size))
    }

    pub fn pixel_data_size(&self) -> u64 {
        u64::from(self.image_size)
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..2].copy_from_slice(&self.signature);
        buf[2..6].copy_from_slice(&self.file_size.to_le_bytes());
        buf[6..8].copy_from_slice(&self.reserved1.to_le_bytes());
        buf[8..10].copy_from_slice(&self.reserved2.to_le_bytes());
        buf[10..14].copy_from_slice(&self.data_offset.to_le_bytes());
        buf[14..18].copy_from_slice(&self.info_size.to_le_bytes());
        buf[18..22].copy_from_slice(&self.width.to_le_bytes());
        buf[22..26].copy_from_slice(&self.height.to_le_bytes());
        buf[26..28].copy_from_slice(&self.planes.to_le_bytes());
        buf[28..30].copy_from_slice(&self.bits_per_pixel.to_le_bytes());
        buf[30..34].copy_from_slice(&self.compression.to_le_bytes());
        buf[34..38].copy_from_slice(&self.image_size.to_le_bytes());
        buf[38..42].copy_from_slice(&self.x_resolution.to_le_bytes());
        buf[42..46].copy_from_slice(&self.y_resolution.to_le_bytes());
        buf[46..50].copy_from_slice(&self.palette_colors.to_le_bytes());
        buf[50..54].copy_from_slice(&self.important_colors.to_le_bytes());
        buf
    }

    /// Field values are taken as-is; any 54-byte prefix parses.
    pub fn from_bytes(buf: &[u8; HEADER_SIZE]) -> Self {
        Self {
            signature: [buf[0], buf[1]],
            file_size: le32(&buf[2..6]),
            reserved1: le16(&buf[6..8]),
            reserved2: le16(&buf[8..10]),
            data_offset: le32(&buf[10..14]),
            info_size: le32(&buf[14..18]),
            width: le32(&buf[18..22]),
            height: le32(&buf[22..26]),
            planes: le16(&buf[26..28]),
            bits_per_pixel: le16(&buf[28..30]),
            compression: le32(&buf[30..34]),
            image_size: le32(&buf[34..38]),
            x_resolution: le32(&buf[38..42]),
            y_resolution: le32(&buf[42..46]),
            palette_colors: le32(&buf[46..50]),
            important_colors: le32(&buf[50..54]),
        }
    }

    pub fn write_to(&self, mut w: impl Write) -> RoeResult<()> {
        w.write_all(&self.to_bytes())?;
        Ok(())
    }

    /// Consume exactly [`HEADER_SIZE`] bytes from `r`.
    pub fn read_from(mut r: impl Read) -> RoeResult<Self> {
        let mut buf = [0u8; HEADER_SIZE];
        read_exact_or_truncated(&mut r, &mut buf, "bitmap header")?;
        Ok(Self::from_bytes(&buf))
    }
}

/// Side of the smallest square image with `ceil(payload/4)` pixels or more,
/// i.e. `ceil(sqrt(payload / 4))`.
pub fn side_for(payload_size: u64) -> u64 {
    let pixels = payload_size.div_ceil(BYTES_PER_PIXEL);
    let mut side = (pixels as f64).sqrt() as u64;
    // float sqrt can be off by one for large values
    while side.saturating_mul(side) < pixels {
        side += 1;
    }
    while side > 0 && (side - 1) * (side - 1) >= pixels {
        side -= 1;
    }
    side
}

/// Header for `payload_size` bytes together with its pixel-data size.
pub fn header_for(payload_size: u64) -> RoeResult<(ContainerHeader, u64)> {
    let header = ContainerHeader::for_payload(payload_size)?;
    let size = header.pixel_data_size();
    Ok((header, size))
}

#[inline]
fn le16(x: &[u8]) -> u16 {
    u16::from_le_bytes([x[0], x[1]])
}

#[inline]
fn le32(x: &[u8]) -> u32 {
    u32::from_le_bytes([x[0], x[1], x[2], x[3]])
}
