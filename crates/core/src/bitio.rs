//! Bit-level I/O for fixed-width code streams.
//!
//! `BitWriter` packs codes MSB-first and pads the last byte with zeros;
//! `BitReader` reads fixed-width fields back out of a packed buffer.
//!
//! # Padding Rules
//! - BitWriter: pads the final partial byte with trailing zeros and reports
//!   how many pad bits it added (0-7)
//! - BitReader: cannot tell padding from data, the caller must know the
//!   number of meaningful bits
//!
//! # Example
//! ```
//! use bitpack_bench_core::bitio::{BitReader, BitWriter};
//!
//! let mut writer = BitWriter::new();
//! writer.write_bits(0b10, 2).unwrap();
//! writer.write_bits(0b01, 2).unwrap();
//! let packed = writer.finish();
//! assert_eq!(packed.bytes, vec![0b1001_0000]);
//! assert_eq!(packed.padding_bits, 4);
//!
//! let mut reader = BitReader::new(&packed.bytes);
//! assert_eq!(reader.read_bits(2).unwrap(), 0b10);
//! assert_eq!(reader.read_bits(2).unwrap(), 0b01);
//! ```

use crate::error::{BitIoError, Result};

/// Byte-aligned output of a `BitWriter`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedBits {
    /// Packed bytes, MSB-first
    pub bytes: Vec<u8>,
    /// Zero bits appended to reach a byte boundary (0-7)
    pub padding_bits: u8,
}

impl PackedBits {
    /// Number of meaningful bits (total minus padding).
    pub fn data_bits(&self) -> usize {
        self.bytes.len() * 8 - self.padding_bits as usize
    }
}

/// Writes bits MSB-first into a byte buffer.
///
/// # Invariants
/// - `bit_count` is always < 8
#[derive(Debug, Clone, Default)]
pub struct BitWriter {
    /// Completed bytes
    bytes: Vec<u8>,
    /// Accumulator for the current partial byte (MSB-aligned)
    bit_buffer: u8,
    /// Number of bits in bit_buffer (0-7)
    bit_count: u8,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writer with room for `bits` bits before reallocating.
    pub fn with_capacity_bits(bits: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bits.div_ceil(8)),
            ..Self::default()
        }
    }

    /// Write the lowest `count` bits of `value`, most significant first.
    ///
    /// # Errors
    /// Returns `BitIoError::InvalidBitCount` if count > 64.
    pub fn write_bits(&mut self, value: u64, count: usize) -> Result<()> {
        if count > 64 {
            return Err(BitIoError::InvalidBitCount(count).into());
        }

        let mut remaining = count;
        while remaining > 0 {
            let free = 8 - self.bit_count as usize;
            let take = remaining.min(free);
            let shift = remaining - take;
            let bits = ((value >> shift) & ((1u64 << take) - 1)) as u8;

            self.bit_buffer |= bits << (free - take);
            self.bit_count += take as u8;

            if self.bit_count == 8 {
                self.bytes.push(self.bit_buffer);
                self.bit_buffer = 0;
                self.bit_count = 0;
            }

            remaining = shift;
        }

        Ok(())
    }

    /// Flush the partial byte (zero padded) and return the packed output.
    pub fn finish(mut self) -> PackedBits {
        let padding_bits = if self.bit_count > 0 {
            self.bytes.push(self.bit_buffer);
            8 - self.bit_count
        } else {
            0
        };
        PackedBits {
            bytes: self.bytes,
            padding_bits,
        }
    }

    /// Total number of bits written so far (including the partial byte).
    pub fn bit_len(&self) -> usize {
        self.bytes.len() * 8 + self.bit_count as usize
    }
}

/// Reads fixed-width fields MSB-first from a byte buffer.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    /// Current bit position (0 = MSB of first byte)
    bit_position: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            bit_position: 0,
        }
    }

    /// Read `count` bits (0-64) as an unsigned value.
    ///
    /// # Errors
    /// - `BitIoError::InvalidBitCount` if count > 64
    /// - `BitIoError::InsufficientBits` if not enough bits remain
    pub fn read_bits(&mut self, count: usize) -> Result<u64> {
        if count > 64 {
            return Err(BitIoError::InvalidBitCount(count).into());
        }
        let available = self.bits_remaining();
        if count > available {
            return Err(BitIoError::InsufficientBits {
                requested: count,
                available,
            }
            .into());
        }

        let mut result = 0u64;
        let mut remaining = count;
        while remaining > 0 {
            let offset = self.bit_position % 8;
            let in_byte = 8 - offset;
            let take = remaining.min(in_byte);
            let byte = self.data[self.bit_position / 8];
            let mask = ((1u16 << take) - 1) as u8;
            let bits = (byte >> (in_byte - take)) & mask;

            result = (result << take) | bits as u64;
            self.bit_position += take;
            remaining -= take;
        }

        Ok(result)
    }

    pub fn bits_remaining(&self) -> usize {
        self.data.len() * 8 - self.bit_position
    }
}
