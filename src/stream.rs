//! Bit-addressable streams.
//!
//! Every rendered value is a [`Stream`]: either a contiguous [`BitStream`] or
//! a composed [`BitStreamList`] of windows over other streams. Composition is
//! how mutators splice, repeat and truncate large buffers without copying
//! them.
//!
//! Positions and lengths are in bits unless a method says otherwise. Bits
//! are MSB-first within each byte.
//!
//! # Example
//!
//! ```
//! use malform::stream::{SeekFrom, Stream};
//!
//! # fn foo() -> malform::Result<()> {
//! let mut s = Stream::new();
//! s.write_bits(0xabc, 12)?;
//! s.write_bits(0x5, 4)?;
//! assert_eq!(s.to_bytes(), [0xab, 0xc5]);
//!
//! s.seek(SeekFrom::Start(4))?;
//! assert_eq!(s.read_bits(8)?, 0xbc);
//! # Ok(())
//! # }
//! # foo().unwrap();
//! ```

use crate::error::StreamError;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;

mod bits;
mod list;

pub use bits::BitStream;
pub use list::BitStreamList;

/// Size of the blocks [`Stream::copy_to`] moves at a time.
pub const COPY_BLOCK_BYTES: usize = 4096;

/// Where to seek to, in the same shape as `std::io::SeekFrom`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeekFrom {
    /// An absolute position.
    Start(u64),
    /// An offset from the end.
    End(i64),
    /// An offset from the current position.
    Current(i64),
}

/// A seekable, growable stream of bits.
#[derive(Clone, Debug)]
pub enum Stream {
    /// A contiguous buffer.
    Bits(BitStream),
    /// A concatenation of windows over other streams.
    List(BitStreamList),
}

impl Default for Stream {
    fn default() -> Self {
        Stream::Bits(BitStream::new())
    }
}

impl From<BitStream> for Stream {
    fn from(s: BitStream) -> Self {
        Stream::Bits(s)
    }
}

impl From<BitStreamList> for Stream {
    fn from(s: BitStreamList) -> Self {
        Stream::List(s)
    }
}

impl From<Vec<u8>> for Stream {
    fn from(bytes: Vec<u8>) -> Self {
        Stream::Bits(BitStream::from_bytes(bytes))
    }
}

impl From<&[u8]> for Stream {
    fn from(bytes: &[u8]) -> Self {
        Stream::Bits(BitStream::from_bytes(bytes))
    }
}

impl From<&str> for Stream {
    fn from(s: &str) -> Self {
        Stream::from(s.as_bytes())
    }
}

impl PartialEq for Stream {
    fn eq(&self, other: &Self) -> bool {
        self.len_bits() == other.len_bits() && self.to_bytes() == other.to_bytes()
    }
}

impl Eq for Stream {}

impl Stream {
    /// Create a new, empty contiguous stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// The length of this stream in bits.
    #[inline]
    pub fn len_bits(&self) -> u64 {
        match self {
            Stream::Bits(s) => s.len_bits(),
            Stream::List(s) => s.len_bits(),
        }
    }

    /// The length of this stream in bytes, counting a trailing partial byte.
    #[inline]
    pub fn len_bytes(&self) -> u64 {
        self.len_bits().div_ceil(8)
    }

    /// Whether this stream holds no bits.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len_bits() == 0
    }

    /// The cursor position, in bits.
    #[inline]
    pub fn position(&self) -> u64 {
        match self {
            Stream::Bits(s) => s.pos,
            Stream::List(s) => s.pos,
        }
    }

    fn pos_mut(&mut self) -> &mut u64 {
        match self {
            Stream::Bits(s) => &mut s.pos,
            Stream::List(s) => &mut s.pos,
        }
    }

    /// Move the cursor, in bits. Seeking past the end is allowed; a later
    /// write fills the gap with zeros.
    pub fn seek(&mut self, from: SeekFrom) -> Result<u64, StreamError> {
        let (base, offset) = match from {
            SeekFrom::Start(pos) => {
                *self.pos_mut() = pos;
                return Ok(pos);
            }
            SeekFrom::End(offset) => (self.len_bits(), offset),
            SeekFrom::Current(offset) => (self.position(), offset),
        };
        let pos = base
            .checked_add_signed(offset)
            .ok_or(StreamError::SeekBeforeStart)?;
        *self.pos_mut() = pos;
        Ok(pos)
    }

    /// Move the cursor, in bytes. Returns the new position in bytes.
    pub fn seek_bytes(&mut self, from: SeekFrom) -> Result<u64, StreamError> {
        let from = match from {
            SeekFrom::Start(pos) => SeekFrom::Start(pos * 8),
            SeekFrom::End(offset) => SeekFrom::End(offset * 8),
            SeekFrom::Current(offset) => SeekFrom::Current(offset * 8),
        };
        Ok(self.seek(from)? / 8)
    }

    /// Read one bit at the cursor, or `None` at the end.
    pub fn read_bit(&mut self) -> Option<bool> {
        let pos = self.position();
        let bit = self.read_bit_at(pos)?;
        *self.pos_mut() = pos + 1;
        Some(bit)
    }

    /// Write one bit at the cursor.
    pub fn write_bit(&mut self, bit: bool) {
        let pos = self.position();
        match self {
            Stream::Bits(s) => s.write_bit_at(pos, bit),
            Stream::List(s) => s.write_bit_at(pos, bit),
        }
        *self.pos_mut() = pos + 1;
    }

    /// Read `n <= 64` bits at the cursor as a big-endian integer.
    pub fn read_bits(&mut self, n: u32) -> Result<u64, StreamError> {
        if n > 64 {
            return Err(StreamError::TooManyBits(n));
        }
        let pos = self.position();
        if pos.saturating_add(u64::from(n)) > self.len_bits() {
            return Err(StreamError::ReadPastEnd {
                position: pos,
                requested: n,
            });
        }
        let value = self.read_bits_at_unchecked(pos, n);
        *self.pos_mut() = pos + u64::from(n);
        Ok(value)
    }

    /// Write the low `n <= 64` bits of `value` at the cursor, most
    /// significant first.
    pub fn write_bits(&mut self, value: u64, n: u32) -> Result<(), StreamError> {
        if n > 64 {
            return Err(StreamError::TooManyBits(n));
        }
        let pos = self.position();
        match self {
            Stream::Bits(s) => s.write_bits_at(pos, value, n),
            Stream::List(s) => s.write_bits_at(pos, value, n),
        }
        *self.pos_mut() = pos + u64::from(n);
        Ok(())
    }

    /// Read one byte at the cursor, or `None` if fewer than 8 bits remain.
    pub fn read_byte(&mut self) -> Option<u8> {
        self.read_bits(8).ok().map(|b| b as u8)
    }

    /// Write one byte at the cursor.
    pub fn write_byte(&mut self, byte: u8) {
        self.write(&[byte]);
    }

    /// Read whole bytes at the cursor into `buf`, returning how many were
    /// read.
    pub fn read(&mut self, buf: &mut [u8]) -> usize {
        let pos = self.position();
        let avail = (self.len_bits().saturating_sub(pos) / 8) as usize;
        let n = avail.min(buf.len());
        self.fill_at(pos, &mut buf[..n]);
        *self.pos_mut() = pos + n as u64 * 8;
        n
    }

    /// Write `bytes` at the cursor.
    pub fn write(&mut self, bytes: &[u8]) {
        let pos = self.position();
        match self {
            Stream::Bits(s) => s.write_bytes_at(pos, bytes),
            Stream::List(s) => s.write_bytes_at(pos, bytes),
        }
        *self.pos_mut() = pos + bytes.len() as u64 * 8;
    }

    /// Read `n <= 64` bits at `pos` without moving the cursor. Bits past the
    /// end read as zero.
    pub fn read_bits_at(&self, pos: u64, n: u32) -> Result<u64, StreamError> {
        if n > 64 {
            return Err(StreamError::TooManyBits(n));
        }
        Ok(self.read_bits_at_unchecked(pos, n))
    }

    pub(crate) fn read_bits_at_unchecked(&self, pos: u64, n: u32) -> u64 {
        match self {
            Stream::Bits(s) => s.read_bits_at(pos, n),
            Stream::List(s) => s.read_bits_at(pos, n),
        }
    }

    pub(crate) fn read_bit_at(&self, pos: u64) -> Option<bool> {
        match self {
            Stream::Bits(s) => s.read_bit_at(pos),
            Stream::List(s) => s.read_bit_at(pos),
        }
    }

    pub(crate) fn fill_at(&self, pos: u64, buf: &mut [u8]) {
        match self {
            Stream::Bits(s) => s.fill_at(pos, buf),
            Stream::List(s) => s.fill_at(pos, buf),
        }
    }

    /// Write this whole stream into `dest` at its cursor.
    ///
    /// Moves [`COPY_BLOCK_BYTES`] at a time, so the peak extra memory is
    /// bounded regardless of this stream's size.
    pub fn copy_to(&self, dest: &mut Stream) {
        let mut block = [0u8; COPY_BLOCK_BYTES];
        let whole = self.len_bits() / 8;
        let mut done = 0u64;
        while done < whole {
            let n = (whole - done).min(COPY_BLOCK_BYTES as u64) as usize;
            self.fill_at(done * 8, &mut block[..n]);
            dest.write(&block[..n]);
            done += n as u64;
        }
        let rest = (self.len_bits() % 8) as u32;
        if rest != 0 {
            let bits = self.read_bits_at_unchecked(whole * 8, rest);
            let pos = dest.position();
            match dest {
                Stream::Bits(s) => s.write_bits_at(pos, bits, rest),
                Stream::List(s) => s.write_bits_at(pos, bits, rest),
            }
            *dest.pos_mut() = pos + u64::from(rest);
        }
    }

    /// Materialize this stream's bytes. A trailing partial byte is
    /// zero-padded.
    pub fn to_bytes(&self) -> Vec<u8> {
        if let Stream::Bits(s) = self {
            return s.as_bytes().to_vec();
        }
        let mut bytes = vec![0u8; self.len_bytes() as usize];
        self.fill_at(0, &mut bytes);
        bytes
    }

    /// A view of `len_bits` bits of `this` starting at `start_bits`.
    pub fn slice(this: &Arc<Stream>, start_bits: u64, len_bits: u64) -> Stream {
        let mut list = BitStreamList::new();
        list.push_window(this.clone(), start_bits, len_bits);
        Stream::List(list)
    }

    /// A view of `this` repeated cyclically until it is `len_bits` long.
    /// Repeating an empty stream yields an empty stream.
    pub fn repeat_to(this: &Arc<Stream>, len_bits: u64) -> Stream {
        let mut list = BitStreamList::new();
        let unit = this.len_bits();
        if unit == 0 {
            return Stream::List(list);
        }

        // Short units are first unrolled into one block of at most
        // `COPY_BLOCK_BYTES` so the segment count stays small.
        let block_bits = COPY_BLOCK_BYTES as u64 * 8;
        let (block, block_len) = if unit < block_bits && len_bits > unit {
            let copies = (block_bits / unit).min(len_bits / unit);
            let mut bits = BitStream::new();
            let mut pos = 0;
            for _ in 0..copies {
                let mut off = 0;
                while off < unit {
                    let n = (unit - off).min(64) as u32;
                    bits.write_bits_at(pos, this.read_bits_at_unchecked(off, n), n);
                    off += u64::from(n);
                    pos += u64::from(n);
                }
            }
            (Arc::new(Stream::Bits(bits)), copies * unit)
        } else {
            (this.clone(), unit)
        };

        for _ in 0..len_bits / block_len {
            list.push_window(block.clone(), 0, block_len);
        }
        list.push_window(block, 0, len_bits % block_len);
        Stream::List(list)
    }

    /// The concatenation of `parts`.
    pub fn concat(parts: impl IntoIterator<Item = Arc<Stream>>) -> Stream {
        let mut list = BitStreamList::new();
        for part in parts {
            list.push(part);
        }
        Stream::List(list)
    }
}
