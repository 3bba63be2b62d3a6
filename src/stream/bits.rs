use alloc::vec;
use alloc::vec::Vec;

/// A contiguous, growable, bit-addressable buffer.
///
/// Bits are numbered MSB-first within each byte. The backing bytes past
/// `len_bits` are always zero.
#[derive(Clone, Debug, Default)]
pub struct BitStream {
    data: Vec<u8>,
    len: u64,
    pub(super) pos: u64,
}

impl BitStream {
    /// Create a new, empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a stream over the given bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let data = bytes.into();
        let len = data.len() as u64 * 8;
        Self { data, len, pos: 0 }
    }

    /// Create a stream of exactly `len_bits` bits from the given bytes.
    ///
    /// Missing bytes are zero. Excess bytes and the bits past `len_bits` in
    /// the final byte are discarded.
    pub fn from_bits(bytes: impl Into<Vec<u8>>, len_bits: u64) -> Self {
        let mut data = bytes.into();
        data.resize(len_bits.div_ceil(8) as usize, 0);
        let tail = (len_bits % 8) as u32;
        if tail != 0 {
            if let Some(last) = data.last_mut() {
                *last &= 0xffu8 << (8 - tail);
            }
        }
        Self {
            data,
            len: len_bits,
            pos: 0,
        }
    }

    /// Create a stream of `len` copies of `byte`.
    pub fn filled(byte: u8, len: usize) -> Self {
        Self::from_bytes(vec![byte; len])
    }

    /// The length of this stream in bits.
    #[inline]
    pub fn len_bits(&self) -> u64 {
        self.len
    }

    /// The backing bytes, with any trailing partial byte zero-padded.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub(crate) fn read_bit_at(&self, pos: u64) -> Option<bool> {
        if pos >= self.len {
            return None;
        }
        let byte = self.data[(pos / 8) as usize];
        Some((byte >> (7 - pos % 8)) & 1 == 1)
    }

    /// Bits past the end read as zero. `n` must be at most 64.
    pub(crate) fn read_bits_at(&self, pos: u64, n: u32) -> u64 {
        debug_assert!(n <= 64);
        if pos % 8 == 0 && n % 8 == 0 && pos + u64::from(n) <= self.len {
            let start = (pos / 8) as usize;
            return self.data[start..start + (n / 8) as usize]
                .iter()
                .fold(0u64, |acc, b| (acc << 8) | u64::from(*b));
        }
        (0..u64::from(n)).fold(0u64, |acc, i| {
            (acc << 1) | u64::from(self.read_bit_at(pos + i).unwrap_or(false))
        })
    }

    /// Fill `buf` with the bytes starting at bit `pos`. Bits past the end
    /// read as zero.
    pub(crate) fn fill_at(&self, pos: u64, buf: &mut [u8]) {
        if pos % 8 == 0 {
            let start = ((pos / 8) as usize).min(self.data.len());
            let avail = (self.data.len() - start).min(buf.len());
            buf[..avail].copy_from_slice(&self.data[start..start + avail]);
            buf[avail..].fill(0);
            return;
        }
        for (i, b) in buf.iter_mut().enumerate() {
            *b = self.read_bits_at(pos + i as u64 * 8, 8) as u8;
        }
    }

    fn ensure_len(&mut self, len: u64) {
        if len > self.len {
            self.len = len;
            self.data.resize(len.div_ceil(8) as usize, 0);
        }
    }

    pub(crate) fn write_bit_at(&mut self, pos: u64, bit: bool) {
        self.ensure_len(pos + 1);
        let byte = &mut self.data[(pos / 8) as usize];
        let mask = 1u8 << (7 - pos % 8);
        if bit {
            *byte |= mask;
        } else {
            *byte &= !mask;
        }
    }

    /// Write the low `n` bits of `value`, most significant first.
    pub(crate) fn write_bits_at(&mut self, pos: u64, value: u64, n: u32) {
        debug_assert!(n <= 64);
        for i in 0..n {
            let bit = (value >> (n - 1 - i)) & 1 == 1;
            self.write_bit_at(pos + u64::from(i), bit);
        }
    }

    pub(crate) fn write_bytes_at(&mut self, pos: u64, bytes: &[u8]) {
        if pos % 8 == 0 {
            self.ensure_len(pos + bytes.len() as u64 * 8);
            let start = (pos / 8) as usize;
            self.data[start..start + bytes.len()].copy_from_slice(bytes);
            return;
        }
        for (i, b) in bytes.iter().enumerate() {
            self.write_bits_at(pos + i as u64 * 8, u64::from(*b), 8);
        }
    }

    /// Shorten the stream to `len_bits`. Does nothing if it is already
    /// shorter.
    pub fn truncate(&mut self, len_bits: u64) {
        if len_bits >= self.len {
            return;
        }
        *self = Self {
            pos: self.pos.min(len_bits),
            ..Self::from_bits(core::mem::take(&mut self.data), len_bits)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn msb_first_bits() {
        let s = BitStream::from_bytes([0b1010_0000]);
        assert_eq!(s.read_bit_at(0), Some(true));
        assert_eq!(s.read_bit_at(1), Some(false));
        assert_eq!(s.read_bit_at(2), Some(true));
        assert_eq!(s.read_bits_at(0, 3), 0b101);
        assert_eq!(s.read_bit_at(8), None);
    }

    #[test]
    fn unaligned_write_spans_bytes() {
        let mut s = BitStream::new();
        s.write_bits_at(4, 0xabc, 12);
        assert_eq!(s.len_bits(), 16);
        assert_eq!(s.as_bytes(), &[0x0a, 0xbc]);
    }

    #[test]
    fn from_bits_masks_tail() {
        let s = BitStream::from_bits([0xff, 0xff], 12);
        assert_eq!(s.as_bytes(), &[0xff, 0xf0]);
        assert_eq!(s.len_bits(), 12);
    }

    #[test]
    fn truncate_keeps_prefix() {
        let mut s = BitStream::from_bytes([0x12, 0x34, 0x56]);
        s.truncate(12);
        assert_eq!(s.as_bytes(), &[0x12, 0x30]);
    }
}
