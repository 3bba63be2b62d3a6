use super::{BitStream, Stream};
use alloc::sync::Arc;
use alloc::vec::Vec;

/// A window `[start, start + len)` (in bits) over a shared stream.
#[derive(Clone, Debug)]
struct Segment {
    stream: Arc<Stream>,
    start: u64,
    len: u64,
}

impl Segment {
    fn materialize(&self) -> BitStream {
        let mut bytes = alloc::vec![0u8; self.len.div_ceil(8) as usize];
        self.stream.fill_at(self.start, &mut bytes);
        BitStream::from_bits(bytes, self.len)
    }

    /// Whether this segment is a whole plain buffer, so writes can go
    /// straight into it after unsharing.
    fn is_whole_buffer(&self) -> bool {
        self.start == 0
            && matches!(&*self.stream, Stream::Bits(b) if b.len_bits() == self.len)
    }
}

/// A composed stream: an ordered list of windows over other streams,
/// presented as one logical stream.
///
/// Pushing a segment never copies its bytes. Writing into a segment unshares
/// only that segment.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use malform::stream::{BitStreamList, Stream};
///
/// let body = Arc::new(Stream::from(&b"world"[..]));
///
/// let mut list = BitStreamList::new();
/// list.push(Stream::from(&b"hello "[..]));
/// list.push_window(body.clone(), 0, 5 * 8);
///
/// assert_eq!(Stream::from(list).to_bytes(), b"hello world");
/// ```
#[derive(Clone, Debug, Default)]
pub struct BitStreamList {
    segments: Vec<Segment>,
    /// Cumulative end offset of each segment, in bits.
    ends: Vec<u64>,
    pub(super) pos: u64,
}

impl BitStreamList {
    /// Create a new, empty composed stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the whole of `stream` as a segment.
    pub fn push(&mut self, stream: impl Into<Arc<Stream>>) {
        let stream = stream.into();
        let len = stream.len_bits();
        self.push_window(stream, 0, len);
    }

    /// Append the window `[start_bits, start_bits + len_bits)` of `stream`.
    ///
    /// The window is clamped to the stream's length. Empty windows are
    /// skipped.
    pub fn push_window(&mut self, stream: Arc<Stream>, start_bits: u64, len_bits: u64) {
        let start = start_bits.min(stream.len_bits());
        let len = len_bits.min(stream.len_bits() - start);
        if len == 0 {
            return;
        }
        let end = self.len_bits() + len;
        self.segments.push(Segment { stream, start, len });
        self.ends.push(end);
    }

    /// The number of segments.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// The length of this stream in bits.
    #[inline]
    pub fn len_bits(&self) -> u64 {
        self.ends.last().copied().unwrap_or(0)
    }

    fn segment_start(&self, idx: usize) -> u64 {
        if idx == 0 {
            0
        } else {
            self.ends[idx - 1]
        }
    }

    /// The segment containing bit `pos` and the offset into that segment.
    fn locate(&self, pos: u64) -> Option<(usize, u64)> {
        if pos >= self.len_bits() {
            return None;
        }
        let idx = self.ends.partition_point(|&end| end <= pos);
        Some((idx, pos - self.segment_start(idx)))
    }

    pub(crate) fn read_bit_at(&self, pos: u64) -> Option<bool> {
        let (idx, off) = self.locate(pos)?;
        let seg = &self.segments[idx];
        seg.stream.read_bit_at(seg.start + off)
    }

    /// Bits past the end read as zero. `n` must be at most 64.
    pub(crate) fn read_bits_at(&self, mut pos: u64, n: u32) -> u64 {
        let mut value = 0u64;
        let mut left = n;
        while left > 0 {
            let Some((idx, off)) = self.locate(pos) else {
                return value.checked_shl(left).unwrap_or(0);
            };
            let seg = &self.segments[idx];
            let take = u64::from(left).min(seg.len - off) as u32;
            let bits = seg.stream.read_bits_at_unchecked(seg.start + off, take);
            value = if take == 64 { bits } else { (value << take) | bits };
            left -= take;
            pos += u64::from(take);
        }
        value
    }

    pub(crate) fn fill_at(&self, mut pos: u64, buf: &mut [u8]) {
        let mut filled = 0;
        while filled < buf.len() {
            let Some((idx, off)) = self.locate(pos) else {
                buf[filled..].fill(0);
                return;
            };
            let seg = &self.segments[idx];
            let whole = ((seg.len - off) / 8) as usize;
            if whole > 0 {
                let n = whole.min(buf.len() - filled);
                seg.stream
                    .fill_at(seg.start + off, &mut buf[filled..filled + n]);
                filled += n;
                pos += n as u64 * 8;
            } else {
                // The byte straddles a segment boundary.
                buf[filled] = self.read_bits_at(pos, 8) as u8;
                filled += 1;
                pos += 8;
            }
        }
    }

    /// Unshare segment `idx` and return its buffer for writing.
    fn own_segment(&mut self, idx: usize) -> &mut BitStream {
        let seg = &mut self.segments[idx];
        if !seg.is_whole_buffer() {
            let owned = seg.materialize();
            *seg = Segment {
                stream: Arc::new(Stream::Bits(owned)),
                start: 0,
                len: seg.len,
            };
        }
        match Arc::make_mut(&mut seg.stream) {
            Stream::Bits(bits) => bits,
            Stream::List(_) => unreachable!(),
        }
    }

    pub(crate) fn write_bit_at(&mut self, pos: u64, bit: bool) {
        match self.locate(pos) {
            Some((idx, off)) => self.own_segment(idx).write_bit_at(off, bit),
            None => {
                let len = self.len_bits();
                let tail = self.tail_buffer();
                let base = tail.len_bits();
                tail.write_bit_at(base + (pos - len), bit);
                self.resync_tail();
            }
        }
    }

    pub(crate) fn write_bits_at(&mut self, pos: u64, value: u64, n: u32) {
        for i in 0..n {
            self.write_bit_at(pos + u64::from(i), (value >> (n - 1 - i)) & 1 == 1);
        }
    }

    pub(crate) fn write_bytes_at(&mut self, pos: u64, bytes: &[u8]) {
        for (i, b) in bytes.iter().enumerate() {
            self.write_bits_at(pos + i as u64 * 8, u64::from(*b), 8);
        }
    }

    /// The buffer that writes past the end land in: the last segment when it
    /// is already an unshared whole buffer, otherwise a fresh segment.
    fn tail_buffer(&mut self) -> &mut BitStream {
        let reuse = self
            .segments
            .last_mut()
            .is_some_and(|seg| seg.is_whole_buffer() && Arc::get_mut(&mut seg.stream).is_some());
        if !reuse {
            let end = self.len_bits();
            self.segments.push(Segment {
                stream: Arc::new(Stream::Bits(BitStream::new())),
                start: 0,
                len: 0,
            });
            self.ends.push(end);
        }
        let idx = self.segments.len() - 1;
        self.own_segment(idx)
    }

    fn resync_tail(&mut self) {
        let idx = self.segments.len() - 1;
        let start = self.segment_start(idx);
        let seg = &mut self.segments[idx];
        seg.len = seg.stream.len_bits();
        self.ends[idx] = start + seg.len;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shared(bytes: &[u8]) -> Arc<Stream> {
        Arc::new(Stream::from(bytes))
    }

    #[test]
    fn windows_read_through() {
        let base = shared(&[0x12, 0x34, 0x56]);
        let mut list = BitStreamList::new();
        list.push_window(base.clone(), 8, 16);
        list.push_window(base, 0, 4);
        assert_eq!(list.len_bits(), 20);
        assert_eq!(list.read_bits_at(0, 20), 0x3456_1);
    }

    #[test]
    fn write_unshares_only_touched_segment() {
        let a = shared(&[0xaa]);
        let b = shared(&[0xbb]);
        let mut list = BitStreamList::new();
        list.push(a.clone());
        list.push(b.clone());
        list.write_bytes_at(8, &[0x00]);

        assert_eq!(a.to_bytes(), [0xaa]);
        assert_eq!(b.to_bytes(), [0xbb]);
        assert!(Arc::ptr_eq(&list.segments[0].stream, &a));
        assert_eq!(Stream::from(list).to_bytes(), [0xaa, 0x00]);
    }

    #[test]
    fn write_past_end_appends() {
        let mut list = BitStreamList::new();
        list.push(shared(&[0x01]));
        list.write_bytes_at(16, &[0xff]);
        assert_eq!(list.len_bits(), 24);
        assert_eq!(Stream::from(list).to_bytes(), [0x01, 0x00, 0xff]);
    }
}
