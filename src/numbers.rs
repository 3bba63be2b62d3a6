//! Numerically interesting values: integer boundaries and their
//! neighborhoods.
//!
//! ```
//! use malform::numbers;
//!
//! let values = numbers::bad_numbers(8, 1);
//! assert_eq!(values, [-1, 0, 1, -129, -128, -127, 126, 127, 128, 254, 255, 256]);
//! ```

use alloc::vec::Vec;

/// The widths [`bad_numbers`] has edge sets for.
pub const WIDTHS: [u32; 5] = [8, 16, 24, 32, 64];

const EDGES_8: &[i128] = &[0, -128, 127, 255];
const EDGES_16: &[i128] = &[-32768, 32767, 65535];
const EDGES_24: &[i128] = &[-8388608, 8388607, 16777215];
const EDGES_32: &[i128] = &[-2147483648, 2147483647, 4294967295];
const EDGES_64: &[i128] = &[i64::MIN as i128, i64::MAX as i128];

const POSITIVE_16: &[i128] = &[50, 127, 255, 32767, 65535];

const POSITIVE_U64: &[i128] = &[
    50,
    127,
    255,
    32767,
    65535,
    2147483647,
    4294967295,
    i64::MAX as i128,
];

/// The smallest width in [`WIDTHS`] that is at least `bits`, or 64.
pub fn snap_width(bits: u32) -> u32 {
    WIDTHS.iter().copied().find(|w| bits <= *w).unwrap_or(64)
}

/// Every value within `n` of a boundary of a `width`-bit integer, signed
/// or unsigned.
///
/// Widths other than those in [`WIDTHS`] are snapped up with
/// [`snap_width`]. Each width draws on these boundary sets:
///
/// | width | boundaries       |
/// |-------|------------------|
/// | 8     | 8                |
/// | 16    | 8, 16            |
/// | 24    | 8, 16, 24        |
/// | 32    | 8, 16, 32        |
/// | 64    | 8, 16, 32, 64    |
///
/// Values are grouped by boundary in ascending order and may repeat when
/// `n` makes neighborhoods overlap.
pub fn bad_numbers(width: u32, n: u32) -> Vec<i128> {
    let sets: &[&[i128]] = match snap_width(width) {
        8 => &[EDGES_8],
        16 => &[EDGES_8, EDGES_16],
        24 => &[EDGES_8, EDGES_16, EDGES_24],
        32 => &[EDGES_8, EDGES_16, EDGES_32],
        _ => &[EDGES_8, EDGES_16, EDGES_32, EDGES_64],
    };
    around(sets.iter().flat_map(|s| s.iter().copied()), n)
}

/// Every value within `n` of 50, 127, 255, 32767 or 65535. Used for counts.
pub fn bad_positive_numbers(n: u32) -> Vec<i128> {
    around(POSITIVE_16.iter().copied(), n)
}

/// Boundaries for unsigned 64-bit fields: every value within `n` of the
/// common positive boundaries, plus the `n + 1` values at the top of the
/// range. No value exceeds `u64::MAX`.
pub fn bad_u64(n: u32) -> Vec<i128> {
    let mut values = around(POSITIVE_U64.iter().copied(), n);
    let top = i128::from(u64::MAX);
    values.extend(top - i128::from(n)..=top);
    values
}

fn around(edges: impl Iterator<Item = i128>, n: u32) -> Vec<i128> {
    let n = i128::from(n);
    edges.flat_map(|e| e - n..=e + n).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths_snap_up() {
        assert_eq!(snap_width(1), 8);
        assert_eq!(snap_width(12), 16);
        assert_eq!(snap_width(17), 24);
        assert_eq!(snap_width(33), 64);
        assert_eq!(bad_numbers(12, 0), [0, -128, 127, 255, -32768, 32767, 65535]);
    }

    #[test]
    fn neighborhood_sizes() {
        assert_eq!(bad_numbers(8, 50).len(), 4 * 101);
        assert_eq!(bad_numbers(64, 50).len(), 12 * 101);
        assert_eq!(bad_positive_numbers(2).len(), 5 * 5);
        let u = bad_u64(3);
        assert_eq!(u.len(), 8 * 7 + 4);
        assert_eq!(u.last().copied(), Some(i128::from(u64::MAX)));
    }
}
