//! A thin-but-stable wrapper over `rand::rngs::SmallRng` that provides a few
//! more conveniences for our use-cases.

use core::ops::RangeInclusive;
use rand::{rngs::SmallRng, seq::SliceRandom, Rng as _, SeedableRng};

const DEFAULT_SEED: u64 = 0x12345678_12345678;

/// A pseudorandom number generator.
///
/// Not cryptographically secure.
///
/// Every random draw in this crate goes through an explicitly passed `Rng`.
/// There is no process-wide generator: seeding the [`Session`][crate::Session]
/// (or the `Rng` handed to
/// [`Mutation::random_mutation`][crate::Mutation::random_mutation]) replays a
/// campaign exactly.
///
/// # Example
///
/// ```
/// use malform::Rng;
///
/// let mut a = Rng::new(42);
/// let mut b = Rng::new(42);
/// assert_eq!(a.gen_u64(), b.gen_u64());
/// ```
#[derive(Clone, Debug)]
pub struct Rng {
    inner: SmallRng,
}

impl Default for Rng {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

macro_rules! gen_methods {
    ( $( $name:ident -> $ty:ty ; )* ) => {
        $(
            /// Generate a random
            #[doc = concat!("`", stringify!($ty), "`")]
            /// value.
            pub fn $name(&mut self) -> $ty {
                self.inner.gen()
            }
        )*
    };
}

impl Rng {
    /// Create a new generator from the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            inner: SmallRng::seed_from_u64(seed),
        }
    }

    /// The generator used while applying sequential candidate `cursor`.
    ///
    /// Sequential mode never touches the session's generator, so a saved
    /// cursor reproduces the same bytes on any run.
    pub(crate) fn for_candidate(cursor: u32) -> Self {
        Self::new(u64::from(cursor))
    }

    pub(crate) fn inner(&mut self) -> &mut SmallRng {
        &mut self.inner
    }

    /// Generate a random `usize` in the range `0..len`.
    ///
    /// If `len` is `0`, then `None` is returned.
    #[inline]
    pub fn gen_index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }

        // https://lemire.me/blog/2016/06/30/fast-random-shuffling/
        let random32bit = u64::from(self.gen_u32());
        let multiresult = random32bit.wrapping_mul(len as u64);
        Some((multiresult >> 32) as usize)
    }

    /// Generate a random `usize` in the given inclusive range.
    #[inline]
    pub fn gen_range(&mut self, range: RangeInclusive<usize>) -> usize {
        if range.is_empty() {
            return *range.start();
        }
        self.inner.gen_range(range)
    }

    /// Generate a random integer in the given inclusive range.
    #[inline]
    pub fn gen_integer(&mut self, range: RangeInclusive<i128>) -> i128 {
        if range.is_empty() {
            return *range.start();
        }
        self.inner.gen_range(range)
    }

    /// Choose a random element from an iterator.
    ///
    /// If the iterator is empty, then `None` is returned.
    #[inline]
    pub fn choose<I>(&mut self, iter: I) -> Option<I::Item>
    where
        I: IntoIterator,
        I::IntoIter: ExactSizeIterator,
    {
        let iter = iter.into_iter();
        let idx = self.gen_index(iter.len())?;
        iter.into_iter().nth(idx)
    }

    /// Shuffle the given slice in place.
    #[inline]
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.inner);
    }

    /// Generate random bytes to fill the provided `buf`.
    #[inline]
    pub fn gen_bytes(&mut self, buf: &mut [u8]) {
        self.inner.fill(buf);
    }

    gen_methods! {
        gen_bool -> bool;
        gen_u8 -> u8;
        gen_u32 -> u32;
        gen_u64 -> u64;
        gen_i64 -> i64;
    }
}
