//! Mutators for raw byte buffers.
//!
//! Every change is built as a composed stream: the untouched prefix and
//! suffix are windows over the original rendering, and only the bytes a
//! candidate produces are freshly allocated.

use super::{count_of, hint_n};
use crate::log;
use crate::model::{DataModel, MutateOverride, NodeId, NodeKind};
use crate::stream::Stream;
use crate::{Candidates, Context, Mutate, Result};
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;

/// The longest range a single range candidate touches, in bytes.
const MAX_RANGE: usize = 100;

/// The most bytes an expansion inserts, exclusive.
const MAX_EXPANSION: usize = 255;

const SPECIAL_BYTES: [u8; 4] = [0x00, 0x01, 0xFE, 0xFF];

pub(crate) fn supported(model: &DataModel, node: NodeId) -> bool {
    let n = model.node(node);
    n.is_mutable() && matches!(n.kind(), NodeKind::Blob)
}

pub(crate) fn supported_slider(model: &DataModel, node: NodeId) -> bool {
    supported(model, node) && model.node(node).hint(BlobDwordSlider::NAME) != Some("off")
}

/// `data` with `removed` bytes at byte offset `at` replaced by `inserted`.
/// Trailing bits past the last whole byte are kept.
fn splice(data: &Arc<Stream>, at: usize, removed: usize, inserted: Vec<u8>) -> Stream {
    let at = at as u64 * 8;
    let resume = at + removed as u64 * 8;
    Stream::concat([
        Arc::new(Stream::slice(data, 0, at)),
        Arc::new(Stream::from(inserted)),
        Arc::new(Stream::slice(data, resume, data.len_bits().saturating_sub(resume))),
    ])
}

/// A random `[start, end)` byte range of a `len`-byte buffer, at most
/// [`MAX_RANGE`] long.
fn random_range(ctx: &mut Context<'_>, len: usize) -> (usize, usize) {
    let a = ctx.rng().gen_index(len).unwrap_or(0);
    let b = ctx.rng().gen_index(len).unwrap_or(0);
    let (start, end) = if a <= b { (a, b) } else { (b, a) };
    (start, end.min(start + MAX_RANGE))
}

/// How an expansion fills the bytes it inserts.
#[derive(Clone, Copy, Debug)]
enum Fill {
    SingleRandom,
    Incrementing,
    Zero,
    AllRandom,
}

impl Fill {
    fn generate(self, ctx: &mut Context<'_>, size: usize) -> Vec<u8> {
        match self {
            Fill::SingleRandom => vec![ctx.rng().gen_u8(); size],
            // Counts up from a random start and stops at 0xFF.
            Fill::Incrementing => {
                let start = ctx.rng().gen_index(size).unwrap_or(0);
                (start..(start + size).min(256)).map(|b| b as u8).collect()
            }
            Fill::Zero => vec![0; size],
            Fill::AllRandom => {
                let mut bytes = vec![0; size];
                ctx.rng().gen_bytes(&mut bytes);
                bytes
            }
        }
    }
}

/// How a range candidate rewrites the bytes of its range.
#[derive(Clone, Copy, Debug)]
enum Overwrite {
    Random,
    Special,
    Null,
    UnNull,
}

impl Overwrite {
    fn rewrite(self, ctx: &mut Context<'_>, range: &mut [u8]) {
        match self {
            Overwrite::Random => ctx.rng().gen_bytes(range),
            Overwrite::Special => {
                for b in range {
                    *b = SPECIAL_BYTES[ctx.rng().gen_index(SPECIAL_BYTES.len()).unwrap_or(0)];
                }
            }
            Overwrite::Null => range.fill(0),
            Overwrite::UnNull => {
                for b in range.iter_mut().filter(|b| **b == 0) {
                    *b = ctx.rng().gen_range(1..=254) as u8;
                }
            }
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Change {
    Expand(Fill),
    Reduce,
    Overwrite(Overwrite),
}

const CHANGES: [Change; 9] = [
    Change::Expand(Fill::SingleRandom),
    Change::Expand(Fill::Incrementing),
    Change::Expand(Fill::Zero),
    Change::Expand(Fill::AllRandom),
    Change::Reduce,
    Change::Overwrite(Overwrite::Random),
    Change::Overwrite(Overwrite::Special),
    Change::Overwrite(Overwrite::Null),
    Change::Overwrite(Overwrite::UnNull),
];

/// Structural blob changes.
///
/// Nine candidates: insert up to 254 bytes at a random offset (filled with
/// one repeated random byte, an incrementing run, zeros or random bytes),
/// remove a random range, or overwrite a random range of at most 100 bytes
/// with random bytes, special bytes (`00 01 FE FF`), zeros, or non-zero
/// replacements for its zeros. Offsets and sizes are random.
#[derive(Clone, Debug, Default)]
pub struct Blob;

impl Blob {
    const NAME: &'static str = "BlobMutator";

    /// Build the mutator.
    pub fn new() -> Self {
        Blob
    }
}

impl Mutate for Blob {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn count(&self) -> u32 {
        count_of(CHANGES.len())
    }

    fn mutate(&mut self, c: &mut Candidates<'_>, model: &mut DataModel, node: NodeId) -> Result<()> {
        for change in CHANGES {
            c.mutation(|ctx| {
                let data = model.value(node)?;
                let len = (data.len_bits() / 8) as usize;

                let result = match change {
                    Change::Expand(fill) => {
                        let size = ctx.rng().gen_index(MAX_EXPANSION).unwrap_or(0);
                        let at = ctx.rng().gen_range(0..=len);
                        ctx.reserve((len + size) as u64)?;
                        let bytes = fill.generate(ctx, size);
                        log::applied!(Self::NAME, model, node, "inserting {} bytes at {at}", bytes.len());
                        splice(&data, at, 0, bytes)
                    }
                    Change::Reduce => {
                        if len == 0 {
                            log::skipped!(Self::NAME, model, node, "nothing to remove");
                            return Ok(());
                        }
                        let a = ctx.rng().gen_index(len).unwrap_or(0);
                        let b = ctx.rng().gen_index(len).unwrap_or(0);
                        let (start, end) = if a <= b { (a, b) } else { (b, a) };
                        log::applied!(Self::NAME, model, node, "removing bytes {start}..{end}");
                        splice(&data, start, end - start, Vec::new())
                    }
                    Change::Overwrite(how) => {
                        if len == 0 {
                            log::skipped!(Self::NAME, model, node, "nothing to overwrite");
                            return Ok(());
                        }
                        let (start, end) = random_range(ctx, len);
                        let mut range =
                            Stream::slice(&data, start as u64 * 8, (end - start) as u64 * 8).to_bytes();
                        how.rewrite(ctx, &mut range);
                        log::applied!(Self::NAME, model, node, "{how:?} over bytes {start}..{end}");
                        splice(&data, start, end - start, range)
                    }
                };
                model.set_mutated(node, Arc::new(result), MutateOverride::TYPE_TRANSFORM);
                Ok(())
            })?;
        }
        Ok(())
    }
}

/// Flip one random bit per candidate.
///
/// There are `N` percent of the blob's bits worth of candidates. `N`
/// defaults to 20.
#[derive(Clone, Debug)]
pub struct BlobBitFlipper {
    n: u32,
}

impl BlobBitFlipper {
    const NAME: &'static str = "BlobBitFlipperMutator";

    /// Build the mutator for `node`.
    pub fn new(model: &DataModel, node: NodeId) -> Result<Self> {
        let percent = u64::from(hint_n(model, node, Self::NAME, 20)?);
        let bits = model.length_bits(node)?;
        Ok(Self {
            n: u32::try_from(bits.saturating_mul(percent) / 100).unwrap_or(u32::MAX),
        })
    }
}

impl Mutate for BlobBitFlipper {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn count(&self) -> u32 {
        self.n
    }

    fn mutate(&mut self, c: &mut Candidates<'_>, model: &mut DataModel, node: NodeId) -> Result<()> {
        for _ in 0..self.n {
            c.mutation(|ctx| {
                let data = model.value(node)?;
                let bits = data.len_bits();
                let Some(pos) = ctx.rng().gen_index(bits as usize) else {
                    log::skipped!(Self::NAME, model, node, "no bits to flip");
                    return Ok(());
                };
                let pos = pos as u64;
                let mut flipped = Stream::new();
                flipped.write_bit(data.read_bits_at(pos, 1)? == 0);
                log::applied!(Self::NAME, model, node, "flipping bit {pos}");

                let result = Stream::concat([
                    Arc::new(Stream::slice(&data, 0, pos)),
                    Arc::new(flipped),
                    Arc::new(Stream::slice(&data, pos + 1, bits - pos - 1)),
                ]);
                model.set_mutated(node, Arc::new(result), MutateOverride::TYPE_TRANSFORM);
                Ok(())
            })?;
        }
        Ok(())
    }
}

/// Slide a four byte `FF FF FF FF` window across the blob, one candidate
/// per byte offset. Near the end the window is cut short.
///
/// Disabled by the hint `BlobDWORDSliderMutator = off`.
#[derive(Clone, Debug)]
pub struct BlobDwordSlider {
    len: usize,
}

impl BlobDwordSlider {
    const NAME: &'static str = "BlobDWORDSliderMutator";

    /// Build the mutator for `node`.
    pub fn new(model: &DataModel, node: NodeId) -> Result<Self> {
        Ok(Self {
            len: (model.length_bits(node)? / 8) as usize,
        })
    }
}

impl Mutate for BlobDwordSlider {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn count(&self) -> u32 {
        count_of(self.len)
    }

    fn mutate(&mut self, c: &mut Candidates<'_>, model: &mut DataModel, node: NodeId) -> Result<()> {
        for at in 0..self.len {
            c.mutation(|_| {
                let data = model.value(node)?;
                let len = (data.len_bits() / 8) as usize;
                if at >= len {
                    log::skipped!(Self::NAME, model, node, "offset {at} is past {len} bytes");
                    return Ok(());
                }
                let width = (len - at).min(4);
                log::applied!(Self::NAME, model, node, "{width} x 0xFF at {at}");
                let result = splice(&data, at, width, vec![0xFF; width]);
                model.set_mutated(node, Arc::new(result), MutateOverride::TYPE_TRANSFORM);
                Ok(())
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DataModelBuilder;
    use crate::{Limits, Mutation};

    fn blob(bytes: &[u8]) -> Result<(DataModel, NodeId)> {
        let mut b = DataModelBuilder::new("m");
        let root = b.root();
        let blob = b.blob(root, "b", bytes)?;
        Ok((b.build(), blob))
    }

    #[test]
    fn slider_cuts_the_window_at_the_end() -> Result<()> {
        let (template, node) = blob(&[1, 2, 3, 4, 5])?;
        let mut m = Mutation::new(BlobDwordSlider::new(&template, node)?, node, Limits::default());
        assert_eq!(m.count(), 5);

        m.set_mutation(0);
        let mut model = template.clone();
        m.sequential_mutation(&mut model)?;
        assert_eq!(model.value(node)?.to_bytes(), [0xff, 0xff, 0xff, 0xff, 5]);

        m.set_mutation(3);
        let mut model = template.clone();
        m.sequential_mutation(&mut model)?;
        assert_eq!(model.value(node)?.to_bytes(), [1, 2, 3, 0xff, 0xff]);
        Ok(())
    }

    #[test]
    fn bit_flipper_changes_exactly_one_bit() -> Result<()> {
        let (template, node) = blob(&[0u8; 10])?;
        let mut m = Mutation::new(BlobBitFlipper::new(&template, node)?, node, Limits::default());
        assert_eq!(m.count(), 16);

        for cursor in 0..m.count() {
            m.set_mutation(cursor);
            let mut model = template.clone();
            m.sequential_mutation(&mut model)?;
            let bytes = model.value(node)?.to_bytes();
            assert_eq!(bytes.len(), 10);
            assert_eq!(bytes.iter().map(|b| b.count_ones()).sum::<u32>(), 1);
        }
        Ok(())
    }

    #[test]
    fn null_range_only_zeroes() -> Result<()> {
        let (template, node) = blob(&[0xAA; 300])?;
        let mut m = Mutation::new(Blob::new(), node, Limits::default());
        m.set_mutation(7);
        let mut model = template.clone();
        m.sequential_mutation(&mut model)?;

        let bytes = model.value(node)?.to_bytes();
        assert_eq!(bytes.len(), 300);
        let zeroes = bytes.iter().filter(|b| **b == 0).count();
        assert!(zeroes <= MAX_RANGE);
        assert!(bytes.iter().all(|b| *b == 0 || *b == 0xAA));
        assert!(model
            .node(node)
            .mutation_flags()
            .contains(MutateOverride::TYPE_TRANSFORM));
        Ok(())
    }
}
