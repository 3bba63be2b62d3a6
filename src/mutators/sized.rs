//! Mutators for the two sides of a size relation.
//!
//! All four target the sizer and change the length it sizes by a delta,
//! counted in the relation's unit. They differ in where the delta goes:
//!
//! * [`SizePolicy::Preserve`] resizes the data and pins the sizer to the
//!   new, honest length. Growth repeats the data cyclically, shrinking
//!   keeps a prefix, and a length at or below zero leaves the data empty.
//! * [`SizePolicy::Forge`] leaves the data alone and pins the sizer to a
//!   length it does not have.

use super::hint_n;
use crate::log;
use crate::model::{DataModel, MutateOverride, NodeId};
use crate::numbers;
use crate::stream::{BitStream, Stream};
use crate::{Candidates, Error, Mutate, Result};
use alloc::sync::Arc;
use alloc::vec::Vec;

/// The byte an empty data element is filled with when it has to grow.
const FILLER: u8 = b'A';

pub(crate) fn supported(model: &DataModel, node: NodeId) -> bool {
    model.node(node).is_mutable() && model.size_relation(node).is_some()
}

/// Where a size delta is applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SizePolicy {
    /// Resize the data and keep the sizer truthful.
    Preserve,
    /// Leave the data and make the sizer lie.
    Forge,
}

/// Which deltas are tried.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SizedDeltas {
    /// Every delta in `[-N, N]`.
    Variance,
    /// Deltas near 8-bit boundaries, or 16-bit ones for sizers at least
    /// 16 bits wide.
    EdgeCases,
}

/// A size-relation mutator with the given deltas and policy.
///
/// `N` defaults to 50. Deltas the sizer's width cannot express are dropped
/// when the mutator is built.
#[derive(Clone, Debug)]
pub struct SizedData {
    name: &'static str,
    policy: SizePolicy,
    deltas: Vec<i128>,
}

impl SizedData {
    fn name_of(deltas: SizedDeltas, policy: SizePolicy) -> &'static str {
        match (deltas, policy) {
            (SizedDeltas::Variance, SizePolicy::Preserve) => "SizedVarianceMutator",
            (SizedDeltas::EdgeCases, SizePolicy::Preserve) => "SizedNumericalEdgeCasesMutator",
            (SizedDeltas::Variance, SizePolicy::Forge) => "SizedDataVarianceMutator",
            (SizedDeltas::EdgeCases, SizePolicy::Forge) => "SizedDataNumericalEdgeCasesMutator",
        }
    }

    /// Build the mutator for the sizer `node`.
    pub fn new(model: &DataModel, node: NodeId, deltas: SizedDeltas, policy: SizePolicy) -> Result<Self> {
        let name = Self::name_of(deltas, policy);
        let (Some(rel), Some(spec)) = (model.size_relation(node), model.node(node).kind().number_spec())
        else {
            return Err(Error::unsupported(name, model.full_name(node)));
        };

        let n = hint_n(model, node, name, 50)?;
        let current = i128::from(rel.unit.from_bits(model.length_bits(rel.data)?));
        let candidates = match deltas {
            SizedDeltas::Variance => {
                let n = i128::from(n);
                (-n..=n).collect()
            }
            SizedDeltas::EdgeCases if spec.bits() < 16 => numbers::bad_numbers(8, n),
            SizedDeltas::EdgeCases => numbers::bad_numbers(16, n),
        };

        let fits = |len: i128| len <= spec.max();
        let deltas = candidates
            .into_iter()
            .filter(|d| {
                let len = current + d;
                match policy {
                    SizePolicy::Preserve => fits(len.max(0)),
                    SizePolicy::Forge => len >= 0 && fits(len),
                }
            })
            .collect();

        Ok(Self {
            name,
            policy,
            deltas,
        })
    }

    /// The deltas this mutator tries, in candidate order.
    pub fn deltas(&self) -> &[i128] {
        &self.deltas
    }
}

impl Mutate for SizedData {
    fn name(&self) -> &'static str {
        self.name
    }

    fn count(&self) -> u32 {
        super::count_of(self.deltas.len())
    }

    fn mutate(&mut self, c: &mut Candidates<'_>, model: &mut DataModel, node: NodeId) -> Result<()> {
        for &delta in &self.deltas {
            c.mutation(|ctx| {
                let Some(rel) = model.size_relation(node) else {
                    log::skipped!(self.name, model, node, "no size relation");
                    return Ok(());
                };
                let data = model.value(rel.data)?;
                let current = i128::from(rel.unit.from_bits(data.len_bits()));
                let target = (current + delta).max(0);

                if self.policy == SizePolicy::Forge {
                    log::applied!(self.name, model, node, "claiming {target} instead of {current}");
                    model.set_mutated(node, target, MutateOverride::RELATIONS);
                    return Ok(());
                }

                let target_bits = rel.unit.to_bits(target as u64);
                if target_bits > data.len_bits() {
                    ctx.reserve(target_bits.div_ceil(8))?;
                }
                log::applied!(
                    self.name,
                    model,
                    rel.data,
                    "resizing from {current} to {target} {:?}",
                    rel.unit
                );

                let resized = if target_bits == 0 {
                    Stream::new()
                } else if data.is_empty() {
                    let mut filled = BitStream::filled(FILLER, target_bits.div_ceil(8) as usize);
                    filled.truncate(target_bits);
                    Stream::Bits(filled)
                } else if target_bits <= data.len_bits() {
                    Stream::slice(&data, 0, target_bits)
                } else {
                    Stream::repeat_to(&data, target_bits)
                };
                model.set_mutated(rel.data, Arc::new(resized), MutateOverride::TYPE_TRANSFORM);
                model.set_mutated(node, target, MutateOverride::RELATIONS);
                Ok(())
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DataModelBuilder, LengthUnit, NumberSpec};
    use crate::{Limits, Mutation};

    #[test]
    fn bit_relations_resize_in_bits() -> Result<()> {
        let mut b = DataModelBuilder::new("m");
        let root = b.root();
        let len = b.number(root, "len", NumberSpec::unsigned(16), 0)?;
        let body = b.blob(root, "body", &[0xF0u8][..])?;
        b.size_relation(len, body, LengthUnit::Bits)?;
        b.hint(len, "SizedVarianceMutator-N", "4");
        let template = b.build();

        let m = SizedData::new(&template, len, SizedDeltas::Variance, SizePolicy::Preserve)?;
        assert_eq!(m.deltas(), [-4, -3, -2, -1, 0, 1, 2, 3, 4]);
        let mut m = Mutation::new(m, len, Limits::default());

        // -3 bits: the first five bits remain.
        m.set_mutation(1);
        let mut model = template.clone();
        m.sequential_mutation(&mut model)?;
        assert_eq!(model.length_bits(body)?, 5);
        assert_eq!(model.decode_number(len)?, Some(5));
        Ok(())
    }

    #[test]
    fn empty_data_grows_with_filler() -> Result<()> {
        let mut b = DataModelBuilder::new("m");
        let root = b.root();
        let len = b.number(root, "len", NumberSpec::unsigned(8), 0)?;
        let body = b.string(root, "body", "")?;
        b.size_relation(len, body, LengthUnit::Bytes)?;
        b.hint(len, "SizedVarianceMutator-N", "3");
        let template = b.build();

        let m = SizedData::new(&template, len, SizedDeltas::Variance, SizePolicy::Preserve)?;
        let mut m = Mutation::new(m, len, Limits::default());
        m.set_mutation(m.count() - 1);
        let mut model = template.clone();
        m.sequential_mutation(&mut model)?;
        assert_eq!(model.value(root)?.to_bytes(), b"\x03AAA");
        Ok(())
    }

    #[test]
    fn forged_lengths_must_fit_the_sizer() -> Result<()> {
        let mut b = DataModelBuilder::new("m");
        let root = b.root();
        let len = b.number(root, "len", NumberSpec::unsigned(8), 0)?;
        let body = b.blob(root, "body", &[0u8; 250][..])?;
        b.size_relation(len, body, LengthUnit::Bytes)?;
        b.hint(len, "SizedDataVarianceMutator-N", "10");
        let template = b.build();

        let m = SizedData::new(&template, len, SizedDeltas::Variance, SizePolicy::Forge)?;
        assert_eq!(m.deltas().first(), Some(&-10));
        assert_eq!(m.deltas().last(), Some(&5));
        Ok(())
    }
}
