//! Mutators for numbers, flags and numeric strings.

use super::{count_of, hint_n};
use crate::log;
use crate::model::{DataModel, MutateOverride, NodeId, NodeKind};
use crate::numbers;
use crate::value::parse_integer;
use crate::{Candidates, Error, Mutate, Result};
use alloc::string::ToString;
use alloc::vec::Vec;
use core::ops::RangeInclusive;

/// The hint that marks a string as holding a decimal number.
pub(crate) const NUMERICAL_STRING: &str = "NumericalString";

pub(crate) fn supported(model: &DataModel, node: NodeId) -> bool {
    supported_edge_case(model, node)
        && model
            .node(node)
            .kind()
            .number_spec()
            .map_or(true, |spec| spec.bits() > 8)
}

/// Edge cases apply to numbers and flags of any width.
pub(crate) fn supported_edge_case(model: &DataModel, node: NodeId) -> bool {
    let n = model.node(node);
    if !n.is_mutable() {
        return false;
    }
    match n.kind() {
        NodeKind::Number(_) | NodeKind::Flag(_) => true,
        NodeKind::String => n.hint(NUMERICAL_STRING).is_some(),
        _ => false,
    }
}

/// What the numeric mutators need to know about their target.
struct Target {
    current: i128,
    range: RangeInclusive<i128>,
    bits: u32,
    signed: bool,
    as_string: bool,
}

impl Target {
    fn new(model: &DataModel, node: NodeId) -> Result<Self> {
        let n = model.node(node);
        if let Some(spec) = n.kind().number_spec() {
            let current = model.internal_value(node)?.as_integer().unwrap_or(0);
            return Ok(Target {
                current,
                range: spec.range(),
                bits: spec.bits(),
                signed: spec.is_signed(),
                as_string: false,
            });
        }

        // A numeric string is treated as an unsigned 32-bit number.
        let value = model.internal_value(node)?;
        let text = value.as_str().unwrap_or_default();
        let current = parse_integer(text).ok_or_else(|| Error::invalid_hint(NUMERICAL_STRING, text))?;
        Ok(Target {
            current,
            range: 0..=i128::from(u32::MAX),
            bits: 32,
            signed: false,
            as_string: true,
        })
    }
}

fn store(model: &mut DataModel, node: NodeId, as_string: bool, value: i128) {
    if as_string {
        model.set_mutated(node, value.to_string(), MutateOverride::DEFAULT);
    } else {
        model.set_mutated(node, value, MutateOverride::DEFAULT);
    }
}

/// Produce values within `N` of the node's current value, skipping any the
/// field cannot hold.
///
/// `N` defaults to 50 and comes from the `NumericalVarianceMutator-N` hint.
#[derive(Clone, Debug)]
pub struct NumericalVariance {
    values: Vec<i128>,
    as_string: bool,
}

impl NumericalVariance {
    const NAME: &'static str = "NumericalVarianceMutator";

    /// Build the mutator for `node`.
    pub fn new(model: &DataModel, node: NodeId) -> Result<Self> {
        let n = i128::from(hint_n(model, node, Self::NAME, 50)?);
        let target = Target::new(model, node)?;
        let values = (-n..=n)
            .map(|delta| target.current + delta)
            .filter(|v| target.range.contains(v))
            .collect();
        Ok(Self {
            values,
            as_string: target.as_string,
        })
    }
}

impl Mutate for NumericalVariance {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn count(&self) -> u32 {
        count_of(self.values.len())
    }

    fn mutate(&mut self, c: &mut Candidates<'_>, model: &mut DataModel, node: NodeId) -> Result<()> {
        for v in &self.values {
            c.mutation(|_| {
                log::applied!(Self::NAME, model, node, "{v}");
                store(model, node, self.as_string, *v);
                Ok(())
            })?;
        }
        Ok(())
    }
}

/// Produce the boundary values of the node's width and their
/// neighborhoods, from [`numbers::bad_numbers`].
///
/// The width is snapped up to 8, 16, 24, 32 or 64 bits. Values the field
/// cannot hold are skipped. Unsigned 64-bit fields use
/// [`numbers::bad_u64`] so the top of their range is covered.
#[derive(Clone, Debug)]
pub struct NumericalEdgeCase {
    values: Vec<i128>,
    as_string: bool,
}

impl NumericalEdgeCase {
    const NAME: &'static str = "NumericalEdgeCaseMutator";

    /// Build the mutator for `node`.
    pub fn new(model: &DataModel, node: NodeId) -> Result<Self> {
        let n = hint_n(model, node, Self::NAME, 50)?;
        let target = Target::new(model, node)?;
        let width = numbers::snap_width(target.bits);
        let candidates = if width == 64 && !target.signed {
            numbers::bad_u64(n)
        } else {
            numbers::bad_numbers(width, n)
        };
        let values = candidates
            .into_iter()
            .filter(|v| target.range.contains(v))
            .collect();
        Ok(Self {
            values,
            as_string: target.as_string,
        })
    }
}

impl Mutate for NumericalEdgeCase {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn count(&self) -> u32 {
        count_of(self.values.len())
    }

    fn mutate(&mut self, c: &mut Candidates<'_>, model: &mut DataModel, node: NodeId) -> Result<()> {
        for v in &self.values {
            c.mutation(|_| {
                log::applied!(Self::NAME, model, node, "{v}");
                store(model, node, self.as_string, *v);
                Ok(())
            })?;
        }
        Ok(())
    }
}

/// Produce `N` uniformly random values from the field's range.
///
/// `N` defaults to 5000.
#[derive(Clone, Debug)]
pub struct FiniteRandomNumbers {
    n: u32,
    range: RangeInclusive<i128>,
    as_string: bool,
}

impl FiniteRandomNumbers {
    const NAME: &'static str = "FiniteRandomNumbersMutator";

    /// Build the mutator for `node`.
    pub fn new(model: &DataModel, node: NodeId) -> Result<Self> {
        let n = hint_n(model, node, Self::NAME, 5000)?;
        let target = Target::new(model, node)?;
        Ok(Self {
            n,
            range: target.range,
            as_string: target.as_string,
        })
    }
}

impl Mutate for FiniteRandomNumbers {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn count(&self) -> u32 {
        self.n
    }

    fn mutate(&mut self, c: &mut Candidates<'_>, model: &mut DataModel, node: NodeId) -> Result<()> {
        for _ in 0..self.n {
            c.mutation(|ctx| {
                let v = ctx.rng().gen_integer(self.range.clone());
                log::applied!(Self::NAME, model, node, "{v}");
                store(model, node, self.as_string, v);
                Ok(())
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DataModelBuilder, NumberSpec};
    use crate::{Limits, Mutation};

    #[test]
    fn variance_stays_in_range() -> Result<()> {
        let mut b = DataModelBuilder::new("m");
        let root = b.root();
        let x = b.number(root, "x", NumberSpec::unsigned(16), 3)?;
        b.hint(x, "NumericalVarianceMutator-N", "5");
        let model = b.build();

        let m = NumericalVariance::new(&model, x)?;
        assert_eq!(m.values, [0, 1, 2, 3, 4, 5, 6, 7, 8]);
        Ok(())
    }

    #[test]
    fn edge_cases_for_signed_16() -> Result<()> {
        let mut b = DataModelBuilder::new("m");
        let root = b.root();
        let x = b.number(root, "x", NumberSpec::signed(16), 0)?;
        b.hint(x, "NumericalEdgeCaseMutator-N", "0");
        let model = b.build();

        let m = NumericalEdgeCase::new(&model, x)?;
        assert_eq!(m.values, [0, -128, 127, 255, -32768, 32767]);
        Ok(())
    }

    #[test]
    fn numeric_string_gets_text() -> Result<()> {
        let mut b = DataModelBuilder::new("m");
        let root = b.root();
        let s = b.string(root, "s", "10")?;
        b.hint(s, NUMERICAL_STRING, "true");
        b.hint(s, "NumericalVarianceMutator-N", "1");
        let template = b.build();

        let mut m = Mutation::new(NumericalVariance::new(&template, s)?, s, Limits::default());
        assert_eq!(m.count(), 3);
        let mut model = template.clone();
        m.sequential_mutation(&mut model)?;
        assert_eq!(model.value(s)?.to_bytes(), b"9");
        Ok(())
    }

    #[test]
    fn unparseable_numeric_string() -> Result<()> {
        let mut b = DataModelBuilder::new("m");
        let root = b.root();
        let s = b.string(root, "s", "ten")?;
        b.hint(s, NUMERICAL_STRING, "true");
        let model = b.build();

        assert!(NumericalVariance::new(&model, s).unwrap_err().is_config());
        Ok(())
    }
}
