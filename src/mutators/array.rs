//! Mutators that change an array's element count or order.

use super::{count_of, hint_n};
use crate::log;
use crate::model::{DataModel, MutateOverride, NodeId, NodeKind};
use crate::numbers;
use crate::stream::Stream;
use crate::{Candidates, Context, Mutate, Result};
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

pub(crate) fn supported(model: &DataModel, node: NodeId) -> bool {
    let n = model.node(node);
    n.is_mutable() && matches!(n.kind(), NodeKind::Array)
}

pub(crate) fn supported_reorder(model: &DataModel, node: NodeId) -> bool {
    supported(model, node) && model.children(node).len() >= 2
}

/// Remove trailing elements until `node` has `target`.
fn shrink(model: &mut DataModel, node: NodeId, target: usize) {
    while model.children(node).len() > target {
        let Some(&last) = model.children(node).last() else {
            break;
        };
        model.detach(last);
    }
}

/// Append copies of the last element until `node` has `target`.
fn grow_by_copies(
    ctx: &Context<'_>,
    model: &mut DataModel,
    node: NodeId,
    target: usize,
    mutator: &'static str,
) -> Result<()> {
    let Some(&last) = model.children(node).last() else {
        log::skipped!(mutator, model, node, "cannot grow an empty array");
        return Ok(());
    };
    let added = (target - model.children(node).len()) as u64;
    ctx.reserve(model.value(last)?.len_bytes().saturating_mul(added))?;

    let base = String::from(model.node(last).name());
    while model.children(node).len() < target {
        let name = model.unique_child_name(node, &base);
        let copy = model.clone_subtree(last, name);
        let end = model.children(node).len();
        model.insert_child(node, end, copy);
    }
    Ok(())
}

/// Resize the array to every count within `N` of its current one.
///
/// Growing appends copies of the last element, named `<name>_1`,
/// `<name>_2`, and so on. Shrinking removes elements from the end. `N`
/// defaults to 50.
#[derive(Clone, Debug)]
pub struct ArrayVariance {
    min: usize,
    max: usize,
}

impl ArrayVariance {
    const NAME: &'static str = "ArrayVarianceMutator";

    /// Build the mutator for `node`.
    pub fn new(model: &DataModel, node: NodeId) -> Result<Self> {
        let n = hint_n(model, node, Self::NAME, 50)? as usize;
        let count = model.children(node).len();
        Ok(Self {
            min: count.saturating_sub(n),
            max: count.saturating_add(n),
        })
    }
}

impl Mutate for ArrayVariance {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn count(&self) -> u32 {
        count_of(self.max - self.min + 1)
    }

    fn mutate(&mut self, c: &mut Candidates<'_>, model: &mut DataModel, node: NodeId) -> Result<()> {
        for target in self.min..=self.max {
            c.mutation(|ctx| {
                let current = model.children(node).len();
                log::applied!(Self::NAME, model, node, "{current} -> {target} elements");
                if target < current {
                    shrink(model, node, target);
                } else if target > current {
                    grow_by_copies(ctx, model, node, target, Self::NAME)?;
                }
                Ok(())
            })?;
        }
        Ok(())
    }
}

/// Resize the array to counts near numeric boundaries, from
/// [`numbers::bad_positive_numbers`].
///
/// Growing does not add elements: the last element's rendering is repeated
/// in place, so thousands of elements cost one segment list. `N` defaults
/// to 50.
#[derive(Clone, Debug)]
pub struct ArrayNumericalEdgeCases {
    counts: Vec<usize>,
}

impl ArrayNumericalEdgeCases {
    const NAME: &'static str = "ArrayNumericalEdgeCasesMutator";

    /// Build the mutator for `node`.
    pub fn new(model: &DataModel, node: NodeId) -> Result<Self> {
        let n = hint_n(model, node, Self::NAME, 50)?;
        let counts = numbers::bad_positive_numbers(n)
            .into_iter()
            .filter_map(|v| usize::try_from(v).ok())
            .collect();
        Ok(Self { counts })
    }
}

impl Mutate for ArrayNumericalEdgeCases {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn count(&self) -> u32 {
        count_of(self.counts.len())
    }

    fn mutate(&mut self, c: &mut Candidates<'_>, model: &mut DataModel, node: NodeId) -> Result<()> {
        for &target in &self.counts {
            c.mutation(|ctx| {
                let current = model.children(node).len();
                if target <= current {
                    log::applied!(Self::NAME, model, node, "{current} -> {target} elements");
                    shrink(model, node, target);
                    return Ok(());
                }
                let Some(&last) = model.children(node).last() else {
                    log::skipped!(Self::NAME, model, node, "cannot grow an empty array");
                    return Ok(());
                };

                let copies = (target - current + 1) as u64;
                let unit = model.value(last)?;
                ctx.reserve(unit.len_bytes().saturating_mul(copies))?;
                log::applied!(Self::NAME, model, node, "{current} -> {target} elements");
                let repeated = Stream::repeat_to(&unit, unit.len_bits().saturating_mul(copies));
                model.set_mutated(last, Arc::new(repeated), MutateOverride::TYPE_TRANSFORM);
                Ok(())
            })?;
        }
        Ok(())
    }
}

/// Reverse the array's elements.
#[derive(Clone, Debug, Default)]
pub struct ArrayReverseOrder;

impl ArrayReverseOrder {
    const NAME: &'static str = "ArrayReverseOrderMutator";

    /// Build the mutator.
    pub fn new() -> Self {
        ArrayReverseOrder
    }
}

impl Mutate for ArrayReverseOrder {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn count(&self) -> u32 {
        1
    }

    fn mutate(&mut self, c: &mut Candidates<'_>, model: &mut DataModel, node: NodeId) -> Result<()> {
        c.mutation(|_| {
            let mut order = model.children(node).to_vec();
            order.reverse();
            log::applied!(Self::NAME, model, node, "reversed {} elements", order.len());
            model.reorder_children(node, order);
            Ok(())
        })
    }
}

/// Shuffle the array's elements, `N` different ways.
///
/// `N` defaults to 50.
#[derive(Clone, Debug)]
pub struct ArrayRandomizeOrder {
    n: u32,
}

impl ArrayRandomizeOrder {
    const NAME: &'static str = "ArrayRandomizeOrderMutator";

    /// Build the mutator for `node`.
    pub fn new(model: &DataModel, node: NodeId) -> Result<Self> {
        Ok(Self {
            n: hint_n(model, node, Self::NAME, 50)?,
        })
    }
}

impl Mutate for ArrayRandomizeOrder {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn count(&self) -> u32 {
        self.n
    }

    fn mutate(&mut self, c: &mut Candidates<'_>, model: &mut DataModel, node: NodeId) -> Result<()> {
        for _ in 0..self.n {
            c.mutation(|ctx| {
                let mut order = model.children(node).to_vec();
                ctx.rng().shuffle(&mut order);
                log::applied!(Self::NAME, model, node, "shuffled {} elements", order.len());
                model.reorder_children(node, order);
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

    fn array_of(n: i128) -> Result<(DataModel, NodeId)> {
        let mut b = DataModelBuilder::new("m");
        let root = b.root();
        let items = b.array(root, "items")?;
        for i in 0..n {
            b.number(items, &alloc::format!("item{i}"), NumberSpec::unsigned(8), i)?;
        }
        Ok((b.build(), items))
    }

    #[test]
    fn growth_names_copies_after_the_last_element() -> Result<()> {
        let (template, items) = array_of(2)?;
        let mut m = Mutation::new(ArrayVariance::new(&template, items)?, items, Limits::default());
        m.set_mutation(m.count() - 1);
        let mut model = template.clone();
        m.sequential_mutation(&mut model)?;

        let children = model.children(items);
        assert_eq!(children.len(), 52);
        assert_eq!(model.node(children[2]).name(), "item1_1");
        assert_eq!(model.node(children[3]).name(), "item1_2");
        Ok(())
    }

    #[test]
    fn edge_growth_repeats_the_last_element() -> Result<()> {
        let (template, items) = array_of(3)?;
        let mut m = ArrayNumericalEdgeCases::new(&template, items)?;
        m.counts = alloc::vec![5];
        let mut m = Mutation::new(m, items, Limits::default());
        let mut model = template.clone();
        m.sequential_mutation(&mut model)?;

        assert_eq!(model.children(items).len(), 3);
        assert_eq!(model.value(items)?.to_bytes(), [0, 1, 2, 2, 2]);
        Ok(())
    }
}
