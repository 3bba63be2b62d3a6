//! Mutators that change which elements a container holds.
//!
//! Relations refer to nodes by id, so moving, removing or copying an element
//! never retargets a relation; a sizer whose data was removed measures the
//! detached node as before.

use crate::log;
use crate::model::{DataModel, NodeId, NodeKind};
use crate::{Candidates, Mutate, Result};

/// The most copies [`DataElementDuplicate`] inserts.
const MAX_COPIES: u32 = 49;

fn movable(model: &DataModel, node: NodeId) -> bool {
    let n = model.node(node);
    n.is_mutable() && n.parent().is_some()
}

pub(crate) fn supported_duplicate(model: &DataModel, node: NodeId) -> bool {
    movable(model, node) && !matches!(model.node(node).kind(), NodeKind::Flag(_))
}

pub(crate) fn supported_remove(model: &DataModel, node: NodeId) -> bool {
    movable(model, node)
}

pub(crate) fn supported_swap(model: &DataModel, node: NodeId) -> bool {
    movable(model, node) && next_sibling(model, node).is_some()
}

/// `node`'s index among its siblings and the sibling after it.
fn next_sibling(model: &DataModel, node: NodeId) -> Option<(usize, NodeId)> {
    let siblings = model.children(model.parent(node)?);
    let index = siblings.iter().position(|c| *c == node)?;
    siblings.get(index + 1).map(|next| (index, *next))
}

/// Insert 1 to 49 copies of the element directly after it.
///
/// Copies are deep and named `<name>_1`, `<name>_2`, and so on.
#[derive(Clone, Debug)]
pub struct DataElementDuplicate {
    max: u32,
}

impl DataElementDuplicate {
    const NAME: &'static str = "DataElementDuplicateMutator";

    /// Build the mutator.
    pub fn new() -> Self {
        Self { max: MAX_COPIES }
    }
}

impl Default for DataElementDuplicate {
    fn default() -> Self {
        Self::new()
    }
}

impl Mutate for DataElementDuplicate {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn count(&self) -> u32 {
        self.max
    }

    fn mutate(&mut self, c: &mut Candidates<'_>, model: &mut DataModel, node: NodeId) -> Result<()> {
        for copies in 1..=self.max {
            c.mutation(|ctx| {
                let Some(parent) = model.parent(node) else {
                    log::skipped!(Self::NAME, model, node, "element is detached");
                    return Ok(());
                };
                let Some(index) = model.children(parent).iter().position(|c| *c == node) else {
                    return Ok(());
                };
                ctx.reserve(
                    model
                        .value(node)?
                        .len_bytes()
                        .saturating_mul(u64::from(copies)),
                )?;
                log::applied!(Self::NAME, model, node, "{copies} copies");

                let base = alloc::string::String::from(model.node(node).name());
                for i in 0..copies as usize {
                    let name = model.unique_child_name(parent, &base);
                    let copy = model.clone_subtree(node, name);
                    model.insert_child(parent, index + 1 + i, copy);
                }
                Ok(())
            })?;
        }
        Ok(())
    }
}

/// Remove the element from its container.
#[derive(Clone, Debug, Default)]
pub struct DataElementRemove;

impl DataElementRemove {
    const NAME: &'static str = "DataElementRemoveMutator";

    /// Build the mutator.
    pub fn new() -> Self {
        DataElementRemove
    }
}

impl Mutate for DataElementRemove {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn count(&self) -> u32 {
        1
    }

    fn mutate(&mut self, c: &mut Candidates<'_>, model: &mut DataModel, node: NodeId) -> Result<()> {
        c.mutation(|_| {
            log::applied!(Self::NAME, model, node, "removing");
            if model.detach(node).is_none() {
                log::skipped!(Self::NAME, model, node, "element is detached");
            }
            Ok(())
        })
    }
}

/// Swap the element with the sibling after it.
#[derive(Clone, Debug, Default)]
pub struct DataElementSwapNearNodes;

impl DataElementSwapNearNodes {
    const NAME: &'static str = "DataElementSwapNearNodesMutator";

    /// Build the mutator.
    pub fn new() -> Self {
        DataElementSwapNearNodes
    }
}

impl Mutate for DataElementSwapNearNodes {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn count(&self) -> u32 {
        1
    }

    fn mutate(&mut self, c: &mut Candidates<'_>, model: &mut DataModel, node: NodeId) -> Result<()> {
        c.mutation(|_| {
            let (Some(parent), Some((index, next))) = (model.parent(node), next_sibling(model, node))
            else {
                log::skipped!(Self::NAME, model, node, "no next sibling");
                return Ok(());
            };
            log::applied!(Self::NAME, model, node, "swapping with {}", model.node(next).name());
            let mut order = model.children(parent).to_vec();
            order.swap(index, index + 1);
            model.reorder_children(parent, order);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DataModelBuilder, LengthUnit, NumberSpec};
    use crate::{Limits, Mutation};

    #[test]
    fn duplicates_follow_the_original() -> Result<()> {
        let mut b = DataModelBuilder::new("m");
        let root = b.root();
        let a = b.string(root, "a", "x")?;
        b.string(root, "z", "!")?;
        let template = b.build();

        let mut m = Mutation::new(DataElementDuplicate::new(), a, Limits::default());
        assert_eq!(m.count(), 49);
        m.set_mutation(2);
        let mut model = template.clone();
        m.sequential_mutation(&mut model)?;

        assert_eq!(model.value(root)?.to_bytes(), b"xxxx!");
        let names: alloc::vec::Vec<_> = model
            .children(root)
            .iter()
            .map(|c| model.node(*c).name())
            .collect();
        assert_eq!(names, ["a", "a_1", "a_2", "a_3", "z"]);
        Ok(())
    }

    #[test]
    fn swapping_keeps_relations() -> Result<()> {
        let mut b = DataModelBuilder::new("m");
        let root = b.root();
        let len = b.number(root, "len", NumberSpec::unsigned(8), 0)?;
        let body = b.string(root, "body", "abc")?;
        b.size_relation(len, body, LengthUnit::Bytes)?;
        let template = b.build();

        let mut m = Mutation::new(DataElementSwapNearNodes::new(), len, Limits::default());
        let mut model = template.clone();
        m.sequential_mutation(&mut model)?;
        assert_eq!(model.value(root)?.to_bytes(), b"abc\x03");
        Ok(())
    }
}
