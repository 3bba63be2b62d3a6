//! The render pass: turning nodes into streams and decoded values.
//!
//! For a node with a mutated value, the override flags decide what wins:
//!
//! 1. `TYPE_TRANSFORM`: the mutated bits are used as-is.
//! 2. `RELATIONS`: the mutated value is encoded; the size relation is not
//!    evaluated.
//! 3. A mutated value under default flags is encoded too, so no mutation is
//!    silently replaced by a derived value.
//! 4. A size relation, when the node is a sizer.
//! 5. The default value, or the children for containers.

use super::{DataModel, Node, NodeId, NodeKind, MutateOverride};
use crate::stream::{BitStream, Stream};
use crate::value::Value;
use crate::Result;
use alloc::sync::Arc;
use alloc::vec::Vec;

impl DataModel {
    /// Render `id` to a stream.
    ///
    /// Containers render as composed streams over their children's
    /// renderings, so nothing below them is copied.
    pub fn value(&self, id: NodeId) -> Result<Arc<Stream>> {
        self.render(id, &mut Vec::new())
    }

    /// `id`'s decoded value: the integer a number (or sizer) holds, a
    /// string's text, or a blob's or container's bytes.
    pub fn internal_value(&self, id: NodeId) -> Result<Value> {
        let node = self.node(id);
        if let Some(mutated) = &node.mutated {
            return Ok(mutated.clone());
        }
        if let Some(len) = self.derived_size(id, &mut Vec::new())? {
            return Ok(Value::Integer(len));
        }
        if node.kind.is_container() {
            return Ok(Value::Stream(self.value(id)?));
        }
        Ok(node.default.clone())
    }

    /// The length of `id`'s rendering, in bits.
    pub fn length_bits(&self, id: NodeId) -> Result<u64> {
        Ok(self.value(id)?.len_bits())
    }

    /// Decode `id`'s rendered bits as its number encoding. `None` when the
    /// node is not numeric or its rendering is not exactly its width.
    pub fn decode_number(&self, id: NodeId) -> Result<Option<i128>> {
        let Some(spec) = self.node(id).kind.number_spec() else {
            return Ok(None);
        };
        let stream = self.value(id)?;
        if stream.len_bits() != u64::from(spec.bits()) {
            return Ok(None);
        }
        Ok(Some(spec.from_raw(stream.read_bits_at(0, spec.bits())?)))
    }

    fn render(&self, id: NodeId, guard: &mut Vec<NodeId>) -> Result<Arc<Stream>> {
        let node = self.node(id);
        if let Some(mutated) = &node.mutated {
            if node.flags.contains(MutateOverride::TYPE_TRANSFORM) {
                return Ok(match mutated {
                    Value::Stream(s) => s.clone(),
                    other => encode(node, other),
                });
            }
            return Ok(encode(node, mutated));
        }
        if let Some(len) = self.derived_size(id, guard)? {
            return Ok(encode(node, &Value::Integer(len)));
        }

        match node.kind {
            NodeKind::Block | NodeKind::Array => {
                let parts = node
                    .children
                    .iter()
                    .map(|c| self.render(*c, guard))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Arc::new(Stream::concat(parts)))
            }
            NodeKind::Choice { selected } => match node.children.get(selected) {
                Some(c) => self.render(*c, guard),
                None => Ok(Arc::new(Stream::new())),
            },
            _ => Ok(encode(node, &node.default)),
        }
    }

    /// The length `id` holds through its size relation, unless that
    /// relation is already being evaluated further up the stack.
    fn derived_size(&self, id: NodeId, guard: &mut Vec<NodeId>) -> Result<Option<i128>> {
        let Some(rel) = self.size_relation(id) else {
            return Ok(None);
        };
        if guard.contains(&id) {
            return Ok(None);
        }
        guard.push(id);
        let bits = self.render(rel.data, guard).map(|s| s.len_bits());
        guard.pop();
        Ok(Some(i128::from(rel.unit.from_bits(bits?))))
    }
}

/// Encode `value` for `node`'s type.
fn encode(node: &Node, value: &Value) -> Arc<Stream> {
    if let Some(spec) = node.kind.number_spec() {
        if let Some(i) = value.as_integer() {
            let mut bits = BitStream::new();
            bits.write_bits_at(0, spec.to_raw(i), spec.bits());
            return Arc::new(Stream::Bits(bits));
        }
    }
    value.to_stream()
}

#[cfg(test)]
mod tests {
    use crate::model::{DataModelBuilder, LengthUnit, MutateOverride, NumberSpec};

    #[test]
    fn sizer_inside_its_data_uses_default() -> crate::Result<()> {
        let mut b = DataModelBuilder::new("m");
        let root = b.root();
        let blk = b.block(root, "blk")?;
        let len = b.number(blk, "len", NumberSpec::unsigned(8), 0x7f)?;
        b.blob(blk, "body", &b"abc"[..])?;
        b.size_relation(len, blk, LengthUnit::Bytes)?;
        let model = b.build();

        // While measuring `blk`, `len` renders its 1-byte default.
        assert_eq!(model.internal_value(len)?.as_integer(), Some(4));
        assert_eq!(model.value(root)?.to_bytes(), b"\x04abc");
        Ok(())
    }

    #[test]
    fn override_order() -> crate::Result<()> {
        let mut b = DataModelBuilder::new("m");
        let root = b.root();
        let len = b.number(root, "len", NumberSpec::unsigned(8), 0)?;
        let body = b.blob(root, "body", &b"abcd"[..])?;
        b.size_relation(len, body, LengthUnit::Bytes)?;
        let mut model = b.build();

        assert_eq!(model.decode_number(len)?, Some(4));

        model.set_mutated(len, 9i128, MutateOverride::RELATIONS);
        assert_eq!(model.decode_number(len)?, Some(9));

        // A plain mutated value wins over the relation as well.
        model.set_mutated(len, 7i128, MutateOverride::DEFAULT);
        assert_eq!(model.decode_number(len)?, Some(7));

        model.reset_mutations();
        assert_eq!(model.decode_number(len)?, Some(4));
        Ok(())
    }
}
