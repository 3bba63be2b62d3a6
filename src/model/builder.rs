use super::{DataModel, LengthUnit, Node, NodeId, NodeKind, NumberSpec, Relation, SizeRelation};
use crate::stream::Stream;
use crate::value::Value;
use crate::{Error, Result};
use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

/// Assembles a [`DataModel`].
///
/// This is the surface a format loader drives: it adds nodes under
/// containers, attaches hints and relations, and finally calls
/// [`build`][DataModelBuilder::build]. The root is a block named by
/// [`new`][DataModelBuilder::new].
///
/// # Example
///
/// ```
/// use malform::model::{DataModelBuilder, NumberSpec};
///
/// # fn foo() -> malform::Result<()> {
/// let mut b = DataModelBuilder::new("Msg");
/// let root = b.root();
/// let items = b.array(root, "items")?;
/// for i in 0..3 {
///     b.number(items, &format!("item{i}"), NumberSpec::unsigned(16).little_endian(), i)?;
/// }
/// b.hint(items, "ArrayVarianceMutator-N", "10");
///
/// let model = b.build();
/// assert_eq!(model.children(items).len(), 3);
/// assert_eq!(model.value(items)?.to_bytes(), [0, 0, 1, 0, 2, 0]);
/// # Ok(())
/// # }
/// # foo().unwrap();
/// ```
#[derive(Debug)]
pub struct DataModelBuilder {
    nodes: Vec<Node>,
}

impl DataModelBuilder {
    /// Start a model whose root block is named `root_name`.
    pub fn new(root_name: &str) -> Self {
        let root = Node::new(
            root_name.into(),
            NodeKind::Block,
            None,
            Value::Stream(Arc::new(Stream::new())),
        );
        Self {
            nodes: alloc::vec![root],
        }
    }

    /// The root block.
    pub fn root(&self) -> NodeId {
        NodeId::new(0)
    }

    fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes
            .get(id.index())
            .ok_or_else(|| Error::other(format!("no node {id} in this model")))
    }

    fn add(&mut self, parent: NodeId, name: &str, kind: NodeKind, default: Value) -> Result<NodeId> {
        let p = self.node(parent)?;
        if !p.kind.is_container() {
            return Err(Error::other(format!(
                "cannot add '{name}' under {} '{}'",
                p.kind.name(),
                p.name
            )));
        }
        if name.contains('.') {
            return Err(Error::other(format!("node name '{name}' contains a '.'")));
        }
        if p.children
            .iter()
            .any(|c| self.nodes[c.index()].name == name)
        {
            return Err(Error::other(format!(
                "duplicate child name '{name}' under '{}'",
                p.name
            )));
        }

        let id = NodeId::new(self.nodes.len());
        self.nodes
            .push(Node::new(name.into(), kind, Some(parent), default));
        self.nodes[parent.index()].children.push(id);
        Ok(id)
    }

    /// Add a number field.
    pub fn number(&mut self, parent: NodeId, name: &str, spec: NumberSpec, default: i128) -> Result<NodeId> {
        if spec.bits == 0 || spec.bits > 64 {
            return Err(Error::other(format!(
                "number '{name}' is {} bits wide; widths are 1 to 64",
                spec.bits
            )));
        }
        if spec.endian == super::Endian::Little && spec.bits % 8 != 0 {
            return Err(Error::other(format!(
                "little-endian number '{name}' must be a whole number of bytes, not {} bits",
                spec.bits
            )));
        }
        self.add(parent, name, NodeKind::Number(spec), Value::Integer(default))
    }

    /// Add an unsigned big-endian bit field.
    pub fn flag(&mut self, parent: NodeId, name: &str, bits: u32, default: u64) -> Result<NodeId> {
        if bits == 0 || bits > 64 {
            return Err(Error::other(format!(
                "flag '{name}' is {bits} bits wide; widths are 1 to 64"
            )));
        }
        self.add(parent, name, NodeKind::Flag(bits), Value::Integer(default.into()))
    }

    /// Add a string.
    pub fn string(&mut self, parent: NodeId, name: &str, default: &str) -> Result<NodeId> {
        self.add(parent, name, NodeKind::String, Value::String(default.into()))
    }

    /// Add a blob of raw bytes.
    pub fn blob(&mut self, parent: NodeId, name: &str, default: impl Into<Stream>) -> Result<NodeId> {
        self.add(parent, name, NodeKind::Blob, Value::Stream(Arc::new(default.into())))
    }

    /// Add a block.
    pub fn block(&mut self, parent: NodeId, name: &str) -> Result<NodeId> {
        self.add(parent, name, NodeKind::Block, empty())
    }

    /// Add an array. Its elements are added as its children.
    pub fn array(&mut self, parent: NodeId, name: &str) -> Result<NodeId> {
        self.add(parent, name, NodeKind::Array, empty())
    }

    /// Add a choice. It renders its first child until
    /// [`select`][DataModelBuilder::select] says otherwise.
    pub fn choice(&mut self, parent: NodeId, name: &str) -> Result<NodeId> {
        self.add(parent, name, NodeKind::Choice { selected: 0 }, empty())
    }

    /// Select which child of `choice` renders.
    pub fn select(&mut self, choice: NodeId, index: usize) -> Result<&mut Self> {
        let Some(NodeKind::Choice { selected }) =
            self.nodes.get_mut(choice.index()).map(|n| &mut n.kind)
        else {
            return Err(Error::other(format!("{choice} is not a choice")));
        };
        *selected = index;
        Ok(self)
    }

    /// Declare that `sizer` holds the length of `data` in `unit`s.
    ///
    /// The sizer must be a number or flag, and may size only one element.
    /// An element may be sized by several sizers.
    pub fn size_relation(&mut self, sizer: NodeId, data: NodeId, unit: LengthUnit) -> Result<&mut Self> {
        let s = self.node(sizer)?;
        if s.kind.number_spec().is_none() {
            return Err(Error::other(format!(
                "size of '{}' cannot be held by {} '{}'",
                self.node(data)?.name,
                s.kind.name(),
                s.name
            )));
        }
        if s.relations
            .iter()
            .any(|r| matches!(r, Relation::Size(rel) if rel.sizer == sizer))
        {
            return Err(Error::other(format!("'{}' already holds a size", s.name)));
        }
        self.node(data)?;
        if sizer == data {
            return Err(Error::other(format!("'{}' cannot hold its own size", s.name)));
        }

        let rel = Relation::Size(SizeRelation { sizer, data, unit });
        self.nodes[sizer.index()].relations.push(rel);
        self.nodes[data.index()].relations.push(rel);
        Ok(self)
    }

    /// Attach hint `key = value` to `node`. A later hint with the same key
    /// replaces an earlier one.
    pub fn hint(&mut self, node: NodeId, key: &str, value: &str) -> &mut Self {
        if let Some(n) = self.nodes.get_mut(node.index()) {
            n.hints.insert(key.into(), String::from(value));
        }
        self
    }

    /// Set whether mutators may target `node`. Nodes are mutable by default.
    pub fn mutable(&mut self, node: NodeId, mutable: bool) -> &mut Self {
        if let Some(n) = self.nodes.get_mut(node.index()) {
            n.mutable = mutable;
        }
        self
    }

    /// Finish the model.
    pub fn build(self) -> DataModel {
        DataModel::from_parts(self.nodes, NodeId::new(0))
    }
}

fn empty() -> Value {
    Value::Stream(Arc::new(Stream::new()))
}
