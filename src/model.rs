//! The format tree that mutators rewrite.
//!
//! A [`DataModel`] is an arena of [`Node`]s addressed by [`NodeId`]. Child to
//! parent edges are plain indices, so cloning a model is a single clone of
//! the arena, and ids taken from a template stay valid on every clone of it.
//! Fuzzing clones the template once per test case and mutates the clone.
//!
//! Models are put together with a [`DataModelBuilder`] and rendered with
//! [`DataModel::value`].

use crate::value::Value;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::{fmt, ops};

mod builder;
mod render;

pub use builder::DataModelBuilder;

/// The index of a node in its [`DataModel`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn new(index: usize) -> Self {
        debug_assert!(index <= u32::MAX as usize);
        NodeId(index as u32)
    }

    /// This id's index in the arena.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Byte order of a number's encoding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Endian {
    /// Most significant byte first.
    #[default]
    Big,
    /// Least significant byte first. Only valid for whole-byte widths.
    Little,
}

/// The encoding of a `Number` node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NumberSpec {
    bits: u32,
    signed: bool,
    endian: Endian,
}

impl NumberSpec {
    /// An unsigned, big-endian number `bits` wide.
    pub fn unsigned(bits: u32) -> Self {
        Self {
            bits,
            signed: false,
            endian: Endian::Big,
        }
    }

    /// A signed, big-endian number `bits` wide.
    pub fn signed(bits: u32) -> Self {
        Self {
            bits,
            signed: true,
            endian: Endian::Big,
        }
    }

    /// The same number, encoded little-endian.
    pub fn little_endian(self) -> Self {
        Self {
            endian: Endian::Little,
            ..self
        }
    }

    /// The width in bits.
    #[inline]
    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// Whether the number is signed.
    #[inline]
    pub fn is_signed(&self) -> bool {
        self.signed
    }

    /// The byte order.
    #[inline]
    pub fn endian(&self) -> Endian {
        self.endian
    }

    /// The smallest value the field can hold.
    pub fn min(&self) -> i128 {
        if self.signed {
            -(1i128 << (self.bits - 1))
        } else {
            0
        }
    }

    /// The largest value the field can hold.
    pub fn max(&self) -> i128 {
        if self.signed {
            (1i128 << (self.bits - 1)) - 1
        } else {
            (1i128 << self.bits) - 1
        }
    }

    /// The values this field holds without wrapping.
    pub fn range(&self) -> ops::RangeInclusive<i128> {
        self.min()..=self.max()
    }

    fn mask(&self) -> u64 {
        if self.bits == 64 {
            u64::MAX
        } else {
            (1u64 << self.bits) - 1
        }
    }

    /// The field's raw bits for `value`, wrapped to the width and byte
    /// swapped for little-endian fields.
    pub(crate) fn to_raw(&self, value: i128) -> u64 {
        let raw = (value as u64) & self.mask();
        match self.endian {
            Endian::Big => raw,
            Endian::Little => raw.swap_bytes() >> (64 - self.bits),
        }
    }

    /// The inverse of [`NumberSpec::to_raw`].
    pub(crate) fn from_raw(&self, raw: u64) -> i128 {
        let raw = match self.endian {
            Endian::Big => raw & self.mask(),
            Endian::Little => (raw & self.mask()).swap_bytes() >> (64 - self.bits),
        };
        if self.signed && (raw >> (self.bits - 1)) & 1 == 1 {
            i128::from(raw) - (1i128 << self.bits)
        } else {
            i128::from(raw)
        }
    }
}

/// What a node is.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum NodeKind {
    /// An integer field.
    Number(NumberSpec),
    /// An unsigned big-endian bit field of the given width.
    Flag(u32),
    /// A UTF-8 string.
    String,
    /// Raw bytes.
    Blob,
    /// A container rendering its children in order.
    Block,
    /// A container of repeated elements.
    Array,
    /// A container rendering only its selected child.
    Choice {
        /// Index of the selected child.
        selected: usize,
    },
}

impl NodeKind {
    /// Whether nodes of this kind have children.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            NodeKind::Block | NodeKind::Array | NodeKind::Choice { .. }
        )
    }

    /// The integer encoding of numeric kinds. A flag is an unsigned
    /// big-endian number.
    pub fn number_spec(&self) -> Option<NumberSpec> {
        match self {
            NodeKind::Number(spec) => Some(*spec),
            NodeKind::Flag(bits) => Some(NumberSpec::unsigned(*bits)),
            _ => None,
        }
    }

    /// A short name for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Number(_) => "Number",
            NodeKind::Flag(_) => "Flag",
            NodeKind::String => "String",
            NodeKind::Blob => "Blob",
            NodeKind::Block => "Block",
            NodeKind::Array => "Array",
            NodeKind::Choice { .. } => "Choice",
        }
    }
}

/// The unit a size relation counts in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LengthUnit {
    /// Bits.
    Bits,
    /// Whole bytes. A trailing partial byte is not counted.
    Bytes,
}

impl LengthUnit {
    /// Convert a length in bits to this unit.
    pub fn from_bits(self, bits: u64) -> u64 {
        match self {
            LengthUnit::Bits => bits,
            LengthUnit::Bytes => bits / 8,
        }
    }

    /// Convert a length in this unit to bits.
    pub fn to_bits(self, len: u64) -> u64 {
        match self {
            LengthUnit::Bits => len,
            LengthUnit::Bytes => len * 8,
        }
    }
}

/// `sizer`'s value is the rendered length of `data`, in `unit`s.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SizeRelation {
    /// The numeric field holding the length.
    pub sizer: NodeId,
    /// The element whose length is held.
    pub data: NodeId,
    /// The unit of the length.
    pub unit: LengthUnit,
}

/// A declared dependency between two nodes. Each relation is recorded on
/// both of its nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Relation {
    /// A size relation.
    Size(SizeRelation),
}

/// Which of a node's derived values a mutation overrides.
///
/// Reset to [`MutateOverride::DEFAULT`] every iteration by
/// [`DataModel::reset_mutations`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MutateOverride(u8);

impl MutateOverride {
    /// No override: the mutated value is encoded normally and relations are
    /// still derived for nodes without a mutated value.
    pub const DEFAULT: Self = Self(0);

    /// The mutated value is relation-independent: do not re-derive it from
    /// the node's size relation.
    pub const RELATIONS: Self = Self(0x08);

    /// The mutated value is raw bits: do not re-encode it for the node's
    /// type.
    pub const TYPE_TRANSFORM: Self = Self(0x20);

    /// Whether every flag in `other` is set.
    #[inline]
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether no flag is set.
    #[inline]
    pub fn is_default(self) -> bool {
        self.0 == 0
    }
}

impl ops::BitOr for MutateOverride {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl ops::BitOrAssign for MutateOverride {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// One field or container of a format tree.
#[derive(Clone, Debug)]
pub struct Node {
    name: String,
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    mutable: bool,
    hints: BTreeMap<String, String>,
    relations: Vec<Relation>,
    default: Value,
    mutated: Option<Value>,
    flags: MutateOverride,
}

impl Node {
    pub(crate) fn new(name: String, kind: NodeKind, parent: Option<NodeId>, default: Value) -> Self {
        Self {
            name,
            kind,
            parent,
            children: Vec::new(),
            mutable: true,
            hints: BTreeMap::new(),
            relations: Vec::new(),
            default,
            mutated: None,
            flags: MutateOverride::DEFAULT,
        }
    }

    /// The node's name, unique among its siblings.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// What kind of node this is.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// The node's parent, `None` for the root and for detached nodes.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The node's children, in order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Whether mutators may target this node.
    pub fn is_mutable(&self) -> bool {
        self.mutable
    }

    /// All of the node's hints.
    pub fn hints(&self) -> &BTreeMap<String, String> {
        &self.hints
    }

    /// The value of hint `key`.
    pub fn hint(&self, key: &str) -> Option<&str> {
        self.hints.get(key).map(String::as_str)
    }

    /// The relations this node takes part in, on either side.
    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    /// The value the node was loaded with.
    pub fn default_value(&self) -> &Value {
        &self.default
    }

    /// The value set by the current iteration's mutation, if any.
    pub fn mutated_value(&self) -> Option<&Value> {
        self.mutated.as_ref()
    }

    /// The current iteration's override flags.
    pub fn mutation_flags(&self) -> MutateOverride {
        self.flags
    }
}

/// An arena-backed format tree.
///
/// # Example
///
/// ```
/// use malform::model::{DataModelBuilder, LengthUnit, NumberSpec};
///
/// # fn foo() -> malform::Result<()> {
/// let mut b = DataModelBuilder::new("Packet");
/// let root = b.root();
/// let len = b.number(root, "len", NumberSpec::unsigned(8), 0)?;
/// let body = b.blob(root, "body", &b"hello"[..])?;
/// b.size_relation(len, body, LengthUnit::Bytes)?;
/// let model = b.build();
///
/// assert_eq!(model.find("Packet.body"), Some(body));
/// assert_eq!(model.value(root)?.to_bytes(), b"\x05hello");
/// # Ok(())
/// # }
/// # foo().unwrap();
/// ```
#[derive(Clone, Debug)]
pub struct DataModel {
    nodes: Vec<Node>,
    root: NodeId,
}

impl DataModel {
    /// The root node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The node with the given id.
    ///
    /// # Panics
    ///
    /// Panics if `id` did not come from this model or a model it was cloned
    /// from.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// The node with the given id, if there is one.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// The parent of `id`.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// The children of `id`, in order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Look up a node by dotted name path. The path may start with the
    /// root's name or with one of the root's children.
    pub fn find(&self, path: &str) -> Option<NodeId> {
        let mut parts = path.split('.').peekable();
        if parts.peek() == Some(&self.node(self.root).name.as_str()) {
            parts.next();
        }
        parts.try_fold(self.root, |id, part| {
            self.children(id)
                .iter()
                .copied()
                .find(|c| self.node(*c).name == part)
        })
    }

    /// The dotted path from the root to `id`.
    pub fn full_name(&self, id: NodeId) -> String {
        let mut names = Vec::new();
        let mut cur = Some(id);
        while let Some(c) = cur {
            names.push(self.node(c).name.as_str());
            cur = self.node(c).parent;
        }
        names.reverse();
        names.join(".")
    }

    /// Whether `id` is reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut cur = id;
        loop {
            if cur == self.root {
                return true;
            }
            match self.node(cur).parent {
                Some(p) => cur = p,
                None => return false,
            }
        }
    }

    /// Whether `ancestor` is `id` or one of its ancestors.
    pub fn is_within(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut cur = Some(id);
        while let Some(c) = cur {
            if c == ancestor {
                return true;
            }
            cur = self.node(c).parent;
        }
        false
    }

    /// The size relation in which `sizer` holds the length.
    pub fn size_relation(&self, sizer: NodeId) -> Option<SizeRelation> {
        self.node(sizer).relations.iter().find_map(|r| match r {
            Relation::Size(rel) if rel.sizer == sizer => Some(*rel),
            _ => None,
        })
    }

    /// The size relations whose length is `data`'s.
    pub fn sized_by(&self, data: NodeId) -> impl Iterator<Item = SizeRelation> + '_ {
        self.node(data).relations.iter().filter_map(move |r| match r {
            Relation::Size(rel) if rel.data == data => Some(*rel),
            _ => None,
        })
    }

    /// Set `id`'s mutated value and replace its override flags.
    pub fn set_mutated(&mut self, id: NodeId, value: impl Into<Value>, flags: MutateOverride) {
        let node = self.node_mut(id);
        node.mutated = Some(value.into());
        node.flags = flags;
    }

    /// Clear every node's mutated value and override flags.
    pub fn reset_mutations(&mut self) {
        for node in &mut self.nodes {
            node.mutated = None;
            node.flags = MutateOverride::DEFAULT;
        }
    }

    /// Select the child a `Choice` node renders.
    pub fn select(&mut self, choice: NodeId, index: usize) {
        if let NodeKind::Choice { selected } = &mut self.node_mut(choice).kind {
            *selected = index;
        }
    }

    /// A name derived from `base` that no child of `parent` has yet:
    /// `base_1`, `base_2`, and so on.
    pub fn unique_child_name(&self, parent: NodeId, base: &str) -> String {
        let taken = |name: &str| {
            self.children(parent)
                .iter()
                .any(|c| self.node(*c).name == name)
        };
        (1u32..)
            .map(|i| alloc::format!("{base}_{i}"))
            .find(|name| !taken(name))
            .unwrap_or_default()
    }

    /// Deep-copy the subtree at `id` into new, detached arena slots, naming
    /// the copy `name`.
    ///
    /// Size relations inside the subtree are re-pointed at the copies. A
    /// copied sizer whose data lies outside the subtree keeps sizing the
    /// same data. Relations from outside sizers are not copied.
    pub fn clone_subtree(&mut self, id: NodeId, name: String) -> NodeId {
        let mut order = Vec::new();
        let mut stack = alloc::vec![id];
        while let Some(c) = stack.pop() {
            order.push(c);
            stack.extend(self.children(c).iter().rev().copied());
        }

        let base = self.nodes.len();
        let map: BTreeMap<NodeId, NodeId> = order
            .iter()
            .enumerate()
            .map(|(i, old)| (*old, NodeId::new(base + i)))
            .collect();

        let mut outside_data = Vec::new();
        for old in &order {
            let mut node = self.node(*old).clone();
            node.parent = if *old == id {
                None
            } else {
                node.parent.and_then(|p| map.get(&p).copied())
            };
            node.children = node.children.iter().map(|c| map[c]).collect();
            node.relations = node
                .relations
                .iter()
                .filter_map(|r| match r {
                    Relation::Size(rel) => {
                        let sizer = map.get(&rel.sizer).copied();
                        let data = map.get(&rel.data).copied();
                        match (sizer, data) {
                            (Some(sizer), Some(data)) => Some(Relation::Size(SizeRelation {
                                sizer,
                                data,
                                unit: rel.unit,
                            })),
                            (Some(sizer), None) => {
                                let copy = SizeRelation {
                                    sizer,
                                    data: rel.data,
                                    unit: rel.unit,
                                };
                                outside_data.push(copy);
                                Some(Relation::Size(copy))
                            }
                            (None, _) => None,
                        }
                    }
                })
                .collect();
            self.nodes.push(node);
        }
        for rel in outside_data {
            self.node_mut(rel.data).relations.push(Relation::Size(rel));
        }

        let copy = map[&id];
        self.node_mut(copy).name = name;
        copy
    }

    /// Insert the detached node `child` as `parent`'s `index`th child.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        debug_assert!(self.node(child).parent.is_none());
        let children = &mut self.node_mut(parent).children;
        let index = index.min(children.len());
        children.insert(index, child);
        self.node_mut(child).parent = Some(parent);
    }

    /// Remove `id` from its parent's children, returning the index it had.
    /// The node stays in the arena, unreachable from the root.
    pub fn detach(&mut self, id: NodeId) -> Option<usize> {
        let parent = self.node(id).parent?;
        let children = &mut self.node_mut(parent).children;
        let index = children.iter().position(|c| *c == id)?;
        children.remove(index);
        self.node_mut(id).parent = None;
        Some(index)
    }

    /// Replace `parent`'s child order. `order` must be a permutation of the
    /// current children.
    pub fn reorder_children(&mut self, parent: NodeId, order: Vec<NodeId>) {
        debug_assert_eq!(order.len(), self.children(parent).len());
        self.node_mut(parent).children = order;
    }

    pub(crate) fn from_parts(nodes: Vec<Node>, root: NodeId) -> Self {
        Self { nodes, root }
    }
}
