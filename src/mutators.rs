//! The provided mutators and the [`MutatorKind`] registry.
//!
//! Each mutator targets one node and precomputes its candidates when it is
//! built. Most can be tuned with a `"<Name>-N"` hint on the target node, for
//! example `NumericalVarianceMutator-N = 10`. A hint value that is not an
//! integer is a configuration error.
//!
//! It is idiomatic to import this module with the alias `m`:
//!
//! ```rust
//! use malform::mutators as m;
//! ```

use crate::model::{DataModel, NodeId};
use crate::{Error, Limits, Mutation, Result};
use alloc::boxed::Box;
use alloc::format;

mod array;
mod blob;
mod element;
mod numeric;
mod sized;
mod string;
mod values;

pub use array::{ArrayNumericalEdgeCases, ArrayRandomizeOrder, ArrayReverseOrder, ArrayVariance};
pub use blob::{Blob, BlobBitFlipper, BlobDwordSlider};
pub use element::{DataElementDuplicate, DataElementRemove, DataElementSwapNearNodes};
pub use numeric::{FiniteRandomNumbers, NumericalEdgeCase, NumericalVariance};
pub use sized::{SizePolicy, SizedData, SizedDeltas};
pub use string::StringCase;
pub use values::{ValidValues, WordList};

macro_rules! mutator_kinds {
    ( $( $(#[$attr:meta])* $variant:ident => $name:literal ; )* ) => {
        /// Every mutator this crate provides.
        ///
        /// The strategy asks [`supported`][MutatorKind::supported] for each
        /// kind before building one for a node.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum MutatorKind {
            $(
                $(#[$attr])*
                $variant,
            )*
        }

        impl MutatorKind {
            /// All kinds, in registry order.
            pub const ALL: &'static [MutatorKind] = &[ $( MutatorKind::$variant, )* ];

            /// The mutator's name, also the prefix of its `-N` hint.
            pub fn name(self) -> &'static str {
                match self {
                    $( MutatorKind::$variant => $name, )*
                }
            }

            /// Look a kind up by its name.
            pub fn from_name(name: &str) -> Option<MutatorKind> {
                MutatorKind::ALL.iter().copied().find(|k| k.name() == name)
            }
        }
    };
}

mutator_kinds! {
    /// `default ± [0..N]` for wide numbers and numeric strings.
    NumericalVariance => "NumericalVarianceMutator";
    /// Boundary values for the field's width.
    NumericalEdgeCase => "NumericalEdgeCaseMutator";
    /// `N` random values in the field's range.
    FiniteRandomNumbers => "FiniteRandomNumbersMutator";
    /// Array element counts around the current count.
    ArrayVariance => "ArrayVarianceMutator";
    /// Array element counts at numeric boundaries.
    ArrayNumericalEdgeCases => "ArrayNumericalEdgeCasesMutator";
    /// Reverse an array's elements.
    ArrayReverseOrder => "ArrayReverseOrderMutator";
    /// Shuffle an array's elements.
    ArrayRandomizeOrder => "ArrayRandomizeOrderMutator";
    /// Structural blob changes: expand, reduce, overwrite ranges.
    Blob => "BlobMutator";
    /// Flip single bits of a blob.
    BlobBitFlipper => "BlobBitFlipperMutator";
    /// Slide a `0xFFFFFFFF` window across a blob.
    BlobDwordSlider => "BlobDWORDSliderMutator";
    /// Grow or shrink sized data by `[-N, N]`, keeping its sizer honest.
    SizedVariance => "SizedVarianceMutator";
    /// Grow or shrink sized data by boundary deltas, keeping its sizer
    /// honest.
    SizedNumericalEdgeCases => "SizedNumericalEdgeCasesMutator";
    /// Forge a sizer off by `[-N, N]`, leaving the data alone.
    SizedDataVariance => "SizedDataVarianceMutator";
    /// Forge a sizer off by boundary deltas, leaving the data alone.
    SizedDataNumericalEdgeCases => "SizedDataNumericalEdgeCasesMutator";
    /// Lower, upper and random case.
    StringCase => "StringCaseMutator";
    /// Values listed in a `ValidValues` hint.
    ValidValues => "ValidValuesMutator";
    /// Lines of the file named by a `WordList` hint.
    WordList => "WordListMutator";
    /// Insert copies of an element after it.
    DataElementDuplicate => "DataElementDuplicateMutator";
    /// Remove an element.
    DataElementRemove => "DataElementRemoveMutator";
    /// Swap an element with its next sibling.
    DataElementSwapNearNodes => "DataElementSwapNearNodesMutator";
}

impl MutatorKind {
    /// Whether this kind applies to `node`. Side-effect free.
    pub fn supported(self, model: &DataModel, node: NodeId) -> bool {
        if model.get(node).is_none() {
            return false;
        }
        match self {
            MutatorKind::NumericalVariance | MutatorKind::FiniteRandomNumbers => {
                numeric::supported(model, node)
            }
            MutatorKind::NumericalEdgeCase => numeric::supported_edge_case(model, node),
            MutatorKind::ArrayVariance | MutatorKind::ArrayNumericalEdgeCases => {
                array::supported(model, node)
            }
            MutatorKind::ArrayReverseOrder | MutatorKind::ArrayRandomizeOrder => {
                array::supported_reorder(model, node)
            }
            MutatorKind::Blob | MutatorKind::BlobBitFlipper => blob::supported(model, node),
            MutatorKind::BlobDwordSlider => blob::supported_slider(model, node),
            MutatorKind::SizedVariance
            | MutatorKind::SizedNumericalEdgeCases
            | MutatorKind::SizedDataVariance
            | MutatorKind::SizedDataNumericalEdgeCases => sized::supported(model, node),
            MutatorKind::StringCase => string::supported(model, node),
            MutatorKind::ValidValues => values::supported_valid_values(model, node),
            MutatorKind::WordList => values::supported_word_list(model, node),
            MutatorKind::DataElementDuplicate => element::supported_duplicate(model, node),
            MutatorKind::DataElementRemove => element::supported_remove(model, node),
            MutatorKind::DataElementSwapNearNodes => element::supported_swap(model, node),
        }
    }

    /// Build this kind of mutator for `node`, precomputing its candidates.
    ///
    /// Fails with [`ErrorKind::Unsupported`][crate::ErrorKind::Unsupported]
    /// if [`supported`][MutatorKind::supported] is false, and with a
    /// configuration error for malformed hints or unreadable word lists.
    pub fn build(self, model: &DataModel, node: NodeId, limits: Limits) -> Result<Mutation> {
        if !self.supported(model, node) {
            return Err(Error::unsupported(self.name(), model.full_name(node)));
        }

        let mutator: Box<dyn crate::Mutate> = match self {
            MutatorKind::NumericalVariance => Box::new(NumericalVariance::new(model, node)?),
            MutatorKind::NumericalEdgeCase => Box::new(NumericalEdgeCase::new(model, node)?),
            MutatorKind::FiniteRandomNumbers => Box::new(FiniteRandomNumbers::new(model, node)?),
            MutatorKind::ArrayVariance => Box::new(ArrayVariance::new(model, node)?),
            MutatorKind::ArrayNumericalEdgeCases => {
                Box::new(ArrayNumericalEdgeCases::new(model, node)?)
            }
            MutatorKind::ArrayReverseOrder => Box::new(ArrayReverseOrder::new()),
            MutatorKind::ArrayRandomizeOrder => Box::new(ArrayRandomizeOrder::new(model, node)?),
            MutatorKind::Blob => Box::new(Blob::new()),
            MutatorKind::BlobBitFlipper => Box::new(BlobBitFlipper::new(model, node)?),
            MutatorKind::BlobDwordSlider => Box::new(BlobDwordSlider::new(model, node)?),
            MutatorKind::SizedVariance => Box::new(SizedData::new(
                model,
                node,
                SizedDeltas::Variance,
                SizePolicy::Preserve,
            )?),
            MutatorKind::SizedNumericalEdgeCases => Box::new(SizedData::new(
                model,
                node,
                SizedDeltas::EdgeCases,
                SizePolicy::Preserve,
            )?),
            MutatorKind::SizedDataVariance => Box::new(SizedData::new(
                model,
                node,
                SizedDeltas::Variance,
                SizePolicy::Forge,
            )?),
            MutatorKind::SizedDataNumericalEdgeCases => Box::new(SizedData::new(
                model,
                node,
                SizedDeltas::EdgeCases,
                SizePolicy::Forge,
            )?),
            MutatorKind::StringCase => Box::new(StringCase::new()),
            MutatorKind::ValidValues => Box::new(ValidValues::new(model, node)?),
            MutatorKind::WordList => Box::new(WordList::new(model, node)?),
            MutatorKind::DataElementDuplicate => Box::new(DataElementDuplicate::new()),
            MutatorKind::DataElementRemove => Box::new(DataElementRemove::new()),
            MutatorKind::DataElementSwapNearNodes => Box::new(DataElementSwapNearNodes::new()),
        };

        crate::log::debug!(
            "built {} for {} with {} candidates",
            self.name(),
            model.full_name(node),
            mutator.count()
        );
        Ok(Mutation::new(mutator, node, limits))
    }
}

/// The largest `N` a `"<mutator>-N"` hint may ask for. Candidate sets built
/// from `N` are materialized up front, so larger values are rejected.
pub const MAX_HINT_N: u32 = 1 << 16;

/// The `N` a node's `"<mutator>-N"` hint asks for, or `default`.
///
/// Negative values mean zero. Values above [`MAX_HINT_N`] are an
/// [`ErrorKind::InvalidHint`](crate::ErrorKind::InvalidHint).
pub(crate) fn hint_n(model: &DataModel, node: NodeId, mutator: &str, default: u32) -> Result<u32> {
    let key = format!("{mutator}-N");
    let Some(value) = model.node(node).hint(&key) else {
        return Ok(default);
    };
    let n: i64 = value
        .trim()
        .parse()
        .map_err(|_| Error::invalid_hint(key.as_str(), value))?;
    if n > i64::from(MAX_HINT_N) {
        return Err(Error::invalid_hint(key.as_str(), value));
    }
    Ok(n.max(0) as u32)
}

/// A candidate count from a collection length.
pub(crate) fn count_of(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}
