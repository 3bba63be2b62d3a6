#![doc = include_str!("../README.md")]
#![no_std]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

#[cfg(feature = "std")]
#[macro_use]
extern crate std;

pub mod _guide;
pub mod error;
mod log;
pub mod model;
pub mod mutators;
pub mod numbers;
mod rng;
pub mod stream;
pub mod value;

#[cfg(feature = "check")]
pub mod check;

use alloc::boxed::Box;
use alloc::vec::Vec;

pub use error::{Error, ErrorKind, ErrorMessage, Result, ResultExt};
pub use model::{DataModel, NodeId};
pub use mutators::MutatorKind;
pub use rng::Rng;
pub use value::Value;

/// Resource ceilings for a single mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limits {
    /// The most bytes one mutation may produce for a node. Expansions that
    /// would go over fail with
    /// [`ErrorKind::ResourceLimit`][crate::ErrorKind::ResourceLimit].
    pub max_materialized_bytes: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_materialized_bytes: 64 * 1024 * 1024,
        }
    }
}

/// A fuzzing run's mutation context and its configuration.
///
/// A session owns the random source every random mutation draws from and the
/// [`Limits`] handed to the mutator instances it builds. Seed it to make a
/// campaign reproducible.
///
/// # Example
///
/// ```
/// # fn foo() -> malform::Result<()> {
/// use malform::model::{DataModelBuilder, NumberSpec};
/// use malform::Session;
///
/// let mut b = DataModelBuilder::new("Msg");
/// let root = b.root();
/// let port = b.number(root, "port", NumberSpec::unsigned(16), 8080)?;
/// let template = b.build();
///
/// let mut session = Session::new()
///     // Configure the RNG seed, changing which random mutations are chosen.
///     .seed(0x12345678);
///
/// // Every mutator that applies to `port`.
/// let mut mutations = session.mutators(&template, port)?;
///
/// for m in &mut mutations {
///     // Each test case mutates a fresh clone of the template.
///     let mut model = template.clone();
///     session.random_mutation(m, &mut model)?;
///     println!("{}: port is {:?}", m.name(), model.internal_value(port)?);
/// }
/// # Ok(())
/// # }
/// # foo().unwrap();
/// ```
#[derive(Debug)]
pub struct Session {
    rng: Rng,
    limits: Limits,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Create a new, default `Session`.
    pub fn new() -> Self {
        Self {
            rng: Rng::default(),
            limits: Limits::default(),
        }
    }

    /// Set the seed for the random number generator.
    pub fn seed(mut self, seed: u64) -> Self {
        self.rng = Rng::new(seed);
        self
    }

    /// Set the most bytes a single mutation may produce.
    ///
    /// Defaults to 64 MiB.
    pub fn max_materialized_bytes(mut self, bytes: u64) -> Self {
        self.limits.max_materialized_bytes = bytes;
        self
    }

    /// Reset the random number generator to `seed`, to replay a campaign.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = Rng::new(seed);
    }

    /// This session's random number generator.
    pub fn rng(&mut self) -> &mut Rng {
        &mut self.rng
    }

    /// This session's resource limits.
    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Build a `kind` mutator for `node`.
    ///
    /// Fails with [`ErrorKind::Unsupported`] if `kind` does not apply to the
    /// node, and with a configuration error if the node's hints are
    /// malformed.
    pub fn mutator(&self, kind: MutatorKind, model: &DataModel, node: NodeId) -> Result<Mutation> {
        kind.build(model, node, self.limits)
    }

    /// Build every mutator that applies to `node`, in [`MutatorKind::ALL`]
    /// order.
    pub fn mutators(&self, model: &DataModel, node: NodeId) -> Result<Vec<Mutation>> {
        MutatorKind::ALL
            .iter()
            .filter(|kind| kind.supported(model, node))
            .map(|kind| kind.build(model, node, self.limits))
            .collect()
    }

    /// Apply one random candidate of `mutation` to `model`, drawing from
    /// this session's generator.
    pub fn random_mutation<M>(&mut self, mutation: &mut Mutation<M>, model: &mut DataModel) -> Result<()>
    where
        M: Mutate,
    {
        mutation.random_mutation(model, &mut self.rng)
    }
}

/// The context for the current mutation.
///
/// Every candidate mutation, which is a closure that will perform its
/// associated changes when invoked, is given a context. It carries the
/// random source for this application (the session's in random mode, one
/// derived from the cursor in sequential mode) and the resource limits.
#[derive(Debug)]
pub struct Context<'a> {
    rng: &'a mut Rng,
    limits: Limits,
}

impl<'a> Context<'a> {
    #[cfg(test)]
    pub(crate) fn for_test(rng: &'a mut Rng) -> Self {
        Context {
            rng,
            limits: Limits::default(),
        }
    }

    /// Get this context's random number generator.
    #[inline]
    #[must_use]
    pub fn rng(&mut self) -> &mut Rng {
        self.rng
    }

    /// The resource limits for this mutation.
    #[inline]
    #[must_use]
    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Check that producing `bytes` bytes stays within
    /// [`Limits::max_materialized_bytes`].
    pub fn reserve(&self, bytes: u64) -> Result<()> {
        let limit = self.limits.max_materialized_bytes;
        if bytes > limit {
            log::error!("refusing to materialize {bytes} bytes (limit {limit})");
            return Err(Error::resource_limit(bytes, limit));
        }
        Ok(())
    }
}

#[derive(Clone, Copy)]
enum Phase {
    Count(u32),
    Mutate { current: u32, target: u32 },
}

/// The set of candidate mutations a mutator can apply to its node.
///
/// This type is used by mutators to register the candidates they can
/// perform. It is passed to the [`Mutate::mutate`] trait method.
pub struct Candidates<'a> {
    context: Context<'a>,
    phase: Phase,
    applied_mutation: bool,
}

impl<'a> Candidates<'a> {
    /// Register a candidate mutation.
    ///
    /// `f` should be a closure that performs the mutation on the model that
    /// was passed to `Mutate::mutate`. Candidates are numbered in
    /// registration order; the one matching the cursor (or the random
    /// draw) is invoked, and the rest are skipped.
    ///
    /// See the [`Mutate::mutate`] trait method documentation for more
    /// information on this method's use.
    #[inline]
    pub fn mutation(&mut self, f: impl FnOnce(&mut Context) -> Result<()>) -> Result<()> {
        match &mut self.phase {
            Phase::Count(count) => {
                *count += 1;
                Ok(())
            }
            Phase::Mutate { current, target } => {
                assert!(
                    *current <= *target,
                    "{current} <= {target}; did you forget to `?`-propagate the \
                     result of a `Candidates::mutation` call?",
                );
                if *current == *target {
                    self.applied_mutation = true;
                    f(&mut self.context)?;
                    Err(Error::early_exit())
                } else {
                    *current += 1;
                    Ok(())
                }
            }
        }
    }
}

/// A mutator bound to one node: a fixed, numbered set of candidate
/// mutations.
///
/// Instances are built by [`MutatorKind::build`], which precomputes the
/// candidates from the node's state and hints. Applying a candidate goes
/// through [`Mutation`], which owns the cursor.
///
/// # Implementing `Mutate`
///
/// ```
/// use malform::{Candidates, DataModel, Mutate, NodeId, Result};
/// use malform::model::MutateOverride;
///
/// /// Replace a number with each of a few magic values.
/// struct Magic(Vec<i128>);
///
/// impl Mutate for Magic {
///     fn name(&self) -> &'static str {
///         "MagicMutator"
///     }
///
///     fn count(&self) -> u32 {
///         self.0.len() as u32
///     }
///
///     fn mutate(&mut self, c: &mut Candidates<'_>, model: &mut DataModel, node: NodeId) -> Result<()> {
///         for v in &self.0 {
///             c.mutation(|_ctx| {
///                 model.set_mutated(node, *v, MutateOverride::DEFAULT);
///                 Ok(())
///             })?;
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Mutate {
    /// The mutator's name, also the prefix of its `-N` hint.
    fn name(&self) -> &'static str;

    /// The number of candidates. Must be stable for the instance's
    /// lifetime.
    fn count(&self) -> u32;

    /// Register every candidate by invoking
    /// [`c.mutation(...)`][Candidates::mutation] with a closure that
    /// performs it on `model`.
    ///
    /// Implementations must only modify `model` from inside a registered
    /// closure, and must register exactly [`count`][Mutate::count]
    /// candidates in the same order every time, whatever the model's
    /// current state. A candidate that does not fit the node it finds must
    /// still be registered; its closure leaves the node unmodified.
    ///
    /// Under the hood candidates are enumerated until the targeted one is
    /// reached, it is invoked, and enumeration stops early.
    fn mutate(&mut self, c: &mut Candidates<'_>, model: &mut DataModel, node: NodeId) -> Result<()>;
}

fn _static_assert_object_safety(_: &dyn Mutate) {}

impl<M> Mutate for &mut M
where
    M: Mutate + ?Sized,
{
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn count(&self) -> u32 {
        (**self).count()
    }

    fn mutate(&mut self, c: &mut Candidates<'_>, model: &mut DataModel, node: NodeId) -> Result<()> {
        (**self).mutate(c, model, node)
    }
}

impl<M> Mutate for Box<M>
where
    M: Mutate + ?Sized,
{
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn count(&self) -> u32 {
        (**self).count()
    }

    fn mutate(&mut self, c: &mut Candidates<'_>, model: &mut DataModel, node: NodeId) -> Result<()> {
        (**self).mutate(c, model, node)
    }
}

/// A mutator instance for one (test case, node) pair, with its cursor.
///
/// In sequential mode the strategy walks the cursor from `0` to
/// [`count`][Mutation::count], calling
/// [`sequential_mutation`][Mutation::sequential_mutation] on a fresh clone
/// of the template each time. The same cursor always produces the same
/// bytes, so a campaign can resume from a saved cursor.
///
/// # Example
///
/// ```
/// # fn foo() -> malform::Result<()> {
/// use malform::model::DataModelBuilder;
/// use malform::{MutatorKind, Session};
///
/// let mut b = DataModelBuilder::new("Msg");
/// let root = b.root();
/// let greeting = b.string(root, "greeting", "Hello")?;
/// let template = b.build();
///
/// let session = Session::new();
/// let mut m = session.mutator(MutatorKind::StringCase, &template, greeting)?;
///
/// let mut seen = vec![];
/// for cursor in 0..m.count() {
///     m.set_mutation(cursor);
///     let mut model = template.clone();
///     m.sequential_mutation(&mut model)?;
///     seen.push(model.value(greeting)?.to_bytes());
/// }
/// assert_eq!(seen[0], b"hello");
/// assert_eq!(seen[1], b"HELLO");
///
/// // Past the last candidate, the space is exhausted.
/// m.set_mutation(m.count());
/// assert!(m.sequential_mutation(&mut template.clone()).unwrap_err().is_exhausted());
/// # Ok(())
/// # }
/// # foo().unwrap();
/// ```
pub struct Mutation<M = Box<dyn Mutate>> {
    mutator: M,
    node: NodeId,
    count: u32,
    cursor: u32,
    limits: Limits,
}

impl<M> core::fmt::Debug for Mutation<M>
where
    M: Mutate,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Mutation")
            .field("mutator", &self.mutator.name())
            .field("node", &self.node)
            .field("count", &self.count)
            .field("cursor", &self.cursor)
            .finish()
    }
}

impl<M> Mutation<M>
where
    M: Mutate,
{
    /// Bind `mutator` to `node`.
    pub fn new(mutator: M, node: NodeId, limits: Limits) -> Self {
        let count = mutator.count();
        Self {
            mutator,
            node,
            count,
            cursor: 0,
            limits,
        }
    }

    /// The mutator's name.
    pub fn name(&self) -> &'static str {
        self.mutator.name()
    }

    /// The target node.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// The number of candidates.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// The cursor: the candidate the next sequential mutation applies.
    pub fn mutation(&self) -> u32 {
        self.cursor
    }

    /// Move the cursor.
    pub fn set_mutation(&mut self, cursor: u32) {
        self.cursor = cursor;
    }

    /// The underlying mutator.
    pub fn mutator(&self) -> &M {
        &self.mutator
    }

    /// Apply the candidate at the cursor.
    ///
    /// Fails with [`ErrorKind::Exhausted`], leaving `model` untouched, when
    /// the cursor is at or past [`count`][Mutation::count]. The cursor is not
    /// advanced.
    pub fn sequential_mutation(&mut self, model: &mut DataModel) -> Result<()> {
        if self.cursor >= self.count {
            log::trace!("{}: cursor {} is exhausted", self.name(), self.cursor);
            return Err(Error::exhausted());
        }
        let mut rng = Rng::for_candidate(self.cursor);
        self.apply(model, &mut rng, self.cursor)
    }

    /// Apply one candidate drawn with `rng`.
    pub fn random_mutation(&mut self, model: &mut DataModel, rng: &mut Rng) -> Result<()> {
        let Some(target) = rng.gen_index(self.count as usize) else {
            log::trace!("{}: no candidates", self.name());
            return Err(Error::exhausted());
        };
        self.apply(model, rng, target as u32)
    }

    fn apply(&mut self, model: &mut DataModel, rng: &mut Rng, target: u32) -> Result<()> {
        log::trace!(
            "=== {}: applying candidate {target} of {} to {} ===",
            self.name(),
            self.count,
            model.full_name(self.node)
        );
        debug_assert!(target < self.count);

        let mut candidates = Candidates {
            context: Context {
                rng,
                limits: self.limits,
            },
            phase: Phase::Count(0),
            applied_mutation: false,
        };

        if cfg!(debug_assertions) {
            self.mutator.mutate(&mut candidates, model, self.node)?;
            let counted = match candidates.phase {
                Phase::Count(n) => n,
                Phase::Mutate { .. } => unreachable!(),
            };
            log::trace!("counted {counted} candidates");
            assert_eq!(
                counted, self.count,
                "{} registered {counted} candidates but reported a count of {}. \
                 Mutators must register the same candidates every time.",
                self.name(),
                self.count,
            );
        }

        candidates.phase = Phase::Mutate { current: 0, target };
        match self.mutator.mutate(&mut candidates, model, self.node) {
            Err(e) if e.is_early_exit() => {
                log::trace!("mutation applied successfully");
                Ok(())
            }

            Err(e) => {
                log::error!("failed to apply mutation: {e}");
                Err(e)
            }

            // We should have found the target candidate, applied it, and
            // then broken out of enumeration by returning an early-exit
            // error. Either enumeration is nondeterministic or a mutator is
            // missing a `?` and is failing to propagate the early-exit error
            // to us. Differentiate between these two cases via the
            // `applied_mutation` flag.
            Ok(()) if candidates.applied_mutation => {
                panic!(
                    "We applied a mutation but did not receive an early-exit error \
                     from the mutator. This means that errors are not always being \
                     propagated, for example a `?` is missing from a call to the \
                     `Candidates::mutation` method. Errors must be propagated \
                     in `Mutate::mutate` method implementations; failure to do \
                     so can lead to bugs, panics, and degraded performance.",
                )
            }
            Ok(()) => {
                let current = match candidates.phase {
                    Phase::Mutate { current, .. } => current,
                    Phase::Count(_) => unreachable!(),
                };
                panic!(
                    "Nondeterministic mutator implementation: did not enumerate the \
                     same set of candidates for the same node! Expected {} candidates \
                     but only found {current}. Mutators must be deterministic.",
                    self.count,
                )
            }
        }
    }
}
