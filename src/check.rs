//! A small framework for checking properties of mutators.
//!
//! The primary entry point for this framework is the [`Check`] type.
//!
//! A check applies a mutator to fresh clones of a template model, either at
//! every sequential cursor or at a number of random draws, and calls a
//! property with the template and the mutated clone after each application.
//! It is designed for smoke tests inside `#[test]` functions: it runs
//! quickly and reports the first failing cursor.
//!
//! # Example
//!
//! ```
//! # fn foo() -> malform::Result<()> {
//! use malform::check::Check;
//! use malform::model::DataModelBuilder;
//! use malform::{MutatorKind, Session};
//!
//! let mut b = DataModelBuilder::new("Msg");
//! let root = b.root();
//! let greeting = b.string(root, "greeting", "Hello")?;
//! let template = b.build();
//!
//! let mut m = Session::new().mutator(MutatorKind::StringCase, &template, greeting)?;
//! let result = Check::new().sequential(&mut m, &template, |_template, model| {
//!     match model.value(greeting) {
//!         Ok(v) if v.len_bytes() == 5 => Ok(()),
//!         Ok(_) => Err("re-casing changed the length".to_string()),
//!         Err(e) => Err(e.to_string()),
//!     }
//! });
//! assert!(result.is_ok());
//! # Ok(())
//! # }
//! # foo().unwrap();
//! ```

use crate::model::DataModel;
use crate::{Error, Mutate, Mutation, Rng};
use std::panic;
use std::prelude::v1::*;

/// The result of running a check.
///
/// If the check passes, this is `Ok(())`.
///
/// If the property does not hold for some application, this is
/// `Err(CheckError::Failed(_))` with the mutated model and a message.
///
/// If applying the mutator itself fails, for example because a mutation goes
/// over the resource limits, this is `Err(CheckError::Error(_))`.
pub type CheckResult = std::result::Result<(), CheckError>;

/// An error when running a `Check`.
#[derive(Debug)]
pub enum CheckError {
    /// The property does not hold for an application of the mutator.
    Failed(CheckFailure),

    /// An error occurred while applying the mutator.
    Error(Error),
}

impl From<Error> for CheckError {
    fn from(v: Error) -> Self {
        Self::Error(v)
    }
}

impl From<CheckFailure> for CheckError {
    fn from(v: CheckFailure) -> Self {
        Self::Failed(v)
    }
}

impl core::fmt::Display for CheckError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CheckError::Failed(failure) => {
                write!(f, "{} failed", failure.mutator)?;
                if let Some(cursor) = failure.cursor {
                    write!(f, " at cursor {cursor}")?;
                }
                write!(f, ": {}", failure.message)
            }
            CheckError::Error(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CheckError {}

impl CheckError {
    /// Unwrap the underlying `CheckError::Failed(_)` payload, panicking if this
    /// is not a `CheckError::Failed`.
    #[track_caller]
    pub fn unwrap_failed(self) -> CheckFailure {
        match self {
            CheckError::Failed(f) => f,
            _ => panic!("CheckError::unwrap_failed called on non-failed CheckError"),
        }
    }

    /// Unwrap the underlying `CheckError::Error(_)` payload, panicking if this
    /// is not a `CheckError::Error(_)`.
    #[track_caller]
    pub fn unwrap_error(self) -> Error {
        match self {
            CheckError::Error(e) => e,
            _ => panic!("CheckError::unwrap_error called on non-error CheckError"),
        }
    }
}

/// A property failure.
#[derive(Debug)]
#[non_exhaustive]
pub struct CheckFailure {
    /// The mutator's name.
    pub mutator: &'static str,

    /// The failing cursor, for sequential checks.
    pub cursor: Option<u32>,

    /// The mutated model the property rejected.
    pub model: DataModel,

    /// The failure message.
    pub message: String,
}

/// A check that can be run to test a property of a mutator.
#[derive(Debug)]
pub struct Check {
    iters: usize,
    seed: u64,
}

impl Default for Check {
    fn default() -> Check {
        Check::new()
    }
}

impl Check {
    /// Create a new `Check`.
    pub fn new() -> Check {
        Check {
            iters: 1000,
            seed: 0,
        }
    }

    /// Configure the number of random applications
    /// [`random`][Check::random] makes.
    pub fn iters(&mut self, iters: usize) -> &mut Check {
        self.iters = iters;
        self
    }

    /// Configure the seed [`random`][Check::random] draws with.
    pub fn seed(&mut self, seed: u64) -> &mut Check {
        self.seed = seed;
        self
    }

    /// Apply every sequential cursor of `mutation` to a fresh clone of
    /// `template` and check `property(template, mutated)` after each.
    ///
    /// The mutation's cursor is restored afterwards.
    pub fn sequential<M, S>(
        &self,
        mutation: &mut Mutation<M>,
        template: &DataModel,
        mut property: impl FnMut(&DataModel, &DataModel) -> std::result::Result<(), S>,
    ) -> CheckResult
    where
        M: Mutate,
        S: ToString,
    {
        let saved = mutation.mutation();
        let result = (0..mutation.count()).try_for_each(|cursor| {
            mutation.set_mutation(cursor);
            let mut model = template.clone();
            mutation.sequential_mutation(&mut model)?;
            check_one(mutation.name(), Some(cursor), template, model, &mut property)
        });
        mutation.set_mutation(saved);
        result
    }

    /// Apply `iters` random candidates of `mutation`, each to a fresh clone
    /// of `template`, and check `property(template, mutated)` after each.
    pub fn random<M, S>(
        &self,
        mutation: &mut Mutation<M>,
        template: &DataModel,
        mut property: impl FnMut(&DataModel, &DataModel) -> std::result::Result<(), S>,
    ) -> CheckResult
    where
        M: Mutate,
        S: ToString,
    {
        let mut rng = Rng::new(self.seed);
        for _ in 0..self.iters {
            let mut model = template.clone();
            match mutation.random_mutation(&mut model, &mut rng) {
                Ok(()) => {}
                Err(e) if e.is_exhausted() => return Ok(()),
                Err(e) => return Err(e.into()),
            }
            check_one(mutation.name(), None, template, model, &mut property)?;
        }
        Ok(())
    }
}

fn check_one<S>(
    mutator: &'static str,
    cursor: Option<u32>,
    template: &DataModel,
    model: DataModel,
    property: &mut impl FnMut(&DataModel, &DataModel) -> std::result::Result<(), S>,
) -> CheckResult
where
    S: ToString,
{
    let message = match panic::catch_unwind(panic::AssertUnwindSafe(|| property(template, &model))) {
        Ok(Ok(())) => return Ok(()),
        Ok(Err(message)) => message.to_string(),
        Err(_) => "<panicked>".to_string(),
    };
    eprintln!("{mutator} failed at cursor {cursor:?}: {message}");
    Err(CheckFailure {
        mutator,
        cursor,
        model,
        message,
    }
    .into())
}
