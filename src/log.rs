#![allow(unused_macros, unused_imports)]

#[cfg(feature = "log")]
pub(crate) use ::log::{debug, error, info, trace, warn};

#[cfg(not(feature = "log"))]
macro_rules! debug {
    ($($tt:tt)*) => {};
}
#[cfg(not(feature = "log"))]
pub(crate) use debug;

#[cfg(not(feature = "log"))]
macro_rules! error {
    ($($tt:tt)*) => {};
}
#[cfg(not(feature = "log"))]
pub(crate) use error;

#[cfg(not(feature = "log"))]
macro_rules! info {
    ($($tt:tt)*) => {};
}
#[cfg(not(feature = "log"))]
pub(crate) use info;

#[cfg(not(feature = "log"))]
macro_rules! trace {
    ($($tt:tt)*) => {};
}
#[cfg(not(feature = "log"))]
pub(crate) use trace;

#[cfg(not(feature = "log"))]
macro_rules! warn_impl {
    ($($tt:tt)*) => {};
}
#[cfg(not(feature = "log"))]
pub(crate) use warn_impl as warn;

/// Log the concrete change a candidate applies to a node, prefixed with the
/// mutator's name and the node's full name.
macro_rules! applied {
    ($mutator:expr, $model:expr, $node:expr, $($fmt:tt)*) => {
        $crate::log::debug!(
            "{}: {}: {}",
            $mutator,
            $model.full_name($node),
            ::core::format_args!($($fmt)*)
        )
    };
}
pub(crate) use applied;

/// Log a candidate that was left unapplied because the node cannot take it.
macro_rules! skipped {
    ($mutator:expr, $model:expr, $node:expr, $($fmt:tt)*) => {
        $crate::log::warn!(
            "{}: {}: leaving unmodified: {}",
            $mutator,
            $model.full_name($node),
            ::core::format_args!($($fmt)*)
        )
    };
}
pub(crate) use skipped;
