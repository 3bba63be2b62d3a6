//! Error and result types for the `malform` crate.

use alloc::boxed::Box;
use alloc::string::String;
use core::fmt;

/// A result that is either `Ok(T)` or `Err(malform::Error)`.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// An extension trait for [`malform::Result`][crate::Result] that provides
/// additional methods.
pub trait ResultExt {
    /// Ignores the error if it is [`Exhausted`][ErrorKind::Exhausted],
    /// returning `Ok(())` instead.
    ///
    /// # Examples
    ///
    /// ```
    /// use malform::{Error, Result, ResultExt};
    ///
    /// let result: Result<()> = Err(Error::exhausted());
    /// let result = result.ignore_exhausted();
    /// assert!(result.is_ok());
    /// ```
    fn ignore_exhausted(self) -> Result<()>;
}

impl<T> ResultExt for Result<T> {
    #[inline]
    fn ignore_exhausted(self) -> Result<()> {
        match self {
            Ok(_) => Ok(()),
            Err(err) if err.is_exhausted() => Ok(()),
            Err(err) => Err(err),
        }
    }
}

enum ErrorInner {
    Kind(Box<ErrorKind>),

    /// For internal usage only: break out of and early exit from candidate
    /// enumeration, after we've already applied the targeted candidate. This
    /// isn't an `ErrorKind` because we don't want to allocate for it.
    EarlyExit,
}

/// An error that can occur when using the `malform` crate.
///
/// This type is a thin wrapper around [`ErrorKind`], which contains the
/// specific kind of error that occurred.
///
/// # Examples
///
/// ```
/// use malform::{Error, ErrorKind};
///
/// let error: Error = {
///     // ...
/// #   Error::exhausted()
/// };
///
/// if error.is_exhausted() {
///     println!("move on to the next element");
/// }
///
/// match error.kind() {
///     ErrorKind::Exhausted => println!("still exhausted!"),
///     ErrorKind::InvalidHint { hint, value } => println!("bad hint {hint}={value}"),
///
///     // The `ErrorKind` type is not exhaustive, so we always need a catch-all arm.
///     unknown => println!("unknown! {unknown:?}"),
/// }
/// ```
pub struct Error {
    inner: ErrorInner,
}

impl From<ErrorKind> for Error {
    #[inline]
    fn from(kind: ErrorKind) -> Self {
        Self {
            inner: ErrorInner::Kind(Box::new(kind)),
        }
    }
}

impl From<StreamError> for Error {
    #[inline]
    fn from(e: StreamError) -> Self {
        ErrorKind::Stream(e).into()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            ErrorInner::Kind(kind) => match &**kind {
                ErrorKind::Exhausted => write!(f, "the mutation space is exhausted"),
                ErrorKind::InvalidHint { hint, value } => {
                    write!(f, "expected numerical value for hint '{hint}', found '{value}'")
                }
                ErrorKind::WordList { path, reason } => {
                    write!(f, "invalid word list file '{path}': {reason}")
                }
                ErrorKind::Unsupported { mutator, node } => {
                    write!(f, "{mutator} does not support element '{node}'")
                }
                ErrorKind::ResourceLimit { requested, limit } => write!(
                    f,
                    "mutation would materialize {requested} bytes, over the {limit} byte limit"
                ),
                ErrorKind::Stream(e) => write!(f, "stream error: {e}"),
                ErrorKind::Other(msg) => write!(f, "an unknown error occurred: {msg}"),
            },
            ErrorInner::EarlyExit => {
                write!(f, "internal error variant: early exit from candidate enumeration")
            }
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for StreamError {}

impl Error {
    #[inline]
    pub(crate) fn early_exit() -> Self {
        Self {
            inner: ErrorInner::EarlyExit,
        }
    }

    #[inline]
    pub(crate) fn is_early_exit(&self) -> bool {
        matches!(self.inner, ErrorInner::EarlyExit)
    }

    /// Returns a new error indicating that the mutation space is exhausted.
    #[must_use]
    pub fn exhausted() -> Self {
        ErrorKind::Exhausted.into()
    }

    /// Returns a new error for a hint whose value failed to parse.
    #[must_use]
    pub fn invalid_hint(hint: impl Into<String>, value: impl Into<String>) -> Self {
        ErrorKind::InvalidHint {
            hint: hint.into(),
            value: value.into(),
        }
        .into()
    }

    /// Returns a new error for a word list that could not be loaded.
    #[must_use]
    pub fn word_list(path: impl Into<String>, reason: impl Into<String>) -> Self {
        ErrorKind::WordList {
            path: path.into(),
            reason: reason.into(),
        }
        .into()
    }

    /// Returns a new error for a mutator built on an element it does not
    /// support.
    #[must_use]
    pub fn unsupported(mutator: &'static str, node: impl Into<String>) -> Self {
        ErrorKind::Unsupported {
            mutator,
            node: node.into(),
        }
        .into()
    }

    /// Returns a new error for a mutation that would materialize too many
    /// bytes.
    #[must_use]
    pub fn resource_limit(requested: u64, limit: u64) -> Self {
        ErrorKind::ResourceLimit { requested, limit }.into()
    }

    /// Returns a new error with the given message.
    #[must_use]
    pub fn other(msg: impl Into<ErrorMessage>) -> Self {
        ErrorKind::Other(msg.into()).into()
    }

    /// Returns the kind of this error.
    #[must_use]
    pub fn kind(&self) -> &ErrorKind {
        match &self.inner {
            ErrorInner::Kind(kind) => kind,
            ErrorInner::EarlyExit => unreachable!(),
        }
    }

    /// Returns `true` if the error's kind is
    /// [`Exhausted`][ErrorKind::Exhausted].
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        matches!(self.inner, ErrorInner::Kind(ref k) if matches!(**k, ErrorKind::Exhausted))
    }

    /// Returns `true` if this is a configuration error: a malformed hint or
    /// an unusable word list. These are mistakes in the format description
    /// and should abort the run.
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::InvalidHint { .. } | ErrorKind::WordList { .. }
        )
    }

    /// Returns `true` if the error's kind is
    /// [`ResourceLimit`][ErrorKind::ResourceLimit].
    #[must_use]
    pub fn is_resource_limit(&self) -> bool {
        matches!(self.kind(), ErrorKind::ResourceLimit { .. })
    }
}

/// The kind of an error that can occur when using the `malform` crate.
///
/// This enum is not exhaustive, and new variants may be added in the future.
#[non_exhaustive]
#[derive(Debug)]
pub enum ErrorKind {
    /// The mutation cursor is at or past the last candidate.
    ///
    /// This is a control-flow signal: the strategy should move on to its next
    /// target element.
    Exhausted,

    /// A hint's value failed to parse.
    InvalidHint {
        /// The hint's name, e.g. `NumericalVarianceMutator-N`.
        hint: String,
        /// The offending value.
        value: String,
    },

    /// A word list file could not be loaded.
    WordList {
        /// The path named by the hint.
        path: String,
        /// Why it could not be loaded.
        reason: String,
    },

    /// A mutator was built for an element it does not support.
    Unsupported {
        /// The mutator's name.
        mutator: &'static str,
        /// The element's full name.
        node: String,
    },

    /// A single mutation would materialize more bytes than allowed.
    ResourceLimit {
        /// Bytes the mutation needed.
        requested: u64,
        /// The configured ceiling.
        limit: u64,
    },

    /// A stream was misused.
    Stream(StreamError),

    /// Some other error occurred.
    Other(ErrorMessage),
}

impl From<Error> for ErrorKind {
    #[inline]
    fn from(err: Error) -> Self {
        match err.inner {
            ErrorInner::Kind(kind) => *kind,
            ErrorInner::EarlyExit => unreachable!(),
        }
    }
}

/// Ways a [`Stream`][crate::stream::Stream] can be misused.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamError {
    /// A seek landed before the start of the stream.
    SeekBeforeStart,

    /// More than 64 bits were requested in a single bit read or write.
    TooManyBits(u32),

    /// A read asked for bits past the end of the stream.
    ReadPastEnd {
        /// Bit position of the read.
        position: u64,
        /// Bits requested.
        requested: u32,
    },
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::SeekBeforeStart => {
                write!(f, "attempted to move the position before the beginning of the stream")
            }
            StreamError::TooManyBits(n) => write!(f, "cannot transfer {n} bits at once (max 64)"),
            StreamError::ReadPastEnd {
                position,
                requested,
            } => write!(f, "reading {requested} bits at bit {position} runs past the end"),
        }
    }
}

/// A message that can be attached to an error.
///
/// This should only be used with `ErrorKind::Other` and in situations where
/// there is not a more-specific error kind to use.
///
/// # Examples
///
/// ```
/// use malform::ErrorMessage;
///
/// let msg = ErrorMessage::new("something went wrong");
/// assert_eq!(msg.as_str(), "something went wrong");
/// ```
#[derive(Debug)]
pub struct ErrorMessage {
    inner: alloc::borrow::Cow<'static, str>,
}

impl ErrorMessage {
    /// Returns a new error message with the given string.
    #[must_use]
    pub fn new(msg: impl Into<ErrorMessage>) -> Self {
        msg.into()
    }

    /// Returns the message as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.inner
    }
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&'static str> for ErrorMessage {
    #[inline]
    fn from(s: &'static str) -> Self {
        Self {
            inner: alloc::borrow::Cow::Borrowed(s),
        }
    }
}

impl From<String> for ErrorMessage {
    #[inline]
    fn from(s: String) -> Self {
        Self { inner: s.into() }
    }
}
