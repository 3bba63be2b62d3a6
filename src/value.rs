//! The tagged values carried by data model nodes.

use crate::stream::Stream;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use core::fmt;

/// A node's default or mutated value.
///
/// Which variant a node holds depends on its kind: numbers hold integers,
/// strings hold strings, and blobs and rendered containers hold streams.
/// Mutators may store any variant on any node; rendering converts it to the
/// node's encoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    /// Raw bits.
    Stream(Arc<Stream>),
    /// A decoded integer, wide enough for any signed or unsigned 64-bit
    /// field.
    Integer(i128),
    /// A decoded string.
    String(String),
}

impl Value {
    /// The integer this value denotes: integers as-is, strings parsed as
    /// decimal (or `0x` hexadecimal).
    pub fn as_integer(&self) -> Option<i128> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::String(s) => parse_integer(s),
            Value::Stream(_) => None,
        }
    }

    /// The string, if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// The stream, if this is a stream value.
    pub fn as_stream(&self) -> Option<&Arc<Stream>> {
        match self {
            Value::Stream(s) => Some(s),
            _ => None,
        }
    }

    /// The bytes this value stands for when it is not being encoded as a
    /// number: streams as-is, strings as UTF-8, integers as decimal text.
    pub fn to_stream(&self) -> Arc<Stream> {
        match self {
            Value::Stream(s) => s.clone(),
            Value::String(s) => Arc::new(Stream::from(s.as_str())),
            Value::Integer(i) => Arc::new(Stream::from(i.to_string().as_str())),
        }
    }
}

impl From<i128> for Value {
    fn from(i: i128) -> Self {
        Value::Integer(i)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.into())
    }
}

impl From<Stream> for Value {
    fn from(s: Stream) -> Self {
        Value::Stream(Arc::new(s))
    }
}

impl From<Arc<Stream>> for Value {
    fn from(s: Arc<Stream>) -> Self {
        Value::Stream(s)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{i}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Stream(s) => write!(f, "<{} bits>", s.len_bits()),
        }
    }
}

/// Parse a decimal or `0x`-prefixed hexadecimal integer, with an optional
/// leading sign.
pub(crate) fn parse_integer(s: &str) -> Option<i128> {
    let s = s.trim();
    let (neg, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let magnitude = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => i128::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<i128>().ok()?,
    };
    Some(if neg { -magnitude } else { magnitude })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_from_strings() {
        assert_eq!(parse_integer("42"), Some(42));
        assert_eq!(parse_integer(" -7 "), Some(-7));
        assert_eq!(parse_integer("0xff"), Some(255));
        assert_eq!(parse_integer("ten"), None);
        assert_eq!(Value::from("18446744073709551615").as_integer(), Some(u64::MAX.into()));
    }
}
