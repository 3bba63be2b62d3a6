//! Mutators that replace a node with values its description supplies.
//!
//! The `ValidValues` hint is a `;`-separated list. An entry of the form
//! `file:<path>` stands for every line of that file. The `WordList` hint
//! names a file whose lines are the values. Reading files needs the `std`
//! feature; a file that cannot be read is a configuration error.

use super::count_of;
use crate::log;
use crate::model::{DataModel, MutateOverride, NodeId, NodeKind};
use crate::stream::Stream;
use crate::value::{parse_integer, Value};
use crate::{Candidates, Error, Mutate, Result};
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

const VALID_VALUES: &str = "ValidValues";
const WORD_LIST: &str = "WordList";

fn takes_values(model: &DataModel, node: NodeId) -> bool {
    let n = model.node(node);
    n.is_mutable() && matches!(n.kind(), NodeKind::String | NodeKind::Number(_) | NodeKind::Blob)
}

pub(crate) fn supported_valid_values(model: &DataModel, node: NodeId) -> bool {
    takes_values(model, node) && model.node(node).hint(VALID_VALUES).is_some()
}

pub(crate) fn supported_word_list(model: &DataModel, node: NodeId) -> bool {
    takes_values(model, node) && model.node(node).hint(WORD_LIST).is_some()
}

#[cfg(feature = "std")]
fn read_lines(path: &str) -> Result<Vec<String>> {
    use alloc::string::ToString;

    let text = std::fs::read_to_string(path).map_err(|e| Error::word_list(path, e.to_string()))?;
    Ok(text.lines().map(String::from).collect())
}

#[cfg(not(feature = "std"))]
fn read_lines(path: &str) -> Result<Vec<String>> {
    Err(Error::word_list(path, "word list files need the `std` feature"))
}

/// Convert the textual `values` to what `node` holds. Numbers must parse.
fn typed(model: &DataModel, node: NodeId, hint: &str, values: Vec<String>) -> Result<Vec<Value>> {
    values
        .into_iter()
        .map(|v| match model.node(node).kind() {
            NodeKind::Number(_) => parse_integer(&v)
                .map(Value::Integer)
                .ok_or_else(|| Error::invalid_hint(hint, v)),
            NodeKind::Blob => Ok(Value::Stream(Arc::new(Stream::from(v.as_str())))),
            _ => Ok(Value::String(v)),
        })
        .collect()
}

fn apply(
    name: &'static str,
    values: &[Value],
    c: &mut Candidates<'_>,
    model: &mut DataModel,
    node: NodeId,
) -> Result<()> {
    for v in values {
        c.mutation(|_| {
            log::applied!(name, model, node, "{v}");
            model.set_mutated(node, v.clone(), MutateOverride::DEFAULT);
            Ok(())
        })?;
    }
    Ok(())
}

/// Replace the node with each value of its `ValidValues` hint, after the
/// lines of its `WordList` file, if it has one.
#[derive(Clone, Debug)]
pub struct ValidValues {
    values: Vec<Value>,
}

impl ValidValues {
    const NAME: &'static str = "ValidValuesMutator";

    /// Build the mutator for `node`, reading any files its hints name.
    pub fn new(model: &DataModel, node: NodeId) -> Result<Self> {
        let n = model.node(node);
        let mut values = match n.hint(WORD_LIST) {
            Some(path) => read_lines(path)?,
            None => Vec::new(),
        };
        for entry in n.hint(VALID_VALUES).unwrap_or_default().split(';') {
            match entry.strip_prefix("file:") {
                Some(path) => values.extend(read_lines(path)?),
                None => values.push(String::from(entry)),
            }
        }
        Ok(Self {
            values: typed(model, node, VALID_VALUES, values)?,
        })
    }
}

impl Mutate for ValidValues {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn count(&self) -> u32 {
        count_of(self.values.len())
    }

    fn mutate(&mut self, c: &mut Candidates<'_>, model: &mut DataModel, node: NodeId) -> Result<()> {
        apply(Self::NAME, &self.values, c, model, node)
    }
}

/// Replace the node with each line of the file its `WordList` hint names.
#[derive(Clone, Debug)]
pub struct WordList {
    values: Vec<Value>,
}

impl WordList {
    const NAME: &'static str = "WordListMutator";

    /// Build the mutator for `node`, reading the word list.
    pub fn new(model: &DataModel, node: NodeId) -> Result<Self> {
        let lines = match model.node(node).hint(WORD_LIST) {
            Some(path) => read_lines(path)?,
            None => Vec::new(),
        };
        Ok(Self {
            values: typed(model, node, WORD_LIST, lines)?,
        })
    }
}

impl Mutate for WordList {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn count(&self) -> u32 {
        count_of(self.values.len())
    }

    fn mutate(&mut self, c: &mut Candidates<'_>, model: &mut DataModel, node: NodeId) -> Result<()> {
        apply(Self::NAME, &self.values, c, model, node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DataModelBuilder, NumberSpec};

    #[test]
    fn numbers_must_parse() -> Result<()> {
        let mut b = DataModelBuilder::new("m");
        let root = b.root();
        let x = b.number(root, "x", NumberSpec::unsigned(16), 0)?;
        b.hint(x, VALID_VALUES, "1;0x10;-3");
        let y = b.number(root, "y", NumberSpec::unsigned(16), 0)?;
        b.hint(y, VALID_VALUES, "1;two");
        let model = b.build();

        let m = ValidValues::new(&model, x)?;
        assert_eq!(m.values, [Value::Integer(1), Value::Integer(16), Value::Integer(-3)]);
        assert!(ValidValues::new(&model, y).unwrap_err().is_config());
        Ok(())
    }

    #[test]
    fn missing_word_list_is_a_config_error() -> Result<()> {
        let mut b = DataModelBuilder::new("m");
        let root = b.root();
        let s = b.string(root, "s", "")?;
        b.hint(s, WORD_LIST, "/nonexistent/malform/words.txt");
        let model = b.build();

        assert!(WordList::new(&model, s).unwrap_err().is_config());
        Ok(())
    }
}
