use crate::log;
use crate::model::{DataModel, MutateOverride, NodeId, NodeKind};
use crate::value::Value;
use crate::{Candidates, Context, Mutate, Result};
use alloc::string::String;
use alloc::vec::Vec;

/// Strings at least this long have only this many characters re-cased by
/// the random-case candidate.
const SAMPLE: usize = 20;

pub(crate) fn supported(model: &DataModel, node: NodeId) -> bool {
    let n = model.node(node);
    n.is_mutable() && matches!(n.kind(), NodeKind::String)
}

fn current_text(model: &DataModel, node: NodeId) -> Result<String> {
    Ok(match model.internal_value(node)? {
        Value::String(s) => s,
        other => String::from_utf8_lossy(&other.to_stream().to_bytes()).into_owned(),
    })
}

/// The character positions the random-case candidate touches.
fn sample(ctx: &mut Context<'_>, len: usize) -> Vec<usize> {
    if len < SAMPLE {
        return (0..len).collect();
    }
    let mut picked = Vec::with_capacity(SAMPLE);
    while picked.len() < SAMPLE {
        let i = ctx.rng().gen_index(len).unwrap_or(0);
        if !picked.contains(&i) {
            picked.push(i);
        }
    }
    picked
}

fn random_case(ctx: &mut Context<'_>, text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let picked = sample(ctx, chars.len());
    let mut out = String::with_capacity(text.len());
    for (i, ch) in chars.into_iter().enumerate() {
        if !picked.contains(&i) {
            out.push(ch);
        } else if ctx.rng().gen_bool() {
            out.extend(ch.to_uppercase());
        } else {
            out.extend(ch.to_lowercase());
        }
    }
    out
}

/// Lower case, upper case, and random case, in that order.
#[derive(Clone, Debug, Default)]
pub struct StringCase;

impl StringCase {
    const NAME: &'static str = "StringCaseMutator";

    /// Build the mutator.
    pub fn new() -> Self {
        StringCase
    }
}

impl Mutate for StringCase {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn count(&self) -> u32 {
        3
    }

    fn mutate(&mut self, c: &mut Candidates<'_>, model: &mut DataModel, node: NodeId) -> Result<()> {
        c.mutation(|_| {
            let text = current_text(model, node)?.to_lowercase();
            log::applied!(Self::NAME, model, node, "lower case");
            model.set_mutated(node, text, MutateOverride::DEFAULT);
            Ok(())
        })?;

        c.mutation(|_| {
            let text = current_text(model, node)?.to_uppercase();
            log::applied!(Self::NAME, model, node, "upper case");
            model.set_mutated(node, text, MutateOverride::DEFAULT);
            Ok(())
        })?;

        c.mutation(|ctx| {
            // Raw bytes from an earlier mutation are not re-cased.
            if model
                .node(node)
                .mutation_flags()
                .contains(MutateOverride::TYPE_TRANSFORM)
            {
                log::skipped!(Self::NAME, model, node, "value is raw bytes");
                return Ok(());
            }
            let text = random_case(ctx, &current_text(model, node)?);
            log::applied!(Self::NAME, model, node, "random case");
            model.set_mutated(node, text, MutateOverride::DEFAULT);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Rng;

    #[test]
    fn long_strings_sample_twenty_positions() {
        let mut rng = Rng::new(7);
        let mut ctx = Context::for_test(&mut rng);
        let text = "a".repeat(100);
        let cased = random_case(&mut ctx, &text);
        assert_eq!(cased.len(), 100);
        assert!(cased.chars().filter(|c| c.is_uppercase()).count() <= SAMPLE);
    }
}
