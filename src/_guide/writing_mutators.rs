/*!

# Writing a Mutator

A mutator implements the [`Mutate`][crate::Mutate] trait. It precomputes its
candidates when it is constructed, reports how many there are from
[`count`][crate::Mutate::count], and registers each of them from
[`mutate`][crate::Mutate::mutate] by calling
[`Candidates::mutation`][crate::Candidates::mutation] with a closure.

Only the closure for the chosen candidate runs. Everything that touches the
model must happen inside a closure, and every candidate must be registered
every time, in the same order, even when it cannot apply to the model it
finds. Such a candidate's closure leaves the node unmodified.

Randomness must come from the closure's [`Context`][crate::Context]. In
sequential mode the context's generator is derived from the cursor, which
keeps sequential candidates reproducible.

```rust
use malform::model::{DataModelBuilder, MutateOverride};
use malform::{Candidates, DataModel, Limits, Mutate, Mutation, NodeId, Result};

/// Append a random number of `%n` format specifiers to a string.
struct FormatSpecifiers {
    n: u32,
}

impl Mutate for FormatSpecifiers {
    fn name(&self) -> &'static str {
        "FormatSpecifiersMutator"
    }

    fn count(&self) -> u32 {
        self.n
    }

    fn mutate(&mut self, c: &mut Candidates<'_>, model: &mut DataModel, node: NodeId) -> Result<()> {
        for _ in 0..self.n {
            c.mutation(|ctx| {
                let repeat = ctx.rng().gen_range(1..=64);
                let mut text = model
                    .internal_value(node)?
                    .as_str()
                    .unwrap_or_default()
                    .to_string();
                text.push_str(&"%n".repeat(repeat));
                model.set_mutated(node, text, MutateOverride::DEFAULT);
                Ok(())
            })?;
        }
        Ok(())
    }
}

# fn foo() -> Result<()> {
let mut b = DataModelBuilder::new("Msg");
let root = b.root();
let name = b.string(root, "name", "bob")?;
let template = b.build();

let mut m = Mutation::new(FormatSpecifiers { n: 10 }, name, Limits::default());
m.set_mutation(3);
let mut model = template.clone();
m.sequential_mutation(&mut model)?;
assert!(model.value(name)?.to_bytes().starts_with(b"bob%n"));
# Ok(())
# }
# foo().unwrap();
```

Mutators that produce large buffers should check
[`Context::reserve`][crate::Context::reserve] before allocating, and prefer
composing windows over the node's current rendering (see
[`Stream::slice`][crate::stream::Stream::slice] and
[`Stream::repeat_to`][crate::stream::Stream::repeat_to]) to copying it.

 */
