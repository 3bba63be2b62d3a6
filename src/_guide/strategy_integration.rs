/*!

# Driving Mutators from a Fuzzing Strategy

A strategy decides which nodes to mutate, with which mutators, in which order.
`malform` supplies the mutators; the strategy drives them through three steps:

1. Ask [`MutatorKind::supported`][crate::MutatorKind::supported] which kinds
   apply to a node of the template model, or let
   [`Session::mutators`][crate::Session::mutators] do that.

2. Build a [`Mutation`][crate::Mutation] per (kind, node) pair. Building
   precomputes the candidate space, so
   [`count`][crate::Mutation::count] is known before anything is applied and
   can be used to plan the campaign. Malformed hints fail here, as
   configuration errors.

3. For each test case, clone the template and apply one candidate to the
   clone. The template itself is never mutated.

## Sequential Mode

Walk the cursor from `0` up to `count`. The same cursor always produces the
same bytes, so a campaign can be saved as a list of cursors and resumed. When
the cursor reaches `count`, the mutation reports
[`ErrorKind::Exhausted`][crate::ErrorKind::Exhausted] and leaves the model
untouched: move on to the next (mutator, node) pair.

```rust
# fn foo() -> malform::Result<()> {
use malform::model::{DataModelBuilder, NumberSpec};
use malform::Session;

let mut b = DataModelBuilder::new("Msg");
let root = b.root();
let port = b.number(root, "port", NumberSpec::unsigned(16), 8080)?;
b.hint(port, "NumericalVarianceMutator-N", "2");
b.hint(port, "NumericalEdgeCaseMutator-N", "1");
b.hint(port, "FiniteRandomNumbersMutator-N", "3");
let template = b.build();

let session = Session::new();
for mut mutation in session.mutators(&template, port)? {
    let mut cursor = 0;
    loop {
        mutation.set_mutation(cursor);
        let mut model = template.clone();
        match mutation.sequential_mutation(&mut model) {
            Ok(()) => {}
            Err(e) if e.is_exhausted() => break,
            Err(e) => return Err(e),
        }
        let bytes = model.value(root)?.to_bytes();
        // ... hand `bytes` to the transport ...
#       let _ = bytes;
        cursor += 1;
    }
    assert_eq!(cursor, mutation.count());
}
# Ok(())
# }
# foo().unwrap();
```

## Random Mode

Draw a candidate with
[`Session::random_mutation`][crate::Session::random_mutation]. Every random
choice comes from the session's generator, so seeding the session replays
the campaign exactly.

```rust
# fn foo() -> malform::Result<()> {
use malform::model::DataModelBuilder;
use malform::{MutatorKind, Session};

let mut b = DataModelBuilder::new("Msg");
let root = b.root();
let payload = b.blob(root, "payload", &b"\x00\x01\x02\x03"[..])?;
let template = b.build();

let run = |seed| -> malform::Result<Vec<Vec<u8>>> {
    let mut session = Session::new().seed(seed);
    let mut m = session.mutator(MutatorKind::Blob, &template, payload)?;
    (0..10)
        .map(|_| -> malform::Result<Vec<u8>> {
            let mut model = template.clone();
            session.random_mutation(&mut m, &mut model)?;
            Ok(model.value(root)?.to_bytes())
        })
        .collect()
};
assert_eq!(run(7)?, run(7)?);
# Ok(())
# }
# foo().unwrap();
```

 */
