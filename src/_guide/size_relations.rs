/*!

# Size Relations and Override Flags

A size relation says that a numeric *sizer* holds the rendered length of a
*data* element, in bits or bytes. While nothing is mutated, rendering the
sizer measures the data.

A mutation records its value on the node together with
[`MutateOverride`][crate::model::MutateOverride] flags, and the render pass
consults them:

* `TYPE_TRANSFORM`: the mutated value is raw bits and is rendered as-is, not
  re-encoded for the node's type.
* `RELATIONS`: the mutated value stands, and the node's size relation is not
  evaluated.
* No flag: the mutated value is still encoded and rendered. Only nodes
  without a mutated value are derived from their relation.

The four size mutators target the sizer. The *preserve* pair
(`SizedVarianceMutator`, `SizedNumericalEdgeCasesMutator`) resize the data
and keep the sizer truthful. The *forge* pair
(`SizedDataVarianceMutator`, `SizedDataNumericalEdgeCasesMutator`) leave the
data alone and make the sizer lie.

```rust
# fn foo() -> malform::Result<()> {
use malform::model::{DataModelBuilder, LengthUnit, MutateOverride, NumberSpec};
use malform::{MutatorKind, Session};

let mut b = DataModelBuilder::new("Msg");
let root = b.root();
let len = b.number(root, "len", NumberSpec::unsigned(8), 0)?;
let body = b.blob(root, "body", &[0x11u8; 100][..])?;
b.size_relation(len, body, LengthUnit::Bytes)?;
let template = b.build();
assert_eq!(template.decode_number(len)?, Some(100));

let session = Session::new();

// Shrink the body by 99 bytes; the sizer follows.
let mut m = session.mutator(MutatorKind::SizedNumericalEdgeCases, &template, len)?;
let cursor = (0..m.count())
    .find(|&i| {
        m.set_mutation(i);
        let mut model = template.clone();
        m.sequential_mutation(&mut model).is_ok()
            && model.length_bits(body).ok() == Some(8)
    })
    .expect("a -99 candidate");
m.set_mutation(cursor);
let mut model = template.clone();
m.sequential_mutation(&mut model)?;
assert_eq!(model.decode_number(len)?, Some(1));
assert_eq!(model.value(body)?.to_bytes(), [0x11]);
assert!(model
    .node(body)
    .mutation_flags()
    .contains(MutateOverride::TYPE_TRANSFORM));

// Claim a different length; the body is untouched.
let mut m = session.mutator(MutatorKind::SizedDataVariance, &template, len)?;
m.set_mutation(0);
let mut model = template.clone();
m.sequential_mutation(&mut model)?;
assert_eq!(model.decode_number(len)?, Some(50));
assert_eq!(model.length_bits(body)?, 800);
# Ok(())
# }
# foo().unwrap();
```

 */
