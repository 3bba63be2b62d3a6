use malform::model::{DataModelBuilder, LengthUnit, MutateOverride, NumberSpec};
use malform::mutators::{SizePolicy, SizedData, SizedDeltas};
use malform::{ErrorKind, Limits, Mutation, MutatorKind, Session};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn shrink_blob_to_one_byte() -> anyhow::Result<()> {
    init_logger();

    let mut b = DataModelBuilder::new("Msg");
    let root = b.root();
    let len = b.number(root, "len", NumberSpec::unsigned(8), 0)?;
    let content: Vec<u8> = (0..100).map(|i| if i % 2 == 0 { 0x11 } else { 0x22 }).collect();
    let body = b.blob(root, "body", content)?;
    b.size_relation(len, body, LengthUnit::Bytes)?;
    let template = b.build();
    assert_eq!(template.decode_number(len)?, Some(100));

    let m = SizedData::new(&template, len, SizedDeltas::EdgeCases, SizePolicy::Preserve)?;
    let cursor = m
        .deltas()
        .iter()
        .position(|d| *d == -99)
        .ok_or_else(|| anyhow::anyhow!("-99 is not an 8-bit edge delta"))?;
    let mut m = Mutation::new(m, len, Limits::default());
    assert_eq!(m.name(), "SizedNumericalEdgeCasesMutator");

    m.set_mutation(cursor as u32);
    let mut model = template.clone();
    m.sequential_mutation(&mut model)?;

    assert_eq!(model.decode_number(len)?, Some(1));
    assert_eq!(model.value(body)?.to_bytes(), [0x11]);
    assert!(model
        .node(body)
        .mutation_flags()
        .contains(MutateOverride::TYPE_TRANSFORM));
    assert_eq!(model.value(root)?.to_bytes(), [0x01, 0x11]);

    // The template is untouched.
    assert_eq!(template.value(body)?.len_bytes(), 100);
    Ok(())
}

#[test]
fn grow_array_from_five_to_seven() -> anyhow::Result<()> {
    init_logger();

    let mut b = DataModelBuilder::new("Msg");
    let root = b.root();
    let items = b.array(root, "items")?;
    for i in 0..5 {
        b.number(items, &format!("item{i}"), NumberSpec::unsigned(16), 0x100 + i)?;
    }
    b.hint(items, "ArrayVarianceMutator-N", "2");
    let template = b.build();

    let mut m = Session::new().mutator(MutatorKind::ArrayVariance, &template, items)?;
    // Counts 3 through 7.
    assert_eq!(m.count(), 5);
    m.set_mutation(4);
    let mut model = template.clone();
    m.sequential_mutation(&mut model)?;

    let children = model.children(items).to_vec();
    assert_eq!(children.len(), 7);
    assert_eq!(&children[..5], template.children(items));

    let names: Vec<_> = children.iter().map(|c| model.node(*c).name()).collect();
    assert_eq!(names, ["item0", "item1", "item2", "item3", "item4", "item4_1", "item4_2"]);

    let last = model.value(children[4])?.to_bytes();
    assert_eq!(last, [0x01, 0x04]);
    for copy in &children[5..] {
        assert_eq!(model.value(*copy)?.to_bytes(), last);
    }
    for (c, t) in children.iter().zip(template.children(items)) {
        assert_eq!(model.value(*c)?.to_bytes(), template.value(*t)?.to_bytes());
    }
    Ok(())
}

#[test]
fn upper_case_hello() -> anyhow::Result<()> {
    init_logger();

    let mut b = DataModelBuilder::new("Msg");
    let root = b.root();
    let greeting = b.string(root, "greeting", "Hello")?;
    let template = b.build();

    let mut m = Session::new().mutator(MutatorKind::StringCase, &template, greeting)?;
    assert_eq!(m.count(), 3);

    m.set_mutation(1);
    let mut model = template.clone();
    m.sequential_mutation(&mut model)?;
    assert_eq!(model.value(greeting)?.to_bytes(), b"HELLO");

    m.set_mutation(0);
    let mut model = template.clone();
    m.sequential_mutation(&mut model)?;
    assert_eq!(model.value(greeting)?.to_bytes(), b"hello");
    Ok(())
}

#[test]
fn copied_and_removed_data_keep_their_sizer() -> anyhow::Result<()> {
    init_logger();

    let mut b = DataModelBuilder::new("Msg");
    let root = b.root();
    let len = b.number(root, "len", NumberSpec::unsigned(8), 0)?;
    let body = b.blob(root, "body", &b"\xaa\xbb"[..])?;
    b.size_relation(len, body, LengthUnit::Bytes)?;
    let template = b.build();

    let session = Session::new();
    let mut grow = session.mutator(MutatorKind::DataElementDuplicate, &template, body)?;
    grow.set_mutation(0);
    let mut model = template.clone();
    grow.sequential_mutation(&mut model)?;
    // The copy is not sized by `len`.
    assert_eq!(model.value(root)?.to_bytes(), b"\x02\xaa\xbb\xaa\xbb");

    let mut remove = session.mutator(MutatorKind::DataElementRemove, &template, body)?;
    let mut model = template.clone();
    remove.sequential_mutation(&mut model)?;
    assert_eq!(model.value(root)?.to_bytes(), b"\x02");
    Ok(())
}

#[test]
fn choice_renders_its_selection() -> anyhow::Result<()> {
    init_logger();

    let mut b = DataModelBuilder::new("Msg");
    let root = b.root();
    let choice = b.choice(root, "body")?;
    b.string(choice, "text", "hi")?;
    let number = b.number(choice, "number", NumberSpec::unsigned(8), 7)?;
    b.select(choice, 1)?;
    let template = b.build();
    assert_eq!(template.value(root)?.to_bytes(), [7]);

    // Variance skips numbers of eight bits or fewer; edge cases do not.
    assert!(MutatorKind::NumericalEdgeCase.supported(&template, number));
    let err = Session::new()
        .mutator(MutatorKind::NumericalVariance, &template, number)
        .unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Unsupported { .. }), "{err}");
    Ok(())
}
