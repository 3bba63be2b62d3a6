use malform::model::{DataModelBuilder, LengthUnit, NumberSpec};
use malform::mutators::MAX_HINT_N;
use malform::{ErrorKind, MutatorKind, Session};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn malformed_count_hint() -> anyhow::Result<()> {
    init_logger();

    let mut b = DataModelBuilder::new("Msg");
    let root = b.root();
    let x = b.number(root, "x", NumberSpec::unsigned(32), 7)?;
    b.hint(x, "NumericalVarianceMutator-N", "lots");
    let y = b.number(root, "y", NumberSpec::unsigned(32), 7)?;
    b.hint(y, "NumericalVarianceMutator-N", " 3 ");
    let z = b.number(root, "z", NumberSpec::unsigned(32), 7)?;
    b.hint(z, "NumericalVarianceMutator-N", "-5");
    let template = b.build();
    let session = Session::new();

    let err = session
        .mutator(MutatorKind::NumericalVariance, &template, x)
        .unwrap_err();
    assert!(err.is_config(), "{err}");
    match err.kind() {
        ErrorKind::InvalidHint { hint, value } => {
            assert_eq!(hint, "NumericalVarianceMutator-N");
            assert_eq!(value, "lots");
        }
        other => panic!("unexpected error kind: {other:?}"),
    }

    // The whole node is rejected, not just the one mutator.
    assert!(session.mutators(&template, x).is_err());

    // 4 through 10.
    let m = session.mutator(MutatorKind::NumericalVariance, &template, y)?;
    assert_eq!(m.count(), 7);

    // Negative counts clamp to zero, leaving only the current value.
    let mut m = session.mutator(MutatorKind::NumericalVariance, &template, z)?;
    assert_eq!(m.count(), 1);
    m.set_mutation(1);
    let mut model = template.clone();
    assert!(m.sequential_mutation(&mut model).unwrap_err().is_exhausted());
    Ok(())
}

#[test]
fn oversized_count_hints_are_rejected() -> anyhow::Result<()> {
    init_logger();

    let mut b = DataModelBuilder::new("Msg");
    let root = b.root();
    let x = b.number(root, "x", NumberSpec::unsigned(64), 7)?;
    b.hint(x, "NumericalVarianceMutator-N", "2000000000");
    b.hint(x, "NumericalEdgeCaseMutator-N", &(MAX_HINT_N + 1).to_string());
    let len = b.number(root, "len", NumberSpec::unsigned(32), 0)?;
    let body = b.blob(root, "body", &b"abcd"[..])?;
    b.size_relation(len, body, LengthUnit::Bytes)?;
    b.hint(len, "SizedVarianceMutator-N", "9999999999");
    b.hint(len, "SizedNumericalEdgeCasesMutator-N", &MAX_HINT_N.to_string());
    let template = b.build();
    let session = Session::new();

    for (kind, node) in [
        (MutatorKind::NumericalVariance, x),
        (MutatorKind::NumericalEdgeCase, x),
        (MutatorKind::SizedVariance, len),
    ] {
        let err = session.mutator(kind, &template, node).unwrap_err();
        assert!(err.is_config(), "{}: {err}", kind.name());
    }

    // The cap itself is allowed.
    let m = session.mutator(MutatorKind::SizedNumericalEdgeCases, &template, len)?;
    assert!(m.count() > MAX_HINT_N);
    Ok(())
}

#[test]
fn word_lists() -> anyhow::Result<()> {
    init_logger();

    let path = std::env::temp_dir().join(format!("malform-words-{}.txt", std::process::id()));
    std::fs::write(&path, "alpha\nbeta\n")?;
    let path = path.to_string_lossy().into_owned();

    let mut b = DataModelBuilder::new("Msg");
    let root = b.root();
    let word = b.string(root, "word", "")?;
    b.hint(word, "WordList", &path);
    b.hint(word, "ValidValues", &format!("gamma;file:{path}"));
    let missing = b.string(root, "missing", "")?;
    b.hint(missing, "ValidValues", "file:/nonexistent/malform/words.txt");
    let template = b.build();
    let session = Session::new();

    let mut m = session.mutator(MutatorKind::WordList, &template, word)?;
    assert_eq!(m.count(), 2);
    m.set_mutation(1);
    let mut model = template.clone();
    m.sequential_mutation(&mut model)?;
    assert_eq!(model.value(word)?.to_bytes(), b"beta");

    let mut m = session.mutator(MutatorKind::ValidValues, &template, word)?;
    let mut seen = vec![];
    for cursor in 0..m.count() {
        m.set_mutation(cursor);
        let mut model = template.clone();
        m.sequential_mutation(&mut model)?;
        seen.push(String::from_utf8(model.value(word)?.to_bytes())?);
    }
    assert_eq!(seen, ["alpha", "beta", "gamma", "alpha", "beta"]);

    let err = session
        .mutator(MutatorKind::ValidValues, &template, missing)
        .unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::WordList { .. }), "{err}");

    std::fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn unsupported_kinds() -> anyhow::Result<()> {
    init_logger();

    let mut b = DataModelBuilder::new("Msg");
    let root = b.root();
    let text = b.string(root, "text", "hi")?;
    let frozen = b.blob(root, "frozen", &b"\x00\x01"[..])?;
    b.mutable(frozen, false);
    let template = b.build();
    let session = Session::new();

    for kind in [
        MutatorKind::ArrayVariance,
        MutatorKind::Blob,
        MutatorKind::SizedVariance,
        MutatorKind::NumericalEdgeCase,
    ] {
        assert!(!kind.supported(&template, text));
        let err = session.mutator(kind, &template, text).unwrap_err();
        assert!(
            matches!(err.kind(), ErrorKind::Unsupported { mutator, .. } if *mutator == kind.name()),
            "{err}"
        );
    }

    // Immutable nodes and the root take no mutators at all.
    assert!(session.mutators(&template, frozen)?.is_empty());
    assert!(session.mutators(&template, root)?.is_empty());

    for kind in MutatorKind::ALL {
        assert_eq!(MutatorKind::from_name(kind.name()), Some(*kind));
    }
    assert_eq!(MutatorKind::from_name("NoSuchMutator"), None);
    Ok(())
}

#[test]
fn growth_respects_the_byte_limit() -> anyhow::Result<()> {
    init_logger();

    let mut b = DataModelBuilder::new("Msg");
    let root = b.root();
    let items = b.array(root, "items")?;
    b.number(items, "a", NumberSpec::unsigned(16), 1)?;
    b.number(items, "b", NumberSpec::unsigned(16), 2)?;
    let body = b.blob(root, "body", &b"abcd"[..])?;
    let template = b.build();
    let session = Session::new().max_materialized_bytes(10);
    assert_eq!(session.limits().max_materialized_bytes, 10);

    // 50 more two-byte elements.
    let mut m = session.mutator(MutatorKind::ArrayVariance, &template, items)?;
    m.set_mutation(m.count() - 1);
    let mut model = template.clone();
    let err = m.sequential_mutation(&mut model).unwrap_err();
    assert!(err.is_resource_limit(), "{err}");

    // Two copies of four bytes fit, three do not.
    let mut m = session.mutator(MutatorKind::DataElementDuplicate, &template, body)?;
    m.set_mutation(1);
    let mut model = template.clone();
    m.sequential_mutation(&mut model)?;
    assert_eq!(model.value(root)?.to_bytes(), b"\x00\x01\x00\x02abcdabcdabcd");

    m.set_mutation(2);
    let mut model = template.clone();
    let err = m.sequential_mutation(&mut model).unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::ResourceLimit {
            requested: 12,
            limit: 10
        }
    ));
    Ok(())
}

#[test]
fn builder_rejects_malformed_models() -> anyhow::Result<()> {
    init_logger();

    let mut b = DataModelBuilder::new("Msg");
    let root = b.root();
    let text = b.string(root, "text", "hi")?;
    let len = b.number(root, "len", NumberSpec::unsigned(8), 0)?;

    assert!(b.string(root, "text", "again").is_err());
    assert!(b.string(root, "a.b", "").is_err());
    assert!(b.string(text, "child", "").is_err());
    assert!(b.number(root, "wide", NumberSpec::unsigned(65), 0).is_err());
    assert!(b.number(root, "zero", NumberSpec::signed(0), 0).is_err());
    assert!(b
        .number(root, "odd", NumberSpec::unsigned(12).little_endian(), 0)
        .is_err());
    assert!(b.flag(root, "huge", 65, 0).is_err());
    assert!(b.select(text, 0).is_err());

    assert!(b.size_relation(text, len, LengthUnit::Bytes).is_err());
    assert!(b.size_relation(len, len, LengthUnit::Bytes).is_err());
    b.size_relation(len, text, LengthUnit::Bytes)?;
    assert!(b.size_relation(len, text, LengthUnit::Bits).is_err());

    let model = b.build();
    assert_eq!(model.find("text"), Some(text));
    assert_eq!(model.full_name(len), "Msg.len");
    assert_eq!(model.value(root)?.to_bytes(), b"hi\x02");
    Ok(())
}
