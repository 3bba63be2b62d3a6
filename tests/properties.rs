#![cfg(feature = "check")]

use malform::check::Check;
use malform::model::{DataModelBuilder, LengthUnit, NumberSpec};
use malform::mutators::{SizePolicy, SizedData, SizedDeltas};
use malform::{DataModel, Limits, Mutation, MutatorKind, NodeId, Session};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

struct Msg {
    model: DataModel,
    len: NodeId,
    body: NodeId,
    name: NodeId,
    items: NodeId,
    count: NodeId,
    flags: NodeId,
}

fn msg() -> anyhow::Result<Msg> {
    let mut b = DataModelBuilder::new("Msg");
    let root = b.root();
    let len = b.number(root, "len", NumberSpec::unsigned(16), 0)?;
    let body = b.blob(root, "body", &(0u8..16).collect::<Vec<_>>()[..])?;
    b.size_relation(len, body, LengthUnit::Bytes)?;
    let name = b.string(root, "name", "Hello, World")?;
    b.hint(name, "ValidValues", "admin;root;%s%s%s");
    let items = b.array(root, "items")?;
    for i in 0..3 {
        b.number(items, &format!("item{i}"), NumberSpec::signed(8), i)?;
    }
    let count = b.number(root, "count", NumberSpec::unsigned(32).little_endian(), 1000)?;
    b.hint(count, "FiniteRandomNumbersMutator-N", "100");
    let flags = b.flag(root, "flags", 12, 0xabc)?;
    Ok(Msg {
        model: b.build(),
        len,
        body,
        name,
        items,
        count,
        flags,
    })
}

/// Every (node, kind) pair that applies in `model`.
fn every_mutation(model: &DataModel) -> anyhow::Result<Vec<Mutation>> {
    let session = Session::new();
    let mut all = vec![];
    let mut stack = vec![model.root()];
    while let Some(id) = stack.pop() {
        stack.extend(model.children(id).iter().copied());
        all.extend(session.mutators(model, id)?);
    }
    Ok(all)
}

#[test]
fn same_cursor_same_bytes() -> anyhow::Result<()> {
    init_logger();
    let Msg { model: template, .. } = msg()?;
    let root = template.root();

    for mut m in every_mutation(&template)? {
        for cursor in (0..m.count()).take(64) {
            m.set_mutation(cursor);
            let mut a = template.clone();
            m.sequential_mutation(&mut a)?;
            let mut b = template.clone();
            m.sequential_mutation(&mut b)?;
            assert_eq!(
                a.value(root)?.to_bytes(),
                b.value(root)?.to_bytes(),
                "{} at cursor {cursor}",
                m.name()
            );
        }
    }
    Ok(())
}

#[test]
fn exhausted_cursor_has_no_effect() -> anyhow::Result<()> {
    init_logger();
    let Msg { model: template, .. } = msg()?;
    let root = template.root();
    let before = template.value(root)?.to_bytes();

    for mut m in every_mutation(&template)? {
        m.set_mutation(m.count());
        let mut model = template.clone();
        let err = m.sequential_mutation(&mut model).unwrap_err();
        assert!(err.is_exhausted(), "{}: {err}", m.name());
        assert_eq!(model.value(root)?.to_bytes(), before);
        assert_eq!(m.mutation(), m.count());
    }
    Ok(())
}

#[test]
fn preserving_size_mutators_keep_the_sizer_honest() -> anyhow::Result<()> {
    init_logger();
    let Msg {
        model: template,
        len,
        body,
        ..
    } = msg()?;
    let session = Session::new();

    for kind in [MutatorKind::SizedVariance, MutatorKind::SizedNumericalEdgeCases] {
        let mut m = session.mutator(kind, &template, len)?;
        assert!(m.count() > 0);
        Check::new()
            .sequential(&mut m, &template, |_, model| {
                let claimed = model.decode_number(len).map_err(|e| e.to_string())?;
                let actual = model.length_bits(body).map_err(|e| e.to_string())? / 8;
                if claimed == Some(i128::from(actual)) {
                    Ok(())
                } else {
                    Err(format!("sizer says {claimed:?}, body is {actual} bytes"))
                }
            })
            .map_err(|e| anyhow::anyhow!("{e}"))?;
    }
    Ok(())
}

#[test]
fn forging_size_mutators_lie_without_touching_data() -> anyhow::Result<()> {
    init_logger();
    let Msg {
        model: template,
        len,
        body,
        ..
    } = msg()?;
    let original = template.value(body)?.to_bytes();

    for deltas in [SizedDeltas::Variance, SizedDeltas::EdgeCases] {
        let mut m = Mutation::new(
            SizedData::new(&template, len, deltas, SizePolicy::Forge)?,
            len,
            Limits::default(),
        );
        let all = m.mutator().deltas().to_vec();
        assert!(!all.is_empty());

        for (cursor, delta) in all.into_iter().enumerate() {
            m.set_mutation(cursor as u32);
            let mut model = template.clone();
            m.sequential_mutation(&mut model)?;

            assert_eq!(model.value(body)?.to_bytes(), original);
            let claimed = model.decode_number(len)?;
            assert_eq!(claimed, Some(16 + delta));
            if delta != 0 {
                assert_ne!(claimed, Some(16));
            }
        }
    }
    Ok(())
}

#[test]
fn shrinking_past_zero_clamps_to_empty() -> anyhow::Result<()> {
    init_logger();
    let Msg {
        model: template,
        len,
        body,
        ..
    } = msg()?;
    let mut m = Mutation::new(
        SizedData::new(&template, len, SizedDeltas::Variance, SizePolicy::Preserve)?,
        len,
        Limits::default(),
    );
    let deltas = m.mutator().deltas().to_vec();
    assert_eq!(deltas.first(), Some(&-50));

    for (cursor, delta) in deltas.into_iter().enumerate() {
        if 16 + delta >= 0 {
            continue;
        }
        m.set_mutation(cursor as u32);
        let mut model = template.clone();
        m.sequential_mutation(&mut model)?;
        assert_eq!(model.length_bits(body)?, 0, "delta {delta}");
        assert_eq!(model.decode_number(len)?, Some(0));
    }
    Ok(())
}

#[test]
fn mutating_a_node_leaves_unrelated_nodes_alone() -> anyhow::Result<()> {
    init_logger();
    let msg = msg()?;
    let template = &msg.model;
    let session = Session::new();

    let targets = [msg.name, msg.items, msg.count, msg.flags];
    for target in targets {
        let others: Vec<_> = [msg.len, msg.body, msg.name, msg.items, msg.count, msg.flags]
            .into_iter()
            .filter(|n| *n != target)
            .collect();
        let before = others
            .iter()
            .map(|n| template.value(*n).map(|v| v.to_bytes()))
            .collect::<Result<Vec<_>, _>>()?;

        for mut m in session.mutators(template, target)? {
            Check::new()
                .sequential(&mut m, template, |_, model| {
                    for (n, expected) in others.iter().zip(&before) {
                        let actual = model.value(*n).map_err(|e| e.to_string())?.to_bytes();
                        if actual != *expected {
                            return Err(format!("{} changed", model.full_name(*n)));
                        }
                    }
                    Ok(())
                })
                .map_err(|e| anyhow::anyhow!("{e}"))?;
        }
    }
    Ok(())
}

#[test]
fn random_mode_replays_from_a_seed() -> anyhow::Result<()> {
    init_logger();
    let Msg {
        model: template,
        body,
        ..
    } = msg()?;
    let root = template.root();

    let run = |seed: u64| -> anyhow::Result<Vec<Vec<u8>>> {
        let mut session = Session::new().seed(seed);
        let mut mutations = session.mutators(&template, body)?;
        let mut out = vec![];
        for _ in 0..20 {
            for m in &mut mutations {
                let mut model = template.clone();
                session.random_mutation(m, &mut model)?;
                out.push(model.value(root)?.to_bytes());
            }
        }
        Ok(out)
    };

    assert_eq!(run(1)?, run(1)?);
    assert_ne!(run(1)?, run(2)?);
    Ok(())
}
