use windbeam::testing::*;
use windbeam::*;

fn letters(p: &Pipeline, xs: &[&'static str]) -> PCollection<&'static str> {
    from_vec(p, xs.to_vec())
}

#[test]
fn flatten_keeps_every_element_in_input_order() -> anyhow::Result<()> {
    let p = TestPipeline::new();
    let parts = [letters(&p, &["a", "b"]), letters(&p, &["c", "d"]), letters(&p, &["e", "f"])];
    let merged = flatten(&parts)?;
    assert_eq!(p.node_kinds(), vec!["source", "source", "source", "flatten"]);
    assert_eq!(p.edge_count(), 3);

    assert_eq!(merged.collect_seq()?, vec!["a", "b", "c", "d", "e", "f"]);
    Ok(())
}

#[test]
fn flatten_feeds_a_downstream_chain() -> anyhow::Result<()> {
    let counts = assert_seq_par_agree(3, || {
        let p = Pipeline::default();
        let left = from_vec(&p, vec!["x y".to_string(), "z".into()]).split_words();
        let right = from_vec(&p, vec!["y".to_string(), "y x".into()]).split_words();
        flatten(&[left, right]).map(|f| f.count_per_element()).unwrap()
    })?;
    assert_kv_collections_equal(counts, vec![("x".into(), 2), ("y".into(), 3), ("z".into(), 1)]);
    Ok(())
}

#[test]
fn flatten_may_read_one_input_twice() -> anyhow::Result<()> {
    let p = Pipeline::default();
    let a = from_vec(&p, vec![1u8, 2]).map(|x: &u8| x * 10);
    let twice = flatten(&[a.clone(), a])?;
    assert_eq!(twice.collect_par(Some(2), Some(2))?, vec![10, 20, 10, 20]);
    Ok(())
}

#[test]
fn flatten_rejects_mismatched_inputs() -> anyhow::Result<()> {
    let p = Pipeline::default();
    let fixed = letters(&p, &["a"]).window_into(WindowFn::fixed(10)?);
    let global = letters(&p, &["b"]);
    assert_flow_error(flatten(&[fixed, global]).map(|_| ()), |e| matches!(e, FlowError::InvalidWindowSpec(_)));

    let other = Pipeline::default();
    let res = flatten(&[letters(&p, &["a"]), letters(&other, &["b"])]).map(|_| ());
    assert_flow_error(res, |e| matches!(e, FlowError::Invariant(_)));

    let none: [PCollection<u8>; 0] = [];
    assert_flow_error(flatten(&none).map(|_| ()), |e| matches!(e, FlowError::Invariant(_)));
    Ok(())
}

#[test]
fn co_group_by_key_joins_emails_and_phones() -> anyhow::Result<()> {
    let p = Pipeline::default();
    let emails = from_vec(&p, vec![("a", "a@example.com"), ("b", "b@example.com")]);
    let phones = from_vec(&p, vec![("a", "x4312"), ("b", "x8452")]);

    let mut lines = emails
        .co_group_by_key(phones)?
        .map(|(name, (emails, phones)): &(&str, CoGrouped<&str, &str>)| {
            format!("{name}; {}; {}", emails.join(", "), phones.join(", "))
        })
        .collect_seq()?;
    lines.sort();
    assert_eq!(lines, vec!["a; a@example.com; x4312", "b; b@example.com; x8452"]);
    Ok(())
}

#[test]
fn co_group_by_key_keeps_keys_from_either_side() -> anyhow::Result<()> {
    let out = assert_seq_par_agree(4, || {
        let p = Pipeline::default();
        let left = from_vec(&p, vec![("k1", 1u32), ("k2", 2), ("k1", 3)]);
        let right = from_vec(&p, vec![("k3", 'c'), ("k1", 'a'), ("k1", 'b')]);
        left.co_group_by_key(right).unwrap()
    })?;
    assert_eq!(
        out,
        vec![
            ("k1", (vec![1, 3], vec!['a', 'b'])),
            ("k2", (vec![2], vec![])),
            ("k3", (vec![], vec!['c'])),
        ]
    );
    Ok(())
}

#[test]
fn co_grouped_values_can_be_combined_further() -> anyhow::Result<()> {
    let p = Pipeline::default();
    let orders = from_vec(&p, vec![("ann", 5u32), ("bob", 3), ("ann", 7)]);
    let refunds = from_vec(&p, vec![("ann", 2u32)]);
    let net = orders
        .co_group_by_key(refunds)?
        .map_values(|(o, r): &(Vec<u32>, Vec<u32>)| o.iter().sum::<u32>() - r.iter().sum::<u32>())
        .combine_values(Sum::<u32>::new())
        .collect_par(Some(2), Some(2))?;
    assert_kv_collections_equal(net, vec![("ann", 10), ("bob", 3)]);
    Ok(())
}
