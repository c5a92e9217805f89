use windbeam::testing::*;
use windbeam::*;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Routed {
    Word(String),
    Len(usize),
}

fn route_word(w: &String) -> Vec<TaggedOutput<Routed>> {
    if w.starts_with('x') {
        vec![TaggedOutput::tagged("marked", Routed::Word(w.clone()))]
    } else if w.len() <= 2 {
        vec![TaggedOutput::main(Routed::Word(w.clone()))]
    } else {
        vec![TaggedOutput::tagged("above", Routed::Len(w.len()))]
    }
}

fn words(p: &Pipeline) -> PCollection<String> {
    from_vec(p, ["a", "an", "the", "music", "xyz"].map(String::from).to_vec())
}

#[test]
fn declared_channels_split_words() -> anyhow::Result<()> {
    let p = Pipeline::default();
    let out = words(&p)
        .par_do_with_outputs(OutputTags::declared("below", ["above", "marked"]), route_word)
        .collect_seq()?;

    assert_eq!(out.main(), &[Routed::Word("a".into()), Routed::Word("an".into())]);
    assert_eq!(out.get(Some("below"))?, out.main());
    assert_eq!(out.get(Some("above"))?, &[Routed::Len(3), Routed::Len(5)]);
    assert_eq!(out.get(Some("marked"))?, &[Routed::Word("xyz".into())]);
    assert_eq!(out.tags(), vec![None, Some("above".to_string()), Some("marked".to_string())]);
    Ok(())
}

#[test]
fn emission_to_undeclared_tag_fails() -> anyhow::Result<()> {
    let p = Pipeline::default();
    let res = words(&p).par_do_with_outputs(OutputTags::declared("below", ["above"]), route_word).collect_seq();
    assert_flow_error(res, |e| matches!(e, FlowError::UnknownTag { tag: Some(t), .. } if t == "marked"));
    Ok(())
}

#[test]
fn lookup_of_undeclared_tag_fails() -> anyhow::Result<()> {
    let p = Pipeline::default();
    let multi = words(&p).par_do_with_outputs(OutputTags::declared("below", ["above", "marked"]), route_word);
    assert!(matches!(
        multi.channel(Some("missing")).map(|_| ()).unwrap_err().downcast_ref::<FlowError>(),
        Some(FlowError::UnknownTag { .. })
    ));

    let out = multi.collect_seq()?;
    assert!(matches!(out.get(Some("missing")), Err(FlowError::UnknownTag { .. })));
    Ok(())
}

#[test]
fn undeclared_tags_become_channels() -> anyhow::Result<()> {
    let p = Pipeline::default();
    let out = from_vec(&p, vec![1u32, 2, 3, 4, 5, 10, 20])
        .par_do_with_outputs(OutputTags::undeclared(), |n: &u32| {
            let mut v = vec![TaggedOutput::tagged(if n % 2 == 0 { "evens" } else { "odds" }, *n)];
            if n % 10 == 0 {
                v.push(TaggedOutput::main(*n));
            }
            v
        })
        .collect_par(Some(2), Some(3))?;

    assert_eq!(out.get(Some("evens"))?, &[2, 4, 10, 20]);
    assert_eq!(out.get(Some("odds"))?, &[1, 3, 5]);
    assert_eq!(out.main(), &[10, 20]);
    assert!(out.get(Some("never"))?.is_empty());
    Ok(())
}

#[test]
fn channel_feeds_further_transforms() -> anyhow::Result<()> {
    let p = Pipeline::default();
    let multi = words(&p).par_do_with_outputs(OutputTags::declared("below", ["above", "marked"]), route_word);

    let total_len = multi
        .channel(Some("above"))?
        .map(|r: &Routed| match r {
            Routed::Len(n) => *n as u64,
            Routed::Word(_) => 0,
        })
        .combine_globally(Sum::<u64>::new())
        .collect_seq()?;
    assert_eq!(total_len, vec![8]);

    let main = multi.channel(None)?.collect_seq()?;
    assert_eq!(main.len(), 2);
    Ok(())
}

#[test]
fn partition_by_percentile() -> anyhow::Result<()> {
    let p = Pipeline::default();
    let scores = vec![17u32, 42, 64, 32, 0, 99, 53, 89];
    let out = from_vec(&p, scores)
        .partition(10, |s: &u32, n| (*s as usize * n / 100).min(n - 1))
        .collect_par(Some(2), Some(4))?;

    assert!(out.main().is_empty());
    assert_eq!(out.get(Some("0"))?, &[0]);
    assert_eq!(out.get(Some("1"))?, &[17]);
    assert_eq!(out.get(Some("3"))?, &[32]);
    assert_eq!(out.get(Some("4"))?, &[42]);
    assert_eq!(out.get(Some("5"))?, &[53]);
    assert_eq!(out.get(Some("6"))?, &[64]);
    assert_eq!(out.get(Some("8"))?, &[89]);
    assert_eq!(out.get(Some("9"))?, &[99]);
    assert!(out.get(Some("2"))?.is_empty());
    assert!(matches!(out.get(Some("10")), Err(FlowError::UnknownTag { .. })));
    Ok(())
}

#[test]
fn partition_index_out_of_range_fails() -> anyhow::Result<()> {
    let p = Pipeline::default();
    let res = from_vec(&p, vec![1u32, 2, 3]).partition(2, |x: &u32, _| *x as usize).collect_seq();
    assert_flow_error(res, |e| matches!(e, FlowError::UnknownTag { .. }));
    Ok(())
}

#[test]
fn dispatcher_runs_without_a_pipeline() -> anyhow::Result<()> {
    let d = Dispatcher::new(OutputTags::undeclared(), |x: &i32| {
        if *x < 0 { vec![TaggedOutput::tagged("neg", *x)] } else { vec![TaggedOutput::main(*x)] }
    });
    let mut out = d.dispatch(vec![3, -1, 4, -5])?;
    assert_eq!(out.take(Some("neg"))?, vec![-1, -5]);
    assert_eq!(out.into_map().remove(&None), Some(vec![3, 4]));
    Ok(())
}
