use regex::Regex;
use windbeam::testing::*;
use windbeam::*;

fn lines(p: &Pipeline, text: &[&str]) -> PCollection<String> {
    from_vec(p, text.iter().map(|s| s.to_string()).collect())
}

#[test]
fn word_count_single_line() -> anyhow::Result<()> {
    let p = Pipeline::default();
    let counts = lines(&p, &["a bb ccc bb bb a"]).count_words().collect_seq()?;
    assert_kv_collections_equal(counts, vec![("a".into(), 2), ("bb".into(), 3), ("ccc".into(), 1)]);
    Ok(())
}

#[test]
fn word_count_across_lines_in_parallel() -> anyhow::Result<()> {
    let counts = assert_seq_par_agree(2, || {
        let p = Pipeline::default();
        lines(&p, &["abc def ghi", " abc jkl"]).count_words()
    })?;
    assert_kv_collections_equal(
        counts,
        vec![("abc".into(), 2), ("def".into(), 1), ("ghi".into(), 1), ("jkl".into(), 1)],
    );
    Ok(())
}

#[test]
fn formatted_counts() -> anyhow::Result<()> {
    let p = Pipeline::default();
    let mut out = lines(&p, &["to be or not to be"])
        .count_words()
        .map(|(w, n): &(String, u64)| format!("{w}: {n}"))
        .collect_seq()?;
    out.sort();
    assert_eq!(out, vec!["be: 2", "not: 1", "or: 1", "to: 2"]);
    Ok(())
}

struct ComputeWordLengths;

impl PTransform<String, usize> for ComputeWordLengths {
    fn expand(&self, input: PCollection<String>) -> anyhow::Result<PCollection<usize>> {
        Ok(input.map(|w: &String| w.len()))
    }
}

#[test]
fn composite_transform() -> anyhow::Result<()> {
    let p = TestPipeline::new();
    let out = lines(&p, &["a", "bb", "ccc"]).apply(&ComputeWordLengths)?.collect_seq()?;
    assert_eq!(out, vec![1, 2, 3]);
    Ok(())
}

#[test]
fn closure_as_composite_transform() -> anyhow::Result<()> {
    let p = Pipeline::default();
    let count_long = |words: PCollection<String>| -> anyhow::Result<PCollection<(String, u64)>> {
        Ok(words.filter(|w: &String| w.len() > 2).count_per_element())
    };
    let out = lines(&p, &["one two three", "three four"]).split_words().apply(&count_long)?.collect_seq()?;
    assert_kv_collections_equal(
        out,
        vec![("four".into(), 1), ("one".into(), 1), ("three".into(), 2), ("two".into(), 1)],
    );
    Ok(())
}

#[test]
fn side_inputs_filter_words() -> anyhow::Result<()> {
    let p = Pipeline::default();
    let words = || lines(&p, &["a", "bb", "ccc", "dddd"]);

    // List side input: inclusive length bounds.
    let small = words()
        .filter_with_side(side_vec(vec![0usize, 3]), |w: &String, b: &[usize]| (b[0]..=b[1]).contains(&w.len()))
        .collect_seq()?;
    assert_eq!(small, vec!["a", "bb", "ccc"]);

    // Singleton side input computed by a separate pass.
    let avg = words().map(|w: &String| w.len() as f64).combine_globally(Mean).to_singleton_side()?;
    assert_f64_near(*avg.0, 2.5, 1e-12);

    let larger = words()
        .flat_map_with_side(avg.clone(), |w: &String, avg: &f64| {
            if w.len() as f64 > *avg { vec![w.clone()] } else { vec![] }
        })
        .collect_seq()?;
    assert_eq!(larger, vec!["ccc", "dddd"]);

    let between = words()
        .flat_map_with_side(avg, |w: &String, avg: &f64| {
            let n = w.len() as f64;
            if (2.0..=*avg).contains(&n) { vec![w.clone()] } else { vec![] }
        })
        .collect_seq()?;
    assert_eq!(between, vec!["bb"]);
    Ok(())
}

#[test]
fn singleton_side_input_requires_one_element() -> anyhow::Result<()> {
    let p = Pipeline::default();
    let res = from_vec(&p, vec![1u8, 2]).to_singleton_side().map(|_| ());
    assert_flow_error(res, |e| matches!(e, FlowError::Invariant(_)));
    Ok(())
}

#[test]
fn map_with_list_side_input() -> anyhow::Result<()> {
    let p = Pipeline::default();
    let names = from_vec(&p, vec!["zero".to_string(), "one".into(), "two".into()]).to_list_side()?;
    let out = from_vec(&p, vec![2usize, 0, 1, 2])
        .map_with_side(names, |i: &usize, names: &[String]| names[*i].clone())
        .collect_seq()?;
    assert_eq!(out, vec!["two", "zero", "one", "two"]);
    Ok(())
}

#[test]
fn debugging_filter_keeps_matching_words() -> anyhow::Result<()> {
    let p = Pipeline::default();
    let wanted = Regex::new("Flourish|stomach")?;
    let filtered = lines(&p, &["Flourish the stomach", "Flourish again, stomach", "nothing here", "Flourish"])
        .count_words()
        .filter(move |(w, _): &(String, u64)| wanted.is_match(w))
        .collect_seq()?;

    assert_kv_collections_equal(filtered, vec![("Flourish".into(), 3), ("stomach".into(), 2)]);
    Ok(())
}
