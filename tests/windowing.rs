// tests/windowing.rs
use windbeam::testing::*;
use windbeam::*;

/// ('k', x) stamped with x as its event time.
fn stamped(p: &Pipeline, xs: &[i64]) -> PCollection<(&'static str, Timestamped<i64>)> {
    from_vec(p, xs.to_vec()).map(|x: &i64| ("k", Timestamped::new(*x, *x)))
}

fn sorted_sums(out: Vec<(&'static str, Window, i64)>) -> Vec<i64> {
    let mut sums: Vec<i64> = out.into_iter().map(|(_, _, s)| s).collect();
    sums.sort_unstable();
    sums
}

#[test]
fn fixed_windows_sum_per_minute() -> anyhow::Result<()> {
    let p = Pipeline::default();
    let out = stamped(&p, &[22, 33, 55, 100, 115, 120])
        .window_into(WindowFn::fixed(60)?)
        .combine_per_key_and_window(Sum::<i64>::new())
        .collect_seq()?;

    assert_windowed_equal(
        out,
        vec![("k", Window::new(0, 60), 110), ("k", Window::new(60, 120), 215), ("k", Window::new(120, 180), 120)],
    );
    Ok(())
}

#[test]
fn sliding_windows_sum_every_overlap() -> anyhow::Result<()> {
    let p = Pipeline::default();
    let out = stamped(&p, &[2, 16, 23])
        .window_into(WindowFn::sliding(30, 5)?)
        .combine_per_key_and_window(Sum::<i64>::new())
        .collect_seq()?;

    assert_eq!(sorted_sums(out), vec![2, 2, 2, 18, 23, 39, 39, 39, 41, 41]);
    Ok(())
}

#[test]
fn session_windows_merge_within_gap() -> anyhow::Result<()> {
    let p = Pipeline::default();
    let out = stamped(&p, &[2, 11, 16, 27])
        .window_into(WindowFn::sessions(10)?)
        .combine_per_key_and_window(Sum::<i64>::new())
        .collect_seq()?;

    assert_windowed_equal(out, vec![("k", Window::new(2, 26), 29), ("k", Window::new(27, 37), 27)]);
    Ok(())
}

#[test]
fn session_merge_is_order_independent() -> anyhow::Result<()> {
    // [20,30) bridges [12,22) and [27,37).
    for order in [[12, 27, 20], [20, 12, 27], [27, 12, 20]] {
        let p = Pipeline::default();
        let out = stamped(&p, &order)
            .window_into(WindowFn::sessions(10)?)
            .group_by_key_and_window()
            .collect_seq()?;
        assert_eq!(out.len(), 1, "order {order:?}");
        let (_, w, mut vs) = out.into_iter().next().unwrap();
        vs.sort_unstable();
        assert_eq!(w, Window::new(12, 37));
        assert_eq!(vs, vec![12, 20, 27]);
    }
    Ok(())
}

#[test]
fn sessions_keep_keys_apart() -> anyhow::Result<()> {
    let p = Pipeline::default();
    let rows = vec![
        ("a", Timestamped::new(0, 1u32)),
        ("b", Timestamped::new(5, 1)),
        ("a", Timestamped::new(8, 1)),
        ("b", Timestamped::new(40, 1)),
    ];
    let out = from_vec(&p, rows)
        .window_into(WindowFn::sessions(10)?)
        .combine_per_key_and_window(Count)
        .collect_seq()?;

    assert_windowed_equal(
        out,
        vec![("a", Window::new(0, 18), 2), ("b", Window::new(5, 15), 1), ("b", Window::new(40, 50), 1)],
    );
    Ok(())
}

#[test]
fn global_window_sums_everything() -> anyhow::Result<()> {
    let p = Pipeline::default();
    let out = stamped(&p, &[2, 11, 16, 27])
        .window_into(WindowFn::Global)
        .combine_per_key_and_window(Sum::<i64>::new())
        .collect_seq()?;

    assert_eq!(out, vec![("k", Window::global(), 56)]);
    Ok(())
}

#[test]
fn attached_timestamps_drive_fixed_windows() -> anyhow::Result<()> {
    let p = Pipeline::default();
    let out = from_vec(&p, vec![12i64, 30, 60, 61, 66])
        .map(|x: &i64| ("k", *x))
        .attach_value_timestamps(|_, v| *v)
        .window_into(WindowFn::fixed(60)?)
        .combine_per_key_and_window(Sum::<i64>::new())
        .collect_seq()?;

    assert_eq!(sorted_sums(out), vec![42, 187]);
    Ok(())
}

#[test]
fn group_then_combine_matches_combine_per_key() -> anyhow::Result<()> {
    let p = Pipeline::default();
    let grouped = stamped(&p, &[22, 33, 55, 100, 115, 120])
        .window_into(WindowFn::fixed(60)?)
        .group_by_key_and_window()
        .map(|(k, w, vs): &(&'static str, Window, Vec<i64>)| ((*k, *w), vs.clone()))
        .combine_values_grouped(Sum::<i64>::new())
        .values()
        .collect_seq()?;

    assert_collections_unordered_equal(&grouped, &[110, 215, 120]);
    Ok(())
}

#[test]
fn negative_timestamps_floor_into_windows() -> anyhow::Result<()> {
    let w = WindowFn::fixed(60)?;
    assert_eq!(w.assign(-1), vec![Window::new(-60, 0)]);
    assert_eq!(w.assign(-60), vec![Window::new(-60, 0)]);
    assert_eq!(w.assign(-61), vec![Window::new(-120, -60)]);
    Ok(())
}

#[test]
fn invalid_window_specs_are_rejected() {
    assert!(matches!(WindowFn::fixed(0), Err(FlowError::InvalidWindowSpec(_))));
    assert!(matches!(WindowFn::sliding(30, -5), Err(FlowError::InvalidWindowSpec(_))));
    assert!(matches!(WindowFn::sliding(5, 30), Err(FlowError::InvalidWindowSpec(_))));
    assert!(matches!(WindowFn::sessions(0), Err(FlowError::InvalidWindowSpec(_))));
}

#[test]
fn windowed_results_agree_across_execution_modes() -> anyhow::Result<()> {
    let xs: Vec<i64> = (0..200).map(|i| (i * 37) % 500).collect();
    for wf in [WindowFn::fixed(60)?, WindowFn::sliding(30, 10)?, WindowFn::sessions(7)?] {
        assert_seq_par_agree(7, || {
            let p = Pipeline::default();
            from_vec(&p, xs.clone())
                .map(|x: &i64| (x % 3, Timestamped::new(*x, *x)))
                .window_into(wf)
                .combine_per_key_and_window(Sum::<i64>::new())
        })?;
    }
    Ok(())
}
