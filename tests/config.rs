use std::fs;
use tempfile::tempdir;
use windbeam::combiners::CustomNumeric;
use windbeam::config::{CombinerKind, WindowKind};
use windbeam::testing::*;
use windbeam::*;

fn readings(p: &Pipeline) -> PCollection<(&'static str, Timestamped<f64>)> {
    from_vec(
        p,
        vec![
            ("s1", Timestamped::new(22, 1.0)),
            ("s1", Timestamped::new(33, 2.0)),
            ("s1", Timestamped::new(55, 3.0)),
            ("s2", Timestamped::new(100, 4.0)),
            ("s2", Timestamped::new(115, 6.0)),
            ("s1", Timestamped::new(120, 8.0)),
        ],
    )
}

#[test]
fn camel_case_config_drives_fixed_sums() -> anyhow::Result<()> {
    let cfg = PipelineConfig::from_json_str(r#"{"windowKind": "fixed", "size": 60, "combiner": "sum"}"#)?;
    assert_eq!(cfg.window_kind, WindowKind::Fixed);
    assert_eq!(cfg.combiner, CombinerKind::Sum);

    let p = Pipeline::default();
    let out = readings(&p).aggregate_configured(&cfg, None)?.collect_with(&cfg.runner())?;
    assert_windowed_equal(
        out,
        vec![("s1", Window::new(0, 60), 6.0), ("s1", Window::new(120, 180), 8.0), ("s2", Window::new(60, 120), 10.0)],
    );
    Ok(())
}

#[test]
fn session_mean_in_parallel() -> anyhow::Result<()> {
    let cfg = PipelineConfig::from_json_str(
        r#"{"windowKind": "sessions", "gap": 30, "combiner": "mean", "threads": 2, "partitions": 3}"#,
    )?;
    let p = Pipeline::default();
    let out = readings(&p).aggregate_configured(&cfg, None)?.collect_with(&cfg.runner())?;

    // s1: 22..55 chain into [22,85); 120 starts a new session.
    assert_windowed_equal(
        out,
        vec![("s1", Window::new(22, 85), 2.0), ("s1", Window::new(120, 150), 8.0), ("s2", Window::new(100, 145), 5.0)],
    );
    Ok(())
}

#[test]
fn custom_combiner_from_config() -> anyhow::Result<()> {
    let cfg = PipelineConfig::from_json_str(r#"{"windowKind": "global", "combiner": "custom"}"#)?;
    let range: CustomNumeric = CombineFns::from_values_fn(|vs: &[f64]| {
        let max = vs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = vs.iter().copied().fold(f64::INFINITY, f64::min);
        max - min
    });

    let p = Pipeline::default();
    let out = readings(&p).aggregate_configured(&cfg, Some(range))?.collect_seq()?;
    assert_windowed_equal(out, vec![("s1", Window::global(), 7.0), ("s2", Window::global(), 2.0)]);
    Ok(())
}

#[test]
fn custom_combiner_must_be_supplied() -> anyhow::Result<()> {
    let cfg = PipelineConfig::from_json_str(r#"{"combiner": "custom"}"#)?;
    let p = Pipeline::default();
    let res = readings(&p).aggregate_configured(&cfg, None).map(|_| ());
    assert_flow_error(res, |e| matches!(e, FlowError::Config(_)));
    Ok(())
}

#[test]
fn invalid_window_parameters_are_window_spec_errors() -> anyhow::Result<()> {
    let cfg = PipelineConfig::from_json_str(r#"{"windowKind": "sliding", "size": 10, "period": 0}"#)?;
    assert_flow_error(cfg.window_fn(), |e| matches!(e, FlowError::InvalidWindowSpec(_)));

    let cfg = PipelineConfig::from_json_str(r#"{"windowKind": "session"}"#)?;
    assert_flow_error(cfg.window_fn(), |e| matches!(e, FlowError::Config(_)));
    Ok(())
}

#[test]
fn malformed_config_is_a_config_error() {
    assert_flow_error(PipelineConfig::from_json_str("{"), |e| matches!(e, FlowError::Config(_)));
    assert_flow_error(PipelineConfig::from_json_str(r#"{"windowKind": "hourly"}"#), |e| {
        matches!(e, FlowError::Config(_))
    });
}

#[test]
fn config_loads_from_file() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("pipeline.json");
    fs::write(&path, r#"{"windowKind": "sliding", "size": 30, "period": 5, "offset": 2, "timeoutMs": 5000}"#)?;

    let cfg = PipelineConfig::from_path(&path)?;
    assert_eq!(cfg.window_fn()?, WindowFn::Sliding { size: 30, period: 5, offset: 2 });
    assert_eq!(cfg.runner().timeout, Some(std::time::Duration::from_millis(5000)));
    assert!(matches!(cfg.runner().mode, ExecMode::Sequential));
    Ok(())
}

#[test]
fn defaults_are_global_sum() -> anyhow::Result<()> {
    let cfg = PipelineConfig::from_json_str("{}")?;
    let p = Pipeline::default();
    let out = readings(&p).aggregate_configured(&cfg, None)?.collect_seq()?;
    assert_windowed_equal(out, vec![("s1", Window::global(), 14.0), ("s2", Window::global(), 10.0)]);
    Ok(())
}
