//! Pipeline configuration.
//!
//! A [`PipelineConfig`] picks the window function, the numeric combiner and
//! the execution settings of a pass. It deserializes from JSON with camelCase
//! keys; snake_case spellings are accepted too.
//!
//! ```
//! use windbeam::config::PipelineConfig;
//!
//! let cfg = PipelineConfig::from_json_str(r#"{"windowKind": "sliding", "size": 30, "period": 5, "combiner": "sum"}"#)?;
//! assert_eq!(cfg.window_fn()?, windbeam::WindowFn::Sliding { size: 30, period: 5, offset: 0 });
//! assert!(matches!(cfg.combiner(None)?, windbeam::NumericCombiner::Sum));
//! # anyhow::Result::<()>::Ok(())
//! ```

use crate::combiners::{CustomNumeric, NumericCombiner};
use crate::error::FlowError;
use crate::runner::{ExecMode, Runner};
use crate::windowing::WindowFn;
use crate::{PCollection, RFBound, Timestamped, Window};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::hash::Hash;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowKind {
    Fixed,
    Sliding,
    #[serde(alias = "sessions")]
    Session,
    #[default]
    Global,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombinerKind {
    #[default]
    Sum,
    Min,
    Mean,
    Custom,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PipelineConfig {
    #[serde(default, alias = "window_kind")]
    pub window_kind: WindowKind,
    #[serde(default)]
    pub size: Option<i64>,
    #[serde(default)]
    pub period: Option<i64>,
    #[serde(default)]
    pub gap: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
    #[serde(default)]
    pub combiner: CombinerKind,

    /// Run on a thread pool when set.
    #[serde(default)]
    pub threads: Option<usize>,
    #[serde(default)]
    pub partitions: Option<usize>,
    #[serde(default, alias = "timeout_ms")]
    pub timeout_ms: Option<u64>,
}

fn config_err(msg: impl Into<String>) -> FlowError {
    FlowError::Config(msg.into())
}

impl PipelineConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        let cfg: PipelineConfig =
            serde_json::from_str(s).map_err(|e| config_err(format!("invalid pipeline config: {e}")))?;
        debug!(window = ?cfg.window_kind, combiner = ?cfg.combiner, "pipeline config loaded");
        Ok(cfg)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("load config {}", path.display()))
    }

    fn require(&self, field: &str, v: Option<i64>) -> Result<i64, FlowError> {
        v.ok_or_else(|| config_err(format!("{:?} windows need `{field}`", self.window_kind)))
    }

    /// The configured window function.
    ///
    /// Missing parameters are a [`FlowError::Config`]; non-positive ones an
    /// [`FlowError::InvalidWindowSpec`].
    pub fn window_fn(&self) -> Result<WindowFn> {
        let offset = self.offset.unwrap_or(0);
        let wf = match self.window_kind {
            WindowKind::Fixed => WindowFn::fixed_with_offset(self.require("size", self.size)?, offset)?,
            WindowKind::Sliding => WindowFn::sliding_with_offset(
                self.require("size", self.size)?,
                self.require("period", self.period)?,
                offset,
            )?,
            WindowKind::Session => WindowFn::sessions(self.require("gap", self.gap)?)?,
            WindowKind::Global => WindowFn::Global,
        };
        Ok(wf)
    }

    /// The configured combiner. `custom` must be supplied when the config
    /// names the custom combiner and is ignored otherwise.
    pub fn combiner(&self, custom: Option<CustomNumeric>) -> Result<NumericCombiner> {
        Ok(match self.combiner {
            CombinerKind::Sum => NumericCombiner::Sum,
            CombinerKind::Min => NumericCombiner::Min,
            CombinerKind::Mean => NumericCombiner::Mean,
            CombinerKind::Custom => NumericCombiner::Custom(
                custom.ok_or_else(|| config_err("combiner \"custom\" requires a user-supplied combine function"))?,
            ),
        })
    }

    /// Execution settings: parallel when `threads` or `partitions` is set.
    pub fn runner(&self) -> Runner {
        let mode = if self.threads.is_some() || self.partitions.is_some() {
            ExecMode::Parallel { threads: self.threads, partitions: self.partitions }
        } else {
            ExecMode::Sequential
        };
        Runner { mode, timeout: self.timeout_ms.map(Duration::from_millis), ..Default::default() }
    }
}

impl<K: RFBound + Eq + Hash> PCollection<(K, Timestamped<f64>)> {
    /// Window and combine per key as `cfg` describes.
    pub fn aggregate_configured(
        self,
        cfg: &PipelineConfig,
        custom: Option<CustomNumeric>,
    ) -> Result<PCollection<(K, Window, f64)>> {
        let wf = cfg.window_fn()?;
        let comb = cfg.combiner(custom)?;
        Ok(self.window_into(wf).combine_per_key_and_window(comb))
    }
}
