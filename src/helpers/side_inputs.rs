//! Read-only side inputs.
//!
//! A side input is materialized before the main pass and shared by every
//! element (and every partition) through an `Arc`.
//!
//! - [`side_vec`] -- a list, seen by the closure as `&[S]`.
//! - [`side_singleton`] -- a single value, seen as `&S`.
//! - [`PCollection::to_singleton_side`] -- runs a (sub)pipeline that must yield
//!   exactly one element, e.g. the output of `combine_globally`.

use crate::error::FlowError;
use crate::{PCollection, RFBound};
use anyhow::Result;
use std::sync::Arc;

/// A list side input.
#[derive(Clone)]
pub struct SideInput<T>(pub Arc<Vec<T>>);

/// A single-value side input.
#[derive(Clone)]
pub struct SideSingleton<T>(pub Arc<T>);

pub fn side_vec<T: RFBound>(v: Vec<T>) -> SideInput<T> {
    SideInput(Arc::new(v))
}

pub fn side_singleton<T: RFBound>(v: T) -> SideSingleton<T> {
    SideSingleton(Arc::new(v))
}

impl<T: RFBound> PCollection<T> {
    /// Map with read-only side input vector (e.g., lookup table)
    pub fn map_with_side<O, S, F>(self, side: SideInput<S>, f: F) -> PCollection<O>
    where
        O: RFBound,
        S: RFBound,
        F: 'static + Send + Sync + Fn(&T, &[S]) -> O,
    {
        let side_arc = side.0;
        self.map(move |t: &T| f(t, &side_arc))
    }

    /// Filter using side input
    pub fn filter_with_side<S, F>(self, side: SideInput<S>, pred: F) -> PCollection<T>
    where
        S: RFBound,
        F: 'static + Send + Sync + Fn(&T, &[S]) -> bool,
    {
        let side_arc = side.0;
        self.filter(move |t: &T| pred(t, &side_arc))
    }

    /// Flat-map with a singleton side input, e.g. a length cutoff computed upstream.
    pub fn flat_map_with_side<O, S, F>(self, side: SideSingleton<S>, f: F) -> PCollection<O>
    where
        O: RFBound,
        S: RFBound,
        F: 'static + Send + Sync + Fn(&T, &S) -> Vec<O>,
    {
        let side_arc = side.0;
        self.flat_map(move |t: &T| f(t, &side_arc))
    }

    /// Execute this collection and wrap its only element as a side input.
    ///
    /// Fails with [`FlowError::Invariant`] unless exactly one element is produced.
    pub fn to_singleton_side(self) -> Result<SideSingleton<T>> {
        let mut out = self.collect_seq()?;
        if out.len() != 1 {
            return Err(FlowError::invariant(format!(
                "singleton side input produced {} elements",
                out.len()
            ))
            .into());
        }
        let v = out.pop().ok_or_else(|| FlowError::invariant("singleton side input is empty"))?;
        Ok(side_singleton(v))
    }

    /// Execute this collection and wrap all of its elements as a list side input.
    pub fn to_list_side(self) -> Result<SideInput<T>> {
        Ok(side_vec(self.collect_seq()?))
    }
}
