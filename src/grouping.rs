//! Grouping by `(key, window)` with session merging.
//!
//! A [`GroupingEngine`] owns one accumulator per live `(key, window)` bucket and
//! feeds values into it through a [`CombineFn`]. Buffered grouping is the
//! [`ToList`](crate::combiners::ToList) combiner; every other combiner is fed
//! directly, so no values are kept beyond the accumulator.
//!
//! For non-merging window functions buckets are looked up by window. For
//! merging window functions (sessions) each key keeps an arena of window slots
//! addressed by index. A new slot is merged with every live slot of the same key
//! whose interval intersects or touches it, repeatedly, until no overlap is left.
//! Merged-away slots point at their surviving root and their accumulator is
//! folded into the root via [`CombineFn::merge`].
//!
//! Live session roots of a key never overlap or touch, so ordering them by start
//! also orders them by end. They are indexed by start, and only the neighbour
//! just before a new window's end has to be inspected per merge step. Dead slots
//! are compacted away once they outnumber the live ones, so one long session
//! costs `O(n log n)` time and constant arena space.
//!
//! Results are emitted only by [`GroupingEngine::drain`], once the bounded input
//! is exhausted. Order across keys is unspecified.

use crate::collection::CombineFn;
use crate::error::{FlowError, FlowResult};
use crate::window::{TimestampMs, Window};
use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::trace;

struct Slot<A> {
    window: Window,
    /// `None` once merged into another slot.
    acc: Option<A>,
}

/// Buckets of one key.
struct KeyBuckets<A> {
    slots: Vec<Slot<A>>,
    parent: Vec<usize>,
    /// Live root per window; used on the non-merging path.
    by_window: HashMap<Window, usize>,
    /// Live session roots by `(start, slot)`; used on the merging path.
    by_start: BTreeSet<(TimestampMs, usize)>,
}

/// Arenas smaller than this are never compacted.
const COMPACT_MIN_SLOTS: usize = 64;

impl<A> Default for KeyBuckets<A> {
    fn default() -> Self {
        Self { slots: Vec::new(), parent: Vec::new(), by_window: HashMap::new(), by_start: BTreeSet::new() }
    }
}

impl<A> KeyBuckets<A> {
    fn push(&mut self, window: Window, acc: A) -> usize {
        let idx = self.slots.len();
        self.slots.push(Slot { window, acc: Some(acc) });
        self.parent.push(idx);
        idx
    }

    fn is_root(&self, idx: usize) -> bool {
        self.parent[idx] == idx
    }

    /// Live indexed root whose window intersects or touches `w`.
    fn overlapping(&self, w: &Window) -> Option<usize> {
        let &(_, j) = self.by_start.range(..=(w.end, usize::MAX)).next_back()?;
        self.slots[j].window.overlaps_or_adjacent(w).then_some(j)
    }

    fn index(&mut self, idx: usize) {
        self.by_start.insert((self.slots[idx].window.start, idx));
    }

    fn unindex(&mut self, idx: usize) {
        self.by_start.remove(&(self.slots[idx].window.start, idx));
    }

    /// Drop merged-away session slots once they outnumber the live roots.
    /// Surviving slots keep their relative order.
    fn compact(&mut self) {
        let live = self.by_start.len();
        if self.slots.len() < COMPACT_MIN_SLOTS || self.slots.len() < 2 * live {
            return;
        }
        let old = std::mem::take(&mut self.slots);
        self.parent.clear();
        self.by_start.clear();
        for slot in old {
            if let Some(acc) = slot.acc {
                let idx = self.push(slot.window, acc);
                self.index(idx);
            }
        }
        trace!(live = live, "compacted session arena");
    }

    fn live(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.slots.len()).filter(|&i| self.is_root(i))
    }
}

/// Per-`(key, window)` accumulation with emit-on-drain semantics.
pub struct GroupingEngine<K, V, A, O, C> {
    comb: Arc<C>,
    merging: bool,
    keys: HashMap<K, KeyBuckets<A>>,
    _m: PhantomData<fn(V) -> O>,
}

impl<K, V, A, O, C> GroupingEngine<K, V, A, O, C>
where
    K: Eq + Hash,
    C: CombineFn<V, A, O>,
{
    /// `merging` enables session-style merging of overlapping windows.
    pub fn new(comb: Arc<C>, merging: bool) -> Self {
        Self { comb, merging, keys: HashMap::new(), _m: PhantomData }
    }

    /// Feed one value into the bucket for `(key, window)`.
    pub fn add(&mut self, key: K, window: Window, value: V) -> FlowResult<()> {
        let comb = Arc::clone(&self.comb);
        let buckets = self.keys.entry(key).or_default();
        if self.merging {
            let mut acc = comb.create();
            comb.add_input(&mut acc, value);
            let idx = buckets.push(window, acc);
            merge_overlaps(comb.as_ref(), buckets, idx)?;
        } else {
            let idx = match buckets.by_window.get(&window) {
                Some(&i) => i,
                None => {
                    let i = buckets.push(window, comb.create());
                    buckets.by_window.insert(window, i);
                    i
                }
            };
            let acc = live_acc(buckets, idx)?;
            comb.add_input(acc, value);
        }
        Ok(())
    }

    /// Insert a partial accumulator for `(key, window)`, merging it with
    /// whatever the engine already holds for that bucket.
    pub fn add_accumulator(&mut self, key: K, window: Window, acc: A) -> FlowResult<()> {
        let comb = Arc::clone(&self.comb);
        let buckets = self.keys.entry(key).or_default();
        if self.merging {
            let idx = buckets.push(window, acc);
            merge_overlaps(comb.as_ref(), buckets, idx)?;
        } else if let Some(&i) = buckets.by_window.get(&window) {
            comb.merge(live_acc(buckets, i)?, acc)?;
        } else {
            let i = buckets.push(window, acc);
            buckets.by_window.insert(window, i);
        }
        Ok(())
    }

    /// Merge every bucket of `other` into this engine.
    pub fn absorb(&mut self, other: Self) -> FlowResult<()>
    where
        K: Clone,
    {
        for (key, mut buckets) in other.keys {
            let roots: Vec<usize> = buckets.live().collect();
            for i in roots {
                let slot = &mut buckets.slots[i];
                let acc = slot
                    .acc
                    .take()
                    .ok_or_else(|| FlowError::invariant("live bucket without accumulator"))?;
                self.add_accumulator(key.clone(), slot.window, acc)?;
            }
        }
        Ok(())
    }

    /// Number of live `(key, window)` buckets.
    pub fn len(&self) -> usize {
        self.keys.values().map(|b| b.live().count()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Finalize every bucket: `finish` runs exactly once per live `(key, window)`.
    pub fn drain(self) -> FlowResult<Vec<(K, Window, O)>>
    where
        K: Clone,
    {
        let comb = self.comb;
        let mut out = Vec::new();
        for (key, buckets) in self.keys {
            for i in buckets.live() {
                let slot = &buckets.slots[i];
                let acc = slot
                    .acc
                    .as_ref()
                    .ok_or_else(|| FlowError::invariant("live bucket without accumulator"))?;
                out.push((key.clone(), slot.window, comb.finish(acc)));
            }
        }
        Ok(out)
    }
}

fn live_acc<A>(buckets: &mut KeyBuckets<A>, idx: usize) -> FlowResult<&mut A> {
    buckets.slots[idx]
        .acc
        .as_mut()
        .ok_or_else(|| FlowError::invariant(format!("bucket {idx} has no accumulator")))
}

/// Merge slot `idx` with overlapping live slots until none remain, then index
/// the survivor. The older slot survives so earlier arrivals stay first in the
/// accumulator.
fn merge_overlaps<V, A, O, C>(comb: &C, buckets: &mut KeyBuckets<A>, idx: usize) -> FlowResult<()>
where
    C: CombineFn<V, A, O>,
{
    let mut cur = idx;
    while let Some(other) = buckets.overlapping(&buckets.slots[cur].window) {
        buckets.unindex(other);
        let (root, child) = if other < cur { (other, cur) } else { (cur, other) };
        let child_acc = buckets.slots[child]
            .acc
            .take()
            .ok_or_else(|| FlowError::invariant(format!("session slot {child} already merged")))?;
        let merged = buckets.slots[root].window.span(&buckets.slots[child].window);
        trace!(
            root = root,
            child = child,
            start = merged.start,
            end = merged.end,
            "merging session windows"
        );
        buckets.slots[root].window = merged;
        comb.merge(live_acc(buckets, root)?, child_acc)?;
        buckets.parent[child] = root;
        cur = root;
    }
    buckets.index(cur);
    buckets.compact();
    Ok(())
}
