//! Top-K selection

use std::cmp::Ordering;

use crate::types::Signal;

pub struct TopKSignalSelector;

impl TopKSignalSelector {
    /// Impact desc, magnitude desc, uniqueness desc, then metric ordinal asc.
    ///
    /// The ordinal makes the order total: two signals for one entity never
    /// share a metric.
    pub fn compare(a: &Signal, b: &Signal) -> Ordering {
        b.business_impact
            .cmp(&a.business_impact)
            .then_with(|| b.change_magnitude.total_cmp(&a.change_magnitude))
            .then_with(|| b.uniqueness_score.total_cmp(&a.uniqueness_score))
            .then_with(|| a.metric.ordinal().cmp(&b.metric.ordinal()))
    }

    pub fn select(mut signals: Vec<Signal>, k: usize) -> Vec<Signal> {
        signals.sort_by(Self::compare);
        signals.truncate(k);
        signals
    }
}
