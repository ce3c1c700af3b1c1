//! Signal engine: one ranking pass over a store snapshot
//!
//! ```text
//! per entity (parallel), per metric (sequential):
//!   trend -> confidence -> forecast -> classify -> season -> impact
//! per entity:
//!   noise filter -> uniqueness + outlier boost -> top-K
//! ```
//!
//! Recoverable data gaps become omissions on the entity's result; every other
//! error aborts the pass.

use chrono::NaiveDate;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use super::classify::SignalClassifier;
use super::confidence::ConfidenceClassifier;
use super::forecast::Forecaster;
use super::impact::{BusinessImpactScorer, ImpactInput};
use super::noise::NoiseThresholdFilter;
use super::ranking::TopKSignalSelector;
use super::seasonal::SeasonalContextTagger;
use super::trend::TrendEstimator;
use super::uniqueness::UniquenessIndex;
use crate::config::EngineConfig;
use crate::store::MetricSeriesStore;
use crate::types::{
    horizon_period, is_period_start, CategoryShift, ConfidenceLevel, EntityId, ImpactRule,
    MetricName, Omission, RankedSignalSet, Signal, SignalClassification, SignalError,
};

pub struct SignalEngine {
    config: EngineConfig,
    trend: TrendEstimator,
    forecaster: Forecaster,
}

/// Per-run parameters shared by every entity.
struct RunContext<'a> {
    store: &'a MetricSeriesStore,
    index: &'a UniquenessIndex,
    as_of: NaiveDate,
    horizon: usize,
    /// Period `horizon` weeks past `as_of`
    target: NaiveDate,
    top_k: usize,
}

impl SignalEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            trend: TrendEstimator::new(config.trend.window_size),
            forecaster: Forecaster::new(&config.forecast),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Rank signals with the configured horizon and top-K.
    pub fn compute_with_defaults(
        &self,
        store: &MetricSeriesStore,
        entities: &[EntityId],
        as_of: NaiveDate,
    ) -> Result<BTreeMap<EntityId, RankedSignalSet>, SignalError> {
        self.compute_ranked_signals(
            store,
            entities,
            as_of,
            self.config.forecast.horizon,
            self.config.ranking.top_k,
        )
    }

    /// Rank the top `top_k` signals per entity, forecasting `horizon` weeks
    /// past `as_of`.
    ///
    /// An empty `entities` slice ranks every entity in the store. Entities
    /// with no data still get a result, holding only omissions. A zero
    /// horizon, or one that runs past the calendar, is `InvalidRequest`.
    pub fn compute_ranked_signals(
        &self,
        store: &MetricSeriesStore,
        entities: &[EntityId],
        as_of: NaiveDate,
        horizon: usize,
        top_k: usize,
    ) -> Result<BTreeMap<EntityId, RankedSignalSet>, SignalError> {
        if !is_period_start(as_of) {
            return Err(SignalError::MisalignedPeriod(as_of));
        }
        if horizon == 0 {
            return Err(SignalError::InvalidRequest(
                "forecast horizon must be at least one week".to_string(),
            ));
        }
        let target = horizon_period(as_of, horizon)?;

        let selected: BTreeSet<&EntityId> = if entities.is_empty() {
            store.entities().collect()
        } else {
            entities.iter().collect()
        };

        let index = UniquenessIndex::build(store, as_of);
        let ctx = RunContext {
            store,
            index: &index,
            as_of,
            horizon,
            target,
            top_k,
        };

        let results = selected
            .into_par_iter()
            .map(|entity| self.rank_entity(&ctx, entity).map(|set| (entity.clone(), set)))
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        info!(
            as_of = %as_of,
            horizon,
            top_k,
            entities = results.len(),
            signals = results.values().map(|s| s.signals.len()).sum::<usize>(),
            omissions = results.values().map(|s| s.omissions.len()).sum::<usize>(),
            "Ranking pass complete"
        );
        Ok(results)
    }

    fn rank_entity(&self, ctx: &RunContext<'_>, entity: &str) -> Result<RankedSignalSet, SignalError> {
        let mut set = RankedSignalSet::empty(entity, ctx.as_of);
        let mut candidates = Vec::new();

        for metric in MetricName::ALL {
            let detected = if metric.is_categorical() {
                self.detect_pivot(ctx, entity, metric)
            } else {
                self.detect_numeric(ctx, entity, metric)
            };
            match detected {
                Ok(signal) => candidates.push(signal),
                Err(err) => set.omissions.push(Self::omit(entity, metric, err)?),
            }
        }

        let (kept, suppressed) = NoiseThresholdFilter::apply(candidates, &self.config);
        set.suppressed_by_noise_filter = suppressed;

        let mut scored = Vec::with_capacity(kept.len());
        for mut signal in kept {
            let current = ctx
                .store
                .value(entity, signal.metric, ctx.as_of)
                .cloned()
                .ok_or_else(|| SignalError::MissingCurrentValue {
                    entity_id: entity.to_string(),
                    metric: signal.metric,
                    period: ctx.as_of,
                });
            match current.and_then(|value| ctx.index.score(signal.metric, &value)) {
                Ok(uniqueness) => {
                    signal.uniqueness_score = uniqueness;
                    if self.config.ranking.outlier_boost {
                        BusinessImpactScorer::apply_outlier_boost(
                            &mut signal,
                            self.config.ranking.outlier_uniqueness_threshold,
                        );
                    }
                    scored.push(signal);
                }
                Err(err) => set.omissions.push(Self::omit(entity, signal.metric, err)?),
            }
        }

        set.signals = TopKSignalSelector::select(scored, ctx.top_k);
        debug!(
            entity,
            signals = set.signals.len(),
            omissions = set.omissions.len(),
            suppressed,
            "Entity ranked"
        );
        Ok(set)
    }

    /// Turn a recoverable error into an omission, propagating anything else.
    fn omit(entity: &str, metric: MetricName, err: SignalError) -> Result<Omission, SignalError> {
        match Omission::from_error(metric, &err) {
            Some(omission) => {
                debug!(entity, metric = %metric, reason = %err, "Metric omitted");
                Ok(omission)
            }
            None => Err(err),
        }
    }

    fn detect_numeric(
        &self,
        ctx: &RunContext<'_>,
        entity: &str,
        metric: MetricName,
    ) -> Result<Signal, SignalError> {
        let thresholds = self.config.family(metric.family());
        let trend = self.trend.estimate(ctx.store, entity, metric, ctx.as_of)?;
        let current = ctx.store.numeric_value(entity, metric, ctx.as_of);

        let confidence = ConfidenceClassifier::classify(
            metric,
            trend.slope_stddev,
            current.unwrap_or(0.0),
            &thresholds.confidence,
        );
        let forecast = self.forecaster.forecast(&trend, current, ctx.horizon, confidence)?;
        let current = current.unwrap_or(0.0);

        let change = SignalClassifier::measure(metric, current, forecast.point_value);
        let classification = SignalClassifier::classify_change(change.normalized, &thresholds.classification);

        let mut signal = Self::blank_signal(entity, metric, forecast.target_period, classification, confidence);
        signal.change_magnitude = change.magnitude;
        signal.signed_change = change.raw;
        signal.current_value = Some(current);
        signal.trend_p_value = Some(trend.p_value);
        signal.forecast = Some(forecast);
        self.score(&mut signal);
        Ok(signal)
    }

    fn detect_pivot(
        &self,
        ctx: &RunContext<'_>,
        entity: &str,
        metric: MetricName,
    ) -> Result<Signal, SignalError> {
        let (prior, current) = ctx.store.category_transition(entity, metric, ctx.as_of)?;
        let classification = SignalClassifier::classify_categories(&prior, &current);
        let mut signal =
            Self::blank_signal(entity, metric, ctx.target, classification, ConfidenceLevel::Medium);
        if classification == SignalClassification::Pivot {
            signal.category_shift = Some(CategoryShift { from: prior, to: current });
        }
        self.score(&mut signal);
        Ok(signal)
    }

    fn score(&self, signal: &mut Signal) {
        signal.seasonal_context = SeasonalContextTagger::tag(signal.target_period);
        let (impact, rule) = BusinessImpactScorer::score(
            &ImpactInput::from_signal(signal),
            self.config.family(signal.metric.family()),
        );
        signal.business_impact = impact;
        signal.impact_rule = rule;
    }

    fn blank_signal(
        entity: &str,
        metric: MetricName,
        target_period: NaiveDate,
        classification: SignalClassification,
        confidence: ConfidenceLevel,
    ) -> Signal {
        Signal {
            entity_id: entity.to_string(),
            metric,
            target_period,
            classification,
            change_magnitude: 0.0,
            signed_change: 0.0,
            current_value: None,
            forecast: None,
            confidence,
            trend_p_value: None,
            category_shift: None,
            business_impact: 1,
            impact_rule: ImpactRule::Baseline,
            outlier_boosted: false,
            seasonal_context: SeasonalContextTagger::tag(target_period),
            uniqueness_score: 0.0,
            passed_noise_filter: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{offset_period, MetricSample, OmissionKind, SampleValue};

    fn week(n: i64) -> NaiveDate {
        offset_period(NaiveDate::from_ymd_opt(2024, 9, 2).unwrap(), n).unwrap()
    }

    fn push(store: &mut MetricSeriesStore, entity: &str, metric: MetricName, values: &[f64]) {
        for (i, v) in values.iter().enumerate() {
            store
                .ingest(MetricSample {
                    entity_id: entity.to_string(),
                    period_start: week(i as i64),
                    metric,
                    value: SampleValue::Numeric(*v),
                    sample_count: 20,
                })
                .unwrap();
        }
    }

    fn push_labels(store: &mut MetricSeriesStore, entity: &str, metric: MetricName, labels: &[&str]) {
        for (i, l) in labels.iter().enumerate() {
            store
                .ingest(MetricSample {
                    entity_id: entity.to_string(),
                    period_start: week(i as i64),
                    metric,
                    value: SampleValue::Category(l.to_string()),
                    sample_count: 20,
                })
                .unwrap();
        }
    }

    #[test]
    fn misaligned_as_of_rejected() {
        let engine = SignalEngine::new(EngineConfig::default());
        let err = engine
            .compute_ranked_signals(&MetricSeriesStore::new(), &[], NaiveDate::from_ymd_opt(2024, 9, 4).unwrap(), 4, 5)
            .unwrap_err();
        assert!(matches!(err, SignalError::MisalignedPeriod(_)));
    }

    #[test]
    fn zero_horizon_rejected() {
        let engine = SignalEngine::new(EngineConfig::default());
        let err = engine
            .compute_ranked_signals(&MetricSeriesStore::new(), &[], week(4), 0, 5)
            .unwrap_err();
        assert!(matches!(err, SignalError::InvalidRequest(_)));
    }

    #[test]
    fn horizon_past_the_calendar_is_an_error_not_a_panic() {
        let mut store = MetricSeriesStore::new();
        push(&mut store, "acme", MetricName::UrgencyLevel, &[0.30, 0.32, 0.34, 0.36, 0.38]);
        push(&mut store, "beta", MetricName::UrgencyLevel, &[0.30, 0.30, 0.30, 0.30, 0.30]);

        let engine = SignalEngine::new(EngineConfig::default());
        for horizon in [100_000_000, usize::MAX] {
            let err = engine
                .compute_ranked_signals(&store, &[], week(4), horizon, 5)
                .unwrap_err();
            assert!(matches!(err, SignalError::InvalidRequest(_)), "{err}");
        }
        assert!(engine.compute_ranked_signals(&store, &[], week(4), 104, 5).is_ok());
    }

    #[test]
    fn outlier_moderate_change_outranks_market_tracking_one() {
        let mut store = MetricSeriesStore::new();
        // Same moderate climb on two core metrics; the second is slightly smaller
        push(&mut store, "acme", MetricName::UrgencyLevel, &[0.30, 0.3275, 0.355, 0.3825, 0.41]);
        push(&mut store, "acme", MetricName::PromotionalIntensity, &[0.30, 0.32625, 0.3525, 0.37875, 0.405]);
        // The market sits with acme on urgency and far below it on promotions
        for (entity, urgency, promo) in [("beta", 0.41, 0.10), ("gamma", 0.40, 0.10)] {
            for (metric, v) in [(MetricName::UrgencyLevel, urgency), (MetricName::PromotionalIntensity, promo)] {
                store
                    .ingest(MetricSample {
                        entity_id: entity.to_string(),
                        period_start: week(4),
                        metric,
                        value: SampleValue::Numeric(v),
                        sample_count: 20,
                    })
                    .unwrap();
            }
        }

        let acme = ["acme".to_string()];
        let engine = SignalEngine::new(EngineConfig::default());
        let ranked = engine.compute_ranked_signals(&store, &acme, week(4), 4, 5).unwrap();
        let signals = &ranked["acme"].signals;
        let order: Vec<MetricName> = signals.iter().map(|s| s.metric).collect();
        assert_eq!(order, vec![MetricName::PromotionalIntensity, MetricName::UrgencyLevel]);

        let outlier = &signals[0];
        assert!(outlier.outlier_boosted);
        assert_eq!(outlier.business_impact, 4);
        assert_eq!(outlier.impact_rule, ImpactRule::LowMagnitude);
        assert!(outlier.uniqueness_score >= 0.15);

        let tracking = &signals[1];
        assert!(!tracking.outlier_boosted);
        assert_eq!(tracking.business_impact, 3);
        assert!(tracking.uniqueness_score < 0.15);
        assert!(tracking.change_magnitude > outlier.change_magnitude);

        // Without the boost, magnitude decides
        let mut config = EngineConfig::default();
        config.ranking.outlier_boost = false;
        let ranked = SignalEngine::new(config)
            .compute_ranked_signals(&store, &acme, week(4), 4, 5)
            .unwrap();
        let order: Vec<MetricName> = ranked["acme"].signals.iter().map(|s| s.metric).collect();
        assert_eq!(order, vec![MetricName::UrgencyLevel, MetricName::PromotionalIntensity]);
        assert!(ranked["acme"].signals.iter().all(|s| !s.outlier_boosted));
    }

    #[test]
    fn short_history_is_omitted_not_zeroed() {
        let mut store = MetricSeriesStore::new();
        push(&mut store, "acme", MetricName::UrgencyLevel, &[0.3, 0.5]);
        push(&mut store, "beta", MetricName::UrgencyLevel, &[0.3, 0.3]);

        let engine = SignalEngine::new(EngineConfig::default());
        let ranked = engine
            .compute_ranked_signals(&store, &["acme".to_string()], week(1), 4, 5)
            .unwrap();
        let set = &ranked["acme"];
        assert!(set.signals.is_empty());
        assert!(set.omissions.iter().any(|o| {
            o.metric == MetricName::UrgencyLevel && o.kind == OmissionKind::InsufficientHistory
        }));
        assert_eq!(set.omissions.len(), MetricName::ALL.len());
    }

    #[test]
    fn strong_climb_ranks_and_is_unique() {
        let mut store = MetricSeriesStore::new();
        push(&mut store, "acme", MetricName::PromotionalIntensity, &[0.20, 0.30, 0.40, 0.50, 0.60]);
        push(&mut store, "beta", MetricName::PromotionalIntensity, &[0.30, 0.30, 0.30, 0.30, 0.30]);

        let engine = SignalEngine::new(EngineConfig::default());
        let ranked = engine.compute_ranked_signals(&store, &[], week(4), 4, 5).unwrap();
        assert_eq!(ranked.keys().cloned().collect::<Vec<_>>(), vec!["acme", "beta"]);

        let acme = &ranked["acme"];
        assert_eq!(acme.signals.len(), 1);
        let signal = &acme.signals[0];
        assert_eq!(signal.classification, SignalClassification::MajorIncrease);
        assert_eq!(signal.business_impact, 5);
        assert_eq!(signal.confidence, ConfidenceLevel::High);
        assert!(signal.passed_noise_filter);
        assert!((signal.uniqueness_score - 0.15).abs() < 1e-9);
        let forecast = signal.forecast.as_ref().unwrap();
        assert_eq!(forecast.point_value, 1.0);
        assert!(forecast.upper_bound <= 1.0);

        // beta is flat: scored, filtered, not omitted
        assert!(ranked["beta"].signals.is_empty());
        assert_eq!(ranked["beta"].suppressed_by_noise_filter, 1);
    }

    #[test]
    fn category_flip_is_pivot_signal() {
        let mut store = MetricSeriesStore::new();
        push_labels(&mut store, "acme", MetricName::DominantMessageAngle, &["lifestyle", "price"]);
        push_labels(&mut store, "beta", MetricName::DominantMessageAngle, &["lifestyle", "lifestyle"]);

        let engine = SignalEngine::new(EngineConfig::default());
        let ranked = engine.compute_ranked_signals(&store, &[], week(1), 4, 5).unwrap();
        let pivot = &ranked["acme"].signals[0];
        assert_eq!(pivot.classification, SignalClassification::Pivot);
        assert_eq!(pivot.change_magnitude, 0.0);
        assert_eq!(pivot.business_impact, 5);
        assert_eq!(pivot.impact_rule, ImpactRule::CriticalPivot);
        assert_eq!(
            pivot.category_shift,
            Some(CategoryShift {
                from: "lifestyle".to_string(),
                to: "price".to_string()
            })
        );
        assert!((pivot.uniqueness_score - 0.5).abs() < 1e-12);
    }

    #[test]
    fn lone_entity_uniqueness_is_omitted() {
        let mut store = MetricSeriesStore::new();
        push(&mut store, "acme", MetricName::PromotionalIntensity, &[0.20, 0.30, 0.40, 0.50, 0.60]);

        let engine = SignalEngine::new(EngineConfig::default());
        let ranked = engine.compute_ranked_signals(&store, &[], week(4), 4, 5).unwrap();
        let set = &ranked["acme"];
        assert!(set.signals.is_empty());
        assert!(set.omissions.iter().any(|o| {
            o.metric == MetricName::PromotionalIntensity && o.kind == OmissionKind::MissingCrossEntityData
        }));
    }

    #[test]
    fn unknown_entity_gets_only_omissions() {
        let engine = SignalEngine::new(EngineConfig::default());
        let ranked = engine
            .compute_ranked_signals(&MetricSeriesStore::new(), &["ghost".to_string()], week(4), 4, 5)
            .unwrap();
        let set = &ranked["ghost"];
        assert!(set.signals.is_empty());
        assert!(set.omissions.iter().all(|o| o.kind == OmissionKind::MissingCurrentValue));
    }
}
