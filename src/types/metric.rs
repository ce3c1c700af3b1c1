//! Metric taxonomy: MetricName, MetricFamily, MetricKind, Domain

use serde::{Deserialize, Serialize};

/// Calibration group of a metric.
///
/// Each family carries its own noise floor, classification, confidence and
/// impact thresholds because the native scales differ (a 0.10 swing in a
/// media-mix ratio is routine, in a core strategic score it is not).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricFamily {
    /// Promotional intensity, urgency, brand voice, message-angle ratios
    CoreStrategic,
    /// Call-to-action derived scores
    CtaDerived,
    /// Creative format ratios (video / carousel / static)
    MediaMix,
    /// Creative volume counts
    Volume,
}

impl MetricFamily {
    pub const ALL: [MetricFamily; 4] = [
        MetricFamily::CoreStrategic,
        MetricFamily::CtaDerived,
        MetricFamily::MediaMix,
        MetricFamily::Volume,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CoreStrategic => "core_strategic",
            Self::CtaDerived => "cta_derived",
            Self::MediaMix => "media_mix",
            Self::Volume => "volume",
        }
    }
}

impl std::fmt::Display for MetricFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Valid value range for a numeric metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Domain {
    /// Closed ratio domain [0, 1]
    UnitInterval,
    /// Counts: [0, +inf)
    NonNegative,
}

impl Domain {
    /// Whether a raw ingested value lies inside the domain (NaN/Inf never do).
    pub fn contains(&self, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        match self {
            Self::UnitInterval => (0.0..=1.0).contains(&value),
            Self::NonNegative => value >= 0.0,
        }
    }

    /// Clamp a derived (forecast) value into the domain.
    ///
    /// An overflowed count saturates at `f64::MAX` so results stay finite.
    pub fn clamp(&self, value: f64) -> f64 {
        match self {
            Self::UnitInterval => value.clamp(0.0, 1.0),
            Self::NonNegative => value.clamp(0.0, f64::MAX),
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnitInterval => write!(f, "[0, 1]"),
            Self::NonNegative => write!(f, "[0, inf)"),
        }
    }
}

/// How a forecasted change is normalized into `change_magnitude`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeBasis {
    /// Magnitude is the absolute difference (ratio metrics)
    Absolute,
    /// Magnitude is the difference relative to max(|current|, 1) (count metrics)
    Relative,
}

/// Value shape of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricKind {
    Ratio,
    Count,
    /// Dominant category label for the period
    Categorical,
}

/// Every metric the engine understands.
///
/// Declaration order is the ordinal used as the final ranking tie-break, so
/// new variants must be appended, not inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricName {
    PromotionalIntensity,
    UrgencyLevel,
    BrandVoiceTone,
    PriceAngleShare,
    FeatureAngleShare,
    LifestyleAngleShare,
    SocialProofAngleShare,
    DominantMessageAngle,
    CtaAggressiveness,
    CtaDensity,
    DominantCtaType,
    VideoShare,
    CarouselShare,
    StaticImageShare,
    ActiveCreatives,
}

impl MetricName {
    pub const ALL: [MetricName; 15] = [
        MetricName::PromotionalIntensity,
        MetricName::UrgencyLevel,
        MetricName::BrandVoiceTone,
        MetricName::PriceAngleShare,
        MetricName::FeatureAngleShare,
        MetricName::LifestyleAngleShare,
        MetricName::SocialProofAngleShare,
        MetricName::DominantMessageAngle,
        MetricName::CtaAggressiveness,
        MetricName::CtaDensity,
        MetricName::DominantCtaType,
        MetricName::VideoShare,
        MetricName::CarouselShare,
        MetricName::StaticImageShare,
        MetricName::ActiveCreatives,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PromotionalIntensity => "promotional_intensity",
            Self::UrgencyLevel => "urgency_level",
            Self::BrandVoiceTone => "brand_voice_tone",
            Self::PriceAngleShare => "price_angle_share",
            Self::FeatureAngleShare => "feature_angle_share",
            Self::LifestyleAngleShare => "lifestyle_angle_share",
            Self::SocialProofAngleShare => "social_proof_angle_share",
            Self::DominantMessageAngle => "dominant_message_angle",
            Self::CtaAggressiveness => "cta_aggressiveness",
            Self::CtaDensity => "cta_density",
            Self::DominantCtaType => "dominant_cta_type",
            Self::VideoShare => "video_share",
            Self::CarouselShare => "carousel_share",
            Self::StaticImageShare => "static_image_share",
            Self::ActiveCreatives => "active_creatives",
        }
    }

    /// Position in declaration order.
    pub fn ordinal(&self) -> usize {
        *self as usize
    }

    pub fn family(&self) -> MetricFamily {
        match self {
            Self::PromotionalIntensity
            | Self::UrgencyLevel
            | Self::BrandVoiceTone
            | Self::PriceAngleShare
            | Self::FeatureAngleShare
            | Self::LifestyleAngleShare
            | Self::SocialProofAngleShare
            | Self::DominantMessageAngle => MetricFamily::CoreStrategic,
            Self::CtaAggressiveness | Self::CtaDensity | Self::DominantCtaType => {
                MetricFamily::CtaDerived
            }
            Self::VideoShare | Self::CarouselShare | Self::StaticImageShare => {
                MetricFamily::MediaMix
            }
            Self::ActiveCreatives => MetricFamily::Volume,
        }
    }

    pub fn kind(&self) -> MetricKind {
        match self {
            Self::DominantMessageAngle | Self::DominantCtaType => MetricKind::Categorical,
            Self::ActiveCreatives => MetricKind::Count,
            _ => MetricKind::Ratio,
        }
    }

    pub fn is_categorical(&self) -> bool {
        self.kind() == MetricKind::Categorical
    }

    /// Numeric domain, `None` for categorical metrics.
    pub fn domain(&self) -> Option<Domain> {
        match self.kind() {
            MetricKind::Ratio => Some(Domain::UnitInterval),
            MetricKind::Count => Some(Domain::NonNegative),
            MetricKind::Categorical => None,
        }
    }

    pub fn change_basis(&self) -> ChangeBasis {
        match self.kind() {
            MetricKind::Count => ChangeBasis::Relative,
            _ => ChangeBasis::Absolute,
        }
    }

    /// Volatile metrics get the wider uncertainty multiplier.
    pub fn is_volatile(&self) -> bool {
        matches!(self.family(), MetricFamily::MediaMix | MetricFamily::Volume)
    }

    /// A pivot on a strategically critical metric is always top impact.
    pub fn is_strategically_critical(&self) -> bool {
        matches!(self, Self::DominantMessageAngle)
    }
}

impl std::fmt::Display for MetricName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MetricName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("unknown metric '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals_follow_declaration_order() {
        for (i, metric) in MetricName::ALL.iter().enumerate() {
            assert_eq!(metric.ordinal(), i, "{metric} out of order in ALL");
        }
    }

    #[test]
    fn metric_names_round_trip_through_from_str() {
        for metric in MetricName::ALL {
            let parsed: MetricName = metric.as_str().parse().unwrap();
            assert_eq!(parsed, metric);
        }
        assert!("not_a_metric".parse::<MetricName>().is_err());
    }

    #[test]
    fn serde_name_matches_as_str() {
        let json = serde_json::to_string(&MetricName::CtaAggressiveness).unwrap();
        assert_eq!(json, "\"cta_aggressiveness\"");
    }

    #[test]
    fn media_mix_and_volume_are_volatile() {
        assert!(MetricName::VideoShare.is_volatile());
        assert!(MetricName::ActiveCreatives.is_volatile());
        assert!(!MetricName::PromotionalIntensity.is_volatile());
        assert!(!MetricName::CtaAggressiveness.is_volatile());
    }

    #[test]
    fn categorical_metrics_have_no_domain() {
        assert_eq!(MetricName::DominantMessageAngle.domain(), None);
        assert_eq!(MetricName::ActiveCreatives.domain(), Some(Domain::NonNegative));
        assert_eq!(MetricName::UrgencyLevel.domain(), Some(Domain::UnitInterval));
    }

    #[test]
    fn domain_rejects_non_finite_and_out_of_range() {
        assert!(Domain::UnitInterval.contains(0.0));
        assert!(Domain::UnitInterval.contains(1.0));
        assert!(!Domain::UnitInterval.contains(1.01));
        assert!(!Domain::UnitInterval.contains(f64::NAN));
        assert!(!Domain::NonNegative.contains(-1.0));
        assert!(!Domain::NonNegative.contains(f64::INFINITY));
        assert_eq!(Domain::UnitInterval.clamp(1.4), 1.0);
        assert_eq!(Domain::NonNegative.clamp(-3.0), 0.0);
        assert_eq!(Domain::NonNegative.clamp(f64::INFINITY), f64::MAX);
    }
}
