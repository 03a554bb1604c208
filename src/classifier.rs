//! Table-driven mapping from percentage deviation to trend band and recommendation.
//!
//! The rules are evaluated top-down and the first match wins. Each band's bounds are
//! stated exactly, including which side is closed, so `-5.0` lands in
//! [`TrendBand::StrongDecline`] and not [`TrendBand::MildDecline`].

use crate::config::{DEFAULT_LOW_REVENUE_FLOOR, DEFAULT_VOLATILITY_THRESHOLD};
use crate::schema::{AlertFlag, DeviationRecord, TrendBand, TrendClassification};
use crate::utils::month_label;
use std::collections::BTreeSet;
use std::ops::{Bound, RangeBounds};

pub struct BandRule {
    pub band: TrendBand,
    pub lower: Bound<f64>,
    pub upper: Bound<f64>,
    pub action: &'static str,
    pub detail: &'static str,
}

impl BandRule {
    pub fn matches(&self, pct_change: f64) -> bool {
        (self.lower, self.upper).contains(&pct_change)
    }
}

pub static BAND_RULES: [BandRule; 6] = [
    BandRule {
        band: TrendBand::StrongGrowth,
        lower: Bound::Included(10.0),
        upper: Bound::Unbounded,
        action: "Expand production and increase product supply. Push promotion and sales campaigns harder.",
        detail: "Step up product promotion and widen the marketing campaign. Consider partnering with influencers to reach new customers.",
    },
    BandRule {
        band: TrendBand::ModerateGrowth,
        lower: Bound::Included(5.0),
        upper: Bound::Excluded(10.0),
        action: "Keep the current marketing strategy. Consider a modest increase in production and stock.",
        detail: "Continue the marketing activities that are working. Explore new markets and invest in product improvements.",
    },
    BandRule {
        band: TrendBand::MildGrowth,
        lower: Bound::Included(0.0),
        upper: Bound::Excluded(5.0),
        action: "Maintain the current marketing strategy. Add light promotion and discounts.",
        detail: "Look for more effective advertising channels such as short-video and social platforms. Strengthen influencer partnerships.",
    },
    BandRule {
        band: TrendBand::MildDecline,
        lower: Bound::Excluded(-5.0),
        upper: Bound::Excluded(0.0),
        action: "Refine the marketing strategy to stabilise sales. Consider targeted promotions.",
        detail: "Adjust pricing to protect margin. Focus on improving the customer experience.",
    },
    BandRule {
        band: TrendBand::StrongDecline,
        lower: Bound::Excluded(-10.0),
        upper: Bound::Included(-5.0),
        action: "Overhaul the marketing strategy to attract new customers. Run stronger promotions with 5-10% discounts.",
        detail: "Organise special sales events or flash sales. Increase online advertising alongside deeper discounts.",
    },
    BandRule {
        band: TrendBand::SevereDecline,
        lower: Bound::Unbounded,
        upper: Bound::Included(-10.0),
        action: "Change the marketing strategy immediately. Cut prices sharply and liquidate inventory.",
        detail: "Consider 10-20% discounts or clearing stock. Run a more aggressive campaign and raise the media budget.",
    },
];

/// The rule for `pct_change`. A value no rule matches (NaN) falls through to the last
/// rule, [`TrendBand::SevereDecline`].
pub fn rule_for(pct_change: f64) -> &'static BandRule {
    BAND_RULES
        .iter()
        .find(|rule| rule.matches(pct_change))
        .unwrap_or(&BAND_RULES[BAND_RULES.len() - 1])
}

pub fn rule_for_band(band: TrendBand) -> &'static BandRule {
    BAND_RULES
        .iter()
        .find(|rule| rule.band == band)
        .unwrap_or(&BAND_RULES[BAND_RULES.len() - 1])
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendClassifier {
    pub low_revenue_floor: f64,
    pub volatility_threshold: f64,
}

impl Default for TrendClassifier {
    fn default() -> Self {
        Self {
            low_revenue_floor: DEFAULT_LOW_REVENUE_FLOOR,
            volatility_threshold: DEFAULT_VOLATILITY_THRESHOLD,
        }
    }
}

impl TrendClassifier {
    pub fn new(low_revenue_floor: f64, volatility_threshold: f64) -> Self {
        Self {
            low_revenue_floor,
            volatility_threshold,
        }
    }

    pub fn classify(&self, deviation: &DeviationRecord) -> TrendClassification {
        let rule = rule_for(deviation.pct_change);

        let mut alert_flags = BTreeSet::new();
        if deviation.point_estimate < self.low_revenue_floor {
            alert_flags.insert(AlertFlag::LowRevenue);
        }
        if deviation.pct_change.abs() > self.volatility_threshold {
            alert_flags.insert(AlertFlag::HighVolatility);
        }

        TrendClassification {
            period_start: deviation.period_start,
            point_estimate: deviation.point_estimate,
            pct_change: deviation.pct_change,
            band: rule.band,
            recommended_action: rule.action.to_string(),
            detail_note: rule.detail.to_string(),
            alert_flags,
        }
    }

    pub fn classify_all(&self, deviations: &[DeviationRecord]) -> Vec<TrendClassification> {
        deviations.iter().map(|d| self.classify(d)).collect()
    }
}

impl TrendClassification {
    /// Plain-text recommendation block for one forecast month.
    pub fn suggestion_text(&self) -> String {
        format!(
            "{} - Trend: {}\n- Recommendation: {}\n- Detail: {}\n",
            month_label(self.period_start),
            self.band.label(),
            self.recommended_action,
            self.detail_note
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn deviation(pct_change: f64, point_estimate: f64) -> DeviationRecord {
        DeviationRecord {
            period_start: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            point_estimate,
            delta: 0.0,
            pct_change,
        }
    }

    fn band(pct_change: f64) -> TrendBand {
        TrendClassifier::default()
            .classify(&deviation(pct_change, 1000.0))
            .band
    }

    #[test]
    fn test_band_boundaries() {
        assert_eq!(band(10.0), TrendBand::StrongGrowth);
        assert_eq!(band(5.0), TrendBand::ModerateGrowth);
        assert_eq!(band(0.0), TrendBand::MildGrowth);
        assert_eq!(band(-5.0), TrendBand::StrongDecline);
        assert_eq!(band(-10.0), TrendBand::SevereDecline);
    }

    #[test]
    fn test_band_interiors() {
        assert_eq!(band(250.0), TrendBand::StrongGrowth);
        assert_eq!(band(9.999), TrendBand::ModerateGrowth);
        assert_eq!(band(4.999), TrendBand::MildGrowth);
        assert_eq!(band(-0.001), TrendBand::MildDecline);
        assert_eq!(band(-4.999), TrendBand::MildDecline);
        assert_eq!(band(-5.001), TrendBand::StrongDecline);
        assert_eq!(band(-9.999), TrendBand::StrongDecline);
        assert_eq!(band(-10.001), TrendBand::SevereDecline);
        assert_eq!(band(-100.0), TrendBand::SevereDecline);
    }

    #[test]
    fn test_exactly_one_rule_matches() {
        let mut p = -30.0;
        while p <= 30.0 {
            let matching = BAND_RULES.iter().filter(|r| r.matches(p)).count();
            assert_eq!(matching, 1, "pct_change {} matched {} rules", p, matching);
            p += 0.25;
        }
        for p in [f64::INFINITY, f64::NEG_INFINITY, -0.0, 1e-12, -1e-12] {
            assert_eq!(BAND_RULES.iter().filter(|r| r.matches(p)).count(), 1);
        }
    }

    #[test]
    fn test_nan_falls_through_to_last_rule() {
        assert_eq!(band(f64::NAN), TrendBand::SevereDecline);
    }

    #[test]
    fn test_low_revenue_flag() {
        let classifier = TrendClassifier::default();
        let low = classifier.classify(&deviation(2.0, 49.99));
        assert!(low.has_flag(AlertFlag::LowRevenue));

        let at_floor = classifier.classify(&deviation(2.0, 50.0));
        assert!(!at_floor.has_flag(AlertFlag::LowRevenue));
    }

    #[test]
    fn test_volatility_flag_is_independent_of_band() {
        let classifier = TrendClassifier::new(0.0, 7.5);

        let up = classifier.classify(&deviation(8.0, 100.0));
        assert_eq!(up.band, TrendBand::ModerateGrowth);
        assert!(up.has_flag(AlertFlag::HighVolatility));

        let down = classifier.classify(&deviation(-8.0, 100.0));
        assert_eq!(down.band, TrendBand::StrongDecline);
        assert!(down.has_flag(AlertFlag::HighVolatility));

        let at_threshold = classifier.classify(&deviation(7.5, 100.0));
        assert!(at_threshold.alert_flags.is_empty());
    }

    #[test]
    fn test_recommendation_text_comes_from_rule_table() {
        let classification = TrendClassifier::default().classify(&deviation(-12.0, 300.0));
        let rule = rule_for_band(TrendBand::SevereDecline);
        assert_eq!(classification.recommended_action, rule.action);
        assert_eq!(classification.detail_note, rule.detail);

        let text = classification.suggestion_text();
        assert!(text.starts_with("02/2024 - Trend: Very strong decrease"));
        assert!(text.contains("- Recommendation: Change the marketing strategy immediately."));
    }
}
