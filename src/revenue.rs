//! Monthly revenue-loss estimate
//!
//! The constants are product assumptions carried over unchanged; they are not
//! derived from measured conversion data.

use crate::types::SeoMetrics;

/// Score treated as "no meaningful loss"
const TARGET_SCORE: u8 = 90;
/// Dollars lost per point below target
const LOSS_PER_POINT: f64 = 50.0;
/// Visits per extra 1× multiplier step
const TRAFFIC_STEP: f64 = 1000.0;
const MAX_TRAFFIC_MULTIPLIER: f64 = 3.0;
const MAX_MONTHLY_LOSS: f64 = 10_000.0;

/// Estimate monthly revenue lost to the gap between `overall_score` and 90.
///
/// Known organic traffic scales the base estimate by up to 3×; the result is
/// capped at 10,000 and rounded.
pub fn estimate_revenue_loss(overall_score: u8, seo: Option<&SeoMetrics>) -> u32 {
    let gap = TARGET_SCORE.saturating_sub(overall_score);
    let mut loss = f64::from(gap) * LOSS_PER_POINT;

    if let Some(traffic) = seo.and_then(|s| s.organic_traffic) {
        let multiplier = (1.0 + traffic as f64 / TRAFFIC_STEP).min(MAX_TRAFFIC_MULTIPLIER);
        loss *= multiplier;
    }

    loss.min(MAX_MONTHLY_LOSS).round() as u32
}
