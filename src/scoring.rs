//! Weighted category scoring

use crate::analyzers::{BookingFlowAnalysis, TrustSignalAnalysis};
use crate::content::{ContentFacts, PAGE_SIZE_LIMIT_BYTES};
use crate::types::{CategoryScore, LighthouseScores, SeoMetrics, SeoSource};

pub const CONVERSION_WEIGHT: u8 = 35;
pub const PERFORMANCE_WEIGHT: u8 = 20;
pub const TRUST_WEIGHT: u8 = 20;
pub const CONTENT_WEIGHT: u8 = 15;
pub const SEO_WEIGHT: u8 = 7;
pub const SECURITY_WEIGHT: u8 = 3;

/// Load time under which the performance checklist item passes
const FAST_LOAD_MS: u64 = 3000;
const MAX_CLICKS_TO_BOOK: u8 = 3;
const TRAFFIC_BONUS_CAP: f64 = 20.0;

/// Projected score ceiling and the fixed headroom added to the current score.
/// A product heuristic, not a prediction.
const PROJECTED_CEILING: u8 = 95;
const PROJECTED_HEADROOM: u8 = 25;

/// Everything the aggregator needs, already resolved
#[derive(Debug, Clone, Copy)]
pub struct ScoreInputs<'a> {
    pub content: &'a ContentFacts,
    pub booking: &'a BookingFlowAnalysis,
    pub trust: &'a TrustSignalAnalysis,
    pub lighthouse: Option<&'a LighthouseScores>,
    pub seo: &'a SeoMetrics,
}

/// Percentage of satisfied checklist items (0-100)
fn checklist_percent(items: &[bool]) -> f64 {
    if items.is_empty() {
        return 0.0;
    }
    let passed = items.iter().filter(|&&ok| ok).count();
    passed as f64 / items.len() as f64 * 100.0
}

fn to_score(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

/// Calculate all six categories in display order.
///
/// Every category falls back to local checklist facts when its upstream
/// source is missing, so this never fails.
pub fn calculate_category_scores(inputs: &ScoreInputs<'_>) -> Vec<CategoryScore> {
    vec![
        conversion_score(inputs),
        performance_score(inputs),
        trust_score(inputs),
        content_score(inputs),
        seo_score(inputs),
        security_score(inputs),
    ]
}

fn conversion_score(inputs: &ScoreInputs<'_>) -> CategoryScore {
    let booking = inputs.booking;
    let checklist = [
        booking.has_booking_cta || inputs.content.has_booking_cta,
        booking.cta_above_fold,
        booking.booking_engine_detected(),
        booking.has_date_picker,
        booking.has_instant_book,
        booking.estimated_clicks_to_book <= MAX_CLICKS_TO_BOOK,
        inputs.content.has_pricing,
    ];
    let checklist_pct = checklist_percent(&checklist);
    let ease = 100.0 - f64::from(booking.friction_score.min(100));

    CategoryScore {
        name: "Conversion".to_string(),
        score: to_score((checklist_pct + ease) / 2.0),
        weight: CONVERSION_WEIGHT,
        description: format!(
            "{} of {} booking checks passed; booking friction {}/100",
            checklist.iter().filter(|&&ok| ok).count(),
            checklist.len(),
            booking.friction_score
        ),
        source: Some("Booking flow analysis".to_string()),
    }
}

fn performance_score(inputs: &ScoreInputs<'_>) -> CategoryScore {
    let content = inputs.content;
    let checklist = [
        content.has_viewport,
        content.load_time_ms < FAST_LOAD_MS,
        content.page_bytes < PAGE_SIZE_LIMIT_BYTES,
    ];
    let checklist_pct = checklist_percent(&checklist);

    let lighthouse = inputs.lighthouse.and_then(|l| l.performance);
    let (score, description, source) = match lighthouse {
        Some(perf) => (
            (checklist_pct + f64::from(perf)) / 2.0,
            format!(
                "Lighthouse mobile performance {}/100 blended with on-page checks ({:.0}%)",
                perf, checklist_pct
            ),
            "PageSpeed Insights + on-page checks",
        ),
        None => (
            checklist_pct,
            format!(
                "On-page checks only ({:.0}%); lab performance data unavailable",
                checklist_pct
            ),
            "On-page checks",
        ),
    };

    CategoryScore {
        name: "Performance".to_string(),
        score: to_score(score),
        weight: PERFORMANCE_WEIGHT,
        description,
        source: Some(source.to_string()),
    }
}

fn trust_score(inputs: &ScoreInputs<'_>) -> CategoryScore {
    CategoryScore {
        name: "Trust".to_string(),
        score: inputs.trust.score.min(100),
        weight: TRUST_WEIGHT,
        description: "Reviews, guest photos, policies and payment signals".to_string(),
        source: Some("Trust signal analysis".to_string()),
    }
}

fn content_score(inputs: &ScoreInputs<'_>) -> CategoryScore {
    let checklist = [
        inputs.content.image_count > 0,
        inputs.content.image_count > 5,
        inputs.trust.has_guest_photos,
        inputs.trust.has_testimonials,
    ];

    CategoryScore {
        name: "Content".to_string(),
        score: to_score(checklist_percent(&checklist)),
        weight: CONTENT_WEIGHT,
        description: format!(
            "{} images; guest photos {}; testimonials {}",
            inputs.content.image_count,
            yes_no(inputs.trust.has_guest_photos),
            yes_no(inputs.trust.has_testimonials)
        ),
        source: None,
    }
}

fn seo_score(inputs: &ScoreInputs<'_>) -> CategoryScore {
    let checklist = [inputs.content.has_title, inputs.content.has_meta_description];
    let mut score = checklist_percent(&checklist);

    let lighthouse_seo = inputs.lighthouse.and_then(|l| l.seo);
    if let Some(seo) = lighthouse_seo {
        score = (score + f64::from(seo)) / 2.0;
    }

    let bonus = traffic_bonus(inputs.seo.organic_traffic);
    score = (score + bonus).min(100.0);

    let mut sources = vec!["On-page checks"];
    if lighthouse_seo.is_some() {
        sources.push("PageSpeed Insights");
    }
    let provider = match inputs.seo.source {
        SeoSource::DataForSeo => Some("DataForSEO"),
        SeoSource::Semrush => Some("Semrush"),
        SeoSource::None => None,
    };
    sources.extend(provider);

    let description = match inputs.seo.organic_traffic {
        Some(traffic) => format!(
            "Title and meta description checks; ~{} monthly organic visits (+{:.0})",
            traffic, bonus
        ),
        None => "Title and meta description checks; organic traffic unknown".to_string(),
    };

    CategoryScore {
        name: "SEO".to_string(),
        score: to_score(score),
        weight: SEO_WEIGHT,
        description,
        source: Some(sources.join(" + ")),
    }
}

/// Organic traffic bonus: log10(traffic) × 5, capped at 20
fn traffic_bonus(organic_traffic: Option<u64>) -> f64 {
    match organic_traffic {
        Some(traffic) if traffic > 0 => {
            ((traffic as f64).log10() * 5.0).clamp(0.0, TRAFFIC_BONUS_CAP)
        }
        _ => 0.0,
    }
}

fn security_score(inputs: &ScoreInputs<'_>) -> CategoryScore {
    let reachable = inputs.content.ssl_reachable;
    CategoryScore {
        name: "Security".to_string(),
        score: if reachable { 100 } else { 0 },
        weight: SECURITY_WEIGHT,
        description: if reachable {
            "Site answered over a clean connection".to_string()
        } else {
            "Site could not be reached cleanly".to_string()
        },
        source: None,
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

/// Overall score: round(Σ score × weight / 100)
pub fn calculate_overall_score(categories: &[CategoryScore]) -> u8 {
    let weighted: u32 = categories
        .iter()
        .map(|c| u32::from(c.score) * u32::from(c.weight))
        .sum();
    to_score(f64::from(weighted) / 100.0)
}

/// Fixed headroom heuristic: min(95, overall + 25)
pub fn calculate_projected_score(overall: u8) -> u8 {
    overall.saturating_add(PROJECTED_HEADROOM).min(PROJECTED_CEILING)
}
