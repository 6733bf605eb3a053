//! Merge findings from every stage into one ranked list

use crate::types::{
    CheckStatus, CoreWebVitals, Impact, LighthouseScores, MetricSource, MetricValue, Rating,
    Recommendation, SeoMetrics,
};
use std::collections::HashSet;

/// Lighthouse category score considered healthy
const LIGHTHOUSE_PASS: u8 = 90;
const LIGHTHOUSE_WARN: u8 = 50;

const AUTHORITY_PASS: u8 = 40;
const AUTHORITY_WARN: u8 = 20;

/// Already-resolved findings and measurements
#[derive(Debug, Clone, Copy)]
pub struct RecommendationInputs<'a> {
    pub content: &'a [Recommendation],
    pub booking: &'a [Recommendation],
    pub trust: &'a [Recommendation],
    pub core_web_vitals: Option<&'a CoreWebVitals>,
    pub lighthouse: Option<&'a LighthouseScores>,
    pub seo: &'a SeoMetrics,
}

/// Compile the final recommendation list.
///
/// Titles are unique (first occurrence wins). Order is failures first, then
/// warnings, then passes; within a status, higher impact first; ties keep
/// their insertion order.
pub fn compile_recommendations(inputs: &RecommendationInputs<'_>) -> Vec<Recommendation> {
    let mut all: Vec<Recommendation> = Vec::new();
    all.extend_from_slice(inputs.content);
    all.extend_from_slice(inputs.booking);
    all.extend_from_slice(inputs.trust);

    if let Some(cwv) = inputs.core_web_vitals {
        all.extend(web_vitals_recommendations(cwv));
    }
    if let Some(lighthouse) = inputs.lighthouse {
        all.extend(lighthouse_recommendations(lighthouse));
    }
    all.extend(authority_recommendation(inputs.seo));

    let mut seen = HashSet::new();
    all.retain(|r| seen.insert(r.title.clone()));

    all.sort_by_key(|r| (status_rank(r.status), impact_rank(r.impact)));
    all
}

fn status_rank(status: CheckStatus) -> u8 {
    match status {
        CheckStatus::Fail => 0,
        CheckStatus::Warning => 1,
        CheckStatus::Pass => 2,
    }
}

fn impact_rank(impact: Impact) -> u8 {
    match impact {
        Impact::High => 0,
        Impact::Medium => 1,
        Impact::Low => 2,
    }
}

fn status_for(rating: Rating) -> CheckStatus {
    match rating {
        Rating::Good => CheckStatus::Pass,
        Rating::NeedsImprovement => CheckStatus::Warning,
        Rating::Poor => CheckStatus::Fail,
    }
}

fn vital(title: &str, metric: &MetricValue, unit: Unit, impact: Impact) -> Recommendation {
    let value = match unit {
        Unit::Millis => format!("{:.0} ms", metric.value),
        Unit::Unitless => format!("{:.2}", metric.value),
    };
    let source = match metric.source {
        MetricSource::Field => "real-user data",
        MetricSource::Lab => "lab test",
    };
    Recommendation::new(
        title,
        format!("{} is {} ({}, {})", title, value, metric.rating, source),
        status_for(metric.rating),
        impact,
        "Performance",
    )
}

#[derive(Clone, Copy)]
enum Unit {
    Millis,
    Unitless,
}

fn web_vitals_recommendations(cwv: &CoreWebVitals) -> Vec<Recommendation> {
    let mut recs = vec![
        vital("Largest Contentful Paint", &cwv.lcp, Unit::Millis, Impact::High),
        vital("Cumulative Layout Shift", &cwv.cls, Unit::Unitless, Impact::Medium),
        vital("First Contentful Paint", &cwv.fcp, Unit::Millis, Impact::Medium),
    ];
    if let Some(fid) = &cwv.fid {
        recs.push(vital("First Input Delay", fid, Unit::Millis, Impact::Medium));
    }
    if let Some(tbt) = &cwv.tbt {
        recs.push(vital("Total Blocking Time", tbt, Unit::Millis, Impact::Low));
    }
    recs
}

fn graded(score: u8) -> CheckStatus {
    if score >= LIGHTHOUSE_PASS {
        CheckStatus::Pass
    } else if score >= LIGHTHOUSE_WARN {
        CheckStatus::Warning
    } else {
        CheckStatus::Fail
    }
}

fn lighthouse_recommendations(scores: &LighthouseScores) -> Vec<Recommendation> {
    let mut recs = Vec::new();
    if let Some(score) = scores.accessibility {
        recs.push(Recommendation::new(
            "Accessibility",
            format!("Lighthouse accessibility score is {}/100", score),
            graded(score),
            Impact::Medium,
            "Content",
        ));
    }
    if let Some(score) = scores.seo {
        recs.push(Recommendation::new(
            "Technical SEO",
            format!("Lighthouse SEO score is {}/100", score),
            graded(score),
            Impact::Medium,
            "SEO",
        ));
    }
    recs
}

fn authority_recommendation(seo: &SeoMetrics) -> Option<Recommendation> {
    let authority = seo.authority_score?;
    let (status, description) = if authority >= AUTHORITY_PASS {
        (
            CheckStatus::Pass,
            format!("Domain authority {}/100 ({})", authority, seo.source),
        )
    } else if authority >= AUTHORITY_WARN {
        (
            CheckStatus::Warning,
            format!(
                "Domain authority {}/100 ({}); more referring sites would lift search visibility",
                authority, seo.source
            ),
        )
    } else {
        (
            CheckStatus::Fail,
            format!(
                "Domain authority {}/100 ({}); the site is hard to find without paid channels",
                authority, seo.source
            ),
        )
    };
    Some(Recommendation::new(
        "Domain authority",
        description,
        status,
        Impact::Medium,
        "SEO",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SeoSource;

    fn rec(title: &str, status: CheckStatus, impact: Impact) -> Recommendation {
        Recommendation::new(title, "", status, impact, "Conversion")
    }

    fn metric(value: f64, rating: Rating) -> MetricValue {
        MetricValue {
            value,
            rating,
            source: MetricSource::Lab,
        }
    }

    #[test]
    fn test_ordering_and_dedup() {
        let content = vec![
            rec("Page title", CheckStatus::Pass, Impact::High),
            rec("Visible pricing", CheckStatus::Warning, Impact::Low),
            rec("Booking call to action", CheckStatus::Fail, Impact::Medium),
        ];
        let booking = vec![
            rec("Booking call to action", CheckStatus::Pass, Impact::High),
            rec("Booking engine", CheckStatus::Fail, Impact::High),
        ];
        let seo = SeoMetrics::unavailable();
        let inputs = RecommendationInputs {
            content: &content,
            booking: &booking,
            trust: &[],
            core_web_vitals: None,
            lighthouse: None,
            seo: &seo,
        };

        let titles: Vec<String> = compile_recommendations(&inputs)
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(
            titles,
            vec![
                "Booking engine",
                "Booking call to action",
                "Visible pricing",
                "Page title",
            ]
        );
    }

    #[test]
    fn test_web_vitals_projection() {
        let cwv = CoreWebVitals {
            lcp: metric(4600.0, Rating::Poor),
            fid: None,
            cls: metric(0.12, Rating::NeedsImprovement),
            fcp: metric(900.0, Rating::Good),
            tbt: Some(metric(150.0, Rating::Good)),
        };
        let seo = SeoMetrics::unavailable();
        let inputs = RecommendationInputs {
            content: &[],
            booking: &[],
            trust: &[],
            core_web_vitals: Some(&cwv),
            lighthouse: None,
            seo: &seo,
        };

        let recs = compile_recommendations(&inputs);
        assert_eq!(recs.len(), 4);
        assert_eq!(recs[0].title, "Largest Contentful Paint");
        assert_eq!(recs[0].status, CheckStatus::Fail);
        assert_eq!(recs[1].title, "Cumulative Layout Shift");
        assert_eq!(recs[1].status, CheckStatus::Warning);
        assert!(recs[1].description.contains("0.12"));
        assert!(recs.iter().all(|r| r.category == "Performance"));
        assert!(!recs.iter().any(|r| r.title == "First Input Delay"));
    }

    #[test]
    fn test_lighthouse_and_authority() {
        let lighthouse = LighthouseScores {
            performance: Some(30),
            accessibility: Some(95),
            best_practices: None,
            seo: Some(60),
        };
        let seo = SeoMetrics {
            authority_score: Some(12),
            source: SeoSource::DataForSeo,
            ..SeoMetrics::unavailable()
        };
        let inputs = RecommendationInputs {
            content: &[],
            booking: &[],
            trust: &[],
            core_web_vitals: None,
            lighthouse: Some(&lighthouse),
            seo: &seo,
        };

        let recs = compile_recommendations(&inputs);
        assert_eq!(recs[0].title, "Domain authority");
        assert_eq!(recs[0].status, CheckStatus::Fail);
        assert!(recs[0].description.contains("DataForSEO"));
        assert_eq!(recs[1].title, "Technical SEO");
        assert_eq!(recs[1].status, CheckStatus::Warning);
        assert_eq!(recs[2].title, "Accessibility");
        assert_eq!(recs[2].status, CheckStatus::Pass);
    }

    #[test]
    fn test_no_authority_without_provider() {
        let seo = SeoMetrics::unavailable();
        assert!(authority_recommendation(&seo).is_none());
    }

    #[test]
    fn test_compilation_is_deterministic() {
        let content = vec![
            rec("A", CheckStatus::Warning, Impact::Low),
            rec("B", CheckStatus::Warning, Impact::Low),
        ];
        let seo = SeoMetrics::unavailable();
        let inputs = RecommendationInputs {
            content: &content,
            booking: &[],
            trust: &[],
            core_web_vitals: None,
            lighthouse: None,
            seo: &seo,
        };
        let first = serde_json::to_string(&compile_recommendations(&inputs)).unwrap();
        let second = serde_json::to_string(&compile_recommendations(&inputs)).unwrap();
        assert_eq!(first, second);
        assert!(first.find("\"A\"").unwrap() < first.find("\"B\"").unwrap());
    }
}
