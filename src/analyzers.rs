//! Booking-flow and trust-signal analysis
//!
//! Both analyzers sit behind traits so a richer implementation can be plugged
//! into [`crate::Auditor`]. The keyword heuristics here are the defaults.

use crate::content::{BOOKING_CTA, CONTACT, REVIEWS};
use crate::types::{CheckStatus, Impact, Recommendation};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Known third-party booking engines, matched case-insensitively in the markup
const BOOKING_ENGINES: &[(&str, &str)] = &[
    ("cloudbeds", "Cloudbeds"),
    ("siteminder", "SiteMinder"),
    ("synxis", "SynXis"),
    ("lodgify", "Lodgify"),
    ("guesty", "Guesty"),
    ("hostaway", "Hostaway"),
    ("ownerrez", "OwnerRez"),
    ("webrezpro", "WebRezPro"),
    ("resnexus", "ResNexus"),
    ("thinkreservations", "ThinkReservations"),
    ("mews.com", "Mews"),
    ("littlehotelier", "Little Hotelier"),
    ("beds24", "Beds24"),
    ("checkfront", "Checkfront"),
    ("freetobook", "Freetobook"),
];

/// Share of the document treated as "above the fold"
const FOLD_FRACTION: f64 = 0.3;

static DATE_PICKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:type\s*=\s*["']?date\b)|datepicker|date-picker|check[\s-]?in|arrival\s+date"#)
        .expect("valid date picker regex")
});
static INSTANT_BOOK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)instant(?:ly)?[\s-]+(?:book|confirm)|book\s+instantly")
        .expect("valid instant book regex")
});
static REVIEW_PLATFORM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)tripadvisor|trustpilot|google\s+reviews|booking\.com|airbnb\.com/rooms|yelp\.com")
        .expect("valid review platform regex")
});
static GUEST_PHOTOS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)guest\s+photos?|photos?\s+(?:from|by)\s+(?:our\s+)?guests|instagram\.com|#\w*(?:stay|getaway)")
        .expect("valid guest photo regex")
});
static TESTIMONIALS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)testimonials?|<blockquote\b|class\s*=\s*["'][^"']*(?:testimonial|review)"#)
        .expect("valid testimonial regex")
});
static PAYMENT_SECURITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)secure\s+(?:booking|checkout|payment)|ssl\s+secured|visa|mastercard|paypal|stripe")
        .expect("valid payment regex")
});
static POLICIES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)cancell?ation\s+policy|privacy\s+policy|terms\s+(?:and|&amp;|&)\s+conditions")
        .expect("valid policy regex")
});

/// Booking-flow facts used by the conversion score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingFlowAnalysis {
    pub has_booking_cta: bool,
    pub cta_above_fold: bool,
    pub booking_engine: Option<String>,
    pub has_date_picker: bool,
    pub has_instant_book: bool,
    pub estimated_clicks_to_book: u8,
    /// 0-100, higher is worse
    pub friction_score: u8,
    pub findings: Vec<Recommendation>,
}

impl BookingFlowAnalysis {
    pub fn booking_engine_detected(&self) -> bool {
        self.booking_engine.is_some()
    }
}

/// Trust-signal facts; `score` is used unmodified as the trust category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustSignalAnalysis {
    /// 0-100 aggregate
    pub score: u8,
    pub has_reviews: bool,
    pub has_review_platform: bool,
    pub has_guest_photos: bool,
    pub has_testimonials: bool,
    pub has_payment_security: bool,
    pub has_contact_info: bool,
    pub has_policies: bool,
    pub findings: Vec<Recommendation>,
}

pub trait BookingFlowAnalyzer: Send + Sync {
    fn analyze(&self, html: &str, domain: &str) -> BookingFlowAnalysis;
}

pub trait TrustSignalAnalyzer: Send + Sync {
    fn analyze(&self, html: &str, domain: &str) -> TrustSignalAnalysis;
}

/// Keyword heuristics over the raw markup
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicBookingFlowAnalyzer;

impl BookingFlowAnalyzer for HeuristicBookingFlowAnalyzer {
    fn analyze(&self, html: &str, _domain: &str) -> BookingFlowAnalysis {
        let first_cta = BOOKING_CTA.find(html).map(|m| m.start());
        let fold = (html.len() as f64 * FOLD_FRACTION) as usize;
        let cta_above_fold = first_cta.is_some_and(|pos| pos <= fold);

        let lowered = html.to_ascii_lowercase();
        let booking_engine = BOOKING_ENGINES
            .iter()
            .find(|(needle, _)| lowered.contains(needle))
            .map(|(_, name)| (*name).to_string());

        let has_booking_cta = first_cta.is_some();
        let has_date_picker = DATE_PICKER.is_match(html);
        let has_instant_book = INSTANT_BOOK.is_match(html);

        let estimated_clicks_to_book = if has_booking_cta {
            let mut clicks: u8 = 4;
            if cta_above_fold {
                clicks -= 1;
            }
            if booking_engine.is_some() {
                clicks -= 1;
            }
            if has_date_picker {
                clicks -= 1;
            }
            clicks
        } else {
            6
        };

        let mut friction: u32 = 0;
        if !has_booking_cta {
            friction += 30;
        }
        if !cta_above_fold {
            friction += 15;
        }
        if booking_engine.is_none() {
            friction += 20;
        }
        if !has_date_picker {
            friction += 15;
        }
        if !has_instant_book {
            friction += 10;
        }
        if estimated_clicks_to_book > 3 {
            friction += 10;
        }
        let friction_score = friction.min(100) as u8;

        let mut findings = Vec::new();
        if has_booking_cta && !cta_above_fold {
            findings.push(Recommendation::new(
                "Booking button placement",
                "The first booking call to action appears low on the page. Move it into the header or hero section.",
                CheckStatus::Warning,
                Impact::High,
                "Conversion",
            ));
        }
        findings.push(match &booking_engine {
            Some(name) => Recommendation::new(
                "Online booking engine",
                format!("{} booking engine detected.", name),
                CheckStatus::Pass,
                Impact::High,
                "Conversion",
            ),
            None => Recommendation::new(
                "Online booking engine",
                "No direct booking engine detected. Guests may be sent to OTAs that charge commission.",
                CheckStatus::Fail,
                Impact::High,
                "Conversion",
            ),
        });
        if !has_date_picker {
            findings.push(Recommendation::new(
                "Date selection",
                "No date picker found. Let guests pick dates without leaving the page.",
                CheckStatus::Warning,
                Impact::Medium,
                "Conversion",
            ));
        }
        findings.push(Recommendation::new(
            "Clicks to book",
            format!("Booking takes an estimated {} clicks.", estimated_clicks_to_book),
            if estimated_clicks_to_book <= 3 {
                CheckStatus::Pass
            } else {
                CheckStatus::Warning
            },
            Impact::Medium,
            "Conversion",
        ));

        BookingFlowAnalysis {
            has_booking_cta,
            cta_above_fold,
            booking_engine,
            has_date_picker,
            has_instant_book,
            estimated_clicks_to_book,
            friction_score,
            findings,
        }
    }
}

/// Keyword heuristics over the raw markup
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicTrustSignalAnalyzer;

impl TrustSignalAnalyzer for HeuristicTrustSignalAnalyzer {
    fn analyze(&self, html: &str, _domain: &str) -> TrustSignalAnalysis {
        let has_reviews = REVIEWS.is_match(html);
        let has_review_platform = REVIEW_PLATFORM.is_match(html);
        let has_guest_photos = GUEST_PHOTOS.is_match(html);
        let has_testimonials = TESTIMONIALS.is_match(html);
        let has_payment_security = PAYMENT_SECURITY.is_match(html);
        let has_contact_info = CONTACT.is_match(html);
        let has_policies = POLICIES.is_match(html);

        let signals: [(bool, u32); 7] = [
            (has_reviews, 20),
            (has_review_platform, 15),
            (has_guest_photos, 10),
            (has_testimonials, 15),
            (has_payment_security, 15),
            (has_contact_info, 15),
            (has_policies, 10),
        ];
        let score = signals
            .iter()
            .filter(|(present, _)| *present)
            .map(|(_, points)| points)
            .sum::<u32>()
            .min(100) as u8;

        let mut findings = Vec::new();
        if !has_review_platform {
            findings.push(Recommendation::new(
                "Third-party review badges",
                "No TripAdvisor, Google or Trustpilot review widgets found. Independent ratings build confidence.",
                CheckStatus::Warning,
                Impact::Medium,
                "Trust",
            ));
        }
        if !has_guest_photos {
            findings.push(Recommendation::new(
                "Guest photos",
                "No guest-submitted photos found. Real guest imagery is more persuasive than staged shots.",
                CheckStatus::Warning,
                Impact::Low,
                "Trust",
            ));
        }
        findings.push(Recommendation::new(
            "Secure payment signals",
            if has_payment_security {
                "Payment or secure-checkout signals are shown."
            } else {
                "No secure payment or accepted-card signals found near booking."
            },
            if has_payment_security {
                CheckStatus::Pass
            } else {
                CheckStatus::Warning
            },
            Impact::Medium,
            "Trust",
        ));
        if !has_policies {
            findings.push(Recommendation::new(
                "Published policies",
                "No cancellation or privacy policy link found.",
                CheckStatus::Warning,
                Impact::Low,
                "Trust",
            ));
        }

        TrustSignalAnalysis {
            score,
            has_reviews,
            has_review_platform,
            has_guest_photos,
            has_testimonials,
            has_payment_security,
            has_contact_info,
            has_policies,
            findings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_page_has_maximum_friction() {
        let analysis = HeuristicBookingFlowAnalyzer.analyze("", "x.example");
        assert!(!analysis.has_booking_cta);
        assert_eq!(analysis.estimated_clicks_to_book, 6);
        assert_eq!(analysis.friction_score, 100);
    }

    #[test]
    fn test_streamlined_flow() {
        let html = r#"<header><a href="https://hotels.cloudbeds.com/reservation/x">Book now</a>
            <input type="date" name="checkin"> Instant confirmation</header>
            <main><p>Our cabins sit on the quiet north shore of the lake, a short walk from the
            marina and the village. Each cabin has a private deck, a wood stove and a full kitchen,
            and the lodge serves breakfast every morning from seven until ten.</p></main>"#;
        let analysis = HeuristicBookingFlowAnalyzer.analyze(html, "x.example");

        assert!(analysis.has_booking_cta);
        assert!(analysis.cta_above_fold);
        assert_eq!(analysis.booking_engine.as_deref(), Some("Cloudbeds"));
        assert!(analysis.has_date_picker);
        assert!(analysis.has_instant_book);
        assert_eq!(analysis.estimated_clicks_to_book, 1);
        assert_eq!(analysis.friction_score, 0);
    }

    #[test]
    fn test_trust_score_sums_signals() {
        let html = r#"<section class="testimonials">Guest reviews</section>
            <a href="mailto:stay@x.example">Email</a>
            <a href="/privacy">Privacy policy</a>"#;
        let analysis = HeuristicTrustSignalAnalyzer.analyze(html, "x.example");

        assert!(analysis.has_reviews);
        assert!(analysis.has_testimonials);
        assert!(analysis.has_contact_info);
        assert!(analysis.has_policies);
        assert!(!analysis.has_review_platform);
        assert_eq!(analysis.score, 20 + 15 + 15 + 10);
    }

    #[test]
    fn test_trust_score_empty_page() {
        let analysis = HeuristicTrustSignalAnalyzer.analyze("", "x.example");
        assert_eq!(analysis.score, 0);
    }
}
