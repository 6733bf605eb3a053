//! Heuristic on-page checks over the fetched HTML

use crate::types::{CheckStatus, Impact, RawPageFetch, Recommendation};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Pages at or above this size get a warning
pub const PAGE_SIZE_LIMIT_BYTES: usize = 500_000;

static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid title regex"));
static META_DESCRIPTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta\b[^>]*\bname\s*=\s*["']?description\b"#).expect("valid meta regex")
});
static VIEWPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta\b[^>]*\bname\s*=\s*["']?viewport\b"#).expect("valid viewport regex")
});
static PRICING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:[$€£]\s?\d[\d,]*(?:\.\d{1,2})?)|(?:\b\d[\d,]*(?:\.\d{1,2})?\s?(?:usd|eur|gbp)\b)|(?:\b(?:per|a|/)\s?night\b)|(?:\brates?\s+from\b)",
    )
    .expect("valid pricing regex")
});
pub(crate) static BOOKING_CTA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:book\s+now|book\s+(?:your|a)\s+(?:stay|room|table|tour)|book\s+online|book\s+direct|reserve\s+now|make\s+a\s+reservation|check\s+availability)\b",
    )
    .expect("valid booking regex")
});
pub(crate) static REVIEWS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:reviews?|testimonials?|guest\s+feedback|what\s+(?:our\s+)?guests\s+say|rated\s+\d)")
        .expect("valid review regex")
});
pub(crate) static CONTACT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:href\s*=\s*[\x22']?(?:tel|mailto):)|(?:\+?\d{1,3}[\s.-]?\(?\d{3}\)?[\s.-]?\d{3}[\s.-]?\d{4})|(?:\b[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}\b)",
    )
    .expect("valid contact regex")
});
static IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<img\b").expect("valid img regex"));

/// Checklist facts extracted from one page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentFacts {
    /// 200 response with no fetch error
    pub ssl_reachable: bool,
    pub has_title: bool,
    pub title: Option<String>,
    pub has_meta_description: bool,
    pub has_viewport: bool,
    pub has_pricing: bool,
    pub has_booking_cta: bool,
    pub has_reviews: bool,
    pub has_contact_info: bool,
    pub image_count: usize,
    pub load_time_ms: u64,
    pub page_bytes: usize,
}

/// Facts plus their projection into findings
#[derive(Debug, Clone, PartialEq)]
pub struct ContentAnalysis {
    pub facts: ContentFacts,
    pub recommendations: Vec<Recommendation>,
}

/// Scan the fetched page. Pure: the same fetch always yields the same analysis.
pub fn analyze_content(fetch: &RawPageFetch, domain: &str) -> ContentAnalysis {
    let html = fetch.html.as_str();

    let title = TITLE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| collapse_whitespace(m.as_str()))
        .filter(|t| !t.is_empty());

    let facts = ContentFacts {
        ssl_reachable: fetch.is_ok(),
        has_title: title.is_some(),
        title,
        has_meta_description: META_DESCRIPTION.is_match(html),
        has_viewport: VIEWPORT.is_match(html),
        has_pricing: PRICING.is_match(html),
        has_booking_cta: BOOKING_CTA.is_match(html),
        has_reviews: REVIEWS.is_match(html),
        has_contact_info: CONTACT.is_match(html),
        image_count: IMAGE.find_iter(html).count(),
        load_time_ms: fetch.load_time_ms,
        page_bytes: fetch.content_length,
    };

    let recommendations = project_recommendations(&facts, domain);
    ContentAnalysis {
        facts,
        recommendations,
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn check(
    passed: bool,
    on_fail: CheckStatus,
    title: &str,
    pass_text: String,
    fail_text: String,
    impact: Impact,
    category: &str,
) -> Recommendation {
    if passed {
        Recommendation::new(title, pass_text, CheckStatus::Pass, impact, category)
    } else {
        Recommendation::new(title, fail_text, on_fail, impact, category)
    }
}

fn project_recommendations(facts: &ContentFacts, domain: &str) -> Vec<Recommendation> {
    let mut recs = Vec::with_capacity(11);

    recs.push(check(
        facts.ssl_reachable,
        CheckStatus::Fail,
        "Secure, reachable homepage",
        format!("{} responded successfully to a direct request.", domain),
        format!(
            "{} did not return a successful response; visitors and search engines may not reach the site.",
            domain
        ),
        Impact::High,
        "Security",
    ));

    recs.push(check(
        facts.has_title,
        CheckStatus::Fail,
        "Page title",
        format!("Title found: \"{}\".", facts.title.as_deref().unwrap_or_default()),
        "No <title> tag found. Add a descriptive title with your property name and location.".to_string(),
        Impact::Medium,
        "SEO",
    ));

    recs.push(check(
        facts.has_meta_description,
        CheckStatus::Fail,
        "Meta description",
        "A meta description is present.".to_string(),
        "No meta description found. Search results will show an arbitrary page snippet.".to_string(),
        Impact::Medium,
        "SEO",
    ));

    recs.push(check(
        facts.has_viewport,
        CheckStatus::Fail,
        "Mobile viewport",
        "The page declares a mobile viewport.".to_string(),
        "No viewport meta tag found; the page will not scale on phones.".to_string(),
        Impact::High,
        "Performance",
    ));

    recs.push(check(
        facts.has_pricing,
        CheckStatus::Fail,
        "Visible pricing",
        "Prices or rates are shown on the page.".to_string(),
        "No pricing found. Showing rates up front reduces drop-off to third-party sites.".to_string(),
        Impact::High,
        "Conversion",
    ));

    recs.push(check(
        facts.has_booking_cta,
        CheckStatus::Fail,
        "Booking call to action",
        "A booking call to action was found.".to_string(),
        "No clear \"Book now\" or \"Check availability\" call to action found.".to_string(),
        Impact::High,
        "Conversion",
    ));

    recs.push(check(
        facts.has_reviews,
        CheckStatus::Warning,
        "Guest reviews",
        "Reviews or testimonials are referenced on the page.".to_string(),
        "No reviews or testimonials found on the page.".to_string(),
        Impact::Medium,
        "Trust",
    ));

    recs.push(check(
        facts.has_contact_info,
        CheckStatus::Warning,
        "Contact information",
        "A phone number or email address is visible.".to_string(),
        "No phone number or email address found.".to_string(),
        Impact::Medium,
        "Trust",
    ));

    let (status, description) = match facts.image_count {
        0 => (
            CheckStatus::Fail,
            "No images found. Photos are the main driver of booking intent.".to_string(),
        ),
        1..=5 => (
            CheckStatus::Warning,
            format!(
                "Only {} images found. Add more photos of rooms and amenities.",
                facts.image_count
            ),
        ),
        n => (CheckStatus::Pass, format!("{} images found.", n)),
    };
    recs.push(Recommendation::new(
        "Imagery",
        description,
        status,
        Impact::Medium,
        "Content",
    ));

    let (status, description) = match facts.load_time_ms {
        t if t < 2000 => (CheckStatus::Pass, format!("Page loaded in {}ms.", t)),
        t if t < 4000 => (
            CheckStatus::Warning,
            format!("Page took {}ms to load. Aim for under 2 seconds.", t),
        ),
        t => (
            CheckStatus::Fail,
            format!("Page took {}ms to load. Slow pages lose most mobile visitors.", t),
        ),
    };
    recs.push(Recommendation::new("Load time", description, status, Impact::High, "Performance"));

    let kb = facts.page_bytes / 1000;
    recs.push(if facts.page_bytes < PAGE_SIZE_LIMIT_BYTES {
        Recommendation::new(
            "Page weight",
            format!("HTML is {}KB.", kb),
            CheckStatus::Pass,
            Impact::Low,
            "Performance",
        )
    } else {
        Recommendation::new(
            "Page weight",
            format!("HTML is {}KB. Keep it under 500KB.", kb),
            CheckStatus::Warning,
            Impact::Low,
            "Performance",
        )
    });

    recs
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn page(html: &str, load_time_ms: u64) -> RawPageFetch {
        RawPageFetch {
            url: "https://lakeside.example".to_string(),
            final_url: "https://lakeside.example/".to_string(),
            html: html.to_string(),
            status_code: 200,
            headers: BTreeMap::new(),
            content_length: html.len(),
            load_time_ms,
            error: None,
        }
    }

    fn status_of(analysis: &ContentAnalysis, title: &str) -> CheckStatus {
        analysis
            .recommendations
            .iter()
            .find(|r| r.title == title)
            .map(|r| r.status)
            .unwrap()
    }

    const RICH_PAGE: &str = r#"<html><head>
        <title>  Lakeside   Cabins </title>
        <meta name="description" content="Cabins on the lake">
        <meta name="viewport" content="width=device-width">
        </head><body>
        <a class="btn" href="/book">Book now</a>
        <p>Rooms from $129 per night</p>
        <img src="1.jpg"><img src="2.jpg"><img src="3.jpg">
        <img src="4.jpg"><IMG src="5.jpg"><img src="6.jpg">
        <section id="reviews">Guest reviews</section>
        <a href="tel:+15551234567">Call us</a>
        </body></html>"#;

    #[test]
    fn test_rich_page_facts() {
        let analysis = analyze_content(&page(RICH_PAGE, 800), "lakeside.example");
        let facts = &analysis.facts;

        assert!(facts.ssl_reachable);
        assert_eq!(facts.title.as_deref(), Some("Lakeside Cabins"));
        assert!(facts.has_meta_description);
        assert!(facts.has_viewport);
        assert!(facts.has_pricing);
        assert!(facts.has_booking_cta);
        assert!(facts.has_reviews);
        assert!(facts.has_contact_info);
        assert_eq!(facts.image_count, 6);
        assert!(analysis
            .recommendations
            .iter()
            .all(|r| r.status == CheckStatus::Pass));
    }

    #[test]
    fn test_empty_page_fails_checks() {
        let analysis = analyze_content(&page("<html></html>", 100), "lakeside.example");
        assert_eq!(status_of(&analysis, "Page title"), CheckStatus::Fail);
        assert_eq!(status_of(&analysis, "Imagery"), CheckStatus::Fail);
        assert_eq!(status_of(&analysis, "Guest reviews"), CheckStatus::Warning);
        assert_eq!(status_of(&analysis, "Load time"), CheckStatus::Pass);
    }

    #[test]
    fn test_image_thresholds() {
        let three = "<img><img><img>";
        let analysis = analyze_content(&page(three, 100), "x.example");
        assert_eq!(status_of(&analysis, "Imagery"), CheckStatus::Warning);

        let five = "<img>".repeat(5);
        let analysis = analyze_content(&page(&five, 100), "x.example");
        assert_eq!(status_of(&analysis, "Imagery"), CheckStatus::Warning);
    }

    #[test]
    fn test_load_time_thresholds() {
        let analysis = analyze_content(&page("", 1999), "x.example");
        assert_eq!(status_of(&analysis, "Load time"), CheckStatus::Pass);
        let analysis = analyze_content(&page("", 2000), "x.example");
        assert_eq!(status_of(&analysis, "Load time"), CheckStatus::Warning);
        let analysis = analyze_content(&page("", 4000), "x.example");
        assert_eq!(status_of(&analysis, "Load time"), CheckStatus::Fail);
    }

    #[test]
    fn test_page_weight_threshold() {
        let mut fetch = page("", 100);
        fetch.content_length = PAGE_SIZE_LIMIT_BYTES;
        let analysis = analyze_content(&fetch, "x.example");
        assert_eq!(status_of(&analysis, "Page weight"), CheckStatus::Warning);
    }

    #[test]
    fn test_failed_fetch_is_not_reachable() {
        let fetch =
            RawPageFetch::failed("https://down.example", 15000, "Request timed out after 15s");
        let analysis = analyze_content(&fetch, "down.example");
        assert!(!analysis.facts.ssl_reachable);
        assert_eq!(status_of(&analysis, "Secure, reachable homepage"), CheckStatus::Fail);
    }
}
