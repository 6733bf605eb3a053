//! Main audit orchestration logic

use crate::analyzers::{
    BookingFlowAnalyzer, HeuristicBookingFlowAnalyzer, HeuristicTrustSignalAnalyzer,
    TrustSignalAnalyzer,
};
use crate::config::AuditConfig;
use crate::content::analyze_content;
use crate::error::{AuditError, Result};
use crate::fetch::{build_client, fetch_page};
use crate::recommendations::{compile_recommendations, RecommendationInputs};
use crate::revenue::estimate_revenue_loss;
use crate::scoring::{
    calculate_category_scores, calculate_overall_score, calculate_projected_score, ScoreInputs,
};
use crate::sources::{
    extract_core_web_vitals, extract_lighthouse_scores, fetch_pagespeed, fetch_seo_metrics,
};
use crate::types::{
    AuditMetadata, AuditResult, CheckStatus, HtmlFetchSnapshot, RawApiData, RawPageFetch,
    SeoProviderSnapshots,
};
use chrono::Utc;
use reqwest::Client;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

/// Progress callback: `(percent, step label)`
pub type ProgressFn = dyn Fn(u8, &str) + Send + Sync;

/// Forwards progress to an optional callback, never letting the percentage go
/// backwards.
pub struct ProgressTracker<'a> {
    callback: Option<&'a ProgressFn>,
    last: u8,
}

impl<'a> ProgressTracker<'a> {
    pub fn new(callback: Option<&'a ProgressFn>) -> Self {
        Self { callback, last: 0 }
    }

    pub fn report(&mut self, percent: u8, label: &str) {
        let percent = percent.clamp(self.last, 100);
        self.last = percent;
        debug!("[{:>3}%] {}", percent, label);
        if let Some(callback) = self.callback {
            callback(percent, label);
        }
    }

    pub fn last(&self) -> u8 {
        self.last
    }
}

/// Once-initialized audit handle: configuration, shared HTTP client and the
/// two domain analyzers.
pub struct Auditor {
    config: AuditConfig,
    client: Client,
    booking: Box<dyn BookingFlowAnalyzer>,
    trust: Box<dyn TrustSignalAnalyzer>,
}

impl Auditor {
    /// Create an auditor with the keyword-heuristic analyzers
    pub fn new(config: AuditConfig) -> Result<Self> {
        let client = build_client(&config.network)?;
        Ok(Self {
            config,
            client,
            booking: Box::new(HeuristicBookingFlowAnalyzer),
            trust: Box::new(HeuristicTrustSignalAnalyzer),
        })
    }

    /// Swap in other booking-flow and trust-signal analyzers
    pub fn with_analyzers(
        mut self,
        booking: Box<dyn BookingFlowAnalyzer>,
        trust: Box<dyn TrustSignalAnalyzer>,
    ) -> Self {
        self.booking = booking;
        self.trust = trust;
        self
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// Run one full audit.
    ///
    /// `domain` defaults to the URL host without `www.`. Fails only on an
    /// unusable URL; any external source may be missing from the result.
    pub async fn run(
        &self,
        url: &str,
        domain: Option<&str>,
        on_progress: Option<&ProgressFn>,
    ) -> Result<AuditResult> {
        let (target, domain) = resolve_target(url, domain)?;

        let mut progress = ProgressTracker::new(on_progress);
        progress.report(5, "Starting audit");
        info!("Starting audit of {} ({})", target, domain);

        let mut notes = Vec::new();
        let mut api_calls = Vec::new();

        let (page, page_call) = fetch_page(&self.client, &target, &self.config.network).await;
        api_calls.push(page_call);
        if let Some(note) = page_note(&page) {
            notes.push(note);
        }
        progress.report(20, "Fetched HTML");

        let ((pagespeed, pagespeed_call), seo) = tokio::join!(
            fetch_pagespeed(&self.client, &target, &self.config),
            fetch_seo_metrics(&self.client, &domain, &self.config),
        );
        api_calls.push(pagespeed_call);
        api_calls.extend(seo.calls);
        if pagespeed.is_none() {
            notes.push(
                "PageSpeed Insights data unavailable; performance score uses on-page checks only"
                    .to_string(),
            );
        }
        notes.extend(seo.notes);
        progress.report(40, "Fetched performance and SEO data");

        let content = analyze_content(&page, &domain);
        progress.report(50, "Analyzed HTML");

        let booking = self.booking.analyze(&page.html, &domain);
        progress.report(60, "Analyzed booking flow");

        let trust = self.trust.analyze(&page.html, &domain);
        progress.report(70, "Analyzed trust signals");

        let response = pagespeed.as_ref().map(|p| &p.response);
        let core_web_vitals = extract_core_web_vitals(response);
        let lighthouse_scores = extract_lighthouse_scores(response);

        let categories = calculate_category_scores(&ScoreInputs {
            content: &content.facts,
            booking: &booking,
            trust: &trust,
            lighthouse: lighthouse_scores.as_ref(),
            seo: &seo.selected,
        });
        let overall_score = calculate_overall_score(&categories);
        let projected_score = calculate_projected_score(overall_score);
        progress.report(85, "Calculated scores");

        let recommendations = compile_recommendations(&RecommendationInputs {
            content: &content.recommendations,
            booking: &booking.findings,
            trust: &trust.findings,
            core_web_vitals: core_web_vitals.as_ref(),
            lighthouse: lighthouse_scores.as_ref(),
            seo: &seo.selected,
        });
        progress.report(90, "Compiled recommendations");

        let monthly_revenue_loss = estimate_revenue_loss(overall_score, Some(&seo.selected));

        let mut data_sources_used = Vec::new();
        if page.is_ok() {
            data_sources_used.push("html".to_string());
        }
        if pagespeed.is_some() {
            data_sources_used.push("pagespeed".to_string());
        }
        if seo.dataforseo.is_some() {
            data_sources_used.push("dataforseo".to_string());
        }
        if seo.semrush.is_some() {
            data_sources_used.push("semrush".to_string());
        }

        let fail_count = recommendations
            .iter()
            .filter(|r| r.status == CheckStatus::Fail)
            .count();
        let warning_count = recommendations
            .iter()
            .filter(|r| r.status == CheckStatus::Warning)
            .count();
        let summary = summarize(
            &domain,
            overall_score,
            fail_count,
            warning_count,
            monthly_revenue_loss,
        );

        let result = AuditResult {
            id: Uuid::new_v4(),
            domain,
            url: target,
            timestamp: Utc::now(),
            overall_score,
            projected_score,
            monthly_revenue_loss,
            summary,
            categories,
            recommendations,
            core_web_vitals,
            lighthouse_scores,
            seo_metrics: seo.selected,
            seo_providers: SeoProviderSnapshots {
                data_for_seo: seo.dataforseo.as_ref().map(|d| d.metrics.clone()),
                semrush: seo.semrush.as_ref().map(|s| s.metrics.clone()),
            },
            raw_api_data: RawApiData {
                page_speed: pagespeed.map(|p| p.raw),
                data_for_seo: seo.dataforseo.map(|d| d.raw),
                semrush: seo.semrush.map(|s| s.raw),
                html_fetch: HtmlFetchSnapshot::from(&page),
            },
            api_calls,
            meta: AuditMetadata {
                fetch_time_ms: page.load_time_ms,
                data_sources_used,
                notes,
            },
        };

        info!(
            "Audit complete for {}: score {}/100, projected {}, {} recommendations, sources [{}]",
            result.domain,
            result.overall_score,
            result.projected_score,
            result.recommendations.len(),
            result.meta.data_sources_used.join(", ")
        );
        progress.report(100, "Complete");

        Ok(result)
    }
}

/// Run a single audit with a fresh [`Auditor`]
pub async fn run_audit(
    url: &str,
    domain: Option<&str>,
    config: &AuditConfig,
    on_progress: Option<&ProgressFn>,
) -> Result<AuditResult> {
    Auditor::new(config.clone())?.run(url, domain, on_progress).await
}

/// Validate the target and work out the audited domain.
///
/// A bare host gets `https://` prepended. Only http(s) URLs with a host are
/// accepted.
pub fn resolve_target(url: &str, domain: Option<&str>) -> Result<(String, String)> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(AuditError::invalid_url(url, "empty URL"));
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let parsed = Url::parse(&candidate).map_err(|e| AuditError::invalid_url(url, e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AuditError::invalid_url(
            url,
            format!("unsupported scheme '{}'", parsed.scheme()),
        ));
    }
    let host = parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| AuditError::invalid_url(url, "missing host"))?;

    let domain = match domain.map(str::trim).filter(|d| !d.is_empty()) {
        Some(explicit) => normalize_domain(explicit),
        None => normalize_domain(host),
    };

    Ok((parsed.to_string(), domain))
}

fn normalize_domain(host: &str) -> String {
    let lowered = host.trim_end_matches('.').to_ascii_lowercase();
    match lowered.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => lowered,
    }
}

fn page_note(page: &RawPageFetch) -> Option<String> {
    if let Some(error) = &page.error {
        warn!("Continuing without page content: {}", error);
        return Some(format!("Page fetch failed: {}", error));
    }
    if page.status_code != 200 {
        return Some(format!(
            "Page returned HTTP {}; content checks ran on the error page",
            page.status_code
        ));
    }
    None
}

fn grade(score: u8) -> char {
    match score {
        90..=100 => 'A',
        80..=89 => 'B',
        70..=79 => 'C',
        60..=69 => 'D',
        _ => 'F',
    }
}

fn summarize(domain: &str, overall: u8, fails: usize, warnings: usize, loss: u32) -> String {
    let mut summary = format!(
        "{} scores {}/100 (grade {}) with {} failing checks and {} warnings.",
        domain,
        overall,
        grade(overall),
        fails,
        warnings
    );
    if loss > 0 {
        summary.push_str(&format!(
            " Estimated ${} per month in lost direct bookings.",
            loss
        ));
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_resolve_target_derives_domain() {
        let (url, domain) = resolve_target("https://WWW.Example.com/rooms", None).unwrap();
        assert_eq!(url, "https://www.example.com/rooms");
        assert_eq!(domain, "example.com");
    }

    #[test]
    fn test_resolve_target_prepends_scheme() {
        let (url, domain) = resolve_target("lakeside-cabins.com", None).unwrap();
        assert_eq!(url, "https://lakeside-cabins.com/");
        assert_eq!(domain, "lakeside-cabins.com");
    }

    #[test]
    fn test_resolve_target_explicit_domain() {
        let (_, domain) =
            resolve_target("http://127.0.0.1:8080/", Some("www.Lakeside.com")).unwrap();
        assert_eq!(domain, "lakeside.com");

        let (_, domain) = resolve_target("http://127.0.0.1:8080/", Some("  ")).unwrap();
        assert_eq!(domain, "127.0.0.1");
    }

    #[test]
    fn test_resolve_target_rejects_bad_urls() {
        for bad in ["", "   ", "ftp://example.com", "http://", "not a url"] {
            let err = resolve_target(bad, None).unwrap_err();
            assert!(
                matches!(err, AuditError::InvalidUrl { .. }),
                "expected InvalidUrl for {:?}, got {:?}",
                bad,
                err
            );
        }
    }

    #[test]
    fn test_progress_never_decreases() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback: &ProgressFn =
            &move |percent: u8, _label: &str| sink.lock().unwrap().push(percent);

        let mut tracker = ProgressTracker::new(Some(callback));
        tracker.report(20, "a");
        tracker.report(10, "b");
        tracker.report(150, "c");

        assert_eq!(*seen.lock().unwrap(), vec![20, 20, 100]);
        assert_eq!(tracker.last(), 100);
    }

    #[test]
    fn test_progress_without_callback() {
        let mut tracker = ProgressTracker::new(None);
        tracker.report(40, "fetched");
        assert_eq!(tracker.last(), 40);
    }

    #[test]
    fn test_grades_and_summary() {
        assert_eq!(grade(95), 'A');
        assert_eq!(grade(60), 'D');
        assert_eq!(grade(12), 'F');

        let summary = summarize("example.com", 66, 3, 2, 1200);
        assert!(summary.starts_with("example.com scores 66/100 (grade D)"));
        assert!(summary.contains("$1200"));
        assert!(!summarize("example.com", 95, 0, 0, 0).contains('$'));
    }

    #[test]
    fn test_page_note() {
        let failed = RawPageFetch::failed("https://example.com", 5, "Connection refused");
        assert_eq!(
            page_note(&failed).as_deref(),
            Some("Page fetch failed: Connection refused")
        );
    }
}
