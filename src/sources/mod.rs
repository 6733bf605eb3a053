//! External data sources: PageSpeed Insights and the two SEO providers

pub mod csv;
pub mod dataforseo;
pub mod pagespeed;
pub mod semrush;

pub use dataforseo::{
    calculate_authority_score, fetch_dataforseo, DataForSeoData, OrganicMetrics,
};
pub use pagespeed::{
    extract_core_web_vitals, extract_lighthouse_scores, fetch_pagespeed, PageSpeedData,
};
pub use semrush::{fetch_semrush, SemrushData};

use crate::config::AuditConfig;
use crate::fetch::describe_transport_error;
use crate::trail::{ApiCallRecord, PendingCall};
use crate::types::SeoMetrics;
use reqwest::{Client, Method, RequestBuilder};
use tracing::{debug, warn};

/// Send one request and return its body when the status is 2xx.
///
/// Every outcome is recorded in the trail. `method` must match the builder's;
/// `trail_headers`/`trail_body` describe what it sends so the curl
/// reconstruction is complete.
pub(crate) async fn send_for_text(
    client: &Client,
    source: &str,
    builder: RequestBuilder,
    method: Method,
    trail_headers: &[(&str, &str)],
    trail_body: Option<&str>,
    timeout_secs: u64,
) -> (Option<String>, ApiCallRecord) {
    let request = match builder.build() {
        Ok(request) => request,
        Err(e) => {
            warn!("Failed to build {} request: {}", source, e);
            let call = PendingCall::start(source, method.as_str(), "", trail_headers, trail_body);
            return (None, call.fail(format!("Invalid request: {}", e)));
        }
    };

    let call = PendingCall::start(
        source,
        request.method().as_str(),
        request.url().as_str(),
        trail_headers,
        trail_body,
    );
    debug!("{} {} ({})", request.method(), call_target(&request), source);

    let response = match client.execute(request).await {
        Ok(response) => response,
        Err(e) => {
            let message = describe_transport_error(&e, timeout_secs);
            warn!("{} request failed: {}", source, message);
            return (None, call.fail(message));
        }
    };

    let status = response.status();
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            let message = format!("Failed to read response body: {}", e);
            warn!("{}: {}", source, message);
            return (None, call.finish(status.as_u16(), 0, Some(message)));
        }
    };

    if !status.is_success() {
        warn!("{} returned HTTP {}", source, status);
        let record = call.finish(status.as_u16(), body.len(), Some(format!("HTTP {}", status)));
        return (None, record);
    }

    let record = call.finish(status.as_u16(), body.len(), None);
    (Some(body), record)
}

fn call_target(request: &reqwest::Request) -> String {
    let url = request.url();
    format!("{}{}", url.host_str().unwrap_or(""), url.path())
}

/// Outcome of querying both SEO providers
#[derive(Debug, Clone)]
pub struct SeoOutcome {
    pub dataforseo: Option<DataForSeoData>,
    pub semrush: Option<SemrushData>,
    /// Primary snapshot chosen by [`select_primary_metrics`]
    pub selected: SeoMetrics,
    pub calls: Vec<ApiCallRecord>,
    pub notes: Vec<String>,
}

/// Provider precedence: DataForSEO if present, else Semrush, else an empty
/// `none`-sourced snapshot.
pub fn select_primary_metrics(
    dataforseo: Option<&SeoMetrics>,
    semrush: Option<&SeoMetrics>,
) -> SeoMetrics {
    dataforseo
        .or(semrush)
        .cloned()
        .unwrap_or_else(SeoMetrics::unavailable)
}

/// Query both SEO providers concurrently.
///
/// Both are always invoked; a provider without credentials resolves to `None`
/// immediately and leaves an advisory note.
pub async fn fetch_seo_metrics(client: &Client, domain: &str, config: &AuditConfig) -> SeoOutcome {
    let ((dataforseo, mut calls), (semrush, semrush_calls)) = tokio::join!(
        fetch_dataforseo(client, domain, config),
        fetch_semrush(client, domain, config),
    );
    calls.extend(semrush_calls);

    let mut notes = Vec::new();
    if config.credentials.dataforseo().is_none() {
        notes.push("DataForSEO credentials not configured; provider skipped".to_string());
    } else if dataforseo.is_none() {
        notes.push("DataForSEO data unavailable".to_string());
    }
    if config.credentials.semrush_api_key.is_none() {
        notes.push("Semrush API key not configured; provider skipped".to_string());
    } else if semrush.is_none() {
        notes.push("Semrush data unavailable".to_string());
    }

    let selected = select_primary_metrics(
        dataforseo.as_ref().map(|d| &d.metrics),
        semrush.as_ref().map(|s| &s.metrics),
    );
    debug!("Selected SEO metrics source: {}", selected.source);

    SeoOutcome {
        dataforseo,
        semrush,
        selected,
        calls,
        notes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SeoSource;

    fn metrics(source: SeoSource, traffic: u64) -> SeoMetrics {
        SeoMetrics {
            organic_traffic: Some(traffic),
            source,
            ..SeoMetrics::unavailable()
        }
    }

    #[test]
    fn test_select_prefers_dataforseo() {
        let a = metrics(SeoSource::DataForSeo, 100);
        let b = metrics(SeoSource::Semrush, 900);
        assert_eq!(select_primary_metrics(Some(&a), Some(&b)), a);
    }

    #[test]
    fn test_select_falls_back_to_semrush() {
        let b = metrics(SeoSource::Semrush, 900);
        assert_eq!(select_primary_metrics(None, Some(&b)), b);
    }

    #[test]
    fn test_select_none_when_both_missing() {
        let selected = select_primary_metrics(None, None);
        assert_eq!(selected.source, SeoSource::None);
        assert!(selected.organic_traffic.is_none());
    }

    #[tokio::test]
    async fn test_unbuildable_request_keeps_method() {
        let config = AuditConfig::default();
        let client = crate::fetch::build_client(&config.network).unwrap();

        let (body, record) = send_for_text(
            &client,
            "dataforseo:backlinks_summary",
            client.post("not a url"),
            Method::POST,
            &[],
            Some("[]"),
            5,
        )
        .await;

        assert!(body.is_none());
        assert_eq!(record.method, "POST");
        assert_eq!(record.status, None);
        assert!(record.error.as_deref().unwrap().starts_with("Invalid request"));
    }

    #[tokio::test]
    async fn test_no_credentials_yields_nothing_without_calls() {
        let config = AuditConfig::builder()
            .credentials(crate::config::ProviderCredentials::none())
            .build();
        let client = crate::fetch::build_client(&config.network).unwrap();

        let outcome = fetch_seo_metrics(&client, "example.com", &config).await;
        assert!(outcome.dataforseo.is_none());
        assert!(outcome.semrush.is_none());
        assert!(outcome.calls.is_empty());
        assert_eq!(outcome.selected.source, SeoSource::None);
        assert_eq!(outcome.notes.len(), 2);
    }
}
