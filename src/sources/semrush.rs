//! Fetch domain metrics from Semrush
//!
//! Semrush answers with semicolon-delimited text. Four reports are requested
//! concurrently; any subset may fail and the rest still make a result.

use crate::config::AuditConfig;
use crate::sources::csv::{
    parse_backlinks_overview, parse_domain_overview, parse_organic_keywords,
    parse_referring_domains, BacklinksOverview, DomainOverview, OrganicKeyword, ReferringDomain,
};
use crate::sources::send_for_text;
use crate::trail::ApiCallRecord;
use crate::types::{SeoMetrics, SeoSource};
use reqwest::{Client, Method};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const OVERVIEW_COLUMNS: &str = "Db,Dn,Rk,Or,Ot,Oc,Ad,At,Ac";
const BACKLINKS_COLUMNS: &str = "ascore,total,domains_num,urls_num,ips_num,follows_num,nofollows_num";
const KEYWORD_COLUMNS: &str = "Ph,Po,Nq,Cp,Ur,Tr";
const REFDOMAIN_COLUMNS: &str = "domain_ascore,domain,backlinks_num";

/// Raw report bodies as returned by Semrush
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemrushRaw {
    pub domain_overview: Option<String>,
    pub backlinks_overview: Option<String>,
    pub organic_keywords: Option<String>,
    pub referring_domains: Option<String>,
}

/// Parsed Semrush reports
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemrushReport {
    pub overview: Option<DomainOverview>,
    pub backlinks: Option<BacklinksOverview>,
    pub top_keywords: Vec<OrganicKeyword>,
    pub referring_domains: Vec<ReferringDomain>,
}

impl SemrushReport {
    /// Re-parse stored raw bodies
    pub fn from_raw(raw: &SemrushRaw) -> Self {
        Self {
            overview: raw.domain_overview.as_deref().and_then(parse_domain_overview),
            backlinks: raw.backlinks_overview.as_deref().and_then(parse_backlinks_overview),
            top_keywords: raw
                .organic_keywords
                .as_deref()
                .map(parse_organic_keywords)
                .unwrap_or_default(),
            referring_domains: raw
                .referring_domains
                .as_deref()
                .map(parse_referring_domains)
                .unwrap_or_default(),
        }
    }

    fn is_empty(&self) -> bool {
        self.overview.is_none()
            && self.backlinks.is_none()
            && self.top_keywords.is_empty()
            && self.referring_domains.is_empty()
    }

    /// Normalize into the shared metrics snapshot
    pub fn metrics(&self) -> SeoMetrics {
        let overview = self.overview.as_ref();
        let backlinks = self.backlinks.as_ref();
        SeoMetrics {
            organic_traffic: overview.and_then(|o| o.organic_traffic),
            organic_keywords: overview.and_then(|o| o.organic_keywords),
            backlinks: backlinks.and_then(|b| b.total_backlinks),
            domain_rank: overview.and_then(|o| o.rank),
            authority_score: backlinks
                .and_then(|b| b.authority_score)
                .map(|s| s.min(100) as u8),
            source: SeoSource::Semrush,
        }
    }
}

/// A usable Semrush result
#[derive(Debug, Clone)]
pub struct SemrushData {
    pub metrics: SeoMetrics,
    pub raw: SemrushRaw,
}

/// Fetch the four Semrush reports for a domain.
///
/// Returns `None` without any request when no API key is configured, and
/// `None` when none of the four reports produced data.
pub async fn fetch_semrush(
    client: &Client,
    domain: &str,
    config: &AuditConfig,
) -> (Option<SemrushData>, Vec<ApiCallRecord>) {
    let Some(key) = config.credentials.semrush_api_key.as_deref() else {
        debug!("Semrush API key not configured; skipping");
        return (None, Vec::new());
    };

    let analytics = format!("{}/", config.endpoints.semrush.trim_end_matches('/'));
    let backlinks = format!("{}/", config.endpoints.semrush_backlinks.trim_end_matches('/'));
    let database = config.seo.semrush_database.as_str();
    let limit = config.seo.display_limit.to_string();

    let overview_params = [
        ("type", "domain_ranks"),
        ("key", key),
        ("export_columns", OVERVIEW_COLUMNS),
        ("domain", domain),
        ("database", database),
    ];
    let backlinks_params = [
        ("type", "backlinks_overview"),
        ("key", key),
        ("target", domain),
        ("target_type", "root_domain"),
        ("export_columns", BACKLINKS_COLUMNS),
    ];
    let keyword_params = [
        ("type", "domain_organic"),
        ("key", key),
        ("export_columns", KEYWORD_COLUMNS),
        ("domain", domain),
        ("database", database),
        ("display_limit", limit.as_str()),
        ("display_sort", "tr_desc"),
    ];
    let refdomain_params = [
        ("type", "backlinks_refdomains"),
        ("key", key),
        ("target", domain),
        ("target_type", "root_domain"),
        ("export_columns", REFDOMAIN_COLUMNS),
        ("display_limit", limit.as_str()),
    ];

    let timeout = config.network.seo_timeout();
    let timeout_secs = config.network.seo_timeout_secs;
    let get = |base: &str, params: &[(&str, &str)]| {
        client.get(base).query(params).timeout(timeout)
    };

    let (overview, backlinks_overview, keywords, refdomains) = tokio::join!(
        send_for_text(
            client,
            "semrush:domain_ranks",
            get(&analytics, &overview_params),
            Method::GET,
            &[],
            None,
            timeout_secs,
        ),
        send_for_text(
            client,
            "semrush:backlinks_overview",
            get(&backlinks, &backlinks_params),
            Method::GET,
            &[],
            None,
            timeout_secs,
        ),
        send_for_text(
            client,
            "semrush:domain_organic",
            get(&analytics, &keyword_params),
            Method::GET,
            &[],
            None,
            timeout_secs,
        ),
        send_for_text(
            client,
            "semrush:backlinks_refdomains",
            get(&backlinks, &refdomain_params),
            Method::GET,
            &[],
            None,
            timeout_secs,
        ),
    );

    let mut calls = vec![overview.1, backlinks_overview.1, keywords.1, refdomains.1];
    let raw = SemrushRaw {
        domain_overview: overview.0,
        backlinks_overview: backlinks_overview.0,
        organic_keywords: keywords.0,
        referring_domains: refdomains.0,
    };

    let report = SemrushReport::from_raw(&raw);
    flag_unparsed(&raw, &report, &mut calls);

    if report.is_empty() {
        warn!("Semrush returned no usable data for {}", domain);
        return (None, calls);
    }

    let metrics = report.metrics();
    (Some(SemrushData { metrics, raw }), calls)
}

// Semrush reports API errors as a 200 body starting with `ERROR nn :: ...`.
// Those calls are marked failed; other empty bodies are only logged.
fn flag_unparsed(raw: &SemrushRaw, report: &SemrushReport, calls: &mut [ApiCallRecord]) {
    let checks = [
        (&raw.domain_overview, report.overview.is_none()),
        (&raw.backlinks_overview, report.backlinks.is_none()),
        (&raw.organic_keywords, report.top_keywords.is_empty()),
        (&raw.referring_domains, report.referring_domains.is_empty()),
    ];

    for ((body, unparsed), call) in checks.iter().zip(calls.iter_mut()) {
        if let (Some(body), true) = (body.as_ref(), *unparsed) {
            let first_line = body.trim().lines().next().unwrap_or("").trim();
            warn!(
                "{} (HTTP {:?}) returned no rows: {}",
                call.source, call.status, first_line
            );
            if first_line.starts_with("ERROR") {
                call.error = Some(first_line.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trail::PendingCall;

    #[test]
    fn test_metrics_from_partial_report() {
        let raw = SemrushRaw {
            domain_overview: Some(
                "Db;Dn;Rk;Or;Ot;Oc;Ad;At;Ac\nus;example.com;500;120;4300;10.5;5;60;2.1".to_string(),
            ),
            backlinks_overview: Some("ERROR 50 :: NOTHING FOUND".to_string()),
            organic_keywords: None,
            referring_domains: None,
        };

        let report = SemrushReport::from_raw(&raw);
        let metrics = report.metrics();
        assert_eq!(metrics.organic_traffic, Some(4300));
        assert_eq!(metrics.organic_keywords, Some(120));
        assert_eq!(metrics.domain_rank, Some(500));
        assert_eq!(metrics.backlinks, None);
        assert_eq!(metrics.authority_score, None);
        assert_eq!(metrics.source, SeoSource::Semrush);
    }

    #[test]
    fn test_error_body_marks_call_failed() {
        let raw = SemrushRaw {
            domain_overview: Some("ERROR 132 :: API UNITS BALANCE IS ZERO".to_string()),
            backlinks_overview: Some("ascore;total;domains_num\n".to_string()),
            organic_keywords: None,
            referring_domains: None,
        };
        let report = SemrushReport::from_raw(&raw);
        let mut calls: Vec<ApiCallRecord> = ["domain_ranks", "backlinks_overview", "a", "b"]
            .iter()
            .map(|source| {
                PendingCall::start(*source, "GET", "https://api.semrush.com/", &[], None)
                    .finish(200, 40, None)
            })
            .collect();

        flag_unparsed(&raw, &report, &mut calls);

        assert_eq!(
            calls[0].error.as_deref(),
            Some("ERROR 132 :: API UNITS BALANCE IS ZERO")
        );
        assert!(!calls[0].succeeded());
        // Header-only body is empty data, not an API error
        assert!(calls[1].succeeded());
        assert!(calls[2].succeeded());
    }

    #[test]
    fn test_empty_report_detected() {
        let report = SemrushReport::from_raw(&SemrushRaw::default());
        assert!(report.is_empty());
    }
}
