//! Fetch domain metrics from DataForSEO

use crate::config::AuditConfig;
use crate::error::{AuditError, Result};
use crate::sources::send_for_text;
use crate::trail::ApiCallRecord;
use crate::types::{SeoMetrics, SeoSource};
use reqwest::{Client, Method};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

/// DataForSEO's success code, used both on the envelope and on each task
const STATUS_OK: i64 = 20000;

/// Raw JSON responses kept for the result's raw data section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataForSeoRaw {
    pub rank_overview: Option<serde_json::Value>,
    pub backlinks_summary: Option<serde_json::Value>,
}

/// Organic ranking distribution from `domain_rank_overview`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrganicMetrics {
    #[serde(default)]
    pub pos_1: u64,
    #[serde(default)]
    pub pos_2_3: u64,
    #[serde(default)]
    pub pos_4_10: u64,
    /// Total ranking keywords
    #[serde(default)]
    pub count: u64,
    /// Estimated monthly traffic value
    #[serde(default)]
    pub etv: f64,
}

/// A usable DataForSEO result
#[derive(Debug, Clone)]
pub struct DataForSeoData {
    pub metrics: SeoMetrics,
    pub raw: DataForSeoRaw,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct Envelope<T> {
    status_code: Option<i64>,
    status_message: Option<String>,
    #[serde(default)]
    tasks: Vec<Task<T>>,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct Task<T> {
    status_code: Option<i64>,
    status_message: Option<String>,
    result: Option<Vec<T>>,
}

#[derive(Debug, Deserialize)]
struct RankOverviewResult {
    #[serde(default)]
    items: Option<Vec<RankOverviewItem>>,
}

#[derive(Debug, Deserialize)]
struct RankOverviewItem {
    metrics: Option<RankMetrics>,
}

#[derive(Debug, Deserialize)]
struct RankMetrics {
    organic: Option<OrganicMetrics>,
}

#[derive(Debug, Deserialize)]
struct BacklinksSummary {
    rank: Option<u64>,
    backlinks: Option<u64>,
}

/// Synthesize a 0-100 authority score from the ranking distribution.
///
/// Rank-weighted share: (pos_1×3 + pos_2_3×2 + pos_4_10) / count, ×500, capped
/// at 100. Traffic score: log10(etv + 1) × 15, capped at 100. The result is
/// the rounded mean of the two. No keywords means no authority.
pub fn calculate_authority_score(organic: &OrganicMetrics) -> u8 {
    if organic.count == 0 {
        return 0;
    }

    let weighted = (organic.pos_1 * 3 + organic.pos_2_3 * 2 + organic.pos_4_10) as f64;
    let rank_score = (weighted / organic.count as f64 * 100.0 * 5.0).min(100.0);
    let traffic_score = ((organic.etv.max(0.0) + 1.0).log10() * 15.0).min(100.0);

    ((rank_score + traffic_score) / 2.0).round().clamp(0.0, 100.0) as u8
}

/// Unwrap the first result of the first task, checking both status codes
fn first_result<T: serde::de::DeserializeOwned>(raw: &serde_json::Value) -> Result<Option<T>> {
    let envelope: Envelope<T> = serde_json::from_value(raw.clone())
        .map_err(|e| AuditError::parse(format!("unexpected DataForSEO response shape: {}", e)))?;

    if envelope.status_code != Some(STATUS_OK) {
        return Err(AuditError::api(
            "DataForSEO",
            format!(
                "status {}: {}",
                envelope.status_code.unwrap_or_default(),
                envelope.status_message.as_deref().unwrap_or("unknown")
            ),
        ));
    }

    let Some(task) = envelope.tasks.into_iter().next() else {
        return Ok(None);
    };
    if task.status_code != Some(STATUS_OK) {
        return Err(AuditError::api(
            "DataForSEO",
            format!(
                "task status {}: {}",
                task.status_code.unwrap_or_default(),
                task.status_message.as_deref().unwrap_or("unknown")
            ),
        ));
    }

    Ok(task.result.and_then(|r| r.into_iter().next()))
}

/// Extract organic metrics from a `domain_rank_overview` response
pub fn parse_rank_overview(raw: &serde_json::Value) -> Result<Option<OrganicMetrics>> {
    let result: Option<RankOverviewResult> = first_result(raw)?;
    Ok(result
        .and_then(|r| r.items)
        .and_then(|items| items.into_iter().next())
        .and_then(|item| item.metrics)
        .and_then(|m| m.organic))
}

/// Extract (rank, backlinks) from a `backlinks/summary` response
pub fn parse_backlinks_summary(
    raw: &serde_json::Value,
) -> Result<Option<(Option<u64>, Option<u64>)>> {
    let result: Option<BacklinksSummary> = first_result(raw)?;
    Ok(result.map(|s| (s.rank, s.backlinks)))
}

async fn post_task(
    client: &Client,
    source: &str,
    url: String,
    body: serde_json::Value,
    (login, password): (&str, &str),
    config: &AuditConfig,
) -> (Option<serde_json::Value>, ApiCallRecord) {
    let body_text = body.to_string();
    let builder = client
        .post(&url)
        .basic_auth(login, Some(password))
        .json(&body)
        .timeout(config.network.seo_timeout());

    let (text, mut record) = send_for_text(
        client,
        source,
        builder,
        Method::POST,
        &[("Authorization", "Basic"), ("Content-Type", "application/json")],
        Some(&body_text),
        config.network.seo_timeout_secs,
    )
    .await;

    let Some(text) = text else {
        return (None, record);
    };

    match serde_json::from_str(&text) {
        Ok(value) => (Some(value), record),
        Err(e) => {
            warn!("{} returned invalid JSON (HTTP {:?}): {}", source, record.status, e);
            record.error = Some(format!("Invalid JSON: {}", e));
            (None, record)
        }
    }
}

/// Fetch rank overview and backlink summary for a domain concurrently.
///
/// Returns `None` without any request when credentials are missing, and
/// `None` when neither endpoint produced data.
pub async fn fetch_dataforseo(
    client: &Client,
    domain: &str,
    config: &AuditConfig,
) -> (Option<DataForSeoData>, Vec<ApiCallRecord>) {
    let Some(auth) = config.credentials.dataforseo() else {
        debug!("DataForSEO credentials not configured; skipping");
        return (None, Vec::new());
    };

    let base = config.endpoints.dataforseo.trim_end_matches('/');
    let rank_body = json!([{
        "target": domain,
        "location_code": config.seo.location_code,
        "language_code": config.seo.language_code,
    }]);
    let backlinks_body = json!([{
        "target": domain,
        "include_subdomains": true,
    }]);

    let ((rank_raw, mut rank_call), (backlinks_raw, mut backlinks_call)) = tokio::join!(
        post_task(
            client,
            "dataforseo:domain_rank_overview",
            format!("{}/dataforseo_labs/google/domain_rank_overview/live", base),
            rank_body,
            auth,
            config,
        ),
        post_task(
            client,
            "dataforseo:backlinks_summary",
            format!("{}/backlinks/summary/live", base),
            backlinks_body,
            auth,
            config,
        ),
    );

    let organic = rank_raw
        .as_ref()
        .and_then(|raw| accept(parse_rank_overview(raw), &mut rank_call));
    let summary = backlinks_raw
        .as_ref()
        .and_then(|raw| accept(parse_backlinks_summary(raw), &mut backlinks_call));

    let calls = vec![rank_call, backlinks_call];
    let raw = DataForSeoRaw {
        rank_overview: rank_raw,
        backlinks_summary: backlinks_raw,
    };

    if organic.is_none() && summary.is_none() {
        warn!("DataForSEO returned no usable data for {}", domain);
        return (None, calls);
    }

    let (domain_rank, backlinks) = summary.unwrap_or((None, None));
    let metrics = SeoMetrics {
        organic_traffic: organic.as_ref().map(|o| o.etv.max(0.0).round() as u64),
        organic_keywords: organic.as_ref().map(|o| o.count),
        backlinks,
        domain_rank,
        authority_score: organic.as_ref().map(calculate_authority_score),
        source: SeoSource::DataForSeo,
    };

    (Some(DataForSeoData { metrics, raw }), calls)
}

// An API-level rejection inside a 200 response is still a failed call
fn accept<T>(parsed: Result<Option<T>>, record: &mut ApiCallRecord) -> Option<T> {
    match parsed {
        Ok(value) => value,
        Err(e) => {
            warn!("{} rejected: {}", record.source, e);
            record.error = Some(e.to_string());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trail::PendingCall;

    #[test]
    fn test_authority_zero_keywords() {
        let organic = OrganicMetrics {
            count: 0,
            etv: 50_000.0,
            ..OrganicMetrics::default()
        };
        assert_eq!(calculate_authority_score(&organic), 0);
    }

    #[test]
    fn test_authority_score_formula() {
        // rank: (10*3 + 20*2 + 30) / 1000 * 500 = 50; traffic: log10(100) * 15 = 30
        let organic = OrganicMetrics {
            pos_1: 10,
            pos_2_3: 20,
            pos_4_10: 30,
            count: 1000,
            etv: 99.0,
        };
        assert_eq!(calculate_authority_score(&organic), 40);
    }

    #[test]
    fn test_authority_score_caps() {
        let organic = OrganicMetrics {
            pos_1: 100,
            pos_2_3: 0,
            pos_4_10: 0,
            count: 100,
            etv: 1e12,
        };
        assert_eq!(calculate_authority_score(&organic), 100);
    }

    #[test]
    fn test_parse_rank_overview() {
        let raw = json!({
            "status_code": 20000,
            "status_message": "Ok.",
            "tasks": [{
                "status_code": 20000,
                "status_message": "Ok.",
                "result": [{
                    "items": [{
                        "metrics": {
                            "organic": { "pos_1": 4, "pos_2_3": 6, "pos_4_10": 12, "count": 210, "etv": 3520.7 }
                        }
                    }]
                }]
            }]
        });
        let organic = parse_rank_overview(&raw).unwrap().unwrap();
        assert_eq!(organic.count, 210);
        assert_eq!(organic.pos_4_10, 12);
    }

    #[test]
    fn test_task_error_rejected() {
        let raw = json!({
            "status_code": 20000,
            "tasks": [{ "status_code": 40501, "status_message": "Invalid Field", "result": null }]
        });
        let err = parse_rank_overview(&raw).unwrap_err();
        assert!(err.to_string().contains("40501"));
    }

    #[test]
    fn test_envelope_error_rejected() {
        let raw = json!({ "status_code": 40100, "status_message": "You are not authorized" });
        assert!(matches!(
            parse_backlinks_summary(&raw),
            Err(AuditError::ApiError { .. })
        ));
    }

    #[test]
    fn test_rejected_response_marks_call_failed() {
        let raw = json!({ "status_code": 40100, "status_message": "You are not authorized" });
        let mut record = PendingCall::start(
            "dataforseo:domain_rank_overview",
            "POST",
            "https://api.dataforseo.com/v3/dataforseo_labs/google/domain_rank_overview/live",
            &[],
            None,
        )
        .finish(200, 64, None);

        assert_eq!(accept(parse_rank_overview(&raw), &mut record), None);
        assert_eq!(record.status, Some(200));
        assert!(record.error.as_deref().unwrap().contains("40100"));
        assert!(!record.succeeded());
    }

    #[test]
    fn test_null_items_is_empty() {
        let raw = json!({
            "status_code": 20000,
            "tasks": [{ "status_code": 20000, "result": [{ "items": null }] }]
        });
        assert_eq!(parse_rank_overview(&raw).unwrap(), None);
    }
}
