//! Core data types for audit results

use crate::sources::dataforseo::DataForSeoRaw;
use crate::sources::semrush::SemrushRaw;
use crate::trail::ApiCallRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Outcome of the direct page fetch.
///
/// A failed fetch is still a `RawPageFetch`: status 0, empty body, `error` set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPageFetch {
    /// URL that was requested
    pub url: String,
    /// URL after redirects
    pub final_url: String,
    /// Response body
    pub html: String,
    /// HTTP status (0 when the request never completed)
    pub status_code: u16,
    /// Response headers with lowercase names
    pub headers: BTreeMap<String, String>,
    /// Body size in bytes
    pub content_length: usize,
    /// Wall-clock time of the request
    pub load_time_ms: u64,
    /// Transport error, if any
    pub error: Option<String>,
}

impl RawPageFetch {
    /// Build the errored form of a fetch
    pub fn failed(url: &str, load_time_ms: u64, error: impl Into<String>) -> Self {
        Self {
            url: url.to_string(),
            final_url: url.to_string(),
            html: String::new(),
            status_code: 0,
            headers: BTreeMap::new(),
            content_length: 0,
            load_time_ms,
            error: Some(error.into()),
        }
    }

    /// Whether the page came back with a usable 200 response
    pub fn is_ok(&self) -> bool {
        self.error.is_none() && self.status_code == 200
    }
}

/// Page fetch summary kept in the raw data section (body omitted)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HtmlFetchSnapshot {
    pub url: String,
    pub final_url: String,
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub content_length: usize,
    pub load_time_ms: u64,
    pub error: Option<String>,
}

impl From<&RawPageFetch> for HtmlFetchSnapshot {
    fn from(fetch: &RawPageFetch) -> Self {
        Self {
            url: fetch.url.clone(),
            final_url: fetch.final_url.clone(),
            status_code: fetch.status_code,
            headers: fetch.headers.clone(),
            content_length: fetch.content_length,
            load_time_ms: fetch.load_time_ms,
            error: fetch.error.clone(),
        }
    }
}

/// Rating bucket for a web-vitals metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rating {
    Good,
    NeedsImprovement,
    Poor,
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Good => write!(f, "good"),
            Self::NeedsImprovement => write!(f, "needs-improvement"),
            Self::Poor => write!(f, "poor"),
        }
    }
}

/// Where a metric value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricSource {
    /// Real-user measurements
    Field,
    /// Synthetic single-run measurement
    Lab,
}

/// One rated web-vitals measurement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricValue {
    pub value: f64,
    pub rating: Rating,
    pub source: MetricSource,
}

/// Normalized Core Web Vitals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreWebVitals {
    /// Largest Contentful Paint (ms)
    pub lcp: MetricValue,
    /// First Input Delay (ms); field data only
    pub fid: Option<MetricValue>,
    /// Cumulative Layout Shift (unitless)
    pub cls: MetricValue,
    /// First Contentful Paint (ms)
    pub fcp: MetricValue,
    /// Total Blocking Time (ms); lab data only
    pub tbt: Option<MetricValue>,
}

/// Lighthouse category scores on a 0-100 scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LighthouseScores {
    pub performance: Option<u8>,
    pub accessibility: Option<u8>,
    pub best_practices: Option<u8>,
    pub seo: Option<u8>,
}

/// Which SEO provider a metrics snapshot came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeoSource {
    #[serde(rename = "dataforseo")]
    DataForSeo,
    #[serde(rename = "semrush")]
    Semrush,
    #[serde(rename = "none")]
    None,
}

impl std::fmt::Display for SeoSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DataForSeo => write!(f, "DataForSEO"),
            Self::Semrush => write!(f, "Semrush"),
            Self::None => write!(f, "none"),
        }
    }
}

/// Domain-level search metrics from one provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeoMetrics {
    pub organic_traffic: Option<u64>,
    pub organic_keywords: Option<u64>,
    pub backlinks: Option<u64>,
    pub domain_rank: Option<u64>,
    pub authority_score: Option<u8>,
    pub source: SeoSource,
}

impl SeoMetrics {
    /// Snapshot used when no provider returned data
    pub fn unavailable() -> Self {
        Self {
            organic_traffic: None,
            organic_keywords: None,
            backlinks: None,
            domain_rank: None,
            authority_score: None,
            source: SeoSource::None,
        }
    }
}

/// Both provider snapshots, kept side by side for comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeoProviderSnapshots {
    #[serde(rename = "dataForSEO")]
    pub data_for_seo: Option<SeoMetrics>,
    pub semrush: Option<SeoMetrics>,
}

/// One weighted score category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub name: String,
    /// Score (0-100)
    pub score: u8,
    /// Weight; all category weights sum to 100
    pub weight: u8,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Outcome of a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Fail,
    Warning,
    Pass,
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fail => write!(f, "fail"),
            Self::Warning => write!(f, "warning"),
            Self::Pass => write!(f, "pass"),
        }
    }
}

/// Business impact of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Impact {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Impact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "High"),
            Self::Medium => write!(f, "Medium"),
            Self::Low => write!(f, "Low"),
        }
    }
}

/// A human-readable finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub description: String,
    pub status: CheckStatus,
    pub impact: Impact,
    pub category: String,
}

impl Recommendation {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        status: CheckStatus,
        impact: Impact,
        category: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            status,
            impact,
            category: category.into(),
        }
    }
}

/// Raw per-source payloads, kept for debugging and later re-parsing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawApiData {
    pub page_speed: Option<serde_json::Value>,
    #[serde(rename = "dataForSEO")]
    pub data_for_seo: Option<DataForSeoRaw>,
    pub semrush: Option<SemrushRaw>,
    pub html_fetch: HtmlFetchSnapshot,
}

/// Run metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditMetadata {
    /// Time spent fetching the page itself
    pub fetch_time_ms: u64,
    /// Sources that returned usable data
    pub data_sources_used: Vec<String>,
    /// Advisory notes about missing or degraded sources
    pub notes: Vec<String>,
}

/// Complete result of one audit run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditResult {
    /// Fresh identity for every run
    pub id: Uuid,
    pub domain: String,
    pub url: String,
    pub timestamp: DateTime<Utc>,
    /// Weighted overall score (0-100)
    pub overall_score: u8,
    /// Headroom heuristic: min(95, overall + 25)
    pub projected_score: u8,
    pub monthly_revenue_loss: u32,
    pub summary: String,
    pub categories: Vec<CategoryScore>,
    pub recommendations: Vec<Recommendation>,
    pub core_web_vitals: Option<CoreWebVitals>,
    pub lighthouse_scores: Option<LighthouseScores>,
    /// Selected SEO snapshot
    pub seo_metrics: SeoMetrics,
    pub seo_providers: SeoProviderSnapshots,
    pub raw_api_data: RawApiData,
    /// Request/response trail for every external call
    pub api_calls: Vec<ApiCallRecord>,
    pub meta: AuditMetadata,
}

impl AuditResult {
    /// Sum of category weights (always 100)
    pub fn total_weight(&self) -> u32 {
        self.categories.iter().map(|c| c.weight as u32).sum()
    }

    /// Number of recommendations with the given status
    pub fn count_status(&self, status: CheckStatus) -> usize {
        self.recommendations
            .iter()
            .filter(|r| r.status == status)
            .count()
    }
}
