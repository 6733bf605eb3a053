//! Fetch Core Web Vitals and Lighthouse scores from PageSpeed Insights

use crate::config::AuditConfig;
use crate::error::{AuditError, Result};
use crate::sources::send_for_text;
use crate::trail::ApiCallRecord;
use crate::types::{CoreWebVitals, LighthouseScores, MetricSource, MetricValue, Rating};
use reqwest::{Client, Method};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

const CATEGORIES: &[&str] = &["performance", "accessibility", "best-practices", "seo"];

/// PageSpeed Insights v5 response, reduced to the fields we read.
///
/// Every field is optional so an unexpected shape degrades to missing data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSpeedResponse {
    #[serde(default)]
    pub loading_experience: Option<LoadingExperience>,
    #[serde(default)]
    pub lighthouse_result: Option<LighthouseResult>,
    #[serde(default)]
    pub error: Option<ApiErrorBody>,
}

/// Real-user (CrUX) data
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadingExperience {
    #[serde(default)]
    pub metrics: BTreeMap<String, FieldMetric>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldMetric {
    pub percentile: Option<f64>,
    pub category: Option<String>,
}

/// Synthetic Lighthouse run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LighthouseResult {
    #[serde(default)]
    pub audits: BTreeMap<String, LabAudit>,
    #[serde(default)]
    pub categories: BTreeMap<String, LighthouseCategory>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabAudit {
    pub numeric_value: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LighthouseCategory {
    /// 0.0-1.0
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub code: Option<i64>,
    pub message: Option<String>,
}

/// A usable PageSpeed response plus its raw JSON
#[derive(Debug, Clone)]
pub struct PageSpeedData {
    pub response: PageSpeedResponse,
    pub raw: serde_json::Value,
}

/// Web-vitals metric with fixed rating thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebVital {
    Lcp,
    Fid,
    Cls,
    Fcp,
    Tbt,
}

impl WebVital {
    /// (good upper bound, needs-improvement upper bound)
    fn thresholds(self) -> (f64, f64) {
        match self {
            Self::Lcp => (2500.0, 4000.0),
            Self::Fid => (100.0, 300.0),
            Self::Cls => (0.10, 0.25),
            Self::Fcp => (1800.0, 3000.0),
            Self::Tbt => (200.0, 600.0),
        }
    }

    fn field_key(self) -> Option<&'static str> {
        match self {
            Self::Lcp => Some("LARGEST_CONTENTFUL_PAINT_MS"),
            Self::Fid => Some("FIRST_INPUT_DELAY_MS"),
            Self::Cls => Some("CUMULATIVE_LAYOUT_SHIFT_SCORE"),
            Self::Fcp => Some("FIRST_CONTENTFUL_PAINT_MS"),
            Self::Tbt => None,
        }
    }

    fn lab_key(self) -> Option<&'static str> {
        match self {
            Self::Lcp => Some("largest-contentful-paint"),
            Self::Fid => None,
            Self::Cls => Some("cumulative-layout-shift"),
            Self::Fcp => Some("first-contentful-paint"),
            Self::Tbt => Some("total-blocking-time"),
        }
    }
}

/// Rate a metric value against its thresholds (inclusive upper bounds)
pub fn rate(metric: WebVital, value: f64) -> Rating {
    let (good, needs_improvement) = metric.thresholds();
    if value <= good {
        Rating::Good
    } else if value <= needs_improvement {
        Rating::NeedsImprovement
    } else {
        Rating::Poor
    }
}

fn measure(metric: WebVital, value: f64, source: MetricSource) -> MetricValue {
    MetricValue {
        value,
        rating: rate(metric, value),
        source,
    }
}

fn field_value(response: &PageSpeedResponse, metric: WebVital) -> Option<f64> {
    let key = metric.field_key()?;
    let percentile = response
        .loading_experience
        .as_ref()?
        .metrics
        .get(key)?
        .percentile?;

    // CrUX reports CLS multiplied by 100
    if metric == WebVital::Cls {
        Some(percentile / 100.0)
    } else {
        Some(percentile)
    }
}

fn lab_value(response: &PageSpeedResponse, metric: WebVital) -> Option<f64> {
    let key = metric.lab_key()?;
    response
        .lighthouse_result
        .as_ref()?
        .audits
        .get(key)?
        .numeric_value
}

/// Normalize Core Web Vitals, preferring field data over lab data.
///
/// Field data is used when LCP, CLS and FCP are all present in it; otherwise
/// the lab audits of the same payload are used and FID is `None`. TBT only
/// exists as a lab metric and is attached whenever the lab run reported it.
pub fn extract_core_web_vitals(response: Option<&PageSpeedResponse>) -> Option<CoreWebVitals> {
    let response = response?;

    let tbt = lab_value(response, WebVital::Tbt)
        .map(|v| measure(WebVital::Tbt, v, MetricSource::Lab));

    let field = (
        field_value(response, WebVital::Lcp),
        field_value(response, WebVital::Cls),
        field_value(response, WebVital::Fcp),
    );
    if let (Some(lcp), Some(cls), Some(fcp)) = field {
        debug!("Using field web-vitals data");
        return Some(CoreWebVitals {
            lcp: measure(WebVital::Lcp, lcp, MetricSource::Field),
            fid: field_value(response, WebVital::Fid)
                .map(|v| measure(WebVital::Fid, v, MetricSource::Field)),
            cls: measure(WebVital::Cls, cls, MetricSource::Field),
            fcp: measure(WebVital::Fcp, fcp, MetricSource::Field),
            tbt,
        });
    }

    let lcp = lab_value(response, WebVital::Lcp)?;
    let cls = lab_value(response, WebVital::Cls)?;
    let fcp = lab_value(response, WebVital::Fcp)?;
    debug!("No field data; using lab web-vitals data");

    Some(CoreWebVitals {
        lcp: measure(WebVital::Lcp, lcp, MetricSource::Lab),
        fid: None,
        cls: measure(WebVital::Cls, cls, MetricSource::Lab),
        fcp: measure(WebVital::Fcp, fcp, MetricSource::Lab),
        tbt,
    })
}

/// Convert Lighthouse category scores (0-1) to 0-100
pub fn extract_lighthouse_scores(response: Option<&PageSpeedResponse>) -> Option<LighthouseScores> {
    let categories = &response?.lighthouse_result.as_ref()?.categories;

    let score = |key: &str| {
        categories
            .get(key)
            .and_then(|c| c.score)
            .map(|s| (s * 100.0).round().clamp(0.0, 100.0) as u8)
    };

    let scores = LighthouseScores {
        performance: score("performance"),
        accessibility: score("accessibility"),
        best_practices: score("best-practices"),
        seo: score("seo"),
    };

    if scores == LighthouseScores::default() {
        None
    } else {
        Some(scores)
    }
}

/// Query PageSpeed Insights for the mobile strategy.
///
/// Returns `None` on transport failure, non-success status, an `error` body or
/// an unparseable payload. One attempt only.
pub async fn fetch_pagespeed(
    client: &Client,
    url: &str,
    config: &AuditConfig,
) -> (Option<PageSpeedData>, ApiCallRecord) {
    let endpoint = format!("{}/runPagespeed", config.endpoints.pagespeed.trim_end_matches('/'));

    let mut params: Vec<(&str, &str)> = vec![("url", url), ("strategy", "mobile")];
    params.extend(CATEGORIES.iter().map(|c| ("category", *c)));
    if let Some(key) = config.credentials.pagespeed_api_key.as_deref() {
        params.push(("key", key));
    }

    let builder = client
        .get(&endpoint)
        .query(&params)
        .timeout(config.network.pagespeed_timeout());

    debug!("Requesting PageSpeed Insights for {}", url);
    let (body, mut record) = send_for_text(
        client,
        "pagespeed",
        builder,
        Method::GET,
        &[],
        None,
        config.network.pagespeed_timeout_secs,
    )
    .await;
    let Some(body) = body else {
        return (None, record);
    };

    match parse_pagespeed(&body) {
        Ok(data) => (Some(data), record),
        Err(e) => {
            warn!("PageSpeed payload rejected (HTTP {:?}): {}", record.status, e);
            record.error = Some(e.to_string());
            (None, record)
        }
    }
}

/// Parse a PageSpeed body, rejecting API-reported errors
pub fn parse_pagespeed(body: &str) -> Result<PageSpeedData> {
    let raw: serde_json::Value = serde_json::from_str(body)?;
    let response: PageSpeedResponse = serde_json::from_value(raw.clone())
        .map_err(|e| AuditError::parse(format!("unexpected PageSpeed response shape: {}", e)))?;

    if let Some(error) = &response.error {
        return Err(AuditError::api(
            "PageSpeed Insights",
            format!(
                "{} {}",
                error.code.unwrap_or_default(),
                error.message.as_deref().unwrap_or("unknown")
            ),
        ));
    }

    Ok(PageSpeedData { response, raw })
}
