//! Request/response trail for external calls
//!
//! Every outbound request leaves an [`ApiCallRecord`], whether it succeeded or
//! not. Each record carries a curl command that reproduces the request, with
//! credentials masked.

use serde::{Deserialize, Serialize};
use std::time::Instant;
use url::Url;

/// Query parameters whose values are never written to the trail
const SECRET_PARAMS: &[&str] = &["key", "api_key", "apikey", "token"];
const MASK: &str = "***";

/// One external call and its outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCallRecord {
    /// Logical source name (e.g. "pagespeed", "semrush:domain_ranks")
    pub source: String,
    pub method: String,
    /// Request URL with secrets masked
    pub url: String,
    /// Curl command reproducing the request
    pub curl: String,
    /// HTTP status, if a response arrived
    pub status: Option<u16>,
    pub duration_ms: u64,
    pub response_bytes: usize,
    pub error: Option<String>,
}

impl ApiCallRecord {
    /// Whether the call produced a 2xx response with no error
    pub fn succeeded(&self) -> bool {
        self.error.is_none() && matches!(self.status, Some(s) if (200..300).contains(&s))
    }
}

/// A call in flight; finish it with [`PendingCall::finish`] or [`PendingCall::fail`]
pub struct PendingCall {
    source: String,
    method: String,
    url: String,
    curl: String,
    started: Instant,
}

impl PendingCall {
    /// Start timing a request
    pub fn start(
        source: impl Into<String>,
        method: &str,
        url: &str,
        headers: &[(&str, &str)],
        body: Option<&str>,
    ) -> Self {
        Self {
            source: source.into(),
            method: method.to_string(),
            url: redact_url(url),
            curl: render_curl(method, url, headers, body),
            started: Instant::now(),
        }
    }

    /// Record a response. Non-2xx statuses are kept as-is; `error` stays empty
    /// unless the caller passes one.
    pub fn finish(
        self,
        status: u16,
        response_bytes: usize,
        error: Option<String>,
    ) -> ApiCallRecord {
        ApiCallRecord {
            duration_ms: elapsed_ms(self.started),
            source: self.source,
            method: self.method,
            url: self.url,
            curl: self.curl,
            status: Some(status),
            response_bytes,
            error,
        }
    }

    /// Record a transport failure
    pub fn fail(self, error: impl Into<String>) -> ApiCallRecord {
        ApiCallRecord {
            duration_ms: elapsed_ms(self.started),
            source: self.source,
            method: self.method,
            url: self.url,
            curl: self.curl,
            status: None,
            response_bytes: 0,
            error: Some(error.into()),
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Mask secret query parameter values in a URL
pub fn redact_url(raw: &str) -> String {
    let Ok(mut parsed) = Url::parse(raw) else {
        return raw.to_string();
    };

    if parsed.query().is_none() {
        return raw.to_string();
    }

    let pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| {
            if SECRET_PARAMS.contains(&k.to_ascii_lowercase().as_str()) {
                (k.into_owned(), MASK.to_string())
            } else {
                (k.into_owned(), v.into_owned())
            }
        })
        .collect();

    parsed.query_pairs_mut().clear().extend_pairs(pairs);
    parsed.to_string()
}

/// Render a request as a curl command line
pub fn render_curl(
    method: &str,
    url: &str,
    headers: &[(&str, &str)],
    body: Option<&str>,
) -> String {
    let mut parts = vec!["curl".to_string()];

    if method != "GET" {
        parts.push(format!("-X {}", method));
    }

    for (name, value) in headers {
        let value = if name.eq_ignore_ascii_case("authorization") {
            let scheme = value.split_whitespace().next().unwrap_or("");
            format!("{} {}", scheme, MASK)
        } else {
            (*value).to_string()
        };
        parts.push(format!("-H {}", shell_quote(&format!("{}: {}", name, value))));
    }

    if let Some(body) = body {
        parts.push(format!("--data {}", shell_quote(body)));
    }

    parts.push(shell_quote(&redact_url(url)));
    parts.join(" ")
}

fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}
