//! Direct fetch of the audited page

use crate::config::NetworkConfig;
use crate::error::{AuditError, Result};
use crate::trail::{ApiCallRecord, PendingCall};
use crate::types::RawPageFetch;
use reqwest::Client;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, warn};

/// Build the HTTP client shared by every source in a run.
///
/// Timeouts are applied per request since each source has its own bound.
pub fn build_client(config: &NetworkConfig) -> Result<Client> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| AuditError::network(format!("Failed to build HTTP client: {}", e)))
}

/// Fetch the target page once.
///
/// Never fails: transport errors come back as a `RawPageFetch` with status 0,
/// an empty body and `error` populated.
pub async fn fetch_page(
    client: &Client,
    url: &str,
    config: &NetworkConfig,
) -> (RawPageFetch, ApiCallRecord) {
    debug!("Fetching page {}", url);

    let call = PendingCall::start(
        "html",
        "GET",
        url,
        &[("User-Agent", config.user_agent.as_str())],
        None,
    );
    let started = Instant::now();

    let response = match client.get(url).timeout(config.page_timeout()).send().await {
        Ok(response) => response,
        Err(e) => {
            let message = describe_transport_error(&e, config.page_timeout_secs);
            warn!("Page fetch failed for {}: {}", url, message);
            let elapsed = elapsed_ms(started);
            return (
                RawPageFetch::failed(url, elapsed, message.clone()),
                call.fail(message),
            );
        }
    };

    let status_code = response.status().as_u16();
    let final_url = response.url().to_string();
    let headers: BTreeMap<String, String> = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
        })
        .collect();

    match response.text().await {
        Ok(html) => {
            let load_time_ms = elapsed_ms(started);
            let content_length = html.len();
            debug!(
                "Fetched {} -> {} ({} bytes in {}ms)",
                url, status_code, content_length, load_time_ms
            );
            let record = call.finish(status_code, content_length, None);
            (
                RawPageFetch {
                    url: url.to_string(),
                    final_url,
                    html,
                    status_code,
                    headers,
                    content_length,
                    load_time_ms,
                    error: None,
                },
                record,
            )
        }
        Err(e) => {
            let message = format!("Failed to read response body: {}", e);
            warn!("Page fetch failed for {}: {}", url, message);
            let elapsed = elapsed_ms(started);
            (
                RawPageFetch::failed(url, elapsed, message.clone()),
                call.finish(status_code, 0, Some(message)),
            )
        }
    }
}

/// Human-readable transport failure, distinguishing timeouts
pub(crate) fn describe_transport_error(e: &reqwest::Error, timeout_secs: u64) -> String {
    if e.is_timeout() {
        format!("Request timed out after {}s", timeout_secs)
    } else if e.is_connect() {
        format!("Connection failed: {}", e)
    } else {
        format!("Request failed: {}", e)
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_page_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("<html><title>Hi</title></html>")
            .create_async()
            .await;

        let config = NetworkConfig::default();
        let client = build_client(&config).unwrap();
        let (fetch, record) = fetch_page(&client, &format!("{}/", server.url()), &config).await;

        mock.assert_async().await;
        assert_eq!(fetch.status_code, 200);
        assert!(fetch.error.is_none());
        assert_eq!(fetch.content_length, fetch.html.len());
        assert_eq!(fetch.headers.get("content-type").map(String::as_str), Some("text/html"));
        assert!(record.succeeded());
    }

    #[tokio::test]
    async fn test_fetch_page_unreachable_never_fails() {
        let config = NetworkConfig {
            page_timeout_secs: 2,
            ..NetworkConfig::default()
        };
        let client = build_client(&config).unwrap();
        let (fetch, record) = fetch_page(&client, "http://127.0.0.1:1/", &config).await;

        assert_eq!(fetch.status_code, 0);
        assert!(fetch.html.is_empty());
        assert!(fetch.error.is_some());
        assert!(!fetch.is_ok());
        assert_eq!(record.status, None);
    }

    #[tokio::test]
    async fn test_fetch_page_keeps_non_200_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/missing")
            .with_status(404)
            .with_body("not here")
            .create_async()
            .await;

        let config = NetworkConfig::default();
        let client = build_client(&config).unwrap();
        let (fetch, _) = fetch_page(&client, &format!("{}/missing", server.url()), &config).await;

        assert_eq!(fetch.status_code, 404);
        assert_eq!(fetch.html, "not here");
        assert!(fetch.error.is_none());
        assert!(!fetch.is_ok());
    }
}
