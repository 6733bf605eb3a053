//! # site_audit
//!
//! Evidence-based website diagnostics for direct-booking sites, combining:
//! - **Page fetch**: one GET of the target page, checked against a content checklist
//! - **Core Web Vitals**: PageSpeed Insights field data, falling back to lab data
//! - **SEO metrics**: DataForSEO and Semrush queried side by side
//! - **Weighted scoring**: six categories folded into one 0-100 score, with
//!   ranked recommendations and a revenue-loss estimate
//!
//! ## Quick Start
//!
//! ```no_run
//! use site_audit::{run_audit, AuditConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = AuditConfig::default();
//! let result = run_audit("https://example.com", None, &config, None).await?;
//!
//! println!("{}: {}/100", result.domain, result.overall_score);
//! for rec in &result.recommendations {
//!     println!("[{}] {}", rec.status, rec.title);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - Any external source may be missing; the run still completes with
//!   checklist-only fallbacks and advisory notes
//! - Concurrent fetching of performance and SEO data
//! - Request trail with a redacted curl line for every external call
//! - CLI tool with multiple output formats (JSON, Markdown)

mod analyzers;
mod audit;
mod config;
mod content;
mod error;
mod fetch;
mod recommendations;
mod revenue;
mod scoring;
pub mod sources;
mod trail;
mod types;

// Re-export public API
pub use analyzers::{
    BookingFlowAnalysis, BookingFlowAnalyzer, HeuristicBookingFlowAnalyzer,
    HeuristicTrustSignalAnalyzer, TrustSignalAnalysis, TrustSignalAnalyzer,
};
pub use audit::{resolve_target, run_audit, Auditor, ProgressFn, ProgressTracker};
pub use config::{
    AuditConfig, AuditConfigBuilder, Endpoints, NetworkConfig, ProviderCredentials, SeoOptions,
    USER_AGENT,
};
pub use content::{analyze_content, ContentAnalysis, ContentFacts};
pub use error::{AuditError, Result};
pub use fetch::{build_client, fetch_page};
pub use recommendations::{compile_recommendations, RecommendationInputs};
pub use revenue::estimate_revenue_loss;
pub use scoring::{
    calculate_category_scores, calculate_overall_score, calculate_projected_score, ScoreInputs,
};
pub use sources::select_primary_metrics;
pub use trail::{redact_url, render_curl, ApiCallRecord};
pub use types::{
    AuditMetadata, AuditResult, CategoryScore, CheckStatus, CoreWebVitals, HtmlFetchSnapshot,
    Impact, LighthouseScores, MetricSource, MetricValue, Rating, RawApiData, RawPageFetch,
    Recommendation, SeoMetrics, SeoProviderSnapshots, SeoSource,
};
