//! Configuration for data sources, credentials and network behavior

use crate::error::{AuditError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Identifying user agent sent with every outbound request
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Main configuration for an audit run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Network configuration
    pub network: NetworkConfig,
    /// API credentials for the external providers
    pub credentials: ProviderCredentials,
    /// Base URLs of the external providers
    pub endpoints: Endpoints,
    /// Query options for the SEO providers
    pub seo: SeoOptions,
}

/// Network configuration for outbound calls.
///
/// Every call gets exactly one attempt bounded by its timeout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Timeout for the direct page fetch in seconds
    pub page_timeout_secs: u64,
    /// Timeout for the PageSpeed Insights call in seconds
    pub pagespeed_timeout_secs: u64,
    /// Timeout for each SEO provider request in seconds
    pub seo_timeout_secs: u64,
    /// User agent for all requests
    pub user_agent: String,
}

/// Credentials for the external providers.
///
/// A missing credential disables that provider for the run; it is not an error.
/// Secrets are read from config files but never written back out.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderCredentials {
    /// PageSpeed Insights API key (optional, the API works unauthenticated at low volume)
    #[serde(skip_serializing)]
    pub pagespeed_api_key: Option<String>,
    /// DataForSEO account login
    pub dataforseo_login: Option<String>,
    /// DataForSEO account password
    #[serde(skip_serializing)]
    pub dataforseo_password: Option<String>,
    /// Semrush API key
    #[serde(skip_serializing)]
    pub semrush_api_key: Option<String>,
}

/// Base URLs of the external providers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    /// PageSpeed Insights v5 base
    pub pagespeed: String,
    /// DataForSEO v3 base
    pub dataforseo: String,
    /// Semrush analytics base (domain reports)
    pub semrush: String,
    /// Semrush backlinks analytics base
    pub semrush_backlinks: String,
}

/// Query options shared by the SEO providers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeoOptions {
    /// DataForSEO location code (2840 = United States)
    pub location_code: u32,
    /// DataForSEO language code
    pub language_code: String,
    /// Semrush regional database
    pub semrush_database: String,
    /// Rows requested from the Semrush list endpoints
    pub display_limit: u32,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            page_timeout_secs: 15,
            pagespeed_timeout_secs: 60,
            seo_timeout_secs: 30,
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl NetworkConfig {
    /// Get page fetch timeout as Duration
    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    /// Get PageSpeed timeout as Duration
    pub fn pagespeed_timeout(&self) -> Duration {
        Duration::from_secs(self.pagespeed_timeout_secs)
    }

    /// Get SEO provider timeout as Duration
    pub fn seo_timeout(&self) -> Duration {
        Duration::from_secs(self.seo_timeout_secs)
    }
}

impl Default for ProviderCredentials {
    fn default() -> Self {
        Self {
            pagespeed_api_key: env_non_empty("PAGESPEED_API_KEY"),
            dataforseo_login: env_non_empty("DATAFORSEO_LOGIN"),
            dataforseo_password: env_non_empty("DATAFORSEO_PASSWORD"),
            semrush_api_key: env_non_empty("SEMRUSH_API_KEY"),
        }
    }
}

impl ProviderCredentials {
    /// Credentials with every provider disabled
    pub fn none() -> Self {
        Self {
            pagespeed_api_key: None,
            dataforseo_login: None,
            dataforseo_password: None,
            semrush_api_key: None,
        }
    }

    /// DataForSEO login/password pair, if both are configured
    pub fn dataforseo(&self) -> Option<(&str, &str)> {
        match (&self.dataforseo_login, &self.dataforseo_password) {
            (Some(login), Some(password)) => Some((login.as_str(), password.as_str())),
            _ => None,
        }
    }
}

// Keep secrets out of debug logs.
impl std::fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |v: &Option<String>| v.as_ref().map(|_| "***");
        f.debug_struct("ProviderCredentials")
            .field("pagespeed_api_key", &mask(&self.pagespeed_api_key))
            .field("dataforseo_login", &self.dataforseo_login)
            .field("dataforseo_password", &mask(&self.dataforseo_password))
            .field("semrush_api_key", &mask(&self.semrush_api_key))
            .finish()
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            pagespeed: "https://www.googleapis.com/pagespeedonline/v5".to_string(),
            dataforseo: "https://api.dataforseo.com/v3".to_string(),
            semrush: "https://api.semrush.com".to_string(),
            semrush_backlinks: "https://api.semrush.com/analytics/v1".to_string(),
        }
    }
}

impl Endpoints {
    /// Point every provider at one base URL (used with local mock servers)
    pub fn all_at(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            pagespeed: base.to_string(),
            dataforseo: base.to_string(),
            semrush: base.to_string(),
            semrush_backlinks: format!("{}/analytics/v1", base),
        }
    }
}

impl Default for SeoOptions {
    fn default() -> Self {
        Self {
            location_code: 2840,
            language_code: "en".to_string(),
            semrush_database: "us".to_string(),
            display_limit: 10,
        }
    }
}

impl AuditConfig {
    /// Create a new builder for AuditConfig
    pub fn builder() -> AuditConfigBuilder {
        AuditConfigBuilder::default()
    }

    /// Load configuration from a TOML file; unspecified fields keep their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AuditConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make every call fail immediately
    pub fn validate(&self) -> Result<()> {
        let n = &self.network;
        if n.page_timeout_secs == 0 || n.pagespeed_timeout_secs == 0 || n.seo_timeout_secs == 0 {
            return Err(AuditError::config("timeouts must be at least one second"));
        }
        if n.user_agent.trim().is_empty() {
            return Err(AuditError::config("user_agent must not be empty"));
        }
        Ok(())
    }
}

/// Builder for AuditConfig
#[derive(Default)]
pub struct AuditConfigBuilder {
    network: Option<NetworkConfig>,
    credentials: Option<ProviderCredentials>,
    endpoints: Option<Endpoints>,
    seo: Option<SeoOptions>,
}

impl AuditConfigBuilder {
    pub fn network(mut self, network: NetworkConfig) -> Self {
        self.network = Some(network);
        self
    }

    pub fn credentials(mut self, credentials: ProviderCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = Some(endpoints);
        self
    }

    pub fn seo(mut self, seo: SeoOptions) -> Self {
        self.seo = Some(seo);
        self
    }

    pub fn build(self) -> AuditConfig {
        AuditConfig {
            network: self.network.unwrap_or_default(),
            credentials: self.credentials.unwrap_or_default(),
            endpoints: self.endpoints.unwrap_or_default(),
            seo: self.seo.unwrap_or_default(),
        }
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_partial_toml_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[network]
pagespeed_timeout_secs = 45

[credentials]
semrush_api_key = "abc"
"#
        )
        .unwrap();

        let config = AuditConfig::load(file.path()).unwrap();
        assert_eq!(config.network.pagespeed_timeout_secs, 45);
        assert_eq!(config.network.page_timeout_secs, 15);
        assert_eq!(config.credentials.semrush_api_key.as_deref(), Some("abc"));
        assert_eq!(config.seo.location_code, 2840);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = AuditConfig::default();
        config.network.seo_timeout_secs = 0;
        assert!(matches!(config.validate(), Err(AuditError::ConfigError(_))));
    }

    #[test]
    fn test_debug_masks_secrets() {
        let credentials = ProviderCredentials {
            semrush_api_key: Some("topsecret".to_string()),
            ..ProviderCredentials::none()
        };
        let rendered = format!("{:?}", credentials);
        assert!(!rendered.contains("topsecret"));
    }

    #[test]
    fn test_serialized_config_omits_secrets() {
        let config = AuditConfig::builder()
            .credentials(ProviderCredentials {
                pagespeed_api_key: Some("psi-topsecret".to_string()),
                dataforseo_login: Some("ops@lakeside.com".to_string()),
                dataforseo_password: Some("dfs-topsecret".to_string()),
                semrush_api_key: Some("sem-topsecret".to_string()),
            })
            .build();

        let rendered = serde_json::to_string(&config).unwrap();
        assert!(!rendered.contains("topsecret"), "{}", rendered);
        assert!(rendered.contains("ops@lakeside.com"));
    }

    #[test]
    fn test_dataforseo_requires_both_parts() {
        let mut credentials = ProviderCredentials::none();
        credentials.dataforseo_login = Some("me".to_string());
        assert!(credentials.dataforseo().is_none());
        credentials.dataforseo_password = Some("pw".to_string());
        assert_eq!(credentials.dataforseo(), Some(("me", "pw")));
    }
}
