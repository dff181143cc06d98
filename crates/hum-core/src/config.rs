//! Analysis service configuration.
//!
//! The base URL is the only externally configurable parameter: the
//! `HUM_API_URL` environment variable overrides a hard-coded development
//! default. The CLI loads `.env` files via dotenvy before reading it.

use anyhow::Result;

/// Environment variable overriding the analysis service base URL.
pub const API_URL_ENV_VAR: &str = "HUM_API_URL";

/// Development default; the reference analysis backend binds here.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// Path of the upload endpoint on the analysis service.
const ANALYZE_PATH: &str = "/analyze-audio";

/// Where to find the remote analysis service.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub base_url: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
        }
    }
}

impl AnalysisConfig {
    /// Read the configuration from the environment, falling back to the
    /// development default.
    pub fn from_env() -> Self {
        let base_url = std::env::var(API_URL_ENV_VAR)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        Self { base_url }
    }

    /// Full URL of the analyze endpoint.
    pub fn analyze_url(&self) -> Result<String> {
        let base = validate_base_url(&self.base_url)?;
        Ok(format!("{base}{ANALYZE_PATH}"))
    }

    /// URL of the service root, used as a readiness probe.
    pub fn ready_url(&self) -> Result<String> {
        let base = validate_base_url(&self.base_url)?;
        Ok(format!("{base}/"))
    }
}

/// Validate the base URL shape and strip any trailing slash.
fn validate_base_url(url: &str) -> Result<&str> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        anyhow::bail!(
            "Analysis service URL not configured.\n\
             Set it with the {API_URL_ENV_VAR} environment variable."
        );
    }

    if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
        anyhow::bail!(
            "Invalid analysis service URL: must start with http:// or https://\n\
             Got: {trimmed}\n\
             Example: {API_URL_ENV_VAR}=http://127.0.0.1:8000"
        );
    }

    let after_scheme = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"))
        .unwrap_or("");
    if after_scheme.is_empty() || after_scheme.starts_with('/') {
        anyhow::bail!(
            "Invalid analysis service URL: missing host\n\
             Got: {trimmed}\n\
             Example: {API_URL_ENV_VAR}=http://127.0.0.1:8000"
        );
    }

    Ok(trimmed.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_url_joins_endpoint() {
        let config = AnalysisConfig {
            base_url: "http://localhost:8000".to_string(),
        };
        assert_eq!(
            config.analyze_url().unwrap(),
            "http://localhost:8000/analyze-audio"
        );
    }

    #[test]
    fn trailing_slash_is_normalized() {
        let config = AnalysisConfig {
            base_url: "https://pitch.example.com/".to_string(),
        };
        assert_eq!(
            config.analyze_url().unwrap(),
            "https://pitch.example.com/analyze-audio"
        );
    }

    #[test]
    fn scheme_is_required() {
        let config = AnalysisConfig {
            base_url: "localhost:8000".to_string(),
        };
        assert!(config.analyze_url().is_err());
    }

    #[test]
    fn host_is_required() {
        let config = AnalysisConfig {
            base_url: "http:///analyze".to_string(),
        };
        assert!(config.analyze_url().is_err());
    }
}
