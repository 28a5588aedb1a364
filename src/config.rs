use std::path::PathBuf;
use std::time::Duration;

use crate::agent::GeminiEndpoint;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_TITLE_REFRESH_SECS: u64 = 120;

/// Runtime settings read from the environment (after `.env` is loaded).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// `None` keeps conversations in the in-process store.
    pub database_url: Option<String>,
    /// `None` makes every model call fail with a configuration error.
    pub gemini: Option<GeminiEndpoint>,
    pub catalog_path: Option<PathBuf>,
    pub title_refresh_interval: Duration,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let gemini = match (get("GEMINI_API_URL"), get("GEMINI_API_KEY")) {
            (Some(url), Some(api_key)) => Some(GeminiEndpoint { url, api_key }),
            _ => None,
        };

        Self {
            port: get("PORT").and_then(|p| p.parse().ok()).unwrap_or(DEFAULT_PORT),
            database_url: get("DATABASE_URL"),
            gemini,
            catalog_path: get("CATALOG_PATH").map(PathBuf::from),
            title_refresh_interval: Duration::from_secs(
                get("TITLE_REFRESH_SECS")
                    .and_then(|s| s.parse().ok())
                    .filter(|secs| *secs > 0)
                    .unwrap_or(DEFAULT_TITLE_REFRESH_SECS),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let cfg = config(&[]);
        assert_eq!(cfg.port, 8080);
        assert!(cfg.gemini.is_none());
        assert!(cfg.database_url.is_none());
        assert_eq!(cfg.title_refresh_interval, Duration::from_secs(120));
    }

    #[test]
    fn gemini_needs_both_url_and_key() {
        assert!(config(&[("GEMINI_API_URL", "https://example.test/gen")]).gemini.is_none());
        assert!(config(&[("GEMINI_API_URL", "https://x"), ("GEMINI_API_KEY", "  ")]).gemini.is_none());

        let cfg = config(&[("GEMINI_API_URL", "https://x"), ("GEMINI_API_KEY", "k")]);
        let endpoint = cfg.gemini.unwrap();
        assert_eq!(endpoint.url, "https://x");
        assert_eq!(endpoint.api_key, "k");
    }

    #[test]
    fn parses_numeric_settings_and_ignores_garbage() {
        let cfg = config(&[("PORT", "3000"), ("TITLE_REFRESH_SECS", "15")]);
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.title_refresh_interval, Duration::from_secs(15));

        let cfg = config(&[("PORT", "nope"), ("TITLE_REFRESH_SECS", "0")]);
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.title_refresh_interval, Duration::from_secs(120));
    }
}
