use serde::Deserialize;

/// tabsplit runtime configuration.
///
/// Loaded from environment variables only. Absent provider credentials do
/// not fail startup; they gate which clients get constructed, and the
/// affected endpoints answer with a "service not configured" envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP server bind address
    pub bind_address: String,
    /// HTTP server port
    pub port: u16,
    /// Log level
    pub log_level: String,
    /// Directory for rolling NDJSON log files
    pub log_dir: String,

    // Supabase (bill + icon storage)
    pub supabase_url: Option<String>,
    pub supabase_service_key: Option<String>,

    // OpenAI (receipt vision + icon generation)
    pub openai_api_key: Option<String>,
    pub vision_model: String,

    /// Wall-clock budget for one receipt scan, in milliseconds.
    pub scan_timeout_ms: u64,
    /// TTL of the scan dedupe cache.
    pub scan_cache_ttl_secs: u64,
    /// Max entries in the scan dedupe cache.
    pub scan_cache_capacity: u64,
    /// Max entries in the local icon cache.
    pub icon_cache_capacity: u64,

    // Per-IP rate limiting on mutating endpoints
    pub rate_limit_max: u32,
    pub rate_limit_window_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            log_dir: "logs".to_string(),
            supabase_url: None,
            supabase_service_key: None,
            openai_api_key: None,
            vision_model: "gpt-4o".to_string(),
            scan_timeout_ms: 15_000,
            scan_cache_ttl_secs: 86_400,
            scan_cache_capacity: 256,
            icon_cache_capacity: 1024,
            rate_limit_max: 60,
            rate_limit_window_secs: 60,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with sensible defaults.
    /// Malformed numeric values fall back to the default rather than failing.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            bind_address: env_str("TABSPLIT_BIND").unwrap_or(d.bind_address),
            port: env_parse("TABSPLIT_PORT").unwrap_or(d.port),
            log_level: env_str("TABSPLIT_LOG").unwrap_or(d.log_level),
            log_dir: env_str("TABSPLIT_LOG_DIR").unwrap_or(d.log_dir),
            supabase_url: env_str("SUPABASE_URL"),
            supabase_service_key: env_str("SUPABASE_SERVICE_KEY"),
            openai_api_key: env_str("OPENAI_API_KEY"),
            vision_model: env_str("TABSPLIT_VISION_MODEL").unwrap_or(d.vision_model),
            scan_timeout_ms: env_parse("TABSPLIT_SCAN_TIMEOUT_MS").unwrap_or(d.scan_timeout_ms),
            scan_cache_ttl_secs: env_parse("TABSPLIT_SCAN_CACHE_TTL_SECS")
                .unwrap_or(d.scan_cache_ttl_secs),
            scan_cache_capacity: env_parse("TABSPLIT_SCAN_CACHE_CAP")
                .unwrap_or(d.scan_cache_capacity),
            icon_cache_capacity: env_parse("TABSPLIT_ICON_CACHE_CAP")
                .unwrap_or(d.icon_cache_capacity),
            rate_limit_max: env_parse("TABSPLIT_RATE_LIMIT").unwrap_or(d.rate_limit_max),
            rate_limit_window_secs: env_parse("TABSPLIT_RATE_WINDOW_SECS")
                .unwrap_or(d.rate_limit_window_secs),
        }
    }

    /// Whether the hosted database is configured; otherwise the in-memory
    /// store is used.
    pub fn has_database(&self) -> bool {
        self.supabase_url.is_some() && self.supabase_service_key.is_some()
    }

    /// Whether the vision/icon provider is configured.
    pub fn has_vision(&self) -> bool {
        self.openai_api_key.is_some()
    }
}

fn env_str(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_unconfigured() {
        let config = AppConfig::default();
        assert!(!config.has_database());
        assert!(!config.has_vision());
        assert_eq!(config.port, 8080);
        assert_eq!(config.scan_timeout_ms, 15_000);
    }

    #[test]
    fn gating_requires_both_supabase_values() {
        let config = AppConfig {
            supabase_url: Some("https://x.supabase.co".into()),
            ..Default::default()
        };
        assert!(!config.has_database());

        let config = AppConfig {
            supabase_url: Some("https://x.supabase.co".into()),
            supabase_service_key: Some("key".into()),
            ..Default::default()
        };
        assert!(config.has_database());
    }
}
