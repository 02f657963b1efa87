use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Attesta";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Timeout applied to every outbound HTTP call (document fetch, extraction
/// provider, generation/embedding provider).
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Model for document analysis. Temperature 0 keeps verdict lines stable.
pub const ANALYSIS_MODEL: &str = "gpt-4o-mini";
/// Vision model for OCR of rasterized pages.
pub const OCR_MODEL: &str = "gpt-4o-mini";
/// Model backing the chat assistant.
pub const CHAT_MODEL: &str = "gpt-3.5-turbo";
/// Embedding model for retrieval over extracted text.
pub const EMBEDDING_MODEL: &str = "text-embedding-ada-002";

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_UNSTRUCTURED_API_URL: &str = "https://api.unstructured.io";
const DEFAULT_SERVICE_API_KEY: &str = "change_this_to_secure_key";
const DEFAULT_PORT: u16 = 8000;

/// Runtime configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Credential for the generation/embedding provider. When absent the
    /// service still runs: extraction works, analysis and chat degrade.
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    /// Credential for the hosted extraction provider. When absent only the
    /// local PDF strategy is registered.
    pub unstructured_api_key: Option<String>,
    pub unstructured_api_url: String,
    /// Key callers must present in the `X-API-Key` header.
    pub service_api_key: String,
    pub bind_addr: SocketAddr,
    /// Directory holding the chat pattern guide and guidelines files.
    pub data_dir: PathBuf,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            openai_api_key: env_opt("OPENAI_API_KEY"),
            openai_base_url: env_or("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL),
            unstructured_api_key: env_opt("UNSTRUCTURED_API_KEY"),
            unstructured_api_url: env_or("UNSTRUCTURED_API_URL", DEFAULT_UNSTRUCTURED_API_URL),
            service_api_key: env_or("SERVICE_API_KEY", DEFAULT_SERVICE_API_KEY),
            bind_addr: parse_bind_addr(env_opt("BIND_ADDR")),
            data_dir: PathBuf::from(env_or("DATA_DIR", "data")),
        }
    }

    /// True while the service still runs on the shipped placeholder key.
    pub fn uses_placeholder_service_key(&self) -> bool {
        self.service_api_key == DEFAULT_SERVICE_API_KEY
    }
}

/// Default tracing filter when RUST_LOG is not set.
pub fn default_log_filter() -> String {
    format!("{}=debug,info", env!("CARGO_PKG_NAME"))
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_or(name: &str, default: &str) -> String {
    env_opt(name).unwrap_or_else(|| default.to_string())
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT))
}

fn parse_bind_addr(raw: Option<String>) -> SocketAddr {
    match raw {
        Some(value) => value.parse().unwrap_or_else(|_| {
            tracing::warn!(value = %value, "invalid BIND_ADDR, using default");
            default_bind_addr()
        }),
        None => default_bind_addr(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.3.0");
    }

    #[test]
    fn bind_addr_defaults_when_unset() {
        assert_eq!(parse_bind_addr(None), default_bind_addr());
    }

    #[test]
    fn bind_addr_parses_explicit_value() {
        let addr = parse_bind_addr(Some("127.0.0.1:9100".to_string()));
        assert_eq!(addr.port(), 9100);
        assert!(addr.ip().is_loopback());
    }

    #[test]
    fn bind_addr_falls_back_on_garbage() {
        assert_eq!(
            parse_bind_addr(Some("not-an-address".to_string())),
            default_bind_addr()
        );
    }

    #[test]
    fn placeholder_service_key_is_flagged() {
        let mut settings = Settings {
            openai_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            unstructured_api_key: None,
            unstructured_api_url: DEFAULT_UNSTRUCTURED_API_URL.to_string(),
            service_api_key: DEFAULT_SERVICE_API_KEY.to_string(),
            bind_addr: default_bind_addr(),
            data_dir: PathBuf::from("data"),
        };
        assert!(settings.uses_placeholder_service_key());

        settings.service_api_key = "a-real-key".to_string();
        assert!(!settings.uses_placeholder_service_key());
    }

    #[test]
    fn log_filter_scopes_crate_to_debug() {
        assert_eq!(default_log_filter(), "attesta=debug,info");
    }
}
