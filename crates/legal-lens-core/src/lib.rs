use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub mod analyzer;
pub mod backend;
pub mod clauses;
pub mod config_file;
pub mod extract;
pub mod llm;
pub mod prompts;

// Re-export for convenience
pub use analyzer::{Analyzer, CLAUSES_FAILED, SUMMARY_FAILED, clause_fallback_json};
pub use backend::{BackendError, PdfBackend};
pub use clauses::{ClauseCategories, ClauseCategory, ClauseParseError, parse_clauses, strip_fences};
pub use config_file::ConfigFile;
pub use extract::{extract_text, extract_text_blocking, is_unreadable};
pub use llm::{GeminiClient, GenerativeModel, LlmError, RetryPolicy};

/// Environment variable holding the Gemini API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// The response payload for one analyzed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub summary: String,
    pub clauses: ClauseCategories,
}

/// Resolved runtime configuration.
#[derive(Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub max_upload_mb: u32,
    /// Parent directory for per-request temp dirs. `None` uses the system temp dir.
    pub upload_dir: Option<PathBuf>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("allowed_origins", &self.allowed_origins)
            .field("max_upload_mb", &self.max_upload_mb)
            .field("upload_dir", &self.upload_dir)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: llm::gemini::DEFAULT_MODEL.to_string(),
            api_base: llm::gemini::DEFAULT_API_BASE.to_string(),
            timeout_secs: 30,
            max_retries: 2,
            host: "0.0.0.0".to_string(),
            port: 8000,
            allowed_origins: vec!["http://localhost:3000".to_string()],
            max_upload_mb: 25,
            upload_dir: None,
        }
    }
}

impl Config {
    /// Defaults overlaid with values from a config file.
    pub fn from_file(file: &ConfigFile) -> Self {
        let mut config = Self::default();
        if let Some(keys) = &file.api_keys {
            if keys.gemini_api_key.is_some() {
                config.api_key = keys.gemini_api_key.clone();
            }
        }
        if let Some(model) = &file.model {
            if let Some(name) = &model.name {
                config.model = name.clone();
            }
            if let Some(base) = &model.api_base {
                config.api_base = base.clone();
            }
            if let Some(t) = model.timeout_secs {
                config.timeout_secs = t;
            }
            if let Some(r) = model.max_retries {
                config.max_retries = r;
            }
        }
        if let Some(server) = &file.server {
            if let Some(host) = &server.host {
                config.host = host.clone();
            }
            if let Some(port) = server.port {
                config.port = port;
            }
            if let Some(origins) = &server.allowed_origins {
                config.allowed_origins = origins.clone();
            }
            if let Some(mb) = server.max_upload_mb {
                config.max_upload_mb = mb;
            }
            if let Some(dir) = &server.upload_dir {
                config.upload_dir = Some(PathBuf::from(dir));
            }
        }
        config
    }

    /// Apply environment overrides, reading variables through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = lookup(API_KEY_ENV) {
            self.api_key = Some(key);
        }
        if let Some(model) = lookup("LEGAL_LENS_MODEL") {
            self.model = model;
        }
        if let Some(host) = lookup("LEGAL_LENS_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("LEGAL_LENS_PORT") {
            match port.trim().parse() {
                Ok(p) => self.port = p,
                Err(_) => tracing::warn!(value = %port, "ignoring invalid LEGAL_LENS_PORT"),
            }
        }
        if let Some(origins) = lookup("LEGAL_LENS_ALLOWED_ORIGINS") {
            self.allowed_origins = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }
    }

    /// Load config files and the process environment.
    pub fn load() -> Self {
        let mut config = Self::from_file(&config_file::load_config());
        config.apply_env(|name| std::env::var(name).ok());
        config
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(Duration::from_secs(self.timeout_secs), self.max_retries)
    }

    pub fn max_upload_bytes(&self) -> usize {
        (self.max_upload_mb as usize).saturating_mul(1024 * 1024)
    }

    /// Build the shared Gemini client.
    ///
    /// A missing API key is logged as an error but not fatal: the client is
    /// still returned and every call through it fails, so requests degrade to
    /// the summary/clause fallbacks.
    pub fn build_model(&self) -> Arc<dyn GenerativeModel> {
        if self.api_key.is_none() {
            tracing::error!("{} not found in environment variables", API_KEY_ENV);
        }
        Arc::new(
            GeminiClient::new(self.api_key.clone())
                .with_model(&self.model)
                .with_api_base(&self.api_base),
        )
    }

    pub fn build_analyzer(&self) -> Analyzer {
        Analyzer::new(self.build_model(), self.retry_policy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.model, "gemini-1.5-flash");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.allowed_origins, vec!["http://localhost:3000"]);
        assert_eq!(config.max_upload_bytes(), 25 * 1024 * 1024);
        assert_eq!(
            config.retry_policy(),
            RetryPolicy::new(Duration::from_secs(30), 2)
        );
    }

    #[test]
    fn file_values_override_defaults() {
        let file: ConfigFile = toml::from_str(
            "[model]\nname = \"gemini-1.5-pro\"\nmax_retries = 0\n\n[server]\nport = 9001\nupload_dir = \"/tmp/uploads\"\n",
        )
        .unwrap();
        let config = Config::from_file(&file);
        assert_eq!(config.model, "gemini-1.5-pro");
        assert_eq!(config.max_retries, 0);
        assert_eq!(config.port, 9001);
        assert_eq!(config.upload_dir, Some(PathBuf::from("/tmp/uploads")));
        assert_eq!(config.host, "0.0.0.0");
    }

    #[test]
    fn env_overrides_file() {
        let mut config = Config {
            port: 9001,
            ..Config::default()
        };
        config.apply_env(env(&[
            ("GEMINI_API_KEY", "abc"),
            ("LEGAL_LENS_PORT", "7000"),
            (
                "LEGAL_LENS_ALLOWED_ORIGINS",
                "https://a.example, https://b.example,",
            ),
        ]));
        assert_eq!(config.api_key.as_deref(), Some("abc"));
        assert_eq!(config.port, 7000);
        assert_eq!(
            config.allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn blank_or_invalid_env_is_ignored() {
        let mut config = Config::default();
        config.apply_env(env(&[("GEMINI_API_KEY", "  "), ("LEGAL_LENS_PORT", "http")]));
        assert!(config.api_key.is_none());
        assert_eq!(config.port, 8000);
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = Config {
            api_key: Some("secret".into()),
            ..Config::default()
        };
        assert!(!format!("{:?}", config).contains("secret"));
    }

    #[test]
    fn huge_upload_limit_saturates() {
        let config = Config {
            max_upload_mb: u32::MAX,
            ..Config::default()
        };
        let expected = (u32::MAX as usize).checked_mul(1024 * 1024).unwrap_or(usize::MAX);
        assert_eq!(config.max_upload_bytes(), expected);
    }

    #[test]
    fn missing_key_still_builds_model() {
        let model = Config::default().build_model();
        assert!(!model.is_configured());
        assert_eq!(model.name(), "gemini-1.5-flash");
    }

    #[test]
    fn analysis_result_json_shape() {
        let result = AnalysisResult {
            summary: "This contract obligates...".into(),
            clauses: ClauseCategories {
                liability: vec!["X shall indemnify Y".into()],
                ..Default::default()
            },
        };
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            serde_json::json!({
                "summary": "This contract obligates...",
                "clauses": {
                    "liability": ["X shall indemnify Y"],
                    "termination": [],
                    "confidentiality": []
                }
            })
        );
    }
}
