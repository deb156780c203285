use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub api_keys: Option<ApiKeysConfig>,
    pub model: Option<ModelConfig>,
    pub server: Option<ServerConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiKeysConfig {
    pub gemini_api_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelConfig {
    pub name: Option<String>,
    pub api_base: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub allowed_origins: Option<Vec<String>>,
    pub max_upload_mb: Option<u32>,
    pub upload_dir: Option<String>,
}

/// Platform config directory path: `<config_dir>/legal-lens/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("legal-lens").join("config.toml"))
}

/// Load config by cascading CWD `.legal-lens.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".legal-lens.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparseable config file");
            None
        }
    }
}

/// Take a field from `overlay` if set, else from `base`.
fn pick<S, T>(overlay: Option<&S>, base: Option<&S>, field: impl Fn(&S) -> Option<T>) -> Option<T> {
    overlay.and_then(&field).or_else(|| base.and_then(&field))
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let (bk, ok) = (base.api_keys.as_ref(), overlay.api_keys.as_ref());
    let (bm, om) = (base.model.as_ref(), overlay.model.as_ref());
    let (bs, os) = (base.server.as_ref(), overlay.server.as_ref());

    ConfigFile {
        api_keys: Some(ApiKeysConfig {
            gemini_api_key: pick(ok, bk, |a| a.gemini_api_key.clone()),
        }),
        model: Some(ModelConfig {
            name: pick(om, bm, |m| m.name.clone()),
            api_base: pick(om, bm, |m| m.api_base.clone()),
            timeout_secs: pick(om, bm, |m| m.timeout_secs),
            max_retries: pick(om, bm, |m| m.max_retries),
        }),
        server: Some(ServerConfig {
            host: pick(os, bs, |s| s.host.clone()),
            port: pick(os, bs, |s| s.port),
            allowed_origins: pick(os, bs, |s| s.allowed_origins.clone()),
            max_upload_mb: pick(os, bs, |s| s.max_upload_mb),
            upload_dir: pick(os, bs, |s| s.upload_dir.clone()),
        }),
    }
}
