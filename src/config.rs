use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const DEFAULT_CONFIG_PATH: &str = "/etc/tokview-env";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_LIBRARY_ROOT: &str = "./library";
pub const DEFAULT_PUBLIC_BASE_URL: &str = "/library";
pub const DEFAULT_UPSTREAM_API_URL: &str = "https://www.tikwm.com";

/// Raw values read from the env file; every key is optional.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub library_root: Option<PathBuf>,
    pub public_base_url: Option<String>,
    pub upstream_api_url: Option<String>,
    pub port: Option<u16>,
    pub host: Option<String>,
}

/// Fully resolved runtime settings with defaults applied.
#[derive(Debug, Clone)]
pub struct Runtime {
    pub library_root: PathBuf,
    pub public_base_url: String,
    pub upstream_api_url: String,
    pub port: u16,
    pub host: String,
}

pub fn read_env_config(path: &Path) -> Result<Option<EnvConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))?;
    let mut cfg = EnvConfig::default();
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if let Some((key, value_raw)) = trimmed.split_once('=') {
            let value = value_raw.trim().trim_matches('"');
            match key {
                "LIBRARY_ROOT" => cfg.library_root = Some(PathBuf::from(value)),
                "PUBLIC_BASE_URL" => {
                    if !value.is_empty() {
                        cfg.public_base_url = Some(value.to_string());
                    }
                }
                "UPSTREAM_API_URL" => {
                    if !value.is_empty() {
                        cfg.upstream_api_url = Some(value.to_string());
                    }
                }
                "PORT" => {
                    let port: u16 = value
                        .parse()
                        .with_context(|| format!("Parsing PORT from {}", path.display()))?;
                    cfg.port = Some(port);
                }
                "HOST" => {
                    if !value.is_empty() {
                        cfg.host = Some(value.to_string());
                    }
                }
                _ => {}
            }
        }
    }
    Ok(Some(cfg))
}

pub fn load_runtime() -> Result<Runtime> {
    load_runtime_from(Path::new(DEFAULT_CONFIG_PATH))
}

/// Resolves runtime settings from an env file. A missing file is not an
/// error; every setting falls back to its default.
pub fn load_runtime_from(path: impl AsRef<Path>) -> Result<Runtime> {
    let cfg = read_env_config(path.as_ref())?.unwrap_or_default();
    Ok(Runtime {
        library_root: cfg
            .library_root
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LIBRARY_ROOT)),
        public_base_url: cfg
            .public_base_url
            .unwrap_or_else(|| DEFAULT_PUBLIC_BASE_URL.to_string()),
        upstream_api_url: cfg
            .upstream_api_url
            .unwrap_or_else(|| DEFAULT_UPSTREAM_API_URL.to_string()),
        port: cfg.port.unwrap_or(DEFAULT_PORT),
        host: cfg.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
    })
}
