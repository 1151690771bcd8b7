use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use vedanga::AnalyzerConfig;

/// Relative locations tried when no explicit config path is given.
pub const DEFAULT_CONFIG_PATHS: [&str; 2] = ["configs/vedanga.toml", "../../configs/vedanga.toml"];

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoggingConfig {
    /// `env_logger` filter, overridden by `RUST_LOG`.
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RootConfig {
    #[serde(default)]
    pub analyzer: AnalyzerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

pub fn parse_config(text: &str) -> anyhow::Result<RootConfig> {
    let config: RootConfig =
        toml::from_str(text).map_err(|e| anyhow::anyhow!("Failed to parse vedanga config: {e}"))?;
    config
        .analyzer
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid [analyzer] config: {e}"))?;
    Ok(config)
}

pub fn load_config(path: &Path) -> anyhow::Result<RootConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Could not read config {}", path.display()))?;
    parse_config(&text).with_context(|| format!("in {}", path.display()))
}

/// Try the usual relative paths; fall back to defaults when none exist.
pub fn load_default_config() -> anyhow::Result<RootConfig> {
    for p in &DEFAULT_CONFIG_PATHS {
        let path = Path::new(p);
        if path.exists() {
            return load_config(path);
        }
    }
    Ok(RootConfig::default())
}
