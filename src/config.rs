use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub models: ModelsConfig,
    #[serde(default)]
    pub traversal: TraversalConfig,
    #[serde(default)]
    pub responses: ResponsesConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelsConfig {
    /// Directory scanned recursively for `*.archimate` files.
    pub root: PathBuf,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TraversalConfig {
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

fn default_max_depth() -> usize {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResponsesConfig {
    #[serde(default = "default_auto_correct")]
    pub auto_correct: bool,
    #[serde(default = "default_count_only_max_lines")]
    pub count_only_max_lines: usize,
}

impl Default for ResponsesConfig {
    fn default() -> Self {
        Self {
            auto_correct: default_auto_correct(),
            count_only_max_lines: default_count_only_max_lines(),
        }
    }
}

fn default_auto_correct() -> bool {
    true
}
fn default_count_only_max_lines() -> usize {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7341".to_string()
}

impl Config {
    /// A config with defaults everywhere except the models root.
    pub fn with_models_root(root: impl Into<PathBuf>) -> Self {
        Self {
            models: ModelsConfig {
                root: root.into(),
                exclude_globs: Vec::new(),
                follow_symlinks: false,
            },
            traversal: TraversalConfig::default(),
            responses: ResponsesConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    if config.models.root.as_os_str().is_empty() {
        anyhow::bail!("models.root must not be empty");
    }

    if !(1..=10).contains(&config.traversal.max_depth) {
        anyhow::bail!("traversal.max_depth must be in [1, 10]");
    }

    if config.responses.count_only_max_lines == 0 {
        anyhow::bail!("responses.count_only_max_lines must be > 0");
    }

    if config.server.bind.trim().is_empty() {
        anyhow::bail!("server.bind must not be empty");
    }

    for pattern in &config.models.exclude_globs {
        globset::Glob::new(pattern)
            .with_context(|| format!("Invalid models.exclude_globs pattern: '{}'", pattern))?;
    }

    Ok(())
}
