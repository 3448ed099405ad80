//! Configuration service for SimpleVB

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::ConfigError;
use crate::infra::file_filter::PROJECT_DIR;
use crate::models::config::SimpleVbConfig;

#[async_trait]
pub trait ConfigService: Send + Sync {
    async fn load(&self, global_only: bool) -> Result<SimpleVbConfig, ConfigError>;
    fn config_path(&self, global: bool) -> PathBuf;
    async fn init(&self, global: bool, force: bool) -> Result<PathBuf, ConfigError>;
}

pub struct DefaultConfigService {
    root: PathBuf,
}

impl DefaultConfigService {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    fn global_config_path() -> PathBuf {
        // XDG standard: ~/.config/simplevb/config.toml
        std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .ok()
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("simplevb")
            .join("config.toml")
    }

    fn project_config_path(&self) -> PathBuf {
        self.root.join(PROJECT_DIR).join("config.toml")
    }

    /// Raw table so that unset keys don't shadow the layer below
    async fn load_table(path: &Path) -> Result<toml::Table, ConfigError> {
        if !path.exists() {
            return Ok(toml::Table::new());
        }
        let content = tokio::fs::read_to_string(path).await?;
        content
            .parse::<toml::Table>()
            .map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))
    }

    async fn write_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let config = SimpleVbConfig::default();
        let content =
            toml::to_string_pretty(&config).map_err(|e| ConfigError::Parse(e.to_string()))?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}

#[async_trait]
impl ConfigService for DefaultConfigService {
    async fn load(&self, global_only: bool) -> Result<SimpleVbConfig, ConfigError> {
        let mut table = Self::load_table(&Self::global_config_path()).await?;
        if !global_only {
            let project = Self::load_table(&self.project_config_path()).await?;
            merge_tables(&mut table, project);
        }

        let config: SimpleVbConfig = toml::Value::Table(table)
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::Parse(e.to_string()))?;
        let config = apply_env_overrides(config, |key| std::env::var(key).ok())?;
        check_values(&config)?;
        tracing::debug!("Loaded config (global_only={})", global_only);
        Ok(config)
    }

    fn config_path(&self, global: bool) -> PathBuf {
        if global {
            Self::global_config_path()
        } else {
            self.project_config_path()
        }
    }

    async fn init(&self, global: bool, force: bool) -> Result<PathBuf, ConfigError> {
        let path = self.config_path(global);

        if path.exists() && !force {
            return Err(ConfigError::AlreadyExists(path));
        }

        Self::write_default_config(&path).await?;
        Ok(path)
    }
}

/// Overlay wins key by key; nested tables merge recursively
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        let replacement = match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(nested)) => {
                merge_tables(existing, nested);
                None
            }
            (_, value) => Some(value),
        };
        if let Some(value) = replacement {
            base.insert(key, value);
        }
    }
}

fn apply_env_overrides(
    mut config: SimpleVbConfig,
    var: impl Fn(&str) -> Option<String>,
) -> Result<SimpleVbConfig, ConfigError> {
    if let Some(val) = var("SIMPLEVB_OUTPUT_FORMAT") {
        config.output.format = val;
    }
    if let Some(val) = var("SIMPLEVB_MAX_LINE_LENGTH") {
        config.validation.max_line_length =
            val.parse().map_err(|_| ConfigError::InvalidValue {
                key: "SIMPLEVB_MAX_LINE_LENGTH".to_string(),
                message: format!("expected a positive integer, got '{}'", val),
            })?;
    }
    if let Some(val) = var("SIMPLEVB_DEBOUNCE_MS") {
        config.diagnostics.debounce_ms = val.parse().map_err(|_| ConfigError::InvalidValue {
            key: "SIMPLEVB_DEBOUNCE_MS".to_string(),
            message: format!("expected milliseconds, got '{}'", val),
        })?;
    }
    Ok(config)
}

fn check_values(config: &SimpleVbConfig) -> Result<(), ConfigError> {
    if config.validation.max_line_length == 0 {
        return Err(ConfigError::InvalidValue {
            key: "validation.max_line_length".to_string(),
            message: "must be positive".to_string(),
        });
    }
    if config.workspace.extensions.is_empty() {
        return Err(ConfigError::InvalidValue {
            key: "workspace.extensions".to_string(),
            message: "at least one extension is required".to_string(),
        });
    }
    Ok(())
}
