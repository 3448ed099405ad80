//! Application container for SimpleVB

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::analysis::Validator;
use crate::cli::{OutputContext, OutputFormat};
use crate::config::RuntimeConfig;
use crate::models::config::SimpleVbConfig;
use crate::services::analysis::{AnalysisService, DefaultAnalysisService};
use crate::services::config::{ConfigService, DefaultConfigService};
use crate::services::workspace::{DefaultWorkspaceService, WorkspaceService};

pub struct App {
    root: PathBuf,
    pub(crate) output: OutputContext,
    pub(crate) config_service: Arc<dyn ConfigService>,
    pub(crate) workspace: Arc<dyn WorkspaceService>,
    pub(crate) analysis: Arc<dyn AnalysisService>,
    pub(crate) config: SimpleVbConfig,
    pub(crate) runtime: RuntimeConfig,
}

impl App {
    pub async fn new() -> anyhow::Result<Self> {
        let root = std::env::current_dir()?.canonicalize()?;
        Self::at(root).await
    }

    /// Container rooted at `root`, which should already be canonical
    pub async fn at(root: PathBuf) -> anyhow::Result<Self> {
        tracing::debug!("Initializing SimpleVB at {:?}", root);

        let config_service = Arc::new(DefaultConfigService::new(&root));
        let config = match config_service.load(false).await {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring invalid configuration: {}", e);
                SimpleVbConfig::default()
            }
        };
        let format = config.output.format.parse().unwrap_or_else(|e| {
            tracing::warn!("{}", e);
            OutputFormat::default()
        });
        let output = OutputContext::new(root.clone(), format);
        let runtime = RuntimeConfig::from(&config);

        let workspace: Arc<dyn WorkspaceService> = Arc::new(DefaultWorkspaceService::new(
            &root,
            &config.workspace,
            &runtime,
        ));
        let analysis = Arc::new(DefaultAnalysisService::new(
            Arc::clone(&workspace),
            Validator::new(runtime.validation.clone()),
        ));

        Ok(Self {
            root,
            output,
            config_service,
            workspace,
            analysis,
            config,
            runtime,
        })
    }

    /// Command-line override of the configured output format
    pub fn set_format(&mut self, format: OutputFormat) {
        self.output = self.output.clone().with_format(format);
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &SimpleVbConfig {
        &self.config
    }

    pub fn runtime(&self) -> &RuntimeConfig {
        &self.runtime
    }
}
