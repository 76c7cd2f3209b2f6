// src/core/engine.rs
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::ArchflowError;
use super::call_graph::{FlowAnalysisResult, FlowEngine};
use super::llm::{create_augmenter, AugmentOutcome, DiagramSource, GenerativeAugmenter};
use super::notify::{LogSink, NotificationSink};

const CONFIG_FILE_NAME: &str = "archflow.toml";

/// Main orchestration engine behind the CLI commands
pub struct Engine {
    config: Config,
    flow_engine: FlowEngine,
    augmenter: GenerativeAugmenter,
}

impl Engine {
    /// Create an engine from a configuration file (or the default search)
    pub async fn new(config_path: Option<&Path>) -> Result<Self> {
        let config = Config::load_or_default(config_path)?;
        debug!("Loaded configuration: {:?}", config);
        Self::with_config(config, Arc::new(LogSink))
    }

    /// Create an engine from an in-memory configuration, reporting failures to `sink`
    pub fn with_config(config: Config, sink: Arc<dyn NotificationSink>) -> Result<Self> {
        config.validate()?;
        let flow_engine = FlowEngine::new(&config)?;

        let provider = match create_augmenter(&config.augmentation) {
            Ok(Some(provider)) => {
                info!("✅ Augmentation enabled: {}", provider.provider_name());
                Some(provider)
            }
            Ok(None) => {
                debug!("Augmentation disabled");
                None
            }
            Err(e) => {
                warn!("⚠️ Failed to initialize augmentation provider: {}", e);
                warn!("Continuing with deterministic diagrams only");
                None
            }
        };
        let augmenter = GenerativeAugmenter::new(
            provider,
            Duration::from_millis(config.augmentation.timeout_ms),
            sink,
        );

        Ok(Self {
            config,
            flow_engine,
            augmenter,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Write a default configuration file into `path`
    pub async fn init(&self, path: Option<PathBuf>) -> Result<()> {
        let target_dir = path.unwrap_or_else(|| PathBuf::from("."));
        let config_path = target_dir.join(CONFIG_FILE_NAME);
        info!("Initializing archflow in: {}", target_dir.display());

        if config_path.exists() {
            return Err(ArchflowError::Config(format!(
                "{} already exists",
                config_path.display()
            ))
            .into());
        }

        std::fs::create_dir_all(&target_dir)
            .with_context(|| format!("Failed to create {}", target_dir.display()))?;
        Config::default().save(&config_path)?;
        info!("📝 Wrote {}", config_path.display());
        Ok(())
    }

    /// Run the deterministic pipeline only
    pub fn analyze_tree(&self, path: Option<PathBuf>) -> Result<FlowAnalysisResult> {
        let root = path.unwrap_or_else(|| PathBuf::from("."));
        if !root.is_dir() {
            return Err(ArchflowError::FileSystem(format!("{} is not a directory", root.display())).into());
        }
        let result = self
            .flow_engine
            .analyze(&root)
            .map_err(|e| anyhow::anyhow!("Analysis of {} failed: {}", root.display(), e))?;
        Ok(result)
    }

    /// Deterministic analysis plus the augmentation attempt, if enabled and wanted
    pub async fn render(
        &self,
        path: Option<PathBuf>,
        augment: bool,
    ) -> Result<(FlowAnalysisResult, AugmentOutcome)> {
        let result = self.analyze_tree(path)?;

        let outcome = if augment {
            self.augmenter
                .augment_or_fallback(&result.summary(), &result.mermaid)
                .await
        } else {
            AugmentOutcome {
                diagram_text: result.mermaid.clone(),
                source: DiagramSource::Deterministic,
                failure: None,
            }
        };
        Ok((result, outcome))
    }

    pub async fn analyze(&self, path: Option<PathBuf>, json: bool) -> Result<()> {
        let result = self.analyze_tree(path)?;

        if json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            print!("{}", result.summary());
            println!("Fingerprint: {}", result.fingerprint);
        }
        Ok(())
    }

    pub async fn diagram(&self, path: Option<PathBuf>, output: Option<PathBuf>, no_augment: bool) -> Result<()> {
        let (result, outcome) = self.render(path, !no_augment).await?;

        match outcome.source {
            DiagramSource::Augmented => info!("🧠 Using augmented diagram"),
            DiagramSource::Deterministic => {
                debug!("Using deterministic diagram ({})", result.fingerprint)
            }
        }

        match output {
            Some(output_path) => {
                std::fs::write(&output_path, &outcome.diagram_text)
                    .with_context(|| format!("Failed to write {}", output_path.display()))?;
                info!("📝 Diagram written to {}", output_path.display());
            }
            None => print!("{}", outcome.diagram_text),
        }
        Ok(())
    }
}
