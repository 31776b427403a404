use super::{
    execution::ExecutionConfig, metrics::MetricsConfig, partition::PartitionConfig,
    quantile::QuantileConfig, ranking::RankingConfig, traits::ConfigSection,
};
use crate::error::QualifyError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Prefix for environment overrides, e.g. `QUALIFY__PARTITION__N_FOLDS=10`.
pub const ENV_PREFIX: &str = "QUALIFY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub partition: PartitionConfig,
    pub metrics: MetricsConfig,
    pub quantile: QuantileConfig,
    pub ranking: RankingConfig,
    pub execution: ExecutionConfig,
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), QualifyError> {
        self.partition.validate()?;
        self.metrics.validate()?;
        self.quantile.validate()?;
        self.ranking.validate()?;
        self.execution.validate()?;

        if !self.metrics.metrics.contains(&self.ranking.primary_metric) {
            return Err(QualifyError::Configuration(format!(
                "Primary metric {} is not in the configured metric set",
                self.ranking.primary_metric
            )));
        }
        Ok(())
    }
}

pub struct ConfigManager {
    config: Arc<RwLock<RunConfig>>,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(RunConfig::default())),
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<(), QualifyError> {
        let contents = std::fs::read_to_string(path)?;
        let config: RunConfig = toml::from_str(&contents)?;
        self.replace(config)
    }

    /// Loads a file and applies `QUALIFY__<SECTION>__<FIELD>` environment overrides on top.
    pub fn load_layered<P: AsRef<Path>>(&self, path: P) -> Result<(), QualifyError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: RunConfig = settings.try_deserialize()?;
        self.replace(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), QualifyError> {
        let toml_str = toml::to_string_pretty(&self.get())?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    pub fn get(&self) -> RunConfig {
        self.config
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn update<F>(&self, f: F) -> Result<(), QualifyError>
    where
        F: FnOnce(&mut RunConfig),
    {
        let mut candidate = self.get();
        f(&mut candidate);
        self.replace(candidate)
    }

    fn replace(&self, config: RunConfig) -> Result<(), QualifyError> {
        config.validate()?;
        *self
            .config
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = config;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::metrics::MetricKind;

    #[test]
    fn test_default_config_is_valid() {
        assert!(RunConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: RunConfig = toml::from_str(
            r#"
            [partition]
            n_folds = 10

            [ranking]
            primary_metric = "roc_auc"
            "#,
        )
        .unwrap();

        assert_eq!(config.partition.n_folds, 10);
        assert!(config.partition.shuffle);
        assert_eq!(config.ranking.primary_metric, MetricKind::RocAuc);
        assert_eq!(config.ranking.tie_break_epsilon, 0.02);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_update_rejects_invalid_and_keeps_previous() {
        let manager = ConfigManager::new();
        let result = manager.update(|c| c.partition.n_folds = 1);
        assert!(result.is_err());
        assert_eq!(manager.get().partition.n_folds, 5);
    }

    #[test]
    fn test_primary_metric_must_be_configured() {
        let mut config = RunConfig::default();
        config.metrics.metrics = vec![MetricKind::Precision, MetricKind::Recall];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_quantile_bounds_validated() {
        let mut config = RunConfig::default();
        config.quantile.quantiles = vec![0.5, 1.0];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_disabled_timeout_survives_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.toml");

        let manager = ConfigManager::new();
        manager
            .update(|c| {
                c.execution.unit_timeout_ms = 0;
                c.partition.n_folds = 7;
            })
            .unwrap();
        manager.save_to_file(&path).unwrap();

        let reloaded = ConfigManager::new();
        reloaded.load_from_file(&path).unwrap();
        let config = reloaded.get();
        assert_eq!(config.execution.unit_timeout_ms, 0);
        assert_eq!(config.execution.unit_timeout(), None);
        assert_eq!(config.partition.n_folds, 7);
    }

    #[test]
    fn test_load_from_file_rejects_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[partition]\nn_folds = 1\n").unwrap();

        let manager = ConfigManager::new();
        assert!(manager.load_from_file(&path).is_err());
        assert_eq!(manager.get().partition.n_folds, 5);
    }

    #[test]
    fn test_layered_load_applies_env_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layered.toml");
        std::fs::write(
            &path,
            "[partition]\nn_folds = 4\n\n[execution]\nunit_timeout_ms = 1000\n",
        )
        .unwrap();
        std::env::set_var("QUALIFY__EXECUTION__POLL_INTERVAL_MS", "25");

        let manager = ConfigManager::new();
        let result = manager.load_layered(&path);
        std::env::remove_var("QUALIFY__EXECUTION__POLL_INTERVAL_MS");
        result.unwrap();

        let config = manager.get();
        assert_eq!(config.partition.n_folds, 4);
        assert_eq!(config.execution.unit_timeout_ms, 1000);
        assert_eq!(config.execution.poll_interval_ms, 25);
        assert!(config.execution.parallel);
    }
}
