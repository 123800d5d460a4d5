use std::fmt;
use std::path::PathBuf;

use config::{builder::DefaultState, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

use crate::classifiers::naive_bayes::SmoothingMode;
use crate::evaluation::FoldType;

pub const ENV_PREFIX: &str = "NB_SENTIMENT";

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResultsConfig {
    pub path: PathBuf,
    pub cv_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrainingConfig {
    pub smoothing: SmoothingMode,
    pub test_size: f64,
    pub random_state: u64,
    pub folds: usize,
    pub fold_type: FoldType,
    pub feature_type: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub model: ModelConfig,
    pub results: ResultsConfig,
    pub training: TrainingConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Layer built-in defaults, the optional file `name`, then `NB_SENTIMENT__SECTION__KEY`
    /// environment variables.
    pub fn load(name: &str) -> Result<Self, ConfigError> {
        let mut builder: ConfigBuilder<DefaultState> = ConfigBuilder::default();

        builder = builder
            .set_default("model.dir", "./models")?
            .set_default("results.path", "./results/results.txt")?
            .set_default("results.cv_path", "./results_cv/results.txt")?
            .set_default("training.smoothing", "laplace")?
            .set_default("training.test_size", 0.3)?
            .set_default("training.random_state", 42_i64)?
            .set_default("training.folds", 10_i64)?
            .set_default("training.fold_type", "round-robin")?
            .set_default("training.feature_type", "unigram")?
            .set_default("logging.level", "info")?;

        builder = builder
            .add_source(File::with_name(name).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let training = &self.training;
        if !(training.test_size > 0.0 && training.test_size < 1.0) {
            return Err(ConfigError::Message(format!(
                "training.test_size must be in (0, 1), got {}",
                training.test_size
            )));
        }
        if training.folds < 2 {
            return Err(ConfigError::Message(format!(
                "training.folds must be at least 2, got {}",
                training.folds
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "model dir {}, smoothing {}, test size {}, {}-fold {}",
            self.model.dir.display(),
            self.training.smoothing,
            self.training.test_size,
            self.training.folds,
            self.training.fold_type
        )
    }
}
