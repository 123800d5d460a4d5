//! Append-only experiment logs.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use time::OffsetDateTime;
use tracing::info;

use crate::classifiers::naive_bayes::SmoothingMode;
use crate::evaluation::{CrossValidation, FoldType};

/// One train/test run.
#[derive(Debug, Clone, Serialize)]
pub struct ExperimentRecord {
    pub feature_type: String,
    pub vocabulary_size: usize,
    pub training_size: usize,
    pub smoothing: SmoothingMode,
    pub neg_accuracy: f64,
    pub pos_accuracy: f64,
}

impl ExperimentRecord {
    fn to_line(&self, notes: &str) -> String {
        format!(
            "feature: {}\t#feature: {}\ttraining size: {}\tsmooth: {}\tneg_accuracy: {:.6}\tpos_accuracy: {:.6}\tnotes: {}",
            self.feature_type,
            self.vocabulary_size,
            self.training_size,
            self.smoothing,
            self.neg_accuracy,
            self.pos_accuracy,
            notes
        )
    }
}

/// One cross-validation run.
#[derive(Debug, Clone, Serialize)]
pub struct CrossValidationRecord {
    pub fold_type: FoldType,
    pub feature_type: String,
    pub performances: Vec<f64>,
    pub average: f64,
    pub variance: f64,
}

impl CrossValidationRecord {
    pub fn new(feature_type: impl Into<String>, cv: &CrossValidation) -> Self {
        Self {
            fold_type: cv.fold_type,
            feature_type: feature_type.into(),
            performances: cv.performances.clone(),
            average: cv.average(),
            variance: cv.variance(),
        }
    }

    fn to_line(&self, notes: &str) -> String {
        let performances = self
            .performances
            .iter()
            .map(|p| format!("{:.6}", p))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "fold type: {}\nfeature: {}\t#performance: [{}]\taverage performance: {:.6}\tvariance: {:.6}\tnotes: {}",
            self.fold_type, self.feature_type, performances, self.average, self.variance, notes
        )
    }
}

/// Writes human-readable result lines, creating the files on first use.
#[derive(Debug, Clone)]
pub struct ResultLogger {
    results_path: PathBuf,
    cv_path: PathBuf,
}

impl ResultLogger {
    pub fn new(results_path: impl Into<PathBuf>, cv_path: impl Into<PathBuf>) -> Self {
        Self {
            results_path: results_path.into(),
            cv_path: cv_path.into(),
        }
    }

    pub fn results_path(&self) -> &Path {
        &self.results_path
    }

    pub fn cv_path(&self) -> &Path {
        &self.cv_path
    }

    pub fn log_experiment(&self, record: &ExperimentRecord) -> io::Result<()> {
        append_line(&self.results_path, &record.to_line(&notes()))?;
        info!("Appended results to {}", self.results_path.display());
        Ok(())
    }

    pub fn log_cross_validation(&self, record: &CrossValidationRecord) -> io::Result<()> {
        append_line(&self.cv_path, &record.to_line(&notes()))?;
        info!("Appended cross-validation results to {}", self.cv_path.display());
        Ok(())
    }
}

fn notes() -> String {
    format!("results obtained on {}", OffsetDateTime::now_utc())
}

fn append_line(path: &Path, line: &str) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", line)?;
    file.flush()
}
