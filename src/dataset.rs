//! Labeled bag-of-words datasets exchanged with the upstream feature builder.
//!
//! The hand-off format is a CSV file with a header row. For training data the
//! first column holds the label and every further column is one vocabulary
//! term; each cell below it is that term's count in the document. Prediction
//! input has the same layout without the label column.

use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, Trim};
use ndarray::Axis;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use thiserror::Error;
use tracing::{debug, info};

use crate::classifiers::naive_bayes::NaiveBayesError;
use crate::generic_types::{feature_matrix_from_rows, FeatureMatrix, Sentiment};

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Failed to read {}: {source}", path.display())]
    Csv { path: PathBuf, source: csv::Error },

    #[error("{} has no feature columns", .0.display())]
    NoFeatures(PathBuf),

    #[error("{} has no documents", .0.display())]
    Empty(PathBuf),

    #[error("Line {line}: label `{value}` is not 0 or 1")]
    InvalidLabel { line: u64, value: String },

    #[error("Line {line}, column `{column}`: `{value}` is not a non-negative integer count")]
    InvalidCount {
        line: u64,
        column: String,
        value: String,
    },

    #[error("Invalid split: {0}")]
    InvalidSplit(String),

    #[error(transparent)]
    Shape(#[from] NaiveBayesError),
}

#[derive(Debug, Clone)]
pub struct Dataset {
    vocabulary: Vec<String>,
    features: FeatureMatrix,
    labels: Vec<Sentiment>,
}

impl Dataset {
    pub fn new(
        vocabulary: Vec<String>,
        features: FeatureMatrix,
        labels: Vec<Sentiment>,
    ) -> Result<Self, DatasetError> {
        if features.ncols() != vocabulary.len() {
            return Err(NaiveBayesError::InputError(format!(
                "{} feature columns for a vocabulary of {}",
                features.ncols(),
                vocabulary.len()
            ))
            .into());
        }
        if features.nrows() != labels.len() {
            return Err(NaiveBayesError::InputError(format!(
                "{} labels for {} documents",
                labels.len(),
                features.nrows()
            ))
            .into());
        }
        Ok(Self { vocabulary, features, labels })
    }

    /// Load a labeled dataset.
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let table = read_table(path, true)?;
        let features = feature_matrix_from_rows(&table.rows)?;

        info!(
            "Loaded {} documents x {} features from {}",
            features.nrows(),
            features.ncols(),
            path.display()
        );
        Self::new(table.vocabulary, features, table.labels)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn vocab_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn features(&self) -> &FeatureMatrix {
        &self.features
    }

    pub fn labels(&self) -> &[Sentiment] {
        &self.labels
    }

    /// Rows at `indices`, in that order.
    pub fn select(&self, indices: &[usize]) -> Dataset {
        Dataset {
            vocabulary: self.vocabulary.clone(),
            features: self.features.select(Axis(0), indices),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
        }
    }

    /// Shuffle with a fixed seed and cut into `(train, test)`.
    ///
    /// The test part gets `ceil(test_size * len)` documents; both parts must end up non-empty.
    pub fn split(&self, test_size: f64, seed: u64) -> Result<(Dataset, Dataset), DatasetError> {
        if !(test_size > 0.0 && test_size < 1.0) {
            return Err(DatasetError::InvalidSplit(format!(
                "test size {} is not in (0, 1)",
                test_size
            )));
        }

        let n = self.len();
        let n_test = (test_size * n as f64).ceil() as usize;
        if n_test == 0 || n_test >= n {
            return Err(DatasetError::InvalidSplit(format!(
                "test size {} leaves an empty partition of {} documents",
                test_size, n
            )));
        }

        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);
        let (test_idx, train_idx) = indices.split_at(n_test);

        debug!("Split {} documents into {} train / {} test", n, train_idx.len(), test_idx.len());
        Ok((self.select(train_idx), self.select(test_idx)))
    }
}

/// Read unlabeled count vectors, returning the vocabulary and the matrix.
pub fn read_feature_rows(path: impl AsRef<Path>) -> Result<(Vec<String>, FeatureMatrix), DatasetError> {
    let table = read_table(path.as_ref(), false)?;
    let features = feature_matrix_from_rows(&table.rows)?;
    Ok((table.vocabulary, features))
}

struct Table {
    vocabulary: Vec<String>,
    rows: Vec<Vec<u32>>,
    labels: Vec<Sentiment>,
}

fn read_table(path: &Path, labeled: bool) -> Result<Table, DatasetError> {
    let csv_err = |source| DatasetError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_path(path)
        .map_err(csv_err)?;

    let skip = usize::from(labeled);
    let headers = reader.headers().map_err(csv_err)?;
    if headers.len() <= skip {
        return Err(DatasetError::NoFeatures(path.to_path_buf()));
    }
    let vocabulary: Vec<String> = headers.iter().skip(skip).map(str::to_string).collect();

    let mut rows = Vec::new();
    let mut labels = Vec::new();

    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        if labeled {
            let raw = record.get(0).unwrap_or("");
            let label = Sentiment::from_label(raw).ok_or_else(|| DatasetError::InvalidLabel {
                line,
                value: raw.to_string(),
            })?;
            labels.push(label);
        }

        let row = record
            .iter()
            .skip(skip)
            .zip(&vocabulary)
            .map(|(cell, column)| {
                cell.parse::<u32>().map_err(|_| DatasetError::InvalidCount {
                    line,
                    column: column.clone(),
                    value: cell.to_string(),
                })
            })
            .collect::<Result<Vec<u32>, _>>()?;
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(DatasetError::Empty(path.to_path_buf()));
    }

    Ok(Table { vocabulary, rows, labels })
}
