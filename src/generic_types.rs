use std::fmt::Display;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::classifiers::naive_bayes::NaiveBayesError;

/// Bag-of-words counts, one row per document, one column per vocabulary term.
pub type FeatureMatrix = Array2<u32>;

/// Binary review polarity. `0` is negative, `1` is positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Sentiment {
    Negative,
    Positive,
}

impl Sentiment {
    pub fn from_int(i: u8) -> Option<Self> {
        match i {
            0 => Some(Sentiment::Negative),
            1 => Some(Sentiment::Positive),
            _ => None,
        }
    }

    /// Parse a label cell. Dataset exports write labels either as `0`/`1` or as `0.0`/`1.0`.
    pub fn from_label(s: &str) -> Option<Self> {
        let value: f64 = s.trim().parse().ok()?;
        if value == 0.0 {
            Some(Sentiment::Negative)
        } else if value == 1.0 {
            Some(Sentiment::Positive)
        } else {
            None
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            Sentiment::Negative => 0,
            Sentiment::Positive => 1,
        }
    }

    pub fn to_str(&self) -> &str {
        match self {
            Sentiment::Negative => "negative",
            Sentiment::Positive => "positive",
        }
    }
}

impl Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl From<Sentiment> for u8 {
    fn from(value: Sentiment) -> Self {
        value.as_u8()
    }
}

impl TryFrom<u8> for Sentiment {
    type Error = NaiveBayesError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Sentiment::from_int(value)
            .ok_or_else(|| NaiveBayesError::InputError(format!("label {} is not 0 or 1", value)))
    }
}

/// Convert integer labels into [`Sentiment`]s, rejecting anything outside {0, 1}.
pub fn labels_from_ints(values: &[u8]) -> Result<Vec<Sentiment>, NaiveBayesError> {
    values.iter().map(|&v| Sentiment::try_from(v)).collect()
}

/// Build a feature matrix from per-document rows. Every row must have the same length.
pub fn feature_matrix_from_rows(rows: &[Vec<u32>]) -> Result<FeatureMatrix, NaiveBayesError> {
    let width = rows.first().map(|r| r.len()).unwrap_or(0);
    let mut flat = Vec::with_capacity(rows.len() * width);

    for (i, row) in rows.iter().enumerate() {
        if row.len() != width {
            return Err(NaiveBayesError::InputError(format!(
                "row {} has {} features, expected {}",
                i,
                row.len(),
                width
            )));
        }
        flat.extend_from_slice(row);
    }

    Array2::from_shape_vec((rows.len(), width), flat)
        .map_err(|e| NaiveBayesError::InputError(e.to_string()))
}
