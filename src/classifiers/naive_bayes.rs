//! Binary multinomial Naive Bayes over bag-of-words count vectors.
//!
//! [`NaiveBayes`] accumulates per-class word counts and turns them into two
//! conditional-probability vectors plus the positive-class prior.
//! [`NaiveBayesModel`] scores a count vector in log space and picks the larger
//! of the two class scores.

use std::fmt;
use std::str::FromStr;

use indicatif::{ProgressBar, ProgressStyle};
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::generic_types::{FeatureMatrix, Sentiment};

#[derive(Error, Debug)]
pub enum NaiveBayesError {
    #[error("Invalid input: {0}")]
    InputError(String),

    #[error("Unknown smoothing mode `{0}` (expected `laplace` or `none`)")]
    InvalidSmoothing(String),

    #[error("The training set has no {0} documents")]
    EmptyClass(Sentiment),

    #[error("Non-finite probability {value} for {class} feature {index}")]
    NonFiniteProbability {
        class: Sentiment,
        index: usize,
        value: f64,
    },

    #[error("Feature vector has {found} entries but the model vocabulary has {expected}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("Invalid model: {0}")]
    InvalidModel(String),
}

/// Additive smoothing applied while training.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum SmoothingMode {
    Laplace,
    None,
}

impl SmoothingMode {
    /// Pseudo-count added to every numerator entry, and once per document to
    /// the class denominator.
    pub fn k(&self) -> f64 {
        match self {
            SmoothingMode::Laplace => 2.0,
            SmoothingMode::None => 0.0,
        }
    }

    pub fn to_str(&self) -> &str {
        match self {
            SmoothingMode::Laplace => "laplace",
            SmoothingMode::None => "none",
        }
    }
}

impl FromStr for SmoothingMode {
    type Err = NaiveBayesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "laplace" => Ok(SmoothingMode::Laplace),
            "none" | "None" => Ok(SmoothingMode::None),
            other => Err(NaiveBayesError::InvalidSmoothing(other.to_string())),
        }
    }
}

impl TryFrom<String> for SmoothingMode {
    type Error = NaiveBayesError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for SmoothingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

/// A fitted classifier: P(feature | class) for both classes and P(class = positive).
#[derive(Debug, Clone, PartialEq)]
pub struct NaiveBayesModel {
    prob_neg: Array1<f64>,
    prob_pos: Array1<f64>,
    prior: f64,
}

impl NaiveBayesModel {
    /// Assemble a model from its three parts, e.g. after reading them from disk.
    pub fn from_parts(
        prob_neg: Array1<f64>,
        prob_pos: Array1<f64>,
        prior: f64,
    ) -> Result<Self, NaiveBayesError> {
        if prob_neg.is_empty() {
            return Err(NaiveBayesError::InvalidModel("empty probability vectors".to_string()));
        }
        if prob_neg.len() != prob_pos.len() {
            return Err(NaiveBayesError::InvalidModel(format!(
                "negative vector has {} entries, positive vector has {}",
                prob_neg.len(),
                prob_pos.len()
            )));
        }
        if !(0.0..=1.0).contains(&prior) {
            return Err(NaiveBayesError::InvalidModel(format!(
                "prior {} is outside [0, 1]",
                prior
            )));
        }
        check_finite(&prob_neg, Sentiment::Negative)?;
        check_finite(&prob_pos, Sentiment::Positive)?;
        check_unit_range(&prob_neg, Sentiment::Negative)?;
        check_unit_range(&prob_pos, Sentiment::Positive)?;

        Ok(Self { prob_neg, prob_pos, prior })
    }

    pub fn prob_neg(&self) -> &Array1<f64> {
        &self.prob_neg
    }

    pub fn prob_pos(&self) -> &Array1<f64> {
        &self.prob_pos
    }

    /// P(class = positive)
    pub fn prior(&self) -> f64 {
        self.prior
    }

    pub fn vocab_size(&self) -> usize {
        self.prob_neg.len()
    }

    /// Precompute the log vectors once for scoring many documents.
    pub fn scorer(&self) -> LogScorer {
        LogScorer {
            log_neg: clamped_ln(&self.prob_neg),
            log_pos: clamped_ln(&self.prob_pos),
            log_prior_neg: (1.0 - self.prior).ln(),
            log_prior_pos: self.prior.ln(),
        }
    }

    pub fn scores(&self, features: ArrayView1<'_, u32>) -> Result<Scores, NaiveBayesError> {
        self.scorer().scores(features)
    }

    /// Classify one document.
    pub fn predict(&self, features: ArrayView1<'_, u32>) -> Result<Sentiment, NaiveBayesError> {
        Ok(self.scores(features)?.label())
    }

    /// Classify every row of `features`.
    pub fn predict_batch(&self, features: &FeatureMatrix) -> Result<Vec<Sentiment>, NaiveBayesError> {
        let scorer = self.scorer();
        features
            .outer_iter()
            .map(|row| scorer.scores(row).map(|s| s.label()))
            .collect()
    }
}

/// Log-space view of a model.
///
/// A probability of exactly zero has `ln = -inf`; such entries are replaced by
/// `0.0` so the feature contributes nothing to the class score instead of
/// vetoing the class outright.
#[derive(Debug, Clone)]
pub struct LogScorer {
    log_neg: Array1<f64>,
    log_pos: Array1<f64>,
    log_prior_neg: f64,
    log_prior_pos: f64,
}

impl LogScorer {
    pub fn scores(&self, features: ArrayView1<'_, u32>) -> Result<Scores, NaiveBayesError> {
        if features.len() != self.log_neg.len() {
            return Err(NaiveBayesError::DimensionMismatch {
                expected: self.log_neg.len(),
                found: features.len(),
            });
        }

        let x = features.mapv(f64::from);
        Ok(Scores {
            negative: x.dot(&self.log_neg) + self.log_prior_neg,
            positive: x.dot(&self.log_pos) + self.log_prior_pos,
        })
    }
}

/// Unnormalised log-posterior of each class for one document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Scores {
    pub negative: f64,
    pub positive: f64,
}

impl Scores {
    /// Ties go to the positive class.
    pub fn label(&self) -> Sentiment {
        if self.negative > self.positive {
            Sentiment::Negative
        } else {
            Sentiment::Positive
        }
    }
}

/// Trainer for [`NaiveBayesModel`].
#[derive(Debug, Clone)]
pub struct NaiveBayes {
    smoothing: SmoothingMode,
    show_progress: bool,
}

impl NaiveBayes {
    /// Create a new trainer
    pub fn new(smoothing: SmoothingMode) -> Self {
        NaiveBayes {
            smoothing,
            show_progress: true,
        }
    }

    /// Create a trainer from a smoothing name, failing on anything but `laplace` / `none`.
    pub fn from_mode(mode: &str) -> Result<Self, NaiveBayesError> {
        Ok(Self::new(mode.parse()?))
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn smoothing(&self) -> SmoothingMode {
        self.smoothing
    }

    /// Train the classifier with labeled count vectors
    pub fn train(
        &self,
        features: &FeatureMatrix,
        labels: &[Sentiment],
    ) -> Result<NaiveBayesModel, NaiveBayesError> {
        let (no_docs, no_words) = features.dim();
        if no_docs == 0 {
            return Err(NaiveBayesError::InputError("no training documents".to_string()));
        }
        if no_words == 0 {
            return Err(NaiveBayesError::InputError("empty vocabulary".to_string()));
        }
        if labels.len() != no_docs {
            return Err(NaiveBayesError::InputError(format!(
                "{} labels for {} documents",
                labels.len(),
                no_docs
            )));
        }

        let k = self.smoothing.k();
        debug!(
            "Training on {} documents, {} features, {} smoothing",
            no_docs, no_words, self.smoothing
        );

        let mut neg_num = Array1::<f64>::zeros(no_words);
        let mut pos_num = Array1::<f64>::zeros(no_words);
        let mut neg_denom = 0.0;
        let mut pos_denom = 0.0;
        let mut no_neg = 0usize;
        let mut no_pos = 0usize;

        let pb = self.progress_bar(no_docs as u64);

        for (row, label) in features.outer_iter().zip(labels) {
            let row = row.mapv(f64::from);
            let total = row.sum();
            match label {
                Sentiment::Negative => {
                    neg_num += &row;
                    neg_denom += total + k;
                    no_neg += 1;
                }
                Sentiment::Positive => {
                    pos_num += &row;
                    pos_denom += total + k;
                    no_pos += 1;
                }
            }
            pb.inc(1);
        }

        pb.finish_with_message("Training complete!");

        if no_neg == 0 {
            return Err(NaiveBayesError::EmptyClass(Sentiment::Negative));
        }
        if no_pos == 0 {
            return Err(NaiveBayesError::EmptyClass(Sentiment::Positive));
        }

        let prior = no_pos as f64 / no_docs as f64;
        let prob_neg = (neg_num + k) / neg_denom;
        let prob_pos = (pos_num + k) / pos_denom;

        check_finite(&prob_neg, Sentiment::Negative)?;
        check_finite(&prob_pos, Sentiment::Positive)?;

        info!(
            "Trained naive bayes: {} negative / {} positive documents, prior {:.4}",
            no_neg, no_pos, prior
        );

        Ok(NaiveBayesModel { prob_neg, prob_pos, prior })
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(len);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .map(|s| s.progress_chars("#>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        pb.set_message("Training in progress...");
        pb
    }
}

fn clamped_ln(probs: &Array1<f64>) -> Array1<f64> {
    probs.mapv(|p| {
        let l = p.ln();
        if l.is_infinite() {
            0.0
        } else {
            l
        }
    })
}

fn check_finite(probs: &Array1<f64>, class: Sentiment) -> Result<(), NaiveBayesError> {
    match probs.iter().position(|p| !p.is_finite()) {
        Some(index) => Err(NaiveBayesError::NonFiniteProbability {
            class,
            index,
            value: probs[index],
        }),
        None => Ok(()),
    }
}

fn check_unit_range(probs: &Array1<f64>, class: Sentiment) -> Result<(), NaiveBayesError> {
    match probs.iter().position(|p| !(0.0..=1.0).contains(p)) {
        Some(index) => Err(NaiveBayesError::InvalidModel(format!(
            "{} probability {} at feature {} is outside [0, 1]",
            class, probs[index], index
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generic_types::{feature_matrix_from_rows, labels_from_ints};
    use ndarray::{array, Array2};

    fn trainer(mode: SmoothingMode) -> NaiveBayes {
        NaiveBayes::new(mode).with_progress(false)
    }

    #[test]
    fn test_prior_is_fraction_of_positive_labels() {
        let features = Array2::<u32>::ones((5, 2));
        let labels = labels_from_ints(&[0, 0, 1, 1, 1]).unwrap();

        let model = trainer(SmoothingMode::Laplace).train(&features, &labels).unwrap();
        assert!((model.prior() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_laplace_adds_k_per_document() {
        // neg: (1 + 3 + 2) / ((1 + 2) + (3 + 2)) = 6 / 8
        let features = feature_matrix_from_rows(&[vec![1], vec![3], vec![5]]).unwrap();
        let labels = labels_from_ints(&[0, 0, 1]).unwrap();

        let model = trainer(SmoothingMode::Laplace).train(&features, &labels).unwrap();
        assert_eq!(model.prob_neg()[0], 0.75);
        // pos: (5 + 2) / (5 + 2)
        assert_eq!(model.prob_pos()[0], 1.0);
    }

    #[test]
    fn test_unsmoothed_uses_raw_counts() {
        let features = feature_matrix_from_rows(&[vec![1, 3], vec![0, 4], vec![2, 2]]).unwrap();
        let labels = labels_from_ints(&[0, 0, 1]).unwrap();

        let model = trainer(SmoothingMode::None).train(&features, &labels).unwrap();
        assert_eq!(model.prob_neg(), &array![1.0 / 8.0, 7.0 / 8.0]);
        assert_eq!(model.prob_pos(), &array![0.5, 0.5]);
    }

    #[test]
    fn test_unknown_smoothing_mode_rejected() {
        let err = NaiveBayes::from_mode("add-one").unwrap_err();
        assert!(matches!(err, NaiveBayesError::InvalidSmoothing(ref m) if m == "add-one"));

        assert_eq!(NaiveBayes::from_mode("None").unwrap().smoothing(), SmoothingMode::None);
        assert_eq!(NaiveBayes::from_mode("laplace").unwrap().smoothing(), SmoothingMode::Laplace);
    }

    #[test]
    fn test_empty_inputs_rejected() {
        let t = trainer(SmoothingMode::Laplace);

        let no_docs = Array2::<u32>::zeros((0, 3));
        assert!(matches!(t.train(&no_docs, &[]), Err(NaiveBayesError::InputError(_))));

        let no_words = Array2::<u32>::zeros((2, 0));
        let labels = labels_from_ints(&[0, 1]).unwrap();
        assert!(matches!(t.train(&no_words, &labels), Err(NaiveBayesError::InputError(_))));
    }

    #[test]
    fn test_label_count_mismatch_rejected() {
        let features = Array2::<u32>::ones((3, 2));
        let labels = labels_from_ints(&[0, 1]).unwrap();
        let err = trainer(SmoothingMode::Laplace).train(&features, &labels).unwrap_err();
        assert!(matches!(err, NaiveBayesError::InputError(_)));
    }

    #[test]
    fn test_missing_class_reported() {
        let features = Array2::<u32>::ones((3, 2));
        let labels = labels_from_ints(&[1, 1, 1]).unwrap();
        let err = trainer(SmoothingMode::Laplace).train(&features, &labels).unwrap_err();
        assert!(matches!(err, NaiveBayesError::EmptyClass(Sentiment::Negative)));
    }

    #[test]
    fn test_zero_denominator_reported_at_training_time() {
        // Unsmoothed negative class whose documents have no words: 0 / 0.
        let features = feature_matrix_from_rows(&[vec![0, 0], vec![1, 2]]).unwrap();
        let labels = labels_from_ints(&[0, 1]).unwrap();
        let err = trainer(SmoothingMode::None).train(&features, &labels).unwrap_err();
        assert!(matches!(
            err,
            NaiveBayesError::NonFiniteProbability { class: Sentiment::Negative, index: 0, .. }
        ));
    }

    #[test]
    fn test_training_is_deterministic() {
        let features =
            feature_matrix_from_rows(&[vec![2, 0, 1], vec![0, 3, 1], vec![1, 1, 0], vec![4, 0, 0]])
                .unwrap();
        let labels = labels_from_ints(&[0, 1, 1, 0]).unwrap();
        let t = trainer(SmoothingMode::Laplace);

        assert_eq!(t.train(&features, &labels).unwrap(), t.train(&features, &labels).unwrap());
    }

    #[test]
    fn test_decision_rule() {
        let model = NaiveBayesModel::from_parts(array![0.9], array![0.1], 0.5).unwrap();
        assert_eq!(model.predict(array![1u32].view()).unwrap(), Sentiment::Negative);

        let model = NaiveBayesModel::from_parts(array![0.1], array![0.9], 0.5).unwrap();
        assert_eq!(model.predict(array![1u32].view()).unwrap(), Sentiment::Positive);
    }

    #[test]
    fn test_ties_favor_positive() {
        let model = NaiveBayesModel::from_parts(array![0.5, 0.5], array![0.5, 0.5], 0.5).unwrap();
        let scores = model.scores(array![3u32, 1].view()).unwrap();
        assert_eq!(scores.negative, scores.positive);
        assert_eq!(scores.label(), Sentiment::Positive);
    }

    #[test]
    fn test_zero_probability_contributes_nothing() {
        let model = NaiveBayesModel::from_parts(array![0.0, 0.5], array![0.25, 0.5], 0.5).unwrap();
        let scores = model.scores(array![3u32, 1].view()).unwrap();

        assert!(scores.negative.is_finite());
        assert!((scores.negative - 2.0 * 0.5f64.ln()).abs() < 1e-12);
        assert!((scores.positive - (3.0 * 0.25f64.ln() + 2.0 * 0.5f64.ln())).abs() < 1e-12);
    }

    #[test]
    fn test_dimension_mismatch() {
        let model = NaiveBayesModel::from_parts(array![0.5, 0.5], array![0.5, 0.5], 0.5).unwrap();
        let err = model.predict(array![1u32].view()).unwrap_err();
        assert!(matches!(err, NaiveBayesError::DimensionMismatch { expected: 2, found: 1 }));
    }

    #[test]
    fn test_from_parts_validation() {
        assert!(NaiveBayesModel::from_parts(array![0.5], array![0.5, 0.5], 0.5).is_err());
        assert!(NaiveBayesModel::from_parts(array![0.5], array![0.5], 1.5).is_err());
        assert!(NaiveBayesModel::from_parts(array![f64::NAN], array![0.5], 0.5).is_err());
        assert!(NaiveBayesModel::from_parts(Array1::zeros(0), Array1::zeros(0), 0.5).is_err());

        // a negative entry would turn its log score into NaN
        assert!(matches!(
            NaiveBayesModel::from_parts(array![1.0, 0.0], array![-0.5, 0.5], 0.5),
            Err(NaiveBayesError::InvalidModel(_))
        ));
        assert!(matches!(
            NaiveBayesModel::from_parts(array![1.5, 0.0], array![0.5, 0.5], 0.5),
            Err(NaiveBayesError::InvalidModel(_))
        ));
        assert!(NaiveBayesModel::from_parts(array![1.0, 0.0], array![0.0, 1.0], 0.5).is_ok());
    }

    #[test]
    fn test_predict_batch_matches_single() {
        let features =
            feature_matrix_from_rows(&[vec![5, 0, 1], vec![0, 4, 1], vec![3, 1, 0], vec![0, 2, 2]])
                .unwrap();
        let labels = labels_from_ints(&[0, 1, 0, 1]).unwrap();
        let model = trainer(SmoothingMode::Laplace).train(&features, &labels).unwrap();

        let batch = model.predict_batch(&features).unwrap();
        for (row, predicted) in features.outer_iter().zip(&batch) {
            assert_eq!(model.predict(row).unwrap(), *predicted);
        }
        assert_eq!(batch, labels);
    }
}
