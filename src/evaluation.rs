//! Accuracy reporting and k-fold cross-validation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::classifiers::naive_bayes::{NaiveBayes, NaiveBayesError, NaiveBayesModel};
use crate::generic_types::{FeatureMatrix, Sentiment};

/// Predictions for one true class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClassTally {
    pub total: usize,
    pub correct: usize,
}

impl ClassTally {
    /// Fraction predicted correctly; 0.0 when the class has no documents.
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub negative: ClassTally,
    pub positive: ClassTally,
}

impl Evaluation {
    pub fn record(&mut self, truth: Sentiment, predicted: Sentiment) {
        let tally = match truth {
            Sentiment::Negative => &mut self.negative,
            Sentiment::Positive => &mut self.positive,
        };
        tally.total += 1;
        if truth == predicted {
            tally.correct += 1;
        }
    }

    pub fn neg_accuracy(&self) -> f64 {
        self.negative.accuracy()
    }

    pub fn pos_accuracy(&self) -> f64 {
        self.positive.accuracy()
    }

    pub fn accuracy(&self) -> f64 {
        let total = self.negative.total + self.positive.total;
        if total == 0 {
            0.0
        } else {
            (self.negative.correct + self.positive.correct) as f64 / total as f64
        }
    }
}

/// Score `model` against labeled documents.
pub fn evaluate(
    model: &NaiveBayesModel,
    features: &FeatureMatrix,
    labels: &[Sentiment],
) -> Result<Evaluation, NaiveBayesError> {
    if features.nrows() != labels.len() {
        return Err(NaiveBayesError::InputError(format!(
            "{} labels for {} documents",
            labels.len(),
            features.nrows()
        )));
    }

    let predictions = model.predict_batch(features)?;
    let mut evaluation = Evaluation::default();
    for (&truth, predicted) in labels.iter().zip(predictions) {
        evaluation.record(truth, predicted);
    }

    debug!(
        "Evaluated {} documents: neg {:.4}, pos {:.4}",
        labels.len(),
        evaluation.neg_accuracy(),
        evaluation.pos_accuracy()
    );
    Ok(evaluation)
}

/// How documents are dealt into folds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", try_from = "String")]
pub enum FoldType {
    /// Contiguous blocks of documents.
    ///
    /// On label-sorted data a training split can end up with a single class,
    /// in which case [`cross_validate`] fails with `EmptyClass`.
    Consecutive,
    /// Document `i` goes to fold `i % k`.
    RoundRobin,
}

impl FoldType {
    pub fn to_str(&self) -> &str {
        match self {
            FoldType::Consecutive => "consecutive",
            FoldType::RoundRobin => "round-robin",
        }
    }

    /// Fold index for each of `n` documents.
    pub fn assign(&self, n: usize, folds: usize) -> Vec<usize> {
        match self {
            FoldType::Consecutive => (0..n).map(|i| i * folds / n).collect(),
            FoldType::RoundRobin => (0..n).map(|i| i % folds).collect(),
        }
    }
}

impl FromStr for FoldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "consecutive" => Ok(FoldType::Consecutive),
            "round-robin" | "round_robin" => Ok(FoldType::RoundRobin),
            other => Err(format!(
                "unknown fold type `{}` (expected `consecutive` or `round-robin`)",
                other
            )),
        }
    }
}

impl TryFrom<String> for FoldType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for FoldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossValidation {
    pub fold_type: FoldType,
    /// Overall accuracy on each held-out fold.
    pub performances: Vec<f64>,
}

impl CrossValidation {
    pub fn average(&self) -> f64 {
        self.performances.iter().sum::<f64>() / self.performances.len() as f64
    }

    /// Population variance of the fold accuracies.
    pub fn variance(&self) -> f64 {
        let mean = self.average();
        self.performances.iter().map(|p| (p - mean).powi(2)).sum::<f64>()
            / self.performances.len() as f64
    }
}

/// Train on all folds but one and test on the held-out fold, once per fold.
pub fn cross_validate(
    trainer: &NaiveBayes,
    features: &FeatureMatrix,
    labels: &[Sentiment],
    folds: usize,
    fold_type: FoldType,
) -> Result<CrossValidation, NaiveBayesError> {
    let n = features.nrows();
    if labels.len() != n {
        return Err(NaiveBayesError::InputError(format!(
            "{} labels for {} documents",
            labels.len(),
            n
        )));
    }
    if folds < 2 || folds > n {
        return Err(NaiveBayesError::InputError(format!(
            "cannot split {} documents into {} folds",
            n, folds
        )));
    }

    let assignment = fold_type.assign(n, folds);
    let mut performances = Vec::with_capacity(folds);

    for fold in 0..folds {
        let (test_idx, train_idx): (Vec<usize>, Vec<usize>) =
            (0..n).partition(|&i| assignment[i] == fold);

        let train_x = features.select(ndarray::Axis(0), &train_idx);
        let train_y: Vec<Sentiment> = train_idx.iter().map(|&i| labels[i]).collect();
        let test_x = features.select(ndarray::Axis(0), &test_idx);
        let test_y: Vec<Sentiment> = test_idx.iter().map(|&i| labels[i]).collect();

        let model = trainer.train(&train_x, &train_y)?;
        let accuracy = evaluate(&model, &test_x, &test_y)?.accuracy();
        debug!("Fold {}/{}: accuracy {:.4}", fold + 1, folds, accuracy);
        performances.push(accuracy);
    }

    let cv = CrossValidation { fold_type, performances };
    info!(
        "{}-fold {} cross-validation: average {:.4}, variance {:.6}",
        folds,
        fold_type,
        cv.average(),
        cv.variance()
    );
    Ok(cv)
}
