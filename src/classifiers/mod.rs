pub mod naive_bayes;

pub use naive_bayes::{
    LogScorer, NaiveBayes, NaiveBayesError, NaiveBayesModel, Scores, SmoothingMode,
};
