pub mod classifiers;
pub mod config;
pub mod dataset;
pub mod evaluation;
pub mod generic_types;
pub mod logging;
pub mod options;
pub mod results;
pub mod store;

pub use classifiers::{NaiveBayes, NaiveBayesError, NaiveBayesModel, Scores, SmoothingMode};
pub use dataset::{Dataset, DatasetError};
pub use evaluation::{cross_validate, evaluate, CrossValidation, Evaluation, FoldType};
pub use generic_types::{FeatureMatrix, Sentiment};
pub use store::{ModelStore, StoreError};
