use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::classifiers::naive_bayes::{NaiveBayesError, SmoothingMode};
use crate::evaluation::FoldType;

#[derive(Parser, Debug)]
#[command(name = "nb-sentiment")]
#[command(author, version, about = "Binary Naive Bayes sentiment classifier")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file, looked up with any supported extension
    #[arg(short, long, global = true, default_value = "config")]
    pub config: String,

    /// Log level: trace, debug, info, warn or error
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Flags left unset fall back to the configuration file.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Train on a labeled dataset and save the model
    Train {
        /// Labeled CSV: label column followed by one count column per term
        #[arg(short, long)]
        data: PathBuf,

        /// Smoothing: laplace or none
        #[arg(short, long, value_parser = parse_smoothing)]
        smoothing: Option<SmoothingMode>,
    },

    /// Classify count vectors with the stored model
    Predict {
        /// Unlabeled CSV with one count column per term
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Train on a seeded split, then report per-class test accuracy
    Evaluate {
        #[arg(short, long)]
        data: PathBuf,

        #[arg(short, long, value_parser = parse_smoothing)]
        smoothing: Option<SmoothingMode>,

        /// Fraction of documents held out for testing
        #[arg(long)]
        test_size: Option<f64>,

        /// Shuffle seed
        #[arg(long)]
        seed: Option<u64>,

        /// Free-form feature label written to the results log
        #[arg(long)]
        feature_type: Option<String>,
    },

    /// Run k-fold cross-validation
    CrossValidate {
        #[arg(short, long)]
        data: PathBuf,

        #[arg(short, long, value_parser = parse_smoothing)]
        smoothing: Option<SmoothingMode>,

        #[arg(short = 'k', long)]
        folds: Option<usize>,

        /// consecutive or round-robin; consecutive folds need shuffled labels
        #[arg(long, value_parser = parse_fold_type)]
        fold_type: Option<FoldType>,

        #[arg(long)]
        feature_type: Option<String>,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Train { .. } => "train",
            Command::Predict { .. } => "predict",
            Command::Evaluate { .. } => "evaluate",
            Command::CrossValidate { .. } => "cross-validate",
        }
    }
}

fn parse_smoothing(s: &str) -> Result<SmoothingMode, String> {
    s.parse().map_err(|e: NaiveBayesError| e.to_string())
}

fn parse_fold_type(s: &str) -> Result<FoldType, String> {
    s.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate_flags() {
        let cli = Cli::try_parse_from([
            "nb-sentiment",
            "--log-level",
            "debug",
            "evaluate",
            "--data",
            "train.csv",
            "--smoothing",
            "None",
            "--test-size",
            "0.25",
        ])
        .unwrap();

        assert_eq!(cli.config, "config");
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        match cli.command {
            Command::Evaluate { data, smoothing, test_size, seed, .. } => {
                assert_eq!(data, PathBuf::from("train.csv"));
                assert_eq!(smoothing, Some(SmoothingMode::None));
                assert_eq!(test_size, Some(0.25));
                assert_eq!(seed, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_cross_validate_flags() {
        let cli = Cli::try_parse_from([
            "nb-sentiment",
            "cross-validate",
            "-d",
            "train.csv",
            "-k",
            "5",
            "--fold-type",
            "consecutive",
            "--config",
            "other",
        ])
        .unwrap();

        assert_eq!(cli.config, "other");
        assert_eq!(cli.command.name(), "cross-validate");
        match cli.command {
            Command::CrossValidate { folds, fold_type, .. } => {
                assert_eq!(folds, Some(5));
                assert_eq!(fold_type, Some(FoldType::Consecutive));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_unknown_values_rejected() {
        assert!(Cli::try_parse_from(["nb-sentiment", "train", "-d", "x.csv", "-s", "lidstone"]).is_err());
        assert!(Cli::try_parse_from(["nb-sentiment", "cross-validate", "-d", "x.csv", "--fold-type", "random"]).is_err());
    }
}
