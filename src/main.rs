use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};

use nb_sentiment::config::Config;
use nb_sentiment::logging::{setup_logger, Logger};
use nb_sentiment::options::{Cli, Command};
use nb_sentiment::results::{CrossValidationRecord, ExperimentRecord, ResultLogger};
use nb_sentiment::{
    cross_validate, dataset, evaluate, Dataset, ModelStore, NaiveBayes, Sentiment,
};

#[derive(Serialize)]
struct Prediction {
    row: usize,
    label: Sentiment,
    score_neg: f64,
    score_pos: f64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli.config).context("Failed to load configuration")?;

    setup_logger(cli.log_level.as_deref().unwrap_or(&config.logging.level));
    info!("Configuration: {}", config);

    let name = cli.command.name();
    Logger::with_span(name, || run(cli.command, &config))
}

fn run(command: Command, config: &Config) -> Result<()> {
    let store = ModelStore::new(&config.model.dir);
    let results = ResultLogger::new(&config.results.path, &config.results.cv_path);

    match command {
        Command::Train { data, smoothing } => {
            let dataset = Dataset::from_csv(&data)?;
            let trainer = NaiveBayes::new(smoothing.unwrap_or(config.training.smoothing));
            let model = trainer.train(dataset.features(), dataset.labels())?;
            store.save(&model)?;
            println!(
                "{}",
                serde_json::json!({
                    "model_dir": store.dir(),
                    "documents": dataset.len(),
                    "vocabulary_size": model.vocab_size(),
                    "prior": model.prior(),
                })
            );
        }

        Command::Predict { input } => {
            let model = store.load()?;
            let (vocabulary, features) = dataset::read_feature_rows(&input)?;
            if vocabulary.len() != model.vocab_size() {
                bail!(
                    "{} has {} feature columns but the model was trained on {}",
                    input.display(),
                    vocabulary.len(),
                    model.vocab_size()
                );
            }

            let scorer = model.scorer();
            for (row, x) in features.outer_iter().enumerate() {
                let scores = scorer.scores(x)?;
                let prediction = Prediction {
                    row,
                    label: scores.label(),
                    score_neg: scores.negative,
                    score_pos: scores.positive,
                };
                println!("{}", serde_json::to_string(&prediction)?);
            }
        }

        Command::Evaluate {
            data,
            smoothing,
            test_size,
            seed,
            feature_type,
        } => {
            let smoothing = smoothing.unwrap_or(config.training.smoothing);
            let dataset = Dataset::from_csv(&data)?;
            let (train, test) = dataset.split(
                test_size.unwrap_or(config.training.test_size),
                seed.unwrap_or(config.training.random_state),
            )?;

            let model = NaiveBayes::new(smoothing).train(train.features(), train.labels())?;
            store.save(&model)?;
            // score what was persisted, not the in-memory copy
            let model = store.load()?;

            let evaluation = evaluate(&model, test.features(), test.labels())?;
            if evaluation.negative.total == 0 || evaluation.positive.total == 0 {
                warn!("Test partition is missing a class; its accuracy is reported as 0");
            }

            let record = ExperimentRecord {
                feature_type: feature_type.unwrap_or_else(|| config.training.feature_type.clone()),
                vocabulary_size: dataset.vocab_size(),
                training_size: train.len(),
                smoothing,
                neg_accuracy: evaluation.neg_accuracy(),
                pos_accuracy: evaluation.pos_accuracy(),
            };
            results.log_experiment(&record)?;
            println!("{}", serde_json::to_string(&record)?);
        }

        Command::CrossValidate {
            data,
            smoothing,
            folds,
            fold_type,
            feature_type,
        } => {
            let dataset = Dataset::from_csv(&data)?;
            let trainer = NaiveBayes::new(smoothing.unwrap_or(config.training.smoothing))
                .with_progress(false);

            let cv = cross_validate(
                &trainer,
                dataset.features(),
                dataset.labels(),
                folds.unwrap_or(config.training.folds),
                fold_type.unwrap_or(config.training.fold_type),
            )?;

            let record = CrossValidationRecord::new(
                feature_type.unwrap_or_else(|| config.training.feature_type.clone()),
                &cv,
            );
            results.log_cross_validation(&record)?;
            println!("{}", serde_json::to_string(&record)?);
        }
    }

    Ok(())
}
