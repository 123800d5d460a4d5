use std::fs;
use std::path::PathBuf;

use nb_sentiment::results::{ExperimentRecord, ResultLogger};
use nb_sentiment::store::PRIOR_FILE;
use nb_sentiment::{
    dataset, evaluate, Dataset, ModelStore, NaiveBayes, Sentiment, SmoothingMode, StoreError,
};
use tempfile::TempDir;

// "great" and "awful" separate the classes, "film" is noise.
fn write_reviews(dir: &TempDir) -> PathBuf {
    let mut content = String::from("label,great,awful,film\n");
    for i in 0..20 {
        if i % 2 == 0 {
            content.push_str(&format!("0,0,{},{}\n", 2 + i % 3, i % 2));
        } else {
            content.push_str(&format!("1.0,{},0,{}\n", 2 + i % 4, 1));
        }
    }
    let path = dir.path().join("reviews.csv");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_train_save_load_predict() {
    let dir = TempDir::new().unwrap();
    let data = Dataset::from_csv(write_reviews(&dir)).unwrap();
    let store = ModelStore::new(dir.path().join("models"));

    assert!(matches!(store.load(), Err(StoreError::NotTrained(_))));

    let model = NaiveBayes::new(SmoothingMode::Laplace)
        .with_progress(false)
        .train(data.features(), data.labels())
        .unwrap();
    store.save(&model).unwrap();

    let loaded = store.load().unwrap();
    assert_eq!(loaded, model);
    assert_eq!(loaded.prior(), 0.5);

    let input = dir.path().join("input.csv");
    fs::write(&input, "great,awful,film\n3,0,1\n0,4,0\n0,0,0\n").unwrap();
    let (_, features) = dataset::read_feature_rows(&input).unwrap();
    assert_eq!(
        loaded.predict_batch(&features).unwrap(),
        vec![Sentiment::Positive, Sentiment::Negative, Sentiment::Positive]
    );
}

#[test]
fn test_split_evaluate_and_log() {
    let dir = TempDir::new().unwrap();
    let data = Dataset::from_csv(write_reviews(&dir)).unwrap();
    let (train, test) = data.split(0.3, 42).unwrap();
    assert_eq!(test.len(), 6);

    let trainer = NaiveBayes::new(SmoothingMode::Laplace).with_progress(false);
    let model = trainer.train(train.features(), train.labels()).unwrap();
    let evaluation = evaluate(&model, test.features(), test.labels()).unwrap();
    assert_eq!(evaluation.accuracy(), 1.0);

    let logger = ResultLogger::new(dir.path().join("results.txt"), dir.path().join("cv.txt"));
    logger
        .log_experiment(&ExperimentRecord {
            feature_type: "unigram".to_string(),
            vocabulary_size: data.vocab_size(),
            training_size: train.len(),
            smoothing: trainer.smoothing(),
            neg_accuracy: evaluation.neg_accuracy(),
            pos_accuracy: evaluation.pos_accuracy(),
        })
        .unwrap();

    let line = fs::read_to_string(logger.results_path()).unwrap();
    assert!(line.starts_with("feature: unigram\t#feature: 3\ttraining size: 14\tsmooth: laplace"));
}

#[test]
fn test_corrupted_store_is_not_reported_as_untrained() {
    let dir = TempDir::new().unwrap();
    let data = Dataset::from_csv(write_reviews(&dir)).unwrap();
    let store = ModelStore::new(dir.path().join("models"));

    let model = NaiveBayes::new(SmoothingMode::None)
        .with_progress(false)
        .train(data.features(), data.labels())
        .unwrap();
    store.save(&model).unwrap();
    fs::write(store.dir().join(PRIOR_FILE), b"not an array").unwrap();

    match store.load() {
        Err(StoreError::NotTrained(_)) | Ok(_) => panic!("expected a read error"),
        Err(_) => {}
    }
}
