//! On-disk model store.
//!
//! A store is a directory holding exactly one model as three NumPy `.npy`
//! arrays plus a `readme.txt` recording when it was written. Every save
//! overwrites the previous model. The store does no locking: training and
//! prediction against the same directory must be serialized by the caller.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use ndarray::{arr0, Array, Array0, Array1, Dimension};
use ndarray_npy::{ReadNpyError, ReadNpyExt, WriteNpyError, WriteNpyExt};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::classifiers::naive_bayes::{NaiveBayesError, NaiveBayesModel};

pub const PROB_NEG_FILE: &str = "prob_neg_vector.npy";
pub const PROB_POS_FILE: &str = "prob_pos_vector.npy";
pub const PRIOR_FILE: &str = "prior_sentiment.npy";
pub const README_FILE: &str = "readme.txt";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("The classifier has not been trained yet ({} is missing)", .0.display())]
    NotTrained(PathBuf),

    #[error("I/O error on {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("Failed to read array from {}: {source}", path.display())]
    ReadArray { path: PathBuf, source: ReadNpyError },

    #[error("Failed to write array to {}: {source}", path.display())]
    WriteArray { path: PathBuf, source: WriteNpyError },

    #[error("Stored model is invalid: {0}")]
    InvalidModel(#[from] NaiveBayesError),
}

#[derive(Debug, Clone)]
pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `true` when all three model arrays are present.
    pub fn is_trained(&self) -> bool {
        self.first_missing().is_none()
    }

    fn first_missing(&self) -> Option<PathBuf> {
        [PROB_NEG_FILE, PROB_POS_FILE, PRIOR_FILE]
            .iter()
            .map(|name| self.dir.join(name))
            .find(|path| !path.is_file())
    }

    /// Write `model`, replacing whatever model the store held before.
    pub fn save(&self, model: &NaiveBayesModel) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;

        self.write_array(PROB_NEG_FILE, model.prob_neg())?;
        self.write_array(PROB_POS_FILE, model.prob_pos())?;
        self.write_array(PRIOR_FILE, &arr0(model.prior()))?;

        let readme = self.dir.join(README_FILE);
        let notes = format!("This model is trained on {}\n", OffsetDateTime::now_utc());
        fs::write(&readme, notes).map_err(|source| StoreError::Io { path: readme, source })?;

        info!("Saved model ({} features) to {}", model.vocab_size(), self.dir.display());
        Ok(())
    }

    /// Read the stored model back.
    ///
    /// Returns [`StoreError::NotTrained`] if any of the three arrays is absent;
    /// nothing is returned unless all three were read and form a valid model.
    pub fn load(&self) -> Result<NaiveBayesModel, StoreError> {
        if let Some(path) = self.first_missing() {
            return Err(StoreError::NotTrained(path));
        }

        let prob_neg: Array1<f64> = self.read_array(PROB_NEG_FILE)?;
        let prob_pos: Array1<f64> = self.read_array(PROB_POS_FILE)?;
        let prior: Array0<f64> = self.read_array(PRIOR_FILE)?;

        let model = NaiveBayesModel::from_parts(prob_neg, prob_pos, prior.into_scalar())?;
        debug!("Loaded model ({} features) from {}", model.vocab_size(), self.dir.display());
        Ok(model)
    }

    fn write_array<D: Dimension>(&self, name: &str, array: &Array<f64, D>) -> Result<(), StoreError> {
        let path = self.dir.join(name);
        let file = File::create(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;

        let mut writer = BufWriter::new(file);
        if let Err(source) = array.write_npy(&mut writer) {
            return Err(StoreError::WriteArray { path, source });
        }
        writer.flush().map_err(|source| StoreError::Io { path, source })
    }

    fn read_array<D: Dimension>(&self, name: &str) -> Result<Array<f64, D>, StoreError> {
        let path = self.dir.join(name);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotTrained(path));
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        Array::<f64, D>::read_npy(BufReader::new(file))
            .map_err(|source| StoreError::ReadArray { path, source })
    }
}
