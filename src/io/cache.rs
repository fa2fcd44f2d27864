//! Prebuilt dataset store.
//!
//! Preparing the full history takes a while, so finished bundles are kept on
//! disk as JSON, one file per (split type, exogenous, detrend, mode, dataset)
//! combination. A missing file is reported as a not-found error so the
//! pipeline can fall back to a fresh computation.

use std::fs::{File, create_dir_all};
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

use crate::domain::{DatasetBundle, DatasetConfig, LoadOptions, SplitType};
use crate::error::AppError;

/// Identifies one prebuilt bundle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub split_type: SplitType,
    pub exogenous_vars: bool,
    pub detrend: bool,
    pub is_train: bool,
    pub dataset_name: String,
}

impl CacheKey {
    pub fn new(options: &LoadOptions, dataset_name: &str) -> Self {
        Self {
            split_type: options.split_type,
            exogenous_vars: options.exogenous_vars,
            detrend: options.detrend,
            is_train: options.is_train,
            dataset_name: dataset_name.to_string(),
        }
    }

    pub fn file_name(&self) -> String {
        format!(
            "{}_{}_exog{}_detrend{}_{}.json",
            self.dataset_name,
            self.split_type,
            u8::from(self.exogenous_vars),
            u8::from(self.detrend),
            if self.is_train { "train" } else { "test" },
        )
    }
}

/// Storage for prepared bundles.
pub trait BundleStore {
    /// Fetch a bundle; a missing entry is an error with `ErrorKind::NotFound`.
    fn load(&self, key: &CacheKey) -> Result<DatasetBundle, AppError>;
    fn save(&self, key: &CacheKey, bundle: &DatasetBundle) -> Result<(), AppError>;
}

/// One pretty-printed JSON file per key in a directory.
#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn for_dataset(config: &DatasetConfig) -> Self {
        Self::new(config.prebuilt_dir())
    }

    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(key.file_name())
    }
}

impl BundleStore for JsonStore {
    fn load(&self, key: &CacheKey) -> Result<DatasetBundle, AppError> {
        let path = self.path_for(key);
        let file = File::open(&path)
            .map_err(|e| AppError::from_io(&e, format!("prebuilt bundle '{}'", path.display())))?;
        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| AppError::data(format!("Invalid prebuilt bundle '{}': {e}", path.display())))
    }

    fn save(&self, key: &CacheKey, bundle: &DatasetBundle) -> Result<(), AppError> {
        create_dir_all(&self.dir)
            .map_err(|e| AppError::io(format!("Failed to create '{}': {e}", self.dir.display())))?;
        let path = self.path_for(key);
        let file = File::create(&path)
            .map_err(|e| AppError::io(format!("Failed to create prebuilt bundle '{}': {e}", path.display())))?;
        serde_json::to_writer_pretty(BufWriter::new(file), bundle)
            .map_err(|e| AppError::io(format!("Failed to write prebuilt bundle '{}': {e}", path.display())))?;
        tracing::info!(path = %path.display(), "saved prebuilt bundle");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ScalerKind, SplitArray, TrendSplit};
    use crate::math::Scaler;
    use nalgebra::DMatrix;

    fn key() -> CacheKey {
        CacheKey {
            split_type: SplitType::Multi,
            exogenous_vars: true,
            detrend: false,
            is_train: true,
            dataset_name: "gefcom".to_string(),
        }
    }

    #[test]
    fn file_name_encodes_every_key_field() {
        assert_eq!(key().file_name(), "gefcom_multi_exog1_detrend0_train.json");
    }

    #[test]
    fn missing_bundle_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = JsonStore::new(dir.path()).load(&key()).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn saved_bundle_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("prebuilt"));
        let x = DMatrix::from_row_slice(3, 1, &[1.0, 2.0, 4.0]);
        let bundle = DatasetBundle {
            train: SplitArray::Windowed(vec![x.clone(), x.clone()]),
            test: SplitArray::Contiguous(x.clone()),
            scaler: Some(Scaler::fit(&x, ScalerKind::Standard).unwrap()),
            trend: Some(TrendSplit {
                train: SplitArray::Contiguous(x.clone()),
                test: SplitArray::Contiguous(x),
            }),
        };

        store.save(&key(), &bundle).unwrap();
        assert_eq!(store.load(&key()).unwrap(), bundle);
    }

    #[test]
    fn corrupt_bundle_is_a_data_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        std::fs::write(store.path_for(&key()), "{not json").unwrap();
        let err = store.load(&key()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Data);
    }
}
