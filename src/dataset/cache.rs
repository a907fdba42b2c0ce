//! Memoized loading of the dashboard dataset.

use std::sync::{Arc, Mutex};

use crate::{
    Error,
    dataset::{DataSource, Dataset},
};

/// Loads a [Dataset] from a [DataSource] once and hands out the same copy afterwards.
///
/// A failed load is not remembered, so the next call tries the source again.
/// A successful load is kept until [DatasetCache::reload] is called.
pub struct DatasetCache {
    source: Box<dyn DataSource>,
    dataset: Mutex<Option<Arc<Dataset>>>,
}

impl std::fmt::Debug for DatasetCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatasetCache")
            .field("source", &self.source.describe())
            .finish_non_exhaustive()
    }
}

impl DatasetCache {
    /// Create an empty cache over `source`. Nothing is loaded until [DatasetCache::get].
    pub fn new(source: impl DataSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            dataset: Mutex::new(None),
        }
    }

    /// Get the cached dataset, loading it from the source on first use.
    ///
    /// # Errors
    /// Returns [Error::DataUnavailable] if the source cannot be loaded, or
    /// [Error::DatasetLockError] if the cache lock is poisoned.
    pub fn get(&self) -> Result<Arc<Dataset>, Error> {
        let mut dataset = self
            .dataset
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire dataset lock: {error}"))
            .map_err(|_| Error::DatasetLockError)?;

        if let Some(dataset) = dataset.as_ref() {
            return Ok(dataset.clone());
        }

        let loaded = Arc::new(self.load()?);
        *dataset = Some(loaded.clone());

        Ok(loaded)
    }

    /// Discard the cached dataset and load it from the source again.
    ///
    /// The previous dataset is kept if the new load fails.
    ///
    /// # Errors
    /// Returns [Error::DataUnavailable] if the source cannot be loaded, or
    /// [Error::DatasetLockError] if the cache lock is poisoned.
    pub fn reload(&self) -> Result<Arc<Dataset>, Error> {
        let mut dataset = self
            .dataset
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire dataset lock: {error}"))
            .map_err(|_| Error::DatasetLockError)?;

        let loaded = Arc::new(self.load()?);
        *dataset = Some(loaded.clone());

        Ok(loaded)
    }

    fn load(&self) -> Result<Dataset, Error> {
        let description = self.source.describe();

        let dataset = self
            .source
            .load()
            .inspect_err(|error| tracing::error!("could not load dataset from {description}: {error}"))?;

        tracing::info!(
            "Loaded {} rows and {} columns from {description}",
            dataset.len(),
            dataset.columns().len()
        );

        Ok(dataset)
    }
}
