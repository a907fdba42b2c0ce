//! Where datasets come from.

use std::{fs::File, io::BufReader, path::PathBuf};

use crate::{
    Error,
    dataset::{Dataset, parse_csv},
};

/// Supplies the raw dataset for the dashboard.
///
/// The schema is whatever the source contains; it is only known once loaded.
pub trait DataSource: Send + Sync {
    /// Read the full dataset.
    ///
    /// # Errors
    /// Returns [Error::DataUnavailable] if the source cannot be read or parsed.
    fn load(&self) -> Result<Dataset, Error>;

    /// A short human readable description of the source, used in logs.
    fn describe(&self) -> String;
}

/// A CSV file on disk.
#[derive(Debug, Clone)]
pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    /// Create a source that reads the CSV file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DataSource for CsvFileSource {
    fn load(&self) -> Result<Dataset, Error> {
        let file = File::open(&self.path).map_err(|error| {
            Error::DataUnavailable(format!("could not open {}: {error}", self.path.display()))
        })?;

        parse_csv(BufReader::new(file))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use crate::Error;

    use super::{CsvFileSource, DataSource};

    #[test]
    fn missing_file_is_unavailable_data() {
        let source = CsvFileSource::new("this/file/does/not/exist.csv");

        let result = source.load();

        assert!(matches!(result, Err(Error::DataUnavailable(_))));
    }

    #[test]
    fn reads_csv_file_from_disk() {
        let path = std::env::temp_dir().join(format!(
            "transactions_dashboard_source_test_{}.csv",
            std::process::id()
        ));
        std::fs::write(&path, "kind,amount\nA,1\nB,-2\n").unwrap();
        let source = CsvFileSource::new(&path);

        let dataset = source.load().unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(source.describe(), path.display().to_string());
    }
}
