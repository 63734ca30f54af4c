use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::data::Dataset;

/// Loads and parses a dataset from a JSON file.
///
/// The file holds an object with an `experiments` array, each entry carrying
/// `temperature`, `initial_concentration`, `time` and `concentration`.
///
/// # Arguments
///
/// * `path` - Path to the JSON file containing the dataset
///
/// # Errors
///
/// This function will return an error if:
/// * The file cannot be found or opened (`IOError::FileNotFound`)
/// * The file contents cannot be parsed as valid JSON or violate the experiment
///   checks, such as mismatched series lengths (`IOError::JsonParseError`)
pub fn load_dataset(path: impl Into<PathBuf>) -> Result<Dataset, IOError> {
    let path = path.into();
    let file = std::fs::File::open(path).map_err(IOError::FileNotFound)?;
    serde_json::from_reader(file).map_err(IOError::JsonParseError)
}

/// Saves a dataset to a JSON file.
///
/// # Arguments
///
/// * `path` - Path to the JSON file to write
/// * `dataset` - The dataset to save
pub fn save_dataset(path: impl Into<PathBuf>, dataset: &Dataset) -> Result<(), IOError> {
    save_json(path, dataset)
}

/// Serializes any value as pretty-printed JSON to a file.
///
/// Used for fit reports and datasets alike.
pub fn save_json<T: Serialize>(path: impl Into<PathBuf>, value: &T) -> Result<(), IOError> {
    let path = path.into();
    let file = std::fs::File::create(path).map_err(IOError::FileNotFound)?;
    serde_json::to_writer_pretty(file, value).map_err(IOError::JsonParseError)
}

/// Represents errors that can occur during dataset and report I/O operations.
#[derive(Error, Debug)]
pub enum IOError {
    /// Indicates that the specified file could not be found, opened or created.
    #[error("File not found: {0}")]
    FileNotFound(#[from] std::io::Error),

    /// Indicates that the file contents could not be parsed or serialized as JSON.
    #[error("Failed to parse JSON: {0}")]
    JsonParseError(#[from] serde_json::Error),
}
