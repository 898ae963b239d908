//! Readers for the SER open data: the segments CSV and the shapefile archive.

use std::{io, path::PathBuf};
use thiserror::Error;

mod config;
mod geometry;
pub mod models;
mod records;

pub use config::*;
pub use geometry::*;
pub use models::*;
pub use records::*;

/// Fatal problem with one of the input files. Aborts the run.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("Could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("Csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Shapefile error: {0}")]
    Shapefile(#[from] shapefile::Error),
    #[error("Dbase error: {0}")]
    Dbase(#[from] shapefile::dbase::Error),
    #[error("Csv file {path} is missing column {column:?}")]
    MissingColumn { column: String, path: PathBuf },
    #[error("Could not find layer {layer:?} in {path}")]
    LayerNotFound { layer: String, path: PathBuf },
    #[error("Delimiter {0:?} is not a single-byte character")]
    InvalidDelimiter(char),
    #[error("Invalid configuration {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl InputError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}
