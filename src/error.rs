// SPDX-License-Identifier: MIT
//!
//! Error types
//!

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("input file NOT found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("unsupported spreadsheet format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("xlsx error: {0}")]
    Xlsx(#[from] umya_spreadsheet::reader::xlsx::XlsxError),

    #[error("workbook error: {0}")]
    Workbook(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("can not create output directory {}: {source}", .path.display())]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("no valid languages")]
    NoValidLanguages,

    #[error(transparent)]
    Provider(#[from] deepl_api::DeeplError),

    #[error("translation worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}
