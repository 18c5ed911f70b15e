use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StationError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed inventory XML.
    #[error("Inventory XML error: {0}")]
    Xml(String),

    /// A coordinate element did not hold a number.
    #[error("Invalid {field} `{value}` for station {station}")]
    InvalidCoordinate {
        station: String,
        field: &'static str,
        value: String,
    },

    #[error("Invalid timestamp `{0}`")]
    InvalidTime(String),

    #[error("Invalid channel regex: {0}")]
    Regex(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, StationError>;
