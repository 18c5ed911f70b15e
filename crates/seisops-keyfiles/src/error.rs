use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeyfileError {
    /// File-system failure on a specific path.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid keyfile pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

impl KeyfileError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| KeyfileError::Io { path, source }
    }
}

pub type Result<T> = std::result::Result<T, KeyfileError>;
