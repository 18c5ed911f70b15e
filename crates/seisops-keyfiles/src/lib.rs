//! `seisops-keyfiles`: regenerate SeisComP station keyfiles from the master
//! station list.
//!
//! A run backs up the current `station_*_*` files, rewrites one keyfile per
//! master-list row and reports stations that exist on disk but not in the
//! list, plus keyfiles defined more than once.

pub mod error;
pub mod parse;
pub mod types;
pub mod writer;

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::warn;

pub use error::{KeyfileError, Result};
pub use types::{
    Binding, BindingSet, LoadNotice, Pipeline, SkippedLine, WriteKind, WrittenKeyfile,
};

/// Outcome of one generator run.
#[derive(Debug, Clone)]
pub struct KeyfileReport {
    pub backup_dir: PathBuf,
    /// Keyfiles found before writing.
    pub existing: Vec<String>,
    pub bindings: BindingSet,
    pub written: Vec<WrittenKeyfile>,
    /// Existing keyfiles absent from the master list.
    pub missing: Vec<String>,
}

/// Backup, load, write, summarise.
pub fn generate(master_list: &Path, key_dir: &Path, now: NaiveDateTime) -> Result<KeyfileReport> {
    let existing = writer::existing_keyfiles(key_dir)?;
    let backup_dir = writer::backup_existing(key_dir, &existing, now)?;

    let bindings = parse::load_bindings(master_list, Vec::new())?;
    let written = writer::write_keyfiles(key_dir, &bindings, &existing)?;

    let missing = writer::missing_from_master(&existing, &bindings);
    for name in &missing {
        warn!(
            "Old keyfile {name} is missing in file {}",
            master_list.display()
        );
    }

    Ok(KeyfileReport {
        backup_dir,
        existing,
        bindings,
        written,
        missing,
    })
}
