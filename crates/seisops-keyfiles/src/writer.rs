use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDateTime, Timelike};
use glob::Pattern;
use tracing::{debug, info};

use crate::error::{KeyfileError, Result};
use crate::types::{Binding, BindingSet, WriteKind, WrittenKeyfile};

/// File names treated as existing station keyfiles.
pub const KEYFILE_PATTERN: &str = "station_*_*";

/// Profile columns holding one of these are left out of the keyfile.
fn is_unset(value: &str) -> bool {
    matches!(value, "NONE" | "None" | "none")
}

/// Keyfile body for `binding`.
pub fn render_keyfile(binding: &Binding) -> String {
    let mut out = String::new();
    let profiles = [
        ("access", &binding.arclink_access),
        ("global", &binding.global_profile),
        ("scautopick", &binding.scautopick_profile),
    ];
    for (module, profile) in profiles {
        if !is_unset(profile) {
            out.push_str(&format!("{module}:{}\n", profile.trim()));
        }
    }
    for p in &binding.pipelines {
        out.push_str(&format!("{}:{}\n", p.module, p.profile));
    }
    out
}

/// `keyfile-backup-YYYY-MM-DD_H-M-S`; time fields are not zero-padded.
pub fn backup_dir_name(now: NaiveDateTime) -> String {
    format!(
        "keyfile-backup-{:04}-{:02}-{:02}_{}-{}-{}",
        now.year(),
        now.month(),
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    )
}

/// Names of the keyfiles currently in `dir`, sorted.
pub fn existing_keyfiles(dir: &Path) -> Result<Vec<String>> {
    let pattern = Pattern::new(KEYFILE_PATTERN)?;
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(KeyfileError::io(dir))? {
        let entry = entry.map_err(KeyfileError::io(dir))?;
        let is_file = entry
            .file_type()
            .map_err(KeyfileError::io(entry.path()))?
            .is_file();
        if !is_file {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if pattern.matches(name) {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

/// Copy every keyfile in `existing` into a fresh timestamped directory under
/// `dir`. Returns the backup directory.
pub fn backup_existing(dir: &Path, existing: &[String], now: NaiveDateTime) -> Result<PathBuf> {
    let backup = dir.join(backup_dir_name(now));
    std::fs::create_dir_all(&backup).map_err(KeyfileError::io(&backup))?;
    for name in existing {
        let from = dir.join(name);
        let to = backup.join(name);
        std::fs::copy(&from, &to).map_err(KeyfileError::io(&from))?;
        debug!(keyfile = %name, "backed up");
    }
    info!(
        count = existing.len(),
        "Backup old keyfiles in {} to {}",
        dir.display(),
        backup.display()
    );
    Ok(backup)
}

/// Write one keyfile per binding into `dir`. A later duplicate overwrites an
/// earlier one.
pub fn write_keyfiles(
    dir: &Path,
    set: &BindingSet,
    existing: &[String],
) -> Result<Vec<WrittenKeyfile>> {
    let mut written = Vec::with_capacity(set.bindings.len());
    for binding in &set.bindings {
        let kind = if existing.iter().any(|e| e == &binding.keyfile) {
            WriteKind::Updated
        } else {
            WriteKind::New
        };
        let path = dir.join(&binding.keyfile);
        std::fs::write(&path, render_keyfile(binding)).map_err(KeyfileError::io(&path))?;
        written.push(WrittenKeyfile {
            keyfile: binding.keyfile.clone(),
            kind,
        });
    }
    Ok(written)
}

/// Existing keyfiles with no row in the master list.
pub fn missing_from_master(existing: &[String], set: &BindingSet) -> Vec<String> {
    existing
        .iter()
        .filter(|name| !set.contains(name.trim()))
        .cloned()
        .collect()
}
