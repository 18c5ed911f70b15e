//! Console text printed by `write-keyfiles` and `station-select`.

use std::fmt::Write;
use std::path::Path;

use seisops_keyfiles::{KeyfileReport, WriteKind};
use seisops_stations::Selection;

/// Progress and summary for a keyfile run, in the order operators expect.
pub fn keyfile_summary(report: &KeyfileReport, master_list: &Path) -> String {
    let list = master_list.display();
    let backup = report.backup_dir.display();
    let mut out = String::new();

    let _ = writeln!(out, "Backup old keyfiles in current directory to {backup}");
    let _ = writeln!(out);
    let _ = writeln!(out, "Load bindings from {list}");
    for notice in &report.bindings.notices {
        let _ = writeln!(out, "{notice}");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Write new station-keyfiles");
    for written in &report.written {
        match written.kind {
            WriteKind::New => {
                let _ = writeln!(out, "Write  new      key file: {}", written.keyfile);
            }
            WriteKind::Updated => {
                let _ = writeln!(out, "Update existing key file: {}", written.keyfile);
            }
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Summary");
    let _ = writeln!(out, "=======");
    let _ = writeln!(out, "Missing stations in {list} :");
    for name in &report.missing {
        let _ = writeln!(out, "WARNING: Old keyfile {name:<20} is missing in file {list}");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Missing stations in {list} with multiple definitions:");
    for name in &report.bindings.duplicates {
        let _ = writeln!(out, "{name}");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Backup old keyfiles in current directory to {backup}");
    out
}

pub fn selection_summary(selection: &Selection, out_path: &Path) -> String {
    let mut out = format!(
        "Wrote {} SNCLs to {}\n",
        selection.sncls.len(),
        out_path.display()
    );
    if !selection.stations.is_empty() {
        let _ = writeln!(out, "Stations kept: {}", selection.stations.len());
    }
    out
}
