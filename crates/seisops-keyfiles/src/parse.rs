//! Master station list reader.
//!
//! Format, one station per line, whitespace separated:
//!
//! ```text
//! # keyfile       net sta   arclink  access  global  scautopick  [ADD2PIPELINE module profile]...
//! station_GE_APE  GE  APE   NONE     gfz     bb      bb_default  ADD2PIPELINE NLoB_apick lowband
//! ```

use std::path::Path;

use tracing::{debug, warn};

use crate::error::{KeyfileError, Result};
use crate::types::{Binding, BindingSet, LoadNotice, Pipeline, SkippedLine};

pub const PIPELINE_KEYWORD: &str = "ADD2PIPELINE";
const MIN_COLUMNS: usize = 7;

/// Read and parse the master list at `path`.
pub fn load_bindings(path: &Path, known_modules: Vec<String>) -> Result<BindingSet> {
    let text = std::fs::read_to_string(path).map_err(KeyfileError::io(path))?;
    Ok(parse_bindings(&text, known_modules))
}

/// Parse master-list text. `known_modules` seeds the module list; modules
/// found in `ADD2PIPELINE` clauses are appended in first-seen order.
pub fn parse_bindings(text: &str, known_modules: Vec<String>) -> BindingSet {
    let mut set = BindingSet {
        modules: known_modules,
        ..BindingSet::default()
    };

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let cols: Vec<&str> = line.split_whitespace().collect();
        let Some(first) = cols.first() else {
            continue;
        };
        if first.starts_with('#') {
            continue;
        }
        if cols.len() < MIN_COLUMNS {
            debug!(line_no, "short line skipped");
            set.notices.push(LoadNotice::Skipped {
                line: line.trim_end().to_string(),
            });
            set.skipped.push(SkippedLine {
                line_no,
                content: line.to_string(),
                reason: format!("expected at least {MIN_COLUMNS} columns, found {}", cols.len()),
            });
            continue;
        }

        if set.contains(cols[0]) {
            debug!(keyfile = cols[0], "multiple definition");
            set.notices.push(LoadNotice::MultipleDefinition {
                keyfile: cols[0].to_string(),
            });
            set.duplicates.push(cols[0].to_string());
        }

        let pipelines = parse_pipelines(line, line_no);
        for p in &pipelines {
            if !set.modules.contains(&p.module) {
                debug!(module = %p.module, "new pipeline module");
                set.notices.push(LoadNotice::NewModule {
                    module: p.module.clone(),
                });
                set.modules.push(p.module.clone());
            }
        }

        set.bindings.push(Binding {
            keyfile: cols[0].to_string(),
            network: cols[1].to_string(),
            station: cols[2].to_string(),
            arclink: cols[3].to_string(),
            arclink_access: cols[4].to_string(),
            global_profile: cols[5].to_string(),
            scautopick_profile: cols[6].to_string(),
            pipelines,
        });
    }

    set
}

/// Every `ADD2PIPELINE <module> <profile>` clause on `line`.
fn parse_pipelines(line: &str, line_no: usize) -> Vec<Pipeline> {
    line.split(PIPELINE_KEYWORD)
        .skip(1)
        .filter_map(|clause| {
            let mut words = clause.split_whitespace();
            match (words.next(), words.next()) {
                (Some(module), Some(profile)) => Some(Pipeline {
                    module: module.to_string(),
                    profile: profile.to_string(),
                }),
                _ => {
                    warn!(line_no, "incomplete {PIPELINE_KEYWORD} clause ignored");
                    None
                }
            }
        })
        .collect()
}
