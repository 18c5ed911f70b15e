use serde::{Deserialize, Serialize};

/// Extra module/profile pair attached with `ADD2PIPELINE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pipeline {
    pub module: String,
    pub profile: String,
}

/// One station row of the master station list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    /// Keyfile name, e.g. `station_GE_APE`.
    pub keyfile: String,
    pub network: String,
    pub station: String,
    /// Read for completeness; no longer written to keyfiles.
    pub arclink: String,
    pub arclink_access: String,
    pub global_profile: String,
    pub scautopick_profile: String,
    pub pipelines: Vec<Pipeline>,
}

impl std::fmt::Display for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:<20} {:<5} {:<7} {:<20} {:<20} {:<20} {:<20}",
            self.keyfile,
            self.network,
            self.station,
            self.arclink,
            self.arclink_access,
            self.global_profile,
            self.scautopick_profile
        )
    }
}

/// A line of the master list that was ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedLine {
    pub line_no: usize,
    pub content: String,
    pub reason: String,
}

/// Something worth telling the operator while the list is read, in file order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoadNotice {
    Skipped { line: String },
    MultipleDefinition { keyfile: String },
    NewModule { module: String },
}

impl std::fmt::Display for LoadNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadNotice::Skipped { line } => write!(f, "Missing information: Skip line - {line}"),
            LoadNotice::MultipleDefinition { keyfile } => {
                write!(f, "WARNING: Multiple Definition For Keyfile {keyfile}")
            }
            LoadNotice::NewModule { module } => write!(f, "Add new module: {module}"),
        }
    }
}

/// Everything read from the master station list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingSet {
    /// In file order; a keyfile defined twice appears twice.
    pub bindings: Vec<Binding>,
    /// Pipeline modules in first-seen order, seeded by the caller.
    pub modules: Vec<String>,
    /// Keyfile names defined more than once, in order of detection.
    pub duplicates: Vec<String>,
    pub skipped: Vec<SkippedLine>,
    pub notices: Vec<LoadNotice>,
}

impl BindingSet {
    pub fn contains(&self, keyfile: &str) -> bool {
        self.bindings.iter().any(|b| b.keyfile == keyfile)
    }
}

/// Whether a keyfile was created or replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteKind {
    New,
    Updated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrittenKeyfile {
    pub keyfile: String,
    pub kind: WriteKind,
}
