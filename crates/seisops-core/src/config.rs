use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Refinement passes after an event, in seconds from dispatcher start.
pub const DEFAULT_DELAYS: [u64; 7] = [5, 10, 20, 30, 40, 50, 60];
pub const DEFAULT_WORKERS: usize = 2;
pub const DEFAULT_PACING_SECS: u64 = 1;
pub const MARKER_SUBDIR: &str = "pyshakemap_flags";

/// Placeholder substituted with the event id in tool arguments.
pub const EVENT_ID_PLACEHOLDER: &str = "{event_id}";
/// Placeholder substituted with the resolved origin id in tool arguments.
pub const ORIGIN_ID_PLACEHOLDER: &str = "{origin_id}";

const SHAKEMAP_PYTHON: &str = "/home/sysop/miniconda/bin/python";
const SHAKEMAP_SCRIPT: &str = "/home/sysop/.seiscomp/scripts/run_events/make_rupturejson_and_allxmlinput_fromdb_call_shake.py";
const DEFAULT_MASTER_LIST: &str = "/home/sysop/svn/stations/SC3_MasterStationList.txt";

/// Top-level config (seisops.toml + SEISOPS_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeisopsConfig {
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub keyfiles: KeyfilesConfig,
}

/// Settings for the delayed ShakeMap dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    #[serde(default = "default_delays")]
    pub delays: Vec<u64>,
    /// Maximum number of sub-runs holding a worker slot at once.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Gap between successive worker submissions.
    #[serde(default = "default_pacing_secs")]
    pub pacing_secs: u64,
    /// Directory holding one `<composite_id>.flag` file per claimed sub-run.
    #[serde(default = "default_marker_dir")]
    pub marker_dir: String,
    #[serde(default = "default_log_file")]
    pub log_file: String,
    /// Kill external tools after this many seconds. Unset means wait forever.
    #[serde(default)]
    pub tool_timeout_secs: Option<u64>,
    #[serde(default = "default_resolver")]
    pub resolver: CommandConfig,
    #[serde(default = "default_generator")]
    pub generator: CommandConfig,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            delays: default_delays(),
            workers: DEFAULT_WORKERS,
            pacing_secs: DEFAULT_PACING_SECS,
            marker_dir: default_marker_dir(),
            log_file: default_log_file(),
            tool_timeout_secs: None,
            resolver: default_resolver(),
            generator: default_generator(),
        }
    }
}

impl DispatchConfig {
    pub fn marker_path(&self) -> PathBuf {
        expand_home(&self.marker_dir)
    }

    pub fn log_path(&self) -> PathBuf {
        expand_home(&self.log_file)
    }
}

/// An external program and its argument template.
///
/// Arguments may contain [`EVENT_ID_PLACEHOLDER`] and
/// [`ORIGIN_ID_PLACEHOLDER`]; they are substituted per argument at call time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Settings for the station keyfile generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyfilesConfig {
    #[serde(default = "default_master_list")]
    pub master_list: String,
    /// Directory containing the `station_<NET>_<STA>` keyfiles.
    #[serde(default = "default_key_dir")]
    pub key_dir: String,
}

impl Default for KeyfilesConfig {
    fn default() -> Self {
        Self {
            master_list: default_master_list(),
            key_dir: default_key_dir(),
        }
    }
}

fn default_delays() -> Vec<u64> {
    DEFAULT_DELAYS.to_vec()
}
fn default_workers() -> usize {
    DEFAULT_WORKERS
}
fn default_pacing_secs() -> u64 {
    DEFAULT_PACING_SECS
}
fn default_marker_dir() -> String {
    std::env::temp_dir()
        .join(MARKER_SUBDIR)
        .to_string_lossy()
        .into_owned()
}
fn default_log_file() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.seiscomp/log/scalert-pyshakemap.log", home)
}
fn default_resolver() -> CommandConfig {
    CommandConfig {
        program: "scxmldump".to_string(),
        args: vec![
            "-E".to_string(),
            EVENT_ID_PLACEHOLDER.to_string(),
            "-f".to_string(),
        ],
    }
}
fn default_generator() -> CommandConfig {
    let args = [
        "exec",
        SHAKEMAP_PYTHON,
        SHAKEMAP_SCRIPT,
        "--origin_id",
        ORIGIN_ID_PLACEHOLDER,
        "--event_id",
        EVENT_ID_PLACEHOLDER,
        "--shakemap_flag",
        "True",
    ];
    CommandConfig {
        program: "seiscomp".to_string(),
        args: args.iter().map(|a| a.to_string()).collect(),
    }
}
fn default_master_list() -> String {
    DEFAULT_MASTER_LIST.to_string()
}
fn default_key_dir() -> String {
    ".".to_string()
}

impl SeisopsConfig {
    /// Load config from a TOML file with SEISOPS_* env var overrides.
    ///
    /// The file is looked up in order:
    ///   1. Explicit path argument
    ///   2. `SEISOPS_CONFIG` env var
    ///   3. ~/.seisops/seisops.toml
    ///
    /// A missing file is not an error; every field has a default. Nested
    /// keys are separated by a double underscore, e.g.
    /// `SEISOPS_DISPATCH__WORKERS=3`.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = config_path
            .map(String::from)
            .or_else(|| std::env::var("SEISOPS_CONFIG").ok())
            .unwrap_or_else(default_config_path);
        tracing::debug!(path = %path, "loading configuration");

        let config: SeisopsConfig = Figment::new()
            .merge(Toml::file(expand_home(&path)))
            .merge(Env::prefixed("SEISOPS_").split("__"))
            .extract()
            .map_err(|e| CoreError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let dispatch = &self.dispatch;
        if dispatch.workers == 0 {
            return Err(CoreError::InvalidValue {
                field: "dispatch.workers",
                reason: "must be at least 1".to_string(),
            });
        }
        if dispatch.resolver.program.trim().is_empty() {
            return Err(CoreError::InvalidValue {
                field: "dispatch.resolver.program",
                reason: "must not be empty".to_string(),
            });
        }
        if dispatch.generator.program.trim().is_empty() {
            return Err(CoreError::InvalidValue {
                field: "dispatch.generator.program",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.seisops/seisops.toml", home)
}

/// Expand a leading `~/` against `$HOME`.
pub fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(rest)
        }
        None => PathBuf::from(path),
    }
}
