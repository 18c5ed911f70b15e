//! Shared plumbing for the `shakemap-dispatch`, `write-keyfiles` and
//! `station-select` binaries.

pub mod args;
pub mod logging;
pub mod report;

use seisops_core::SeisopsConfig;

/// Load settings; failures carry the config error code.
pub fn load_config(path: Option<&str>) -> anyhow::Result<SeisopsConfig> {
    SeisopsConfig::load(path).map_err(|e| anyhow::anyhow!("{}: {e}", e.code()))
}
