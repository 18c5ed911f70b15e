use std::path::PathBuf;

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use seisops::{logging, report};
use seisops_core::config::expand_home;

/// Regenerate station keyfiles from the master station list.
#[derive(Parser)]
#[command(name = "write-keyfiles", version)]
struct Cli {
    /// Master station list (overrides keyfiles.master_list)
    #[arg(long)]
    master_list: Option<PathBuf>,

    /// Directory holding the station_* keyfiles (overrides keyfiles.key_dir)
    #[arg(long)]
    key_dir: Option<PathBuf>,

    #[arg(long)]
    config: Option<String>,
}

fn main() -> anyhow::Result<()> {
    logging::init_stderr();
    let cli = Cli::parse();

    let config = seisops::load_config(cli.config.as_deref()).context("loading configuration")?;
    let master_list = cli
        .master_list
        .unwrap_or_else(|| expand_home(&config.keyfiles.master_list));
    let key_dir = cli
        .key_dir
        .unwrap_or_else(|| expand_home(&config.keyfiles.key_dir));

    let run = seisops_keyfiles::generate(&master_list, &key_dir, Local::now().naive_local())
        .with_context(|| format!("generating keyfiles in {}", key_dir.display()))?;

    print!("{}", report::keyfile_summary(&run, &master_list));
    Ok(())
}
