use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use seisops::{logging, report};
use seisops_stations::{parse_time, read_inventory, select, write_sncls, Criteria};

const ACTIVE_AT_HINT: &str = "Could not parse --active-at. Use ISO like 2025-08-20T12:34:56";

/// Filter SNCLs within X km of an epicenter.
#[derive(Parser)]
#[command(name = "station-select", version)]
struct Cli {
    /// SC3ML or FDSN StationXML inventory
    #[arg(long)]
    inventory: PathBuf,

    /// Epicenter latitude
    #[arg(long, allow_negative_numbers = true)]
    lat: f64,

    /// Epicenter longitude
    #[arg(long, allow_negative_numbers = true)]
    lon: f64,

    #[arg(long)]
    radius_km: f64,

    /// Output file for the SNCL list
    #[arg(long)]
    out: PathBuf,

    /// Regex for the channel code, matched at its start (e.g. '^(HH|BH)..$')
    #[arg(long)]
    chan_regex: Option<String>,

    /// Require stations and channels active at this time (e.g. 2025-08-20T12:34:56)
    #[arg(long)]
    active_at: Option<String>,
}

fn main() -> anyhow::Result<()> {
    logging::init_stderr();
    let cli = Cli::parse();

    let mut criteria = Criteria::new(cli.lat, cli.lon, cli.radius_km);
    if let Some(pattern) = &cli.chan_regex {
        criteria = criteria.with_channel_pattern(pattern)?;
    }
    if let Some(raw) = &cli.active_at {
        let Ok(when) = parse_time(raw) else {
            bail!(ACTIVE_AT_HINT);
        };
        criteria = criteria.with_active_at(when);
    }

    let inventory = read_inventory(&cli.inventory)
        .with_context(|| format!("reading inventory {}", cli.inventory.display()))?;
    let selection = select(&inventory, &criteria);
    write_sncls(&cli.out, &selection)?;

    print!("{}", report::selection_summary(&selection, &cli.out));
    Ok(())
}
