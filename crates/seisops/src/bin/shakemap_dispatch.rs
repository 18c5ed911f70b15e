use std::sync::Arc;

use anyhow::Context;
use clap::error::ErrorKind;
use clap::Parser;
use seisops::{args, logging};
use seisops_dispatch::{Dispatcher, SubRunStatus, TriggerRequest};
use tracing::info;

/// Fan one SeisComP event alert out into delayed ShakeMap runs.
#[derive(Parser)]
#[command(name = "shakemap-dispatch", version)]
struct Cli {
    /// Config file (default: $SEISOPS_CONFIG, then ~/.seisops/seisops.toml)
    #[arg(long)]
    config: Option<String>,

    /// Alert arguments as passed by SeisComP: <message> <flag> <event_id> ...
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    alert: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("Starting ShakeMap processing script...");

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => usage_error(e.to_string().lines().next()),
    };
    let Some(event_id) = args::event_id(&cli.alert) else {
        usage_error(None);
    };

    let config = seisops::load_config(cli.config.as_deref()).context("loading configuration")?;
    let _guard = logging::init_file(&config.dispatch.log_path())?;

    let request = TriggerRequest::new(event_id, config.dispatch.delays.clone());
    let dispatcher = Arc::new(Dispatcher::from_config(&config.dispatch));
    let report = dispatcher.dispatch(request).await;

    info!(
        succeeded = report.count(SubRunStatus::Succeeded),
        failed = report.count(SubRunStatus::Failed),
        deduplicated = report.count(SubRunStatus::Deduplicated),
        "dispatch finished"
    );
    Ok(())
}

/// Argument problems exit 1 with the usage text on stdout.
fn usage_error(detail: Option<&str>) -> ! {
    if let Some(detail) = detail {
        println!("{detail}");
    }
    println!("{}", args::DISPATCH_USAGE);
    std::process::exit(1);
}
