//! The two external collaborators of a sub-run: the origin-resolution query
//! and the ShakeMap generator.
//!
//! Both sit behind traits so the engine can be driven by fakes in tests; the
//! production implementations run configured command lines.

use std::time::Duration;

use async_trait::async_trait;
use seisops_core::config::{CommandConfig, EVENT_ID_PLACEHOLDER, ORIGIN_ID_PLACEHOLDER};

use crate::error::Result;
use crate::exec::{render_args, run_command, ExecResult};

/// Line marker of the preferred-origin field in the resolution output.
pub const PREFERRED_ORIGIN_MARKER: &str = "<preferredOriginID>";

/// Queries the event database for an event's parameters.
#[async_trait]
pub trait OriginResolver: Send + Sync {
    /// Dump the event; the preferred origin is parsed from stdout.
    async fn query(&self, event_id: &str) -> Result<ExecResult>;
}

/// Runs one ShakeMap pass.
#[async_trait]
pub trait MapGenerator: Send + Sync {
    async fn generate(&self, origin_id: &str, sub_run_id: &str) -> Result<ExecResult>;
}

/// Find the preferred origin id in line-oriented XML output.
///
/// Takes the first line containing [`PREFERRED_ORIGIN_MARKER`] and returns
/// the text between its first `>` and the following `<`.
pub fn extract_preferred_origin(output: &str) -> Option<String> {
    let line = output
        .lines()
        .find(|line| line.contains(PREFERRED_ORIGIN_MARKER))?;
    let after = &line[line.find('>')? + 1..];
    let value = match after.find('<') {
        Some(end) => &after[..end],
        None => after,
    };
    Some(value.to_string())
}

/// [`OriginResolver`] backed by an external command (`scxmldump` by default).
#[derive(Debug, Clone)]
pub struct CommandResolver {
    command: CommandConfig,
    timeout: Option<Duration>,
}

impl CommandResolver {
    pub fn new(command: CommandConfig, timeout: Option<Duration>) -> Self {
        Self { command, timeout }
    }
}

#[async_trait]
impl OriginResolver for CommandResolver {
    async fn query(&self, event_id: &str) -> Result<ExecResult> {
        let args = render_args(&self.command.args, &[(EVENT_ID_PLACEHOLDER, event_id)]);
        run_command(&self.command.program, &args, self.timeout).await
    }
}

/// [`MapGenerator`] backed by an external command (`seiscomp exec ...`).
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    command: CommandConfig,
    timeout: Option<Duration>,
}

impl CommandGenerator {
    pub fn new(command: CommandConfig, timeout: Option<Duration>) -> Self {
        Self { command, timeout }
    }
}

#[async_trait]
impl MapGenerator for CommandGenerator {
    async fn generate(&self, origin_id: &str, sub_run_id: &str) -> Result<ExecResult> {
        let args = render_args(
            &self.command.args,
            &[
                (EVENT_ID_PLACEHOLDER, sub_run_id),
                (ORIGIN_ID_PLACEHOLDER, origin_id),
            ],
        );
        run_command(&self.command.program, &args, self.timeout).await
    }
}
