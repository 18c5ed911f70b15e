use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use seisops_core::config::DispatchConfig;
use tokio::sync::Semaphore;
use tokio::time::Instant;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::{
    error::Result,
    marker::{Claim, MarkerStore},
    tools::{extract_preferred_origin, CommandGenerator, CommandResolver, MapGenerator, OriginResolver},
    types::{DispatchReport, FailureReason, SubRun, SubRunOutcome, SubRunStatus, Tool, TriggerRequest},
};

/// Pool size and submission pacing.
#[derive(Debug, Clone, Copy)]
pub struct DispatchOptions {
    pub workers: usize,
    pub pacing: Duration,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            workers: seisops_core::config::DEFAULT_WORKERS,
            pacing: Duration::from_secs(seisops_core::config::DEFAULT_PACING_SECS),
        }
    }
}

/// Fans one event out into delayed ShakeMap passes.
///
/// Construct once per process: the start time that every deadline is measured
/// from and the in-process dedup set both live here.
pub struct Dispatcher {
    options: DispatchOptions,
    markers: MarkerStore,
    resolver: Arc<dyn OriginResolver>,
    generator: Arc<dyn MapGenerator>,
    /// Composite ids already taken by this process.
    seen: Mutex<HashSet<String>>,
    started: Instant,
}

impl Dispatcher {
    pub fn new(
        options: DispatchOptions,
        markers: MarkerStore,
        resolver: Arc<dyn OriginResolver>,
        generator: Arc<dyn MapGenerator>,
    ) -> Self {
        Self {
            options: DispatchOptions {
                workers: options.workers.max(1),
                ..options
            },
            markers,
            resolver,
            generator,
            seen: Mutex::new(HashSet::new()),
            started: Instant::now(),
        }
    }

    /// Build a dispatcher running the configured external commands.
    pub fn from_config(config: &DispatchConfig) -> Self {
        let timeout = config.tool_timeout_secs.map(Duration::from_secs);
        Self::new(
            DispatchOptions {
                workers: config.workers,
                pacing: Duration::from_secs(config.pacing_secs),
            },
            MarkerStore::new(config.marker_path()),
            Arc::new(CommandResolver::new(config.resolver.clone(), timeout)),
            Arc::new(CommandGenerator::new(config.generator.clone(), timeout)),
        )
    }

    /// Schedule every delay of `request` and wait for all of them.
    ///
    /// Never fails: each sub-run's errors are logged and recorded in its
    /// outcome. Outcomes are in submission order.
    pub async fn dispatch(self: &Arc<Self>, request: TriggerRequest) -> DispatchReport {
        let span = info_span!("dispatch", run = %Uuid::new_v4(), event = %request.event_id);
        async move {
            info!("Using worker pool with max_workers={}", self.options.workers);

            let request = Arc::new(request);
            let slots = Arc::new(Semaphore::new(self.options.workers));
            let mut handles = Vec::with_capacity(request.delays.len());

            for (i, &delay) in request.delays.iter().enumerate() {
                if i > 0 {
                    tokio::time::sleep(self.options.pacing).await;
                }
                let this = Arc::clone(self);
                let req = Arc::clone(&request);
                let slots = Arc::clone(&slots);
                let handle = tokio::spawn(
                    async move {
                        // FIFO: queued delays take free slots in submission order.
                        let _slot = match slots.acquire_owned().await {
                            Ok(permit) => permit,
                            Err(e) => {
                                return SubRunOutcome::unexpected(&req.event_id, delay, e.to_string());
                            }
                        };
                        this.run_delayed(&req, delay).await
                    }
                    .in_current_span(),
                );
                info!("Scheduled thread for delay {delay}s");
                handles.push((delay, handle));
            }

            let mut outcomes = Vec::with_capacity(handles.len());
            for (delay, handle) in handles {
                match handle.await {
                    Ok(outcome) => {
                        info!("Thread for delay {delay}s has completed.");
                        outcomes.push(outcome);
                    }
                    Err(e) => {
                        error!("[EXCEPTION in thread for delay {delay}] {e}");
                        outcomes.push(SubRunOutcome::unexpected(
                            &request.event_id,
                            delay,
                            e.to_string(),
                        ));
                    }
                }
            }

            info!("All ShakeMap runs have completed.");
            DispatchReport {
                event_id: request.event_id.clone(),
                outcomes,
            }
        }
        .instrument(span)
        .await
    }

    /// Worker body: one sub-run from dedup to map generation.
    async fn run_delayed(&self, request: &TriggerRequest, delay: u64) -> SubRunOutcome {
        let mut run = match SubRun::new(&request.event_id, delay, self.started) {
            Ok(run) => run,
            Err(e) => {
                error!("[EXCEPTION in delay {delay}] {e}");
                return SubRunOutcome::unexpected(&request.event_id, delay, e.to_string());
            }
        };
        if let Err(e) = self.drive(request, &mut run).await {
            error!("[EXCEPTION in delay {delay}] {e}");
            run.fail(FailureReason::Unexpected {
                message: e.to_string(),
            });
        }
        run.outcome()
    }

    async fn drive(&self, request: &TriggerRequest, run: &mut SubRun) -> Result<()> {
        let id = run.composite_id.clone();
        let delay = run.delay;

        if !self.remember(&id) {
            info!("Event {id} has already been processed. Skipping.");
            run.advance(SubRunStatus::Deduplicated);
            return Ok(());
        }

        if self.markers.claim(&id).await? == Claim::AlreadyClaimed {
            info!("Event {id} has already been processed. Skipping.");
            run.advance(SubRunStatus::Deduplicated);
            return Ok(());
        }
        run.advance(SubRunStatus::Running);
        info!("Event {id} is being processed.");

        let wait = run.deadline.saturating_duration_since(Instant::now());
        info!(
            "Waiting {:.2}s for the scheduled time for event {} with delay {}s",
            wait.as_secs_f64(),
            request.event_id,
            delay
        );
        tokio::time::sleep_until(run.deadline).await;

        info!("Running ShakeMap for event {} with delay {delay}s", request.event_id);
        info!("Calling origin resolution for event {}...", request.original_event_id);
        let dump = self.resolver.query(&request.original_event_id).await?;
        if !dump.success() {
            error!(
                "[ERROR] origin resolution failed for {id}: exit code {}",
                dump.exit_code
            );
            error!("stdout:\n{}", dump.stdout);
            error!("stderr:\n{}", dump.stderr);
            run.fail(FailureReason::ToolFailed {
                tool: Tool::Resolver,
                exit_code: dump.exit_code,
                stdout: dump.stdout,
                stderr: dump.stderr,
            });
            return Ok(());
        }

        let Some(origin_id) = extract_preferred_origin(&dump.stdout) else {
            warn!("Could not find preferredOriginID for {}", request.original_event_id);
            run.fail(FailureReason::ResolutionNotFound);
            return Ok(());
        };
        run.origin_id = Some(origin_id.clone());

        info!("Running ShakeMap for origin {origin_id}, event_id {id}");
        let result = self.generator.generate(&origin_id, &id).await?;
        if result.success() {
            info!("ShakeMap stdout:\n{}", result.stdout);
            info!("ShakeMap stderr:\n{}", result.stderr);
            run.advance(SubRunStatus::Succeeded);
        } else {
            error!(
                "[ERROR] ShakeMap call failed for {id}: exit code {}",
                result.exit_code
            );
            error!("stdout:\n{}", result.stdout);
            error!("stderr:\n{}", result.stderr);
            run.fail(FailureReason::ToolFailed {
                tool: Tool::Generator,
                exit_code: result.exit_code,
                stdout: result.stdout,
                stderr: result.stderr,
            });
        }
        Ok(())
    }

    /// Check-and-insert under one lock; `false` if `id` was already taken.
    fn remember(&self, id: &str) -> bool {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.to_string())
    }
}
