//! `seisops-dispatch`: delayed, multi-pass ShakeMap trigger.
//!
//! # Overview
//!
//! ShakeMap estimates improve as waveform data and origin refinements arrive
//! after an event, so one event notification is fanned out into several
//! passes at fixed delays. Each pass ("sub-run") gets its own composite id
//! `<event_id>_<delay>` and:
//!
//! 1. is skipped if this process already saw the id, or if a durable marker
//!    for it exists (the alert system sometimes fires twice);
//! 2. waits until `dispatcher start + delay`;
//! 3. resolves the event's preferred origin with an external query;
//! 4. runs the map generator with that origin.
//!
//! At most `workers` sub-runs hold a slot at once. Failures stay inside their
//! sub-run and only show up in the log and the returned [`DispatchReport`].

pub mod engine;
pub mod error;
pub mod exec;
pub mod marker;
pub mod tools;
pub mod types;

pub use engine::{DispatchOptions, Dispatcher};
pub use error::{DispatchError, Result};
pub use exec::ExecResult;
pub use marker::{Claim, MarkerStore};
pub use tools::{MapGenerator, OriginResolver};
pub use types::{
    DispatchReport, FailureReason, SubRunOutcome, SubRunStatus, Tool, TriggerRequest,
};
