//! Runtime core: wiring and process lifecycle.
//!
//! - [`orchestrator`]: connects the session, pumps signals into the dispatcher, runs the shutdown sequence;
//! - [`builder`]: assembles an orchestrator from configuration and a client;
//! - [`shutdown`]: cross-platform shutdown signal handling.

mod builder;
mod orchestrator;
mod shutdown;

pub use builder::OrchestratorBuilder;
pub use orchestrator::{Orchestrator, RunSummary, StopCause};
