//! Step execution orchestration.

pub mod orchestrator;

pub use orchestrator::{Invocation, Orchestrator, RunReport};
