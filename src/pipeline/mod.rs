// Review pipeline — stage layout, the orchestrator, and batch runs.

pub mod batch;
pub mod orchestrator;
pub mod stage;

pub use orchestrator::{OutcomeError, OutcomeStatus, PipelineOrchestrator, PipelineOutcome};
