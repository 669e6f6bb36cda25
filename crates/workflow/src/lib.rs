pub mod demo;
pub mod engine;
pub mod registry;
pub mod state_machine;
pub mod types;

pub use engine::WorkflowEngine;
pub use registry::RunRegistry;
pub use state_machine::{Decision, Next, StageMachine};
pub use types::{RunOutcome, RunRequest, RunStatusView, Stage, WorkflowState};
