//! dbt command-line integration.
//!
//! The crate never runs SQL itself. Everything goes through the dbt CLI:
//! [`resource`] builds the invocation, [`process`] runs it, and [`events`]
//! reads dbt's JSON log stream back into typed events.

pub mod events;
pub mod process;
pub mod resource;

pub use events::{DbtLogRecord, EventClassifier, EventKind, ExecutionEvent, LogInfo, NodeInfo};
pub use process::{CommandResult, CommandSpec, OutputLine, ProcessRunner, SystemRunner};
pub use resource::{
    DbtCliInvocation, DbtCliResource, RunOutcome, DBT_EXECUTABLE, DBT_EXECUTABLE_VAR,
};
