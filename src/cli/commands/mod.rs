//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! # Architecture
//!
//! Commands are dispatched via [`CommandDispatcher`], which routes CLI
//! subcommands to their implementations. Commands that need definitions
//! load them through a shared [`Workspace`], so settings, environment
//! resolution, and the `--env` flag behave the same everywhere.

pub mod completions;
pub mod defs;
pub mod dispatcher;
pub mod list;
pub mod materialize;
pub mod workspace;

pub use dispatcher::{Command, CommandDispatcher, CommandResult};
pub use workspace::Workspace;
