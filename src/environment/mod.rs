//! Environment selection and resolution.
//!
//! Determines which deployment environment (LOCAL, DEV, PROD) the
//! definitions are built for. The priority chain is:
//!
//! 1. Explicit `--env` flag
//! 2. `ENVIRONMENT` variable
//! 3. Settings file `default_environment`
//! 4. Fallback to LOCAL

pub mod resolver;
pub mod selector;

pub use resolver::{EnvironmentSource, ResolvedEnvironment};
pub use selector::{select_environment, select_environment_from, ConfigTag, ENVIRONMENT_VAR};
