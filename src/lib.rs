//! setupwiz library
//!
//! Clone customer projects, keep branches in sync across a directory of
//! repositories, and start or build every app of an environment at once.

pub mod apps;
pub mod custom;
pub mod environment;
pub mod error;
pub mod git;
pub mod output;
pub mod process;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use apps::{install_deps, run_apps, AppKind, AppSelection, BatchMode, BatchOptions, BatchReport};
pub use environment::{ConfigStore, EnvironmentConfig};
pub use error::SwcError;
pub use git::{list_repositories, switch_branches};
