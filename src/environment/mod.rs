mod config;
pub mod constants;
pub mod export;
pub mod setup;
mod store;

pub use config::{
    AppCommands, AppGroup, CloneOptions, CloneToggle, CustomCommand, CustomCommands,
    EnvironmentConfig, ExportedRepository, GitVcs, RepositoryLists,
};
pub use export::{checkout_exported, export_with_branches, reconcile, ExportReport};
pub use store::{BaseField, ConfigStore, ImportOutcome};
