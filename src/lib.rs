pub mod asset_watch;
pub mod backup;
pub mod cli;
pub mod config;
pub mod controller;
pub mod dirty;
pub mod error;
pub mod events;
pub mod guard;
pub mod host;
pub mod owner;
pub mod path_validator;
pub mod retention;
pub mod scheduler;
pub mod status;
pub mod tasks;
pub mod time;

pub use controller::{AutoSaveController, CycleOutcome, SaveReport, TickOutcome};
pub use error::{BackupError, ValidationError};
pub use events::HostEvent;
pub use host::{DocumentHost, DocumentInfo};
