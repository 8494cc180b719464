pub mod cli;
pub mod config;
pub mod error;
pub mod import;
pub mod model;
pub mod parser;
pub mod schema;
pub mod source;
pub mod store;
pub mod ui;

pub use cli::{Cli, Commands};
pub use config::ImportConfig;
pub use error::{GeoError, Result};
pub use import::{ImportSummary, Importer};
pub use store::{GeoStore, SqliteStore};
pub use ui::{ConsoleUi, Phase, SilentUi, Ui};
