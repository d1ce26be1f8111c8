pub mod config;
pub mod context;
pub mod domain;
pub mod error;
pub mod history;
pub mod output;
pub mod release;
pub mod semver;
pub mod ui;

pub use error::{RelverError, Result};
