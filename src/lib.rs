#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use
)]

pub mod app;
pub mod backends;
pub mod cli;
pub mod config;
pub mod corpus;
pub mod draft;
pub mod error;
pub mod gate;
pub mod history;
pub mod orchestrator;
pub mod outline;
pub mod prompt;

pub use config::Config;
pub use error::{ForgeError, Result};
