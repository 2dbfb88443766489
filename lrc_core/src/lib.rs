pub mod accessor;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod report;
pub mod rest;
pub mod runner;

pub use error::{LrcError, NetworkFailure};
pub use runner::Runner;
