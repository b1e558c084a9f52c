//! CLI module - argument parsing and the two command runners

pub mod args;
pub mod eda;
pub mod model;

pub use args::{Cli, Commands, ModelArgs};
pub use eda::run_eda;
pub use model::run_model;
