//! Report module - terminal tables and JSON export of results

pub mod eda_export;
pub mod summary;

pub use eda_export::*;
pub use summary::*;
