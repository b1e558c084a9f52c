//! Claimlens: insurance claims analysis library
//!
//! Loss ratios, distributions, outliers and trends over policy tables, plus
//! baseline claim-severity models with tree attributions.

pub mod analysis;
pub mod cli;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod utils;
pub mod viz;
