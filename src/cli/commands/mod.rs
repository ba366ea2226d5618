//! CLI command implementations

mod batch;
pub mod build;
pub mod config;
pub mod plan;

pub use build::execute as build;
pub use config::execute as config;
pub use plan::execute as plan;
