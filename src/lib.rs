//! bcsched - OpenShift build dependency scheduler
//!
//! Triggers builds for a batch of build configs in dependency order:
//! a build config runs once every image stream it reads has been built,
//! and independent build configs run concurrently.

pub mod cache;
pub mod cli;
pub mod cluster;
pub mod config;
pub mod error;
pub mod graph;
pub mod resource;
pub mod scheduler;
pub mod ui;

pub use error::{BcschedError, BcschedResult};
