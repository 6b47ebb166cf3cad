//! CLI command implementations.
//!
//! - [`config`] - Configuration management (path, show, init)
//! - [`markers`] - Pending write-back markers
//! - [`run`] - Start the coordinator and read requests from stdin
//! - [`session`] - Line commands understood by `run`

pub mod config;
pub mod markers;
pub mod run;
pub mod session;
