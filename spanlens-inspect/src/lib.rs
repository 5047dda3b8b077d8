//! Terminal inspector over the span engine.
//!
//! `main` wires these together; the pieces are public so the integration
//! tests can drive them against an in-process server.

pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod render;
pub mod watch;

pub use client::{ClientError, TraceClient};
pub use config::Config;
