//! CLI module for Accord

pub mod app;
pub mod chart;
pub mod commands;

pub use app::NegotiationApp;
pub use commands::{Cli, Commands, RunArgs};
