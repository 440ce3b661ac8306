//! CLI module - command-line interface for cid

pub mod args;
pub mod commands;
pub mod helpers;
pub mod output;

pub use args::Cli;
