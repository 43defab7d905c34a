//! CLI subcommands.

pub mod config;
pub mod kill;
pub mod list;
