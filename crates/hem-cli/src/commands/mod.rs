//! Subcommand implementations.

pub mod generate;
pub mod info;
pub mod repair;
pub mod validate;
