//! CLI command implementations

pub mod config;
pub mod import;
pub mod inspect;
