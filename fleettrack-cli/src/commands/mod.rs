//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`config`] - Configuration management (path, show, init)
//! - [`show`] - Print a unit's stored location record
//! - [`sites`] - List sites, optionally with distances from a position
//! - [`track`] - Replay a trip through the geofenced reporter

pub mod common;
pub mod config;
pub mod show;
pub mod sites;
pub mod track;
