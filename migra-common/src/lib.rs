//! # MIGRA Common Library
//!
//! Shared code for the MIGRA pipeline and dashboard binaries:
//! - Configuration loading (environment selector + multi-tier resolution)
//! - Error types
//! - FIPS geography primitives and climate region mapping
//! - Database pool initialization, schema, and table registry

pub mod config;
pub mod db;
pub mod error;
pub mod fips;

pub use config::{Environment, Settings};
pub use error::{Error, Result};
