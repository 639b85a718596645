//! Database pool initialization, schema, and table registry

pub mod init;
pub mod models;
pub mod tables;

pub use init::*;
pub use models::*;
pub use tables::*;
