//! Concrete adapter implementations for ports.

pub mod csv_export;
pub mod csv_store;
pub mod file_config;
#[cfg(feature = "sqlite")]
pub mod sqlite_store;
