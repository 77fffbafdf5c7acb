//! Port traits decoupling the domain from storage, config, and export.

pub mod store_port;
pub mod config_port;
pub mod export_port;
