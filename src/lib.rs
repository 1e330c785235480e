pub mod config;
pub mod coordinator;
pub mod error;
pub mod identity;
pub mod server;
pub mod transfer;
