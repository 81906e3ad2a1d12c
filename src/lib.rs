pub mod backend;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod identity;
pub mod session;
pub mod store;
pub mod telemetry;
pub mod totals;
