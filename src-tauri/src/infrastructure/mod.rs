pub mod calendar_store;
pub mod config;
pub mod error;
pub mod logging;
