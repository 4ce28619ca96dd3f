pub mod adapters;
pub mod config;
pub mod console;
pub mod dashboard;
pub mod error;
