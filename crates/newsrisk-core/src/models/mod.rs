//! Data models: extraction records and settings.

pub mod config;
pub mod record;
