/// Environment-driven server configuration.
pub mod config;
