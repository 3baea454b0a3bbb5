/// Reward campaign seeding from config.toml
pub mod campaign;

/// Database configuration and connection management
pub mod database;
