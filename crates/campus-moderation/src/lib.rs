pub mod config;
pub mod error;
pub mod moderation;
pub mod telemetry;
