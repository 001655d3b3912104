pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod openapi;
pub mod portal;
pub mod rate_limit; // in-memory rate limiting
pub mod repo;
pub mod routes;
pub mod security;

// Re-export commonly used items for tests / external users
pub use routes::{config, AppState};
pub use security::SecurityHeaders;
