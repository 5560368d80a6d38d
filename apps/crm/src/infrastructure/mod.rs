// Infrastructure layer module
// Database adapters and the auth provider integrations
// Follows Hexagonal Architecture

pub mod auth;
pub mod repositories;
