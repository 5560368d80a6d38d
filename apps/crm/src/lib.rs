//! Lead Desk CRM core
//!
//! Session handling, the cached lead/note/profile store, the filter and
//! count engine, write coordination and spreadsheet export for a small
//! sales team. Storage and authentication are delegated to a hosted
//! Postgres store and auth provider behind repository and provider traits.

pub mod app;
pub mod auth;
pub mod config;
pub mod domain;
pub mod export;
pub mod infrastructure;
pub mod query;
