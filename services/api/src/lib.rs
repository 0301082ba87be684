//! services/api/src/lib.rs
//!
//! The library surface of the API service: configuration, error types,
//! the database and narrative adapters, and the axum web layer.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
