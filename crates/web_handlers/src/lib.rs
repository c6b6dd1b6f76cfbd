//! # Web Handlers for the Campground Availability API
//!
//! This crate provides the HTTP handlers for one-shot availability searches and
//! nearby campground lookups.

/// Request, response and error types for the search endpoints
mod search_types;
pub use search_types::*;

/// Runs one availability lookup and groups the results by tier
mod search_service;
pub use search_service::*;

/// Handlers and route configuration
mod search_handlers;
pub use search_handlers::*;
