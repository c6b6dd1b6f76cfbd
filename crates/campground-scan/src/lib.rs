//! # Campground Scan
//!
//! Availability classification and change-detection engine. Raw site
//! availability windows are bucketed into desirability tiers, aggregated
//! per campground, and compared poll over poll to report ranges that
//! became available or unavailable.

/// Shared types, configuration and errors
mod scan_types;
pub use scan_types::*;

/// Date ranges and their canonical weekday-annotated keys
mod date_range;
pub use date_range::*;

/// Stay classification table
mod classifier;
pub use classifier::*;

/// Per-campground, per-tier aggregation of classified ranges
mod aggregator;
pub use aggregator::*;

/// Snapshot comparison
mod differ;
pub use differ::*;

/// Poll loop and its collaborator traits
mod executor;
pub use executor::*;

/// Parser for the lookup program's text output
mod output_parser;
pub use output_parser::*;

/// Subprocess adapter for the availability lookup
mod lookup_client;
pub use lookup_client::*;

/// Text rendering and console reporting
mod notification_service;
pub use notification_service::*;
