//! # RecGov
//!
//! This crate provides a client for the Rec.gov RIDB API, which is used to find campgrounds
//! near a location and to search recreation areas by name.

/// Nearby campground and recreation area search on the RIDB API.
mod facility_search;
pub use facility_search::*;
