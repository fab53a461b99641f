//! Domain types for listings and their analyses.

pub mod analysis;
pub mod listing;
