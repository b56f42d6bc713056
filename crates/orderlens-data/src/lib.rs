//! Data layer for OrderLens.
//!
//! Responsible for reading and normalizing delimited event logs, caching
//! loaded tables by file identity, filtering, running the aggregation pass
//! and assembling the dashboard report consumed by the renderers.

pub mod aggregate;
pub mod cache;
pub mod chart;
pub mod filter;
pub mod reader;
pub mod report;

pub use orderlens_core as core;
