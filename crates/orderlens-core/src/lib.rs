//! Core domain layer for OrderLens.
//!
//! Defines the normalized event model, stage-marker classification rules,
//! the normative-duration lookup, the shared error taxonomy, day-first
//! timestamp parsing, display formatting, and CLI settings with persisted
//! presentation preferences.

pub mod error;
pub mod formatting;
pub mod markers;
pub mod models;
pub mod norms;
pub mod settings;
pub mod time_utils;
