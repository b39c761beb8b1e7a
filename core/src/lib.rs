//! flowwatch-core: transaction-graph construction and rule-based
//! money-laundering pattern scoring for token transfer ledgers.
//!
//! Pipeline: `builder` → `detector`/`patterns` → `scoring`.
//! `summary`, `profile` and `report` are read-only projections
//! over the finished graph and score sheet.

pub mod builder;
pub mod config;
pub mod detector;
pub mod engine;
pub mod error;
pub mod graph;
pub mod patterns;
pub mod profile;
pub mod report;
pub mod scoring;
pub mod summary;
pub mod transfer;
pub mod types;
