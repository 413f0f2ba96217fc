//! Core building blocks: scanning, reference extraction, reconciliation,
//! check coordination and reporting.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod exec;
pub mod inventory;
pub mod output;
pub mod reconcile;
pub mod refs;
pub mod render;
pub mod report;
pub mod rules;
pub mod scan;
pub mod time;
pub mod verdict;
