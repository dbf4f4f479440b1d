//! Beadgraph - graph analytics and triage for beads issue trackers.
//!
//! Issues in a beads repository block one another. This crate treats those
//! blocking relationships as a directed graph and answers questions about
//! it: what is ready to work on, what is holding the most work up, which
//! topics are unhealthy, and what changed since last time.
//!
//! The pipeline runs in two phases. [`analysis::Analyzer`] computes cheap
//! counts and the execution plan synchronously, then hands the expensive
//! centrality metrics to a background thread. Consumers read results through
//! [`analysis::GraphStats`], which returns zero values until the background
//! batch lands.
//!
//! # Example
//!
//! ```no_run
//! use beadgraph::analysis::Analyzer;
//! use beadgraph::config::AnalysisConfig;
//! use beadgraph::loader::load_issues;
//! use beadgraph::triage::{TriageOptions, compute_triage};
//! use std::path::Path;
//!
//! # async fn example() -> beadgraph::error::Result<()> {
//! let loaded = load_issues(Path::new(".")).await?;
//! let config = AnalysisConfig::default();
//! let stats = Analyzer::new(&loaded.issues, &config.centrality).analyze();
//! let triage = compute_triage(
//!     &loaded.issues,
//!     &stats,
//!     &config.triage,
//!     None,
//!     &TriageOptions::default(),
//!     chrono::Utc::now(),
//! );
//! if let Some(top) = triage.top() {
//!     println!("next: {} ({})", top.id, top.primary_reason);
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod analysis;
pub mod config;
pub mod domain;
pub mod error;
pub mod insights;
pub mod labels;
pub mod loader;
pub mod snapshot;
pub mod triage;

// Command-line surface (used by the binary)
pub mod app;
pub mod cli;
pub mod output;

#[cfg(test)]
mod test_support;
