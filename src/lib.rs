//! procflow - a command-line ledger for a 10-stage procurement workflow
//!
//! This library provides the core functionality for procflow, including:
//! - The stage registry and the stage-sequencing state machine
//! - Reconciliation of the two server-side progress trackers on resume
//! - Dashboard aggregation over project progress
//! - SQLite persistence of requirement records and the active workflow
//! - Local and REST project sources
//! - CLI command parsing and execution
//!
//! # Example
//!
//! ```no_run
//! use procflow::cli::run;
//!
//! fn main() {
//!     if let Err(e) = run() {
//!         eprintln!("Error: {}", e);
//!         std::process::exit(1);
//!     }
//! }
//! ```

pub mod backend;
pub mod cli;
pub mod config;
pub mod db;
pub mod models;
pub mod repo;
pub mod utils;
pub mod workflow;
