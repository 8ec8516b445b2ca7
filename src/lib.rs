//! nbcheck core library.
//!
//! This crate exposes programmatic APIs for checking notebook files: a
//! handful of structural predicates plus an execution check that runs the
//! notebook through an external engine.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Config file discovery and `Settings` resolution.
//! - `discover`: Notebook collection and exclude globs.
//! - `registry`: Selected check kinds to bound `Check` values.
//! - `checks`: The check set and its predicates.
//! - `execute`: Execution check, parameter extraction, engine adapter.
//! - `runner`: Applies checks to files and aggregates verdicts.
//! - `models`: Notebook document and verdict structs.
//! - `output`: Human/JSON report printers.
//! - `logging`: stderr logger setup.
//! - `error`: Error types.
pub mod checks;
pub mod cli;
pub mod config;
pub mod discover;
pub mod error;
pub mod execute;
pub mod logging;
pub mod models;
pub mod output;
pub mod registry;
pub mod runner;
