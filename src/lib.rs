//! # sizetrack
//!
//! A tool that tracks the on-disk size of compiled binary artifacts
//! across the revision history of a git repository, so regressions and
//! trends in code size can be observed over time.
//!
//! ## Overview
//!
//! sizetrack maintains two persisted JSON datasets:
//!
//! - **git sizes**: one size snapshot per commit, built by checking out
//!   each revision of a branch, rebuilding from scratch, and measuring
//!   the resulting artifacts;
//! - **recent sizes**: a per-artifact size-over-time trace of the
//!   current working tree, one point per observed change.
//!
//! Both feed a template-based HTML report.
//!
//! ## Architecture
//!
//! - [`cli`]: Command-line interface definitions using clap
//! - [`commands`]: Implementation of the sizetrack subcommands
//! - [`error`]: Error types and handling with thiserror + miette
//! - [`ledger`]: The size ledger — snapshot model, history walk, prune,
//!   recent-sizes trace
//! - [`git`]: Git collaborator surface (branch, rev-list, checkout, log
//!   parsing, remote URLs)
//! - [`scan`]: Artifact scanner (sizes, mtimes, from-scratch cleaning)
//! - [`persist`]: JSON persistence for both ledgers
//!
//! Internal modules (not part of the public API):
//! - `command`: external process runner (captured and silent flavors)
//! - `report`: HTML template substitution
//! - `toolchain`: compiler version probe (build-label producer)
//! - `logging`: verbosity-aware stderr logger
//!
//! ## The reliability contract
//!
//! The history walk mutates the working tree (checkout per revision).
//! Whatever happens mid-walk — a failed checkout, an I/O error, a panic —
//! a scoped restore guard puts the tree back on the original branch.
//! The tool is strictly sequential and is not safe to run twice
//! concurrently against the same working tree; no file locking is
//! provided.
//!
//! ## Usage
//!
//! ```bash
//! # Record the current tree and refresh the report:
//! sizetrack generate
//!
//! # Walk the whole branch history once (slow; rebuilds every revision):
//! sizetrack history
//! ```
//!
//! ## Library Usage
//!
//! ```no_run
//! use sizetrack::cli::{Cli, Commands, GlobalOpts};
//! use sizetrack::commands;
//!
//! let cli = Cli::builder()
//!     .global_opts(GlobalOpts::builder().label("4.6.2"))
//!     .command(Commands::Generate)
//!     .build();
//!
//! commands::execute(&cli)?;
//! # Ok::<(), sizetrack::error::SizeError>(())
//! ```

// Re-export public modules for library usage
pub mod cli;
pub mod commands;
pub mod error;
pub mod git;
pub mod ledger;
pub mod persist;
pub mod scan;

// Internal modules
mod command;
mod logging;
mod report;
mod toolchain;
