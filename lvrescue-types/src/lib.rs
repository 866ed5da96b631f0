// SPDX-License-Identifier: GPL-3.0-only

//! Canonical domain models for lvrescue
//!
//! This crate defines the single source of truth for the capacity-rescue
//! domain types. These models are used throughout the stack:
//!
//! - **lvrescue-sys**: Builds these types from system command output
//! - **lvrescue-engine**: Makes all rebalancing decisions over them
//! - **lvrescue-cli**: Renders them for the `report` subcommand
//!
//! All sizes are exact byte counts. Conversion from suffixed, locale-variant
//! textual sizes happens exactly once, at ingestion, through [`units`].

pub mod config;
pub mod filesystem;
pub mod lvm;
pub mod queue;
pub mod snapshot;
pub mod units;

// Re-export all public types
pub use config::*;
pub use filesystem::*;
pub use lvm::*;
pub use queue::*;
pub use snapshot::*;
pub use units::{format_size, parse_size, ParseSizeError};
