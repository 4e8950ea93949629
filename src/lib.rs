//! # FMOD Importer Core Library
//!
//! This crate automates bulk audio-asset import into FMOD Studio by driving
//! the authoring tool's remote scripting console over its telnet port. It is
//! organized as a library so the same core serves the CLI binary and any
//! future frontend.
//!
//! ## Crate Structure
//!
//! - **`config`**: TOML-backed `Settings` (console endpoint, instrument-type
//!   suffix rules, scripts directory).
//! - **`console`**: The telnet console client and the project-path response
//!   parser.
//! - **`classify`**: Directory scanning, suffix-based instrument-type
//!   classification, and deterministic file grouping.
//! - **`commands`**: Script template loading, script-literal escaping, and
//!   command-batch generation.
//! - **`importer`**: The connect/import state machine tying the pieces
//!   together, with a status event stream for the caller.
//! - **`error`**: The crate-wide `ImporterError` enum.

pub mod classify;
pub mod commands;
pub mod config;
pub mod console;
pub mod error;
pub mod importer;

pub use classify::{FileGroup, InstrumentType};
pub use config::{Settings, SuffixRules};
pub use error::{AppResult, ImporterError};
pub use importer::{Importer, ImporterState};
