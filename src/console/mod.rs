//! Communication with the FMOD Studio scripting console.
//!
//! The console is a line-oriented telnet endpoint with no per-command
//! acknowledgement; [`client`] owns the TCP stream and its lifecycle, while
//! [`parse`] extracts the one structured value the importer ever reads back
//! (the open project's file path).

pub mod client;
pub mod parse;

pub use client::ConsoleClient;
pub use parse::extract_project_path;
