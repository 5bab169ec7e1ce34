//! Library crate for nosudopass.
//!
//! This crate exposes the building blocks of the TUI:
//! - Application state and the navigation state machine (`app`)
//! - Error and result types (`error`)
//! - Sudoers drop-in and account registry layer (`sys`)
//! - UI rendering (`ui`)
//!
//! It is used by the `nosudopass` binary and by tests.
#![doc = include_str!("../README.md")]
#![deny(rustdoc::broken_intra_doc_links)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod app;
pub mod error;
pub mod sys;
pub mod ui;

// Re-export commonly used items at the crate root for convenience
/// Convenient error and result types shared across the crate.
pub use error::{DynError, Result};
