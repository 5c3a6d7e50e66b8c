//! CLI module for complib
//!
//! The default command opens the TUI; `config` prints resolved settings.

pub mod config;
pub mod error;
pub mod tui;
