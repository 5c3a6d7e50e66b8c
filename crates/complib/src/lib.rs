//! Component Shelf core library.
//!
//! Catalog semantics live here so they can be driven without a terminal;
//! the `complib` binary adds configuration, CLI and the TUI on top.

pub mod catalog;

pub use catalog::{Catalog, CatalogError, Completion, Notice, Task};
pub use complib_gateway as gateway;
