//! Editing core for IEC 61850 SCL control blocks and data sets.
//!
//! Everything here is computed from a parsed [`scl::SclDoc`] snapshot: picker
//! trees, selection lists, form state and the [`edit::Edit`] actions a host
//! application applies to its own copy of the document. Nothing in this crate
//! mutates a document.

pub mod cfg;
pub mod controlblock;
pub mod dataset;
pub mod edit;
pub mod editors;
pub mod foundation;
pub mod scl;
pub mod utils;

pub use anyhow::Result;
