//! Block tree transformations
//!
//! Applies one structural [`Operation`] at every container a [`BlockPath`]
//! leads to, validating the block names met on the way against the current
//! definitions.
//!
//! # Core Concepts
//!
//! - [`Operation`]: Closed set of container edits (rename, remove, regroup)
//! - [`apply_changes`]: Recursive, path-guided walk over an owned raw tree
//! - [`InvalidBlockDefError`]: Data names a block the definitions no longer have
//!
//! # Example
//!
//! ```rust
//! use blockshift_ops::{apply_changes_to_raw_data, Operation};
//! use blockshift_schema::BlockDef;
//! use serde_json::json;
//!
//! let schema = BlockDef::stream([("char1", BlockDef::leaf()), ("renamed1", BlockDef::leaf())]);
//! let raw = json!([{"type": "char1", "id": "0001", "value": "Test char 1"}]);
//!
//! let out = apply_changes_to_raw_data(
//!     &raw,
//!     "",
//!     &Operation::rename_stream_children("char1", "renamed1"),
//!     &schema,
//! )
//! .unwrap();
//! assert_eq!(out[0]["type"], "renamed1");
//! ```
//!
//! [`BlockPath`]: blockshift_tree::BlockPath

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod error;
mod operation;
mod transform;

pub use error::{InvalidBlockDefError, OperationError, TransformError};
pub use operation::Operation;
pub use transform::{apply_changes, apply_changes_to_raw_data};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
