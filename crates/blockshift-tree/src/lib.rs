//! Block tree model
//!
//! Raw, JSON-backed block trees and the paths used to address them.
//!
//! # Core Concepts
//!
//! - [`RawNode`]: One typed block of a stream (`{type, id, value}`)
//! - [`BlockValue`]: A raw value read with the shape of its definition
//! - [`ListItem`]: Typed or bare element of a list block
//! - [`BlockPath`]: Dotted sequence of block names (`nestedstruct.char1`)
//!
//! # Example
//!
//! ```rust
//! use blockshift_tree::{BlockPath, BlockValue, ContainerKind, RawNode};
//! use serde_json::json;
//!
//! let raw = json!([{"type": "char1", "id": "0001", "value": "Test char 1"}]);
//! let BlockValue::Stream(children) = BlockValue::read(raw, ContainerKind::Stream).unwrap() else {
//!     unreachable!()
//! };
//! assert_eq!(RawNode::peek_type(&children[0]).unwrap(), "char1");
//!
//! let path: BlockPath = "nestedstruct.char1".parse().unwrap();
//! assert_eq!(path.last(), Some("char1"));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod node;
mod path;

pub use node::{
    value_kind, BlockValue, ContainerKind, ListItem, RawNode, RawTree, TreeError, LIST_ITEM_NAME,
};
pub use path::{BlockPath, PathError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
