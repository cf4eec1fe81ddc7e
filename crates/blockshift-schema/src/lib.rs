//! Block definition lookup
//!
//! The schema side of a migration: which block names are valid at which
//! position of a tree, according to the definitions configured today.
//!
//! # Example
//!
//! ```rust
//! use blockshift_schema::{BlockDef, BlockSchema, StreamFieldSchema};
//! use blockshift_tree::BlockPath;
//!
//! let schema = StreamFieldSchema::new(BlockDef::stream([
//!     ("char1", BlockDef::leaf()),
//!     ("simplestruct", BlockDef::structure([("char1", BlockDef::leaf())])),
//! ]))
//! .unwrap();
//!
//! assert!(schema.exists(&BlockPath::root(), "char1"));
//! assert!(!schema.exists(&"simplestruct".parse().unwrap(), "char2"));
//! ```

#![warn(missing_docs)]

pub mod def;
pub mod lookup;

pub use def::{BlockDef, ChildBlocks};
pub use lookup::{BlockSchema, SchemaError, StreamFieldSchema};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
