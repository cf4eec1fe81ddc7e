//! Path-guided recursive transformer
//!
//! Walks a raw tree along a [`BlockPath`], checking every block name met on
//! the way against the current definitions, and applies an [`Operation`] at
//! each container the path ends at.
//!
//! The input tree is consumed and a new one is built: containers on the
//! walked path are rebuilt, every other child is moved across unchanged.
//! Callers keeping the old tree pass a clone (see
//! [`apply_changes_to_raw_data`]).

use crate::error::{InvalidBlockDefError, TransformError};
use crate::operation::Operation;
use blockshift_schema::{BlockDef, BlockSchema};
use blockshift_tree::{BlockPath, BlockValue, ListItem, RawNode, RawTree, LIST_ITEM_NAME};
use serde_json::{Map, Value};

/// Apply `operation` at `block_path_str` to a borrowed tree
///
/// Entry point for callers holding on to the original data; the result is a
/// separate tree.
///
/// # Errors
/// - [`TransformError::Path`] if `block_path_str` does not parse
/// - [`TransformError::InvalidBlockDef`] at the first block name the
///   current definitions do not have
/// - [`TransformError::Malformed`] / [`TransformError::Operation`] if the data
///   does not have the shape its definition declares
pub fn apply_changes_to_raw_data<S>(
    raw_data: &RawTree,
    block_path_str: &str,
    operation: &Operation,
    schema: &S,
) -> Result<RawTree, TransformError>
where
    S: BlockSchema + ?Sized,
{
    let path: BlockPath = block_path_str.parse()?;
    apply_changes(raw_data.clone(), &path, operation, schema)
}

/// Apply `operation` at `path`, consuming the tree
///
/// # Errors
/// See [`apply_changes_to_raw_data`]
pub fn apply_changes<S>(
    raw_tree: RawTree,
    path: &BlockPath,
    operation: &Operation,
    schema: &S,
) -> Result<RawTree, TransformError>
where
    S: BlockSchema + ?Sized,
{
    tracing::debug!("Applying {} at '{}'", operation, path);
    Walker {
        path,
        operation,
        schema,
    }
    .visit(raw_tree, schema.root(), 0)
}

/// Block names are checked with [`BlockSchema::exists`] and containers on
/// the path are read with [`BlockSchema::definition_at`], so adapters that
/// override either are honoured.
struct Walker<'a, S: ?Sized> {
    path: &'a BlockPath,
    operation: &'a Operation,
    schema: &'a S,
}

impl<S: BlockSchema + ?Sized> Walker<'_, S> {
    /// Position of the container reached after `depth` segments
    fn position(&self, depth: usize) -> BlockPath {
        BlockPath::new(self.path.segments()[..depth].to_vec())
    }

    fn unknown(&self, name: &str, depth: usize, on_path: bool) -> TransformError {
        InvalidBlockDefError::new(name, self.position(depth), on_path).into()
    }

    /// Definition of the next container on the path, below `depth`
    fn next_def(&self, depth: usize, next: &str) -> Result<&BlockDef, TransformError> {
        self.schema
            .definition_at(&self.position(depth + 1))
            .ok_or_else(|| self.unknown(next, depth, true))
    }

    fn visit(&self, value: Value, def: &BlockDef, depth: usize) -> Result<Value, TransformError> {
        let block = BlockValue::read(value, def.kind()).map_err(|source| TransformError::Malformed {
            path: self.position(depth),
            source,
        })?;

        let Some(next) = self.path.segments().get(depth) else {
            tracing::trace!("Reached target '{}' ({})", self.path, block.kind());
            let changed = self
                .operation
                .apply(block)
                .map_err(|source| TransformError::Operation {
                    path: self.position(depth),
                    source,
                })?;
            return Ok(changed.into_value());
        };

        let rebuilt = match block {
            BlockValue::Stream(children) => {
                BlockValue::Stream(self.visit_stream(children, next, depth)?)
            }
            BlockValue::Struct(fields) => {
                BlockValue::Struct(self.visit_struct(fields, next, depth)?)
            }
            BlockValue::List(items) => BlockValue::List(self.visit_list(items, next, depth)?),
            // Leaf blocks define no children
            BlockValue::Leaf(_) => return Err(self.unknown(next, depth, true)),
        };
        Ok(rebuilt.into_value())
    }

    fn visit_stream(
        &self,
        children: Vec<Value>,
        next: &str,
        depth: usize,
    ) -> Result<Vec<Value>, TransformError> {
        let here = self.position(depth);
        let mut out = Vec::with_capacity(children.len());
        for child in children {
            let name = RawNode::peek_type(&child).map_err(|source| TransformError::Malformed {
                path: here.clone(),
                source,
            })?;
            let on_path = name == next;
            if !self.schema.exists(&here, name) {
                return Err(self.unknown(name, depth, on_path));
            }

            if on_path {
                tracing::trace!("Descending into stream child '{}'", next);
                let child_def = self.next_def(depth, next)?;
                let mut node = RawNode::from_value(child).map_err(|source| {
                    TransformError::Malformed {
                        path: here.clone(),
                        source,
                    }
                })?;
                node.value = self.visit(node.value, child_def, depth + 1)?;
                out.push(node.into_value());
            } else {
                out.push(child);
            }
        }
        Ok(out)
    }

    fn visit_struct(
        &self,
        fields: Map<String, Value>,
        next: &str,
        depth: usize,
    ) -> Result<Map<String, Value>, TransformError> {
        let here = self.position(depth);
        let mut out = Map::with_capacity(fields.len());
        for (key, value) in fields {
            let on_path = key == next;
            if !self.schema.exists(&here, &key) {
                return Err(self.unknown(&key, depth, on_path));
            }

            let value = if on_path {
                tracing::trace!("Descending into struct child '{}'", next);
                self.visit(value, self.next_def(depth, next)?, depth + 1)?
            } else {
                value
            };
            out.insert(key, value);
        }
        Ok(out)
    }

    fn visit_list(
        &self,
        items: Vec<ListItem>,
        next: &str,
        depth: usize,
    ) -> Result<Vec<ListItem>, TransformError> {
        // Every list child is an `item`; any other segment names nothing
        if next != LIST_ITEM_NAME || !self.schema.exists(&self.position(depth), next) {
            return Err(self.unknown(next, depth, true));
        }
        let child_def = self.next_def(depth, next)?;

        items
            .into_iter()
            .map(|item| item.try_map_value(|value| self.visit(value, child_def, depth + 1)))
            .collect()
    }
}
