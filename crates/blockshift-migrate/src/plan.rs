//! Migration plans
//!
//! A plan is an ordered list of (operation, block path) steps applied to
//! every tree. Plans can be built in code or loaded from TOML:
//!
//! ```toml
//! [[steps]]
//! block_path = "nestedstruct"
//! op = "rename_struct_children"
//! old_name = "char1"
//! new_name = "renamed1"
//! ```

use crate::error::MigrationError;
use blockshift_ops::{apply_changes, Operation, TransformError};
use blockshift_schema::BlockSchema;
use blockshift_tree::{BlockPath, RawTree};
use serde::{Deserialize, Serialize};

/// One step of a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    pub block_path: BlockPath,
    #[serde(flatten)]
    pub operation: Operation,
}

/// Ordered operations to apply to each tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MigrationPlan {
    #[serde(default)]
    steps: Vec<PlanStep>,
}

impl MigrationPlan {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Plan with a single step
    #[must_use]
    pub fn single(operation: Operation, block_path: BlockPath) -> Self {
        Self::new().with_step(operation, block_path)
    }

    /// With another step appended
    #[must_use]
    pub fn with_step(mut self, operation: Operation, block_path: BlockPath) -> Self {
        self.push(operation, block_path);
        self
    }

    pub fn push(&mut self, operation: Operation, block_path: BlockPath) {
        self.steps.push(PlanStep {
            block_path,
            operation,
        });
    }

    #[inline]
    #[must_use]
    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every step over `tree`, in order
    ///
    /// # Errors
    /// The first step that fails
    pub fn apply<S>(&self, tree: RawTree, schema: &S) -> Result<RawTree, TransformError>
    where
        S: BlockSchema + ?Sized,
    {
        self.steps.iter().try_fold(tree, |tree, step| {
            apply_changes(tree, &step.block_path, &step.operation, schema)
        })
    }

    /// Parse a plan from TOML
    ///
    /// # Errors
    /// Returns [`MigrationError::Config`] on malformed TOML, unknown
    /// operations or invalid block paths
    pub fn from_toml_str(text: &str) -> Result<Self, MigrationError> {
        toml::from_str(text).map_err(|e| MigrationError::Config(e.to_string()))
    }
}

impl FromIterator<(Operation, BlockPath)> for MigrationPlan {
    fn from_iter<I: IntoIterator<Item = (Operation, BlockPath)>>(iter: I) -> Self {
        Self {
            steps: iter
                .into_iter()
                .map(|(operation, block_path)| PlanStep {
                    block_path,
                    operation,
                })
                .collect(),
        }
    }
}
