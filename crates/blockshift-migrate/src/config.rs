//! Migration configuration

use crate::error::MigrationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Which snapshots besides live and latest get migrated
///
/// Serialized as `"all"` or an RFC 3339 timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RevisionsFrom {
    /// Every snapshot
    #[default]
    All,
    /// Snapshots created strictly after the instant
    After(DateTime<Utc>),
}

impl RevisionsFrom {
    /// Whether a snapshot created at `created_at` is selected
    #[inline]
    #[must_use]
    pub fn includes(&self, created_at: &DateTime<Utc>) -> bool {
        match self {
            Self::All => true,
            Self::After(cutoff) => created_at > cutoff,
        }
    }
}

impl std::fmt::Display for RevisionsFrom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::After(cutoff) => f.write_str(&cutoff.to_rfc3339()),
        }
    }
}

impl FromStr for RevisionsFrom {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        let cutoff = DateTime::parse_from_rfc3339(s)?;
        Ok(Self::After(cutoff.with_timezone(&Utc)))
    }
}

impl TryFrom<String> for RevisionsFrom {
    type Error = chrono::ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<RevisionsFrom> for String {
    fn from(revisions: RevisionsFrom) -> Self {
        revisions.to_string()
    }
}

/// Orchestrator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// Snapshot payload key holding the serialized tree
    pub field_name: String,
    /// Snapshot selection for non live, non latest snapshots
    pub revisions_from: RevisionsFrom,
    /// Record fatal per-record failures and move on instead of aborting
    pub continue_on_record_error: bool,
}

impl MigrationConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With snapshot payload field
    #[inline]
    #[must_use]
    pub fn with_field_name(mut self, field_name: impl Into<String>) -> Self {
        self.field_name = field_name.into();
        self
    }

    /// With snapshot selection
    #[inline]
    #[must_use]
    pub fn with_revisions_from(mut self, revisions_from: RevisionsFrom) -> Self {
        self.revisions_from = revisions_from;
        self
    }

    /// Only migrate other snapshots created after `cutoff`
    #[inline]
    #[must_use]
    pub fn with_revisions_after(self, cutoff: DateTime<Utc>) -> Self {
        self.with_revisions_from(RevisionsFrom::After(cutoff))
    }

    #[inline]
    #[must_use]
    pub fn with_continue_on_record_error(mut self, continue_on_record_error: bool) -> Self {
        self.continue_on_record_error = continue_on_record_error;
        self
    }

    /// Parse configuration from TOML; missing keys take their defaults
    ///
    /// # Errors
    /// Returns [`MigrationError::Config`] on malformed TOML or values
    pub fn from_toml_str(text: &str) -> Result<Self, MigrationError> {
        toml::from_str(text).map_err(|e| MigrationError::Config(e.to_string()))
    }
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            field_name: "content".to_owned(),
            revisions_from: RevisionsFrom::All,
            continue_on_record_error: false,
        }
    }
}
