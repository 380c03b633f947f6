//! Conversion settings shared by every pipeline stage.
//!
//! The defaults reproduce the canonical output format (`p001`, `r001`,
//! POSIX two-digit-year window). Alternate values are loaded by the CLI from
//! a TOML file and must pass [`ConvertConfig::validate`] before use.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest zero-padding width accepted for generated ids.
pub const MAX_ID_WIDTH: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// Prefix for generated person ids (`p` in `p001`).
    pub person_id_prefix: String,
    /// Prefix for generated relationship ids (`r` in `r001`).
    pub relationship_id_prefix: String,
    /// Minimum number of digits in generated ids. Larger counters are not truncated.
    pub id_width: usize,
    /// Two-digit years at or above the pivot land in the 1900s, below it in the 2000s.
    pub two_digit_year_pivot: u8,
    /// Surface relationship endpoints that have no person behind them.
    pub report_dangling_references: bool,
    /// Fill `maidenName` from a later `NAME` entry whose `TYPE` is `maiden`.
    pub maiden_names: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            person_id_prefix: "p".to_string(),
            relationship_id_prefix: "r".to_string(),
            id_width: 3,
            two_digit_year_pivot: 69,
            report_dangling_references: true,
            maiden_names: false,
        }
    }
}

impl ConvertConfig {
    /// Check the settings for values that would produce ambiguous output.
    ///
    /// # Errors
    /// - [`ConfigError::EmptyPrefix`] when either id prefix is blank.
    /// - [`ConfigError::DuplicatePrefix`] when people and relationships share a prefix.
    /// - [`ConfigError::InvalidIdWidth`] when `id_width` is zero or above [`MAX_ID_WIDTH`].
    /// - [`ConfigError::InvalidPivot`] when the pivot is not a two-digit year.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.person_id_prefix.trim().is_empty() {
            return Err(ConfigError::EmptyPrefix {
                field: "person_id_prefix",
            });
        }
        if self.relationship_id_prefix.trim().is_empty() {
            return Err(ConfigError::EmptyPrefix {
                field: "relationship_id_prefix",
            });
        }
        if self.person_id_prefix == self.relationship_id_prefix {
            return Err(ConfigError::DuplicatePrefix {
                prefix: self.person_id_prefix.clone(),
            });
        }
        if self.id_width == 0 || self.id_width > MAX_ID_WIDTH {
            return Err(ConfigError::InvalidIdWidth {
                width: self.id_width,
            });
        }
        if self.two_digit_year_pivot > 99 {
            return Err(ConfigError::InvalidPivot {
                pivot: self.two_digit_year_pivot,
            });
        }
        Ok(())
    }

    /// Format the `ordinal`-th person id (1-based).
    #[must_use]
    pub fn person_id(&self, ordinal: usize) -> String {
        format_sequential_id(&self.person_id_prefix, self.id_width, ordinal)
    }

    /// Format the `ordinal`-th relationship id (1-based).
    #[must_use]
    pub fn relationship_id(&self, ordinal: usize) -> String {
        format_sequential_id(&self.relationship_id_prefix, self.id_width, ordinal)
    }
}

fn format_sequential_id(prefix: &str, width: usize, ordinal: usize) -> String {
    format!("{prefix}{ordinal:0width$}")
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("`{field}` must not be empty")]
    EmptyPrefix { field: &'static str },
    #[error("person and relationship ids cannot share the prefix `{prefix}`")]
    DuplicatePrefix { prefix: String },
    #[error("`id_width` must be between 1 and {max}, got {width}", max = MAX_ID_WIDTH)]
    InvalidIdWidth { width: usize },
    #[error("`two_digit_year_pivot` must be between 0 and 99, got {pivot}")]
    InvalidPivot { pivot: u8 },
}
