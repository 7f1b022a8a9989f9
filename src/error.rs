//! Error types for configuration loading.
//!
//! Gates never fail; these errors only surface while building a
//! [`Governor`](crate::Governor) or as non-fatal diagnostics for dropped rules.

/// Errors produced while loading or compiling configuration.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum ThrottleError {
    /// A regex rule could not be compiled; the rule is skipped.
    #[error("rule #{index}: invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        /// Position of the rule in its configured list.
        index: usize,
        /// Pattern text as configured.
        pattern: String,
        /// Compiler error.
        #[source]
        source: regex::Error,
    },
    /// Two command overrides name the same command once separators are normalized; the
    /// one sorting later is skipped.
    #[error("command override `{command}` duplicates `{normalized}`")]
    DuplicateCommand {
        /// Key as configured.
        command: String,
        /// Normalized command name both keys map to.
        normalized: String,
    },
    /// The configuration document could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl ThrottleError {
    /// Check if this error is a dropped pattern rule.
    pub fn is_invalid_pattern(&self) -> bool {
        matches!(self, Self::InvalidPattern { .. })
    }

    /// Configured position of the offending rule, if the error relates to one.
    pub fn rule_index(&self) -> Option<usize> {
        match self {
            Self::InvalidPattern { index, .. } => Some(*index),
            Self::DuplicateCommand { .. } | Self::Config(_) => None,
        }
    }
}
