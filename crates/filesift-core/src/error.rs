//! Error types for building rules and filter sets.

use thiserror::Error;

/// Errors raised while constructing conditions, rules or filter sets.
///
/// Evaluation never fails; everything that can go wrong is rejected up front
/// so an invalid set can never reach a stored collection.
#[derive(Debug, Error)]
pub enum FilterError {
    /// A regular expression pattern failed to compile.
    #[error("Malformed pattern '{pattern}': {source}")]
    MalformedPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A name or path pattern was empty.
    #[error("Pattern cannot be empty")]
    EmptyPattern,

    /// A rule was built without a meta-type condition.
    #[error("Rule '{rule}' has no meta-type condition")]
    MissingMetaType { rule: String },

    /// A rule was given two conditions of the same kind.
    #[error("Rule '{rule}' has more than one {kind} condition")]
    DuplicateCondition { rule: String, kind: &'static str },

    /// Two rules in one set share a name.
    #[error("Filter set '{set}' already contains a rule named '{rule}'")]
    DuplicateRule { set: String, rule: String },

    /// A stored rule is filed under a key other than its own name.
    #[error("Filter set '{set}' stores rule '{rule}' under key '{key}', which does not match its name")]
    RuleKeyMismatch {
        set: String,
        key: String,
        rule: String,
    },
}

impl FilterError {
    /// Wrap a regex compile failure with the offending pattern.
    pub fn malformed(pattern: impl Into<String>, source: regex::Error) -> Self {
        Self::MalformedPattern {
            pattern: pattern.into(),
            source,
        }
    }
}

/// Result type for rule construction.
pub type FilterResult<T> = Result<T, FilterError>;
