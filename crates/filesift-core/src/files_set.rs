//! Filter sets: named, ordered collections of rules.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::entry::FileEntry;
use crate::error::{FilterError, FilterResult};
use crate::rule::Rule;

/// A named collection of rules.
///
/// Rules are kept in declared order and evaluated in that order; the first
/// rule that matches wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FilesSetRepr")]
pub struct FilesSet {
    name: String,
    description: String,
    ignores_known_files: bool,
    includes_unallocated_space: bool,
    rules: IndexMap<String, Rule>,
}

/// Stored form of a set; loading goes back through [`FilesSet::new`].
#[derive(Deserialize)]
struct FilesSetRepr {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    ignores_known_files: bool,
    #[serde(default = "default_true")]
    includes_unallocated_space: bool,
    #[serde(default)]
    rules: IndexMap<String, Rule>,
}

impl TryFrom<FilesSetRepr> for FilesSet {
    type Error = FilterError;

    fn try_from(repr: FilesSetRepr) -> Result<Self, Self::Error> {
        if let Some((key, rule)) = repr.rules.iter().find(|(key, rule)| *key != rule.name()) {
            return Err(FilterError::RuleKeyMismatch {
                set: repr.name.clone(),
                key: key.clone(),
                rule: rule.name().to_string(),
            });
        }
        FilesSet::new(
            repr.name,
            repr.description,
            repr.ignores_known_files,
            repr.includes_unallocated_space,
            repr.rules.into_values(),
        )
    }
}

fn default_true() -> bool {
    true
}

impl FilesSet {
    /// Create a set from rules given in evaluation order.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        ignores_known_files: bool,
        includes_unallocated_space: bool,
        rules: impl IntoIterator<Item = Rule>,
    ) -> FilterResult<Self> {
        let mut set = Self {
            name: name.into(),
            description: description.into(),
            ignores_known_files,
            includes_unallocated_space,
            rules: IndexMap::new(),
        };
        for rule in rules {
            set.push_rule(rule)?;
        }
        Ok(set)
    }

    /// A set holding exactly one rule; cannot fail.
    pub(crate) fn with_single_rule(
        name: impl Into<String>,
        description: impl Into<String>,
        ignores_known_files: bool,
        includes_unallocated_space: bool,
        rule: Rule,
    ) -> Self {
        let mut rules = IndexMap::with_capacity(1);
        rules.insert(rule.name().to_string(), rule);
        Self {
            name: name.into(),
            description: description.into(),
            ignores_known_files,
            includes_unallocated_space,
            rules,
        }
    }

    /// Append a rule after the existing ones.
    pub fn push_rule(&mut self, rule: Rule) -> FilterResult<()> {
        if self.rules.contains_key(rule.name()) {
            return Err(FilterError::DuplicateRule {
                set: self.name.clone(),
                rule: rule.name().to_string(),
            });
        }
        self.rules.insert(rule.name().to_string(), rule);
        Ok(())
    }

    /// Remove a rule, keeping the order of the rest.
    pub fn remove_rule(&mut self, name: &str) -> Option<Rule> {
        self.rules.shift_remove(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn ignores_known_files(&self) -> bool {
        self.ignores_known_files
    }

    pub fn includes_unallocated_space(&self) -> bool {
        self.includes_unallocated_space
    }

    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rules.get(name)
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.values()
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Name of the first rule the entry satisfies, if any.
    pub fn matches(&self, entry: &FileEntry) -> Option<&str> {
        if self.ignores_known_files && entry.known {
            return None;
        }
        if entry.unallocated && !self.includes_unallocated_space {
            return None;
        }
        self.rules
            .values()
            .find(|rule| rule.matches(entry))
            .map(Rule::name)
    }

    /// Same as [`matches`](Self::matches); the name ingest code uses.
    pub fn classify(&self, entry: &FileEntry) -> Option<&str> {
        self.matches(entry)
    }
}
