//! Rules: named conjunctions of conditions.

use serde::{Deserialize, Serialize};

use crate::condition::{
    Condition, DateCondition, MetaType, MetaTypeCondition, NameCondition, PathCondition,
    SizeCondition,
};
use crate::entry::FileEntry;
use crate::error::{FilterError, FilterResult};

/// A named rule. An entry matches when every present condition holds.
///
/// The meta-type condition is mandatory; the others are optional and at most
/// one of each kind may be present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    name: String,
    meta_type: MetaTypeCondition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name_condition: Option<NameCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    path_condition: Option<PathCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    size_condition: Option<SizeCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    date_condition: Option<DateCondition>,
}

impl Rule {
    /// Create a rule that only constrains the entry type.
    pub fn new(name: impl Into<String>, meta_type: MetaType) -> Self {
        Self {
            name: name.into(),
            meta_type: MetaTypeCondition::new(meta_type),
            name_condition: None,
            path_condition: None,
            size_condition: None,
            date_condition: None,
        }
    }

    /// Build a rule from an unordered list of conditions.
    pub fn from_conditions(
        name: impl Into<String>,
        conditions: impl IntoIterator<Item = Condition>,
    ) -> FilterResult<Self> {
        let name = name.into();
        let mut meta_type = None;
        let mut name_condition = None;
        let mut path_condition = None;
        let mut size_condition = None;
        let mut date_condition = None;

        for condition in conditions {
            let kind = condition.kind();
            let duplicate = match condition {
                Condition::MetaType(c) => meta_type.replace(c).is_some(),
                Condition::Name(c) => name_condition.replace(c).is_some(),
                Condition::Path(c) => path_condition.replace(c).is_some(),
                Condition::Size(c) => size_condition.replace(c).is_some(),
                Condition::Date(c) => date_condition.replace(c).is_some(),
            };
            if duplicate {
                return Err(FilterError::DuplicateCondition { rule: name, kind });
            }
        }

        let Some(meta_type) = meta_type else {
            return Err(FilterError::MissingMetaType { rule: name });
        };

        Ok(Self {
            name,
            meta_type,
            name_condition,
            path_condition,
            size_condition,
            date_condition,
        })
    }

    pub fn with_name(mut self, condition: NameCondition) -> Self {
        self.name_condition = Some(condition);
        self
    }

    pub fn with_path(mut self, condition: PathCondition) -> Self {
        self.path_condition = Some(condition);
        self
    }

    pub fn with_size(mut self, condition: SizeCondition) -> Self {
        self.size_condition = Some(condition);
        self
    }

    pub fn with_date(mut self, condition: DateCondition) -> Self {
        self.date_condition = Some(condition);
        self
    }

    /// Rule name, unique within its set.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn meta_type(&self) -> MetaType {
        self.meta_type.meta_type
    }

    pub fn name_condition(&self) -> Option<&NameCondition> {
        self.name_condition.as_ref()
    }

    pub fn path_condition(&self) -> Option<&PathCondition> {
        self.path_condition.as_ref()
    }

    pub fn size_condition(&self) -> Option<&SizeCondition> {
        self.size_condition.as_ref()
    }

    pub fn date_condition(&self) -> Option<&DateCondition> {
        self.date_condition.as_ref()
    }

    /// Present conditions, meta-type first.
    pub fn conditions(&self) -> Vec<Condition> {
        let mut conditions = vec![Condition::MetaType(self.meta_type)];
        conditions.extend(self.name_condition.clone().map(Condition::Name));
        conditions.extend(self.path_condition.clone().map(Condition::Path));
        conditions.extend(self.size_condition.map(Condition::Size));
        conditions.extend(self.date_condition.map(Condition::Date));
        conditions
    }

    /// Check whether the entry satisfies every condition.
    pub fn matches(&self, entry: &FileEntry) -> bool {
        // Cheapest check first.
        if !self.meta_type.matches(entry) {
            return false;
        }
        self.name_condition.as_ref().is_none_or(|c| c.matches(entry))
            && self.path_condition.as_ref().is_none_or(|c| c.matches(entry))
            && self.size_condition.as_ref().is_none_or(|c| c.matches(entry))
            && self.date_condition.as_ref().is_none_or(|c| c.matches(entry))
    }
}
