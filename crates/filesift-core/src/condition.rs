//! Conditions: single predicates over one attribute of a file entry.

use std::fmt;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::entry::{EntryKind, FileEntry};
use crate::error::{FilterError, FilterResult};

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// How a literal (non-regex) pattern is compared against text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MatchMode {
    /// The whole text equals the pattern.
    #[default]
    Exact,
    /// The text contains the pattern.
    Substring,
    /// The text ends with the pattern. Leading `*` wildcards are ignored.
    Suffix,
}

/// A compiled text pattern shared by name and path conditions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "TextMatcherRepr", into = "TextMatcherRepr")]
pub struct TextMatcher {
    pattern: String,
    mode: MatchMode,
    case_sensitive: bool,
    /// Literal needle after wildcard stripping and case folding.
    needle: String,
    regex: Option<Regex>,
}

impl TextMatcher {
    /// Build a matcher. Regexes are compiled here, once.
    pub fn new(
        pattern: impl Into<String>,
        is_regex: bool,
        mode: MatchMode,
        case_sensitive: bool,
    ) -> FilterResult<Self> {
        let pattern = pattern.into();
        if pattern.is_empty() {
            return Err(FilterError::EmptyPattern);
        }

        let regex = if is_regex {
            let compiled = RegexBuilder::new(&pattern)
                .case_insensitive(!case_sensitive)
                .build()
                .map_err(|e| FilterError::malformed(pattern.as_str(), e))?;
            Some(compiled)
        } else {
            None
        };

        let trimmed = match mode {
            MatchMode::Suffix => pattern.trim_start_matches('*'),
            _ => pattern.as_str(),
        };
        let needle = if case_sensitive {
            trimmed.to_string()
        } else {
            trimmed.to_lowercase()
        };

        Ok(Self {
            pattern,
            mode,
            case_sensitive,
            needle,
            regex,
        })
    }

    /// Case-insensitive literal matcher.
    pub fn literal(pattern: impl Into<String>, mode: MatchMode) -> FilterResult<Self> {
        Self::new(pattern, false, mode, false)
    }

    /// Case-insensitive regular expression matcher.
    pub fn regex(pattern: impl Into<String>) -> FilterResult<Self> {
        Self::new(pattern, true, MatchMode::default(), false)
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_regex(&self) -> bool {
        self.regex.is_some()
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Test a piece of text against the pattern.
    pub fn is_match(&self, text: &str) -> bool {
        if let Some(regex) = &self.regex {
            return regex.is_match(text);
        }

        let folded;
        let text = if self.case_sensitive {
            text
        } else {
            folded = text.to_lowercase();
            folded.as_str()
        };

        match self.mode {
            MatchMode::Exact => text == self.needle,
            MatchMode::Substring => text.contains(self.needle.as_str()),
            MatchMode::Suffix => text.ends_with(self.needle.as_str()),
        }
    }
}

impl PartialEq for TextMatcher {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
            && self.is_regex() == other.is_regex()
            && self.mode == other.mode
            && self.case_sensitive == other.case_sensitive
    }
}

impl Eq for TextMatcher {}

impl fmt::Display for TextMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_regex() {
            write!(f, "/{}/", self.pattern)
        } else {
            write!(f, "{} '{}'", self.mode, self.pattern)
        }
    }
}

/// On-disk form of a matcher; the compiled regex is rebuilt on load.
#[derive(Serialize, Deserialize)]
struct TextMatcherRepr {
    pattern: String,
    #[serde(default)]
    is_regex: bool,
    #[serde(default)]
    mode: MatchMode,
    #[serde(default)]
    case_sensitive: bool,
}

impl TryFrom<TextMatcherRepr> for TextMatcher {
    type Error = FilterError;

    fn try_from(repr: TextMatcherRepr) -> Result<Self, Self::Error> {
        TextMatcher::new(repr.pattern, repr.is_regex, repr.mode, repr.case_sensitive)
    }
}

impl From<TextMatcher> for TextMatcherRepr {
    fn from(matcher: TextMatcher) -> Self {
        Self {
            is_regex: matcher.is_regex(),
            pattern: matcher.pattern,
            mode: matcher.mode,
            case_sensitive: matcher.case_sensitive,
        }
    }
}

/// Matches the entry's base name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameCondition {
    pub matcher: TextMatcher,
}

impl NameCondition {
    pub fn new(matcher: TextMatcher) -> Self {
        Self { matcher }
    }

    /// Exact, case-insensitive full-name match.
    pub fn full_name(name: impl Into<String>) -> FilterResult<Self> {
        TextMatcher::literal(name, MatchMode::Exact).map(Self::new)
    }

    /// Extension match; `"exe"`, `".exe"` and `"*.exe"` are equivalent.
    pub fn extension(extension: &str) -> FilterResult<Self> {
        let bare = extension.trim_start_matches('*').trim_start_matches('.');
        if bare.is_empty() {
            return Err(FilterError::EmptyPattern);
        }
        TextMatcher::literal(format!(".{bare}"), MatchMode::Suffix).map(Self::new)
    }

    pub fn regex(pattern: impl Into<String>) -> FilterResult<Self> {
        TextMatcher::regex(pattern).map(Self::new)
    }

    pub fn matches(&self, entry: &FileEntry) -> bool {
        self.matcher.is_match(&entry.name)
    }
}

/// Matches the entry's full path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathCondition {
    pub matcher: TextMatcher,
}

impl PathCondition {
    pub fn new(matcher: TextMatcher) -> Self {
        Self { matcher }
    }

    /// Case-insensitive substring match, the usual way paths are filtered.
    pub fn containing(fragment: impl Into<String>) -> FilterResult<Self> {
        let fragment = fragment.into().replace('\\', "/");
        TextMatcher::literal(fragment, MatchMode::Substring).map(Self::new)
    }

    pub fn regex(pattern: impl Into<String>) -> FilterResult<Self> {
        TextMatcher::regex(pattern).map(Self::new)
    }

    pub fn matches(&self, entry: &FileEntry) -> bool {
        self.matcher.is_match(&entry.path())
    }
}

/// Which entry types a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
pub enum MetaType {
    #[strum(to_string = "files")]
    Files,
    #[strum(to_string = "directories")]
    Directories,
    #[strum(to_string = "files and directories")]
    All,
}

/// Matches on the entry's type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaTypeCondition {
    pub meta_type: MetaType,
}

impl MetaTypeCondition {
    pub fn new(meta_type: MetaType) -> Self {
        Self { meta_type }
    }

    pub fn matches(&self, entry: &FileEntry) -> bool {
        match self.meta_type {
            MetaType::Files => entry.kind == EntryKind::File,
            MetaType::Directories => entry.kind == EntryKind::Directory,
            MetaType::All => true,
        }
    }
}

/// Comparison operator for size and date conditions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
pub enum Comparator {
    #[serde(rename = "<")]
    #[strum(to_string = "<")]
    Less,
    #[serde(rename = "<=")]
    #[strum(to_string = "<=")]
    LessOrEqual,
    #[serde(rename = "=")]
    #[strum(to_string = "=", serialize = "==")]
    Equal,
    #[serde(rename = ">=")]
    #[strum(to_string = ">=")]
    GreaterOrEqual,
    #[serde(rename = ">")]
    #[strum(to_string = ">")]
    Greater,
}

impl Comparator {
    /// Evaluate `actual <op> expected`.
    pub fn compare<T: PartialOrd>(&self, actual: T, expected: T) -> bool {
        match self {
            Self::Less => actual < expected,
            Self::LessOrEqual => actual <= expected,
            Self::Equal => actual == expected,
            Self::GreaterOrEqual => actual >= expected,
            Self::Greater => actual > expected,
        }
    }
}

/// Units offered when authoring a size condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum SizeUnit {
    #[strum(to_string = "B")]
    Bytes,
    #[strum(to_string = "KB")]
    Kilobytes,
    #[strum(to_string = "MB")]
    Megabytes,
    #[strum(to_string = "GB")]
    Gigabytes,
}

impl SizeUnit {
    pub fn multiplier(&self) -> u64 {
        match self {
            Self::Bytes => 1,
            Self::Kilobytes => 1024,
            Self::Megabytes => 1024 * 1024,
            Self::Gigabytes => 1024 * 1024 * 1024,
        }
    }
}

/// Compares the entry's size in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeCondition {
    pub comparator: Comparator,
    pub size_bytes: u64,
}

impl SizeCondition {
    pub fn new(comparator: Comparator, size_bytes: u64) -> Self {
        Self {
            comparator,
            size_bytes,
        }
    }

    pub fn with_unit(comparator: Comparator, value: u64, unit: SizeUnit) -> Self {
        Self::new(comparator, value.saturating_mul(unit.multiplier()))
    }

    pub fn matches(&self, entry: &FileEntry) -> bool {
        entry
            .size
            .is_some_and(|size| self.comparator.compare(size, self.size_bytes))
    }
}

/// Compares the entry's modification time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateCondition {
    pub comparator: Comparator,
    pub epoch_seconds: i64,
}

impl DateCondition {
    pub fn new(comparator: Comparator, epoch_seconds: i64) -> Self {
        Self {
            comparator,
            epoch_seconds,
        }
    }

    /// Modified within the last `days` days, measured from now.
    pub fn modified_within_days(days: u32) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self::new(
            Comparator::GreaterOrEqual,
            now - i64::from(days) * SECONDS_PER_DAY,
        )
    }

    pub fn matches(&self, entry: &FileEntry) -> bool {
        entry
            .modified
            .is_some_and(|modified| self.comparator.compare(modified, self.epoch_seconds))
    }
}

/// Any single condition a rule can hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    Name(NameCondition),
    Path(PathCondition),
    MetaType(MetaTypeCondition),
    Size(SizeCondition),
    Date(DateCondition),
}

impl Condition {
    /// Short name of the condition kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Name(_) => "name",
            Self::Path(_) => "path",
            Self::MetaType(_) => "meta-type",
            Self::Size(_) => "size",
            Self::Date(_) => "date",
        }
    }

    pub fn matches(&self, entry: &FileEntry) -> bool {
        match self {
            Self::Name(c) => c.matches(entry),
            Self::Path(c) => c.matches(entry),
            Self::MetaType(c) => c.matches(entry),
            Self::Size(c) => c.matches(entry),
            Self::Date(c) => c.matches(entry),
        }
    }
}

impl From<NameCondition> for Condition {
    fn from(c: NameCondition) -> Self {
        Self::Name(c)
    }
}

impl From<PathCondition> for Condition {
    fn from(c: PathCondition) -> Self {
        Self::Path(c)
    }
}

impl From<MetaTypeCondition> for Condition {
    fn from(c: MetaTypeCondition) -> Self {
        Self::MetaType(c)
    }
}

impl From<SizeCondition> for Condition {
    fn from(c: SizeCondition) -> Self {
        Self::Size(c)
    }
}

impl From<DateCondition> for Condition {
    fn from(c: DateCondition) -> Self {
        Self::Date(c)
    }
}
