//! Read-only adapter for the legacy XML definitions document.
//!
//! The legacy document looks like this:
//!
//! ```xml
//! <INTERESTING_FILE_SETS>
//!   <INTERESTING_FILE_SET name="Executables" description="" ignoreKnown="true">
//!     <EXTENSION name="exe" typeFilter="file">exe</EXTENSION>
//!     <NAME name="autorun" typeFilter="files_and_dirs" pathFilter="/Windows/">autorun.inf</NAME>
//!   </INTERESTING_FILE_SET>
//! </INTERESTING_FILE_SETS>
//! ```
//!
//! It is only ever read, to migrate old definitions into the current format.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use filesift_core::{FilesSet, MetaType, NameCondition, PathCondition, Rule};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::Definitions;
use crate::error::{DefinitionsError, DefinitionsResult};
use crate::settings::DefinitionsSource;

const ROOT_TAG: &str = "INTERESTING_FILE_SETS";
const FILE_SET_TAG: &str = "INTERESTING_FILE_SET";
const NAME_RULE_TAG: &str = "NAME";
const EXTENSION_RULE_TAG: &str = "EXTENSION";

const NAME_ATTR: &str = "name";
const DESC_ATTR: &str = "description";
const IGNORE_KNOWN_FILES_ATTR: &str = "ignoreKnown";
const IGNORE_UNALLOCATED_ATTRS: [&str; 2] = ["ignoreUnallocated", "ingoreUnallocated"];
const TYPE_FILTER_ATTR: &str = "typeFilter";
const REGEX_ATTR: &str = "regex";
const PATH_FILTER_ATTR: &str = "pathFilter";
const PATH_REGEX_ATTR: &str = "pathRegex";

/// The legacy XML definitions document.
#[derive(Debug, Clone)]
pub struct LegacyXmlFile {
    path: PathBuf,
}

impl LegacyXmlFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse a legacy document from text.
    pub fn parse(&self, text: &str) -> DefinitionsResult<Definitions> {
        LegacyParser::new(&self.path).parse(text)
    }
}

impl DefinitionsSource for LegacyXmlFile {
    fn describe(&self) -> String {
        format!("{} (legacy)", self.path.display())
    }

    fn read(&self) -> DefinitionsResult<Option<Definitions>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(DefinitionsError::io(&self.path, e)),
        };
        self.parse(&text).map(Some)
    }
}

type Attributes = HashMap<String, String>;

/// A rule element whose text content is still being collected.
struct PendingRule {
    tag: String,
    attributes: Attributes,
    pattern: String,
}

/// A set element whose rules are still being collected.
struct PendingSet {
    name: String,
    description: String,
    ignores_known_files: bool,
    includes_unallocated_space: bool,
    rules: Vec<Rule>,
}

struct LegacyParser<'a> {
    path: &'a Path,
}

impl<'a> LegacyParser<'a> {
    fn new(path: &'a Path) -> Self {
        Self { path }
    }

    fn malformed(&self, message: impl Into<String>) -> DefinitionsError {
        DefinitionsError::malformed(self.path, message)
    }

    fn parse(&self, text: &str) -> DefinitionsResult<Definitions> {
        let mut reader = Reader::from_str(text);
        reader.config_mut().trim_text(true);

        let mut definitions = Definitions::new();
        let mut seen_root = false;
        let mut current_set: Option<PendingSet> = None;
        let mut current_rule: Option<PendingRule> = None;

        loop {
            let event = reader.read_event().map_err(|e| {
                self.malformed(format!("at byte {}: {e}", reader.buffer_position()))
            })?;

            match event {
                Event::Start(ref element) | Event::Empty(ref element) => {
                    let is_empty = matches!(event, Event::Empty(_));
                    let tag = tag_name(element);

                    if !seen_root {
                        if tag != ROOT_TAG {
                            return Err(self.malformed(format!(
                                "expected root element <{ROOT_TAG}>, found <{tag}>"
                            )));
                        }
                        seen_root = true;
                        continue;
                    }

                    match tag.as_str() {
                        FILE_SET_TAG => {
                            if current_set.is_some() {
                                return Err(self.malformed("nested filter set element"));
                            }
                            let set = self.begin_set(&self.attributes(element)?)?;
                            if is_empty {
                                self.finish_set(set, &mut definitions)?;
                            } else {
                                current_set = Some(set);
                            }
                        }
                        NAME_RULE_TAG | EXTENSION_RULE_TAG => {
                            let Some(set) = current_set.as_mut() else {
                                return Err(self.malformed(format!(
                                    "<{tag}> rule outside of a filter set"
                                )));
                            };
                            let pending = PendingRule {
                                tag: tag.clone(),
                                attributes: self.attributes(element)?,
                                pattern: String::new(),
                            };
                            if is_empty {
                                set.rules.push(self.build_rule(pending)?);
                            } else {
                                current_rule = Some(pending);
                            }
                        }
                        other => {
                            tracing::debug!(element = other, "ignoring unknown legacy element");
                        }
                    }
                }
                Event::Text(ref content) => {
                    if let Some(rule) = current_rule.as_mut() {
                        let content = content
                            .unescape()
                            .map_err(|e| self.malformed(e.to_string()))?;
                        rule.pattern.push_str(&content);
                    }
                }
                Event::CData(ref content) => {
                    if let Some(rule) = current_rule.as_mut() {
                        let content = std::str::from_utf8(content)
                            .map_err(|e| self.malformed(e.to_string()))?;
                        rule.pattern.push_str(content);
                    }
                }
                Event::End(ref element) => {
                    let tag = String::from_utf8_lossy(element.name().as_ref()).into_owned();
                    match tag.as_str() {
                        NAME_RULE_TAG | EXTENSION_RULE_TAG => {
                            if let Some(pending) = current_rule.take() {
                                let rule = self.build_rule(pending)?;
                                if let Some(set) = current_set.as_mut() {
                                    set.rules.push(rule);
                                }
                            }
                        }
                        FILE_SET_TAG => {
                            if let Some(set) = current_set.take() {
                                self.finish_set(set, &mut definitions)?;
                            }
                        }
                        _ => {}
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !seen_root {
            return Err(self.malformed("document has no root element"));
        }
        if current_set.is_some() || current_rule.is_some() {
            return Err(self.malformed("unexpected end of document"));
        }
        Ok(definitions)
    }

    fn attributes(&self, element: &BytesStart<'_>) -> DefinitionsResult<Attributes> {
        element
            .attributes()
            .map(|attr| {
                let attr = attr.map_err(|e| self.malformed(e.to_string()))?;
                let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                let value = attr
                    .unescape_value()
                    .map_err(|e| self.malformed(e.to_string()))?
                    .into_owned();
                Ok((key, value))
            })
            .collect()
    }

    fn begin_set(&self, attributes: &Attributes) -> DefinitionsResult<PendingSet> {
        let name = attributes
            .get(NAME_ATTR)
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| self.malformed("filter set without a name"))?;

        let ignores_unallocated = IGNORE_UNALLOCATED_ATTRS
            .iter()
            .find_map(|attr| attributes.get(*attr))
            .map(|v| self.parse_bool(v))
            .transpose()?
            .unwrap_or(false);

        Ok(PendingSet {
            description: attributes.get(DESC_ATTR).cloned().unwrap_or_default(),
            ignores_known_files: self.bool_attr(attributes, IGNORE_KNOWN_FILES_ATTR)?,
            includes_unallocated_space: !ignores_unallocated,
            rules: Vec::new(),
            name,
        })
    }

    fn finish_set(&self, set: PendingSet, definitions: &mut Definitions) -> DefinitionsResult<()> {
        if definitions.contains_key(&set.name) {
            return Err(self.malformed(format!("duplicate filter set '{}'", set.name)));
        }
        let files_set = FilesSet::new(
            set.name.clone(),
            set.description,
            set.ignores_known_files,
            set.includes_unallocated_space,
            set.rules,
        )
        .map_err(|e| self.malformed(e.to_string()))?;
        definitions.insert(set.name, files_set);
        Ok(())
    }

    fn build_rule(&self, pending: PendingRule) -> DefinitionsResult<Rule> {
        let attrs = &pending.attributes;
        let pattern = pending.pattern.trim().to_string();
        if pattern.is_empty() {
            return Err(self.malformed(format!("<{}> rule without a pattern", pending.tag)));
        }

        let name = attrs
            .get(NAME_ATTR)
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| pattern.clone());

        let meta_type = match attrs.get(TYPE_FILTER_ATTR).map(String::as_str) {
            None | Some("file") => MetaType::Files,
            Some("dir") => MetaType::Directories,
            Some("files_and_dirs") => MetaType::All,
            Some(other) => {
                return Err(self.malformed(format!("rule '{name}' has unknown type '{other}'")));
            }
        };

        let is_regex = self.bool_attr(attrs, REGEX_ATTR)?;
        let name_condition = match (pending.tag.as_str(), is_regex) {
            (_, true) => NameCondition::regex(pattern.as_str()),
            (EXTENSION_RULE_TAG, false) => NameCondition::extension(&pattern),
            _ => NameCondition::full_name(pattern.as_str()),
        }
        .map_err(|e| self.malformed(format!("rule '{name}': {e}")))?;

        let mut rule = Rule::new(name.as_str(), meta_type).with_name(name_condition);

        if let Some(path_filter) = attrs.get(PATH_FILTER_ATTR).filter(|p| !p.trim().is_empty()) {
            let path_condition = if self.bool_attr(attrs, PATH_REGEX_ATTR)? {
                PathCondition::regex(path_filter.as_str())
            } else {
                PathCondition::containing(path_filter.as_str())
            }
            .map_err(|e| self.malformed(format!("rule '{name}': {e}")))?;
            rule = rule.with_path(path_condition);
        }

        Ok(rule)
    }

    fn bool_attr(&self, attributes: &Attributes, key: &str) -> DefinitionsResult<bool> {
        attributes
            .get(key)
            .map(|v| self.parse_bool(v))
            .transpose()
            .map(|v| v.unwrap_or(false))
    }

    fn parse_bool(&self, value: &str) -> DefinitionsResult<bool> {
        match value.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" | "" => Ok(false),
            other => Err(self.malformed(format!("invalid boolean '{other}'"))),
        }
    }
}

fn tag_name(element: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(element.name().as_ref()).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use filesift_core::FileEntry;

    fn parse(text: &str) -> DefinitionsResult<Definitions> {
        LegacyXmlFile::new("/cfg/InterestingFilesSetDefs.xml").parse(text)
    }

    #[test]
    fn test_parse_sets_and_rules() {
        let defs = parse(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <INTERESTING_FILE_SETS>
              <INTERESTING_FILE_SET name="Executables" description="Binaries" ignoreKnown="true">
                <EXTENSION name="exe" typeFilter="file">exe</EXTENSION>
                <NAME name="autorun" typeFilter="files_and_dirs" pathFilter="\Windows\">autorun.inf</NAME>
              </INTERESTING_FILE_SET>
              <INTERESTING_FILE_SET name="Empty" ignoreUnallocated="true"/>
            </INTERESTING_FILE_SETS>"#,
        )
        .unwrap();

        assert_eq!(defs.len(), 2);
        let exes = &defs["Executables"];
        assert_eq!(exes.description(), "Binaries");
        assert!(exes.ignores_known_files());
        assert!(exes.includes_unallocated_space());
        let names: Vec<_> = exes.rules().map(Rule::name).collect();
        assert_eq!(names, vec!["exe", "autorun"]);

        assert_eq!(exes.matches(&FileEntry::file("SETUP.EXE", "/")), Some("exe"));
        assert_eq!(
            exes.matches(&FileEntry::directory("autorun.inf", "/Windows")),
            Some("autorun")
        );
        assert_eq!(exes.matches(&FileEntry::file("autorun.inf", "/Users")), None);

        let empty = &defs["Empty"];
        assert_eq!(empty.rule_count(), 0);
        assert!(!empty.includes_unallocated_space());
    }

    #[test]
    fn test_regex_rule_and_default_name() {
        let defs = parse(
            r#"<INTERESTING_FILE_SETS>
              <INTERESTING_FILE_SET name="Images">
                <NAME regex="true" typeFilter="file">^IMG_\d+\.jpg$</NAME>
              </INTERESTING_FILE_SET>
            </INTERESTING_FILE_SETS>"#,
        )
        .unwrap();

        let rule = defs["Images"].rules().next().unwrap();
        assert_eq!(rule.name(), r"^IMG_\d+\.jpg$");
        assert!(rule.name_condition().unwrap().matcher.is_regex());
    }

    #[test]
    fn test_malformed_documents() {
        let wrong_root = parse("<SETTINGS/>");
        assert!(matches!(wrong_root, Err(DefinitionsError::MalformedLegacy { .. })));

        let bad_regex = parse(
            r#"<INTERESTING_FILE_SETS><INTERESTING_FILE_SET name="x">
                <NAME regex="true">([</NAME>
            </INTERESTING_FILE_SET></INTERESTING_FILE_SETS>"#,
        );
        assert!(bad_regex.is_err());

        let bad_type = parse(
            r#"<INTERESTING_FILE_SETS><INTERESTING_FILE_SET name="x">
                <NAME typeFilter="socket">a</NAME>
            </INTERESTING_FILE_SET></INTERESTING_FILE_SETS>"#,
        );
        assert!(bad_type.is_err());

        let duplicate = parse(
            r#"<INTERESTING_FILE_SETS>
                <INTERESTING_FILE_SET name="x"/><INTERESTING_FILE_SET name="x"/>
            </INTERESTING_FILE_SETS>"#,
        );
        assert!(duplicate.is_err());

        let truncated = parse(r#"<INTERESTING_FILE_SETS><INTERESTING_FILE_SET name="x">"#);
        assert!(truncated.is_err());
    }

    #[test]
    fn test_missing_file_is_none() {
        let legacy = LegacyXmlFile::new("/definitely/not/here/InterestingFilesSetDefs.xml");
        assert!(legacy.read().unwrap().is_none());
    }
}
