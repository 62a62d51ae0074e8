//! FILENAME: core/engine/src/filter.rs
//! PURPOSE: Wildcard filters over cell titles.
//! CONTEXT: A filter request maps column ids to patterns. `*` stands for one
//! or more characters, everything else is literal, matching is
//! case-insensitive and unanchored. A row passes only when every pattern
//! matches (AND).

use crate::column::ColumnRegistry;
use crate::error::{EngineError, Result};
use crate::store::Row;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// Column key → wildcard pattern, as sent by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterCriteria(pub BTreeMap<String, String>);

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.0.insert(column.into(), pattern.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Translates a wildcard pattern into a regex.
pub fn wildcard_regex(pattern: &str) -> std::result::Result<Regex, regex::Error> {
    let translated = regex::escape(pattern).replace(r"\*", ".+");
    RegexBuilder::new(&translated).case_insensitive(true).build()
}

struct Matcher {
    /// Column position, or `None` when the key names no filterable column.
    position: Option<usize>,
    regex: Regex,
}

/// Filter criteria compiled against a column registry.
pub struct CompiledFilter {
    matchers: SmallVec<[Matcher; 4]>,
}

impl CompiledFilter {
    pub fn compile(criteria: &FilterCriteria, columns: &ColumnRegistry) -> Result<Self> {
        let mut matchers = SmallVec::new();

        for (key, pattern) in &criteria.0 {
            let regex = wildcard_regex(pattern).map_err(|source| EngineError::Pattern {
                column: key.clone(),
                source,
            })?;
            let position = columns
                .lookup(key)
                .filter(|c| c.filterable)
                .map(|c| c.id.position());
            matchers.push(Matcher { position, regex });
        }

        Ok(CompiledFilter { matchers })
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    /// True when every pattern matches the title of its cell.
    /// Patterns on unknown or non-filterable columns never match.
    pub fn matches(&self, row: &Row) -> bool {
        let matched = self
            .matchers
            .iter()
            .filter(|m| {
                m.position
                    .and_then(|pos| row.cells.get(pos))
                    .map_or(false, |cell| m.regex.is_match(&cell.title))
            })
            .count();
        matched == self.matchers.len()
    }
}
