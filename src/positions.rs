use std::fmt;

use serde::{Deserialize, Serialize};

/// Normalized position label shared by every athlete of the same role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionCode(String);

impl PositionCode {
    pub fn new(code: &str) -> Self {
        Self(code.trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PositionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionAlias {
    pub label: String,
    pub code: PositionCode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionKeyword {
    pub keyword: String,
    pub code: PositionCode,
}

/// Free-text position label → `PositionCode` lookup.
#[derive(Debug, Clone, Default)]
pub struct PositionTable {
    aliases: Vec<PositionAlias>,
    keywords: Vec<PositionKeyword>,
    known: Vec<PositionCode>,
}

impl PositionTable {
    pub fn new(
        aliases: Vec<PositionAlias>,
        keywords: Vec<PositionKeyword>,
        known: Vec<PositionCode>,
    ) -> Self {
        let keywords = keywords
            .into_iter()
            .map(|k| PositionKeyword {
                keyword: k.keyword.trim().to_uppercase(),
                code: k.code,
            })
            .collect();
        Self {
            aliases,
            keywords,
            known,
        }
    }

    /// Resolve a raw label. Order: exact alias, alias ignoring case, label already a code,
    /// first code contained in the label (table order), first keyword contained in the label.
    pub fn normalize(&self, label: &str) -> Option<PositionCode> {
        let trimmed = label.trim();
        if trimmed.is_empty() {
            return None;
        }
        if let Some(alias) = self.aliases.iter().find(|a| a.label == trimmed) {
            return Some(alias.code.clone());
        }
        let upper = trimmed.to_uppercase();
        if let Some(alias) = self
            .aliases
            .iter()
            .find(|a| a.label.to_uppercase() == upper)
        {
            return Some(alias.code.clone());
        }
        if let Some(code) = self.known.iter().find(|c| c.as_str() == upper) {
            return Some(code.clone());
        }
        if let Some(code) = self.known.iter().find(|c| upper.contains(c.as_str())) {
            return Some(code.clone());
        }
        self.keywords
            .iter()
            .find(|k| upper.contains(&k.keyword))
            .map(|k| k.code.clone())
    }
}

pub fn normalize_position(label: &str, table: &PositionTable) -> Option<PositionCode> {
    table.normalize(label)
}
