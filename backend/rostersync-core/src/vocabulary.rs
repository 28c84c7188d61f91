// src/vocabulary.rs
use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ConfigError;

static LABEL_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r".*\((.*)\)").expect("label pattern is a valid regex"));

/// Default keyword -> code pairs, in precedence order.
pub const DEFAULT_SHIFT_MAPPINGS: [(&str, &str); 6] = [
    ("小夜", "上"),
    ("白班", "白"),
    ("大夜", "下"),
    ("夜班", "夜"),
    ("42054", "乘"),
    ("42051", "乘"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftEntry {
    pub keyword: String,
    pub code: String,
}

impl ShiftEntry {
    /// Canonical label for a shift block, `keyword(code)`.
    pub fn label(&self) -> String {
        format!("{}({})", self.keyword, self.code)
    }
}

/// Ordered shift keywords. When several keywords prefix the same cell, the earliest entry wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftVocabulary {
    entries: Vec<ShiftEntry>,
}

impl Default for ShiftVocabulary {
    fn default() -> Self {
        Self {
            entries: DEFAULT_SHIFT_MAPPINGS
                .iter()
                .map(|(k, c)| ShiftEntry {
                    keyword: k.to_string(),
                    code: c.to_string(),
                })
                .collect(),
        }
    }
}

impl ShiftVocabulary {
    pub fn from_pairs<I, K, C>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, C)>,
        K: Into<String>,
        C: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        for (keyword, code) in pairs {
            let keyword: String = keyword.into();
            let code: String = code.into();
            if keyword.is_empty() || code.is_empty() {
                return Err(ConfigError::MalformedMapping(format!("{}={}", keyword, code)));
            }
            if !seen.insert(keyword.clone()) {
                return Err(ConfigError::DuplicateKeyword(keyword));
            }
            entries.push(ShiftEntry { keyword, code });
        }
        Ok(Self { entries })
    }

    /// Parses `keyword=code,keyword=code`.
    pub fn parse(mappings: &str) -> Result<Self, ConfigError> {
        let mut pairs = Vec::new();
        for item in mappings.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (keyword, code) = item
                .split_once('=')
                .ok_or_else(|| ConfigError::MalformedMapping(item.to_string()))?;
            pairs.push((keyword.trim().to_string(), code.trim().to_string()));
        }
        Self::from_pairs(pairs)
    }

    pub fn entries(&self) -> &[ShiftEntry] {
        &self.entries
    }

    /// First entry whose keyword prefixes `text`.
    pub fn match_prefix(&self, text: &str) -> Option<&ShiftEntry> {
        self.entries.iter().find(|e| text.starts_with(e.keyword.as_str()))
    }

    pub fn starts_shift(&self, text: &str) -> bool {
        self.match_prefix(text).is_some()
    }
}

/// Extracts the code from a `keyword(code)` label.
pub fn code_from_label(label: &str) -> Option<&str> {
    LABEL_CODE_RE
        .captures(label)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
