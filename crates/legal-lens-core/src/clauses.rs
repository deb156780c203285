//! Clause categories and validation of the model's structured output.
//!
//! The clause extraction prompt asks for a bare JSON object, but the model is
//! free to ignore that. Everything coming back is treated as untrusted:
//! fences are stripped, the JSON is parsed, and every category is checked
//! before a [`ClauseCategories`] is built.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// One of the fixed buckets clauses are sorted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClauseCategory {
    Liability,
    Termination,
    Confidentiality,
}

impl ClauseCategory {
    pub const ALL: [ClauseCategory; 3] = [
        ClauseCategory::Liability,
        ClauseCategory::Termination,
        ClauseCategory::Confidentiality,
    ];

    /// JSON key used for this category.
    pub fn key(&self) -> &'static str {
        match self {
            ClauseCategory::Liability => "liability",
            ClauseCategory::Termination => "termination",
            ClauseCategory::Confidentiality => "confidentiality",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.key() == key)
    }
}

impl fmt::Display for ClauseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Extracted clauses, one ordered list per category.
///
/// Always serializes with exactly the three category keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClauseCategories {
    pub liability: Vec<String>,
    pub termination: Vec<String>,
    pub confidentiality: Vec<String>,
}

impl ClauseCategories {
    pub fn get(&self, category: ClauseCategory) -> &[String] {
        match category {
            ClauseCategory::Liability => &self.liability,
            ClauseCategory::Termination => &self.termination,
            ClauseCategory::Confidentiality => &self.confidentiality,
        }
    }

    fn get_mut(&mut self, category: ClauseCategory) -> &mut Vec<String> {
        match category {
            ClauseCategory::Liability => &mut self.liability,
            ClauseCategory::Termination => &mut self.termination,
            ClauseCategory::Confidentiality => &mut self.confidentiality,
        }
    }

    /// Iterate categories in their fixed order.
    pub fn iter(&self) -> impl Iterator<Item = (ClauseCategory, &[String])> {
        ClauseCategory::ALL.into_iter().map(|c| (c, self.get(c)))
    }

    /// Total number of clauses across all categories.
    pub fn total(&self) -> usize {
        self.iter().map(|(_, clauses)| clauses.len()).sum()
    }
}

#[derive(Error, Debug)]
pub enum ClauseParseError {
    #[error("clause output is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("clause output is not a JSON object")]
    NotAnObject,
    #[error("category \"{category}\" is invalid: {reason}")]
    InvalidCategory {
        category: ClauseCategory,
        reason: String,
    },
}

/// Remove markdown code fences the model may wrap around its JSON.
///
/// Only a response that begins with a fence is unwrapped: the opening fence,
/// an optional `json` language tag and a trailing fence are removed. Backticks
/// inside the body are left alone. Anything else is returned trimmed.
pub fn strip_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = strip_json_tag(rest);
    body.strip_suffix("```").unwrap_or(body).trim()
}

fn strip_json_tag(s: &str) -> &str {
    if s.get(..4).is_some_and(|tag| tag.eq_ignore_ascii_case("json")) {
        &s[4..]
    } else {
        s
    }
}

/// A fenced block surrounded by prose: the text between the first and the
/// last fence.
fn embedded_block(raw: &str) -> Option<&str> {
    let start = raw.find("```")? + 3;
    let end = raw.rfind("```")?;
    (end >= start).then(|| strip_json_tag(&raw[start..end]).trim())
}

/// Parse and validate clause-extraction output.
///
/// Policy for responses that do not match the requested shape exactly:
/// - a missing category, or one set to `null`, becomes an empty list;
/// - keys outside the three categories are dropped (and logged);
/// - anything else (not an object, a category that is not an array of
///   strings) is an error.
pub fn parse_clauses(raw: &str) -> Result<ClauseCategories, ClauseParseError> {
    let value = match serde_json::from_str::<Value>(strip_fences(raw)) {
        Ok(value) => value,
        Err(e) => match embedded_block(raw) {
            Some(block) => serde_json::from_str::<Value>(block).map_err(|_| e)?,
            None => return Err(e.into()),
        },
    };
    let Value::Object(map) = value else {
        return Err(ClauseParseError::NotAnObject);
    };

    let mut clauses = ClauseCategories::default();
    let mut unknown = Vec::new();

    for (key, value) in map {
        let Some(category) = ClauseCategory::from_key(&key) else {
            unknown.push(key);
            continue;
        };
        *clauses.get_mut(category) = clause_list(category, value)?;
    }

    if !unknown.is_empty() {
        tracing::warn!(keys = ?unknown, "dropping unknown clause categories from model output");
    }

    Ok(clauses)
}

fn clause_list(category: ClauseCategory, value: Value) -> Result<Vec<String>, ClauseParseError> {
    let items = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Array(items) => items,
        other => {
            return Err(ClauseParseError::InvalidCategory {
                category,
                reason: format!("expected an array, found {}", json_type(&other)),
            });
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::String(s) => Ok(s),
            other => Err(ClauseParseError::InvalidCategory {
                category,
                reason: format!("item {} is {}, not a string", i, json_type(&other)),
            }),
        })
        .collect()
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
