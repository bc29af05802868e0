//! Canonical view model shared by the normalizer, controller and renderer.
//!
//! The serde attributes describe the backend's JSON wire form: publication
//! keys are capitalised (`Title`, `Year`, ...) and the indices may arrive as
//! numbers or as strings such as `"N/A"`.

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::sync::OnceLock;

/// Author profile as shown on the profile card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Profile {
    /// Display name
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,
    /// Institution / affiliation line
    #[serde(default, deserialize_with = "lenient_text")]
    pub affiliation: String,
    /// Photo URL
    #[serde(default, deserialize_with = "optional_text")]
    pub photo: Option<String>,
    /// h-index
    #[serde(default, deserialize_with = "optional_index")]
    pub h_index: Option<u32>,
    /// i10-index
    #[serde(default, deserialize_with = "optional_index")]
    pub i10_index: Option<u32>,
}

impl Profile {
    /// Profile with only a name and affiliation (the HTML path yields these).
    pub fn named(name: impl Into<String>, affiliation: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            affiliation: affiliation.into(),
            ..Default::default()
        }
    }

    /// The h-index/i10-index pair, only when both are known.
    pub fn indices(&self) -> Option<(u32, u32)> {
        self.h_index.zip(self.i10_index)
    }
}

/// One publication row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Publication {
    #[serde(rename = "Title", alias = "title", default, deserialize_with = "lenient_text")]
    pub title: String,
    #[serde(rename = "Year", alias = "year", default, deserialize_with = "lenient_text")]
    pub year: String,
    #[serde(rename = "Type", alias = "type", default, deserialize_with = "lenient_text")]
    pub kind: String,
    #[serde(rename = "Venue", alias = "venue", default, deserialize_with = "lenient_text")]
    pub venue: String,
}

impl Publication {
    pub fn new(
        title: impl Into<String>,
        year: impl Into<String>,
        kind: impl Into<String>,
        venue: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            year: year.into(),
            kind: kind.into(),
            venue: venue.into(),
        }
    }
}

/// A profile paired with its publication list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FacultyResult {
    #[serde(default)]
    pub profile: Profile,
    #[serde(default, alias = "results")]
    pub publications: Vec<Publication>,
}

/// Top-level result mode of the view
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SearchOutcome {
    /// No search performed yet
    #[default]
    Empty,
    /// Result of a single-author search
    Single(FacultyResult),
    /// Results of a roster upload, never empty
    Bulk(Vec<FacultyResult>),
}

impl SearchOutcome {
    pub fn is_empty(&self) -> bool {
        matches!(self, SearchOutcome::Empty)
    }

    /// All faculty results held by this outcome, in display order.
    pub fn faculty(&self) -> &[FacultyResult] {
        match self {
            SearchOutcome::Empty => &[],
            SearchOutcome::Single(result) => std::slice::from_ref(result),
            SearchOutcome::Bulk(results) => results,
        }
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_text(&Value::deserialize(deserializer)?).unwrap_or_default())
}

fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_text(&Value::deserialize(deserializer)?))
}

fn optional_index<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(parse_index(&Value::deserialize(deserializer)?))
}

/// Render a scalar JSON value as trimmed text; null and blank become `None`.
fn value_to_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Parse an index value: `42`, `"42"` and `"1,204"` are accepted, anything
/// else (including `"N/A"`) is unknown.
pub fn parse_index(value: &Value) -> Option<u32> {
    static DIGITS: OnceLock<Option<Regex>> = OnceLock::new();

    match value {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => {
            let digits = DIGITS
                .get_or_init(|| Regex::new(r"^\d{1,3}(,\d{3})*$|^\d+$").ok())
                .as_ref()?;
            let s = s.trim();
            if digits.is_match(s) {
                s.replace(',', "").parse().ok()
            } else {
                None
            }
        }
        _ => None,
    }
}
