//! The seven-field filter parameter record.
//!
//! Produced by a natural-language extraction step or a direct caller. Every
//! field is best-effort: blanks count as absent, and list fields also accept
//! a bare string.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ParamsError;

static JSON_OBJECT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterParams {
    #[serde(default)]
    pub archive_type: Option<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub variables: Vec<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub interpretations: Vec<String>,
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub time_period: Option<String>,
    /// `partial` (default), `containing` or `contained`. Kept as text so an
    /// unknown value can be reported rather than rejected at parse time.
    #[serde(default)]
    pub time_overlap: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(s)) => vec![s],
        Some(OneOrMany::Many(v)) => v,
    })
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("null"))
}

fn clean_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl FilterParams {
    pub fn from_json(text: &str) -> Result<Self, ParamsError> {
        let params: FilterParams = serde_json::from_str(text)?;
        Ok(params.normalized())
    }

    /// Pull the parameter record out of free-form model output: the widest
    /// `{ ... }` span if there is one, otherwise the whole text.
    pub fn from_llm_response(text: &str) -> Result<Self, ParamsError> {
        match JSON_OBJECT.find(text) {
            Some(m) => Self::from_json(m.as_str()),
            None => Self::from_json(text.trim()).map_err(|_| ParamsError::NoObject),
        }
    }

    /// Trim every field and drop blanks.
    pub fn normalized(self) -> Self {
        Self {
            archive_type: clean(self.archive_type),
            variables: clean_list(self.variables),
            interpretations: clean_list(self.interpretations),
            resolution: clean(self.resolution),
            time_period: clean(self.time_period),
            time_overlap: clean(self.time_overlap),
            location: clean(self.location),
        }
    }

    /// Fields set in `other` replace the corresponding fields of `self`.
    pub fn overridden_by(self, other: FilterParams) -> Self {
        let other = other.normalized();
        let base = self.normalized();
        Self {
            archive_type: other.archive_type.or(base.archive_type),
            variables: if other.variables.is_empty() {
                base.variables
            } else {
                other.variables
            },
            interpretations: if other.interpretations.is_empty() {
                base.interpretations
            } else {
                other.interpretations
            },
            resolution: other.resolution.or(base.resolution),
            time_period: other.time_period.or(base.time_period),
            time_overlap: other.time_overlap.or(base.time_overlap),
            location: other.location.or(base.location),
        }
    }
}
