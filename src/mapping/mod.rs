pub mod concept;
pub mod format;
pub mod proposal;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::submission::payload::Payload;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormVariant {
    Concept,
    Proposal,
    CommunityProposal,
}

impl FormVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormVariant::Concept => "concept",
            FormVariant::Proposal => "proposal",
            FormVariant::CommunityProposal => "community_proposal",
        }
    }

    /// Human label used in emails and responses.
    pub fn label(&self) -> &'static str {
        match self {
            FormVariant::Concept => "Concept Paper",
            FormVariant::Proposal => "GAP Proposal",
            FormVariant::CommunityProposal => "Community Proposal",
        }
    }
}

impl std::fmt::Display for FormVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field data ready to post to the Creator platform.
///
/// Only ever holds present values: inserting `null` or an empty string is a
/// no-op.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ExternalRecord {
    fields: Map<String, Value>,
}

impl ExternalRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, value: Value) {
        match &value {
            Value::Null => {}
            Value::String(s) if s.is_empty() => {}
            Value::Array(items) if items.is_empty() => {}
            _ => {
                self.fields.insert(key.to_string(), value);
            }
        }
    }

    pub fn insert_text(&mut self, key: &str, value: impl Into<String>) {
        self.insert(key, Value::String(value.into()));
    }

    /// Adds a subform; an empty list leaves the key absent.
    pub fn insert_rows(&mut self, key: &str, rows: Vec<Value>) {
        self.insert(key, Value::Array(rows));
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Value passes through unchanged (numbers stay numbers).
    Copy,
    /// Rendered as `DD-Mon-YYYY`; unparsable input is dropped.
    Date,
}

/// One row of a mapping table: a source key copied to one or more destinations.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub source: &'static str,
    pub targets: &'static [&'static str],
    pub transform: Transform,
}

impl FieldRule {
    pub const fn copy(source: &'static str, targets: &'static [&'static str]) -> Self {
        Self {
            source,
            targets,
            transform: Transform::Copy,
        }
    }

    pub const fn date(source: &'static str, targets: &'static [&'static str]) -> Self {
        Self {
            source,
            targets,
            transform: Transform::Date,
        }
    }

    fn resolve(&self, payload: &Payload) -> Option<Value> {
        let value = payload.scalar(self.source)?;
        match self.transform {
            Transform::Copy => Some(value.clone()),
            Transform::Date => value
                .as_str()
                .and_then(format::format_date)
                .map(Value::String),
        }
    }
}

/// Apply `rules` in order. Aliased targets all receive the same value, and
/// two rules writing the same destination resolve last-write-wins.
pub fn apply_rules(payload: &Payload, rules: &[FieldRule], record: &mut ExternalRecord) {
    for rule in rules {
        let Some(value) = rule.resolve(payload) else {
            continue;
        };
        for target in rule.targets {
            record.insert(target, value.clone());
        }
    }
}

/// Map a submission into the destination schema for `variant`.
///
/// Pure and total: missing or malformed inputs are omitted, never an error.
pub fn map_submission(payload: &Payload, variant: FormVariant) -> ExternalRecord {
    let record = match variant {
        FormVariant::Concept => concept::map(payload),
        FormVariant::Proposal | FormVariant::CommunityProposal => proposal::map(payload),
    };
    tracing::debug!(variant = %variant, fields = record.len(), "Mapped submission");
    record
}
