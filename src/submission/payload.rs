use serde_json::{Map, Value};

use crate::mapping::format;

/// A loosely structured form submission.
///
/// Submissions arrive as whatever the browser sent, so nothing here assumes a
/// key exists or has the expected type. Accessors apply the same presence rule
/// everywhere: `null`, the empty string, and object values (file placeholders
/// serialize as objects) count as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload {
    fields: Map<String, Value>,
}

impl Payload {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Wrap a JSON value. Anything other than an object yields an empty payload.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self { fields },
            _ => Self::default(),
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }

    /// The raw value for `key` if it passes the presence rule and is a scalar.
    pub fn scalar(&self, key: &str) -> Option<&Value> {
        match self.fields.get(key)? {
            Value::String(s) if s.is_empty() => None,
            v @ (Value::String(_) | Value::Number(_) | Value::Bool(_)) => Some(v),
            _ => None,
        }
    }

    /// The value rendered as text, the way it would appear in a sentence.
    pub fn text(&self, key: &str) -> Option<String> {
        self.scalar(key).map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// Text for composed blocks, where numeric zero and `false` read as unanswered.
    pub fn filled(&self, key: &str) -> Option<String> {
        match self.scalar(key)? {
            Value::Number(n) if n.as_f64() == Some(0.0) => None,
            Value::Bool(false) => None,
            _ => self.text(key),
        }
    }

    pub fn filled_or_empty(&self, key: &str) -> String {
        self.filled(key).unwrap_or_default()
    }

    /// A finite number, accepting numeric strings.
    pub fn number(&self, key: &str) -> Option<f64> {
        let n = match self.scalar(key)? {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        n.is_finite().then_some(n)
    }

    /// Numeric value or zero, for budget arithmetic.
    pub fn number_or_zero(&self, key: &str) -> f64 {
        self.number(key).unwrap_or(0.0)
    }

    pub fn date(&self, key: &str) -> Option<chrono::NaiveDate> {
        self.scalar(key)
            .and_then(Value::as_str)
            .and_then(format::parse_date)
    }

    pub fn datetime(&self, key: &str) -> Option<chrono::NaiveDateTime> {
        self.scalar(key)
            .and_then(Value::as_str)
            .and_then(format::parse_datetime)
    }

    /// Shallow merge: keys in `patch` overwrite keys here.
    pub fn merge(&mut self, patch: &Payload) {
        for (k, v) in &patch.fields {
            self.fields.insert(k.clone(), v.clone());
        }
    }
}

impl From<Map<String, Value>> for Payload {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}
