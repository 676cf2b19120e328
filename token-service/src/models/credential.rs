use serde::Serialize;
use serde_json::{Map, Value};

/// A secret token and the destinations it may post to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRecord {
    pub token: String,
    pub channel_ids: Vec<String>,
}

impl CredentialRecord {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            channel_ids: Vec::new(),
        }
    }

    pub fn with_channel_ids(mut self, channel_ids: Vec<String>) -> Self {
        self.channel_ids = channel_ids;
        self
    }
}

/// Display-safe rendering of a [`CredentialRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaskedCredentialView {
    pub index: usize,
    pub masked: Option<String>,
    pub has_channel_ids: bool,
    pub channel_ids: Vec<String>,
}

/// A raw credential entry as found in a JSON array, before normalization.
///
/// Anything that is neither a non-empty string nor an object carrying a
/// `token` or `value` field has no entry and is dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum CredentialEntry {
    Bare(String),
    Structured {
        token: Option<Value>,
        value: Option<Value>,
        channel_ids: Option<Value>,
    },
}

impl CredentialEntry {
    pub fn classify(raw: Value) -> Option<Self> {
        match raw {
            Value::String(token) if !token.is_empty() => Some(CredentialEntry::Bare(token)),
            Value::Object(mut fields) if has_token_field(&fields) => {
                Some(CredentialEntry::Structured {
                    token: fields.remove("token"),
                    value: fields.remove("value"),
                    channel_ids: fields.remove("channelIds"),
                })
            }
            _ => None,
        }
    }

    pub fn into_record(self) -> CredentialRecord {
        match self {
            CredentialEntry::Bare(token) => CredentialRecord::new(token),
            CredentialEntry::Structured {
                token,
                value,
                channel_ids,
            } => {
                // First truthy of `token`, `value`; otherwise an empty token.
                let token = [token, value]
                    .into_iter()
                    .flatten()
                    .find(is_truthy)
                    .map(coerce_to_string)
                    .unwrap_or_default();

                let channel_ids = match channel_ids {
                    Some(Value::Array(items)) => {
                        items.into_iter().filter_map(channel_id_string).collect()
                    }
                    _ => Vec::new(),
                };

                CredentialRecord::new(token).with_channel_ids(channel_ids)
            }
        }
    }
}

/// Normalize a parsed JSON array into credential records, dropping entries
/// with an unrecognized shape.
pub fn normalize_entries(items: Vec<Value>) -> Vec<CredentialRecord> {
    items
        .into_iter()
        .filter_map(CredentialEntry::classify)
        .map(CredentialEntry::into_record)
        .collect()
}

fn has_token_field(fields: &Map<String, Value>) -> bool {
    fields.contains_key("token") || fields.contains_key("value")
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn coerce_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn channel_id_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
