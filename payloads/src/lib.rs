pub mod api_client;
pub mod requests;
pub mod responses;

pub use api_client::{
    APIClient, ClientError, RequestIdentifier, RequestOptions,
};

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current values of a form, keyed by field name.
pub type FormValues = BTreeMap<String, FieldValue>;

/// Validation messages keyed by field name. An absent or empty entry means the
/// field has no error.
pub type FormErrors = BTreeMap<String, String>;

/// The value held by a single form field.
///
/// Numeric inputs are kept as text, exactly as the user typed them, and are
/// parsed by whichever validator cares about them.
#[derive(Debug, Clone, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    #[display("{_0}")]
    Text(String),
    #[display("{_0}")]
    Bool(bool),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            Self::Text(_) => None,
        }
    }
}

impl Default for FieldValue {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Build a [`FormValues`] map from `(name, value)` pairs.
pub fn form_values<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> FormValues
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fields
        .into_iter()
        .map(|(name, value)| (name.into(), value.into()))
        .collect()
}
