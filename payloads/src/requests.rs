use crate::{FieldValue, FormErrors, FormValues};
use serde::{Deserialize, Serialize};

pub const NAME_MIN_LEN: usize = 2;
pub const MESSAGE_MIN_LEN: usize = 10;
pub const AGE_MIN: u8 = 1;
pub const AGE_MAX: u8 = 120;

/// Countries offered by the contact form, as `(value, label)`.
pub const COUNTRIES: &[(&str, &str)] = &[
    ("us", "United States"),
    ("uk", "United Kingdom"),
    ("ca", "Canada"),
    ("au", "Australia"),
    ("de", "Germany"),
    ("fr", "France"),
    ("jp", "Japan"),
    ("other", "Other"),
];

/// Initial snapshot for the contact form.
pub fn contact_initial_values() -> FormValues {
    let mut values = FormValues::new();
    for name in ["name", "email", "age", "message", "country"] {
        values.insert(name.to_string(), FieldValue::default());
    }
    values.insert("newsletter".to_string(), FieldValue::Bool(false));
    values
}

fn text<'a>(values: &'a FormValues, name: &str) -> &'a str {
    values
        .get(name)
        .and_then(FieldValue::as_text)
        .unwrap_or_default()
}

/// Validate the contact form, returning one message per failing field.
///
/// Rules:
/// - name: required, at least 2 characters
/// - email: required, `local@host.tld` shape
/// - age: required, a whole number between 1 and 120
/// - message: required, at least 10 characters
/// - country: required, one of [`COUNTRIES`]
pub fn validate_contact(values: &FormValues) -> FormErrors {
    let mut errors = FormErrors::new();

    let name = text(values, "name").trim();
    if name.is_empty() {
        errors.insert("name".into(), "Name is required".into());
    } else if name.chars().count() < NAME_MIN_LEN {
        errors
            .insert("name".into(), "Name must be at least 2 characters".into());
    }

    let email = text(values, "email");
    if email.trim().is_empty() {
        errors.insert("email".into(), "Email is required".into());
    } else if !is_valid_email(email) {
        errors.insert("email".into(), "Invalid email address".into());
    }

    let age = text(values, "age");
    if age.is_empty() {
        errors.insert("age".into(), "Age is required".into());
    } else if !is_valid_age(age) {
        errors.insert(
            "age".into(),
            "Age must be a number between 1 and 120".into(),
        );
    }

    let message = text(values, "message").trim();
    if message.is_empty() {
        errors.insert("message".into(), "Message is required".into());
    } else if message.chars().count() < MESSAGE_MIN_LEN {
        errors.insert(
            "message".into(),
            "Message must be at least 10 characters".into(),
        );
    }

    if !is_known_country(text(values, "country")) {
        errors.insert("country".into(), "Please select a country".into());
    }

    errors
}

fn parse_age(age: &str) -> Option<u8> {
    age.trim()
        .parse::<u8>()
        .ok()
        .filter(|age| (AGE_MIN..=AGE_MAX).contains(age))
}

fn is_valid_age(age: &str) -> bool {
    parse_age(age).is_some()
}

fn is_known_country(country: &str) -> bool {
    COUNTRIES.iter().any(|(value, _)| *value == country)
}

/// Accepts `local@host.tld` where the local part uses `[A-Za-z0-9._%+-]`,
/// the host uses `[A-Za-z0-9.-]` and the tld is at least two letters.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };

    let local_ok = !local.is_empty()
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "._%+-".contains(c));
    let host_ok = !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    let tld_ok = tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic());

    local_ok && host_ok && tld_ok
}

/// A contact message built from a validated form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub age: u8,
    pub message: String,
    pub country: String,
    pub newsletter: bool,
}

impl ContactMessage {
    /// Returns `None` unless `values` passes [`validate_contact`].
    pub fn from_values(values: &FormValues) -> Option<Self> {
        if !validate_contact(values).is_empty() {
            return None;
        }
        Some(Self {
            name: text(values, "name").trim().to_string(),
            email: text(values, "email").to_string(),
            age: parse_age(text(values, "age"))?,
            message: text(values, "message").trim().to_string(),
            country: text(values, "country").to_string(),
            newsletter: values
                .get("newsletter")
                .and_then(FieldValue::as_bool)
                .unwrap_or(false),
        })
    }
}
