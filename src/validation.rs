//! Input validation for submitted records.
//!
//! Validation is a pure function from an untyped JSON value to a typed record.
//! Every declared field is checked and all violations are reported together;
//! a record is never partially accepted. Fields that are not declared on the
//! record are ignored.

use regex::Regex;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::LazyLock;

use crate::models::{FieldErrorBody, InsuranceTopic, Lead};

pub const NAME_MAX_CHARS: usize = 200;
pub const EMAIL_MAX_CHARS: usize = 254;
pub const MESSAGE_MAX_CHARS: usize = 5000;

pub const DEFAULT_LIST_LIMIT: u32 = 20;
pub const MAX_LIST_LIMIT: u32 = 100;

// RFC 5322 simplified: local@domain.tld, at least one dot in the domain.
static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$",
    )
    .expect("email regex is valid")
});

/// The rule a field violated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    Required,
    Type { expected: &'static str },
    NotEmpty,
    Email,
    Phone,
    MaxLength { max: usize },
    Min { min: i64 },
    OneOf { allowed: Vec<&'static str> },
}

impl Rule {
    /// Short machine-readable rule name.
    pub fn code(&self) -> &'static str {
        match self {
            Rule::Required => "required",
            Rule::Type { .. } => "type",
            Rule::NotEmpty => "not_empty",
            Rule::Email => "email",
            Rule::Phone => "phone",
            Rule::MaxLength { .. } => "max_length",
            Rule::Min { .. } => "min",
            Rule::OneOf { .. } => "one_of",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Required => write!(f, "field is required"),
            Rule::Type { expected } => write!(f, "must be {}", expected),
            Rule::NotEmpty => write!(f, "must not be empty"),
            Rule::Email => write!(f, "must be a valid email address"),
            Rule::Phone => write!(f, "must be a valid phone number"),
            Rule::MaxLength { max } => write!(f, "must be at most {} characters", max),
            Rule::Min { min } => write!(f, "must be at least {}", min),
            Rule::OneOf { allowed } => write!(f, "must be one of: {}", allowed.join(", ")),
        }
    }
}

/// A single offending field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub rule: Rule,
}

impl FieldError {
    pub fn new(field: impl Into<String>, rule: Rule) -> Self {
        Self {
            field: field.into(),
            rule,
        }
    }

    pub fn to_body(&self) -> FieldErrorBody {
        FieldErrorBody {
            field: self.field.clone(),
            rule: self.rule.code().to_string(),
            message: self.rule.to_string(),
        }
    }
}

/// Input rejected before persistence. Always carries at least one field error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("validation failed for {} field(s)", .errors.len())]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn single(field: impl Into<String>, rule: Rule) -> Self {
        Self {
            errors: vec![FieldError::new(field, rule)],
        }
    }

    /// Names of the offending fields, in declaration order.
    pub fn fields(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.field.as_str()).collect()
    }

    pub fn has(&self, field: &str, rule_code: &str) -> bool {
        self.errors
            .iter()
            .any(|e| e.field == field && e.rule.code() == rule_code)
    }
}

/// Collects violations while reading fields out of an input object.
struct FieldReader<'a> {
    input: &'a Map<String, Value>,
    errors: Vec<FieldError>,
}

impl<'a> FieldReader<'a> {
    fn new(input: &'a Map<String, Value>) -> Self {
        Self {
            input,
            errors: Vec::new(),
        }
    }

    fn fail(&mut self, field: &str, rule: Rule) {
        self.errors.push(FieldError::new(field, rule));
    }

    /// Reads an optional string. `null` counts as absent.
    fn optional_str(&mut self, field: &str) -> Option<&'a str> {
        match self.input.get(field) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.as_str()),
            Some(_) => {
                self.fail(field, Rule::Type { expected: "a string" });
                None
            }
        }
    }

    fn required_str(&mut self, field: &str) -> Option<&'a str> {
        match self.input.get(field) {
            None | Some(Value::Null) => {
                self.fail(field, Rule::Required);
                None
            }
            _ => self.optional_str(field),
        }
    }

    fn check_max_chars(&mut self, field: &str, value: &str, max: usize) -> bool {
        if value.chars().count() > max {
            self.fail(field, Rule::MaxLength { max });
            return false;
        }
        true
    }

    fn finish<T>(self, record: Option<T>) -> Result<T, ValidationError> {
        match record {
            Some(record) if self.errors.is_empty() => Ok(record),
            _ => Err(ValidationError {
                errors: self.errors,
            }),
        }
    }
}

/// Validates an untyped payload into a [`Lead`].
///
/// `name` and `email` are trimmed before checking and stored trimmed. All
/// other declared fields are stored as submitted.
pub fn validate_lead(input: &Value) -> Result<Lead, ValidationError> {
    let Some(object) = input.as_object() else {
        return Err(ValidationError::single(
            "body",
            Rule::Type {
                expected: "a JSON object",
            },
        ));
    };

    let mut reader = FieldReader::new(object);

    let name = reader.required_str("name").map(str::trim).and_then(|name| {
        if name.is_empty() {
            reader.fail("name", Rule::NotEmpty);
            return None;
        }
        reader
            .check_max_chars("name", name, NAME_MAX_CHARS)
            .then(|| name.to_string())
    });

    let email = reader.required_str("email").map(str::trim).and_then(|email| {
        if email.is_empty() {
            reader.fail("email", Rule::NotEmpty);
            return None;
        }
        if !reader.check_max_chars("email", email, EMAIL_MAX_CHARS) {
            return None;
        }
        if !is_valid_email(email) {
            reader.fail("email", Rule::Email);
            return None;
        }
        Some(email.to_string())
    });

    let phone = reader.optional_str("phone").and_then(|phone| {
        if phone.trim().is_empty() {
            return None;
        }
        if !is_valid_phone(phone) {
            reader.fail("phone", Rule::Phone);
            return None;
        }
        Some(phone.to_string())
    });

    let topic = match object.get("topic") {
        None | Some(Value::Null) => None,
        Some(Value::String(raw)) => {
            let parsed = InsuranceTopic::parse(raw);
            if parsed.is_none() {
                reader.fail(
                    "topic",
                    Rule::OneOf {
                        allowed: InsuranceTopic::ALL.iter().map(|t| t.as_str()).collect(),
                    },
                );
            }
            parsed
        }
        Some(_) => {
            reader.fail("topic", Rule::Type { expected: "a string" });
            None
        }
    };

    let message = match reader.optional_str("message") {
        Some(message) => reader
            .check_max_chars("message", message, MESSAGE_MAX_CHARS)
            .then(|| message.to_string()),
        None => Some(String::new()),
    };

    let record = match (name, email, message) {
        (Some(name), Some(email), Some(message)) => Some(Lead {
            name,
            email,
            phone,
            topic,
            message,
        }),
        _ => None,
    };

    reader.finish(record)
}

/// Checks email syntax. Never panics, for any input.
pub fn is_valid_email(email: &str) -> bool {
    // Basic checks
    if email.len() < 5 || email.chars().count() > EMAIL_MAX_CHARS {
        return false;
    }
    if !email.contains('@') || !email.contains('.') {
        return false;
    }

    let Some((local, _domain)) = email.rsplit_once('@') else {
        return false;
    };
    if local.len() > 64 || local.starts_with('.') || local.ends_with('.') || local.contains("..")
    {
        return false;
    }

    EMAIL_REGEX.is_match(email)
}

/// Checks that `phone` parses as a valid number, reading local numbers as Swiss.
pub fn is_valid_phone(phone: &str) -> bool {
    match phonenumber::parse(Some(phonenumber::country::Id::CH), phone) {
        Ok(number) => phonenumber::is_valid(&number),
        Err(_) => false,
    }
}

/// Bounded page size for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListLimit(u32);

impl ListLimit {
    /// Accepts a requested limit. Values below 1 are rejected, values above
    /// [`MAX_LIST_LIMIT`] are clamped.
    pub fn new(requested: Option<i64>) -> Result<Self, ValidationError> {
        match requested {
            None => Ok(Self(DEFAULT_LIST_LIMIT)),
            Some(n) if n < 1 => Err(ValidationError::single("limit", Rule::Min { min: 1 })),
            Some(n) => Ok(Self(
                u32::try_from(n).map_or(MAX_LIST_LIMIT, |n| n.min(MAX_LIST_LIMIT)),
            )),
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for ListLimit {
    fn default() -> Self {
        Self(DEFAULT_LIST_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_minimal_lead_and_defaults_message() {
        let lead = validate_lead(&json!({"name": "Ada", "email": "ada@example.com"})).unwrap();
        assert_eq!(lead.name, "Ada");
        assert_eq!(lead.message, "");
        assert_eq!(lead.phone, None);
        assert_eq!(lead.topic, None);
    }

    #[test]
    fn accepts_full_lead() {
        let lead = validate_lead(&json!({
            "name": "  Ada Lovelace ",
            "email": "ada@example.com",
            "phone": "044 668 18 00",
            "topic": "household",
            "message": "Need a quote"
        }))
        .unwrap();
        assert_eq!(lead.name, "Ada Lovelace");
        assert_eq!(lead.phone.as_deref(), Some("044 668 18 00"));
        assert_eq!(lead.topic, Some(InsuranceTopic::Household));
    }

    #[test]
    fn reports_every_offending_field() {
        let err = validate_lead(&json!({"name": "", "email": "not-an-email"})).unwrap_err();
        assert!(err.has("name", "not_empty"));
        assert!(err.has("email", "email"));
        assert_eq!(err.errors.len(), 2);
    }

    #[test]
    fn missing_required_fields() {
        let err = validate_lead(&json!({"message": "hi"})).unwrap_err();
        assert!(err.has("name", "required"));
        assert!(err.has("email", "required"));
    }

    #[test]
    fn null_counts_as_missing() {
        let err = validate_lead(&json!({"name": "Ada", "email": null})).unwrap_err();
        assert_eq!(err.fields(), vec!["email"]);
        assert!(err.has("email", "required"));
    }

    #[test]
    fn wrong_types_are_reported() {
        let err = validate_lead(&json!({
            "name": 42,
            "email": "ada@example.com",
            "message": ["hi"],
            "topic": 7,
            "phone": true
        }))
        .unwrap_err();
        assert!(err.has("name", "type"));
        assert!(err.has("message", "type"));
        assert!(err.has("topic", "type"));
        assert!(err.has("phone", "type"));
    }

    #[test]
    fn unknown_topic_lists_allowed_values() {
        let err = validate_lead(&json!({
            "name": "Ada",
            "email": "ada@example.com",
            "topic": "crypto"
        }))
        .unwrap_err();
        let body = err.errors[0].to_body();
        assert_eq!(body.rule, "one_of");
        assert!(body.message.contains("health"));
    }

    #[test]
    fn invalid_phone_is_rejected() {
        let err = validate_lead(&json!({
            "name": "Ada",
            "email": "ada@example.com",
            "phone": "12"
        }))
        .unwrap_err();
        assert!(err.has("phone", "phone"));
    }

    #[test]
    fn invalid_phone_is_reported_alongside_other_field_errors() {
        let err = validate_lead(&json!({
            "name": "",
            "email": "ada@example.com",
            "phone": "not a number"
        }))
        .unwrap_err();
        assert_eq!(err.fields(), vec!["name", "phone"]);
        assert!(err.has("name", "not_empty"));
        assert!(err.has("phone", "phone"));
    }

    #[test]
    fn blank_phone_is_treated_as_absent() {
        let lead = validate_lead(&json!({
            "name": "Ada",
            "email": "ada@example.com",
            "phone": "   "
        }))
        .unwrap();
        assert_eq!(lead.phone, None);
    }

    #[test]
    fn oversized_message_is_rejected() {
        let err = validate_lead(&json!({
            "name": "Ada",
            "email": "ada@example.com",
            "message": "x".repeat(MESSAGE_MAX_CHARS + 1)
        }))
        .unwrap_err();
        assert!(err.has("message", "max_length"));
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let lead = validate_lead(&json!({
            "name": "Ada",
            "email": "ada@example.com",
            "_id": "deadbeef",
            "utm_source": "newsletter"
        }))
        .unwrap();
        let stored = serde_json::to_value(&lead).unwrap();
        assert!(stored.get("_id").is_none());
        assert!(stored.get("utm_source").is_none());
    }

    #[test]
    fn non_object_body_is_rejected() {
        let err = validate_lead(&json!(["Ada"])).unwrap_err();
        assert!(err.has("body", "type"));
    }

    #[test]
    fn email_syntax() {
        assert!(is_valid_email("ada@example.com"));
        assert!(is_valid_email("first.last+tag@sub.example.ch"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("ada@localhost"));
        assert!(!is_valid_email("ada@@example.com"));
        assert!(!is_valid_email(".ada@example.com"));
        assert!(!is_valid_email("ada..b@example.com"));
        assert!(!is_valid_email("ada @example.com"));
    }

    #[test]
    fn list_limit_bounds() {
        assert_eq!(ListLimit::new(None).unwrap().get(), DEFAULT_LIST_LIMIT);
        assert_eq!(ListLimit::new(Some(1)).unwrap().get(), 1);
        assert_eq!(ListLimit::new(Some(500)).unwrap().get(), MAX_LIST_LIMIT);
        assert_eq!(ListLimit::new(Some(i64::MAX)).unwrap().get(), MAX_LIST_LIMIT);
        assert!(ListLimit::new(Some(0)).unwrap_err().has("limit", "min"));
        assert!(ListLimit::new(Some(-3)).is_err());
    }
}
