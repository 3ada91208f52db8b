use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::{IntoParams, ToSchema};

// ============ Domain Records ============

/// A contact/inquiry submission from the broker website.
///
/// Instances are only produced by [`crate::validation::validate_lead`], so every
/// `Lead` in the system has already passed field validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Lead {
    /// Full name of the person asking for advice.
    #[schema(min_length = 1, max_length = 200, example = "Ada Lovelace")]
    pub name: String,
    /// Contact email address.
    #[schema(max_length = 254, example = "ada@example.com")]
    pub email: String,
    /// Optional phone number. Numbers without country prefix are read as Swiss.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "+41 44 668 18 00")]
    pub phone: Option<String>,
    /// Insurance topic the inquiry is about.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(inline)]
    pub topic: Option<InsuranceTopic>,
    /// Free-form inquiry text. May be empty.
    #[serde(default)]
    #[schema(max_length = 5000, example = "hi")]
    pub message: String,
}

impl Lead {
    /// Collection the website leads are written to.
    pub const COLLECTION: &'static str = "lead";
}

/// Insurance product lines a lead can ask about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InsuranceTopic {
    Health,
    Life,
    Household,
    Vehicle,
    Liability,
    Travel,
    Pension,
    Other,
}

impl InsuranceTopic {
    pub const ALL: [InsuranceTopic; 8] = [
        InsuranceTopic::Health,
        InsuranceTopic::Life,
        InsuranceTopic::Household,
        InsuranceTopic::Vehicle,
        InsuranceTopic::Liability,
        InsuranceTopic::Travel,
        InsuranceTopic::Pension,
        InsuranceTopic::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InsuranceTopic::Health => "health",
            InsuranceTopic::Life => "life",
            InsuranceTopic::Household => "household",
            InsuranceTopic::Vehicle => "vehicle",
            InsuranceTopic::Liability => "liability",
            InsuranceTopic::Travel => "travel",
            InsuranceTopic::Pension => "pension",
            InsuranceTopic::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|topic| topic.as_str() == value)
    }
}

/// A document read back from the store in transport-safe form.
///
/// `id` is the store identity rendered as a string; `fields` holds every other
/// field with store-internal types already converted to plain JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

// ============ Request / Response Types ============

/// Query parameters of `GET /leads`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListLeadsParams {
    /// Maximum number of leads to return (1-100, default 20).
    pub limit: Option<i64>,
}

/// Response of `GET /`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceInfo {
    pub status: String,
    pub service: String,
}

/// Response of `GET /test`.
#[derive(Debug, Serialize, ToSchema)]
pub struct DatabaseStatus {
    /// `connected` or `unavailable`.
    pub database: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DatabaseStatus {
    pub fn connected() -> Self {
        Self {
            database: "connected".to_string(),
            error: None,
        }
    }

    pub fn unavailable(error: impl Into<String>) -> Self {
        Self {
            database: "unavailable".to_string(),
            error: Some(error.into()),
        }
    }
}

/// Response of `POST /contact`.
#[derive(Debug, Serialize, ToSchema)]
pub struct CreateLeadResponse {
    pub ok: bool,
    /// Identity of the stored lead as a 24 character hex string.
    #[schema(example = "65f1c0ffee00000000000000")]
    pub id: String,
}

/// Response of `GET /leads`.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeadListResponse {
    /// Stored leads, newest first, each with its `_id` as a string.
    #[schema(value_type = Vec<Object>)]
    pub items: Vec<StoredDocument>,
}

/// Response of `GET /schema`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SchemaResponse {
    /// JSON schema per registered record type.
    #[schema(value_type = Object)]
    pub models: Map<String, Value>,
}

/// One violated validation rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldErrorBody {
    pub field: String,
    pub rule: String,
    pub message: String,
}

/// Error body returned for every failed request.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldErrorBody>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lead_skips_absent_optional_fields() {
        let lead = Lead {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            phone: None,
            topic: None,
            message: "hi".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&lead).unwrap(),
            json!({"name": "Ada", "email": "ada@example.com", "message": "hi"})
        );
    }

    #[test]
    fn topic_names_match_serde_names() {
        for topic in InsuranceTopic::ALL {
            assert_eq!(serde_json::to_value(topic).unwrap(), json!(topic.as_str()));
            assert_eq!(InsuranceTopic::parse(topic.as_str()), Some(topic));
        }
        assert_eq!(InsuranceTopic::parse("Health"), None);
    }

    #[test]
    fn stored_document_flattens_fields_next_to_id() {
        let mut fields = Map::new();
        fields.insert("name".to_string(), json!("Ada"));
        let doc = StoredDocument {
            id: "65f1c0ffee00000000000000".to_string(),
            fields,
        };
        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            json!({"_id": "65f1c0ffee00000000000000", "name": "Ada"})
        );
    }
}
