use crate::config::Config;
use crate::db_storage::DocumentStorage;
use crate::errors::AppError;
use crate::models::*;
use crate::schema_registry;
use crate::validation::{validate_lead, ListLimit, Rule, ValidationError};
use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    Json,
};
use std::sync::Arc;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Persistence adapter over the process-wide store handle.
    pub storage: DocumentStorage,
    /// Application configuration.
    pub config: Config,
}

/// Service banner.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service is running", body = ServiceInfo))
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        status: "ok".to_string(),
        service: "broker-backend".to_string(),
    })
}

/// GET /test
///
/// Reports whether the document store answers. Always responds 200; an
/// unreachable store is reported in the body.
#[utoipa::path(
    get,
    path = "/test",
    responses((status = 200, description = "Database reachability", body = DatabaseStatus))
)]
pub async fn test_db(State(state): State<Arc<AppState>>) -> Json<DatabaseStatus> {
    match state.storage.ping().await {
        Ok(()) => Json(DatabaseStatus::connected()),
        Err(e) => {
            tracing::warn!("Database check failed: {}", e);
            Json(DatabaseStatus::unavailable(e.to_string()))
        }
    }
}

/// GET /schema
///
/// JSON schema of every registered record type.
#[utoipa::path(
    get,
    path = "/schema",
    responses((status = 200, description = "Registered record schemas", body = SchemaResponse))
)]
pub async fn get_schema() -> Json<SchemaResponse> {
    Json(SchemaResponse {
        models: schema_registry::model_schemas(),
    })
}

/// POST /contact
///
/// Validates a lead and stores it. Nothing is written unless the whole
/// payload validates.
///
/// # Returns
///
/// * `Result<Json<CreateLeadResponse>, AppError>` - The new lead identity or an error.
#[utoipa::path(
    post,
    path = "/contact",
    request_body = Lead,
    responses(
        (status = 200, description = "Lead stored", body = CreateLeadResponse),
        (status = 400, description = "Body is not JSON", body = ErrorResponse),
        (status = 413, description = "Body exceeds the size limit", body = ErrorResponse),
        (status = 415, description = "Body is not declared as JSON", body = ErrorResponse),
        (status = 422, description = "Lead failed validation", body = ErrorResponse),
        (status = 429, description = "Too many submissions from this client", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn create_lead(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<CreateLeadResponse>, AppError> {
    let Json(payload) = payload?;

    let lead = validate_lead(&payload)?;
    tracing::info!("POST /contact - lead validated, topic: {:?}", lead.topic);

    let id = state.storage.create(Lead::COLLECTION, &lead).await?;
    tracing::info!("Lead {} stored", id);

    Ok(Json(CreateLeadResponse { ok: true, id }))
}

/// GET /leads?limit=N
///
/// Most recent leads first, at most `limit` of them.
///
/// # Returns
///
/// * `Result<Json<LeadListResponse>, AppError>` - The leads or an error.
#[utoipa::path(
    get,
    path = "/leads",
    params(ListLeadsParams),
    responses(
        (status = 200, description = "Stored leads", body = LeadListResponse),
        (status = 422, description = "Invalid limit", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn list_leads(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ListLeadsParams>, QueryRejection>,
) -> Result<Json<LeadListResponse>, AppError> {
    let Query(params) = params.map_err(|rejection| {
        tracing::debug!("Rejected /leads query: {}", rejection.body_text());
        ValidationError::single(
            "limit",
            Rule::Type {
                expected: "an integer",
            },
        )
    })?;
    let limit = ListLimit::new(params.limit)?;
    tracing::info!("GET /leads - limit: {}", limit.get());

    let items = state.storage.list(Lead::COLLECTION, limit).await?;

    Ok(Json(LeadListResponse { items }))
}
