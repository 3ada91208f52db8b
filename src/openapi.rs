use utoipa::OpenApi;

use crate::handlers;
use crate::models::{
    CreateLeadResponse, DatabaseStatus, ErrorResponse, FieldErrorBody, InsuranceTopic, Lead,
    LeadListResponse, SchemaResponse, ServiceInfo,
};

/// OpenAPI document of the HTTP surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Swiss Insurance Broker API",
        version = "1.0.0",
        description = "Lead submission and retrieval for the broker website."
    ),
    paths(
        handlers::root,
        handlers::test_db,
        handlers::get_schema,
        handlers::create_lead,
        handlers::list_leads,
    ),
    components(schemas(
        Lead,
        InsuranceTopic,
        ServiceInfo,
        DatabaseStatus,
        CreateLeadResponse,
        LeadListResponse,
        SchemaResponse,
        FieldErrorBody,
        ErrorResponse,
    ))
)]
pub struct ApiDoc;
