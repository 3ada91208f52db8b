//! Broker Leads API Library
//!
//! HTTP service behind the broker website's contact form: lead submission,
//! lead listing, schema introspection and a database health check, backed by
//! MongoDB.
//!
//! # Modules
//!
//! - `config`: Configuration management.
//! - `db`: Document store trait and MongoDB connection.
//! - `db_storage`: Persistence adapter (create/list with identity normalization).
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `memory_store`: In-process store for tests and local runs.
//! - `models`: Records and request/response types.
//! - `openapi`: Generated OpenAPI document.
//! - `schema_registry`: Static registry of submittable record types.
//! - `server`: Router assembly.
//! - `validation`: Input validation.

pub mod config;
pub mod db;
pub mod db_storage;
pub mod errors;
pub mod handlers;
pub mod memory_store;
pub mod models;
pub mod openapi;
pub mod schema_registry;
pub mod server;
pub mod validation;
