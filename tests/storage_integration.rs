use std::env;
use std::sync::Arc;
use std::time::Duration;

use rust_broker_api::db::{Database, DocumentStore};
use rust_broker_api::db_storage::DocumentStorage;
use rust_broker_api::models::Lead;
use rust_broker_api::validation::{validate_lead, ListLimit};

/// Integration smoke test for lead storage against a real MongoDB.
/// Marked ignored to avoid running against production by accident; set TEST_DATABASE_URL to run.
#[tokio::test]
#[ignore]
async fn create_and_list_lead_smoke_test() -> anyhow::Result<()> {
    let db_url = env::var("TEST_DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("Set TEST_DATABASE_URL to run this test"))?;

    let db = Database::new(&db_url, "broker_smoke_test", Duration::from_secs(5)).await?;
    db.ping().await?;
    let storage = DocumentStorage::new(Arc::new(db));

    // Unique name so repeated runs can tell their own document apart.
    let name = format!("Smoke Test {}", mongodb::bson::oid::ObjectId::new().to_hex());
    let lead = validate_lead(&serde_json::json!({
        "name": name,
        "email": "smoke@example.com",
        "topic": "travel"
    }))?;

    let id = storage.create(Lead::COLLECTION, &lead).await?;
    assert_eq!(id.len(), 24);

    let items = storage
        .list(Lead::COLLECTION, ListLimit::new(Some(1))?)
        .await?;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, id);
    assert_eq!(items[0].fields["name"], serde_json::json!(name));
    assert_eq!(items[0].fields["topic"], serde_json::json!("travel"));
    Ok(())
}

/// An unreachable server surfaces as an unavailable store, not a hang.
#[tokio::test]
#[ignore]
async fn unreachable_server_is_unavailable() -> anyhow::Result<()> {
    let db = Database::new(
        "mongodb://127.0.0.1:1/?directConnection=true",
        "broker_smoke_test",
        Duration::from_millis(300),
    )
    .await?;

    let err = db.ping().await.unwrap_err();
    assert!(matches!(
        err,
        rust_broker_api::db::StorageError::Unavailable(_)
    ));
    Ok(())
}
