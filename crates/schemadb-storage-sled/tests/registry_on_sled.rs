//! End-to-end: the registry pipeline running on the sled substrate,
//! including reopen-and-continue behavior.

use std::sync::Arc;

use schemadb_registry::{
    BroadcastBus, BuiltinSyntaxValidator, JsonDataValidator, Registry, SchemaStore,
};
use schemadb_storage_sled::SledKv;
use schemadb_types::{CompatibilityLevel, NewSchema, RegistryError, SubjectConfig};
use tempfile::tempdir;

fn registry_on(kv: SledKv) -> Registry {
    Registry::new(
        Arc::new(SchemaStore::new(Arc::new(kv))),
        Arc::new(BuiltinSyntaxValidator),
        Arc::new(JsonDataValidator),
        Arc::new(BroadcastBus::default()),
    )
}

#[tokio::test]
async fn register_fetch_delete_on_sled() {
    let dir = tempdir().unwrap();
    let registry = registry_on(SledKv::open(dir.path()).unwrap());

    let v1 = registry
        .register_schema(NewSchema::new(
            "orders.created",
            r#"{"type":"object","required":["id"]}"#,
        ))
        .await
        .unwrap();
    assert_eq!(v1.version, 1);

    let fetched = registry.get_schema("orders.created", 1).await.unwrap();
    assert_eq!(fetched.content, v1.content);

    registry.delete_schema("orders.created", 1).await.unwrap();
    let err = registry.get_schema("orders.created", 1).await.unwrap_err();
    assert!(matches!(err, RegistryError::NotFound(_)));
}

#[tokio::test]
async fn versions_and_config_survive_reopen() {
    let dir = tempdir().unwrap();

    {
        let registry = registry_on(SledKv::open(dir.path()).unwrap());
        registry
            .register_schema(NewSchema::new("orders", "{\"type\":\"object\"}"))
            .await
            .unwrap();
        registry
            .set_config(SubjectConfig {
                subject: "orders".to_string(),
                compatibility: CompatibilityLevel::Full,
            })
            .await
            .unwrap();
    }

    let registry = registry_on(SledKv::open(dir.path()).unwrap());
    let latest = registry.get_latest_schema("orders").await.unwrap();
    assert_eq!(latest.version, 1);
    assert_eq!(
        registry.get_config("orders").await.unwrap().compatibility,
        CompatibilityLevel::Full
    );

    // The counter picks up where it left off.
    let v2 = registry
        .register_schema(NewSchema::new("orders", "{\"type\":\"object\"}"))
        .await
        .unwrap();
    assert_eq!(v2.version, 2);
}
