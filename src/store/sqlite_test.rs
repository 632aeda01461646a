use super::*;

async fn memory_store() -> SqliteStore {
    SqliteStore::connect("sqlite::memory:").await.unwrap()
}

#[test]
fn in_memory_url_forces_single_connection() {
    assert_eq!(db_max_connections("sqlite::memory:"), 1);
}

#[tokio::test]
async fn get_missing_key_is_none() {
    let store = memory_store().await;
    assert_eq!(store.get("feedback_draft_nobody").await.unwrap(), None);
}

#[tokio::test]
async fn set_then_get() {
    let store = memory_store().await;
    store.set("feedback_draft_c1", r#"{"highlights":[]}"#.into()).await.unwrap();
    assert_eq!(store.get("feedback_draft_c1").await.unwrap().as_deref(), Some(r#"{"highlights":[]}"#));
}

#[tokio::test]
async fn set_upserts_existing_key() {
    let store = memory_store().await;
    store.set("k", "one".into()).await.unwrap();
    store.set("k", "two".into()).await.unwrap();
    assert_eq!(store.get("k").await.unwrap().as_deref(), Some("two"));

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM draft_kv").fetch_one(store.pool()).await.unwrap();
    assert_eq!(rows, 1);
}

#[tokio::test]
async fn delete_removes_and_tolerates_missing() {
    let store = memory_store().await;
    store.set("k", "v".into()).await.unwrap();
    store.delete("k").await.unwrap();
    store.delete("k").await.unwrap();
    assert_eq!(store.get("k").await.unwrap(), None);
}

#[tokio::test]
async fn keys_are_isolated() {
    let store = memory_store().await;
    store.set("feedback_draft_a", "A".into()).await.unwrap();
    store.set("feedback_draft_b", "B".into()).await.unwrap();
    store.delete("feedback_draft_a").await.unwrap();
    assert_eq!(store.get("feedback_draft_b").await.unwrap().as_deref(), Some("B"));
}
