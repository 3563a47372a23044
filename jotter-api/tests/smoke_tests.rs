//! End-to-end smoke tests against a live PostgreSQL.
//!
//! Run with `--features db-tests` and the usual `POSTGRES_*` variables.

#![cfg(feature = "db-tests")]

use std::sync::Arc;
use std::time::Duration;

use jotter_api::{ApiResult, DbClient, DbConfig, NotesService};
use jotter_storage::NoteStore;
use jotter_test_utils::{fixtures::new_note, memory_cache};

fn test_db() -> ApiResult<DbClient> {
    let config = DbConfig::from_env();
    DbClient::from_config(&config)
}

#[tokio::test]
async fn smoke_test_store_round_trip() -> ApiResult<()> {
    let db = test_db()?;
    db.init_schema().await?;
    db.ping().await?;

    let before = db.count().await?;
    let (id, created_at) = db.insert(&new_note("smoke test note", Some("smoke"))).await?;

    let notes = db.list().await?;
    let stored = notes
        .iter()
        .find(|n| n.id == id)
        .expect("inserted note should be listed");
    assert_eq!(stored.content, "smoke test note");
    assert_eq!(stored.author, "smoke");
    assert_eq!(stored.created_at.timestamp(), created_at.timestamp());
    assert_eq!(db.count().await?, before + 1);

    assert!(db.delete(id).await?);
    assert!(!db.delete(id).await?);
    Ok(())
}

#[tokio::test]
async fn smoke_test_service_over_postgres() -> ApiResult<()> {
    let db = test_db()?;
    db.init_schema().await?;

    let service = NotesService::new(Arc::new(db), memory_cache(), Duration::from_secs(15));
    let note = service.create_note("cached smoke", None).await?;

    let listing = service.list_notes().await?;
    assert!(listing.notes.iter().any(|n| n.id == note.id));

    service.delete_note(note.id).await?;
    let listing = service.list_notes().await?;
    assert!(listing.notes.iter().all(|n| n.id != note.id));
    Ok(())
}
