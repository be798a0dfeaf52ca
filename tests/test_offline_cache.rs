mod common;

use std::sync::Arc;

use common::{alice, bob, sqlite_cache, LocalEnv};
use docshare::cache::offline::{OfflineCache, SqliteOfflineCache};
use docshare::error::AppError;

#[tokio::test]
async fn saved_copy_matches_remote_record() {
    let (_dir, cache) = sqlite_cache();
    let env = LocalEnv::with_cache(cache).await;
    let doc = env.service.create(&alice(), "Notes", "<p>hi</p>").await.unwrap();

    env.service.save_offline(&alice(), &doc.document_id).await.unwrap();

    let copy = env.service.offline_copy(&doc.document_id).await.unwrap();
    assert_eq!(copy.title, doc.title);
    assert_eq!(copy.content, doc.content);
    assert_eq!(copy.timestamp, doc.timestamp.timestamp_millis());
}

#[tokio::test]
async fn removed_copy_is_not_found() {
    let (_dir, cache) = sqlite_cache();
    let env = LocalEnv::with_cache(cache).await;
    let doc = env.service.create(&alice(), "Notes", "").await.unwrap();
    env.service.save_offline(&alice(), &doc.document_id).await.unwrap();

    assert!(env.service.remove_offline(&doc.document_id).await.unwrap());
    assert!(matches!(
        env.service.offline_copy(&doc.document_id).await,
        Err(AppError::NotFound(_))
    ));
    assert!(!env.service.remove_offline(&doc.document_id).await.unwrap());
}

#[tokio::test]
async fn copies_survive_reopening_the_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("offline.db");

    let doc_id = {
        let cache = Arc::new(SqliteOfflineCache::open(&path).unwrap());
        let env = LocalEnv::with_cache(cache).await;
        let doc = env.service.create(&alice(), "Notes", "<p>kept</p>").await.unwrap();
        env.service.save_offline(&alice(), &doc.document_id).await.unwrap();
        doc.document_id
    };

    let reopened = SqliteOfflineCache::open(&path).unwrap();
    let copy = reopened.get(&doc_id).await.unwrap().unwrap();
    assert_eq!(copy.content, "<p>kept</p>");
}

#[tokio::test]
async fn viewers_can_save_offline() {
    let (_dir, cache) = sqlite_cache();
    let env = LocalEnv::with_cache(cache).await;
    let doc = env.service.create(&alice(), "Notes", "<p>hi</p>").await.unwrap();
    env.service
        .share(&alice(), &doc.document_id, "bob@x.com", "view")
        .await
        .unwrap();

    let copy = env.service.save_offline(&bob(), &doc.document_id).await.unwrap();
    assert_eq!(copy.content, "<p>hi</p>");
}

#[tokio::test]
async fn strangers_cannot_save_offline() {
    let env = LocalEnv::start().await;
    let doc = env.service.create(&alice(), "Notes", "").await.unwrap();

    let err = env
        .service
        .save_offline(&bob(), &doc.document_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AccessDenied(_)));
    assert!(env.service.list_offline().await.unwrap().is_empty());
}

#[tokio::test]
async fn remote_wins_on_fetch() {
    let (_dir, cache) = sqlite_cache();
    let env = LocalEnv::with_cache(cache).await;
    let doc = env.service.create(&alice(), "Notes", "<p>v1</p>").await.unwrap();
    env.service.save_offline(&alice(), &doc.document_id).await.unwrap();

    env.service
        .share(&alice(), &doc.document_id, "bob@x.com", "edit")
        .await
        .unwrap();
    env.service
        .update(&bob(), &doc.document_id, "Notes v2", "<p>v2</p>")
        .await
        .unwrap();

    env.service.open(&alice(), &doc.document_id).await.unwrap();
    let copy = env.service.offline_copy(&doc.document_id).await.unwrap();
    assert_eq!(copy.title, "Notes v2");
    assert_eq!(copy.content, "<p>v2</p>");

    // The cache is never pushed back to the remote store
    let stored = env.service.open(&alice(), &doc.document_id).await.unwrap();
    assert_eq!(stored.document.content, "<p>v2</p>");
}

#[tokio::test]
async fn deleting_a_document_drops_its_copy() {
    let (_dir, cache) = sqlite_cache();
    let env = LocalEnv::with_cache(cache).await;
    let keep = env.service.create(&alice(), "Keep", "").await.unwrap();
    let gone = env.service.create(&alice(), "Drop", "").await.unwrap();
    env.service.save_offline(&alice(), &keep.document_id).await.unwrap();
    env.service.save_offline(&alice(), &gone.document_id).await.unwrap();

    env.service.delete(&alice(), &gone.document_id).await.unwrap();

    let ids: Vec<String> = env
        .service
        .list_offline()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.document_id)
        .collect();
    assert_eq!(ids, vec![keep.document_id]);
}
