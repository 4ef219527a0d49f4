mod common;

use ai_event_scanner::app::{CollectionStore, LoadStatus, ToggleOutcome};
use ai_event_scanner::domain::{Category, CollectionScope, LoadFilters};
use ai_event_scanner::error::{ScannerError, TransportError};
use ai_event_scanner::view::{project, CategoryFilter};
use anyhow::Result;
use common::{collection, event, month_route, watch_ok, ScriptedTransport, WATCH};
use std::sync::Arc;

fn november() -> CollectionScope {
    CollectionScope::new(11, 2025).unwrap()
}

async fn seeded_store(events: Vec<serde_json::Value>) -> (Arc<ScriptedTransport>, Arc<CollectionStore>) {
    let transport = ScriptedTransport::new();
    transport.ok(&month_route(11, 2025), collection(11, 2025, events)).await;
    transport.ok(WATCH, watch_ok()).await;
    let store = Arc::new(CollectionStore::new(transport.clone()));
    (transport, store)
}

#[tokio::test]
async fn loaded_collection_is_consistent() -> Result<()> {
    let (_, store) = seeded_store(vec![
        event("w1", "Workshop", false),
        event("t1", "Talk", true),
        event("n1", "Networking", false),
    ])
    .await;

    let loaded = store.load(november(), LoadFilters::default()).await?;

    assert!(loaded.is_consistent());
    assert_eq!(loaded.total_events(), 3);
    assert_eq!(loaded.watched_count(), 1);
    assert_eq!(loaded.bucket(Category::Talk).len(), 1);
    assert_eq!(store.status().await, LoadStatus::Loaded);
    Ok(())
}

#[tokio::test]
async fn repeated_loads_give_equal_collections() -> Result<()> {
    let (transport, store) = seeded_store(vec![event("w1", "Workshop", false)]).await;

    let first = store.load(november(), LoadFilters::default()).await?;
    let second = store.load(november(), LoadFilters::default()).await?;

    assert_eq!(first, second);
    assert_eq!(store.snapshot().await, Some(second));
    assert_eq!(transport.calls_to(&month_route(11, 2025)).await.len(), 2);
    Ok(())
}

#[tokio::test]
async fn talk_toggle_updates_sequence_bucket_and_counter() -> Result<()> {
    let (transport, store) = seeded_store(vec![
        event("w1", "Workshop", false),
        event("w2", "Workshop", false),
        event("t1", "Talk", false),
    ])
    .await;
    store.load(november(), LoadFilters::default()).await?;

    let outcome = store.toggle_watch("t1", false).await?;
    assert_eq!(outcome, ToggleOutcome::Applied { watched: true });

    let current = store.snapshot().await.unwrap();
    assert!(current.find("t1").unwrap().is_watched);
    assert!(current.bucket(Category::Talk)[0].is_watched);
    assert!(current.bucket(Category::Workshop).iter().all(|e| !e.is_watched));
    assert_eq!(current.watched_count(), 1);
    assert!(current.is_consistent());

    let watched = project(&current, &CategoryFilter::All, true);
    assert_eq!(watched.len(), 1);
    assert_eq!(watched[0].id, "t1");

    let body = transport.calls_to(WATCH).await[0].body.clone().unwrap();
    assert_eq!(body, serde_json::json!({"event_id": "t1", "watch_status": true}));
    Ok(())
}

#[tokio::test]
async fn toggle_twice_restores_collection() -> Result<()> {
    let (_, store) = seeded_store(vec![event("w1", "Workshop", false), event("t1", "Talk", true)]).await;
    let before = store.load(november(), LoadFilters::default()).await?;

    store.toggle_watch("w1", false).await?;
    store.toggle_watch("w1", true).await?;

    assert_eq!(store.snapshot().await, Some(before));
    Ok(())
}

#[tokio::test]
async fn failed_toggle_changes_nothing() -> Result<()> {
    let transport = ScriptedTransport::new();
    transport
        .ok(&month_route(11, 2025), collection(11, 2025, vec![event("t1", "Talk", false)]))
        .await;
    transport
        .reply(WATCH, Err(TransportError::Timeout(std::time::Duration::from_secs(30))))
        .await;
    let store = CollectionStore::new(transport.clone());
    let before = store.load(november(), LoadFilters::default()).await?;

    let err = store.toggle_watch("t1", false).await.unwrap_err();

    assert!(matches!(err, ScannerError::Transport(TransportError::Timeout(_))));
    assert_eq!(store.snapshot().await, Some(before));
    Ok(())
}

#[tokio::test]
async fn rejected_toggle_changes_nothing() -> Result<()> {
    let transport = ScriptedTransport::new();
    transport
        .ok(&month_route(11, 2025), collection(11, 2025, vec![event("t1", "Talk", false)]))
        .await;
    transport
        .ok(WATCH, serde_json::json!({"success": false, "message": "Event not found"}))
        .await;
    let store = CollectionStore::new(transport.clone());
    let before = store.load(november(), LoadFilters::default()).await?;

    let err = store.toggle_watch("t1", false).await.unwrap_err();

    assert_eq!(err.user_message(), "Event not found");
    assert_eq!(store.snapshot().await, Some(before));
    Ok(())
}

#[tokio::test]
async fn toggle_for_unknown_id_is_silent() -> Result<()> {
    let (_, store) = seeded_store(vec![event("t1", "Talk", false)]).await;
    let before = store.load(november(), LoadFilters::default()).await?;

    assert_eq!(store.toggle_watch("ghost", false).await?, ToggleOutcome::NotFound);
    assert_eq!(store.snapshot().await, Some(before));
    Ok(())
}

#[tokio::test]
async fn older_toggle_response_is_discarded() -> Result<()> {
    let (transport, store) = seeded_store(vec![event("t1", "Talk", false)]).await;
    store.load(november(), LoadFilters::default()).await?;

    let held = transport.hold(WATCH).await;
    let first = {
        let store = store.clone();
        tokio::spawn(async move { store.toggle_watch("t1", false).await })
    };
    held.entered.notified().await;

    // Second click lands while the first request is still out
    let second = store.toggle_watch("t1", false).await?;
    assert_eq!(second, ToggleOutcome::Applied { watched: true });

    held.release.notify_one();
    let first = first.await??;
    assert_eq!(first, ToggleOutcome::Stale);

    let current = store.snapshot().await.unwrap();
    assert!(current.find("t1").unwrap().is_watched);
    assert_eq!(current.watched_count(), 1);
    assert!(current.is_consistent());
    Ok(())
}

#[tokio::test]
async fn newest_overlapping_load_wins() -> Result<()> {
    let transport = ScriptedTransport::new();
    transport
        .ok(&month_route(10, 2025), collection(10, 2025, vec![event("oct", "Talk", false)]))
        .await;
    transport
        .ok(&month_route(11, 2025), collection(11, 2025, vec![event("nov", "Talk", false)]))
        .await;
    let store = Arc::new(CollectionStore::new(transport.clone()));

    let held = transport.hold(&month_route(10, 2025)).await;
    let october = {
        let store = store.clone();
        tokio::spawn(async move {
            store
                .load(CollectionScope::new(10, 2025).unwrap(), LoadFilters::default())
                .await
        })
    };
    held.entered.notified().await;
    assert_eq!(store.status().await, LoadStatus::Loading);

    store.load(november(), LoadFilters::default()).await?;
    assert_eq!(store.status().await, LoadStatus::Loading);
    held.release.notify_one();
    let late = october.await?;

    assert!(matches!(
        late,
        Err(ScannerError::LoadSuperseded { month: 10, year: 2025 })
    ));
    let current = store.snapshot().await.unwrap();
    assert_eq!(current.scope(), november());
    assert!(current.find("nov").is_some());
    assert_eq!(store.status().await, LoadStatus::Loaded);
    Ok(())
}

#[tokio::test]
async fn older_load_is_adopted_when_newer_one_fails() -> Result<()> {
    let transport = ScriptedTransport::new();
    transport
        .ok(&month_route(10, 2025), collection(10, 2025, vec![event("oct", "Talk", false)]))
        .await;
    transport
        .reply(
            &month_route(11, 2025),
            Err(TransportError::NetworkFailure("connection refused".into())),
        )
        .await;
    let store = Arc::new(CollectionStore::new(transport.clone()));

    let held = transport.hold(&month_route(10, 2025)).await;
    let october = {
        let store = store.clone();
        tokio::spawn(async move {
            store
                .load(CollectionScope::new(10, 2025).unwrap(), LoadFilters::default())
                .await
        })
    };
    held.entered.notified().await;

    assert!(store.load(november(), LoadFilters::default()).await.is_err());
    assert_eq!(store.status().await, LoadStatus::Loading);
    held.release.notify_one();
    let adopted = october.await??;

    assert_eq!(store.snapshot().await, Some(adopted));
    assert_eq!(store.status().await, LoadStatus::Loaded);
    Ok(())
}

#[tokio::test]
async fn failed_load_keeps_previous_collection() -> Result<()> {
    let transport = ScriptedTransport::new();
    let route = month_route(11, 2025);
    transport.ok(&route, collection(11, 2025, vec![event("t1", "Talk", false)])).await;
    transport
        .reply(&route, Err(TransportError::NetworkFailure("connection refused".into())))
        .await;
    let store = CollectionStore::new(transport.clone());

    let before = store.load(november(), LoadFilters::default()).await?;
    assert!(store.refresh().await.is_err());

    assert_eq!(store.snapshot().await, Some(before));
    assert_eq!(store.status().await, LoadStatus::Loaded);
    Ok(())
}

#[tokio::test]
async fn inconsistent_server_collection_is_kept_verbatim() -> Result<()> {
    let transport = ScriptedTransport::new();
    let mut body = collection(11, 2025, vec![event("t1", "Talk", false)]);
    body["watchedCount"] = serde_json::json!(4);
    transport.ok(&month_route(11, 2025), body).await;
    let store = CollectionStore::new(transport.clone());

    let loaded = store.load(november(), LoadFilters::default()).await?;

    assert!(!loaded.is_consistent());
    assert_eq!(loaded.watched_count(), 4);
    Ok(())
}
