use hanron_persist::{
    sweep_messages, InMemoryThreadStore, MessageRole, PersistError, SweepReport, ThreadStore,
};

#[tokio::test]
async fn test_list_messages_preserves_append_order() {
    let store = InMemoryThreadStore::new();
    let id = store.create_thread("alice", "Cats", "Cats").await.unwrap();

    for content in ["m1", "m2", "m3"] {
        store
            .append_message("alice", &id, MessageRole::User, content)
            .await
            .unwrap();
    }

    let messages = store.list_messages("alice", &id).await.unwrap();
    let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
    let sequences: Vec<u64> = messages.iter().map(|m| m.sequence).collect();
    assert_eq!(contents, vec!["m1", "m2", "m3"]);
    assert_eq!(sequences, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_concurrent_appends_never_share_a_sequence() {
    let store = InMemoryThreadStore::new();
    let id = store.create_thread("alice", "t", "t").await.unwrap();

    let mut handles = Vec::new();
    for i in 0..32 {
        let store = store.clone();
        let id = id.clone();
        handles.push(tokio::spawn(async move {
            store
                .append_message("alice", &id, MessageRole::User, &format!("m{}", i))
                .await
                .unwrap()
        }));
    }

    let mut sequences = Vec::new();
    for handle in handles {
        sequences.push(handle.await.unwrap());
    }
    sequences.sort_unstable();
    assert_eq!(sequences, (1..=32).collect::<Vec<u64>>());
}

#[tokio::test]
async fn test_threads_listed_in_creation_order_per_owner() {
    let store = InMemoryThreadStore::new();
    let first = store.create_thread("alice", "first", "first").await.unwrap();
    store.create_thread("bob", "other", "other").await.unwrap();
    let second = store.create_thread("alice", "second", "second").await.unwrap();

    let threads = store.list_threads("alice").await.unwrap();
    let ids: Vec<&str> = threads.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec![first.as_str(), second.as_str()]);
    assert_eq!(threads[0].topic.as_deref(), Some("first"));
}

#[tokio::test]
async fn test_cross_owner_access_forbidden() {
    let store = InMemoryThreadStore::new();
    let id = store.create_thread("alice", "t", "t").await.unwrap();

    let read = store.list_messages("mallory", &id).await;
    assert!(matches!(read, Err(PersistError::Forbidden { .. })));

    let append = store
        .append_message("mallory", &id, MessageRole::User, "hijack")
        .await;
    assert!(matches!(append, Err(PersistError::Forbidden { .. })));

    let delete = store.delete_thread("mallory", &id).await;
    assert!(matches!(delete, Err(PersistError::Forbidden { .. })));
    assert!(store.get_thread("alice", &id).await.is_ok());
}

#[tokio::test]
async fn test_delete_thread_is_idempotent() {
    let store = InMemoryThreadStore::new();
    let id = store.create_thread("alice", "t", "t").await.unwrap();
    store
        .append_message("alice", &id, MessageRole::User, "claim")
        .await
        .unwrap();

    store.delete_thread("alice", &id).await.unwrap();
    store.delete_thread("alice", &id).await.unwrap();

    assert!(store.list_threads("alice").await.unwrap().is_empty());
    assert_eq!(store.message_count().await, 0);
}

#[tokio::test]
async fn test_sweep_on_empty_thread_is_noop() {
    let store = InMemoryThreadStore::new();
    let id = store.create_thread("alice", "t", "t").await.unwrap();

    let report = sweep_messages(&store, &id, 10).await.unwrap();
    assert_eq!(report, SweepReport { deleted: 0, rounds: 1 });

    let again = sweep_messages(&store, &id, 10).await.unwrap();
    assert_eq!(again, report);
}

#[tokio::test]
async fn test_missing_thread_reported() {
    let store = InMemoryThreadStore::new();
    let err = store.get_thread("alice", "nope").await.unwrap_err();
    assert!(matches!(err, PersistError::ThreadNotFound(ref id) if id == "nope"));
    assert!(!err.is_unavailable());
}

#[tokio::test]
async fn test_bind_topic_keeps_existing_topic() {
    let store = InMemoryThreadStore::new();
    let id = store.create_thread("alice", "Cats", "Cats").await.unwrap();

    assert!(!store.bind_topic("alice", &id, "Dogs").await.unwrap());
    let thread = store.get_thread("alice", &id).await.unwrap();
    assert_eq!(thread.topic.as_deref(), Some("Cats"));

    let foreign = store.bind_topic("mallory", &id, "Dogs").await;
    assert!(matches!(foreign, Err(PersistError::Forbidden { .. })));
    let missing = store.bind_topic("alice", "nope", "Dogs").await;
    assert!(matches!(missing, Err(PersistError::ThreadNotFound(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_delete_racing_appends_leaves_no_orphans() {
    for _ in 0..20 {
        let store = InMemoryThreadStore::with_sweep_batch_size(2);
        let id = store.create_thread("alice", "t", "t").await.unwrap();

        let mut writers = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            let id = id.clone();
            writers.push(tokio::spawn(async move {
                for j in 0..10 {
                    let content = format!("m{}-{}", i, j);
                    if store
                        .append_message("alice", &id, MessageRole::User, &content)
                        .await
                        .is_err()
                    {
                        break;
                    }
                    tokio::task::yield_now().await;
                }
            }));
        }

        store.delete_thread("alice", &id).await.unwrap();
        for writer in writers {
            writer.await.unwrap();
        }

        assert_eq!(store.message_count().await, 0);
        assert!(store.list_threads("alice").await.unwrap().is_empty());
    }
}
