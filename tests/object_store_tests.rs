use bytes::Bytes;
use file_sharer::object_store::{
    LocalStore, ObjectStore, ObjectStoreError, SupabaseStore, CHUNK_SIZE,
};
use file_sharer::progress::{self, ProgressEvent, ProgressSender};
use futures::StreamExt;
use url::Url;
use wiremock::matchers::{body_bytes, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn local_store(dir: &tempfile::TempDir) -> LocalStore {
    LocalStore::new(
        dir.path(),
        "files",
        Url::parse("https://app.example").unwrap(),
    )
    .unwrap()
}

fn supabase_store(base: &str) -> SupabaseStore {
    SupabaseStore::new(
        reqwest::Client::new(),
        Url::parse(base).unwrap(),
        "files",
        "anon-key",
    )
}

#[tokio::test]
async fn test_local_store_put_get() {
    let dir = tempfile::tempdir().unwrap();
    let store = local_store(&dir);

    let data = Bytes::from("hello world");
    store
        .put("1-test.txt", data.clone(), "text/plain", &ProgressSender::detached())
        .await
        .unwrap();

    let retrieved = store.get("1-test.txt").await.unwrap();
    assert_eq!(retrieved, data);
    assert!(dir.path().join("1-test.txt").is_file());
}

#[tokio::test]
async fn test_local_store_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let store = local_store(&dir);
    let progress = ProgressSender::detached();

    store
        .put("key", Bytes::from("first"), "text/plain", &progress)
        .await
        .unwrap();
    store
        .put("key", Bytes::from("second"), "text/plain", &progress)
        .await
        .unwrap();

    let data = store.get("key").await.unwrap();
    assert_eq!(data, Bytes::from("second"));
}

#[tokio::test]
async fn test_local_store_get_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = local_store(&dir);

    let result = store.get("missing").await;
    assert!(matches!(result.unwrap_err(), ObjectStoreError::NotFound(_)));
}

#[tokio::test]
async fn test_local_store_rejects_path_keys() {
    let dir = tempfile::tempdir().unwrap();
    let store = local_store(&dir);

    for key in ["../escape", "a/b", "..", ""] {
        let result = store
            .put(key, Bytes::from("x"), "text/plain", &ProgressSender::detached())
            .await;
        assert!(
            matches!(result, Err(ObjectStoreError::InvalidKey(_))),
            "{key:?}"
        );
    }
}

#[tokio::test]
async fn test_local_store_public_url() {
    let dir = tempfile::tempdir().unwrap();
    let store = local_store(&dir);

    let url = store.public_url("1700000000000-my notes.txt").unwrap();
    assert_eq!(
        url.as_str(),
        "https://app.example/public/files/1700000000000-my%20notes.txt"
    );
}

#[tokio::test]
async fn test_local_store_reports_progress_per_chunk() {
    let dir = tempfile::tempdir().unwrap();
    let store = local_store(&dir);
    let (tx, stream) = progress::channel();

    let data = Bytes::from(vec![0u8; CHUNK_SIZE * 4]);
    store
        .put("big.bin", data, "application/octet-stream", &tx)
        .await
        .unwrap();
    tx.complete();

    let events: Vec<_> = stream.collect().await;
    assert_eq!(
        events,
        vec![
            ProgressEvent::Percent(0),
            ProgressEvent::Percent(25),
            ProgressEvent::Percent(50),
            ProgressEvent::Percent(75),
            ProgressEvent::Percent(99),
            ProgressEvent::Completed,
        ]
    );
}

#[tokio::test]
async fn test_supabase_put_sends_authenticated_upsert() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/storage/v1/object/files/1700000000000-notes.txt"))
        .and(header("apikey", "anon-key"))
        .and(header("authorization", "Bearer anon-key"))
        .and(header("x-upsert", "true"))
        .and(header("content-type", "text/plain"))
        .and(body_bytes(b"hello".to_vec()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "Key": "files/1700000000000-notes.txt" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = supabase_store(&server.uri());
    let (tx, stream) = progress::channel();
    store
        .put("1700000000000-notes.txt", Bytes::from("hello"), "text/plain", &tx)
        .await
        .unwrap();
    drop(tx);

    let events: Vec<_> = stream.collect().await;
    assert_eq!(
        events,
        vec![ProgressEvent::Percent(0), ProgressEvent::Percent(99)]
    );
}

#[tokio::test]
async fn test_supabase_put_rejected_status() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(403).set_body_string("new row violates policy"))
        .expect(1)
        .mount(&server)
        .await;

    let store = supabase_store(&server.uri());
    let err = store
        .put("1-a.txt", Bytes::from("a"), "text/plain", &ProgressSender::detached())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ObjectStoreError::Rejected { status: 403, ref reason } if reason == "Forbidden"
    ));
    assert_eq!(err.to_string(), "Upload failed with status 403: Forbidden");
}

#[tokio::test]
async fn test_supabase_put_network_error() {
    // Nothing listens on port 1
    let store = supabase_store("http://127.0.0.1:1");
    let err = store
        .put("1-a.txt", Bytes::from("a"), "text/plain", &ProgressSender::detached())
        .await
        .unwrap_err();

    assert!(matches!(err, ObjectStoreError::Transport(_)));
}

#[test]
fn test_supabase_public_url() {
    let store = supabase_store("https://proj.supabase.co");
    let url = store.public_url("1700000000000-notes.txt").unwrap();
    assert_eq!(
        url.as_str(),
        "https://proj.supabase.co/storage/v1/object/public/files/1700000000000-notes.txt"
    );
}
