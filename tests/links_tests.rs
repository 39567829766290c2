use file_sharer::links::{LinkMapping, LinkTable, LinkTableError, SupabaseLinks};
use url::Url;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn links(server: &MockServer) -> SupabaseLinks {
    SupabaseLinks::new(
        reqwest::Client::new(),
        &Url::parse(&server.uri()).unwrap(),
        "links",
        "anon-key",
    )
    .unwrap()
}

fn sample_link() -> LinkMapping {
    LinkMapping {
        id: "ab12cd".to_string(),
        path: "https://proj.supabase.co/storage/v1/object/public/files/1-notes.txt".to_string(),
    }
}

#[tokio::test]
async fn test_insert_posts_row() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/links"))
        .and(header("apikey", "anon-key"))
        .and(header("authorization", "Bearer anon-key"))
        .and(header("prefer", "return=minimal"))
        .and(body_json(serde_json::json!({
            "id": "ab12cd",
            "path": "https://proj.supabase.co/storage/v1/object/public/files/1-notes.txt",
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    links(&server).insert(&sample_link()).await.unwrap();
}

#[tokio::test]
async fn test_insert_duplicate_is_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(409).set_body_json(serde_json::json!({
            "code": "23505",
            "details": "Key (id)=(ab12cd) already exists.",
            "hint": null,
            "message": "duplicate key value violates unique constraint \"links_pkey\"",
        })))
        .mount(&server)
        .await;

    let err = links(&server).insert(&sample_link()).await.unwrap_err();
    assert!(matches!(err, LinkTableError::Conflict(id) if id == "ab12cd"));
}

#[tokio::test]
async fn test_insert_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "code": "42501",
            "message": "permission denied for table links",
        })))
        .mount(&server)
        .await;

    match links(&server).insert(&sample_link()).await.unwrap_err() {
        LinkTableError::Rejected { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "permission denied for table links");
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn test_select_one_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/links"))
        .and(query_param("select", "path"))
        .and(query_param("id", "eq.ab12cd"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "path": "https://proj.supabase.co/storage/v1/object/public/files/1-notes.txt" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let found = links(&server).select_one("ab12cd").await.unwrap();
    assert_eq!(found, Some(sample_link()));
}

#[tokio::test]
async fn test_select_one_missing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    assert_eq!(links(&server).select_one("doesnotexist").await.unwrap(), None);
}

#[tokio::test]
async fn test_select_one_multiple_rows_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "path": "https://a.example/1" },
            { "path": "https://a.example/2" },
        ])))
        .mount(&server)
        .await;

    let err = links(&server).select_one("ab12cd").await.unwrap_err();
    assert!(matches!(err, LinkTableError::Rejected { .. }));
}

#[tokio::test]
async fn test_select_one_unreachable() {
    let links = SupabaseLinks::new(
        reqwest::Client::new(),
        &Url::parse("http://127.0.0.1:1").unwrap(),
        "links",
        "anon-key",
    )
    .unwrap();

    let err = links.select_one("ab12cd").await.unwrap_err();
    assert!(matches!(err, LinkTableError::Transport(_)));
}

#[test]
fn test_base_url_without_path_rejected() {
    let result = SupabaseLinks::new(
        reqwest::Client::new(),
        &Url::parse("mailto:team@example.com").unwrap(),
        "links",
        "anon-key",
    );
    assert!(matches!(result, Err(LinkTableError::InvalidUrl(_))));
}
