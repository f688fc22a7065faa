// Integration tests for the read-only post endpoints and health check

use axum::http::StatusCode;
use serde_json::Value;

mod common;
use common::setup_test_app;

#[tokio::test]
async fn test_list_and_detail() {
    let app = setup_test_app();
    let first = app.seed_post("Hello", "First post", true).await;
    let draft = app.seed_post("Draft", "Not yet", false).await;
    app.seed_post("Again", "Second post", true).await;

    let page: Value = app.get("/posts").send().await.json();
    assert_eq!(page["count"], 2);
    assert_eq!(page["posts"][0]["title"], "Hello");
    assert_eq!(page["posts"][1]["title"], "Again");

    let page: Value = app.get("/posts?offset=1&limit=1").send().await.json();
    assert_eq!(page["count"], 2);
    assert_eq!(page["posts"].as_array().unwrap().len(), 1);
    assert_eq!(page["posts"][0]["title"], "Again");

    let response = app.get(&format!("/posts/{}", first.id)).send().await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["body"], "First post");

    for path in [format!("/posts/{}", draft.id), "/posts/9999".to_string(), "/posts/abc".to_string()] {
        let response = app.get(&path).send().await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", path);
    }
}

#[tokio::test]
async fn test_search() {
    let app = setup_test_app();
    app.seed_post("Rust services", "axum and diesel", true).await;
    app.seed_post("Ruby", "the old site", true).await;
    app.seed_post("Rust draft", "axum again", false).await;

    let page: Value = app.get("/posts/search?q=rust+AXUM").send().await.json();
    assert_eq!(page["count"], 1);
    assert_eq!(page["posts"][0]["title"], "Rust services");

    let page: Value = app.get("/posts/search?q=").send().await.json();
    assert_eq!(page["count"], 0);

    let page: Value = app.get("/posts/search").send().await.json();
    assert_eq!(page["count"], 0);
}

#[tokio::test]
async fn test_health() {
    let app = setup_test_app();

    let response = app.get("/health").send().await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "hix-backend");
    assert_eq!(body["components"]["store"]["backend"], "memory");
}
