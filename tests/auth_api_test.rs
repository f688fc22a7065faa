// Integration tests for the /auth endpoints

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::{json, Value};

mod common;
use common::{setup_test_app, setup_test_app_with, TEST_EMAIL, TEST_PASSWORD};

#[tokio::test]
async fn test_who_am_i_anonymous() {
    let app = setup_test_app();

    let response = app.get("/auth").send().await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.json::<Value>(), json!({}));
}

#[tokio::test]
async fn test_login_with_form_sets_session() {
    let app = setup_test_app();
    app.create_user(TEST_EMAIL, TEST_PASSWORD).await;

    let response = app
        .post("/auth")
        .form(&[("email", TEST_EMAIL), ("password", TEST_PASSWORD)])
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let set_cookie = response.set_cookie("hix_io_session").unwrap();
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("Path=/"));

    let body: Value = response.json();
    assert_eq!(body["email"], TEST_EMAIL);
    assert_eq!(body["name"], "mahlon");
    assert!(body.get("password_hash").is_none());
    assert!(body.get("api_secret").is_none());

    let token = response.cookie("hix_io_session").unwrap();
    let response = app.get("/auth").cookie(app.session(&token)).send().await;
    assert_eq!(response.json::<Value>()["email"], TEST_EMAIL);
}

#[tokio::test]
async fn test_login_with_headers() {
    let app = setup_test_app();
    app.create_user(TEST_EMAIL, TEST_PASSWORD).await;

    let response = app
        .post("/auth")
        .header("email", TEST_EMAIL)
        .header("password", TEST_PASSWORD)
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.cookie("hix_io_session").is_some());
}

#[tokio::test]
async fn test_login_failures_are_generic() {
    let app = setup_test_app();
    app.create_user(TEST_EMAIL, TEST_PASSWORD).await;

    for fields in [
        vec![("email", TEST_EMAIL), ("password", "wrong")],
        vec![("email", "nobody@example.com"), ("password", TEST_PASSWORD)],
        vec![("email", TEST_EMAIL)],
        vec![],
    ] {
        let response = app.post("/auth").form(&fields).send().await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.set_cookie("hix_io_session").is_none());
        assert_eq!(
            response.json::<Value>(),
            json!({"error": "Authentication required.", "status": 401})
        );
    }
}

#[tokio::test]
async fn test_session_ignored_from_other_origin() {
    let app = setup_test_app();
    app.create_user(TEST_EMAIL, TEST_PASSWORD).await;
    let token = app.login_from(TEST_EMAIL, TEST_PASSWORD, "10.1.1.1").await;

    let same = app
        .get("/auth")
        .cookie(app.session(&token))
        .with_ip("10.1.1.1")
        .send()
        .await;
    assert_eq!(same.json::<Value>()["email"], TEST_EMAIL);

    let other = app
        .get("/auth")
        .cookie(app.session(&token))
        .with_ip("10.1.1.2")
        .send()
        .await;
    assert_eq!(other.status(), StatusCode::OK);
    assert_eq!(other.json::<Value>(), json!({}));
}

#[tokio::test]
async fn test_forwarded_for_from_trusted_proxy() {
    let app = setup_test_app_with(|config| {
        config.trust_forwarded_for = true;
        config.trusted_proxies = vec!["10.0.0.0/8".parse().unwrap()];
    });
    app.create_user(TEST_EMAIL, TEST_PASSWORD).await;

    let response = app
        .post("/auth")
        .form(&[("email", TEST_EMAIL), ("password", TEST_PASSWORD)])
        .header("x-forwarded-for", "198.51.100.4")
        .with_ip("10.0.0.1")
        .send()
        .await;
    let token = response.cookie("hix_io_session").unwrap();

    let response = app
        .get("/auth")
        .cookie(app.session(&token))
        .header("x-forwarded-for", "198.51.100.4")
        .with_ip("10.0.0.2")
        .send()
        .await;
    assert_eq!(response.json::<Value>()["email"], TEST_EMAIL);

    // Same proxy, different client
    let response = app
        .get("/auth")
        .cookie(app.session(&token))
        .header("x-forwarded-for", "198.51.100.5")
        .with_ip("10.0.0.1")
        .send()
        .await;
    assert_eq!(response.json::<Value>(), json!({}));

    // Client-supplied leftmost entry is not the origin
    let response = app
        .get("/auth")
        .cookie(app.session(&token))
        .header("x-forwarded-for", "198.51.100.4, 198.51.100.5")
        .with_ip("10.0.0.1")
        .send()
        .await;
    assert_eq!(response.json::<Value>(), json!({}));
}

#[tokio::test]
async fn test_forwarded_for_ignored_from_direct_clients() {
    let app = setup_test_app_with(|config| {
        config.trust_forwarded_for = true;
        config.trusted_proxies = vec!["10.0.0.0/8".parse().unwrap()];
    });
    app.create_user(TEST_EMAIL, TEST_PASSWORD).await;
    let token = app.login_from(TEST_EMAIL, TEST_PASSWORD, "10.0.0.1").await;

    let response = app
        .get("/auth")
        .cookie(app.session(&token))
        .header("x-forwarded-for", "10.0.0.1")
        .with_ip("198.51.100.9")
        .send()
        .await;
    assert_eq!(response.json::<Value>(), json!({}));
}

#[tokio::test]
async fn test_forwarded_for_ignored_by_default() {
    let app = setup_test_app();
    app.create_user(TEST_EMAIL, TEST_PASSWORD).await;
    let token = app.login_from(TEST_EMAIL, TEST_PASSWORD, "10.0.0.1").await;

    let response = app
        .get("/auth")
        .cookie(app.session(&token))
        .header("x-forwarded-for", "10.0.0.1")
        .with_ip("198.51.100.9")
        .send()
        .await;
    assert_eq!(response.json::<Value>(), json!({}));
}

#[tokio::test]
async fn test_logout_clears_session() {
    let app = setup_test_app();
    app.create_user(TEST_EMAIL, TEST_PASSWORD).await;
    let token = app.login(TEST_EMAIL, TEST_PASSWORD).await;
    assert_eq!(app.store.session_count().await, 1);

    let response = app.delete("/auth").cookie(app.session(&token)).send().await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.json::<Value>(), json!(""));
    let removal = response.set_cookie("hix_io_session").unwrap();
    assert!(removal.contains("Max-Age=0"));
    assert_eq!(app.store.session_count().await, 0);

    let response = app.get("/auth").cookie(app.session(&token)).send().await;
    assert_eq!(response.json::<Value>(), json!({}));

    // No cookie at all is still fine
    let response = app.delete("/auth").send().await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_profile_update() {
    let app = setup_test_app();
    app.create_user(TEST_EMAIL, TEST_PASSWORD).await;

    let response = app.patch("/auth").form(&[("name", "Nobody")]).send().await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let token = app.login(TEST_EMAIL, TEST_PASSWORD).await;
    let response = app
        .patch("/auth")
        .cookie(app.session(&token))
        .form(&[("name", "Mahlon Smith"), ("password", "new secret")])
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["name"], "Mahlon Smith");

    let response = app
        .post("/auth")
        .form(&[("email", TEST_EMAIL), ("password", TEST_PASSWORD)])
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    app.login(TEST_EMAIL, "new secret").await;

    let response = app
        .patch("/auth")
        .cookie(app.session(&token))
        .form(&[("name", "  ")])
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_disabled_account_cannot_log_in() {
    let app = setup_test_app();
    app.create_user(TEST_EMAIL, TEST_PASSWORD).await;
    let token = app.login(TEST_EMAIL, TEST_PASSWORD).await;

    app.store
        .set_disable_on(TEST_EMAIL, Some(Utc::now() - Duration::seconds(1)))
        .await;

    let response = app
        .post("/auth")
        .form(&[("email", TEST_EMAIL), ("password", TEST_PASSWORD)])
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.get("/auth").cookie(app.session(&token)).send().await;
    assert_eq!(response.json::<Value>(), json!({}));
}
