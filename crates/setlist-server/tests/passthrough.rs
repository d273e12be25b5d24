//! TIDAL passthrough integration tests.

mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::TestApp;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

const SESSION: &str = "tidal_access_token=at-old; tidal_refresh_token=rt-1; tidal_user_id=4242";

#[tokio::test]
async fn test_user_profile() -> Result<()> {
    let app = TestApp::start().await?;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("authorization", "Bearer at-old"))
        .and(header("content-type", "application/vnd.tidal.v1+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 4242,
            "username": "dj",
            "countryCode": "NO"
        })))
        .mount(&app.tidal)
        .await;

    let resp = app.get("/api/tidal/user", SESSION).await?;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json()?;
    assert_eq!(body["id"], 4242);
    assert_eq!(body["countryCode"], "NO");
    assert!(resp.set_cookies().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_not_authenticated() -> Result<()> {
    let app = TestApp::start().await?;

    let resp = app.get("/api/tidal/user", "").await?;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.json()?["error"], "Not authenticated");

    // Playlists also need the account id.
    let resp = app
        .get("/api/tidal/playlists", "tidal_access_token=at-old")
        .await?;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn test_expired_token_refreshes_and_retries_once() -> Result<()> {
    let app = TestApp::start().await?;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("authorization", "Bearer at-old"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&app.tidal)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("authorization", "Bearer at-new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 4242})))
        .expect(1)
        .mount(&app.tidal)
        .await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains("refresh_token=rt-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "at-new",
            "refresh_token": "rt-2",
            "expires_in": 1800
        })))
        .expect(1)
        .mount(&app.auth)
        .await;

    let resp = app.get("/api/tidal/user", SESSION).await?;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()?["id"], 4242);

    let access = resp.set_cookie("tidal_access_token").expect("rotated access");
    assert!(access.starts_with("tidal_access_token=at-new"));
    assert!(access.contains("Max-Age=1800"));
    assert_eq!(resp.cookie_value("tidal_refresh_token").as_deref(), Some("rt-2"));
    Ok(())
}

#[tokio::test]
async fn test_second_401_is_surfaced() -> Result<()> {
    let app = TestApp::start().await?;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&app.tidal)
        .await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"access_token": "at-new"})),
        )
        .expect(1)
        .mount(&app.auth)
        .await;

    let resp = app.get("/api/tidal/search?query=abba", SESSION).await?;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.json()?["error"], "Failed to search tracks");
    Ok(())
}

#[tokio::test]
async fn test_rotated_cookies_kept_when_retry_fails() -> Result<()> {
    let app = TestApp::start().await?;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(header("authorization", "Bearer at-old"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&app.tidal)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(header("authorization", "Bearer at-new"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&app.tidal)
        .await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "at-new",
            "refresh_token": "rt-2"
        })))
        .expect(1)
        .mount(&app.auth)
        .await;

    let resp = app.get("/api/tidal/search?query=abba", SESSION).await?;
    assert_eq!(resp.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(resp.json()?["error"], "Failed to search tracks");
    assert_eq!(resp.cookie_value("tidal_access_token").as_deref(), Some("at-new"));
    assert_eq!(resp.cookie_value("tidal_refresh_token").as_deref(), Some("rt-2"));
    Ok(())
}

#[tokio::test]
async fn test_up_front_refresh_cookies_kept_on_upstream_error() -> Result<()> {
    let app = TestApp::start().await?;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "at-new",
            "refresh_token": "rt-2"
        })))
        .expect(1)
        .mount(&app.auth)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&app.tidal)
        .await;

    let resp = app.get("/api/tidal/user", "tidal_refresh_token=rt-1").await?;
    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.json()?["error"], "Failed to fetch user info");
    assert_eq!(resp.cookie_value("tidal_refresh_token").as_deref(), Some("rt-2"));
    Ok(())
}

#[tokio::test]
async fn test_failed_refresh_is_401() -> Result<()> {
    let app = TestApp::start().await?;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&app.tidal)
        .await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&app.auth)
        .await;

    let resp = app.get("/api/tidal/user", SESSION).await?;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert!(resp.set_cookies().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_missing_access_token_refreshes_up_front() -> Result<()> {
    let app = TestApp::start().await?;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"access_token": "at-new"})),
        )
        .expect(1)
        .mount(&app.auth)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("authorization", "Bearer at-new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 1})))
        .expect(1)
        .mount(&app.tidal)
        .await;

    let resp = app.get("/api/tidal/user", "tidal_refresh_token=rt-1").await?;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.cookie_value("tidal_access_token").as_deref(), Some("at-new"));
    Ok(())
}

#[tokio::test]
async fn test_list_playlists_defaults() -> Result<()> {
    let app = TestApp::start().await?;

    Mock::given(method("GET"))
        .and(path("/users/4242/playlists"))
        .and(query_param("limit", "50"))
        .and(query_param("offset", "0"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"items": [], "totalNumberOfItems": 0})),
        )
        .expect(1)
        .mount(&app.tidal)
        .await;

    let resp = app.get("/api/tidal/playlists", SESSION).await?;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()?["totalNumberOfItems"], 0);
    Ok(())
}

#[tokio::test]
async fn test_upstream_status_propagates() -> Result<()> {
    let app = TestApp::start().await?;

    Mock::given(method("GET"))
        .and(path("/users/4242/playlists"))
        .respond_with(ResponseTemplate::new(403).set_body_string("region locked"))
        .mount(&app.tidal)
        .await;

    let resp = app.get("/api/tidal/playlists?limit=5", SESSION).await?;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
    let body = resp.json()?;
    assert_eq!(body["error"], "Failed to fetch playlists");
    assert!(!body.to_string().contains("region locked"));
    Ok(())
}

#[tokio::test]
async fn test_create_playlist() -> Result<()> {
    let app = TestApp::start().await?;

    Mock::given(method("POST"))
        .and(path("/users/4242/playlists"))
        .and(body_string_contains("\"title\":\"Late Night\""))
        .and(body_string_contains("\"description\":\"\""))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"uuid": "p-1"})))
        .expect(1)
        .mount(&app.tidal)
        .await;

    let resp = app
        .post_json(
            "/api/tidal/playlists",
            SESSION,
            serde_json::json!({"title": "Late Night"}),
        )
        .await?;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()?["uuid"], "p-1");
    Ok(())
}

#[tokio::test]
async fn test_create_playlist_requires_title() -> Result<()> {
    let app = TestApp::start().await?;

    let resp = app
        .post_json(
            "/api/tidal/playlists",
            SESSION,
            serde_json::json!({"title": "  ", "description": "x"}),
        )
        .await?;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.json()?["error"], "Title is required");
    Ok(())
}

#[tokio::test]
async fn test_search() -> Result<()> {
    let app = TestApp::start().await?;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("query", "nina simone"))
        .and(query_param("limit", "20"))
        .and(query_param("type", "TRACKS"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"tracks": {"items": [{"id": 1}]}})),
        )
        .expect(1)
        .mount(&app.tidal)
        .await;

    let resp = app
        .get("/api/tidal/search?query=nina%20simone", SESSION)
        .await?;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()?["tracks"]["items"][0]["id"], 1);
    Ok(())
}

#[tokio::test]
async fn test_search_requires_query() -> Result<()> {
    let app = TestApp::start().await?;

    let resp = app.get("/api/tidal/search", SESSION).await?;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.json()?["error"], "Query parameter is required");
    Ok(())
}

#[tokio::test]
async fn test_playlist_tracks() -> Result<()> {
    let app = TestApp::start().await?;

    Mock::given(method("GET"))
        .and(path("/playlists/p-1/tracks"))
        .and(query_param("limit", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"items": []})))
        .expect(1)
        .mount(&app.tidal)
        .await;

    let resp = app.get("/api/tidal/playlists/p-1/tracks", SESSION).await?;
    assert_eq!(resp.status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn test_add_tracks() -> Result<()> {
    let app = TestApp::start().await?;

    Mock::given(method("GET"))
        .and(path("/playlists/p-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("ETag", "\"v7\"")
                .set_body_json(serde_json::json!({"uuid": "p-1"})),
        )
        .mount(&app.tidal)
        .await;
    Mock::given(method("POST"))
        .and(path("/playlists/p-1/items"))
        .and(header("if-none-match", "\"v7\""))
        .and(body_string_contains("trackIds=11%2C22"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"lastUpdated": 1})),
        )
        .expect(1)
        .mount(&app.tidal)
        .await;

    let resp = app
        .post_json(
            "/api/tidal/playlists/p-1/tracks",
            SESSION,
            serde_json::json!({"trackIds": [11, "22"]}),
        )
        .await?;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()?["lastUpdated"], 1);
    Ok(())
}

#[tokio::test]
async fn test_add_tracks_requires_ids() -> Result<()> {
    let app = TestApp::start().await?;

    let resp = app
        .post_json(
            "/api/tidal/playlists/p-1/tracks",
            SESSION,
            serde_json::json!({"trackIds": []}),
        )
        .await?;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    Ok(())
}
