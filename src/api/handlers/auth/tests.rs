//! Auth module tests.

use crate::api::test_app;
use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE},
        Request, Response, StatusCode,
    },
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn send(
    app: &Router,
    request: Request<Body>,
) -> Result<(StatusCode, Option<String>, Value)> {
    let response: Response<Body> = app.clone().oneshot(request).await?;
    let status = response.status();
    let cookie = response
        .headers()
        .get(SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let body = to_bytes(response.into_body(), usize::MAX).await?;
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body)?
    };
    Ok((status, cookie, value))
}

fn post_json(uri: &str, body: &Value) -> Result<Request<Body>> {
    Ok(Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))?)
}

fn session_pair(cookie: Option<&String>) -> Result<String> {
    let cookie = cookie.context("missing Set-Cookie")?;
    cookie
        .split(';')
        .next()
        .map(str::to_string)
        .context("empty Set-Cookie")
}

async fn register(app: &Router, username: &str, email: &str) -> Result<(String, Value)> {
    let (status, cookie, body) = send(
        app,
        post_json(
            "/api/auth/register",
            &json!({ "username": username, "email": email, "password": "motdepasse" }),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    Ok((session_pair(cookie.as_ref())?, body))
}

#[tokio::test]
async fn register_status_logout_round_trip() -> Result<()> {
    let (app, _pool) = test_app().await?;
    let (cookie, body) = register(&app, "alice", "Alice@Example.com").await?;
    assert!(cookie.starts_with("screener_session="));
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["user"]["email"], "alice@example.com");
    assert!(body["user"]["token"].is_string());

    let (status, _, body) = send(
        &app,
        Request::builder()
            .uri("/api/auth")
            .header(COOKIE, &cookie)
            .body(Body::empty())?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "alice");
    assert!(body["user"].get("token").is_none());

    let (status, cleared, body) = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/api/auth/logout")
            .header(COOKIE, &cookie)
            .body(Body::empty())?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Déconnexion réussie");
    assert!(cleared.is_some_and(|value| value.contains("Max-Age=0")));

    let (status, _, body) = send(
        &app,
        Request::builder()
            .uri("/api/auth")
            .header(COOKIE, &cookie)
            .body(Body::empty())?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "user": null }));
    Ok(())
}

#[tokio::test]
async fn status_without_session_is_null_user() -> Result<()> {
    let (app, _pool) = test_app().await?;
    let (status, _, body) = send(
        &app,
        Request::builder()
            .uri("/api/auth")
            .header(AUTHORIZATION, "Bearer unknown-token")
            .body(Body::empty())?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "user": null }));
    Ok(())
}

#[tokio::test]
async fn duplicate_username_or_email_conflicts() -> Result<()> {
    let (app, _pool) = test_app().await?;
    register(&app, "bob", "bob@example.com").await?;

    for payload in [
        json!({ "username": "bob", "email": "other@example.com", "password": "motdepasse" }),
        json!({ "username": "bobby", "email": "BOB@example.com", "password": "motdepasse" }),
    ] {
        let (status, cookie, body) = send(&app, post_json("/api/auth/register", &payload)?).await?;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(cookie.is_none());
        assert_eq!(body["error"], "Nom d'utilisateur ou email déjà utilisé");
    }
    Ok(())
}

#[tokio::test]
async fn register_validates_fields() -> Result<()> {
    let (app, _pool) = test_app().await?;
    let cases = [
        (
            json!({ "username": "", "email": "a@example.com", "password": "motdepasse" }),
            "Veuillez remplir tous les champs",
        ),
        (
            json!({ "username": "carol", "email": "not-an-email", "password": "motdepasse" }),
            "Email invalide",
        ),
        (
            json!({ "username": "carol", "email": "carol@example.com", "password": "court" }),
            "Le mot de passe doit contenir au moins 8 caractères",
        ),
        (
            json!({ "username": "c", "email": "carol@example.com", "password": "motdepasse" }),
            "Nom d'utilisateur invalide (3 à 32 caractères)",
        ),
    ];
    for (payload, message) in cases {
        let (status, _, body) = send(&app, post_json("/api/auth/register", &payload)?).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], message);
    }
    Ok(())
}

#[tokio::test]
async fn login_accepts_username_or_email() -> Result<()> {
    let (app, _pool) = test_app().await?;
    register(&app, "dave", "dave@example.com").await?;

    for login in ["dave", "DAVE@example.com"] {
        let (status, cookie, body) = send(
            &app,
            post_json(
                "/api/auth/login",
                &json!({ "username": login, "password": "motdepasse" }),
            )?,
        )
        .await?;
        assert_eq!(status, StatusCode::OK);
        assert!(cookie.is_some());
        assert_eq!(body["user"]["username"], "dave");
    }
    Ok(())
}

#[tokio::test]
async fn login_rejects_bad_credentials_with_same_message() -> Result<()> {
    let (app, _pool) = test_app().await?;
    register(&app, "erin", "erin@example.com").await?;

    for payload in [
        json!({ "username": "erin", "password": "wrong-password" }),
        json!({ "username": "nobody", "password": "motdepasse" }),
    ] {
        let (status, cookie, body) = send(&app, post_json("/api/auth/login", &payload)?).await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(cookie.is_none());
        assert_eq!(body["error"], "Identifiants invalides");
    }

    let (status, _, body) = send(
        &app,
        post_json("/api/auth/login", &json!({ "username": "erin" }))?,
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Veuillez remplir tous les champs");
    Ok(())
}

#[tokio::test]
async fn bearer_token_from_login_opens_session() -> Result<()> {
    let (app, _pool) = test_app().await?;
    let (_, body) = register(&app, "frank", "frank@example.com").await?;
    let token = body["user"]["token"]
        .as_str()
        .context("missing token")?
        .to_string();

    let (status, _, body) = send(
        &app,
        Request::builder()
            .uri("/api/auth")
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "frank");
    Ok(())
}

#[tokio::test]
async fn sessions_store_only_digests() -> Result<()> {
    let (app, pool) = test_app().await?;
    let (_, body) = register(&app, "grace", "grace@example.com").await?;
    let token = body["user"]["token"].as_str().context("missing token")?;

    let stored: Vec<String> = sqlx::query_scalar("SELECT token_hash FROM sessions")
        .fetch_all(&pool)
        .await?;
    assert_eq!(stored.len(), 1);
    assert_ne!(stored[0], token);
    Ok(())
}

#[tokio::test]
async fn username_length_is_the_only_rule() -> Result<()> {
    let (app, _pool) = test_app().await?;
    let (_, body) = register(&app, "Jean Dupont", "jean@example.com").await?;
    assert_eq!(body["user"]["username"], "Jean Dupont");
    Ok(())
}

#[tokio::test]
async fn expired_sessions_are_rejected_and_purged() -> Result<()> {
    let (app, pool) = test_app().await?;
    let (cookie, _) = register(&app, "heidi", "heidi@example.com").await?;

    sqlx::query("UPDATE sessions SET expires_at = $1")
        .bind(crate::db::now_unix() - 1)
        .execute(&pool)
        .await?;

    let (status, _, body) = send(
        &app,
        Request::builder()
            .uri("/api/auth")
            .header(COOKIE, &cookie)
            .body(Body::empty())?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "user": null }));

    let (status, _, _) = send(
        &app,
        Request::builder()
            .uri("/api/saved-searches")
            .header(COOKIE, &cookie)
            .body(Body::empty())?,
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Opening a new session drops the expired one.
    let (status, _, _) = send(
        &app,
        post_json(
            "/api/auth/login",
            &json!({ "username": "heidi", "password": "motdepasse" }),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
        .fetch_one(&pool)
        .await?;
    assert_eq!(remaining, 1);
    Ok(())
}
