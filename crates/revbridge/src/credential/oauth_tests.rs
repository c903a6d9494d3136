// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::client::build_http_client;
use crate::credential::timer::MAX_DELAY;
use crate::test_support::{mock_server, MockResponse, MockServer};

const REDIRECT: &str = "http://localhost:8008/oauth/callback";

fn authenticator(
    server: &MockServer,
    store: &Arc<CredentialStore>,
) -> anyhow::Result<Arc<OAuthAuthenticator>> {
    Ok(OAuthAuthenticator::new(
        build_http_client("revbridge-test")?,
        Arc::clone(store),
        server.url("/api/v2/oauth2/token"),
        "client-1".to_owned(),
        REDIRECT.to_owned(),
    ))
}

fn token_body(access: &str, refresh: Option<&str>, expires_in: Option<u64>) -> serde_json::Value {
    let mut body = serde_json::json!({ "access_token": access });
    if let Some(r) = refresh {
        body["refresh_token"] = r.into();
    }
    if let Some(e) = expires_in {
        body["expires_in"] = e.into();
    }
    body
}

#[tokio::test]
async fn exchange_stores_token_and_arms_refresh() -> anyhow::Result<()> {
    let server = mock_server(vec![MockResponse::json(
        200,
        token_body("at-1", Some("rt-1"), Some(3600)),
    )])
    .await?;
    let store = CredentialStore::new();
    let auth = authenticator(&server, &store)?;

    let start = tokio::time::Instant::now();
    auth.exchange_code("code-1", "verifier-1").await?;
    let end = tokio::time::Instant::now();

    let current = store.get().await.ok_or_else(|| anyhow::anyhow!("no credential"))?;
    assert_eq!(current.token, "at-1");
    assert_eq!(current.source, CredentialSource::OAuth);

    let fire_at = auth.timer().fire_at().ok_or_else(|| anyhow::anyhow!("no refresh armed"))?;
    assert!(fire_at - end <= Duration::from_secs(3590), "refresh too late");
    assert!(fire_at - start >= Duration::from_secs(3590), "refresh too early");
    auth.timer().cancel();
    Ok(())
}

#[tokio::test]
async fn exchange_without_refresh_fields_arms_nothing() -> anyhow::Result<()> {
    let server = mock_server(vec![
        MockResponse::json(200, token_body("at-1", None, Some(3600))),
        MockResponse::json(200, token_body("at-2", Some("rt"), None)),
    ])
    .await?;
    let store = CredentialStore::new();
    let auth = authenticator(&server, &store)?;

    auth.exchange_code("c", "v").await?;
    assert!(!auth.timer().is_pending());
    auth.exchange_code("c", "v").await?;
    assert!(!auth.timer().is_pending());
    assert_eq!(store.get().await.map(|c| c.token).as_deref(), Some("at-2"));
    Ok(())
}

#[tokio::test]
async fn failed_exchange_leaves_store_untouched() -> anyhow::Result<()> {
    let server = mock_server(vec![MockResponse::text(500, "text/plain", "down")]).await?;
    let store = CredentialStore::new();
    store.set(Credential::new("previous".into(), CredentialSource::ApiKey, None)).await;
    let auth = authenticator(&server, &store)?;

    let result = auth.exchange_code("c", "v").await;
    assert!(matches!(result, Err(ExchangeError::Rejected { .. })));
    assert_eq!(server.call_count(), 1);

    let current = store.get().await.ok_or_else(|| anyhow::anyhow!("credential dropped"))?;
    assert_eq!(current.token, "previous");
    assert_eq!(current.source, CredentialSource::ApiKey);
    assert!(!auth.timer().is_pending());
    Ok(())
}

#[tokio::test]
async fn malformed_body_leaves_store_untouched() -> anyhow::Result<()> {
    let server = mock_server(vec![MockResponse::text(200, "application/json", "{not json")]).await?;
    let store = CredentialStore::new();
    let auth = authenticator(&server, &store)?;

    let result = auth.exchange_code("c", "v").await;
    assert!(matches!(result, Err(ExchangeError::Malformed(_))));
    assert!(store.get().await.is_none());
    Ok(())
}

#[tokio::test]
async fn short_lived_token_refreshes_after_one_second() -> anyhow::Result<()> {
    let server = mock_server(vec![
        MockResponse::json(200, token_body("at-1", Some("rt-1"), Some(5))),
        MockResponse::json(200, token_body("at-2", None, None)),
    ])
    .await?;
    let store = CredentialStore::new();
    let auth = authenticator(&server, &store)?;

    let start = tokio::time::Instant::now();
    auth.exchange_code("code-1", "verifier-1").await?;
    let fire_at = auth.timer().fire_at().ok_or_else(|| anyhow::anyhow!("no refresh armed"))?;
    assert!(fire_at - start >= Duration::from_secs(1));
    assert!(fire_at - start < Duration::from_secs(2));

    // Real clock: the refresh fires after ~1s.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while server.call_count() < 2 && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    // Give the store write a moment after the response.
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(server.call_count(), 2);
    let body = server.last_json().ok_or_else(|| anyhow::anyhow!("no refresh body"))?;
    assert_eq!(body["grant_type"], "refresh_token");
    assert_eq!(body["refresh_token"], "rt-1");
    assert_eq!(body["code"], "code-1");
    assert_eq!(store.get().await.map(|c| c.token).as_deref(), Some("at-2"));
    // The refresh response had no refresh fields, so nothing is re-armed.
    assert!(!auth.timer().is_pending());
    Ok(())
}

#[tokio::test]
async fn second_exchange_replaces_pending_refresh() -> anyhow::Result<()> {
    let server = mock_server(vec![
        MockResponse::json(200, token_body("at-1", Some("rt-1"), Some(3600))),
        MockResponse::json(200, token_body("at-2", Some("rt-2"), Some(120))),
    ])
    .await?;
    let store = CredentialStore::new();
    let auth = authenticator(&server, &store)?;

    auth.exchange_code("c1", "v1").await?;
    let first = auth.timer().fire_at();
    auth.exchange_code("c2", "v2").await?;
    let second = auth.timer().fire_at();

    assert!(first.is_some() && second.is_some());
    assert!(second < first);
    auth.timer().cancel();
    Ok(())
}

#[tokio::test]
async fn failed_refresh_arms_nothing_and_is_not_retried() -> anyhow::Result<()> {
    let server = mock_server(vec![
        MockResponse::json(200, token_body("at-1", Some("rt-1"), Some(5))),
        MockResponse::text(500, "text/plain", "refresh down"),
    ])
    .await?;
    let store = CredentialStore::new();
    let auth = authenticator(&server, &store)?;

    auth.exchange_code("code-1", "verifier-1").await?;
    assert!(auth.timer().is_pending());

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while server.call_count() < 2 && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    // Longer than the shortest refresh delay: a retry would show up here.
    tokio::time::sleep(Duration::from_millis(1500)).await;

    assert_eq!(server.call_count(), 2);
    assert!(!auth.timer().is_pending());
    assert_eq!(store.get().await.map(|c| c.token).as_deref(), Some("at-1"));
    Ok(())
}

#[tokio::test]
async fn huge_lifetime_is_stored_and_clamped() -> anyhow::Result<()> {
    let server = mock_server(vec![MockResponse::json(
        200,
        token_body("at-1", Some("rt-1"), Some(u64::MAX)),
    )])
    .await?;
    let store = CredentialStore::new();
    let auth = authenticator(&server, &store)?;

    let start = tokio::time::Instant::now();
    auth.exchange_code("c", "v").await?;

    let current = store.get().await.ok_or_else(|| anyhow::anyhow!("no credential"))?;
    assert_eq!(current.token, "at-1");
    assert!(current.expires_at.is_none());
    let fire_at = auth.timer().fire_at().ok_or_else(|| anyhow::anyhow!("no refresh armed"))?;
    assert!(fire_at - start >= MAX_DELAY);
    auth.timer().cancel();
    Ok(())
}

#[tokio::test]
async fn login_outlives_api_key_overwrite() -> anyhow::Result<()> {
    let server = mock_server(vec![MockResponse::json(200, token_body("at-1", None, None))]).await?;
    let store = CredentialStore::new();
    let auth = authenticator(&server, &store)?;
    assert!(!auth.has_token());

    auth.exchange_code("c", "v").await?;
    store.set(Credential::new("key-token".into(), CredentialSource::ApiKey, Some(3600))).await;

    assert!(auth.has_token());
    assert!(!store.get().await.is_some_and(|c| c.source == CredentialSource::OAuth));
    Ok(())
}

#[tokio::test]
async fn failed_exchange_is_not_a_login() -> anyhow::Result<()> {
    let server = mock_server(vec![MockResponse::text(401, "text/plain", "denied")]).await?;
    let store = CredentialStore::new();
    let auth = authenticator(&server, &store)?;

    assert!(auth.exchange_code("c", "v").await.is_err());
    assert!(!auth.has_token());
    Ok(())
}
