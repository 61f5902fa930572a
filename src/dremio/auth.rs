//! Access token bootstrap and refresh
//!
//! A stored token is reused as long as the `/api/v3/source` probe accepts
//! it. Otherwise one login exchange is made, the new token is probed once,
//! and the settings are persisted. There is no retry loop: bad credentials
//! or a rejected fresh token end the run.

use super::client::{endpoints, DremioClient};
use super::error::{DremioError, Result};
use super::models::LoginResponse;
use super::transport::Transport;
use crate::config::{Settings, SettingsStore};

/// What `ensure_valid_token` had to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    /// Stored token accepted by the probe
    Reused,
    /// New token obtained and persisted
    Refreshed,
}

/// Make sure `settings.access_token` holds a token the server accepts
pub async fn ensure_valid_token<T, S>(
    client: &DremioClient<T>,
    settings: &mut Settings,
    store: &S,
) -> Result<TokenStatus>
where
    T: Transport,
    S: SettingsStore + ?Sized,
{
    if settings.has_token() && token_is_usable(client, settings).await? {
        return Ok(TokenStatus::Reused);
    }

    tracing::info!("refreshing access token");
    let token = request_token(client, settings).await?;
    settings.access_token = Some(token);

    if !token_is_usable(client, settings).await? {
        return Err(DremioError::Auth(
            "token generation endpoint returned an invalid token".into(),
        ));
    }

    store.save(settings)?;
    Ok(TokenStatus::Refreshed)
}

async fn token_is_usable<T: Transport>(
    client: &DremioClient<T>,
    settings: &Settings,
) -> Result<bool> {
    let status = client.probe(settings).await?;
    if status == 401 {
        tracing::warn!(
            "authorization failed for url {}",
            endpoints::source(&settings.base_url)
        );
    }
    Ok(status == 200)
}

async fn request_token<T: Transport>(
    client: &DremioClient<T>,
    settings: &Settings,
) -> Result<String> {
    let response = client.login(settings).await?;
    match response.status {
        200 => {}
        401 => {
            return Err(DremioError::Auth(
                "attempt to generate access token failed .. check username/password in properties"
                    .into(),
            ))
        }
        status => {
            return Err(DremioError::Status {
                action: "generate access token".into(),
                status,
            })
        }
    }

    let token = response
        .body
        .and_then(|body| serde_json::from_value::<LoginResponse>(body).ok())
        .and_then(|login| login.token)
        .filter(|token| !token.is_empty());

    token.ok_or_else(|| {
        DremioError::Protocol("token generation response did not contain any token".into())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dremio::transport::mock::MockTransport;
    use crate::dremio::transport::{ApiResponse, Method};
    use serde_json::json;
    use std::sync::Mutex;

    const BASE: &str = "https://dremio.test";

    /// Remembers every token it was asked to save
    #[derive(Default)]
    struct RecordingStore {
        saved: Mutex<Vec<Option<String>>>,
    }

    impl SettingsStore for RecordingStore {
        fn save(&self, settings: &Settings) -> Result<()> {
            self.saved
                .lock()
                .unwrap()
                .push(settings.access_token.clone());
            Ok(())
        }
    }

    fn settings() -> Settings {
        Settings::new(BASE, "alice", "secret", true)
    }

    fn login_url() -> String {
        endpoints::login(BASE)
    }

    fn probe_url() -> String {
        endpoints::source(BASE)
    }

    #[tokio::test]
    async fn test_valid_token_is_reused() {
        let mock = MockTransport::new();
        mock.on_get(&probe_url(), json!({"data": []}));
        let client = DremioClient::new(mock);
        let store = RecordingStore::default();
        let mut settings = settings().with_token("good");

        let status = ensure_valid_token(&client, &mut settings, &store).await.unwrap();

        assert_eq!(status, TokenStatus::Reused);
        assert_eq!(client.transport().count(Method::Post, &login_url()), 0);
        assert!(store.saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_token_refreshes_once_and_persists() {
        let mock = MockTransport::new();
        mock.on(
            Method::Get,
            &probe_url(),
            vec![ApiResponse::status(401), ApiResponse::ok(json!({"data": []}))],
        );
        mock.on(
            Method::Post,
            &login_url(),
            vec![ApiResponse::ok(json!({"token": "fresh"}))],
        );
        let client = DremioClient::new(mock);
        let store = RecordingStore::default();
        let mut settings = settings().with_token("stale");

        let status = ensure_valid_token(&client, &mut settings, &store).await.unwrap();

        assert_eq!(status, TokenStatus::Refreshed);
        assert_eq!(client.transport().count(Method::Post, &login_url()), 1);
        assert_eq!(settings.access_token.as_deref(), Some("fresh"));
        assert_eq!(*store.saved.lock().unwrap(), vec![Some("fresh".to_string())]);

        // second probe carries the new token
        let probes: Vec<_> = client
            .transport()
            .requests()
            .into_iter()
            .filter(|r| r.url == probe_url())
            .collect();
        assert_eq!(probes.len(), 2);
        assert_eq!(probes[1].token.as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn test_missing_token_logs_in_without_probing_first() {
        let mock = MockTransport::new();
        mock.on_get(&probe_url(), json!({"data": []}));
        mock.on(
            Method::Post,
            &login_url(),
            vec![ApiResponse::ok(json!({"token": "fresh"}))],
        );
        let client = DremioClient::new(mock);
        let store = RecordingStore::default();
        let mut settings = settings();

        let status = ensure_valid_token(&client, &mut settings, &store).await.unwrap();

        assert_eq!(status, TokenStatus::Refreshed);
        assert_eq!(client.transport().count(Method::Get, &probe_url()), 1);
        assert_eq!(store.saved.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_fresh_token_rejected_is_fatal_without_looping() {
        let mock = MockTransport::new();
        mock.on(Method::Get, &probe_url(), vec![ApiResponse::status(401)]);
        mock.on(
            Method::Post,
            &login_url(),
            vec![ApiResponse::ok(json!({"token": "fresh"}))],
        );
        let client = DremioClient::new(mock);
        let store = RecordingStore::default();
        let mut settings = settings().with_token("stale");

        let result = ensure_valid_token(&client, &mut settings, &store).await;

        assert!(matches!(result, Err(DremioError::Auth(_))));
        assert_eq!(client.transport().count(Method::Post, &login_url()), 1);
        assert_eq!(client.transport().count(Method::Get, &probe_url()), 2);
        assert!(store.saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bad_credentials_are_fatal() {
        let mock = MockTransport::new();
        mock.on(Method::Post, &login_url(), vec![ApiResponse::status(401)]);
        let client = DremioClient::new(mock);
        let mut settings = settings();

        let result = ensure_valid_token(&client, &mut settings, &RecordingStore::default()).await;

        match result {
            Err(DremioError::Auth(msg)) => assert!(msg.contains("username/password")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_login_server_error_reports_status() {
        let mock = MockTransport::new();
        mock.on(Method::Post, &login_url(), vec![ApiResponse::status(503)]);
        let client = DremioClient::new(mock);
        let mut settings = settings();

        let result = ensure_valid_token(&client, &mut settings, &RecordingStore::default()).await;

        assert!(matches!(result, Err(DremioError::Status { status: 503, .. })));
    }

    #[tokio::test]
    async fn test_login_without_token_is_protocol_violation() {
        let mock = MockTransport::new();
        mock.on(
            Method::Post,
            &login_url(),
            vec![ApiResponse::ok(json!({"token": ""}))],
        );
        let client = DremioClient::new(mock);
        let mut settings = settings();

        let result = ensure_valid_token(&client, &mut settings, &RecordingStore::default()).await;

        assert!(matches!(result, Err(DremioError::Protocol(_))));
    }
}
