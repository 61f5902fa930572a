//! HTTP transport for the Dremio REST API
//!
//! A transport sends one request and hands back the status code plus the
//! JSON body of a 200 response. Everything above this layer decides what a
//! status code means.

use super::error::Result;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde_json::Value;

/// Dremio expects the raw token behind this prefix, not a Bearer scheme
pub const AUTH_SCHEME_PREFIX: &str = "_dremio";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A single REST call
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<Value>,
    /// Token for the Authorization header; None suppresses the header
    pub token: Option<String>,
}

impl ApiRequest {
    pub fn get(url: impl Into<String>, token: Option<&str>) -> Self {
        ApiRequest {
            method: Method::Get,
            url: url.into(),
            body: None,
            token: token.map(str::to_string),
        }
    }

    pub fn post(url: impl Into<String>, body: Value, token: Option<&str>) -> Self {
        ApiRequest {
            method: Method::Post,
            url: url.into(),
            body: Some(body),
            token: token.map(str::to_string),
        }
    }
}

/// Status code and, for 200 responses, the parsed JSON body
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Option<Value>,
}

impl ApiResponse {
    pub fn ok(body: Value) -> Self {
        ApiResponse {
            status: 200,
            body: Some(body),
        }
    }

    pub fn status(status: u16) -> Self {
        ApiResponse { status, body: None }
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse>;
}

/// reqwest-backed transport
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(verify_certificates: bool) -> Result<Self> {
        if !verify_certificates {
            tracing::warn!("TLS certificate verification is disabled");
        }

        let client = Client::builder()
            .danger_accept_invalid_certs(!verify_certificates)
            .build()?;

        Ok(HttpTransport { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };

        builder = builder.header(CONTENT_TYPE, "application/json");
        if let Some(token) = &request.token {
            builder = builder.header(AUTHORIZATION, format!("{}{}", AUTH_SCHEME_PREFIX, token));
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        tracing::debug!("{:?} {}", request.method, request.url);
        let response = builder.send().await?;
        let status = response.status();

        let body = if status == StatusCode::OK {
            Some(response.json::<Value>().await?)
        } else {
            None
        };

        Ok(ApiResponse {
            status: status.as_u16(),
            body,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::mock::MockTransport;
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_builders() {
        let get = ApiRequest::get("https://x/api/v3/source", Some("tok"));
        assert_eq!(get.method, Method::Get);
        assert_eq!(get.token.as_deref(), Some("tok"));
        assert!(get.body.is_none());

        let post = ApiRequest::post("https://x/apiv2/login", json!({"a": 1}), None);
        assert_eq!(post.method, Method::Post);
        assert!(post.token.is_none());
    }

    #[tokio::test]
    async fn test_mock_replays_then_repeats_last() {
        let mock = MockTransport::new();
        mock.on(
            Method::Get,
            "u",
            vec![ApiResponse::status(401), ApiResponse::ok(json!({}))],
        );

        assert_eq!(mock.send(ApiRequest::get("u", None)).await.unwrap().status, 401);
        assert_eq!(mock.send(ApiRequest::get("u", None)).await.unwrap().status, 200);
        assert_eq!(mock.send(ApiRequest::get("u", None)).await.unwrap().status, 200);
        assert_eq!(mock.send(ApiRequest::get("other", None)).await.unwrap().status, 404);
        assert_eq!(mock.count(Method::Get, "u"), 3);
    }
}
