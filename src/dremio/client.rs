//! Typed calls against the Dremio REST endpoints

use super::error::{DremioError, Result};
use super::models::{CatalogEntry, CatalogListing, Job, ResultPage, SqlSubmission};
use super::transport::{ApiRequest, ApiResponse, Transport};
use crate::config::Settings;
use serde::de::DeserializeOwned;
use serde_json::json;

/// REST endpoint URLs relative to the configured base URL
pub mod endpoints {
    pub fn login(base: &str) -> String {
        format!("{}/apiv2/login", base)
    }

    pub fn source(base: &str) -> String {
        format!("{}/api/v3/source", base)
    }

    pub fn catalog(base: &str) -> String {
        format!("{}/api/v3/catalog", base)
    }

    pub fn catalog_entry(base: &str, id: &str) -> String {
        format!("{}/api/v3/catalog/{}", base, id)
    }

    pub fn sql(base: &str) -> String {
        format!("{}/api/v3/sql", base)
    }

    pub fn job(base: &str, job_id: &str) -> String {
        format!("{}/api/v3/job/{}", base, job_id)
    }

    pub fn job_results(base: &str, job_id: &str, offset: u64, limit: u64) -> String {
        format!(
            "{}/api/v3/job/{}/results?offset={}&limit={}",
            base, job_id, offset, limit
        )
    }
}

/// Dremio REST client
///
/// Holds no credentials itself: every call reads the base URL and token
/// from the `Settings` it is given, so a refreshed token is picked up on the
/// next call without rebuilding the client.
pub struct DremioClient<T> {
    transport: T,
}

impl<T: Transport> DremioClient<T> {
    pub fn new(transport: T) -> Self {
        DremioClient { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Authorized probe; returns the raw status code
    pub async fn probe(&self, settings: &Settings) -> Result<u16> {
        let request = ApiRequest::get(
            endpoints::source(&settings.base_url),
            Some(token_of(settings)),
        );
        Ok(self.transport.send(request).await?.status)
    }

    /// Username/password exchange, sent without an Authorization header
    pub async fn login(&self, settings: &Settings) -> Result<ApiResponse> {
        let body = json!({
            "userName": settings.username,
            "password": settings.password,
        });
        self.transport
            .send(ApiRequest::post(endpoints::login(&settings.base_url), body, None))
            .await
    }

    pub async fn list_catalog(&self, settings: &Settings) -> Result<Vec<CatalogEntry>> {
        let url = endpoints::catalog(&settings.base_url);
        let listing: CatalogListing = self.get_json(settings, url, "list catalogs").await?;
        Ok(listing.data)
    }

    pub async fn get_catalog(&self, settings: &Settings, id: &str) -> Result<CatalogEntry> {
        let url = endpoints::catalog_entry(&settings.base_url, id);
        self.get_json(settings, url, &format!("get catalog {}", id))
            .await
    }

    /// Submit SQL; returns the job id
    pub async fn submit_sql(&self, settings: &Settings, sql: &str) -> Result<String> {
        let request = ApiRequest::post(
            endpoints::sql(&settings.base_url),
            json!({ "sql": sql }),
            Some(token_of(settings)),
        );
        let response = self.transport.send(request).await?;
        let submission: SqlSubmission =
            decode(response, &format!("run sql {}", sql))?;

        match submission.id {
            Some(id) if !id.is_empty() => Ok(id),
            _ => Err(DremioError::Protocol(format!(
                "could not obtain job id after running sql {}",
                sql
            ))),
        }
    }

    pub async fn get_job(&self, settings: &Settings, job_id: &str) -> Result<Job> {
        let url = endpoints::job(&settings.base_url, job_id);
        self.get_json(settings, url, &format!("get status of job {}", job_id))
            .await
    }

    pub async fn get_results_page(
        &self,
        settings: &Settings,
        job_id: &str,
        offset: u64,
        limit: u64,
    ) -> Result<ResultPage> {
        let url = endpoints::job_results(&settings.base_url, job_id, offset, limit);
        self.get_json(
            settings,
            url,
            &format!("get results of job {} at offset {}", job_id, offset),
        )
        .await
    }

    async fn get_json<R: DeserializeOwned>(
        &self,
        settings: &Settings,
        url: String,
        action: &str,
    ) -> Result<R> {
        let response = self
            .transport
            .send(ApiRequest::get(url, Some(token_of(settings))))
            .await?;
        decode(response, action)
    }
}

fn token_of(settings: &Settings) -> &str {
    settings.access_token.as_deref().unwrap_or_default()
}

/// Require a 200 with a body, then decode it
fn decode<R: DeserializeOwned>(response: ApiResponse, action: &str) -> Result<R> {
    if !response.is_ok() {
        return Err(DremioError::Status {
            action: action.to_string(),
            status: response.status,
        });
    }
    let body = response.body.ok_or_else(|| {
        DremioError::Protocol(format!("empty response body for request to {}", action))
    })?;
    serde_json::from_value(body)
        .map_err(|e| DremioError::Protocol(format!("unexpected response to {}: {}", action, e)))
}
