//! HTTP request execution
//!
//! [`RequestBuilder`] owns the shared `reqwest` client, attaches basic auth to
//! every request and turns non-2xx responses into typed errors through
//! [`Error::from_status`]. It knows nothing about the TMC protocol itself; that
//! lives in [`crate::server`].

use crate::config::Settings;
use crate::error::{Error, Result};
use reqwest::multipart::{Form, Part};
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// Name of the multipart part carrying a submission archive
pub const SUBMISSION_FILE_FIELD: &str = "submission[file]";

/// Executes GET/POST/multipart requests against the grading server
#[derive(Clone)]
pub struct RequestBuilder {
    client: reqwest::Client,
    settings: Arc<Settings>,
}

impl RequestBuilder {
    /// Build the shared client from `settings`
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn new(settings: Arc<Settings>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.http.timeout)
            .user_agent(settings.http.user_agent.clone())
            .build()
            .map_err(|e| Error::Config {
                message: format!("failed to create HTTP client: {e}"),
                key: Some("http".to_string()),
            })?;

        Ok(Self { client, settings })
    }

    /// GET `url` and return the body as text
    pub async fn get_for_text(&self, url: &Url) -> Result<String> {
        debug!(%url, "GET");
        let response = self.send(self.client.get(url.clone()), url).await?;
        Ok(response.text().await?)
    }

    /// GET `url` and return the raw body
    pub async fn get_for_binary(&self, url: &Url) -> Result<Vec<u8>> {
        debug!(%url, "GET (binary)");
        let response = self.send(self.client.get(url.clone()), url).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// POST `form` as `application/x-www-form-urlencoded` and return the body as text
    pub async fn post_for_text(&self, url: &Url, form: &[(String, String)]) -> Result<String> {
        debug!(%url, fields = form.len(), "POST form");
        let response = self.send(self.client.post(url.clone()).form(form), url).await?;
        Ok(response.text().await?)
    }

    /// POST a raw body with extra headers and return the response body as text
    pub async fn raw_post_for_text(
        &self,
        url: &Url,
        body: Vec<u8>,
        headers: &[(&str, String)],
    ) -> Result<String> {
        debug!(%url, bytes = body.len(), "POST raw");
        let mut request = self.client.post(url.clone()).body(body);
        for (name, value) in headers {
            request = request.header(*name, value.as_str());
        }
        let response = self.send(request, url).await?;
        Ok(response.text().await?)
    }

    /// POST a multipart form with text `fields` and one file part
    pub async fn upload_file_for_text(
        &self,
        url: &Url,
        fields: Vec<(String, String)>,
        file_field: &str,
        data: Vec<u8>,
    ) -> Result<String> {
        debug!(%url, bytes = data.len(), "POST multipart");
        let part = Part::bytes(data)
            .file_name("file")
            .mime_str("application/octet-stream")?;
        let form = fields
            .into_iter()
            .fold(Form::new(), |form, (name, value)| form.text(name, value))
            .part(file_field.to_string(), part);

        let response = self
            .send(self.client.post(url.clone()).multipart(form), url)
            .await?;
        Ok(response.text().await?)
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        url: &Url,
    ) -> Result<reqwest::Response> {
        let request = if self.settings.has_credentials() {
            request.basic_auth(&self.settings.username, Some(&self.settings.password))
        } else {
            request
        };

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!(%url, status = status.as_u16(), "server returned error status");
        Err(Error::from_status(status.as_u16(), url.as_str(), body))
    }
}
