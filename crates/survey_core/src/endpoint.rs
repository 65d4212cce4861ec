use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use shared::{
    error::SurveyError,
    protocol::{decode_content_body, decode_status_body, RemoteStatus, SiteContent, SubmissionPayload},
};
use tracing::{info, warn};
use url::Url;

use crate::{settings::Settings, ContentSource, SubmissionEndpoint};

/// Value shipped in unconfigured builds in place of a real deployment URL.
pub const ENDPOINT_PLACEHOLDER: &str = "PASTE_YOUR_NEW_DEPLOYMENT_URL_HERE";

/// The remote content and submission endpoint, spoken to over HTTP.
///
/// Both directions read the body as text and normalize it, so a JSON
/// document served with a non-JSON content type is still accepted.
#[derive(Debug, Clone)]
pub struct HttpSurveyEndpoint {
    http: Client,
    endpoint: Url,
}

impl HttpSurveyEndpoint {
    pub fn new(endpoint_url: &str, timeout: Option<Duration>) -> Result<Self, SurveyError> {
        let endpoint = resolve_endpoint_url(Some(endpoint_url))?;
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|err| {
            SurveyError::Configuration(format!("failed to build http client: {err}"))
        })?;
        Ok(Self { http, endpoint })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, SurveyError> {
        let raw = resolve_endpoint_url(settings.endpoint_url.as_deref())?;
        Self::new(raw.as_str(), settings.request_timeout())
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn read_body(response: Response) -> Result<String, SurveyError> {
        let status = response.status();
        if !status.is_success() {
            warn!("endpoint: non-success status={}", status.as_u16());
            return Err(SurveyError::http_status(status.as_u16()));
        }
        response.text().await.map_err(transport)
    }
}

#[async_trait]
impl ContentSource for HttpSurveyEndpoint {
    async fn fetch_content(&self) -> Result<SiteContent, SurveyError> {
        let response = self
            .http
            .get(self.endpoint.clone())
            .query(&[("action", "getContent")])
            .send()
            .await
            .map_err(transport)?;
        let body = Self::read_body(response).await?;
        let content = decode_content_body(&body)?;
        info!("endpoint: content fetched keys={}", content.fields.len());
        Ok(content)
    }
}

#[async_trait]
impl SubmissionEndpoint for HttpSurveyEndpoint {
    async fn submit(&self, payload: &SubmissionPayload) -> Result<RemoteStatus, SurveyError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(payload)
            .send()
            .await
            .map_err(transport)?;
        let body = Self::read_body(response).await?;
        decode_status_body(&body)
    }
}

/// Validates a configured endpoint URL. Unset, blank and placeholder values
/// are reported as missing.
pub fn resolve_endpoint_url(raw: Option<&str>) -> Result<Url, SurveyError> {
    let raw = raw.map(str::trim).unwrap_or_default();
    if raw.is_empty() || raw == ENDPOINT_PLACEHOLDER {
        return Err(SurveyError::Configuration("App URL is missing.".to_string()));
    }

    let url = Url::parse(raw)
        .map_err(|err| SurveyError::Configuration(format!("invalid endpoint url '{raw}': {err}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(SurveyError::Configuration(format!(
            "unsupported endpoint scheme '{other}'"
        ))),
    }
}

fn transport(err: reqwest::Error) -> SurveyError {
    if err.is_timeout() {
        SurveyError::Transport("request timed out".to_string())
    } else {
        SurveyError::Transport(format!("network error: {err}"))
    }
}

#[cfg(test)]
#[path = "tests/endpoint_tests.rs"]
mod tests;
