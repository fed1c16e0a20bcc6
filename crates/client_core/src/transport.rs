use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client, Method, Response};
use serde_json::Value;
use shared::error::ApiError;
use tracing::debug;
use url::Url;

use crate::error::TransportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    fn to_reqwest(self) -> Method {
        match self {
            Self::Get => Method::GET,
            Self::Post => Method::POST,
            Self::Put => Method::PUT,
            Self::Delete => Method::DELETE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub path: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path, None)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(HttpMethod::Post, path, Some(body))
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(HttpMethod::Put, path, Some(body))
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path, None)
    }

    pub fn new(method: HttpMethod, path: impl Into<String>, body: Option<Value>) -> Self {
        Self {
            method,
            path: path.into(),
            body,
        }
    }
}

/// One file posted as multipart form data under the `file` field.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadRequest {
    pub path: String,
    pub file_name: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Seam between the orchestrator and the reporting server.
///
/// Responses are returned as raw JSON so callers can merge them with their own
/// payloads; an empty body comes back as `Value::Null`.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<Value, TransportError>;
    async fn upload(&self, request: UploadRequest) -> Result<Value, TransportError>;
}

pub struct HttpTransport {
    http: Client,
    base_url: Url,
    api_token: Option<String>,
}

impl HttpTransport {
    pub fn new(
        server_url: &str,
        api_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let mut base_url = Url::parse(server_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url,
            api_token,
        })
    }

    pub fn endpoint(&self, path: &str) -> Result<Url, TransportError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn read_response(response: Response) -> Result<Value, TransportError> {
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let error = serde_json::from_slice::<ApiError>(&body).unwrap_or_else(|_| {
                let reason = status.canonical_reason().unwrap_or("request failed");
                ApiError::new(format!("{} {reason}", status.as_u16()))
            });
            return Err(TransportError::Api {
                status: status.as_u16(),
                error,
            });
        }

        if body.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&body).map_err(|err| TransportError::Decode(err.to_string()))
    }
}

#[async_trait]
impl ApiTransport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value, TransportError> {
        let url = self.endpoint(&request.path)?;
        debug!(method = request.method.as_str(), %url, "http: sending request");
        let mut builder = self
            .authorize(self.http.request(request.method.to_reqwest(), url));
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        let response = builder.send().await?;
        Self::read_response(response).await
    }

    async fn upload(&self, request: UploadRequest) -> Result<Value, TransportError> {
        let url = self.endpoint(&request.path)?;
        debug!(%url, file = %request.file_name, "http: uploading file");
        let mut part = multipart::Part::bytes(request.bytes).file_name(request.file_name);
        if let Some(mime_type) = &request.mime_type {
            part = part.mime_str(mime_type)?;
        }
        let form = multipart::Form::new().part("file", part);
        let response = self
            .authorize(self.http.post(url))
            .multipart(form)
            .send()
            .await?;
        Self::read_response(response).await
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
