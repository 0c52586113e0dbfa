//! reqwest-backed transport for the workspace REST API.

use super::{Page, PageUpdate, QueryRequest, Transport};
use crate::config::ApiConfig;
use crate::error::TransportError;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::debug;

const VERSION_HEADER: &str = "Notion-Version";

/// Error body returned by the API on non-2xx responses
#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

fn map_http_error(error: reqwest::Error) -> TransportError {
    if let Some(status) = error.status() {
        classify_status(status.as_u16(), error.to_string())
    } else if error.is_timeout() {
        TransportError::Http(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        TransportError::Http(format!("Connection error: {}", error))
    } else {
        TransportError::Http(error.to_string())
    }
}

fn classify_status(status: u16, message: String) -> TransportError {
    match status {
        401 => TransportError::Unauthorized(message),
        404 => TransportError::NotFound(message),
        429 => TransportError::RateLimited(message),
        _ => TransportError::RequestFailed { status, message },
    }
}

/// Turn an error body into a readable message, falling back to the raw text
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(ApiErrorBody {
            code: Some(code),
            message: Some(message),
        }) => format!("{}: {}", code, message),
        Ok(ApiErrorBody {
            message: Some(message),
            ..
        }) => message,
        _ if body.is_empty() => "Unknown error".to_string(),
        _ => body.to_string(),
    }
}

/// HTTP transport
pub struct HttpTransport {
    client: Client,
    base_url: String,
    token: String,
    version: String,
}

impl HttpTransport {
    pub fn new(api: &ApiConfig) -> Result<Self, TransportError> {
        let token = api
            .token
            .clone()
            .ok_or_else(|| TransportError::Unauthorized("No API token configured".to_string()))?;

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(api.connect_timeout_secs))
            .timeout(Duration::from_secs(api.request_timeout_secs))
            .build()
            .map_err(|e| TransportError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            token,
            version: api.version.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .bearer_auth(&self.token)
            .header(VERSION_HEADER, &self.version)
            .header("Content-Type", "application/json")
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, TransportError> {
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(map_http_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status.as_u16(), error_message(&body)));
        }

        response
            .json()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn retrieve_database(&self, database_id: &str) -> Result<Value, TransportError> {
        debug!(database_id, "GET database");
        self.send(self.client.get(self.url(&format!("databases/{}", database_id))))
            .await
    }

    async fn query_database(
        &self,
        database_id: &str,
        request: &QueryRequest,
    ) -> Result<Page, TransportError> {
        debug!(
            database_id,
            cursor = request.start_cursor.as_deref(),
            page_size = request.page_size,
            "POST database query"
        );
        self.send(
            self.client
                .post(self.url(&format!("databases/{}/query", database_id)))
                .json(request),
        )
        .await
    }

    async fn create_page(
        &self,
        database_id: &str,
        properties: Map<String, Value>,
    ) -> Result<Value, TransportError> {
        debug!(database_id, property_count = properties.len(), "POST page");
        let body = json!({
            "parent": { "database_id": database_id },
            "properties": properties,
        });
        self.send(self.client.post(self.url("pages")).json(&body))
            .await
    }

    async fn retrieve_page(&self, page_id: &str) -> Result<Value, TransportError> {
        debug!(page_id, "GET page");
        self.send(self.client.get(self.url(&format!("pages/{}", page_id))))
            .await
    }

    async fn update_page(
        &self,
        page_id: &str,
        update: PageUpdate,
    ) -> Result<Value, TransportError> {
        debug!(page_id, archived = update.archived, "PATCH page");
        self.send(
            self.client
                .patch(self.url(&format!("pages/{}", page_id)))
                .json(&update),
        )
        .await
    }
}
