//! HTTP client for the generative table API.

use std::path::Path;

use async_trait::async_trait;
use reqwest::{header, Client, Response};
use serde_json::Value;
use tokio_stream::StreamExt;
use tracing::{debug, error, info};

use rotiplanta_core::{Error, Result, TableServiceConfig};

use crate::stream::{assemble_rows, SseDecoder};
use crate::types::{FileUploadResponse, RowAddRequest, TableResponse, TableType};

/// Operations the request handlers need from the table service.
#[async_trait]
pub trait TableService: Send + Sync {
    /// Append rows to a table and return whatever the service produced.
    async fn add_table_rows(
        &self,
        table_type: TableType,
        request: RowAddRequest,
    ) -> Result<TableResponse>;

    /// Upload a local file and return its content URI.
    async fn upload_file(&self, path: &Path) -> Result<String>;
}

/// JamAI Base REST client.
#[derive(Clone)]
pub struct JamAiClient {
    client: Client,
    base_url: String,
    project_id: String,
    api_key: String,
}

impl JamAiClient {
    pub fn new(config: &TableServiceConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: &TableServiceConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            api_key: config.api_key.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1/{}", self.base_url, path)
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header("X-PROJECT-ID", &self.project_id)
    }

    async fn check_status(response: Response) -> Result<Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        error!("Table service returned {}: {}", status, body);
        Err(Error::TableService(format!("API error {}: {}", status, body)))
    }

    /// Drain an event stream into its decoded chunks.
    async fn read_event_stream(response: Response) -> Result<TableResponse> {
        let mut stream = response.bytes_stream();
        let mut decoder = SseDecoder::new();
        let mut chunks = Vec::new();

        while let Some(bytes) = stream.next().await {
            let bytes = bytes.map_err(|e| Error::Http(format!("Stream read error: {}", e)))?;
            chunks.extend(decoder.push(&bytes));
            if decoder.is_done() {
                break;
            }
        }
        chunks.extend(decoder.finish());

        debug!("Decoded {} stream events", chunks.len());
        if chunks.is_empty() {
            return Ok(TableResponse::Empty);
        }
        Ok(TableResponse::StreamingChunks(assemble_rows(chunks)))
    }
}

fn is_event_stream(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("text/event-stream"))
        .unwrap_or(false)
}

/// Content type sent with an uploaded file.
pub fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

#[async_trait]
impl TableService for JamAiClient {
    async fn add_table_rows(
        &self,
        table_type: TableType,
        request: RowAddRequest,
    ) -> Result<TableResponse> {
        let url = self.url(&format!("gen_tables/{}/rows/add", table_type));
        info!(
            "Adding {} row(s) to {} table {}",
            request.data.len(),
            table_type,
            request.table_id
        );

        let response = self
            .authorized(self.client.post(&url))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Http(format!("Request failed: {}", e)))?;
        let response = Self::check_status(response).await?;

        if is_event_stream(&response) {
            return Self::read_event_stream(response).await;
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::TableService(format!("Invalid response body: {}", e)))?;
        TableResponse::from_json(body)
    }

    async fn upload_file(&self, path: &Path) -> Result<String> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        debug!("Uploading {} ({} bytes)", file_name, bytes.len());

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime_for(path))
            .map_err(|e| Error::Http(format!("Invalid content type: {}", e)))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .authorized(self.client.post(self.url("files/upload")))
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Http(format!("Request failed: {}", e)))?;
        let response = Self::check_status(response).await?;

        let uploaded: FileUploadResponse = response
            .json()
            .await
            .map_err(|e| Error::TableService(format!("Invalid upload response: {}", e)))?;
        info!("Uploaded file as {}", uploaded.uri);
        Ok(uploaded.uri)
    }
}
