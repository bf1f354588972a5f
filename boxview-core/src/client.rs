use std::{path::Path, time::Instant};

use bytes::Bytes;
use reqwest::{
    StatusCode,
    blocking::{Client, multipart},
};
use serde_json::Value;
use snafu::{ResultExt, ensure};
use tracing::*;

use crate::{
    config::OcrConfig,
    consts::UPLOAD_FIELD_NAME,
    error::{BoxviewError, HttpSnafu, IoReadSnafu, StatusSnafu},
};

/// One file posted to the OCR service.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content: Bytes,
    pub mime: Option<&'static str>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
            mime: None,
        }
    }

    pub fn with_mime(mut self, mime: &'static str) -> Self {
        self.mime = Some(mime);
        self
    }

    /// Reads an image file, keeping its file name for the upload.
    pub fn from_path(path: &Path) -> Result<Self, BoxviewError> {
        let content = std::fs::read(path).context(IoReadSnafu {
            path: path.to_string_lossy(),
        })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self::new(file_name, content))
    }
}

/// Anything that turns an uploaded image into an OCR response payload.
pub trait OcrBackend {
    fn recognize(&self, upload: Upload) -> Result<Value, BoxviewError>;
}

/// Blocking multipart client for a remote OCR endpoint.
///
/// One request is in flight at a time and failures are never retried.
pub struct OcrClient {
    client: Client,
    endpoint: String,
}

impl OcrClient {
    pub fn new(config: &OcrConfig) -> Result<Self, BoxviewError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .context(HttpSnafu { stage: "build-client" })?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl OcrBackend for OcrClient {
    fn recognize(&self, upload: Upload) -> Result<Value, BoxviewError> {
        let file_name = upload.file_name.clone();
        let mut part = multipart::Part::bytes(upload.content.to_vec()).file_name(upload.file_name);
        if let Some(mime) = upload.mime {
            part = part
                .mime_str(mime)
                .context(HttpSnafu { stage: "mime" })?;
        }
        let form = multipart::Form::new().part(UPLOAD_FIELD_NAME, part);

        let start = Instant::now();
        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .context(HttpSnafu { stage: "send" })?;

        let status = response.status();
        ensure!(
            status == StatusCode::OK,
            StatusSnafu {
                status: status.as_u16(),
                endpoint: self.endpoint.as_str(),
            }
        );

        let payload = response
            .json::<Value>()
            .context(HttpSnafu { stage: "decode-json" })?;
        info!(
            "recognized {file_name} in {}ms",
            start.elapsed().as_millis()
        );

        Ok(payload)
    }
}
