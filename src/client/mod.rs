//! Client for the external image metadata service.
//!
//! The service answers `GET /images?part_number=...` with a JSON array of
//! [`ImageRecord`]s describing images already captured and stored in object
//! storage.

mod types;

pub use types::{image_url, ImageRecord};

use crate::config::ImageApiConfig;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Errors talking to the image service.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Image service returned HTTP {status}")]
    Status { status: u16 },

    #[error("Failed to decode image service response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Source of captured-image metadata for a part number.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Fetch every record the source has for `part_number`.
    ///
    /// The source may return records for other parts as well; callers filter.
    async fn fetch_images(&self, part_number: &str) -> Result<Vec<ImageRecord>, ClientError>;
}

/// [`ImageSource`] backed by the image service's REST API.
pub struct HttpImageSource {
    client: Client,
    base_url: String,
}

impl HttpImageSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ClientError::Build)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ImageApiConfig) -> Result<Self, ClientError> {
        Self::new(&config.base_url, config.timeout())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    async fn fetch_images(&self, part_number: &str) -> Result<Vec<ImageRecord>, ClientError> {
        let url = self.url("/images");
        tracing::debug!(url = %url, part_number, "Requesting captured images");

        let transport = |source| ClientError::Transport {
            url: url.clone(),
            source,
        };

        let response = self
            .client
            .get(&url)
            .query(&[("part_number", part_number)])
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(transport)?;
        let records: Vec<ImageRecord> = serde_json::from_slice(&body)?;

        tracing::debug!(part_number, count = records.len(), "Image service responded");
        Ok(records)
    }
}
