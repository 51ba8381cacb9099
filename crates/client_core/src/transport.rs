use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use shared::protocol::{
    UpdateModelRequest, UpdateModelResponse, TUNNEL_BYPASS_HEADER, TUNNEL_BYPASS_VALUE,
};
use thiserror::Error;
use tracing::debug;

use crate::{download::DownloadRequest, workflow::ServiceReply};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to reach {url}: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("invalid update response from {url} (status {status}): {source}")]
    MalformedBody {
        url: String,
        status: u16,
        #[source]
        source: reqwest::Error,
    },
}

/// Carries one update request to the model service.
#[async_trait]
pub trait UpdateTransport: Send + Sync {
    async fn post_update(
        &self,
        url: &str,
        request: &UpdateModelRequest,
    ) -> Result<ServiceReply, TransportError>;
}

#[derive(Debug, Clone, Default)]
pub struct HttpUpdateService {
    http: Client,
}

impl HttpUpdateService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw bytes of a preview image served by the model service.
    pub async fn fetch_preview(&self, url: &str) -> Result<Vec<u8>> {
        self.get_bytes(url).await
    }

    pub async fn download(&self, request: &DownloadRequest) -> Result<Vec<u8>> {
        self.get_bytes(request.url.as_str()).await
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let bytes = self
            .http
            .get(url)
            .header(TUNNEL_BYPASS_HEADER, TUNNEL_BYPASS_VALUE)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl UpdateTransport for HttpUpdateService {
    async fn post_update(
        &self,
        url: &str,
        request: &UpdateModelRequest,
    ) -> Result<ServiceReply, TransportError> {
        let response = self
            .http
            .post(url)
            .header(TUNNEL_BYPASS_HEADER, TUNNEL_BYPASS_VALUE)
            .json(request)
            .send()
            .await
            .map_err(|source| TransportError::Unreachable {
                url: url.to_string(),
                source,
            })?;

        let status = response.status().as_u16();
        debug!(status, "update response received");
        let body: UpdateModelResponse =
            response
                .json()
                .await
                .map_err(|source| TransportError::MalformedBody {
                    url: url.to_string(),
                    status,
                    source,
                })?;

        Ok(ServiceReply { status, body })
    }
}
