//! HTTP client for the song metadata service

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use songlib_common::{Song, SongDetailed};
use tracing::{debug, warn};

use super::{MetadataError, MetadataSource};

const USER_AGENT: &str = concat!("songlib/", env!("CARGO_PKG_VERSION"));

/// Success body of the metadata service; unknown fields are ignored
#[derive(Debug, Deserialize)]
struct SongDetails {
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    link: Option<String>,
}

/// Metadata service client
#[derive(Debug, Clone)]
pub struct MetadataClient {
    http_client: reqwest::Client,
    endpoint: Url,
    timeout: Duration,
}

impl MetadataClient {
    /// Build a client for `endpoint`; every request is bounded by `timeout`
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, MetadataError> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            MetadataError::Transport(format!("invalid metadata endpoint '{}': {}", endpoint, e))
        })?;

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| MetadataError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn classify(&self, err: reqwest::Error) -> MetadataError {
        if err.is_timeout() {
            MetadataError::Timeout(self.timeout)
        } else {
            MetadataError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl MetadataSource for MetadataClient {
    async fn fetch(&self, song: &Song) -> Result<SongDetailed, MetadataError> {
        debug!(group = %song.group, name = %song.name, endpoint = %self.endpoint, "Querying metadata service");

        let response = self
            .http_client
            .get(self.endpoint.clone())
            .query(&[("song", song.name.as_str()), ("group", song.group.as_str())])
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        match response.status() {
            StatusCode::OK => {
                let body = response.text().await.map_err(|e| self.classify(e))?;
                let details: SongDetails = serde_json::from_str(&body)
                    .map_err(|e| MetadataError::MalformedResponse(e.to_string()))?;

                Ok(SongDetailed {
                    song: song.clone(),
                    release_date: details.release_date.unwrap_or_default(),
                    text: details.text.unwrap_or_default(),
                    link: details.link.unwrap_or_default(),
                })
            }
            StatusCode::BAD_REQUEST => {
                warn!(group = %song.group, name = %song.name, "Metadata service rejected lookup");
                Err(MetadataError::RemoteBadRequest(error_detail(response).await))
            }
            StatusCode::INTERNAL_SERVER_ERROR => {
                warn!(group = %song.group, name = %song.name, "Metadata service internal error");
                Err(MetadataError::RemoteInternal(error_detail(response).await))
            }
            other => {
                warn!(status = other.as_u16(), "Metadata service returned unexpected status");
                Err(MetadataError::UnexpectedStatus(other.as_u16()))
            }
        }
    }
}

/// Error body as detail text; an unreadable body leaves it empty
async fn error_detail(response: reqwest::Response) -> String {
    match response.text().await {
        Ok(body) => body,
        Err(e) => {
            debug!("Could not read metadata error body: {}", e);
            String::new()
        }
    }
}
