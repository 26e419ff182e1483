//! Remote song metadata lookup
//!
//! Enrichment source for newly added songs. The lookup outcome is classified
//! by the remote status code so callers can tell bad input apart from an
//! upstream outage.

use async_trait::async_trait;
use songlib_common::{Song, SongDetailed};
use std::time::Duration;
use thiserror::Error;

mod client;

pub use client::MetadataClient;

/// Metadata lookup errors
#[derive(Debug, Error)]
pub enum MetadataError {
    /// Connection refused, DNS failure, reset, ...
    #[error("remote api request error: {0}")]
    Transport(String),

    /// No complete response within the client timeout
    #[error("remote api request timed out after {0:?}")]
    Timeout(Duration),

    /// Remote rejected the lookup parameters (400)
    #[error("bad request to remote api: {0}")]
    RemoteBadRequest(String),

    /// Remote failed internally (500)
    #[error("remote api internal error: {0}")]
    RemoteInternal(String),

    /// Any status other than 200, 400 and 500
    #[error("remote api returned unexpected status {0}")]
    UnexpectedStatus(u16),

    /// Success status with a body that is not a song details document
    #[error("malformed remote api response: {0}")]
    MalformedResponse(String),
}

impl MetadataError {
    /// True when the request never produced a usable HTTP exchange
    pub fn is_transport(&self) -> bool {
        matches!(self, MetadataError::Transport(_) | MetadataError::Timeout(_))
    }
}

/// Source of song details used to enrich new catalog entries
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Fetch details for `song`; the result's identity always equals `song`
    async fn fetch(&self, song: &Song) -> Result<SongDetailed, MetadataError>;
}
