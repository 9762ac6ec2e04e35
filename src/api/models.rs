use bytes::Bytes;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::domain::{MediaFormat, Mode};

use super::client::Result;

/// Configuration for the API client
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000/api/download".to_string()
}

fn default_timeout_secs() -> u64 {
    600
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Single videos and playlists
    Convert,
    /// Uploaded URL lists, served under `<base>/batch`
    Batch,
}

/// Value of the `type` form field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobType {
    Single,
    Playlist,
}

impl JobType {
    pub fn token(self) -> &'static str {
        match self {
            JobType::Single => "single",
            JobType::Playlist => "playlist",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Url(String),
    File { name: String, bytes: Bytes },
}

/// Fully built request for the conversion service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    pub endpoint: Endpoint,
    pub mode: Mode,
    pub payload: Payload,
    pub format: MediaFormat,
    pub quality: String,
    pub job_type: Option<JobType>,
}

impl OutboundRequest {
    /// Text fields in the order they are sent
    pub fn text_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::with_capacity(4);
        if let Payload::Url(url) = &self.payload {
            fields.push(("url", url.clone()));
        }
        fields.push(("format", self.format.token().to_string()));
        fields.push(("quality", self.quality.clone()));
        if let Some(job_type) = self.job_type {
            fields.push(("type", job_type.token().to_string()));
        }
        fields
    }
}

/// Raw answer of the conversion service, body not yet drained
pub struct RemoteResponse {
    pub status: u16,
    pub content_disposition: Option<String>,
    pub body: BoxStream<'static, Result<Bytes>>,
}

impl RemoteResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl std::fmt::Debug for RemoteResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteResponse")
            .field("status", &self.status)
            .field("content_disposition", &self.content_disposition)
            .finish_non_exhaustive()
    }
}
