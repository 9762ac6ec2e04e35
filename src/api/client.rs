use std::time::Duration;

use futures::{StreamExt, TryStreamExt};
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use thiserror::Error;
use url::Url;

use super::models::{ApiConfig, Endpoint, OutboundRequest, Payload, RemoteResponse};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Invalid service URL: {0}")]
    InvalidBaseUrl(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// Transport to the remote conversion service
#[derive(Clone)]
pub struct ApiClient {
    config: ApiConfig,
    http: Client,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Result<Self> {
        Url::parse(&config.base_url).map_err(|e| ApiError::InvalidBaseUrl(e.to_string()))?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, http })
    }

    pub fn endpoint_url(&self, endpoint: Endpoint) -> Result<Url> {
        let mut url = Url::parse(&self.config.base_url)
            .map_err(|e| ApiError::InvalidBaseUrl(e.to_string()))?;

        if endpoint == Endpoint::Batch {
            url.path_segments_mut()
                .map_err(|_| ApiError::InvalidBaseUrl(self.config.base_url.clone()))?
                .pop_if_empty()
                .push("batch");
        }

        Ok(url)
    }

    fn multipart_form(request: &OutboundRequest) -> Form {
        let mut form = Form::new();

        if let Payload::File { name, bytes } = &request.payload {
            let part = Part::bytes(bytes.to_vec()).file_name(name.clone());
            form = form.part("file", part);
        }

        for (key, value) in request.text_fields() {
            form = form.text(key, value);
        }

        form
    }

    /// Posts the request and hands back the undrained response.
    ///
    /// Non-2xx statuses are not errors here; interpreting them is up to
    /// the caller.
    pub async fn send(&self, request: &OutboundRequest) -> Result<RemoteResponse> {
        let url = self.endpoint_url(request.endpoint)?;
        tracing::info!(url = %url, mode = ?request.mode, "Posting conversion request");

        let response = self
            .http
            .post(url)
            .multipart(Self::multipart_form(request))
            .send()
            .await?;

        let status = response.status().as_u16();
        let content_disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let body = response
            .bytes_stream()
            .map_err(ApiError::RequestError)
            .boxed();

        Ok(RemoteResponse {
            status,
            content_disposition,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::JobType;
    use crate::domain::{MediaFormat, Mode};
    use mockito::Matcher;

    fn client_for(base_url: &str) -> ApiClient {
        ApiClient::new(ApiConfig {
            base_url: base_url.to_string(),
            ..ApiConfig::default()
        })
        .unwrap()
    }

    fn single_request() -> OutboundRequest {
        OutboundRequest {
            endpoint: Endpoint::Convert,
            mode: Mode::SingleVideo,
            payload: Payload::Url("https://youtube.com/watch?v=abc".to_string()),
            format: MediaFormat::Video,
            quality: "720p".to_string(),
            job_type: Some(JobType::Single),
        }
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        let result = ApiClient::new(ApiConfig {
            base_url: "not a url".to_string(),
            ..ApiConfig::default()
        });
        assert!(matches!(result, Err(ApiError::InvalidBaseUrl(_))));
    }

    #[test]
    fn test_endpoint_url() {
        let client = client_for("http://localhost:8000/api/download");
        assert_eq!(
            client.endpoint_url(Endpoint::Convert).unwrap().as_str(),
            "http://localhost:8000/api/download"
        );
        assert_eq!(
            client.endpoint_url(Endpoint::Batch).unwrap().as_str(),
            "http://localhost:8000/api/download/batch"
        );

        let client = client_for("http://localhost:8000/api/download/");
        assert_eq!(
            client.endpoint_url(Endpoint::Batch).unwrap().as_str(),
            "http://localhost:8000/api/download/batch"
        );
    }

    #[tokio::test]
    async fn test_send_posts_multipart_fields() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/download")
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="url"\r\n\r\nhttps://youtube.com/watch\?v=abc"#.to_string()),
                Matcher::Regex(r#"name="format"\r\n\r\nmp4"#.to_string()),
                Matcher::Regex(r#"name="quality"\r\n\r\n720p"#.to_string()),
                Matcher::Regex(r#"name="type"\r\n\r\nsingle"#.to_string()),
            ]))
            .with_status(200)
            .with_header("content-disposition", r#"attachment; filename="abc.mp4""#)
            .with_body("video-bytes")
            .create_async()
            .await;

        let client = client_for(&format!("{}/api/download", server.url()));
        let response = client.send(&single_request()).await.unwrap();

        assert_eq!(response.status, 200);
        assert!(response.is_success());
        assert_eq!(
            response.content_disposition.as_deref(),
            Some(r#"attachment; filename="abc.mp4""#)
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_uploads_file_to_batch_endpoint() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/download/batch")
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="file"; filename="urls.txt""#.to_string()),
                Matcher::Regex("https://youtu.be/one".to_string()),
                Matcher::Regex(r#"name="format"\r\n\r\nmp3"#.to_string()),
            ]))
            .with_status(500)
            .create_async()
            .await;

        let request = OutboundRequest {
            endpoint: Endpoint::Batch,
            mode: Mode::BatchFile,
            payload: Payload::File {
                name: "urls.txt".to_string(),
                bytes: bytes::Bytes::from_static(b"https://youtu.be/one\n"),
            },
            format: MediaFormat::Audio,
            quality: "128kbps".to_string(),
            job_type: None,
        };

        let client = client_for(&format!("{}/api/download", server.url()));
        let response = client.send(&request).await.unwrap();

        assert_eq!(response.status, 500);
        assert!(!response.is_success());
        mock.assert_async().await;
    }
}
