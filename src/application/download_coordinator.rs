use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;

use crate::{
    api::ApiClient,
    application::{
        progress::{ProgressConfig, ProgressEstimator},
        request_builder, resolver,
        sink::ArtifactSink,
        validator,
    },
    domain::{AppError, DownloadOutcome, DownloadPhase, DownloadRequest, ProgressSample, SavedDownload},
};

#[derive(Debug, Default)]
struct Gate {
    phase: DownloadPhase,
    generation: u64,
    cancel: Option<CancellationToken>,
}

/// Drives one submission at a time from validation to saving.
///
/// Cloning is cheap and every clone shares the same submission gate, so a
/// UI can hand copies to background tasks.
#[derive(Clone)]
pub struct DownloadCoordinator {
    api_client: ApiClient,
    sink: Arc<dyn ArtifactSink>,
    progress: Arc<ProgressEstimator>,
    gate: Arc<Mutex<Gate>>,
}

impl DownloadCoordinator {
    pub fn new(api_client: ApiClient, sink: Arc<dyn ArtifactSink>, progress: ProgressConfig) -> Self {
        Self {
            api_client,
            sink,
            progress: Arc::new(ProgressEstimator::new(progress)),
            gate: Arc::new(Mutex::new(Gate::default())),
        }
    }

    fn gate(&self) -> MutexGuard<'_, Gate> {
        self.gate.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn phase(&self) -> DownloadPhase {
        self.gate().phase
    }

    pub fn is_idle(&self) -> bool {
        self.phase() == DownloadPhase::Idle
    }

    pub fn current_progress(&self) -> ProgressSample {
        self.progress.current()
    }

    /// Abandons the submission waiting on the service.
    ///
    /// Returns `false` when nothing is in flight. The abandoned submission
    /// resolves to [`AppError::Cancelled`] and its response is dropped.
    pub fn cancel(&self) -> bool {
        let mut gate = self.gate();
        if gate.phase != DownloadPhase::InFlight {
            return false;
        }
        if let Some(token) = gate.cancel.take() {
            token.cancel();
        }
        gate.phase = DownloadPhase::Idle;
        gate.generation += 1;
        tracing::info!("Download cancelled");
        true
    }

    /// Runs one submission to completion.
    ///
    /// A second call while a submission is active is rejected with
    /// [`AppError::Busy`]. Whatever the result, the coordinator is idle
    /// again when this returns.
    pub async fn submit(&self, draft: DownloadRequest) -> Result<SavedDownload, AppError> {
        let submission = self.begin()?;
        let result = self.run(&submission, draft).await;

        match &result {
            Ok(saved) => {
                tracing::info!(file = %saved.file_name, path = %saved.path.display(), "Download saved");
            }
            Err(AppError::Cancelled) => {}
            Err(e) => {
                if submission.advance(DownloadPhase::Failed) {
                    tracing::warn!(error = %e, kind = ?e.kind(), "Download failed");
                }
            }
        }

        result
    }

    fn begin(&self) -> Result<Submission, AppError> {
        let mut gate = self.gate();
        if gate.phase != DownloadPhase::Idle {
            tracing::debug!(phase = ?gate.phase, "Rejecting submission while busy");
            return Err(AppError::Busy);
        }
        gate.generation += 1;
        gate.phase = DownloadPhase::Validating;

        Ok(Submission {
            gate: Arc::clone(&self.gate),
            generation: gate.generation,
        })
    }

    async fn run(&self, submission: &Submission, draft: DownloadRequest) -> Result<SavedDownload, AppError> {
        let mode = draft.mode;
        let format = draft.format;

        let validated = validator::validate(draft)?;

        submission.advance(DownloadPhase::Building);
        let outbound = request_builder::build(validated);

        let token = submission.enter_in_flight().ok_or(AppError::Cancelled)?;
        let mut ticker = self.progress.start();

        let sent = tokio::select! {
            _ = token.cancelled() => {
                ticker.stop();
                return Err(AppError::Cancelled);
            }
            sent = self.api_client.send(&outbound) => sent,
        };
        ticker.stop();

        if !submission.advance(DownloadPhase::Resolving) {
            tracing::debug!("Discarding response of an abandoned submission");
            return Err(AppError::Cancelled);
        }
        self.progress.complete();

        let (file_name, payload) = match resolver::resolve(sent?, format, mode).await {
            DownloadOutcome::Success { file_name, payload } => (file_name, payload),
            DownloadOutcome::Failure(e) => return Err(e),
        };

        submission.advance(DownloadPhase::Saving);
        let path = self.sink.persist(&file_name, payload).await.map_err(|e| {
            tracing::warn!(error = %e, file = %file_name, "Saving download failed");
            e
        })?;

        Ok(SavedDownload { file_name, path })
    }
}

/// Ownership of the gate for one submission; hands it back on drop
struct Submission {
    gate: Arc<Mutex<Gate>>,
    generation: u64,
}

impl Submission {
    fn lock(&self) -> MutexGuard<'_, Gate> {
        self.gate.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Moves to `phase` unless the submission was abandoned meanwhile
    fn advance(&self, phase: DownloadPhase) -> bool {
        let mut gate = self.lock();
        if gate.generation != self.generation {
            return false;
        }
        tracing::debug!(from = ?gate.phase, to = ?phase, "Download phase change");
        gate.phase = phase;
        true
    }

    fn enter_in_flight(&self) -> Option<CancellationToken> {
        let mut gate = self.lock();
        if gate.generation != self.generation {
            return None;
        }
        let token = CancellationToken::new();
        gate.phase = DownloadPhase::InFlight;
        gate.cancel = Some(token.clone());
        Some(token)
    }
}

impl Drop for Submission {
    fn drop(&mut self) {
        let mut gate = self.lock();
        if gate.generation == self.generation {
            gate.phase = DownloadPhase::Idle;
            gate.cancel = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiConfig;
    use crate::domain::error::ErrorKind;
    use crate::domain::{MediaFormat, Mode, UploadedFile};
    use async_trait::async_trait;
    use bytes::Bytes;
    use mockito::Matcher;
    use std::path::PathBuf;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingSink {
        saved: Mutex<Vec<(String, Bytes)>>,
    }

    #[async_trait]
    impl ArtifactSink for RecordingSink {
        async fn persist(&self, file_name: &str, payload: Bytes) -> Result<PathBuf, AppError> {
            self.saved
                .lock()
                .unwrap()
                .push((file_name.to_string(), payload));
            Ok(PathBuf::from("/downloads").join(file_name))
        }
    }

    struct FailingSink;

    #[async_trait]
    impl ArtifactSink for FailingSink {
        async fn persist(&self, _file_name: &str, _payload: Bytes) -> Result<PathBuf, AppError> {
            Err(AppError::SaveError("disk full".to_string()))
        }
    }

    fn coordinator(base_url: String, sink: Arc<dyn ArtifactSink>) -> DownloadCoordinator {
        let api_client = ApiClient::new(ApiConfig {
            base_url,
            ..ApiConfig::default()
        })
        .unwrap();
        let progress = ProgressConfig {
            tick_ms: 5,
            ..ProgressConfig::default()
        };
        DownloadCoordinator::new(api_client, sink, progress)
    }

    fn video_draft(url: &str) -> DownloadRequest {
        DownloadRequest::new(Mode::SingleVideo, MediaFormat::Video)
            .with_url(url)
            .with_quality("720p")
    }

    /// Accepts connections and never answers
    async fn silent_server() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });
        format!("http://{}/api/download", addr)
    }

    async fn wait_for_phase(coordinator: &DownloadCoordinator, phase: DownloadPhase) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while coordinator.phase() != phase {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .expect("phase never reached");
    }

    #[tokio::test]
    async fn test_single_video_saved_with_header_name() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/download")
            .match_body(Matcher::Regex(r#"name="type"\r\n\r\nsingle"#.to_string()))
            .with_status(200)
            .with_header("content-disposition", r#"attachment; filename="abc.mp4""#)
            .with_body("mp4-bytes")
            .create_async()
            .await;

        let sink = Arc::new(RecordingSink::default());
        let coordinator = coordinator(format!("{}/api/download", server.url()), sink.clone());

        let saved = coordinator
            .submit(video_draft("https://youtube.com/watch?v=abc"))
            .await
            .unwrap();

        assert_eq!(saved.file_name, "abc.mp4");
        assert_eq!(saved.path, PathBuf::from("/downloads/abc.mp4"));
        assert_eq!(
            *sink.saved.lock().unwrap(),
            vec![("abc.mp4".to_string(), Bytes::from_static(b"mp4-bytes"))]
        );
        assert_eq!(coordinator.phase(), DownloadPhase::Idle);
        assert_eq!(coordinator.current_progress(), ProgressSample::COMPLETE);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_batch_without_header_uses_default_name() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/download/batch")
            .with_status(200)
            .with_body("zip-bytes")
            .create_async()
            .await;

        let sink = Arc::new(RecordingSink::default());
        let coordinator = coordinator(format!("{}/api/download", server.url()), sink.clone());

        let draft = DownloadRequest::new(Mode::BatchFile, MediaFormat::Audio)
            .with_file(UploadedFile::new("urls.txt", "https://youtu.be/a\n"))
            .with_quality("320kbps");
        let saved = coordinator.submit(draft).await.unwrap();

        assert_eq!(saved.file_name, "youtube_mp3_batch.zip");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_quality_never_reaches_service() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let sink = Arc::new(RecordingSink::default());
        let coordinator = coordinator(format!("{}/api/download", server.url()), sink.clone());

        let draft = DownloadRequest::new(Mode::SingleVideo, MediaFormat::Video)
            .with_url("https://youtube.com/watch?v=abc");
        let err = coordinator.submit(draft).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::MissingQuality);
        assert_eq!(coordinator.phase(), DownloadPhase::Idle);
        assert!(sink.saved.lock().unwrap().is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_playlist_without_list_marker_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let coordinator = coordinator(
            format!("{}/api/download", server.url()),
            Arc::new(RecordingSink::default()),
        );

        let draft = DownloadRequest::new(Mode::Playlist, MediaFormat::Video)
            .with_url("https://youtube.com/watch?v=abc")
            .with_quality("720p");
        let err = coordinator.submit(draft).await.unwrap_err();

        assert_eq!(err, AppError::InvalidUrl("not a valid playlist URL".to_string()));
        assert!(coordinator.is_idle());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_remote_error_returns_to_idle() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/download")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let sink = Arc::new(RecordingSink::default());
        let coordinator = coordinator(format!("{}/api/download", server.url()), sink.clone());

        let err = coordinator
            .submit(video_draft("https://youtube.com/watch?v=abc"))
            .await
            .unwrap_err();

        assert_eq!(err, AppError::RemoteError { status: 500 });
        assert!(coordinator.is_idle());
        assert_eq!(coordinator.current_progress(), ProgressSample::COMPLETE);
        assert!(sink.saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_service_is_transfer_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let coordinator = coordinator(
            format!("http://{}/api/download", addr),
            Arc::new(RecordingSink::default()),
        );

        let err = coordinator
            .submit(video_draft("https://youtube.com/watch?v=abc"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::TransferError);
        assert!(coordinator.is_idle());
    }

    #[tokio::test]
    async fn test_save_error_is_reported_and_idle() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/download")
            .with_status(200)
            .with_body("bytes")
            .create_async()
            .await;

        let coordinator = coordinator(format!("{}/api/download", server.url()), Arc::new(FailingSink));

        let err = coordinator
            .submit(video_draft("https://youtube.com/watch?v=abc"))
            .await
            .unwrap_err();

        assert_eq!(err, AppError::SaveError("disk full".to_string()));
        assert!(coordinator.is_idle());
    }

    #[tokio::test]
    async fn test_second_submit_rejected_while_in_flight() {
        let coordinator = coordinator(silent_server().await, Arc::new(RecordingSink::default()));

        let first = tokio::spawn({
            let coordinator = coordinator.clone();
            async move {
                coordinator
                    .submit(video_draft("https://youtube.com/watch?v=abc"))
                    .await
            }
        });
        wait_for_phase(&coordinator, DownloadPhase::InFlight).await;

        let err = coordinator
            .submit(video_draft("https://youtube.com/watch?v=other"))
            .await
            .unwrap_err();
        assert_eq!(err, AppError::Busy);
        assert_eq!(coordinator.phase(), DownloadPhase::InFlight);

        assert!(coordinator.cancel());
        assert_eq!(first.await.unwrap().unwrap_err(), AppError::Cancelled);
    }

    #[tokio::test]
    async fn test_cancel_stops_progress_and_frees_gate() {
        let coordinator = coordinator(silent_server().await, Arc::new(RecordingSink::default()));

        let first = tokio::spawn({
            let coordinator = coordinator.clone();
            async move {
                coordinator
                    .submit(video_draft("https://youtube.com/watch?v=abc"))
                    .await
            }
        });
        wait_for_phase(&coordinator, DownloadPhase::InFlight).await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(coordinator.cancel());
        assert!(coordinator.is_idle());
        assert!(!coordinator.cancel());

        assert_eq!(first.await.unwrap().unwrap_err(), AppError::Cancelled);

        let frozen = coordinator.current_progress();
        assert!(frozen.value() <= 90.0);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(coordinator.current_progress(), frozen);
    }

    #[tokio::test]
    async fn test_cancel_when_idle_is_noop() {
        let coordinator = coordinator(
            "http://localhost:8000/api/download".to_string(),
            Arc::new(RecordingSink::default()),
        );
        assert!(!coordinator.cancel());
        assert!(coordinator.is_idle());
    }
}
