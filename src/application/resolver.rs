use bytes::BytesMut;
use futures::TryStreamExt;
use regex::Regex;

use crate::{
    api::RemoteResponse,
    domain::{AppError, DownloadOutcome, MediaFormat, Mode},
    utils::sanitize_filename,
};

/// Pulls the `filename=` value out of a content-disposition header
pub fn filename_from_disposition(header: &str) -> Option<String> {
    let re = Regex::new(r#"(?i)(?:^|[;\s])filename\s*=\s*("([^"]*)"|[^;]+)"#).ok()?;
    let caps = re.captures(header)?;
    let raw = caps.get(2).or_else(|| caps.get(1))?.as_str();
    let name = raw.trim().trim_matches('"');
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Name used when the service does not suggest one
pub fn default_file_name(format: MediaFormat, mode: Mode) -> String {
    let token = format.token();
    match mode {
        Mode::SingleVideo => format!("youtube_{}.{}", token, token),
        Mode::Playlist => "youtube_playlist.zip".to_string(),
        Mode::BatchFile => format!("youtube_{}_batch.zip", token),
    }
}

/// Interprets the service response; the payload is passed through untouched
pub async fn resolve(response: RemoteResponse, format: MediaFormat, mode: Mode) -> DownloadOutcome {
    if !response.is_success() {
        tracing::warn!(status = response.status, "Conversion service reported failure");
        return DownloadOutcome::Failure(AppError::RemoteError {
            status: response.status,
        });
    }

    let file_name = response
        .content_disposition
        .as_deref()
        .and_then(filename_from_disposition)
        .map(|name| sanitize_filename(&name))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| default_file_name(format, mode));

    let payload = response
        .body
        .try_fold(BytesMut::new(), |mut acc, chunk| async move {
            acc.extend_from_slice(&chunk);
            Ok(acc)
        })
        .await;

    match payload {
        Ok(payload) => DownloadOutcome::Success {
            file_name,
            payload: payload.freeze(),
        },
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read conversion payload");
            DownloadOutcome::Failure(AppError::TransferError(e.to_string()))
        }
    }
}
