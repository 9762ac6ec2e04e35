use crate::{
    domain::{AppError, DownloadRequest, Mode, Source, UploadedFile, ValidSource, ValidatedRequest},
    utils::{file_extension, has_playlist_marker, has_video_marker, mentions_youtube},
};

pub const ALLOWED_EXTENSIONS: &[&str] = &["csv", "xlsx", "txt"];

/// Checks the source of a draft against the rules of its mode.
///
/// Quality is not looked at; a draft may still be missing one while the
/// user edits other fields.
pub fn validate_source(draft: &DownloadRequest) -> Result<ValidSource, AppError> {
    match draft.mode {
        Mode::SingleVideo => match &draft.source {
            Some(Source::Url(url)) if !url.trim().is_empty() && has_video_marker(url) => {
                Ok(ValidSource::Url(url.trim().to_string()))
            }
            _ => Err(AppError::InvalidUrl("not a valid video URL".to_string())),
        },
        Mode::Playlist => match &draft.source {
            Some(Source::Url(url)) if !url.trim().is_empty() && has_playlist_marker(url) => {
                Ok(ValidSource::Url(url.trim().to_string()))
            }
            _ => Err(AppError::InvalidUrl("not a valid playlist URL".to_string())),
        },
        Mode::BatchFile => match &draft.source {
            Some(Source::File(file)) if has_allowed_extension(&file.name) => {
                Ok(ValidSource::File(file.clone()))
            }
            Some(Source::File(_)) => Err(unsupported_file()),
            _ => Err(AppError::InvalidFile("no file selected".to_string())),
        },
    }
}

/// Full submission check: source first, then quality
pub fn validate(draft: DownloadRequest) -> Result<ValidatedRequest, AppError> {
    let source = validate_source(&draft)?;

    let quality = draft.quality.trim();
    if quality.is_empty() {
        return Err(AppError::MissingQuality(format!(
            "no {} quality selected",
            draft.format.token()
        )));
    }
    if !draft.format.offers(quality) {
        return Err(AppError::MissingQuality(format!(
            "{} is not offered for {}",
            quality,
            draft.format.token()
        )));
    }

    Ok(ValidatedRequest {
        mode: draft.mode,
        source,
        format: draft.format,
        quality: quality.to_string(),
    })
}

/// Gate for a freshly picked or dropped file.
///
/// Takes the file by value so a rejected one is dropped here and can never
/// end up as the active selection.
pub fn accept_upload(file: UploadedFile) -> Result<UploadedFile, AppError> {
    if has_allowed_extension(&file.name) {
        Ok(file)
    } else {
        tracing::debug!(name = %file.name, "Discarding upload with unsupported extension");
        Err(unsupported_file())
    }
}

/// Gate for text pasted from the clipboard
pub fn accept_pasted_url(text: &str) -> Result<String, AppError> {
    let text = text.trim();
    if mentions_youtube(text) {
        Ok(text.to_string())
    } else {
        Err(AppError::InvalidUrl("not a valid YouTube URL".to_string()))
    }
}

fn has_allowed_extension(name: &str) -> bool {
    file_extension(name).is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
}

fn unsupported_file() -> AppError {
    AppError::InvalidFile("unsupported file type".to_string())
}
