use std::fmt;
use std::path::PathBuf;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::error::AppError;

const VIDEO_QUALITIES: &[(&str, &str)] = &[
    ("1080p", "1080p (HD)"),
    ("720p", "720p (HD)"),
    ("480p", "480p (SD)"),
    ("360p", "360p (SD)"),
    ("240p", "240p (Low)"),
    ("144p", "144p (Very Low)"),
];

const AUDIO_QUALITIES: &[(&str, &str)] = &[
    ("320kbps", "320 kbps (High)"),
    ("256kbps", "256 kbps (Good)"),
    ("192kbps", "192 kbps (Medium)"),
    ("128kbps", "128 kbps (Standard)"),
    ("96kbps", "96 kbps (Low)"),
];

/// Which request shape governs validation and build rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    #[default]
    SingleVideo,
    Playlist,
    BatchFile,
}

impl Mode {
    pub fn uses_url(self) -> bool {
        !matches!(self, Mode::BatchFile)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::SingleVideo => write!(f, "Single video"),
            Mode::Playlist => write!(f, "Playlist"),
            Mode::BatchFile => write!(f, "File upload"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaFormat {
    Audio,
    #[default]
    Video,
}

impl MediaFormat {
    /// Wire token, also used as the file extension of single downloads
    pub fn token(self) -> &'static str {
        match self {
            MediaFormat::Audio => "mp3",
            MediaFormat::Video => "mp4",
        }
    }

    /// Offered quality tokens with their display labels, best first
    pub fn qualities(self) -> &'static [(&'static str, &'static str)] {
        match self {
            MediaFormat::Audio => AUDIO_QUALITIES,
            MediaFormat::Video => VIDEO_QUALITIES,
        }
    }

    pub fn offers(self, quality: &str) -> bool {
        self.qualities().iter().any(|(token, _)| *token == quality)
    }
}

impl fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaFormat::Audio => write!(f, "Audio (MP3)"),
            MediaFormat::Video => write!(f, "Video (MP4)"),
        }
    }
}

/// A user supplied list of URLs, one per line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Url(String),
    File(UploadedFile),
}

/// Draft of one download as edited in the UI.
///
/// Any combination of fields is a legal draft; completeness is only
/// enforced when the draft is submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadRequest {
    pub mode: Mode,
    pub source: Option<Source>,
    pub format: MediaFormat,
    pub quality: String,
}

impl DownloadRequest {
    pub fn new(mode: Mode, format: MediaFormat) -> Self {
        Self {
            mode,
            format,
            ..Default::default()
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.source = Some(Source::Url(url.into()));
        self
    }

    pub fn with_file(mut self, file: UploadedFile) -> Self {
        self.source = Some(Source::File(file));
        self
    }

    pub fn with_quality(mut self, quality: impl Into<String>) -> Self {
        self.quality = quality.into();
        self
    }

    /// Switching format drops the quality since the token sets differ
    pub fn with_format(mut self, format: MediaFormat) -> Self {
        if self.format != format {
            self.quality.clear();
        }
        self.format = format;
        self
    }

    /// Whether the source the mode needs has been filled in
    pub fn is_submittable(&self) -> bool {
        match (&self.source, self.mode) {
            (Some(Source::Url(url)), mode) if mode.uses_url() => !url.trim().is_empty(),
            (Some(Source::File(_)), Mode::BatchFile) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidSource {
    Url(String),
    File(UploadedFile),
}

/// A draft that passed validation; only the validator constructs these
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub(crate) mode: Mode,
    pub(crate) source: ValidSource,
    pub(crate) format: MediaFormat,
    pub(crate) quality: String,
}

#[derive(Debug, Clone)]
pub enum DownloadOutcome {
    Success { file_name: String, payload: Bytes },
    Failure(AppError),
}

/// Estimated completion in percent, `0.0..=100.0`
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct ProgressSample(pub f32);

impl ProgressSample {
    pub const COMPLETE: ProgressSample = ProgressSample(100.0);

    pub fn value(self) -> f32 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DownloadPhase {
    #[default]
    Idle,
    Validating,
    Building,
    InFlight,
    Resolving,
    Saving,
    Failed,
}

/// What the user gets back after a successful submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedDownload {
    pub file_name: String,
    pub path: PathBuf,
}
