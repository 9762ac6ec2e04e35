use std::fmt;

use iced::{
    widget::{button, column, pick_list, progress_bar, radio, row, text, text_input, Space},
    Element, Length,
};

use crate::domain::{DownloadRequest, MediaFormat, Mode, UploadedFile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityOption {
    pub token: &'static str,
    pub label: &'static str,
}

impl fmt::Display for QualityOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label)
    }
}

fn quality_options(format: MediaFormat) -> Vec<QualityOption> {
    format
        .qualities()
        .iter()
        .map(|&(token, label)| QualityOption { token, label })
        .collect()
}

/// Main view state
pub struct DownloadView {
    pub draft: DownloadRequest,
    pub url: String,
    pub file: Option<UploadedFile>,
    pub status_message: String,
    pub progress: f32,
    pub is_downloading: bool,
}

impl Default for DownloadView {
    fn default() -> Self {
        Self {
            draft: DownloadRequest::default(),
            url: String::new(),
            file: None,
            status_message: "Paste a YouTube link or upload a list of links".to_string(),
            progress: 0.0,
            is_downloading: false,
        }
    }
}

#[derive(Debug, Clone)]
pub enum DownloadMessage {
    ModeSelected(Mode),
    UrlChanged(String),
    PastePressed,
    PickFilePressed,
    FormatSelected(MediaFormat),
    QualitySelected(QualityOption),
    DownloadPressed,
    CancelPressed,
}

impl DownloadView {
    pub fn with_format(format: MediaFormat) -> Self {
        let mut view = Self::default();
        view.draft.format = format;
        view
    }

    pub fn update(&mut self, message: DownloadMessage) {
        match message {
            DownloadMessage::ModeSelected(mode) => {
                self.draft.mode = mode;
            }
            DownloadMessage::UrlChanged(url) => {
                self.url = url;
            }
            DownloadMessage::FormatSelected(format) => {
                self.draft = std::mem::take(&mut self.draft).with_format(format);
            }
            DownloadMessage::QualitySelected(option) => {
                self.draft.quality = option.token.to_string();
            }
            DownloadMessage::PastePressed
            | DownloadMessage::PickFilePressed
            | DownloadMessage::DownloadPressed
            | DownloadMessage::CancelPressed => {
                // Will be handled by the app
            }
        }
    }

    /// Snapshot of the form for the active mode
    pub fn draft(&self) -> DownloadRequest {
        let draft = DownloadRequest::new(self.draft.mode, self.draft.format)
            .with_quality(self.draft.quality.clone());

        match (&self.file, self.draft.mode) {
            (_, mode) if mode.uses_url() => draft.with_url(self.url.as_str()),
            (Some(file), _) => draft.with_file(file.clone()),
            (None, _) => draft,
        }
    }

    fn source_input(&self) -> Element<'_, DownloadMessage> {
        if self.draft.mode.uses_url() {
            row![
                text_input("https://www.youtube.com/watch?v=...", &self.url)
                    .on_input(DownloadMessage::UrlChanged)
                    .padding(10)
                    .width(Length::Fill),
                button("Paste")
                    .on_press(DownloadMessage::PastePressed)
                    .padding(10),
            ]
            .spacing(10)
            .into()
        } else {
            let selected = self
                .file
                .as_ref()
                .map(|file| file.name.clone())
                .unwrap_or_else(|| "CSV, XLSX, or TXT (one URL per line)".to_string());

            column![
                button("Choose file...")
                    .on_press(DownloadMessage::PickFilePressed)
                    .padding(10),
                text(selected).size(14),
            ]
            .spacing(6)
            .into()
        }
    }

    pub fn view(&self) -> Element<'_, DownloadMessage> {
        let mode = Some(self.draft.mode);
        let format = Some(self.draft.format);
        let options = quality_options(self.draft.format);
        let selected_quality = options
            .iter()
            .copied()
            .find(|option| option.token == self.draft.quality);
        let placeholder = match self.draft.format {
            MediaFormat::Audio => "Select audio quality",
            MediaFormat::Video => "Select video quality",
        };

        let can_submit = !self.is_downloading && self.draft().is_submittable();

        column![
            text("Video Vault").size(32),
            text("Download YouTube videos in MP4 or MP3 format").size(14),
            Space::new().height(Length::Fixed(20.0)),
            row![
                radio(Mode::SingleVideo.to_string(), Mode::SingleVideo, mode, DownloadMessage::ModeSelected),
                radio(Mode::Playlist.to_string(), Mode::Playlist, mode, DownloadMessage::ModeSelected),
                radio(Mode::BatchFile.to_string(), Mode::BatchFile, mode, DownloadMessage::ModeSelected),
            ]
            .spacing(20),
            self.source_input(),
            Space::new().height(Length::Fixed(10.0)),
            text("Format").size(16),
            row![
                radio(MediaFormat::Video.to_string(), MediaFormat::Video, format, DownloadMessage::FormatSelected),
                radio(MediaFormat::Audio.to_string(), MediaFormat::Audio, format, DownloadMessage::FormatSelected),
            ]
            .spacing(20),
            text("Quality").size(16),
            pick_list(options, selected_quality, DownloadMessage::QualitySelected)
                .placeholder(placeholder),
            Space::new().height(Length::Fixed(10.0)),
            progress_bar(0.0..=100.0, self.progress),
            text(&self.status_message).size(14),
            Space::new().height(Length::Fixed(20.0)),
            row![
                button("Download")
                    .on_press_maybe(can_submit.then_some(DownloadMessage::DownloadPressed))
                    .padding([10, 20]),
                button("Cancel")
                    .on_press_maybe(self.is_downloading.then_some(DownloadMessage::CancelPressed))
                    .padding([10, 20]),
            ]
            .spacing(10),
        ]
        .padding(20)
        .spacing(10)
        .into()
    }
}
