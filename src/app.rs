use std::time::Duration;

use iced::{Subscription, Task};

use crate::application::{validator, DownloadCoordinator};
use crate::domain::{AppError, MediaFormat, SavedDownload, UploadedFile};
use crate::ui::{DownloadMessage, DownloadView};

pub struct DownloadApp {
    view: DownloadView,
    coordinator: DownloadCoordinator,
}

impl DownloadApp {
    pub fn new(coordinator: DownloadCoordinator, default_format: MediaFormat) -> Self {
        Self {
            view: DownloadView::with_format(default_format),
            coordinator,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    UiMessage(DownloadMessage),
    /// Clipboard contents, if readable
    Pasted(Option<String>),
    /// File chosen in the picker, if any
    FilePicked(Option<UploadedFile>),
    /// Poll the progress estimate while a download runs
    ProgressTick,
    /// Final result after converting and saving
    DownloadCompleted(Result<SavedDownload, AppError>),
}

pub fn update(app: &mut DownloadApp, message: Message) -> Task<Message> {
    match message {
        Message::UiMessage(ui_msg) => {
            app.view.update(ui_msg.clone());

            match ui_msg {
                DownloadMessage::DownloadPressed => {
                    let draft = app.view.draft();
                    if app.view.is_downloading || !app.coordinator.is_idle() || !draft.is_submittable() {
                        return Task::none();
                    }

                    let coordinator = app.coordinator.clone();
                    app.view.is_downloading = true;
                    app.view.progress = 0.0;
                    app.view.status_message = "Converting...".to_string();

                    return Task::perform(
                        async move { coordinator.submit(draft).await },
                        Message::DownloadCompleted,
                    );
                }
                DownloadMessage::CancelPressed => {
                    if !app.coordinator.cancel() {
                        app.view.status_message = "Nothing to cancel at this stage".to_string();
                    }
                }
                DownloadMessage::PastePressed => {
                    return iced::clipboard::read().map(Message::Pasted);
                }
                DownloadMessage::PickFilePressed => {
                    return Task::perform(
                        async {
                            let handle = rfd::AsyncFileDialog::new()
                                .add_filter("URL list", validator::ALLOWED_EXTENSIONS)
                                .pick_file()
                                .await?;
                            let bytes = handle.read().await;
                            Some(UploadedFile::new(handle.file_name(), bytes))
                        },
                        Message::FilePicked,
                    );
                }
                _ => {}
            }
        }
        Message::Pasted(Some(clipboard_text)) => match validator::accept_pasted_url(&clipboard_text) {
            Ok(url) => {
                app.view.url = url;
                app.view.status_message = "YouTube URL pasted successfully".to_string();
            }
            Err(e) => {
                app.view.status_message = e.to_string();
            }
        },
        Message::Pasted(None) => {
            app.view.status_message = "Failed to access clipboard".to_string();
        }
        Message::FilePicked(Some(file)) => match validator::accept_upload(file) {
            Ok(file) => {
                app.view.status_message = format!("File {} selected", file.name);
                app.view.file = Some(file);
            }
            Err(e) => {
                app.view.file = None;
                app.view.status_message = e.to_string();
            }
        },
        Message::FilePicked(None) => {}
        Message::ProgressTick => {
            app.view.progress = app.coordinator.current_progress().value();
            if app.coordinator.is_idle() {
                return Task::none();
            }
            app.view.status_message = format!("Converting: {:.0}%", app.view.progress);
        }
        Message::DownloadCompleted(result) => {
            app.view.is_downloading = false;
            app.view.progress = 0.0;
            match result {
                Ok(saved) => {
                    app.view.status_message = format!("Saved: {}", saved.path.display());
                }
                Err(AppError::Cancelled) => {
                    app.view.status_message = "Download cancelled".to_string();
                }
                Err(e) => {
                    app.view.status_message = format!("Download failed: {}", e);
                }
            }
        }
    }
    Task::none()
}

pub fn subscription(app: &DownloadApp) -> Subscription<Message> {
    if app.view.is_downloading {
        iced::time::every(Duration::from_millis(100)).map(|_| Message::ProgressTick)
    } else {
        Subscription::none()
    }
}

pub fn view(app: &DownloadApp) -> iced::Element<'_, Message> {
    app.view.view().map(Message::UiMessage)
}
