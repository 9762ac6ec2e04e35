pub mod error;
pub mod model;

pub use error::AppError;
pub use model::{
    DownloadOutcome, DownloadPhase, DownloadRequest, MediaFormat, Mode, ProgressSample,
    SavedDownload, Source, UploadedFile, ValidSource, ValidatedRequest,
};
