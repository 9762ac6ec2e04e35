use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidUrl,
    InvalidFile,
    MissingQuality,
    RemoteError,
    TransferError,
    SaveError,
    Busy,
    Cancelled,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AppError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid file: {0}")]
    InvalidFile(String),

    #[error("Select a quality: {0}")]
    MissingQuality(String),

    #[error("Conversion service returned status {status}")]
    RemoteError { status: u16 },

    #[error("Transfer failed: {0}")]
    TransferError(String),

    #[error("Could not save file: {0}")]
    SaveError(String),

    #[error("A download is already in progress")]
    Busy,

    #[error("Download cancelled")]
    Cancelled,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::InvalidUrl(_) => ErrorKind::InvalidUrl,
            AppError::InvalidFile(_) => ErrorKind::InvalidFile,
            AppError::MissingQuality(_) => ErrorKind::MissingQuality,
            AppError::RemoteError { .. } => ErrorKind::RemoteError,
            AppError::TransferError(_) => ErrorKind::TransferError,
            AppError::SaveError(_) => ErrorKind::SaveError,
            AppError::Busy => ErrorKind::Busy,
            AppError::Cancelled => ErrorKind::Cancelled,
        }
    }
}

impl From<crate::api::ApiError> for AppError {
    fn from(e: crate::api::ApiError) -> Self {
        AppError::TransferError(e.to_string())
    }
}
