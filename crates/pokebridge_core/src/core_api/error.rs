use std::error::Error;
use std::fmt;

use crate::error::SaveError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreErrorCode {
    Io,
    ChecksumMismatch,
    UnknownFormatVersion,
    MalformedBlock,
    GameDetectionAmbiguous,
    IncompatibleSpecies,
    SlotOccupied,
    DestinationFull,
    SlotEmpty,
    InvalidSlot,
    StaleHandle,
    UnsupportedOperation,
}

impl CoreErrorCode {
    /// Policy faults leave every save untouched and can be retried with
    /// different arguments. Codec and I/O faults cannot.
    pub fn is_recoverable(self) -> bool {
        !matches!(
            self,
            Self::Io | Self::ChecksumMismatch | Self::UnknownFormatVersion | Self::MalformedBlock
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreError {
    pub code: CoreErrorCode,
    pub message: String,
}

impl CoreError {
    pub fn new(code: CoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn is_recoverable(&self) -> bool {
        self.code.is_recoverable()
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl Error for CoreError {}

impl From<SaveError> for CoreError {
    fn from(err: SaveError) -> Self {
        let code = match &err {
            SaveError::Io(_) => CoreErrorCode::Io,
            SaveError::ChecksumMismatch { .. } => CoreErrorCode::ChecksumMismatch,
            SaveError::UnknownFormatVersion(_) => CoreErrorCode::UnknownFormatVersion,
            SaveError::MalformedBlock { .. } | SaveError::UnencodableText(_) => {
                CoreErrorCode::MalformedBlock
            }
            SaveError::InvalidLocation(_) => CoreErrorCode::InvalidSlot,
            SaveError::Full(_) => CoreErrorCode::DestinationFull,
        };
        Self::new(code, err.to_string())
    }
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        Self::new(CoreErrorCode::Io, err.to_string())
    }
}
