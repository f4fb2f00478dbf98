use thiserror::Error;

use crate::layout::SlotId;

#[derive(Error, Debug)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(
        "checksum mismatch in slot {slot} section {section_id}: stored {stored:#06x}, computed {computed:#06x}"
    )]
    ChecksumMismatch {
        slot: SlotId,
        section_id: u16,
        stored: u16,
        computed: u16,
    },

    #[error("unknown format version: {0}")]
    UnknownFormatVersion(String),

    #[error("malformed block: expected {expected} bytes, got {actual}")]
    MalformedBlock { expected: usize, actual: usize },

    #[error("text cannot be encoded in the Gen III character set: {0:?}")]
    UnencodableText(String),

    #[error("invalid location: {0}")]
    InvalidLocation(String),

    #[error("container is full: {0}")]
    Full(String),
}
