use std::error::Error;
use std::fmt::{self, Display, Formatter};

use crate::decoders::png::chunk::ChunkType;

/// Fatal decoding errors. Once one is raised the session stays in the error
/// mode and every later call reports the same value again.
#[derive(Debug, Clone, PartialEq)]
pub enum PngError {
    Format(String),
    InvalidSignature { ascii_corruption: bool },
    Crc { chunk: ChunkType, expected: u32, calculated: u32 },
    Decompression(String),
    Checksum(String),
    Overflow(String),
    Internal(String),
    Benign(String),
}

impl PngError {
    pub fn is_format_error(&self) -> bool {
        matches!(self, PngError::Format(_) | PngError::InvalidSignature { .. })
    }
}

impl Error for PngError {}

impl Display for PngError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            PngError::Format(msg) => write!(f, "Format error: {}", msg),
            PngError::InvalidSignature { ascii_corruption: false } => write!(f, "Not a PNG file"),
            PngError::InvalidSignature { ascii_corruption: true } => {
                write!(f, "PNG file corrupted by ASCII conversion")
            }
            PngError::Crc { chunk, expected, calculated } => write!(
                f,
                "{}: CRC error (expected 0x{:08x}, calculated 0x{:08x})",
                chunk, expected, calculated
            ),
            PngError::Decompression(msg) => write!(f, "Decompression error: {}", msg),
            PngError::Checksum(msg) => write!(f, "Checksum error: {}", msg),
            PngError::Overflow(msg) => write!(f, "Overflow: {}", msg),
            PngError::Internal(msg) => write!(f, "Internal error: {}", msg),
            PngError::Benign(msg) => write!(f, "{}", msg),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    Truncation,
    ExtraData,
    Checksum,
    Crc,
    InvalidChunk,
    Ordering,
    Ancillary,
    PaletteIndex,
}

/// A recoverable anomaly. Decoding continues after it has been reported.
#[derive(Debug, Clone, PartialEq)]
pub struct PngWarning {
    pub kind: WarningKind,
    pub message: String,
}

impl PngWarning {
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// The error this warning turns into when benign errors are fatal.
    pub(crate) fn into_error(self) -> PngError {
        match self.kind {
            WarningKind::Checksum => PngError::Checksum(self.message),
            _ => PngError::Benign(self.message),
        }
    }
}

impl Display for PngWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

// Result type alias for decoder operations
pub type PngResult<T> = Result<T, PngError>;
