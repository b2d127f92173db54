use miniz_oxide::inflate::stream::{inflate, InflateState};
use miniz_oxide::inflate::TINFLStatus;
use miniz_oxide::{DataFormat, MZError, MZFlush, MZStatus};

/// Size of the staging area decompressed bytes pass through.
const STAGING_SIZE: usize = 32 * 1024;

#[derive(Debug, Clone, PartialEq)]
pub enum InflateStatus {
    /// More input or output space is needed.
    Continue,
    /// The compressed stream ended and all of its output has been delivered.
    StreamEnd,
    /// The stream's trailing checksum did not match its contents.
    ChecksumError,
    /// Any other decompression failure.
    Fatal(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct InflateStep {
    pub consumed: usize,
    pub written: usize,
    pub status: InflateStatus,
}

/// Byte-stream decompressor fed by the IDAT engine. An implementation takes
/// input and output space on every step and reports how much of each it used.
pub trait Inflater {
    fn inflate(&mut self, input: &[u8], output: &mut [u8]) -> InflateStep;

    fn reset(&mut self);
}

/// zlib decompression on top of miniz_oxide's streaming inflater.
///
/// Output goes through a staging buffer so that every byte produced before a
/// terminal status is delivered before that status is reported.
pub struct ZlibInflater {
    state: Box<InflateState>,
    staging: Vec<u8>,
    staged: usize,
    delivered: usize,
    outcome: Option<InflateStatus>,
}

impl ZlibInflater {
    pub fn new() -> Self {
        Self {
            state: InflateState::new_boxed(DataFormat::Zlib),
            staging: vec![0; STAGING_SIZE],
            staged: 0,
            delivered: 0,
            outcome: None,
        }
    }

    fn refill(&mut self, input: &[u8]) -> usize {
        let result = inflate(&mut self.state, input, &mut self.staging, MZFlush::None);

        self.staged = result.bytes_written;
        self.delivered = 0;
        self.outcome = match result.status {
            Ok(MZStatus::Ok) | Err(MZError::Buf) => None,
            Ok(MZStatus::StreamEnd) => Some(InflateStatus::StreamEnd),
            Ok(MZStatus::NeedDict) => Some(InflateStatus::Fatal("preset dictionary not supported".to_string())),
            Err(MZError::Data) if self.state.last_status() == TINFLStatus::Adler32Mismatch => {
                Some(InflateStatus::ChecksumError)
            }
            Err(e) => Some(InflateStatus::Fatal(format!("{:?} ({:?})", e, self.state.last_status()))),
        };

        result.bytes_consumed
    }
}

impl Default for ZlibInflater {
    fn default() -> Self {
        Self::new()
    }
}

impl Inflater for ZlibInflater {
    fn inflate(&mut self, input: &[u8], output: &mut [u8]) -> InflateStep {
        let mut consumed = 0;

        if self.delivered == self.staged && self.outcome.is_none() {
            consumed = self.refill(input);
        }

        let written = output.len().min(self.staged - self.delivered);
        output[..written].copy_from_slice(&self.staging[self.delivered..self.delivered + written]);
        self.delivered += written;

        let status = match &self.outcome {
            Some(outcome) if self.delivered == self.staged => outcome.clone(),
            _ => InflateStatus::Continue,
        };

        InflateStep {
            consumed,
            written,
            status,
        }
    }

    fn reset(&mut self) {
        self.state = InflateState::new_boxed(DataFormat::Zlib);
        self.staged = 0;
        self.delivered = 0;
        self.outcome = None;
    }
}
