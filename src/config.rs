use bitflags::bitflags;

use crate::decoders::png::chunk::ChunkType;

bitflags! {
    /// Per-row transformations applied before rows are handed to the caller.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Transformations: u32 {
        /// Expand interlaced pass rows to full width and emit placeholder rows.
        const EXPAND_INTERLACE = 0x0001;
        /// Drop the alpha sample from gray+alpha and RGBA pixels.
        const STRIP_ALPHA = 0x0002;
        /// Invert grayscale samples so that zero is white.
        const INVERT_MONO = 0x0004;
        /// Reorder RGB samples as BGR.
        const BGR = 0x0008;
        /// Pack sub-byte pixels least significant bits first.
        const PACKSWAP = 0x0010;
        /// Store 16-bit samples little-endian.
        const SWAP_ENDIAN = 0x0020;
        /// Add a filler channel to 8 and 16-bit gray and RGB pixels.
        /// Set together with the filler value by [`DecoderConfig::with_filler`].
        const FILLER = 0x0040;
        /// Move the alpha sample in front of the color samples.
        const SWAP_ALPHA = 0x0080;
        /// Invert alpha samples so that zero is opaque.
        const INVERT_ALPHA = 0x0100;
        /// Unpack 1, 2 and 4-bit pixels into one byte each.
        const PACKING = 0x0200;
    }
}

impl Default for Transformations {
    fn default() -> Self {
        Self::empty()
    }
}

/// Which side of the pixel the filler channel goes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillerPosition {
    Before,
    #[default]
    After,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Filler {
    /// Sample value. 8-bit rows use the low byte.
    pub value: u16,
    pub position: FillerPosition,
}

impl Default for Filler {
    fn default() -> Self {
        Self {
            value: 0xffff,
            position: FillerPosition::After,
        }
    }
}

/// How recoverable integrity anomalies ("benign errors") are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BenignErrors {
    #[default]
    Warn,
    Error,
}

/// What to do when a chunk's CRC does not match its contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrcAction {
    /// Abort decoding.
    Error,
    /// Warn and drop the chunk. Critical chunks are used anyway.
    Discard,
    /// Warn and use the chunk.
    Use,
    /// Use the chunk without a warning.
    Ignore,
}

/// Whether chunks without a built-in handler are stored in `PngInfo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeepPolicy {
    #[default]
    Default,
    Never,
    IfSafe,
    Always,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_width: u32,
    pub max_height: u32,
    /// Largest payload accepted for chunks other than IDAT.
    pub max_chunk_size: u32,
    /// Largest bits-per-pixel a row may have after transformations.
    pub max_pixel_depth: u8,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_width: 1_000_000,
            max_height: 1_000_000,
            max_chunk_size: 8_000_000,
            max_pixel_depth: 64,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DecoderConfig {
    pub transformations: Transformations,
    pub filler: Filler,
    pub benign_errors: BenignErrors,
    pub crc_critical: CrcAction,
    pub crc_ancillary: CrcAction,
    pub unknown_chunks: KeepPolicy,
    pub chunk_overrides: Vec<(ChunkType, KeepPolicy)>,
    pub skip_invalid_ancillary: bool,
    pub limits: Limits,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            transformations: Transformations::default(),
            filler: Filler::default(),
            benign_errors: BenignErrors::Warn,
            crc_critical: CrcAction::Error,
            crc_ancillary: CrcAction::Discard,
            unknown_chunks: KeepPolicy::Default,
            chunk_overrides: Vec::new(),
            skip_invalid_ancillary: true,
            limits: Limits::default(),
        }
    }
}

impl DecoderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transformations(mut self, transformations: Transformations) -> Self {
        self.transformations = transformations;
        self
    }

    /// Adds a filler channel holding `value`, and turns on
    /// [`Transformations::FILLER`].
    pub fn with_filler(mut self, value: u16, position: FillerPosition) -> Self {
        self.filler = Filler { value, position };
        self.transformations |= Transformations::FILLER;
        self
    }

    pub fn with_benign_errors(mut self, benign_errors: BenignErrors) -> Self {
        self.benign_errors = benign_errors;
        self
    }

    pub fn with_crc_action(mut self, critical: CrcAction, ancillary: CrcAction) -> Self {
        self.crc_critical = critical;
        self.crc_ancillary = ancillary;
        self
    }

    pub fn with_unknown_chunks(mut self, policy: KeepPolicy) -> Self {
        self.unknown_chunks = policy;
        self
    }

    pub fn with_skip_invalid_ancillary(mut self, skip: bool) -> Self {
        self.skip_invalid_ancillary = skip;
        self
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Routes `chunk_type` through the unknown-chunk path with its own policy.
    /// This also applies to PLTE and to the ancillary chunks that have
    /// built-in parsers.
    pub fn keep_chunk(mut self, chunk_type: ChunkType, policy: KeepPolicy) -> Self {
        self.chunk_overrides.retain(|(existing, _)| *existing != chunk_type);
        self.chunk_overrides.push((chunk_type, policy));
        self
    }

    pub fn chunk_override(&self, chunk_type: ChunkType) -> Option<KeepPolicy> {
        self.chunk_overrides
            .iter()
            .find(|(existing, _)| *existing == chunk_type)
            .map(|(_, policy)| *policy)
    }

    pub fn keep_policy(&self, chunk_type: ChunkType) -> KeepPolicy {
        self.chunk_override(chunk_type).unwrap_or(self.unknown_chunks)
    }

    pub(crate) fn crc_action(&self, chunk_type: ChunkType) -> CrcAction {
        if chunk_type.is_critical() {
            self.crc_critical
        } else {
            self.crc_ancillary
        }
    }
}
