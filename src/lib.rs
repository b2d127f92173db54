mod config;
mod decoders;
mod utils;

pub use config::{
    BenignErrors, CrcAction, DecoderConfig, Filler, FillerPosition, KeepPolicy, Limits, Transformations,
};
pub use decoders::png::chunk::{ChunkType, PNG_SIGNATURE};
pub use decoders::png::inflate::{InflateStatus, InflateStep, Inflater, ZlibInflater};
pub use decoders::png::info::{
    BackgroundData, Chromaticities, ChunkLocation, ColorType, ImageHeader, ImageTime, PhysicalDimensions,
    PhysicalUnit, PngInfo, PngText, RenderingIntent, SignificantBits, TransparencyData, UnknownChunk,
};
pub use decoders::png::interlace::{combine_row, PassInfo, ADAM7_PASSES};
pub use decoders::png::{Mode, Pause, Processed, ProgressiveHandler, PushDecoder};
pub use utils::error::{PngError, PngResult, PngWarning, WarningKind};
pub use utils::logger::Logger;
