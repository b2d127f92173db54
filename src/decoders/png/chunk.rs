use std::fmt::{self, Debug, Display, Formatter};

use crate::decoders::png::info::ImageHeader;

pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];
pub const PNG_UINT_31_MAX: u32 = 0x7fff_ffff;

/// Largest row factor used when estimating the IDAT size bound.
const MAX_ROW_FACTOR: u64 = 32566;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkType(pub [u8; 4]);

pub const IHDR: ChunkType = ChunkType(*b"IHDR");
pub const PLTE: ChunkType = ChunkType(*b"PLTE");
pub const IDAT: ChunkType = ChunkType(*b"IDAT");
pub const IEND: ChunkType = ChunkType(*b"IEND");

impl ChunkType {
    pub fn is_valid_name(&self) -> bool {
        self.0.iter().all(|b| b.is_ascii_alphabetic())
    }

    pub fn is_critical(&self) -> bool {
        self.0[0] & 0x20 == 0
    }

    pub fn is_ancillary(&self) -> bool {
        !self.is_critical()
    }

    pub fn is_private(&self) -> bool {
        self.0[1] & 0x20 != 0
    }

    /// The third letter must be uppercase in this version of the format.
    pub fn is_reserved_bit_set(&self) -> bool {
        self.0[2] & 0x20 != 0
    }

    pub fn is_safe_to_copy(&self) -> bool {
        self.0[3] & 0x20 != 0
    }
}

impl Display for ChunkType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if b.is_ascii_graphic() {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{:02x}", b)?;
            }
        }

        Ok(())
    }
}

impl Debug for ChunkType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkType({})", self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PngChunk {
    // Critical chunks
    IHDR,  // Image header
    PLTE,  // Palette
    IDAT,  // Image data
    IEND,  // End of image

    // Ancillary chunks
    TRNS,  // Transparency
    CHRM,  // Chromaticity
    GAMA,  // Gamma
    SBIT,  // Significant bits
    SRGB,  // Standard RGB
    TEXT,  // Text
    ZTXT,  // Compressed text
    ITXT,  // International text
    BKGD,  // Background color
    PHYS,  // Physical dimensions
    TIME,  // Last modification time
    HIST,  // Palette histogram
}

impl PngChunk {
    pub fn from_type(chunk_type: ChunkType) -> Option<PngChunk> {
        let chunk = match &chunk_type.0 {
            b"IHDR" => Some(PngChunk::IHDR),
            b"PLTE" => Some(PngChunk::PLTE),
            b"IDAT" => Some(PngChunk::IDAT),
            b"IEND" => Some(PngChunk::IEND),
            b"tRNS" => Some(PngChunk::TRNS),
            b"cHRM" => Some(PngChunk::CHRM),
            b"gAMA" => Some(PngChunk::GAMA),
            b"sBIT" => Some(PngChunk::SBIT),
            b"sRGB" => Some(PngChunk::SRGB),
            b"tEXt" => Some(PngChunk::TEXT),
            b"zTXt" => Some(PngChunk::ZTXT),
            b"iTXt" => Some(PngChunk::ITXT),
            b"bKGD" => Some(PngChunk::BKGD),
            b"pHYs" => Some(PngChunk::PHYS),
            b"tIME" => Some(PngChunk::TIME),
            b"hIST" => Some(PngChunk::HIST),
            _ => None,
        };

        chunk
    }

    /// Ancillary chunks that must appear before the first IDAT.
    pub fn must_precede_idat(&self) -> bool {
        matches!(
            self,
            PngChunk::TRNS
                | PngChunk::CHRM
                | PngChunk::GAMA
                | PngChunk::SBIT
                | PngChunk::SRGB
                | PngChunk::BKGD
                | PngChunk::PHYS
                | PngChunk::HIST
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkHeader {
    pub length: u32,
    pub chunk_type: ChunkType,
}

impl ChunkHeader {
    pub fn from_bytes(raw: [u8; 8]) -> Self {
        Self {
            length: u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]),
            chunk_type: ChunkType([raw[4], raw[5], raw[6], raw[7]]),
        }
    }
}

/// Upper bound for a single IDAT payload given the image geometry: the whole
/// filtered image plus zlib framing and per-block deflate overhead.
pub fn idat_limit(header: &ImageHeader) -> u32 {
    let depth_factor: u64 = if header.bit_depth > 8 { 2 } else { 1 };
    let interlace_overhead: u64 = if header.interlaced { 6 } else { 0 };
    let row_factor = header.width as u64 * header.channels() as u64 * depth_factor + 1 + interlace_overhead;

    let mut limit = match (header.height as u64).checked_mul(row_factor) {
        Some(limit) if limit <= PNG_UINT_31_MAX as u64 => limit,
        _ => PNG_UINT_31_MAX as u64,
    };

    let row_factor = row_factor.min(MAX_ROW_FACTOR);
    limit += 6 + 5 * (limit / row_factor + 1);

    limit.min(PNG_UINT_31_MAX as u64) as u32
}

/// The largest payload a chunk of this type may declare.
pub fn chunk_limit(chunk_type: ChunkType, header: Option<&ImageHeader>, max_chunk_size: u32) -> u32 {
    let limit = max_chunk_size.min(PNG_UINT_31_MAX);

    match header {
        Some(header) if chunk_type == IDAT => limit.max(idat_limit(header)),
        _ => limit,
    }
}
