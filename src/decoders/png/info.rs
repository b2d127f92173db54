use crate::decoders::png::chunk::ChunkType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorType {
    #[default]
    Grayscale = 0,
    RGB = 2,
    Indexed = 3,
    GrayscaleAlpha = 4,
    RGBA = 6,
}

impl ColorType {
    pub fn from_u8(value: u8) -> Option<ColorType> {
        match value {
            0 => Some(ColorType::Grayscale),
            2 => Some(ColorType::RGB),
            3 => Some(ColorType::Indexed),
            4 => Some(ColorType::GrayscaleAlpha),
            6 => Some(ColorType::RGBA),
            _ => None,
        }
    }

    pub fn channels(&self) -> u8 {
        match self {
            ColorType::Grayscale => 1,
            ColorType::RGB => 3,
            ColorType::Indexed => 1,
            ColorType::GrayscaleAlpha => 2,
            ColorType::RGBA => 4,
        }
    }

    pub fn is_valid_bit_depth(&self, bit_depth: u8) -> bool {
        match self {
            ColorType::Grayscale => matches!(bit_depth, 1 | 2 | 4 | 8 | 16),
            ColorType::Indexed => matches!(bit_depth, 1 | 2 | 4 | 8),
            ColorType::RGB | ColorType::GrayscaleAlpha | ColorType::RGBA => matches!(bit_depth, 8 | 16),
        }
    }

    pub fn has_color(&self) -> bool {
        matches!(self, ColorType::RGB | ColorType::Indexed | ColorType::RGBA)
    }

    pub fn has_alpha(&self) -> bool {
        matches!(self, ColorType::GrayscaleAlpha | ColorType::RGBA)
    }
}

/// Number of bytes needed for `width` pixels of `pixel_depth` bits.
pub fn row_bytes(width: u32, pixel_depth: u8) -> Option<usize> {
    let width = width as usize;
    let depth = pixel_depth as usize;

    if depth >= 8 {
        width.checked_mul(depth / 8)
    } else {
        width.checked_mul(depth)?.checked_add(7).map(|bits| bits / 8)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageHeader {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: ColorType,
    pub interlaced: bool,
}

impl ImageHeader {
    pub fn channels(&self) -> u8 {
        self.color_type.channels()
    }

    pub fn pixel_depth(&self) -> u8 {
        self.bit_depth * self.channels()
    }

    pub fn row_bytes(&self) -> Option<usize> {
        row_bytes(self.width, self.pixel_depth())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransparencyData {
    Grayscale(u16),
    RGB(u16, u16, u16),
    Palette(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum BackgroundData {
    Grayscale(u16),
    RGB(u16, u16, u16),
    PaletteIndex(u8),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderingIntent {
    Perceptual = 0,
    RelativeColorimetric = 1,
    Saturation = 2,
    AbsoluteColorimetric = 3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Chromaticities {
    pub white_point_x: f32,
    pub white_point_y: f32,
    pub red_x: f32,
    pub red_y: f32,
    pub green_x: f32,
    pub green_y: f32,
    pub blue_x: f32,
    pub blue_y: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PngText {
    Basic {
        keyword: String,
        text: String,
    },
    Compressed {
        keyword: String,
        text: String,
    },
    International {
        keyword: String,
        language_tag: String,
        translated_keyword: String,
        text: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalDimensions {
    pub pixels_per_unit_x: u32,
    pub pixels_per_unit_y: u32,
    pub unit: PhysicalUnit,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PhysicalUnit {
    Unknown,
    Meter,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SignificantBits {
    Grayscale { gray: u8 },
    RGB { red: u8, green: u8, blue: u8 },
    Indexed { red: u8, green: u8, blue: u8 },
    GrayscaleAlpha { gray: u8, alpha: u8 },
    RGBA { red: u8, green: u8, blue: u8, alpha: u8 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

/// Where in the stream an unknown chunk was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkLocation {
    BeforePlte,
    BeforeIdat,
    AfterIdat,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnknownChunk {
    pub chunk_type: ChunkType,
    pub data: Vec<u8>,
    pub location: ChunkLocation,
}

/// Everything known about the image so far. Geometry is valid once
/// `on_info` has been called.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PngInfo {
    pub header: ImageHeader,
    /// Bits per pixel of the rows handed to `on_row`.
    pub output_pixel_depth: u8,
    /// Byte length of a full-width output row.
    pub output_row_bytes: usize,
    pub palette: Option<Vec<[u8; 3]>>,
    pub gamma: Option<f32>,
    pub transparency: Option<TransparencyData>,
    pub background: Option<BackgroundData>,
    pub rendering_intent: Option<RenderingIntent>,
    pub chromaticities: Option<Chromaticities>,
    pub physical_dimensions: Option<PhysicalDimensions>,
    pub significant_bits: Option<SignificantBits>,
    pub histogram: Option<Vec<u16>>,
    pub modification_time: Option<ImageTime>,
    pub text_chunks: Vec<PngText>,
    pub unknown_chunks: Vec<UnknownChunk>,
}

impl PngInfo {
    pub fn width(&self) -> u32 {
        self.header.width
    }

    pub fn height(&self) -> u32 {
        self.header.height
    }

    pub fn bit_depth(&self) -> u8 {
        self.header.bit_depth
    }

    pub fn color_type(&self) -> ColorType {
        self.header.color_type
    }

    pub fn is_interlaced(&self) -> bool {
        self.header.interlaced
    }
}
