use std::io::Read;

use flate2::read::ZlibDecoder;

use crate::config::Limits;
use crate::decoders::png::chunk::{PngChunk, PNG_UINT_31_MAX};
use crate::decoders::png::info::{
    BackgroundData, Chromaticities, ColorType, ImageHeader, ImageTime, PhysicalDimensions, PhysicalUnit, PngInfo,
    PngText, RenderingIntent, SignificantBits, TransparencyData,
};
use crate::log_warn;
use crate::utils::error::{PngError, PngResult};
use crate::utils::traits::SafeAccess;

const MAX_KEYWORD_LENGTH: usize = 79;

fn chunk_error(chunk: &str, msg: &str) -> PngError {
    PngError::Format(format!("{}: {}", chunk, msg))
}

pub(crate) fn parse_ihdr(data: &[u8], limits: &Limits) -> PngResult<ImageHeader> {
    if data.len() != 13 {
        return Err(chunk_error("IHDR", "invalid length"));
    }

    let width = data.u32_at(0)?;
    let height = data.u32_at(4)?;
    let bit_depth = data.u8_at(8)?;
    let color_type = data.u8_at(9)?;
    let compression_method = data.u8_at(10)?;
    let filter_method = data.u8_at(11)?;
    let interlace_method = data.u8_at(12)?;

    if width == 0 || height == 0 {
        return Err(PngError::Format(format!("Invalid image dimensions: {}x{}", width, height)));
    }

    if width > PNG_UINT_31_MAX || height > PNG_UINT_31_MAX {
        return Err(PngError::Format("Image dimensions out of range".to_string()));
    }

    if width > limits.max_width {
        return Err(PngError::Format(format!("Image width {} exceeds user limit", width)));
    }

    if height > limits.max_height {
        return Err(PngError::Format(format!("Image height {} exceeds user limit", height)));
    }

    let color_type = ColorType::from_u8(color_type)
        .ok_or_else(|| PngError::Format(format!("Invalid color type: {}", color_type)))?;

    if !color_type.is_valid_bit_depth(bit_depth) {
        return Err(PngError::Format(format!(
            "Invalid bit depth {} for color type {:?}",
            bit_depth, color_type
        )));
    }

    if compression_method != 0 {
        return Err(PngError::Format(format!("Unknown compression method: {}", compression_method)));
    }

    if filter_method != 0 {
        return Err(PngError::Format(format!("Unknown filter method: {}", filter_method)));
    }

    let interlaced = match interlace_method {
        0 => false,
        1 => true,
        _ => return Err(PngError::Format(format!("Unknown interlace method: {}", interlace_method))),
    };

    let header = ImageHeader {
        width,
        height,
        bit_depth,
        color_type,
        interlaced,
    };

    if header.pixel_depth() > limits.max_pixel_depth {
        return Err(PngError::Overflow(format!(
            "pixel depth {} exceeds the maximum of {}",
            header.pixel_depth(),
            limits.max_pixel_depth
        )));
    }

    // One spare byte for the filter type, plus headroom for transformations.
    header
        .row_bytes()
        .and_then(|bytes| bytes.checked_add(1))
        .and_then(|bytes| bytes.checked_mul(2))
        .ok_or_else(|| PngError::Overflow("Image width is too large for this architecture".to_string()))?;

    Ok(header)
}

pub(crate) fn parse_plte(data: &[u8], header: &ImageHeader) -> PngResult<Vec<[u8; 3]>> {
    if data.len() % 3 != 0 {
        return Err(chunk_error("PLTE", "invalid length"));
    }

    let entries = data.len() / 3;
    let max_entries = if header.color_type == ColorType::Indexed {
        1usize << header.bit_depth
    } else {
        256
    };

    if entries == 0 || entries > 256 {
        return Err(chunk_error("PLTE", "invalid number of entries"));
    }

    if entries > max_entries {
        return Err(chunk_error("PLTE", "too many entries for bit depth"));
    }

    Ok(data.chunks_exact(3).map(|rgb| [rgb[0], rgb[1], rgb[2]]).collect())
}

/// Parses a supported ancillary chunk into `info`. Errors are local to the
/// chunk; the caller reports them and moves on.
pub(crate) fn read_ancillary(chunk: PngChunk, data: &[u8], info: &mut PngInfo, limits: &Limits) -> PngResult<()> {
    match chunk {
        PngChunk::GAMA => read_gama(data, info),
        PngChunk::CHRM => read_chrm(data, info),
        PngChunk::SRGB => read_srgb(data, info),
        PngChunk::TRNS => read_trns(data, info),
        PngChunk::BKGD => read_bkgd(data, info),
        PngChunk::PHYS => read_phys(data, info),
        PngChunk::SBIT => read_sbit(data, info),
        PngChunk::HIST => read_hist(data, info),
        PngChunk::TIME => read_time(data, info),
        PngChunk::TEXT => read_text(data, info),
        PngChunk::ZTXT => read_ztxt(data, info, limits.max_chunk_size as u64),
        PngChunk::ITXT => read_itxt(data, info, limits.max_chunk_size as u64),
        PngChunk::IHDR | PngChunk::PLTE | PngChunk::IDAT | PngChunk::IEND => {
            Err(PngError::Internal(format!("{:?} is not an ancillary chunk", chunk)))
        }
    }
}

fn read_gama(data: &[u8], info: &mut PngInfo) -> PngResult<()> {
    if info.gamma.is_some() {
        return Err(chunk_error("gAMA", "duplicate"));
    }

    if data.len() != 4 {
        return Err(chunk_error("gAMA", "invalid length"));
    }

    let gamma_int = data.u32_at(0)?;
    if gamma_int == 0 || gamma_int > PNG_UINT_31_MAX {
        return Err(chunk_error("gAMA", "invalid"));
    }

    info.gamma = Some(gamma_int as f32 / 100000.0);

    Ok(())
}

fn read_chrm(data: &[u8], info: &mut PngInfo) -> PngResult<()> {
    if info.chromaticities.is_some() {
        return Err(chunk_error("cHRM", "duplicate"));
    }

    if data.len() != 32 {
        return Err(chunk_error("cHRM", "invalid length"));
    }

    let value = |index: usize| -> PngResult<f32> { Ok(data.u32_at(index * 4)? as f32 / 100000.0) };

    info.chromaticities = Some(Chromaticities {
        white_point_x: value(0)?,
        white_point_y: value(1)?,
        red_x: value(2)?,
        red_y: value(3)?,
        green_x: value(4)?,
        green_y: value(5)?,
        blue_x: value(6)?,
        blue_y: value(7)?,
    });

    Ok(())
}

fn read_srgb(data: &[u8], info: &mut PngInfo) -> PngResult<()> {
    if info.rendering_intent.is_some() {
        return Err(chunk_error("sRGB", "duplicate"));
    }

    if data.len() != 1 {
        return Err(chunk_error("sRGB", "invalid length"));
    }

    let intent = match data.u8_at(0)? {
        0 => RenderingIntent::Perceptual,
        1 => RenderingIntent::RelativeColorimetric,
        2 => RenderingIntent::Saturation,
        3 => RenderingIntent::AbsoluteColorimetric,
        n => return Err(PngError::Format(format!("sRGB: invalid rendering intent {}", n))),
    };

    info.rendering_intent = Some(intent);

    Ok(())
}

fn read_trns(data: &[u8], info: &mut PngInfo) -> PngResult<()> {
    if info.transparency.is_some() {
        return Err(chunk_error("tRNS", "duplicate"));
    }

    let trns_data = match info.header.color_type {
        ColorType::Grayscale => {
            if data.len() != 2 {
                return Err(chunk_error("tRNS", "invalid length for grayscale"));
            }

            TransparencyData::Grayscale(data.u16_at(0)?)
        }
        ColorType::RGB => {
            if data.len() != 6 {
                return Err(chunk_error("tRNS", "invalid length for RGB"));
            }

            TransparencyData::RGB(data.u16_at(0)?, data.u16_at(2)?, data.u16_at(4)?)
        }
        ColorType::Indexed => {
            let palette_len = match &info.palette {
                Some(palette) => palette.len(),
                None => return Err(chunk_error("tRNS", "missing PLTE")),
            };

            if data.is_empty() || data.len() > palette_len {
                return Err(chunk_error("tRNS", "invalid length for palette"));
            }

            TransparencyData::Palette(data.to_vec())
        }
        ColorType::GrayscaleAlpha | ColorType::RGBA => {
            return Err(chunk_error("tRNS", "invalid with alpha channel"));
        }
    };

    info.transparency = Some(trns_data);

    Ok(())
}

fn read_bkgd(data: &[u8], info: &mut PngInfo) -> PngResult<()> {
    if info.background.is_some() {
        return Err(chunk_error("bKGD", "duplicate"));
    }

    let background = match info.header.color_type {
        ColorType::Grayscale | ColorType::GrayscaleAlpha => {
            if data.len() != 2 {
                return Err(chunk_error("bKGD", "invalid length for grayscale"));
            }

            BackgroundData::Grayscale(data.u16_at(0)?)
        }
        ColorType::RGB | ColorType::RGBA => {
            if data.len() != 6 {
                return Err(chunk_error("bKGD", "invalid length for RGB"));
            }

            BackgroundData::RGB(data.u16_at(0)?, data.u16_at(2)?, data.u16_at(4)?)
        }
        ColorType::Indexed => {
            if data.len() != 1 {
                return Err(chunk_error("bKGD", "invalid length for indexed color"));
            }

            let index = data.u8_at(0)?;
            match &info.palette {
                Some(palette) if (index as usize) < palette.len() => {}
                Some(_) => return Err(chunk_error("bKGD", "invalid index")),
                None => return Err(chunk_error("bKGD", "missing PLTE")),
            }

            BackgroundData::PaletteIndex(index)
        }
    };

    info.background = Some(background);

    Ok(())
}

fn read_phys(data: &[u8], info: &mut PngInfo) -> PngResult<()> {
    if info.physical_dimensions.is_some() {
        return Err(chunk_error("pHYs", "duplicate"));
    }

    if data.len() != 9 {
        return Err(chunk_error("pHYs", "invalid length"));
    }

    let unit = match data.u8_at(8)? {
        1 => PhysicalUnit::Meter,
        _ => PhysicalUnit::Unknown,
    };

    info.physical_dimensions = Some(PhysicalDimensions {
        pixels_per_unit_x: data.u32_at(0)?,
        pixels_per_unit_y: data.u32_at(4)?,
        unit,
    });

    Ok(())
}

fn read_sbit(data: &[u8], info: &mut PngInfo) -> PngResult<()> {
    if info.significant_bits.is_some() {
        return Err(chunk_error("sBIT", "duplicate"));
    }

    let color_type = info.header.color_type;
    let expected = if color_type == ColorType::Indexed { 3 } else { color_type.channels() as usize };

    if data.len() != expected {
        return Err(chunk_error("sBIT", "invalid length"));
    }

    let sample_depth = if color_type == ColorType::Indexed { 8 } else { info.header.bit_depth };
    if data.iter().any(|&bits| bits == 0 || bits > sample_depth) {
        return Err(chunk_error("sBIT", "invalid"));
    }

    let sbit_data = match color_type {
        ColorType::Grayscale => SignificantBits::Grayscale { gray: data[0] },
        ColorType::RGB => SignificantBits::RGB {
            red: data[0],
            green: data[1],
            blue: data[2],
        },
        ColorType::Indexed => SignificantBits::Indexed {
            red: data[0],
            green: data[1],
            blue: data[2],
        },
        ColorType::GrayscaleAlpha => SignificantBits::GrayscaleAlpha {
            gray: data[0],
            alpha: data[1],
        },
        ColorType::RGBA => SignificantBits::RGBA {
            red: data[0],
            green: data[1],
            blue: data[2],
            alpha: data[3],
        },
    };

    info.significant_bits = Some(sbit_data);

    Ok(())
}

fn read_hist(data: &[u8], info: &mut PngInfo) -> PngResult<()> {
    if info.histogram.is_some() {
        return Err(chunk_error("hIST", "duplicate"));
    }

    let palette_len = match &info.palette {
        Some(palette) => palette.len(),
        None => return Err(chunk_error("hIST", "missing PLTE")),
    };

    if data.len() != palette_len * 2 {
        return Err(chunk_error("hIST", "invalid length"));
    }

    let frequencies = data
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();

    info.histogram = Some(frequencies);

    Ok(())
}

fn read_time(data: &[u8], info: &mut PngInfo) -> PngResult<()> {
    if info.modification_time.is_some() {
        return Err(chunk_error("tIME", "duplicate"));
    }

    if data.len() != 7 {
        return Err(chunk_error("tIME", "invalid length"));
    }

    let year = data.u16_at(0)?;
    let month = data.u8_at(2)?;
    let day = data.u8_at(3)?;
    let hour = data.u8_at(4)?;
    let minute = data.u8_at(5)?;
    let second = data.u8_at(6)?;

    if !(1..=12).contains(&month) {
        log_warn!("Invalid month in tIME chunk: {}", month);
    }

    if !(1..=31).contains(&day) {
        log_warn!("Invalid day in tIME chunk: {}", day);
    }

    if hour > 23 {
        log_warn!("Invalid hour in tIME chunk: {}", hour);
    }

    if minute > 59 {
        log_warn!("Invalid minute in tIME chunk: {}", minute);
    }

    if second > 60 {
        log_warn!("Invalid second in tIME chunk: {}", second);
    }

    info.modification_time = Some(ImageTime {
        year,
        month,
        day,
        hour,
        minute,
        second,
    });

    Ok(())
}

/// Splits a null-terminated keyword off the front of `data`.
fn split_keyword<'a>(chunk: &str, data: &'a [u8]) -> PngResult<(String, &'a [u8])> {
    let end = data
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| chunk_error(chunk, "missing keyword terminator"))?;

    if end == 0 || end > MAX_KEYWORD_LENGTH {
        return Err(chunk_error(chunk, "bad keyword"));
    }

    Ok((latin1(&data[..end]), &data[end + 1..]))
}

fn split_null<'a>(chunk: &str, data: &'a [u8]) -> PngResult<(&'a [u8], &'a [u8])> {
    let end = data
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| chunk_error(chunk, "truncated"))?;

    Ok((&data[..end], &data[end + 1..]))
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

fn inflate_text(chunk: &str, compressed: &[u8], limit: u64) -> PngResult<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(compressed).take(limit + 1);
    let mut text_bytes = Vec::new();

    decoder
        .read_to_end(&mut text_bytes)
        .map_err(|e| PngError::Decompression(format!("{}: {}", chunk, e)))?;

    if text_bytes.len() as u64 > limit {
        return Err(chunk_error(chunk, "decompressed text too large"));
    }

    Ok(text_bytes)
}

fn read_text(data: &[u8], info: &mut PngInfo) -> PngResult<()> {
    let (keyword, text) = split_keyword("tEXt", data)?;

    info.text_chunks.push(PngText::Basic {
        keyword,
        text: latin1(text),
    });

    Ok(())
}

fn read_ztxt(data: &[u8], info: &mut PngInfo, limit: u64) -> PngResult<()> {
    let (keyword, rest) = split_keyword("zTXt", data)?;

    let compression_method = rest.u8_at(0)?;
    if compression_method != 0 {
        return Err(PngError::Format(format!(
            "zTXt: unknown compression method {}",
            compression_method
        )));
    }

    let text_bytes = inflate_text("zTXt", &rest[1..], limit)?;

    info.text_chunks.push(PngText::Compressed {
        keyword,
        text: latin1(&text_bytes),
    });

    Ok(())
}

fn read_itxt(data: &[u8], info: &mut PngInfo, limit: u64) -> PngResult<()> {
    let (keyword, rest) = split_keyword("iTXt", data)?;

    let compression_flag = rest.u8_at(0)?;
    let compression_method = rest.u8_at(1)?;
    let (language_tag, rest) = split_null("iTXt", &rest[2..])?;
    let (translated_keyword, text_bytes) = split_null("iTXt", rest)?;

    let text = match compression_flag {
        0 => String::from_utf8_lossy(text_bytes).to_string(),
        1 => {
            if compression_method != 0 {
                return Err(PngError::Format(format!(
                    "iTXt: unknown compression method {}",
                    compression_method
                )));
            }

            String::from_utf8_lossy(&inflate_text("iTXt", text_bytes, limit)?).to_string()
        }
        _ => return Err(chunk_error("iTXt", "invalid compression flag")),
    };

    info.text_chunks.push(PngText::International {
        keyword,
        language_tag: String::from_utf8_lossy(language_tag).to_string(),
        translated_keyword: String::from_utf8_lossy(translated_keyword).to_string(),
        text,
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn ihdr_bytes(width: u32, height: u32, bit_depth: u8, color_type: u8, interlace: u8) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&width.to_be_bytes());
        data.extend_from_slice(&height.to_be_bytes());
        data.extend_from_slice(&[bit_depth, color_type, 0, 0, interlace]);
        data
    }

    #[test]
    fn parses_valid_ihdr() -> Result<(), Box<dyn std::error::Error>> {
        let header = parse_ihdr(&ihdr_bytes(7, 5, 8, 6, 1), &Limits::default())?;

        assert_eq!(header.width, 7);
        assert_eq!(header.height, 5);
        assert_eq!(header.color_type, ColorType::RGBA);
        assert_eq!(header.pixel_depth(), 32);
        assert!(header.interlaced);

        Ok(())
    }

    #[test]
    fn rejects_invalid_ihdr_fields() {
        let limits = Limits::default();

        assert!(parse_ihdr(&ihdr_bytes(0, 5, 8, 0, 0), &limits).is_err());
        assert!(parse_ihdr(&ihdr_bytes(5, 5, 16, 3, 0), &limits).is_err());
        assert!(parse_ihdr(&ihdr_bytes(5, 5, 8, 1, 0), &limits).is_err());
        assert!(parse_ihdr(&ihdr_bytes(5, 5, 8, 0, 2), &limits).is_err());
        assert!(parse_ihdr(&ihdr_bytes(2_000_000, 5, 8, 0, 0), &limits).is_err());
        assert!(parse_ihdr(&ihdr_bytes(5, 5, 8, 0, 0)[..12], &limits).is_err());
    }

    #[test]
    fn pixel_depth_over_limit_is_an_overflow() {
        let limits = Limits {
            max_pixel_depth: 24,
            ..Limits::default()
        };

        let result = parse_ihdr(&ihdr_bytes(5, 5, 8, 6, 0), &limits);
        assert!(matches!(result, Err(PngError::Overflow(_))));
    }

    #[test]
    fn palette_size_is_bounded_by_bit_depth() {
        let header = ImageHeader {
            width: 1,
            height: 1,
            bit_depth: 1,
            color_type: ColorType::Indexed,
            interlaced: false,
        };

        assert_eq!(parse_plte(&[1, 2, 3, 4, 5, 6], &header).map(|p| p.len()), Ok(2));
        assert!(parse_plte(&[0; 9], &header).is_err());
        assert!(parse_plte(&[0; 4], &header).is_err());
        assert!(parse_plte(&[], &header).is_err());
    }

    #[test]
    fn reads_text_chunks() -> Result<(), Box<dyn std::error::Error>> {
        let mut info = PngInfo::default();
        let limits = Limits::default();

        read_ancillary(PngChunk::TEXT, b"Title\0Hello", &mut info, &limits)?;

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"compressed words")?;
        let mut ztxt = b"Comment\0\0".to_vec();
        ztxt.extend(encoder.finish()?);
        read_ancillary(PngChunk::ZTXT, &ztxt, &mut info, &limits)?;

        read_ancillary(PngChunk::ITXT, b"Author\0\0\0en\0Autor\0Jos\xc3\xa9", &mut info, &limits)?;

        assert_eq!(
            info.text_chunks,
            vec![
                PngText::Basic {
                    keyword: "Title".to_string(),
                    text: "Hello".to_string()
                },
                PngText::Compressed {
                    keyword: "Comment".to_string(),
                    text: "compressed words".to_string()
                },
                PngText::International {
                    keyword: "Author".to_string(),
                    language_tag: "en".to_string(),
                    translated_keyword: "Autor".to_string(),
                    text: "José".to_string()
                },
            ]
        );

        Ok(())
    }

    #[test]
    fn rejects_bad_keywords() {
        let mut info = PngInfo::default();
        let limits = Limits::default();

        assert!(read_ancillary(PngChunk::TEXT, b"\0text", &mut info, &limits).is_err());
        assert!(read_ancillary(PngChunk::TEXT, b"no terminator", &mut info, &limits).is_err());
        assert!(info.text_chunks.is_empty());
    }

    #[test]
    fn duplicate_gamma_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let mut info = PngInfo::default();
        let limits = Limits::default();

        read_ancillary(PngChunk::GAMA, &45455u32.to_be_bytes(), &mut info, &limits)?;
        assert!(read_ancillary(PngChunk::GAMA, &100000u32.to_be_bytes(), &mut info, &limits).is_err());
        assert_eq!(info.gamma, Some(0.45455));

        Ok(())
    }

    #[test]
    fn palette_dependent_chunks_need_plte() -> Result<(), Box<dyn std::error::Error>> {
        let mut info = PngInfo::default();
        info.header.color_type = ColorType::Indexed;
        info.header.bit_depth = 8;
        let limits = Limits::default();

        assert!(read_ancillary(PngChunk::TRNS, &[0, 128], &mut info, &limits).is_err());
        assert!(read_ancillary(PngChunk::HIST, &[0, 1, 0, 2], &mut info, &limits).is_err());

        info.palette = Some(vec![[0, 0, 0], [255, 255, 255]]);
        read_ancillary(PngChunk::TRNS, &[0, 128], &mut info, &limits)?;
        read_ancillary(PngChunk::HIST, &[0, 1, 0, 2], &mut info, &limits)?;
        assert!(read_ancillary(PngChunk::BKGD, &[2], &mut info, &limits).is_err());

        assert_eq!(info.transparency, Some(TransparencyData::Palette(vec![0, 128])));
        assert_eq!(info.histogram, Some(vec![1, 2]));

        Ok(())
    }

    #[test]
    fn reads_time_and_physical_dimensions() -> Result<(), Box<dyn std::error::Error>> {
        let mut info = PngInfo::default();
        let limits = Limits::default();

        read_ancillary(PngChunk::TIME, &[0x07, 0xE8, 2, 29, 12, 30, 0], &mut info, &limits)?;
        read_ancillary(PngChunk::PHYS, &[0, 0, 0x0B, 0x13, 0, 0, 0x0B, 0x13, 1], &mut info, &limits)?;

        assert_eq!(info.modification_time.as_ref().map(|t| (t.year, t.month, t.day)), Some((2024, 2, 29)));
        assert_eq!(
            info.physical_dimensions,
            Some(PhysicalDimensions {
                pixels_per_unit_x: 2835,
                pixels_per_unit_y: 2835,
                unit: PhysicalUnit::Meter,
            })
        );

        Ok(())
    }
}
