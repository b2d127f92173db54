use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use pushpng::{
    PngError, PngInfo, PngResult, PngWarning, Processed, ProgressiveHandler, PushDecoder, UnknownChunk, ADAM7_PASSES,
};

pub const SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Everything a decoder reported, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Info { width: u32, height: u32 },
    Row { row: Option<Vec<u8>>, index: u32, pass: u8 },
    End,
    Warning(PngWarning),
    Error(PngError),
}

#[derive(Debug, Default)]
pub struct Recorder {
    pub events: Vec<Event>,
    pub info: Option<PngInfo>,
    pub claim_unknown: bool,
    pub pause_after_rows: Option<pushpng::Pause>,
    pub row_seen: bool,
}

impl Recorder {
    pub fn rows(&self) -> Vec<(Option<Vec<u8>>, u32, u8)> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Row { row, index, pass } => Some((row.clone(), *index, *pass)),
                _ => None,
            })
            .collect()
    }

    pub fn warnings(&self) -> Vec<PngWarning> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Warning(warning) => Some(warning.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> usize {
        self.events.iter().filter(|event| matches!(event, Event::Error(_))).count()
    }

    pub fn saw_info(&self) -> bool {
        self.events.iter().any(|event| matches!(event, Event::Info { .. }))
    }

    pub fn saw_end(&self) -> bool {
        self.events.contains(&Event::End)
    }
}

impl ProgressiveHandler for Recorder {
    fn on_info(&mut self, info: &PngInfo) {
        self.info = Some(info.clone());
        self.events.push(Event::Info {
            width: info.width(),
            height: info.height(),
        });
    }

    fn on_row(&mut self, row: Option<&[u8]>, row_index: u32, pass: u8) {
        self.row_seen = true;
        self.events.push(Event::Row {
            row: row.map(|r| r.to_vec()),
            index: row_index,
            pass,
        });
    }

    fn on_end(&mut self, info: &PngInfo) {
        self.info = Some(info.clone());
        self.events.push(Event::End);
    }

    fn on_warning(&mut self, warning: &PngWarning) {
        self.events.push(Event::Warning(warning.clone()));
    }

    fn on_error(&mut self, error: &PngError) {
        self.events.push(Event::Error(error.clone()));
    }

    fn unknown_chunk(&mut self, _chunk: &UnknownChunk) -> bool {
        self.claim_unknown
    }

    fn poll_pause(&mut self) -> Option<pushpng::Pause> {
        if std::mem::take(&mut self.row_seen) {
            self.pause_after_rows
        } else {
            None
        }
    }
}

/// Feeds `data` in pieces of `piece` bytes, re-feeding whatever a pause left
/// to the caller. Returns the number of pauses.
pub fn feed<H: ProgressiveHandler>(decoder: &mut PushDecoder<H>, data: &[u8], piece: usize) -> PngResult<usize> {
    let mut pauses = 0;

    for chunk in data.chunks(piece.max(1)) {
        let mut pending = chunk;
        loop {
            match decoder.process(pending)? {
                Processed::Consumed => break,
                Processed::Paused { dropped } => {
                    pauses += 1;
                    pending = &pending[pending.len() - dropped..];
                }
            }
        }
    }

    Ok(pauses)
}

pub fn decode_with(config: pushpng::DecoderConfig, data: &[u8], piece: usize) -> (Recorder, PngResult<usize>) {
    let mut decoder = PushDecoder::with_config(Recorder::default(), config);
    let result = feed(&mut decoder, data, piece);
    (decoder.into_handler(), result)
}

pub fn decode(data: &[u8], piece: usize) -> (Recorder, PngResult<usize>) {
    decode_with(pushpng::DecoderConfig::default(), data, piece)
}

pub fn chunk(chunk_type: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);

    let mut out = Vec::with_capacity(data.len() + 12);
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(chunk_type);
    out.extend_from_slice(data);
    out.extend_from_slice(&hasher.finalize().to_be_bytes());
    out
}

pub fn ihdr(width: u32, height: u32, bit_depth: u8, color_type: u8, interlace: u8) -> Vec<u8> {
    let mut data = Vec::with_capacity(13);
    data.extend_from_slice(&width.to_be_bytes());
    data.extend_from_slice(&height.to_be_bytes());
    data.extend_from_slice(&[bit_depth, color_type, 0, 0, interlace]);
    chunk(b"IHDR", &data)
}

pub fn iend() -> Vec<u8> {
    chunk(b"IEND", &[])
}

pub fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).expect("in-memory write");
    encoder.finish().expect("in-memory write")
}

/// Splits a compressed stream over IDAT chunks of at most `size` bytes.
pub fn idats(compressed: &[u8], size: usize) -> Vec<u8> {
    compressed.chunks(size.max(1)).flat_map(|piece| chunk(b"IDAT", piece)).collect()
}

pub fn png(chunks: &[Vec<u8>]) -> Vec<u8> {
    let mut out = SIGNATURE.to_vec();
    for c in chunks {
        out.extend_from_slice(c);
    }
    out
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let p = a as i16 + b as i16 - c as i16;
    let pa = (p - a as i16).abs();
    let pb = (p - b as i16).abs();
    let pc = (p - c as i16).abs();

    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

/// Applies filter `filter` to an unfiltered row and prefixes the filter byte.
pub fn filter_row(filter: u8, bpp: usize, row: &[u8], prior: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(row.len() + 1);
    out.push(filter);

    for i in 0..row.len() {
        let a = if i >= bpp { row[i - bpp] } else { 0 };
        let b = prior[i];
        let c = if i >= bpp { prior[i - bpp] } else { 0 };

        let predicted = match filter {
            0 => 0,
            1 => a,
            2 => b,
            3 => ((a as u16 + b as u16) / 2) as u8,
            4 => paeth(a, b, c),
            _ => panic!("unknown filter {}", filter),
        };

        out.push(row[i].wrapping_sub(predicted));
    }

    out
}

/// A raw image: packed rows at `pixel_depth` bits per pixel.
#[derive(Debug, Clone)]
pub struct TestImage {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: u8,
    pub rows: Vec<Vec<u8>>,
}

fn channels(color_type: u8) -> usize {
    match color_type {
        2 => 3,
        4 => 2,
        6 => 4,
        _ => 1,
    }
}

fn get_bits(row: &[u8], x: usize, depth: usize) -> u8 {
    let bit = x * depth;
    let shift = 8 - depth - bit % 8;
    (row[bit / 8] >> shift) & (((1u16 << depth) - 1) as u8)
}

fn set_bits(row: &mut [u8], x: usize, depth: usize, value: u8) {
    let bit = x * depth;
    let shift = 8 - depth - bit % 8;
    let mask = (((1u16 << depth) - 1) as u8) << shift;
    row[bit / 8] = (row[bit / 8] & !mask) | ((value << shift) & mask);
}

impl TestImage {
    /// An image whose samples follow a simple pattern of `seed`.
    pub fn pattern(width: u32, height: u32, bit_depth: u8, color_type: u8, seed: u32) -> Self {
        let depth = bit_depth as usize * channels(color_type);
        let row_len = (width as usize * depth).div_ceil(8);
        let mut rows = Vec::new();

        for y in 0..height {
            let mut row = vec![0u8; row_len];
            if depth >= 8 {
                for (i, byte) in row.iter_mut().enumerate() {
                    *byte = ((i as u32 * 31 + y * 17 + seed * 7) % 251) as u8;
                }
            } else {
                let max = (1u32 << depth) - 1;
                for x in 0..width as usize {
                    let value = ((x as u32 * 3 + y * 5 + seed) % (max + 1)) as u8;
                    set_bits(&mut row, x, depth, value);
                }
            }
            rows.push(row);
        }

        Self {
            width,
            height,
            bit_depth,
            color_type,
            rows,
        }
    }

    pub fn pixel_depth(&self) -> usize {
        self.bit_depth as usize * channels(self.color_type)
    }

    pub fn row_bytes(&self, width: u32) -> usize {
        (width as usize * self.pixel_depth()).div_ceil(8)
    }

    fn copy_pixel(&self, src: &[u8], src_x: usize, dst: &mut [u8], dst_x: usize) {
        let depth = self.pixel_depth();
        if depth >= 8 {
            let bytes = depth / 8;
            dst[dst_x * bytes..(dst_x + 1) * bytes].copy_from_slice(&src[src_x * bytes..(src_x + 1) * bytes]);
        } else {
            set_bits(dst, dst_x, depth, get_bits(src, src_x, depth));
        }
    }

    /// The pass image of Adam7 pass `pass` as packed rows.
    pub fn pass_rows(&self, pass: usize) -> Vec<Vec<u8>> {
        let info = &ADAM7_PASSES[pass];
        let width = info.width(self.width);
        let mut rows = Vec::new();

        if width == 0 {
            return rows;
        }

        for k in 0..info.rows(self.height) {
            let y = info.image_row(k) as usize;
            let mut row = vec![0u8; self.row_bytes(width)];
            for c in 0..width as usize {
                let x = info.col_offset as usize + c * info.col_stride as usize;
                self.copy_pixel(&self.rows[y], x, &mut row, c);
            }
            rows.push(row);
        }

        rows
    }

    /// Filtered scanlines for the whole image. `filter` picks the filter of
    /// every scanline from its sequence number.
    pub fn scanlines(&self, interlaced: bool, filter: impl Fn(usize) -> u8) -> Vec<u8> {
        let bpp = self.pixel_depth().div_ceil(8);
        let mut out = Vec::new();
        let mut sequence = 0;

        let mut emit = |rows: &[Vec<u8>], out: &mut Vec<u8>| {
            let mut prior = vec![0u8; rows.first().map_or(0, |r| r.len())];
            for row in rows {
                out.extend(filter_row(filter(sequence), bpp, row, &prior));
                prior = row.clone();
                sequence += 1;
            }
        };

        if interlaced {
            for pass in 0..7 {
                emit(&self.pass_rows(pass), &mut out);
            }
        } else {
            emit(&self.rows, &mut out);
        }

        out
    }

    pub fn ihdr(&self, interlaced: bool) -> Vec<u8> {
        ihdr(self.width, self.height, self.bit_depth, self.color_type, interlaced as u8)
    }

    /// A complete PNG of this image with IDAT payloads of `idat_size` bytes.
    pub fn encode(&self, interlaced: bool, idat_size: usize) -> Vec<u8> {
        let compressed = zlib(&self.scanlines(interlaced, |i| (i % 5) as u8));
        png(&[self.ihdr(interlaced), idats(&compressed, idat_size), iend()])
    }
}
