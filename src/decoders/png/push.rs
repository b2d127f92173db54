use bitflags::bitflags;
use crc32fast::Hasher;

use crate::config::{BenignErrors, CrcAction, DecoderConfig, KeepPolicy};
use crate::decoders::png::buffer::{CarryBuffer, Input};
use crate::decoders::png::chunk::{
    chunk_limit, ChunkHeader, ChunkType, PngChunk, IDAT, IEND, IHDR, PLTE, PNG_SIGNATURE, PNG_UINT_31_MAX,
};
use crate::decoders::png::handlers::{parse_ihdr, parse_plte, read_ancillary};
use crate::decoders::png::inflate::{InflateStatus, Inflater, ZlibInflater};
use crate::decoders::png::info::{row_bytes, ChunkLocation, ColorType, PngInfo, UnknownChunk};
use crate::decoders::png::rows::RowScheduler;
use crate::decoders::png::transform::{self, RowTransforms};
use crate::utils::error::{PngError, PngResult, PngWarning, WarningKind};
use crate::{log_debug, log_error, log_info, log_warn};

/// Receives everything the decoder produces. All methods default to doing
/// nothing, so an implementation only overrides what it needs.
pub trait ProgressiveHandler {
    /// Called once, when the first image data chunk arrives.
    fn on_info(&mut self, _info: &PngInfo) {}

    /// Called for every row notification. `row` is `None` for placeholder
    /// rows emitted while expanding interlaced images. `row_index` is the
    /// absolute image row.
    fn on_row(&mut self, _row: Option<&[u8]>, _row_index: u32, _pass: u8) {}

    fn on_end(&mut self, _info: &PngInfo) {}

    fn on_warning(&mut self, _warning: &PngWarning) {}

    fn on_error(&mut self, _error: &PngError) {}

    /// Offered every chunk without a built-in handler before the keep
    /// policy is applied. Returning true marks the chunk as handled.
    fn unknown_chunk(&mut self, _chunk: &UnknownChunk) -> bool {
        false
    }

    /// Polled after every atomic unit of input. Returning a pause request
    /// makes the current `process` call return early.
    fn poll_pause(&mut self) -> Option<Pause> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pause {
    /// Keep the unread input in the decoder's buffer.
    Save,
    /// Leave the unread input to the caller, who must feed it again.
    Discard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Processed {
    /// Everything usable was consumed; more input is needed to go on.
    Consumed,
    /// The handler asked for a pause. `dropped` bytes at the end of the
    /// caller's buffer were not consumed and must be fed again.
    Paused { dropped: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Signature,
    ChunkHeader,
    ChunkBody,
    ImageData,
    Done,
    Error,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct SessionFlags: u8 {
        const HAVE_IHDR = 0x01;
        const HAVE_PLTE = 0x02;
        const HAVE_IDAT = 0x04;
        const AFTER_IDAT = 0x08;
        const HAVE_IEND = 0x10;
    }
}

/// What happens to the payload of the chunk being read.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Body {
    Ihdr,
    Plte,
    Iend,
    Ancillary(PngChunk),
    Unknown,
    Skip,
}

#[derive(Debug, Clone, Copy)]
struct ChunkState {
    header: ChunkHeader,
    body: Body,
    // Payload bytes still to be skipped. Only used by `Body::Skip`.
    remaining: u32,
}

/// Push-mode PNG decoder. Bytes are fed with [`PushDecoder::process`] in
/// pieces of any size and results are reported to the handler as soon as
/// they are available.
pub struct PushDecoder<H: ProgressiveHandler, Z: Inflater = ZlibInflater> {
    handler: H,
    config: DecoderConfig,
    inflater: Z,
    carry: CarryBuffer,
    mode: Mode,
    signature: [u8; 8],
    signature_bytes: usize,
    chunk: Option<ChunkState>,
    crc: Hasher,
    idat_remaining: u32,
    flags: SessionFlags,
    stream_ended: bool,
    extra_data_reported: bool,
    pending_pause: Option<Pause>,
    info: PngInfo,
    rows: Option<RowScheduler>,
    error: Option<PngError>,
}

impl<H: ProgressiveHandler> PushDecoder<H> {
    pub fn new(handler: H) -> Self {
        Self::with_config(handler, DecoderConfig::default())
    }

    pub fn with_config(handler: H, config: DecoderConfig) -> Self {
        Self::with_inflater(handler, config, ZlibInflater::new())
    }
}

impl<H: ProgressiveHandler, Z: Inflater> PushDecoder<H, Z> {
    pub fn with_inflater(handler: H, config: DecoderConfig, inflater: Z) -> Self {
        Self {
            handler,
            config,
            inflater,
            carry: CarryBuffer::default(),
            mode: Mode::Signature,
            signature: [0; 8],
            signature_bytes: 0,
            chunk: None,
            crc: Hasher::new(),
            idat_remaining: 0,
            flags: SessionFlags::empty(),
            stream_ended: false,
            extra_data_reported: false,
            pending_pause: None,
            info: PngInfo::default(),
            rows: None,
            error: None,
        }
    }

    pub fn info(&self) -> &PngInfo {
        &self.info
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn into_handler(self) -> H {
        self.handler
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_finished(&self) -> bool {
        self.mode == Mode::Done
    }

    /// Bytes held over from earlier calls.
    pub fn buffered_len(&self) -> usize {
        self.carry.len()
    }

    /// Feeds the next piece of the stream. Every complete unit available is
    /// decoded before the call returns; an incomplete tail is kept for the
    /// next call.
    ///
    /// A fatal error puts the session in the error mode. The handler's
    /// `on_error` sees it once, and every later call returns it again without
    /// looking at its input.
    pub fn process(&mut self, data: &[u8]) -> PngResult<Processed> {
        if let Some(error) = &self.error {
            return Err(error.clone());
        }

        let mut input = Input::new(std::mem::take(&mut self.carry), data);
        let result = self.run(&mut input);
        self.carry = input.finish();

        result.map_err(|error| {
            self.fail(error.clone());
            error
        })
    }

    /// Pauses between calls. Without `discard` the buffered input is kept
    /// and 0 is returned. With `discard` the buffer is released and its
    /// length returned: that many bytes from the end of everything fed so far
    /// must be fed again before decoding can go on.
    ///
    /// A pause during a call is requested through
    /// [`ProgressiveHandler::poll_pause`].
    pub fn pause(&mut self, discard: bool) -> usize {
        if !discard {
            log_debug!("paused, {} bytes kept", self.carry.len());
            return 0;
        }

        let dropped = self.carry.len();
        self.carry.clear();
        log_debug!("paused, {} buffered bytes left to the caller", dropped);

        dropped
    }

    fn fail(&mut self, error: PngError) {
        log_error!("{}", error);
        self.mode = Mode::Error;
        self.carry.clear();
        self.handler.on_error(&error);
        self.error = Some(error);
    }

    fn run(&mut self, input: &mut Input) -> PngResult<Processed> {
        while input.has_more() {
            match self.mode {
                Mode::Signature => self.read_signature(input)?,
                Mode::ChunkHeader => self.read_chunk_header(input)?,
                Mode::ChunkBody => self.read_chunk_body(input)?,
                Mode::ImageData => self.read_image_data(input)?,
                Mode::Done | Mode::Error => {
                    input.discard_all();
                    break;
                }
            }

            let pause = match self.pending_pause.take() {
                Some(pause) => Some(pause),
                None => self.handler.poll_pause(),
            };

            if let Some(pause) = pause {
                let dropped = input.pause(pause == Pause::Discard)?;
                log_debug!("paused, {} bytes left to the caller", dropped);
                return Ok(Processed::Paused { dropped });
            }
        }

        Ok(Processed::Consumed)
    }

    fn warn(&mut self, warning: PngWarning) {
        log_warn!("{}", warning);
        self.handler.on_warning(&warning);
    }

    /// Single policy point for anomalies that are either warnings or errors
    /// depending on configuration.
    fn benign(&mut self, warning: PngWarning) -> PngResult<()> {
        match self.config.benign_errors {
            BenignErrors::Warn => {
                self.warn(warning);
                Ok(())
            }
            BenignErrors::Error => Err(warning.into_error()),
        }
    }

    fn read_signature(&mut self, input: &mut Input) -> PngResult<()> {
        let start = self.signature_bytes;
        let count = (PNG_SIGNATURE.len() - start).min(input.available());

        input.fill(&mut self.signature[start..start + count])?;
        self.signature_bytes += count;

        if let Some(index) = (start..self.signature_bytes).find(|&i| self.signature[i] != PNG_SIGNATURE[i]) {
            return Err(PngError::InvalidSignature {
                ascii_corruption: index >= 4,
            });
        }

        if self.signature_bytes == PNG_SIGNATURE.len() {
            log_debug!("signature verified");
            self.mode = Mode::ChunkHeader;
        }

        Ok(())
    }

    fn read_chunk_header(&mut self, input: &mut Input) -> PngResult<()> {
        if input.available() < 8 {
            return input.save();
        }

        let mut raw = [0u8; 8];
        input.fill(&mut raw)?;
        let header = ChunkHeader::from_bytes(raw);
        let chunk_type = header.chunk_type;

        log_debug!("chunk {} ({} bytes)", chunk_type, header.length);

        if !chunk_type.is_valid_name() {
            return Err(PngError::Format(format!("{}: invalid chunk type", chunk_type)));
        }

        let image_header = self.flags.contains(SessionFlags::HAVE_IHDR).then_some(&self.info.header);
        let limit = chunk_limit(chunk_type, image_header, self.config.limits.max_chunk_size);
        if header.length > PNG_UINT_31_MAX || header.length > limit {
            return Err(PngError::Format(format!("{}: chunk data is too large", chunk_type)));
        }

        self.crc = Hasher::new();
        self.crc.update(&chunk_type.0);

        if chunk_type != IDAT && self.flags.contains(SessionFlags::HAVE_IDAT) {
            self.flags |= SessionFlags::AFTER_IDAT;

            if !self.stream_ended {
                self.warn(PngWarning::new(WarningKind::Truncation, "Not enough compressed data"));
                self.stream_ended = true;
            }
        }

        if chunk_type != IHDR && !self.flags.contains(SessionFlags::HAVE_IHDR) {
            return Err(PngError::Format(format!("Missing IHDR before {}", chunk_type)));
        }

        if chunk_type == IDAT {
            return self.begin_image_data(header);
        }

        let body = self.classify(header)?;
        self.chunk = Some(ChunkState {
            header,
            body,
            remaining: header.length,
        });
        self.mode = Mode::ChunkBody;

        Ok(())
    }

    /// Decides how the payload of a non-IDAT chunk will be treated, enforcing
    /// the ordering rules that can be checked from the header alone.
    fn classify(&mut self, header: ChunkHeader) -> PngResult<Body> {
        let chunk_type = header.chunk_type;

        if chunk_type == IHDR {
            if self.flags.contains(SessionFlags::HAVE_IHDR) {
                return Err(PngError::Format("IHDR: out of place".to_string()));
            }

            if header.length != 13 {
                return Err(PngError::Format("IHDR: invalid length".to_string()));
            }

            return Ok(Body::Ihdr);
        }

        if chunk_type == IEND {
            if !self.flags.contains(SessionFlags::HAVE_IDAT) {
                return Err(PngError::Format("IEND: out of place".to_string()));
            }

            return Ok(Body::Iend);
        }

        if chunk_type.is_reserved_bit_set() {
            if chunk_type.is_critical() {
                return Err(PngError::Format(format!("{}: invalid chunk type", chunk_type)));
            }

            let warning = PngWarning::new(WarningKind::InvalidChunk, format!("{}: invalid chunk type", chunk_type));
            if self.config.skip_invalid_ancillary {
                self.warn(warning);
            } else {
                self.benign(warning)?;
            }

            return Ok(Body::Skip);
        }

        if self.config.chunk_override(chunk_type).is_some() {
            return Ok(Body::Unknown);
        }

        if chunk_type == PLTE {
            return self.classify_palette();
        }

        match PngChunk::from_type(chunk_type) {
            Some(chunk) if chunk_type.is_ancillary() => {
                if chunk.must_precede_idat() && self.flags.contains(SessionFlags::HAVE_IDAT) {
                    self.warn(PngWarning::new(WarningKind::Ordering, format!("{}: out of place", chunk_type)));
                    return Ok(Body::Skip);
                }

                Ok(Body::Ancillary(chunk))
            }
            _ => Ok(Body::Unknown),
        }
    }

    fn classify_palette(&mut self) -> PngResult<Body> {
        if self.flags.contains(SessionFlags::HAVE_PLTE) {
            return Err(PngError::Format("PLTE: duplicate".to_string()));
        }

        if self.flags.contains(SessionFlags::HAVE_IDAT) {
            self.benign(PngWarning::new(WarningKind::Ordering, "PLTE: out of place"))?;
            return Ok(Body::Skip);
        }

        if !self.info.header.color_type.has_color() {
            self.benign(PngWarning::new(WarningKind::InvalidChunk, "PLTE: ignored in grayscale PNG"))?;
            return Ok(Body::Skip);
        }

        Ok(Body::Plte)
    }

    fn read_chunk_body(&mut self, input: &mut Input) -> PngResult<()> {
        let Some(mut state) = self.chunk else {
            return Err(PngError::Internal("chunk body without a chunk header".to_string()));
        };

        if state.body == Body::Skip {
            if state.remaining > 0 {
                let bytes = input.peek(state.remaining as usize);
                let count = bytes.len();
                self.crc.update(bytes);
                input.consume(count);
                state.remaining -= count as u32;
                self.chunk = Some(state);
                return Ok(());
            }

            if input.available() < 4 {
                return input.save();
            }

            let expected = read_crc(input)?;
            self.check_crc(state.header.chunk_type, expected)?;
            return self.end_chunk();
        }

        let length = state.header.length as usize;
        if input.available() < length + 4 {
            return input.save();
        }

        let mut data = vec![0u8; length];
        input.fill(&mut data)?;
        self.crc.update(&data);

        let expected = read_crc(input)?;
        if self.check_crc(state.header.chunk_type, expected)? {
            self.handle_chunk(state, data)?;
        }

        if self.mode == Mode::ChunkBody {
            self.end_chunk()?;
        }

        Ok(())
    }

    fn end_chunk(&mut self) -> PngResult<()> {
        self.chunk = None;
        self.mode = Mode::ChunkHeader;
        Ok(())
    }

    /// Compares the running CRC with the one stored after the chunk. Returns
    /// whether the chunk contents should be used.
    fn check_crc(&mut self, chunk_type: ChunkType, expected: u32) -> PngResult<bool> {
        let calculated = std::mem::take(&mut self.crc).finalize();
        if calculated == expected {
            return Ok(true);
        }

        let warning = PngWarning::new(WarningKind::Crc, format!("{}: CRC error", chunk_type));
        match self.config.crc_action(chunk_type) {
            CrcAction::Error => Err(PngError::Crc {
                chunk: chunk_type,
                expected,
                calculated,
            }),
            CrcAction::Discard if chunk_type.is_ancillary() => {
                self.warn(warning);
                Ok(false)
            }
            CrcAction::Discard | CrcAction::Use => {
                self.warn(warning);
                Ok(true)
            }
            CrcAction::Ignore => Ok(true),
        }
    }

    fn handle_chunk(&mut self, state: ChunkState, data: Vec<u8>) -> PngResult<()> {
        let chunk_type = state.header.chunk_type;

        match state.body {
            Body::Ihdr => {
                self.info.header = parse_ihdr(&data, &self.config.limits)?;
                self.flags |= SessionFlags::HAVE_IHDR;

                let header = &self.info.header;
                log_debug!(
                    "IHDR: {}x{}, {:?}, {} bit, interlaced: {}",
                    header.width,
                    header.height,
                    header.color_type,
                    header.bit_depth,
                    header.interlaced
                );
            }
            Body::Plte => match parse_plte(&data, &self.info.header) {
                Ok(palette) => {
                    log_debug!("PLTE: {} entries", palette.len());
                    self.info.palette = Some(palette);
                    self.flags |= SessionFlags::HAVE_PLTE;
                }
                Err(e) if self.info.header.color_type == ColorType::Indexed => return Err(e),
                Err(e) => self.benign(PngWarning::new(WarningKind::InvalidChunk, e.to_string()))?,
            },
            Body::Iend => self.finish_image(&data)?,
            Body::Ancillary(chunk) => {
                if let Err(e) = read_ancillary(chunk, &data, &mut self.info, &self.config.limits) {
                    self.warn(PngWarning::new(WarningKind::Ancillary, format!("{}: {}", chunk_type, e)));
                }
            }
            Body::Unknown => self.handle_unknown(chunk_type, data)?,
            Body::Skip => {}
        }

        Ok(())
    }

    fn handle_unknown(&mut self, chunk_type: ChunkType, data: Vec<u8>) -> PngResult<()> {
        let location = if self.flags.contains(SessionFlags::HAVE_IDAT) {
            ChunkLocation::AfterIdat
        } else if self.flags.contains(SessionFlags::HAVE_PLTE) {
            ChunkLocation::BeforeIdat
        } else {
            ChunkLocation::BeforePlte
        };

        let chunk = UnknownChunk {
            chunk_type,
            data,
            location,
        };

        let handled = self.handler.unknown_chunk(&chunk);
        let keep = !handled
            && match self.config.keep_policy(chunk_type) {
                KeepPolicy::Always => true,
                KeepPolicy::IfSafe => chunk_type.is_safe_to_copy(),
                KeepPolicy::Default | KeepPolicy::Never => false,
            };

        if !handled && !keep && chunk_type.is_critical() {
            return Err(PngError::Format(format!("{}: unhandled critical chunk", chunk_type)));
        }

        if keep {
            log_debug!("keeping unknown chunk {} ({} bytes)", chunk_type, chunk.data.len());
            self.info.unknown_chunks.push(chunk);
        }

        if chunk_type == PLTE {
            self.flags |= SessionFlags::HAVE_PLTE;
        }

        Ok(())
    }

    fn finish_image(&mut self, data: &[u8]) -> PngResult<()> {
        self.flags |= SessionFlags::HAVE_IEND;

        if !data.is_empty() {
            self.benign(PngWarning::new(WarningKind::InvalidChunk, "IEND: invalid"))?;
        }

        let max_index = self.rows.as_ref().and_then(|rows| rows.max_palette_index());
        let palette_len = self.info.palette.as_ref().map(|palette| palette.len());
        if let (Some(max_index), Some(palette_len)) = (max_index, palette_len) {
            if max_index as usize >= palette_len {
                self.benign(PngWarning::new(
                    WarningKind::PaletteIndex,
                    "palette index exceeding palette size",
                ))?;
            }
        }

        self.chunk = None;
        self.mode = Mode::Done;
        log_info!("decoding finished");
        self.handler.on_end(&self.info);

        Ok(())
    }

    fn begin_image_data(&mut self, header: ChunkHeader) -> PngResult<()> {
        if self.info.header.color_type == ColorType::Indexed && !self.flags.contains(SessionFlags::HAVE_PLTE) {
            return Err(PngError::Format("Missing PLTE before IDAT".to_string()));
        }

        if self.flags.contains(SessionFlags::AFTER_IDAT) {
            self.benign(PngWarning::new(WarningKind::Ordering, "Too many IDATs found"))?;
            self.chunk = Some(ChunkState {
                header,
                body: Body::Skip,
                remaining: header.length,
            });
            self.mode = Mode::ChunkBody;
            return Ok(());
        }

        if !self.flags.contains(SessionFlags::HAVE_IDAT) {
            self.start_rows()?;
        }

        self.idat_remaining = header.length;
        self.extra_data_reported = false;
        self.mode = Mode::ImageData;

        Ok(())
    }

    fn start_rows(&mut self) -> PngResult<()> {
        let header = self.info.header;
        let transforms = RowTransforms::from_config(&self.config);
        let format = transform::output_format(&header, transforms);

        self.info.output_pixel_depth = format.pixel_depth();
        self.info.output_row_bytes = row_bytes(header.width, format.pixel_depth())
            .ok_or_else(|| PngError::Overflow("row size exceeds addressable memory".to_string()))?;

        self.rows = Some(RowScheduler::new(
            &header,
            transforms,
            self.config.limits.max_pixel_depth,
        )?);
        self.inflater.reset();
        self.flags |= SessionFlags::HAVE_IDAT;

        log_info!(
            "image {}x{}, {} bit {:?}{}",
            header.width,
            header.height,
            header.bit_depth,
            header.color_type,
            if header.interlaced { ", interlaced" } else { "" }
        );
        self.handler.on_info(&self.info);

        Ok(())
    }

    fn read_image_data(&mut self, input: &mut Input) -> PngResult<()> {
        if self.idat_remaining == 0 {
            // The inflater may still hold output of this chunk's data.
            self.inflate_image_data(&[])?;
            if self.pending_pause.is_some() {
                return Ok(());
            }

            if input.available() < 4 {
                return input.save();
            }

            let expected = read_crc(input)?;
            self.check_crc(IDAT, expected)?;
            return self.end_chunk();
        }

        let data = input.peek(self.idat_remaining as usize);
        let consumed = self.inflate_image_data(data)?;
        self.crc.update(&data[..consumed]);

        let stalled = consumed < data.len() && self.pending_pause.is_none();
        input.consume(consumed);
        self.idat_remaining -= consumed as u32;

        if stalled {
            input.save()?;
        }

        Ok(())
    }

    /// Compressed bytes after the end of the stream. Reported once per IDAT
    /// chunk so that the warnings do not depend on how input is split.
    fn report_extra_data(&mut self) {
        if !self.extra_data_reported {
            self.extra_data_reported = true;
            self.warn(PngWarning::new(WarningKind::ExtraData, "Extra compression data in IDAT"));
        }
    }

    fn rows_complete(&self) -> bool {
        self.rows.as_ref().is_some_and(|rows| rows.is_complete())
    }

    /// Runs compressed bytes through the inflater until they are used up,
    /// the stream ends, or the handler asks for a pause. Returns how many
    /// bytes of `data` were used.
    fn inflate_image_data(&mut self, data: &[u8]) -> PngResult<usize> {
        if self.stream_ended {
            if !data.is_empty() {
                self.report_extra_data();
            }

            return Ok(data.len());
        }

        let mut offset = 0;
        loop {
            let mut scratch = [0u8; 1];
            let (step, had_rows_left) = match self.rows.as_mut() {
                Some(rows) if !rows.is_complete() => (self.inflater.inflate(&data[offset..], rows.output_space()), true),
                Some(_) => (self.inflater.inflate(&data[offset..], &mut scratch), false),
                None => return Err(PngError::Internal("image data before row setup".to_string())),
            };

            offset += step.consumed;

            if step.written > 0 {
                if !had_rows_left {
                    self.warn(PngWarning::new(WarningKind::ExtraData, "Extra compressed data in IDAT"));
                    self.stream_ended = true;
                    self.extra_data_reported = true;
                    return Ok(data.len());
                }

                if let Some(rows) = self.rows.as_mut() {
                    rows.advance(step.written);

                    if rows.row_ready() {
                        rows.process_row(&mut self.handler)?;

                        if self.pending_pause.is_none() {
                            self.pending_pause = self.handler.poll_pause();
                        }
                    }
                }
            }

            match step.status {
                InflateStatus::Continue => {}
                InflateStatus::StreamEnd => {
                    self.stream_ended = true;

                    if !self.rows_complete() {
                        self.warn(PngWarning::new(WarningKind::Truncation, "Not enough image data"));
                    }

                    if offset < data.len() {
                        self.report_extra_data();
                    }

                    return Ok(data.len());
                }
                InflateStatus::ChecksumError => {
                    self.stream_ended = true;
                    self.extra_data_reported = true;

                    if self.rows_complete() {
                        self.warn(PngWarning::new(WarningKind::Truncation, "Truncated compressed data in IDAT"));
                    } else {
                        self.benign(PngWarning::new(WarningKind::Checksum, "IDAT: ADLER32 checksum mismatch"))?;
                    }

                    return Ok(data.len());
                }
                InflateStatus::Fatal(message) => {
                    self.stream_ended = true;
                    self.extra_data_reported = true;

                    if !self.rows_complete() {
                        return Err(PngError::Decompression(message));
                    }

                    self.warn(PngWarning::new(WarningKind::Truncation, "Truncated compressed data in IDAT"));
                    return Ok(data.len());
                }
            }

            if self.pending_pause.is_some() || (step.consumed == 0 && step.written == 0) {
                return Ok(offset);
            }
        }
    }
}

fn read_crc(input: &mut Input) -> PngResult<u32> {
    let mut raw = [0u8; 4];
    input.fill(&mut raw)?;
    Ok(u32::from_be_bytes(raw))
}
