use crate::config::Transformations;
use crate::decoders::png::filter::{self, FilterType};
use crate::decoders::png::info::{row_bytes, ColorType, ImageHeader};
use crate::decoders::png::interlace::{self, PassInfo};
use crate::decoders::png::push::ProgressiveHandler;
use crate::decoders::png::transform::{self, RowFormat, RowTransforms};
use crate::utils::error::{PngError, PngResult};

/// Turns decompressed scanlines into row notifications: reverses the filter,
/// applies transformations, and walks the interlace passes.
pub(crate) struct RowScheduler {
    width: u32,
    height: u32,
    interlaced: bool,
    expand: bool,
    transforms: RowTransforms,
    source: RowFormat,
    max_pixel_depth: u8,
    latched_depth: Option<u8>,
    pass: u8,
    pass_width: u32,
    pass_rows: u32,
    row_in_pass: u32,
    // Filter byte plus the packed pixels of the current pass row.
    row_len: usize,
    filled: usize,
    row_buf: Vec<u8>,
    prev_row: Vec<u8>,
    work: Vec<u8>,
    expanded: Vec<u8>,
    finished: bool,
    max_palette_index: Option<u8>,
}

fn overflow() -> PngError {
    PngError::Overflow("row size exceeds addressable memory".to_string())
}

impl RowScheduler {
    pub fn new(
        header: &ImageHeader,
        transforms: impl Into<RowTransforms>,
        max_pixel_depth: u8,
    ) -> PngResult<Self> {
        let transforms = transforms.into();
        let full_row = header.row_bytes().ok_or_else(overflow)?;
        let output = transform::output_format(header, transforms);
        let output_row = row_bytes(header.width, output.pixel_depth()).ok_or_else(overflow)?;
        let expand = header.interlaced && transforms.contains(Transformations::EXPAND_INTERLACE);

        let mut scheduler = Self {
            width: header.width,
            height: header.height,
            interlaced: header.interlaced,
            expand,
            transforms,
            source: RowFormat::from_header(header),
            max_pixel_depth,
            latched_depth: None,
            pass: 0,
            pass_width: 0,
            pass_rows: 0,
            row_in_pass: 0,
            row_len: 0,
            filled: 0,
            row_buf: vec![0; full_row + 1],
            prev_row: vec![0; full_row + 1],
            work: Vec::with_capacity(full_row),
            expanded: if expand { vec![0; output_row] } else { Vec::new() },
            finished: false,
            max_palette_index: None,
        };

        // The first pass always has pixels and rows, so nothing is emitted
        // before the first scanline arrives.
        if header.interlaced {
            let first = &interlace::ADAM7_PASSES[0];
            scheduler.set_pass(0, first.width(header.width), first.rows(header.height))?;
        } else {
            scheduler.set_pass(0, header.width, header.height)?;
        }

        Ok(scheduler)
    }

    fn set_pass(&mut self, pass: u8, width: u32, rows: u32) -> PngResult<()> {
        self.pass = pass;
        self.pass_width = width;
        self.pass_rows = rows;
        self.row_in_pass = 0;
        self.filled = 0;
        self.row_len = row_bytes(width, self.source.pixel_depth()).ok_or_else(overflow)? + 1;
        self.prev_row[..self.row_len].fill(0);

        Ok(())
    }

    /// Space left in the scanline being assembled.
    pub fn output_space(&mut self) -> &mut [u8] {
        &mut self.row_buf[self.filled..self.row_len]
    }

    pub fn advance(&mut self, written: usize) {
        self.filled = (self.filled + written).min(self.row_len);
    }

    pub fn row_ready(&self) -> bool {
        self.filled == self.row_len
    }

    pub fn is_complete(&self) -> bool {
        self.finished
    }

    #[cfg(test)]
    pub fn pass(&self) -> u8 {
        self.pass
    }

    pub fn max_palette_index(&self) -> Option<u8> {
        self.max_palette_index
    }

    /// Reconstructs the completed scanline and emits it.
    pub fn process_row<H: ProgressiveHandler>(&mut self, handler: &mut H) -> PngResult<()> {
        let len = self.row_len;
        let filter_type = FilterType::from_u8(self.row_buf[0])
            .ok_or_else(|| PngError::Format("bad adaptive filter value".to_string()))?;
        let bytes_per_pixel = (self.source.pixel_depth() as usize).div_ceil(8);

        filter::unfilter(filter_type, bytes_per_pixel, &mut self.row_buf[1..len], &self.prev_row[1..len]);
        self.prev_row[..len].copy_from_slice(&self.row_buf[..len]);

        if self.source.color_type == ColorType::Indexed {
            self.track_palette_indices();
        }

        self.work.clear();
        self.work.extend_from_slice(&self.row_buf[1..len]);
        let format = transform::apply(&mut self.work, self.pass_width, self.source, self.transforms);
        let depth = format.pixel_depth();

        self.latch_pixel_depth(depth)?;
        self.emit(handler, depth);

        self.filled = 0;
        self.row_in_pass += 1;
        if self.row_in_pass == self.pass_rows {
            self.next_pass(handler)?;
        }

        Ok(())
    }

    fn latch_pixel_depth(&mut self, depth: u8) -> PngResult<()> {
        match self.latched_depth {
            None => {
                if depth > self.max_pixel_depth {
                    return Err(PngError::Overflow("progressive row overflow".to_string()));
                }

                self.latched_depth = Some(depth);
            }
            Some(latched) if latched != depth => {
                return Err(PngError::Internal(
                    "internal progressive row size calculation error".to_string(),
                ));
            }
            Some(_) => {}
        }

        Ok(())
    }

    fn track_palette_indices(&mut self) {
        let depth = self.source.bit_depth as usize;
        let pixels = &self.row_buf[1..self.row_len];

        let max = if depth == 8 {
            pixels.iter().copied().max()
        } else {
            (0..self.pass_width as usize)
                .map(|x| interlace::get_pixel(pixels, x, depth))
                .max()
        };

        self.max_palette_index = self.max_palette_index.max(max);
    }

    fn emit<H: ProgressiveHandler>(&mut self, handler: &mut H, depth: u8) {
        let packswap = self.transforms.contains(Transformations::PACKSWAP) && depth < 8;

        if !self.interlaced {
            if packswap {
                transform::swap_packed_pixels(&mut self.work, depth);
            }

            handler.on_row(Some(&self.work), self.row_in_pass, 0);
            return;
        }

        let pass = &interlace::ADAM7_PASSES[self.pass as usize];
        let y = pass.image_row(self.row_in_pass);

        if !self.expand {
            if packswap {
                transform::swap_packed_pixels(&mut self.work, depth);
            }

            handler.on_row(Some(&self.work), y, self.pass);
            return;
        }

        interlace::expand_row(pass, &self.work, self.width, depth, &mut self.expanded);
        if packswap {
            transform::swap_packed_pixels(&mut self.expanded, depth);
        }

        let real_end = (y + pass.real).min(self.height);
        let block_end = (y + pass.row_stride).min(self.height);

        for row in y..real_end {
            handler.on_row(Some(&self.expanded), row, self.pass);
        }

        for row in real_end..block_end {
            handler.on_row(None, row, self.pass);
        }
    }

    /// Moves on to the next pass that has pixels. With expansion, entering a
    /// pass first emits placeholders for the rows above its first row, and a
    /// pass without rows of its own is made of placeholders only.
    fn next_pass<H: ProgressiveHandler>(&mut self, handler: &mut H) -> PngResult<()> {
        if !self.interlaced {
            self.finished = true;
            return Ok(());
        }

        let mut pass = self.pass;
        loop {
            pass += 1;

            let Some(info) = PassInfo::get(pass) else {
                self.finished = true;
                return Ok(());
            };

            let width = info.width(self.width);
            let rows = info.rows(self.height);

            if width == 0 || (!self.expand && rows == 0) {
                continue;
            }

            self.set_pass(pass, width, rows)?;

            if self.expand {
                for row in 0..info.row_offset.min(self.height) {
                    handler.on_row(None, row, pass);
                }
            }

            if rows > 0 {
                return Ok(());
            }
        }
    }
}
