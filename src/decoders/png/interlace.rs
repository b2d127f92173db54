/// Geometry and emission cadence of one Adam7 pass.
///
/// With interlace expansion every decoded row of the pass is emitted `real`
/// times carrying data, followed by `placeholder` rows without data, so that
/// each pass covers the whole image height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassInfo {
    pub real: u32,
    pub placeholder: u32,
    pub row_offset: u32,
    pub col_offset: u32,
    pub row_stride: u32,
    pub col_stride: u32,
}

pub const ADAM7_PASSES: [PassInfo; 7] = [
    PassInfo { real: 8, placeholder: 0, row_offset: 0, col_offset: 0, row_stride: 8, col_stride: 8 },
    PassInfo { real: 8, placeholder: 0, row_offset: 0, col_offset: 4, row_stride: 8, col_stride: 8 },
    PassInfo { real: 4, placeholder: 4, row_offset: 4, col_offset: 0, row_stride: 8, col_stride: 4 },
    PassInfo { real: 4, placeholder: 0, row_offset: 0, col_offset: 2, row_stride: 4, col_stride: 4 },
    PassInfo { real: 2, placeholder: 2, row_offset: 2, col_offset: 0, row_stride: 4, col_stride: 2 },
    PassInfo { real: 2, placeholder: 0, row_offset: 0, col_offset: 1, row_stride: 2, col_stride: 2 },
    PassInfo { real: 1, placeholder: 1, row_offset: 1, col_offset: 0, row_stride: 2, col_stride: 1 },
];

impl PassInfo {
    pub(crate) fn get(pass: u8) -> Option<&'static PassInfo> {
        ADAM7_PASSES.get(pass as usize)
    }

    /// Pixels per row of this pass for an image `width` pixels wide.
    pub fn width(&self, width: u32) -> u32 {
        if width <= self.col_offset {
            0
        } else {
            (width - self.col_offset).div_ceil(self.col_stride)
        }
    }

    /// Rows this pass contributes to an image `height` rows tall.
    pub fn rows(&self, height: u32) -> u32 {
        if height <= self.row_offset {
            0
        } else {
            (height - self.row_offset).div_ceil(self.row_stride)
        }
    }

    /// Image row of the `index`-th row of this pass.
    pub fn image_row(&self, index: u32) -> u32 {
        self.row_offset + index * self.row_stride
    }

    /// Columns a pass pixel is replicated over when expanded.
    pub(crate) fn block_width(&self) -> u32 {
        self.col_stride - self.col_offset
    }

    /// Whether column `x` of an expanded row carries data from this pass.
    pub(crate) fn covers_column(&self, x: u32) -> bool {
        x >= self.col_offset && (x - self.col_offset) % self.col_stride < self.block_width()
    }
}

pub(crate) fn get_pixel(row: &[u8], x: usize, pixel_depth: usize) -> u8 {
    let bit = x * pixel_depth;
    let shift = 8 - pixel_depth - bit % 8;
    let mask = ((1u16 << pixel_depth) - 1) as u8;

    (row[bit / 8] >> shift) & mask
}

pub(crate) fn set_pixel(row: &mut [u8], x: usize, pixel_depth: usize, value: u8) {
    let bit = x * pixel_depth;
    let shift = 8 - pixel_depth - bit % 8;
    let mask = (((1u16 << pixel_depth) - 1) as u8) << shift;

    row[bit / 8] = (row[bit / 8] & !mask) | ((value << shift) & mask);
}

fn copy_pixel(src: &[u8], src_x: usize, dst: &mut [u8], dst_x: usize, pixel_depth: usize) {
    if pixel_depth >= 8 {
        let bytes = pixel_depth / 8;
        dst[dst_x * bytes..(dst_x + 1) * bytes].copy_from_slice(&src[src_x * bytes..(src_x + 1) * bytes]);
    } else {
        set_pixel(dst, dst_x, pixel_depth, get_pixel(src, src_x, pixel_depth));
    }
}

/// Spreads a pass row over a full-width row. Pass pixel `c` lands on its own
/// image column and is repeated to the right across the pass block; columns
/// the pass does not cover are left zero.
///
/// Only the covered columns carry data, so the row is meant to be merged with
/// [`combine_row`]. The zero columns differ from a row that repeats every
/// pixel over its whole `col_stride` block starting at column `c * col_stride`,
/// but both merge to the same image.
pub fn expand_row(pass: &PassInfo, row: &[u8], width: u32, pixel_depth: u8, out: &mut [u8]) {
    let depth = pixel_depth as usize;
    out.fill(0);

    for c in 0..pass.width(width) {
        let start = pass.col_offset + c * pass.col_stride;
        let end = (start + pass.block_width()).min(width);

        for x in start..end {
            copy_pixel(row, c as usize, out, x as usize, depth);
        }
    }
}

/// Merges an expanded row of `pass` into `dst`, a caller-owned full-width row,
/// copying only the columns the pass covers. Sub-byte pixels are expected in
/// the default most-significant-first packing.
pub fn combine_row(dst: &mut [u8], row: Option<&[u8]>, pass: u8, width: u32, pixel_depth: u8) {
    let Some(row) = row else {
        return;
    };

    let Some(info) = PassInfo::get(pass) else {
        return;
    };

    let depth = pixel_depth as usize;
    for x in 0..width {
        if info.covers_column(x) {
            copy_pixel(row, x as usize, dst, x as usize, depth);
        }
    }
}
