use crate::config::{DecoderConfig, Filler, FillerPosition, Transformations};
use crate::decoders::png::info::{ColorType, ImageHeader};
use crate::decoders::png::interlace;

/// Transformation flags together with the parameters some of them take.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub(crate) struct RowTransforms {
    pub flags: Transformations,
    pub filler: Filler,
}

impl RowTransforms {
    pub fn from_config(config: &DecoderConfig) -> Self {
        Self {
            flags: config.transformations,
            filler: config.filler,
        }
    }

    pub fn contains(&self, flag: Transformations) -> bool {
        self.flags.contains(flag)
    }
}

impl From<Transformations> for RowTransforms {
    fn from(flags: Transformations) -> Self {
        Self {
            flags,
            filler: Filler::default(),
        }
    }
}

/// Sample layout of a row as it moves through the transformations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RowFormat {
    pub color_type: ColorType,
    pub bit_depth: u8,
    pub channels: u8,
}

impl RowFormat {
    pub fn from_header(header: &ImageHeader) -> Self {
        Self {
            color_type: header.color_type,
            bit_depth: header.bit_depth,
            channels: header.channels(),
        }
    }

    pub fn pixel_depth(&self) -> u8 {
        self.bit_depth * self.channels
    }

    fn sample_bytes(&self) -> usize {
        if self.bit_depth == 16 {
            2
        } else {
            1
        }
    }

    fn pixel_bytes(&self) -> usize {
        self.sample_bytes() * self.channels as usize
    }

    fn without_alpha(&self) -> Self {
        let color_type = match self.color_type {
            ColorType::GrayscaleAlpha => ColorType::Grayscale,
            ColorType::RGBA => ColorType::RGB,
            other => other,
        };

        Self {
            color_type,
            bit_depth: self.bit_depth,
            channels: color_type.channels(),
        }
    }

    fn is_packed(&self) -> bool {
        self.bit_depth < 8
    }

    fn unpacked(&self) -> Self {
        Self { bit_depth: 8, ..*self }
    }

    /// Filler goes on whole-byte gray and RGB pixels that have no extra
    /// channel yet.
    fn takes_filler(&self) -> bool {
        matches!(self.color_type, ColorType::Grayscale | ColorType::RGB)
            && self.bit_depth >= 8
            && self.channels == self.color_type.channels()
    }

    fn with_filler(&self) -> Self {
        Self {
            channels: self.channels + 1,
            ..*self
        }
    }
}

/// The layout rows will have once `transforms` are applied.
pub(crate) fn output_format(header: &ImageHeader, transforms: impl Into<RowTransforms>) -> RowFormat {
    let transforms = transforms.into();
    let mut format = RowFormat::from_header(header);

    if transforms.contains(Transformations::STRIP_ALPHA) {
        format = format.without_alpha();
    }

    if transforms.contains(Transformations::PACKING) && format.is_packed() {
        format = format.unpacked();
    }

    if transforms.contains(Transformations::FILLER) && format.takes_filler() {
        format = format.with_filler();
    }

    format
}

/// Applies the sample-level transformations to one row of `width` pixels and
/// returns the row's new layout. Pixel packing order is handled separately by
/// [`swap_packed_pixels`] once the row has its final width.
pub(crate) fn apply(
    row: &mut Vec<u8>,
    width: u32,
    format: RowFormat,
    transforms: impl Into<RowTransforms>,
) -> RowFormat {
    let transforms = transforms.into();
    let mut format = format;

    if transforms.contains(Transformations::STRIP_ALPHA) && format.color_type.has_alpha() {
        strip_alpha(row, width, format);
        format = format.without_alpha();
    }

    if transforms.contains(Transformations::INVERT_MONO) {
        invert_mono(row, format);
    }

    if transforms.contains(Transformations::INVERT_ALPHA) && format.color_type.has_alpha() {
        invert_alpha(row, format);
    }

    if transforms.contains(Transformations::PACKING) && format.is_packed() {
        unpack(row, width, format);
        format = format.unpacked();
    }

    if transforms.contains(Transformations::BGR) {
        swap_bgr(row, format);
    }

    if transforms.contains(Transformations::FILLER) && format.takes_filler() {
        add_filler(row, width, format, transforms.filler);
        format = format.with_filler();
    }

    if transforms.contains(Transformations::SWAP_ALPHA) && format.color_type.has_alpha() {
        let sample = format.sample_bytes();
        for pixel in row.chunks_exact_mut(format.pixel_bytes()) {
            pixel.rotate_right(sample);
        }
    }

    if transforms.contains(Transformations::SWAP_ENDIAN) && format.bit_depth == 16 {
        for sample in row.chunks_exact_mut(2) {
            sample.swap(0, 1);
        }
    }

    format
}

fn strip_alpha(row: &mut Vec<u8>, width: u32, format: RowFormat) {
    let sample = format.sample_bytes();
    let pixel = sample * format.channels as usize;
    let kept = pixel - sample;

    for x in 0..width as usize {
        row.copy_within(x * pixel..x * pixel + kept, x * kept);
    }

    row.truncate(width as usize * kept);
}

fn invert_mono(row: &mut [u8], format: RowFormat) {
    match format.color_type {
        ColorType::Grayscale => {
            for byte in row.iter_mut() {
                *byte = !*byte;
            }
        }
        ColorType::GrayscaleAlpha => {
            let sample = format.sample_bytes();
            for pixel in row.chunks_exact_mut(sample * 2) {
                for byte in pixel[..sample].iter_mut() {
                    *byte = !*byte;
                }
            }
        }
        _ => {}
    }
}

fn invert_alpha(row: &mut [u8], format: RowFormat) {
    let sample = format.sample_bytes();
    let pixel = format.pixel_bytes();

    for chunk in row.chunks_exact_mut(pixel) {
        for byte in chunk[pixel - sample..].iter_mut() {
            *byte = !*byte;
        }
    }
}

fn unpack(row: &mut Vec<u8>, width: u32, format: RowFormat) {
    let depth = format.bit_depth as usize;
    let pixels: Vec<u8> = (0..width as usize)
        .map(|x| interlace::get_pixel(row, x, depth))
        .collect();

    *row = pixels;
}

fn add_filler(row: &mut Vec<u8>, width: u32, format: RowFormat, filler: Filler) {
    let sample: Vec<u8> = if format.bit_depth == 16 {
        filler.value.to_be_bytes().to_vec()
    } else {
        vec![filler.value as u8]
    };

    let pixel = format.pixel_bytes();
    let mut out = Vec::with_capacity(width as usize * (pixel + sample.len()));

    for chunk in row.chunks_exact(pixel).take(width as usize) {
        if filler.position == FillerPosition::Before {
            out.extend_from_slice(&sample);
            out.extend_from_slice(chunk);
        } else {
            out.extend_from_slice(chunk);
            out.extend_from_slice(&sample);
        }
    }

    *row = out;
}

fn swap_bgr(row: &mut [u8], format: RowFormat) {
    if !matches!(format.color_type, ColorType::RGB | ColorType::RGBA) {
        return;
    }

    let sample = format.sample_bytes();
    for pixel in row.chunks_exact_mut(sample * format.channels as usize) {
        for i in 0..sample {
            pixel.swap(i, 2 * sample + i);
        }
    }
}

/// Reverses the order of sub-byte pixels inside every byte.
pub(crate) fn swap_packed_pixels(row: &mut [u8], pixel_depth: u8) {
    let depth = pixel_depth as u32;
    if depth >= 8 {
        return;
    }

    let per_byte = 8 / depth;
    let mask = (1u8 << depth) - 1;

    for byte in row.iter_mut() {
        let mut swapped = 0u8;
        for i in 0..per_byte {
            let pixel = (*byte >> (i * depth)) & mask;
            swapped |= pixel << ((per_byte - 1 - i) * depth);
        }

        *byte = swapped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(color_type: ColorType, bit_depth: u8) -> RowFormat {
        RowFormat {
            color_type,
            bit_depth,
            channels: color_type.channels(),
        }
    }

    #[test]
    fn strips_alpha_from_rgba() {
        let mut row = vec![1, 2, 3, 255, 4, 5, 6, 128];
        let result = apply(&mut row, 2, format(ColorType::RGBA, 8), Transformations::STRIP_ALPHA);

        assert_eq!(row, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(result, format(ColorType::RGB, 8));
        assert_eq!(result.pixel_depth(), 24);
    }

    #[test]
    fn strips_wide_gray_alpha() {
        let mut row = vec![0x12, 0x34, 0xFF, 0xFF, 0x56, 0x78, 0x00, 0x00];
        let result = apply(&mut row, 2, format(ColorType::GrayscaleAlpha, 16), Transformations::STRIP_ALPHA);

        assert_eq!(row, vec![0x12, 0x34, 0x56, 0x78]);
        assert_eq!(result.pixel_depth(), 16);
    }

    #[test]
    fn swaps_to_bgr_and_little_endian() {
        let mut row = vec![0x01, 0x02, 0x03, 0x04, 0x05, 0x06];
        apply(
            &mut row,
            1,
            format(ColorType::RGB, 16),
            Transformations::BGR | Transformations::SWAP_ENDIAN,
        );

        assert_eq!(row, vec![0x06, 0x05, 0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn inverts_gray_samples_only() {
        let mut row = vec![0x00, 0x80, 0xFF, 0x80];
        apply(&mut row, 2, format(ColorType::GrayscaleAlpha, 8), Transformations::INVERT_MONO);

        assert_eq!(row, vec![0xFF, 0x80, 0x00, 0x80]);
    }

    #[test]
    fn leaves_rows_without_matching_layout_alone() {
        let mut row = vec![9, 8, 7];
        let result = apply(
            &mut row,
            3,
            format(ColorType::Indexed, 8),
            Transformations::STRIP_ALPHA | Transformations::BGR | Transformations::SWAP_ENDIAN,
        );

        assert_eq!(row, vec![9, 8, 7]);
        assert_eq!(result, format(ColorType::Indexed, 8));
    }

    #[test]
    fn reverses_packed_pixel_order() {
        let mut row = [0b1100_0000u8, 0b0001_1011];
        swap_packed_pixels(&mut row, 2);
        assert_eq!(row, [0b0000_0011, 0b1110_0100]);

        let mut row = [0xABu8];
        swap_packed_pixels(&mut row, 4);
        assert_eq!(row, [0xBA]);

        let mut row = [0b1000_0001u8, 0b1110_0000];
        swap_packed_pixels(&mut row, 1);
        assert_eq!(row, [0b1000_0001, 0b0000_0111]);
    }

    #[test]
    fn adds_filler_after_or_before_pixels() {
        let mut row = vec![1, 2, 3, 4, 5, 6];
        let transforms = RowTransforms {
            flags: Transformations::FILLER,
            filler: Filler {
                value: 0x12AB,
                position: FillerPosition::After,
            },
        };
        let result = apply(&mut row, 2, format(ColorType::RGB, 8), transforms);

        assert_eq!(row, vec![1, 2, 3, 0xAB, 4, 5, 6, 0xAB]);
        assert_eq!(result.pixel_depth(), 32);

        let mut row = vec![0x01, 0x02];
        let transforms = RowTransforms {
            flags: Transformations::FILLER,
            filler: Filler {
                value: 0x12AB,
                position: FillerPosition::Before,
            },
        };
        let result = apply(&mut row, 1, format(ColorType::Grayscale, 16), transforms);

        assert_eq!(row, vec![0x12, 0xAB, 0x01, 0x02]);
        assert_eq!(result.pixel_depth(), 32);
    }

    #[test]
    fn filler_skips_alpha_and_packed_rows() {
        let mut row = vec![1, 2, 3, 4];
        let result = apply(&mut row, 1, format(ColorType::RGBA, 8), Transformations::FILLER);
        assert_eq!(row, vec![1, 2, 3, 4]);
        assert_eq!(result, format(ColorType::RGBA, 8));

        let mut row = vec![0b1010_0000];
        let result = apply(&mut row, 3, format(ColorType::Grayscale, 1), Transformations::FILLER);
        assert_eq!(row, vec![0b1010_0000]);
        assert_eq!(result.pixel_depth(), 1);
    }

    #[test]
    fn swaps_and_inverts_alpha() {
        let mut row = vec![10, 20, 30, 200, 40, 50, 60, 0];
        apply(
            &mut row,
            2,
            format(ColorType::RGBA, 8),
            Transformations::INVERT_ALPHA | Transformations::SWAP_ALPHA,
        );
        assert_eq!(row, vec![55, 10, 20, 30, 255, 40, 50, 60]);

        let mut row = vec![0x01, 0x02, 0xF0, 0x0F];
        apply(&mut row, 1, format(ColorType::GrayscaleAlpha, 16), Transformations::SWAP_ALPHA);
        assert_eq!(row, vec![0xF0, 0x0F, 0x01, 0x02]);
    }

    #[test]
    fn unpacks_sub_byte_pixels() {
        let mut row = vec![0b1101_1000, 0b0100_0000];
        let result = apply(&mut row, 5, format(ColorType::Indexed, 2), Transformations::PACKING);

        assert_eq!(row, vec![3, 1, 2, 0, 1]);
        assert_eq!(result, format(ColorType::Indexed, 8));
    }

    #[test]
    fn unpacked_gray_takes_filler() {
        let mut row = vec![0b1000_0000];
        let result = apply(
            &mut row,
            2,
            format(ColorType::Grayscale, 1),
            Transformations::PACKING | Transformations::FILLER,
        );

        assert_eq!(row, vec![1, 0xFF, 0, 0xFF]);
        assert_eq!(result.pixel_depth(), 16);
    }

    #[test]
    fn output_format_matches_applied_layout() {
        let flags = [
            Transformations::empty(),
            Transformations::STRIP_ALPHA,
            Transformations::PACKING,
            Transformations::FILLER,
            Transformations::PACKING | Transformations::FILLER,
            Transformations::STRIP_ALPHA | Transformations::FILLER | Transformations::SWAP_ALPHA,
        ];
        let layouts = [
            (ColorType::Grayscale, 1),
            (ColorType::Grayscale, 16),
            (ColorType::RGB, 8),
            (ColorType::Indexed, 4),
            (ColorType::GrayscaleAlpha, 8),
            (ColorType::RGBA, 16),
        ];

        for flags in flags {
            for (color_type, bit_depth) in layouts {
                let header = ImageHeader {
                    width: 3,
                    height: 1,
                    bit_depth,
                    color_type,
                    interlaced: false,
                };
                let source = format(color_type, bit_depth);
                let mut row = vec![0u8; (3 * source.pixel_depth() as usize).div_ceil(8)];

                let applied = apply(&mut row, 3, source, flags);
                assert_eq!(output_format(&header, flags), applied, "{:?} {:?}", flags, source);
                assert_eq!(row.len(), (3 * applied.pixel_depth() as usize).div_ceil(8));
            }
        }
    }
}
