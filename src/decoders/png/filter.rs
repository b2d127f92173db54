#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterType {
    None = 0,
    Sub = 1,
    Up = 2,
    Average = 3,
    Paeth = 4,
}

impl FilterType {
    pub fn from_u8(value: u8) -> Option<FilterType> {
        match value {
            0 => Some(FilterType::None),
            1 => Some(FilterType::Sub),
            2 => Some(FilterType::Up),
            3 => Some(FilterType::Average),
            4 => Some(FilterType::Paeth),
            _ => None,
        }
    }
}

/// Reverses `filter` on `row` in place. `prior` is the previous reconstructed
/// row of the same pass (all zero for the first row) and must be at least as
/// long as `row`.
pub fn unfilter(filter: FilterType, bytes_per_pixel: usize, row: &mut [u8], prior: &[u8]) {
    let bpp = bytes_per_pixel.min(row.len());
    let prior = &prior[..row.len()];

    match filter {
        FilterType::None => {}
        FilterType::Sub => decode_sub_filter(row, bpp),
        FilterType::Up => decode_up_filter(row, prior),
        FilterType::Average => decode_average_filter(row, prior, bpp),
        FilterType::Paeth => decode_paeth_filter(row, prior, bpp),
    }
}

fn decode_sub_filter(row: &mut [u8], bpp: usize) {
    for i in bpp..row.len() {
        row[i] = row[i].wrapping_add(row[i - bpp]);
    }
}

fn decode_up_filter(row: &mut [u8], prior: &[u8]) {
    for (byte, &above) in row.iter_mut().zip(prior) {
        *byte = byte.wrapping_add(above);
    }
}

fn decode_average_filter(row: &mut [u8], prior: &[u8], bpp: usize) {
    for i in 0..bpp {
        row[i] = row[i].wrapping_add(prior[i] >> 1);
    }

    for i in bpp..row.len() {
        let left = row[i - bpp] as u16;
        let above = prior[i] as u16;
        let avg = ((left + above) >> 1) as u8;
        row[i] = row[i].wrapping_add(avg);
    }
}

fn decode_paeth_filter(row: &mut [u8], prior: &[u8], bpp: usize) {
    for i in 0..bpp {
        row[i] = row[i].wrapping_add(prior[i]);
    }

    for i in bpp..row.len() {
        let left = row[i - bpp];
        let above = prior[i];
        let upper_left = prior[i - bpp];

        row[i] = row[i].wrapping_add(paeth_predictor(left, above, upper_left));
    }
}

pub(crate) fn paeth_predictor(a: u8, b: u8, c: u8) -> u8 {
    // a = left, b = above, c = upper left
    let a = a as i16;
    let b = b as i16;
    let c = c as i16;

    let p = a + b - c;        // Initial estimate
    let pa = (p - a).abs();   // Distance to a
    let pb = (p - b).abs();   // Distance to b
    let pc = (p - c).abs();   // Distance to c

    if pa <= pb && pa <= pc {
        a as u8
    } else if pb <= pc {
        b as u8
    } else {
        c as u8
    }
}
