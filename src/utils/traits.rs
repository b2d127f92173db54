use crate::utils::error::{PngError, PngResult};

/// Bounds-checked reads over chunk payloads. Chunk parsers work on complete
/// payload slices, so every read reports truncation instead of panicking.
pub(crate) trait SafeAccess {
    fn get_range_safe(&self, range: std::ops::Range<usize>) -> PngResult<&[u8]>;
    fn u8_at(&self, offset: usize) -> PngResult<u8>;
    fn u16_at(&self, offset: usize) -> PngResult<u16>;
    fn u32_at(&self, offset: usize) -> PngResult<u32>;
}

impl SafeAccess for [u8] {
    /// Safely retrieves a range of bytes.
    ///
    /// # Errors
    ///
    /// Returns `PngError::Format` if the range is inverted or runs past the end
    /// of the slice.
    fn get_range_safe(&self, range: std::ops::Range<usize>) -> PngResult<&[u8]> {
        self.get(range.clone()).ok_or_else(|| {
            PngError::Format(format!(
                "Range {}..{} out of bounds (len {})",
                range.start,
                range.end,
                self.len()
            ))
        })
    }

    fn u8_at(&self, offset: usize) -> PngResult<u8> {
        self.get(offset).copied().ok_or_else(|| {
            PngError::Format(format!("Index {} out of bounds (len {})", offset, self.len()))
        })
    }

    fn u16_at(&self, offset: usize) -> PngResult<u16> {
        let bytes = self.get_range_safe(offset..offset + 2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    fn u32_at(&self, offset: usize) -> PngResult<u32> {
        let bytes = self.get_range_safe(offset..offset + 4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}
