use crate::utils::error::{PngError, PngResult};

/// Extra room reserved whenever the carry buffer has to grow.
const SAVE_HEADROOM: usize = 256;

/// Bytes held back between calls because they did not complete the next
/// atomic unit. The allocation only ever grows.
#[derive(Debug, Default)]
pub(crate) struct CarryBuffer {
    data: Vec<u8>,
    start: usize,
}

impl CarryBuffer {
    pub fn len(&self) -> usize {
        self.data.len() - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    fn bytes(&self) -> &[u8] {
        &self.data[self.start..]
    }

    fn consume(&mut self, n: usize) {
        self.start += n;

        if self.start == self.data.len() {
            self.data.clear();
            self.start = 0;
        }
    }

    pub fn clear(&mut self) {
        self.data.clear();
        self.start = 0;
    }

    /// Appends `bytes` behind the unconsumed contents.
    fn append(&mut self, bytes: &[u8]) -> PngResult<()> {
        if self.start > 0 {
            self.data.drain(..self.start);
            self.start = 0;
        }

        let saved = self.data.len();
        if saved > usize::MAX - (bytes.len() + SAVE_HEADROOM) {
            return Err(PngError::Overflow("Potential overflow of save_buffer".to_string()));
        }

        let needed = saved + bytes.len();
        if needed > self.data.capacity() {
            self.data.reserve_exact(needed + SAVE_HEADROOM - saved);
        }

        self.data.extend_from_slice(bytes);

        Ok(())
    }
}

/// One call's worth of input: the carry buffer followed by the caller's
/// slice, read through a single cursor.
pub(crate) struct Input<'a> {
    carry: CarryBuffer,
    current: &'a [u8],
    pos: usize,
    suspended: bool,
}

impl<'a> Input<'a> {
    pub fn new(carry: CarryBuffer, current: &'a [u8]) -> Self {
        Self {
            carry,
            current,
            pos: 0,
            suspended: false,
        }
    }

    /// Bytes that can still be read during this call.
    pub fn available(&self) -> usize {
        self.carry.len() + self.current.len() - self.pos
    }

    /// False once the input is used up or processing has been suspended.
    pub fn has_more(&self) -> bool {
        !self.suspended && self.available() > 0
    }

    /// Copies `dest.len()` bytes out of the front of the input, carry first.
    pub fn fill(&mut self, dest: &mut [u8]) -> PngResult<()> {
        if dest.len() > self.available() {
            return Err(PngError::Internal(format!(
                "read of {} bytes with only {} available",
                dest.len(),
                self.available()
            )));
        }

        let from_carry = dest.len().min(self.carry.len());
        dest[..from_carry].copy_from_slice(&self.carry.bytes()[..from_carry]);
        self.carry.consume(from_carry);

        let rest = dest.len() - from_carry;
        dest[from_carry..].copy_from_slice(&self.current[self.pos..self.pos + rest]);
        self.pos += rest;

        Ok(())
    }

    /// Up to `max` contiguous bytes from the front of the input without
    /// consuming them.
    pub fn peek(&self, max: usize) -> &[u8] {
        if !self.carry.is_empty() {
            let bytes = self.carry.bytes();
            &bytes[..max.min(bytes.len())]
        } else {
            let bytes = &self.current[self.pos..];
            &bytes[..max.min(bytes.len())]
        }
    }

    pub fn consume(&mut self, n: usize) {
        let from_carry = n.min(self.carry.len());
        self.carry.consume(from_carry);
        self.pos = (self.pos + n - from_carry).min(self.current.len());
    }

    /// Moves the unread part of the caller's slice into the carry buffer and
    /// ends processing for this call.
    pub fn save(&mut self) -> PngResult<()> {
        self.carry.append(&self.current[self.pos..])?;
        self.pos = self.current.len();
        self.suspended = true;

        Ok(())
    }

    /// Drops everything still unread. Used once decoding has finished.
    pub fn discard_all(&mut self) {
        self.carry.clear();
        self.pos = self.current.len();
    }

    /// Suspends processing. With `discard` the unread caller bytes are left
    /// for the caller to supply again and their count is returned; otherwise
    /// they are kept in the carry buffer and 0 is returned.
    pub fn pause(&mut self, discard: bool) -> PngResult<usize> {
        if !discard {
            self.save()?;
            return Ok(0);
        }

        let dropped = self.current.len() - self.pos;
        self.pos = self.current.len();
        self.suspended = true;

        Ok(dropped)
    }

    pub fn finish(self) -> CarryBuffer {
        self.carry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_reads_carry_before_current() -> Result<(), PngError> {
        let mut input = Input::new(CarryBuffer::default(), &[1, 2, 3]);
        input.save()?;
        let carry = input.finish();
        assert_eq!(carry.len(), 3);

        let mut input = Input::new(carry, &[4, 5, 6]);
        let mut dest = [0u8; 5];
        input.fill(&mut dest)?;

        assert_eq!(dest, [1, 2, 3, 4, 5]);
        assert_eq!(input.available(), 1);
        assert!(input.finish().is_empty());

        Ok(())
    }

    #[test]
    fn save_grows_with_headroom_and_keeps_capacity() -> Result<(), PngError> {
        let mut input = Input::new(CarryBuffer::default(), &[7; 10]);
        input.save()?;
        assert!(!input.has_more());

        let mut carry = input.finish();
        assert!(carry.capacity() >= 10 + SAVE_HEADROOM);

        let capacity = carry.capacity();
        carry.consume(10);
        assert!(carry.is_empty());
        assert_eq!(carry.capacity(), capacity);

        Ok(())
    }

    #[test]
    fn partially_consumed_carry_is_compacted() -> Result<(), PngError> {
        let mut input = Input::new(CarryBuffer::default(), &[1, 2, 3, 4]);
        input.save()?;

        let mut input = Input::new(input.finish(), &[5, 6]);
        let mut dest = [0u8; 2];
        input.fill(&mut dest)?;
        input.save()?;

        let mut input = Input::new(input.finish(), &[]);
        let mut rest = [0u8; 4];
        input.fill(&mut rest)?;
        assert_eq!(rest, [3, 4, 5, 6]);

        Ok(())
    }

    #[test]
    fn peek_and_consume_walk_both_sources() -> Result<(), PngError> {
        let mut input = Input::new(CarryBuffer::default(), &[1, 2]);
        input.save()?;

        let mut input = Input::new(input.finish(), &[3, 4, 5]);
        assert_eq!(input.peek(10), &[1, 2]);
        input.consume(2);
        assert_eq!(input.peek(2), &[3, 4]);
        input.consume(2);
        assert_eq!(input.peek(10), &[5]);
        assert_eq!(input.available(), 1);

        Ok(())
    }

    #[test]
    fn pause_reports_dropped_bytes() -> Result<(), PngError> {
        let data = [1u8, 2, 3, 4, 5];

        let mut input = Input::new(CarryBuffer::default(), &data);
        let mut one = [0u8; 1];
        input.fill(&mut one)?;
        assert_eq!(input.pause(true)?, 4);
        assert!(input.finish().is_empty());

        let mut input = Input::new(CarryBuffer::default(), &data);
        input.fill(&mut one)?;
        assert_eq!(input.pause(false)?, 0);
        assert_eq!(input.finish().len(), 4);

        Ok(())
    }

    #[test]
    fn over_read_is_an_error() {
        let mut input = Input::new(CarryBuffer::default(), &[1, 2]);
        let mut dest = [0u8; 3];

        assert!(input.fill(&mut dest).is_err());
    }
}
