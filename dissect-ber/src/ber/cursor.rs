//! Bounds-checked read cursor over a borrowed message buffer

use dissect_core::{DecodeError, DecodeResult};

/// Read position over an immutable byte buffer
///
/// The cursor never owns the buffer. It tracks a `position` and an
/// exclusive `end`, with `position <= end <= buffer.len()` at all times.
/// Every offset it reports is absolute within the original buffer, also
/// for cursors created with [`Cursor::region`], so decoded values can be
/// mapped back to message bytes directly.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    buffer: &'a [u8],
    position: usize,
    end: usize,
}

impl<'a> Cursor<'a> {
    /// Open a cursor over the whole buffer
    pub fn open(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            position: 0,
            end: buffer.len(),
        }
    }

    /// Consume the cursor, returning the unread part of its region
    pub fn close(self) -> &'a [u8] {
        &self.buffer[self.position..self.end]
    }

    /// Cursor over the next `len` octets of this one
    ///
    /// This cursor is left untouched; callers advance it past the region
    /// once they are done with it.
    pub fn region(&self, len: usize) -> DecodeResult<Cursor<'a>> {
        let end = self.checked_end(len)?;
        Ok(Cursor {
            buffer: self.buffer,
            position: self.position,
            end,
        })
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// Unread part of the region, without consuming anything
    pub fn remaining(&self) -> &'a [u8] {
        &self.buffer[self.position..self.end]
    }

    pub fn remaining_len(&self) -> usize {
        self.end - self.position
    }

    pub fn is_empty(&self) -> bool {
        self.position >= self.end
    }

    /// Whether the cursor has reached `target`
    pub fn at_or_past(&self, target: usize) -> bool {
        self.position >= target
    }

    /// Read one octet
    ///
    /// # Error Handling
    /// Returns `Empty` at the end of the region; the position is unchanged.
    pub fn read_octet(&mut self) -> DecodeResult<u8> {
        if self.position >= self.end {
            return Err(DecodeError::Empty {
                offset: self.position,
            });
        }
        let octet = self.buffer[self.position];
        self.position += 1;
        Ok(octet)
    }

    /// Look at the octet `ahead` positions from the current one
    pub fn peek_octet(&self, ahead: usize) -> Option<u8> {
        let index = self.position.checked_add(ahead)?;
        if index < self.end {
            Some(self.buffer[index])
        } else {
            None
        }
    }

    /// Read `count` octets as a slice of the buffer
    pub fn read_octets(&mut self, count: usize) -> DecodeResult<&'a [u8]> {
        let end = self.checked_end(count)?;
        let start = self.position;
        self.position = end;
        Ok(&self.buffer[start..end])
    }

    /// Advance over `count` octets
    pub fn skip(&mut self, count: usize) -> DecodeResult<()> {
        self.position = self.checked_end(count)?;
        Ok(())
    }

    /// Move to `target`, which must lie between the position and the end
    pub fn advance_to(&mut self, target: usize) -> DecodeResult<()> {
        if target < self.position {
            return Err(DecodeError::LengthMismatch {
                expected: target,
                actual: self.position,
            });
        }
        if target > self.end {
            return Err(DecodeError::Empty { offset: self.end });
        }
        self.position = target;
        Ok(())
    }

    fn checked_end(&self, count: usize) -> DecodeResult<usize> {
        match self.position.checked_add(count) {
            Some(end) if end <= self.end => Ok(end),
            _ => Err(DecodeError::Empty { offset: self.end }),
        }
    }
}
