//! Nested-construct decode protocol
//!
//! Protocol decoders walk SEQUENCE/SET/CHOICE wrappers of mixed definite and
//! indefinite length. [`DecodeContext`] keeps one frame per open construct:
//!
//! 1. `open_*`/`enter` decodes (or takes) a constructed header, checks it
//!    against the depth limit and the enclosing construct, and pushes its
//!    [`EndMarker`].
//! 2. Children are decoded while [`DecodeContext::at_end`] is false.
//! 3. [`DecodeContext::close`] pops the innermost frame and consumes its
//!    End-Of-Contents (or checks its end offset).
//!
//! Because frames live on a stack, End-Of-Contents pairs are consumed in
//! strict LIFO order: a child's `00 00` is always consumed before the
//! parent starts looking for its own.
//!
//! The context is passed explicitly through the recursion; nothing is kept
//! in global state, so independent messages can be decoded concurrently on
//! separate contexts.

use dissect_core::{DecodeConfig, DecodeError, DecodeResult};

use super::cursor::Cursor;
use super::eoc::{consume_eoc, is_at_end, EndMarker};
use super::types::{Class, Decoded, Header};

#[derive(Debug, Clone, Copy)]
struct Frame {
    header: Header,
    marker: EndMarker,
}

/// Stack of open constructs for one message
#[derive(Debug, Clone)]
pub struct DecodeContext {
    config: DecodeConfig,
    frames: Vec<Frame>,
}

impl Default for DecodeContext {
    fn default() -> Self {
        Self::new(DecodeConfig::default())
    }
}

impl DecodeContext {
    pub fn new(config: DecodeConfig) -> Self {
        Self {
            config,
            frames: Vec::new(),
        }
    }

    pub fn config(&self) -> &DecodeConfig {
        &self.config
    }

    /// Number of currently open constructs
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Header of the innermost open construct
    pub fn innermost(&self) -> Option<&Header> {
        self.frames.last().map(|frame| &frame.header)
    }

    /// Decode a constructed header of any type and open it
    pub fn open_construct(&mut self, cursor: &mut Cursor<'_>) -> DecodeResult<Header> {
        let header = cursor.decode_header()?;
        if !header.identifier.constructed {
            return Err(header.wrong_type("constructed value"));
        }
        self.enter(cursor, header)?;
        Ok(header)
    }

    /// Decode a constructed header, require `(class, tag)`, and open it
    pub fn open_expected(
        &mut self,
        cursor: &mut Cursor<'_>,
        class: Class,
        tag: u32,
        what: &str,
    ) -> DecodeResult<Header> {
        let header = cursor.decode_header()?;
        header.expect(class, true, tag, what)?;
        self.enter(cursor, header)?;
        Ok(header)
    }

    /// Open a construct whose header the caller already decoded
    ///
    /// The cursor must sit at the header's first content octet.
    ///
    /// # Error Handling
    /// - `NestingTooDeep` past the configured depth limit
    /// - `LengthNotDefinite` for indefinite lengths when disabled in the config
    /// - `LengthMismatch` if a definite construct overruns its parent
    /// - `Empty` if a definite construct overruns the buffer
    pub fn enter(&mut self, cursor: &Cursor<'_>, header: Header) -> DecodeResult<()> {
        if !header.identifier.constructed {
            return Err(header.wrong_type("constructed value"));
        }
        if self.frames.len() >= self.config.max_depth {
            return Err(DecodeError::NestingTooDeep {
                limit: self.config.max_depth,
            });
        }
        if !header.length.is_definite() && !self.config.allow_indefinite {
            header.require_definite()?;
        }
        self.check_fits(cursor, &header)?;

        let marker = header.end_marker();
        log::trace!(
            "open {} at {} (depth {}, end {:?})",
            header.identifier,
            header.start,
            self.frames.len() + 1,
            marker
        );
        self.frames.push(Frame { header, marker });
        Ok(())
    }

    /// Check a definite-length value fits its enclosing construct and the buffer
    pub fn check_fits(&self, cursor: &Cursor<'_>, header: &Header) -> DecodeResult<()> {
        let Some(end) = header.content_end() else {
            return Ok(());
        };
        if let Some(Frame {
            marker: EndMarker::Offset(parent_end),
            ..
        }) = self.frames.last()
        {
            if end > *parent_end {
                return Err(DecodeError::LengthMismatch {
                    expected: *parent_end,
                    actual: end,
                });
            }
        }
        if end > cursor.end() {
            return Err(DecodeError::Empty {
                offset: cursor.end(),
            });
        }
        Ok(())
    }

    /// Whether the innermost open construct has no more children
    ///
    /// With nothing open, this is the end of the cursor's region.
    pub fn at_end(&self, cursor: &Cursor<'_>) -> bool {
        match self.frames.last() {
            Some(frame) => is_at_end(cursor, frame.marker),
            None => cursor.is_empty(),
        }
    }

    /// Close the innermost open construct
    ///
    /// Consumes its End-Of-Contents (indefinite) or checks the cursor sits
    /// exactly on its end offset (definite). Returns the construct header
    /// with the full wire span, End-Of-Contents included.
    ///
    /// # Error Handling
    /// Closing with nothing open is reported as `LengthMismatch` against the
    /// end of the cursor region.
    pub fn close(&mut self, cursor: &mut Cursor<'_>) -> DecodeResult<Decoded<Header>> {
        let Some(frame) = self.frames.pop() else {
            return Err(DecodeError::LengthMismatch {
                expected: cursor.end(),
                actual: cursor.position(),
            });
        };
        consume_eoc(cursor, frame.marker)?;
        log::trace!(
            "close {} at {} (depth {})",
            frame.header.identifier,
            cursor.position(),
            self.frames.len()
        );
        Ok(Decoded::new(frame.header, frame.header.start, cursor.position()))
    }

    /// Run `body` inside the construct described by `header`
    ///
    /// Opens the construct, hands the cursor to `body` for the children and
    /// closes it afterwards, returning the body's result together with the
    /// construct's span.
    pub fn within<'a, T, F>(
        &mut self,
        cursor: &mut Cursor<'a>,
        header: Header,
        body: F,
    ) -> DecodeResult<(T, Decoded<Header>)>
    where
        F: FnOnce(&mut Self, &mut Cursor<'a>) -> DecodeResult<T>,
    {
        self.enter(cursor, header)?;
        let value = body(self, cursor)?;
        let span = self.close(cursor)?;
        Ok((value, span))
    }

    /// Skip the next element, whatever its shape
    pub fn skip_element(&mut self, cursor: &mut Cursor<'_>) -> DecodeResult<Decoded<Header>> {
        let header = cursor.decode_header()?;
        self.skip_content(cursor, header)
    }

    /// Skip the content of an element whose header was already decoded
    ///
    /// Constructed content is walked child by child, so nested
    /// indefinite-length values find their own End-Of-Contents.
    pub fn skip_content(
        &mut self,
        cursor: &mut Cursor<'_>,
        header: Header,
    ) -> DecodeResult<Decoded<Header>> {
        if !header.identifier.constructed {
            let len = header.require_definite()?;
            self.check_fits(cursor, &header)?;
            cursor.skip(len)?;
            return Ok(Decoded::new(header, header.start, cursor.position()));
        }

        self.enter(cursor, header)?;
        while !self.at_end(cursor) {
            self.skip_element(cursor)?;
        }
        self.close(cursor)
    }

    /// Check the message is complete
    ///
    /// # Error Handling
    /// - `Empty` if a construct is still open (the message ended inside it)
    /// - `LengthMismatch` if octets remain after the last element
    pub fn finish(&self, cursor: &Cursor<'_>) -> DecodeResult<()> {
        if !self.frames.is_empty() {
            return Err(DecodeError::Empty {
                offset: cursor.end(),
            });
        }
        if !cursor.is_empty() {
            return Err(DecodeError::LengthMismatch {
                expected: cursor.position(),
                actual: cursor.end(),
            });
        }
        Ok(())
    }
}
