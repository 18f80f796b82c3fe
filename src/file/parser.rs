//! Cursor-based binary parser shared by every header decoder.
//!
//! [`crate::file::parser::Parser`] keeps a position inside a byte slice and offers bounds-checked,
//! little-endian reads. Decoders read from the current position, may reposition the cursor with
//! [`crate::file::parser::Parser::seek`], and use [`crate::file::parser::Parser::pos`] to record the
//! [`crate::pe::FileRegion`] they were decoded from.
//!
//! # Examples
//!
//! ```rust
//! use clrpe::Parser;
//!
//! let data = [0x4D, 0x5A, 0x00, 0x00, 0x80, 0x00, 0x00, 0x00];
//! let mut parser = Parser::new(&data);
//!
//! assert_eq!(parser.read_le::<u16>()?, 0x5A4D);
//! parser.seek(4)?;
//! assert_eq!(parser.read_le::<u32>()?, 0x80);
//! assert_eq!(parser.pos(), 8);
//! # Ok::<(), clrpe::Error>(())
//! ```

use crate::{
    file::io::{read_le_at, PeIO},
    Result,
};

/// A binary cursor over a borrowed byte slice.
///
/// All reads are little-endian and bounds-checked; a failing read leaves the position unchanged.
pub struct Parser<'a> {
    /// The binary data being parsed
    data: &'a [u8],
    /// Current position within the data buffer
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new [`Parser`] positioned at offset 0.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Returns the length of the underlying data buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the parser has no data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of bytes between the current position and the end of the buffer.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Move the current position to `pos`.
    ///
    /// Seeking exactly to the end of the buffer is allowed, so that a zero-length record at the
    /// very end can still be "read".
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `pos` lies beyond the data length.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(out_of_bounds_error!());
        }

        self.position = pos;
        Ok(())
    }

    /// Move the position forward by `step` bytes.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if advancing would exceed the data length.
    pub fn advance_by(&mut self, step: usize) -> Result<()> {
        match self.position.checked_add(step) {
            Some(end) if end <= self.data.len() => {
                self.position = end;
                Ok(())
            }
            _ => Err(out_of_bounds_error!()),
        }
    }

    /// Skip the padding needed to make `pos() - base` a multiple of `alignment`.
    ///
    /// Metadata stream names and the metadata version string are padded relative to the start
    /// of their own field, not relative to the start of the file.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the padding runs past the end of the data, or
    /// [`crate::Error::Malformed`] if `alignment` is zero or `base` lies after the current
    /// position.
    pub fn align_from(&mut self, base: usize, alignment: usize) -> Result<()> {
        if alignment == 0 {
            return Err(malformed_error!("Alignment must not be zero"));
        }

        let Some(consumed) = self.position.checked_sub(base) else {
            return Err(malformed_error!(
                "Alignment base {} lies after position {}",
                base,
                self.position
            ));
        };

        let padding = (alignment - (consumed % alignment)) % alignment;
        self.advance_by(padding)
    }

    /// Get the current position of the parser within the data buffer.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// Get access to the underlying data buffer.
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Read a value of type `T` in little-endian format and advance past it.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading `T` would exceed the data length.
    pub fn read_le<T: PeIO>(&mut self) -> Result<T> {
        read_le_at::<T>(self.data, &mut self.position)
    }

    /// Read `length` raw bytes and advance past them.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than `length` bytes remain.
    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8]> {
        let start = self.position;
        self.advance_by(length)?;
        Ok(&self.data[start..self.position])
    }

    /// Read a NUL-terminated byte string, consuming the terminator.
    ///
    /// Bytes are mapped one-to-one onto chars (Latin-1), which is lossless for the ASCII
    /// identifiers found in metadata stream names.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the data ends before a terminator is found; the
    /// position is left unchanged in that case.
    pub fn read_cstring(&mut self) -> Result<String> {
        let start = self.position;
        let Some(length) = self.data[start..].iter().position(|&byte| byte == 0) else {
            return Err(out_of_bounds_error!());
        };

        let name = latin1_trimmed(&self.data[start..start + length]);
        self.position = start + length + 1;
        Ok(name)
    }
}

/// Convert raw header bytes to a string, stopping at the first NUL.
///
/// Used for fixed-width name fields (section names, the metadata version string) which are not
/// required to carry a terminator when every byte is in use.
#[must_use]
pub fn latin1_trimmed(bytes: &[u8]) -> String {
    bytes
        .iter()
        .take_while(|&&byte| byte != 0)
        .map(|&byte| char::from(byte))
        .collect()
}
