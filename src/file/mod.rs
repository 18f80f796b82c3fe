//! Input abstraction for PE images.
//!
//! This module hides where the bytes of an image come from. A [`crate::file::File`] owns a
//! [`crate::file::Backend`], either a memory-mapped file on disk or an in-memory buffer, and
//! hands out bounds-checked slices and [`crate::file::parser::Parser`] cursors over it.
//!
//! # Key Components
//!
//! - [`crate::file::File`] - Owned input image
//! - [`crate::file::Backend`] - Trait for data sources
//! - [`crate::file::parser::Parser`] - Cursor used by every header decoder
//! - [`crate::file::io`] - Little-endian primitive reads
//!
//! # Examples
//!
//! ```rust,no_run
//! use clrpe::File;
//! use std::path::Path;
//!
//! let file = File::from_file(Path::new("app.exe"))?;
//! let mut parser = file.parser();
//! let dos_magic = parser.read_le::<u16>()?;
//! println!("{} bytes, DOS magic 0x{:04X}", file.len(), dos_magic);
//! # Ok::<(), clrpe::Error>(())
//! ```
//!
//! # Resource Model
//!
//! A [`crate::file::File`] is opened, decoded and dropped within a single header read. The
//! decoded records own their data, so nothing borrows from the file afterwards.

pub mod io;
pub mod parser;

mod memory;
mod physical;

use std::path::Path;

use crate::{Error::Empty, Result};
use memory::Memory;
use parser::Parser;
use physical::Physical;

/// Source of the raw bytes of an image.
pub trait Backend: Send + Sync {
    /// Returns `len` bytes starting at `offset`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the range exceeds the data.
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]>;

    /// Returns all bytes of the image.
    fn data(&self) -> &[u8];

    /// Returns the size of the image in bytes.
    fn len(&self) -> usize;
}

/// An input image, independent of where its bytes are stored.
pub struct File {
    data: Box<dyn Backend>,
}

impl File {
    /// Map the file at `file` from disk.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened or mapped, and
    /// [`crate::Error::Empty`] for a zero-length file.
    pub fn from_file(file: &Path) -> Result<File> {
        let input = Physical::new(file)?;

        Self::load(input)
    }

    /// Wrap an in-memory buffer.
    ///
    /// # Errors
    /// Returns [`crate::Error::Empty`] if `data` is empty.
    pub fn from_mem(data: Vec<u8>) -> Result<File> {
        let input = Memory::new(data);

        Self::load(input)
    }

    fn load<T: Backend + 'static>(data: T) -> Result<File> {
        if data.len() == 0 {
            return Err(Empty);
        }

        Ok(File {
            data: Box::new(data),
        })
    }

    /// Size of the image in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the image holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All bytes of the image.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.data.data()
    }

    /// `len` bytes starting at `offset`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the range exceeds the image.
    pub fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        self.data.data_slice(offset, len)
    }

    /// A fresh cursor positioned at offset 0 of the image.
    #[must_use]
    pub fn parser(&self) -> Parser<'_> {
        Parser::new(self.data())
    }
}
