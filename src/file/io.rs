//! Bounds-checked little-endian primitive reads.
//!
//! Every integer in the PE/COFF and CLI metadata headers is stored little-endian, so this module
//! only offers the little-endian direction. All reads validate that enough bytes remain before
//! touching the buffer and report [`crate::Error::OutOfBounds`] otherwise.
//!
//! # Key Components
//!
//! - [`crate::file::io::PeIO`] - Trait for fixed-width primitives that can be decoded from bytes
//! - [`crate::file::io::read_le`] - Read a value from the start of a buffer
//! - [`crate::file::io::read_le_at`] - Read a value at an offset and advance the offset
//!
//! # Examples
//!
//! ```rust,ignore
//! use clrpe::file::io::{read_le, read_le_at};
//!
//! let data = [0x4D, 0x5A, 0x90, 0x00];
//! let magic: u16 = read_le(&data)?;
//! assert_eq!(magic, 0x5A4D);
//!
//! let mut offset = 2;
//! let next: u16 = read_le_at(&data, &mut offset)?;
//! assert_eq!(next, 0x0090);
//! assert_eq!(offset, 4);
//! # Ok::<(), clrpe::Error>(())
//! ```

use crate::Result;

/// Fixed-width primitive that can be decoded from its little-endian byte representation.
///
/// Implemented for the unsigned integer widths used by the PE and CLI header layouts.
pub trait PeIO: Sized {
    /// Byte array type holding exactly one encoded value
    type Bytes: Sized + for<'a> TryFrom<&'a [u8]>;

    /// Decode `Self` from little-endian bytes
    fn from_le_bytes(bytes: Self::Bytes) -> Self;
}

macro_rules! impl_pe_io {
    ($($ty:ty),* $(,)?) => {
        $(
            impl PeIO for $ty {
                type Bytes = [u8; std::mem::size_of::<$ty>()];

                fn from_le_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_le_bytes(bytes)
                }
            }
        )*
    };
}

impl_pe_io!(u8, u16, u32, u64);

/// Reads a value of type `T` in little-endian byte order from the start of `data`.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if `data` is shorter than `T`.
pub fn read_le<T: PeIO>(data: &[u8]) -> Result<T> {
    let mut offset = 0_usize;
    read_le_at(data, &mut offset)
}

/// Reads a value of type `T` in little-endian byte order at `offset`, advancing `offset` past it.
///
/// The offset is left untouched when the read fails.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if fewer than `size_of::<T>()` bytes remain at `offset`.
pub fn read_le_at<T: PeIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    let Some(end) = offset.checked_add(type_len) else {
        return Err(out_of_bounds_error!());
    };
    if end > data.len() {
        return Err(out_of_bounds_error!());
    }

    let Ok(read) = data[*offset..end].try_into() else {
        return Err(out_of_bounds_error!());
    };

    *offset = end;

    Ok(T::from_le_bytes(read))
}
