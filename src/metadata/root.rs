//! Metadata root header and stream directory for .NET assemblies.
//!
//! This module defines [`StorageSigAndHeader`], the fixed part of the metadata root, and
//! [`MetaDataHeaders`], which adds the stream directory that follows it.
//!
//! # Overview
//!
//! The metadata root is located through the `MetaData` directory of the
//! [`crate::metadata::cor20header::Cor20Header`]. It starts with the `BSJB` signature and a
//! version string, followed by the number of streams and one [`MdStreamHeader`] per stream.
//! Stream offsets are relative to the start of the root.
//!
//! # Example
//!
//! ```rust
//! use clrpe::{metadata::root::MetaDataHeaders, Parser};
//!
//! let data = [
//!     0x42, 0x53, 0x4A, 0x42,
//!     0x01, 0x00,
//!     0x01, 0x00,
//!     0x00, 0x00, 0x00, 0x00,
//!     0x04, 0x00, 0x00, 0x00,
//!     b'v', b'4', 0x00, 0x00,
//!     0x00, 0x00,
//!     0x01, 0x00,
//!     0x6C, 0x00, 0x00, 0x00, // MdStreamHeader
//!     0x10, 0x00, 0x00, 0x00,
//!     0x23, 0x7E, 0x00, 0x00,
//! ];
//! let headers = MetaDataHeaders::read(&mut Parser::new(&data))?;
//! assert_eq!(headers.storage_sig_and_header().version, "v4");
//! assert_eq!(headers.table_stream_header().map(|s| s.offset), Some(0x6C));
//! # Ok::<(), clrpe::Error>(())
//! ```
//!
//! # References
//!
//! - [ECMA-335 II.24.2.1: Metadata root](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use crate::{
    file::parser::{latin1_trimmed, Parser},
    metadata::streams::{MdStreamHeader, StreamType},
    pe::FileRegion,
    Result,
};

/// The MAGIC value indicating the CIL header, "BSJB"
pub const CIL_HEADER_MAGIC: u32 = 0x424A_5342;

/// Alignment of the version string, measured from its first byte
const VERSION_ALIGNMENT: usize = 4;

/// Smallest possible stream header: offset, size and a padded 3-character name
const MIN_STREAM_HEADER_SIZE: usize = 12;

/// The fixed part of the metadata root, up to and including the stream count.
#[derive(Debug, Clone)]
pub struct StorageSigAndHeader {
    region: FileRegion,
    /// Magic signature for physical metadata: 0x424A5342
    pub signature: u32,
    /// `MajorVersion`
    pub major_version: u16,
    /// `MinorVersion`
    pub minor_version: u16,
    /// Always 0
    pub reserved: u32,
    /// Number of bytes allocated to hold the version string
    pub version_length: u32,
    /// Version string, up to its first NUL
    pub version: String,
    /// Reserved, always 0
    pub flags: u8,
    /// Padding byte
    pub pad: u8,
    /// Number of stream headers that follow
    pub stream_count: u16,
}

impl StorageSigAndHeader {
    /// Decode the fixed part of the metadata root at the cursor.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the signature is not `BSJB`, and
    /// [`crate::Error::OutOfBounds`] if the header or the version string is truncated.
    pub fn read(parser: &mut Parser) -> Result<StorageSigAndHeader> {
        let start = parser.pos();

        let signature = parser.read_le::<u32>()?;
        if signature != CIL_HEADER_MAGIC {
            return Err(malformed_error!("CIL_HEADER_MAGIC does not match - 0x{:08X}", signature));
        }

        let major_version = parser.read_le::<u16>()?;
        let minor_version = parser.read_le::<u16>()?;
        let reserved = parser.read_le::<u32>()?;
        let version_length = parser.read_le::<u32>()?;

        let version_start = parser.pos();
        let version = latin1_trimmed(parser.read_bytes(version_length as usize)?);
        parser.align_from(version_start, VERSION_ALIGNMENT)?;

        let flags = parser.read_le::<u8>()?;
        let pad = parser.read_le::<u8>()?;
        let stream_count = parser.read_le::<u16>()?;

        Ok(StorageSigAndHeader {
            region: FileRegion::between(start, parser.pos()),
            signature,
            major_version,
            minor_version,
            reserved,
            version_length,
            version,
            flags,
            pad,
            stream_count,
        })
    }

    /// Where in the file this record was decoded from. Its start is the base of all stream
    /// offsets.
    #[must_use]
    pub fn region(&self) -> FileRegion {
        self.region
    }
}

/// The metadata root together with its stream directory.
///
/// Streams are classified by [`StreamType`]. When several streams share a class, the one listed
/// last in the directory occupies the slot; every header stays available through
/// [`MetaDataHeaders::stream_headers`].
#[derive(Debug, Clone)]
pub struct MetaDataHeaders {
    region: FileRegion,
    storage_sig_and_header: StorageSigAndHeader,
    strings_stream_header: Option<MdStreamHeader>,
    blob_stream_header: Option<MdStreamHeader>,
    guid_stream_header: Option<MdStreamHeader>,
    table_stream_header: Option<MdStreamHeader>,
    stream_headers: Vec<MdStreamHeader>,
}

impl MetaDataHeaders {
    /// Decode the metadata root and its `stream_count` stream headers at the cursor.
    ///
    /// # Errors
    /// Returns an error if [`StorageSigAndHeader::read`] fails or a stream header is truncated.
    pub fn read(parser: &mut Parser) -> Result<MetaDataHeaders> {
        let start = parser.pos();
        let storage_sig_and_header = StorageSigAndHeader::read(parser)?;
        log::debug!(
            "metadata root '{}' at 0x{:X}: {} streams",
            storage_sig_and_header.version,
            storage_sig_and_header.region().start,
            storage_sig_and_header.stream_count
        );

        let declared = usize::from(storage_sig_and_header.stream_count);
        let mut stream_headers =
            Vec::with_capacity(declared.min(parser.remaining() / MIN_STREAM_HEADER_SIZE));
        for _ in 0..declared {
            stream_headers.push(MdStreamHeader::read(parser)?);
        }

        let mut headers = MetaDataHeaders {
            region: FileRegion::between(start, parser.pos()),
            storage_sig_and_header,
            strings_stream_header: None,
            blob_stream_header: None,
            guid_stream_header: None,
            table_stream_header: None,
            stream_headers: Vec::new(),
        };

        for stream in &stream_headers {
            let slot = match stream.stream_type {
                StreamType::Strings => &mut headers.strings_stream_header,
                StreamType::Blob => &mut headers.blob_stream_header,
                StreamType::Guid => &mut headers.guid_stream_header,
                StreamType::Table => &mut headers.table_stream_header,
            };
            *slot = Some(stream.clone());
        }
        headers.stream_headers = stream_headers;

        Ok(headers)
    }

    /// Byte range from the `BSJB` signature to the end of the last stream header.
    #[must_use]
    pub fn region(&self) -> FileRegion {
        self.region
    }

    /// The fixed part of the root.
    #[must_use]
    pub fn storage_sig_and_header(&self) -> &StorageSigAndHeader {
        &self.storage_sig_and_header
    }

    /// The last `#Strings` stream.
    #[must_use]
    pub fn strings_stream_header(&self) -> Option<&MdStreamHeader> {
        self.strings_stream_header.as_ref()
    }

    /// The last `#Blob` or `#US` stream.
    #[must_use]
    pub fn blob_stream_header(&self) -> Option<&MdStreamHeader> {
        self.blob_stream_header.as_ref()
    }

    /// The last `#GUID` stream.
    #[must_use]
    pub fn guid_stream_header(&self) -> Option<&MdStreamHeader> {
        self.guid_stream_header.as_ref()
    }

    /// The last stream not classified as a heap, normally `#~`.
    #[must_use]
    pub fn table_stream_header(&self) -> Option<&MdStreamHeader> {
        self.table_stream_header.as_ref()
    }

    /// All stream headers in directory order.
    #[must_use]
    pub fn stream_headers(&self) -> &[MdStreamHeader] {
        &self.stream_headers
    }

    /// File offset of the table stream: its root-relative offset plus the root's start.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if there is no table stream or the sum overflows.
    pub fn table_stream_offset(&self) -> Result<u64> {
        let Some(table_stream) = &self.table_stream_header else {
            return Err(malformed_error!("metadata has no table stream"));
        };

        self.storage_sig_and_header
            .region()
            .start
            .checked_add(u64::from(table_stream.offset))
            .ok_or_else(|| malformed_error!("table stream offset overflows"))
    }
}
