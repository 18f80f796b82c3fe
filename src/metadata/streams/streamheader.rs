//! Stream headers of the .NET metadata root.
//!
//! Each entry of the stream directory names one stream and gives its position and length
//! relative to the start of the metadata root. The length of an entry is not fixed: it depends
//! on its NUL-terminated name, which is padded to a 4-byte boundary.
//!
//! # Reference
//! - [ECMA-335 II.24.2.2](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use crate::{file::parser::Parser, pe::FileRegion, Result};

/// Alignment of the name field, measured from its first byte
const NAME_ALIGNMENT: usize = 4;

/// The role of a metadata stream, derived from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamType {
    /// `#Strings` - identifier heap
    Strings,
    /// `#Blob` or `#US` - length-prefixed binary heaps
    Blob,
    /// `#GUID` - array of 128-bit GUIDs
    Guid,
    /// Any other name, normally `#~` or `#-`
    Table,
}

impl StreamType {
    /// Classify a stream by exact name match.
    #[must_use]
    pub fn from_name(name: &str) -> StreamType {
        match name {
            "#Strings" => StreamType::Strings,
            "#Blob" | "#US" => StreamType::Blob,
            "#GUID" => StreamType::Guid,
            _ => StreamType::Table,
        }
    }
}

/// One entry of the metadata stream directory.
#[derive(Debug, Clone)]
pub struct MdStreamHeader {
    region: FileRegion,
    /// Offset of the stream, relative to the start of the metadata root
    pub offset: u32,
    /// Size of the stream in bytes
    pub size: u32,
    /// Name of the stream, without its terminator
    pub name: String,
    /// Classification of the stream by name
    pub stream_type: StreamType,
}

impl MdStreamHeader {
    /// Decode one stream header at the cursor, leaving the cursor after the name padding.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the fixed fields, the name terminator or the
    /// padding run past the end of the input.
    pub fn read(parser: &mut Parser) -> Result<MdStreamHeader> {
        let start = parser.pos();

        let offset = parser.read_le::<u32>()?;
        let size = parser.read_le::<u32>()?;

        let name_start = parser.pos();
        let name = parser.read_cstring()?;
        parser.align_from(name_start, NAME_ALIGNMENT)?;

        let stream_type = StreamType::from_name(&name);
        log::trace!(
            "stream header '{}' ({:?}): offset 0x{:X}, size 0x{:X}",
            name,
            stream_type,
            offset,
            size
        );

        Ok(MdStreamHeader {
            region: FileRegion::between(start, parser.pos()),
            offset,
            size,
            name,
            stream_type,
        })
    }

    /// Where in the file this record was decoded from, including the name padding.
    #[must_use]
    pub fn region(&self) -> FileRegion {
        self.region
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crafted() {
        #[rustfmt::skip]
        let header_bytes = [
            0x6C, 0x00, 0x00, 0x00,
            0xA4, 0x45, 0x00, 0x00,
            0x23, 0x7E, 0x00, 0x00,
        ];

        let mut parser = Parser::new(&header_bytes);
        let parsed_header = MdStreamHeader::read(&mut parser).unwrap();

        assert_eq!(parsed_header.offset, 0x6C);
        assert_eq!(parsed_header.size, 0x45A4);
        assert_eq!(parsed_header.name, "#~");
        assert_eq!(parsed_header.stream_type, StreamType::Table);
        assert_eq!(parsed_header.region(), FileRegion::new(0, 12));
        assert_eq!(parser.pos(), 12);
    }

    #[test]
    fn name_exactly_fills_alignment() {
        #[rustfmt::skip]
        let header_bytes = [
            0x00, 0x10, 0x00, 0x00,
            0x00, 0x02, 0x00, 0x00,
            b'#', b'S', b't', b'r', b'i', b'n', b'g', b's',
            0x00, 0x00, 0x00, 0x00,
            0xFF, 0xFF, 0xFF, 0xFF, // next entry
        ];

        let mut parser = Parser::new(&header_bytes);
        let parsed_header = MdStreamHeader::read(&mut parser).unwrap();

        assert_eq!(parsed_header.name, "#Strings");
        assert_eq!(parsed_header.stream_type, StreamType::Strings);
        assert_eq!(parser.pos(), 20);
    }

    #[test]
    fn three_byte_name_has_no_padding() {
        #[rustfmt::skip]
        let header_bytes = [
            0x00, 0x10, 0x00, 0x00,
            0x00, 0x02, 0x00, 0x00,
            b'#', b'U', b'S', 0x00,
        ];

        let mut parser = Parser::new(&header_bytes);
        let parsed_header = MdStreamHeader::read(&mut parser).unwrap();

        assert_eq!(parsed_header.name, "#US");
        assert_eq!(parsed_header.stream_type, StreamType::Blob);
        assert_eq!(parser.pos(), 12);
    }

    #[test]
    fn unterminated_name() {
        #[rustfmt::skip]
        let header_bytes = [
            0x00, 0x10, 0x00, 0x00,
            0x00, 0x02, 0x00, 0x00,
            b'#', b'G', b'U', b'I', b'D',
        ];

        let mut parser = Parser::new(&header_bytes);
        assert!(matches!(
            MdStreamHeader::read(&mut parser),
            Err(crate::Error::OutOfBounds { .. })
        ));
    }

    #[test]
    fn classification() {
        assert_eq!(StreamType::from_name("#Strings"), StreamType::Strings);
        assert_eq!(StreamType::from_name("#Blob"), StreamType::Blob);
        assert_eq!(StreamType::from_name("#US"), StreamType::Blob);
        assert_eq!(StreamType::from_name("#GUID"), StreamType::Guid);
        assert_eq!(StreamType::from_name("#~"), StreamType::Table);
        assert_eq!(StreamType::from_name("#-"), StreamType::Table);
        assert_eq!(StreamType::from_name("#strings"), StreamType::Table);
    }
}
