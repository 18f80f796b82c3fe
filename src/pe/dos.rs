use crate::{file::parser::Parser, pe::FileRegion, Result};

/// The `MZ` signature at offset 0 of every PE image
pub const DOS_SIGNATURE: u16 = 0x5A4D;

/// Offset of `e_lfanew`, the file offset of the PE signature, inside the DOS header
pub const E_LFANEW_OFFSET: usize = 0x3C;

/// The legacy MS-DOS header, reduced to what is needed to locate the PE headers.
#[derive(Debug, Clone)]
pub struct MsDosStub {
    region: FileRegion,
    e_lfanew_region: FileRegion,
    /// File offset of the `PE\0\0` signature (`e_lfanew`)
    pub pe_header_offset: u32,
}

impl MsDosStub {
    /// Decode the DOS stub. The cursor must be at offset 0 and is left just after `e_lfanew`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the first two bytes are not `MZ`, and
    /// [`crate::Error::OutOfBounds`] if the image ends before `e_lfanew`.
    pub fn read(parser: &mut Parser) -> Result<MsDosStub> {
        let start = parser.pos();

        let signature = parser.read_le::<u16>()?;
        if signature != DOS_SIGNATURE {
            return Err(malformed_error!("invalid DOS signature - 0x{:04X}", signature));
        }

        let e_lfanew = start + E_LFANEW_OFFSET;
        parser.seek(e_lfanew)?;
        let pe_header_offset = parser.read_le::<u32>()?;

        Ok(MsDosStub {
            region: FileRegion::between(start, parser.pos()),
            e_lfanew_region: FileRegion::between(e_lfanew, parser.pos()),
            pe_header_offset,
        })
    }

    /// Where in the file this record was decoded from.
    #[must_use]
    pub fn region(&self) -> FileRegion {
        self.region
    }

    /// Where the `e_lfanew` field itself is stored.
    #[must_use]
    pub fn e_lfanew_region(&self) -> FileRegion {
        self.e_lfanew_region
    }
}
