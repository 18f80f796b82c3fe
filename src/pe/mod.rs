//! Operating-system level headers of a PE image.
//!
//! This module decodes everything the Windows loader needs before any managed code is involved:
//! the MS-DOS stub, the `PE\0\0` signature, the COFF file header, the PE32/PE32+ optional header
//! with its data directories, and the section table.
//!
//! # Key Components
//!
//! - [`crate::pe::OsHeaders`] - Aggregate of all of the below, decoded in file order
//! - [`crate::pe::MsDosStub`] - `MZ` signature and `e_lfanew`
//! - [`crate::pe::CoffHeader`] - Machine, section count, characteristics
//! - [`crate::pe::PeHeader`] - The optional header and its [`crate::pe::DataDir`] table
//! - [`crate::pe::SectionHeader`] - One section table entry
//! - [`crate::pe::FileRegion`] - Byte range a record was decoded from
//!
//! # Examples
//!
//! ```rust,no_run
//! use clrpe::{pe::OsHeaders, Parser};
//!
//! let data = std::fs::read("app.exe")?;
//! let mut parser = Parser::new(&data);
//! let headers = OsHeaders::read(&mut parser)?;
//!
//! println!("machine: {}", headers.coff_header().machine_name);
//! for section in headers.section_headers() {
//!     println!("{:8} rva 0x{:08X}", section.name, section.virtual_address);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Reference
//! - Microsoft PE/COFF Specification

/// The COFF file header and machine types
pub mod coff;
/// Optional-header data directories
pub mod datadir;
/// The MS-DOS stub
pub mod dos;
/// The PE32 / PE32+ optional header
pub mod optional;
/// Byte ranges of decoded records
pub mod region;
/// Section table entries
pub mod section;

pub use coff::{CoffCharacteristics, CoffHeader, PE_SIGNATURE};
pub use datadir::{DataDir, DataDirectoryType};
pub use dos::{MsDosStub, DOS_SIGNATURE};
pub use optional::{DllCharacteristics, OptionalHeaderFormat, PeHeader, Subsystem};
pub use region::FileRegion;
pub use section::{SectionCharacteristics, SectionHeader};

use crate::{file::parser::Parser, Result};

/// The DOS stub, COFF header, optional header and section table of an image.
#[derive(Debug, Clone)]
pub struct OsHeaders {
    region: FileRegion,
    ms_dos_stub: MsDosStub,
    coff_header: CoffHeader,
    pe_header: PeHeader,
    data_sections_offset: u64,
    section_headers: Vec<SectionHeader>,
}

impl OsHeaders {
    /// Decode the operating-system headers. The cursor must be at offset 0 of the image.
    ///
    /// The optional header is expected to span exactly `CoffHeader::optional_header_size`
    /// bytes; the section table is read from that computed position regardless of how many
    /// bytes the optional header decoder consumed.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for a bad DOS or PE signature or an invalid optional
    /// header, and [`crate::Error::OutOfBounds`] if any of the headers is truncated.
    pub fn read(parser: &mut Parser) -> Result<OsHeaders> {
        let start = parser.pos();

        let ms_dos_stub = MsDosStub::read(parser)?;
        parser.seek(ms_dos_stub.pe_header_offset as usize)?;

        let signature = parser.read_le::<u32>()?;
        if signature != PE_SIGNATURE {
            return Err(malformed_error!("invalid PE signature - 0x{:08X}", signature));
        }

        let coff_header = CoffHeader::read(parser)?;
        log::debug!(
            "COFF header at 0x{:X}: machine {} (0x{:04X}), {} sections",
            coff_header.region().start,
            coff_header.machine_name,
            coff_header.machine_raw,
            coff_header.section_count
        );

        let data_sections_offset = parser.pos() + usize::from(coff_header.optional_header_size);
        let pe_header = PeHeader::read(parser)?;

        parser.seek(data_sections_offset)?;
        let mut section_headers = Vec::with_capacity(usize::from(coff_header.section_count));
        for _ in 0..coff_header.section_count {
            let section = SectionHeader::read(parser)?;
            log::trace!(
                "section {:8} rva 0x{:08X} vsize 0x{:X} raw 0x{:X}@0x{:X}",
                section.name,
                section.virtual_address,
                section.virtual_size,
                section.size_of_raw_data,
                section.pointer_to_raw_data
            );
            section_headers.push(section);
        }

        Ok(OsHeaders {
            region: FileRegion::between(start, parser.pos()),
            ms_dos_stub,
            coff_header,
            pe_header,
            data_sections_offset: data_sections_offset as u64,
            section_headers,
        })
    }

    /// Byte range from the DOS stub to the end of the section table.
    #[must_use]
    pub fn region(&self) -> FileRegion {
        self.region
    }

    /// The MS-DOS stub.
    #[must_use]
    pub fn ms_dos_stub(&self) -> &MsDosStub {
        &self.ms_dos_stub
    }

    /// The COFF file header.
    #[must_use]
    pub fn coff_header(&self) -> &CoffHeader {
        &self.coff_header
    }

    /// The optional header.
    #[must_use]
    pub fn pe_header(&self) -> &PeHeader {
        &self.pe_header
    }

    /// File offset of the section table.
    #[must_use]
    pub fn data_sections_offset(&self) -> u64 {
        self.data_sections_offset
    }

    /// The section table, in file order.
    #[must_use]
    pub fn section_headers(&self) -> &[SectionHeader] {
        &self.section_headers
    }

    /// The first section named `name`.
    #[must_use]
    pub fn section_by_name(&self, name: &str) -> Option<&SectionHeader> {
        self.section_headers
            .iter()
            .find(|section| section.name == name)
    }
}
