//! COFF file header decoding.
//!
//! The COFF header is the fixed 20-byte record that follows the `PE\0\0` signature. It names the
//! target machine, the number of section headers, and the size of the optional header that sits
//! between it and the section table.
//!
//! # Reference
//! - Microsoft PE/COFF Specification, "COFF File Header (Object and Image)"

use bitflags::bitflags;

use crate::{file::parser::Parser, pe::FileRegion, Result};

/// The `PE\0\0` signature preceding the COFF header
pub const PE_SIGNATURE: u32 = 0x0000_4550;

/// Size of the COFF file header in bytes
pub const COFF_HEADER_SIZE: usize = 20;

/// Name reported for machine codes that are not in [`MACHINE_TYPES`]
pub const UNKNOWN_MACHINE: &str = "UNKNOWN";

/// Known `IMAGE_FILE_MACHINE_*` codes and their symbolic names.
pub const MACHINE_TYPES: [(u16, &str); 30] = [
    (0x014C, "I386"),
    (0x0162, "R3000"),
    (0x0166, "R4000"),
    (0x0168, "R10000"),
    (0x0169, "WCEMIPSV2"),
    (0x0184, "ALPHA"),
    (0x01A2, "SH3"),
    (0x01A3, "SH3DSP"),
    (0x01A4, "SH3E"),
    (0x01A6, "SH4"),
    (0x01A8, "SH5"),
    (0x01C0, "ARM"),
    (0x01C2, "THUMB"),
    (0x01C4, "ARMNT"),
    (0x01D3, "AM33"),
    (0x01F0, "POWERPC"),
    (0x01F1, "POWERPCFP"),
    (0x0200, "IA64"),
    (0x0266, "MIPS16"),
    (0x0284, "ALPHA64"),
    (0x0366, "MIPSFPU"),
    (0x0466, "MIPSFPU16"),
    (0x0520, "TRICORE"),
    (0x0CEF, "CEF"),
    (0x0EBC, "EBC"),
    (0x5032, "RISCV32"),
    (0x5064, "RISCV64"),
    (0x8664, "AMD64"),
    (0x9041, "M32R"),
    (0xAA64, "ARM64"),
];

/// Resolve a COFF machine code to its symbolic name.
///
/// Codes outside [`MACHINE_TYPES`] resolve to [`UNKNOWN_MACHINE`]; this lookup never fails.
#[must_use]
pub fn machine_name(machine: u16) -> &'static str {
    MACHINE_TYPES
        .iter()
        .find(|(code, _)| *code == machine)
        .map_or(UNKNOWN_MACHINE, |(_, name)| *name)
}

bitflags! {
    #[derive(PartialEq, Eq, Debug, Clone, Copy)]
    /// `IMAGE_FILE_*` characteristics of the COFF header
    pub struct CoffCharacteristics: u16 {
        /// Image does not contain base relocations
        const RELOCS_STRIPPED = 0x0001;
        /// Image is valid and can be run
        const EXECUTABLE_IMAGE = 0x0002;
        /// COFF line numbers have been removed
        const LINE_NUMS_STRIPPED = 0x0004;
        /// COFF local symbols have been removed
        const LOCAL_SYMS_STRIPPED = 0x0008;
        /// Aggressively trim the working set (obsolete)
        const AGGRESSIVE_WS_TRIM = 0x0010;
        /// Application can handle addresses above 2 GB
        const LARGE_ADDRESS_AWARE = 0x0020;
        /// Little endian (obsolete)
        const BYTES_REVERSED_LO = 0x0080;
        /// Machine is based on a 32-bit word architecture
        const MACHINE_32BIT = 0x0100;
        /// Debugging information is removed from the image
        const DEBUG_STRIPPED = 0x0200;
        /// Copy the image to swap if it lives on removable media
        const REMOVABLE_RUN_FROM_SWAP = 0x0400;
        /// Copy the image to swap if it lives on network media
        const NET_RUN_FROM_SWAP = 0x0800;
        /// The image is a system file
        const SYSTEM = 0x1000;
        /// The image is a dynamic-link library
        const DLL = 0x2000;
        /// Run only on a uniprocessor machine
        const UP_SYSTEM_ONLY = 0x4000;
        /// Big endian (obsolete)
        const BYTES_REVERSED_HI = 0x8000;
    }
}

/// The COFF file header.
#[derive(Debug, Clone)]
pub struct CoffHeader {
    region: FileRegion,
    /// Raw `IMAGE_FILE_MACHINE_*` code
    pub machine_raw: u16,
    /// Symbolic machine name, [`UNKNOWN_MACHINE`] for unlisted codes
    pub machine_name: &'static str,
    /// Number of entries in the section table
    pub section_count: u16,
    /// Seconds since 1970-01-01 00:00 UTC at link time
    pub timestamp: u32,
    /// File offset of the COFF symbol table, zero if absent
    pub symbol_table_ptr: u32,
    /// Number of entries in the symbol table
    pub symbol_count: u32,
    /// Size in bytes of the optional header that follows
    pub optional_header_size: u16,
    /// Raw characteristics bitmask, see [`CoffCharacteristics`]
    pub characteristics: u16,
}

impl CoffHeader {
    /// Decode the COFF header. The cursor must point just past the `PE\0\0` signature.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than 20 bytes remain.
    pub fn read(parser: &mut Parser) -> Result<CoffHeader> {
        let start = parser.pos();

        let machine_raw = parser.read_le::<u16>()?;
        let section_count = parser.read_le::<u16>()?;
        let timestamp = parser.read_le::<u32>()?;
        let symbol_table_ptr = parser.read_le::<u32>()?;
        let symbol_count = parser.read_le::<u32>()?;
        let optional_header_size = parser.read_le::<u16>()?;
        let characteristics = parser.read_le::<u16>()?;

        Ok(CoffHeader {
            region: FileRegion::between(start, parser.pos()),
            machine_raw,
            machine_name: machine_name(machine_raw),
            section_count,
            timestamp,
            symbol_table_ptr,
            symbol_count,
            optional_header_size,
            characteristics,
        })
    }

    /// Where in the file this record was decoded from.
    #[must_use]
    pub fn region(&self) -> FileRegion {
        self.region
    }

    /// The characteristics as typed flags; unknown bits are retained.
    #[must_use]
    pub fn characteristics_flags(&self) -> CoffCharacteristics {
        CoffCharacteristics::from_bits_retain(self.characteristics)
    }

    /// Returns `true` if the image is a DLL.
    #[must_use]
    pub fn is_dll(&self) -> bool {
        self.characteristics_flags()
            .contains(CoffCharacteristics::DLL)
    }

    /// Returns `true` if the image is marked as executable.
    #[must_use]
    pub fn is_executable(&self) -> bool {
        self.characteristics_flags()
            .contains(CoffCharacteristics::EXECUTABLE_IMAGE)
    }
}
