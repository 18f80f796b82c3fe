use bitflags::bitflags;

use crate::{
    file::parser::{latin1_trimmed, Parser},
    pe::FileRegion,
    Result,
};

/// Size of one section table entry in bytes
pub const SECTION_HEADER_SIZE: usize = 40;

/// Mask of the `IMAGE_SCN_ALIGN_*` nibble inside the section characteristics
const ALIGNMENT_MASK: u32 = 0x00F0_0000;

bitflags! {
    #[derive(PartialEq, Eq, Debug, Clone, Copy)]
    /// `IMAGE_SCN_*` flags of a section header, excluding the alignment nibble
    pub struct SectionCharacteristics: u32 {
        /// The section contains executable code
        const CNT_CODE = 0x0000_0020;
        /// The section contains initialized data
        const CNT_INITIALIZED_DATA = 0x0000_0040;
        /// The section contains uninitialized data
        const CNT_UNINITIALIZED_DATA = 0x0000_0080;
        /// The section contains extended relocations
        const LNK_NRELOC_OVFL = 0x0100_0000;
        /// The section can be discarded as needed
        const MEM_DISCARDABLE = 0x0200_0000;
        /// The section cannot be cached
        const MEM_NOT_CACHED = 0x0400_0000;
        /// The section is not pageable
        const MEM_NOT_PAGED = 0x0800_0000;
        /// The section can be shared in memory
        const MEM_SHARED = 0x1000_0000;
        /// The section can be executed as code
        const MEM_EXECUTE = 0x2000_0000;
        /// The section can be read
        const MEM_READ = 0x4000_0000;
        /// The section can be written to
        const MEM_WRITE = 0x8000_0000;
    }
}

/// One entry of the section table.
#[derive(Debug, Clone)]
pub struct SectionHeader {
    region: FileRegion,
    /// Section name, up to 8 bytes, trailing NULs removed
    pub name: String,
    /// Size of the section when loaded into memory
    pub virtual_size: u32,
    /// RVA of the first byte of the section when loaded
    pub virtual_address: u32,
    /// Size of the initialized data on disk
    pub size_of_raw_data: u32,
    /// File offset of the section's raw data
    pub pointer_to_raw_data: u32,
    /// File offset of the relocation entries, zero for images
    pub pointer_to_relocations: u32,
    /// File offset of the COFF line numbers, deprecated
    pub pointer_to_line_numbers: u32,
    /// Number of relocation entries
    pub number_of_relocations: u16,
    /// Number of line-number entries
    pub number_of_line_numbers: u16,
    /// Raw characteristics bitmask, see [`SectionCharacteristics`]
    pub characteristics: u32,
}

impl SectionHeader {
    /// Decode one 40-byte section header at the cursor.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than 40 bytes remain.
    pub fn read(parser: &mut Parser) -> Result<SectionHeader> {
        let start = parser.pos();

        let name = latin1_trimmed(parser.read_bytes(8)?);
        let virtual_size = parser.read_le::<u32>()?;
        let virtual_address = parser.read_le::<u32>()?;
        let size_of_raw_data = parser.read_le::<u32>()?;
        let pointer_to_raw_data = parser.read_le::<u32>()?;
        let pointer_to_relocations = parser.read_le::<u32>()?;
        let pointer_to_line_numbers = parser.read_le::<u32>()?;
        let number_of_relocations = parser.read_le::<u16>()?;
        let number_of_line_numbers = parser.read_le::<u16>()?;
        let characteristics = parser.read_le::<u32>()?;

        Ok(SectionHeader {
            region: FileRegion::between(start, parser.pos()),
            name,
            virtual_size,
            virtual_address,
            size_of_raw_data,
            pointer_to_raw_data,
            pointer_to_relocations,
            pointer_to_line_numbers,
            number_of_relocations,
            number_of_line_numbers,
            characteristics,
        })
    }

    /// Where in the file this record was decoded from.
    #[must_use]
    pub fn region(&self) -> FileRegion {
        self.region
    }

    /// The characteristics as typed flags; the alignment nibble is available via
    /// [`SectionHeader::alignment`].
    #[must_use]
    pub fn characteristics_flags(&self) -> SectionCharacteristics {
        SectionCharacteristics::from_bits_truncate(self.characteristics)
    }

    /// Data alignment in bytes encoded by the `IMAGE_SCN_ALIGN_*` nibble, `None` if unset.
    #[must_use]
    pub fn alignment(&self) -> Option<u32> {
        match (self.characteristics & ALIGNMENT_MASK) >> 20 {
            0 | 0xF => None,
            exponent => Some(1 << (exponent - 1)),
        }
    }

    /// Number of RVA bytes this section covers: the larger of its virtual and raw sizes.
    #[must_use]
    pub fn mapped_size(&self) -> u32 {
        self.virtual_size.max(self.size_of_raw_data)
    }

    /// Returns `true` if `rva` lies inside `virtual_address .. virtual_address + mapped_size()`.
    #[must_use]
    pub fn contains_rva(&self, rva: u32) -> bool {
        let start = u64::from(self.virtual_address);
        let end = start + u64::from(self.mapped_size());
        (start..end).contains(&u64::from(rva))
    }
}
