use bitflags::bitflags;

use crate::{file::parser::Parser, metadata::streams::TableId, pe::FileRegion, Result};

/// Number of bit positions in the valid/sorted masks
pub const MAX_TABLES: usize = 64;

bitflags! {
    #[derive(PartialEq, Eq, Debug, Clone, Copy)]
    /// `HeapSizes` flags: which heaps are indexed with 4 instead of 2 bytes
    pub struct HeapSizes: u8 {
        /// `#Strings` indexes are 4 bytes wide
        const STRINGS = 0x01;
        /// `#GUID` indexes are 4 bytes wide
        const GUID = 0x02;
        /// `#Blob` indexes are 4 bytes wide
        const BLOB = 0x04;
    }
}

/// The header at the start of the `#~` stream: the table presence bitmap and one row count for
/// every present table.
///
/// Only the header is decoded; the table rows that follow it are left untouched.
///
/// ## Reference
/// * [ECMA-335 II.24.2.6](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf) - #~ stream
#[derive(Debug, Clone)]
pub struct MetaDataTableHeader {
    region: FileRegion,
    /// Reserved, always 0
    pub reserved: u32,
    /// Major version of the table schema
    pub major_version: u8,
    /// Minor version of the table schema
    pub minor_version: u8,
    /// Raw heap index width flags, see [`HeapSizes`]
    pub heap_offset_sizes: u8,
    /// Reserved, always 1
    pub rid_placeholder: u8,
    /// Bit `n` is set if table `n` is present
    pub mask_valid: u64,
    /// Bit `n` is set if table `n` is sorted
    pub mask_sorted: u64,
    /// Row count per bit position; zero wherever `mask_valid` is clear
    pub table_row_counts: [u32; MAX_TABLES],
}

impl MetaDataTableHeader {
    /// Decode the table stream header at the cursor.
    ///
    /// After the fixed 24 bytes, one `u32` row count is consumed per set bit of `mask_valid`, in
    /// ascending bit order. Clear bits consume nothing.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the header or a row count is truncated.
    pub fn read(parser: &mut Parser) -> Result<MetaDataTableHeader> {
        let start = parser.pos();

        let reserved = parser.read_le::<u32>()?;
        let major_version = parser.read_le::<u8>()?;
        let minor_version = parser.read_le::<u8>()?;
        let heap_offset_sizes = parser.read_le::<u8>()?;
        let rid_placeholder = parser.read_le::<u8>()?;
        let mask_valid = parser.read_le::<u64>()?;
        let mask_sorted = parser.read_le::<u64>()?;

        let mut table_row_counts = [0u32; MAX_TABLES];
        for (index, row_count) in table_row_counts.iter_mut().enumerate() {
            if mask_valid & (1u64 << index) != 0 {
                *row_count = parser.read_le::<u32>()?;
            }
        }

        log::debug!(
            "table stream header v{}.{} at 0x{:X}: {} tables present",
            major_version,
            minor_version,
            start,
            mask_valid.count_ones()
        );

        Ok(MetaDataTableHeader {
            region: FileRegion::between(start, parser.pos()),
            reserved,
            major_version,
            minor_version,
            heap_offset_sizes,
            rid_placeholder,
            mask_valid,
            mask_sorted,
            table_row_counts,
        })
    }

    /// Where in the file this record was decoded from, including the row counts.
    #[must_use]
    pub fn region(&self) -> FileRegion {
        self.region
    }

    /// Number of present tables
    #[must_use]
    pub fn table_count(&self) -> u32 {
        self.mask_valid.count_ones()
    }

    /// Returns `true` if the table at bit position `index` is present. Positions above 63 are
    /// never present.
    #[must_use]
    pub fn is_valid(&self, index: usize) -> bool {
        index < MAX_TABLES && self.mask_valid & (1u64 << index) != 0
    }

    /// Returns `true` if the table at bit position `index` is flagged as sorted.
    #[must_use]
    pub fn is_sorted(&self, index: usize) -> bool {
        index < MAX_TABLES && self.mask_sorted & (1u64 << index) != 0
    }

    /// Row count of the table at bit position `index`, zero if absent or out of range.
    #[must_use]
    pub fn row_count_at(&self, index: usize) -> u32 {
        self.table_row_counts.get(index).copied().unwrap_or(0)
    }

    /// Row count of `table_id`, zero if the table is absent.
    #[must_use]
    pub fn row_count(&self, table_id: TableId) -> u32 {
        self.row_count_at(table_id.index())
    }

    /// The named tables that are present, in ascending order. Reserved bit positions are skipped.
    pub fn present_tables(&self) -> impl Iterator<Item = TableId> + '_ {
        use strum::IntoEnumIterator;

        TableId::iter().filter(|table_id| self.is_valid(table_id.index()))
    }

    /// The heap index width flags; unknown bits are retained.
    #[must_use]
    pub fn heap_sizes(&self) -> HeapSizes {
        HeapSizes::from_bits_retain(self.heap_offset_sizes)
    }
}
