use strum::{EnumCount, EnumIter};

use crate::{file::parser::Parser, pe::FileRegion, Result};

/// Size of one `(RVA, Size)` directory entry in bytes
pub const DATA_DIR_SIZE: usize = 8;

/// Name given to optional-header directories beyond the 16 standard entries
pub const UNNAMED_DIRECTORY: &str = "Unknown";

/// The 16 standard optional-header data directories, in table order.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, EnumIter, EnumCount)]
pub enum DataDirectoryType {
    /// Export table (`.edata`)
    ExportTable = 0,
    /// Import table (`.idata`)
    ImportTable = 1,
    /// Resource table (`.rsrc`)
    ResourceTable = 2,
    /// Exception table (`.pdata`)
    ExceptionTable = 3,
    /// Attribute certificate table; its "RVA" is a file offset
    CertificateTable = 4,
    /// Base relocation table (`.reloc`)
    BaseRelocationTable = 5,
    /// Debug data
    Debug = 6,
    /// Reserved, must be zero
    Architecture = 7,
    /// Value stored in the global pointer register
    GlobalPtr = 8,
    /// Thread local storage table (`.tls`)
    TlsTable = 9,
    /// Load configuration table
    LoadConfigTable = 10,
    /// Bound import table
    BoundImport = 11,
    /// Import address table
    Iat = 12,
    /// Delay-load import descriptors
    DelayImportDescriptor = 13,
    /// CLR runtime header, present only in managed images
    ClrRuntimeHeader = 14,
    /// Reserved, must be zero
    Reserved = 15,
}

impl DataDirectoryType {
    /// Position of this directory in the optional header.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The symbolic name of this directory.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            DataDirectoryType::ExportTable => "Export Table",
            DataDirectoryType::ImportTable => "Import Table",
            DataDirectoryType::ResourceTable => "Resource Table",
            DataDirectoryType::ExceptionTable => "Exception Table",
            DataDirectoryType::CertificateTable => "Certificate Table",
            DataDirectoryType::BaseRelocationTable => "Base Relocation Table",
            DataDirectoryType::Debug => "Debug",
            DataDirectoryType::Architecture => "Architecture",
            DataDirectoryType::GlobalPtr => "Global Ptr",
            DataDirectoryType::TlsTable => "TLS Table",
            DataDirectoryType::LoadConfigTable => "Load Config Table",
            DataDirectoryType::BoundImport => "Bound Import",
            DataDirectoryType::Iat => "IAT",
            DataDirectoryType::DelayImportDescriptor => "Delay Import Descriptor",
            DataDirectoryType::ClrRuntimeHeader => "CLR Runtime Header",
            DataDirectoryType::Reserved => "Reserved",
        }
    }

    /// Name for the optional-header directory at `index`.
    #[must_use]
    pub fn name_at(index: usize) -> &'static str {
        use strum::IntoEnumIterator;

        DataDirectoryType::iter()
            .nth(index)
            .map_or(UNNAMED_DIRECTORY, DataDirectoryType::name)
    }
}

/// One `(RVA, Size)` data directory entry.
#[derive(Debug, Clone)]
pub struct DataDir {
    region: FileRegion,
    /// Symbolic name of the directory
    pub name: &'static str,
    /// Relative virtual address of the referenced data
    pub rva: u32,
    /// Size of the referenced data in bytes
    pub size: u32,
}

impl DataDir {
    /// Decode one directory entry at the cursor and label it with `name`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than 8 bytes remain.
    pub fn read(parser: &mut Parser, name: &'static str) -> Result<DataDir> {
        let start = parser.pos();

        let rva = parser.read_le::<u32>()?;
        let size = parser.read_le::<u32>()?;

        Ok(DataDir {
            region: FileRegion::between(start, parser.pos()),
            name,
            rva,
            size,
        })
    }

    /// Where in the file this record was decoded from.
    #[must_use]
    pub fn region(&self) -> FileRegion {
        self.region
    }

    /// Returns `true` if the entry points at data, i.e. both RVA and size are non-zero.
    #[must_use]
    pub fn is_present(&self) -> bool {
        self.rva != 0 && self.size != 0
    }
}
