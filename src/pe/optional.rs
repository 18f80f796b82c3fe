//! Optional header decoding for PE32 and PE32+ images.
//!
//! The optional header follows the COFF header. Its `Magic` field selects one of two layouts:
//! PE32 (`0x10B`) carries a `BaseOfData` field and stores the image base and the four
//! stack/heap sizes as 32-bit values, PE32+ (`0x20B`) drops `BaseOfData` and widens those
//! five fields to 64 bits. Everything else is shared.
//!
//! The width-dependent fields are read through [`OptionalHeaderLayout`], implemented once per
//! format.
//!
//! # Reference
//! - Microsoft PE/COFF Specification, "Optional Header (Image Only)"

use bitflags::bitflags;

use crate::{
    file::parser::Parser,
    pe::{datadir::DATA_DIR_SIZE, DataDir, DataDirectoryType, FileRegion},
    Result,
};

/// Magic value of a PE32 optional header
pub const PE32_MAGIC: u16 = 0x10B;

/// Magic value of a PE32+ optional header
pub const PE32_PLUS_MAGIC: u16 = 0x20B;

/// Minimum number of data directories a well-formed optional header declares
pub const MIN_DATA_DIRECTORIES: u32 = 16;

/// The two optional header layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionalHeaderFormat {
    /// 32-bit layout, magic `0x10B`
    Pe32,
    /// 64-bit layout, magic `0x20B`
    Pe32Plus,
}

impl OptionalHeaderFormat {
    /// Map an optional header magic to its format.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for any magic other than `0x10B` or `0x20B`.
    pub fn from_magic(magic: u16) -> Result<OptionalHeaderFormat> {
        match magic {
            PE32_MAGIC => Ok(OptionalHeaderFormat::Pe32),
            PE32_PLUS_MAGIC => Ok(OptionalHeaderFormat::Pe32Plus),
            _ => Err(malformed_error!("invalid optional header magic - 0x{:04X}", magic)),
        }
    }

    /// The magic value identifying this format.
    #[must_use]
    pub fn magic(self) -> u16 {
        match self {
            OptionalHeaderFormat::Pe32 => PE32_MAGIC,
            OptionalHeaderFormat::Pe32Plus => PE32_PLUS_MAGIC,
        }
    }
}

/// Reads the fields whose presence or width depends on the optional header format.
pub trait OptionalHeaderLayout {
    /// The format this layout decodes
    const FORMAT: OptionalHeaderFormat;

    /// Read `BaseOfData`, which only exists in PE32.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the field is truncated.
    fn read_base_of_data(parser: &mut Parser) -> Result<Option<u32>>;

    /// Read one of the pointer-sized fields (image base, stack and heap sizes).
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the field is truncated.
    fn read_address(parser: &mut Parser) -> Result<u64>;
}

/// Layout of a PE32 optional header
pub struct Pe32Layout;

impl OptionalHeaderLayout for Pe32Layout {
    const FORMAT: OptionalHeaderFormat = OptionalHeaderFormat::Pe32;

    fn read_base_of_data(parser: &mut Parser) -> Result<Option<u32>> {
        Ok(Some(parser.read_le::<u32>()?))
    }

    fn read_address(parser: &mut Parser) -> Result<u64> {
        Ok(u64::from(parser.read_le::<u32>()?))
    }
}

/// Layout of a PE32+ optional header
pub struct Pe32PlusLayout;

impl OptionalHeaderLayout for Pe32PlusLayout {
    const FORMAT: OptionalHeaderFormat = OptionalHeaderFormat::Pe32Plus;

    fn read_base_of_data(_parser: &mut Parser) -> Result<Option<u32>> {
        Ok(None)
    }

    fn read_address(parser: &mut Parser) -> Result<u64> {
        parser.read_le::<u64>()
    }
}

/// Windows subsystem required to run the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subsystem {
    /// An unknown subsystem
    Unknown,
    /// Device drivers and native Windows processes
    Native,
    /// Windows graphical user interface
    WindowsGui,
    /// Windows character subsystem
    WindowsCui,
    /// OS/2 character subsystem
    Os2Cui,
    /// POSIX character subsystem
    PosixCui,
    /// Native Win9x driver
    NativeWindows,
    /// Windows CE
    WindowsCeGui,
    /// EFI application
    EfiApplication,
    /// EFI driver with boot services
    EfiBootServiceDriver,
    /// EFI driver with run-time services
    EfiRuntimeDriver,
    /// EFI ROM image
    EfiRom,
    /// XBOX
    Xbox,
    /// Windows boot application
    WindowsBootApplication,
    /// A value not defined by the PE/COFF specification
    Other(u16),
}

impl From<u16> for Subsystem {
    fn from(value: u16) -> Self {
        match value {
            0 => Subsystem::Unknown,
            1 => Subsystem::Native,
            2 => Subsystem::WindowsGui,
            3 => Subsystem::WindowsCui,
            5 => Subsystem::Os2Cui,
            7 => Subsystem::PosixCui,
            8 => Subsystem::NativeWindows,
            9 => Subsystem::WindowsCeGui,
            10 => Subsystem::EfiApplication,
            11 => Subsystem::EfiBootServiceDriver,
            12 => Subsystem::EfiRuntimeDriver,
            13 => Subsystem::EfiRom,
            14 => Subsystem::Xbox,
            16 => Subsystem::WindowsBootApplication,
            other => Subsystem::Other(other),
        }
    }
}

bitflags! {
    #[derive(PartialEq, Eq, Debug, Clone, Copy)]
    /// `IMAGE_DLLCHARACTERISTICS_*` flags of the optional header
    pub struct DllCharacteristics: u16 {
        /// Image can handle a high entropy 64-bit virtual address space
        const HIGH_ENTROPY_VA = 0x0020;
        /// DLL can be relocated at load time
        const DYNAMIC_BASE = 0x0040;
        /// Code integrity checks are enforced
        const FORCE_INTEGRITY = 0x0080;
        /// Image is NX compatible
        const NX_COMPAT = 0x0100;
        /// Isolation aware, but do not isolate the image
        const NO_ISOLATION = 0x0200;
        /// Does not use structured exception handling
        const NO_SEH = 0x0400;
        /// Do not bind the image
        const NO_BIND = 0x0800;
        /// Image must execute in an AppContainer
        const APPCONTAINER = 0x1000;
        /// A WDM driver
        const WDM_DRIVER = 0x2000;
        /// Image supports Control Flow Guard
        const GUARD_CF = 0x4000;
        /// Terminal Server aware
        const TERMINAL_SERVER_AWARE = 0x8000;
    }
}

/// The optional header, including its data directory table.
#[derive(Debug, Clone)]
pub struct PeHeader {
    region: FileRegion,
    /// Layout selected by the magic value
    pub format: OptionalHeaderFormat,
    /// Linker major version
    pub major_linker_version: u8,
    /// Linker minor version
    pub minor_linker_version: u8,
    /// Combined size of all code sections
    pub size_of_code: u32,
    /// Combined size of all initialized data sections
    pub size_of_initialized_data: u32,
    /// Combined size of all uninitialized data sections
    pub size_of_uninitialized_data: u32,
    /// RVA of the entry point, zero if there is none
    pub address_of_entry_point: u32,
    /// RVA of the start of the code section
    pub base_of_code: u32,
    /// RVA of the start of the data section, PE32 only
    pub base_of_data: Option<u32>,
    /// Preferred load address
    pub image_base: u64,
    /// Alignment of sections in memory
    pub section_alignment: u32,
    /// Alignment of section raw data in the file
    pub file_alignment: u32,
    /// Required operating system major version
    pub major_operating_system_version: u16,
    /// Required operating system minor version
    pub minor_operating_system_version: u16,
    /// Image major version
    pub major_image_version: u16,
    /// Image minor version
    pub minor_image_version: u16,
    /// Subsystem major version
    pub major_subsystem_version: u16,
    /// Subsystem minor version
    pub minor_subsystem_version: u16,
    /// Reserved, must be zero
    pub win32_version_value: u32,
    /// Size of the image in memory, including all headers
    pub size_of_image: u32,
    /// Combined size of the DOS stub, PE headers and section table, rounded to file alignment
    pub size_of_headers: u32,
    /// Image checksum
    pub checksum: u32,
    /// Raw subsystem value, see [`Subsystem`]
    pub subsystem_raw: u16,
    /// Raw DLL characteristics, see [`DllCharacteristics`]
    pub dll_characteristics: u16,
    /// Stack reserve size
    pub size_of_stack_reserve: u64,
    /// Stack commit size
    pub size_of_stack_commit: u64,
    /// Heap reserve size
    pub size_of_heap_reserve: u64,
    /// Heap commit size
    pub size_of_heap_commit: u64,
    /// Reserved, must be zero
    pub loader_flags: u32,
    /// Declared number of data directories (`NumberOfRvaAndSizes`)
    pub number_of_data_directories: u32,
    /// The data directories, exactly `number_of_data_directories` of them
    pub data_directories: Vec<DataDir>,
}

impl PeHeader {
    /// Decode the optional header at the cursor.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for an unknown magic or fewer than 16 data
    /// directories, and [`crate::Error::OutOfBounds`] if the header is truncated.
    pub fn read(parser: &mut Parser) -> Result<PeHeader> {
        let start = parser.pos();
        let magic = parser.read_le::<u16>()?;

        match OptionalHeaderFormat::from_magic(magic)? {
            OptionalHeaderFormat::Pe32 => Self::read_layout::<Pe32Layout>(parser, start),
            OptionalHeaderFormat::Pe32Plus => Self::read_layout::<Pe32PlusLayout>(parser, start),
        }
    }

    fn read_layout<L: OptionalHeaderLayout>(parser: &mut Parser, start: usize) -> Result<PeHeader> {
        let major_linker_version = parser.read_le::<u8>()?;
        let minor_linker_version = parser.read_le::<u8>()?;
        let size_of_code = parser.read_le::<u32>()?;
        let size_of_initialized_data = parser.read_le::<u32>()?;
        let size_of_uninitialized_data = parser.read_le::<u32>()?;
        let address_of_entry_point = parser.read_le::<u32>()?;
        let base_of_code = parser.read_le::<u32>()?;
        let base_of_data = L::read_base_of_data(parser)?;
        let image_base = L::read_address(parser)?;

        let section_alignment = parser.read_le::<u32>()?;
        let file_alignment = parser.read_le::<u32>()?;
        let major_operating_system_version = parser.read_le::<u16>()?;
        let minor_operating_system_version = parser.read_le::<u16>()?;
        let major_image_version = parser.read_le::<u16>()?;
        let minor_image_version = parser.read_le::<u16>()?;
        let major_subsystem_version = parser.read_le::<u16>()?;
        let minor_subsystem_version = parser.read_le::<u16>()?;
        let win32_version_value = parser.read_le::<u32>()?;
        let size_of_image = parser.read_le::<u32>()?;
        let size_of_headers = parser.read_le::<u32>()?;
        let checksum = parser.read_le::<u32>()?;
        let subsystem_raw = parser.read_le::<u16>()?;
        let dll_characteristics = parser.read_le::<u16>()?;

        let size_of_stack_reserve = L::read_address(parser)?;
        let size_of_stack_commit = L::read_address(parser)?;
        let size_of_heap_reserve = L::read_address(parser)?;
        let size_of_heap_commit = L::read_address(parser)?;

        let loader_flags = parser.read_le::<u32>()?;
        let number_of_data_directories = parser.read_le::<u32>()?;
        if number_of_data_directories < MIN_DATA_DIRECTORIES {
            return Err(malformed_error!(
                "NumberOfDataDirectories must be at least {} - {}",
                MIN_DATA_DIRECTORIES,
                number_of_data_directories
            ));
        }

        let declared = number_of_data_directories as usize;
        let mut data_directories =
            Vec::with_capacity(declared.min(parser.remaining() / DATA_DIR_SIZE));
        for index in 0..declared {
            data_directories.push(DataDir::read(parser, DataDirectoryType::name_at(index))?);
        }

        log::debug!(
            "optional header {:?} at 0x{:X}: image base 0x{:X}, {} data directories",
            L::FORMAT,
            start,
            image_base,
            number_of_data_directories
        );

        Ok(PeHeader {
            region: FileRegion::between(start, parser.pos()),
            format: L::FORMAT,
            major_linker_version,
            minor_linker_version,
            size_of_code,
            size_of_initialized_data,
            size_of_uninitialized_data,
            address_of_entry_point,
            base_of_code,
            base_of_data,
            image_base,
            section_alignment,
            file_alignment,
            major_operating_system_version,
            minor_operating_system_version,
            major_image_version,
            minor_image_version,
            major_subsystem_version,
            minor_subsystem_version,
            win32_version_value,
            size_of_image,
            size_of_headers,
            checksum,
            subsystem_raw,
            dll_characteristics,
            size_of_stack_reserve,
            size_of_stack_commit,
            size_of_heap_reserve,
            size_of_heap_commit,
            loader_flags,
            number_of_data_directories,
            data_directories,
        })
    }

    /// Where in the file this record was decoded from.
    #[must_use]
    pub fn region(&self) -> FileRegion {
        self.region
    }

    /// The magic value this header was decoded from.
    #[must_use]
    pub fn magic(&self) -> u16 {
        self.format.magic()
    }

    /// Returns `true` for a PE32+ (64-bit) header.
    #[must_use]
    pub fn is_pe32_plus(&self) -> bool {
        self.format == OptionalHeaderFormat::Pe32Plus
    }

    /// The subsystem as a typed value.
    #[must_use]
    pub fn subsystem(&self) -> Subsystem {
        Subsystem::from(self.subsystem_raw)
    }

    /// The DLL characteristics as typed flags; unknown bits are retained.
    #[must_use]
    pub fn dll_characteristics_flags(&self) -> DllCharacteristics {
        DllCharacteristics::from_bits_retain(self.dll_characteristics)
    }

    /// The standard data directory `dir_type`.
    #[must_use]
    pub fn data_directory(&self, dir_type: DataDirectoryType) -> Option<&DataDir> {
        self.data_directories.get(dir_type.index())
    }

    /// The CLR runtime header directory (index 14).
    #[must_use]
    pub fn clr_runtime_header(&self) -> Option<&DataDir> {
        self.data_directory(DataDirectoryType::ClrRuntimeHeader)
    }
}
