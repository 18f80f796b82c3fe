//! CLR 2.0 (Cor20) header parsing for .NET assemblies.
//!
//! This module defines the [`Cor20Header`] struct, the main header of a managed image, located
//! through the CLR Runtime Header data directory (index 14) of the optional header. Native images
//! have no such header.
//!
//! # Reference
//! - [ECMA-335 II.25.3.3](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use bitflags::bitflags;

use crate::{
    file::parser::Parser,
    pe::{DataDir, FileRegion},
    Result,
};

/// Size of the Cor20 header in bytes
pub const COR20_HEADER_SIZE: usize = 72;

bitflags! {
    #[derive(PartialEq, Eq, Debug, Clone, Copy)]
    /// `COMIMAGE_FLAGS_*` runtime flags of the Cor20 header
    pub struct CorFlags: u32 {
        /// The image contains only IL code
        const ILONLY = 0x0000_0001;
        /// The image can only be loaded into a 32-bit process
        const REQUIRED_32BIT = 0x0000_0002;
        /// The image is an IL library
        const IL_LIBRARY = 0x0000_0004;
        /// The image carries a strong name signature
        const STRONGNAMESIGNED = 0x0000_0008;
        /// The entry point token is a native entry point RVA
        const NATIVE_ENTRYPOINT = 0x0000_0010;
        /// The runtime tracks debug data
        const TRACKDEBUGDATA = 0x0001_0000;
        /// The image prefers a 32-bit process where available
        const PREFERRED_32BIT = 0x0002_0000;
    }
}

/// The main header of CIL, located at the beginning of the `IMAGE_DIRECTORY_ENTRY_COM_DESCRIPTOR`
/// data directory of PE files.
///
/// The six data directories and the two scalar fields are stored in the order the runtime
/// defines them: `MetaData`, `Flags`, `EntryPointToken`, `Resources`, `StrongNameSignature`,
/// `CodeManagerTable`, `VTableFixups`, `ExportAddressTableJumps`, `ManagedNativeHeader`.
#[derive(Debug, Clone)]
pub struct Cor20Header {
    region: FileRegion,
    /// Size of header in bytes
    pub cb: u32,
    /// The minimum version of runtime required to run this program
    pub major_runtime_version: u16,
    /// The minor portion of the version
    pub minor_runtime_version: u16,
    /// Location of the metadata root
    pub meta_data: DataDir,
    /// Flags describing this runtime image, see [`CorFlags`]
    pub flags: u32,
    /// Token for the `MethodDef` or File of the entry point for the image
    pub entry_point_token: u32,
    /// Implementation specific resources
    pub resources: DataDir,
    /// Hash data used by the CLI loader for binding and versioning
    pub strong_name_signature: DataDir,
    /// Always 0
    pub code_manager_table: DataDir,
    /// Array of locations that contain arrays of function pointers
    pub vtable_fixups: DataDir,
    /// Always 0
    pub export_address_table_jumps: DataDir,
    /// Always 0 for pure IL images
    pub managed_native_header: DataDir,
}

impl Cor20Header {
    /// Decode a Cor20 header at the cursor.
    ///
    /// No field is validated here: the header is reached through an optional directory, and a
    /// caller that finds it unusable simply treats the image as not managed.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than 72 bytes remain.
    pub fn read(parser: &mut Parser) -> Result<Cor20Header> {
        let start = parser.pos();

        let cb = parser.read_le::<u32>()?;
        let major_runtime_version = parser.read_le::<u16>()?;
        let minor_runtime_version = parser.read_le::<u16>()?;
        let meta_data = DataDir::read(parser, "MetaData")?;
        let flags = parser.read_le::<u32>()?;
        let entry_point_token = parser.read_le::<u32>()?;
        let resources = DataDir::read(parser, "Resources")?;
        let strong_name_signature = DataDir::read(parser, "StrongNameSignature")?;
        let code_manager_table = DataDir::read(parser, "CodeManagerTable")?;
        let vtable_fixups = DataDir::read(parser, "VTableFixups")?;
        let export_address_table_jumps = DataDir::read(parser, "ExportAddressTableJumps")?;
        let managed_native_header = DataDir::read(parser, "ManagedNativeHeader")?;

        Ok(Cor20Header {
            region: FileRegion::between(start, parser.pos()),
            cb,
            major_runtime_version,
            minor_runtime_version,
            meta_data,
            flags,
            entry_point_token,
            resources,
            strong_name_signature,
            code_manager_table,
            vtable_fixups,
            export_address_table_jumps,
            managed_native_header,
        })
    }

    /// Where in the file this record was decoded from.
    #[must_use]
    pub fn region(&self) -> FileRegion {
        self.region
    }

    /// The runtime flags as typed flags; unknown bits are retained.
    #[must_use]
    pub fn flags_bits(&self) -> CorFlags {
        CorFlags::from_bits_retain(self.flags)
    }

    /// All seven data directories, in header order.
    #[must_use]
    pub fn data_directories(&self) -> [&DataDir; 7] {
        [
            &self.meta_data,
            &self.resources,
            &self.strong_name_signature,
            &self.code_manager_table,
            &self.vtable_fixups,
            &self.export_address_table_jumps,
            &self.managed_native_header,
        ]
    }
}
