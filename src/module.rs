//! Full header parse of a PE image, from the DOS stub down to the metadata table header.
//!
//! [`ModuleHeaders`] decodes the mandatory operating-system headers first; any failure there is
//! returned to the caller. The managed headers are decoded afterwards as a chain of optional
//! stages, each of which only runs if the previous one produced a value:
//!
//! 1. the Cor20 header, at the RVA of data directory 14
//! 2. the metadata root, at the RVA of the Cor20 `MetaData` directory
//! 3. the table stream header, at the table stream offset relative to the metadata root
//!
//! A stage that cannot be decoded leaves its value, and all later ones, as `None`. For a native
//! image that is the expected outcome, not an error.

use std::path::Path;

use crate::{
    file::{parser::Parser, File},
    metadata::{
        cor20header::Cor20Header, root::MetaDataHeaders, streams::MetaDataTableHeader,
    },
    pe::{OsHeaders, SectionHeader},
    Result,
};

/// All headers of a PE image.
#[derive(Debug, Clone)]
pub struct ModuleHeaders {
    os_headers: OsHeaders,
    cor20_header: Option<Cor20Header>,
    metadata_headers: Option<MetaDataHeaders>,
    table_header: Option<MetaDataTableHeader>,
}

impl ModuleHeaders {
    /// Parse the headers of the image held in `data`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] or [`crate::Error::OutOfBounds`] if the DOS stub,
    /// PE signature, COFF header, optional header or section table is invalid. Problems in the
    /// managed headers are not errors; see [`ModuleHeaders::cor20_header`].
    pub fn read(data: &[u8]) -> Result<ModuleHeaders> {
        let mut parser = Parser::new(data);
        Self::from_parser(&mut parser)
    }

    /// Map the file at `path` and parse its headers.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened,
    /// [`crate::Error::Empty`] for an empty file, and otherwise the errors of
    /// [`ModuleHeaders::read`].
    pub fn from_file(path: &Path) -> Result<ModuleHeaders> {
        let file = File::from_file(path)?;
        Self::read(file.data())
    }

    /// Parse the image that starts at the cursor of `parser`.
    ///
    /// File offsets, regions and translated addresses are relative to that start, not to the
    /// beginning of the underlying buffer. The cursor of `parser` is not moved.
    ///
    /// # Errors
    /// See [`ModuleHeaders::read`].
    pub fn from_parser(parser: &mut Parser) -> Result<ModuleHeaders> {
        let mut image = Parser::new(&parser.data()[parser.pos()..]);
        let os_headers = OsHeaders::read(&mut image)?;

        let cor20_header = try_parse_cor20_header(&mut image, &os_headers);
        let metadata_headers = cor20_header
            .as_ref()
            .and_then(|cor20| try_parse_metadata_headers(&mut image, &os_headers, cor20));
        let table_header = metadata_headers
            .as_ref()
            .and_then(|metadata| try_parse_table_header(&mut image, metadata));

        Ok(ModuleHeaders {
            os_headers,
            cor20_header,
            metadata_headers,
            table_header,
        })
    }

    /// The DOS stub, COFF header, optional header and section table.
    #[must_use]
    pub fn os_headers(&self) -> &OsHeaders {
        &self.os_headers
    }

    /// The CLR runtime header, `None` for native images or if it could not be decoded.
    #[must_use]
    pub fn cor20_header(&self) -> Option<&Cor20Header> {
        self.cor20_header.as_ref()
    }

    /// The metadata root and stream directory, `None` if there is no usable Cor20 header or the
    /// root could not be decoded.
    #[must_use]
    pub fn metadata_headers(&self) -> Option<&MetaDataHeaders> {
        self.metadata_headers.as_ref()
    }

    /// The `#~` table header, `None` if there is no metadata root, it lists no table stream, or
    /// the header could not be decoded.
    #[must_use]
    pub fn table_header(&self) -> Option<&MetaDataTableHeader> {
        self.table_header.as_ref()
    }

    /// Returns `true` if a CLR runtime header was decoded.
    #[must_use]
    pub fn is_managed(&self) -> bool {
        self.cor20_header.is_some()
    }

    /// Translate a relative virtual address into a file offset.
    ///
    /// The first section in header order whose range `virtual_address .. virtual_address +
    /// max(virtual_size, size_of_raw_data)` contains `rva` is used, even if later sections
    /// overlap it.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if no section covers `rva`.
    pub fn rva_to_offset(&self, rva: u32) -> Result<u32> {
        rva_to_offset(self.os_headers.section_headers(), rva)
    }

    /// Translate a file offset into a relative virtual address, using the first section whose
    /// raw data contains `offset`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if no section's raw data covers `offset`.
    pub fn offset_to_rva(&self, offset: u32) -> Result<u32> {
        let section = self
            .os_headers
            .section_headers()
            .iter()
            .find(|section| {
                let start = u64::from(section.pointer_to_raw_data);
                let end = start + u64::from(section.size_of_raw_data);
                (start..end).contains(&u64::from(offset))
            })
            .ok_or_else(|| malformed_error!("invalid file offset - 0x{:X}", offset))?;

        section
            .virtual_address
            .checked_add(offset - section.pointer_to_raw_data)
            .ok_or_else(|| malformed_error!("RVA of file offset 0x{:X} overflows", offset))
    }
}

fn rva_to_offset(sections: &[SectionHeader], rva: u32) -> Result<u32> {
    let Some(section) = sections.iter().find(|section| section.contains_rva(rva)) else {
        return Err(malformed_error!("invalid RVA - 0x{:X}", rva));
    };

    section
        .pointer_to_raw_data
        .checked_add(rva - section.virtual_address)
        .ok_or_else(|| malformed_error!("file offset of RVA 0x{:X} overflows", rva))
}

fn seek_to(parser: &mut Parser, offset: u64) -> Result<()> {
    let offset = usize::try_from(offset)
        .map_err(|_| malformed_error!("offset 0x{:X} exceeds the address space", offset))?;
    parser.seek(offset)
}

/// Turn the result of an optional stage into an `Option`, logging why it is absent.
fn optional<T>(stage: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            log::debug!("{} not available: {}", stage, error);
            None
        }
    }
}

fn try_parse_cor20_header(parser: &mut Parser, os_headers: &OsHeaders) -> Option<Cor20Header> {
    let Some(clr_dir) = os_headers.pe_header().clr_runtime_header() else {
        log::debug!("no CLR runtime header directory");
        return None;
    };
    if clr_dir.rva == 0 {
        log::debug!("CLR runtime header directory is empty, native image");
        return None;
    }

    optional(
        "CLR runtime header",
        rva_to_offset(os_headers.section_headers(), clr_dir.rva).and_then(|offset| {
            seek_to(parser, u64::from(offset))?;
            Cor20Header::read(parser)
        }),
    )
}

fn try_parse_metadata_headers(
    parser: &mut Parser,
    os_headers: &OsHeaders,
    cor20_header: &Cor20Header,
) -> Option<MetaDataHeaders> {
    optional(
        "metadata root",
        rva_to_offset(os_headers.section_headers(), cor20_header.meta_data.rva).and_then(
            |offset| {
                seek_to(parser, u64::from(offset))?;
                MetaDataHeaders::read(parser)
            },
        ),
    )
}

fn try_parse_table_header(
    parser: &mut Parser,
    metadata_headers: &MetaDataHeaders,
) -> Option<MetaDataTableHeader> {
    optional(
        "table stream header",
        metadata_headers.table_stream_offset().and_then(|offset| {
            seek_to(parser, offset)?;
            MetaDataTableHeader::read(parser)
        }),
    )
}
