//! # clrpe Prelude
//!
//! This module provides a convenient prelude for the most commonly used types of the
//! library. Import it to get quick access to everything needed to read PE and CLR headers.
//!
//! ```rust,no_run
//! use clrpe::prelude::*;
//!
//! let mut info = PeFileInfo::new("app.dll");
//! if info.read_pe_file_headers() {
//!     let headers: &ModuleHeaders = info.headers().unwrap();
//!     for section in headers.os_headers().section_headers() {
//!         println!("{}", section.name);
//!     }
//! }
//! ```

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all clrpe operations
pub use crate::Error;

/// The result type used throughout clrpe
pub use crate::Result;

/// Options for the signature sniff
pub use crate::ReaderConfig;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// Full header parse and address translation
pub use crate::ModuleHeaders;

/// Signature sniff and cached parse of a file on disk
pub use crate::PeFileInfo;

/// Low-level file parsing utilities
pub use crate::{File, Parser};

// ================================================================================================
// Operating-System Headers
// ================================================================================================

/// Headers decoded before any managed code is involved
pub use crate::pe::{
    CoffHeader, DataDir, DataDirectoryType, FileRegion, MsDosStub, OptionalHeaderFormat,
    OsHeaders, PeHeader, SectionHeader, Subsystem,
};

/// Flag sets of the operating-system headers
pub use crate::pe::{CoffCharacteristics, DllCharacteristics, SectionCharacteristics};

// ================================================================================================
// CLR Headers
// ================================================================================================

/// The CLR runtime header and its flags
pub use crate::metadata::cor20header::{Cor20Header, CorFlags};

/// The metadata root
pub use crate::metadata::root::{MetaDataHeaders, StorageSigAndHeader, CIL_HEADER_MAGIC};

/// Stream headers and the table stream header
pub use crate::metadata::streams::{
    HeapSizes, MdStreamHeader, MetaDataTableHeader, StreamType, TableId,
};
