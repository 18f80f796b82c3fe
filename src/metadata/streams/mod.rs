//! Metadata stream headers for .NET assemblies.
//!
//! The metadata root is followed by a directory of streams. This module decodes that directory
//! and the header of the table stream; the contents of the heaps and the table rows are not
//! interpreted.
//!
//! # Stream Types
//!
//! - **`#Strings`** - UTF-8 identifier heap, classified as [`StreamType::Strings`]
//! - **`#US`** and **`#Blob`** - length-prefixed heaps, both classified as [`StreamType::Blob`]
//! - **`#GUID`** - GUID array, classified as [`StreamType::Guid`]
//! - **`#~`** (or any other name) - the metadata tables, classified as [`StreamType::Table`]
//!
//! # References
//!
//! - ECMA-335 6th Edition, Partition II, Section 24.2.2 - Stream Headers
//! - ECMA-335 6th Edition, Partition II, Section 24.2.6 - #~ stream

mod streamheader;
pub use streamheader::{MdStreamHeader, StreamType};

mod tableid;
pub use tableid::TableId;

mod tablesheader;
pub use tablesheader::{HeapSizes, MetaDataTableHeader, MAX_TABLES};
