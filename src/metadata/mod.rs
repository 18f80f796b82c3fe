//! CLR headers of managed (.NET) images.
//!
//! Managed images carry, on top of the operating-system headers, a CLR runtime header and a
//! metadata root. This module decodes those headers down to the table stream header; it does not
//! interpret heap contents or table rows.
//!
//! # Key Components
//!
//! - [`cor20header`] - The CLR runtime header reached through data directory 14
//! - [`root`] - The `BSJB` metadata root and its stream directory
//! - [`streams`] - Stream headers, their classification, and the `#~` table header
//!
//! # Examples
//!
//! ```rust,no_run
//! use clrpe::ModuleHeaders;
//!
//! let headers = ModuleHeaders::from_file("app.dll".as_ref())?;
//! if let Some(tables) = headers.table_header() {
//!     for table in tables.present_tables() {
//!         println!("{:?}: {} rows", table, tables.row_count(table));
//!     }
//! }
//! # Ok::<(), clrpe::Error>(())
//! ```

/// Implementation of the Header of CIL
pub mod cor20header;
/// Implementation of the root metadata structure
pub mod root;
/// Implementation of the metadata stream headers
pub mod streams;
