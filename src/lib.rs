// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
//#![deny(unsafe_code)]
// - 'file/physical.rs' uses mmap to map a file into memory

//! # clrpe
//!
//! A reader for the headers of Windows PE images and, for .NET assemblies, the CLR headers
//! behind them. Built in pure Rust, `clrpe` walks an EXE or DLL from its DOS stub through the
//! COFF header, the PE32/PE32+ optional header and the section table, then follows the CLR
//! runtime header to the metadata root, its stream directory and the metadata table header.
//!
//! ## Features
//!
//! - **Memory-mapped input** - files are mapped, not copied, and decoded through a bounds-checked cursor
//! - **Both optional header layouts** - PE32 and PE32+ are decoded through one code path
//! - **RVA translation** - relative virtual addresses to file offsets and back
//! - **Native images welcome** - missing CLR headers are reported as `None`, not as errors
//! - **Source locations in errors** - every structural error records where it was raised
//!
//! ## Quick Start
//!
//! ### Using the Prelude
//!
//! ```rust,no_run
//! use clrpe::prelude::*;
//!
//! let headers = ModuleHeaders::from_file(std::path::Path::new("app.exe"))?;
//! println!("machine: {}", headers.os_headers().coff_header().machine_name);
//! # Ok::<(), clrpe::Error>(())
//! ```
//!
//! ### Sniffing and Reading Files
//!
//! ```rust,no_run
//! use clrpe::PeFileInfo;
//! use std::path::Path;
//!
//! let path = Path::new("System.Runtime.dll");
//! if PeFileInfo::is_pe_file(path) {
//!     let mut info = PeFileInfo::new(path);
//!     if info.read_pe_file_headers() {
//!         let headers = info.headers().unwrap();
//!         if let Some(tables) = headers.table_header() {
//!             println!("{} metadata tables", tables.table_count());
//!         }
//!     }
//! }
//! ```
//!
//! ### RVA Translation
//!
//! ```rust,no_run
//! use clrpe::ModuleHeaders;
//!
//! let data = std::fs::read("app.exe")?;
//! let headers = ModuleHeaders::read(&data)?;
//! let entry = headers.os_headers().pe_header().address_of_entry_point;
//! println!("entry point at file offset 0x{:X}", headers.rva_to_offset(entry)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - [`pe`] - DOS stub, COFF header, optional header, data directories and section table
//! - [`metadata`] - Cor20 header, metadata root, stream headers and the table stream header
//! - [`ModuleHeaders`] - Drives the whole parse and translates addresses
//! - [`PeFileInfo`] - Signature sniff and cached parse of a file on disk
//! - [`ReaderConfig`] - Options for the sniff
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, Error>`](Result). Structural problems in the mandatory
//! headers are [`Error::Malformed`] or [`Error::OutOfBounds`]; the absence of the optional CLR
//! headers is not an error.

#[macro_use]
pub(crate) mod error;
pub(crate) mod file;

#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types
pub mod prelude;

/// Configuration of the signature sniff
pub mod config;

/// CLR headers of managed images
pub mod metadata;

/// Operating-system headers of PE images
pub mod pe;

mod module;
mod peinfo;

/// `clrpe` Result type
///
/// A type alias for `std::result::Result<T, Error>` where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `clrpe` Error type
///
/// The main error type for all operations in this crate. See [`Error`] for the individual
/// variants.
pub use error::Error;

/// Provides access to low-level file and memory parsing utilities.
///
/// The [`Parser`] type is the bounds-checked little-endian cursor every decoder reads from;
/// [`File`] holds the input, memory-mapped from disk or owned in memory.
pub use file::{parser::Parser, File};

pub use config::ReaderConfig;
pub use module::ModuleHeaders;
pub use peinfo::PeFileInfo;
