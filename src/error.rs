use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! out_of_bounds_error {
    () => {
        crate::Error::OutOfBounds {
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Only hard violations of the binary layout end up here. A missing CLR header, metadata root
/// or table stream is not an error: [`crate::ModuleHeaders`] reports those as `None`.
///
/// # Error Categories
///
/// ## Structural Errors
/// - [`Error::Malformed`] - A mandatory field violates the PE/COFF/CLI layout
/// - [`Error::OutOfBounds`] - A mandatory record is truncated
///
/// ## Input Errors
/// - [`Error::FileError`] - Filesystem I/O errors
/// - [`Error::Empty`] - Empty input provided
/// - [`Error::NotPeFile`] - The signature sniff rejected the file
///
/// # Examples
///
/// ```rust,no_run
/// use clrpe::{Error, ModuleHeaders};
/// use std::path::Path;
///
/// match ModuleHeaders::from_file(Path::new("app.exe")) {
///     Ok(headers) => println!("{} sections", headers.os_headers().section_headers().len()),
///     Err(Error::Malformed { message, file, line }) => {
///         eprintln!("Malformed file: {} ({}:{})", message, file, line);
///     }
///     Err(Error::FileError(io_err)) => eprintln!("I/O error: {}", io_err),
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The file is damaged and could not be parsed.
    ///
    /// Raised for a bad DOS, PE or metadata-root signature, an unknown optional header magic,
    /// fewer than 16 data directories, or an RVA that no section covers. The error includes the
    /// source location where the malformation was detected.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while parsing the file.
    #[error("Out of Bound read would have occurred! - {file}:{line}")]
    OutOfBounds {
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// Provided input was empty.
    #[error("Provided input was empty")]
    Empty,

    /// The file did not pass the signature sniff and was never fully parsed.
    #[error("Not a PE file")]
    NotPeFile,

    /// File I/O error.
    ///
    /// Wraps standard I/O errors that can occur while opening or mapping the input.
    #[error("{0}")]
    FileError(#[from] std::io::Error),
}

impl Error {
    /// Returns `true` for violations of the binary layout, as opposed to I/O or input errors.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(self, Error::Malformed { .. } | Error::OutOfBounds { .. })
    }
}
