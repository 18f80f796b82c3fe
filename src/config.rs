//! Reader configuration.
//!
//! [`ReaderConfig`] controls the cheap signature sniff performed by
//! [`crate::PeFileInfo::is_pe_file_with`] before a full parse is attempted.
//!
//! # Example
//!
//! ```rust
//! use clrpe::ReaderConfig;
//!
//! // Also accept .sys drivers, and look at only the first 1 KiB
//! let config = ReaderConfig::new()
//!     .with_sniff_window(1024)
//!     .with_extension("sys");
//! assert!(config.accepts_extension("SYS"));
//! ```

use std::path::Path;

/// Default number of bytes read by the signature sniff
pub const DEFAULT_SNIFF_WINDOW: usize = 4096;

/// Configuration options for sniffing and reading PE files.
#[derive(Clone, Debug)]
pub struct ReaderConfig {
    /// Number of bytes read from the start of the file by the signature sniff.
    ///
    /// Both the `MZ` signature and the `PE\0\0` signature at `e_lfanew` must lie inside this
    /// window.
    pub sniff_window: usize,

    /// Accepted file extensions, without the dot, compared case-insensitively.
    pub extensions: Vec<String>,

    /// Whether the sniff rejects paths whose extension is not in
    /// [`extensions`](Self::extensions). When `false`, any path is inspected.
    pub check_extension: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            sniff_window: DEFAULT_SNIFF_WINDOW,
            extensions: vec!["exe".to_string(), "dll".to_string()],
            check_extension: true,
        }
    }
}

impl ReaderConfig {
    /// Creates a new configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of bytes read by the signature sniff.
    #[must_use]
    pub fn with_sniff_window(mut self, sniff_window: usize) -> Self {
        self.sniff_window = sniff_window;
        self
    }

    /// Adds an accepted file extension.
    #[must_use]
    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extensions
            .push(extension.trim_start_matches('.').to_string());
        self
    }

    /// Inspect files regardless of their extension.
    #[must_use]
    pub fn without_extension_check(mut self) -> Self {
        self.check_extension = false;
        self
    }

    /// Returns `true` if `extension` is one of the accepted extensions, ignoring case.
    #[must_use]
    pub fn accepts_extension(&self, extension: &str) -> bool {
        self.extensions
            .iter()
            .any(|accepted| accepted.eq_ignore_ascii_case(extension))
    }

    /// Returns `true` if `path` passes the extension check, or the check is disabled.
    #[must_use]
    pub fn accepts_path(&self, path: &Path) -> bool {
        if !self.check_extension {
            return true;
        }

        path.extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| self.accepts_extension(extension))
    }
}
