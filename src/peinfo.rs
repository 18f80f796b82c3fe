//! File-level entry point: a cheap signature sniff and a cached full header parse.

use std::{
    fs,
    io::Read,
    path::{Path, PathBuf},
};

use crate::{
    config::ReaderConfig,
    file::io::{read_le, read_le_at},
    module::ModuleHeaders,
    pe::{dos::E_LFANEW_OFFSET, DOS_SIGNATURE, PE_SIGNATURE},
    Error, Result,
};

/// A PE file on disk and, once read, its headers.
///
/// # Example
///
/// ```rust,no_run
/// use clrpe::PeFileInfo;
///
/// let mut info = PeFileInfo::new("app.exe");
/// if info.read_pe_file_headers() {
///     let headers = info.headers().unwrap();
///     println!("managed: {}", headers.is_managed());
/// }
/// ```
#[derive(Debug)]
pub struct PeFileInfo {
    path: PathBuf,
    config: ReaderConfig,
    headers: Option<ModuleHeaders>,
}

impl PeFileInfo {
    /// Refer to the file at `path` using the default [`ReaderConfig`]. Nothing is read yet.
    pub fn new(path: impl Into<PathBuf>) -> PeFileInfo {
        Self::with_config(path, ReaderConfig::default())
    }

    /// Refer to the file at `path` with an explicit configuration.
    pub fn with_config(path: impl Into<PathBuf>, config: ReaderConfig) -> PeFileInfo {
        PeFileInfo {
            path: path.into(),
            config,
            headers: None,
        }
    }

    /// Returns `true` if `path` looks like a PE image, using the default [`ReaderConfig`].
    ///
    /// See [`PeFileInfo::is_pe_file_with`].
    #[must_use]
    pub fn is_pe_file(path: &Path) -> bool {
        Self::is_pe_file_with(path, &ReaderConfig::default())
    }

    /// Returns `true` if `path` exists, has an accepted extension, and its first
    /// `config.sniff_window` bytes start with `MZ` and hold `PE\0\0` at `e_lfanew`.
    ///
    /// Only those two signatures are checked; the headers are not parsed. This never fails: any
    /// I/O problem yields `false`.
    #[must_use]
    pub fn is_pe_file_with(path: &Path, config: &ReaderConfig) -> bool {
        if !path.is_file() || !config.accepts_path(path) {
            return false;
        }

        let mut window = Vec::new();
        let read = fs::File::open(path)
            .and_then(|file| file.take(config.sniff_window as u64).read_to_end(&mut window));
        if let Err(error) = read {
            log::debug!("cannot sniff {}: {}", path.display(), error);
            return false;
        }

        sniff(&window).unwrap_or(false)
    }

    /// Parse the headers if that has not happened yet.
    ///
    /// Returns `true` if headers are available afterwards. A file that fails the sniff, or whose
    /// mandatory headers are invalid, yields `false` and leaves no cached headers.
    pub fn read_pe_file_headers(&mut self) -> bool {
        match self.try_read_pe_file_headers().map(|_| ()) {
            Ok(()) => true,
            Err(Error::NotPeFile) => false,
            Err(error) => {
                log::warn!(
                    "failed to read headers of {}: {}",
                    self.path.display(),
                    error
                );
                false
            }
        }
    }

    /// Like [`PeFileInfo::read_pe_file_headers`], but reports why the headers are unavailable.
    ///
    /// # Errors
    /// Returns [`Error::NotPeFile`] if the sniff rejects the file, and otherwise the errors of
    /// [`ModuleHeaders::from_file`].
    pub fn try_read_pe_file_headers(&mut self) -> Result<&ModuleHeaders> {
        if self.headers.is_none() {
            if !Self::is_pe_file_with(&self.path, &self.config) {
                return Err(Error::NotPeFile);
            }

            match ModuleHeaders::from_file(&self.path) {
                Ok(headers) => self.headers = Some(headers),
                Err(error) => {
                    self.headers = None;
                    return Err(error);
                }
            }
        }

        self.headers
            .as_ref()
            .ok_or_else(|| malformed_error!("headers missing after a successful read"))
    }

    /// The headers, if [`PeFileInfo::read_pe_file_headers`] succeeded.
    #[must_use]
    pub fn headers(&self) -> Option<&ModuleHeaders> {
        self.headers.as_ref()
    }

    /// The path this instance refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The configuration used for sniffing.
    #[must_use]
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Drop the cached headers; the next read parses the file again.
    pub fn clear(&mut self) {
        self.headers = None;
    }
}

fn sniff(window: &[u8]) -> Result<bool> {
    if read_le::<u16>(window)? != DOS_SIGNATURE {
        return Ok(false);
    }

    let mut offset = E_LFANEW_OFFSET;
    let pe_offset = read_le_at::<u32>(window, &mut offset)?;

    let mut offset = pe_offset as usize;
    Ok(read_le_at::<u32>(window, &mut offset)? == PE_SIGNATURE)
}
