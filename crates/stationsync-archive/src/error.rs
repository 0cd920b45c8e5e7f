use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("entry '{entry}' resolves outside the output root: '{resolved}'")]
    PathEscape { entry: PathBuf, resolved: PathBuf },

    #[error("entry path is absolute: '{entry}'")]
    AbsolutePath { entry: PathBuf },

    #[error("archive is corrupted")]
    Corrupted,

    #[error("failed to create directory '{path}': {source}")]
    DirectoryCreationFailed { path: PathBuf, source: io::Error },

    #[error("failed to extract '{path}': {source}")]
    ExtractionFailed { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
