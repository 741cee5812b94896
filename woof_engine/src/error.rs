use std::path::PathBuf;

use thiserror::Error;

/// Conditions that end the process during startup. Everything recoverable is
/// logged as a warning instead.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(
        "IWAD not found. Searched: {searched}. Specify one with -iwad <file>, \
         or place it in a directory named by DOOMWADDIR or DOOMWADPATH."
    )]
    NoIwad { searched: String },
    #[error("IWAD file '{0}' not found!")]
    IwadNotFound(String),
    #[error("CheckIWAD: failed to read IWAD {path}")]
    IwadUnreadable {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
    #[error("Unknown or invalid IWAD file.")]
    UnknownGameMode,
    #[error("Unknown game version '{requested}' (supported: {supported})")]
    UnknownGameVersion { requested: String, supported: String },
    #[error("WAD file '{0}' not found!")]
    ArchiveNotFound(String),
    #[error("Cannot find .deh or .bex file named {0}")]
    PatchNotFound(String),
    #[error("No such response file: {0}")]
    ResponseFileNotFound(PathBuf),
    #[error("failed to read response file {path}")]
    ResponseFileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to load WAD files")]
    ArchiveLoad(#[source] anyhow::Error),
    #[error("You cannot -file with the shareware version. Register!")]
    ModifiedShareware,
    #[error("This is not the registered version.")]
    FakeRegistered,
    #[error("patch {origin} failed to apply")]
    PatchFailed {
        origin: String,
        #[source]
        source: anyhow::Error,
    },
}
