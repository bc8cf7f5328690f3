use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure of an append. Entries written before the failing one stay in the
/// container.
#[derive(Debug, Error)]
pub enum AppendError {
    #[error("Invalid entry path {:?}: {reason}", .path)]
    InvalidPath { path: PathBuf, reason: &'static str },

    #[error("Cannot frame entry {:?}", .path)]
    Entry {
        path: PathBuf,
        #[source]
        source: boxfile_core::Error,
    },

    #[error("Source unavailable ({context}): {}", .path.display())]
    SourceUnavailable {
        path: PathBuf,
        context: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("Destination unavailable ({context}): {}", .path.display())]
    DestinationUnavailable {
        path: PathBuf,
        context: &'static str,
        #[source]
        source: io::Error,
    },

    #[error(
        "Source {} changed while appending: expected {expected} bytes, got {actual}",
        .path.display()
    )]
    LengthMismatch {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },
}

/// Failure of an extract or list. Files extracted before the failing entry
/// stay on disk.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Container unavailable ({context}): {}", .path.display())]
    ContainerUnavailable {
        path: PathBuf,
        context: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("Corrupt container {} at byte {offset}", .path.display())]
    CorruptContainer {
        path: PathBuf,
        offset: u64,
        #[source]
        source: boxfile_core::Error,
    },

    #[error("Unsafe entry path {entry:?}: invalid component {component:?}")]
    UnsafePath { entry: String, component: PathBuf },

    #[error("Write failed ({context}): {}", .path.display())]
    WriteFailed {
        path: PathBuf,
        context: &'static str,
        #[source]
        source: io::Error,
    },
}

/// Error of a raw read from a [`ContainerFile`](crate::ContainerFile)
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Framing(#[from] boxfile_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Build a closure mapping an `io::Error` into the given error variant, with
/// the offending path and a short description of the step that failed.
macro_rules! wrap_io_err {
    ($($variant:ident)::+, $path:expr, $context:expr) => {
        |source| $($variant)::+ {
            source,
            path: $path.to_path_buf(),
            context: $context,
        }
    };
}
pub(crate) use wrap_io_err;
