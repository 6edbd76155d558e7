use thiserror::Error;

/// Errors raised while validating, reading or building an image.
///
/// A name that is not present is not an error: lookups return `None`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("image truncated: {what} needs {needed} bytes, only {available} available")]
    Truncated {
        what: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("entry {index} data ({start}..{end}) lies outside the {len}-byte image")]
    EntryOutOfBounds {
        index: u16,
        start: usize,
        end: usize,
        len: usize,
    },

    #[error("entry {index} name is not NUL-terminated inside the image")]
    MissingNameTerminator { index: u16 },

    #[error("seek target {target} outside file data of {size} bytes")]
    SeekOutOfRange { target: i64, size: u32 },

    #[error("unrecognized whence value {0}")]
    InvalidWhence(i32),

    #[error("invalid file name {0:?}: {1}")]
    InvalidName(String, &'static str),

    #[error("duplicate file name {0:?}")]
    DuplicateName(String),

    #[error("file of {0} bytes exceeds the 16 MiB entry limit")]
    FileTooLarge(u64),

    #[error("too many entries for one image (limit is {})", u16::MAX)]
    TooManyEntries,

    #[error("image of {0} bytes exceeds the 4 GiB offset domain")]
    ImageTooLarge(u64),

    #[error("{reason} ({})", .path.display())]
    UnusablePath {
        path: std::path::PathBuf,
        reason: &'static str,
    },

    #[error("{} changed size after collection: expected {expected} bytes, found {actual}", .path.display())]
    SizeMismatch {
        path: std::path::PathBuf,
        expected: u32,
        actual: u64,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
