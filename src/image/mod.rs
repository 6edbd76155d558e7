//! xrofs image reading, extraction and generation.
//!
//! ## Architecture
//!
//! - [`structures`]: header and entry table records, with explicit byte encoding
//! - [`Image`]: validated, zero-copy view over an image region, plus name lookup
//! - [`File`]: cursor over one entry's data with read, seek and map
//! - [`Extractor`]: streams files out of an image to disk or stdout
//! - [`ImageBuilder`]: produces images from in-memory files or a directory tree
//!
//! ## Image Format Overview
//!
//! An image is one contiguous little-endian byte region:
//! 1. Header: `magic: u16`, `entry_count: u16`
//! 2. Entry table: `entry_count` records of `size: u24`, `offset: u32`,
//!    sorted ascending by file name
//! 3. Nodes: at each entry's `offset`, `size` data bytes followed by the
//!    NUL-terminated file name
//!
//! Names are never stored in the table, they are found right after the data.
//! Offsets are relative to the start of the image, so an image is limited to
//! 4 GiB and a single file to 16 MiB.
//!
//! ## Limitations
//!
//! - Flat namespace, `/` in names carries no meaning to the reader
//! - No permissions, timestamps, compression or checksums
//! - Lookups silently miss names if the table is not sorted

mod builder;
mod device;
mod error;
mod extractor;
mod file;
mod resolver;
pub mod structures;

pub use builder::{CollectStats, ImageBuilder, Node, WriteStats};
pub use device::{Entries, Image};
pub use error::{Error, Result};
pub use extractor::{Extractor, ImageFile, output_path};
pub use file::{File, Handle, Whence, close};
pub use structures::{DEFAULT_MAGIC, Entry, Header};
