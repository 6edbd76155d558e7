//! # xrofs
//!
//! A tiny read-only filesystem image format and its accessor library.
//!
//! An xrofs image is a single contiguous byte region, usually a memory-mapped
//! file: a header, a name-sorted entry table and the file nodes. This crate
//! reads images in place without copying or allocating, looks files up by
//! name with a binary search, and gives each open file a cursor with
//! bounds-checked read, seek and zero-copy map operations.
//!
//! ## Features
//!
//! - Zero-copy, allocation-free reading over any `&[u8]`
//! - `O(log n)` lookup by exact file name
//! - Short-read semantics: reading past the end returns fewer bytes, `0` at the end
//! - Image generation from memory or from a directory tree
//! - Listing and extraction from local files or HTTP URLs
//!
//! ## Example
//!
//! ```
//! use xrofs::{Image, ImageBuilder, Whence};
//!
//! let mut builder = ImageBuilder::new();
//! builder.add_file("etc/motd", b"hello, world\n".to_vec())?;
//! let bytes = builder.build()?;
//!
//! let image = Image::new(&bytes)?;
//! let mut motd = image.open("etc/motd").expect("stored above");
//! motd.seek(7, Whence::Start)?;
//! assert_eq!(motd.map(), b"world\n");
//! assert!(image.open("etc/passwd").is_none());
//! # Ok::<(), xrofs::image::Error>(())
//! ```

pub mod cli;
pub mod image;
pub mod io;

pub use cli::Cli;
pub use image::{Extractor, File, Image, ImageBuilder, ImageFile, Whence};
pub use io::{HttpRangeReader, ReadAt, Region};
