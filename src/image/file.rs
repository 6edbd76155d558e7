//! Open files: cursor, bounded reads, seeks and zero-copy mapping.

use std::io;

use super::device::Image;
use super::error::{Error, Result};
use super::structures::Entry;

/// Reference point for [`File::seek`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    /// First data byte.
    Start,
    /// Current cursor.
    Current,
    /// Last data byte (`size - 1`), not one past it.
    End,
}

impl Whence {
    /// Map the POSIX `SEEK_SET`/`SEEK_CUR`/`SEEK_END` values.
    pub fn from_raw(value: i32) -> Result<Self> {
        match value {
            0 => Ok(Whence::Start),
            1 => Ok(Whence::Current),
            2 => Ok(Whence::End),
            other => Err(Error::InvalidWhence(other)),
        }
    }
}

/// A file opened from an [`Image`].
///
/// A plain value: the image it came from, the entry index and a cursor
/// offset into the entry's data. The cursor never leaves `0..=size`.
/// Copies are independent cursors over the same bytes.
#[derive(Debug, Clone, Copy)]
pub struct File<'a> {
    image: Image<'a>,
    index: u16,
    entry: Entry,
    pos: u32,
}

/// A possibly-closed file. `None` is what a failed open produces.
pub type Handle<'a> = Option<File<'a>>;

/// Reset `handle` to the closed state.
pub fn close(handle: &mut Handle<'_>) {
    *handle = None;
}

impl<'a> Image<'a> {
    /// Open the file called `name` with its cursor on the first data byte.
    ///
    /// Returns `None` if no entry has that exact name.
    pub fn open(&self, name: impl AsRef<[u8]>) -> Handle<'a> {
        let index = self.search(name)?;
        self.open_index(index)
    }

    /// Open the entry at `index` directly, bypassing name lookup.
    pub fn open_index(&self, index: u16) -> Handle<'a> {
        let entry = self.entry(index)?;
        Some(File {
            image: *self,
            index,
            entry,
            pos: 0,
        })
    }
}

impl<'a> File<'a> {
    /// Entry index of this file in the table.
    pub fn index(&self) -> u16 {
        self.index
    }

    /// Data length in bytes.
    pub fn size(&self) -> u32 {
        self.entry.size
    }

    /// Cursor as an offset from the first data byte.
    pub fn position(&self) -> u32 {
        self.pos
    }

    pub fn name(&self) -> &'a [u8] {
        self.image.entry_name(self.index).unwrap_or_default()
    }

    fn data(&self) -> &'a [u8] {
        self.image.entry_data(self.index).unwrap_or_default()
    }

    /// Bytes between the cursor and the end of the data.
    pub fn remaining(&self) -> u32 {
        self.entry.size - self.pos
    }

    /// Copy up to `buf.len()` bytes from the cursor and advance past them.
    ///
    /// Returns how many bytes were copied; `0` means the cursor is at the end.
    pub fn read(&mut self, buf: &mut [u8]) -> usize {
        let src = self.map();
        let n = buf.len().min(src.len());
        buf[..n].copy_from_slice(&src[..n]);
        self.pos += n as u32;
        n
    }

    /// Move the cursor to `reference + offset`.
    ///
    /// The target must land on a data byte, i.e. in `[0, size - 1]`. Seeking
    /// to `size` is rejected, and every seek fails on an empty file. On error
    /// the cursor is left where it was.
    pub fn seek(&mut self, offset: i64, whence: Whence) -> Result<u32> {
        let last = self.entry.size as i64 - 1;
        let reference = match whence {
            Whence::Start => 0,
            Whence::Current => self.pos as i64,
            Whence::End => last,
        };

        let target = reference.saturating_add(offset);
        if target < 0 || target > last {
            return Err(Error::SeekOutOfRange {
                target,
                size: self.entry.size,
            });
        }

        self.pos = target as u32;
        Ok(self.pos)
    }

    /// The bytes from the cursor to the end of the data, borrowed straight
    /// from the image. The cursor does not move.
    pub fn map(&self) -> &'a [u8] {
        self.data().get(self.pos as usize..).unwrap_or_default()
    }
}

impl io::Read for File<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(File::read(self, buf))
    }
}
