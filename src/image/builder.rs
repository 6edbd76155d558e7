//! Image generation.
//!
//! Files are kept in a name-ordered map so the emitted entry table is always
//! sorted, which is what [`Image::search`](super::Image::search) relies on.
//! Nodes are written in the same order as the table, directly after it.
//!
//! Collected files are only measured up front. Their contents are streamed
//! from disk by [`ImageBuilder::write_to`], so the builder never holds more
//! than one copy buffer of file data.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::error::{Error, Result};
use super::structures::{DEFAULT_MAGIC, Entry, Header};

/// Copy buffer used when streaming collected files into the image.
const COPY_BUFFER_SIZE: usize = 16 * 1024;

/// Summary of a [`ImageBuilder::collect_dir`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectStats {
    pub files: usize,
    pub bytes: u64,
    /// Problems skipped because `force` was set.
    pub skipped: usize,
}

/// Summary of a [`ImageBuilder::write_to`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    pub bytes: u64,
    /// Files whose length changed after collection. Only non-zero with `force`.
    pub mismatched: usize,
}

/// Placement of one file inside the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Node<'b> {
    pub name: &'b str,
    pub size: u32,
    /// Offset of the first data byte from the start of the image.
    pub offset: u32,
}

#[derive(Debug, Clone)]
enum Source {
    Bytes(Vec<u8>),
    Path { path: PathBuf, size: u32 },
}

impl Source {
    fn size(&self) -> u32 {
        match self {
            Source::Bytes(data) => data.len() as u32,
            Source::Path { size, .. } => *size,
        }
    }
}

/// Collects files and lays them out as an image.
#[derive(Debug, Clone)]
pub struct ImageBuilder {
    magic: u16,
    files: BTreeMap<String, Source>,
}

impl Default for ImageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageBuilder {
    pub fn new() -> Self {
        Self {
            magic: DEFAULT_MAGIC,
            files: BTreeMap::new(),
        }
    }

    pub fn with_magic(mut self, magic: u16) -> Self {
        self.magic = magic;
        self
    }

    /// Number of files added so far.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Sum of all file data lengths.
    pub fn data_len(&self) -> u64 {
        self.files.values().map(|s| s.size() as u64).sum()
    }

    /// Size of the image [`build`](Self::build) would produce.
    pub fn image_len(&self) -> u64 {
        let nodes: u64 = self
            .files
            .iter()
            .map(|(name, source)| source.size() as u64 + name.len() as u64 + 1)
            .sum();
        (Header::SIZE + self.files.len() * Entry::SIZE) as u64 + nodes
    }

    /// Where each file will land, in table order.
    ///
    /// Offsets wrap past 4 GiB; [`write_to`](Self::write_to) refuses such
    /// layouts before writing anything.
    pub fn layout(&self) -> impl Iterator<Item = Node<'_>> + '_ {
        let mut offset = (Header::SIZE + self.files.len() * Entry::SIZE) as u32;
        self.files.iter().map(move |(name, source)| {
            let node = Node {
                name: name.as_str(),
                size: source.size(),
                offset,
            };
            offset = offset
                .wrapping_add(node.size)
                .wrapping_add(name.len() as u32 + 1);
            node
        })
    }

    /// Add a file under `name`.
    ///
    /// Names are ASCII, non-empty, NUL-free and unique. Data is limited to
    /// [`Entry::MAX_SIZE`] bytes.
    pub fn add_file(&mut self, name: impl Into<String>, data: Vec<u8>) -> Result<&mut Self> {
        let name = name.into();
        self.check_new(&name, data.len() as u64)?;
        self.files.insert(name, Source::Bytes(data));
        Ok(self)
    }

    /// Add a file under `name` whose `size` bytes are read from `path` when
    /// the image is written.
    pub fn add_path(
        &mut self,
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        size: u64,
    ) -> Result<&mut Self> {
        let name = name.into();
        self.check_new(&name, size)?;
        let path = path.into();
        self.files.insert(
            name,
            Source::Path {
                path,
                size: size as u32,
            },
        );
        Ok(self)
    }

    fn check_new(&self, name: &str, size: u64) -> Result<()> {
        if name.is_empty() {
            return Err(Error::InvalidName(name.to_string(), "empty"));
        }
        if name.contains('\0') {
            return Err(Error::InvalidName(name.to_string(), "contains NUL"));
        }
        if !name.is_ascii() {
            return Err(Error::InvalidName(name.to_string(), "not ASCII"));
        }
        if size > Entry::MAX_SIZE as u64 {
            return Err(Error::FileTooLarge(size));
        }
        if self.files.contains_key(name) {
            return Err(Error::DuplicateName(name.to_string()));
        }
        if self.files.len() >= u16::MAX as usize {
            return Err(Error::TooManyEntries);
        }
        Ok(())
    }

    /// Add every regular file under `root`, named by its `/`-separated path
    /// relative to `root`.
    ///
    /// Only names and sizes are recorded here; contents are read by
    /// [`write_to`](Self::write_to). Empty files, empty directories and
    /// anything that is neither a file nor a directory are errors. With
    /// `force` they are logged and skipped.
    pub fn collect_dir(&mut self, root: &Path, force: bool) -> Result<CollectStats> {
        if !root.is_dir() {
            return Err(Error::UnusablePath {
                path: root.to_path_buf(),
                reason: "not a directory",
            });
        }

        let mut stats = CollectStats::default();
        self.collect_into(root, root, force, &mut stats)?;
        Ok(stats)
    }

    fn collect_into(
        &mut self,
        root: &Path,
        dir: &Path,
        force: bool,
        stats: &mut CollectStats,
    ) -> Result<()> {
        let mut children = fs::read_dir(dir)?.collect::<std::io::Result<Vec<_>>>()?;
        children.sort_by_key(|c| c.file_name());

        if children.is_empty() {
            skip_or_fail(dir, "useless empty directory", force, stats)?;
            return Ok(());
        }

        for child in children {
            let path = child.path();
            if child.file_type()?.is_dir() {
                self.collect_into(root, &path, force, stats)?;
                continue;
            }

            let meta = fs::metadata(&path)?;
            if !meta.is_file() {
                skip_or_fail(&path, "not a file", force, stats)?;
                continue;
            }
            if meta.len() == 0 {
                skip_or_fail(&path, "useless empty file", force, stats)?;
                continue;
            }

            let name = relative_name(root, &path)?;
            debug!(name = %name, size = meta.len(), "collected file");
            self.add_path(name, path, meta.len())?;
            stats.files += 1;
            stats.bytes += meta.len();
        }

        Ok(())
    }

    /// Lay out the image in memory.
    pub fn build(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.image_len() as usize);
        self.write_to(&mut out, false)?;
        Ok(out)
    }

    /// Stream the image into `writer`.
    ///
    /// A collected file whose length no longer matches the size recorded at
    /// collection time is an error. With `force` it is logged instead, and
    /// its node is cut or zero-padded to the recorded size so the table
    /// written up front stays valid.
    pub fn write_to<W: Write>(&self, writer: &mut W, force: bool) -> Result<WriteStats> {
        let total = self.image_len();
        if total > u32::MAX as u64 {
            return Err(Error::ImageTooLarge(total));
        }

        let header = Header {
            magic: self.magic,
            entry_count: self.files.len() as u16,
        };
        writer.write_all(&header.to_bytes())?;

        for node in self.layout() {
            let entry = Entry {
                size: node.size,
                offset: node.offset,
            };
            writer.write_all(&entry.to_bytes()?)?;
        }

        let mut stats = WriteStats {
            bytes: total,
            mismatched: 0,
        };
        let mut buf = vec![0u8; COPY_BUFFER_SIZE];
        for (name, source) in &self.files {
            match source {
                Source::Bytes(data) => writer.write_all(data)?,
                Source::Path { path, size } => {
                    let actual = copy_file(path, *size, writer, &mut buf)?;
                    if actual != *size as u64 {
                        let err = Error::SizeMismatch {
                            path: path.clone(),
                            expected: *size,
                            actual,
                        };
                        if !force {
                            return Err(err);
                        }
                        warn!(name = %name, "{err}, keeping the recorded size");
                        stats.mismatched += 1;
                    }
                }
            }
            writer.write_all(name.as_bytes())?;
            writer.write_all(&[0])?;
        }

        Ok(stats)
    }
}

/// Copy exactly `size` bytes of `path` into `writer`, zero-filling a short
/// file, and return the file's actual length.
fn copy_file<W: Write>(path: &Path, size: u32, writer: &mut W, buf: &mut [u8]) -> Result<u64> {
    let mut src = fs::File::open(path)?.take(size as u64);
    let mut copied = 0u64;
    loop {
        let n = match src.read(buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        writer.write_all(&buf[..n])?;
        copied += n as u64;
    }

    if copied < size as u64 {
        io::copy(&mut io::repeat(0).take(size as u64 - copied), writer)?;
        return Ok(copied);
    }

    let extra = io::copy(&mut src.into_inner(), &mut io::sink())?;
    Ok(copied + extra)
}

fn skip_or_fail(
    path: &Path,
    reason: &'static str,
    force: bool,
    stats: &mut CollectStats,
) -> Result<()> {
    if !force {
        return Err(Error::UnusablePath {
            path: path.to_path_buf(),
            reason,
        });
    }
    warn!(path = %path.display(), reason, "skipping");
    stats.skipped += 1;
    Ok(())
}

fn relative_name(root: &Path, path: &Path) -> Result<String> {
    let rel = path.strip_prefix(root).map_err(|_| Error::UnusablePath {
        path: path.to_path_buf(),
        reason: "outside the collected directory",
    })?;

    let mut parts = Vec::new();
    for part in rel.components() {
        let part = part.as_os_str().to_str().ok_or_else(|| {
            Error::InvalidName(path.to_string_lossy().into_owned(), "not valid UTF-8")
        })?;
        parts.push(part);
    }
    Ok(parts.join("/"))
}
