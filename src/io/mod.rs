//! Obtaining the byte region an [`Image`](crate::Image) is read from.

mod http;
mod local;

pub use http::HttpRangeReader;
pub use local::map_file;

use anyhow::{Result, bail};
use async_trait::async_trait;
use memmap2::Mmap;
use std::ops::Deref;
use std::path::Path;
use tracing::debug;

/// Largest single request issued by [`read_fully`].
const FETCH_CHUNK_SIZE: usize = 1024 * 1024;

/// Trait for random access reading from a data source
#[async_trait]
pub trait ReadAt: Send + Sync {
    /// Read data at the specified offset into the buffer
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Get the total size of the data source
    fn size(&self) -> u64;
}

/// Backing memory for an image
pub enum Region {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl Deref for Region {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Region::Mapped(mmap) => mmap,
            Region::Owned(buf) => buf,
        }
    }
}

pub fn is_http_url(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Read a whole source into memory in bounded chunks
///
/// Sources larger than an image can address (`u32::MAX` bytes) are refused
/// before anything is allocated.
pub async fn read_fully<R: ReadAt + ?Sized>(reader: &R) -> Result<Vec<u8>> {
    let size = reader.size();
    if size > u32::MAX as u64 {
        bail!(
            "source of {} bytes is larger than any image ({} bytes max)",
            size,
            u32::MAX
        );
    }
    let size = usize::try_from(size)?;
    let mut data = vec![0u8; size];
    let mut filled = 0;

    while filled < size {
        let end = (filled + FETCH_CHUNK_SIZE).min(size);
        let n = reader.read_at(filled as u64, &mut data[filled..end]).await?;
        if n == 0 {
            bail!("source ended after {} of {} bytes", filled, size);
        }
        filled += n;
        debug!(filled, size, "fetched chunk");
    }

    Ok(data)
}

/// Load an image from a local path (memory-mapped) or an HTTP(S) URL
/// (downloaded into memory)
pub async fn load_region(location: &str) -> Result<Region> {
    if is_http_url(location) {
        let reader = HttpRangeReader::new(location.to_string()).await?;
        let data = read_fully(&reader).await?;
        debug!(bytes = reader.transferred_bytes(), "remote image downloaded");
        Ok(Region::Owned(data))
    } else {
        map_file(Path::new(location))
    }
}
