use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::device::Image;

/// Copy buffer used when streaming a file to disk.
const COPY_BUFFER_SIZE: usize = 16 * 1024;

/// One file stored in an image
#[derive(Debug, Clone, Copy)]
pub struct ImageFile<'a> {
    pub index: u16,
    pub name: &'a [u8],
    pub size: u32,
}

impl ImageFile<'_> {
    pub fn display_name(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.name)
    }
}

/// Image file extractor
pub struct Extractor<'a> {
    image: Image<'a>,
}

impl<'a> Extractor<'a> {
    pub fn new(image: Image<'a>) -> Self {
        Self { image }
    }

    /// List all files in table order
    pub fn list_files(&self) -> Vec<ImageFile<'a>> {
        (0..self.image.num_entries())
            .filter_map(|index| self.file_at(index))
            .collect()
    }

    /// Look up a single file by name
    pub fn find(&self, name: &str) -> Option<ImageFile<'a>> {
        self.file_at(self.image.search(name)?)
    }

    fn file_at(&self, index: u16) -> Option<ImageFile<'a>> {
        Some(ImageFile {
            index,
            name: self.image.entry_name(index)?,
            size: self.image.entry(index)?.size,
        })
    }

    /// Extract file to disk, returning the number of bytes written
    pub async fn extract_to_file(&self, entry: &ImageFile<'_>, output_path: &Path) -> Result<u64> {
        let mut src = self
            .image
            .open_index(entry.index)
            .ok_or_else(|| anyhow!("entry {} is not in the image", entry.index))?;

        // Create parent directories if needed
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }

        let mut dst = fs::File::create(output_path)
            .await
            .with_context(|| format!("creating {}", output_path.display()))?;

        let expected = src.remaining() as u64;
        let mut buf = vec![0u8; COPY_BUFFER_SIZE];
        let mut written = 0u64;
        loop {
            let n = src.read(&mut buf);
            if n == 0 {
                break;
            }
            dst.write_all(&buf[..n]).await?;
            written += n as u64;
        }
        dst.flush().await?;

        if written != expected {
            bail!(
                "short write for {}: expected {} bytes, wrote {}",
                output_path.display(),
                expected,
                written
            );
        }

        debug!(path = %output_path.display(), bytes = written, "extracted");
        Ok(written)
    }

    /// Extract file to stdout straight from the mapped image
    pub async fn extract_to_stdout(&self, entry: &ImageFile<'_>) -> Result<u64> {
        let src = self
            .image
            .open_index(entry.index)
            .ok_or_else(|| anyhow!("entry {} is not in the image", entry.index))?;
        let data = src.map();

        let mut stdout = tokio::io::stdout();
        stdout.write_all(data).await?;
        stdout.flush().await?;

        Ok(data.len() as u64)
    }
}

/// Join an image file name onto `dir`, refusing names that would escape it.
pub fn output_path(dir: &Path, name: &str) -> Result<PathBuf> {
    let rel = Path::new(name);
    if rel
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        bail!("refusing to extract {:?} outside the destination directory", name);
    }
    Ok(dir.join(rel))
}
