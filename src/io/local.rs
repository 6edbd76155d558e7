use anyhow::{Context, Result};
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;
use tracing::debug;

use super::Region;

/// Map a local image file read-only
///
/// Empty files are returned as an empty owned region since there is
/// nothing to map.
pub fn map_file(path: &Path) -> Result<Region> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let size = file.metadata()?.len();
    if size == 0 {
        return Ok(Region::Owned(Vec::new()));
    }

    // SAFETY: the mapping is read-only; the image file must not be truncated
    // or rewritten while the region is alive.
    let mmap = unsafe { Mmap::map(&file) }
        .with_context(|| format!("mapping {}", path.display()))?;
    debug!(path = %path.display(), size, "image mapped");
    Ok(Region::Mapped(mmap))
}
