//! Main entry point for the xrofs listing and extraction tool.
//!
//! Images are memory-mapped when given as a path, or downloaded into memory
//! when given as an HTTP URL, and then read in place.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::Path;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use xrofs::cli::{Destination, Mode, Selection, human_size};
use xrofs::image::{DEFAULT_MAGIC, output_path};
use xrofs::{Cli, Extractor, Image, ImageFile};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let mode = cli.mode()?;

    // The destination must be fresh; create it before touching the image.
    if let Mode::Extract {
        destination: Destination::Dir(ref dir),
        ..
    } = mode
    {
        std::fs::create_dir(dir).with_context(|| {
            format!(
                "Resulting directory {} should NOT exist before extraction",
                dir.display()
            )
        })?;
    }

    let region = xrofs::io::load_region(&cli.image).await?;
    let image = Image::new(&region).with_context(|| format!("reading image {}", cli.image))?;

    if image.magic() != DEFAULT_MAGIC {
        warn!("unexpected image magic {:#06x}", image.magic());
    }
    if !image.is_sorted() {
        warn!("entry table is not sorted by name, lookups may miss files");
    }

    let extractor = Extractor::new(image);
    match mode {
        Mode::List => {
            list_files(&extractor);
            Ok(())
        }
        Mode::Extract {
            selection,
            destination,
        } => {
            if !cli.is_quiet() {
                println!(
                    "* Discovered {} files totalling {}",
                    image.num_entries(),
                    human_size(image.region_len() as u64)
                );
            }
            extract(&extractor, &cli, selection, &destination).await
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Print every entry's name and size in table order.
fn list_files(extractor: &Extractor<'_>) {
    for entry in extractor.list_files() {
        println!(
            "{:<67} {:>11}",
            entry.display_name(),
            human_size(entry.size as u64)
        );
    }
}

/// Extract the selected files.
///
/// Requested names missing from the image are reported and skipped; the run
/// still fails at the end so the exit status reflects them. Any I/O error
/// aborts immediately.
async fn extract(
    extractor: &Extractor<'_>,
    cli: &Cli,
    selection: Selection,
    destination: &Destination,
) -> Result<()> {
    let mut missing = Vec::new();
    let targets: Vec<ImageFile<'_>> = match selection {
        Selection::All => extractor.list_files(),
        Selection::Named(names) => names
            .into_iter()
            .filter_map(|name| {
                let found = extractor.find(&name);
                if found.is_none() {
                    eprintln!("File \"{}\" not found", name);
                    missing.push(name);
                }
                found
            })
            .collect(),
    };

    if let Destination::Dir(dir) = destination {
        if !cli.is_quiet() {
            println!("* Extracting \"{}\" to \"{}\"", cli.image, dir.display());
        }
    }

    let total = targets.len();
    for (i, entry) in targets.iter().enumerate() {
        if !cli.is_quiet() {
            println!(
                "[{}/{} {:>9}] {}",
                i + 1,
                total,
                human_size(entry.size as u64),
                entry.display_name()
            );
        }

        match destination {
            Destination::Stdout => {
                extractor.extract_to_stdout(entry).await?;
            }
            Destination::Dir(dir) => {
                extract_to_dir(extractor, entry, dir).await?;
            }
        }
    }

    if !missing.is_empty() {
        bail!("{} requested file(s) not found: {}", missing.len(), missing.join(", "));
    }
    Ok(())
}

async fn extract_to_dir(extractor: &Extractor<'_>, entry: &ImageFile<'_>, dir: &Path) -> Result<()> {
    let path = output_path(dir, &entry.display_name())?;
    extractor
        .extract_to_file(entry, &path)
        .await
        .with_context(|| format!("I/O error extracting {}", entry.display_name()))?;
    Ok(())
}
