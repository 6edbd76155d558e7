//! Builds an xrofs image from a directory tree.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use xrofs::ImageBuilder;
use xrofs::cli::human_size;
use xrofs::image::{Entry, Header};

#[derive(Parser, Debug)]
#[command(name = "xrofsgen")]
#[command(version)]
#[command(about = "Builds xrofs file system image from directory structure", long_about = None)]
struct Args {
    /// Directory to be packed into filesystem image
    #[arg(short = 'd', long = "dir", value_name = "DIR")]
    dir: PathBuf,

    /// Generated filesystem image file
    #[arg(short = 'o', long = "out", value_name = "FILE")]
    out: PathBuf,

    /// Skip unusable files and directories instead of failing
    #[arg(short = 'f', long)]
    force: bool,

    /// Verbose output
    #[arg(short = 'v')]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();

    println!("* Collecting files in \"{}\"", args.dir.display());
    let mut builder = ImageBuilder::new();
    let stats = builder
        .collect_dir(&args.dir, args.force)
        .with_context(|| format!("collecting {}", args.dir.display()))?;
    if args.verbose {
        for node in builder.layout() {
            println!("  > {:<64} {:>10}", node.name, human_size(node.size as u64));
        }
    }
    println!(
        "* Collected {} files totalling {}",
        stats.files,
        human_size(stats.bytes)
    );

    let image_len = builder.image_len();
    println!(
        "* Writing image \"{}\" totalling {}",
        args.out.display(),
        human_size(image_len)
    );

    if args.verbose {
        let table_len = Header::SIZE + builder.len() * Entry::SIZE;
        println!("  > [ HEADER ({}) ]", human_size(table_len as u64));
        for node in builder.layout() {
            let at = format!("@ 0x{:06x}", node.offset);
            println!("  > {:<64} {:>10}", node.name, at);
        }
    }

    let file = File::create(&args.out)
        .with_context(|| format!("creating {}", args.out.display()))?;
    let mut writer = BufWriter::new(file);
    let written = builder
        .write_to(&mut writer, args.force)
        .with_context(|| format!("writing {}", args.out.display()))?;
    writer
        .into_inner()
        .map_err(|e| e.into_error())
        .with_context(|| format!("flushing {}", args.out.display()))?;

    let efficiency = if written.bytes > 0 {
        builder.data_len() as f64 * 100.0 / written.bytes as f64
    } else {
        0.0
    };
    println!(
        "* Written {} files {} total [size efficiency: {:.2} %]",
        builder.len(),
        human_size(written.bytes),
        efficiency
    );

    if args.verbose {
        let ignored = stats.skipped + written.mismatched;
        if ignored == 0 {
            println!("Result: good");
        } else {
            println!("Result: unstable ({} errors ignored)", ignored);
        }
    }

    Ok(())
}
