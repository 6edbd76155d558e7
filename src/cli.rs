use anyhow::{Result, bail};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "xrofs")]
#[command(version)]
#[command(about = "Tool for listing and extracting xrofs image contents", long_about = None)]
#[command(after_help = "Examples:\n  \
  xrofs -i fs.img -l                    list image contents\n  \
  xrofs -i fs.img -a -d out             extract every file into ./out\n  \
  xrofs -i fs.img -d out a.txt b/c.bin  extract selected files\n  \
  xrofs -i https://example.com/fs.img -p a.txt   print a remote file")]
pub struct Cli {
    /// Image file path or HTTP URL
    #[arg(short = 'i', long = "img", value_name = "IMGFILE")]
    pub image: String,

    /// Files to extract
    #[arg(value_name = "FILES")]
    pub files: Vec<String>,

    /// List image contents and exit
    #[arg(short = 'l', long)]
    pub list: bool,

    /// Extract every file
    #[arg(short = 'a', long)]
    pub all: bool,

    /// Output directory, must not exist yet
    #[arg(short = 'd', long = "dir", value_name = "OUTDIR")]
    pub extract_dir: Option<PathBuf>,

    /// Write file contents to stdout instead of a directory
    #[arg(short = 'p', long)]
    pub pipe: bool,

    /// Don't produce verbose output
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

/// Which files to extract
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    All,
    Named(Vec<String>),
}

/// Where extracted files go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Dir(PathBuf),
    Stdout,
}

/// What the command line asks for, after validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    List,
    Extract {
        selection: Selection,
        destination: Destination,
    },
}

impl Cli {
    pub fn is_quiet(&self) -> bool {
        self.quiet || self.pipe
    }

    /// Check option combinations and resolve the requested mode.
    pub fn mode(&self) -> Result<Mode> {
        if self.list {
            if !self.files.is_empty() || self.extract_dir.is_some() || self.all || self.pipe {
                bail!("To list image contents NO filenames, --all, --pipe or --dir should be given");
            }
            return Ok(Mode::List);
        }

        let selection = match (self.all, self.files.is_empty()) {
            (true, false) => {
                bail!("Ambiguous arguments: either --all OR separate filenames should be given")
            }
            (true, true) => Selection::All,
            (false, false) => Selection::Named(self.files.clone()),
            (false, true) => bail!("Either --list, --all or FILEs to extract must be provided"),
        };

        let destination = match (self.pipe, &self.extract_dir) {
            (true, Some(_)) => bail!("Either --pipe OR --dir should be given"),
            (true, None) => Destination::Stdout,
            (false, Some(dir)) => Destination::Dir(dir.clone()),
            (false, None) => bail!("No output directory provided for extraction"),
        };

        Ok(Mode::Extract {
            selection,
            destination,
        })
    }
}

/// Format a byte size with a binary unit, using as many decimals as the
/// unit's rank (`512 B`, `1.5 KB`, `2.00 MB`, `1.000 GB`).
pub fn human_size(size: u64) -> String {
    const UNITS: [&str; 4] = [" B", "KB", "MB", "GB"];

    let mut value = size as f64;
    let mut rank = 0;
    while value > 1024.0 && rank < UNITS.len() - 1 {
        value /= 1024.0;
        rank += 1;
    }
    format!("{:.*} {}", rank, value, UNITS[rank])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("xrofs").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn list_mode() {
        assert_eq!(parse(&["-i", "fs.img", "-l"]).mode().unwrap(), Mode::List);
        assert!(parse(&["-i", "fs.img", "-l", "a.txt"]).mode().is_err());
        assert!(parse(&["-i", "fs.img", "-l", "-d", "out"]).mode().is_err());
    }

    #[test]
    fn extract_modes() {
        assert_eq!(
            parse(&["-i", "fs.img", "-a", "-d", "out"]).mode().unwrap(),
            Mode::Extract {
                selection: Selection::All,
                destination: Destination::Dir(PathBuf::from("out")),
            }
        );
        assert_eq!(
            parse(&["--img", "fs.img", "-p", "a", "b"]).mode().unwrap(),
            Mode::Extract {
                selection: Selection::Named(vec!["a".into(), "b".into()]),
                destination: Destination::Stdout,
            }
        );
    }

    #[test]
    fn rejects_bad_combinations() {
        assert!(parse(&["-i", "fs.img", "-a", "x", "-d", "out"]).mode().is_err());
        assert!(parse(&["-i", "fs.img", "-d", "out"]).mode().is_err());
        assert!(parse(&["-i", "fs.img", "-a"]).mode().is_err());
        assert!(parse(&["-i", "fs.img", "-a", "-p", "-d", "out"]).mode().is_err());
    }

    #[test]
    fn image_is_required() {
        assert!(Cli::try_parse_from(["xrofs", "-l"]).is_err());
    }

    #[test]
    fn pipe_implies_quiet() {
        assert!(parse(&["-i", "fs.img", "-p", "a"]).is_quiet());
        assert!(!parse(&["-i", "fs.img", "-a", "-d", "o"]).is_quiet());
    }

    #[test]
    fn human_sizes() {
        assert_eq!(human_size(0), "0  B");
        assert_eq!(human_size(1024), "1024  B");
        assert_eq!(human_size(1536), "1.5 KB");
        assert_eq!(human_size(3 * 1024 * 1024), "3.00 MB");
        assert_eq!(human_size(5 * 1024 * 1024 * 1024), "5.000 GB");
        assert_eq!(human_size(3 * 1024 * 1024 * 1024 * 1024), "3072.000 GB");
    }
}
