//! flashfs
//!
//! Inspect and build flash file system images

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use flashfs_rs::{walk, FlashFileSystem, FlashFsConfig, ImageBuilder};
use memmap2::Mmap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "flashfs")]
#[command(about = "Inspect and build read-only flash file system images")]
struct Args {
    /// TOML file with mount settings (signature, scan_limit, alignment, ...)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the immediate children of a directory
    Ls {
        image: PathBuf,
        #[arg(default_value = "/")]
        dir: String,
    },
    /// Print every directory and file as an indented tree
    Tree { image: PathBuf },
    /// Write a file's contents to stdout
    Cat { image: PathBuf, path: String },
    /// Validate the file table of an image
    Check { image: PathBuf },
    /// Build an image from a directory on the host
    Pack {
        source: PathBuf,
        output: PathBuf,
        /// Bytes of zero padding placed before the image
        #[arg(long, default_value = "0")]
        offset: usize,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    let config = match &args.config {
        Some(path) => FlashFsConfig::load(path)
            .with_context(|| format!("Failed to load config {:?}", path))?,
        None => FlashFsConfig::default(),
    };

    match args.command {
        Commands::Ls { image, dir } => with_mounted(&image, config, |fs| ls(fs, &dir)),
        Commands::Tree { image } => with_mounted(&image, config, tree),
        Commands::Cat { image, path } => with_mounted(&image, config, |fs| cat(fs, &path)),
        Commands::Check { image } => with_mounted(&image, config, check),
        Commands::Pack {
            source,
            output,
            offset,
        } => pack(&source, &output, offset, &config),
    }
}

/// Map `image` and run `f` against the mounted file system
fn with_mounted<F>(image: &Path, config: FlashFsConfig, f: F) -> Result<()>
where
    F: FnOnce(&mut FlashFileSystem<'_>) -> Result<()>,
{
    let file = File::open(image).with_context(|| format!("Failed to open {:?}", image))?;
    // SAFETY: the mapping is read-only and lives until the end of this
    // function; the file is not expected to change while it is inspected.
    let region = unsafe { Mmap::map(&file) }.with_context(|| format!("Failed to map {:?}", image))?;
    debug!("Mapped {} bytes from {:?}", region.len(), image);

    let mut fs = FlashFileSystem::mount_with(&region, config)?;
    if !fs.is_mounted() {
        bail!("No flash file system found in {:?}", image);
    }
    f(&mut fs)
}

fn ls(fs: &mut FlashFileSystem<'_>, dir: &str) -> Result<()> {
    let handle = fs
        .open_dir(dir)
        .with_context(|| format!("Cannot list {:?}", dir))?;
    let prefix = dir.trim_matches('/');

    let mut stdout = std::io::stdout().lock();
    while let Some(entry) = fs.read_dir(handle)? {
        if entry.is_dir() {
            writeln!(stdout, "{:>10}  {}", "-", entry.name)?;
        } else {
            let path = if prefix.is_empty() {
                entry.name.to_string()
            } else {
                format!("{}/{}", prefix, entry.name)
            };
            writeln!(stdout, "{:>10}  {}", fs.metadata(&path)?.size, entry.name)?;
        }
    }
    fs.close_dir(handle)?;
    Ok(())
}

fn tree(fs: &mut FlashFileSystem<'_>) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "/")?;
    print_tree(fs, "", 1, &mut stdout)
}

fn print_tree(
    fs: &FlashFileSystem<'_>,
    dir: &str,
    depth: usize,
    out: &mut impl Write,
) -> Result<()> {
    for entry in fs.list(dir)? {
        writeln!(out, "{}{}", "  ".repeat(depth), entry.name)?;
        if entry.is_dir() {
            let child = format!("{}{}", dir, entry.name);
            print_tree(fs, &child, depth + 1, out)?;
        }
    }
    Ok(())
}

fn cat(fs: &mut FlashFileSystem<'_>, path: &str) -> Result<()> {
    let handle = fs
        .open_file(path)
        .with_context(|| format!("Cannot open {:?}", path))?;
    let mut stdout = std::io::stdout().lock();
    let mut buf = [0u8; 4096];
    loop {
        let n = fs.read(handle, &mut buf)?;
        if n == 0 {
            break;
        }
        stdout.write_all(&buf[..n])?;
    }
    fs.close_file(handle)?;
    Ok(())
}

fn check(fs: &mut FlashFileSystem<'_>) -> Result<()> {
    let table = fs.table()?;
    table.verify().context("File table is inconsistent")?;

    let mut files = 0usize;
    let mut bytes = 0usize;
    walk(&*fs, "/", &mut |_, body| {
        files += 1;
        bytes += body.len();
    })?;
    if files != table.len() {
        bail!(
            "Directory walk reached {} of {} files",
            files,
            table.len()
        );
    }

    println!(
        "OK: {} files, {} bytes, image at offset {:#x}",
        files,
        bytes,
        fs.image_offset().unwrap_or_default()
    );
    Ok(())
}

fn pack(source: &Path, output: &Path, offset: usize, config: &FlashFsConfig) -> Result<()> {
    if offset % config.alignment != 0 {
        bail!(
            "Offset {} is not a multiple of the {}-byte alignment",
            offset,
            config.alignment
        );
    }

    let mut builder = ImageBuilder::new().with_signature(config.signature);
    collect_files(source, source, &mut builder)?;
    if builder.is_empty() {
        bail!("No files found under {:?}", source);
    }

    let image = builder.build().context("Failed to build image")?;
    let mut out = File::create(output).with_context(|| format!("Failed to create {:?}", output))?;
    out.write_all(&vec![0u8; offset])?;
    out.write_all(&image)?;

    info!("Packed {} files into {:?}", builder.len(), output);
    println!("{} files, {} bytes", builder.len(), image.len());
    Ok(())
}

fn collect_files(root: &Path, dir: &Path, builder: &mut ImageBuilder) -> Result<()> {
    for entry in std::fs::read_dir(dir).with_context(|| format!("Failed to read {:?}", dir))? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(root, &path, builder)?;
            continue;
        }

        let relative = path.strip_prefix(root)?;
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<Vec<_>>>()
            .with_context(|| format!("Path {:?} is not valid UTF-8", relative))?
            .join("/");
        let contents = std::fs::read(&path).with_context(|| format!("Failed to read {:?}", path))?;
        debug!("Adding {} ({} bytes)", name, contents.len());
        builder.add(&name, &contents)?;
    }
    Ok(())
}
