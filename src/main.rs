//! MiniPack CLI - Command-line tool for building and extracting MiniPack archives.
//!
//! This is the main entry point for the MiniPack command-line application.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use tempfile::NamedTempFile;

use minipack::pack::WriterSink;
use minipack::prelude::*;

/// MiniPack - flat archive tool
///
/// `minipack <input> <output> [-i]` builds a pack, same as `minipack pack`.
#[derive(Parser)]
#[command(name = "minipack")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true, subcommand_negates_reqs = true)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(flatten)]
    pack: PackArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct PackArgs {
    /// Directory to pack recursively, or a text file listing one path per line
    #[arg(env = "MINIPACK_INPUT", required = true)]
    input: Option<PathBuf>,

    /// Output pack file
    #[arg(env = "MINIPACK_OUTPUT", required = true)]
    output: Option<PathBuf>,

    /// Write only the header and index, without entry data
    #[arg(short, long)]
    index_only: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a pack from a directory or a list file
    Pack(PackArgs),

    /// List the contents of a pack
    List {
        /// Path to the pack file
        #[arg(env = "MINIPACK_PACK")]
        pack: PathBuf,

        /// Filter pattern (glob-style)
        #[arg(short, long)]
        filter: Option<String>,

        /// Show sizes and offsets
        #[arg(short, long)]
        detailed: bool,

        /// Print entries as JSON
        #[arg(long, conflicts_with = "detailed")]
        json: bool,

        /// Name layout of the pack
        #[arg(long, value_enum, default_value_t = LayoutArg::Utf16)]
        layout: LayoutArg,
    },

    /// Extract a single entry to a file
    Extract {
        /// Path to the pack file
        pack: PathBuf,

        /// Stored name of the entry
        name: String,

        /// Output file
        output: PathBuf,

        /// Name layout of the pack
        #[arg(long, value_enum, default_value_t = LayoutArg::Utf16)]
        layout: LayoutArg,
    },

    /// Extract all entries into a directory
    ExtractAll {
        /// Path to the pack file
        #[arg(env = "MINIPACK_PACK")]
        pack: PathBuf,

        /// Output directory
        #[arg(env = "MINIPACK_OUTPUT")]
        output: PathBuf,

        /// Filter pattern (glob-style)
        #[arg(short, long)]
        filter: Option<String>,

        /// Name layout of the pack
        #[arg(long, value_enum, default_value_t = LayoutArg::Utf16)]
        layout: LayoutArg,
    },
}

/// Name layouts selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LayoutArg {
    /// Current layout (UTF-16 names)
    Utf16,
    /// Older tools: NUL-terminated UTF-8 names
    FlatUtf8,
    /// Older tools: per-name encoding tag
    Tagged,
}

impl From<LayoutArg> for NameLayout {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Utf16 => NameLayout::Utf16,
            LayoutArg::FlatUtf8 => NameLayout::FlatUtf8,
            LayoutArg::Tagged => NameLayout::Tagged,
        }
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            std::process::exit(parse_exit_code(&e));
        }
    };
    init_logging(cli.verbose);

    let command = cli.command.unwrap_or(Commands::Pack(cli.pack));
    if let Err(e) = run(command) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

/// Help and version requests succeed; every usage error exits 1.
fn parse_exit_code(err: &clap::Error) -> i32 {
    if err.use_stderr() {
        1
    } else {
        0
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Pack(args) => {
            let (Some(input), Some(output)) = (args.input, args.output) else {
                anyhow::bail!("usage: minipack <list-file-or-directory> <output-path> [--index-only|-i]");
            };
            cmd_pack(&input, &output, args.index_only)
        }
        Commands::List {
            pack,
            filter,
            detailed,
            json,
            layout,
        } => cmd_list(&pack, filter.as_deref(), detailed, json, layout.into()),
        Commands::Extract {
            pack,
            name,
            output,
            layout,
        } => cmd_extract(&pack, &name, &output, layout.into()),
        Commands::ExtractAll {
            pack,
            output,
            filter,
            layout,
        } => cmd_extract_all(&pack, &output, filter.as_deref(), layout.into()),
    }
}

fn cmd_pack(input: &Path, output: &Path, index_only: bool) -> Result<()> {
    let start = Instant::now();
    let mut builder = MiniPackBuilder::new();

    if input.is_dir() {
        let files = collect_files(input).context("Failed to scan input directory")?;
        for file in &files {
            add_file_to_builder(&mut builder, &file.disk_path, Some(&file.stored_name))
                .with_context(|| format!("Failed to add {}", file.disk_path.display()))?;
        }
    } else {
        let paths = read_file_list(input).context("Failed to read file list")?;
        for path in &paths {
            add_file_to_builder(&mut builder, path, None)
                .with_context(|| format!("Failed to add {path}"))?;
        }
    }
    info!("Collected {} files in {:?}", builder.file_count(), start.elapsed());

    let index = builder.build_index().context("Failed to build pack index")?;
    let mut total = index.header.len() as u64;
    if !index_only {
        total += index.summary.total_data_size;
    }

    // Write next to the destination and move into place only once complete
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create output file in {}", dir.display()))?;

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")?
            .progress_chars("#>-"),
    );

    let summary = {
        let mut sink = ProgressSink {
            inner: WriterSink::new(tmp.as_file_mut()),
            pb: &pb,
        };
        let summary = builder
            .build_pack(&mut sink, index_only)
            .context("Failed to build pack")?;
        sink.inner.finish().context("Failed to write pack")?;
        summary
    };
    pb.finish_and_clear();

    tmp.persist(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    if index_only {
        println!(
            "Wrote index (info block) for {} files to {} (info_size={} bytes, data={} bytes, data not written)",
            summary.file_count,
            output.display(),
            summary.info_size,
            summary.total_data_size
        );
    } else {
        println!("Packed {} into {}", summary, output.display());
    }
    info!("Pack completed in {:?}", start.elapsed());

    Ok(())
}

fn cmd_list(
    pack: &Path,
    filter: Option<&str>,
    detailed: bool,
    json: bool,
    layout: NameLayout,
) -> Result<()> {
    let reader = MiniPackReader::open_with_layout(pack, layout).context("Failed to open pack")?;
    let pattern = compile_filter(filter)?;

    let entries: Vec<&MiniPackEntry> = reader
        .entries()
        .iter()
        .filter(|e| matches_filter(pattern.as_ref(), &e.name))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for entry in &entries {
        if detailed {
            println!("{:>12} {:>12} {}", entry.size, entry.offset, entry.name);
        } else {
            println!("{}", entry.name);
        }
    }

    println!("\nTotal: {} entries", entries.len());

    Ok(())
}

fn cmd_extract(pack: &Path, name: &str, output: &Path, layout: NameLayout) -> Result<()> {
    let reader = MiniPackReader::open_with_layout(pack, layout).context("Failed to open pack")?;

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }

    let written = reader
        .extract_entry_to_file(name, output)
        .with_context(|| format!("Failed to extract {name}"))?;

    println!("Extracted {} ({} bytes) to {}", name, written, output.display());

    Ok(())
}

fn cmd_extract_all(
    pack: &Path,
    output: &Path,
    filter: Option<&str>,
    layout: NameLayout,
) -> Result<()> {
    println!("Opening pack: {}", pack.display());

    let reader = MiniPackReader::open_with_layout(pack, layout).context("Failed to open pack")?;
    let pattern = compile_filter(filter)?;

    let entries: Vec<&MiniPackEntry> = reader
        .entries()
        .iter()
        .filter(|e| matches_filter(pattern.as_ref(), &e.name))
        .collect();

    println!("Extracting {} entries...", entries.len());

    let pb = ProgressBar::new(entries.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    fs::create_dir_all(output)?;

    let start = Instant::now();
    let mut seen = HashSet::new();
    let mut extracted = 0;
    let mut skipped = 0;

    for entry in &entries {
        pb.inc(1);

        let Some(relative) = safe_relative_path(&entry.name) else {
            warn!("Refusing to extract unsafe name: {}", entry.name);
            skipped += 1;
            continue;
        };

        // Lookups resolve to the first entry with a name; later duplicates are shadowed
        if !seen.insert(entry.name.as_str()) {
            warn!("Skipping duplicate entry: {}", entry.name);
            skipped += 1;
            continue;
        }

        let output_path = output.join(relative);
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }

        reader
            .extract_to_file(entry, &output_path)
            .with_context(|| format!("Failed to extract {}", entry.name))?;
        extracted += 1;
    }

    pb.finish_with_message("Done");
    println!(
        "Extracted {} entries in {:?} ({} skipped)",
        extracted,
        start.elapsed(),
        skipped
    );

    Ok(())
}

/// Forwards pack bytes to an inner sink while advancing a progress bar.
struct ProgressSink<'a, S: PackSink> {
    inner: S,
    pb: &'a ProgressBar,
}

impl<S: PackSink> PackSink for ProgressSink<'_, S> {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.inner.write(bytes)?;
        self.pb.inc(bytes.len() as u64);
        Ok(())
    }
}

fn compile_filter(filter: Option<&str>) -> Result<Option<glob::Pattern>> {
    filter
        .map(|f| glob::Pattern::new(f).with_context(|| format!("Invalid filter pattern: {f}")))
        .transpose()
}

fn matches_filter(pattern: Option<&glob::Pattern>, name: &str) -> bool {
    pattern.map_or(true, |p| p.matches(name))
}

/// Map a stored name to a relative output path, refusing anything that
/// could land outside the output directory.
fn safe_relative_path(name: &str) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    (!out.as_os_str().is_empty()).then_some(out)
}
