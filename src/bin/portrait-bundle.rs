//! portrait-bundle CLI
//!
//! Build Stellaris portrait mods from a JSON list of portraits.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use portrait_bundle::bundle::DEFAULT_BUNDLE_DIR;
use portrait_bundle::structured::{self, Layout, Writer, WriterConfig};
use portrait_bundle::{
    AlphaIdGenerator, Bundle, Category, Exporter, FilePayloadSource, IdGenerator, LayoutBuilder,
    LogObserver, PortraitSet, Record,
};
use serde::Deserialize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "portrait-bundle")]
#[command(author = "nzinfo <li.monan@gmail.com>")]
#[command(version)]
#[command(about = "Stellaris static portrait mod builder")]
struct Cli {
    /// Verbose logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a portrait bundle from a JSON portrait list
    Build {
        /// JSON file: [{"id": "...", "category": "HUMAN", "image": "face.dds"}]
        records: PathBuf,

        /// Write a single txtar file instead ("-" for stdout)
        #[arg(short = 'o', long, conflicts_with = "directory")]
        output: Option<PathBuf>,

        /// Mod folder to create [default: stellaris_portraits]
        #[arg(short = 'C', long)]
        directory: Option<PathBuf>,

        /// Write structured text on a single line
        #[arg(long)]
        compact: bool,
    },

    /// List the files of a bundle (txtar file or directory)
    #[command(name = "t")]
    List {
        /// Bundle to list (default: stdin)
        #[arg(short = 'i', long)]
        input: Option<PathBuf>,
    },

    /// Parse a structured text file and print it re-encoded
    Inspect {
        file: PathBuf,

        #[arg(long)]
        compact: bool,
    },

    /// Print the category table
    Categories,

    /// Print fresh portrait ids
    NewId {
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,
    },
}

/// One portrait in the input list
#[derive(Deserialize, Debug)]
struct PortraitEntry {
    /// Generated when absent
    id: Option<String>,
    #[serde(default = "default_category")]
    category: String,
    /// Path to the .dds file, relative to the list file
    image: Option<PathBuf>,
}

fn default_category() -> String {
    Category::default().code().to_string()
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Build { records, output, directory, compact } => {
            build_bundle(&records, output, directory, compact)?;
        }
        Commands::List { input } => {
            list_bundle(input)?;
        }
        Commands::Inspect { file, compact } => {
            inspect_file(&file, compact)?;
        }
        Commands::Categories => {
            for category in Category::ALL {
                let note = if category.is_provisional() { "  (provisional)" } else { "" };
                println!(
                    "{:<12} {:<12} {}{}",
                    category.code(),
                    category.label(),
                    category.bucket_name(),
                    note
                );
            }
        }
        Commands::NewId { count } => {
            let mut ids = AlphaIdGenerator::new();
            for _ in 0..count {
                println!("{}", ids.generate());
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn writer_for(compact: bool) -> Writer {
    let layout = if compact { Layout::Compact } else { Layout::Pretty };
    Writer::with_config(WriterConfig {
        layout,
        ..WriterConfig::default()
    })
}

/// Load the portrait list, resolving images relative to the list file
fn load_portraits(list: &Path) -> Result<PortraitSet> {
    let content = fs::read_to_string(list)
        .with_context(|| format!("Failed to read: {}", list.display()))?;
    let entries: Vec<PortraitEntry> = serde_json::from_str(&content)
        .with_context(|| format!("Invalid portrait list: {}", list.display()))?;
    let base = list.parent().unwrap_or_else(|| Path::new("."));

    let mut ids = AlphaIdGenerator::new();
    let mut set = PortraitSet::new();
    let mut images = FilePayloadSource::new();

    for entry in entries {
        let id = match entry.id {
            Some(id) => id,
            None => ids.generate(),
        };
        // Category is checked later so every bad code is reported together
        set.insert(Record::new(id.clone()).with_category(entry.category))?;
        if let Some(image) = entry.image {
            images.insert(id.clone(), base.join(image));
            set.load_payload(&id, &images)
                .with_context(|| format!("Failed to load image for portrait {}", id))?;
        }
    }

    Ok(set)
}

/// Where `build` puts the bundle
#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Directory(PathBuf),
    Txtar(PathBuf),
    Stdout,
}

/// `-C` wins, then `-o`; with neither the mod folder is written to
/// [`DEFAULT_BUNDLE_DIR`] so the result can be dropped into the game as is.
fn select_target(output: Option<PathBuf>, directory: Option<PathBuf>) -> Target {
    match (directory, output) {
        (Some(dir), _) => Target::Directory(dir),
        (None, Some(path)) if path.as_os_str() == "-" => Target::Stdout,
        (None, Some(path)) => Target::Txtar(path),
        (None, None) => Target::Directory(PathBuf::from(DEFAULT_BUNDLE_DIR)),
    }
}

fn build_bundle(
    list: &Path,
    output: Option<PathBuf>,
    directory: Option<PathBuf>,
    compact: bool,
) -> Result<()> {
    let set = load_portraits(list)?;
    for line in set.summary_lines() {
        info!("{}", line);
    }

    let exporter = Exporter::with_layout(LayoutBuilder::with_writer(writer_for(compact)));
    let entries = exporter
        .export(set.records(), &mut LogObserver)
        .context("Failed to generate bundle! Please fix the issues above")?;
    let bundle = Bundle::from_entries(entries)?;

    match select_target(output, directory) {
        Target::Directory(dir) => {
            bundle.write_to_dir(&dir)?;
            eprintln!("Created: {} ({} files)", dir.display(), bundle.len());
        }
        Target::Txtar(path) => {
            bundle.write_txtar(&path)?;
            eprintln!("Created: {} ({} files)", path.display(), bundle.len());
        }
        Target::Stdout => print!("{}", bundle.encode()),
    }

    Ok(())
}

fn list_bundle(input: Option<PathBuf>) -> Result<()> {
    let bundle = match input {
        Some(path) if path.is_dir() => Bundle::read_dir(&path)?,
        Some(path) => Bundle::read_txtar(&path)?,
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Bundle::decode(&buffer)?
        }
    };

    for entry in bundle.entries() {
        let kind = if entry.is_binary() { "binary" } else { "text" };
        println!("{}  {}  {}", entry.path, kind, entry.as_bytes().len());
    }

    Ok(())
}

fn inspect_file(file: &Path, compact: bool) -> Result<()> {
    let content = fs::read_to_string(file)
        .with_context(|| format!("Failed to read: {}", file.display()))?;
    let document = structured::parse(&content)
        .with_context(|| format!("Failed to parse: {}", file.display()))?;
    if document.is_empty() {
        bail!("{} contains no fields", file.display());
    }
    let text = writer_for(compact).encode_to_string(&document)?;
    if compact {
        println!("{}", text);
    } else {
        print!("{}", text);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_target_is_mod_folder() {
        assert_eq!(
            select_target(None, None),
            Target::Directory(PathBuf::from("stellaris_portraits"))
        );
    }

    #[test]
    fn test_explicit_targets() {
        assert_eq!(
            select_target(None, Some(PathBuf::from("out"))),
            Target::Directory(PathBuf::from("out"))
        );
        assert_eq!(
            select_target(Some(PathBuf::from("mod.txtar")), None),
            Target::Txtar(PathBuf::from("mod.txtar"))
        );
        assert_eq!(select_target(Some(PathBuf::from("-")), None), Target::Stdout);
    }

    #[test]
    fn test_cli_parses_build() {
        let cli =
            Cli::try_parse_from(["portrait-bundle", "build", "list.json", "--compact"]).unwrap();
        match cli.command {
            Commands::Build { output, directory, compact, .. } => {
                assert!(compact);
                assert_eq!(select_target(output, directory), select_target(None, None));
            }
            other => panic!("unexpected command: {:?}", other),
        }
        let both = ["portrait-bundle", "build", "l.json", "-o", "a", "-C", "b"];
        assert!(Cli::try_parse_from(both).is_err());
    }
}
