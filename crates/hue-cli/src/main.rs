//! HueZh CLI
//!
//! Command-line tool for inspecting, upgrading and merging Hue translation files.

use clap::{Parser, Subcommand};
use hue_core::bundled::{self, BUNDLED_CSV, LANGUAGE};
use hue_core::config::default_data_dir;
use hue_core::diagnostics::split_dump;
use hue_core::logging::env_filter;
use hue_core::{
    merge_lines, ColumnMode, MergePolicy, MissingText, TranslationStore, TranslationTable,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "hue-cli")]
#[command(about = "Hue Chinese translation tool", long_about = None)]
#[command(version)]
struct Cli {
    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and summarise a translation file
    Parse {
        /// Path to translation file
        #[arg(short, long)]
        file: PathBuf,

        /// Number of entries to display
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Merge a translation into a dump of game lines
    Merge {
        /// Game line dump, one CSV row per line (e.g. Orig.csv)
        #[arg(short, long)]
        lines: PathBuf,

        /// Translation file (defaults to the bundled translation)
        #[arg(short, long)]
        translation: Option<PathBuf>,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Column mode (replace or append)
        #[arg(long, default_value = "replace")]
        mode: String,

        /// Show "?" for every untranslated line
        #[arg(long)]
        marker: bool,

        /// Language name written into the header
        #[arg(long, default_value = LANGUAGE)]
        language: String,
    },

    /// Upgrade a user translation file to the bundled version
    Upgrade {
        /// Path to translation file
        #[arg(short, long)]
        file: PathBuf,

        /// Report what would change without saving
        #[arg(long)]
        dry_run: bool,
    },

    /// Restore the bundled translation file
    Reset {
        /// Data directory (defaults to the game's documents folder)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Export a translation file
    Export {
        /// Path to translation file
        #[arg(short, long)]
        file: PathBuf,

        /// Output format (csv or json)
        #[arg(long, default_value = "csv")]
        format: String,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> hue_core::Result<()> {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    match cli.command {
        Commands::Parse { file, limit } => cmd_parse(&file, limit),
        Commands::Merge {
            lines,
            translation,
            output,
            mode,
            marker,
            language,
        } => cmd_merge(&lines, translation.as_deref(), &output, &mode, marker, &language),
        Commands::Upgrade { file, dry_run } => cmd_upgrade(&file, dry_run),
        Commands::Reset { dir } => cmd_reset(dir),
        Commands::Export {
            file,
            format,
            output,
        } => cmd_export(&file, &format, &output),
    }
}

fn setup_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(env_filter(level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn read_text(path: &Path) -> hue_core::Result<String> {
    debug!("Reading {}", path.display());
    fs::read_to_string(path).map_err(|e| hue_core::Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })
}

fn read_table(path: &Path) -> hue_core::Result<TranslationTable> {
    Ok(TranslationTable::from_csv(&read_text(path)?))
}

fn cmd_parse(file: &Path, limit: usize) -> hue_core::Result<()> {
    let table = read_table(file)?;

    println!("File: {}", file.display());
    match &table.header {
        Some(header) => println!("Header: {}", header.join(", ")),
        None => println!("Header: (none)"),
    }
    println!("Translated: {}", table.translated_count());
    println!("Keep original: {}", table.keep_original_count());
    println!();

    for (key, text) in table.translations().take(limit) {
        println!("{}\t{}", key, text);
    }
    if table.translated_count() > limit {
        println!("... ({} more entries)", table.translated_count() - limit);
    }

    Ok(())
}

fn cmd_merge(
    lines_path: &Path,
    translation: Option<&Path>,
    output: &Path,
    mode: &str,
    marker: bool,
    language: &str,
) -> hue_core::Result<()> {
    let column_mode = match mode.to_lowercase().as_str() {
        "replace" => ColumnMode::Replace,
        "append" => ColumnMode::Append,
        _ => {
            eprintln!("Unknown mode: {}. Supported modes: replace, append", mode);
            std::process::exit(1);
        }
    };
    let policy = MergePolicy {
        column_mode,
        missing_text: if marker {
            MissingText::Marker
        } else {
            MissingText::Source
        },
    };

    let table = match translation {
        Some(path) => read_table(path)?,
        None => bundled::bundled_table(),
    };
    let mut lines = split_dump(&read_text(lines_path)?);
    println!(
        "Loaded {} game lines and {} translations",
        lines.len(),
        table.translated_count()
    );

    let report = merge_lines(&mut lines, &table, language, policy)?;
    fs::write(output, lines.join("\r\n"))?;
    info!("{} lines written to {}", lines.len(), output.display());

    println!("Merge complete:");
    println!("  {} lines updated", report.updated);
    println!("  {} lines kept original", report.kept);
    println!("  {} lines untranslated", report.untranslated.len());
    for key in &report.untranslated {
        println!("  - {}", key);
    }
    println!("Written to {}", output.display());

    Ok(())
}

fn cmd_upgrade(file: &Path, dry_run: bool) -> hue_core::Result<()> {
    let mut table = read_table(file)?;
    let report = bundled::upgrader(LANGUAGE).upgrade(&mut table, &bundled::bundled_table())?;

    if !report.changed {
        println!("{} is up to date.", file.display());
    }
    for key in &report.applied {
        println!("  upgraded: {} => {}", key, table.get(key).unwrap_or_default());
    }
    for key in &report.migrated {
        println!("  now keep original: {}", key);
    }
    for key in &report.customized {
        println!("  customised, left alone: {}", key);
    }

    if report.changed && !dry_run {
        let store = TranslationStore::new(file, BUNDLED_CSV);
        if let Some(backup) = store.save(&table)? {
            println!("Previous file backed up to {}", backup.display());
        }
        println!("Saved {}", file.display());
    }

    Ok(())
}

fn cmd_reset(dir: Option<PathBuf>) -> hue_core::Result<()> {
    let dir = dir.unwrap_or_else(default_data_dir);
    let store = TranslationStore::in_dir(&dir);
    store.reset()?;

    println!("Restored {}", store.path().display());
    Ok(())
}

fn cmd_export(file: &Path, format: &str, output: &Path) -> hue_core::Result<()> {
    let table = read_table(file)?;

    let content = match format.to_lowercase().as_str() {
        "csv" => table.to_csv(),
        "json" => serde_json::to_string_pretty(&table)?,
        _ => {
            eprintln!("Unknown format: {}. Supported formats: csv, json", format);
            std::process::exit(1);
        }
    };
    fs::write(output, &content)?;
    info!("{} bytes written to {}", content.len(), output.display());

    println!(
        "Exported {} entries to {}",
        table.translated_count() + table.keep_original_count(),
        output.display()
    );

    Ok(())
}
