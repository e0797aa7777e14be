//! filesift - Rule-based file classification.
//!
//! Usage:
//!   filesift sets                 List interesting file sets
//!   filesift sets --filters       List ingest filters
//!   filesift show NAME            Print one set as JSON
//!   filesift classify [PATH]      Classify a directory tree
//!   filesift --help               Show help

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, bail, eyre};
use itertools::Itertools;
use tracing_subscriber::EnvFilter;

use filesift_core::FilesSet;
use filesift_ingest::{ClassificationReport, ClassifyConfig, DirectoryClassifier, NoProgress};
use filesift_store::{FilesSetsManager, StoreConfig};

#[derive(Parser)]
#[command(
    name = "filesift",
    version,
    about = "Rule-based file classification",
    long_about = "filesift classifies files and directories with user-defined \
                  filter sets.\n\n\
                  Interesting file sets flag entries worth a closer look; ingest \
                  filters decide which entries are processed at all."
)]
struct Cli {
    /// Directory holding the definition files
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List stored filter sets
    Sets {
        /// List ingest filters instead of interesting file sets
        #[arg(long)]
        filters: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Print one filter set as JSON
    Show {
        /// Set name
        name: String,

        /// Look the name up among ingest filters
        #[arg(long)]
        filters: bool,
    },

    /// Classify every entry below a directory
    Classify {
        /// Directory to classify
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Use one interesting file set (default: all of them)
        #[arg(long, conflicts_with = "filter")]
        set: Option<String>,

        /// Use an ingest filter
        #[arg(long)]
        filter: Option<String>,

        /// Include hidden files
        #[arg(long)]
        hidden: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = Cli::parse();

    if let Some(dir) = cli.config_dir {
        FilesSetsManager::init_instance(StoreConfig::in_dir(dir));
    }
    let manager = FilesSetsManager::instance();

    match cli.command {
        Command::Sets { filters, format } => run_sets(manager, filters, format)?,
        Command::Show { name, filters } => run_show(manager, &name, filters)?,
        Command::Classify {
            path,
            set,
            filter,
            hidden,
            format,
        } => {
            let sets = select_sets(manager, set.as_deref(), filter.as_deref())?;
            run_classify(&path, &sets, hidden, format)?;
        }
    }

    Ok(())
}

/// Log to stderr, filtered by `RUST_LOG` (default `warn`).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// List stored sets.
fn run_sets(manager: &FilesSetsManager, filters: bool, format: OutputFormat) -> Result<()> {
    let sets: Vec<FilesSet> = if filters {
        manager.ingest_filter_choices()?
    } else {
        manager.interesting_files_sets()?.into_values().collect()
    };

    match format {
        OutputFormat::Text => {
            let title = if filters {
                "Ingest Filters"
            } else {
                "Interesting File Sets"
            };
            println!();
            println!("{}", "─".repeat(60));
            println!(" {title} ({})", sets.len());
            println!("{}", "─".repeat(60));

            for set in &sets {
                println!();
                println!(" {}", set.name());
                if !set.description().is_empty() && set.description() != set.name() {
                    println!("   {}", set.description());
                }
                println!(
                    "   rules: {}",
                    set.rules().map(|rule| rule.name()).join(", ")
                );
                println!(
                    "   ignores known files: {}, includes unallocated space: {}",
                    set.ignores_known_files(),
                    set.includes_unallocated_space()
                );
            }
            println!();
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&sets)?);
        }
    }

    Ok(())
}

/// Print one set as JSON.
fn run_show(manager: &FilesSetsManager, name: &str, filters: bool) -> Result<()> {
    let set = if filters {
        manager.ingest_filter(name)?
    } else {
        manager.interesting_files_sets()?.shift_remove(name)
    }
    .ok_or_else(|| eyre!("No filter set named '{name}'"))?;

    println!("{}", serde_json::to_string_pretty(&set)?);
    Ok(())
}

/// Pick the sets a classification run uses.
///
/// A missing ingest filter falls back to the default filter.
fn select_sets(
    manager: &FilesSetsManager,
    set: Option<&str>,
    filter: Option<&str>,
) -> Result<Vec<FilesSet>> {
    if let Some(name) = filter {
        return Ok(match manager.ingest_filter(name)? {
            Some(filter) => vec![filter],
            None => {
                let default = FilesSetsManager::default_filter();
                tracing::warn!(
                    requested = name,
                    using = default.name(),
                    "ingest filter not found, using the default filter"
                );
                vec![default]
            }
        });
    }

    let mut interesting = manager.interesting_files_sets()?;
    match set {
        Some(name) => interesting
            .shift_remove(name)
            .map(|set| vec![set])
            .ok_or_else(|| eyre!("No interesting file set named '{name}'")),
        None if interesting.is_empty() => {
            bail!("No interesting file sets defined; use --filter to classify with an ingest filter")
        }
        None => Ok(interesting.into_values().collect()),
    }
}

/// Classify a directory with each set in turn.
fn run_classify(path: &Path, sets: &[FilesSet], hidden: bool, format: OutputFormat) -> Result<()> {
    let config = ClassifyConfig::builder()
        .root(path)
        .include_hidden(hidden)
        .build()
        .map_err(|e| eyre!(e))?;
    let classifier = DirectoryClassifier::new(config);

    let mut reports = Vec::with_capacity(sets.len());
    for set in sets {
        eprintln!("Classifying {} with '{}'...", path.display(), set.name());
        let report = classifier
            .classify(set, &NoProgress)
            .with_context(|| format!("Classification with '{}' failed", set.name()))?;
        reports.push(report);
    }

    match format {
        OutputFormat::Text => {
            for report in &reports {
                print_report(report);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
    }

    Ok(())
}

fn print_report(report: &ClassificationReport) {
    let matched_size: u64 = report.matches.iter().filter_map(|m| m.size).sum();

    println!();
    println!("{}", "─".repeat(70));
    println!(" {} - set '{}'", report.root.display(), report.set);
    println!(
        " {} of {} entries matched ({} in matched files)",
        report.matches.len(),
        report.entries_examined,
        format_size(matched_size)
    );
    println!(" Classified in {:.2}s", report.duration.as_secs_f64());
    println!("{}", "─".repeat(70));
    println!();

    for (rule, group) in &report
        .matches
        .iter()
        .sorted_by(|a, b| a.rule.cmp(&b.rule))
        .chunk_by(|m| m.rule.as_str())
    {
        println!(" {rule}:");
        for classification in group {
            let relative = classification
                .path
                .strip_prefix(&report.root)
                .unwrap_or(&classification.path);
            println!("   {}", relative.display());
        }
        println!();
    }

    if !report.warnings.is_empty() {
        println!("{} warning(s) during classification", report.warnings.len());
    }
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}
