#![forbid(unsafe_code)]

//! kinfold CLI - convert GEDCOM family trees to JSON.
//!
//! # Commands
//!
//! - `convert`: Write people, relationships, sources and the id table as JSON files
//! - `stats`: Report record and relationship counts without writing anything
//! - `find`: Look up the new ids of people by name
//! - `date`: Show how raw GEDCOM dates are normalized

use std::fmt::Write as _;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kf_core::{ConversionStats, ConvertConfig, Person, Relationship};
use kf_graph::{Conversion, NameQuery, convert_with_config};
use kf_parser::DateNormalizer;
use serde::Serialize;
use tracing::{debug, info, warn};

/// kinfold CLI - convert GEDCOM family trees to JSON.
#[derive(Debug, Parser)]
#[command(
    name = "kinfold",
    version,
    about = "kinfold - convert GEDCOM family trees to JSON",
    long_about = "Reads a GEDCOM export, extracts people and families, derives spouse and\n\
        parent-child relationships, and renumbers everyone with stable sequential ids."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging (can be repeated for more detail: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Convert a GEDCOM file into JSON data files.
    Convert {
        /// Input GEDCOM file, or "-" for stdin.
        input: String,

        /// Directory the JSON files are written to (created if missing)
        #[arg(short, long, default_value = "data")]
        output: PathBuf,

        /// TOML file with conversion settings
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,

        /// Write compact JSON instead of pretty-printed files
        #[arg(long)]
        compact: bool,
    },

    /// Show record and relationship counts for a GEDCOM file.
    Stats {
        /// Input GEDCOM file, or "-" for stdin.
        input: String,

        /// TOML file with conversion settings
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Find people by name and print their new ids.
    Find {
        /// Input GEDCOM file, or "-" for stdin.
        input: String,

        /// First name to match exactly
        #[arg(long)]
        first: Option<String>,

        /// Middle name(s) to match exactly
        #[arg(long)]
        middle: Option<String>,

        /// Last name to match exactly
        #[arg(long)]
        last: Option<String>,

        /// TOML file with conversion settings
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Normalize raw GEDCOM date values.
    Date {
        /// Raw date strings, e.g. "ABT 1850" or "15 Mar 1892"
        #[arg(required = true)]
        raw: Vec<String>,

        /// Two-digit years at or above this value land in the 1900s
        #[arg(long, default_value_t = 69)]
        pivot: u8,
    },
}

/// Summary printed after `convert`.
#[derive(Debug, Serialize)]
struct ConvertResult {
    input: String,
    output_dir: String,
    files: Vec<String>,
    stats: ConversionStats,
    warnings: Vec<String>,
    total_time_ms: f64,
}

#[derive(Debug, Serialize)]
struct PeopleFile<'a> {
    people: &'a [Person],
}

#[derive(Debug, Serialize)]
struct RelationshipsFile<'a> {
    relationships: &'a [Relationship],
}

#[derive(Debug, Serialize)]
struct SourcesFile<'a> {
    sources: &'a [serde_json::Value],
}

const PEOPLE_FILE: &str = "people.json";
const RELATIONSHIPS_FILE: &str = "relationships.json";
const SOURCES_FILE: &str = "sources.json";
const ID_MAPPING_FILE: &str = "id_mapping.json";

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Command::Convert {
            input,
            output,
            config,
            json,
            compact,
        } => cmd_convert(&input, &output, config.as_deref(), json, compact, cli.quiet),

        Command::Stats {
            input,
            config,
            json,
        } => cmd_stats(&input, config.as_deref(), json),

        Command::Find {
            input,
            first,
            middle,
            last,
            config,
        } => cmd_find(
            &input,
            NameQuery {
                first,
                middle,
                last,
            },
            config.as_deref(),
        ),

        Command::Date { raw, pivot } => cmd_date(&raw, pivot),
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .try_init();
}

fn load_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        Ok(buffer)
    } else {
        std::fs::read_to_string(input).context(format!("Failed to read GEDCOM file: {input}"))
    }
}

fn load_config(path: Option<&Path>) -> Result<ConvertConfig> {
    let Some(path) = path else {
        return Ok(ConvertConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .context(format!("Failed to read config file: {}", path.display()))?;
    let config: ConvertConfig = toml::from_str(&text)
        .context(format!("Failed to parse config file: {}", path.display()))?;
    config
        .validate()
        .context(format!("Invalid config file: {}", path.display()))?;
    debug!(?config, "loaded conversion config");
    Ok(config)
}

fn run_conversion(input: &str, config: Option<&Path>) -> Result<Conversion> {
    let config = load_config(config)?;
    let source = load_input(input)?;
    let conversion = convert_with_config(&source, &config)?;

    for warning in &conversion.warnings {
        info!(code = warning.code.as_str(), line = ?warning.line, "{}", warning.message);
    }
    Ok(conversion)
}

fn to_json<T: Serialize>(value: &T, compact: bool) -> Result<String> {
    let mut text = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    text.push('\n');
    Ok(text)
}

// =============================================================================
// Command: convert
// =============================================================================

fn cmd_convert(
    input: &str,
    output: &Path,
    config: Option<&Path>,
    json_output: bool,
    compact: bool,
    quiet: bool,
) -> Result<()> {
    let start = Instant::now();
    let conversion = run_conversion(input, config)?;
    let files = write_conversion(&conversion, output, compact)?;
    let total_time = start.elapsed();

    if json_output {
        let result = ConvertResult {
            input: input.to_string(),
            output_dir: output.display().to_string(),
            files: files.iter().map(|path| path.display().to_string()).collect(),
            stats: conversion.stats,
            warnings: conversion
                .warnings
                .iter()
                .map(|warning| format!("{}: {}", warning.code.as_str(), warning.message))
                .collect(),
            total_time_ms: total_time.as_secs_f64() * 1000.0,
        };
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if !quiet {
        println!("Converted: {input}");
        for path in &files {
            println!("  wrote {}", path.display());
        }
        println!();
        print!("{}", format_stats(&conversion.stats));
    }

    info!(
        "Converted {} people and {} relationships in {:.2}ms",
        conversion.people.len(),
        conversion.relationships.len(),
        total_time.as_secs_f64() * 1000.0
    );

    Ok(())
}

/// Write the four data files into `dir`, creating it first. Returns the paths written.
fn write_conversion(conversion: &Conversion, dir: &Path, compact: bool) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .context(format!("Failed to create output directory: {}", dir.display()))?;

    let documents = [
        (
            PEOPLE_FILE,
            to_json(
                &PeopleFile {
                    people: &conversion.people,
                },
                compact,
            )?,
        ),
        (
            RELATIONSHIPS_FILE,
            to_json(
                &RelationshipsFile {
                    relationships: &conversion.relationships,
                },
                compact,
            )?,
        ),
        (
            SOURCES_FILE,
            to_json(
                &SourcesFile {
                    sources: &conversion.sources,
                },
                compact,
            )?,
        ),
        (ID_MAPPING_FILE, to_json(&conversion.id_mapping, compact)?),
    ];

    let mut written = Vec::with_capacity(documents.len());
    for (name, content) in documents {
        let path = dir.join(name);
        std::fs::write(&path, content)
            .context(format!("Failed to write to: {}", path.display()))?;
        debug!("Wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

fn format_stats(stats: &ConversionStats) -> String {
    let rows = [
        ("Individuals", stats.individual_records.to_string()),
        ("Families", stats.family_records.to_string()),
        ("Sources", stats.source_records.to_string()),
        ("People", stats.people.to_string()),
        ("Relationships", stats.relationships.to_string()),
        ("  spouse", stats.spouse_relationships.to_string()),
        ("  parent-child", stats.parent_child_relationships.to_string()),
        (
            "Gender",
            format!(
                "{} male, {} female, {} unknown",
                stats.males, stats.females, stats.unknown_gender
            ),
        ),
        ("Warnings", stats.warnings.to_string()),
    ];

    let mut text = String::new();
    for (label, value) in rows {
        let label = format!("{label}:");
        let _ = writeln!(text, "{label:<16}{value}");
    }
    text
}

// =============================================================================
// Command: stats
// =============================================================================

fn cmd_stats(input: &str, config: Option<&Path>, json_output: bool) -> Result<()> {
    let conversion = run_conversion(input, config)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&conversion.stats)?);
    } else {
        print!("{}", format_stats(&conversion.stats));
    }
    Ok(())
}

// =============================================================================
// Command: find
// =============================================================================

fn cmd_find(input: &str, query: NameQuery, config: Option<&Path>) -> Result<()> {
    if query.is_empty() {
        anyhow::bail!("Give at least one of --first, --middle or --last");
    }

    let conversion = run_conversion(input, config)?;
    let matches: Vec<&Person> = conversion.find(&query).collect();
    if matches.is_empty() {
        warn!("No person matched {query:?}");
    }

    for person in matches {
        let source = conversion
            .id_mapping
            .source_id(&person.id)
            .unwrap_or("?");
        println!("{}\t{}\t{}", person.id, source, person.display_name());
    }
    Ok(())
}

// =============================================================================
// Command: date
// =============================================================================

fn cmd_date(raw: &[String], pivot: u8) -> Result<()> {
    let config = ConvertConfig {
        two_digit_year_pivot: pivot,
        ..ConvertConfig::default()
    };
    config.validate().context("Invalid --pivot")?;
    let normalizer = DateNormalizer::from_config(&config);

    for value in raw {
        match normalizer.normalize(value) {
            Some(normalized) => println!("{value}\t{normalized}"),
            None => println!("{value}\t(none)"),
        }
    }
    Ok(())
}
