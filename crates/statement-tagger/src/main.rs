//! statement-tagger: stamp sequential reference tags on bank statement PDFs.
//!
//! `statement-tagger --bank bbva --prefix BBVA_OCT october.pdf november.pdf`

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};

use tagger_core::Bank;
use tagger_engine::TagOptions;

#[derive(Parser)]
#[command(
    name = "statement-tagger",
    version,
    about = "Tag transactions in bank statement PDFs"
)]
struct Cli {
    /// Statement PDFs to process
    files: Vec<PathBuf>,

    /// Bank layout: bbva, banamex, santander, hsbc, monex, db
    #[arg(short, long)]
    bank: Option<String>,

    /// Tag prefix, e.g. BMX_USD produces BMX_USD_1, BMX_USD_2, ...
    #[arg(short, long)]
    prefix: Option<String>,

    /// Draw blue position markers next to every tag
    #[arg(long)]
    debug_markers: bool,

    /// Keep the intermediate _OCR.pdf files
    #[arg(long)]
    keep_ocr: bool,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Dump effective merged config as TOML and exit
    #[arg(long)]
    dump_config: bool,
}

/// Options that may come from config files as well as the CLI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct RunConfig {
    bank: Option<String>,
    prefix: Option<String>,
    debug_markers: bool,
    keep_ocr: bool,
    verbose: u8,
}

/// Load config from global and project-local TOML files.
/// Later files override earlier ones. Missing files are silently ignored.
fn load_config() -> RunConfig {
    let mut config = RunConfig::default();

    // 1. Global config: ~/.config/statement-tagger/config.toml
    if let Some(config_dir) = dirs::config_dir() {
        let global_path = config_dir.join("statement-tagger").join("config.toml");
        if let Ok(contents) = std::fs::read_to_string(&global_path) {
            match toml::from_str::<RunConfig>(&contents) {
                Ok(parsed) => config = parsed,
                Err(e) => {
                    log::warn!("Failed to parse {}: {}", global_path.display(), e);
                }
            }
        }
    }

    // 2. Project-local config: ./.statement-tagger.toml
    // serde(default) fills missing fields, so the local file fully
    // overrides the global one rather than merging field by field.
    let local_path = PathBuf::from(".statement-tagger.toml");
    if let Ok(contents) = std::fs::read_to_string(&local_path) {
        match toml::from_str::<RunConfig>(&contents) {
            Ok(parsed) => config = parsed,
            Err(e) => {
                log::warn!("Failed to parse {}: {}", local_path.display(), e);
            }
        }
    }

    config
}

/// Apply CLI flags on top of config-loaded options.
/// Only overrides when the flag was explicitly provided.
fn apply_cli_overrides(config: &mut RunConfig, cli: &Cli) {
    let matches = Cli::command().get_matches_from(std::env::args_os());

    if cli.bank.is_some() {
        config.bank = cli.bank.clone();
    }
    if cli.prefix.is_some() {
        config.prefix = cli.prefix.clone();
    }
    if cli.debug_markers {
        config.debug_markers = true;
    }
    if cli.keep_ocr {
        config.keep_ocr = true;
    }
    if matches.value_source("verbose") == Some(clap::parser::ValueSource::CommandLine) {
        config.verbose = cli.verbose;
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = load_config();
    apply_cli_overrides(&mut config, &cli);

    if cli.dump_config {
        match toml::to_string_pretty(&config) {
            Ok(s) => {
                println!("{}", s);
                process::exit(0);
            }
            Err(e) => {
                eprintln!("Error serializing config: {}", e);
                process::exit(1);
            }
        }
    }

    if let Err(e) = run(&cli.files, &config) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run(files: &[PathBuf], config: &RunConfig) -> Result<()> {
    let bank: Bank = config
        .bank
        .as_deref()
        .context("No bank specified. Use --bank or set it in the config file.")?
        .parse()?;

    let prefix = config
        .prefix
        .clone()
        .unwrap_or_else(|| bank.as_str().to_uppercase());

    let targets: Vec<&PathBuf> = files.iter().filter(|f| !is_derived_file(f)).collect();
    if targets.is_empty() {
        anyhow::bail!("No statement PDFs to process.");
    }

    let options = TagOptions {
        debug_markers: config.debug_markers,
        keep_ocr: config.keep_ocr,
    };

    let mut tagged = 0usize;
    for path in &targets {
        log::info!("Processing {} ({})", path.display(), bank);
        match tagger_engine::process_file(path, bank, &prefix, &options) {
            Ok(report) => {
                if report.ocr_applied {
                    log::info!("  (OCR rendition was used)");
                }
                log::info!(
                    "  {} transactions -> {}",
                    report.tag_count,
                    report.output.display()
                );
                tagged += 1;
            }
            Err(e) => {
                eprintln!("Error processing {}: {:#}", path.display(), e);
            }
        }
    }

    log::info!("{} of {} files tagged", tagged, targets.len());
    if tagged == 0 {
        anyhow::bail!("All files failed.");
    }
    Ok(())
}

/// Outputs of previous runs must never be re-tagged.
fn is_derived_file(path: &std::path::Path) -> bool {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let skip = name.contains("_TAGGED") || name.contains("_OCR");
    if skip {
        log::info!("Skipping {} (already a tagger artifact)", name);
    }
    skip
}
