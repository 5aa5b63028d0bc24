//! CLI argument definitions for `setu`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use setu_cli::session::OptionOverrides;
use setu_map::CONFIG_ENV_VAR;
use setu_model::CodingSystem;
use setu_standards::ConceptSource;

#[derive(Parser)]
#[command(
    name = "setu",
    version,
    about = "Map traditional-medicine concepts onto biomedical terminologies",
    long_about = "Map concepts between NAMASTE, ICD-11 (TM2 and Biomedicine), SNOMED CT and LOINC.\n\n\
                  Concepts are loaded from FHIR CodeSystem JSON or CSV files, indexed per\n\
                  coding system and resolved to ranked candidates with a confidence score."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// List supported coding systems.
    Systems,

    /// Show the normalized form of a term.
    Normalize(NormalizeArgs),

    /// Resolve one concept against a target coding system.
    Resolve(ResolveArgs),

    /// Resolve every request of a CSV file.
    Batch(BatchArgs),

    /// Find the concepts of one coding system closest to free text.
    Search(SearchArgs),

    /// Show one concept by code.
    Lookup(LookupArgs),
}

#[derive(Args)]
pub struct NormalizeArgs {
    /// Term to normalize.
    #[arg(value_name = "TEXT")]
    pub text: String,

    /// Language tag of the term (e.g. en, sa, hi, sa-Latn).
    #[arg(long = "lang", value_name = "TAG")]
    pub lang: Option<String>,

    /// Configuration file with extra `[normalizer.variants]`.
    #[arg(long = "config", value_name = "PATH", env = CONFIG_ENV_VAR)]
    pub config: Option<PathBuf>,
}

/// Inputs shared by commands that resolve concepts.
#[derive(Args)]
pub struct StoreArgs {
    /// Concept file as SYSTEM=PATH (CSV or CodeSystem JSON); a bare PATH must be CodeSystem JSON.
    #[arg(long = "concepts", value_name = "SYSTEM=PATH", required = true)]
    pub concepts: Vec<ConceptSource>,

    /// Configuration file (TOML).
    #[arg(long = "config", value_name = "PATH", env = CONFIG_ENV_VAR)]
    pub config: Option<PathBuf>,

    /// Candidates retrieved per source term and kept in the result.
    #[arg(long = "k", value_name = "N")]
    pub k: Option<usize>,

    /// Confidence at or above which a result is MATCHED.
    #[arg(long = "threshold", value_name = "0..1")]
    pub threshold: Option<f32>,

    /// Bonus for an exact normalized term match.
    #[arg(long = "lexical-bonus", value_name = "0..1")]
    pub lexical_bonus: Option<f32>,

    /// Similarity below which retrieved concepts are discarded.
    #[arg(long = "min-similarity", value_name = "0..1")]
    pub min_similarity: Option<f32>,
}

impl StoreArgs {
    pub fn overrides(&self) -> OptionOverrides {
        OptionOverrides {
            k: self.k,
            threshold: self.threshold,
            lexical_bonus: self.lexical_bonus,
            min_similarity: self.min_similarity,
        }
    }
}

#[derive(Args)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Source coding system.
    #[arg(long = "source", value_name = "SYSTEM")]
    pub source: String,

    /// Source concept code.
    #[arg(long = "code", value_name = "CODE")]
    pub code: String,

    /// Target coding system.
    #[arg(long = "target", value_name = "SYSTEM")]
    pub target: String,

    /// Print the result as JSON.
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Args)]
pub struct BatchArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// CSV with source_system, source_code and target_system columns.
    #[arg(long = "input", value_name = "PATH")]
    pub input: PathBuf,

    /// Write the report to a file (CSV, or JSON with --json).
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Dedicated worker threads (default: config, else all cores).
    #[arg(long = "workers", value_name = "N")]
    pub workers: Option<usize>,

    /// Emit the report as JSON.
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Args)]
pub struct SearchArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Coding system to search.
    #[arg(long = "system", value_name = "SYSTEM")]
    pub system: CodingSystem,

    /// Free text in any supported script.
    #[arg(value_name = "TEXT")]
    pub text: String,

    /// Print the hits as JSON.
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Args)]
pub struct LookupArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Coding system of the concept.
    #[arg(long = "system", value_name = "SYSTEM")]
    pub system: CodingSystem,

    /// Concept code.
    #[arg(long = "code", value_name = "CODE")]
    pub code: String,

    /// Print the concept as JSON.
    #[arg(long = "json")]
    pub json: bool,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
