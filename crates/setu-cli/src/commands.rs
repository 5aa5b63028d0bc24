use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::time::Instant;

use anyhow::{Context, Result};
use comfy_table::Table;
use serde::Serialize;
use setu_cli::batch_io::{read_requests, write_report_csv, write_report_json};
use setu_cli::session::Session;
use setu_map::{BatchReport, BatchRequest, CancellationToken, SetuConfig};
use setu_model::{CodingSystem, Concept, MappingResult, SearchHit};
use setu_normalization::LanguageHint;
use tracing::{info, info_span};

use crate::cli::{BatchArgs, LookupArgs, NormalizeArgs, ResolveArgs, SearchArgs, StoreArgs};
use crate::summary::apply_table_style;

pub struct BatchRun {
    pub requests: Vec<BatchRequest>,
    pub report: BatchReport,
}

pub fn run_systems() -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["System", "Name", "URI"]);
    apply_table_style(&mut table);
    for system in CodingSystem::ALL {
        table.add_row(vec![system.as_str(), system.label(), system.uri()]);
    }
    println!("{table}");
    Ok(())
}

pub fn run_normalize(args: &NormalizeArgs) -> Result<()> {
    let config = SetuConfig::load_or_default(args.config.as_deref()).context("load config")?;
    let normalizer = config.normalizer();
    let hint = args
        .lang
        .as_deref()
        .map(LanguageHint::from_tag)
        .unwrap_or_default();
    println!("{}", normalizer.normalize(&args.text, hint));
    Ok(())
}

pub fn run_resolve(args: &ResolveArgs) -> Result<MappingResult> {
    let session = open_session(&args.store)?;
    let result = session
        .resolver()
        .resolve_raw(&args.source, &args.code, &args.target, session.options())
        .with_context(|| format!("resolve {} {} -> {}", args.source, args.code, args.target))?;
    if args.json {
        print_json(&result)?;
    }
    Ok(result)
}

pub fn run_search(args: &SearchArgs) -> Result<Vec<SearchHit>> {
    let session = open_session(&args.store)?;
    let hits = session
        .resolver()
        .search(args.system, &args.text, session.options().k)
        .with_context(|| format!("search {} for {:?}", args.system, args.text))?;
    if args.json {
        print_json(&hits)?;
    }
    Ok(hits)
}

pub fn run_lookup(args: &LookupArgs) -> Result<Concept> {
    let session = open_session(&args.store)?;
    let concept = session
        .resolver()
        .lookup(args.system, &args.code)
        .with_context(|| format!("lookup {} {}", args.system, args.code))?;
    if args.json {
        print_json(&concept)?;
    }
    Ok(concept)
}

pub fn run_batch(args: &BatchArgs) -> Result<BatchRun> {
    let requests = read_requests(&args.input)?;
    let session = open_session(&args.store)?;
    let orchestrator = session.orchestrator(args.workers)?;

    let span = info_span!("batch", input = %args.input.display());
    let _enter = span.enter();
    let started = Instant::now();
    let report = orchestrator.resolve_batch(&requests, session.options(), &CancellationToken::new());
    info!(
        requests = requests.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "batch finished"
    );

    match &args.output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
            let writer = BufWriter::new(file);
            if args.json {
                write_report_json(writer, &requests, &report)?;
            } else {
                write_report_csv(writer, &requests, &report)?;
            }
            info!(path = %path.display(), "report written");
        }
        None if args.json => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            write_report_json(&mut out, &requests, &report)?;
            writeln!(out)?;
        }
        None => {}
    }

    Ok(BatchRun { requests, report })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value).context("write JSON")?;
    writeln!(out)?;
    Ok(())
}

fn open_session(store: &StoreArgs) -> Result<Session> {
    let config = SetuConfig::load_or_default(store.config.as_deref()).context("load config")?;
    Session::open(config, &store.overrides(), &store.concepts)
}
