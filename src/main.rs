//! CLI entry point for the ikfetch tool.

use std::fs::{self, File};
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, bail};
use clap::Parser;
use ikfetch_core::config::resolve_default_config_path;
use ikfetch_core::{
    DocLimits, DownloadOutcome, FailureReason, FetchContext, FetchSettings, FileConfig,
    HttpTransport, Query, QueryOptions, SearchOptions, load_default_file_config,
};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

mod cli;

use cli::Args;

/// Log level used when neither the CLI nor the config file sets one.
const DEFAULT_LOG_LEVEL: &str = "info";

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    let file_config = load_default_file_config()?.unwrap_or_default();

    // Priority: RUST_LOG env var > --loglevel > config log_level > info
    let level = args
        .loglevel
        .as_deref()
        .or(file_config.log_level.as_deref())
        .unwrap_or(DEFAULT_LOG_LEVEL);
    init_tracing(level, args.logfile.as_deref())?;

    debug!(?args, "CLI arguments parsed");

    let settings = resolve_settings(&args, file_config)?;
    fs::create_dir_all(&settings.data_dir).with_context(|| {
        format!("Failed to create data directory '{}'", settings.data_dir.display())
    })?;

    let transport = HttpTransport::new(&settings.token).context("Failed to build HTTP client")?;
    let ctx = FetchContext::new(&settings, Arc::new(transport));

    run(&args, &settings, &ctx).await?;

    let stats = ctx.downloader().stats();
    info!(
        downloaded = stats.downloaded(),
        already_present = stats.already_present(),
        failed = stats.failed(),
        originals = stats.originals(),
        "ikfetch finished"
    );
    Ok(())
}

fn init_tracing(level: &str, logfile: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(level)));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match logfile {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to open log file '{}'", path.display()))?;
            builder.with_writer(Mutex::new(file)).with_ansi(false).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

/// Maps a `--loglevel` label to an `EnvFilter` directive.
fn filter_directive(level: &str) -> &str {
    match level {
        "warning" => "warn",
        other => other,
    }
}

/// Merges CLI values over the config file into run settings.
fn resolve_settings(args: &Args, file_config: FileConfig) -> Result<FetchSettings> {
    let config_hint = resolve_default_config_path()
        .map_or_else(|| "the config file".to_string(), |p| p.display().to_string());

    let Some(token) = args.token.clone().or(file_config.token) else {
        bail!("No API token: pass -s/--sharedtoken or set `token` in {config_hint}");
    };
    let Some(data_dir) = args.datadir.clone().or(file_config.data_dir) else {
        bail!("No data directory: pass -D/--datadir or set `data_dir` in {config_hint}");
    };

    let workers = match args.workers {
        Some(workers) => usize::try_from(workers).context("worker count out of range")?,
        None => file_config.workers.unwrap_or(5),
    };

    let mut settings = FetchSettings::new(token, data_dir);
    settings.query_options = QueryOptions {
        from_date: args.fromdate.clone(),
        to_date: args.todate.clone(),
        added_today: args.addedtoday,
        sort_by: args.sortby.clone(),
    };
    settings.search = SearchOptions {
        max_pages: args.maxpages.or(file_config.max_pages).unwrap_or(1),
        path_by_source: args.pathbysrc,
        csv_output: !args.no_csv,
        count_only: args.count,
        page_limit: args.pagelimit,
    };
    settings.limits = DocLimits {
        max_cites: args.maxcites,
        max_cited_by: args.maxcitedby,
    };
    settings.want_original = args.original;
    settings.workers = workers;
    settings.follow_links = args.level;
    Ok(settings)
}

/// Runs the single mode selected by the arguments.
///
/// Only setup problems (an unreadable query file) fail; API and download
/// failures are logged by the components and never change the exit status.
async fn run(args: &Args, settings: &FetchSettings, ctx: &FetchContext) -> Result<()> {
    let options = ctx.query_options();

    if let Some(doc_id) = args.docid
        && let Some(query) = args.query.as_deref()
    {
        warn!(doc_id, query, "Docfragment");
        let outcome = ctx.downloader().save_fragment(doc_id, query).await;
        if let Some(reason) = outcome_failure(&outcome) {
            error!(doc_id, reason = %reason, "fragment not saved");
        }
    } else if let Some(doc_id) = args.docid {
        let outcome = ctx.downloader().download(doc_id, &settings.data_dir).await;
        info!(doc_id, outcome = ?outcome, "document processed");
    } else if let Some(raw) = args.query.as_deref() {
        let query = options.build(raw);
        warn!(query = %query, "Search");
        ctx.paginator().run(&query).await;
    } else if let Some(doctype) = args.doctype.as_deref() {
        let query = options.doctype(doctype);
        ctx.paginator().run(&query).await;
    } else if let Some(qfile) = args.qfile.as_deref() {
        let queries = read_query_file(qfile, options)?;
        info!(queries = queries.len(), workers = settings.workers, "Processing query file");

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, stopping workers");
                let _ = shutdown_tx.send(true);
            }
        });

        let report = ctx.worker_pool(Some(shutdown_rx)).execute_all(queries).await;
        for (query, doc_ids) in &report.results {
            info!("{} document(s) for query: {}", doc_ids.len(), query);
        }
        for reason in &report.interruptions {
            warn!(reason = %reason, "query processing stopped early");
        }
    } else if !args.citedby.is_empty() {
        let expander = ctx.citation_expander();
        for &seed in &args.citedby {
            let report = expander.expand_one_level(seed).await;
            if expander.follow_links() {
                info!("Total documents cited by docid {} with level: {}", seed, report.doc_ids.len());
            } else {
                info!("Total documents cited by docid {}: {}", seed, report.doc_ids.len());
            }
        }
    } else {
        info!("Nothing to do: pass one of -q, -d, -c, -Q or -C (see --help)");
    }
    Ok(())
}

fn outcome_failure(outcome: &DownloadOutcome) -> Option<&FailureReason> {
    match outcome {
        DownloadOutcome::Failed(reason) => Some(reason),
        _ => None,
    }
}

/// Reads one query per line, skipping blank lines, and applies the filters.
fn read_query_file(path: &Path, options: &QueryOptions) -> Result<Vec<Query>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read query file '{}'", path.display()))?;
    Ok(parse_query_lines(&raw, options))
}

fn parse_query_lines(raw: &str, options: &QueryOptions) -> Vec<Query> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| options.build(line))
        .collect()
}
