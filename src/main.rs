use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures::TryStreamExt;

use rangeprobe::classify::{FilterMode, classify};
use rangeprobe::config::{AppConfig, load_config};
use rangeprobe::http_probe::prelude::*;
use rangeprobe::logging;
use rangeprobe::ndjson::{self, NdjsonSink, RecordStream};
use rangeprobe::pool::probe_all;
use rangeprobe::report::{Summary, render_table};
use rangeprobe::seed;

#[derive(Debug, Parser)]
#[command(name = "rangeprobe")]
#[command(about = "Probe HTTP range request handling under different Accept-Encoding headers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Probe every seed URL and write one NDJSON record per URL.
    Probe {
        /// Seed list, one {"url": ...} object per line. Overrides the config file.
        #[arg(long)]
        input: Option<PathBuf>,
        /// Output NDJSON file. Overrides the config file.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Number of URLs probed at the same time.
        #[arg(long, value_name = "K")]
        concurrency: Option<usize>,
        /// Per-request timeout in seconds.
        #[arg(long, value_name = "SECONDS")]
        timeout_seconds: Option<u64>,
    },

    /// Classify a probe result set and print the matching records.
    Report {
        /// NDJSON results file. Defaults to the configured output file.
        #[arg(long, conflicts_with = "url")]
        input: Option<PathBuf>,
        /// Read the results from an HTTP URL instead of a file.
        #[arg(long)]
        url: Option<String>,
        /// none, diff, enc-no-206, no-enc-no-206, chrome-vs-safari or unexpected-encoding.
        #[arg(long, default_value = "diff")]
        filter: FilterMode,
        /// Print at most N rows. The summary still counts every match.
        #[arg(long, value_name = "N")]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() {
    logging::init_logging();

    if let Err(err) = run(Cli::parse()).await {
        eprintln!("rangeprobe error: {:#}", err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Probe {
            input,
            output,
            concurrency,
            timeout_seconds,
        } => {
            let mut app_config = load_config()?;
            let config = &mut app_config.config;
            if let Some(input) = input {
                config.input = input;
            }
            if let Some(output) = output {
                config.output = output;
            }
            if let Some(concurrency) = concurrency {
                config.concurrency = concurrency;
            }
            if let Some(timeout_seconds) = timeout_seconds {
                config.timeout_seconds = timeout_seconds;
            }
            run_probe(&app_config).await
        }
        Command::Report {
            input,
            url,
            filter,
            limit,
        } => {
            let records = match url {
                Some(url) => {
                    let response = reqwest::get(&url)
                        .await
                        .and_then(|r| r.error_for_status())
                        .with_context(|| format!("failed to fetch {url}"))?;
                    ndjson::from_response(response)
                }
                None => {
                    let path = match input {
                        Some(path) => path,
                        None => load_config()?.config.output,
                    };
                    let file = tokio::fs::File::open(&path)
                        .await
                        .with_context(|| format!("failed to open {}", path.display()))?;
                    ndjson::from_reader(file)
                }
            };
            run_report(records, filter, limit).await
        }
    }
}

async fn run_probe(app_config: &AppConfig) -> Result<()> {
    let config = &app_config.config;
    let urls = seed::load_seed_urls(&config.input)
        .await
        .with_context(|| format!("failed to load seed list {}", config.input.display()))?;

    let client = build_client(
        &config.user_agent,
        Duration::from_secs(config.timeout_seconds),
    )
    .context("failed to create HTTP client")?;

    if let Some(parent) = config.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let file = tokio::fs::File::create(&config.output)
        .await
        .with_context(|| format!("failed to create {}", config.output.display()))?;

    let (sink, writer) = NdjsonSink::spawn(tokio::io::BufWriter::new(file));
    let probed = probe_all(Prober::new(client), urls, config.concurrency, sink).await;

    // A write failure is the root cause of any sink error the pool saw.
    let summary = writer.await.context("NDJSON writer task failed")??;
    let probed = probed?;

    log::info!(
        "Wrote {} records for {probed} URLs to {} (config: {})",
        summary.lines,
        config.output.display(),
        app_config.source()
    );
    Ok(())
}

async fn run_report(
    mut records: RecordStream<ProbeRecord>,
    filter: FilterMode,
    limit: Option<usize>,
) -> Result<()> {
    let mut data = Vec::new();
    while let Some(record) = records
        .try_next()
        .await
        .context("failed to read probe results")?
    {
        data.push(record);
    }
    drop(records);

    let matching = classify(&data, filter);
    let summary = Summary {
        shown: matching.len(),
        total: data.len(),
    };
    let rows = matching.into_iter().take(limit.unwrap_or(usize::MAX));

    println!("Filter: {} ({})", filter, filter.description());
    print!("{}", render_table(rows));
    println!("{summary}");
    Ok(())
}
