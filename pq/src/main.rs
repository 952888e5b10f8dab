mod cli;
mod vocabulary;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Format};
use post_query::{MetatagSet, ParseError, ParseOptions, Query, compile, normalize_query};
use std::io::{BufRead, Write};
use std::process::ExitCode;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref())?;

    let options = cli.parse_options()?;
    let metatags = vocabulary::load(&cli)?;
    info!(metatags = metatags.len(), ?options, "ready");

    let failures = if cli.queries.is_empty() {
        prompt_loop(&cli, &metatags, &options)?
    } else {
        let mut failures = 0;
        for query in &cli.queries {
            if !run_query(query, &cli, &metatags, &options)? {
                failures += 1;
            }
        }
        failures
    };

    if failures > 0 {
        warn!(failures, "some queries were rejected");
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn init_tracing(filter: Option<&str>) -> Result<()> {
    let filter = match filter {
        Some(filter) => EnvFilter::try_new(filter).context("Invalid --log-level")?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

/// Reads queries from stdin until EOF or `/bye`. Returns how many failed.
fn prompt_loop(cli: &Cli, metatags: &MetatagSet, options: &ParseOptions) -> Result<usize> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let mut failures = 0;
    loop {
        print!("> ");
        stdout.flush().context("Failed to flush stdout")?;
        let mut line = String::new();
        let read = stdin
            .lock()
            .read_line(&mut line)
            .context("Failed to read stdin")?;
        if read == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        } else if line == "/bye" {
            break;
        }

        if !run_query(line, cli, metatags, options)? {
            failures += 1;
        }
    }
    Ok(failures)
}

/// Parses and prints one query. Returns `false` if it was rejected.
fn run_query(
    query: &str,
    cli: &Cli,
    metatags: &MetatagSet,
    options: &ParseOptions,
) -> Result<bool> {
    match compile(query, metatags, options) {
        Ok(parsed) => {
            let parsed = if cli.normalize {
                normalize_query(parsed)
            } else {
                parsed
            };
            debug!(query, sexp = %parsed.to_sexp(), "parsed");
            println!("{}", render(&parsed, cli.format)?);
            Ok(true)
        }
        Err(err) => {
            debug!(query, ?err, "rejected");
            eprintln!("{}", report(query, &err));
            Ok(false)
        }
    }
}

fn render(query: &Query, format: Format) -> Result<String> {
    Ok(match format {
        Format::Infix => query.to_infix(),
        Format::Sexp => query.to_sexp(),
        Format::Json => serde_json::to_string_pretty(query).context("Failed to serialize query")?,
        Format::Debug => format!("{query:#?}"),
    })
}

/// Formats an error with the query and a caret under the failing position.
fn report(query: &str, err: &ParseError) -> String {
    let column = query
        .get(..err.position())
        .map_or(0, |prefix| prefix.chars().count());
    format!("error: {err}\n  {query}\n  {}^", " ".repeat(column))
}
