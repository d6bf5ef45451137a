//! # CLI - midsplit interactive shell
//!
//! A REPL over a single region. Reads commands from stdin, runs them against
//! the region, and prints results to stdout. Logs go to stderr, so the shell
//! can be scripted by piping commands in.
//!
//! ## Commands
//!
//! ```text
//! PUT family key value       Write a cell
//! GET family key             Read a cell (prints value or "(nil)")
//! DEL family key             Write a tombstone
//! FLUSH [family]             Flush one store, or all of them
//! FILES                      List data files with size and midpoint row
//! SPLIT [weighted|midpoint]  Print the split point
//! STATS                      Print region debug info
//! EXIT / QUIT                Shut down
//! ```
//!
//! ## Configuration
//!
//! Environment variables, see the `config` crate (`MIDSPLIT_REGION_DIR`,
//! `MIDSPLIT_FAMILIES`, `MIDSPLIT_STRATEGY`, ...). Log verbosity follows
//! `RUST_LOG` (default `info`).
//!
//! ## Example
//!
//! ```text
//! $ MIDSPLIT_FLUSH_KB=1 cargo run -p cli
//! midsplit started (region=region-0, dir=data/region, stores=1, strategy=weighted)
//! > PUT default apple 1
//! OK
//! > FLUSH
//! OK (files=1)
//! > SPLIT
//! 6170706c65 (apple)
//! > EXIT
//! bye
//! ```

use anyhow::Result;
use config::{Config, StrategyKind};
use region::Region;
use split::{CellKey, KeyRangeMidpointSplit, SplitPointStrategy, WeightedMedianSplit};
use std::io::{self, BufRead, Write};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Log filter used when `RUST_LOG` is unset. Covers the `split`, `region`
/// and `midsplit` targets.
const DEFAULT_LOG_FILTER: &str = "info";

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cfg = Config::from_env()?;
    let mut region = Region::open(&cfg.region)?;
    info!(region = %region.name(), strategy = %cfg.strategy, "midsplit ready");

    let mut out = io::stdout();
    writeln!(
        out,
        "midsplit started (region={}, dir={}, stores={}, strategy={})",
        region.name(),
        region.dir().display(),
        region.stores().count(),
        cfg.strategy
    )?;
    writeln!(out, "Commands: PUT family key value | GET family key | DEL family key")?;
    writeln!(out, "          FLUSH [family] | FILES | SPLIT [weighted|midpoint] | STATS | EXIT")?;
    write!(out, "> ")?;
    out.flush()?;

    for line in io::stdin().lock().lines() {
        let line = line?;
        if !execute(&mut region, cfg.strategy, &line, &mut out)? {
            break;
        }
        write!(out, "> ")?;
        out.flush()?;
    }

    Ok(())
}

/// Builds the strategy selected by `kind`.
fn strategy_for(kind: StrategyKind) -> Box<dyn SplitPointStrategy> {
    match kind {
        StrategyKind::Weighted => Box::new(WeightedMedianSplit::new(KeyRangeMidpointSplit)),
        StrategyKind::Midpoint => Box::new(KeyRangeMidpointSplit),
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Runs one command line. Returns `Ok(false)` when the shell should exit.
fn execute<W: Write>(
    region: &mut Region,
    default_strategy: StrategyKind,
    line: &str,
    out: &mut W,
) -> io::Result<bool> {
    let mut parts = line.split_whitespace();
    let cmd = match parts.next() {
        Some(c) => c,
        None => return Ok(true),
    };

    match cmd.to_uppercase().as_str() {
        "PUT" => match (parts.next(), parts.next()) {
            (Some(family), Some(key)) => {
                let value = parts.collect::<Vec<&str>>().join(" ");
                if value.is_empty() {
                    writeln!(out, "ERR usage: PUT family key value")?;
                } else {
                    match region.put(family, key.as_bytes().to_vec(), value.into_bytes()) {
                        Ok(()) => writeln!(out, "OK")?,
                        Err(e) => writeln!(out, "ERR put failed: {}", e)?,
                    }
                }
            }
            _ => writeln!(out, "ERR usage: PUT family key value")?,
        },
        "GET" => match (parts.next(), parts.next()) {
            (Some(family), Some(key)) => match region.get(family, key.as_bytes()) {
                Ok(Some((_seq, v))) => writeln!(out, "{}", String::from_utf8_lossy(&v))?,
                Ok(None) => writeln!(out, "(nil)")?,
                Err(e) => writeln!(out, "ERR read failed: {}", e)?,
            },
            _ => writeln!(out, "ERR usage: GET family key")?,
        },
        "DEL" => match (parts.next(), parts.next()) {
            (Some(family), Some(key)) => match region.delete(family, key.as_bytes().to_vec()) {
                Ok(()) => writeln!(out, "OK")?,
                Err(e) => writeln!(out, "ERR del failed: {}", e)?,
            },
            _ => writeln!(out, "ERR usage: DEL family key")?,
        },
        "FLUSH" => {
            let result = match parts.next() {
                Some(family) => region.flush(family),
                None => region.flush_all(),
            };
            match result {
                Ok(()) => writeln!(out, "OK (files={})", region.file_count())?,
                Err(e) => writeln!(out, "ERR flush failed: {}", e)?,
            }
        }
        "FILES" => {
            let mut listed = 0;
            for store in region.stores() {
                for file in store.files() {
                    let mid = match file.midkey() {
                        Ok(k) => match CellKey::row_of(&k) {
                            Ok(row) => String::from_utf8_lossy(row).into_owned(),
                            Err(e) => format!("<{}>", e),
                        },
                        Err(e) => format!("<unreadable: {}>", e),
                    };
                    writeln!(
                        out,
                        "{}/{} bytes={} mid={}",
                        store.name(),
                        file.path().file_name().map(|n| n.to_string_lossy()).unwrap_or_default(),
                        file.length(),
                        mid
                    )?;
                    listed += 1;
                }
            }
            writeln!(out, "({} files)", listed)?;
        }
        "SPLIT" => {
            let kind = match parts.next() {
                Some(name) => match name.parse::<StrategyKind>() {
                    Ok(k) => k,
                    Err(e) => {
                        writeln!(out, "ERR {}", e)?;
                        return Ok(true);
                    }
                },
                None => default_strategy,
            };
            match region.split_point(strategy_for(kind).as_ref()) {
                Ok(key) => writeln!(out, "{} ({})", hex(&key), String::from_utf8_lossy(&key))?,
                Err(e) => writeln!(out, "ERR split failed: {}", e)?,
            }
        }
        "STATS" => writeln!(out, "{:#?}", region)?,
        "EXIT" | "QUIT" => {
            writeln!(out, "bye")?;
            return Ok(false);
        }
        other => writeln!(out, "unknown command: {}", other)?,
    }

    Ok(true)
}
