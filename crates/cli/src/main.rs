// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]
#![allow(clippy::multiple_crate_versions)]

use std::io::Write;

use clap::{Parser, Subcommand};
use cmsdb_audit::ChangeEvent;
use cmsdb_domain::CanonicalId;
use cmsdb_persistence::{DatabaseConfig, Persistence};
use tracing::info;

/// cmsdb - migrate and inspect an audited CMS database
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Database URL or `SQLite` path. Falls back to `DATABASE_URL`.
    #[arg(short, long, global = true)]
    database: Option<String>,

    /// Maximum number of pooled connections.
    #[arg(long, global = true)]
    max_connections: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Command {
    /// Apply pending migrations and verify foreign key enforcement.
    Migrate,
    /// Print change events as JSON lines.
    Events {
        /// Only events of this table.
        #[arg(long, requires = "record")]
        table: Option<String>,
        /// Only events of this record. Requires `--table`.
        #[arg(long, requires = "table")]
        record: Option<CanonicalId>,
        /// Maximum number of recent events to print.
        #[arg(long, default_value_t = 50)]
        limit: i64,
    },
    /// Print row counts per table.
    Stats,
}

impl Args {
    fn database_config(&self) -> Result<DatabaseConfig, Box<dyn std::error::Error>> {
        let mut config: DatabaseConfig = match &self.database {
            Some(url) => DatabaseConfig::new(url.clone()),
            None => DatabaseConfig::from_env()?,
        };
        if let Some(max_connections) = self.max_connections {
            config = config.with_max_connections(max_connections);
        }
        Ok(config)
    }
}

/// Runs one command against an opened database, writing results to `out`.
fn run(
    command: &Command,
    persistence: &Persistence,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Migrate => {
            persistence.migrate()?;
            persistence.verify_foreign_key_enforcement()?;
            writeln!(out, "{} database is up to date", persistence.backend())?;
        }
        Command::Events {
            table,
            record,
            limit,
        } => {
            let events: Vec<ChangeEvent> = match (table, record) {
                (Some(table), Some(record)) => {
                    let mut history = persistence.change_events_for_record(table, record)?;
                    // Keep the newest `limit` entries of the history.
                    let skip: usize = history
                        .len()
                        .saturating_sub(usize::try_from(*limit).unwrap_or(0));
                    history.drain(..skip);
                    history
                }
                _ => persistence.recent_change_events(*limit)?,
            };
            for event in &events {
                writeln!(out, "{}", serde_json::to_string(event)?)?;
            }
        }
        Command::Stats => {
            for (table, count) in persistence.table_counts()? {
                writeln!(out, "{table:<16}{count:>12}")?;
            }
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config: DatabaseConfig = args.database_config()?;
    info!("Opening {} database", config.backend);
    let persistence: Persistence = Persistence::open(&config)?;

    let stdout = std::io::stdout();
    run(&args.command, &persistence, &mut stdout.lock())
}
