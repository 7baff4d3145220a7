use std::path::Path;

use clap::{Parser, ValueEnum};
use fireproof::RecordId;
use serde::Serialize;
use tracing::instrument;

use super::{open, terminal::Colorize};

/// Command arguments for `fireproof list`.
#[derive(Debug, Default, Parser)]
pub struct List {
    /// Output format (default: table).
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// One domain per line.
    #[default]
    Table,
    /// A JSON array of records.
    Json,
}

#[derive(Debug, Serialize)]
struct Row<'a> {
    domain: &'a str,
    id: Option<RecordId>,
}

impl List {
    #[instrument]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let fireproof = open(root)?;
        let index = fireproof.index();

        let domains = fireproof.domains();
        let rows: Vec<Row<'_>> = domains
            .iter()
            .map(|domain| Row {
                domain: domain.as_str(),
                id: index.id(domain),
            })
            .collect();

        match self.output {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            }
            OutputFormat::Table if rows.is_empty() => {
                println!("{}", "No fireproof domains".dim());
            }
            OutputFormat::Table => {
                for row in &rows {
                    println!("{}", row.domain);
                }
                println!("{}", format!("{} fireproof domain(s)", rows.len()).dim());
            }
        }

        Ok(())
    }
}
