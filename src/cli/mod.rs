pub mod commands;
pub mod output;

use crate::model::Table;
use crate::session::{AttachOutcome, ExecOutcome, SchemaEntry, Session, SheetSummary};
use crate::state::SessionState;
use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "sheetsql",
    version,
    about = "Query and edit spreadsheet workbooks with SQL"
)]
pub struct Cli {
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,

    /// Where session state lives; override for test isolation.
    #[arg(long = "state-file", env = "SHEETSQL_STATE_FILE", global = true)]
    pub state_file: Option<PathBuf>,

    #[arg(long, global = true, help = "Emit compact JSON output")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Attach to a workbook and load all sheets")]
    Attach {
        #[arg(
            value_name = "WORKBOOK",
            help = "Workbook path; omit to reuse the last one"
        )]
        workbook: Option<String>,
        #[arg(long = "header-row", value_name = "N", help = "1-indexed header row")]
        header_row: Option<u32>,
    },
    #[command(about = "Reload sheets from the attached workbook")]
    Reload {
        #[arg(long = "header-row", value_name = "N", help = "1-indexed header row")]
        header_row: Option<u32>,
    },
    #[command(about = "List loaded sheets with row and column counts")]
    Sheets,
    #[command(about = "Show column names and kinds for one or all sheets")]
    Schema {
        #[arg(value_name = "SHEET")]
        sheet: Option<String>,
    },
    #[command(about = "Run a read statement and print the result")]
    Query {
        #[arg(value_name = "SQL")]
        sql: String,
    },
    #[command(about = "Run UPDATE/INSERT/DELETE and write changes back")]
    Exec {
        #[arg(value_name = "SQL")]
        sql: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Response {
    Attach(AttachOutcome),
    Sheets(Vec<SheetSummary>),
    Schema(Vec<SchemaEntry>),
    Query(Table),
    Exec(ExecOutcome),
}

pub fn run_command(command: Commands, state_path: Option<PathBuf>) -> Result<Response> {
    let state_path = state_path.unwrap_or_else(SessionState::default_path);
    let mut session = Session::new(state_path);
    match command {
        Commands::Attach {
            workbook,
            header_row,
        } => commands::attach::attach(&mut session, workbook, header_row),
        Commands::Reload { header_row } => commands::attach::reload(&mut session, header_row),
        Commands::Sheets => commands::read::sheets(&mut session),
        Commands::Schema { sheet } => commands::read::schema(&mut session, sheet.as_deref()),
        Commands::Query { sql } => commands::read::query(&mut session, &sql),
        Commands::Exec { sql } => commands::write::exec(&mut session, &sql),
    }
}
