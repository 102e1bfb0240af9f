use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "revdoc",
    about = "Inspect and edit a revdoc document store",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Key space file
    #[arg(long, global = true, default_value = "revdoc.json")]
    pub data: PathBuf,

    /// Store configuration (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Store a document at the revision after --rev
    Put(PutArgs),
    /// Show the current revision of a document
    Get(GetArgs),
    /// Delete a document at a known revision
    Delete(DeleteArgs),
    /// List current documents of a type
    List(ListArgs),
    /// List document ids of a type
    Ids(IdsArgs),
    /// Show retained revisions of a document
    History(GetArgs),
    /// Queue a message
    Msg(MsgArgs),
    /// Add a schedule entry
    Schedule(ScheduleArgs),
    /// Show schedules that are due
    Due,
    /// Delete every entry, or every entry of one type
    Purge(PurgeArgs),
}

#[derive(Args)]
pub struct PutArgs {
    pub doc_type: String,
    pub id: String,
    /// Document body, a JSON object
    pub body: String,
    /// Revision the body was based on (omit for a new document)
    #[arg(long)]
    pub rev: Option<u64>,
}

#[derive(Args)]
pub struct GetArgs {
    pub doc_type: String,
    pub id: String,
}

#[derive(Args)]
pub struct DeleteArgs {
    pub doc_type: String,
    pub id: String,
    #[arg(long)]
    pub rev: u64,
}

#[derive(Args)]
pub struct ListArgs {
    pub doc_type: String,
    /// Keep ids matching this regular expression
    #[arg(long)]
    pub filter: Option<String>,
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
    #[arg(long, default_value = "0")]
    pub skip: usize,
    #[arg(long)]
    pub sorted: bool,
    #[arg(long)]
    pub descending: bool,
}

#[derive(Args)]
pub struct IdsArgs {
    pub doc_type: String,
}

#[derive(Args)]
pub struct MsgArgs {
    pub action: String,
    /// Message fields, a JSON object
    pub fields: Option<String>,
}

#[derive(Args)]
pub struct ScheduleArgs {
    /// `at` or `cron`
    pub flavour: String,
    pub owner: String,
    /// Cron expression, RFC 3339 time, or duration such as `1h30m`
    pub spec: String,
    /// Message to emit when due (JSON)
    pub msg: Option<String>,
}

#[derive(Args)]
pub struct PurgeArgs {
    /// Only purge this type
    #[arg(long = "type")]
    pub doc_type: Option<String>,
}
