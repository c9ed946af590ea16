use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Natural-language query planning for search and document stores.
///
/// QueryForge infers a normalized schema from a backing store, validates
/// model-produced filter documents into a canonical IR, and lowers that
/// IR to backend-native query plans.
#[derive(Parser)]
#[command(
    name = "query-forge",
    version,
    about = "Filter IR validation and query-plan generation for search and document stores",
    after_help = "Use 'query-forge <command> --help' for more information about a command.",
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Global options available to all subcommands.
#[derive(Args, Debug)]
pub struct GlobalOpts {
    /// Configuration file path [env: QUERY_FORGE_CONFIG]
    #[arg(
        short = 'c',
        long = "config",
        global = true,
        env = "QUERY_FORGE_CONFIG"
    )]
    pub config: Option<PathBuf>,

    /// Output format: human (default), json
    #[arg(
        long,
        global = true,
        default_value = "human",
        value_parser = ["human", "json"]
    )]
    pub format: String,
}

/// Top-level subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Extract and print the normalized field map from a live backend
    Schema(SchemaArgs),

    /// Validate a filter document against a mapping and print the canonical IR
    Validate(ValidateArgs),

    /// Validate a filter document and print backend query plans
    Translate(TranslateArgs),
}

/// The backend family a command talks to or targets.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    /// Search-engine backend (query DSL plans)
    Search,
    /// Document-store backend (aggregation pipelines)
    Doc,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Doc => "doc",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Args)]
pub struct SchemaArgs {
    /// Backend to extract from (overrides config)
    #[arg(long, value_enum)]
    pub backend: Option<BackendKind>,

    /// Connection URL (overrides config)
    #[arg(long)]
    pub url: Option<String>,

    /// Index or collection name (overrides config)
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Mapping/enum document standing in for a live backend
    #[arg(long)]
    pub mapping: PathBuf,

    /// Filter document to validate ('-' reads stdin)
    pub filter: PathBuf,
}

#[derive(Args)]
pub struct TranslateArgs {
    /// Mapping/enum document standing in for a live backend
    #[arg(long)]
    pub mapping: PathBuf,

    /// Plan family to emit
    #[arg(long, value_enum, default_value_t = BackendKind::Search)]
    pub target: BackendKind,

    /// Cardinality cap for grouping buckets (overrides config)
    #[arg(long)]
    pub bucket_size: Option<usize>,

    /// Per-bucket document collection cap (overrides config)
    #[arg(long)]
    pub top_hits_size: Option<usize>,

    /// Filter document to translate ('-' reads stdin)
    pub filter: PathBuf,
}
