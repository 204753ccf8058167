use clap::{Parser, Subcommand};
use scopeload::ReferrerPolicy;

#[derive(Parser)]
#[command(
    name = "scopeload",
    version,
    about = "Load resources into isolated scopes, once per URL, under a deadline"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Load resources and report each outcome
    Fetch(FetchArgs),
    /// Print the effective configuration from the environment
    Config,
}

#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// Resource URLs, absolute or relative to --base-url
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// Scope to load into (repeatable); each name is its own cache partition.
    /// Defaults to the document scope.
    #[arg(long = "scope", value_name = "NAME")]
    pub scopes: Vec<String>,

    /// Deadline per load in milliseconds
    #[arg(long)]
    pub max_load_time_ms: Option<u64>,

    /// Referrer policy token (e.g. no-referrer, origin)
    #[arg(long)]
    pub referrer_policy: Option<ReferrerPolicy>,

    /// Anonymous cross-origin mode (credentials only for same-origin targets)
    #[arg(long)]
    pub cross_origin: bool,

    /// Cache-busting qualifier appended to every URL (e.g. v=5.2.0)
    #[arg(long)]
    pub cache_suffix: Option<String>,

    /// Base URL for relative resources
    #[arg(long)]
    pub base_url: Option<String>,

    /// URL of the requesting document, used for the Referer header
    #[arg(long)]
    pub referrer: Option<String>,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}
