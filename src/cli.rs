// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// There is one subcommand today, `crawl`. Everything it needs can be passed
// as a flag; the token can also come from the MUTUAL_GRAPH_TOKEN environment
// variable, and when neither is given we prompt for it without echoing.
// =============================================================================

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use mutual_graph::config::DEFAULT_API_BASE;

#[derive(Parser, Debug)]
#[command(
    name = "mutual-graph",
    version,
    about = "Map who among your connections is connected to whom",
    long_about = "mutual-graph fetches your connections, then each of their connections, \
                  and writes the resulting graph as Graphviz DOT or JSON. \
                  Rate limits are waited out automatically; press Ctrl-C to stop early \
                  and keep what was fetched so far."
)]
pub struct Cli {
    /// Log debug output from the crawler (RUST_LOG overrides this)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Checks clap cannot express with argument attributes alone
    ///
    /// `--events` and `--output -` both write to stdout, and the two streams
    /// would interleave into something neither reader can parse.
    pub fn validate(&self) -> Result<(), clap::Error> {
        let Commands::Crawl { output, events, .. } = &self.command;
        let graph_to_stdout = output.as_deref().is_some_and(|path| path.as_os_str() == "-");

        if *events && graph_to_stdout {
            return Err(Cli::command().error(
                ErrorKind::ArgumentConflict,
                "--events prints to stdout, so the graph needs a file: drop `--output -`",
            ));
        }
        Ok(())
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl your connections and write the connection graph
    ///
    /// Example: mutual-graph crawl --format dot --output friends.dot
    Crawl {
        /// Authorization token (prompted for when missing)
        #[arg(long, env = "MUTUAL_GRAPH_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Base URL of the API
        #[arg(long, env = "MUTUAL_GRAPH_API_BASE", default_value = DEFAULT_API_BASE)]
        api_base: String,

        /// Output format for the graph
        #[arg(long, value_enum, default_value_t = OutputFormat::Dot)]
        format: OutputFormat,

        /// Where to write the graph; `-` writes to stdout
        ///
        /// Defaults to relationships.dot or relationships.json
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Retries per connection while rate limited
        #[arg(long, default_value_t = 8)]
        max_retries: u32,

        /// Per-request timeout in seconds
        #[arg(long, default_value_t = 10)]
        timeout: u64,

        /// Print every discovery event as a JSON line on stdout
        #[arg(long)]
        events: bool,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Graphviz DOT
    Dot,
    /// Pretty-printed JSON
    Json,
}

impl OutputFormat {
    pub fn default_file_name(self) -> &'static str {
        match self {
            OutputFormat::Dot => "relationships.dot",
            OutputFormat::Json => "relationships.json",
        }
    }
}
