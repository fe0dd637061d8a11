// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap and set up logging
// 2. Get a token (flag, environment variable, or a hidden prompt)
// 3. Start the crawl and print progress as discovery events stream in
// 4. Stop early on Ctrl-C, keeping everything fetched so far (a second
//    Ctrl-C stops right away instead of waiting out the current fetch)
// 5. Build the graph and write it as DOT or JSON
// 6. Exit with proper code (0 = complete, 1 = partial graph, 2 = error)
// =============================================================================

mod cli; // src/cli.rs - command-line parsing

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, OutputFormat};
use futures::StreamExt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use mutual_graph::api::{ApiClient, HttpTransport, RetryPolicy};
use mutual_graph::config::CrawlConfig;
use mutual_graph::crawl::{CrawlStatus, Crawler, DiscoveryEvent};
use mutual_graph::{graph, logging};

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // {:#} prints the whole context chain on one line
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    // Exits with clap's usage error (code 2) on conflicting flags
    if let Err(e) = cli.validate() {
        e.exit();
    }
    logging::init(cli.verbose)?;

    match cli.command {
        Commands::Crawl {
            token,
            api_base,
            format,
            output,
            max_retries,
            timeout,
            events,
        } => {
            let config = CrawlConfig {
                api_base: CrawlConfig::parse_api_base(&api_base)?,
                request_timeout: Duration::from_secs(timeout),
                retry: RetryPolicy {
                    max_retries,
                    ..RetryPolicy::default()
                },
                ..CrawlConfig::default()
            };
            handle_crawl(config, token, format, output, events).await
        }
    }
}

// Handles the 'crawl' subcommand
async fn handle_crawl(
    config: CrawlConfig,
    token: Option<String>,
    format: OutputFormat,
    output: Option<PathBuf>,
    print_events: bool,
) -> Result<i32> {
    config.validate()?;

    let token = match token {
        Some(token) => token,
        None => prompt_token()?,
    };

    let transport = HttpTransport::new(config.request_timeout)?;
    let client = ApiClient::new(Arc::new(transport), config.api_base.clone(), config.retry.clone());
    let mut crawler = Crawler::new(client, config.channel_capacity);

    let mut session = match crawler.crawl(&token).await {
        Ok(session) => session,
        Err(e) if e.is_authentication() => {
            eprintln!("❌ {}", e);
            eprintln!("   Check that the token is current and copied without quotes.");
            return Ok(2);
        }
        Err(e) => return Err(e).context("Could not start the crawl"),
    };

    let identity = session.identity.clone();
    let total = identity.connections.len();
    eprintln!("👤 Signed in as {}", identity.username);
    eprintln!("📋 {} connection(s) to crawl (Ctrl-C to stop early)\n", total);

    let cancel = session.cancel_token();
    let mut interrupts = Interrupts::default();
    let mut abandoned = false;

    let mut received: Vec<DiscoveryEvent> = Vec::with_capacity(total);
    {
        let mut events = session.events();
        loop {
            tokio::select! {
                event = events.next() => match event {
                    Some(event) => {
                        report_event(&event, print_events)?;
                        received.push(event);
                    }
                    None => break,
                },
                // Recreated on every pass, so the branch stays armed after the first press
                _ = tokio::signal::ctrl_c() => match interrupts.press() {
                    Interrupt::Cancel => {
                        eprintln!("\n⏹️  Stopping after the current connection (Ctrl-C again to stop now)...");
                        cancel.cancel();
                    }
                    Interrupt::Abandon => {
                        eprintln!("\n⏹️  Stopping now");
                        abandoned = true;
                        break;
                    }
                },
            }
        }
    }

    // An abandoned crawl may still be sleeping out a rate limit; don't wait
    // for it, the process exits once the partial graph is written
    let status = if abandoned {
        CrawlStatus::Cancelled
    } else {
        session.finish().await
    };

    let graph = graph::build_graph(&identity, &received);
    let rendered = match format {
        OutputFormat::Dot => graph::to_dot(&graph),
        OutputFormat::Json => graph::to_json(&graph)?,
    };
    let destination = output.unwrap_or_else(|| PathBuf::from(format.default_file_name()));
    write_output(&destination, &rendered)?;

    // Only an event for the last connection proves nothing was skipped
    let complete = received.last().map_or(total == 0, DiscoveryEvent::is_last);

    eprintln!();
    eprintln!("📊 Summary:");
    eprintln!("   🔍 Crawled: {} of {}", received.len(), total);
    eprintln!("   👥 Nodes: {}", graph.nodes().len());
    eprintln!("   🔗 Edges: {}", graph.edge_count());
    if destination.as_os_str() != "-" {
        eprintln!("   💾 Written to {}", destination.display());
    }

    match status {
        CrawlStatus::Completed if complete => {
            eprintln!("✅ Crawl complete");
            Ok(0)
        }
        CrawlStatus::Completed => {
            eprintln!("⚠️  Crawl ended before the last connection, the graph is partial");
            Ok(1)
        }
        CrawlStatus::Cancelled => {
            eprintln!("⚠️  Crawl stopped early, the graph is partial");
            Ok(1)
        }
        CrawlStatus::Aborted(reason) => {
            eprintln!("⚠️  Crawl aborted ({}), the graph is partial", reason);
            Ok(1)
        }
    }
}

// What a Ctrl-C press should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interrupt {
    /// Let the current connection finish, then stop
    Cancel,
    /// Stop waiting for the crawl altogether
    Abandon,
}

#[derive(Debug, Default)]
struct Interrupts {
    presses: u32,
}

impl Interrupts {
    fn press(&mut self) -> Interrupt {
        self.presses += 1;
        if self.presses == 1 {
            Interrupt::Cancel
        } else {
            Interrupt::Abandon
        }
    }
}

fn prompt_token() -> Result<String> {
    let token = dialoguer::Password::new()
        .with_prompt("Enter your token")
        .interact()
        .context("Could not read the token from the terminal")?;
    Ok(token)
}

// One progress line per crawled connection, or the raw event as JSON
fn report_event(event: &DiscoveryEvent, as_json: bool) -> Result<()> {
    if as_json {
        let line = serde_json::to_string(event)?;
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", line)?;
        stdout.flush()?;
    } else {
        eprintln!(
            "  [{}/{}] fetched {}: {} connection(s)",
            event.sequence_index,
            event.total,
            event.source_id,
            event.neighbor_ids.len()
        );
    }
    Ok(())
}

fn write_output(destination: &Path, rendered: &str) -> Result<()> {
    if destination.as_os_str() == "-" {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(rendered.as_bytes())?;
        stdout.flush()?;
        return Ok(());
    }

    std::fs::write(destination, rendered)
        .with_context(|| format!("Could not write {}", destination.display()))
}
