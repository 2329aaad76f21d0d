use std::io::{self, BufRead, Write};

use clap::{Args, Parser, Subcommand};
use common::LogRecord;
use dashboard::config::Config;
use dashboard::{
    Confirm, Dashboard, DeleteOutcome, FetchOutcome, FilterCriteria, HttpLogService, LiveListener,
    SortDirection, SortField, SortSpec,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Log service base URL
    #[arg(short, long)]
    api: Option<String>,

    /// Push channel URL
    #[arg(long)]
    ws: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct FilterArgs {
    /// Only logs whose username contains this text
    #[arg(short, long, default_value = "")]
    user: String,

    /// Only logs of this level
    #[arg(short, long, default_value = "")]
    level: String,
}

impl FilterArgs {
    fn criteria(&self) -> FilterCriteria {
        FilterCriteria::new(self.user.as_str(), self.level.as_str())
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List logs from the server
    List {
        #[command(flatten)]
        filter: FilterArgs,

        #[arg(long, value_enum, default_value_t = SortField::Timestamp)]
        sort: SortField,

        #[arg(long, value_enum, default_value_t = SortDirection::Descending)]
        order: SortDirection,

        /// Page size; the configured one is used when omitted
        #[arg(long)]
        page_size: Option<u32>,

        /// Number of pages to load in paginated mode
        #[arg(long, default_value_t = 1)]
        pages: u32,

        /// Print structured details of each log
        #[arg(long)]
        details: bool,
    },

    /// List matching logs, then follow new ones until Ctrl-C
    Watch {
        #[command(flatten)]
        filter: FilterArgs,

        #[arg(long)]
        details: bool,
    },

    /// Delete every log on the server
    Delete {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

struct StdinPrompt;

impl Confirm for StdinPrompt {
    fn confirm(&self, prompt: &str) -> bool {
        print!("{prompt} [y/N] ");
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut cfg = Config::from_env()?;
    if let Some(api) = cli.api {
        cfg.api_url = api;
    }
    if let Some(ws) = cli.ws {
        cfg.ws_url = ws;
    }

    // set up logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .with_writer(io::stderr)
        .init();

    let service = HttpLogService::new(&cfg.api_url, cfg.request_timeout())?;

    match cli.command {
        Commands::List {
            filter,
            sort,
            order,
            page_size,
            pages,
            details,
        } => {
            let mut options = cfg.dashboard_options();
            options.page_size = page_size.or(options.page_size);
            options.sort = Some(SortSpec::new(sort, order));
            let dashboard = Dashboard::new(service, options);

            if dashboard.set_filter(filter.criteria()).await != FetchOutcome::Applied {
                return Err("could not load logs".into());
            }
            for _ in 1..pages {
                match dashboard.load_more().await {
                    FetchOutcome::Applied => {}
                    FetchOutcome::Skipped => break,
                    _ => return Err("could not load the next page".into()),
                }
            }

            let logs = dashboard.logs().await;
            for log in &logs {
                print_log(log, details);
            }
            println!("{} log(s)", logs.len());
        }

        Commands::Watch { filter, details } => {
            let dashboard = Dashboard::new(service, cfg.dashboard_options());

            // Listen before the initial load so nothing created in between is lost.
            let listener = LiveListener::spawn(dashboard.clone(), cfg.live_options());
            let mut connected = listener.connected();
            let handshake = connected.wait_for(|up| *up);
            if tokio::time::timeout(cfg.request_timeout(), handshake).await.is_err() {
                tracing::warn!(url = %cfg.ws_url, "live channel not connected yet");
            }

            if dashboard.set_filter(filter.criteria()).await != FetchOutcome::Applied {
                listener.close().await;
                return Err("could not load logs".into());
            }
            let mut changes = dashboard.subscribe();
            // Oldest first so that new arrivals continue the listing.
            let mut shown = dashboard.logs().await;
            for log in shown.iter().rev() {
                print_log(log, details);
            }

            let ctrl_c = tokio::signal::ctrl_c();
            tokio::pin!(ctrl_c);

            loop {
                tokio::select! {
                    _ = &mut ctrl_c => break,
                    changed = changes.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let logs = dashboard.logs().await;
                        let fresh = logs.len().saturating_sub(shown.len());
                        for log in logs[..fresh].iter().rev() {
                            print_log(log, details);
                        }
                        shown = logs;
                    }
                }
            }
            listener.close().await;
        }

        Commands::Delete { yes } => {
            let dashboard = Dashboard::new(service, cfg.dashboard_options());
            let outcome = if yes {
                dashboard.delete_all(&|_: &str| true).await
            } else {
                dashboard.delete_all(&StdinPrompt).await
            };
            match outcome {
                DeleteOutcome::Deleted => println!("All logs deleted"),
                DeleteOutcome::Declined => println!("Nothing deleted"),
                DeleteOutcome::Failed => return Err("delete failed".into()),
            }
        }
    }

    Ok(())
}

fn print_log(log: &LogRecord, details: bool) {
    let when = common::parse_timestamp(&log.timestamp)
        .map(|t| {
            t.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        })
        .unwrap_or_else(|| log.timestamp.clone());

    println!(
        "[{when}] {:<5} {:<16} {} ({} {})",
        log.level,
        log.stake_username.as_deref().unwrap_or("-"),
        log.message,
        log.app_version.as_deref().unwrap_or("-"),
        log.platform.as_deref().unwrap_or("-"),
    );

    if details {
        match &log.details {
            Some(payload) => match serde_json::to_string_pretty(payload) {
                Ok(pretty) => {
                    for line in pretty.lines() {
                        println!("    {line}");
                    }
                }
                Err(err) => tracing::warn!("could not render details of {}: {err}", log.id),
            },
            None => println!("    N/A"),
        }
    }
}
