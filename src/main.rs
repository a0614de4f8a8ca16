use anyhow::{Context, Result};
use clap::Parser;
use postfeed::config::{self, FeedConfig};
use postfeed::feeds::profile::ProfileFetcher;
use postfeed::feeds::search::SearchFetcher;
use postfeed::presenter::Presenter;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "postfeed")]
#[command(about = "Render a user's recent posts as entity-linked HTML")]
#[command(version)]
struct Cli {
    /// Path to config file (defaults to <config dir>/postfeed/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Whose posts to fetch
    #[arg(short, long)]
    username: Option<String>,

    /// Maximum posts per fetch
    #[arg(short = 'n', long)]
    count: Option<usize>,

    /// Keep refreshing and print the feed after every change
    #[arg(short, long)]
    watch: bool,

    /// Refresh interval in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Disable mention hover previews
    #[arg(long)]
    no_tooltips: bool,

    /// Append a follow button after the posts
    #[arg(long)]
    follow_button: bool,

    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    log_level: String,
}

impl Cli {
    fn apply_to(&self, mut config: FeedConfig) -> FeedConfig {
        if let Some(username) = &self.username {
            config.username = username.clone();
        }
        if let Some(count) = self.count {
            config.count = count;
        }
        if let Some(interval) = self.interval_ms {
            config.refresh_interval_ms = interval;
        }
        config.auto_refresh |= self.watch;
        config.follow_button |= self.follow_button;
        if self.no_tooltips {
            config.tooltips = false;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    postfeed::logging::init(&cli.log_level)?;

    let config = cli.apply_to(config::load(cli.config.as_deref()).context("loading config")?);
    config.validate().context("checking config")?;

    let fetcher = Arc::new(SearchFetcher::new(
        config.endpoint.clone(),
        config.username.clone(),
        config.count,
    ));
    let profiles = Arc::new(ProfileFetcher::new(config.profile_endpoint.clone()));
    let mut presenter = Presenter::new(config).with_profiles(profiles);

    let mut printed = false;
    presenter
        .run(
            fetcher,
            |html| {
                println!("{}", html);
                printed = true;
            },
            async {
                let _ = tokio::signal::ctrl_c().await;
            },
        )
        .await;

    if !printed {
        println!("{}", presenter.to_html());
    }
    if let Some(error) = presenter.last_error() {
        anyhow::bail!("fetch failed: {}", error);
    }
    Ok(())
}
