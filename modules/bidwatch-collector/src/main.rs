use anyhow::Result;
use chrono::Local;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bidwatch_collector::{sink, Collector};
use bidwatch_common::Config;
use nara_client::{ClientOptions, NaraClient, RetryPolicy};

/// Collect matching PPS bid notices into the configured sheet.
#[derive(Parser)]
#[command(name = "bidwatch")]
#[command(version)]
struct Cli {
    /// Fetch, filter and dedupe, but do not write to the destination
    #[arg(long)]
    dry_run: bool,

    /// Override DAYS_BACK for this run
    #[arg(long)]
    days_back: Option<u32>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("bidwatch=info".parse()?)
                .add_directive("bidwatch_collector=info".parse()?)
                .add_directive("bidwatch_common=info".parse()?)
                .add_directive("nara_client=info".parse()?)
                .add_directive("sheets_client=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(days) = cli.days_back {
        config.days_back = days;
    }
    config.log_redacted();

    let client = NaraClient::new(
        &config.service_key,
        ClientOptions {
            base_url: config.api_url.clone(),
            timeout: config.timeout(),
            retry: RetryPolicy::new(config.max_retry),
        },
    )?;
    let sink = sink::from_config(&config.sink)?;

    let stats = Collector::new(&config, &client, sink.as_ref())
        .dry_run(cli.dry_run)
        .run(Local::now())
        .await?;

    info!("{stats}");
    Ok(())
}
