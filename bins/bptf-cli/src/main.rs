//! backpack.tf economy API CLI
//!
//! Commands:
//! - `currencies`: Currency data for Team Fortress 2
//! - `history`: Price history for one item
//! - `prices`: Price schema, optionally limited to recent updates
//! - `special-items`: Internal item placeholders
//!
//! # Usage
//! ```bash
//! BPTF_API_KEY=... bptf currencies --raw 2
//! bptf history --item "Mann Co. Supply Crate Key" --quality Strange
//! bptf prices --since 2024-01-01T00:00:00Z
//! bptf special-items --via-callback
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{error, info};

use bptf_prices::{
    ClientConfig, CurrenciesParams, PriceHistoryParams, PricesClient, PricesParams, QueryParams,
    ResponseCallback, SpecialItemsParams, BPTF_API_BASE,
};

#[derive(Parser)]
#[command(name = "bptf")]
#[command(about = "backpack.tf economy API client")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// backpack.tf API key
    #[arg(long, env = "BPTF_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// API host
    #[arg(long, env = "BPTF_BASE_URL", default_value = BPTF_API_BASE, global = true)]
    base_url: String,

    /// Deliver the response through a callback instead of awaiting it
    #[arg(long, default_value = "false", global = true)]
    via_callback: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Get currency data for Team Fortress 2
    Currencies {
        /// Raw value mode (1 or 2)
        #[arg(long)]
        raw: Option<i64>,
    },

    /// Get the price history of an item (defaults to a Unique Team Captain)
    History {
        #[arg(long)]
        appid: Option<i64>,

        /// Item base name
        #[arg(long)]
        item: Option<String>,

        /// Quality name, e.g. Unique, Strange, Collector's
        #[arg(long)]
        quality: Option<String>,

        /// Tradable or Non-Tradable
        #[arg(long)]
        tradable: Option<String>,

        /// Craftable or Non-Craftable
        #[arg(long)]
        craftable: Option<String>,

        #[arg(long)]
        priceindex: Option<i64>,
    },

    /// Get the price schema
    Prices {
        /// Raw value mode (1 or 2)
        #[arg(long)]
        raw: Option<i64>,

        /// Only prices updated at or after this time (UNIX seconds or RFC 3339)
        #[arg(long)]
        since: Option<String>,
    },

    /// Get backpack.tf's internal item placeholders
    SpecialItems {
        #[arg(long)]
        appid: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = ClientConfig::default().with_base_url(&cli.base_url);
    if let Some(key) = cli.api_key.clone() {
        config = config.with_api_key(key);
    }

    info!("Base URL: {}", config.base_url());
    if !config.has_api_key() {
        info!("No API key configured (set BPTF_API_KEY or --api-key)");
    }

    let client = PricesClient::new(config)?;
    let via_callback = cli.via_callback;

    let body = match cli.command {
        Commands::Currencies { raw } => {
            let params = CurrenciesParams { raw, ..Default::default() };
            run(&client, params, via_callback).await?
        }
        Commands::History { appid, item, quality, tradable, craftable, priceindex } => {
            let params = PriceHistoryParams {
                appid,
                item,
                quality,
                tradable,
                craftable,
                priceindex,
                ..Default::default()
            };
            run(&client, params, via_callback).await?
        }
        Commands::Prices { raw, since } => {
            let since = since.as_deref().map(parse_since).transpose()?;
            let params = PricesParams { raw, since, ..Default::default() };
            run(&client, params, via_callback).await?
        }
        Commands::SpecialItems { appid } => {
            let params = SpecialItemsParams { appid, ..Default::default() };
            run(&client, params, via_callback).await?
        }
    };

    summarize(&body);
    println!("{}", serde_json::to_string_pretty(&body)?);

    Ok(())
}

/// Send one request through the chosen delivery mode
async fn run<P: QueryParams>(client: &PricesClient, mut params: P, via_callback: bool) -> Result<Value> {
    if !via_callback {
        let reply = client.request(params)?;
        let fut = reply.into_deferred().context("expected a deferred reply")?;
        return fut.await.map_err(|e| {
            error!("Request failed: {}", e);
            e.into()
        });
    }

    let (tx, rx) = oneshot::channel();
    params.set_callback(ResponseCallback::new(move |result| {
        let _ = tx.send(result);
    }));
    client.request(params)?;
    let result = rx.await.context("callback was never invoked")?;
    result.map_err(|e| {
        error!("Request failed: {}", e);
        e.into()
    })
}

fn parse_since(raw: &str) -> Result<i64> {
    if let Ok(ts) = raw.parse::<i64>() {
        return Ok(ts);
    }
    let time: DateTime<Utc> = DateTime::parse_from_rfc3339(raw)
        .map_err(|e| anyhow::anyhow!("Invalid since '{}': {}", raw, e))?
        .with_timezone(&Utc);
    Ok(time.timestamp())
}

/// Log the size of the collections in a response
fn summarize(body: &Value) {
    for field in ["currencies", "history", "items"] {
        match body.get(field) {
            Some(Value::Array(list)) => info!("{}: {} entries", field, list.len()),
            Some(Value::Object(map)) => info!("{}: {} entries", field, map.len()),
            _ => {}
        }
    }
}
