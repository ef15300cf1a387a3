// ABOUTME: dexcom-share CLI - reads or follows glucose readings from a Share account
// ABOUTME: Prints each reading as one JSON line on stdout, logs on stderr
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
//!
//! Usage:
//! ```bash
//! # Print everything from the last hour
//! dexcom-share --username alice --password secret read --minutes 60
//!
//! # Print only the most recent reading
//! dexcom-share read --count 1
//!
//! # Follow new readings as they are uploaded (Ctrl-C to stop)
//! DEXCOM_SHARE_USERNAME=alice DEXCOM_SHARE_PASSWORD=secret dexcom-share follow
//! ```

use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dexcom_share::constants::env_config;
use dexcom_share::logging::LoggingConfig;
use dexcom_share::models::Reading;
use dexcom_share::{ReadOptions, Region, ShareClient, ShareConfig};
use futures_util::StreamExt;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "dexcom-share",
    about = "Dexcom Share glucose reader",
    long_about = "Reads blood glucose values from a Dexcom Share account and prints them as JSON lines."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Share account name
    #[arg(long, global = true, env = env_config::USERNAME)]
    username: Option<String>,

    /// Share account password
    #[arg(long, global = true, env = env_config::PASSWORD, hide_env_values = true)]
    password: Option<String>,

    /// Account is registered outside the United States
    #[arg(long, global = true)]
    outside_us: bool,

    /// Base URL override for the Share web services
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[non_exhaustive]
#[derive(Subcommand)]
enum Command {
    /// Read recent readings once and exit
    Read {
        /// Maximum number of readings to request
        #[arg(long)]
        count: Option<u32>,

        /// Minutes of history to request (1-1440, default 1440)
        #[arg(long)]
        minutes: Option<u32>,
    },

    /// Print new readings as they arrive until interrupted
    Follow,
}

impl Cli {
    fn share_config(&self) -> Result<ShareConfig> {
        let username = self
            .username
            .clone()
            .with_context(|| format!("--username or {} is required", env_config::USERNAME))?;
        let password = self
            .password
            .clone()
            .with_context(|| format!("--password or {} is required", env_config::PASSWORD))?;

        let mut config = ShareConfig::new(username, password).with_env_overrides();
        if self.outside_us {
            config = config.with_region(Region::OutsideUs);
        }
        if let Some(base_url) = &self.base_url {
            config = config.with_base_url(base_url);
        }
        Ok(config)
    }
}

fn print_reading(out: &mut impl Write, reading: &Reading) -> Result<()> {
    serde_json::to_writer(&mut *out, reading).context("failed to encode reading")?;
    writeln!(out).context("failed to write to stdout")?;
    out.flush().context("failed to flush stdout")
}

async fn read(client: &ShareClient, options: ReadOptions) -> Result<()> {
    let readings = client.read(options).await?;
    info!(count = readings.len(), "read complete");

    let mut out = io::stdout().lock();
    for reading in &readings {
        print_reading(&mut out, reading)?;
    }
    Ok(())
}

async fn follow(client: &ShareClient) -> Result<()> {
    let mut readings = client.readings();
    loop {
        tokio::select! {
            next = readings.next() => match next {
                Some(reading) => print_reading(&mut io::stdout().lock(), &reading?)?,
                None => return Ok(()),
            },
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for Ctrl-C")?;
                info!("interrupted, stopping");
                return Ok(());
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let logging = LoggingConfig::from_env();
    let logging = if cli.verbose {
        logging.verbose()
    } else {
        logging
    };
    logging.init()?;

    let client = ShareClient::new(cli.share_config()?)?;
    info!(
        region = ?client.config().region,
        base_url = client.config().base_url(),
        "connecting to Share"
    );

    match cli.command {
        Command::Read { count, minutes } => {
            read(
                &client,
                ReadOptions {
                    minutes,
                    max_count: count,
                },
            )
            .await
        }
        Command::Follow => follow(&client).await,
    }
}
