//! `flurry`: request IDs from a running `flurryd` and print them.
//!
//! ```bash
//! flurry                         # 100 IDs, full format
//! flurry --count 5 -o compact
//! flurry --rate 50 -o json       # 50 IDs per second until Ctrl+C
//! ```

mod render;

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use core::time::Duration;
use flurry_proto::IdClient;
use render::{Format, render};
use tokio::{net::TcpStream, signal, time::MissedTickBehavior};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "flurry",
    version,
    about = "Request time-ordered IDs from a flurry daemon"
)]
struct CliArgs {
    /// Daemon address.
    ///
    /// Environment variable: `FLURRY_ADDR`
    #[arg(short, long, env = "FLURRY_ADDR", default_value = "127.0.0.1:23138")]
    addr: String,

    /// Number of IDs to request. Ignored with `--rate`.
    #[arg(short = 'n', long, default_value_t = 100)]
    count: u64,

    /// Request this many IDs per second until interrupted.
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    rate: Option<u32>,

    /// Output format.
    #[arg(short = 'o', long, value_enum, default_value_t = Format::Full)]
    format: Format,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();

    let mut client = IdClient::connect(args.addr.as_str())
        .await
        .with_context(|| format!("failed to connect to {}", args.addr))?;

    match args.rate {
        Some(rate) => run_continuous(&mut client, rate, args.format).await,
        None => run_batch(&mut client, args.count, args.format).await,
    }
}

async fn run_batch(
    client: &mut IdClient<TcpStream>,
    count: u64,
    format: Format,
) -> anyhow::Result<()> {
    for _ in 0..count {
        request_and_print(client, format).await?;
    }
    Ok(())
}

async fn run_continuous(
    client: &mut IdClient<TcpStream>,
    rate: u32,
    format: Format,
) -> anyhow::Result<()> {
    let mut ticker = tokio::time::interval(Duration::from_secs(1) / rate);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let ctrl_c = signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            res = &mut ctrl_c => {
                res.context("failed to listen for Ctrl+C")?;
                eprintln!("\ninterrupt received, stopping");
                return Ok(());
            }
            _ = ticker.tick() => request_and_print(client, format).await?,
        }
    }
}

async fn request_and_print(client: &mut IdClient<TcpStream>, format: Format) -> anyhow::Result<()> {
    let id = client.next_id().await.context("ID request failed")?;
    println!("{}", render(id, format, &Local)?);
    Ok(())
}
