#![doc = include_str!("../README.md")]

mod server;

use anyhow::Context;
use clap::Parser;
use core::time::Duration;
use flurry_proto::types::{Clock, Generator};
use futures::{Stream, TryStreamExt};
use server::config::{CliArgs, ServerConfig};
use server::daemon::{Daemonized, daemonize};
use server::service::handler::IdService;
use server::telemetry::init_telemetry;
use std::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio::signal;
use tokio_stream::wrappers::TcpListenerStream;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Pause between binding and serving. A daemon restarted right after a crash
/// must not issue in the millisecond its predecessor last issued in.
const STARTUP_SETTLE: Duration = Duration::from_millis(1);

fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = ServerConfig::try_from(args)?;

    // Forking must happen before the runtime spawns its threads.
    let _lockfile = if config.daemonize {
        match daemonize(&config.pid_file)? {
            Daemonized::Child(lock) => Some(lock),
            Daemonized::Parent => return Ok(()),
        }
    } else {
        None
    };

    init_telemetry(&config.log_filter, config.log_format)?;
    if config.daemonize {
        tracing::debug!(path = %config.pid_file.display(), "acquired PID file");
    }

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build the async runtime")?
        .block_on(run(config))
}

async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let tcp = TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    let addr = tcp.local_addr()?;

    tokio::time::sleep(STARTUP_SETTLE).await;

    let incoming = TcpListenerStream::new(tcp).inspect_ok(|stream: &TcpStream| {
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!("failed to set TCP_NODELAY: {e}");
        }
        tracing::debug!(peer = ?stream.peer_addr().ok(), "accepted connection");
    });

    log_startup_info(&addr, &config);
    run_server_with_incoming(incoming, config).await
}

async fn run_server_with_incoming<I, IO, IE>(incoming: I, config: ServerConfig) -> anyhow::Result<()>
where
    I: Stream<Item = Result<IO, IE>>,
    IO: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    IE: core::fmt::Display,
{
    let generator = Generator::<Clock>::new(config.machine_id, Clock::default());
    let service = IdService::new(generator);

    service
        .serve_with_incoming_shutdown(incoming, shutdown_signal())
        .await?;

    tracing::info!("Service shut down successfully");
    Ok(())
}

fn log_startup_info(addr: &SocketAddr, config: &ServerConfig) {
    if cfg!(debug_assertions) {
        tracing::info!(
            "Starting ID service on {} with full config: {:#?}",
            addr,
            config
        );
    } else {
        tracing::info!(
            "Starting ID service on {} as machine {}",
            addr,
            config.machine_id
        );
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                core::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = core::future::pending::<()>();

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {e}");
            core::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C signal"),
        () = terminate => tracing::info!("Received SIGTERM signal"),
    }

    tracing::info!("Shutdown signal received, terminating gracefully...");
}
