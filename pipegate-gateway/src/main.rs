use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_appender::non_blocking::NonBlocking;
use tracing_subscriber::EnvFilter;

use pipegate_gateway::{server, Gateway, GatewayConfig, LogFormat};

#[tokio::main]
async fn main() -> ExitCode {
    let config = GatewayConfig::parse();

    let (writer, _log_guard) = tracing_appender::non_blocking(std::io::stdout());
    init_tracing(writer, config.log_format);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        listen_addr = %config.listen_addr,
        upstream = %config.upstream_endpoint,
        "pipegate starting"
    );

    let gateway = match Gateway::remote(config.upstream_endpoint.clone(), config.remote_options())
    {
        Ok(gateway) => Arc::new(
            gateway
                .with_call_timeout(config.call_timeout())
                .with_max_body_bytes(config.max_body_bytes),
        ),
        Err(err) => {
            tracing::error!(error = %err, "failed to initialize gateway");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            match wait_for_shutdown().await {
                Ok(signal) => tracing::info!(signal, "shutdown signal received"),
                Err(err) => tracing::error!(error = %err, "signal handler failed"),
            }
            shutdown.cancel();
        }
    });

    match server::serve(gateway, config.listen_addr, shutdown).await {
        Ok(()) => {
            tracing::info!("pipegate stopped");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "server error");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(writer: NonBlocking, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(writer)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .init(),
    }
}

#[cfg(unix)]
async fn wait_for_shutdown() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = sigint.recv() => Ok("SIGINT"),
        _ = sigterm.recv() => Ok("SIGTERM"),
        _ = sigquit.recv() => Ok("SIGQUIT"),
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("ctrl-c")
}
