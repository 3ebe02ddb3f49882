use anyhow::Result;
use collector::*;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

/// Console plus an append-only file sink, both timestamped and leveled.
fn init_logging(log_file: &str) -> Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_timer(LocalTimer))
        .with(
            tracing_subscriber::fmt::layer()
                .with_timer(LocalTimer)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file)),
        )
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let app_config = match config::AppConfig::load() {
        Ok(c) => {
            init_logging(&c.logging.file)?;
            c
        }
        Err(e) => {
            // Config carries the log path; fall back to the default sink
            init_logging(config::DEFAULT_LOG_FILE)?;
            tracing::error!(error = %e, "failed to load configuration");
            return Err(e.into());
        }
    };

    tracing::info!(
        name = version::NAME,
        version = version::VERSION,
        "collector starting"
    );

    let backend = backend::BackendClient::new(&app_config.backend.url)?;
    let sampler = sampler::Sampler::new();
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let mut runner = runner::Runner::new(&app_config, backend, sampler, shutdown_rx);

    let mut handle = tokio::spawn(async move { runner.run().await });

    tokio::select! {
        result = &mut handle => {
            // Registration failure or an unclassified loop error
            result??;
        }
        _ = shutdown_signal() => {
            tracing::info!("received shutdown signal");
            let _ = shutdown_tx.send(());
            handle.await??;
        }
    }

    tracing::info!("collector stopped");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
