//! Prometheus exporter for RabbitMQ queue depths.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::watch;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

use rabbitmq_queue_exporter::config::{HttpConfig, LogFormat, LoggingConfig};
use rabbitmq_queue_exporter::{BrokerConfig, ExporterConfig, HttpBroker, HttpServer, QueueCollector};

/// Prometheus exporter for RabbitMQ queue depths.
///
/// Broker access is read from RABBITMQ_HOST, RABBITMQ_USER and
/// RABBITMQ_PASSWORD.
#[derive(Parser, Debug)]
#[command(name = "rabbitmq-queue-exporter")]
#[command(about = "Export RabbitMQ per-queue message counts as Prometheus metrics")]
#[command(version)]
struct Args {
    /// Port to expose metrics on.
    #[arg(long, default_value = "8000")]
    port: String,

    /// Expected scrape interval in seconds (informational only).
    #[arg(long, default_value_t = 15)]
    interval: u64,

    /// Path of the metrics endpoint.
    #[arg(long, default_value = "/metrics")]
    metrics_path: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn init_logging(logging: &LoggingConfig) -> anyhow::Result<()> {
    let log_level = logging.level.parse().unwrap_or(Level::INFO);
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("rabbitmq_queue_exporter={}", log_level).parse()?)
        .add_directive(format!("reqwest={}", Level::WARN).parse()?)
        .add_directive(format!("hyper={}", Level::WARN).parse()?);

    match logging.format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let logging = LoggingConfig {
        level: args.log_level,
        format: args.log_format,
    };
    init_logging(&logging)?;

    // Credentials must be present before anything is bound
    let broker = BrokerConfig::from_env().inspect_err(|e| error!("{}", e))?;

    let config = ExporterConfig {
        broker,
        http: HttpConfig {
            port: args.port,
            path: args.metrics_path,
        },
        logging,
        interval_secs: args.interval,
    };
    config.validate().inspect_err(|e| error!("{}", e))?;

    info!(
        broker = %config.broker.host,
        timeout_secs = config.broker.timeout.as_secs(),
        "Starting RabbitMQ exporter"
    );

    let api = Arc::new(HttpBroker::new(config.broker.timeout)?);
    let collector = Arc::new(QueueCollector::new(config.broker.clone(), api));

    let listen_addr = config.http.listen_addr()?;
    let http_server = HttpServer::bind(collector, listen_addr, config.http.path.clone())
        .await
        .inspect_err(|e| error!("{}", e))?;

    info!(
        addr = %listen_addr,
        interval_secs = config.interval_secs,
        "Serving metrics on each scrape (interval is advisory, no background polling)"
    );

    // Create shutdown signal
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut http_task = tokio::spawn(http_server.run(shutdown_rx));

    // Wait for shutdown signal or for the server to die on its own
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = async {
            #[cfg(unix)]
            {
                match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                    Ok(mut sigterm) => {
                        sigterm.recv().await;
                    }
                    Err(e) => {
                        error!("Failed to install SIGTERM handler: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            }
            #[cfg(not(unix))]
            {
                std::future::pending::<()>().await;
            }
        } => {
            info!("Received SIGTERM, shutting down...");
        }
        result = &mut http_task => {
            return match result {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => {
                    error!("HTTP server error: {}", e);
                    Err(e.into())
                }
                Err(e) => Err(e.into()),
            };
        }
    }

    // Signal shutdown
    shutdown_tx.send(true)?;

    // Wait for the server to drain
    let _ = tokio::time::timeout(Duration::from_secs(5), http_task).await;

    info!("Exporter stopped");
    Ok(())
}
