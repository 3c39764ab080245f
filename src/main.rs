use tracing::info;

use reslot::clock::SystemClock;
use reslot::config::Config;
use reslot::session::Session;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;
    reslot::observability::init(config.metrics_port)?;

    info!("reslot session on stdin/stdout");
    info!("  default_unit: {}", config.default_unit);
    info!("  max_line_bytes: {}", config.max_line_bytes);
    info!(
        "  metrics: {}",
        config
            .metrics_port
            .map_or("disabled".to_string(), |p| format!("http://0.0.0.0:{p}/metrics"))
    );

    let session = Session::new(config, SystemClock);
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    tokio::select! {
        result = session.run(stdin, stdout) => {
            if let Err(e) = result {
                tracing::error!("session error: {e}");
                return Err(e.into());
            }
            info!("input closed");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    info!("reslot stopped");
    Ok(())
}
