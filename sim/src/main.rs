use dcp_server::{Backend, DcpServer, DcpServerConfig};
use std::error::Error;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::fmt::init();

    let config = match std::env::args().nth(1) {
        Some(path) => DcpServerConfig::from_file(&path)?,
        None => DcpServerConfig::default(),
    };

    let (backend, requests) = Backend::channel(
        64,
        Duration::from_millis(config.backend_timeout_ms),
    );
    tokio::spawn(sim::run_backend(requests, config.dof));

    tracing::info!(
        robot = %config.robot_name,
        port = config.port,
        "starting DCP server against the simulated backend"
    );
    let server = DcpServer::new(config, backend);
    server.run().await?;
    Ok(())
}
