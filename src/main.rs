use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use commit_chart::{api, config};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    config::Config::dotenv_load();
    let config = match config::Config::new() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            std::process::exit(2);
        }
    };
    config::Config::print_env_vars();

    let state = Arc::new(api::AppState::from_config(&config));
    let app = api::router(state);

    let host_str = config.api_host.clone();
    let port_str = config.api_port.clone();
    let ip: std::net::IpAddr = host_str.parse().unwrap_or_else(|_| {
        tracing::warn!("Invalid API_HOST '{}', falling back to 127.0.0.1", host_str);
        std::net::IpAddr::from([127, 0, 0, 1])
    });
    let port: u16 = port_str.parse().unwrap_or_else(|_| {
        tracing::warn!("Invalid API_PORT '{}', falling back to 8766", port_str);
        8766
    });
    let socket_address = SocketAddr::new(ip, port);
    tracing::info!("listening on {}", socket_address);

    if let Err(e) = serve(socket_address, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

async fn serve(addr: SocketAddr, app: axum::Router) -> Result<(), hyper::Error> {
    axum::Server::try_bind(&addr)?.serve(app.into_make_service()).await
}
