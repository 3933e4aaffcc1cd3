use log::{error, info};
use service::{config::Config, logging::Logger, AppState};
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config);

    info!("Starting conference bridge [{}]...", config.runtime_env);

    let db = match service::init_database(&config).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };

    let interface = config.interface.clone().unwrap_or_default();
    let port = config.port;
    let listen_addr = format!("{interface}:{port}");

    let app_state = AppState::new(config, &db);
    let router = web::define_routes(app_state);

    info!("Server starting... listening for connections on http://{listen_addr}");

    let addr = match SocketAddr::from_str(&listen_addr) {
        Ok(addr) => addr,
        Err(e) => {
            error!("Invalid listen address {listen_addr}: {e}");
            std::process::exit(1);
        }
    };

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {listen_addr}: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, router.into_make_service()).await {
        error!("Server error: {e}");
        std::process::exit(1);
    }
}
