use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use attendance_tracker::{config::Config, routes, state::AppState};

#[tokio::main]
async fn main() {
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "attendance_tracker=debug,tower_http=debug".into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .init();

  let config = match Config::load() {
    Ok(config) => config,
    Err(e) => {
      tracing::error!("Invalid configuration: {}", e);
      std::process::exit(1);
    }
  };

  let state = match AppState::init(&config) {
    Ok(state) => state,
    Err(e) => {
      tracing::error!("Startup failed: {}", e);
      std::process::exit(1);
    }
  };

  let app = routes::router(state);

  let bind_addr = config.bind_addr();
  let listener = tokio::net::TcpListener::bind(&bind_addr)
    .await
    .unwrap_or_else(|_| panic!("Failed to bind to {}", bind_addr));

  tracing::info!("Server running on http://localhost:{}", config.port);

  axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
    .await
    .expect("Server failed to start");
}
