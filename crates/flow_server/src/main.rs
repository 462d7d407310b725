use clap::Parser;
use flow_server::{AppState, ServerConfig, ServerError, app};
use miette::Result;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();
    let config = ServerConfig::parse();

    let env_filter = if config.debug {
        EnvFilter::new("flow_core=debug,flow_db=debug,flow_server=debug,tower_http=debug,warn")
    } else {
        EnvFilter::new("flow_core=info,flow_db=info,flow_server=info,tower_http=info,warn")
    };
    let terminal_layer = fmt::layer()
        .with_file(config.debug)
        .with_line_number(config.debug)
        .with_target(true);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(terminal_layer)
        .init();

    tracing::debug!(?config, "loaded configuration");

    let port = config.port;
    let state = AppState::new(config).await?;
    let db = state.db().clone();
    let router = app(state)?;

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .map_err(ServerError::from)?;
    tracing::info!("Listening on {}", listener.local_addr().map_err(ServerError::from)?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::from)?;

    db.close().await;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
