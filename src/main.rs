use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use canvaswars_rs::{app, config::ServerConfig, error::CanvasError, AppState};

#[tokio::main]
async fn main() -> Result<(), CanvasError> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "canvaswars=info,canvaswars_rs=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;
    let state = AppState::new(&config);
    let router = app(state, &config.static_dir);

    let addr = config.addr();
    tracing::info!("🎨 Canvas Wars server listening on http://{}", addr);
    tracing::info!(
        "   Grace period: {}s, server-side cooldown: {}",
        config.grace_period.as_secs(),
        if config.enforce_cooldown { "on" } else { "off" }
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}
