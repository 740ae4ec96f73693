use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use metadata_service::http::{self, AppState};
use metadata_service::{startup, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[actix_web::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "metadata_service=info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        env = %config.app.env,
        server_name = %config.metadata.server_name,
        backend = ?config.repository.backend,
        "Starting metadata-service v{}",
        env!("CARGO_PKG_VERSION")
    );

    let repository = startup::connect_repository(&config).await?;
    let generic = startup::generic_handler(&config, repository);
    let state = web::Data::new(AppState::new(&generic));

    let bind_address = config.bind_address();
    tracing::info!(%bind_address, "HTTP server listening");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(http::configure)
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {bind_address}"))?
    .run()
    .await
    .context("HTTP server failed")?;

    tracing::info!("metadata-service shutting down");
    Ok(())
}
