use bikeshare_server::{
    build_router, builtin_config, check_connection, create_pool, resolve, sync_schema, AppState,
    JwksVerifier, NexmoGateway, Settings,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("bikeshare_server=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    if !settings.sms.is_configured() {
        tracing::warn!("NEXMO_API_KEY, NEXMO_API_SECRET or NEXMO_NUMBER not set; /send-sms will fail");
    }

    let model = resolve(&builtin_config()?)?;
    let pool = create_pool(&settings.database)?;
    match check_connection(&pool).await {
        Ok(()) => {
            tracing::info!("Connection has been established successfully.");
            if let Err(e) = sync_schema(&pool, &model).await {
                tracing::error!(error = %e, "schema sync failed");
            }
        }
        Err(e) => tracing::error!(error = %e, "Unable to connect to the database"),
    }

    let state = AppState {
        pool,
        model: Arc::new(model),
        verifier: Arc::new(JwksVerifier::new(settings.auth.clone())),
        sms: Arc::new(NexmoGateway::new(settings.sms.clone())),
        static_dir: Arc::new(settings.static_dir.clone()),
    };
    let app = build_router(state);

    let listener = TcpListener::bind((settings.bind_addr.as_str(), settings.port)).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutting down");
}
