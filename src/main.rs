use dotenvy::dotenv;
use event_coverage_payments::{
    config::Config,
    handler::PaymentIntentService,
    processor::{PaymentProcessor, StripeProcessor},
    routes::{create_router, AppState},
};
use std::net::SocketAddr;
use std::sync::Arc;
use stripe::Client;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "event_coverage_payments=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // the server must not come up without a usable Stripe key
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("invalid configuration: {err}");
            std::process::exit(1);
        }
    };
    tracing::debug!(?config, "loaded configuration");

    if let Err(err) = serve(config).await {
        tracing::error!("server error: {err}");
        std::process::exit(1);
    }
}

async fn serve(config: Config) -> std::io::Result<()> {
    let stripe_client: Arc<Client> = Arc::new(Client::new(config.stripe_secret_key.clone()));
    let processor: Arc<dyn PaymentProcessor> = Arc::new(StripeProcessor::new(stripe_client));

    let app_state = AppState::new(PaymentIntentService::new(
        processor,
        config.payment,
        config.processor,
    ));
    let app = create_router(app_state, &config.public_dir);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Event coverage payment server listening on {addr}");
    tracing::info!("Stripe mode: {}", config.stripe_mode());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {err}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutting down");
}
