use dotenvy::dotenv;
use snafu::ResultExt as _;

use video_tracker::api;
use video_tracker::config::Config;
use video_tracker::error::{ApplicationError, BindAddressSnafu, OpenStoreSnafu, WebServerSnafu};
use video_tracker::logger;
use video_tracker::store::VideoStore;

#[tokio::main]
async fn main() -> Result<(), ApplicationError> {
    dotenv().ok();

    let config = Config::from_env()?;

    let _guard = logger::init(&config)?;

    let store = VideoStore::open(&config.data_file).context(OpenStoreSnafu)?;
    let router = api::create_router(api::create_app(store));

    let listener = tokio::net::TcpListener::bind(config.host)
        .await
        .context(BindAddressSnafu {
            address: config.host,
        })?;

    tracing::info!(address = %config.host, "serving videos on {}", config.host);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context(WebServerSnafu)
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }

    tracing::info!("shutting down");
}
