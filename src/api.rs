use axum::routing::get;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

pub use error::*;
pub use response::*;
pub use state::*;

mod error;
mod response;
mod state;

pub mod videos;

pub type Result<T, E = ApiError> = std::result::Result<T, E>;

/// Builds the HTTP surface. Every route is served with and without a trailing
/// slash.
pub fn create_router(app: App) -> Router {
    let collection = get(videos::list).post(videos::create);
    let item = get(videos::get)
        .put(videos::update)
        .delete(videos::delete);

    Router::new()
        .route("/videos", collection.clone())
        .route("/videos/", collection)
        .route("/videos/:id", item.clone())
        .route("/videos/:id/", item)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(app)
}
