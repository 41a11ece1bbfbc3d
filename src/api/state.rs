use snafu::ResultExt as _;

use super::{ApiError, BlockingTaskSnafu, StoreSnafu};
use crate::store::{self, VideoStore};

#[derive(Debug, Clone)]
pub struct App {
    pub store: VideoStore,
}

impl App {
    /// Runs a store operation on the blocking thread pool, since every store
    /// call reads or rewrites the backing file.
    pub async fn run<T, F>(&self, operation: F) -> Result<T, ApiError>
    where
        F: FnOnce(&VideoStore) -> store::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.store.clone();

        tokio::task::spawn_blocking(move || operation(&store))
            .await
            .context(BlockingTaskSnafu)?
            .context(StoreSnafu)
    }
}

pub fn create_app(store: VideoStore) -> App {
    App { store }
}
