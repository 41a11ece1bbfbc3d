use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use snafu::{ensure, OptionExt as _, ResultExt as _};
use tracing::instrument;

use crate::model::{ListQuery, Video, VideoDraft, VideoId};

pub use csv_file::{Collection, CsvFile, HEADER};
pub use error::*;

mod csv_file;
mod error;

/// CRUD access to the video collection kept in a single CSV file.
///
/// Nothing is cached between calls: every operation reads the file, and every
/// mutation rewrites it while holding the exclusive lock, so two concurrent
/// writers can never lose each other's update. Reads share the lock.
///
/// The API is blocking; async callers should run it on a blocking thread.
#[derive(Debug, Clone)]
pub struct VideoStore {
    file: Arc<RwLock<CsvFile>>,
}

impl VideoStore {
    /// Opens the store backed by `path`, creating its directory if needed. The
    /// file itself is created by the first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let file = CsvFile::new(path.into());
        file.ensure_directory().context(StorageSnafu)?;

        tracing::info!(path = %file.path().display(), "opened video store");

        Ok(Self {
            file: Arc::new(RwLock::new(file)),
        })
    }

    // The lock guards the file, not any in-memory state, so a panic while it
    // was held leaves nothing to repair.
    fn shared(&self) -> RwLockReadGuard<'_, CsvFile> {
        self.file.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn exclusive(&self) -> RwLockWriteGuard<'_, CsvFile> {
        self.file.write().unwrap_or_else(PoisonError::into_inner)
    }

    #[instrument(skip(self))]
    pub fn list(&self, query: &ListQuery) -> Result<Vec<Video>> {
        let mut videos = self.shared().load().context(StorageSnafu)?.into_videos();
        query.sort(&mut videos);

        tracing::debug!(count = videos.len(), "listed videos");
        Ok(videos)
    }

    #[instrument(skip(self))]
    pub fn get(&self, id: VideoId) -> Result<Video> {
        self.shared()
            .load()
            .context(StorageSnafu)?
            .get(id)
            .cloned()
            .context(NotFoundSnafu { id })
    }

    #[instrument(skip(self))]
    pub fn create(&self, draft: VideoDraft) -> Result<Video> {
        let video = draft.validate().context(InvalidSnafu)?;

        let file = self.exclusive();
        let mut collection = file.load().context(StorageSnafu)?;

        // ids of rows that failed to load are still taken
        ensure!(!collection.contains(video.id), ConflictSnafu { id: video.id });

        collection.push(video.clone());
        file.persist(&collection).context(StorageSnafu)?;

        tracing::info!(video_id = video.id, "created video `{}`", video.id);
        Ok(video)
    }

    /// Replaces the video stored under `id`, keeping its position.
    ///
    /// The stored record always takes `id`; an `id` inside the draft is ignored.
    #[instrument(skip(self))]
    pub fn update(&self, id: VideoId, draft: VideoDraft) -> Result<Video> {
        if draft.id != id {
            tracing::debug!(video_id = id, draft_id = draft.id, "draft id differs, keeping `{}`", id);
        }

        let video = draft.validate().context(InvalidSnafu)?.with_id(id);

        let file = self.exclusive();
        let mut collection = file.load().context(StorageSnafu)?;

        collection
            .replace(video.clone())
            .context(NotFoundSnafu { id })?;

        file.persist(&collection).context(StorageSnafu)?;

        tracing::info!(video_id = id, "updated video `{}`", id);
        Ok(video)
    }

    /// Removes the video stored under `id` and returns it.
    #[instrument(skip(self))]
    pub fn delete(&self, id: VideoId) -> Result<Video> {
        let file = self.exclusive();
        let mut collection = file.load().context(StorageSnafu)?;

        let removed = collection.remove(id).context(NotFoundSnafu { id })?;

        file.persist(&collection).context(StorageSnafu)?;

        tracing::info!(video_id = id, "deleted video `{}`", id);
        Ok(removed)
    }
}
