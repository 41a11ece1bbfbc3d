use std::io;
use std::path::PathBuf;

use snafu::{Location, Snafu};

use crate::model::{ValidationError, VideoId};
use crate::Located;

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

/// The broad class of a [StoreError], used to pick a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Storage,
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StoreError {
    #[snafu(display("{source}"))]
    Invalid { source: ValidationError },

    #[snafu(display("Video with ID {id} not found"))]
    NotFound { id: VideoId },

    #[snafu(display("Video with ID {id} already exists"))]
    Conflict { id: VideoId },

    #[snafu(display("{source}"))]
    Storage { source: StorageError },
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Invalid { .. } => ErrorKind::Validation,
            StoreError::NotFound { .. } => ErrorKind::NotFound,
            StoreError::Conflict { .. } => ErrorKind::Conflict,
            StoreError::Storage { .. } => ErrorKind::Storage,
        }
    }
}

/// Failures of the backing file itself. None of these leave a partially
/// written file behind.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StorageError {
    #[snafu(display("failed to create directory `{}` at {location}: {source}", path.display()))]
    CreateDirectory {
        path: PathBuf,
        source: io::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("failed to open `{}` at {location}: {source}", path.display()))]
    Open {
        path: PathBuf,
        source: io::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("failed to read `{}` at {location}: {source}", path.display()))]
    Read {
        path: PathBuf,
        source: csv::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("failed to create a temporary file in `{}` at {location}: {source}", path.display()))]
    CreateTemporary {
        path: PathBuf,
        source: io::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("failed to write rows for `{}` at {location}: {source}", path.display()))]
    Write {
        path: PathBuf,
        source: csv::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("failed to flush rows for `{}` at {location}: {source}", path.display()))]
    Flush {
        path: PathBuf,
        source: io::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("failed to carry over permissions of `{}` at {location}: {source}", path.display()))]
    Permissions {
        path: PathBuf,
        source: io::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("failed to replace `{}` at {location}: {source}", path.display()))]
    Persist {
        path: PathBuf,
        source: tempfile::PersistError,
        #[snafu(implicit)]
        location: Location,
    },
}

impl Located for StorageError {
    fn location(&self) -> Location {
        match self {
            StorageError::CreateDirectory { location, .. }
            | StorageError::Open { location, .. }
            | StorageError::Read { location, .. }
            | StorageError::CreateTemporary { location, .. }
            | StorageError::Write { location, .. }
            | StorageError::Flush { location, .. }
            | StorageError::Permissions { location, .. }
            | StorageError::Persist { location, .. } => *location,
        }
    }
}
