use derive_new::new;
use serde::{Deserialize, Serialize};
use snafu::{ensure, OptionExt as _};

use super::{BlankFieldSnafu, NegativeViewsSnafu, PostDate, ValidationError};

/// Client-assigned identifier of a video.
pub type VideoId = i64;

/// A tracked video whose fields have all passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    pub id: VideoId,
    pub name: String,
    pub href: String,
    pub post_date: PostDate,
    pub views_count: u64,
}

impl Video {
    /// Returns the same video stored under another identifier.
    pub fn with_id(self, id: VideoId) -> Self {
        Self { id, ..self }
    }
}

/// A video as submitted by a client or read from a row, before any field has
/// been checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct VideoDraft {
    pub id: VideoId,
    pub name: String,
    pub href: String,
    pub post_date: String,
    pub views_count: i64,
}

impl VideoDraft {
    /// Checks every field and reports the first one that is invalid.
    pub fn validate(self) -> Result<Video, ValidationError> {
        ensure!(!self.name.trim().is_empty(), BlankFieldSnafu { field: "name" });
        ensure!(!self.href.trim().is_empty(), BlankFieldSnafu { field: "href" });

        let post_date = self.post_date.parse()?;
        let views_count = u64::try_from(self.views_count)
            .ok()
            .context(NegativeViewsSnafu {
                value: self.views_count,
            })?;

        Ok(Video {
            id: self.id,
            name: self.name,
            href: self.href,
            post_date,
            views_count,
        })
    }
}
