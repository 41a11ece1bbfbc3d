use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::model::Video;

/// A single video, wrapped as `{"video": ...}` in both requests and responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct VideoEnvelope<T> {
    pub video: T,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct VideoList {
    pub videos: Vec<Video>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct MessageResponse {
    pub message: String,
}
