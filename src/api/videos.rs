use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use snafu::ResultExt as _;
use tracing::instrument;

use super::{
    App, BodySnafu, InvalidQuerySnafu, MessageResponse, PathSnafu, QuerySnafu, Result,
    VideoEnvelope, VideoList,
};
use crate::model::{ListQuery, Video, VideoDraft, VideoId};

/// Raw listing parameters. Values are checked by [ListQuery::parse] so that an
/// unknown value is reported with the accepted ones.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

type VideoBody = std::result::Result<Json<VideoEnvelope<VideoDraft>>, JsonRejection>;
type VideoPath = std::result::Result<Path<VideoId>, PathRejection>;

#[instrument(skip(app))]
pub async fn list(
    State(app): State<App>,
    params: std::result::Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<VideoList>> {
    let Query(params) = params.context(QuerySnafu)?;
    let query = ListQuery::parse(params.sort_by.as_deref(), params.order.as_deref())
        .context(InvalidQuerySnafu)?;

    let videos = app.run(move |store| store.list(&query)).await?;

    Ok(Json(VideoList::new(videos)))
}

#[instrument(skip(app))]
pub async fn create(
    State(app): State<App>,
    body: VideoBody,
) -> Result<(StatusCode, Json<VideoEnvelope<Video>>)> {
    let Json(VideoEnvelope { video }) = body.context(BodySnafu)?;

    let video = app.run(move |store| store.create(video)).await?;

    Ok((StatusCode::CREATED, Json(VideoEnvelope::new(video))))
}

#[instrument(skip(app))]
pub async fn get(State(app): State<App>, id: VideoPath) -> Result<Json<VideoEnvelope<Video>>> {
    let Path(id) = id.context(PathSnafu)?;

    let video = app.run(move |store| store.get(id)).await?;

    Ok(Json(VideoEnvelope::new(video)))
}

#[instrument(skip(app))]
pub async fn update(
    State(app): State<App>,
    id: VideoPath,
    body: VideoBody,
) -> Result<Json<VideoEnvelope<Video>>> {
    let Path(id) = id.context(PathSnafu)?;
    let Json(VideoEnvelope { video }) = body.context(BodySnafu)?;

    let video = app.run(move |store| store.update(id, video)).await?;

    Ok(Json(VideoEnvelope::new(video)))
}

#[instrument(skip(app))]
pub async fn delete(State(app): State<App>, id: VideoPath) -> Result<Json<MessageResponse>> {
    let Path(id) = id.context(PathSnafu)?;

    app.run(move |store| store.delete(id)).await?;

    Ok(Json(MessageResponse::new(format!(
        "Video with ID {id} deleted successfully"
    ))))
}
