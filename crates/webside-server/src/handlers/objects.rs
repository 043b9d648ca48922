//! Object routes: pinned objects and slot paths

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde_json::Value;
use tracing::warn;
use webside_engine::{IndexRange, PinRequest};

use crate::error::ApiError;
use crate::state::AppState;

type JsonResult = Result<Json<Value>, ApiError>;

/// `GET /objects`
pub async fn pinned_objects(State(state): State<AppState>) -> JsonResult {
    state.run(|inspector| Ok(inspector.pinned_objects())).map(Json)
}

/// `GET /objects/{id}`
pub async fn pinned_object(State(state): State<AppState>, Path(id): Path<String>) -> JsonResult {
    state.run(|inspector| inspector.pinned_object(&id)).map(Json)
}

/// `GET /objects/{id}/{*path}`; `from`/`to` bound `indexed-slots` listings
pub async fn pinned_object_path(
    State(state): State<AppState>,
    Path((id, path)): Path<(String, String)>,
    Query(range): Query<IndexRange>,
) -> JsonResult {
    state
        .run(|inspector| inspector.pinned_object_path(&id, &path, range))
        .map(Json)
}

/// `DELETE /objects/{id}`; answers the removed id
pub async fn unpin(State(state): State<AppState>, Path(id): Path<String>) -> Result<String, ApiError> {
    state.run(|inspector| inspector.unpin(&id))
}

/// `POST /objects` with `{"uri": ".../objects/<id>/<path...>"}`
///
/// A body that is not a JSON object is treated as one without `uri`.
pub async fn pin_object(State(state): State<AppState>, body: Bytes) -> JsonResult {
    let request: PinRequest = serde_json::from_slice(&body).unwrap_or_else(|err| {
        warn!(error = %err, "unreadable pin request body");
        PinRequest::default()
    });
    state.run(|inspector| inspector.pin_object(&request)).map(Json)
}
