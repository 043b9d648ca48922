//! Code routes: dialect, classes, methods

use axum::extract::{Path, Query, State};
use axum::Json;
use serde_json::Value;
use webside_engine::{ClassesQuery, MethodQuery};

use crate::error::ApiError;
use crate::state::AppState;

type JsonResult = Result<Json<Value>, ApiError>;

/// `GET /dialect`
pub async fn dialect(State(state): State<AppState>) -> Result<String, ApiError> {
    state.run(|inspector| Ok(inspector.dialect()))
}

/// `GET /classes[?root&tree&depth&names]`
pub async fn classes(State(state): State<AppState>, Query(query): Query<ClassesQuery>) -> JsonResult {
    state.run(|inspector| inspector.classes(&query)).map(Json)
}

/// `GET /classes/{name}`
pub async fn class_definition(State(state): State<AppState>, Path(name): Path<String>) -> JsonResult {
    state.run(|inspector| inspector.class_definition(&name)).map(Json)
}

/// `GET /classes/{name}/variables`
pub async fn variables(State(state): State<AppState>, Path(name): Path<String>) -> JsonResult {
    state.run(|inspector| inspector.variables(&name)).map(Json)
}

/// `GET /classes/{name}/instance-variables`
pub async fn instance_variables(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> JsonResult {
    state.run(|inspector| inspector.instance_variables(&name)).map(Json)
}

/// `GET /classes/{name}/class-variables`
pub async fn class_variables(State(state): State<AppState>, Path(name): Path<String>) -> JsonResult {
    state.run(|inspector| inspector.class_variables(&name)).map(Json)
}

/// `GET /classes/{name}/subclasses`
pub async fn subclasses(State(state): State<AppState>, Path(name): Path<String>) -> JsonResult {
    state.run(|inspector| inspector.subclasses(&name)).map(Json)
}

/// `GET /classes/{name}/categories`
pub async fn categories(State(state): State<AppState>, Path(name): Path<String>) -> JsonResult {
    state.run(|inspector| inspector.categories(&name)).map(Json)
}

/// `GET /classes/{name}/used-categories`
pub async fn used_categories(State(state): State<AppState>, Path(name): Path<String>) -> JsonResult {
    state.run(|inspector| inspector.used_categories(&name)).map(Json)
}

/// `GET /classes/{name}/methods[?selector&sending&...]`
pub async fn class_methods(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<MethodQuery>,
) -> JsonResult {
    state
        .run(|inspector| inspector.methods(&query, Some(&name)))
        .map(Json)
}

/// `GET /methods[?selector&sending&referencingClass&class&category&accessing&scope]`
pub async fn methods(State(state): State<AppState>, Query(query): Query<MethodQuery>) -> JsonResult {
    state.run(|inspector| inspector.methods(&query, None)).map(Json)
}

/// `GET /usual-categories`
pub async fn usual_categories(State(state): State<AppState>) -> JsonResult {
    state.run(|inspector| Ok(inspector.usual_categories())).map(Json)
}
