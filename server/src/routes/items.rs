//! Item endpoint routes.
//!
//! Responses carry the stored row; connected clients learn about the change
//! separately through the notification channel.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use plank_engine::{NewRecord, Record, RecordId};

use crate::db;
use crate::error::{AppError, Result};
use crate::AppState;

/// Column width of `items.name`.
const MAX_NAME_LEN: usize = 255;

/// Create item routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/items", get(list_handler).post(create_handler))
        .route(
            "/api/items/{id}",
            get(get_handler).put(update_handler).delete(delete_handler),
        )
}

fn not_found() -> AppError {
    AppError::NotFound("Item not found".to_string())
}

/// Trim the name and reject what the table would not accept.
fn validate(item: NewRecord) -> Result<NewRecord> {
    let name = item.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name must not be empty".to_string()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::BadRequest(format!(
            "name must be at most {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(NewRecord::new(name, item.value))
}

/// GET /api/items - All items, newest first.
async fn list_handler(State(state): State<AppState>) -> Result<Json<Vec<Record>>> {
    let items = db::list_items(&state.pool).await?;
    Ok(Json(items))
}

/// GET /api/items/{id}
async fn get_handler(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<Json<Record>> {
    let item = db::get_item(&state.pool, id).await?.ok_or_else(not_found)?;
    Ok(Json(item))
}

/// POST /api/items - Create an item.
async fn create_handler(
    State(state): State<AppState>,
    Json(item): Json<NewRecord>,
) -> Result<(StatusCode, Json<Record>)> {
    let item = validate(item)?;
    let created = db::create_item(&state.pool, &item).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/items/{id} - Replace name and value.
async fn update_handler(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
    Json(item): Json<NewRecord>,
) -> Result<Json<Record>> {
    let item = validate(item)?;
    let updated = db::update_item(&state.pool, id, &item)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(updated))
}

/// DELETE /api/items/{id}
async fn delete_handler(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<StatusCode> {
    if db::delete_item(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found())
    }
}
