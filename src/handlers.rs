use crate::errors::AppError;
use crate::models::{
    DeleteResponse, DeriveQuery, EntriesResponse, EntryResponse, StatsResponse, UpdateRequest,
};
use crate::state::AppState;
use crate::stats::build_stats;
use crate::timezone::DerivedTimes;
use axum::{
    extract::{Path, Query, State},
    Json,
};

pub async fn list_entries(State(state): State<AppState>) -> Json<EntriesResponse> {
    let store = state.store.lock().await;
    Json(EntriesResponse {
        success: true,
        data: store.entries().to_vec(),
    })
}

pub async fn add_entry(State(state): State<AppState>) -> Result<Json<EntryResponse>, AppError> {
    let mut store = state.store.lock().await;
    let entry = store.add().await?;
    Ok(Json(EntryResponse {
        success: true,
        entry,
    }))
}

pub async fn update_entry(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateRequest>,
) -> Result<Json<EntryResponse>, AppError> {
    let mut store = state.store.lock().await;
    let entry = store
        .update(id, payload.field, &payload.value)
        .await?
        .ok_or_else(|| AppError::not_found(format!("entry {id} not found")))?;

    Ok(Json(EntryResponse {
        success: true,
        entry,
    }))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteResponse>, AppError> {
    let mut store = state.store.lock().await;
    if !store.delete(id).await? {
        return Err(AppError::not_found(format!("entry {id} not found")));
    }

    Ok(Json(DeleteResponse { success: true, id }))
}

pub async fn reload(State(state): State<AppState>) -> Json<EntriesResponse> {
    let mut store = state.store.lock().await;
    store.load().await;
    Json(EntriesResponse {
        success: true,
        data: store.entries().to_vec(),
    })
}

pub async fn get_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let store = state.store.lock().await;
    Json(build_stats(store.entries()))
}

pub async fn derive(
    State(state): State<AppState>,
    Query(query): Query<DeriveQuery>,
) -> Result<Json<DerivedTimes>, AppError> {
    Ok(Json(state.deriver.derive(&query.local)?))
}
