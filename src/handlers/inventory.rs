// src/handlers/inventory.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    models::inventory::{InventoryLevel, MovementReport},
};

// GET /api/stores/{store_id}/inventory
#[utoipa::path(
    get,
    path = "/api/stores/{store_id}/inventory",
    tag = "Inventory",
    responses(
        (status = 200, description = "Saldo atual de cada produto da loja", body = Vec<InventoryLevel>)
    ),
    params(
        ("store_id" = Uuid, Path, description = "ID da loja")
    )
)]
pub async fn list_inventory(
    State(app_state): State<AppState>,
    Path(store_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let levels = app_state.services.inventory.list_levels(store_id).await?;
    Ok((StatusCode::OK, Json(levels)))
}

// GET /api/stores/{store_id}/products/{product_id}/movements
#[utoipa::path(
    get,
    path = "/api/stores/{store_id}/products/{product_id}/movements",
    tag = "Inventory",
    responses(
        (status = 200, description = "Movimentações e resumo agregado", body = MovementReport)
    ),
    params(
        ("store_id" = Uuid, Path, description = "ID da loja"),
        ("product_id" = Uuid, Path, description = "ID do produto")
    )
)]
pub async fn list_movements(
    State(app_state): State<AppState>,
    Path((store_id, product_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let report = app_state.services.inventory.movements(store_id, product_id).await?;
    Ok((StatusCode::OK, Json(report)))
}
