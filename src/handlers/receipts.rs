// src/handlers/receipts.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::receipt::{ReceiptDetail, ReceiptLine, ReceiptProcessing, StockReceipt},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReceiptPayload {
    pub supplier_id: Uuid,

    #[validate(length(min = 1, message = "Informe ao menos um item."))]
    pub items: Vec<ReceiptLine>,
}

// POST /api/stores/{store_id}/receipts
#[utoipa::path(
    post,
    path = "/api/stores/{store_id}/receipts",
    tag = "Receipts",
    request_body = CreateReceiptPayload,
    responses(
        (status = 201, description = "Recebimento criado em 'pending'", body = ReceiptDetail),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Fornecedor ou produto não encontrado")
    ),
    params(
        ("store_id" = Uuid, Path, description = "ID da loja")
    )
)]
pub async fn create_receipt(
    State(app_state): State<AppState>,
    Path(store_id): Path<Uuid>,
    Json(payload): Json<CreateReceiptPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let detail = app_state
        .services
        .receipts
        .create_manual(store_id, payload.supplier_id, &payload.items)
        .await?;

    Ok((StatusCode::CREATED, Json(detail)))
}

// GET /api/receipts/{receipt_id}
#[utoipa::path(
    get,
    path = "/api/receipts/{receipt_id}",
    tag = "Receipts",
    responses(
        (status = 200, description = "Recebimento com itens", body = ReceiptDetail),
        (status = 404, description = "Recebimento não encontrado")
    ),
    params(
        ("receipt_id" = Uuid, Path, description = "ID do recebimento")
    )
)]
pub async fn get_receipt(
    State(app_state): State<AppState>,
    Path(receipt_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let detail = app_state.services.receipts.get(receipt_id).await?;
    Ok((StatusCode::OK, Json(detail)))
}

// POST /api/receipts/{receipt_id}/process
#[utoipa::path(
    post,
    path = "/api/receipts/{receipt_id}/process",
    tag = "Receipts",
    responses(
        (status = 200, description = "Itens aplicados ao saldo", body = ReceiptProcessing),
        (status = 404, description = "Recebimento não encontrado"),
        (status = 409, description = "Recebimento não está em 'pending'")
    ),
    params(
        ("receipt_id" = Uuid, Path, description = "ID do recebimento")
    )
)]
pub async fn process_receipt(
    State(app_state): State<AppState>,
    Path(receipt_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let processing = app_state.services.receipts.process(receipt_id).await?;
    Ok((StatusCode::OK, Json(processing)))
}

// POST /api/receipts/{receipt_id}/cancel
#[utoipa::path(
    post,
    path = "/api/receipts/{receipt_id}/cancel",
    tag = "Receipts",
    responses(
        (status = 200, description = "Recebimento cancelado", body = StockReceipt),
        (status = 404, description = "Recebimento não encontrado"),
        (status = 409, description = "Recebimento não está em 'pending'")
    ),
    params(
        ("receipt_id" = Uuid, Path, description = "ID do recebimento")
    )
)]
pub async fn cancel_receipt(
    State(app_state): State<AppState>,
    Path(receipt_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let receipt = app_state.services.receipts.cancel(receipt_id).await?;
    Ok((StatusCode::OK, Json(receipt)))
}
