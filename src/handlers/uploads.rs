// src/handlers/uploads.rs

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
    models::upload::{UploadMode, UploadOutcome, UploadSummary},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadPayload {
    // Conteúdo bruto do CSV (UTF-8, cabeçalho na primeira linha)
    #[schema(example = "barcode,quantity,unit_cost\n123,10,2.50")]
    pub csv_content: String,

    #[validate(length(max = 255, message = "O nome do fornecedor é longo demais."))]
    #[schema(example = "Acme")]
    pub supplier_name: Option<String>,

    pub supplier_id: Option<Uuid>,
}

// Arquivo recusado de início: `success = false` e o erro no corpo, com o status do erro.
fn upload_response(
    store_id: Uuid,
    mode: UploadMode,
    result: Result<UploadSummary, AppError>,
) -> (StatusCode, Json<UploadOutcome>) {
    match result {
        Ok(summary) => (StatusCode::OK, Json(UploadOutcome::completed(summary))),
        Err(e) => {
            tracing::warn!(%store_id, ?mode, error = %e, "Upload recusado");
            (e.status_code(), Json(UploadOutcome::rejected(&e)))
        }
    }
}

// POST /api/stores/{store_id}/uploads/current-stock
#[utoipa::path(
    post,
    path = "/api/stores/{store_id}/uploads/current-stock",
    tag = "Uploads",
    request_body = UploadPayload,
    responses(
        (status = 200, description = "Contagem aplicada (pode conter erros por linha)", body = UploadOutcome),
        (status = 400, description = "Arquivo vazio ou malformado", body = UploadOutcome),
        (status = 422, description = "Colunas obrigatórias ausentes", body = UploadOutcome)
    ),
    params(
        ("store_id" = Uuid, Path, description = "ID da loja")
    )
)]
pub async fn upload_current_stock(
    State(app_state): State<AppState>,
    Path(store_id): Path<Uuid>,
    Json(payload): Json<UploadPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let result = app_state
        .services
        .reconciliation
        .upload_current_stock(store_id, payload.csv_content.as_bytes())
        .await;

    Ok(upload_response(store_id, UploadMode::CurrentStock, result))
}

// POST /api/stores/{store_id}/uploads/supplier-delivery
#[utoipa::path(
    post,
    path = "/api/stores/{store_id}/uploads/supplier-delivery",
    tag = "Uploads",
    request_body = UploadPayload,
    responses(
        (status = 200, description = "Entrega aplicada (pode conter erros por linha)", body = UploadOutcome),
        (status = 400, description = "Arquivo vazio, malformado ou sem fornecedor", body = UploadOutcome),
        (status = 404, description = "Fornecedor não encontrado", body = UploadOutcome),
        (status = 422, description = "Colunas obrigatórias ausentes", body = UploadOutcome)
    ),
    params(
        ("store_id" = Uuid, Path, description = "ID da loja")
    )
)]
pub async fn upload_supplier_delivery(
    State(app_state): State<AppState>,
    Path(store_id): Path<Uuid>,
    Json(payload): Json<UploadPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let result = app_state
        .services
        .reconciliation
        .upload_supplier_delivery(
            store_id,
            payload.csv_content.as_bytes(),
            payload.supplier_name.as_deref(),
            payload.supplier_id,
        )
        .await;

    Ok(upload_response(store_id, UploadMode::SupplierDelivery, result))
}
