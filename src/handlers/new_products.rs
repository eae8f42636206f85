// src/handlers/new_products.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{common::error::AppError, config::AppState, models::new_product::ExportedNewProduct};

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ExportParams {
    // Sem filtro, exporta os pendentes de todos os fornecedores
    pub supplier_id: Option<Uuid>,
}

// POST /api/new-products/export
#[utoipa::path(
    post,
    path = "/api/new-products/export",
    tag = "New Products",
    responses(
        (status = 200, description = "Produtos novos pendentes, agora marcados como exportados", body = Vec<ExportedNewProduct>)
    ),
    params(ExportParams)
)]
pub async fn export_new_products(
    State(app_state): State<AppState>,
    Query(params): Query<ExportParams>,
) -> Result<impl IntoResponse, AppError> {
    let exported = app_state.services.new_products.export_pending(params.supplier_id).await?;
    Ok((StatusCode::OK, Json(exported)))
}
