// src/handlers/suppliers.rs

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
    models::{catalog::Supplier, mapping::SupplierMappingConfig},
};

// ---
// Payload
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSupplierPayload {
    #[validate(length(min = 1, max = 255, message = "O nome do fornecedor é obrigatório."))]
    #[schema(example = "Acme Distribuidora")]
    pub name: String,

    // Apelidos de coluna próprios deste fornecedor (opcional)
    pub column_alias_sets: Option<SupplierMappingConfig>,
}

// GET /api/suppliers
#[utoipa::path(
    get,
    path = "/api/suppliers",
    tag = "Suppliers",
    responses(
        (status = 200, description = "Fornecedores cadastrados", body = Vec<Supplier>)
    )
)]
pub async fn list_suppliers(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let suppliers = app_state.services.suppliers.list_suppliers().await?;
    Ok((StatusCode::OK, Json(suppliers)))
}

// POST /api/suppliers
#[utoipa::path(
    post,
    path = "/api/suppliers",
    tag = "Suppliers",
    request_body = CreateSupplierPayload,
    responses(
        (status = 201, description = "Fornecedor criado", body = Supplier),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "Já existe um fornecedor com esse nome")
    )
)]
pub async fn create_supplier(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateSupplierPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let supplier = app_state
        .services
        .suppliers
        .create_supplier(&payload.name, payload.column_alias_sets)
        .await?;

    Ok((StatusCode::CREATED, Json(supplier)))
}

// GET /api/stores/{store_id}/column-mapping
#[utoipa::path(
    get,
    path = "/api/stores/{store_id}/column-mapping",
    tag = "Suppliers",
    responses(
        (status = 200, description = "Apelidos de coluna da loja (ou o padrão genérico)", body = SupplierMappingConfig)
    ),
    params(
        ("store_id" = Uuid, Path, description = "ID da loja")
    )
)]
pub async fn get_store_mapping(
    State(app_state): State<AppState>,
    Path(store_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let config = app_state.services.suppliers.store_mapping(store_id).await?;
    Ok((StatusCode::OK, Json(config)))
}

// PUT /api/stores/{store_id}/column-mapping
#[utoipa::path(
    put,
    path = "/api/stores/{store_id}/column-mapping",
    tag = "Suppliers",
    request_body = SupplierMappingConfig,
    responses(
        (status = 200, description = "Mapeamento salvo", body = SupplierMappingConfig),
        (status = 400, description = "Mapeamento vazio")
    ),
    params(
        ("store_id" = Uuid, Path, description = "ID da loja")
    )
)]
pub async fn put_store_mapping(
    State(app_state): State<AppState>,
    Path(store_id): Path<Uuid>,
    Json(config): Json<SupplierMappingConfig>,
) -> Result<impl IntoResponse, AppError> {
    let saved = app_state.services.suppliers.save_store_mapping(store_id, &config).await?;
    tracing::info!(%store_id, "Mapeamento de colunas da loja atualizado");
    Ok((StatusCode::OK, Json(saved)))
}
