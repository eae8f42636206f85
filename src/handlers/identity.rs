// src/handlers/identity.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::identity::{DiscoveryMethod, ExternalIdentityMapping, ExternalIds},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpsertMappingPayload {
    #[serde(flatten)]
    pub ids: ExternalIds,

    pub discovery_method: DiscoveryMethod,

    // Sem valor, usa o padrão do método de descoberta
    #[validate(range(min = 0, max = 100, message = "A confiança deve estar entre 0 e 100."))]
    pub confidence_score: Option<i16>,

    #[validate(range(min = 0, message = "O tempo de busca não pode ser negativo."))]
    pub search_time_ms: Option<i32>,
}

// GET /api/identity-mappings/{barcode}
#[utoipa::path(
    get,
    path = "/api/identity-mappings/{barcode}",
    tag = "Identity",
    responses(
        (status = 200, description = "Mapeamento do código de barras", body = ExternalIdentityMapping),
        (status = 404, description = "Código ainda não mapeado")
    ),
    params(
        ("barcode" = String, Path, description = "Código de barras")
    )
)]
pub async fn get_mapping(
    State(app_state): State<AppState>,
    Path(barcode): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let mapping = app_state.services.identity.lookup(&barcode).await?;
    Ok((StatusCode::OK, Json(mapping)))
}

// PUT /api/identity-mappings/{barcode}
#[utoipa::path(
    put,
    path = "/api/identity-mappings/{barcode}",
    tag = "Identity",
    request_body = UpsertMappingPayload,
    responses(
        (status = 200, description = "Mapeamento gravado ou reconfirmado", body = ExternalIdentityMapping),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "Variante já mapeada para outro código de barras")
    ),
    params(
        ("barcode" = String, Path, description = "Código de barras")
    )
)]
pub async fn put_mapping(
    State(app_state): State<AppState>,
    Path(barcode): Path<String>,
    Json(payload): Json<UpsertMappingPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let mapping = app_state
        .services
        .identity
        .upsert(
            &barcode,
            payload.ids,
            payload.discovery_method,
            payload.confidence_score,
            payload.search_time_ms,
        )
        .await?;

    Ok((StatusCode::OK, Json(mapping)))
}
