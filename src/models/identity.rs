// src/models/identity.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "discovery_method", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryMethod {
    Direct,
    SearchPrimary,
    SearchSecondary,
    Manual,
}

impl DiscoveryMethod {
    /// Confiança padrão (0-100) quando quem chama não informa uma.
    pub fn default_confidence(self) -> i16 {
        match self {
            DiscoveryMethod::Direct | DiscoveryMethod::Manual => 100,
            DiscoveryMethod::SearchPrimary => 85,
            DiscoveryMethod::SearchSecondary => 70,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExternalIds {
    pub external_product_id: Option<String>,
    pub external_variant_id: Option<String>,
    pub external_inventory_item_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExternalIdentityMapping {
    pub id: Uuid,
    pub barcode: String,
    pub external_product_id: Option<String>,
    pub external_variant_id: Option<String>,
    pub external_inventory_item_id: Option<String>,
    pub discovery_method: DiscoveryMethod,
    #[schema(example = 85)]
    pub confidence_score: i16,
    pub last_verified_at: DateTime<Utc>,
    pub verification_count: i32,
    pub search_time_ms: Option<i32>,
}

// Parâmetros de um upsert, já normalizados pelo serviço.
#[derive(Debug, Clone)]
pub struct IdentityUpsert {
    pub barcode: String,
    pub ids: ExternalIds,
    pub discovery_method: DiscoveryMethod,
    pub confidence_score: i16,
    pub search_time_ms: Option<i32>,
}
