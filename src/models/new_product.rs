// src/models/new_product.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewProductLogEntry {
    pub id: Uuid,
    pub product_id: Uuid,
    pub supplier_id: Option<Uuid>,
    pub receipt_id: Option<Uuid>,
    pub barcode: String,
    pub name: String,
    pub detected_at: DateTime<Utc>,
    pub is_exported: bool,
    pub exported_at: Option<DateTime<Utc>>,
}

// De onde veio o primeiro avistamento de um produto.
#[derive(Debug, Clone, Copy, Default)]
pub struct SightingOrigin {
    pub supplier_id: Option<Uuid>,
    pub receipt_id: Option<Uuid>,
}

// Formato consumido pela exportação (barcode,name,supplier,detected_at).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExportedNewProduct {
    pub barcode: String,
    pub name: String,
    pub supplier_name: Option<String>,
    pub detected_at: DateTime<Utc>,
}
