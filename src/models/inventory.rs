// src/models/inventory.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- 1. Saldo Atual ---
// Uma linha por (loja, produto). `available_quantity` é coluna gerada no banco,
// nunca escrita diretamente.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryLevel {
    pub id: Uuid,
    pub store_id: Uuid,
    pub product_id: Uuid,
    #[schema(example = 15)]
    pub quantity: i64,
    pub reserved_quantity: i64,
    pub available_quantity: i64,
    pub updated_at: DateTime<Utc>,
}

// --- 2. Movimentações (livro-razão) ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "movement_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    Receipt,    // Entrada de fornecedor
    Adjustment, // Acerto por contagem (snapshot auditado)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "movement_reference_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReferenceType {
    StockReceipt,
    StockUpload,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryMovement {
    pub id: Uuid,
    pub store_id: Uuid,
    pub product_id: Uuid,
    pub movement_type: MovementType,
    pub quantity_change: i64,
    pub previous_quantity: i64,
    pub new_quantity: i64,
    pub reference_id: Option<Uuid>,
    pub reference_type: ReferenceType,
    pub created_at: DateTime<Utc>,
}

/// A "causa" de uma alteração de saldo, gravada em cada movimentação.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovementCause {
    pub movement_type: MovementType,
    pub reference_type: ReferenceType,
    pub reference_id: Option<Uuid>,
}

impl MovementCause {
    pub fn receipt(receipt_id: Uuid) -> Self {
        Self {
            movement_type: MovementType::Receipt,
            reference_type: ReferenceType::StockReceipt,
            reference_id: Some(receipt_id),
        }
    }

    pub fn snapshot_upload(upload_id: Uuid) -> Self {
        Self {
            movement_type: MovementType::Adjustment,
            reference_type: ReferenceType::StockUpload,
            reference_id: Some(upload_id),
        }
    }
}

/// Opções explícitas de escrita. Substitui a antiga variável de sessão
/// que desligava a auditoria.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    pub skip_audit: bool,
}

impl WriteOptions {
    pub fn audited() -> Self {
        Self { skip_audit: false }
    }

    pub fn skip_audit() -> Self {
        Self { skip_audit: true }
    }
}

/// Resultado de uma escrita no saldo.
#[derive(Debug, Clone)]
pub struct LevelChange {
    pub level: InventoryLevel,
    pub previous_quantity: i64,
    pub movement: Option<InventoryMovement>,
}

// --- 3. Resumo agregado do livro-razão ---
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MovementSummary {
    pub total_in: i64,
    pub total_out: i64,
    pub net_change: i64,
    pub movement_count: i64,
}

impl MovementSummary {
    pub fn from_movements(movements: &[InventoryMovement]) -> Self {
        movements.iter().fold(Self::default(), |mut acc, m| {
            if m.quantity_change >= 0 {
                acc.total_in += m.quantity_change;
            } else {
                acc.total_out += -m.quantity_change;
            }
            acc.net_change += m.quantity_change;
            acc.movement_count += 1;
            acc
        })
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MovementReport {
    pub summary: MovementSummary,
    pub movements: Vec<InventoryMovement>,
}
