// src/models/receipt.rs

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::error::RowErrorKind;

// --- Estados do Recebimento ---
// pending -> processing -> completed | partially_failed | failed
// pending -> cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "receipt_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReceiptStatus {
    Pending,
    Processing,
    Completed,
    PartiallyFailed,
    Failed,
    Cancelled,
}

impl ReceiptStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReceiptStatus::Pending => "pending",
            ReceiptStatus::Processing => "processing",
            ReceiptStatus::Completed => "completed",
            ReceiptStatus::PartiallyFailed => "partially_failed",
            ReceiptStatus::Failed => "failed",
            ReceiptStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ReceiptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockReceipt {
    pub id: Uuid,
    pub store_id: Uuid,
    pub supplier_id: Uuid,
    pub status: ReceiptStatus,
    pub total_items: i32,
    #[schema(example = "25.00")]
    pub total_cost: Decimal,
    pub failed_items: i32,
    pub receipt_date: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Itens são imutáveis depois que o recebimento sai de `pending`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockReceiptItem {
    pub id: Uuid,
    pub receipt_id: Uuid,
    pub product_id: Uuid,
    // Ordem de inserção dentro do recebimento (1, 2, 3...)
    pub position: i32,
    pub quantity: i64,
    #[schema(example = "2.50")]
    pub unit_cost: Decimal,
    pub total_cost: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptDetail {
    #[serde(flatten)]
    pub header: StockReceipt,
    pub items: Vec<StockReceiptItem>,
}

/// Falha de um item durante o processamento.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemFailure {
    pub position: i32,
    pub product_id: Uuid,
    pub kind: RowErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptProcessing {
    pub receipt: StockReceipt,
    pub applied_items: usize,
    pub failures: Vec<ItemFailure>,
}

/// Linha de um recebimento manual.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLine {
    pub product_id: Uuid,
    #[schema(example = 10)]
    pub quantity: i64,
    #[serde(default)]
    #[schema(example = "2.50")]
    pub unit_cost: Decimal,
}
