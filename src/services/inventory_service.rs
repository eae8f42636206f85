// src/services/inventory_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::InventoryRepository,
    models::inventory::{InventoryLevel, LevelChange, MovementCause, MovementReport, MovementSummary, WriteOptions},
};

/// Livro-razão de estoque. Toda alteração de saldo passa por aqui.
#[derive(Clone)]
pub struct InventoryService {
    inventory_repo: Arc<dyn InventoryRepository>,
}

impl InventoryService {
    pub fn new(inventory_repo: Arc<dyn InventoryRepository>) -> Self {
        Self { inventory_repo }
    }

    // --- ENTRADA (soma ao saldo, sempre auditada) ---
    pub async fn apply_delta(
        &self,
        store_id: Uuid,
        product_id: Uuid,
        delta: i64,
        cause: &MovementCause,
    ) -> Result<LevelChange, AppError> {
        let change = self
            .inventory_repo
            .apply_delta(store_id, product_id, delta, cause, WriteOptions::audited())
            .await?;

        tracing::debug!(
            %store_id,
            %product_id,
            previous = change.previous_quantity,
            current = change.level.quantity,
            movement_id = ?change.movement.as_ref().map(|m| m.id),
            "Saldo incrementado"
        );
        Ok(change)
    }

    // --- CONTAGEM (sobrescreve o saldo) ---
    // A contagem já é a verdade; não gera movimentação.
    pub async fn set_snapshot(
        &self,
        store_id: Uuid,
        product_id: Uuid,
        quantity: i64,
        cause: &MovementCause,
    ) -> Result<LevelChange, AppError> {
        if quantity < 0 {
            return Err(AppError::RowValidation(format!(
                "quantidade {quantity} não pode ser negativa"
            )));
        }
        self.inventory_repo
            .set_quantity(store_id, product_id, quantity, cause, WriteOptions::skip_audit())
            .await
    }

    pub async fn list_levels(&self, store_id: Uuid) -> Result<Vec<InventoryLevel>, AppError> {
        self.inventory_repo.list_levels(store_id).await
    }

    pub async fn movements(&self, store_id: Uuid, product_id: Uuid) -> Result<MovementReport, AppError> {
        // O resumo sai da mesma leitura, então sempre bate com a lista.
        let movements = self.inventory_repo.list_movements(store_id, product_id).await?;
        let summary = MovementSummary::from_movements(&movements);
        Ok(MovementReport { summary, movements })
    }
}
