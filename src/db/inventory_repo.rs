// src/db/inventory_repo.rs

use async_trait::async_trait;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::inventory::{
        InventoryLevel, InventoryMovement, LevelChange, MovementCause, WriteOptions,
    },
};

/// Saldo atual e livro-razão. As duas escritas (`apply_delta` e `set_quantity`)
/// são as únicas portas de mutação do saldo.
#[async_trait]
pub trait InventoryRepository: Send + Sync {
    async fn list_levels(&self, store_id: Uuid) -> Result<Vec<InventoryLevel>, AppError>;

    /// Soma `delta` ao saldo (criando a linha com 0 se não existir) e grava a
    /// movimentação na mesma transação, salvo `skip_audit`.
    async fn apply_delta(
        &self,
        store_id: Uuid,
        product_id: Uuid,
        delta: i64,
        cause: &MovementCause,
        options: WriteOptions,
    ) -> Result<LevelChange, AppError>;

    /// Sobrescreve o saldo com um valor absoluto.
    async fn set_quantity(
        &self,
        store_id: Uuid,
        product_id: Uuid,
        quantity: i64,
        cause: &MovementCause,
        options: WriteOptions,
    ) -> Result<LevelChange, AppError>;

    async fn list_movements(&self, store_id: Uuid, product_id: Uuid) -> Result<Vec<InventoryMovement>, AppError>;
}

#[derive(Clone)]
pub struct PgInventoryRepository {
    pool: PgPool,
}

impl PgInventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Registra uma movimentação no livro-razão (somente INSERT).
    async fn record_movement<'e, E>(
        executor: E,
        store_id: Uuid,
        product_id: Uuid,
        cause: &MovementCause,
        previous_quantity: i64,
        new_quantity: i64,
    ) -> Result<InventoryMovement, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let movement = sqlx::query_as::<_, InventoryMovement>(
            r#"
            INSERT INTO inventory_movements (
                store_id, product_id, movement_type, quantity_change,
                previous_quantity, new_quantity, reference_id, reference_type
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
            .bind(store_id)
            .bind(product_id)
            .bind(cause.movement_type)
            .bind(new_quantity - previous_quantity)
            .bind(previous_quantity)
            .bind(new_quantity)
            .bind(cause.reference_id)
            .bind(cause.reference_type)
            .fetch_one(executor)
            .await?;

        Ok(movement)
    }
}

#[async_trait]
impl InventoryRepository for PgInventoryRepository {
    async fn list_levels(&self, store_id: Uuid) -> Result<Vec<InventoryLevel>, AppError> {
        let levels = sqlx::query_as::<_, InventoryLevel>(
            "SELECT * FROM current_inventory WHERE store_id = $1 ORDER BY updated_at DESC",
        )
            .bind(store_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(levels)
    }

    async fn apply_delta(
        &self,
        store_id: Uuid,
        product_id: Uuid,
        delta: i64,
        cause: &MovementCause,
        options: WriteOptions,
    ) -> Result<LevelChange, AppError> {
        let mut tx = self.pool.begin().await?;

        // "UPSERT" atômico: a constraint (store_id, product_id) serializa
        // entregas concorrentes para o mesmo produto.
        let level = sqlx::query_as::<_, InventoryLevel>(
            r#"
            INSERT INTO current_inventory (store_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (store_id, product_id)
            DO UPDATE SET
                quantity = current_inventory.quantity + EXCLUDED.quantity,
                updated_at = NOW()
            RETURNING *
            "#,
        )
            .bind(store_id)
            .bind(product_id)
            .bind(delta)
            .fetch_one(&mut *tx)
            .await?;

        // A linha fica travada até o commit, então o valor anterior é exato.
        let previous_quantity = level.quantity - delta;

        let movement = if options.skip_audit {
            None
        } else {
            Some(
                Self::record_movement(&mut *tx, store_id, product_id, cause, previous_quantity, level.quantity)
                    .await?,
            )
        };

        tx.commit().await?;

        Ok(LevelChange { level, previous_quantity, movement })
    }

    async fn set_quantity(
        &self,
        store_id: Uuid,
        product_id: Uuid,
        quantity: i64,
        cause: &MovementCause,
        options: WriteOptions,
    ) -> Result<LevelChange, AppError> {
        let mut tx = self.pool.begin().await?;

        // Trava a linha atual (se existir) para ler o saldo anterior.
        let previous: Option<(i64,)> = sqlx::query_as(
            "SELECT quantity FROM current_inventory WHERE store_id = $1 AND product_id = $2 FOR UPDATE",
        )
            .bind(store_id)
            .bind(product_id)
            .fetch_optional(&mut *tx)
            .await?;
        let previous_quantity = previous.map(|(q,)| q).unwrap_or(0);

        let level = sqlx::query_as::<_, InventoryLevel>(
            r#"
            INSERT INTO current_inventory (store_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (store_id, product_id)
            DO UPDATE SET
                quantity = EXCLUDED.quantity,
                updated_at = NOW()
            RETURNING *
            "#,
        )
            .bind(store_id)
            .bind(product_id)
            .bind(quantity)
            .fetch_one(&mut *tx)
            .await?;

        let movement = if options.skip_audit || previous_quantity == level.quantity {
            None
        } else {
            Some(
                Self::record_movement(&mut *tx, store_id, product_id, cause, previous_quantity, level.quantity)
                    .await?,
            )
        };

        tx.commit().await?;

        Ok(LevelChange { level, previous_quantity, movement })
    }

    async fn list_movements(&self, store_id: Uuid, product_id: Uuid) -> Result<Vec<InventoryMovement>, AppError> {
        let movements = sqlx::query_as::<_, InventoryMovement>(
            r#"
            SELECT * FROM inventory_movements
            WHERE store_id = $1 AND product_id = $2
            ORDER BY created_at ASC
            "#,
        )
            .bind(store_id)
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(movements)
    }
}
