// src/db/receipt_repo.rs

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::receipt::{ReceiptLine, ReceiptStatus, StockReceipt, StockReceiptItem},
};

/// Cabeçalho e itens dos recebimentos. As transições são "compare-and-set":
/// quando o estado atual não é o esperado nada é alterado e volta `None`.
#[async_trait]
pub trait ReceiptRepository: Send + Sync {
    async fn create_receipt(&self, store_id: Uuid, supplier_id: Uuid) -> Result<StockReceipt, AppError>;

    /// Cabeçalho e itens numa única transação: ou o recebimento nasce completo ou não nasce.
    async fn create_receipt_with_items(
        &self,
        store_id: Uuid,
        supplier_id: Uuid,
        lines: &[ReceiptLine],
    ) -> Result<StockReceipt, AppError>;

    /// Só insere enquanto o recebimento está `pending`; atualiza os totais do cabeçalho.
    async fn add_item(
        &self,
        receipt_id: Uuid,
        product_id: Uuid,
        quantity: i64,
        unit_cost: Decimal,
    ) -> Result<Option<StockReceiptItem>, AppError>;

    async fn find_receipt(&self, receipt_id: Uuid) -> Result<Option<StockReceipt>, AppError>;

    async fn list_items(&self, receipt_id: Uuid) -> Result<Vec<StockReceiptItem>, AppError>;

    async fn transition(
        &self,
        receipt_id: Uuid,
        from: ReceiptStatus,
        to: ReceiptStatus,
    ) -> Result<Option<StockReceipt>, AppError>;

    /// Fecha um recebimento em `processing` com o estado final e `processed_at`.
    async fn finish_processing(
        &self,
        receipt_id: Uuid,
        status: ReceiptStatus,
        failed_items: i32,
    ) -> Result<Option<StockReceipt>, AppError>;
}

#[derive(Clone)]
pub struct PgReceiptRepository {
    pool: PgPool,
}

impl PgReceiptRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReceiptRepository for PgReceiptRepository {
    async fn create_receipt(&self, store_id: Uuid, supplier_id: Uuid) -> Result<StockReceipt, AppError> {
        let receipt = sqlx::query_as::<_, StockReceipt>(
            r#"
            INSERT INTO stock_receipts (store_id, supplier_id)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
            .bind(store_id)
            .bind(supplier_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(receipt)
    }

    async fn create_receipt_with_items(
        &self,
        store_id: Uuid,
        supplier_id: Uuid,
        lines: &[ReceiptLine],
    ) -> Result<StockReceipt, AppError> {
        let mut tx = self.pool.begin().await?;

        // 1. Cabeçalho
        let receipt_id: Uuid = sqlx::query_scalar(
            "INSERT INTO stock_receipts (store_id, supplier_id) VALUES ($1, $2) RETURNING id",
        )
            .bind(store_id)
            .bind(supplier_id)
            .fetch_one(&mut *tx)
            .await?;

        // 2. Itens, na ordem recebida
        for (position, line) in (1_i32..).zip(lines) {
            sqlx::query(
                r#"
                INSERT INTO stock_receipt_items (receipt_id, product_id, position, quantity, unit_cost)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
                .bind(receipt_id)
                .bind(line.product_id)
                .bind(position)
                .bind(line.quantity)
                .bind(line.unit_cost)
                .execute(&mut *tx)
                .await?;
        }

        // 3. Totais do cabeçalho a partir dos itens gravados
        let receipt = sqlx::query_as::<_, StockReceipt>(
            r#"
            UPDATE stock_receipts r
            SET total_items = t.count,
                total_cost = t.cost,
                updated_at = NOW()
            FROM (
                SELECT COUNT(*)::INTEGER AS count, COALESCE(SUM(total_cost), 0) AS cost
                FROM stock_receipt_items
                WHERE receipt_id = $1
            ) t
            WHERE r.id = $1
            RETURNING r.*
            "#,
        )
            .bind(receipt_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(receipt)
    }

    async fn add_item(
        &self,
        receipt_id: Uuid,
        product_id: Uuid,
        quantity: i64,
        unit_cost: Decimal,
    ) -> Result<Option<StockReceiptItem>, AppError> {
        // O UPDATE no cabeçalho trava a linha e serve de guarda (status = pending);
        // o novo total_items vira a posição do item.
        let item = sqlx::query_as::<_, StockReceiptItem>(
            r#"
            WITH header AS (
                UPDATE stock_receipts
                SET total_items = total_items + 1,
                    total_cost = total_cost + ($3::NUMERIC * $4),
                    updated_at = NOW()
                WHERE id = $1 AND status = 'pending'
                RETURNING id, total_items
            )
            INSERT INTO stock_receipt_items (receipt_id, product_id, position, quantity, unit_cost)
            SELECT header.id, $2, header.total_items, $3, $4 FROM header
            RETURNING id, receipt_id, product_id, position, quantity, unit_cost, total_cost
            "#,
        )
            .bind(receipt_id)
            .bind(product_id)
            .bind(quantity)
            .bind(unit_cost)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    async fn find_receipt(&self, receipt_id: Uuid) -> Result<Option<StockReceipt>, AppError> {
        let receipt = sqlx::query_as::<_, StockReceipt>("SELECT * FROM stock_receipts WHERE id = $1")
            .bind(receipt_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(receipt)
    }

    async fn list_items(&self, receipt_id: Uuid) -> Result<Vec<StockReceiptItem>, AppError> {
        let items = sqlx::query_as::<_, StockReceiptItem>(
            r#"
            SELECT id, receipt_id, product_id, position, quantity, unit_cost, total_cost
            FROM stock_receipt_items
            WHERE receipt_id = $1
            ORDER BY position ASC
            "#,
        )
            .bind(receipt_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    async fn transition(
        &self,
        receipt_id: Uuid,
        from: ReceiptStatus,
        to: ReceiptStatus,
    ) -> Result<Option<StockReceipt>, AppError> {
        let receipt = sqlx::query_as::<_, StockReceipt>(
            r#"
            UPDATE stock_receipts
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
            .bind(receipt_id)
            .bind(from)
            .bind(to)
            .fetch_optional(&self.pool)
            .await?;
        Ok(receipt)
    }

    async fn finish_processing(
        &self,
        receipt_id: Uuid,
        status: ReceiptStatus,
        failed_items: i32,
    ) -> Result<Option<StockReceipt>, AppError> {
        let receipt = sqlx::query_as::<_, StockReceipt>(
            r#"
            UPDATE stock_receipts
            SET status = $2,
                failed_items = $3,
                processed_at = NOW(),
                updated_at = NOW()
            WHERE id = $1 AND status = 'processing'
            RETURNING *
            "#,
        )
            .bind(receipt_id)
            .bind(status)
            .bind(failed_items)
            .fetch_optional(&self.pool)
            .await?;
        Ok(receipt)
    }
}
