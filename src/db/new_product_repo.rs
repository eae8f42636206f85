// src/db/new_product_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        catalog::{NewProduct, Product},
        new_product::{ExportedNewProduct, NewProductLogEntry, SightingOrigin},
    },
};

#[async_trait]
pub trait NewProductRepository: Send + Sync {
    /// Insere o produto se o código de barras é inédito e, na mesma transação,
    /// grava o avistamento. Produto existente volta sem entrada no log.
    async fn register_product(
        &self,
        product: &NewProduct,
        origin: &SightingOrigin,
    ) -> Result<(Product, Option<NewProductLogEntry>), AppError>;

    /// Lê e marca como exportadas, numa única operação. Duas exportações
    /// concorrentes nunca recebem a mesma entrada.
    async fn claim_pending(&self, supplier_id: Option<Uuid>) -> Result<Vec<ExportedNewProduct>, AppError>;
}

#[derive(Clone)]
pub struct PgNewProductRepository {
    pool: PgPool,
}

impl PgNewProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct InsertedProduct {
    #[sqlx(flatten)]
    product: Product,
    inserted: bool,
}

#[async_trait]
impl NewProductRepository for PgNewProductRepository {
    async fn register_product(
        &self,
        product: &NewProduct,
        origin: &SightingOrigin,
    ) -> Result<(Product, Option<NewProductLogEntry>), AppError> {
        let mut tx = self.pool.begin().await?;

        // 1. Produto: `xmax = 0` só é verdadeiro para a linha recém-inserida;
        //    no conflito o UPDATE vazio devolve a linha existente.
        let row = sqlx::query_as::<_, InsertedProduct>(
            r#"
            INSERT INTO products (sku, barcode, name, category, unit_price)
            VALUES ($1, $1, $2, $3, $4)
            ON CONFLICT (barcode) DO UPDATE SET barcode = EXCLUDED.barcode
            RETURNING id, sku, barcode, name, category, unit_price, is_active, created_at,
                      (xmax = 0) AS inserted
            "#,
        )
            .bind(&product.barcode)
            .bind(product.display_name())
            .bind(&product.category)
            .bind(product.unit_price)
            .fetch_one(&mut *tx)
            .await?;

        // 2. Avistamento, só para quem criou o produto
        let entry = if row.inserted {
            let entry = sqlx::query_as::<_, NewProductLogEntry>(
                r#"
                INSERT INTO new_product_log (product_id, supplier_id, receipt_id, barcode, name)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
                "#,
            )
                .bind(row.product.id)
                .bind(origin.supplier_id)
                .bind(origin.receipt_id)
                .bind(&product.barcode)
                .bind(&row.product.name)
                .fetch_one(&mut *tx)
                .await?;
            Some(entry)
        } else {
            None
        };

        tx.commit().await?;
        Ok((row.product, entry))
    }

    async fn claim_pending(&self, supplier_id: Option<Uuid>) -> Result<Vec<ExportedNewProduct>, AppError> {
        // SKIP LOCKED: linhas já reivindicadas por outra exportação em curso ficam de fora.
        let exported = sqlx::query_as::<_, ExportedNewProduct>(
            r#"
            WITH claimed AS (
                UPDATE new_product_log
                SET is_exported = TRUE, exported_at = NOW()
                WHERE id IN (
                    SELECT id FROM new_product_log
                    WHERE is_exported = FALSE
                      AND ($1::UUID IS NULL OR supplier_id = $1)
                    ORDER BY detected_at ASC
                    FOR UPDATE SKIP LOCKED
                )
                RETURNING barcode, name, supplier_id, detected_at
            )
            SELECT c.barcode, c.name, s.name AS supplier_name, c.detected_at
            FROM claimed c
            LEFT JOIN suppliers s ON s.id = c.supplier_id
            ORDER BY c.detected_at ASC
            "#,
        )
            .bind(supplier_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(exported)
    }
}
