// src/db/identity_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    models::identity::{ExternalIdentityMapping, IdentityUpsert},
};

#[async_trait]
pub trait IdentityRepository: Send + Sync {
    /// Upsert pela chave natural (barcode). Campos nulos novos nunca apagam
    /// valores já gravados; `verification_count` sempre incrementa.
    async fn upsert(&self, upsert: &IdentityUpsert) -> Result<ExternalIdentityMapping, AppError>;

    async fn find_by_barcode(&self, barcode: &str) -> Result<Option<ExternalIdentityMapping>, AppError>;

    /// Dos códigos informados, devolve os que já possuem mapeamento.
    async fn mapped_barcodes(&self, barcodes: &[String]) -> Result<Vec<String>, AppError>;
}

#[derive(Clone)]
pub struct PgIdentityRepository {
    pool: PgPool,
}

impl PgIdentityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityRepository for PgIdentityRepository {
    async fn upsert(&self, upsert: &IdentityUpsert) -> Result<ExternalIdentityMapping, AppError> {
        let mapping = sqlx::query_as::<_, ExternalIdentityMapping>(
            r#"
            INSERT INTO external_identity_mappings AS m (
                barcode, external_product_id, external_variant_id, external_inventory_item_id,
                discovery_method, confidence_score, search_time_ms
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (barcode) DO UPDATE SET
                external_product_id = COALESCE(EXCLUDED.external_product_id, m.external_product_id),
                external_variant_id = COALESCE(EXCLUDED.external_variant_id, m.external_variant_id),
                external_inventory_item_id = COALESCE(EXCLUDED.external_inventory_item_id, m.external_inventory_item_id),
                discovery_method = EXCLUDED.discovery_method,
                confidence_score = GREATEST(m.confidence_score, EXCLUDED.confidence_score),
                search_time_ms = COALESCE(EXCLUDED.search_time_ms, m.search_time_ms),
                last_verified_at = NOW(),
                verification_count = m.verification_count + 1,
                updated_at = NOW()
            RETURNING id, barcode, external_product_id, external_variant_id, external_inventory_item_id,
                      discovery_method, confidence_score, last_verified_at, verification_count, search_time_ms
            "#,
        )
            .bind(&upsert.barcode)
            .bind(&upsert.ids.external_product_id)
            .bind(&upsert.ids.external_variant_id)
            .bind(&upsert.ids.external_inventory_item_id)
            .bind(upsert.discovery_method)
            .bind(upsert.confidence_score)
            .bind(upsert.search_time_ms)
            .fetch_one(&self.pool)
            .await?; // variante repetida -> DuplicateConstraintViolation
        Ok(mapping)
    }

    async fn find_by_barcode(&self, barcode: &str) -> Result<Option<ExternalIdentityMapping>, AppError> {
        let mapping = sqlx::query_as::<_, ExternalIdentityMapping>(
            r#"
            SELECT id, barcode, external_product_id, external_variant_id, external_inventory_item_id,
                   discovery_method, confidence_score, last_verified_at, verification_count, search_time_ms
            FROM external_identity_mappings
            WHERE barcode = $1
            "#,
        )
            .bind(barcode)
            .fetch_optional(&self.pool)
            .await?;
        Ok(mapping)
    }

    async fn mapped_barcodes(&self, barcodes: &[String]) -> Result<Vec<String>, AppError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT barcode FROM external_identity_mappings WHERE barcode = ANY($1)",
        )
            .bind(barcodes)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(b,)| b).collect())
    }
}
