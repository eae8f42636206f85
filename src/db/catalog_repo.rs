// src/db/catalog_repo.rs

use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        catalog::{NewSupplier, Product, Supplier},
        mapping::SupplierMappingConfig,
    },
};

/// Fornecedores, mapeamentos de colunas por loja e catálogo de produtos.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn list_suppliers(&self) -> Result<Vec<Supplier>, AppError>;

    async fn find_supplier_by_id(&self, id: Uuid) -> Result<Option<Supplier>, AppError>;

    /// Cadastro explícito: nome repetido vira `DuplicateConstraintViolation`.
    async fn create_supplier(&self, supplier: &NewSupplier) -> Result<Supplier, AppError>;

    /// Usado no upload: devolve o fornecedor existente ou cria um novo, de forma atômica.
    async fn ensure_supplier(&self, supplier: &NewSupplier) -> Result<Supplier, AppError>;

    async fn get_store_mapping(&self, store_id: Uuid) -> Result<Option<SupplierMappingConfig>, AppError>;

    async fn save_store_mapping(
        &self,
        store_id: Uuid,
        config: &SupplierMappingConfig,
    ) -> Result<SupplierMappingConfig, AppError>;

    async fn find_product_by_barcode(&self, barcode: &str) -> Result<Option<Product>, AppError>;

    async fn find_product_by_id(&self, id: Uuid) -> Result<Option<Product>, AppError>;
}

#[derive(Clone)]
pub struct PgCatalogRepository {
    pool: PgPool,
}

impl PgCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SUPPLIER_COLUMNS: &str = "id, name, code, is_active, column_alias_sets, created_at";

#[async_trait]
impl CatalogRepository for PgCatalogRepository {
    async fn list_suppliers(&self) -> Result<Vec<Supplier>, AppError> {
        let suppliers = sqlx::query_as::<_, Supplier>(&format!(
            "SELECT {SUPPLIER_COLUMNS} FROM suppliers ORDER BY name ASC"
        ))
            .fetch_all(&self.pool)
            .await?;
        Ok(suppliers)
    }

    async fn find_supplier_by_id(&self, id: Uuid) -> Result<Option<Supplier>, AppError> {
        let supplier = sqlx::query_as::<_, Supplier>(&format!(
            "SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE id = $1"
        ))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(supplier)
    }

    async fn create_supplier(&self, supplier: &NewSupplier) -> Result<Supplier, AppError> {
        let created = sqlx::query_as::<_, Supplier>(&format!(
            r#"
            INSERT INTO suppliers (name, code, column_alias_sets)
            VALUES ($1, $2, $3)
            RETURNING {SUPPLIER_COLUMNS}
            "#
        ))
            .bind(&supplier.name)
            .bind(&supplier.code)
            .bind(Json(&supplier.column_alias_sets))
            .fetch_one(&self.pool)
            .await?; // unique(lower(name)) -> DuplicateConstraintViolation via From<sqlx::Error>
        Ok(created)
    }

    async fn ensure_supplier(&self, supplier: &NewSupplier) -> Result<Supplier, AppError> {
        // O "DO UPDATE" sem efeito garante que o RETURNING devolva a linha
        // existente, com a grafia com que foi cadastrada.
        let supplier = sqlx::query_as::<_, Supplier>(&format!(
            r#"
            INSERT INTO suppliers (name, code, column_alias_sets)
            VALUES ($1, $2, $3)
            ON CONFLICT ((lower(name))) DO UPDATE SET name = suppliers.name
            RETURNING {SUPPLIER_COLUMNS}
            "#
        ))
            .bind(&supplier.name)
            .bind(&supplier.code)
            .bind(Json(&supplier.column_alias_sets))
            .fetch_one(&self.pool)
            .await?;
        Ok(supplier)
    }

    async fn get_store_mapping(&self, store_id: Uuid) -> Result<Option<SupplierMappingConfig>, AppError> {
        let row: Option<(Json<SupplierMappingConfig>,)> = sqlx::query_as(
            "SELECT column_alias_sets FROM store_column_mappings WHERE store_id = $1",
        )
            .bind(store_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(Json(config),)| config))
    }

    async fn save_store_mapping(
        &self,
        store_id: Uuid,
        config: &SupplierMappingConfig,
    ) -> Result<SupplierMappingConfig, AppError> {
        let (Json(saved),): (Json<SupplierMappingConfig>,) = sqlx::query_as(
            r#"
            INSERT INTO store_column_mappings (store_id, column_alias_sets)
            VALUES ($1, $2)
            ON CONFLICT (store_id) DO UPDATE SET
                column_alias_sets = EXCLUDED.column_alias_sets,
                updated_at = NOW()
            RETURNING column_alias_sets
            "#,
        )
            .bind(store_id)
            .bind(Json(config))
            .fetch_one(&self.pool)
            .await?;
        Ok(saved)
    }

    async fn find_product_by_barcode(&self, barcode: &str) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE barcode = $1")
            .bind(barcode)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    async fn find_product_by_id(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }
}
