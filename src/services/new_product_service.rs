// src/services/new_product_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::NewProductRepository,
    models::{
        catalog::{NewProduct, Product},
        new_product::{ExportedNewProduct, SightingOrigin},
    },
};

#[derive(Clone)]
pub struct NewProductService {
    new_product_repo: Arc<dyn NewProductRepository>,
}

impl NewProductService {
    pub fn new(new_product_repo: Arc<dyn NewProductRepository>) -> Self {
        Self { new_product_repo }
    }

    /// Garante o produto. Quando esta chamada o criou, o primeiro avistamento
    /// já foi gravado junto e o `bool` volta `true`.
    pub async fn register(&self, product: &NewProduct, origin: &SightingOrigin) -> Result<(Product, bool), AppError> {
        let (product, entry) = self.new_product_repo.register_product(product, origin).await?;
        if let Some(entry) = &entry {
            tracing::info!(barcode = %entry.barcode, product_id = %entry.product_id, "Produto novo detectado");
        }
        Ok((product, entry.is_some()))
    }

    /// Devolve as entradas pendentes e já as marca como exportadas.
    pub async fn export_pending(&self, supplier_id: Option<Uuid>) -> Result<Vec<ExportedNewProduct>, AppError> {
        let exported = self.new_product_repo.claim_pending(supplier_id).await?;
        tracing::info!(count = exported.len(), ?supplier_id, "Produtos novos exportados");
        Ok(exported)
    }
}
