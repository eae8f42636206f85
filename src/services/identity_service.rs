// src/services/identity_service.rs

use std::sync::Arc;

use crate::{
    common::error::AppError,
    db::IdentityRepository,
    models::{
        catalog::normalize_barcode,
        identity::{DiscoveryMethod, ExternalIdentityMapping, ExternalIds, IdentityUpsert},
    },
};

/// Cache de identidade: código de barras -> identificadores do catálogo externo.
#[derive(Clone)]
pub struct IdentityService {
    identity_repo: Arc<dyn IdentityRepository>,
}

impl IdentityService {
    pub fn new(identity_repo: Arc<dyn IdentityRepository>) -> Self {
        Self { identity_repo }
    }

    /// Grava ou reconfirma um mapeamento. Sem `confidence_score`, usa o padrão
    /// do método de descoberta. A confiança gravada nunca diminui.
    pub async fn upsert(
        &self,
        barcode: &str,
        ids: ExternalIds,
        discovery_method: DiscoveryMethod,
        confidence_score: Option<i16>,
        search_time_ms: Option<i32>,
    ) -> Result<ExternalIdentityMapping, AppError> {
        let barcode = normalize_barcode(barcode);
        if barcode.is_empty() {
            return Err(AppError::InvalidInput("O código de barras é obrigatório.".into()));
        }

        let confidence_score = confidence_score.unwrap_or_else(|| discovery_method.default_confidence());
        if !(0..=100).contains(&confidence_score) {
            return Err(AppError::InvalidInput(format!(
                "confidenceScore {confidence_score} fora do intervalo 0-100."
            )));
        }
        if search_time_ms.is_some_and(|ms| ms < 0) {
            return Err(AppError::InvalidInput("searchTimeMs não pode ser negativo.".into()));
        }

        let mapping = self
            .identity_repo
            .upsert(&IdentityUpsert {
                barcode,
                ids: blank_to_none(ids),
                discovery_method,
                confidence_score,
                search_time_ms,
            })
            .await?;

        tracing::info!(
            barcode = %mapping.barcode,
            verification_count = mapping.verification_count,
            confidence = mapping.confidence_score,
            "Mapeamento de identidade gravado"
        );
        Ok(mapping)
    }

    pub async fn lookup(&self, barcode: &str) -> Result<ExternalIdentityMapping, AppError> {
        let barcode = normalize_barcode(barcode);
        self.identity_repo
            .find_by_barcode(&barcode)
            .await?
            .ok_or(AppError::MappingNotFound(barcode))
    }

    /// Dos códigos informados, os que ainda não têm mapeamento (na ordem recebida).
    pub async fn unsynced(&self, barcodes: &[String]) -> Result<Vec<String>, AppError> {
        if barcodes.is_empty() {
            return Ok(Vec::new());
        }
        let mapped = self.identity_repo.mapped_barcodes(barcodes).await?;
        Ok(barcodes.iter().filter(|b| !mapped.contains(b)).cloned().collect())
    }
}

// String vazia não conta como identificador (não pode apagar um valor gravado).
fn blank_to_none(ids: ExternalIds) -> ExternalIds {
    let clean = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    ExternalIds {
        external_product_id: clean(ids.external_product_id),
        external_variant_id: clean(ids.external_variant_id),
        external_inventory_item_id: clean(ids.external_inventory_item_id),
    }
}
