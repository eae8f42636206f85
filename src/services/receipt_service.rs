// src/services/receipt_service.rs

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::{AppError, RowErrorKind},
    db::{CatalogRepository, ReceiptRepository},
    models::{
        inventory::MovementCause,
        receipt::{
            ItemFailure, ReceiptDetail, ReceiptLine, ReceiptProcessing, ReceiptStatus, StockReceipt,
            StockReceiptItem,
        },
    },
    services::inventory_service::InventoryService,
};

/// Máquina de estados do recebimento:
/// `pending -> processing -> completed | partially_failed | failed` e `pending -> cancelled`.
#[derive(Clone)]
pub struct ReceiptService {
    receipt_repo: Arc<dyn ReceiptRepository>,
    catalog_repo: Arc<dyn CatalogRepository>,
    inventory: InventoryService,
}

impl ReceiptService {
    pub fn new(
        receipt_repo: Arc<dyn ReceiptRepository>,
        catalog_repo: Arc<dyn CatalogRepository>,
        inventory: InventoryService,
    ) -> Self {
        Self { receipt_repo, catalog_repo, inventory }
    }

    pub async fn begin(&self, store_id: Uuid, supplier_id: Uuid) -> Result<StockReceipt, AppError> {
        let receipt = self.receipt_repo.create_receipt(store_id, supplier_id).await?;
        tracing::debug!(receipt_id = %receipt.id, %store_id, "Recebimento aberto");
        Ok(receipt)
    }

    /// Adiciona um item a um recebimento ainda `pending`.
    pub async fn add_item(
        &self,
        receipt_id: Uuid,
        product_id: Uuid,
        quantity: i64,
        unit_cost: Decimal,
    ) -> Result<StockReceiptItem, AppError> {
        if quantity <= 0 {
            return Err(AppError::RowValidation(format!("quantidade {quantity} deve ser positiva")));
        }
        if unit_cost.is_sign_negative() {
            return Err(AppError::RowValidation(format!("custo unitário {unit_cost} não pode ser negativo")));
        }

        match self.receipt_repo.add_item(receipt_id, product_id, quantity, unit_cost).await? {
            Some(item) => Ok(item),
            None => Err(self.guard_error(receipt_id, ReceiptStatus::Pending).await),
        }
    }

    /// Recebimento manual: valida fornecedor e produtos antes de gravar qualquer coisa.
    pub async fn create_manual(
        &self,
        store_id: Uuid,
        supplier_id: Uuid,
        lines: &[ReceiptLine],
    ) -> Result<ReceiptDetail, AppError> {
        if lines.is_empty() {
            return Err(AppError::InvalidInput("O recebimento precisa de ao menos um item.".into()));
        }

        self.catalog_repo
            .find_supplier_by_id(supplier_id)
            .await?
            .ok_or(AppError::SupplierNotFound(supplier_id))?;

        for line in lines {
            self.catalog_repo
                .find_product_by_id(line.product_id)
                .await?
                .ok_or(AppError::ProductNotFound(line.product_id))?;
            if line.quantity <= 0 || line.unit_cost.is_sign_negative() {
                return Err(AppError::InvalidInput(format!(
                    "Item {} tem quantidade ou custo inválido.",
                    line.product_id
                )));
            }
        }

        let receipt = self
            .receipt_repo
            .create_receipt_with_items(store_id, supplier_id, lines)
            .await?;

        tracing::info!(receipt_id = %receipt.id, items = lines.len(), "Recebimento manual criado");
        self.get(receipt.id).await
    }

    /// Aplica os itens ao saldo.
    ///
    /// A entrada em `processing` é um compare-and-set: só um chamador vence e
    /// um recebimento fora de `pending` não sofre nenhuma alteração. Cada item
    /// é uma escrita atômica própria; falhas ficam registradas e o estado final
    /// reflete quantos itens entraram. Depois da guarda o recebimento sempre
    /// termina num estado final, nunca fica em `processing`.
    pub async fn process(&self, receipt_id: Uuid) -> Result<ReceiptProcessing, AppError> {
        // 1. Itens lidos antes da guarda: se a leitura falhar, continua `pending`
        let mut items = self.receipt_repo.list_items(receipt_id).await?;

        // 2. Guarda: pending -> processing
        let receipt = match self
            .receipt_repo
            .transition(receipt_id, ReceiptStatus::Pending, ReceiptStatus::Processing)
            .await?
        {
            Some(r) => r,
            None => return Err(self.guard_error(receipt_id, ReceiptStatus::Pending).await),
        };
        tracing::info!(%receipt_id, "Recebimento em processamento");

        // Um item pode ter entrado entre a leitura e a guarda; daqui em diante a lista é fixa.
        if usize::try_from(receipt.total_items).ok() != Some(items.len()) {
            items = match self.receipt_repo.list_items(receipt_id).await {
                Ok(items) => items,
                Err(e) => return Err(self.abort_processing(receipt_id, receipt.total_items, e).await),
            };
        }

        // 3. Aplica cada item pelo caminho de entrada (uma movimentação por item)
        let cause = MovementCause::receipt(receipt_id);
        let mut applied_items = 0;
        let mut failures = Vec::new();

        for item in &items {
            match self
                .inventory
                .apply_delta(receipt.store_id, item.product_id, item.quantity, &cause)
                .await
            {
                Ok(_) => applied_items += 1,
                Err(e) => {
                    tracing::warn!(%receipt_id, position = item.position, error = %e, "Falha ao aplicar item");
                    failures.push(ItemFailure {
                        position: item.position,
                        product_id: item.product_id,
                        kind: RowErrorKind::classify(&e),
                        message: e.to_string(),
                    });
                }
            }
        }

        // 4. Estado final
        let status = if failures.is_empty() {
            ReceiptStatus::Completed
        } else if applied_items == 0 {
            ReceiptStatus::Failed
        } else {
            ReceiptStatus::PartiallyFailed
        };

        let failed_items = i32::try_from(failures.len()).unwrap_or(i32::MAX);
        let receipt = self.close(receipt_id, status, failed_items).await?;

        tracing::info!(%receipt_id, %status, applied_items, failed = failed_items, "Recebimento processado");
        Ok(ReceiptProcessing { receipt, applied_items, failures })
    }

    // Grava o estado final. Os itens já foram aplicados, então uma falha no
    // fechamento ganha uma segunda tentativa com o mesmo estado.
    async fn close(&self, receipt_id: Uuid, status: ReceiptStatus, failed_items: i32) -> Result<StockReceipt, AppError> {
        let closed = match self.receipt_repo.finish_processing(receipt_id, status, failed_items).await {
            Ok(closed) => closed,
            Err(e) => {
                tracing::warn!(%receipt_id, error = %e, "Falha ao fechar o recebimento, tentando de novo");
                self.receipt_repo.finish_processing(receipt_id, status, failed_items).await?
            }
        };
        match closed {
            Some(receipt) => Ok(receipt),
            None => Err(self.guard_error(receipt_id, ReceiptStatus::Processing).await),
        }
    }

    // Nenhum item foi aplicado: fecha como `failed` e devolve o erro original.
    async fn abort_processing(&self, receipt_id: Uuid, total_items: i32, error: AppError) -> AppError {
        tracing::error!(%receipt_id, error = %error, "Processamento interrompido");
        if let Err(e) = self
            .receipt_repo
            .finish_processing(receipt_id, ReceiptStatus::Failed, total_items)
            .await
        {
            tracing::error!(%receipt_id, error = %e, "Não foi possível marcar o recebimento como falho");
        }
        error
    }

    /// Só um recebimento `pending` pode ser cancelado; nenhum saldo é tocado.
    pub async fn cancel(&self, receipt_id: Uuid) -> Result<StockReceipt, AppError> {
        match self
            .receipt_repo
            .transition(receipt_id, ReceiptStatus::Pending, ReceiptStatus::Cancelled)
            .await?
        {
            Some(receipt) => {
                tracing::info!(%receipt_id, "Recebimento cancelado");
                Ok(receipt)
            }
            None => Err(self.guard_error(receipt_id, ReceiptStatus::Pending).await),
        }
    }

    pub async fn get(&self, receipt_id: Uuid) -> Result<ReceiptDetail, AppError> {
        let header = self
            .receipt_repo
            .find_receipt(receipt_id)
            .await?
            .ok_or(AppError::ReceiptNotFound(receipt_id))?;
        let items = self.receipt_repo.list_items(receipt_id).await?;
        Ok(ReceiptDetail { header, items })
    }

    // Explica por que a guarda recusou: recebimento inexistente ou em outro estado.
    async fn guard_error(&self, receipt_id: Uuid, expected: ReceiptStatus) -> AppError {
        match self.receipt_repo.find_receipt(receipt_id).await {
            Ok(Some(receipt)) => AppError::InvalidReceiptState {
                receipt_id,
                current: receipt.status,
                expected,
            },
            Ok(None) => AppError::ReceiptNotFound(receipt_id),
            Err(e) => e,
        }
    }
}
