// src/services/reconciliation_service.rs

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::{AppError, RowError},
    db::CatalogRepository,
    models::{
        catalog::NewProduct,
        inventory::MovementCause,
        mapping::{ResolvedMapping, SemanticField, SupplierMappingConfig},
        new_product::SightingOrigin,
        upload::{CsvTable, NormalizedRecord, UploadSummary},
    },
    services::{
        column_resolver::{ensure_required, resolve_columns},
        csv_normalizer::CsvNormalizer,
        identity_service::IdentityService,
        inventory_service::InventoryService,
        new_product_service::NewProductService,
        receipt_service::ReceiptService,
        supplier_service::SupplierService,
    },
};

/// Motor de conciliação: aplica uma planilha ao estoque de uma loja.
///
/// Erros de cabeçalho recusam o arquivo inteiro antes de qualquer escrita.
/// Depois disso cada linha é independente; uma falha vira `RowError` no
/// resumo e o processamento segue.
#[derive(Clone)]
pub struct ReconciliationService {
    catalog_repo: Arc<dyn CatalogRepository>,
    suppliers: SupplierService,
    inventory: InventoryService,
    receipts: ReceiptService,
    new_products: NewProductService,
    identity: IdentityService,
}

impl ReconciliationService {
    pub fn new(
        catalog_repo: Arc<dyn CatalogRepository>,
        suppliers: SupplierService,
        inventory: InventoryService,
        receipts: ReceiptService,
        new_products: NewProductService,
        identity: IdentityService,
    ) -> Self {
        Self { catalog_repo, suppliers, inventory, receipts, new_products, identity }
    }

    // ---
    // Contagem de estoque (snapshot): sobrescreve o saldo, sem movimentação
    // ---
    pub async fn upload_current_stock(&self, store_id: Uuid, csv_content: &[u8]) -> Result<UploadSummary, AppError> {
        let table = CsvTable::parse(csv_content)?;
        let config = self.suppliers.mapping_for(store_id, None).await?;
        let mapping = resolve_mapping(&table, &config)?;

        let upload_id = Uuid::new_v4();
        let cause = MovementCause::snapshot_upload(upload_id);
        tracing::info!(%store_id, %upload_id, rows = table.rows.len(), "Iniciando contagem de estoque");

        let mut summary = UploadSummary { total_products: table.rows.len(), ..Default::default() };

        for record in CsvNormalizer::new(&table.rows, &mapping).records() {
            let record = match record {
                Ok(r) => r,
                Err(e) => {
                    reject_row(&mut summary, e);
                    continue;
                }
            };

            match self.apply_snapshot_row(store_id, &record, &cause).await {
                Ok(()) => summary.successful_updates += 1,
                Err(e) => reject_row(&mut summary, RowError::from_app_error(record.row, Some(record.barcode), &e)),
            }
        }

        tracing::info!(
            %store_id,
            %upload_id,
            total = summary.total_products,
            updated = summary.successful_updates,
            errors = summary.errors,
            "Contagem de estoque concluída"
        );
        Ok(summary)
    }

    async fn apply_snapshot_row(&self, store_id: Uuid, record: &NormalizedRecord, cause: &MovementCause) -> Result<(), AppError> {
        // Contagem não cria produto: código desconhecido é erro da linha.
        let product = self
            .catalog_repo
            .find_product_by_barcode(&record.barcode)
            .await?
            .ok_or_else(|| AppError::UnknownProductNotAllowed(record.barcode.clone()))?;

        self.inventory.set_snapshot(store_id, product.id, record.quantity, cause).await?;
        Ok(())
    }

    // ---
    // Entrega de fornecedor: soma ao saldo através de um recebimento
    // ---
    pub async fn upload_supplier_delivery(
        &self,
        store_id: Uuid,
        csv_content: &[u8],
        supplier_name: Option<&str>,
        supplier_id: Option<Uuid>,
    ) -> Result<UploadSummary, AppError> {
        let table = CsvTable::parse(csv_content)?;
        let supplier = self.suppliers.resolve_for_upload(supplier_name, supplier_id).await?;
        let config = self.suppliers.mapping_for(store_id, Some(&supplier)).await?;
        // Cabeçalho validado antes de abrir o recebimento.
        let mapping = resolve_mapping(&table, &config)?;

        // 1. Abre o recebimento
        let receipt = self.receipts.begin(store_id, supplier.id).await?;
        tracing::info!(
            %store_id,
            receipt_id = %receipt.id,
            supplier = %supplier.name,
            rows = table.rows.len(),
            "Iniciando entrega de fornecedor"
        );

        let mut summary = UploadSummary { total_products: table.rows.len(), ..Default::default() };
        // posição do item -> (linha, código de barras)
        let mut positions: HashMap<i32, (usize, String)> = HashMap::new();
        let mut barcodes: Vec<String> = Vec::new();

        // 2. Uma linha = um item do recebimento
        for record in CsvNormalizer::new(&table.rows, &mapping).records() {
            let record = match record {
                Ok(r) => r,
                Err(e) => {
                    reject_row(&mut summary, e);
                    continue;
                }
            };

            match self.stage_delivery_row(&record, supplier.id, receipt.id, &mut summary).await {
                Ok(position) => {
                    if !barcodes.contains(&record.barcode) {
                        barcodes.push(record.barcode.clone());
                    }
                    positions.insert(position, (record.row, record.barcode));
                }
                Err(e) => reject_row(&mut summary, RowError::from_app_error(record.row, Some(record.barcode), &e)),
            }
        }

        // 3. Nada a aplicar: o recebimento vazio é cancelado
        if positions.is_empty() {
            if let Err(e) = self.receipts.cancel(receipt.id).await {
                tracing::warn!(receipt_id = %receipt.id, error = %e, "Não foi possível cancelar o recebimento vazio");
            }
            tracing::info!(receipt_id = %receipt.id, errors = summary.errors, "Entrega sem itens válidos");
            return Ok(summary);
        }

        // 4. Processa: cada item vira uma entrada auditada no livro-razão
        match self.receipts.process(receipt.id).await {
            Ok(processing) => {
                summary.successful_updates = processing.applied_items;
                tracing::info!(receipt_id = %receipt.id, status = %processing.receipt.status, "Recebimento aplicado");
                for failure in processing.failures {
                    let (row, barcode) = positions.remove(&failure.position).unwrap_or_default();
                    reject_row(
                        &mut summary,
                        RowError {
                            row,
                            barcode: Some(barcode).filter(|b| !b.is_empty()),
                            kind: failure.kind,
                            message: failure.message,
                        },
                    );
                }
            }
            Err(e) => {
                // As linhas aceitas voltam como erro; o recebimento só é
                // cancelado se ainda estiver `pending`.
                tracing::error!(receipt_id = %receipt.id, error = %e, "Falha ao processar o recebimento");
                if let Err(cancel_err) = self.receipts.cancel(receipt.id).await {
                    tracing::warn!(receipt_id = %receipt.id, error = %cancel_err, "Recebimento não cancelado");
                }
                let mut staged: Vec<(usize, String)> = positions.drain().map(|(_, row)| row).collect();
                staged.sort();
                for (row, barcode) in staged {
                    reject_row(&mut summary, RowError::from_app_error(row, Some(barcode), &e));
                }
            }
        }

        // 5. Códigos que o sincronizador externo ainda não conhece
        match self.identity.unsynced(&barcodes).await {
            Ok(unsynced) => summary.unsynced_barcodes = unsynced,
            Err(e) => tracing::warn!(receipt_id = %receipt.id, error = %e, "Falha ao consultar mapeamentos"),
        }

        tracing::info!(
            receipt_id = %receipt.id,
            total = summary.total_products,
            updated = summary.successful_updates,
            new_products = summary.new_products,
            errors = summary.errors,
            "Entrega de fornecedor concluída"
        );
        Ok(summary)
    }

    // Garante o produto e adiciona o item; devolve a posição do item no recebimento.
    async fn stage_delivery_row(
        &self,
        record: &NormalizedRecord,
        supplier_id: Uuid,
        receipt_id: Uuid,
        summary: &mut UploadSummary,
    ) -> Result<i32, AppError> {
        // Entrega sem unidades não gera item nem produto.
        if record.quantity <= 0 {
            return Err(AppError::RowValidation(format!(
                "quantidade entregue deve ser positiva (veio {})",
                record.quantity
            )));
        }

        // Produto inédito e primeiro avistamento são gravados juntos: uma entrada por código.
        let origin = SightingOrigin { supplier_id: Some(supplier_id), receipt_id: Some(receipt_id) };
        let (product, created) = self
            .new_products
            .register(
                &NewProduct {
                    barcode: record.barcode.clone(),
                    name: record.name.clone().unwrap_or_default(),
                    category: record.category.clone(),
                    unit_price: record.price,
                },
                &origin,
            )
            .await?;
        if created {
            summary.new_products += 1;
        }

        let unit_cost = record.price.or(product.unit_price).unwrap_or(Decimal::ZERO);
        let item = self.receipts.add_item(receipt_id, product.id, record.quantity, unit_cost).await?;
        Ok(item.position)
    }
}

fn resolve_mapping(table: &CsvTable, config: &SupplierMappingConfig) -> Result<ResolvedMapping, AppError> {
    let mapping = resolve_columns(&table.headers, config);
    ensure_required(&mapping)?;
    tracing::debug!(
        barcode = ?mapping.header(SemanticField::Barcode),
        quantity = ?mapping.header(SemanticField::Quantity),
        "Colunas resolvidas"
    );
    if !mapping.unmatched_headers().is_empty() {
        tracing::debug!(unmatched = ?mapping.unmatched_headers(), "Colunas ignoradas");
    }
    Ok(mapping)
}

fn reject_row(summary: &mut UploadSummary, error: RowError) {
    tracing::warn!(row = error.row, barcode = ?error.barcode, kind = ?error.kind, "{}", error.message);
    summary.push_error(error);
}
