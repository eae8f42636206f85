// src/db/memory.rs
//
// Implementação em memória dos repositórios, usada pelos testes dos serviços.
// Respeita as mesmas regras do Postgres: chaves únicas, transições guardadas
// e exportação atômica (tudo sob um único Mutex).

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CatalogRepository, IdentityRepository, InventoryRepository, NewProductRepository, ReceiptRepository},
    models::{
        catalog::{NewProduct, NewSupplier, Product, Supplier},
        identity::{ExternalIdentityMapping, IdentityUpsert},
        inventory::{InventoryLevel, InventoryMovement, LevelChange, MovementCause, WriteOptions},
        mapping::SupplierMappingConfig,
        new_product::{ExportedNewProduct, NewProductLogEntry, SightingOrigin},
        receipt::{ReceiptLine, ReceiptStatus, StockReceipt, StockReceiptItem},
    },
};

#[derive(Default)]
pub struct MemoryState {
    pub suppliers: Vec<Supplier>,
    pub store_mappings: HashMap<Uuid, SupplierMappingConfig>,
    pub products: Vec<Product>,
    pub levels: HashMap<(Uuid, Uuid), InventoryLevel>,
    pub movements: Vec<InventoryMovement>,
    pub receipts: HashMap<Uuid, StockReceipt>,
    pub items: Vec<StockReceiptItem>,
    pub new_products: Vec<NewProductLogEntry>,
    pub mappings: Vec<ExternalIdentityMapping>,
    // Produtos cuja escrita de saldo deve falhar (simula erro de banco)
    pub failing_products: HashSet<Uuid>,
    // Falhas de uma vez só: consumidas na primeira chamada que passa pelo ponto
    pub fail_once: HashSet<FailPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    ListItems,
    FinishProcessing,
    ReceiptWithItems,
    ProductRegistration,
}

impl MemoryState {
    fn trip(&mut self, point: FailPoint) -> Result<(), AppError> {
        if self.fail_once.remove(&point) {
            return Err(AppError::PersistenceFailure(format!("falha simulada em {point:?}")));
        }
        Ok(())
    }

    pub fn quantity_of(&self, store_id: Uuid, barcode: &str) -> Option<i64> {
        let product = self.products.iter().find(|p| p.barcode.as_deref() == Some(barcode))?;
        self.levels.get(&(store_id, product.id)).map(|l| l.quantity)
    }

    pub fn product_by_barcode(&self, barcode: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.barcode.as_deref() == Some(barcode))
    }

    // Mesma regra do índice único em lower(name).
    fn supplier_named(&self, name: &str) -> Option<&Supplier> {
        let name = name.to_lowercase();
        self.suppliers.iter().find(|s| s.name.to_lowercase() == name)
    }

    fn push_supplier(&mut self, supplier: &NewSupplier) -> Supplier {
        let created = Supplier {
            id: Uuid::new_v4(),
            name: supplier.name.clone(),
            code: supplier.code.clone(),
            is_active: true,
            column_alias_sets: supplier.column_alias_sets.clone(),
            created_at: Utc::now(),
        };
        self.suppliers.push(created.clone());
        created
    }

    fn write_level(&mut self, store_id: Uuid, product_id: Uuid, quantity: i64) -> InventoryLevel {
        let level = self
            .levels
            .entry((store_id, product_id))
            .or_insert_with(|| InventoryLevel {
                id: Uuid::new_v4(),
                store_id,
                product_id,
                quantity: 0,
                reserved_quantity: 0,
                available_quantity: 0,
                updated_at: Utc::now(),
            });
        level.quantity = quantity;
        level.available_quantity = level.quantity - level.reserved_quantity;
        level.updated_at = Utc::now();
        level.clone()
    }

    fn push_movement(
        &mut self,
        store_id: Uuid,
        product_id: Uuid,
        cause: &MovementCause,
        previous_quantity: i64,
        new_quantity: i64,
    ) -> InventoryMovement {
        let movement = InventoryMovement {
            id: Uuid::new_v4(),
            store_id,
            product_id,
            movement_type: cause.movement_type,
            quantity_change: new_quantity - previous_quantity,
            previous_quantity,
            new_quantity,
            reference_id: cause.reference_id,
            reference_type: cause.reference_type,
            created_at: Utc::now(),
        };
        self.movements.push(movement.clone());
        movement
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().expect("memory store poisoned")
    }
}

#[async_trait]
impl CatalogRepository for MemoryStore {
    async fn list_suppliers(&self) -> Result<Vec<Supplier>, AppError> {
        let mut suppliers = self.state().suppliers.clone();
        suppliers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(suppliers)
    }

    async fn find_supplier_by_id(&self, id: Uuid) -> Result<Option<Supplier>, AppError> {
        Ok(self.state().suppliers.iter().find(|s| s.id == id).cloned())
    }

    async fn create_supplier(&self, supplier: &NewSupplier) -> Result<Supplier, AppError> {
        let mut state = self.state();
        if state.supplier_named(&supplier.name).is_some() {
            return Err(AppError::DuplicateConstraintViolation("suppliers_name_lower_key".into()));
        }
        Ok(state.push_supplier(supplier))
    }

    async fn ensure_supplier(&self, supplier: &NewSupplier) -> Result<Supplier, AppError> {
        let mut state = self.state();
        if let Some(existing) = state.supplier_named(&supplier.name) {
            return Ok(existing.clone());
        }
        Ok(state.push_supplier(supplier))
    }

    async fn get_store_mapping(&self, store_id: Uuid) -> Result<Option<SupplierMappingConfig>, AppError> {
        Ok(self.state().store_mappings.get(&store_id).cloned())
    }

    async fn save_store_mapping(
        &self,
        store_id: Uuid,
        config: &SupplierMappingConfig,
    ) -> Result<SupplierMappingConfig, AppError> {
        self.state().store_mappings.insert(store_id, config.clone());
        Ok(config.clone())
    }

    async fn find_product_by_barcode(&self, barcode: &str) -> Result<Option<Product>, AppError> {
        Ok(self.state().product_by_barcode(barcode).cloned())
    }

    async fn find_product_by_id(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        Ok(self.state().products.iter().find(|p| p.id == id).cloned())
    }
}

#[async_trait]
impl InventoryRepository for MemoryStore {
    async fn list_levels(&self, store_id: Uuid) -> Result<Vec<InventoryLevel>, AppError> {
        Ok(self
            .state()
            .levels
            .values()
            .filter(|l| l.store_id == store_id)
            .cloned()
            .collect())
    }

    async fn apply_delta(
        &self,
        store_id: Uuid,
        product_id: Uuid,
        delta: i64,
        cause: &MovementCause,
        options: WriteOptions,
    ) -> Result<LevelChange, AppError> {
        let mut state = self.state();
        if state.failing_products.contains(&product_id) {
            return Err(AppError::PersistenceFailure("falha simulada".into()));
        }
        let previous_quantity = state.levels.get(&(store_id, product_id)).map(|l| l.quantity).unwrap_or(0);
        let level = state.write_level(store_id, product_id, previous_quantity + delta);
        let movement = (!options.skip_audit)
            .then(|| state.push_movement(store_id, product_id, cause, previous_quantity, level.quantity));
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
        let mut state = self.state();
        if state.failing_products.contains(&product_id) {
            return Err(AppError::PersistenceFailure("falha simulada".into()));
        }
        let previous_quantity = state.levels.get(&(store_id, product_id)).map(|l| l.quantity).unwrap_or(0);
        let level = state.write_level(store_id, product_id, quantity);
        let movement = (!options.skip_audit && previous_quantity != quantity)
            .then(|| state.push_movement(store_id, product_id, cause, previous_quantity, quantity));
        Ok(LevelChange { level, previous_quantity, movement })
    }

    async fn list_movements(&self, store_id: Uuid, product_id: Uuid) -> Result<Vec<InventoryMovement>, AppError> {
        Ok(self
            .state()
            .movements
            .iter()
            .filter(|m| m.store_id == store_id && m.product_id == product_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ReceiptRepository for MemoryStore {
    async fn create_receipt(&self, store_id: Uuid, supplier_id: Uuid) -> Result<StockReceipt, AppError> {
        let now = Utc::now();
        let receipt = StockReceipt {
            id: Uuid::new_v4(),
            store_id,
            supplier_id,
            status: ReceiptStatus::Pending,
            total_items: 0,
            total_cost: Decimal::ZERO,
            failed_items: 0,
            receipt_date: now,
            processed_at: None,
            created_at: now,
            updated_at: now,
        };
        self.state().receipts.insert(receipt.id, receipt.clone());
        Ok(receipt)
    }

    async fn create_receipt_with_items(
        &self,
        store_id: Uuid,
        supplier_id: Uuid,
        lines: &[ReceiptLine],
    ) -> Result<StockReceipt, AppError> {
        let mut state = self.state();
        // Tudo ou nada: a falha acontece antes de qualquer escrita.
        state.trip(FailPoint::ReceiptWithItems)?;

        let now = Utc::now();
        let mut receipt = StockReceipt {
            id: Uuid::new_v4(),
            store_id,
            supplier_id,
            status: ReceiptStatus::Pending,
            total_items: 0,
            total_cost: Decimal::ZERO,
            failed_items: 0,
            receipt_date: now,
            processed_at: None,
            created_at: now,
            updated_at: now,
        };
        for (position, line) in (1..).zip(lines) {
            let total_cost = Decimal::from(line.quantity) * line.unit_cost;
            state.items.push(StockReceiptItem {
                id: Uuid::new_v4(),
                receipt_id: receipt.id,
                product_id: line.product_id,
                position,
                quantity: line.quantity,
                unit_cost: line.unit_cost,
                total_cost,
            });
            receipt.total_items = position;
            receipt.total_cost += total_cost;
        }
        state.receipts.insert(receipt.id, receipt.clone());
        Ok(receipt)
    }

    async fn add_item(
        &self,
        receipt_id: Uuid,
        product_id: Uuid,
        quantity: i64,
        unit_cost: Decimal,
    ) -> Result<Option<StockReceiptItem>, AppError> {
        let mut state = self.state();
        let total_cost = Decimal::from(quantity) * unit_cost;
        let position = match state.receipts.get_mut(&receipt_id) {
            Some(header) if header.status == ReceiptStatus::Pending => {
                header.total_items += 1;
                header.total_cost += total_cost;
                header.updated_at = Utc::now();
                header.total_items
            }
            _ => return Ok(None),
        };
        let item = StockReceiptItem {
            id: Uuid::new_v4(),
            receipt_id,
            product_id,
            position,
            quantity,
            unit_cost,
            total_cost,
        };
        state.items.push(item.clone());
        Ok(Some(item))
    }

    async fn find_receipt(&self, receipt_id: Uuid) -> Result<Option<StockReceipt>, AppError> {
        Ok(self.state().receipts.get(&receipt_id).cloned())
    }

    async fn list_items(&self, receipt_id: Uuid) -> Result<Vec<StockReceiptItem>, AppError> {
        let mut state = self.state();
        state.trip(FailPoint::ListItems)?;
        let mut items: Vec<StockReceiptItem> = state
            .items
            .iter()
            .filter(|i| i.receipt_id == receipt_id)
            .cloned()
            .collect();
        items.sort_by_key(|i| i.position);
        Ok(items)
    }

    async fn transition(
        &self,
        receipt_id: Uuid,
        from: ReceiptStatus,
        to: ReceiptStatus,
    ) -> Result<Option<StockReceipt>, AppError> {
        let mut state = self.state();
        match state.receipts.get_mut(&receipt_id) {
            Some(receipt) if receipt.status == from => {
                receipt.status = to;
                receipt.updated_at = Utc::now();
                Ok(Some(receipt.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn finish_processing(
        &self,
        receipt_id: Uuid,
        status: ReceiptStatus,
        failed_items: i32,
    ) -> Result<Option<StockReceipt>, AppError> {
        let mut state = self.state();
        state.trip(FailPoint::FinishProcessing)?;
        match state.receipts.get_mut(&receipt_id) {
            Some(receipt) if receipt.status == ReceiptStatus::Processing => {
                let now = Utc::now();
                receipt.status = status;
                receipt.failed_items = failed_items;
                receipt.processed_at = Some(now);
                receipt.updated_at = now;
                Ok(Some(receipt.clone()))
            }
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl NewProductRepository for MemoryStore {
    async fn register_product(
        &self,
        product: &NewProduct,
        origin: &SightingOrigin,
    ) -> Result<(Product, Option<NewProductLogEntry>), AppError> {
        let mut state = self.state();
        if let Some(existing) = state.product_by_barcode(&product.barcode) {
            return Ok((existing.clone(), None));
        }
        // Produto e avistamento entram juntos ou nenhum dos dois.
        state.trip(FailPoint::ProductRegistration)?;

        let now = Utc::now();
        let created = Product {
            id: Uuid::new_v4(),
            sku: product.barcode.clone(),
            barcode: Some(product.barcode.clone()),
            name: product.display_name().to_string(),
            category: product.category.clone(),
            unit_price: product.unit_price,
            is_active: true,
            created_at: now,
        };
        let entry = NewProductLogEntry {
            id: Uuid::new_v4(),
            product_id: created.id,
            supplier_id: origin.supplier_id,
            receipt_id: origin.receipt_id,
            barcode: product.barcode.clone(),
            name: created.name.clone(),
            detected_at: now,
            is_exported: false,
            exported_at: None,
        };
        state.products.push(created.clone());
        state.new_products.push(entry.clone());
        Ok((created, Some(entry)))
    }

    async fn claim_pending(&self, supplier_id: Option<Uuid>) -> Result<Vec<ExportedNewProduct>, AppError> {
        let mut state = self.state();
        let now = Utc::now();
        let supplier_names: HashMap<Uuid, String> =
            state.suppliers.iter().map(|s| (s.id, s.name.clone())).collect();

        let mut exported = Vec::new();
        for entry in state.new_products.iter_mut() {
            let matches_supplier = supplier_id.is_none() || entry.supplier_id == supplier_id;
            if entry.is_exported || !matches_supplier {
                continue;
            }
            entry.is_exported = true;
            entry.exported_at = Some(now);
            exported.push(ExportedNewProduct {
                barcode: entry.barcode.clone(),
                name: entry.name.clone(),
                supplier_name: entry.supplier_id.and_then(|id| supplier_names.get(&id).cloned()),
                detected_at: entry.detected_at,
            });
        }
        Ok(exported)
    }
}

#[async_trait]
impl IdentityRepository for MemoryStore {
    async fn upsert(&self, upsert: &IdentityUpsert) -> Result<ExternalIdentityMapping, AppError> {
        let mut state = self.state();

        if let Some(variant) = &upsert.ids.external_variant_id {
            let taken = state
                .mappings
                .iter()
                .any(|m| m.barcode != upsert.barcode && m.external_variant_id.as_ref() == Some(variant));
            if taken {
                return Err(AppError::DuplicateConstraintViolation(
                    "external_identity_mappings_external_variant_id_key".into(),
                ));
            }
        }

        let now = Utc::now();
        if let Some(existing) = state.mappings.iter_mut().find(|m| m.barcode == upsert.barcode) {
            if upsert.ids.external_product_id.is_some() {
                existing.external_product_id = upsert.ids.external_product_id.clone();
            }
            if upsert.ids.external_variant_id.is_some() {
                existing.external_variant_id = upsert.ids.external_variant_id.clone();
            }
            if upsert.ids.external_inventory_item_id.is_some() {
                existing.external_inventory_item_id = upsert.ids.external_inventory_item_id.clone();
            }
            if upsert.search_time_ms.is_some() {
                existing.search_time_ms = upsert.search_time_ms;
            }
            existing.discovery_method = upsert.discovery_method;
            existing.confidence_score = existing.confidence_score.max(upsert.confidence_score);
            existing.last_verified_at = now;
            existing.verification_count += 1;
            return Ok(existing.clone());
        }

        let mapping = ExternalIdentityMapping {
            id: Uuid::new_v4(),
            barcode: upsert.barcode.clone(),
            external_product_id: upsert.ids.external_product_id.clone(),
            external_variant_id: upsert.ids.external_variant_id.clone(),
            external_inventory_item_id: upsert.ids.external_inventory_item_id.clone(),
            discovery_method: upsert.discovery_method,
            confidence_score: upsert.confidence_score,
            last_verified_at: now,
            verification_count: 1,
            search_time_ms: upsert.search_time_ms,
        };
        state.mappings.push(mapping.clone());
        Ok(mapping)
    }

    async fn find_by_barcode(&self, barcode: &str) -> Result<Option<ExternalIdentityMapping>, AppError> {
        Ok(self.state().mappings.iter().find(|m| m.barcode == barcode).cloned())
    }

    async fn mapped_barcodes(&self, barcodes: &[String]) -> Result<Vec<String>, AppError> {
        let state = self.state();
        Ok(barcodes
            .iter()
            .filter(|b| state.mappings.iter().any(|m| &m.barcode == *b))
            .cloned()
            .collect())
    }
}
