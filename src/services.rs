pub mod column_resolver;
pub mod csv_normalizer;
pub mod identity_service;
pub mod inventory_service;
pub mod new_product_service;
pub mod receipt_service;
pub mod reconciliation_service;
pub mod supplier_service;

use crate::db::Repositories;

use identity_service::IdentityService;
use inventory_service::InventoryService;
use new_product_service::NewProductService;
use receipt_service::ReceiptService;
use reconciliation_service::ReconciliationService;
use supplier_service::SupplierService;

// --- Monta o gráfico de dependências dos serviços ---
#[derive(Clone)]
pub struct Services {
    pub suppliers: SupplierService,
    pub inventory: InventoryService,
    pub receipts: ReceiptService,
    pub new_products: NewProductService,
    pub identity: IdentityService,
    pub reconciliation: ReconciliationService,
}

impl Services {
    pub fn new(repos: Repositories) -> Self {
        let suppliers = SupplierService::new(repos.catalog.clone());
        let inventory = InventoryService::new(repos.inventory.clone());
        let receipts = ReceiptService::new(repos.receipts.clone(), repos.catalog.clone(), inventory.clone());
        let new_products = NewProductService::new(repos.new_products.clone());
        let identity = IdentityService::new(repos.identity.clone());

        let reconciliation = ReconciliationService::new(
            repos.catalog,
            suppliers.clone(),
            inventory.clone(),
            receipts.clone(),
            new_products.clone(),
            identity.clone(),
        );

        Self { suppliers, inventory, receipts, new_products, identity, reconciliation }
    }
}
