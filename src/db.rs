use std::sync::Arc;

use sqlx::PgPool;

pub mod catalog_repo;
pub use catalog_repo::{CatalogRepository, PgCatalogRepository};
pub mod inventory_repo;
pub use inventory_repo::{InventoryRepository, PgInventoryRepository};
pub mod receipt_repo;
pub use receipt_repo::{PgReceiptRepository, ReceiptRepository};
pub mod new_product_repo;
pub use new_product_repo::{NewProductRepository, PgNewProductRepository};
pub mod identity_repo;
pub use identity_repo::{IdentityRepository, PgIdentityRepository};

#[cfg(test)]
pub mod memory;

// O conjunto de repositórios que os serviços recebem.
#[derive(Clone)]
pub struct Repositories {
    pub catalog: Arc<dyn CatalogRepository>,
    pub inventory: Arc<dyn InventoryRepository>,
    pub receipts: Arc<dyn ReceiptRepository>,
    pub new_products: Arc<dyn NewProductRepository>,
    pub identity: Arc<dyn IdentityRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            catalog: Arc::new(PgCatalogRepository::new(pool.clone())),
            inventory: Arc::new(PgInventoryRepository::new(pool.clone())),
            receipts: Arc::new(PgReceiptRepository::new(pool.clone())),
            new_products: Arc::new(PgNewProductRepository::new(pool.clone())),
            identity: Arc::new(PgIdentityRepository::new(pool)),
        }
    }

    #[cfg(test)]
    pub fn memory(store: &memory::MemoryStore) -> Self {
        Self {
            catalog: Arc::new(store.clone()),
            inventory: Arc::new(store.clone()),
            receipts: Arc::new(store.clone()),
            new_products: Arc::new(store.clone()),
            identity: Arc::new(store.clone()),
        }
    }
}
