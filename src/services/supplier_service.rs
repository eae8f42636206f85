// src/services/supplier_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::CatalogRepository,
    models::{
        catalog::{derive_supplier_code, NewSupplier, Supplier},
        mapping::SupplierMappingConfig,
    },
};

#[derive(Clone)]
pub struct SupplierService {
    catalog_repo: Arc<dyn CatalogRepository>,
}

impl SupplierService {
    pub fn new(catalog_repo: Arc<dyn CatalogRepository>) -> Self {
        Self { catalog_repo }
    }

    pub async fn list_suppliers(&self) -> Result<Vec<Supplier>, AppError> {
        self.catalog_repo.list_suppliers().await
    }

    /// Cadastro explícito. Nome repetido é conflito (409).
    pub async fn create_supplier(
        &self,
        name: &str,
        column_alias_sets: Option<SupplierMappingConfig>,
    ) -> Result<Supplier, AppError> {
        let name = clean_name(name)?;

        let new_supplier = NewSupplier {
            code: derive_supplier_code(&name),
            name,
            column_alias_sets: column_alias_sets.unwrap_or_default(),
        };

        let supplier = self.catalog_repo.create_supplier(&new_supplier).await?;
        tracing::info!(supplier_id = %supplier.id, code = %supplier.code, "Fornecedor cadastrado");
        Ok(supplier)
    }

    /// Identifica o fornecedor de uma entrega.
    ///
    /// Com `supplier_id`, ele precisa existir. Só com o nome, o fornecedor é
    /// criado na hora (configuração de colunas vazia) se ainda não existir.
    pub async fn resolve_for_upload(
        &self,
        supplier_name: Option<&str>,
        supplier_id: Option<Uuid>,
    ) -> Result<Supplier, AppError> {
        if let Some(id) = supplier_id {
            return self
                .catalog_repo
                .find_supplier_by_id(id)
                .await?
                .ok_or(AppError::SupplierNotFound(id));
        }

        let name = supplier_name
            .ok_or_else(|| AppError::InvalidInput("Entregas exigem 'supplierName' ou 'supplierId'.".into()))
            .and_then(clean_name)?;

        let supplier = self
            .catalog_repo
            .ensure_supplier(&NewSupplier {
                code: derive_supplier_code(&name),
                name,
                column_alias_sets: SupplierMappingConfig::default(),
            })
            .await?;

        tracing::debug!(supplier_id = %supplier.id, "Fornecedor resolvido para upload");
        Ok(supplier)
    }

    // --- Mapeamento de colunas da loja ---

    /// Sem configuração salva, devolve o padrão genérico.
    pub async fn store_mapping(&self, store_id: Uuid) -> Result<SupplierMappingConfig, AppError> {
        Ok(self
            .catalog_repo
            .get_store_mapping(store_id)
            .await?
            .unwrap_or_else(SupplierMappingConfig::generic_default))
    }

    pub async fn save_store_mapping(
        &self,
        store_id: Uuid,
        config: &SupplierMappingConfig,
    ) -> Result<SupplierMappingConfig, AppError> {
        if config.is_empty() {
            return Err(AppError::InvalidInput("O mapeamento precisa de ao menos um apelido.".into()));
        }
        self.catalog_repo.save_store_mapping(store_id, config).await
    }

    /// Monta a lista de apelidos usada na resolução de colunas:
    /// fornecedor, depois loja, depois o padrão genérico.
    pub async fn mapping_for(
        &self,
        store_id: Uuid,
        supplier: Option<&Supplier>,
    ) -> Result<SupplierMappingConfig, AppError> {
        let mut layered = SupplierMappingConfig::generic_default();

        if let Some(store) = self.catalog_repo.get_store_mapping(store_id).await? {
            layered = store.layered_over(&layered);
        }
        if let Some(supplier) = supplier {
            layered = supplier.column_alias_sets.layered_over(&layered);
        }

        Ok(layered)
    }
}

fn clean_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidInput("O nome do fornecedor é obrigatório.".into()));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::models::mapping::SemanticField;

    fn service(store: &MemoryStore) -> SupplierService {
        SupplierService::new(Arc::new(store.clone()))
    }

    #[tokio::test]
    async fn creates_supplier_with_derived_code() {
        let store = MemoryStore::new();
        let supplier = service(&store).create_supplier("  Acme Foods Ltda ", None).await.unwrap();
        assert_eq!(supplier.name, "Acme Foods Ltda");
        assert_eq!(supplier.code, "ACMEFOODSL");
        assert!(supplier.is_active);
    }

    #[tokio::test]
    async fn duplicate_supplier_name_is_a_conflict() {
        let store = MemoryStore::new();
        let svc = service(&store);
        svc.create_supplier("Acme", None).await.unwrap();
        let err = svc.create_supplier("Acme", None).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateConstraintViolation(_)));
    }

    #[tokio::test]
    async fn upload_resolution_creates_supplier_once() {
        let store = MemoryStore::new();
        let svc = service(&store);
        let first = svc.resolve_for_upload(Some("Nova Distribuidora"), None).await.unwrap();
        let second = svc.resolve_for_upload(Some("Nova Distribuidora"), None).await.unwrap();
        assert_eq!(first.id, second.id);
        assert!(first.column_alias_sets.is_empty());
        assert_eq!(store.state().suppliers.len(), 1);
    }

    #[tokio::test]
    async fn supplier_names_match_regardless_of_case() {
        let store = MemoryStore::new();
        let svc = service(&store);
        let first = svc.resolve_for_upload(Some("Acme"), None).await.unwrap();
        let second = svc.resolve_for_upload(Some("acme "), None).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.name, "Acme");
        assert_eq!(store.state().suppliers.len(), 1);

        let err = svc.create_supplier("ACME", None).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateConstraintViolation(_)));
    }

    #[tokio::test]
    async fn upload_resolution_by_unknown_id_fails() {
        let store = MemoryStore::new();
        let missing = Uuid::new_v4();
        let err = service(&store).resolve_for_upload(Some("Acme"), Some(missing)).await.unwrap_err();
        assert!(matches!(err, AppError::SupplierNotFound(id) if id == missing));
    }

    #[tokio::test]
    async fn upload_resolution_requires_a_name() {
        let store = MemoryStore::new();
        let svc = service(&store);
        assert!(matches!(svc.resolve_for_upload(None, None).await, Err(AppError::InvalidInput(_))));
        assert!(matches!(svc.resolve_for_upload(Some("   "), None).await, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn supplier_aliases_come_before_store_and_default() {
        let store = MemoryStore::new();
        let svc = service(&store);
        let store_id = Uuid::new_v4();

        svc.save_store_mapping(
            store_id,
            &SupplierMappingConfig { quantity: vec!["saldo".into()], ..Default::default() },
        )
        .await
        .unwrap();
        let supplier = svc
            .create_supplier(
                "Acme",
                Some(SupplierMappingConfig { quantity: vec!["qtd entregue".into()], ..Default::default() }),
            )
            .await
            .unwrap();

        let layered = svc.mapping_for(store_id, Some(&supplier)).await.unwrap();
        let quantity = layered.aliases(SemanticField::Quantity);
        assert_eq!(quantity[0], "qtd entregue");
        assert_eq!(quantity[1], "saldo");
        assert!(quantity.iter().any(|a| a == "qty"));

        // Snapshot: sem fornecedor, loja e depois padrão.
        let snapshot = svc.mapping_for(store_id, None).await.unwrap();
        assert_eq!(snapshot.aliases(SemanticField::Quantity)[0], "saldo");
    }

    #[tokio::test]
    async fn store_mapping_defaults_to_generic_aliases() {
        let store = MemoryStore::new();
        let svc = service(&store);
        let config = svc.store_mapping(Uuid::new_v4()).await.unwrap();
        assert_eq!(config, SupplierMappingConfig::generic_default());

        let err = svc.save_store_mapping(Uuid::new_v4(), &SupplierMappingConfig::default()).await;
        assert!(matches!(err, Err(AppError::InvalidInput(_))));
    }
}
