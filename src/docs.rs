// src/docs.rs

use utoipa::OpenApi;

use crate::common::error;
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Suppliers ---
        handlers::suppliers::list_suppliers,
        handlers::suppliers::create_supplier,
        handlers::suppliers::get_store_mapping,
        handlers::suppliers::put_store_mapping,

        // --- Uploads ---
        handlers::uploads::upload_current_stock,
        handlers::uploads::upload_supplier_delivery,

        // --- Inventory ---
        handlers::inventory::list_inventory,
        handlers::inventory::list_movements,

        // --- Receipts ---
        handlers::receipts::create_receipt,
        handlers::receipts::get_receipt,
        handlers::receipts::process_receipt,
        handlers::receipts::cancel_receipt,

        // --- New Products ---
        handlers::new_products::export_new_products,

        // --- Identity ---
        handlers::identity::get_mapping,
        handlers::identity::put_mapping,
    ),
    components(
        schemas(
            // --- Catalog ---
            models::catalog::Supplier,
            models::catalog::Product,
            models::mapping::SemanticField,
            models::mapping::SupplierMappingConfig,

            // --- Uploads ---
            models::upload::UploadMode,
            models::upload::UploadSummary,
            models::upload::UploadOutcome,
            error::RowError,
            error::RowErrorKind,

            // --- Inventory ---
            models::inventory::InventoryLevel,
            models::inventory::MovementType,
            models::inventory::ReferenceType,
            models::inventory::InventoryMovement,
            models::inventory::MovementSummary,
            models::inventory::MovementReport,

            // --- Receipts ---
            models::receipt::ReceiptStatus,
            models::receipt::StockReceipt,
            models::receipt::StockReceiptItem,
            models::receipt::ReceiptDetail,
            models::receipt::ReceiptLine,
            models::receipt::ItemFailure,
            models::receipt::ReceiptProcessing,

            // --- New Products ---
            models::new_product::ExportedNewProduct,

            // --- Identity ---
            models::identity::DiscoveryMethod,
            models::identity::ExternalIds,
            models::identity::ExternalIdentityMapping,

            // --- Payloads ---
            handlers::suppliers::CreateSupplierPayload,
            handlers::uploads::UploadPayload,
            handlers::receipts::CreateReceiptPayload,
            handlers::identity::UpsertMappingPayload,
        )
    ),
    tags(
        (name = "Suppliers", description = "Fornecedores e apelidos de coluna"),
        (name = "Uploads", description = "Conciliação de planilhas (contagem e entrega)"),
        (name = "Inventory", description = "Saldo atual e livro-razão"),
        (name = "Receipts", description = "Recebimentos de fornecedor"),
        (name = "New Products", description = "Produtos detectados pela primeira vez"),
        (name = "Identity", description = "Cache de identidade do catálogo externo")
    )
)]
pub struct ApiDoc;
