//src/main.rs

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod models;
mod services;

use crate::config::{AppState, Settings};
use crate::docs::ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG controla o nível; sem ele, "info".
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let settings = Settings::from_env()?;
    let app_state = AppState::new(&settings).await?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let app = router(app_state);

    let listener = TcpListener::bind(settings.bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(app_state: AppState) -> Router {
    let supplier_routes = Router::new()
        .route("/"
               ,get(handlers::suppliers::list_suppliers)
               .post(handlers::suppliers::create_supplier)
        );

    let store_routes = Router::new()
        .route("/column-mapping"
               ,get(handlers::suppliers::get_store_mapping)
               .put(handlers::suppliers::put_store_mapping)
        )
        .route("/uploads/current-stock", post(handlers::uploads::upload_current_stock))
        .route("/uploads/supplier-delivery", post(handlers::uploads::upload_supplier_delivery))
        .route("/inventory", get(handlers::inventory::list_inventory))
        .route("/products/{product_id}/movements", get(handlers::inventory::list_movements))
        .route("/receipts", post(handlers::receipts::create_receipt));

    let receipt_routes = Router::new()
        .route("/{receipt_id}", get(handlers::receipts::get_receipt))
        .route("/{receipt_id}/process", post(handlers::receipts::process_receipt))
        .route("/{receipt_id}/cancel", post(handlers::receipts::cancel_receipt));

    let identity_routes = Router::new()
        .route("/{barcode}"
               ,get(handlers::identity::get_mapping)
               .put(handlers::identity::put_mapping)
        );

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/new-products/export", post(handlers::new_products::export_new_products))
        .nest("/api/suppliers", supplier_routes)
        .nest("/api/stores/{store_id}", store_routes)
        .nest("/api/receipts", receipt_routes)
        .nest("/api/identity-mappings", identity_routes)
        .with_state(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
