// src/models/catalog.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::mapping::SupplierMappingConfig;

// ---
// 1. Fornecedor
// ---
// Os apelidos de coluna ficam num JSONB; o sqlx decodifica direto para a struct.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: Uuid,
    #[schema(example = "Acme Distribuidora")]
    pub name: String,
    #[schema(example = "ACMEDISTRI")]
    pub code: String,
    pub is_active: bool,
    #[sqlx(json)]
    pub column_alias_sets: SupplierMappingConfig,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSupplier {
    pub name: String,
    pub code: String,
    pub column_alias_sets: SupplierMappingConfig,
}

/// Gera o código curto do fornecedor a partir do nome: letras e dígitos,
/// em maiúsculas, no máximo 10 caracteres.
pub fn derive_supplier_code(name: &str) -> String {
    let code: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .take(10)
        .collect();

    if code.is_empty() { "SUP".to_string() } else { code }
}

// ---
// 2. Produto (catálogo)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub sku: String,
    #[schema(example = "7891000100103")]
    pub barcode: Option<String>,
    pub name: String,
    pub category: Option<String>,
    pub unit_price: Option<Decimal>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

// Produto criado automaticamente durante uma entrega.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub barcode: String,
    pub name: String,
    pub category: Option<String>,
    pub unit_price: Option<Decimal>,
}

impl NewProduct {
    // Sem nome na planilha, o próprio código de barras vira o nome.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() { &self.barcode } else { &self.name }
    }
}

/// Normaliza o código de barras para ser usado como chave de junção.
pub fn normalize_barcode(raw: &str) -> String {
    raw.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::plain("Acme", "ACME")]
    #[case::truncated("Distribuidora Central", "DISTRIBUID")]
    #[case::punctuation("A.B.C. & Filhos", "ABCFILHOS")]
    #[case::no_alphanumerics("!!!", "SUP")]
    fn derives_supplier_codes(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(derive_supplier_code(name), expected);
    }

    #[test]
    fn barcode_without_name_uses_the_barcode() {
        let product = NewProduct {
            barcode: "789".into(),
            name: "  ".into(),
            category: None,
            unit_price: None,
        };
        assert_eq!(product.display_name(), "789");
        assert_eq!(normalize_barcode(" ab12 "), "AB12");
    }
}
