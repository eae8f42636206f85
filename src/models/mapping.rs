// src/models/mapping.rs

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// --- Campos Semânticos ---
// O atributo canônico, independente do nome da coluna na planilha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SemanticField {
    Barcode,
    Quantity,
    Name,
    Price,
    Category,
}

impl SemanticField {
    /// Ordem de resolução: os obrigatórios primeiro, para que eles
    /// "reivindiquem" as colunas antes dos opcionais.
    pub const RESOLUTION_ORDER: [SemanticField; 5] = [
        SemanticField::Barcode,
        SemanticField::Quantity,
        SemanticField::Name,
        SemanticField::Price,
        SemanticField::Category,
    ];

    pub fn is_required(self) -> bool {
        matches!(self, SemanticField::Barcode | SemanticField::Quantity)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SemanticField::Barcode => "barcode",
            SemanticField::Quantity => "quantity",
            SemanticField::Name => "name",
            SemanticField::Price => "price",
            SemanticField::Category => "category",
        }
    }
}

impl fmt::Display for SemanticField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---
// SupplierMappingConfig
// ---
// Lista ordenada de apelidos aceitos por campo. A ordem importa:
// o primeiro apelido que encontrar uma coluna vence.
// `Default` é a configuração vazia; os apelidos genéricos ficam em `generic_default()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct SupplierMappingConfig {
    pub barcode: Vec<String>,
    pub name: Vec<String>,
    pub quantity: Vec<String>,
    pub price: Vec<String>,
    pub category: Vec<String>,
}

fn aliases(list: &[&str]) -> Vec<String> {
    list.iter().map(|a| a.to_string()).collect()
}

impl SupplierMappingConfig {
    /// Apelidos usados quando nem o fornecedor nem a loja configuraram nada.
    pub fn generic_default() -> Self {
        Self {
            barcode: aliases(&["barcode", "ean", "upc", "gtin", "code", "sku"]),
            name: aliases(&["name", "description", "product", "item"]),
            quantity: aliases(&["quantity", "qty", "stock", "units"]),
            price: aliases(&["price", "unit_cost", "unit cost", "cost"]),
            category: aliases(&["category", "department", "group", "type"]),
        }
    }

    pub fn aliases(&self, field: SemanticField) -> &[String] {
        match field {
            SemanticField::Barcode => &self.barcode,
            SemanticField::Quantity => &self.quantity,
            SemanticField::Name => &self.name,
            SemanticField::Price => &self.price,
            SemanticField::Category => &self.category,
        }
    }

    fn aliases_mut(&mut self, field: SemanticField) -> &mut Vec<String> {
        match field {
            SemanticField::Barcode => &mut self.barcode,
            SemanticField::Quantity => &mut self.quantity,
            SemanticField::Name => &mut self.name,
            SemanticField::Price => &mut self.price,
            SemanticField::Category => &mut self.category,
        }
    }

    pub fn is_empty(&self) -> bool {
        SemanticField::RESOLUTION_ORDER
            .iter()
            .all(|field| self.aliases(*field).is_empty())
    }

    /// Empilha `fallback` atrás desta configuração: os apelidos próprios são
    /// tentados primeiro, depois os do fallback que ainda não aparecem.
    pub fn layered_over(&self, fallback: &SupplierMappingConfig) -> SupplierMappingConfig {
        let mut merged = self.clone();
        for field in SemanticField::RESOLUTION_ORDER {
            let list = merged.aliases_mut(field);
            for alias in fallback.aliases(field) {
                let already = list.iter().any(|a| a.eq_ignore_ascii_case(alias));
                if !already {
                    list.push(alias.clone());
                }
            }
        }
        merged
    }
}

// ---
// Resultado da resolução de cabeçalhos
// ---
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumn {
    pub index: usize,
    pub header: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedMapping {
    pub(crate) columns: BTreeMap<SemanticField, ResolvedColumn>,
    pub(crate) unmatched: Vec<String>,
}

impl ResolvedMapping {
    pub fn column(&self, field: SemanticField) -> Option<&ResolvedColumn> {
        self.columns.get(&field)
    }

    pub fn header(&self, field: SemanticField) -> Option<&str> {
        self.column(field).map(|c| c.header.as_str())
    }

    pub fn index(&self, field: SemanticField) -> Option<usize> {
        self.column(field).map(|c| c.index)
    }

    /// Cabeçalhos que não foram associados a nenhum campo.
    pub fn unmatched_headers(&self) -> &[String] {
        &self.unmatched
    }

    pub fn missing_required(&self) -> Vec<SemanticField> {
        SemanticField::RESOLUTION_ORDER
            .into_iter()
            .filter(|f| f.is_required() && !self.columns.contains_key(f))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layering_keeps_own_aliases_first_and_skips_repeats() {
        let supplier = SupplierMappingConfig {
            quantity: vec!["QTY".into(), "qtd".into()],
            ..Default::default()
        };
        let layered = supplier.layered_over(&SupplierMappingConfig::generic_default());
        assert_eq!(
            layered.aliases(SemanticField::Quantity),
            &["QTY", "qtd", "quantity", "stock", "units"].map(String::from)
        );
        assert_eq!(layered.barcode, SupplierMappingConfig::generic_default().barcode);
    }

    #[test]
    fn partial_json_config_fills_missing_fields_with_empty_lists() {
        let config: SupplierMappingConfig = serde_json::from_str(r#"{"barcode":["cod"]}"#).unwrap();
        assert_eq!(config.barcode, vec!["cod".to_string()]);
        assert!(config.quantity.is_empty());
        assert!(!config.is_empty());
        assert!(SupplierMappingConfig::default().is_empty());
    }
}
