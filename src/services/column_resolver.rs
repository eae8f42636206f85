// src/services/column_resolver.rs

use std::collections::BTreeMap;

use crate::{
    common::error::AppError,
    models::mapping::{ResolvedColumn, ResolvedMapping, SemanticField, SupplierMappingConfig},
};

/// Associa os cabeçalhos da planilha aos campos semânticos.
///
/// Para cada campo, percorre os apelidos na ordem declarada; para cada apelido,
/// procura o primeiro cabeçalho (em minúsculas) que o contém. O primeiro par
/// apelido/cabeçalho encontrado vence, ou seja, a ordem dos apelidos desempata,
/// não a ordem das colunas. Uma coluna usada por um campo não é oferecida aos
/// campos seguintes.
pub fn resolve_columns(headers: &[String], config: &SupplierMappingConfig) -> ResolvedMapping {
    let lowered: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
    let mut claimed = vec![false; headers.len()];
    let mut columns = BTreeMap::new();

    for field in SemanticField::RESOLUTION_ORDER {
        let found = config.aliases(field).iter().find_map(|alias| {
            let alias = alias.trim().to_lowercase();
            if alias.is_empty() {
                return None;
            }
            lowered
                .iter()
                .enumerate()
                .find(|(idx, header)| !claimed[*idx] && header.contains(&alias))
                .map(|(idx, _)| idx)
        });

        if let Some(index) = found {
            claimed[index] = true;
            columns.insert(field, ResolvedColumn { index, header: headers[index].clone() });
        }
    }

    let unmatched = headers
        .iter()
        .zip(&claimed)
        .filter(|(_, used)| !**used)
        .map(|(h, _)| h.clone())
        .collect();

    ResolvedMapping { columns, unmatched }
}

/// Código de barras e quantidade são obrigatórios; sem eles o arquivo é recusado
/// antes de qualquer linha ser processada.
pub fn ensure_required(mapping: &ResolvedMapping) -> Result<(), AppError> {
    let missing = mapping.missing_required();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::MissingRequiredColumns(missing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn headers(list: &[&str]) -> Vec<String> {
        list.iter().map(|h| h.to_string()).collect()
    }

    #[rstest]
    #[case::exact(&["barcode", "quantity"], "barcode", "quantity")]
    #[case::mixed_case(&["Barcode", "Quantity"], "Barcode", "Quantity")]
    #[case::substring(&["EAN Code", "Qty On Hand"], "EAN Code", "Qty On Hand")]
    #[case::reordered(&["Stock", "Product Name", "UPC"], "UPC", "Stock")]
    fn resolves_required_columns_with_default_aliases(
        #[case] raw: &[&str],
        #[case] barcode: &str,
        #[case] quantity: &str,
    ) {
        let mapping = resolve_columns(&headers(raw), &SupplierMappingConfig::generic_default());
        assert_eq!(mapping.header(SemanticField::Barcode), Some(barcode));
        assert_eq!(mapping.header(SemanticField::Quantity), Some(quantity));
        assert!(ensure_required(&mapping).is_ok());
    }

    #[test]
    fn alias_order_breaks_ties_not_header_order() {
        let config = SupplierMappingConfig {
            barcode: vec!["ean".into(), "code".into()],
            quantity: vec!["qty".into()],
            ..SupplierMappingConfig::default()
        };
        // "code" aparece antes, mas "ean" é o primeiro apelido.
        let mapping = resolve_columns(&headers(&["item code", "ean", "qty"]), &config);
        assert_eq!(mapping.header(SemanticField::Barcode), Some("ean"));
        assert_eq!(mapping.index(SemanticField::Barcode), Some(1));
    }

    #[test]
    fn first_matching_header_wins_for_a_single_alias() {
        let config = SupplierMappingConfig {
            barcode: vec!["code".into()],
            quantity: vec!["qty".into()],
            ..SupplierMappingConfig::default()
        };
        let mapping = resolve_columns(&headers(&["supplier code", "bar code", "qty"]), &config);
        assert_eq!(mapping.header(SemanticField::Barcode), Some("supplier code"));
    }

    #[test]
    fn claimed_columns_are_not_reused_by_later_fields() {
        let mapping = resolve_columns(
            &headers(&["product_code", "qty"]),
            &SupplierMappingConfig::generic_default(),
        );
        assert_eq!(mapping.header(SemanticField::Barcode), Some("product_code"));
        assert_eq!(mapping.header(SemanticField::Name), None);
    }

    #[test]
    fn optional_fields_resolve_to_none_when_absent() {
        let mapping = resolve_columns(
            &headers(&["barcode", "quantity", "unit_cost", "notes"]),
            &SupplierMappingConfig::generic_default(),
        );
        assert_eq!(mapping.header(SemanticField::Price), Some("unit_cost"));
        assert_eq!(mapping.header(SemanticField::Category), None);
        assert_eq!(mapping.header(SemanticField::Name), None);
        assert_eq!(mapping.unmatched_headers(), &["notes".to_string()]);
    }

    #[test]
    fn missing_required_columns_are_all_named() {
        let mapping = resolve_columns(
            &headers(&["descricao", "preco"]),
            &SupplierMappingConfig::generic_default(),
        );
        match ensure_required(&mapping) {
            Err(AppError::MissingRequiredColumns(fields)) => {
                assert_eq!(fields, vec![SemanticField::Barcode, SemanticField::Quantity]);
            }
            other => panic!("esperava MissingRequiredColumns, veio {other:?}"),
        }
    }

    #[test]
    fn store_mapping_is_tried_before_the_generic_default() {
        let store = SupplierMappingConfig {
            quantity: vec!["saldo".into()],
            ..SupplierMappingConfig::default()
        };
        let layered = store.layered_over(&SupplierMappingConfig::generic_default());
        let mapping = resolve_columns(&headers(&["barcode", "stock", "saldo"]), &layered);
        assert_eq!(mapping.header(SemanticField::Quantity), Some("saldo"));

        // Sem "saldo", cai no apelido genérico.
        let mapping = resolve_columns(&headers(&["barcode", "stock"]), &layered);
        assert_eq!(mapping.header(SemanticField::Quantity), Some("stock"));
    }
}
