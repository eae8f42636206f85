// src/models/upload.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::common::error::{AppError, RowError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UploadMode {
    // Sobrescreve o saldo (contagem de estoque)
    CurrentStock,
    // Soma ao saldo (entrega de fornecedor)
    SupplierDelivery,
}

// ---
// Planilha bruta
// ---
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawRow {
    Cells(Vec<String>),
    // Linha que o leitor de CSV não conseguiu interpretar
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

impl CsvTable {
    /// Lê o arquivo: primeira linha = cabeçalhos, colunas em qualquer ordem.
    /// Linhas com número diferente de colunas são aceitas (`flexible`).
    pub fn parse(data: &[u8]) -> Result<Self, AppError> {
        let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
        if data.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(AppError::EmptyUpload);
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(data);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| AppError::MalformedCsv(e.to_string()))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let rows = reader
            .records()
            .map(|record| match record {
                Ok(r) => RawRow::Cells(r.iter().map(str::to_string).collect()),
                Err(e) => RawRow::Malformed(e.to_string()),
            })
            .collect();

        Ok(Self { headers, rows })
    }
}

// ---
// Registro normalizado
// ---
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRecord {
    // Número da linha de dados (1 = primeira linha após o cabeçalho)
    pub row: usize,
    pub barcode: String,
    pub name: Option<String>,
    pub quantity: i64,
    pub price: Option<Decimal>,
    pub category: Option<String>,
}

// ---
// Resumo devolvido ao chamador
// ---
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadSummary {
    pub total_products: usize,
    pub successful_updates: usize,
    pub new_products: usize,
    pub errors: usize,
    pub error_details: Vec<RowError>,
    // Códigos ainda sem mapeamento no catálogo externo (só entregas)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unsynced_barcodes: Vec<String>,
}

impl UploadSummary {
    pub fn push_error(&mut self, error: RowError) {
        self.errors += 1;
        self.error_details.push(error);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<UploadSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadOutcome {
    pub fn completed(summary: UploadSummary) -> Self {
        Self { success: true, summary: Some(summary), error: None }
    }

    pub fn rejected(error: &AppError) -> Self {
        Self { success: false, summary: None, error: Some(error.public_message()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_bom_and_trims_headers() {
        let table = CsvTable::parse(b"\xEF\xBB\xBF Barcode , Quantity\n123,4\n").unwrap();
        assert_eq!(table.headers, vec!["Barcode".to_string(), "Quantity".to_string()]);
        assert_eq!(table.rows, vec![RawRow::Cells(vec!["123".into(), "4".into()])]);
    }

    #[test]
    fn accepts_rows_of_uneven_length() {
        let table = CsvTable::parse(b"barcode,quantity,name\n1,2\n3,4,Arroz,extra\n").unwrap();
        assert_eq!(table.rows.len(), 2);
        assert!(matches!(&table.rows[0], RawRow::Cells(cells) if cells.len() == 2));
    }

    #[test]
    fn blank_input_is_an_empty_upload() {
        assert!(matches!(CsvTable::parse(b""), Err(AppError::EmptyUpload)));
        assert!(matches!(CsvTable::parse(b"\xEF\xBB\xBF \r\n"), Err(AppError::EmptyUpload)));
    }

    #[test]
    fn header_only_file_has_no_rows() {
        let table = CsvTable::parse(b"barcode,quantity\n").unwrap();
        assert!(table.rows.is_empty());
    }

    #[test]
    fn rejected_outcome_serializes_without_summary() {
        let outcome = UploadOutcome::rejected(&AppError::EmptyUpload);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["success"], false);
        assert!(json.get("summary").is_none());
        assert!(json["error"].is_string());
    }
}
