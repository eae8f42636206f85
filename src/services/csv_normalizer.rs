// src/services/csv_normalizer.rs

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::{
    common::error::RowError,
    models::{
        catalog::normalize_barcode,
        mapping::{ResolvedMapping, SemanticField},
        upload::{NormalizedRecord, RawRow},
    },
};

/// Converte as linhas brutas em registros tipados.
///
/// A sequência é preguiçosa e pode ser percorrida de novo: `records()` sempre
/// recomeça da primeira linha. Uma linha ruim vira `Err(RowError)` e não
/// interrompe as demais.
pub struct CsvNormalizer<'a> {
    rows: &'a [RawRow],
    mapping: &'a ResolvedMapping,
}

impl<'a> CsvNormalizer<'a> {
    pub fn new(rows: &'a [RawRow], mapping: &'a ResolvedMapping) -> Self {
        Self { rows, mapping }
    }

    pub fn records(&self) -> impl Iterator<Item = Result<NormalizedRecord, RowError>> + 'a {
        let mapping = self.mapping;
        self.rows
            .iter()
            .enumerate()
            .map(move |(idx, raw)| normalize_row(idx + 1, raw, mapping))
    }
}

fn cell<'r>(cells: &'r [String], mapping: &ResolvedMapping, field: SemanticField) -> Option<&'r str> {
    mapping
        .index(field)
        .and_then(|idx| cells.get(idx))
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
}

fn normalize_row(row: usize, raw: &RawRow, mapping: &ResolvedMapping) -> Result<NormalizedRecord, RowError> {
    let cells = match raw {
        RawRow::Cells(cells) => cells,
        RawRow::Malformed(reason) => {
            return Err(RowError::validation(row, None, format!("linha ilegível: {reason}")));
        }
    };

    // 1. Código de barras (chave de junção)
    let barcode = cell(cells, mapping, SemanticField::Barcode)
        .map(normalize_barcode)
        .ok_or_else(|| RowError::validation(row, None, "código de barras vazio"))?;

    // 2. Quantidade
    let raw_quantity = cell(cells, mapping, SemanticField::Quantity).ok_or_else(|| {
        RowError::validation(row, Some(barcode.clone()), "quantidade vazia")
    })?;
    let quantity = parse_quantity(raw_quantity).map_err(|msg| {
        RowError::validation(row, Some(barcode.clone()), format!("quantidade '{raw_quantity}' {msg}"))
    })?;

    // 3. Preço (opcional)
    let price = match cell(cells, mapping, SemanticField::Price) {
        Some(raw_price) => Some(parse_price(raw_price).ok_or_else(|| {
            RowError::validation(row, Some(barcode.clone()), format!("preço '{raw_price}' não é numérico"))
        })?),
        None => None,
    };

    Ok(NormalizedRecord {
        row,
        barcode,
        name: cell(cells, mapping, SemanticField::Name).map(str::to_string),
        quantity,
        price,
        category: cell(cells, mapping, SemanticField::Category).map(str::to_string),
    })
}

/// Aceita inteiros ("10") e decimais sem fração ("10.0"). Negativos são recusados.
fn parse_quantity(raw: &str) -> Result<i64, &'static str> {
    let value = match raw.parse::<i64>() {
        Ok(v) => v,
        Err(_) => {
            let decimal = Decimal::from_str(raw).map_err(|_| "não é numérica")?;
            if !decimal.fract().is_zero() {
                return Err("não é inteira");
            }
            decimal.to_i64().ok_or("está fora do intervalo")?
        }
    };

    if value < 0 {
        return Err("não pode ser negativa");
    }
    Ok(value)
}

// "2.50", "R$ 2,50", "$2.50"
fn parse_price(raw: &str) -> Option<Decimal> {
    let cleaned = raw
        .trim_start_matches("R$")
        .trim_start_matches('$')
        .trim_start_matches('€')
        .trim();
    let cleaned = if cleaned.contains(',') && !cleaned.contains('.') {
        cleaned.replace(',', ".")
    } else {
        cleaned.to_string()
    };
    Decimal::from_str(&cleaned).ok().filter(|d| !d.is_sign_negative())
}
