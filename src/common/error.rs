use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::mapping::SemanticField;
use crate::models::receipt::ReceiptStatus;

fn join_fields(fields: &[SemanticField]) -> String {
    fields.iter().map(|f| f.as_str()).collect::<Vec<_>>().join(", ")
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Entrada inválida: {0}")]
    InvalidInput(String),

    // --- Upload ---
    #[error("O arquivo enviado está vazio")]
    EmptyUpload,

    #[error("CSV malformado: {0}")]
    MalformedCsv(String),

    #[error("Colunas obrigatórias ausentes: {}", join_fields(.0))]
    MissingRequiredColumns(Vec<SemanticField>),

    #[error("Linha inválida: {0}")]
    RowValidation(String),

    #[error("Produto com código de barras '{0}' não existe no catálogo")]
    UnknownProductNotAllowed(String),

    // --- Cadastros ---
    #[error("Fornecedor {0} não encontrado")]
    SupplierNotFound(Uuid),

    #[error("Produto {0} não encontrado")]
    ProductNotFound(Uuid),

    #[error("Mapeamento para o código de barras '{0}' não encontrado")]
    MappingNotFound(String),

    // --- Recebimentos ---
    #[error("Recebimento {0} não encontrado")]
    ReceiptNotFound(Uuid),

    #[error("Recebimento {receipt_id} está em '{current}', mas a operação exige '{expected}'")]
    InvalidReceiptState {
        receipt_id: Uuid,
        current: ReceiptStatus,
        expected: ReceiptStatus,
    },

    // --- Persistência ---
    #[error("Violação de unicidade: {0}")]
    DuplicateConstraintViolation(String),

    #[error("Falha de persistência: {0}")]
    PersistenceFailure(String),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

// Converte erros do sqlx separando violação de unicidade do resto.
impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() {
                let constraint = db_err
                    .constraint()
                    .map(str::to_string)
                    .unwrap_or_else(|| db_err.message().to_string());
                return AppError::DuplicateConstraintViolation(constraint);
            }
        }
        AppError::PersistenceFailure(e.to_string())
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidInput(_)
            | AppError::EmptyUpload
            | AppError::MalformedCsv(_) => StatusCode::BAD_REQUEST,
            AppError::MissingRequiredColumns(_)
            | AppError::RowValidation(_)
            | AppError::UnknownProductNotAllowed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::SupplierNotFound(_)
            | AppError::ProductNotFound(_)
            | AppError::MappingNotFound(_)
            | AppError::ReceiptNotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidReceiptState { .. } | AppError::DuplicateConstraintViolation(_) => {
                StatusCode::CONFLICT
            }
            AppError::PersistenceFailure(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Mensagem segura para o usuário. Erros internos não vazam detalhes.
    pub fn public_message(&self) -> String {
        match self {
            AppError::PersistenceFailure(_) | AppError::InternalServerError(_) => {
                tracing::error!("Erro Interno do Servidor: {}", self);
                "Ocorreu um erro inesperado.".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if let AppError::ValidationError(errors) = &self {
            let mut details = std::collections::HashMap::new();
            for (field, field_errors) in errors.field_errors() {
                let messages: Vec<String> = field_errors
                    .iter()
                    .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                    .collect();
                details.insert(field.to_string(), messages);
            }
            let body = Json(json!({
                "error": "Um ou mais campos são inválidos.",
                "details": details,
            }));
            return (status, body).into_response();
        }

        let body = Json(json!({ "error": self.public_message() }));
        (status, body).into_response()
    }
}

// ---
// Erros por linha (não abortam o lote)
// ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RowErrorKind {
    RowValidation,
    UnknownProductNotAllowed,
    DuplicateConstraintViolation,
    InvalidReceiptState,
    PersistenceFailure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RowError {
    // Linha de dados (1 = primeira linha após o cabeçalho)
    pub row: usize,
    pub barcode: Option<String>,
    pub kind: RowErrorKind,
    pub message: String,
}

impl RowError {
    pub fn validation(row: usize, barcode: Option<String>, message: impl Into<String>) -> Self {
        Self { row, barcode, kind: RowErrorKind::RowValidation, message: message.into() }
    }

    /// Classifica um `AppError` que aconteceu durante o processamento de uma linha.
    pub fn from_app_error(row: usize, barcode: Option<String>, error: &AppError) -> Self {
        Self {
            row,
            barcode,
            kind: RowErrorKind::classify(error),
            message: error.to_string(),
        }
    }
}

impl RowErrorKind {
    pub fn classify(error: &AppError) -> Self {
        match error {
            AppError::UnknownProductNotAllowed(_) => RowErrorKind::UnknownProductNotAllowed,
            AppError::DuplicateConstraintViolation(_) => RowErrorKind::DuplicateConstraintViolation,
            AppError::InvalidReceiptState { .. } => RowErrorKind::InvalidReceiptState,
            AppError::PersistenceFailure(_)
            | AppError::InternalServerError(_)
            | AppError::ReceiptNotFound(_)
            | AppError::ProductNotFound(_) => RowErrorKind::PersistenceFailure,
            _ => RowErrorKind::RowValidation,
        }
    }
}
