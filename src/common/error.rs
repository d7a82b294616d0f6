use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Erros da camada HTTP, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Token inválido")]
    InvalidToken,

    #[error("Contexto do restaurante inválido: {0}")]
    InvalidRestaurantContext(&'static str),

    // Token válido, mas o usuário não pertence ao restaurante pedido
    #[error("Usuário sem vínculo com o restaurante")]
    NotAMember,

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Retorna todos os detalhes da validação.
            AppError::ValidationError(errors) => {
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
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::InvalidToken | AppError::JwtError(_) => (
                StatusCode::UNAUTHORIZED,
                "Token de autenticação inválido ou ausente.".to_string(),
            ),
            AppError::InvalidRestaurantContext(message) => {
                (StatusCode::BAD_REQUEST, message.to_string())
            }
            AppError::NotAMember => (
                StatusCode::FORBIDDEN,
                "Você não tem acesso a este restaurante.".to_string(),
            ),

            // Todos os outros erros (DatabaseError, InternalServerError) viram 500.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Ocorreu um erro inesperado.".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

/// Falhas que o guard sabe absorver. "Nenhuma sessão hoje" não é erro, é estado.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardError {
    #[error("Falha ao consultar {collection}: {message}")]
    QueryFailure {
        collection: &'static str,
        message: String,
    },

    #[error("Assinatura de mudanças interrompida: {0}")]
    SubscriptionFailure(String),
}

impl GuardError {
    pub fn query(collection: &'static str, err: impl std::fmt::Display) -> Self {
        GuardError::QueryFailure {
            collection,
            message: err.to_string(),
        }
    }
}
