use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro central, com `thiserror` para melhor ergonomia.
// Atenção à taxonomia: problema ESTRUTURAL (FormatError) aborta a importação
// inteira; problema de DADO vira `problems` dentro do StagedRecord e nunca
// passa por aqui.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // Planilha malformada: aba ausente, coluna obrigatória faltando, etc.
    #[error("Formato inválido: {0}")]
    FormatError(String),

    // O backend de visão não está configurado (sem GEMINI_API_KEY).
    #[error("Backend de visão indisponível")]
    VisionUnavailable,

    // Falha em UMA imagem. Normalmente vira diagnóstico na ImportSummary,
    // não resposta HTTP.
    #[error("Falha no backend de visão: {0}")]
    VisionBackend(String),

    #[error("Sessão de importação não encontrada")]
    SessionNotFound,

    #[error("Registro não encontrado na sessão")]
    RecordNotFound,

    #[error("Cliente não encontrado")]
    ClientNotFound,

    #[error("Material não encontrado")]
    MaterialNotFound,

    #[error("Visita não encontrada")]
    VisitNotFound,

    // Tentativa de aceitar um registro que ainda tem pendências.
    #[error("Registro possui pendências de revisão")]
    RecordNeedsReview,

    #[error("Violação de unicidade: {0}")]
    UniqueConstraintViolation(String),

    // Variante para erros de banco de dados (sqlx)
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado.
    // `anyhow::Error` é ótimo para capturar o contexto do erro.
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Retorna todos os detalhes da validação de payload.
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
            AppError::FormatError(ref msg) => {
                let body = Json(json!({ "error": msg }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::VisionUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Backend de visão não configurado. Defina GEMINI_API_KEY.",
            ),
            AppError::VisionBackend(ref msg) => {
                let body = Json(json!({ "error": msg }));
                return (StatusCode::BAD_GATEWAY, body).into_response();
            }
            AppError::SessionNotFound => {
                (StatusCode::NOT_FOUND, "Sessão de importação não encontrada.")
            }
            AppError::RecordNotFound => {
                (StatusCode::NOT_FOUND, "Registro não encontrado na sessão.")
            }
            AppError::ClientNotFound => (StatusCode::NOT_FOUND, "Cliente não encontrado."),
            AppError::MaterialNotFound => (StatusCode::NOT_FOUND, "Material não encontrado."),
            AppError::VisitNotFound => (StatusCode::NOT_FOUND, "Visita não encontrada."),
            AppError::RecordNeedsReview => (
                StatusCode::CONFLICT,
                "O registro possui pendências. Corrija os campos ou use force=true.",
            ),
            AppError::UniqueConstraintViolation(ref msg) => {
                let body = Json(json!({ "error": msg }));
                return (StatusCode::CONFLICT, body).into_response();
            }

            // Todos os outros erros (DatabaseError, InternalServerError) viram 500.
            // O `tracing` vai logar a mensagem detalhada que `thiserror` nos deu.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Ocorreu um erro inesperado.")
            }
        };

        // Resposta padrão para erros simples que só têm uma mensagem.
        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
