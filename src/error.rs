use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TranslateError {
    #[error("backend returned {status}: {body}")]
    Backend { status: u16, body: String },

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend response contained no completion: {0}")]
    MalformedResponse(String),

    #[error("no text to translate")]
    EmptyInput,

    #[error("source and target language must differ")]
    SameLanguage,

    #[error("unsupported model: {0}")]
    UnsupportedModel(String),

    #[error("max chunk size {0} outside allowed range 500..=4000")]
    ChunkSizeOutOfRange(usize),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, TranslateError>;

impl TranslateError {
    /// Validation failures are caught before any backend call and map to a
    /// client error; everything else is a server-side problem.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            TranslateError::EmptyInput
                | TranslateError::SameLanguage
                | TranslateError::UnsupportedModel(_)
                | TranslateError::ChunkSizeOutOfRange(_)
        )
    }
}

impl IntoResponse for TranslateError {
    fn into_response(self) -> Response {
        let status = if self.is_validation() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
