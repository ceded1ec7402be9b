use axum::extract::{Json, Path, State};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use common::prelude::{ExchangeError, ExchangeId};

use crate::AppState;

const RECIPIENT_MIN_CHARS: usize = 1;
const RECIPIENT_MAX_CHARS: usize = 200;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestRequest {
    /// Who is fetching. Informational only; carries no authorization weight.
    pub recipient: String,
    #[serde(default)]
    pub passcode: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestResponse {
    pub files: Vec<FileDescriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub content_type: String,
    pub content: String,
}

pub async fn handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ManifestRequest>,
) -> Result<impl IntoResponse, ManifestError> {
    let recipient_len = req.recipient.chars().count();
    if !(RECIPIENT_MIN_CHARS..=RECIPIENT_MAX_CHARS).contains(&recipient_len) {
        return Err(ManifestError::InvalidField(format!(
            "recipient must be {} to {} characters",
            RECIPIENT_MIN_CHARS, RECIPIENT_MAX_CHARS
        )));
    }

    let id = ExchangeId::from(id);
    tracing::debug!(id = %id, recipient = %req.recipient, "manifest requested");

    let retrieved = state
        .controller()
        .retrieve(&id, req.passcode.as_deref())
        .await?;

    Ok((
        http::StatusCode::OK,
        Json(ManifestResponse {
            files: vec![FileDescriptor {
                content_type: retrieved.content_type.to_string(),
                content: retrieved.ciphertext,
            }],
        }),
    )
        .into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("invalid field: {0}")]
    InvalidField(String),
    #[error(transparent)]
    Exchange(#[from] ExchangeError),
}

impl IntoResponse for ManifestError {
    fn into_response(self) -> Response {
        match self {
            ManifestError::InvalidField(msg) => {
                (http::StatusCode::BAD_REQUEST, msg).into_response()
            }
            ManifestError::Exchange(err) => match err {
                ExchangeError::AuthRequired => (
                    http::StatusCode::UNAUTHORIZED,
                    Json(serde_json::json!({"error": "auth_required"})),
                )
                    .into_response(),
                ExchangeError::InvalidPasscode { remaining } => (
                    http::StatusCode::UNAUTHORIZED,
                    Json(serde_json::json!({
                        "error": "invalid_passcode",
                        "remaining_attempts": remaining,
                    })),
                )
                    .into_response(),
                ExchangeError::Locked => (
                    http::StatusCode::TOO_MANY_REQUESTS,
                    Json(serde_json::json!({
                        "error": "locked",
                        "remaining_attempts": 0,
                    })),
                )
                    .into_response(),
                // Expired reports the same shape as an unknown id so an
                // observer cannot tell whether the id ever existed.
                ExchangeError::NotFound | ExchangeError::Expired => (
                    http::StatusCode::NOT_FOUND,
                    Json(serde_json::json!({"error": "not_found"})),
                )
                    .into_response(),
                other => {
                    tracing::error!("exchange retrieval failed: {:?}", other);
                    (
                        http::StatusCode::INTERNAL_SERVER_ERROR,
                        "internal error".to_string(),
                    )
                        .into_response()
                }
            },
        }
    }
}
