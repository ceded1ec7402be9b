use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use common::prelude::{CreateExchange, ExchangeError, ExchangeId};

use crate::AppState;

/// Passcode length bounds, in characters. Enforced only for sender-chosen
/// passcodes; relay-generated codes are always 8 digits.
const PASSCODE_MIN_CHARS: usize = 4;
const PASSCODE_MAX_CHARS: usize = 16;

const LABEL_MAX_CHARS: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRequest {
    /// The encrypted bundle, as a compact JWE string.
    pub ciphertext: String,
    /// Sender-chosen passcode gating retrieval.
    #[serde(default)]
    pub passcode: Option<String>,
    /// Ask the relay to generate a passcode. Ignored when `passcode` is set.
    #[serde(default)]
    pub generate_passcode: bool,
    /// Informational label stored alongside the exchange.
    #[serde(default)]
    pub label: Option<String>,
    /// Requested lifetime in seconds; clamped to the tier maximum.
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// Compact JWS trust proof binding the sender to this ciphertext.
    #[serde(default)]
    pub proof: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateResponse {
    pub id: ExchangeId,
    /// Retrieval locator under the relay's external base URL.
    pub url: String,
    /// Absolute expiry, epoch milliseconds.
    pub expires_at: i64,
    /// `"P"` when retrieval requires a passcode, empty otherwise.
    pub access: String,
    /// Present only when the relay generated the passcode; shown once.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passcode: Option<String>,
    pub trusted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
}

pub async fn handler(
    State(state): State<AppState>,
    Json(req): Json<CreateRequest>,
) -> Result<impl IntoResponse, CreateError> {
    if let Some(passcode) = &req.passcode {
        let len = passcode.chars().count();
        if !(PASSCODE_MIN_CHARS..=PASSCODE_MAX_CHARS).contains(&len) {
            return Err(CreateError::InvalidField(format!(
                "passcode must be {} to {} characters",
                PASSCODE_MIN_CHARS, PASSCODE_MAX_CHARS
            )));
        }
    }
    if let Some(label) = &req.label {
        if label.chars().count() > LABEL_MAX_CHARS {
            return Err(CreateError::InvalidField(format!(
                "label must be at most {} characters",
                LABEL_MAX_CHARS
            )));
        }
    }

    let created = state
        .controller()
        .create(CreateExchange {
            ciphertext: req.ciphertext,
            passcode: req.passcode,
            generate_passcode: req.generate_passcode,
            label: req.label,
            expires_in_secs: req.expires_in,
            proof: req.proof,
        })
        .await?;

    let url = state.retrieval_url(&created.id);
    let access = if created.passcode_protected {
        "P".to_string()
    } else {
        String::new()
    };

    Ok((
        http::StatusCode::CREATED,
        Json(CreateResponse {
            id: created.id,
            url,
            expires_at: created.expires_at_ms,
            access,
            passcode: created.generated_passcode,
            trusted: created.trusted,
            issuer: created.issuer,
        }),
    )
        .into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum CreateError {
    #[error("invalid field: {0}")]
    InvalidField(String),
    #[error(transparent)]
    Exchange(#[from] ExchangeError),
}

impl IntoResponse for CreateError {
    fn into_response(self) -> Response {
        match self {
            CreateError::InvalidField(msg) => {
                (http::StatusCode::BAD_REQUEST, msg).into_response()
            }
            CreateError::Exchange(err) => match err {
                ExchangeError::InvalidPayload(msg) => (
                    http::StatusCode::BAD_REQUEST,
                    format!("invalid payload: {}", msg),
                )
                    .into_response(),
                ExchangeError::PayloadTooLarge { tier, limit } => (
                    http::StatusCode::PAYLOAD_TOO_LARGE,
                    format!("payload exceeds the {} tier limit of {} bytes", tier, limit),
                )
                    .into_response(),
                other => {
                    tracing::error!("exchange creation failed: {:?}", other);
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
