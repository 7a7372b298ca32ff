//! HTTP request handlers for the upload service.
//!
//! Implements the résumé upload and health check endpoints using axum.

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use vitae_domain::{ContactHints, DecodeOutcome, FieldPath, ParsedResume, RawDocument, Repair, UndecodableReason};
use vitae_extractor::{ExtractorError, ResumeParser};
use vitae_llm::CompletionBackend;

/// Multipart field carrying the document
pub const FILE_FIELD: &str = "file";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// The pipeline, shared by every request
    pub parser: Arc<ResumeParser<CompletionBackend>>,
    /// Largest accepted request body (bytes)
    pub max_upload_bytes: usize,
}

/// Successful parse response
#[derive(Debug, Serialize, Deserialize)]
pub struct ParseResponse {
    /// Always true
    pub success: bool,
    /// The recovered record
    pub data: ParsedResume,
    /// Fields the caller should double-check
    pub low_confidence_fields: Vec<FieldPath>,
    /// Changes the decoder made
    pub repairs: Vec<Repair>,
    /// The document was cut to fit the model's context window
    pub truncated: bool,
    /// Wall-clock pipeline time (milliseconds)
    pub processing_time_ms: u64,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// "healthy", or "shutting_down" once the pool stops admitting work
    pub status: String,
    /// Model behind the completion pool
    pub model: String,
    /// Number of completion instances
    pub pool_size: usize,
}

/// Error response envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always false
    pub success: bool,
    /// What went wrong
    pub error: ErrorBody,
}

/// Error details
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable snake_case label
    pub kind: String,
    /// Human-readable message
    pub message: String,
    /// Contact details recovered from an undecodable completion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salvaged_contact: Option<ContactHints>,
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// The request had no `file` part
    MissingFile,
    /// The multipart body could not be read
    Upload(MultipartError),
    /// The pipeline failed before producing an outcome
    Extractor(ExtractorError),
    /// The model's output could not be turned into a record
    Undecodable {
        /// Why decoding failed
        reason: UndecodableReason,
        /// What the regex fallback still found
        salvaged_contact: ContactHints,
    },
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::MissingFile => StatusCode::BAD_REQUEST,
            AppError::Upload(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Upload(_) => StatusCode::BAD_REQUEST,
            AppError::Extractor(e) => match e {
                ExtractorError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                ExtractorError::Extraction(_) | ExtractorError::EmptyDocument => StatusCode::UNPROCESSABLE_ENTITY,
                ExtractorError::ModelTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                ExtractorError::PromptTooLarge(_) | ExtractorError::Llm(_) | ExtractorError::Config(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            AppError::Undecodable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            AppError::MissingFile => "missing_file",
            AppError::Upload(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => "payload_too_large",
            AppError::Upload(_) => "bad_upload",
            AppError::Extractor(e) => e.kind(),
            AppError::Undecodable { .. } => "undecodable",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.kind().to_string();

        let (message, salvaged_contact) = match self {
            AppError::MissingFile => (format!("No '{}' part in the upload", FILE_FIELD), None),
            AppError::Upload(e) => (e.body_text(), None),
            AppError::Extractor(e) => (e.to_string(), None),
            AppError::Undecodable {
                reason,
                salvaged_contact,
            } => (
                format!("Model output could not be decoded: {}", reason),
                Some(salvaged_contact),
            ),
        };

        let body = Json(ErrorResponse {
            success: false,
            error: ErrorBody {
                kind,
                message,
                salvaged_contact,
            },
        });
        (status, body).into_response()
    }
}

impl From<ExtractorError> for AppError {
    fn from(e: ExtractorError) -> Self {
        AppError::Extractor(e)
    }
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        AppError::Upload(e)
    }
}

/// Read the first `file` part, keeping the client's file name
async fn read_upload(multipart: &mut Multipart) -> Result<(String, Vec<u8>), AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        return Ok((file_name, bytes.to_vec()));
    }
    Err(AppError::MissingFile)
}

/// POST /api/parse - Parse an uploaded résumé
///
/// The upload is held in memory; the format comes from the file name's
/// extension.
async fn parse_resume(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ParseResponse>, AppError> {
    let (file_name, bytes) = read_upload(&mut multipart).await?;
    info!("Received upload '{}' ({} bytes)", file_name, bytes.len());

    let report = state
        .parser
        .parse(RawDocument::from_filename(&file_name, bytes))
        .await
        .inspect_err(|e| warn!("Parse of '{}' failed: {}", file_name, e))?;

    let low_confidence_fields = report.outcome.low_confidence_fields();
    let (data, repairs) = match report.outcome {
        DecodeOutcome::Decoded(resume) => (resume, Vec::new()),
        DecodeOutcome::Repaired { resume, repairs, .. } => (resume, repairs),
        DecodeOutcome::Undecodable {
            reason,
            salvaged_contact,
            ..
        } => {
            return Err(AppError::Undecodable {
                reason,
                salvaged_contact,
            })
        }
    };

    Ok(Json(ParseResponse {
        success: true,
        data,
        low_confidence_fields,
        repairs,
        truncated: report.truncated,
        processing_time_ms: report.processing_time_ms,
    }))
}

/// GET /health - Pool status
async fn health_check(State(state): State<AppState>) -> Json<HealthCheckResponse> {
    let pool = state.parser.pool();
    let status = if pool.is_closed() { "shutting_down" } else { "healthy" };

    Json(HealthCheckResponse {
        status: status.to_string(),
        model: pool.model_name().to_string(),
        pool_size: pool.size(),
    })
}

/// Create the axum router with all routes
pub fn create_router(state: AppState) -> Router {
    let limit = state.max_upload_bytes;
    Router::new()
        .route("/api/parse", post(parse_resume))
        .route("/health", get(health_check))
        .layer(DefaultBodyLimit::max(limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extractor_error_statuses() {
        let cases = [
            (ExtractorError::UnsupportedFormat("txt".into()), StatusCode::UNSUPPORTED_MEDIA_TYPE),
            (ExtractorError::EmptyDocument, StatusCode::UNPROCESSABLE_ENTITY),
            (ExtractorError::Extraction("bad zip".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (ExtractorError::ModelTimeout { attempts: 2 }, StatusCode::GATEWAY_TIMEOUT),
            (ExtractorError::PromptTooLarge("no room".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (ExtractorError::Llm("refused".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(AppError::from(error).status(), status);
        }
    }

    #[test]
    fn test_undecodable_kind_and_status() {
        let error = AppError::Undecodable {
            reason: UndecodableReason::NoJsonObject,
            salvaged_contact: ContactHints::default(),
        };
        assert_eq!(error.kind(), "undecodable");
        assert_eq!(error.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_parse_response_shape() {
        let response = ParseResponse {
            success: true,
            data: ParsedResume::default(),
            low_confidence_fields: vec![FieldPath::from("contact")],
            repairs: vec![Repair::SyntaxRepaired],
            truncated: false,
            processing_time_ms: 12,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["low_confidence_fields"][0], "contact");
        assert_eq!(json["repairs"][0]["kind"], "syntax_repaired");
        assert!(json["data"]["skills"].as_array().unwrap().is_empty());
    }
}
