use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;

use crate::notion_client::NotionApiError;

use super::super::helpers::error_chain_fmt;

#[derive(thiserror::Error)]
pub enum SubscribeError {
    #[error("{0}")]
    ValidationError(String),
    #[error("The Notion integration token or database id is not configured.")]
    NotConfigured,
    #[error("Failed to read the Notion database schema.")]
    SchemaReadError { status: StatusCode, details: String },
    #[error("Notion rejected the record creation.")]
    RecordCreateError { status: StatusCode, details: String },
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl SubscribeError {
    /// Schema reads that failed with an upstream status keep that status;
    /// transport-level failures fall into the catch-all.
    pub(super) fn schema_read(error: NotionApiError) -> Self {
        match error {
            NotionApiError::Upstream { status, body } => SubscribeError::SchemaReadError {
                status: pass_through_status(status),
                details: body,
            },
            NotionApiError::Transport(e) => SubscribeError::UnexpectedError(
                anyhow::Error::new(e).context("Failed to read the Notion database schema."),
            ),
        }
    }

    pub(super) fn record_create(error: NotionApiError) -> Self {
        match error {
            NotionApiError::Upstream { status, body } => SubscribeError::RecordCreateError {
                status: pass_through_status(status),
                details: body,
            },
            NotionApiError::Transport(e) => SubscribeError::UnexpectedError(
                anyhow::Error::new(e).context("Failed to create the subscription record."),
            ),
        }
    }
}

fn pass_through_status(status: reqwest::StatusCode) -> StatusCode {
    StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl std::fmt::Debug for SubscribeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for SubscribeError {
    fn status_code(&self) -> StatusCode {
        match self {
            SubscribeError::ValidationError(_) => StatusCode::BAD_REQUEST,
            SubscribeError::NotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
            SubscribeError::SchemaReadError { status, .. } => *status,
            SubscribeError::RecordCreateError { status, .. } => *status,
            SubscribeError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            SubscribeError::ValidationError(_) => json!({ "error": "Invalid email" }),
            SubscribeError::NotConfigured => {
                json!({ "error": "Notion not configured on server" })
            }
            SubscribeError::SchemaReadError { details, .. } => {
                json!({ "error": "Failed to read Notion database schema", "details": details })
            }
            SubscribeError::RecordCreateError { details, .. } => {
                json!({ "error": "Notion API error", "details": details })
            }
            SubscribeError::UnexpectedError(e) => {
                json!({ "error": "Server error", "details": e.to_string() })
            }
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}
