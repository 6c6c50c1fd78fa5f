use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::config::AppEnv;

pub const REGISTER_FAILED: &str = "Failed to register";
pub const LOGIN_FAILED: &str = "Failed to Login";
pub const PROFILE_UPDATE_FAILED: &str = "Failed to update profile";
pub const LIST_USERS_FAILED: &str = "Failed to fetch users";

/// Failures surfaced by the account handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(&'static str),

    #[error("Email already exists")]
    Conflict,

    /// Same message for unknown email and wrong password.
    #[error("Incorrect email or password")]
    Authentication,

    #[error("Server configuration error")]
    Configuration(&'static str),

    #[error("User not found")]
    NotFound,

    #[error("User not authenticated")]
    Unauthorized,

    #[error("{message}")]
    Upstream {
        message: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl ApiError {
    pub fn upstream(message: &'static str, source: impl Into<anyhow::Error>) -> Self {
        Self::Upstream {
            message,
            source: source.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Conflict | ApiError::Authentication => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Configuration(_) | ApiError::Upstream { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Raw detail for non-production responses. Only server-side failures
    /// carry any.
    fn detail(&self) -> Option<String> {
        match self {
            ApiError::Configuration(what) => Some((*what).to_string()),
            ApiError::Upstream { source, .. } => Some(format!("{source:#}")),
            _ => None,
        }
    }

    /// Converts into the JSON envelope, attaching raw detail outside production.
    pub fn into_envelope(self, env: AppEnv) -> ErrorEnvelope {
        let error = if env.is_production() {
            None
        } else {
            self.detail()
        };
        ErrorEnvelope {
            status: self.status_code(),
            body: ErrorBody {
                success: false,
                message: self.to_string(),
                error,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct ErrorEnvelope {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl IntoResponse for ErrorEnvelope {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Used where the environment is not at hand (extractor rejections); never
/// carries detail.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.into_envelope(AppEnv::Production).into_response()
    }
}
