//! Error taxonomy shared by every handler.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::store::{StoreError, UniqueField};

#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or invalid input, or a duplicate unique field.
    #[error("{0}")]
    BadRequest(String),

    /// Login failure; never says which half of the credentials was wrong.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// Ride status transition not permitted from the current state.
    #[error("{0}")]
    Conflict(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::InvalidCredentials | AppError::Conflict(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Internal details stay in the logs.
    fn log_and_message(&self) -> String {
        if let AppError::Internal(e) = self {
            error!(error = ?e, "internal error");
        }
        self.to_string()
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate(UniqueField::Email) => {
                AppError::bad_request("User with this email already exists")
            }
            StoreError::Duplicate(UniqueField::EmployeeId) => {
                AppError::bad_request("Employee ID already exists")
            }
            StoreError::Backend(e) => AppError::Internal(e),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        warn!(error = %rejection.body_text(), "rejected request body");
        AppError::bad_request("Invalid request body")
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.log_and_message();
        (status, Json(json!({ "message": message }))).into_response()
    }
}

/// Errors of the `/api/admin` namespace, whose bodies also carry `success: false`.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct AdminError(#[from] pub AppError);

impl From<StoreError> for AdminError {
    fn from(e: StoreError) -> Self {
        Self(e.into())
    }
}

impl From<JsonRejection> for AdminError {
    fn from(rejection: JsonRejection) -> Self {
        Self(rejection.into())
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let status = self.0.status();
        let message = self.0.log_and_message();
        (
            status,
            Json(json!({ "success": false, "message": message })),
        )
            .into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// `Json` whose rejection is reported in the API's own error shape.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}
