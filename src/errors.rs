use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal(err)
    }
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<PlantError> for AppError {
    fn from(err: PlantError) -> Self {
        match err {
            PlantError::NotFound(_) => Self::not_found(err.to_string()),
            PlantError::BlankName => Self::bad_request(err.to_string()),
            PlantError::IdsExhausted => Self::internal(err),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}

/// Failures talking to the remote garden API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Non-2xx HTTP status.
    #[error("HTTP error! status: {0}")]
    Status(u16),

    /// The envelope reported something other than `"success"`.
    #[error("{0}")]
    Rejected(String),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("invalid response body: {0}")]
    Decode(String),

    #[error("local storage error: {0}")]
    Storage(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("Please fill in all customer information")]
    MissingCustomerInfo,

    #[error("Your cart is empty")]
    EmptyCart,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlantError {
    #[error("Name required")]
    BlankName,

    #[error("no plant with id {0}")]
    NotFound(u64),

    #[error("no plant ids left")]
    IdsExhausted,
}
