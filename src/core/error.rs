// Centralized error handling for the guestbook

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

/// Errors that can occur while handling an account request
#[derive(Error, Debug)]
pub enum AccountError {
    /// Clients match on this exact text, so it is answered with 200.
    #[error("Not registered")]
    NotRegistered,

    #[error("Invalid value: {0}")]
    MalformedInput(String),

    #[error("Unable to determine client address")]
    UnknownClient,

    #[error("Internal server error")]
    Store(#[from] StoreError),
}

impl IntoResponse for AccountError {
    fn into_response(self) -> Response {
        let status = match &self {
            AccountError::NotRegistered => StatusCode::OK,
            AccountError::MalformedInput(_) => StatusCode::BAD_REQUEST,
            AccountError::UnknownClient => StatusCode::BAD_REQUEST,
            AccountError::Store(e) => {
                error!(error = %e, "Store operation failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, self.to_string()).into_response()
    }
}

impl From<rusqlite::Error> for AccountError {
    fn from(e: rusqlite::Error) -> Self {
        AccountError::Store(StoreError::Sqlite(e))
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Inserted user {0} could not be read back")]
    MissingAfterInsert(i64),
}

/// Reasons a pending unicode buffer cannot become a character
#[derive(Error, Debug, PartialEq, Eq)]
pub enum UnicodeError {
    #[error("Not a hexadecimal code point: {0:?}")]
    NotHex(String),

    #[error("Code point U+{0:X} is not a valid character")]
    InvalidCodePoint(u32),
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http_body_util::BodyExt;

    async fn body_text(response: Response) -> String {
        let (_, body) = response.into_parts();
        let bytes = Body::new(body).collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_not_registered_is_plain_sentinel() {
        let response = AccountError::NotRegistered.into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "Not registered");
    }

    #[tokio::test]
    async fn test_malformed_input_is_bad_request() {
        let response = AccountError::MalformedInput("abc".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "Invalid value: abc");
    }

    #[tokio::test]
    async fn test_store_error_hides_details() {
        let err: AccountError = rusqlite::Error::QueryReturnedNoRows.into();
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "Internal server error");
    }

    #[test]
    fn test_unicode_error_messages() {
        assert_eq!(
            UnicodeError::NotHex("zzzz".to_string()).to_string(),
            "Not a hexadecimal code point: \"zzzz\""
        );
        assert_eq!(
            UnicodeError::InvalidCodePoint(0xD800).to_string(),
            "Code point U+D800 is not a valid character"
        );
    }
}
