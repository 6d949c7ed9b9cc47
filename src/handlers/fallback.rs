use axum::{
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use tracing::debug;

pub async fn fallback_handler(uri: Uri) -> Response {
    debug!(path = %uri.path(), "No route for request");

    (StatusCode::NOT_FOUND, "Nothing to see here").into_response()
}
