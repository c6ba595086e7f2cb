use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use catalog_core::{CatalogError, ErrorKind};

pub fn catalog_error_to_response(err: CatalogError) -> axum::response::Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let code = match err.kind() {
        ErrorKind::NotFound => "not_found",
        ErrorKind::BadRequest => "bad_request",
        ErrorKind::Validation => "validation_error",
        ErrorKind::Store => {
            tracing::error!(error = %err, "store failure");
            "store_error"
        }
    };
    json_error(status, code, err.message())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
            "statusCode": status.as_u16(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_kinds_to_statuses() {
        let cases = [
            (CatalogError::not_found("gone"), StatusCode::NOT_FOUND),
            (CatalogError::bad_request("bad"), StatusCode::BAD_REQUEST),
            (CatalogError::validation("nope"), StatusCode::BAD_REQUEST),
            (CatalogError::store("down"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(catalog_error_to_response(err).status(), status);
        }
    }
}
