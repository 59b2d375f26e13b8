use axum::body::Bytes;
use axum::http::{HeaderMap, StatusCode, header};
use serde::de::DeserializeOwned;

use exportdesk_auth::Permission;
use exportdesk_infra::read_rows;

use crate::app::dto::UploadRequest;
use crate::app::errors::{json_error, service_error_to_response};
use crate::app::services::ServiceError;
use crate::context::PrincipalContext;

/// 403 unless the caller holds `required`.
pub fn require(
    principal: &PrincipalContext,
    required: &Permission,
) -> Result<(), axum::response::Response> {
    crate::authz::authorize_request(principal, required)
        .map_err(|e| json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string()))
}

/// Decode an upload body: `text/csv` with a header line, otherwise `{"data": [...]}`.
pub fn upload_rows<T: DeserializeOwned>(
    headers: &HeaderMap,
    body: &Bytes,
    required_columns: &[&str],
) -> Result<Vec<T>, axum::response::Response> {
    if is_csv(headers) {
        return read_rows(body, required_columns)
            .map_err(|e| service_error_to_response(ServiceError::Import(e)));
    }

    serde_json::from_slice::<UploadRequest<T>>(body)
        .map(|req| req.data)
        .map_err(|e| json_error(StatusCode::BAD_REQUEST, "invalid_json", e.to_string()))
}

fn is_csv(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| {
            let mime = v.split(';').next().unwrap_or_default().trim();
            mime.eq_ignore_ascii_case("text/csv")
        })
        .unwrap_or(false)
}
