use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};

use exportdesk_auth::Permission;

use crate::app::dto::DashboardResponse;
use crate::app::errors;
use crate::app::routes::common::require;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(principal): Extension<PrincipalContext>) -> impl IntoResponse {
    Json(serde_json::json!({
        "principal_id": principal.principal_id().to_string(),
        "email": principal.email(),
        "roles": principal.roles().iter().map(|r| r.as_str()).collect::<Vec<_>>(),
    }))
}

pub async fn dashboard(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(res) = require(&principal, &Permission::INVOICES_READ) {
        return res;
    }

    match services.dashboard().await {
        Ok(d) => Json(DashboardResponse::from(d)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
