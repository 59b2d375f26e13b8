use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Extension, Path, Query},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};

use exportdesk_auth::Permission;
use exportdesk_core::PartyId;
use exportdesk_parties::{NewParty, PartyKind, PartyRow, REQUIRED_UPLOAD_COLUMNS};

use crate::app::routes::common::{require, upload_rows};
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_party).get(list_parties))
        .route("/upload", post(upload_parties))
        .route("/:id", get(get_party).delete(delete_party))
}

pub async fn create_party(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<NewParty>,
) -> axum::response::Response {
    if let Err(res) = require(&principal, &Permission::PARTIES_WRITE) {
        return res;
    }

    match services.create_party(body).await {
        Ok(party) => (StatusCode::CREATED, Json(party)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn upload_parties(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    headers: HeaderMap,
    body: Bytes,
) -> axum::response::Response {
    if let Err(res) = require(&principal, &Permission::PARTIES_WRITE) {
        return res;
    }

    let rows = match upload_rows::<PartyRow>(&headers, &body, &REQUIRED_UPLOAD_COLUMNS) {
        Ok(rows) => rows,
        Err(res) => return res,
    };

    match services.import_parties(rows).await {
        Ok(summary) => (StatusCode::CREATED, Json(dto::ImportResponse::from(summary))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_parties(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::PartyListQuery>,
) -> axum::response::Response {
    if let Err(res) = require(&principal, &Permission::PARTIES_READ) {
        return res;
    }

    let kind = match query.kind.as_deref().map(str::parse::<PartyKind>).transpose() {
        Ok(kind) => kind,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.list_parties(kind).await {
        Ok(parties) => Json(parties).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_party(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(res) = require(&principal, &Permission::PARTIES_READ) {
        return res;
    }
    let id: PartyId = match errors::parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.get_party(id).await {
        Ok(party) => Json(party).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_party(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(res) = require(&principal, &Permission::PARTIES_WRITE) {
        return res;
    }
    let id: PartyId = match errors::parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.delete_party(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
