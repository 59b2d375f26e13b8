use axum::{Router, routing::get};

pub mod common;
pub mod invoices;
pub mod parties;
pub mod products;
pub mod system;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/dashboard", get(system::dashboard))
        .nest("/parties", parties::router())
        .nest("/products", products::router())
        .nest("/invoices", invoices::router())
}
