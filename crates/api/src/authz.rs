//! Request-level authorization guard.
//!
//! Handlers call [`authorize_request`] before touching storage.

use exportdesk_auth::{AuthzError, Permission, Principal, authorize};

use crate::context::PrincipalContext;

pub fn authorize_request(
    principal: &PrincipalContext,
    required: &Permission,
) -> Result<(), AuthzError> {
    let resolved = Principal::from_roles(principal.principal_id(), principal.roles().to_vec());
    let result = authorize(&resolved, required);
    if let Err(e) = &result {
        tracing::info!(
            principal_id = %principal.principal_id(),
            permission = %required,
            error = %e,
            "request denied"
        );
    }
    result
}
