use std::collections::HashSet;

use thiserror::Error;

use crate::{Permission, PrincipalId, Role};

/// Caller with permissions resolved from its roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub principal_id: PrincipalId,
    pub roles: Vec<Role>,
    pub permissions: Vec<Permission>,
}

impl Principal {
    pub fn from_roles(principal_id: PrincipalId, roles: Vec<Role>) -> Self {
        let mut seen = HashSet::new();
        let permissions = roles
            .iter()
            .flat_map(permissions_for_role)
            .filter(|p| seen.insert(p.clone()))
            .collect();
        Self { principal_id, roles, permissions }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Static role policy.
///
/// `admin` gets the wildcard. `user` can read master data and raise invoices.
pub fn permissions_for_role(role: &Role) -> Vec<Permission> {
    match role.as_str() {
        "admin" => vec![Permission::ALL],
        "user" => vec![
            Permission::INVOICES_CREATE,
            Permission::INVOICES_READ,
            Permission::PARTIES_READ,
            Permission::PRODUCTS_READ,
        ],
        _ => Vec::new(),
    }
}

/// Pure policy check, no IO.
pub fn authorize(principal: &Principal, required: &Permission) -> Result<(), AuthzError> {
    let granted = principal
        .permissions
        .iter()
        .any(|p| p.is_wildcard() || p == required);

    if granted {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(roles: &[Role]) -> Principal {
        Principal::from_roles(PrincipalId::new(), roles.to_vec())
    }

    #[test]
    fn admin_is_allowed_everything() {
        let admin = principal(&[Role::ADMIN]);
        assert_eq!(authorize(&admin, &Permission::PARTIES_WRITE), Ok(()));
        assert_eq!(authorize(&admin, &Permission::new("anything.else")), Ok(()));
    }

    #[test]
    fn user_can_raise_invoices_but_not_edit_master_data() {
        let user = principal(&[Role::USER]);
        assert_eq!(authorize(&user, &Permission::INVOICES_CREATE), Ok(()));
        assert_eq!(authorize(&user, &Permission::PRODUCTS_READ), Ok(()));
        assert_eq!(
            authorize(&user, &Permission::PRODUCTS_WRITE),
            Err(AuthzError::Forbidden("products.write".to_string()))
        );
        assert!(authorize(&user, &Permission::INVOICES_DELETE).is_err());
    }

    #[test]
    fn unknown_roles_grant_nothing() {
        let guest = principal(&[Role::new("guest")]);
        assert!(guest.permissions.is_empty());
        assert!(authorize(&guest, &Permission::INVOICES_READ).is_err());
    }

    #[test]
    fn permissions_are_deduplicated_across_roles() {
        let both = principal(&[Role::USER, Role::USER]);
        assert_eq!(both.permissions.len(), 4);
    }
}
