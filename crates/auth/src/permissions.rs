use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier such as `"invoices.read"`.
///
/// `"*"` grants everything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const ALL: Permission = Permission::from_static("*");

    pub const PARTIES_READ: Permission = Permission::from_static("parties.read");
    pub const PARTIES_WRITE: Permission = Permission::from_static("parties.write");
    pub const PRODUCTS_READ: Permission = Permission::from_static("products.read");
    pub const PRODUCTS_WRITE: Permission = Permission::from_static("products.write");
    pub const INVOICES_READ: Permission = Permission::from_static("invoices.read");
    pub const INVOICES_CREATE: Permission = Permission::from_static("invoices.create");
    pub const INVOICES_DELETE: Permission = Permission::from_static("invoices.delete");

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
