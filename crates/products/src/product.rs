use core::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use exportdesk_core::{DomainError, DomainResult, Entity, ProductId, non_blank};

/// Columns a product upload sheet must carry; `description`, `hsn`,
/// `unitPrice` and `unit` are optional.
pub const REQUIRED_UPLOAD_COLUMNS: [&str; 1] = ["name"];

/// Catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    /// Harmonized System Nomenclature code printed on invoice lines.
    pub hsn: Option<String>,
    /// Default rate in USD per unit.
    pub unit_price: Option<Decimal>,
    pub unit: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub hsn: Option<String>,
    #[serde(default)]
    pub unit_price: Option<Decimal>,
    #[serde(default)]
    pub unit: Option<String>,
}

impl NewProduct {
    pub fn into_product(self, id: ProductId, created_at: DateTime<Utc>) -> DomainResult<Product> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if let Some(price) = self.unit_price {
            if price.is_sign_negative() && !price.is_zero() {
                return Err(DomainError::validation("unit_price cannot be negative"));
            }
        }

        Ok(Product {
            id,
            name: name.to_string(),
            description: non_blank(self.description),
            hsn: non_blank(self.hsn),
            unit_price: self.unit_price,
            unit: non_blank(self.unit),
            created_at,
        })
    }
}

/// One row of a bulk product upload.
///
/// `unitPrice` stays a string so a malformed cell drops the price, not the row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRow {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub hsn: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub unit_price: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
}

impl ProductRow {
    pub fn into_new_product(self) -> Option<NewProduct> {
        let name = non_blank(self.name)?;
        let unit_price = non_blank(self.unit_price)
            .and_then(|raw| Decimal::from_str(&raw).ok())
            .filter(|price| !price.is_sign_negative());

        Some(NewProduct {
            name,
            description: non_blank(self.description),
            hsn: non_blank(self.hsn),
            unit_price,
            unit: non_blank(self.unit),
        })
    }
}

/// Filter a bulk upload down to importable products.
pub fn products_from_rows(rows: Vec<ProductRow>) -> DomainResult<Vec<NewProduct>> {
    if rows.is_empty() {
        return Err(DomainError::validation("No data provided"));
    }

    let valid: Vec<NewProduct> = rows.into_iter().filter_map(ProductRow::into_new_product).collect();
    if valid.is_empty() {
        return Err(DomainError::validation("No valid products found (Name is required)"));
    }

    Ok(valid)
}

/// JSON uploads may carry prices as numbers; CSV always yields strings.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Int(i) => i.to_string(),
        Raw::Float(f) => f.to_string(),
    }))
}
