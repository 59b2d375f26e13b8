//! Products domain module (catalog entries used to pre-fill invoice lines).

pub mod product;

pub use product::{NewProduct, Product, ProductRow, REQUIRED_UPLOAD_COLUMNS, products_from_rows};
