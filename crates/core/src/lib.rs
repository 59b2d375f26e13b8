//! Domain foundation: ids, errors, money and text helpers.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod money;
pub mod text;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{InvoiceId, PartyId, ProductId};
pub use money::{Amount, round_cents, to_fixed_2};
pub use text::{is_blank, non_blank};
