//! Parties domain module (exporters, consignees and notify parties).
//!
//! Master data the invoice form pulls names, addresses and compliance numbers from.
//! Pure domain logic: validation and bulk-row normalization, no IO.

pub mod party;

pub use party::{NewParty, Party, PartyKind, PartyRow, REQUIRED_UPLOAD_COLUMNS, parties_from_rows};
