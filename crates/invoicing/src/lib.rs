//! Export invoice composition.
//!
//! Pure domain logic: draft validation, party/product auto-fill, line and CIF
//! totals, and the amount-in-words rendering printed on the invoice.

pub mod invoice;
pub mod words;

pub use invoice::{
    Addressee, Compliance, Invoice, InvoiceDraft, InvoiceItem, ItemDraft, References, Shipment,
};
pub use words::amount_in_words;
