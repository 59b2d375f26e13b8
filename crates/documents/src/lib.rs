//! Printable documents.
//!
//! [`layout`] turns an invoice into bands of labeled cells; [`pdf`] paints
//! those bands onto A4 pages.

pub mod layout;
pub mod pdf;

pub use layout::{Align, Band, BandKind, Cell, CellBody, Field, InvoiceLayout, Line, invoice_layout};
pub use pdf::{RenderError, invoice_filename, render_invoice_pdf};
