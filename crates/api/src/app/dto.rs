use serde::{Deserialize, Serialize};

use exportdesk_invoicing::Invoice;

use crate::app::services::{Dashboard, ImportSummary};

// -------------------------
// Request DTOs
// -------------------------

/// JSON form of a bulk upload: `{"data": [...]}`.
#[derive(Debug, Deserialize)]
pub struct UploadRequest<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PartyListQuery {
    pub kind: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct InvoiceListQuery {
    pub limit: Option<usize>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub imported: usize,
    pub skipped: usize,
}

impl From<ImportSummary> for ImportResponse {
    fn from(s: ImportSummary) -> Self {
        Self {
            imported: s.imported,
            skipped: s.skipped,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub total_invoices: u64,
    pub recent_invoices: Vec<InvoiceSummary>,
}

/// Invoice list entry shown on the dashboard.
#[derive(Debug, Serialize)]
pub struct InvoiceSummary {
    pub id: String,
    pub invoice_no: String,
    pub invoice_date: chrono::NaiveDate,
    pub exporter: String,
    pub consignee: String,
    pub total_amount_cif: String,
}

impl From<&Invoice> for InvoiceSummary {
    fn from(inv: &Invoice) -> Self {
        Self {
            id: inv.id.to_string(),
            invoice_no: inv.invoice_no.clone(),
            invoice_date: inv.invoice_date,
            exporter: inv.exporter.name.clone(),
            consignee: inv.consignee.name.clone(),
            total_amount_cif: exportdesk_core::to_fixed_2(inv.total_amount_cif),
        }
    }
}

impl From<Dashboard> for DashboardResponse {
    fn from(d: Dashboard) -> Self {
        Self {
            total_invoices: d.total_invoices,
            recent_invoices: d.recent.iter().map(InvoiceSummary::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use exportdesk_core::InvoiceId;
    use exportdesk_invoicing::{InvoiceDraft, ItemDraft};

    #[test]
    fn summary_names_both_parties_and_fixes_the_total() {
        let invoice = InvoiceDraft {
            invoice_no: "EXP-7".to_string(),
            invoice_date: "2024-04-01".to_string(),
            exporter_name: Some("Acme Exports".to_string()),
            consignee_name: Some("Globex GmbH".to_string()),
            items: vec![ItemDraft {
                description: Some("Turmeric".to_string()),
                quantity: Some("10".parse().unwrap()),
                rate: Some("2.5".parse().unwrap()),
                ..ItemDraft::default()
            }],
            ..InvoiceDraft::default()
        }
        .compose(InvoiceId::new(), Utc::now())
        .unwrap();

        let summary = InvoiceSummary::from(&invoice);
        assert_eq!(summary.exporter, "Acme Exports");
        assert_eq!(summary.consignee, "Globex GmbH");
        assert_eq!(summary.total_amount_cif, "25.00");

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["exporter"], "Acme Exports");
        assert_eq!(json["invoice_date"], "2024-04-01");
    }
}
