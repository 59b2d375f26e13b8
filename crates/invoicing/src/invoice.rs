use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use exportdesk_core::{
    Amount, DomainError, DomainResult, Entity, InvoiceId, PartyId, is_blank, non_blank,
};
use exportdesk_parties::{Party, PartyKind};
use exportdesk_products::Product;

use crate::words::amount_in_words;

/// Smallest quantity an invoice line may carry.
const MIN_QUANTITY: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Name and postal address block (exporter, consignee, notify party).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Addressee {
    pub name: String,
    pub address: Option<String>,
}

/// Exporter registration details printed in the invoice header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compliance {
    #[serde(default)]
    pub gst_no: Option<String>,
    #[serde(default)]
    pub iec: Option<String>,
    #[serde(default)]
    pub lut_no: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub state_code: Option<String>,
    #[serde(default)]
    pub district_code: Option<String>,
    #[serde(default)]
    pub trade_agreement_code: Option<String>,
}

/// Commercial references.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct References {
    #[serde(default)]
    pub buyers_order_no: Option<String>,
    #[serde(default)]
    pub pi_no: Option<String>,
    #[serde(default)]
    pub terms_of_payment: Option<String>,
    #[serde(default)]
    pub mode_of_transport: Option<String>,
}

/// Logistics grid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipment {
    #[serde(default)]
    pub pre_carriage_by: Option<String>,
    #[serde(default)]
    pub place_of_receipt: Option<String>,
    #[serde(default)]
    pub country_of_origin: Option<String>,
    #[serde(default)]
    pub country_of_destination: Option<String>,
    #[serde(default)]
    pub vessel_flight_no: Option<String>,
    #[serde(default)]
    pub port_of_loading: Option<String>,
    #[serde(default)]
    pub port_of_discharge: Option<String>,
    #[serde(default)]
    pub final_destination: Option<String>,
}

impl Compliance {
    fn normalized(self) -> Self {
        Self {
            gst_no: non_blank(self.gst_no),
            iec: non_blank(self.iec),
            lut_no: non_blank(self.lut_no),
            state: non_blank(self.state),
            state_code: non_blank(self.state_code),
            district_code: non_blank(self.district_code),
            trade_agreement_code: non_blank(self.trade_agreement_code),
        }
    }
}

impl References {
    fn normalized(self) -> Self {
        Self {
            buyers_order_no: non_blank(self.buyers_order_no),
            pi_no: non_blank(self.pi_no),
            terms_of_payment: non_blank(self.terms_of_payment),
            mode_of_transport: non_blank(self.mode_of_transport),
        }
    }
}

impl Shipment {
    fn normalized(self) -> Self {
        Self {
            pre_carriage_by: non_blank(self.pre_carriage_by),
            place_of_receipt: non_blank(self.place_of_receipt),
            country_of_origin: non_blank(self.country_of_origin),
            country_of_destination: non_blank(self.country_of_destination),
            vessel_flight_no: non_blank(self.vessel_flight_no),
            port_of_loading: non_blank(self.port_of_loading),
            port_of_discharge: non_blank(self.port_of_discharge),
            final_destination: non_blank(self.final_destination),
        }
    }
}

/// Invoice line. Quantity is in kilograms, rate in USD per kilogram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceItem {
    pub sr_no: Option<String>,
    pub marks_and_nos: Option<String>,
    pub hsn: Option<String>,
    pub description: String,
    pub quantity: Decimal,
    pub rate: Decimal,
    /// `quantity × rate`, exact.
    pub total_amount: Decimal,
}

/// Export invoice record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub invoice_no: String,
    pub invoice_date: NaiveDate,
    pub exporter: Addressee,
    pub compliance: Compliance,
    pub consignee: Addressee,
    pub notify: Option<Addressee>,
    pub references: References,
    pub shipment: Shipment,
    pub items: Vec<InvoiceItem>,
    /// Grand total (CIF basis), exact sum of line totals.
    pub total_amount_cif: Decimal,
    pub amount_in_words: String,
    pub created_at: DateTime<Utc>,
}

impl Entity for Invoice {
    type Id = InvoiceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Line as submitted by the invoice form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDraft {
    #[serde(default)]
    pub sr_no: Option<String>,
    #[serde(default)]
    pub marks_and_nos: Option<String>,
    #[serde(default)]
    pub hsn: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub quantity: Option<Decimal>,
    #[serde(default)]
    pub rate: Option<Decimal>,
}

/// Invoice as submitted by the invoice form, before validation.
///
/// Party references are optional lookups; the free-text fields stay editable
/// and win over whatever the referenced party holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceDraft {
    #[serde(default)]
    pub invoice_no: String,
    #[serde(default)]
    pub invoice_date: String,

    #[serde(default)]
    pub exporter_id: Option<PartyId>,
    #[serde(default)]
    pub exporter_name: Option<String>,
    #[serde(default)]
    pub exporter_address: Option<String>,
    #[serde(flatten)]
    pub compliance: Compliance,

    #[serde(default)]
    pub consignee_id: Option<PartyId>,
    #[serde(default)]
    pub consignee_name: Option<String>,
    #[serde(default)]
    pub consignee_address: Option<String>,

    #[serde(default)]
    pub notify_id: Option<PartyId>,
    #[serde(default)]
    pub notify_name: Option<String>,
    #[serde(default)]
    pub notify_address: Option<String>,

    #[serde(flatten)]
    pub references: References,
    #[serde(flatten)]
    pub shipment: Shipment,

    #[serde(default)]
    pub items: Vec<ItemDraft>,
}

fn fill_blank(field: &mut Option<String>, value: Option<&String>) {
    if is_blank(field.as_deref()) {
        if let Some(v) = value {
            *field = Some(v.clone());
        }
    }
}

fn ensure_kind(party: &Party, expected: PartyKind, field: &str) -> DomainResult<()> {
    if party.kind != expected {
        return Err(DomainError::validation(format!(
            "{field} must reference a party of kind {expected} (got {})",
            party.kind
        )));
    }
    Ok(())
}

impl InvoiceDraft {
    /// Fill blank header fields from the referenced parties.
    ///
    /// Each party must carry the kind its slot requires.
    pub fn apply_parties(
        &mut self,
        exporter: Option<&Party>,
        consignee: Option<&Party>,
        notify: Option<&Party>,
    ) -> DomainResult<()> {
        if let Some(p) = exporter {
            ensure_kind(p, PartyKind::Exporter, "exporter_id")?;
            fill_blank(&mut self.exporter_name, Some(&p.name));
            fill_blank(&mut self.exporter_address, p.address.as_ref());
            fill_blank(&mut self.compliance.gst_no, p.gst_no.as_ref());
            fill_blank(&mut self.compliance.iec, p.iec.as_ref());
        }
        if let Some(p) = consignee {
            ensure_kind(p, PartyKind::Consignee, "consignee_id")?;
            fill_blank(&mut self.consignee_name, Some(&p.name));
            fill_blank(&mut self.consignee_address, p.address.as_ref());
        }
        if let Some(p) = notify {
            ensure_kind(p, PartyKind::NotifyParty, "notify_id")?;
            fill_blank(&mut self.notify_name, Some(&p.name));
            fill_blank(&mut self.notify_address, p.address.as_ref());
        }
        Ok(())
    }

    /// Lines whose description names a catalog product take its HSN code
    /// (when blank) and unit price (when no rate was given).
    pub fn apply_products(&mut self, products: &[Product]) {
        for item in &mut self.items {
            let Some(description) = item.description.as_deref().map(str::trim) else {
                continue;
            };
            let Some(product) = products.iter().find(|p| p.name == description) else {
                continue;
            };
            fill_blank(&mut item.hsn, product.hsn.as_ref());
            if item.rate.is_none() {
                item.rate = Some(product.unit_price.unwrap_or(Decimal::ZERO));
            }
        }
    }

    /// Validate the draft and derive line totals, the CIF total and its
    /// spelling. Every problem is reported in one validation error.
    pub fn compose(self, id: InvoiceId, created_at: DateTime<Utc>) -> DomainResult<Invoice> {
        let mut issues: Vec<String> = Vec::new();

        let invoice_no = self.invoice_no.trim().to_string();
        if invoice_no.is_empty() {
            issues.push("invoice_no: Invoice No is required".to_string());
        }

        let invoice_date = match parse_invoice_date(&self.invoice_date) {
            Ok(d) => Some(d),
            Err(msg) => {
                issues.push(format!("invoice_date: {msg}"));
                None
            }
        };

        let exporter_name = non_blank(self.exporter_name);
        if exporter_name.is_none() {
            issues.push("exporter_name: Exporter Name required".to_string());
        }
        let consignee_name = non_blank(self.consignee_name);
        if consignee_name.is_none() {
            issues.push("consignee_name: Consignee Name required".to_string());
        }

        if self.items.is_empty() {
            issues.push("items: Add at least one item".to_string());
        }

        let mut items = Vec::with_capacity(self.items.len());
        let mut total = Decimal::ZERO;
        for (idx, draft) in self.items.into_iter().enumerate() {
            match compose_item(draft) {
                Ok(item) => {
                    match total.checked_add(item.total_amount) {
                        Some(t) => total = t,
                        None => issues.push("items: total value is out of range".to_string()),
                    }
                    items.push(item);
                }
                Err(item_issues) => issues.extend(
                    item_issues
                        .into_iter()
                        .map(|(field, msg)| format!("items[{idx}].{field}: {msg}")),
                ),
            }
        }

        let words = match Amount::new(total) {
            Ok(amount) => Some(amount_in_words(amount)),
            Err(e) => {
                issues.push(format!("total_amount_cif: {e}"));
                None
            }
        };

        if !issues.is_empty() {
            return Err(DomainError::validation(issues.join("; ")));
        }

        let notify_name = non_blank(self.notify_name);
        let notify = notify_name.map(|name| Addressee {
            name,
            address: non_blank(self.notify_address),
        });

        Ok(Invoice {
            id,
            invoice_no,
            invoice_date: invoice_date.unwrap_or_default(),
            exporter: Addressee {
                name: exporter_name.unwrap_or_default(),
                address: non_blank(self.exporter_address),
            },
            compliance: self.compliance.normalized(),
            consignee: Addressee {
                name: consignee_name.unwrap_or_default(),
                address: non_blank(self.consignee_address),
            },
            notify,
            references: self.references.normalized(),
            shipment: self.shipment.normalized(),
            items,
            total_amount_cif: total,
            amount_in_words: words.unwrap_or_default(),
            created_at,
        })
    }
}

fn compose_item(draft: ItemDraft) -> Result<InvoiceItem, Vec<(&'static str, &'static str)>> {
    let mut issues = Vec::new();

    let description = non_blank(draft.description);
    if description.is_none() {
        issues.push(("description", "Description is required"));
    }

    let quantity = draft.quantity.filter(|q| *q >= MIN_QUANTITY);
    if quantity.is_none() {
        issues.push(("quantity", "Qty required"));
    }

    let rate = draft.rate.filter(|r| !r.is_sign_negative() || r.is_zero());
    if rate.is_none() {
        issues.push(("rate", "Rate required"));
    }

    let (Some(description), Some(quantity), Some(rate)) = (description, quantity, rate) else {
        return Err(issues);
    };

    let total_amount = quantity
        .checked_mul(rate)
        .ok_or_else(|| vec![("total_amount", "amount is out of range")])?;

    Ok(InvoiceItem {
        sr_no: non_blank(draft.sr_no),
        marks_and_nos: non_blank(draft.marks_and_nos),
        hsn: non_blank(draft.hsn),
        description,
        quantity,
        rate,
        total_amount,
    })
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp.
fn parse_invoice_date(raw: &str) -> Result<NaiveDate, &'static str> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("Date is required");
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map_err(|_| "Date must be YYYY-MM-DD")
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::str::FromStr;
    use exportdesk_core::ProductId;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn item(description: &str, quantity: &str, rate: &str) -> ItemDraft {
        ItemDraft {
            description: Some(description.to_string()),
            quantity: Some(dec(quantity)),
            rate: Some(dec(rate)),
            ..ItemDraft::default()
        }
    }

    fn draft() -> InvoiceDraft {
        InvoiceDraft {
            invoice_no: "EXP/24-25/001".to_string(),
            invoice_date: "2024-06-15".to_string(),
            exporter_name: Some("Acme Exports".to_string()),
            consignee_name: Some("Globex GmbH".to_string()),
            items: vec![item("Basmati Rice", "1000", "1.20"), item("Cumin Seeds", "250.5", "2")],
            ..InvoiceDraft::default()
        }
    }

    fn party(kind: PartyKind, name: &str) -> Party {
        Party {
            id: PartyId::new(),
            kind,
            name: name.to_string(),
            address: Some(format!("{name} address")),
            gst_no: Some("27AAACA1234A1Z5".to_string()),
            iec: Some("0123456789".to_string()),
            pan: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn compose_computes_line_totals_total_and_words() {
        let invoice = draft().compose(InvoiceId::new(), Utc::now()).unwrap();

        assert_eq!(invoice.items[0].total_amount, dec("1200.00"));
        assert_eq!(invoice.items[1].total_amount, dec("501.0"));
        assert_eq!(invoice.total_amount_cif, dec("1701"));
        assert_eq!(
            invoice.amount_in_words,
            "ONE THOUSAND SEVEN HUNDRED ONE ONLY"
        );
        assert_eq!(invoice.invoice_date, NaiveDate::from_ymd_opt(2024, 6, 15).unwrap());
    }

    #[test]
    fn compose_spells_cents() {
        let mut d = draft();
        d.items = vec![item("Cardamom", "3", "500.1666")];
        let invoice = d.compose(InvoiceId::new(), Utc::now()).unwrap();
        assert_eq!(invoice.total_amount_cif, dec("1500.4998"));
        assert_eq!(
            invoice.amount_in_words,
            "ONE THOUSAND FIVE HUNDRED AND 50/100 ONLY"
        );
    }

    #[test]
    fn compose_reports_every_issue_at_once() {
        let d = InvoiceDraft {
            items: vec![ItemDraft {
                quantity: Some(dec("0.001")),
                rate: Some(dec("-1")),
                ..ItemDraft::default()
            }],
            ..InvoiceDraft::default()
        };

        let err = d.compose(InvoiceId::new(), Utc::now()).unwrap_err();
        let DomainError::Validation(msg) = err else {
            panic!("expected validation error");
        };
        for expected in [
            "invoice_no: Invoice No is required",
            "invoice_date: Date is required",
            "exporter_name: Exporter Name required",
            "consignee_name: Consignee Name required",
            "items[0].description: Description is required",
            "items[0].quantity: Qty required",
            "items[0].rate: Rate required",
        ] {
            assert!(msg.contains(expected), "missing '{expected}' in {msg}");
        }
    }

    #[test]
    fn compose_requires_at_least_one_item() {
        let mut d = draft();
        d.items.clear();
        let err = d.compose(InvoiceId::new(), Utc::now()).unwrap_err();
        assert_eq!(err, DomainError::validation("items: Add at least one item"));
    }

    #[test]
    fn compose_rejects_malformed_dates_and_accepts_rfc3339() {
        let mut d = draft();
        d.invoice_date = "15/06/2024".to_string();
        assert!(d.compose(InvoiceId::new(), Utc::now()).is_err());

        let mut d = draft();
        d.invoice_date = "2024-06-15T10:00:00+05:30".to_string();
        let invoice = d.compose(InvoiceId::new(), Utc::now()).unwrap();
        assert_eq!(invoice.invoice_date, NaiveDate::from_ymd_opt(2024, 6, 15).unwrap());
    }

    #[test]
    fn zero_rate_is_allowed() {
        let mut d = draft();
        d.items = vec![item("Free samples", "5", "0")];
        let invoice = d.compose(InvoiceId::new(), Utc::now()).unwrap();
        assert_eq!(invoice.amount_in_words, "ZERO ONLY");
    }

    #[test]
    fn blank_notify_name_means_no_notify_party() {
        let mut d = draft();
        d.notify_name = Some("  ".to_string());
        d.notify_address = Some("Somewhere".to_string());
        let invoice = d.compose(InvoiceId::new(), Utc::now()).unwrap();
        assert_eq!(invoice.notify, None);
    }

    #[test]
    fn apply_parties_fills_only_blank_fields() {
        let exporter = party(PartyKind::Exporter, "Acme Exports");
        let consignee = party(PartyKind::Consignee, "Globex GmbH");

        let mut d = InvoiceDraft {
            exporter_name: None,
            consignee_name: Some("Globex Hamburg Branch".to_string()),
            ..InvoiceDraft::default()
        };
        d.apply_parties(Some(&exporter), Some(&consignee), None).unwrap();

        assert_eq!(d.exporter_name.as_deref(), Some("Acme Exports"));
        assert_eq!(d.exporter_address.as_deref(), Some("Acme Exports address"));
        assert_eq!(d.compliance.gst_no.as_deref(), Some("27AAACA1234A1Z5"));
        assert_eq!(d.compliance.iec.as_deref(), Some("0123456789"));
        assert_eq!(d.consignee_name.as_deref(), Some("Globex Hamburg Branch"));
        assert_eq!(d.consignee_address.as_deref(), Some("Globex GmbH address"));
    }

    #[test]
    fn apply_parties_rejects_wrong_kind() {
        let not_an_exporter = party(PartyKind::Consignee, "Globex GmbH");
        let mut d = InvoiceDraft::default();
        let err = d.apply_parties(Some(&not_an_exporter), None, None).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn apply_products_fills_hsn_and_missing_rate() {
        let products = vec![Product {
            id: ProductId::new(),
            name: "Basmati Rice".to_string(),
            description: None,
            hsn: Some("10063020".to_string()),
            unit_price: Some(dec("1.35")),
            unit: Some("KGS".to_string()),
            created_at: Utc::now(),
        }];

        let mut d = draft();
        d.items[0].rate = None;
        d.items.push(ItemDraft {
            description: Some("Basmati Rice".to_string()),
            quantity: Some(dec("10")),
            rate: Some(dec("2")),
            hsn: Some("1006".to_string()),
            ..ItemDraft::default()
        });
        d.apply_products(&products);

        assert_eq!(d.items[0].rate, Some(dec("1.35")));
        assert_eq!(d.items[0].hsn.as_deref(), Some("10063020"));
        assert_eq!(d.items[1].hsn, None);
        assert_eq!(d.items[2].rate, Some(dec("2")));
        assert_eq!(d.items[2].hsn.as_deref(), Some("1006"));
    }

    #[test]
    fn draft_deserializes_flattened_sections() {
        let d: InvoiceDraft = serde_json::from_str(
            r#"{
                "invoice_no": "EXP-1",
                "invoice_date": "2024-01-02",
                "exporter_name": "Acme",
                "consignee_name": "Globex",
                "lut_no": "AD270324001",
                "port_of_loading": "Nhava Sheva",
                "terms_of_payment": "CAD",
                "items": [{"description": "Rice", "quantity": 10, "rate": "1.5"}]
            }"#,
        )
        .unwrap();

        assert_eq!(d.compliance.lut_no.as_deref(), Some("AD270324001"));
        assert_eq!(d.shipment.port_of_loading.as_deref(), Some("Nhava Sheva"));
        assert_eq!(d.references.terms_of_payment.as_deref(), Some("CAD"));
        let invoice = d.compose(InvoiceId::new(), Utc::now()).unwrap();
        assert_eq!(invoice.total_amount_cif, dec("15.0"));
    }
}
