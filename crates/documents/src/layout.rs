//! Export invoice layout.
//!
//! The printed invoice is a stack of [`Band`]s. Each band is a row of cells
//! whose widths are fractions of the printable width and sum to 1.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use exportdesk_core::to_fixed_2;
use exportdesk_invoicing::{Invoice, InvoiceItem};

const DECLARATION: [&str; 2] = [
    "1. We declare that this invoice shows the actual price of the goods described and that all particulars are true and correct.",
    "2. \"We intend to claim reward/benefit under RODTEP & Drawback scheme as applicable\"",
];

/// Item table columns: (header, width).
const ITEM_COLUMNS: [(&str, f32); 7] = [
    ("Marks & Nos", 0.15),
    ("HSN", 0.10),
    ("Sr. No.", 0.05),
    ("Description of Goods", 0.40),
    ("Quantity (in Kgs)", 0.10),
    ("Rate USD per Kgs", 0.10),
    ("Total Amount USD", 0.10),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub text: String,
    pub bold: bool,
}

impl Line {
    fn plain(text: impl Into<String>) -> Self {
        Self { text: text.into(), bold: false }
    }

    fn bold(text: impl Into<String>) -> Self {
        Self { text: text.into(), bold: true }
    }
}

/// Bold label above a plain value.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellBody {
    Lines(Vec<Line>),
    /// Sub-rows of fields, each sub-row split evenly across the cell.
    Fields(Vec<Vec<Field>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub width: f32,
    pub align: Align,
    pub body: CellBody,
}

impl Cell {
    fn lines(width: f32, align: Align, lines: Vec<Line>) -> Self {
        Self { width, align, body: CellBody::Lines(lines) }
    }

    fn field(width: f32, label: &str, value: Option<&str>) -> Self {
        Self {
            width,
            align: Align::Left,
            body: CellBody::Fields(vec![vec![field(label, value)]]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandKind {
    /// Drawn above the bordered box, no borders.
    Title,
    Block,
    /// Repeated at the top of a page when item rows overflow.
    TableHeader,
    Item,
    Total,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    pub kind: BandKind,
    pub cells: Vec<Cell>,
    pub shaded: bool,
    /// Minimum height in points.
    pub min_height: f32,
}

impl Band {
    fn new(kind: BandKind, cells: Vec<Cell>) -> Self {
        Self { kind, cells, shaded: false, min_height: 0.0 }
    }

    fn shaded(mut self) -> Self {
        self.shaded = true;
        self
    }

    fn min_height(mut self, points: f32) -> Self {
        self.min_height = points;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceLayout {
    pub title: String,
    pub bands: Vec<Band>,
}

impl InvoiceLayout {
    /// Every piece of text in reading order.
    pub fn texts(&self) -> Vec<&str> {
        let mut out = Vec::new();
        for band in &self.bands {
            for cell in &band.cells {
                match &cell.body {
                    CellBody::Lines(lines) => out.extend(lines.iter().map(|l| l.text.as_str())),
                    CellBody::Fields(rows) => {
                        for f in rows.iter().flatten() {
                            out.push(f.label.as_str());
                            out.push(f.value.as_str());
                        }
                    }
                }
            }
        }
        out
    }
}

fn field(label: &str, value: Option<&str>) -> Field {
    Field {
        label: label.to_string(),
        value: value.unwrap_or_default().to_string(),
    }
}

fn party_block(heading: &str, name: Option<&str>, address: Option<&str>) -> Vec<Line> {
    let mut lines = vec![Line::bold(heading)];
    if let Some(name) = name {
        lines.push(Line::bold(name));
    }
    if let Some(address) = address {
        lines.extend(address.lines().map(Line::plain));
    }
    lines
}

pub fn format_money(value: Decimal) -> String {
    to_fixed_2(value)
}

pub fn format_quantity(value: Decimal) -> String {
    value.normalize().to_string()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

fn item_band(item: &InvoiceItem) -> Band {
    let texts = [
        (item.marks_and_nos.clone().unwrap_or_default(), Align::Center),
        (item.hsn.clone().unwrap_or_default(), Align::Center),
        (item.sr_no.clone().unwrap_or_default(), Align::Center),
        (item.description.clone(), Align::Left),
        (format_quantity(item.quantity), Align::Right),
        (format_money(item.rate), Align::Right),
        (format_money(item.total_amount), Align::Right),
    ];
    let cells = ITEM_COLUMNS
        .iter()
        .zip(texts)
        .map(|((_, width), (text, align))| Cell::lines(*width, align, vec![Line::plain(text)]))
        .collect();
    Band::new(BandKind::Item, cells).min_height(20.0)
}

/// Lay out the regulatory export invoice.
pub fn invoice_layout(invoice: &Invoice) -> InvoiceLayout {
    let c = &invoice.compliance;
    let r = &invoice.references;
    let s = &invoice.shipment;
    let date = format_date(invoice.invoice_date);

    let mut bands = Vec::new();

    bands.push(Band::new(
        BandKind::Title,
        vec![Cell::lines(1.0, Align::Center, vec![Line::bold("INVOICE")])],
    ));

    bands.push(Band::new(
        BandKind::Block,
        vec![
            Cell::lines(
                0.5,
                Align::Left,
                party_block(
                    "Exporter",
                    Some(&invoice.exporter.name),
                    invoice.exporter.address.as_deref(),
                ),
            ),
            Cell {
                width: 0.5,
                align: Align::Left,
                body: CellBody::Fields(vec![
                    vec![
                        field("INVOICE NO.:", Some(&invoice.invoice_no)),
                        field("DT.", Some(&date)),
                    ],
                    vec![field("GST NO.:", c.gst_no.as_deref()), field("I.E.C.:", c.iec.as_deref())],
                    vec![
                        field("LUT #", c.lut_no.as_deref()),
                        field("MODE OF TRANSPORT:", r.mode_of_transport.as_deref()),
                    ],
                    vec![
                        field("State:", c.state.as_deref()),
                        field("State Code:", c.state_code.as_deref()),
                    ],
                    vec![
                        field("District Code:", c.district_code.as_deref()),
                        field("Trade Agreement Code:", c.trade_agreement_code.as_deref()),
                    ],
                    vec![
                        field("Buyer's Order No:", r.buyers_order_no.as_deref()),
                        field("PI No.:", r.pi_no.as_deref()),
                    ],
                    vec![field("Terms of Payment :", r.terms_of_payment.as_deref())],
                ]),
            },
        ],
    ));

    let notify = invoice.notify.as_ref();
    bands.push(
        Band::new(
            BandKind::Block,
            vec![
                Cell::lines(
                    0.5,
                    Align::Left,
                    party_block(
                        "Consignee",
                        Some(&invoice.consignee.name),
                        invoice.consignee.address.as_deref(),
                    ),
                ),
                Cell::lines(
                    0.5,
                    Align::Left,
                    party_block(
                        "Notify",
                        notify.map(|n| n.name.as_str()),
                        notify.and_then(|n| n.address.as_deref()),
                    ),
                ),
            ],
        )
        .min_height(80.0),
    );

    bands.push(Band::new(
        BandKind::Block,
        vec![
            Cell::field(0.25, "Pre-carriage by", s.pre_carriage_by.as_deref()),
            Cell::field(0.25, "Place of Receipt", s.place_of_receipt.as_deref()),
            Cell::field(0.25, "Country of Origin", s.country_of_origin.as_deref()),
            Cell::field(0.25, "Country of Dest.", s.country_of_destination.as_deref()),
        ],
    ));
    bands.push(Band::new(
        BandKind::Block,
        vec![
            Cell::field(0.25, "Vessel / Flight No.", s.vessel_flight_no.as_deref()),
            Cell::field(0.25, "Port of Loading", s.port_of_loading.as_deref()),
            Cell::field(0.25, "Port of Discharge", s.port_of_discharge.as_deref()),
            Cell::field(0.25, "Final Destination", s.final_destination.as_deref()),
        ],
    ));

    bands.push(
        Band::new(
            BandKind::TableHeader,
            ITEM_COLUMNS
                .iter()
                .map(|(header, width)| Cell::lines(*width, Align::Center, vec![Line::bold(*header)]))
                .collect(),
        )
        .shaded(),
    );

    bands.extend(invoice.items.iter().map(item_band));

    bands.push(
        Band::new(
            BandKind::Total,
            vec![
                Cell::lines(0.8, Align::Right, vec![Line::bold("TOTAL VALUE (CIF)")]),
                Cell::lines(
                    0.2,
                    Align::Right,
                    vec![Line::bold(format_money(invoice.total_amount_cif))],
                ),
            ],
        )
        .min_height(20.0),
    );

    bands.push(
        Band::new(
            BandKind::Total,
            vec![Cell::lines(
                1.0,
                Align::Left,
                vec![
                    Line::bold("TOTAL VALUE (in words): USD"),
                    Line::plain(invoice.amount_in_words.clone()),
                ],
            )],
        )
        .min_height(25.0),
    );

    let mut declaration = vec![Line::bold("Declaration:")];
    declaration.extend(DECLARATION.iter().map(|d| Line::plain(*d)));
    bands.push(
        Band::new(
            BandKind::Total,
            vec![
                Cell::lines(0.7, Align::Left, declaration),
                Cell::lines(0.3, Align::Right, vec![Line::bold("Authorised Signatory")]),
            ],
        )
        .min_height(100.0),
    );

    InvoiceLayout {
        title: format!("Invoice {}", invoice.invoice_no),
        bands,
    }
}
