//! CSV ingestion for bulk uploads.
//!
//! Header names are matched exactly after trimming; rows deserialize into
//! the same row types the JSON upload path uses.

use csv::{ReaderBuilder, Trim};
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CsvImportError {
    #[error("missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("invalid csv: {0}")]
    Parse(#[from] csv::Error),
}

/// Parse a CSV document with a header line into typed rows.
///
/// Rows whose cells are all empty are skipped. Extra columns are ignored.
pub fn read_rows<T: DeserializeOwned>(
    input: &[u8],
    required: &[&str],
) -> Result<Vec<T>, CsvImportError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(input);

    let headers = reader.headers()?.clone();
    let missing: Vec<String> = required
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .map(|col| col.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(CsvImportError::MissingColumns(missing));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        rows.push(record.deserialize(Some(&headers))?);
    }

    tracing::debug!(rows = rows.len(), "csv parsed");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use exportdesk_parties::{
        PartyKind, PartyRow, REQUIRED_UPLOAD_COLUMNS as PARTY_COLUMNS, parties_from_rows,
    };
    use exportdesk_products::{
        ProductRow, REQUIRED_UPLOAD_COLUMNS as PRODUCT_COLUMNS, products_from_rows,
    };

    #[test]
    fn parses_party_sheet_and_skips_blank_lines() {
        let csv = "name,type,address,gstNo,iec,pan\n\
                   Acme Exports , exporter ,\"Plot 4, MIDC\",27AAACA1234A1Z5,0123456789,\n\
                   ,,,,,\n\
                   Globex GmbH,CONSIGNEE,Hamburg,,,\n";

        let rows: Vec<PartyRow> = read_rows(csv.as_bytes(), &PARTY_COLUMNS).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name.as_deref(), Some("Acme Exports"));
        assert_eq!(rows[0].address.as_deref(), Some("Plot 4, MIDC"));
        assert_eq!(rows[0].pan, None);

        let parties = parties_from_rows(rows).unwrap();
        assert_eq!(parties[0].kind, PartyKind::Exporter);
        assert_eq!(parties[1].kind, PartyKind::Consignee);
    }

    #[test]
    fn reports_missing_required_columns() {
        let err = read_rows::<PartyRow>(b"name,address\nAcme,Pune\n", &PARTY_COLUMNS).unwrap_err();
        match err {
            CsvImportError::MissingColumns(cols) => assert_eq!(cols, vec!["type".to_string()]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn product_prices_are_read_leniently() {
        let csv = "name,description,hsn,unitPrice,unit\n\
                   Basmati Rice,1121 Sella,10063020,1.35,KGS\n\
                   Cumin Seeds,,09093129,n/a,KGS\n\
                   ,orphan row,,,\n";

        let rows: Vec<ProductRow> = read_rows(csv.as_bytes(), &PRODUCT_COLUMNS).unwrap();
        let products = products_from_rows(rows).unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].unit_price.map(|p| p.to_string()).as_deref(), Some("1.35"));
        assert_eq!(products[1].unit_price, None);
        assert_eq!(products[1].hsn.as_deref(), Some("09093129"));
    }

    #[test]
    fn sheets_with_only_the_required_columns_import() {
        let rows: Vec<PartyRow> = read_rows(b"name,type\nAcme Exports,exporter\n", &PARTY_COLUMNS).unwrap();
        let parties = parties_from_rows(rows).unwrap();
        assert_eq!(parties.len(), 1);
        assert_eq!(parties[0].address, None);

        let rows: Vec<ProductRow> = read_rows(b"name\nBasmati Rice\n", &PRODUCT_COLUMNS).unwrap();
        let products = products_from_rows(rows).unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].unit_price, None);
    }

    #[test]
    fn header_only_sheet_yields_no_rows() {
        let rows: Vec<PartyRow> = read_rows(b"name,type\n", &PARTY_COLUMNS).unwrap();
        assert!(rows.is_empty());
    }
}
