use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use exportdesk_core::{DomainError, DomainResult, Entity, PartyId, non_blank};

/// Columns a party upload sheet must carry; `address`, `gstNo`, `iec` and
/// `pan` are optional.
pub const REQUIRED_UPLOAD_COLUMNS: [&str; 2] = ["name", "type"];

/// Role a party plays on an export invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PartyKind {
    Exporter,
    Consignee,
    NotifyParty,
}

impl PartyKind {
    pub const ALL: [PartyKind; 3] = [PartyKind::Exporter, PartyKind::Consignee, PartyKind::NotifyParty];

    pub fn as_str(&self) -> &'static str {
        match self {
            PartyKind::Exporter => "EXPORTER",
            PartyKind::Consignee => "CONSIGNEE",
            PartyKind::NotifyParty => "NOTIFY_PARTY",
        }
    }

    /// Lenient parse used for uploads and query strings: trims and ignores case.
    pub fn parse(raw: &str) -> Option<Self> {
        let wanted = raw.trim().to_uppercase();
        Self::ALL.into_iter().find(|k| k.as_str() == wanted)
    }
}

impl core::fmt::Display for PartyKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for PartyKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            DomainError::validation(format!(
                "party type must be one of EXPORTER, CONSIGNEE, NOTIFY_PARTY (got '{s}')"
            ))
        })
    }
}

/// Party record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    pub id: PartyId,
    pub kind: PartyKind,
    pub name: String,
    pub address: Option<String>,
    pub gst_no: Option<String>,
    pub iec: Option<String>,
    pub pan: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Entity for Party {
    type Id = PartyId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Input for registering a party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewParty {
    #[serde(alias = "type")]
    pub kind: PartyKind,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub gst_no: Option<String>,
    #[serde(default)]
    pub iec: Option<String>,
    #[serde(default)]
    pub pan: Option<String>,
}

impl NewParty {
    /// Validate and turn the input into a stored record.
    pub fn into_party(self, id: PartyId, created_at: DateTime<Utc>) -> DomainResult<Party> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }

        Ok(Party {
            id,
            kind: self.kind,
            name: name.to_string(),
            address: non_blank(self.address),
            gst_no: non_blank(self.gst_no),
            iec: non_blank(self.iec),
            pan: non_blank(self.pan),
            created_at,
        })
    }
}

/// One row of a bulk party upload (CSV line or JSON object).
///
/// Everything is optional at this stage; invalid rows are dropped by
/// [`PartyRow::into_new_party`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyRow {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub gst_no: Option<String>,
    #[serde(default)]
    pub iec: Option<String>,
    #[serde(default)]
    pub pan: Option<String>,
}

impl PartyRow {
    /// Keep the row only if it has a name and a recognised type.
    pub fn into_new_party(self) -> Option<NewParty> {
        let name = non_blank(self.name)?;
        let kind = PartyKind::parse(self.kind.as_deref()?)?;
        Some(NewParty {
            kind,
            name,
            address: non_blank(self.address),
            gst_no: non_blank(self.gst_no),
            iec: non_blank(self.iec),
            pan: non_blank(self.pan),
        })
    }
}

/// Filter a bulk upload down to importable parties.
pub fn parties_from_rows(rows: Vec<PartyRow>) -> DomainResult<Vec<NewParty>> {
    if rows.is_empty() {
        return Err(DomainError::validation("No data provided"));
    }

    let valid: Vec<NewParty> = rows.into_iter().filter_map(PartyRow::into_new_party).collect();
    if valid.is_empty() {
        return Err(DomainError::validation(
            "No valid parties found. Check 'name' and 'type' (EXPORTER, CONSIGNEE, NOTIFY_PARTY)",
        ));
    }

    Ok(valid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: Option<&str>, kind: Option<&str>) -> PartyRow {
        PartyRow {
            name: name.map(str::to_string),
            kind: kind.map(str::to_string),
            ..PartyRow::default()
        }
    }

    #[test]
    fn into_party_trims_and_normalizes_blank_fields() {
        let input = NewParty {
            kind: PartyKind::Exporter,
            name: "  Acme Exports  ".to_string(),
            address: Some("Plot 4, MIDC".to_string()),
            gst_no: Some("   ".to_string()),
            iec: None,
            pan: Some("ABCDE1234F".to_string()),
        };

        let party = input.into_party(PartyId::new(), Utc::now()).unwrap();
        assert_eq!(party.name, "Acme Exports");
        assert_eq!(party.address.as_deref(), Some("Plot 4, MIDC"));
        assert_eq!(party.gst_no, None);
        assert_eq!(party.pan.as_deref(), Some("ABCDE1234F"));
    }

    #[test]
    fn into_party_rejects_empty_name() {
        let input = NewParty {
            kind: PartyKind::Consignee,
            name: "   ".to_string(),
            address: None,
            gst_no: None,
            iec: None,
            pan: None,
        };

        let err = input.into_party(PartyId::new(), Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn kind_parse_is_lenient_about_case_and_whitespace() {
        assert_eq!(PartyKind::parse(" notify_party "), Some(PartyKind::NotifyParty));
        assert_eq!(PartyKind::parse("Exporter"), Some(PartyKind::Exporter));
        assert_eq!(PartyKind::parse("buyer"), None);
        assert!("buyer".parse::<PartyKind>().is_err());
    }

    #[test]
    fn kind_serializes_in_upper_snake_case() {
        let json = serde_json::to_string(&PartyKind::NotifyParty).unwrap();
        assert_eq!(json, "\"NOTIFY_PARTY\"");
    }

    #[test]
    fn new_party_accepts_type_alias() {
        let input: NewParty =
            serde_json::from_str(r#"{"type":"CONSIGNEE","name":"Globex GmbH"}"#).unwrap();
        assert_eq!(input.kind, PartyKind::Consignee);
        assert_eq!(input.address, None);
    }

    #[test]
    fn rows_without_name_or_valid_type_are_dropped() {
        let rows = vec![
            row(Some("Acme"), Some("exporter")),
            row(None, Some("CONSIGNEE")),
            row(Some("Globex"), Some("BUYER")),
            row(Some("Initech"), None),
            row(Some("Umbrella"), Some(" notify_party")),
        ];

        let parties = parties_from_rows(rows).unwrap();
        let names: Vec<&str> = parties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Acme", "Umbrella"]);
        assert_eq!(parties[1].kind, PartyKind::NotifyParty);
    }

    #[test]
    fn empty_upload_is_rejected() {
        let err = parties_from_rows(Vec::new()).unwrap_err();
        assert_eq!(err, DomainError::validation("No data provided"));
    }

    #[test]
    fn upload_without_valid_rows_is_rejected() {
        let err = parties_from_rows(vec![row(Some("Acme"), Some("BUYER"))]).unwrap_err();
        match err {
            DomainError::Validation(msg) => assert!(msg.starts_with("No valid parties found")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn row_deserializes_from_camel_case_json() {
        let row: PartyRow = serde_json::from_str(
            r#"{"name":"Acme","type":"EXPORTER","gstNo":"27AAACA1234A1Z5","iec":"0123456789"}"#,
        )
        .unwrap();
        let party = row.into_new_party().unwrap();
        assert_eq!(party.gst_no.as_deref(), Some("27AAACA1234A1Z5"));
        assert_eq!(party.iec.as_deref(), Some("0123456789"));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: a row survives filtering iff it has a non-blank name and a known type.
            #[test]
            fn filtering_matches_name_and_type_rule(
                name in proptest::option::of("[ A-Za-z]{0,12}"),
                kind in proptest::option::of("(EXPORTER|consignee|Notify_Party|BUYER| )"),
            ) {
                let expected = name.as_deref().is_some_and(|n| !n.trim().is_empty())
                    && kind.as_deref().is_some_and(|k| PartyKind::parse(k).is_some());
                let kept = row(name.as_deref(), kind.as_deref()).into_new_party();
                prop_assert_eq!(kept.is_some(), expected);
            }
        }
    }
}
