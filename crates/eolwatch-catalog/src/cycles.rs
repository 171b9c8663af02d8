//! Release cycle records and version-to-cycle matching.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The catalog's `eol` field: absent, a boolean, or a date string.
///
/// `Date` keeps the raw text; parsing happens in [`crate::status::classify`]
/// so unparsable values can be reported verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum EolField {
    Absent,
    Flag(bool),
    Date(String),
}

impl EolField {
    /// Interpret a raw JSON value. Anything other than a bool or a string
    /// counts as absent.
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Bool(b)) => Self::Flag(*b),
            Some(Value::String(s)) => Self::Date(s.clone()),
            _ => Self::Absent,
        }
    }
}

/// A release cycle as published by the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CycleRecord {
    /// Release line identifier (e.g. "5.7", "22.04").
    pub cycle: String,
    pub latest: Option<String>,
    pub eol: EolField,
    pub support: Option<Value>,
    pub extended_support: Option<Value>,
    pub link: Option<String>,
    pub release_date: Option<String>,
}

impl CycleRecord {
    /// Build a record from one raw catalog object.
    ///
    /// The cycle id comes from `cycle`, `release` or `version` (first
    /// non-empty wins). Objects without a cycle id yield `None`.
    pub fn from_raw(raw: &Value) -> Option<Self> {
        let obj = raw.as_object()?;
        let cycle = first_text(obj, &["cycle", "release", "version"])?;

        Some(Self {
            cycle,
            latest: first_text(obj, &["latest"]),
            eol: EolField::from_value(obj.get("eol")),
            support: obj.get("support").filter(|v| !v.is_null()).cloned(),
            extended_support: obj.get("extendedSupport").filter(|v| !v.is_null()).cloned(),
            link: obj.get("link").and_then(Value::as_str).map(String::from),
            release_date: first_text(obj, &["releaseDate", "released"]),
        })
    }

    /// Convert a raw catalog list, dropping entries without a cycle id.
    pub fn from_raw_list(raw: &[Value]) -> Vec<Self> {
        raw.iter().filter_map(Self::from_raw).collect()
    }
}

/// First key holding a non-empty string or a number, as text.
fn first_text(obj: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match obj.get(*key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Find the cycle a concrete version belongs to.
///
/// A cycle matches when the version equals the cycle id or starts with the
/// id followed by `.` or a space. The first match in catalog order wins;
/// overlapping prefixes (cycles `1` and `1.1` for version `1.1.5`) are not
/// scored, only logged.
pub fn match_cycle<'a>(cycles: &'a [CycleRecord], version: &str) -> Option<&'a CycleRecord> {
    let version = version.trim();
    let mut matches = cycles.iter().filter(|c| cycle_matches(&c.cycle, version));

    let first = matches.next()?;
    let others: Vec<&str> = matches.map(|c| c.cycle.as_str()).collect();
    if !others.is_empty() {
        tracing::debug!(
            version = %version,
            chosen = %first.cycle,
            also_matching = ?others,
            "Ambiguous cycle match, keeping first in catalog order"
        );
    }

    Some(first)
}

fn cycle_matches(cycle: &str, version: &str) -> bool {
    let cycle = cycle.trim();
    if cycle.is_empty() {
        return false;
    }
    match version.strip_prefix(cycle) {
        Some("") => true,
        Some(rest) => rest.starts_with('.') || rest.starts_with(' '),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cycles(ids: &[&str]) -> Vec<CycleRecord> {
        let raw: Vec<Value> = ids.iter().map(|id| json!({ "cycle": id })).collect();
        CycleRecord::from_raw_list(&raw)
    }

    #[test]
    fn matches_dotted_prefix() {
        let list = cycles(&["5.7"]);
        assert_eq!(match_cycle(&list, "5.7.44").unwrap().cycle, "5.7");
    }

    #[test]
    fn no_match_for_other_minor() {
        let list = cycles(&["5.7"]);
        assert!(match_cycle(&list, "5.8.0").is_none());
    }

    #[test]
    fn exact_and_spaced_matches() {
        let list = cycles(&["2019"]);
        assert!(match_cycle(&list, "2019").is_some());
        assert!(match_cycle(&list, "2019 R2").is_some());
        assert!(match_cycle(&list, "20190").is_none());
    }

    #[test]
    fn first_match_in_catalog_order_wins() {
        let list = cycles(&["1", "1.1"]);
        assert_eq!(match_cycle(&list, "1.1.5").unwrap().cycle, "1");

        let list = cycles(&["1.1", "1"]);
        assert_eq!(match_cycle(&list, "1.1.5").unwrap().cycle, "1.1");
    }

    #[test]
    fn ten_does_not_prefix_match_one() {
        let list = cycles(&["1.10"]);
        assert!(match_cycle(&list, "1.1.5").is_none());
    }

    #[test]
    fn version_is_trimmed() {
        let list = cycles(&["3.8"]);
        assert!(match_cycle(&list, "  3.8.10 ").is_some());
    }

    #[test]
    fn from_raw_uses_synonyms() {
        let raw = json!({
            "release": "22.04",
            "latest": "22.04.4",
            "eol": "2027-06-01",
            "released": "2022-04-21",
            "link": "https://wiki.ubuntu.com/JammyJellyfish/ReleaseNotes",
            "support": "2027-06-01",
            "extendedSupport": true
        });
        let record = CycleRecord::from_raw(&raw).unwrap();
        assert_eq!(record.cycle, "22.04");
        assert_eq!(record.latest.as_deref(), Some("22.04.4"));
        assert_eq!(record.eol, EolField::Date("2027-06-01".into()));
        assert_eq!(record.release_date.as_deref(), Some("2022-04-21"));
        assert_eq!(record.extended_support, Some(json!(true)));
    }

    #[test]
    fn from_raw_drops_entries_without_cycle() {
        let raw = vec![json!({"eol": true}), json!({"cycle": ""}), json!("junk"), json!({"cycle": 8})];
        let list = CycleRecord::from_raw_list(&raw);
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].cycle, "8");
    }

    #[test]
    fn eol_field_variants() {
        assert_eq!(EolField::from_value(None), EolField::Absent);
        assert_eq!(EolField::from_value(Some(&json!(null))), EolField::Absent);
        assert_eq!(EolField::from_value(Some(&json!(42))), EolField::Absent);
        assert_eq!(EolField::from_value(Some(&json!(false))), EolField::Flag(false));
        assert_eq!(
            EolField::from_value(Some(&json!("2024-10-01"))),
            EolField::Date("2024-10-01".into())
        );
    }
}
