//! Reshapes raw pages into flat records and projects them onto a key list.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::domain::{NormalizedRecord, RawEvent, RawPage};
use crate::NormalizeError;

/// Value substituted when a requested key is absent from one record.
pub const NOT_FOUND: &str = "Not Found";

/// Flattens every event of `page`, then aligns each record's key order to
/// the first record. Keys the first record lacks keep their own relative
/// order at the end; nothing is filled in.
pub fn parse_events(page: &RawPage) -> Vec<NormalizedRecord> {
    let records = page.events.iter().map(flatten_event).collect::<Vec<_>>();
    align_to_first(records)
}

fn flatten_event(event: &RawEvent) -> NormalizedRecord {
    let mut grouped: Map<String, Value> = Map::new();
    let mut repeated: HashSet<&str> = HashSet::new();

    for field in &event.fields {
        let value = field.value.value.clone();
        match grouped.get_mut(&field.name) {
            None => {
                grouped.insert(field.name.clone(), value);
            }
            Some(existing) => {
                if repeated.insert(field.name.as_str()) {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                } else if let Value::Array(values) = existing {
                    values.push(value);
                }
            }
        }
    }

    NormalizedRecord::from(grouped)
}

fn align_to_first(records: Vec<NormalizedRecord>) -> Vec<NormalizedRecord> {
    let Some(reference) = records
        .first()
        .map(|first| first.keys().cloned().collect::<Vec<_>>())
    else {
        return records;
    };

    records
        .into_iter()
        .map(|record| {
            let mut fields = record.into_inner();
            let mut ordered = Map::with_capacity(fields.len());
            for key in &reference {
                if let Some(value) = fields.get(key) {
                    ordered.insert(key.clone(), value.clone());
                }
            }
            for (key, value) in std::mem::take(&mut fields) {
                if !ordered.contains_key(&key) {
                    ordered.insert(key, value);
                }
            }
            NormalizedRecord::from(ordered)
        })
        .collect()
}

/// Projects `records` onto the comma-separated `keys`.
///
/// `None` returns the records unchanged. A key present in no record at all
/// fails the whole projection; a key missing from only some records becomes
/// [`NOT_FOUND`] in those records.
pub fn filter(
    records: Vec<NormalizedRecord>,
    keys: Option<&str>,
) -> Result<Vec<NormalizedRecord>, NormalizeError> {
    let Some(keys) = keys else {
        return Ok(records);
    };
    let requested = keys.split(',').collect::<Vec<_>>();

    let known = records
        .iter()
        .flat_map(NormalizedRecord::keys)
        .map(String::as_str)
        .collect::<HashSet<_>>();
    let missing = requested
        .iter()
        .filter(|key| !known.contains(**key))
        .map(|key| (*key).to_string())
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        return Err(NormalizeError::UnknownFilterKey { missing });
    }

    Ok(records
        .iter()
        .map(|record| {
            requested
                .iter()
                .map(|key| {
                    let value = record
                        .get(key)
                        .cloned()
                        .unwrap_or_else(|| Value::String(String::from(NOT_FOUND)));
                    (*key, value)
                })
                .collect()
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn event(pairs: &[(&str, Value)]) -> RawEvent {
        RawEvent::from_pairs(pairs.iter().map(|(name, value)| (*name, value.clone())))
    }

    fn keys_of(record: &NormalizedRecord) -> Vec<&str> {
        record.keys().map(String::as_str).collect()
    }

    #[test]
    fn repeated_fields_become_lists() {
        let page = RawPage::new(vec![event(&[
            ("A", json!("v1")),
            ("B", json!("v2")),
            ("A", json!("v3")),
        ])]);

        let records = parse_events(&page);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("A"), Some(&json!(["v1", "v3"])));
        assert_eq!(records[0].get("B"), Some(&json!("v2")));
    }

    #[test]
    fn three_occurrences_stay_in_one_list() {
        let page = RawPage::new(vec![event(&[
            ("A", json!(1)),
            ("A", json!(2)),
            ("A", json!(3)),
        ])]);

        assert_eq!(parse_events(&page)[0].get("A"), Some(&json!([1, 2, 3])));
    }

    #[test]
    fn record_order_follows_first_record() {
        let page = RawPage::new(vec![
            event(&[("A", json!(1)), ("B", json!(2))]),
            event(&[("B", json!(3)), ("C", json!(4)), ("A", json!(5))]),
            event(&[("D", json!(6)), ("B", json!(7))]),
        ]);

        let records = parse_events(&page);
        assert_eq!(keys_of(&records[0]), vec!["A", "B"]);
        assert_eq!(keys_of(&records[1]), vec!["A", "B", "C"]);
        assert_eq!(keys_of(&records[2]), vec!["B", "D"]);
        assert!(!records[2].contains_key("A"));
    }

    #[test]
    fn empty_page_yields_no_records() {
        assert!(parse_events(&RawPage::new(Vec::new())).is_empty());
    }

    #[test]
    fn filter_none_is_identity() {
        let records = parse_events(&RawPage::new(vec![event(&[("A", json!(1))])]));
        assert_eq!(filter(records.clone(), None), Ok(records));
    }

    #[test]
    fn filter_substitutes_not_found_per_record() {
        let records = parse_events(&RawPage::new(vec![
            event(&[("A", json!(1)), ("B", json!(2))]),
            event(&[("A", json!(3))]),
        ]));

        let filtered = filter(records, Some("B,A")).expect("keys exist somewhere");
        assert_eq!(keys_of(&filtered[0]), vec!["B", "A"]);
        assert_eq!(filtered[0].get("B"), Some(&json!(2)));
        assert_eq!(filtered[1].get("B"), Some(&json!("Not Found")));
        assert_eq!(filtered[1].get("A"), Some(&json!(3)));
    }

    #[test]
    fn filter_rejects_keys_absent_everywhere() {
        let records = parse_events(&RawPage::new(vec![event(&[("A", json!(1))])]));

        assert_eq!(
            filter(records, Some("A,Z,Y")),
            Err(NormalizeError::UnknownFilterKey {
                missing: vec![String::from("Z"), String::from("Y")],
            })
        );
    }
}
