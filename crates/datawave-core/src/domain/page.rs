use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One `next.json` page in the service's nested wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPage {
    #[serde(rename = "ReturnedEvents")]
    pub returned_events: u64,
    #[serde(rename = "Events", default)]
    pub events: Vec<RawEvent>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(rename = "Fields", default)]
    pub fields: Vec<RawField>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawField {
    pub name: String,
    #[serde(rename = "Value")]
    pub value: RawValue,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawValue {
    #[serde(default)]
    pub value: Value,
}

impl RawPage {
    pub fn new(events: Vec<RawEvent>) -> Self {
        Self {
            returned_events: events.len() as u64,
            events,
        }
    }
}

impl RawEvent {
    /// Builds an event from `(name, value)` pairs, preserving order.
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(name, value)| RawField {
                    name: name.into(),
                    value: RawValue { value },
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn deserializes_service_shape() {
        let body = json!({
            "ReturnedEvents": 1,
            "Events": [{
                "Fields": [
                    {"name": "GENRES", "Value": {"value": "Action", "type": "xs:string"}},
                    {"name": "RATING", "Value": {"value": 7}}
                ],
                "Markings": {"visibility": "PUBLIC"}
            }],
            "HasResults": true
        });

        let page: RawPage = serde_json::from_value(body).expect("page should parse");
        assert_eq!(page.returned_events, 1);
        assert_eq!(page.events[0].fields[0].name, "GENRES");
        assert_eq!(page.events[0].fields[1].value.value, json!(7));
    }

    #[test]
    fn missing_returned_events_is_rejected() {
        let result = serde_json::from_value::<RawPage>(json!({"Events": []}));
        assert!(result.is_err());
    }

    #[test]
    fn missing_events_defaults_to_empty() {
        let page: RawPage =
            serde_json::from_value(json!({"ReturnedEvents": 0})).expect("page should parse");
        assert!(page.events.is_empty());
    }
}
