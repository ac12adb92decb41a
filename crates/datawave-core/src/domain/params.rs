use serde::{Deserialize, Serialize};
use time::Date;

use crate::ValidationError;

const DATE_FORMAT: &str = "[year][month][day]";

/// Parameters of one event query. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParameters {
    query_name: String,
    query: String,
    auths: String,
    column_visibility: String,
    page_size: u32,
    begin: String,
    end: String,
}

impl QueryParameters {
    pub const DEFAULT_COLUMN_VISIBILITY: &'static str = "N/A";
    pub const DEFAULT_PAGE_SIZE: u32 = 5;
    pub const DEFAULT_BEGIN: &'static str = "19700101";
    pub const DEFAULT_END: &'static str = "20990101";

    pub fn new(
        query_name: impl Into<String>,
        query: impl Into<String>,
        auths: impl Into<String>,
    ) -> Self {
        Self {
            query_name: query_name.into(),
            query: query.into(),
            auths: auths.into(),
            column_visibility: String::from(Self::DEFAULT_COLUMN_VISIBILITY),
            page_size: Self::DEFAULT_PAGE_SIZE,
            begin: String::from(Self::DEFAULT_BEGIN),
            end: String::from(Self::DEFAULT_END),
        }
    }

    pub fn with_column_visibility(mut self, column_visibility: impl Into<String>) -> Self {
        self.column_visibility = column_visibility.into();
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Inclusive `YYYYMMDD` bounds.
    pub fn with_date_range(mut self, begin: impl Into<String>, end: impl Into<String>) -> Self {
        self.begin = begin.into();
        self.end = end.into();
        self
    }

    pub fn query_name(&self) -> &str {
        &self.query_name
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn auths(&self) -> &str {
        &self.auths
    }

    pub fn column_visibility(&self) -> &str {
        &self.column_visibility
    }

    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn begin(&self) -> &str {
        &self.begin
    }

    pub fn end(&self) -> &str {
        &self.end
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.query.trim().is_empty() {
            return Err(ValidationError::EmptyQuery);
        }
        if self.auths.trim().is_empty() {
            return Err(ValidationError::EmptyAuths);
        }
        if self.page_size == 0 {
            return Err(ValidationError::ZeroPageSize);
        }

        let begin = parse_date("begin", &self.begin)?;
        let end = parse_date("end", &self.end)?;
        if begin > end {
            return Err(ValidationError::InvertedDateRange {
                begin: self.begin.clone(),
                end: self.end.clone(),
            });
        }
        Ok(())
    }

    /// Form fields for the create request, in wire order.
    pub fn serialize(&self) -> Vec<(&'static str, String)> {
        vec![
            ("queryName", self.query_name.clone()),
            ("columnVisibility", self.column_visibility.clone()),
            ("pagesize", self.page_size.to_string()),
            ("begin", self.begin.clone()),
            ("end", self.end.clone()),
            ("query", self.query.clone()),
            ("auths", self.auths.clone()),
        ]
    }
}

fn parse_date(field: &'static str, value: &str) -> Result<Date, ValidationError> {
    let invalid = || ValidationError::InvalidDate {
        field,
        value: value.to_string(),
    };
    if value.len() != 8 || !value.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(invalid());
    }
    let format = time::format_description::parse(DATE_FORMAT).map_err(|_| invalid())?;
    Date::parse(value, &format).map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_expectations() {
        let params = QueryParameters::new("test_name", "test_query", "test_auths");

        assert_eq!(params.column_visibility(), "N/A");
        assert_eq!(params.page_size(), 5);
        assert_eq!(params.begin(), "19700101");
        assert_eq!(params.end(), "20990101");
    }

    #[test]
    fn serialize_emits_seven_fields_in_wire_order() {
        let params = QueryParameters::new("test_name", "test_query", "test_auths");

        let expected = vec![
            ("queryName", String::from("test_name")),
            ("columnVisibility", String::from("N/A")),
            ("pagesize", String::from("5")),
            ("begin", String::from("19700101")),
            ("end", String::from("20990101")),
            ("query", String::from("test_query")),
            ("auths", String::from("test_auths")),
        ];
        assert_eq!(params.serialize(), expected);
        // No hidden state: a second call is identical.
        assert_eq!(params.serialize(), params.serialize());
    }

    #[test]
    fn overrides_flow_into_serialized_fields() {
        let params = QueryParameters::new("q", "GENRES == 'Test'", "PUBLIC")
            .with_page_size(50)
            .with_column_visibility("PUBLIC")
            .with_date_range("20240101", "20241231");

        let fields = params.serialize();
        assert_eq!(fields[1], ("columnVisibility", String::from("PUBLIC")));
        assert_eq!(fields[2], ("pagesize", String::from("50")));
        assert_eq!(fields[3], ("begin", String::from("20240101")));
        assert_eq!(fields[4], ("end", String::from("20241231")));
        assert!(params.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_inputs() {
        let base = QueryParameters::new("q", "FIELD == 'x'", "PUBLIC");

        assert_eq!(
            QueryParameters::new("q", " ", "PUBLIC").validate(),
            Err(ValidationError::EmptyQuery)
        );
        assert_eq!(
            base.clone().with_page_size(0).validate(),
            Err(ValidationError::ZeroPageSize)
        );
        assert!(matches!(
            base.clone().with_date_range("2024-01-01", "20990101").validate(),
            Err(ValidationError::InvalidDate { field: "begin", .. })
        ));
        assert!(matches!(
            base.clone().with_date_range("20240101", "20241341").validate(),
            Err(ValidationError::InvalidDate { field: "end", .. })
        ));
        assert!(matches!(
            base.with_date_range("20250101", "20240101").validate(),
            Err(ValidationError::InvertedDateRange { .. })
        ));
    }
}
