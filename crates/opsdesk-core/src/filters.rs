//! Filter state: what the operator is typing vs. what was last searched
//!
//! Keystrokes only touch the [`FilterDraft`]. A successful [`FilterState::commit`]
//! validates the draft against the list's [`FilterSchema`] and replaces the
//! [`AppliedFilters`] snapshot, which is the only filter state that ever
//! reaches a request.

use crate::error::{CoreError, CoreResult};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Select value meaning "no filter"
pub const ALL_SENTINEL: &str = "all";

/// Uncommitted filter input, keyed by filter key
pub type FilterDraft = BTreeMap<String, String>;

/// How a filter's raw input is validated and normalized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "length")]
pub enum FilterKind {
    /// Free text, trimmed
    Text,
    /// Non-negative whole number (ids)
    Integer,
    /// Non-negative decimal (prices, amounts)
    Decimal,
    /// Exactly N ASCII digits (phone last four)
    Digits(usize),
    /// One of the field's options, or the `all` sentinel
    Select,
}

/// One filter input of a list view
#[derive(Debug, Clone, Serialize)]
pub struct FilterField {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FilterKind,
    /// Allowed values for [`FilterKind::Select`]; the sentinel is implied
    pub options: &'static [&'static str],
}

impl FilterField {
    pub const fn text(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            kind: FilterKind::Text,
            options: &[],
        }
    }

    pub const fn integer(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            kind: FilterKind::Integer,
            options: &[],
        }
    }

    pub const fn decimal(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            kind: FilterKind::Decimal,
            options: &[],
        }
    }

    pub const fn digits(key: &'static str, label: &'static str, length: usize) -> Self {
        Self {
            key,
            label,
            kind: FilterKind::Digits(length),
            options: &[],
        }
    }

    pub const fn select(
        key: &'static str,
        label: &'static str,
        options: &'static [&'static str],
    ) -> Self {
        Self {
            key,
            label,
            kind: FilterKind::Select,
            options,
        }
    }

    /// Validate one raw value. `Ok(None)` means "no filter".
    pub fn normalize(&self, raw: &str) -> CoreResult<Option<String>> {
        let value = raw.trim();
        if value.is_empty() {
            return Ok(None);
        }

        match self.kind {
            FilterKind::Text => Ok(Some(value.to_string())),
            FilterKind::Integer => value
                .parse::<u64>()
                .map(|n| Some(n.to_string()))
                .map_err(|_| CoreError::validation(self.key, "must be a whole number")),
            FilterKind::Decimal => {
                let amount = Decimal::from_str(value)
                    .map_err(|_| CoreError::validation(self.key, "must be a number"))?;
                if amount.is_sign_negative() && !amount.is_zero() {
                    return Err(CoreError::validation(self.key, "must not be negative"));
                }
                Ok(Some(amount.normalize().to_string()))
            }
            FilterKind::Digits(length) => {
                if value.len() == length && value.chars().all(|c| c.is_ascii_digit()) {
                    Ok(Some(value.to_string()))
                } else {
                    Err(CoreError::validation(
                        self.key,
                        format!("must be exactly {} digits", length),
                    ))
                }
            }
            FilterKind::Select => {
                if value.eq_ignore_ascii_case(ALL_SENTINEL) {
                    Ok(None)
                } else if self.options.contains(&value) {
                    Ok(Some(value.to_string()))
                } else {
                    Err(CoreError::validation(
                        self.key,
                        format!("must be one of: {}", self.options.join(", ")),
                    ))
                }
            }
        }
    }
}

/// Two decimal filters that bound each other
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RangePair {
    pub min: &'static str,
    pub max: &'static str,
}

/// The filters a list view offers
#[derive(Debug, Clone, Default, Serialize)]
pub struct FilterSchema {
    pub fields: Vec<FilterField>,
    pub ranges: Vec<RangePair>,
}

impl FilterSchema {
    pub fn new(fields: Vec<FilterField>) -> Self {
        Self {
            fields,
            ranges: Vec::new(),
        }
    }

    pub fn with_range(mut self, min: &'static str, max: &'static str) -> Self {
        self.ranges.push(RangePair { min, max });
        self
    }

    pub fn field(&self, key: &str) -> Option<&FilterField> {
        self.fields.iter().find(|f| f.key == key)
    }
}

/// Last committed filter snapshot. Empty and sentinel values are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AppliedFilters(BTreeMap<String, String>);

impl AppliedFilters {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Draft and applied filters of one list view
#[derive(Debug, Clone)]
pub struct FilterState {
    schema: FilterSchema,
    draft: FilterDraft,
    applied: AppliedFilters,
}

impl FilterState {
    pub fn new(schema: FilterSchema) -> Self {
        Self {
            schema,
            draft: FilterDraft::new(),
            applied: AppliedFilters::default(),
        }
    }

    pub fn schema(&self) -> &FilterSchema {
        &self.schema
    }

    pub fn draft(&self) -> &FilterDraft {
        &self.draft
    }

    pub fn applied(&self) -> &AppliedFilters {
        &self.applied
    }

    /// Record raw input for `key`
    pub fn set_draft(&mut self, key: &str, value: impl Into<String>) {
        self.draft.insert(key.to_string(), value.into());
    }

    /// Validate the draft and make it the applied snapshot.
    ///
    /// On error the applied snapshot is left untouched.
    pub fn commit(&mut self) -> CoreResult<&AppliedFilters> {
        let mut next = BTreeMap::new();

        for field in &self.schema.fields {
            let Some(raw) = self.draft.get(field.key) else {
                continue;
            };
            if let Some(value) = field.normalize(raw)? {
                next.insert(field.key.to_string(), value);
            }
        }

        for key in self.draft.keys() {
            if self.schema.field(key).is_none() {
                log::debug!(target: "opsdesk::list", "ignoring unknown filter key '{}'", key);
            }
        }

        for range in &self.schema.ranges {
            let (Some(min), Some(max)) = (next.get(range.min), next.get(range.max)) else {
                continue;
            };
            let (Ok(low), Ok(high)) = (Decimal::from_str(min), Decimal::from_str(max)) else {
                continue;
            };
            if low > high {
                return Err(CoreError::InvalidRange {
                    min_field: range.min.to_string(),
                    max_field: range.max.to_string(),
                    min: min.clone(),
                    max: max.clone(),
                });
            }
        }

        self.applied = AppliedFilters(next);
        Ok(&self.applied)
    }

    /// Clear draft and applied filters
    pub fn reset(&mut self) {
        self.draft.clear();
        self.applied = AppliedFilters::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product_schema() -> FilterSchema {
        FilterSchema::new(vec![
            FilterField::integer("productId", "Product ID"),
            FilterField::text("name", "Name"),
            FilterField::select("status", "Status", &["Active", "Inactive"]),
            FilterField::digits("phoneLast4", "Phone last 4", 4),
            FilterField::decimal("minPrice", "Min price"),
            FilterField::decimal("maxPrice", "Max price"),
        ])
        .with_range("minPrice", "maxPrice")
    }

    #[test]
    fn test_draft_does_not_touch_applied() {
        let mut state = FilterState::new(product_schema());
        state.set_draft("name", "lamp");
        assert_eq!(state.draft().get("name").map(String::as_str), Some("lamp"));
        assert!(state.applied().is_empty());
    }

    #[test]
    fn test_empty_and_sentinel_values_are_absent() {
        let mut state = FilterState::new(product_schema());
        state.set_draft("name", "");
        state.set_draft("status", "all");
        state.set_draft("productId", "   ");
        state.set_draft("minPrice", "5");

        let applied = state.commit().unwrap();
        assert!(!applied.contains_key("name"));
        assert!(!applied.contains_key("status"));
        assert!(!applied.contains_key("productId"));
        assert_eq!(applied.get("minPrice"), Some("5"));
        assert_eq!(applied.len(), 1);
    }

    #[test]
    fn test_sentinel_is_case_insensitive() {
        let mut state = FilterState::new(product_schema());
        state.set_draft("status", "ALL");
        assert!(state.commit().unwrap().is_empty());
    }

    #[test]
    fn test_values_are_trimmed_and_normalized() {
        let mut state = FilterState::new(product_schema());
        state.set_draft("name", "  desk lamp ");
        state.set_draft("productId", "0042");
        state.set_draft("maxPrice", "12.50");

        let applied = state.commit().unwrap();
        assert_eq!(applied.get("name"), Some("desk lamp"));
        assert_eq!(applied.get("productId"), Some("42"));
        assert_eq!(applied.get("maxPrice"), Some("12.5"));
    }

    #[test]
    fn test_unparseable_integer_blocks_commit() {
        let mut state = FilterState::new(product_schema());
        state.set_draft("name", "lamp");
        state.commit().unwrap();

        state.set_draft("productId", "12a");
        let err = state.commit().unwrap_err();
        assert_eq!(
            err,
            CoreError::validation("productId", "must be a whole number")
        );
        assert_eq!(state.applied().get("name"), Some("lamp"));
        assert!(!state.applied().contains_key("productId"));
    }

    #[test]
    fn test_digits_length_enforced() {
        let mut state = FilterState::new(product_schema());
        state.set_draft("phoneLast4", "123");
        assert!(matches!(state.commit(), Err(CoreError::Validation { .. })));

        state.set_draft("phoneLast4", "12345");
        assert!(state.commit().is_err());

        state.set_draft("phoneLast4", "0123");
        assert_eq!(state.commit().unwrap().get("phoneLast4"), Some("0123"));
    }

    #[test]
    fn test_unknown_select_option_rejected() {
        let mut state = FilterState::new(product_schema());
        state.set_draft("status", "Deleted");
        assert!(matches!(
            state.commit(),
            Err(CoreError::Validation { ref field, .. }) if field == "status"
        ));
    }

    #[test]
    fn test_negative_price_rejected() {
        let mut state = FilterState::new(product_schema());
        state.set_draft("minPrice", "-1");
        assert!(state.commit().is_err());
    }

    #[test]
    fn test_inverted_range_rejected_without_mutation() {
        let mut state = FilterState::new(product_schema());
        state.set_draft("minPrice", "10");
        state.commit().unwrap();
        let before = state.applied().clone();

        state.set_draft("minPrice", "100");
        state.set_draft("maxPrice", "50");
        let err = state.commit().unwrap_err();

        assert!(matches!(err, CoreError::InvalidRange { .. }));
        assert_eq!(state.applied(), &before);
    }

    #[test]
    fn test_equal_bounds_allowed() {
        let mut state = FilterState::new(product_schema());
        state.set_draft("minPrice", "50");
        state.set_draft("maxPrice", "50.00");
        assert!(state.commit().is_ok());
    }

    #[test]
    fn test_single_bound_is_fine() {
        let mut state = FilterState::new(product_schema());
        state.set_draft("minPrice", "100");
        state.set_draft("maxPrice", "");
        assert_eq!(state.commit().unwrap().get("minPrice"), Some("100"));
    }

    #[test]
    fn test_unknown_keys_are_not_applied() {
        let mut state = FilterState::new(product_schema());
        state.set_draft("sortBy", "price");
        assert!(state.commit().unwrap().is_empty());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut state = FilterState::new(product_schema());
        state.set_draft("name", "lamp");
        state.commit().unwrap();
        state.reset();
        assert!(state.draft().is_empty());
        assert!(state.applied().is_empty());
    }
}
