use std::collections::{BTreeMap, BTreeSet};

use chrono::{Days, Local, NaiveDate};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Canonical `YYYY-MM-DD` form of `text`, or `None` when it is not a date.
pub fn parse_reference_date(text: &str) -> Option<String> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT)
        .ok()
        .map(|date| date.format(DATE_FORMAT).to_string())
}

/// Resolves the date used for the default date filter of a model set.
pub trait ReferenceDateSource: Send + Sync {
    /// Reference date for `model_ids`, if one is known.
    fn reference_date(&self, model_ids: &BTreeSet<i64>) -> Option<String>;
}

/// Fixed dates per model, with an optional fallback.
#[derive(Debug, Clone, Default)]
pub struct StaticReferenceDates {
    by_model: BTreeMap<i64, String>,
    fallback: Option<String>,
}

impl StaticReferenceDates {
    /// No dates known.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the date of `model_id`.
    pub fn with_model(mut self, model_id: i64, date: impl Into<String>) -> Self {
        self.by_model.insert(model_id, date.into());
        self
    }

    /// Date used when no requested model has one.
    pub fn with_fallback(mut self, date: impl Into<String>) -> Self {
        self.fallback = Some(date.into());
        self
    }
}

impl ReferenceDateSource for StaticReferenceDates {
    fn reference_date(&self, model_ids: &BTreeSet<i64>) -> Option<String> {
        model_ids
            .iter()
            .find_map(|id| self.by_model.get(id))
            .or(self.fallback.as_ref())
            .and_then(|raw| parse_reference_date(raw))
    }
}

/// A fixed number of days before today.
#[derive(Debug, Clone, Copy)]
pub struct RelativeReferenceDate {
    days_back: u64,
    today: Option<NaiveDate>,
}

impl RelativeReferenceDate {
    /// `days_back` days before the local date at resolution time.
    pub fn new(days_back: u64) -> Self {
        Self {
            days_back,
            today: None,
        }
    }

    /// `days_back` days before a pinned `today`.
    pub fn anchored(today: NaiveDate, days_back: u64) -> Self {
        Self {
            days_back,
            today: Some(today),
        }
    }
}

impl ReferenceDateSource for RelativeReferenceDate {
    fn reference_date(&self, _model_ids: &BTreeSet<i64>) -> Option<String> {
        let today = self.today.unwrap_or_else(|| Local::now().date_naive());
        today
            .checked_sub_days(Days::new(self.days_back))
            .map(|date| date.format(DATE_FORMAT).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_calendar_dates_are_accepted() {
        assert_eq!(parse_reference_date(" 2024-01-01 ").as_deref(), Some("2024-01-01"));
        assert_eq!(parse_reference_date("2024-02-30"), None);
        assert_eq!(parse_reference_date("yesterday"), None);
    }

    #[test]
    fn static_dates_prefer_models_then_fallback() {
        let dates = StaticReferenceDates::new()
            .with_model(2, "2024-03-01")
            .with_model(5, "not a date")
            .with_fallback("2024-01-01");
        assert_eq!(
            dates.reference_date(&BTreeSet::from([1, 2])).as_deref(),
            Some("2024-03-01")
        );
        assert_eq!(
            dates.reference_date(&BTreeSet::from([9])).as_deref(),
            Some("2024-01-01")
        );
        assert_eq!(dates.reference_date(&BTreeSet::from([5])), None);
        assert_eq!(StaticReferenceDates::new().reference_date(&BTreeSet::new()), None);
    }

    #[test]
    fn relative_dates_count_back_from_today() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date");
        let source = RelativeReferenceDate::anchored(today, 1);
        assert_eq!(
            source.reference_date(&BTreeSet::new()).as_deref(),
            Some("2024-02-29")
        );
    }
}
