//! Predicate builders that narrow a record collection according to a
//! [`ReportFilter`].
//!
//! Each builder returns a boxed predicate; an absent constraint yields a
//! predicate that accepts everything, so callers can compose unconditionally
//! with [`all_of`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, Result};

pub type Predicate<'a, T> = Box<dyn Fn(&T) -> bool + 'a>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReportFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub course_id: Option<String>,
    pub user_id: Option<String>,
    pub status: Option<String>,
    pub gender: Option<String>,
    pub account_type: Option<String>,
    pub location: Option<String>,
    pub search_term: Option<String>,
    pub completion_rate_min: Option<f64>,
    pub completion_rate_max: Option<f64>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

impl ReportFilter {
    pub fn validate(&self) -> Result<()> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(AnalyticsError::InvalidFilter(format!(
                    "startDate ({start}) must not be after endDate ({end})"
                )));
            }
        }

        if let (Some(min), Some(max)) = (self.completion_rate_min, self.completion_rate_max) {
            if min > max {
                return Err(AnalyticsError::InvalidFilter(format!(
                    "completionRateMin ({min}) must not exceed completionRateMax ({max})"
                )));
            }
        }

        Ok(())
    }

    pub fn course_id(&self) -> Option<&str> {
        constraint(&self.course_id)
    }

    pub fn user_id(&self) -> Option<&str> {
        constraint(&self.user_id)
    }

    pub fn status(&self) -> Option<&str> {
        constraint(&self.status)
    }

    pub fn gender(&self) -> Option<&str> {
        constraint(&self.gender)
    }

    pub fn account_type(&self) -> Option<&str> {
        constraint(&self.account_type)
    }

    pub fn location(&self) -> Option<&str> {
        constraint(&self.location)
    }

    pub fn search_term(&self) -> Option<&str> {
        constraint(&self.search_term)
    }
}

/// Blank filter values carry no constraint.
fn constraint(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn accept_all<'a, T: 'a>() -> Predicate<'a, T> {
    Box::new(|_: &T| true)
}

/// Inclusive day range. With either bound set, records whose day cannot be
/// determined are excluded.
pub fn date_range<'a, T, F>(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    day_of: F,
) -> Predicate<'a, T>
where
    T: 'a,
    F: Fn(&T) -> Option<NaiveDate> + 'a,
{
    if start.is_none() && end.is_none() {
        return accept_all();
    }

    Box::new(move |record: &T| match day_of(record) {
        Some(day) => start.map_or(true, |s| s <= day) && end.map_or(true, |e| day <= e),
        None => false,
    })
}

/// Exact, case-sensitive match. Used for identifiers.
pub fn equals<'a, T, F>(expected: Option<&str>, field: F) -> Predicate<'a, T>
where
    T: 'a,
    F: for<'r> Fn(&'r T) -> &'r str + 'a,
{
    match expected {
        None => accept_all(),
        Some(expected) => {
            let expected = expected.to_string();
            Box::new(move |record: &T| field(record) == expected)
        }
    }
}

/// Case-insensitive match. Used for labels such as status, gender, location.
pub fn equals_ignore_case<'a, T, F>(expected: Option<&str>, field: F) -> Predicate<'a, T>
where
    T: 'a,
    F: for<'r> Fn(&'r T) -> &'r str + 'a,
{
    match expected {
        None => accept_all(),
        Some(expected) => {
            let expected = expected.to_lowercase();
            Box::new(move |record: &T| field(record).trim().to_lowercase() == expected)
        }
    }
}

/// Keeps records for which `test` holds against the given value.
pub fn matches<'a, T, F>(expected: Option<&str>, test: F) -> Predicate<'a, T>
where
    T: 'a,
    F: Fn(&T, &str) -> bool + 'a,
{
    match expected {
        None => accept_all(),
        Some(expected) => {
            let expected = expected.to_string();
            Box::new(move |record: &T| test(record, &expected))
        }
    }
}

/// Case-insensitive substring search; a record passes when any field contains
/// the term.
pub fn search<'a, T, F>(term: Option<&str>, fields: F) -> Predicate<'a, T>
where
    T: 'a,
    F: for<'r> Fn(&'r T) -> Vec<&'r str> + 'a,
{
    match term {
        None => accept_all(),
        Some(term) => {
            let needle = term.to_lowercase();
            Box::new(move |record: &T| {
                fields(record)
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            })
        }
    }
}

/// Inclusive numeric bounds over a computed metric.
pub fn within<'a, T, F>(min: Option<f64>, max: Option<f64>, metric: F) -> Predicate<'a, T>
where
    T: 'a,
    F: Fn(&T) -> f64 + 'a,
{
    if min.is_none() && max.is_none() {
        return accept_all();
    }

    Box::new(move |record: &T| {
        let value = metric(record);
        min.map_or(true, |m| value >= m) && max.map_or(true, |m| value <= m)
    })
}

pub fn all_of<'a, T: 'a>(predicates: Vec<Predicate<'a, T>>) -> Predicate<'a, T> {
    Box::new(move |record: &T| predicates.iter().all(|predicate| predicate(record)))
}

pub fn apply<'r, T>(records: &'r [T], predicate: &Predicate<'_, T>) -> Vec<&'r T> {
    records.iter().filter(|&record| predicate(record)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Row {
        id: &'static str,
        name: &'static str,
        email: &'static str,
        day: Option<NaiveDate>,
        score: f64,
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, d).unwrap()
    }

    fn rows() -> Vec<Row> {
        vec![
            Row {
                id: "a",
                name: "Ada Obi",
                email: "ada@school.ng",
                day: Some(day(1)),
                score: 40.0,
            },
            Row {
                id: "b",
                name: "Bola Ade",
                email: "bola@school.ng",
                day: Some(day(10)),
                score: 75.0,
            },
            Row {
                id: "c",
                name: "Chi Eze",
                email: "chi@mail.com",
                day: None,
                score: 90.0,
            },
        ]
    }

    fn ids(matched: &[&Row]) -> Vec<&'static str> {
        matched.iter().map(|row| row.id).collect()
    }

    #[test]
    fn date_range_is_inclusive_and_excludes_unknown_days() {
        let data = rows();
        let predicate = date_range(Some(day(1)), Some(day(10)), |r: &Row| r.day);
        assert_eq!(ids(&apply(&data, &predicate)), vec!["a", "b"]);

        let open_end = date_range(Some(day(5)), None, |r: &Row| r.day);
        assert_eq!(ids(&apply(&data, &open_end)), vec!["b"]);
    }

    #[test]
    fn unbounded_date_range_accepts_unknown_days() {
        let data = rows();
        let predicate = date_range(None, None, |r: &Row| r.day);
        assert_eq!(apply(&data, &predicate).len(), 3);
    }

    #[test]
    fn equality_respects_case_policy() {
        let data = rows();
        let exact = equals(Some("A"), |r: &Row| r.id);
        assert!(apply(&data, &exact).is_empty());

        let loose = equals_ignore_case(Some("bola ade"), |r: &Row| r.name);
        assert_eq!(ids(&apply(&data, &loose)), vec!["b"]);
    }

    #[test]
    fn search_matches_any_field() {
        let data = rows();
        let predicate = search(Some("SCHOOL"), |r: &Row| vec![r.name, r.email]);
        assert_eq!(ids(&apply(&data, &predicate)), vec!["a", "b"]);

        let by_name = search(Some("eze"), |r: &Row| vec![r.name, r.email]);
        assert_eq!(ids(&apply(&data, &by_name)), vec!["c"]);
    }

    #[test]
    fn numeric_bounds_are_inclusive() {
        let data = rows();
        let predicate = within(Some(40.0), Some(75.0), |r: &Row| r.score);
        assert_eq!(ids(&apply(&data, &predicate)), vec!["a", "b"]);
    }

    #[test]
    fn composed_predicates_require_every_constraint() {
        let data = rows();
        let predicate = all_of(vec![
            search(Some("school"), |r: &Row| vec![r.email]),
            within(Some(50.0), None, |r: &Row| r.score),
        ]);
        assert_eq!(ids(&apply(&data, &predicate)), vec!["b"]);
    }

    #[test]
    fn blank_filter_values_are_no_constraint() {
        let filter = ReportFilter {
            course_id: Some("   ".to_string()),
            status: Some(" succeeded ".to_string()),
            ..ReportFilter::default()
        };
        assert_eq!(filter.course_id(), None);
        assert_eq!(filter.status(), Some("succeeded"));
    }

    #[test]
    fn validate_rejects_inverted_ranges() {
        let filter = ReportFilter {
            start_date: Some(day(10)),
            end_date: Some(day(1)),
            ..ReportFilter::default()
        };
        assert!(matches!(
            filter.validate(),
            Err(AnalyticsError::InvalidFilter(_))
        ));

        let filter = ReportFilter {
            completion_rate_min: Some(80.0),
            completion_rate_max: Some(20.0),
            ..ReportFilter::default()
        };
        assert!(filter.validate().is_err());
        assert!(ReportFilter::default().validate().is_ok());
    }
}
