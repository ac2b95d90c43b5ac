//! Reducers that group records by a dimension and compute counts, sums and
//! rates. None of these fail: malformed fields contribute nothing.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{
    AccountType, AttendanceRecord, AttendanceStatus, Course, CourseGrade, Gender, NamedCount,
    PaymentRecord, PaymentStatus, SeriesPoint, User,
};

pub const TREND_MONTHS: i32 = 6;
pub const TOP_N: usize = 5;

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];
const WEEKDAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
const AGE_BUCKETS: [&str; 5] = ["Under 18", "18-24", "25-34", "35-44", "45+"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    fn contains(self, day: NaiveDate) -> bool {
        day.year() == self.year && day.month() == self.month
    }

    fn label(self) -> &'static str {
        MONTH_LABELS[(self.month - 1) as usize]
    }
}

/// The six calendar months ending with the month of `as_of`, oldest first.
fn trailing_months(as_of: NaiveDate) -> Vec<MonthKey> {
    let current = as_of.year() * 12 + as_of.month0() as i32;
    (0..TREND_MONTHS)
        .rev()
        .map(|back| {
            let index = current - back;
            MonthKey {
                year: index.div_euclid(12),
                month: index.rem_euclid(12) as u32 + 1,
            }
        })
        .collect()
}

/// Buckets records into the trailing six months and reduces each bucket.
/// Always yields six points; empty months take whatever `reduce` returns for an
/// empty slice.
pub fn monthly_series<'a, T, D, R>(
    records: impl IntoIterator<Item = &'a T>,
    as_of: NaiveDate,
    day_of: D,
    reduce: R,
) -> Vec<SeriesPoint>
where
    T: 'a,
    D: Fn(&T) -> Option<NaiveDate>,
    R: Fn(&[&'a T]) -> i64,
{
    let dated: Vec<(NaiveDate, &'a T)> = records
        .into_iter()
        .filter_map(|record| day_of(record).map(|day| (day, record)))
        .collect();

    trailing_months(as_of)
        .into_iter()
        .map(|month| {
            let bucket: Vec<&'a T> = dated
                .iter()
                .filter(|(day, _)| month.contains(*day))
                .map(|(_, record)| *record)
                .collect();
            SeriesPoint {
                label: month.label().to_string(),
                value: reduce(&bucket),
            }
        })
        .collect()
}

/// `round(part / total * 100)`, defined as 0 for an empty total.
pub fn rate(part: usize, total: usize) -> i64 {
    if total == 0 {
        return 0;
    }
    let value = (part as f64 / total as f64 * 100.0).round() as i64;
    value.clamp(0, 100)
}

/// Arithmetic mean, 0 when there is nothing to average.
pub fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

fn fixed_buckets(labels: &[&str], counts: &[i64]) -> Vec<NamedCount> {
    labels
        .iter()
        .zip(counts)
        .map(|(label, value)| NamedCount {
            name: (*label).to_string(),
            value: *value,
        })
        .collect()
}

/// Counts records per label, listing labels in the order first seen.
pub fn count_by<'a, T: 'a, F>(
    records: impl IntoIterator<Item = &'a T>,
    label_of: F,
) -> Vec<NamedCount>
where
    F: Fn(&T) -> String,
{
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<NamedCount> = Vec::new();

    for record in records {
        let label = label_of(record);
        match positions.get(&label) {
            Some(&index) => counts[index].value += 1,
            None => {
                positions.insert(label.clone(), counts.len());
                counts.push(NamedCount {
                    name: label,
                    value: 1,
                });
            }
        }
    }

    counts
}

/// Stable descending sort on `metric`, truncated to the top five.
pub fn top_n<T, F>(mut items: Vec<T>, metric: F) -> Vec<T>
where
    F: Fn(&T) -> f64,
{
    items.sort_by(|a, b| metric(b).partial_cmp(&metric(a)).unwrap_or(Ordering::Equal));
    items.truncate(TOP_N);
    items
}

pub fn gender_distribution<'a>(users: impl IntoIterator<Item = &'a User>) -> Vec<NamedCount> {
    let mut counts = [0i64; 3];
    for user in users {
        let index = match user.gender() {
            Gender::Male => 0,
            Gender::Female => 1,
            Gender::Other => 2,
        };
        counts[index] += 1;
    }

    let labels: Vec<&str> = Gender::ALL.iter().map(|g| g.label()).collect();
    fixed_buckets(&labels, &counts)
}

fn age_bucket(age: u32) -> usize {
    match age {
        0..=17 => 0,
        18..=24 => 1,
        25..=34 => 2,
        35..=44 => 3,
        _ => 4,
    }
}

/// Users without a usable birth date (or one after `as_of`) are not counted.
pub fn age_distribution<'a>(
    users: impl IntoIterator<Item = &'a User>,
    as_of: NaiveDate,
) -> Vec<NamedCount> {
    let mut counts = [0i64; 5];
    for user in users {
        if let Some(age) = user.birth_day().and_then(|born| as_of.years_since(born)) {
            counts[age_bucket(age)] += 1;
        }
    }
    fixed_buckets(&AGE_BUCKETS, &counts)
}

pub fn account_type_distribution<'a>(
    users: impl IntoIterator<Item = &'a User>,
) -> Vec<NamedCount> {
    let mut counts = [0i64; 2];
    for user in users {
        match user.account_type() {
            AccountType::Corporate => counts[0] += 1,
            AccountType::Individual => counts[1] += 1,
        }
    }

    let labels: Vec<&str> = AccountType::ALL.iter().map(|a| a.label()).collect();
    fixed_buckets(&labels, &counts)
}

/// Most common locations, at most five. Blank locations count as `Unknown`.
pub fn location_distribution<'a>(users: impl IntoIterator<Item = &'a User>) -> Vec<NamedCount> {
    let counts = count_by(users, |user| match user.location() {
        "" => "Unknown".to_string(),
        location => location.to_string(),
    });
    top_n(counts, |entry| entry.value as f64)
}

pub fn status_distribution<'a>(
    payments: impl IntoIterator<Item = &'a PaymentRecord>,
) -> Vec<NamedCount> {
    let mut counts = [0i64; 5];
    for payment in payments {
        let index = PaymentStatus::ALL
            .iter()
            .position(|status| *status == payment.status)
            .unwrap_or(PaymentStatus::ALL.len() - 1);
        counts[index] += 1;
    }

    let labels: Vec<&str> = PaymentStatus::ALL.iter().map(|s| s.as_str()).collect();
    fixed_buckets(&labels, &counts)
}

pub fn provider_distribution<'a>(
    payments: impl IntoIterator<Item = &'a PaymentRecord>,
) -> Vec<NamedCount> {
    count_by(payments, |payment| payment.provider().to_string())
}

pub fn category_distribution<'a>(courses: impl IntoIterator<Item = &'a Course>) -> Vec<NamedCount> {
    count_by(courses, |course| course.category().to_string())
}

/// Attended (present or late) sessions per weekday, Monday first.
pub fn weekday_distribution<'a>(
    records: impl IntoIterator<Item = &'a AttendanceRecord>,
) -> Vec<NamedCount> {
    let mut counts = [0i64; 7];
    for record in records {
        if !record.attended() {
            continue;
        }
        if let Some(day) = record.day() {
            counts[day.weekday().num_days_from_monday() as usize] += 1;
        }
    }
    fixed_buckets(&WEEKDAY_LABELS, &counts)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
    pub attendance_rate: i64,
    pub present_count: usize,
    pub absent_count: usize,
    pub late_count: usize,
}

/// Records with an unknown status count toward the total but not toward
/// attendance.
pub fn attendance_summary<'a>(
    records: impl IntoIterator<Item = &'a AttendanceRecord>,
) -> AttendanceSummary {
    let mut summary = AttendanceSummary::default();
    let mut total = 0usize;

    for record in records {
        total += 1;
        match record.status {
            AttendanceStatus::Present => summary.present_count += 1,
            AttendanceStatus::Late => summary.late_count += 1,
            AttendanceStatus::Absent => summary.absent_count += 1,
            AttendanceStatus::Unknown => {}
        }
    }

    summary.attendance_rate = rate(summary.present_count + summary.late_count, total);
    summary
}

/// Sum of succeeded payment amounts, saturating at the `i64` bounds.
pub fn revenue<'a>(payments: impl IntoIterator<Item = &'a PaymentRecord>) -> i64 {
    payments
        .into_iter()
        .filter(|payment| payment.succeeded())
        .map(PaymentRecord::amount)
        .fold(0i64, |total, amount| total.saturating_add(amount))
}

pub fn revenue_trend(payments: &[PaymentRecord], as_of: NaiveDate) -> Vec<SeriesPoint> {
    monthly_series(payments, as_of, PaymentRecord::created_on, |bucket| {
        revenue(bucket.iter().copied())
    })
}

/// New students per month.
pub fn enrollment_trend<'a>(
    students: impl IntoIterator<Item = &'a User>,
    as_of: NaiveDate,
) -> Vec<SeriesPoint> {
    monthly_series(students, as_of, User::created_on, |bucket| bucket.len() as i64)
}

/// Monthly attendance rate.
pub fn attendance_trend(records: &[AttendanceRecord], as_of: NaiveDate) -> Vec<SeriesPoint> {
    monthly_series(records, as_of, AttendanceRecord::day, |bucket| {
        attendance_summary(bucket.iter().copied()).attendance_rate
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CourseMetrics {
    pub enrollments: usize,
    pub revenue: i64,
    pub average_grade: f64,
    pub attendance: AttendanceSummary,
}

/// A payment covering several courses counts in full toward each of them.
pub fn course_metrics(
    course_id: &str,
    payments: &[PaymentRecord],
    grades: &[CourseGrade],
    attendance: &[AttendanceRecord],
) -> CourseMetrics {
    let covering: Vec<&PaymentRecord> = payments
        .iter()
        .filter(|payment| payment.succeeded() && payment.covers_course(course_id))
        .collect();

    let students: HashSet<&str> = covering
        .iter()
        .map(|payment| payment.user_id())
        .filter(|id| !id.is_empty())
        .collect();

    CourseMetrics {
        enrollments: students.len(),
        revenue: revenue(covering.iter().copied()),
        average_grade: mean(
            grades
                .iter()
                .filter(|grade| grade.course_id() == course_id)
                .map(CourseGrade::value),
        ),
        attendance: attendance_summary(
            attendance
                .iter()
                .filter(|record| record.course_id() == course_id),
        ),
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudentMetrics {
    pub enrolled_courses: usize,
    pub total_spent: i64,
    pub completion_rate: f64,
    pub average_grade: f64,
}

/// Enrolment comes from the student's succeeded payments; completion is the
/// mean progress of the enrolled courses that can be found.
pub fn student_metrics(
    user_id: &str,
    courses: &[Course],
    payments: &[PaymentRecord],
    grades: &[CourseGrade],
) -> StudentMetrics {
    let paid: Vec<&PaymentRecord> = payments
        .iter()
        .filter(|payment| payment.succeeded() && payment.user_id() == user_id)
        .collect();

    let mut enrolled: Vec<&str> = Vec::new();
    for course_id in paid.iter().copied().flat_map(|payment| payment.course_ids()) {
        if !enrolled.contains(&course_id) {
            enrolled.push(course_id);
        }
    }

    let completion_rate = mean(
        enrolled
            .iter()
            .filter_map(|id| courses.iter().find(|course| course.id == *id))
            .map(Course::progress),
    );

    StudentMetrics {
        enrolled_courses: enrolled.len(),
        total_spent: revenue(paid.iter().copied()),
        completion_rate,
        average_grade: mean(
            grades
                .iter()
                .filter(|grade| grade.student_id() == user_id)
                .map(CourseGrade::value),
        ),
    }
}
