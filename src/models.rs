//! Entity shapes read by the derivation layer, plus the small value types the
//! aggregators and projectors emit.
//!
//! Every entity field except the id is optional on the wire. Accessors on each
//! type apply the fail-open default for that field, so callers never reach into
//! an `Option` directly.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

pub const UNKNOWN_USER: &str = "Unknown User";
pub const UNKNOWN_COURSE: &str = "Unknown Course";

/// Parses a wire timestamp down to its calendar day.
///
/// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS[.f]`, or a bare `YYYY-MM-DD`.
pub fn parse_day(raw: Option<&str>) -> Option<NaiveDate> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(value) = DateTime::parse_from_rfc3339(raw) {
        return Some(value.with_timezone(&Utc).date_naive());
    }
    if let Ok(value) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(value.date());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

fn text(value: &Option<String>) -> &str {
    value.as_deref().map(str::trim).unwrap_or("")
}

/// Null or mistyped values read as the field's default.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Minor units. Accepts integers, whole-number floats and numeric strings.
fn lenient_amount<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let amount = match Value::deserialize(deserializer)? {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|value| value.fract() == 0.0 && value.abs() < i64::MAX as f64)
                .map(|value| value as i64)
        }),
        Value::String(raw) => raw.trim().parse().ok(),
        _ => None,
    };
    Ok(amount)
}

/// A non-array reads as empty; elements that cannot be read are skipped.
fn lenient_records<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(%err, "skipping unreadable record");
                None
            }
        })
        .collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Admin,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Other];

    /// Anything other than a case-insensitive `male`/`female` folds into `Other`.
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Gender::Male,
            "female" | "f" => Gender::Female,
            _ => Gender::Other,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountType {
    Corporate,
    Individual,
}

impl AccountType {
    pub const ALL: [AccountType; 2] = [AccountType::Corporate, AccountType::Individual];

    pub fn label(self) -> &'static str {
        match self {
            AccountType::Corporate => "corporate",
            AccountType::Individual => "individual",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct User {
    #[serde(deserialize_with = "lenient")]
    pub id: String,
    #[serde(deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub email: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub role: Role,
    #[serde(deserialize_with = "lenient")]
    pub gender: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub birth_date: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub location: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub corporate_id: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub created_at: Option<String>,
}

impl User {
    pub fn is_student(&self) -> bool {
        self.role == Role::Student
    }

    /// Empty when missing.
    pub fn name(&self) -> &str {
        text(&self.name)
    }

    /// Empty when missing.
    pub fn email(&self) -> &str {
        text(&self.email)
    }

    /// Missing gender reads as `Other`.
    pub fn gender(&self) -> Gender {
        Gender::from_raw(text(&self.gender))
    }

    /// Empty when missing.
    pub fn location(&self) -> &str {
        text(&self.location)
    }

    /// Corporate when a non-blank corporate id is present.
    pub fn account_type(&self) -> AccountType {
        if text(&self.corporate_id).is_empty() {
            AccountType::Individual
        } else {
            AccountType::Corporate
        }
    }

    pub fn birth_day(&self) -> Option<NaiveDate> {
        parse_day(self.birth_date.as_deref())
    }

    pub fn created_on(&self) -> Option<NaiveDate> {
        parse_day(self.created_at.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Course {
    #[serde(deserialize_with = "lenient")]
    pub id: String,
    #[serde(deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub category: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub progress: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub created_at: Option<String>,
}

impl Course {
    /// Empty when missing.
    pub fn title(&self) -> &str {
        text(&self.title)
    }

    /// `Uncategorized` when missing or blank.
    pub fn category(&self) -> &str {
        match text(&self.category) {
            "" => "Uncategorized",
            value => value,
        }
    }

    /// Clamped to 0..=100; missing or non-finite reads as 0.
    pub fn progress(&self) -> f64 {
        clamp_percent(self.progress)
    }

    pub fn created_on(&self) -> Option<NaiveDate> {
        parse_day(self.created_at.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Succeeded,
    Pending,
    Failed,
    Refunded,
    #[default]
    #[serde(other)]
    Unknown,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 5] = [
        PaymentStatus::Succeeded,
        PaymentStatus::Pending,
        PaymentStatus::Failed,
        PaymentStatus::Refunded,
        PaymentStatus::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Succeeded => "succeeded",
            PaymentStatus::Pending => "pending",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
            PaymentStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelatedItem {
    #[serde(rename = "type")]
    #[serde(deserialize_with = "lenient")]
    pub kind: String,
    #[serde(deserialize_with = "lenient")]
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PaymentRecord {
    #[serde(deserialize_with = "lenient")]
    pub id: String,
    #[serde(deserialize_with = "lenient")]
    pub user_id: Option<String>,
    #[serde(deserialize_with = "lenient_amount")]
    pub amount: Option<i64>,
    #[serde(deserialize_with = "lenient")]
    pub status: PaymentStatus,
    #[serde(deserialize_with = "lenient")]
    pub provider: Option<String>,
    #[serde(deserialize_with = "lenient_records")]
    pub related_items: Vec<RelatedItem>,
    #[serde(deserialize_with = "lenient")]
    pub created_at: Option<String>,
}

impl PaymentRecord {
    /// Minor currency units; missing reads as 0.
    pub fn amount(&self) -> i64 {
        self.amount.unwrap_or(0)
    }

    pub fn succeeded(&self) -> bool {
        self.status == PaymentStatus::Succeeded
    }

    /// Empty when missing.
    pub fn user_id(&self) -> &str {
        text(&self.user_id)
    }

    /// `unknown` when missing or blank.
    pub fn provider(&self) -> &str {
        match text(&self.provider) {
            "" => "unknown",
            value => value,
        }
    }

    pub fn course_ids(&self) -> impl Iterator<Item = &str> {
        self.related_items
            .iter()
            .filter(|item| item.kind.eq_ignore_ascii_case("course"))
            .map(|item| item.id.as_str())
    }

    pub fn covers_course(&self, course_id: &str) -> bool {
        self.course_ids().any(|id| id == course_id)
    }

    pub fn created_on(&self) -> Option<NaiveDate> {
        parse_day(self.created_at.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Late,
    Absent,
    #[default]
    #[serde(other)]
    Unknown,
}

impl AttendanceStatus {
    /// Case-insensitive; anything unrecognised is `Unknown`.
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "present" => AttendanceStatus::Present,
            "late" => AttendanceStatus::Late,
            "absent" => AttendanceStatus::Absent,
            _ => AttendanceStatus::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Late => "late",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AttendanceRecord {
    #[serde(deserialize_with = "lenient")]
    pub date: Option<String>,
    #[serde(alias = "classId")]
    #[serde(deserialize_with = "lenient")]
    pub course_id: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub status: AttendanceStatus,
}

impl AttendanceRecord {
    /// Empty when missing.
    pub fn course_id(&self) -> &str {
        text(&self.course_id)
    }

    /// Present and late both count as attended.
    pub fn attended(&self) -> bool {
        matches!(
            self.status,
            AttendanceStatus::Present | AttendanceStatus::Late
        )
    }

    pub fn day(&self) -> Option<NaiveDate> {
        parse_day(self.date.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CourseGrade {
    #[serde(deserialize_with = "lenient")]
    pub student_id: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub course_id: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub grade_value: Option<f64>,
}

impl CourseGrade {
    pub fn student_id(&self) -> &str {
        text(&self.student_id)
    }

    pub fn course_id(&self) -> &str {
        text(&self.course_id)
    }

    /// Clamped to 0..=100; missing or non-finite reads as 0.
    pub fn value(&self) -> f64 {
        clamp_percent(self.grade_value)
    }
}

fn clamp_percent(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() => v.clamp(0.0, 100.0),
        _ => 0.0,
    }
}

/// Everything the layer reads, as handed over by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    #[serde(deserialize_with = "lenient_records")]
    pub users: Vec<User>,
    #[serde(deserialize_with = "lenient_records")]
    pub courses: Vec<Course>,
    #[serde(deserialize_with = "lenient_records")]
    pub payments: Vec<PaymentRecord>,
    #[serde(deserialize_with = "lenient_records")]
    pub attendance: Vec<AttendanceRecord>,
    #[serde(deserialize_with = "lenient_records")]
    pub grades: Vec<CourseGrade>,
}

/// One point of a monthly series; `label` is the short month name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub label: String,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedCount {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse<T> {
    pub data: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
}
