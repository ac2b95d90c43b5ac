use std::fs;
use std::path::Path;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AnalyticsError, Result};
use crate::models::{
    AttendanceRecord, AttendanceStatus, Course, CourseGrade, PaymentRecord, PaymentStatus,
    RelatedItem, Role, Snapshot, User,
};

/// The `{success, data, message}` wrapper the admin API puts around payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    pub fn into_result(self) -> Result<T> {
        if !self.success {
            return Err(AnalyticsError::Upstream(
                self.message
                    .unwrap_or_else(|| "request was not successful".to_string()),
            ));
        }

        if let Some(message) = &self.message {
            warn!(%message, "upstream attached a message to a successful response");
        }

        self.data
            .ok_or_else(|| AnalyticsError::Upstream("response carried no data".to_string()))
    }
}

/// Accepts either a bare snapshot or one wrapped in an [`ApiEnvelope`].
pub fn parse_snapshot(raw: &str) -> Result<Snapshot> {
    let value: Value = serde_json::from_str(raw)?;
    let is_envelope = value
        .as_object()
        .is_some_and(|object| object.contains_key("success"));

    if is_envelope {
        let envelope: ApiEnvelope<Snapshot> = serde_json::from_value(value)?;
        envelope.into_result()
    } else {
        Ok(serde_json::from_value(value)?)
    }
}

pub fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let raw = fs::read_to_string(path)?;
    let snapshot = parse_snapshot(&raw)?;
    info!(
        path = %path.display(),
        users = snapshot.users.len(),
        courses = snapshot.courses.len(),
        payments = snapshot.payments.len(),
        attendance = snapshot.attendance.len(),
        grades = snapshot.grades.len(),
        "loaded snapshot"
    );
    Ok(snapshot)
}

pub fn save_snapshot(path: &Path, snapshot: &Snapshot) -> Result<()> {
    let body = serde_json::to_string_pretty(snapshot)?;
    fs::write(path, body)?;
    Ok(())
}

/// Reads attendance rows from a CSV with a `date,course_id,status` header.
pub fn import_attendance_csv(csv_path: &Path) -> Result<Vec<AttendanceRecord>> {
    #[derive(Deserialize)]
    struct CsvRow {
        date: String,
        course_id: String,
        status: String,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut records = Vec::new();

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let status = AttendanceStatus::from_raw(&row.status);
        if status == AttendanceStatus::Unknown {
            warn!(status = %row.status, date = %row.date, "unrecognised attendance status");
        }

        records.push(AttendanceRecord {
            date: Some(row.date),
            course_id: Some(row.course_id),
            status,
        });
    }

    Ok(records)
}

/// A small, realistic snapshot dated relative to `as_of`.
pub fn seed_snapshot(as_of: NaiveDate) -> Snapshot {
    let days_ago = |days: i64| (as_of - Duration::days(days)).format("%Y-%m-%d").to_string();
    let new_id = || Uuid::new_v4().to_string();

    let students = vec![
        (
            "Chiamaka Obi",
            "chiamaka.obi@demo.lms-analytics.dev",
            "female",
            "2004-03-11",
            "Lagos",
            None,
            160,
        ),
        (
            "Femi Balogun",
            "femi.balogun@demo.lms-analytics.dev",
            "male",
            "1998-09-02",
            "Abuja",
            Some("acme"),
            130,
        ),
        (
            "Aisha Bello",
            "aisha.bello@demo.lms-analytics.dev",
            "female",
            "1991-12-24",
            "Lagos",
            None,
            95,
        ),
        (
            "Tobi Adeyemi",
            "tobi.adeyemi@demo.lms-analytics.dev",
            "male",
            "2009-05-17",
            "Ibadan",
            None,
            60,
        ),
        (
            "Sam Okoro",
            "sam.okoro@demo.lms-analytics.dev",
            "",
            "1979-07-30",
            "Abuja",
            Some("acme"),
            20,
        ),
        (
            "Ngozi Eze",
            "ngozi.eze@demo.lms-analytics.dev",
            "female",
            "1986-01-08",
            "Enugu",
            None,
            4,
        ),
    ];

    let mut users: Vec<User> = students
        .into_iter()
        .map(|(name, email, gender, born, location, corporate, joined)| User {
            id: new_id(),
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            role: Role::Student,
            gender: Some(gender.to_string()),
            birth_date: Some(born.to_string()),
            location: Some(location.to_string()),
            corporate_id: corporate.map(str::to_string),
            created_at: Some(days_ago(joined)),
        })
        .collect();
    users.push(User {
        id: new_id(),
        name: Some("Dr. Ifeoma Nwosu".to_string()),
        email: Some("ifeoma.nwosu@demo.lms-analytics.dev".to_string()),
        role: Role::Teacher,
        created_at: Some(days_ago(400)),
        ..User::default()
    });

    let courses: Vec<Course> = [
        ("Data Analysis with SQL", "Data", 72.0),
        ("Spreadsheet Modelling", "Data", 45.0),
        ("Product Design Basics", "Design", 88.0),
        ("Public Speaking", "Soft Skills", 30.0),
    ]
    .into_iter()
    .map(|(title, category, progress)| Course {
        id: new_id(),
        title: Some(title.to_string()),
        category: Some(category.to_string()),
        progress: Some(progress),
        created_at: Some(days_ago(200)),
    })
    .collect();

    let plan = [
        (0, 0, 2_500_000, PaymentStatus::Succeeded, "paystack", 150),
        (1, 0, 2_500_000, PaymentStatus::Succeeded, "paystack", 120),
        (1, 1, 1_800_000, PaymentStatus::Failed, "flutterwave", 118),
        (2, 2, 3_200_000, PaymentStatus::Succeeded, "stripe", 80),
        (3, 1, 1_800_000, PaymentStatus::Pending, "flutterwave", 45),
        (4, 3, 1_250_000, PaymentStatus::Succeeded, "paystack", 15),
        (5, 2, 3_200_000, PaymentStatus::Refunded, "stripe", 3),
    ];
    let payments: Vec<PaymentRecord> = plan
        .into_iter()
        .map(|(student, course, amount, status, provider, ago)| PaymentRecord {
            id: new_id(),
            user_id: Some(users[student].id.clone()),
            amount: Some(amount),
            status,
            provider: Some(provider.to_string()),
            related_items: vec![RelatedItem {
                kind: "course".to_string(),
                id: courses[course].id.clone(),
            }],
            created_at: Some(days_ago(ago)),
        })
        .collect();

    let statuses = [
        AttendanceStatus::Present,
        AttendanceStatus::Present,
        AttendanceStatus::Late,
        AttendanceStatus::Absent,
        AttendanceStatus::Present,
    ];
    let attendance: Vec<AttendanceRecord> = (0..20)
        .map(|session: usize| AttendanceRecord {
            date: Some(days_ago(session as i64 * 9)),
            course_id: Some(courses[session % courses.len()].id.clone()),
            status: statuses[session % statuses.len()],
        })
        .collect();

    let grades = vec![
        (0, 0, 78.0),
        (1, 0, 64.0),
        (2, 2, 91.0),
        (4, 3, 55.0),
    ]
    .into_iter()
    .map(|(student, course, value)| CourseGrade {
        student_id: Some(users[student].id.clone()),
        course_id: Some(courses[course].id.clone()),
        grade_value: Some(value),
    })
    .collect();

    Snapshot {
        users,
        courses,
        payments,
        attendance,
        grades,
    }
}
