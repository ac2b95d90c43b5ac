use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregate::{self, AttendanceSummary, CourseMetrics};
use crate::models::{Course, NamedCount, PaymentStatus, SeriesPoint, Snapshot, User};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub student_stats: StudentStats,
    pub course_stats: CourseStats,
    pub payment_stats: PaymentStats,
    pub attendance_stats: AttendanceStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentStats {
    pub total_students: usize,
    pub new_this_month: usize,
    pub gender_distribution: Vec<NamedCount>,
    pub age_distribution: Vec<NamedCount>,
    pub account_type_distribution: Vec<NamedCount>,
    pub location_distribution: Vec<NamedCount>,
    pub enrollment_trend: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedCourse {
    pub course_id: String,
    pub title: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseStats {
    pub total_courses: usize,
    pub average_completion: i64,
    pub category_distribution: Vec<NamedCount>,
    pub top_by_enrollment: Vec<RankedCourse>,
    pub top_by_completion: Vec<RankedCourse>,
    pub top_by_revenue: Vec<RankedCourse>,
    pub top_by_grade: Vec<RankedCourse>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStats {
    pub total_revenue: i64,
    pub total_transactions: usize,
    pub succeeded: usize,
    pub pending: usize,
    pub failed: usize,
    pub refunded: usize,
    pub success_rate: i64,
    pub status_distribution: Vec<NamedCount>,
    pub provider_distribution: Vec<NamedCount>,
    pub revenue_trend: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceStats {
    pub summary: AttendanceSummary,
    pub weekday_distribution: Vec<NamedCount>,
    pub attendance_trend: Vec<SeriesPoint>,
}

/// Builds a complete dashboard snapshot. Months and ages are relative to
/// `as_of`.
pub fn assemble(snapshot: &Snapshot, as_of: NaiveDate) -> DashboardStats {
    let stats = DashboardStats {
        student_stats: student_stats(&snapshot.users, as_of),
        course_stats: course_stats(snapshot),
        payment_stats: payment_stats(snapshot, as_of),
        attendance_stats: attendance_stats(snapshot, as_of),
    };

    debug!(
        students = stats.student_stats.total_students,
        courses = stats.course_stats.total_courses,
        transactions = stats.payment_stats.total_transactions,
        "assembled dashboard"
    );
    stats
}

pub fn student_stats(users: &[User], as_of: NaiveDate) -> StudentStats {
    let students: Vec<&User> = users.iter().filter(|user| user.is_student()).collect();
    let new_this_month = students
        .iter()
        .filter_map(|student| student.created_on())
        .filter(|day| day.year() == as_of.year() && day.month() == as_of.month())
        .count();

    StudentStats {
        total_students: students.len(),
        new_this_month,
        gender_distribution: aggregate::gender_distribution(students.iter().copied()),
        age_distribution: aggregate::age_distribution(students.iter().copied(), as_of),
        account_type_distribution: aggregate::account_type_distribution(
            students.iter().copied(),
        ),
        location_distribution: aggregate::location_distribution(students.iter().copied()),
        enrollment_trend: aggregate::enrollment_trend(students.iter().copied(), as_of),
    }
}

struct CourseRank<'a> {
    course: &'a Course,
    metrics: CourseMetrics,
}

fn rank<'a>(
    entries: &[CourseRank<'a>],
    metric: impl Fn(&CourseRank<'a>) -> f64,
) -> Vec<RankedCourse> {
    aggregate::top_n(entries.iter().collect(), |entry| metric(*entry))
        .into_iter()
        .map(|entry| RankedCourse {
            course_id: entry.course.id.clone(),
            title: entry.course.title().to_string(),
            value: metric(entry),
        })
        .collect()
}

pub fn course_stats(snapshot: &Snapshot) -> CourseStats {
    let entries: Vec<CourseRank> = snapshot
        .courses
        .iter()
        .map(|course| CourseRank {
            course,
            metrics: aggregate::course_metrics(
                &course.id,
                &snapshot.payments,
                &snapshot.grades,
                &snapshot.attendance,
            ),
        })
        .collect();

    CourseStats {
        total_courses: snapshot.courses.len(),
        average_completion: aggregate::mean(snapshot.courses.iter().map(Course::progress))
            .round() as i64,
        category_distribution: aggregate::category_distribution(&snapshot.courses),
        top_by_enrollment: rank(&entries, |e| e.metrics.enrollments as f64),
        top_by_completion: rank(&entries, |e| e.course.progress()),
        top_by_revenue: rank(&entries, |e| e.metrics.revenue as f64),
        top_by_grade: rank(&entries, |e| e.metrics.average_grade),
    }
}

pub fn payment_stats(snapshot: &Snapshot, as_of: NaiveDate) -> PaymentStats {
    let payments = &snapshot.payments;
    let count = |status: PaymentStatus| {
        payments
            .iter()
            .filter(|payment| payment.status == status)
            .count()
    };
    let succeeded = count(PaymentStatus::Succeeded);

    PaymentStats {
        total_revenue: aggregate::revenue(payments),
        total_transactions: payments.len(),
        succeeded,
        pending: count(PaymentStatus::Pending),
        failed: count(PaymentStatus::Failed),
        refunded: count(PaymentStatus::Refunded),
        success_rate: aggregate::rate(succeeded, payments.len()),
        status_distribution: aggregate::status_distribution(payments),
        provider_distribution: aggregate::provider_distribution(payments),
        revenue_trend: aggregate::revenue_trend(payments, as_of),
    }
}

pub fn attendance_stats(snapshot: &Snapshot, as_of: NaiveDate) -> AttendanceStats {
    AttendanceStats {
        summary: aggregate::attendance_summary(&snapshot.attendance),
        weekday_distribution: aggregate::weekday_distribution(&snapshot.attendance),
        attendance_trend: aggregate::attendance_trend(&snapshot.attendance, as_of),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CourseGrade, PaymentRecord, RelatedItem, Role};
    use pretty_assertions::assert_eq;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 20).unwrap()
    }

    fn course(id: &str, progress: f64) -> Course {
        Course {
            id: id.to_string(),
            title: Some(format!("Course {id}")),
            progress: Some(progress),
            ..Course::default()
        }
    }

    fn paid(user: &str, course: &str, amount: i64) -> PaymentRecord {
        PaymentRecord {
            id: format!("{user}-{course}"),
            user_id: Some(user.to_string()),
            amount: Some(amount),
            status: PaymentStatus::Succeeded,
            related_items: vec![RelatedItem {
                kind: "course".to_string(),
                id: course.to_string(),
            }],
            created_at: Some("2026-06-02".to_string()),
            ..PaymentRecord::default()
        }
    }

    #[test]
    fn empty_snapshot_degrades_to_zeroes() {
        let stats = assemble(&Snapshot::default(), as_of());
        assert_eq!(stats.student_stats.total_students, 0);
        assert_eq!(stats.student_stats.enrollment_trend.len(), 6);
        assert_eq!(stats.payment_stats.success_rate, 0);
        assert_eq!(stats.payment_stats.revenue_trend.len(), 6);
        assert_eq!(stats.attendance_stats.summary, AttendanceSummary::default());
        assert_eq!(stats.attendance_stats.attendance_trend.len(), 6);
        assert!(stats.course_stats.top_by_revenue.is_empty());
    }

    #[test]
    fn top_lists_are_capped_and_descending() {
        let courses: Vec<Course> = (1..=7)
            .map(|i| course(&format!("c{i}"), i as f64 * 10.0))
            .collect();
        let payments: Vec<PaymentRecord> = (1..=7)
            .map(|i| paid(&format!("u{i}"), &format!("c{i}"), i * 100))
            .collect();
        let grades = vec![CourseGrade {
            student_id: Some("u1".to_string()),
            course_id: Some("c2".to_string()),
            grade_value: Some(77.0),
        }];
        let snapshot = Snapshot {
            courses,
            payments,
            grades,
            ..Snapshot::default()
        };

        let stats = course_stats(&snapshot);
        for list in [
            &stats.top_by_enrollment,
            &stats.top_by_completion,
            &stats.top_by_revenue,
            &stats.top_by_grade,
        ] {
            assert!(list.len() <= 5);
            assert!(list.windows(2).all(|pair| pair[0].value >= pair[1].value));
        }

        let revenue_ids: Vec<&str> = stats
            .top_by_revenue
            .iter()
            .map(|entry| entry.course_id.as_str())
            .collect();
        assert_eq!(revenue_ids, vec!["c7", "c6", "c5", "c4", "c3"]);
        assert_eq!(stats.top_by_grade[0].course_id, "c2");
        assert_eq!(stats.top_by_grade[1].course_id, "c1");
        assert_eq!(stats.average_completion, 40);
    }

    #[test]
    fn student_stats_ignore_non_students() {
        let users = vec![
            User {
                id: "s1".to_string(),
                role: Role::Student,
                gender: Some("Male".to_string()),
                created_at: Some("2026-06-01T10:00:00Z".to_string()),
                ..User::default()
            },
            User {
                id: "a1".to_string(),
                role: Role::Admin,
                created_at: Some("2026-06-01".to_string()),
                ..User::default()
            },
        ];
        let stats = student_stats(&users, as_of());
        assert_eq!(stats.total_students, 1);
        assert_eq!(stats.new_this_month, 1);
        assert_eq!(stats.gender_distribution[0].value, 1);
        assert_eq!(stats.enrollment_trend.last().unwrap().value, 1);
    }

    #[test]
    fn payment_stats_count_each_status() {
        let mut failed = paid("u2", "c1", 900);
        failed.status = PaymentStatus::Failed;
        let snapshot = Snapshot {
            payments: vec![paid("u1", "c1", 500), failed, paid("u3", "c1", 250)],
            ..Snapshot::default()
        };

        let stats = payment_stats(&snapshot, as_of());
        assert_eq!(stats.total_revenue, 750);
        assert_eq!(stats.succeeded, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.success_rate, 67);
        assert_eq!(stats.revenue_trend.last().unwrap().value, 750);
    }

    #[test]
    fn assembly_is_idempotent() {
        let snapshot = Snapshot {
            courses: vec![course("c1", 30.0)],
            payments: vec![paid("u1", "c1", 500)],
            ..Snapshot::default()
        };
        assert_eq!(assemble(&snapshot, as_of()), assemble(&snapshot, as_of()));
    }
}
