use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregate::{self, StudentMetrics};
use crate::export::ReportRow;
use crate::filter::{self, ReportFilter};
use crate::models::{
    AttendanceRecord, Course, CourseGrade, PaymentRecord, ReportResponse, User, UNKNOWN_COURSE,
    UNKNOWN_USER,
};

pub const DEFAULT_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Students,
    Courses,
    Payments,
    Attendance,
}

impl ReportKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportKind::Students => "students",
            ReportKind::Courses => "courses",
            ReportKind::Payments => "payments",
            ReportKind::Attendance => "attendance",
        }
    }
}

/// Slices a fully computed row set. `total` is always the pre-slice count.
pub fn paginate<T>(rows: Vec<T>, filter: &ReportFilter) -> ReportResponse<T> {
    let page = filter.page.unwrap_or(1).max(1);
    let limit = filter.limit.unwrap_or(DEFAULT_LIMIT).max(1);
    let total = rows.len();
    let start = (page - 1).saturating_mul(limit);

    let data: Vec<T> = rows.into_iter().skip(start).take(limit).collect();

    ReportResponse {
        data,
        total,
        page,
        limit,
        total_pages: total.div_ceil(limit),
    }
}

fn day_label(day: Option<NaiveDate>) -> String {
    day.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn course_title<'a>(courses: &'a [Course], course_id: &str) -> &'a str {
    courses
        .iter()
        .find(|course| course.id == course_id)
        .map_or(UNKNOWN_COURSE, Course::title)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentReportRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub gender: String,
    pub location: String,
    pub account_type: String,
    pub enrolled_courses: usize,
    pub total_spent: i64,
    pub completion_rate: i64,
    pub average_grade: i64,
    pub joined_at: String,
}

impl ReportRow for StudentReportRow {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "email",
        "gender",
        "location",
        "accountType",
        "enrolledCourses",
        "totalSpent",
        "completionRate",
        "averageGrade",
        "joinedAt",
    ];
}

struct StudentEntry<'a> {
    user: &'a User,
    metrics: StudentMetrics,
}

pub fn student_rows(
    users: &[User],
    courses: &[Course],
    payments: &[PaymentRecord],
    grades: &[CourseGrade],
    filter: &ReportFilter,
) -> Vec<StudentReportRow> {
    let entries: Vec<StudentEntry> = users
        .iter()
        .filter(|user| user.is_student())
        .map(|user| StudentEntry {
            user,
            metrics: aggregate::student_metrics(&user.id, courses, payments, grades),
        })
        .collect();

    let predicate = filter::all_of(vec![
        filter::date_range(filter.start_date, filter.end_date, |e: &StudentEntry| {
            e.user.created_on()
        }),
        filter::equals(filter.user_id(), |e: &StudentEntry| e.user.id.as_str()),
        filter::matches(filter.course_id(), |e: &StudentEntry, course_id| {
            payments.iter().any(|payment| {
                payment.succeeded()
                    && payment.user_id() == e.user.id
                    && payment.covers_course(course_id)
            })
        }),
        filter::equals_ignore_case(filter.gender(), |e: &StudentEntry| e.user.gender().label()),
        filter::equals_ignore_case(filter.account_type(), |e: &StudentEntry| {
            e.user.account_type().label()
        }),
        filter::equals_ignore_case(filter.location(), |e: &StudentEntry| e.user.location()),
        filter::search(filter.search_term(), |e: &StudentEntry| {
            vec![e.user.name(), e.user.email()]
        }),
        filter::within(
            filter.completion_rate_min,
            filter.completion_rate_max,
            |e: &StudentEntry| e.metrics.completion_rate,
        ),
    ]);

    let rows: Vec<StudentReportRow> = filter::apply(&entries, &predicate)
        .into_iter()
        .map(|entry| StudentReportRow {
            id: entry.user.id.clone(),
            name: entry.user.name().to_string(),
            email: entry.user.email().to_string(),
            gender: entry.user.gender().label().to_string(),
            location: entry.user.location().to_string(),
            account_type: entry.user.account_type().label().to_string(),
            enrolled_courses: entry.metrics.enrolled_courses,
            total_spent: entry.metrics.total_spent,
            completion_rate: entry.metrics.completion_rate.round() as i64,
            average_grade: entry.metrics.average_grade.round() as i64,
            joined_at: day_label(entry.user.created_on()),
        })
        .collect();

    debug!(report = "students", rows = rows.len(), "projected report rows");
    rows
}

pub fn student_report(
    users: &[User],
    courses: &[Course],
    payments: &[PaymentRecord],
    grades: &[CourseGrade],
    filter: &ReportFilter,
) -> ReportResponse<StudentReportRow> {
    paginate(student_rows(users, courses, payments, grades, filter), filter)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseReportRow {
    pub id: String,
    pub title: String,
    pub category: String,
    pub enrollments: usize,
    pub revenue: i64,
    pub completion_rate: i64,
    pub average_grade: i64,
    pub attendance_rate: i64,
    pub created_at: String,
}

impl ReportRow for CourseReportRow {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "title",
        "category",
        "enrollments",
        "revenue",
        "completionRate",
        "averageGrade",
        "attendanceRate",
        "createdAt",
    ];
}

pub fn course_rows(
    courses: &[Course],
    payments: &[PaymentRecord],
    grades: &[CourseGrade],
    attendance: &[AttendanceRecord],
    filter: &ReportFilter,
) -> Vec<CourseReportRow> {
    let predicate = filter::all_of(vec![
        filter::date_range(filter.start_date, filter.end_date, Course::created_on),
        filter::equals(filter.course_id(), |c: &Course| c.id.as_str()),
        filter::search(filter.search_term(), |c: &Course| vec![c.title(), c.category()]),
        filter::within(
            filter.completion_rate_min,
            filter.completion_rate_max,
            Course::progress,
        ),
    ]);

    let rows: Vec<CourseReportRow> = filter::apply(courses, &predicate)
        .into_iter()
        .map(|course| {
            let metrics = aggregate::course_metrics(&course.id, payments, grades, attendance);
            CourseReportRow {
                id: course.id.clone(),
                title: course.title().to_string(),
                category: course.category().to_string(),
                enrollments: metrics.enrollments,
                revenue: metrics.revenue,
                completion_rate: course.progress().round() as i64,
                average_grade: metrics.average_grade.round() as i64,
                attendance_rate: metrics.attendance.attendance_rate,
                created_at: day_label(course.created_on()),
            }
        })
        .collect();

    debug!(report = "courses", rows = rows.len(), "projected report rows");
    rows
}

pub fn course_report(
    courses: &[Course],
    payments: &[PaymentRecord],
    grades: &[CourseGrade],
    attendance: &[AttendanceRecord],
    filter: &ReportFilter,
) -> ReportResponse<CourseReportRow> {
    paginate(course_rows(courses, payments, grades, attendance, filter), filter)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReportRow {
    pub id: String,
    pub user_name: String,
    pub user_email: String,
    pub courses: String,
    pub amount: i64,
    pub status: String,
    pub provider: String,
    pub created_at: String,
}

impl ReportRow for PaymentReportRow {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "userName",
        "userEmail",
        "courses",
        "amount",
        "status",
        "provider",
        "createdAt",
    ];
}

struct PaymentEntry<'a> {
    payment: &'a PaymentRecord,
    user: Option<&'a User>,
}

pub fn payment_rows(
    payments: &[PaymentRecord],
    users: &[User],
    courses: &[Course],
    filter: &ReportFilter,
) -> Vec<PaymentReportRow> {
    let entries: Vec<PaymentEntry> = payments
        .iter()
        .map(|payment| PaymentEntry {
            payment,
            user: users.iter().find(|user| user.id == payment.user_id()),
        })
        .collect();

    let predicate = filter::all_of(vec![
        filter::date_range(filter.start_date, filter.end_date, |e: &PaymentEntry| {
            e.payment.created_on()
        }),
        filter::equals_ignore_case(filter.status(), |e: &PaymentEntry| e.payment.status.as_str()),
        filter::equals(filter.user_id(), |e: &PaymentEntry| e.payment.user_id()),
        filter::matches(filter.course_id(), |e: &PaymentEntry, course_id| {
            e.payment.covers_course(course_id)
        }),
        filter::search(filter.search_term(), |e: &PaymentEntry| {
            vec![
                e.user.map_or("", User::name),
                e.user.map_or("", User::email),
                e.payment.provider(),
            ]
        }),
    ]);

    let rows: Vec<PaymentReportRow> = filter::apply(&entries, &predicate)
        .into_iter()
        .map(|entry| {
            let titles: Vec<&str> = entry
                .payment
                .course_ids()
                .map(|id| course_title(courses, id))
                .collect();
            PaymentReportRow {
                id: entry.payment.id.clone(),
                user_name: entry.user.map_or(UNKNOWN_USER, User::name).to_string(),
                user_email: entry.user.map_or("", User::email).to_string(),
                courses: titles.join("; "),
                amount: entry.payment.amount(),
                status: entry.payment.status.as_str().to_string(),
                provider: entry.payment.provider().to_string(),
                created_at: day_label(entry.payment.created_on()),
            }
        })
        .collect();

    debug!(report = "payments", rows = rows.len(), "projected report rows");
    rows
}

pub fn payment_report(
    payments: &[PaymentRecord],
    users: &[User],
    courses: &[Course],
    filter: &ReportFilter,
) -> ReportResponse<PaymentReportRow> {
    paginate(payment_rows(payments, users, courses, filter), filter)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceReportRow {
    pub date: String,
    pub course_id: String,
    pub course_title: String,
    pub present: usize,
    pub late: usize,
    pub absent: usize,
    pub total: usize,
    pub attendance_rate: i64,
}

impl ReportRow for AttendanceReportRow {
    const COLUMNS: &'static [&'static str] = &[
        "date",
        "courseId",
        "courseTitle",
        "present",
        "late",
        "absent",
        "total",
        "attendanceRate",
    ];
}

struct AttendanceEntry<'a> {
    record: &'a AttendanceRecord,
    course_title: &'a str,
}

/// One row per (date, course), newest first. Undated records sort last.
pub fn attendance_rows(
    attendance: &[AttendanceRecord],
    courses: &[Course],
    filter: &ReportFilter,
) -> Vec<AttendanceReportRow> {
    let entries: Vec<AttendanceEntry> = attendance
        .iter()
        .map(|record| AttendanceEntry {
            record,
            course_title: course_title(courses, record.course_id()),
        })
        .collect();

    let predicate = filter::all_of(vec![
        filter::date_range(filter.start_date, filter.end_date, |e: &AttendanceEntry| {
            e.record.day()
        }),
        filter::equals(filter.course_id(), |e: &AttendanceEntry| e.record.course_id()),
        filter::equals_ignore_case(filter.status(), |e: &AttendanceEntry| {
            e.record.status.as_str()
        }),
        filter::search(filter.search_term(), |e: &AttendanceEntry| vec![e.course_title]),
    ]);

    let mut positions: HashMap<(String, String), usize> = HashMap::new();
    let mut groups: Vec<(Option<NaiveDate>, String, &AttendanceEntry, Vec<&AttendanceRecord>)> =
        Vec::new();

    for entry in filter::apply(&entries, &predicate) {
        let record = entry.record;
        let day = record.day();
        let date = match day {
            Some(_) => day_label(day),
            None => record.date.as_deref().unwrap_or("").trim().to_string(),
        };
        let key = (date.clone(), record.course_id().to_string());

        match positions.get(&key) {
            Some(&index) => groups[index].3.push(record),
            None => {
                positions.insert(key, groups.len());
                groups.push((day, date, entry, vec![record]));
            }
        }
    }

    groups.sort_by(|a, b| b.0.cmp(&a.0));

    let rows: Vec<AttendanceReportRow> = groups
        .into_iter()
        .map(|(_, date, entry, records)| {
            let summary = aggregate::attendance_summary(records.iter().copied());
            AttendanceReportRow {
                date,
                course_id: entry.record.course_id().to_string(),
                course_title: entry.course_title.to_string(),
                present: summary.present_count,
                late: summary.late_count,
                absent: summary.absent_count,
                total: records.len(),
                attendance_rate: summary.attendance_rate,
            }
        })
        .collect();

    debug!(report = "attendance", rows = rows.len(), "projected report rows");
    rows
}

pub fn attendance_report(
    attendance: &[AttendanceRecord],
    courses: &[Course],
    filter: &ReportFilter,
) -> ReportResponse<AttendanceReportRow> {
    paginate(attendance_rows(attendance, courses, filter), filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttendanceStatus, PaymentStatus, RelatedItem, Role};
    use pretty_assertions::assert_eq;

    fn student(id: &str, name: &str, created_at: &str) -> User {
        User {
            id: id.to_string(),
            name: Some(name.to_string()),
            email: Some(format!("{id}@academy.test")),
            role: Role::Student,
            created_at: Some(created_at.to_string()),
            ..User::default()
        }
    }

    fn course(id: &str, title: &str, progress: f64) -> Course {
        Course {
            id: id.to_string(),
            title: Some(title.to_string()),
            category: Some("Data".to_string()),
            progress: Some(progress),
            created_at: Some("2026-01-15".to_string()),
        }
    }

    fn payment(id: &str, user: &str, courses: &[&str], status: PaymentStatus) -> PaymentRecord {
        PaymentRecord {
            id: id.to_string(),
            user_id: Some(user.to_string()),
            amount: Some(1500),
            status,
            provider: Some("flutterwave".to_string()),
            related_items: courses
                .iter()
                .map(|c| RelatedItem {
                    kind: "course".to_string(),
                    id: (*c).to_string(),
                })
                .collect(),
            created_at: Some("2026-05-10T08:00:00Z".to_string()),
        }
    }

    #[test]
    fn paginate_slices_after_counting() {
        let filter = ReportFilter {
            page: Some(2),
            limit: Some(3),
            ..ReportFilter::default()
        };
        let response = paginate((1..=8).collect::<Vec<i32>>(), &filter);
        assert_eq!(response.data, vec![4, 5, 6]);
        assert_eq!(response.total, 8);
        assert_eq!(response.total_pages, 3);
    }

    #[test]
    fn paginate_clamps_degenerate_page_and_limit() {
        let filter = ReportFilter {
            page: Some(0),
            limit: Some(0),
            ..ReportFilter::default()
        };
        let response = paginate(vec!["a", "b"], &filter);
        assert_eq!(response.page, 1);
        assert_eq!(response.limit, 1);
        assert_eq!(response.data, vec!["a"]);
        assert_eq!(response.total_pages, 2);

        let past_end = ReportFilter {
            page: Some(9),
            ..ReportFilter::default()
        };
        let response = paginate(vec!["a", "b"], &past_end);
        assert!(response.data.is_empty());
        assert_eq!(response.total, 2);
    }

    #[test]
    fn empty_inputs_produce_empty_responses() {
        let filter = ReportFilter::default();
        let response = payment_report(&[], &[], &[], &filter);
        assert!(response.data.is_empty());
        assert_eq!(response.total, 0);
        assert_eq!(response.total_pages, 0);
        assert_eq!(attendance_report(&[], &[], &filter).total, 0);
        assert_eq!(student_report(&[], &[], &[], &[], &filter).total, 0);
        assert_eq!(course_report(&[], &[], &[], &[], &filter).total, 0);
    }

    #[test]
    fn payment_joins_fall_back_to_placeholders() {
        let users = vec![student("u1", "Ngozi Okafor", "2026-01-02")];
        let courses = vec![course("c1", "Intro to SQL", 50.0)];
        let payments = vec![
            payment("p1", "u1", &["c1", "c404"], PaymentStatus::Succeeded),
            payment("p2", "ghost", &["c1"], PaymentStatus::Pending),
        ];

        let rows = payment_rows(&payments, &users, &courses, &ReportFilter::default());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].user_name, "Ngozi Okafor");
        assert_eq!(rows[0].courses, "Intro to SQL; Unknown Course");
        assert_eq!(rows[1].user_name, "Unknown User");
        assert_eq!(rows[1].user_email, "");
        assert_eq!(rows[1].created_at, "2026-05-10");
    }

    #[test]
    fn payment_filter_by_status_and_course() {
        let payments = vec![
            payment("p1", "u1", &["c1"], PaymentStatus::Succeeded),
            payment("p2", "u2", &["c1"], PaymentStatus::Failed),
            payment("p3", "u3", &["c2"], PaymentStatus::Succeeded),
            payment("p4", "u4", &["c2", "c1"], PaymentStatus::Succeeded),
            payment("p5", "u5", &["c3"], PaymentStatus::Pending),
        ];
        let filter = ReportFilter {
            status: Some("succeeded".to_string()),
            course_id: Some("c1".to_string()),
            ..ReportFilter::default()
        };

        let response = payment_report(&payments, &[], &[], &filter);
        assert_eq!(response.total, 2);
        let ids: Vec<&str> = response.data.iter().map(|row| row.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p4"]);
    }

    #[test]
    fn payment_search_reaches_joined_user_fields() {
        let users = vec![student("u1", "Tunde Bakare", "2026-01-02")];
        let payments = vec![
            payment("p1", "u1", &["c1"], PaymentStatus::Succeeded),
            payment("p2", "u2", &["c1"], PaymentStatus::Succeeded),
        ];
        let filter = ReportFilter {
            search_term: Some("bakare".to_string()),
            ..ReportFilter::default()
        };
        let rows = payment_rows(&payments, &users, &[], &filter);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "p1");
    }

    #[test]
    fn student_report_only_includes_students() {
        let mut teacher = student("t1", "Mrs Adeyemi", "2026-01-02");
        teacher.role = Role::Teacher;
        let users = vec![
            student("u1", "Amaka", "2026-02-01"),
            teacher,
            student("u2", "Kelechi", "2026-03-01"),
        ];
        let response = student_report(&users, &[], &[], &[], &ReportFilter::default());
        assert_eq!(response.total, 2);
    }

    #[test]
    fn student_report_applies_course_and_completion_filters() {
        let users = vec![
            student("u1", "Amaka", "2026-02-01"),
            student("u2", "Kelechi", "2026-03-01"),
            student("u3", "Emeka", "2026-03-05"),
        ];
        let courses = vec![course("c1", "SQL", 80.0), course("c2", "Excel", 20.0)];
        let payments = vec![
            payment("p1", "u1", &["c1"], PaymentStatus::Succeeded),
            payment("p2", "u2", &["c2"], PaymentStatus::Succeeded),
            payment("p3", "u3", &["c1"], PaymentStatus::Failed),
        ];

        let by_course = ReportFilter {
            course_id: Some("c1".to_string()),
            ..ReportFilter::default()
        };
        let rows = student_rows(&users, &courses, &payments, &[], &by_course);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "u1");
        assert_eq!(rows[0].completion_rate, 80);
        assert_eq!(rows[0].total_spent, 1500);

        let by_completion = ReportFilter {
            completion_rate_max: Some(50.0),
            ..ReportFilter::default()
        };
        let ids: Vec<String> = student_rows(&users, &courses, &payments, &[], &by_completion)
            .into_iter()
            .map(|row| row.id)
            .collect();
        assert_eq!(ids, vec!["u2".to_string(), "u3".to_string()]);
    }

    #[test]
    fn student_date_range_excludes_unparsable_join_dates() {
        let users = vec![
            student("u1", "Amaka", "2026-02-01"),
            student("u2", "Kelechi", "sometime"),
        ];
        let filter = ReportFilter {
            start_date: NaiveDate::from_ymd_opt(2026, 1, 1),
            ..ReportFilter::default()
        };
        let rows = student_rows(&users, &[], &[], &[], &filter);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].joined_at, "2026-02-01");
    }

    #[test]
    fn course_report_combines_metrics() {
        let courses = vec![course("c1", "SQL", 62.4), course("c2", "Excel", 10.0)];
        let payments = vec![
            payment("p1", "u1", &["c1"], PaymentStatus::Succeeded),
            payment("p2", "u2", &["c1"], PaymentStatus::Succeeded),
        ];
        let attendance = vec![
            AttendanceRecord {
                date: Some("2026-05-04".to_string()),
                course_id: Some("c1".to_string()),
                status: AttendanceStatus::Present,
            },
            AttendanceRecord {
                date: Some("2026-05-05".to_string()),
                course_id: Some("c1".to_string()),
                status: AttendanceStatus::Absent,
            },
        ];
        let filter = ReportFilter {
            search_term: Some("sql".to_string()),
            ..ReportFilter::default()
        };

        let rows = course_rows(&courses, &payments, &[], &attendance, &filter);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].enrollments, 2);
        assert_eq!(rows[0].revenue, 3000);
        assert_eq!(rows[0].completion_rate, 62);
        assert_eq!(rows[0].attendance_rate, 50);
    }

    #[test]
    fn attendance_rows_group_and_sort_newest_first() {
        let record = |date: &str, course: &str, status| AttendanceRecord {
            date: Some(date.to_string()),
            course_id: Some(course.to_string()),
            status,
        };
        let attendance = vec![
            record("2026-05-01", "c1", AttendanceStatus::Present),
            record("bad-date", "c1", AttendanceStatus::Present),
            record("2026-05-03", "c1", AttendanceStatus::Late),
            record("2026-05-01", "c1", AttendanceStatus::Absent),
            record("2026-05-03", "c9", AttendanceStatus::Present),
        ];
        let courses = vec![course("c1", "SQL", 0.0)];

        let rows = attendance_rows(&attendance, &courses, &ReportFilter::default());
        let keys: Vec<(&str, &str)> = rows
            .iter()
            .map(|row| (row.date.as_str(), row.course_title.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("2026-05-03", "SQL"),
                ("2026-05-03", "Unknown Course"),
                ("2026-05-01", "SQL"),
                ("bad-date", "SQL"),
            ]
        );
        assert_eq!(rows[2].total, 2);
        assert_eq!(rows[2].attendance_rate, 50);
    }

    #[test]
    fn data_never_exceeds_limit() {
        let users: Vec<User> = (0..23)
            .map(|i| student(&format!("u{i}"), "Student", "2026-01-01"))
            .collect();
        for page in 1..=4 {
            let filter = ReportFilter {
                page: Some(page),
                limit: Some(7),
                ..ReportFilter::default()
            };
            let response = student_report(&users, &[], &[], &[], &filter);
            assert!(response.data.len() <= 7);
            assert_eq!(response.total, 23);
            assert_eq!(response.total_pages, 4);
        }
    }

    fn attended(date: &str, course: &str, status: AttendanceStatus) -> AttendanceRecord {
        AttendanceRecord {
            date: Some(date.to_string()),
            course_id: Some(course.to_string()),
            status,
        }
    }

    #[test]
    fn attendance_status_filter_counts_only_matching_records() {
        let attendance = vec![
            attended("2026-05-01", "c1", AttendanceStatus::Present),
            attended("2026-05-01", "c1", AttendanceStatus::Absent),
            attended("2026-05-01", "c1", AttendanceStatus::Late),
            attended("2026-05-02", "c1", AttendanceStatus::Absent),
            attended("2026-05-02", "c2", AttendanceStatus::Present),
        ];
        let filter = ReportFilter {
            status: Some("PRESENT".to_string()),
            ..ReportFilter::default()
        };

        let rows = attendance_rows(&attendance, &[], &filter);
        let keys: Vec<(&str, &str)> = rows
            .iter()
            .map(|row| (row.date.as_str(), row.course_id.as_str()))
            .collect();
        assert_eq!(keys, vec![("2026-05-02", "c2"), ("2026-05-01", "c1")]);
        for row in &rows {
            assert_eq!(row.present, 1);
            assert_eq!(row.late, 0);
            assert_eq!(row.absent, 0);
            assert_eq!(row.total, 1);
            assert_eq!(row.attendance_rate, 100);
        }
    }

    #[test]
    fn attendance_date_range_is_inclusive_and_drops_undated() {
        let attendance = vec![
            attended("2026-04-30", "c1", AttendanceStatus::Present),
            attended("2026-05-02", "c1", AttendanceStatus::Absent),
            attended("2026-05-02T17:45:00Z", "c1", AttendanceStatus::Present),
            attended("2026-05-02", "c2", AttendanceStatus::Late),
            attended("unknown", "c1", AttendanceStatus::Present),
            attended("2026-05-03", "c1", AttendanceStatus::Present),
        ];
        let filter = ReportFilter {
            start_date: NaiveDate::from_ymd_opt(2026, 5, 1),
            end_date: NaiveDate::from_ymd_opt(2026, 5, 2),
            ..ReportFilter::default()
        };

        let rows = attendance_rows(&attendance, &[], &filter);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, "2026-05-02");
        assert_eq!(rows[0].course_id, "c1");
        assert_eq!(rows[0].total, 2);
        assert_eq!(rows[0].attendance_rate, 50);
        assert_eq!(rows[1].course_id, "c2");
        assert_eq!(rows[1].late, 1);
    }

    #[test]
    fn payment_date_range_is_inclusive_and_drops_undated() {
        let dated = |id: &str, created_at: Option<&str>| PaymentRecord {
            created_at: created_at.map(str::to_string),
            ..payment(id, "u1", &["c1"], PaymentStatus::Succeeded)
        };
        let payments = vec![
            dated("p1", Some("2026-04-30T23:59:59Z")),
            dated("p2", Some("2026-05-01")),
            dated("p3", Some("2026-05-31T22:00:00Z")),
            dated("p4", None),
            dated("p5", Some("2026-06-01")),
        ];
        let filter = ReportFilter {
            start_date: NaiveDate::from_ymd_opt(2026, 5, 1),
            end_date: NaiveDate::from_ymd_opt(2026, 5, 31),
            ..ReportFilter::default()
        };

        let ids: Vec<String> = payment_rows(&payments, &[], &[], &filter)
            .into_iter()
            .map(|row| row.id)
            .collect();
        assert_eq!(ids, vec!["p2".to_string(), "p3".to_string()]);
    }

    #[test]
    fn student_label_filters_ignore_case() {
        let mut amaka = student("u1", "Amaka", "2026-02-01");
        amaka.gender = Some("Female".to_string());
        amaka.location = Some("Lagos".to_string());
        amaka.corporate_id = Some("acme".to_string());
        let mut kelechi = student("u2", "Kelechi", "2026-03-01");
        kelechi.gender = Some("male".to_string());
        kelechi.location = Some(" lagos ".to_string());
        let mut zainab = student("u3", "Zainab", "2026-03-05");
        zainab.gender = Some("FEMALE".to_string());
        zainab.location = Some("Abuja".to_string());
        let users = vec![amaka, kelechi, zainab];

        let ids = |filter: ReportFilter| -> Vec<String> {
            student_rows(&users, &[], &[], &[], &filter)
                .into_iter()
                .map(|row| row.id)
                .collect()
        };

        let by_gender = ReportFilter {
            gender: Some("female".to_string()),
            ..ReportFilter::default()
        };
        assert_eq!(ids(by_gender), vec!["u1".to_string(), "u3".to_string()]);

        let by_account = ReportFilter {
            account_type: Some("Corporate".to_string()),
            ..ReportFilter::default()
        };
        assert_eq!(ids(by_account), vec!["u1".to_string()]);

        let individual = ReportFilter {
            account_type: Some("INDIVIDUAL".to_string()),
            ..ReportFilter::default()
        };
        assert_eq!(ids(individual), vec!["u2".to_string(), "u3".to_string()]);

        let by_location = ReportFilter {
            location: Some("LAGOS".to_string()),
            ..ReportFilter::default()
        };
        assert_eq!(ids(by_location), vec!["u1".to_string(), "u2".to_string()]);

        let combined = ReportFilter {
            gender: Some("Female".to_string()),
            location: Some("lagos".to_string()),
            ..ReportFilter::default()
        };
        assert_eq!(ids(combined), vec!["u1".to_string()]);
    }
}
