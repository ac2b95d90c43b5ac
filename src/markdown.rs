use std::fmt::Write;

use chrono::NaiveDate;

use crate::dashboard::{DashboardStats, RankedCourse};
use crate::models::{NamedCount, SeriesPoint};

fn write_counts(output: &mut String, heading: &str, counts: &[NamedCount]) {
    let _ = writeln!(output, "### {heading}");

    if counts.iter().all(|count| count.value == 0) {
        let _ = writeln!(output, "No records in this breakdown.");
    } else {
        for count in counts {
            let _ = writeln!(output, "- {}: {}", count.name, count.value);
        }
    }
    let _ = writeln!(output);
}

fn write_ranking(output: &mut String, heading: &str, courses: &[RankedCourse]) {
    let _ = writeln!(output, "### {heading}");

    if courses.is_empty() {
        let _ = writeln!(output, "No courses to rank.");
    } else {
        for (position, course) in courses.iter().enumerate() {
            let _ = writeln!(
                output,
                "{}. {} ({:.1})",
                position + 1,
                course.title,
                course.value
            );
        }
    }
    let _ = writeln!(output);
}

fn series_line(series: &[SeriesPoint]) -> String {
    series
        .iter()
        .map(|point| format!("{} {}", point.label, point.value))
        .collect::<Vec<_>>()
        .join(" | ")
}

fn percent_series_line(series: &[SeriesPoint]) -> String {
    series
        .iter()
        .map(|point| format!("{} {}%", point.label, point.value))
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Markdown digest of a dashboard snapshot.
pub fn render_dashboard(stats: &DashboardStats, as_of: NaiveDate) -> String {
    let students = &stats.student_stats;
    let courses = &stats.course_stats;
    let payments = &stats.payment_stats;
    let attendance = &stats.attendance_stats;

    let mut output = String::new();
    let _ = writeln!(output, "# LMS Analytics Summary");
    let _ = writeln!(output, "Generated as of {as_of}");
    let _ = writeln!(output);

    let _ = writeln!(output, "## Students");
    let _ = writeln!(
        output,
        "- {} students, {} joined this month",
        students.total_students, students.new_this_month
    );
    let _ = writeln!(output, "- Enrollments: {}", series_line(&students.enrollment_trend));
    let _ = writeln!(output);
    write_counts(&mut output, "Gender", &students.gender_distribution);
    write_counts(&mut output, "Age", &students.age_distribution);
    write_counts(&mut output, "Account type", &students.account_type_distribution);
    write_counts(&mut output, "Top locations", &students.location_distribution);

    let _ = writeln!(output, "## Courses");
    let _ = writeln!(
        output,
        "- {} courses, average completion {}%",
        courses.total_courses, courses.average_completion
    );
    let _ = writeln!(output);
    write_counts(&mut output, "Categories", &courses.category_distribution);
    write_ranking(&mut output, "Most enrolled", &courses.top_by_enrollment);
    write_ranking(&mut output, "Highest completion", &courses.top_by_completion);
    write_ranking(&mut output, "Highest revenue", &courses.top_by_revenue);
    write_ranking(&mut output, "Highest grades", &courses.top_by_grade);

    let _ = writeln!(output, "## Payments");
    let _ = writeln!(
        output,
        "- Revenue {} across {} transactions ({}% succeeded)",
        payments.total_revenue, payments.total_transactions, payments.success_rate
    );
    let _ = writeln!(
        output,
        "- {} succeeded, {} pending, {} failed, {} refunded",
        payments.succeeded, payments.pending, payments.failed, payments.refunded
    );
    let _ = writeln!(output, "- Revenue: {}", series_line(&payments.revenue_trend));
    let _ = writeln!(output);
    write_counts(&mut output, "Providers", &payments.provider_distribution);

    let _ = writeln!(output, "## Attendance");
    let summary = &attendance.summary;
    if summary.present_count + summary.late_count + summary.absent_count == 0 {
        let _ = writeln!(output, "No attendance recorded.");
    } else {
        let _ = writeln!(
            output,
            "- Attendance rate {}% ({} present, {} late, {} absent)",
            summary.attendance_rate,
            summary.present_count,
            summary.late_count,
            summary.absent_count
        );
    }
    let _ = writeln!(
        output,
        "- Attendance rate by month: {}",
        percent_series_line(&attendance.attendance_trend)
    );
    let _ = writeln!(output);
    write_counts(&mut output, "By weekday", &attendance.weekday_distribution);

    output
}
