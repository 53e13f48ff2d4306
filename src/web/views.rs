//! Server-rendered HTML pages.
//!
//! Every value that came from a user goes through [`escape`] before it reaches the markup.

use std::collections::HashMap;
use std::fmt::Write;

use crate::lecture::STATUS_PREFIX;
use crate::models::{Role, Student, Teacher};
use crate::summary::{SubjectSummary, Totals};
use crate::web::session::{Flash, Identity};

/// Escapes text for use in element content and quoted attribute values.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Wraps page content with the shared header, navigation, and flash messages.
pub fn layout(
    title: &str,
    identity: Option<&Identity>,
    flashes: &[Flash],
    content: &str,
) -> String {
    let nav = match identity {
        Some(identity) => format!(
            "<span>{name} ({role})</span> <a href=\"/{role}/dashboard\">Dashboard</a> \
             <a href=\"/logout\">Logout</a>",
            name = escape(&identity.name),
            role = identity.role,
        ),
        None => concat!(
            r#"<a href="/student/login">Student</a> "#,
            r#"<a href="/teacher/login">Teacher</a> "#,
            r#"<a href="/admin/login">Admin</a>"#,
        )
        .to_string(),
    };

    let messages: String = flashes
        .iter()
        .map(|flash| {
            format!(
                r#"<p class="flash flash-{}">{}</p>"#,
                flash.level.as_str(),
                escape(&flash.message)
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>{title} | Attendance</title></head>
<body>
<header><a href="/">Attendance</a> <nav>{nav}</nav></header>
{messages}
<main>
<h1>{title}</h1>
{content}
</main>
</body>
</html>
"#,
        title = escape(title),
    )
}

pub fn index(identity: Option<&Identity>, flashes: &[Flash]) -> String {
    let content = r#"<p>Track lecture attendance for every section.</p>
<ul>
<li><a href="/student/register">Register as student</a> or <a href="/student/login">log in</a></li>
<li><a href="/teacher/register">Register as teacher</a> or <a href="/teacher/login">log in</a></li>
<li><a href="/admin/login">Admin login</a></li>
</ul>"#;
    layout("Welcome", identity, flashes, content)
}

fn input(label: &str, name: &str, kind: &str, value: &str) -> String {
    format!(
        r#"<label>{label} <input type="{kind}" name="{name}" value="{value}" required></label><br>
"#,
        value = escape(value),
    )
}

pub fn student_register(flashes: &[Flash]) -> String {
    let content = format!(
        r#"<form method="post" action="/student/register">
{}{}{}{}{}{}<button type="submit">Register</button>
</form>
<p>Already registered? <a href="/student/login">Log in</a></p>"#,
        input("Name", "name", "text", ""),
        input("Email", "email", "email", ""),
        input("Password", "password", "password", ""),
        input("Semester", "sem", "text", ""),
        input("Stream", "stream", "text", ""),
        input("Division", "division", "text", ""),
    );
    layout("Student Registration", None, flashes, &content)
}

pub fn teacher_register(flashes: &[Flash]) -> String {
    let content = format!(
        r#"<form method="post" action="/teacher/register">
{}{}{}{}<button type="submit">Register</button>
</form>
<p>Already registered? <a href="/teacher/login">Log in</a></p>"#,
        input("Name", "name", "text", ""),
        input("Email", "email", "email", ""),
        input("Password", "password", "password", ""),
        input("Department", "department", "text", ""),
    );
    layout("Teacher Registration", None, flashes, &content)
}

pub fn login(role: Role, flashes: &[Flash]) -> String {
    let (user_field, register_link) = match role {
        Role::Admin => (input("Username", "username", "text", ""), String::new()),
        _ => (
            input("Email", "email", "email", ""),
            format!(r#"<p>No account? <a href="/{role}/register">Register</a></p>"#),
        ),
    };

    let content = format!(
        r#"<form method="post" action="/{role}/login">
{user_field}{password}<button type="submit">Login</button>
</form>
{register_link}"#,
        password = input("Password", "password", "password", ""),
    );
    layout(&format!("{} Login", role.title()), None, flashes, &content)
}

pub fn student_dashboard(
    identity: &Identity,
    student: &Student,
    summaries: &[SubjectSummary],
    flashes: &[Flash],
) -> String {
    let mut content = format!(
        "<p>{} &middot; {}</p>\n",
        escape(&student.email),
        escape(&student.section().to_string())
    );

    if summaries.is_empty() {
        content.push_str("<p>No attendance recorded yet.</p>");
    } else {
        content.push_str(
            "<table>\n<tr><th>Subject</th><th>Total</th><th>Present</th><th>Absent</th>\
             <th>Present %</th></tr>\n",
        );
        for summary in summaries {
            let _ = writeln!(
                content,
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{:.2}</td></tr>",
                escape(&summary.subject),
                summary.total,
                summary.present,
                summary.absent,
                summary.percent_present,
            );
        }
        content.push_str("</table>");
    }

    layout("Student Dashboard", Some(identity), flashes, &content)
}

/// The lecture fields a teacher fills in, in the order they are validated.
const LECTURE_FIELDS: [(&str, &str, &str); 6] = [
    ("Date", "date", "date"),
    ("Subject", "subject", "text"),
    ("Lecture No.", "lecture_no", "text"),
    ("Semester", "sem", "text"),
    ("Stream", "stream", "text"),
    ("Division", "division", "text"),
];

pub fn teacher_dashboard(
    identity: &Identity,
    teacher: &Teacher,
    lecture: &HashMap<String, String>,
    roster: Option<&[Student]>,
    flashes: &[Flash],
) -> String {
    let value = |name: &str| lecture.get(name).map(String::as_str).unwrap_or_default();

    let mut content = format!(
        "<p>{} &middot; {}</p>\n<h2>Load students</h2>\n\
         <form method=\"get\" action=\"/teacher/dashboard\">\n",
        escape(&teacher.email),
        escape(&teacher.department)
    );
    for (label, name, kind) in LECTURE_FIELDS {
        content.push_str(&input(label, name, kind, value(name)));
    }
    content.push_str("<button type=\"submit\">Load students</button>\n</form>\n");

    match roster {
        None => {}
        Some([]) => content.push_str("<p>No students found for this section.</p>"),
        Some(students) => {
            content.push_str(
                "<h2>Mark attendance</h2>\n<form method=\"post\" action=\"/teacher/dashboard\">\n",
            );
            for (_, name, _) in LECTURE_FIELDS {
                let _ = writeln!(
                    content,
                    r#"<input type="hidden" name="{name}" value="{}">"#,
                    escape(value(name))
                );
            }
            content.push_str("<table>\n<tr><th>Name</th><th>Email</th><th>Present</th></tr>\n");
            for student in students {
                let _ = writeln!(
                    content,
                    "<tr><td>{}</td><td>{}</td><td>\
                     <input type=\"checkbox\" name=\"{STATUS_PREFIX}{}\" value=\"present\">\
                     </td></tr>",
                    escape(&student.name),
                    escape(&student.email),
                    student.id,
                );
            }
            content.push_str(
                "</table>\n<p>Unchecked students are marked absent.</p>\n\
                 <button type=\"submit\">Save attendance</button>\n</form>",
            );
        }
    }

    layout("Teacher Dashboard", Some(identity), flashes, &content)
}

/// Store totals shown on the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoreCounts {
    pub students: usize,
    pub teachers: usize,
    pub attendance_records: usize,
}

pub fn admin_dashboard(
    identity: &Identity,
    counts: &StoreCounts,
    students: &[(Student, Totals)],
    flashes: &[Flash],
) -> String {
    let mut content = format!(
        "<p>{} students, {} teachers, {} attendance records.</p>\n",
        counts.students, counts.teachers, counts.attendance_records
    );

    content.push_str(
        "<table>\n<tr><th>Name</th><th>Email</th><th>Section</th><th>Lectures</th>\
         <th>Present %</th></tr>\n",
    );
    for (student, totals) in students {
        let _ = writeln!(
            content,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{:.2}</td></tr>",
            escape(&student.name),
            escape(&student.email),
            escape(&student.section().to_string()),
            totals.total,
            totals.percent_present(),
        );
    }
    content.push_str("</table>");

    layout("Admin Dashboard", Some(identity), flashes, &content)
}

pub fn error_page(message: &str) -> String {
    layout(
        "Error",
        None,
        &[],
        &format!(r#"<p>{}</p><p><a href="/">Back to start</a></p>"#, escape(message)),
    )
}
