use crate::schema::{attendance, students, teachers};
use chrono::NaiveDate;
use diesel::backend::Backend;
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::prelude::*;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use diesel::sqlite::Sqlite;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of account a session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Admin => "admin",
        }
    }

    /// Capitalized form, for headings and messages that start a sentence.
    pub fn title(self) -> &'static str {
        match self {
            Role::Student => "Student",
            Role::Teacher => "Teacher",
            Role::Admin => "Admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a student attended a lecture. Stored as lowercase text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
pub enum Status {
    Present,
    Absent,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Present => "present",
            Status::Absent => "absent",
        }
    }

    /// Interprets a submitted form value. Only an explicit `present` counts as present.
    pub fn from_submitted(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("present") {
            Status::Present
        } else {
            Status::Absent
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql<Text, Sqlite> for Status {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
        out.set_value(self.as_str());
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Sqlite> for Status {
    fn from_sql(bytes: <Sqlite as Backend>::RawValue<'_>) -> deserialize::Result<Self> {
        let text = <String as FromSql<Text, Sqlite>>::from_sql(bytes)?;
        match text.as_str() {
            "present" => Ok(Status::Present),
            "absent" => Ok(Status::Absent),
            other => Err(format!("unrecognized attendance status `{other}`").into()),
        }
    }
}

/// The (semester, stream, division) triple identifying a class cohort.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SectionKey {
    pub semester: String,
    pub stream: String,
    pub division: String,
}

impl SectionKey {
    pub fn new(
        semester: impl Into<String>,
        stream: impl Into<String>,
        division: impl Into<String>,
    ) -> Self {
        Self {
            semester: semester.into(),
            stream: stream.into(),
            division: division.into(),
        }
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sem {} / {} / Div {}", self.semester, self.stream, self.division)
    }
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = students)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Student {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub semester: String,
    pub stream: String,
    pub division: String,
}

impl Student {
    pub fn section(&self) -> SectionKey {
        SectionKey::new(&self.semester, &self.stream, &self.division)
    }
}

/// A stored account that logs in with a password.
pub trait Account {
    fn password_hash(&self) -> &str;
}

impl Account for Student {
    fn password_hash(&self) -> &str {
        &self.password_hash
    }
}

#[derive(Insertable)]
#[diesel(table_name = students)]
pub struct NewStudent<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub semester: &'a str,
    pub stream: &'a str,
    pub division: &'a str,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = teachers)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Teacher {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub department: String,
}

impl Account for Teacher {
    fn password_hash(&self) -> &str {
        &self.password_hash
    }
}

#[derive(Insertable)]
#[diesel(table_name = teachers)]
pub struct NewTeacher<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub department: &'a str,
}

/// One student's status for one lecture instance.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = attendance)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Attendance {
    pub id: i32,
    pub date: NaiveDate,
    pub subject: String,
    pub lecture_no: String,
    pub semester: String,
    pub stream: String,
    pub division: String,
    pub status: Status,
    pub student_id: i32,
    pub teacher_id: i32,
}

#[derive(Insertable)]
#[diesel(table_name = attendance)]
pub struct NewAttendance<'a> {
    pub date: NaiveDate,
    pub subject: &'a str,
    pub lecture_no: &'a str,
    pub semester: &'a str,
    pub stream: &'a str,
    pub division: &'a str,
    pub status: Status,
    pub student_id: i32,
    pub teacher_id: i32,
}
