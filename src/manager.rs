use std::collections::HashMap;

use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::lecture::{LectureDescriptor, normalize_statuses, required};
use crate::models::{
    Attendance, NewAttendance, NewStudent, NewTeacher, Role, SectionKey, Status, Student, Teacher,
};
use crate::password::{check_credentials, hash_password};
use crate::schema;
use crate::summary::{self, SubjectSummary};

/// Schema migrations compiled into the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Submitted fields of the student registration form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StudentRegistration {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(rename = "sem")]
    pub semester: String,
    pub stream: String,
    pub division: String,
}

/// Submitted fields of the teacher registration form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TeacherRegistration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub department: String,
}

/// A checked student registration with its password already hashed.
#[derive(Debug, Clone)]
pub struct PreparedStudent {
    name: String,
    email: String,
    password_hash: String,
    semester: String,
    stream: String,
    division: String,
}

/// A checked teacher registration with its password already hashed.
#[derive(Debug, Clone)]
pub struct PreparedTeacher {
    name: String,
    email: String,
    password_hash: String,
    department: String,
}

impl StudentRegistration {
    /// Validates the form and hashes the password without touching the store.
    pub fn prepare(&self) -> Result<PreparedStudent> {
        let name = required("name", &self.name)?;
        let email = normalize_email(&self.email)?;
        let password = required_password(&self.password)?;
        let semester = required("sem", &self.semester)?;
        let stream = required("stream", &self.stream)?;
        let division = required("division", &self.division)?;

        Ok(PreparedStudent {
            name: name.to_string(),
            email,
            password_hash: hash_password(password)?,
            semester: semester.to_string(),
            stream: stream.to_string(),
            division: division.to_string(),
        })
    }
}

impl TeacherRegistration {
    /// Validates the form and hashes the password without touching the store.
    pub fn prepare(&self) -> Result<PreparedTeacher> {
        let name = required("name", &self.name)?;
        let email = normalize_email(&self.email)?;
        let password = required_password(&self.password)?;
        let department = required("department", &self.department)?;

        Ok(PreparedTeacher {
            name: name.to_string(),
            email,
            password_hash: hash_password(password)?,
            department: department.to_string(),
        })
    }
}

/// The manager for registering accounts and recording, retrieving, and summarizing attendance
/// data.
///
/// Every operation goes through the one connection owned here; callers hand the manager to
/// whatever needs the store instead of reaching for a global.
pub struct AttendanceManager {
    db: SqliteConnection,
}

impl AttendanceManager {
    /// Connects to the `sqlite3` database at `database_url` and applies pending migrations.
    pub fn connect(database_url: &str) -> Result<Self> {
        let mut db = SqliteConnection::establish(database_url)?;
        diesel::sql_query("PRAGMA foreign_keys = ON").execute(&mut db)?;

        let mut manager = Self { db };
        manager.run_migrations()?;

        Ok(manager)
    }

    /// Opens a private in-memory database. Everything is lost when the manager is dropped.
    pub fn in_memory() -> Result<Self> {
        Self::connect(":memory:")
    }

    /// Applies any migrations that have not been run yet.
    pub fn run_migrations(&mut self) -> Result<()> {
        let applied = self
            .db
            .run_pending_migrations(MIGRATIONS)
            .map_err(|err| Error::Migration(err.to_string()))?;

        for version in &applied {
            tracing::info!(%version, "applied migration");
        }

        Ok(())
    }

    /// Creates a student account.
    ///
    /// Fails with [`Error::DuplicateEmail`] if a student already uses this email; nothing is
    /// written in that case. Teachers with the same email do not count.
    pub fn register_student(&mut self, form: &StudentRegistration) -> Result<Student> {
        let student = form.prepare()?;
        self.create_student(&student)
    }

    /// Stores a prepared student registration. See [`AttendanceManager::register_student`].
    pub fn create_student(&mut self, new: &PreparedStudent) -> Result<Student> {
        if self.find_student_by_email(&new.email)?.is_some() {
            return Err(Error::DuplicateEmail(Role::Student));
        }

        let student = diesel::insert_into(schema::students::table)
            .values(NewStudent {
                name: &new.name,
                email: &new.email,
                password_hash: &new.password_hash,
                semester: &new.semester,
                stream: &new.stream,
                division: &new.division,
            })
            .returning(Student::as_returning())
            .get_result(&mut self.db)
            .map_err(|err| duplicate_email_or(err, Role::Student))?;

        tracing::info!(student_id = student.id, "registered student");
        Ok(student)
    }

    /// Creates a teacher account. See [`AttendanceManager::register_student`].
    pub fn register_teacher(&mut self, form: &TeacherRegistration) -> Result<Teacher> {
        let teacher = form.prepare()?;
        self.create_teacher(&teacher)
    }

    /// Stores a prepared teacher registration. See [`AttendanceManager::register_student`].
    pub fn create_teacher(&mut self, new: &PreparedTeacher) -> Result<Teacher> {
        if self.find_teacher_by_email(&new.email)?.is_some() {
            return Err(Error::DuplicateEmail(Role::Teacher));
        }

        let teacher = diesel::insert_into(schema::teachers::table)
            .values(NewTeacher {
                name: &new.name,
                email: &new.email,
                password_hash: &new.password_hash,
                department: &new.department,
            })
            .returning(Teacher::as_returning())
            .get_result(&mut self.db)
            .map_err(|err| duplicate_email_or(err, Role::Teacher))?;

        tracing::info!(teacher_id = teacher.id, "registered teacher");
        Ok(teacher)
    }

    /// Checks a student's credentials. Any failure is [`Error::InvalidCredentials`].
    pub fn authenticate_student(&mut self, email: &str, password: &str) -> Result<Student> {
        check_credentials(self.find_student_by_email(email)?, password)
    }

    /// Checks a teacher's credentials. Any failure is [`Error::InvalidCredentials`].
    pub fn authenticate_teacher(&mut self, email: &str, password: &str) -> Result<Teacher> {
        check_credentials(self.find_teacher_by_email(email)?, password)
    }

    /// Looks a student up by email, ignoring case and surrounding whitespace.
    pub fn find_student_by_email(&mut self, student_email: &str) -> Result<Option<Student>> {
        use schema::students::dsl::*;

        Ok(students
            .filter(email.eq(student_email.trim().to_lowercase()))
            .select(Student::as_select())
            .first(&mut self.db)
            .optional()?)
    }

    /// Looks a teacher up by email, ignoring case and surrounding whitespace.
    pub fn find_teacher_by_email(&mut self, teacher_email: &str) -> Result<Option<Teacher>> {
        use schema::teachers::dsl::*;

        Ok(teachers
            .filter(email.eq(teacher_email.trim().to_lowercase()))
            .select(Teacher::as_select())
            .first(&mut self.db)
            .optional()?)
    }

    /// Retrieves a specific student based on their ID.
    pub fn get_student(&mut self, student_id: i32) -> Result<Student> {
        schema::students::table
            .find(student_id)
            .select(Student::as_select())
            .first(&mut self.db)
            .optional()?
            .ok_or(Error::NotFound(Role::Student))
    }

    /// Retrieves a specific teacher based on their ID.
    pub fn get_teacher(&mut self, teacher_id: i32) -> Result<Teacher> {
        find_teacher(&mut self.db, teacher_id)
    }

    /// Retrieves every student whose section key matches `section` exactly, once surrounding
    /// whitespace is trimmed.
    pub fn load_roster(&mut self, section: &SectionKey) -> Result<Vec<Student>> {
        let section = SectionKey::new(
            required("sem", &section.semester)?,
            required("stream", &section.stream)?,
            required("division", &section.division)?,
        );

        Ok(roster(&mut self.db, &section)?)
    }

    /// Writes one attendance row per roster member for the given lecture.
    ///
    /// Students missing from `submitted` are recorded as absent. The roster is read and every
    /// row is inserted inside one transaction, so a failure leaves no partial sheet behind.
    /// Repeating a submission writes a second set of rows.
    ///
    /// Returns the number of rows written.
    pub fn record_lecture(
        &mut self,
        teacher_id: i32,
        lecture: &LectureDescriptor,
        submitted: &HashMap<i32, Status>,
    ) -> Result<usize> {
        let written = self.db.transaction::<_, Error, _>(|conn| {
            find_teacher(conn, teacher_id)?;

            let students = roster(conn, &lecture.section)?;
            if students.is_empty() {
                return Err(Error::EmptyRoster);
            }

            let records: Vec<NewAttendance> = normalize_statuses(&students, submitted)
                .into_iter()
                .map(|(student_id, status)| NewAttendance {
                    date: lecture.date,
                    subject: &lecture.subject,
                    lecture_no: &lecture.lecture_no,
                    semester: &lecture.section.semester,
                    stream: &lecture.section.stream,
                    division: &lecture.section.division,
                    status,
                    student_id,
                    teacher_id,
                })
                .collect();

            let inserted = diesel::insert_into(schema::attendance::table)
                .values(records)
                .execute(conn)?;

            Ok(inserted)
        })?;

        tracing::info!(
            teacher_id,
            subject = %lecture.subject,
            lecture_no = %lecture.lecture_no,
            date = %lecture.date,
            rows = written,
            "recorded lecture attendance"
        );

        Ok(written)
    }

    /// Retrieves every attendance row of a student, oldest first.
    pub fn get_student_attendance(&mut self, student: i32) -> Result<Vec<Attendance>> {
        use schema::attendance::dsl::*;

        Ok(attendance
            .filter(student_id.eq(student))
            .order((date.asc(), id.asc()))
            .select(Attendance::as_select())
            .load(&mut self.db)?)
    }

    /// Per-subject totals and presence percentage for a student.
    pub fn summarize(&mut self, student_id: i32) -> Result<Vec<SubjectSummary>> {
        let records = self.get_student_attendance(student_id)?;
        Ok(summary::summarize(&records))
    }

    /// Retrieves all students, grouped by section.
    pub fn list_students(&mut self) -> Result<Vec<Student>> {
        use schema::students::dsl::*;

        Ok(students
            .order((semester.asc(), stream.asc(), division.asc(), name.asc()))
            .select(Student::as_select())
            .load(&mut self.db)?)
    }

    /// Returns the total number of registered students.
    pub fn num_students(&mut self) -> Result<usize> {
        let count: i64 = schema::students::table.count().get_result(&mut self.db)?;
        Ok(count as usize)
    }

    /// Returns the total number of registered teachers.
    pub fn num_teachers(&mut self) -> Result<usize> {
        let count: i64 = schema::teachers::table.count().get_result(&mut self.db)?;
        Ok(count as usize)
    }

    /// Returns the total number of attendance rows ever written.
    pub fn num_attendance_records(&mut self) -> Result<usize> {
        let count: i64 = schema::attendance::table.count().get_result(&mut self.db)?;
        Ok(count as usize)
    }
}

fn roster(conn: &mut SqliteConnection, section: &SectionKey) -> QueryResult<Vec<Student>> {
    use schema::students::dsl::*;

    students
        .filter(semester.eq(&section.semester))
        .filter(stream.eq(&section.stream))
        .filter(division.eq(&section.division))
        .order((name.asc(), id.asc()))
        .select(Student::as_select())
        .load(conn)
}

fn find_teacher(conn: &mut SqliteConnection, teacher_id: i32) -> Result<Teacher> {
    schema::teachers::table
        .find(teacher_id)
        .select(Teacher::as_select())
        .first(conn)
        .optional()?
        .ok_or(Error::NotFound(Role::Teacher))
}

fn normalize_email(email: &str) -> Result<String> {
    Ok(required("email", email)?.to_lowercase())
}

/// Passwords are taken verbatim, so only an empty one is rejected.
fn required_password(password: &str) -> Result<&str> {
    if password.is_empty() {
        Err(Error::MissingField("password"))
    } else {
        Ok(password)
    }
}

/// A concurrent registration can still race past the lookup; the UNIQUE constraint catches it.
fn duplicate_email_or(err: DieselError, role: Role) -> Error {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            Error::DuplicateEmail(role)
        }
        other => other.into(),
    }
}
