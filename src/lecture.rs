//! Lecture descriptors and the per-student status sheet submitted by a teacher.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::models::{SectionKey, Status, Student};

/// Form key prefix for a student's status, as in `status_42`.
pub const STATUS_PREFIX: &str = "status_";

/// Identifies one lecture instance and the section it was held for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LectureDescriptor {
    pub date: NaiveDate,
    pub subject: String,
    pub lecture_no: String,
    pub section: SectionKey,
}

impl LectureDescriptor {
    /// Builds a descriptor from raw form values.
    ///
    /// All six fields are mandatory. The first blank one, in argument order, is reported as
    /// [`Error::MissingField`]. Only after every field is present is the date parsed
    /// (`YYYY-MM-DD`).
    pub fn new(
        date: &str,
        subject: &str,
        lecture_no: &str,
        semester: &str,
        stream: &str,
        division: &str,
    ) -> Result<Self> {
        let date = required("date", date)?;
        let subject = required("subject", subject)?;
        let lecture_no = required("lecture_no", lecture_no)?;
        let semester = required("sem", semester)?;
        let stream = required("stream", stream)?;
        let division = required("division", division)?;

        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|err| {
            Error::InvalidField {
                field: "date",
                reason: err.to_string(),
            }
        })?;

        Ok(Self {
            date,
            subject: subject.to_string(),
            lecture_no: lecture_no.to_string(),
            section: SectionKey::new(semester, stream, division),
        })
    }

    /// Builds a descriptor from a submitted form or query string. Absent keys count as blank.
    pub fn from_form(form: &HashMap<String, String>) -> Result<Self> {
        let field = |name: &str| form.get(name).map(String::as_str).unwrap_or_default();

        Self::new(
            field("date"),
            field("subject"),
            field("lecture_no"),
            field("sem"),
            field("stream"),
            field("division"),
        )
    }
}

/// Returns the trimmed value, or [`Error::MissingField`] if nothing is left.
pub fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str> {
    match value.trim() {
        "" => Err(Error::MissingField(field)),
        trimmed => Ok(trimmed),
    }
}

/// Collects every `status_<id>` entry of a submitted form.
///
/// Keys whose suffix is not a student id are skipped.
pub fn statuses_from_form(form: &HashMap<String, String>) -> HashMap<i32, Status> {
    form.iter()
        .filter_map(|(key, value)| {
            let id = key.strip_prefix(STATUS_PREFIX)?.parse().ok()?;
            Some((id, Status::from_submitted(value)))
        })
        .collect()
}

/// Gives every roster member an explicit status.
///
/// Members missing from `submitted` become [`Status::Absent`]; presence has to be asserted.
/// Submitted ids that are not on the roster are dropped.
pub fn normalize_statuses(
    roster: &[Student],
    submitted: &HashMap<i32, Status>,
) -> Vec<(i32, Status)> {
    roster
        .iter()
        .map(|student| {
            let status = submitted
                .get(&student.id)
                .copied()
                .unwrap_or(Status::Absent);
            (student.id, status)
        })
        .collect()
}
