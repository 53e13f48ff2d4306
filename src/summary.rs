//! Per-subject attendance aggregation.

use std::collections::BTreeMap;

use tabled::Tabled;

use crate::models::{Attendance, Status};

/// Attendance totals for one subject.
#[derive(Debug, Clone, PartialEq, Tabled)]
pub struct SubjectSummary {
    pub subject: String,
    pub total: u32,
    pub present: u32,
    pub absent: u32,
    #[tabled(display = "display_percent")]
    pub percent_present: f64,
}

fn display_percent(percent: &f64) -> String {
    format!("{percent:.2}%")
}

/// Totals across every subject.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    pub total: u32,
    pub present: u32,
    pub absent: u32,
}

impl Totals {
    fn add(&mut self, status: Status) {
        self.total += 1;
        match status {
            Status::Present => self.present += 1,
            Status::Absent => self.absent += 1,
        }
    }

    pub fn percent_present(&self) -> f64 {
        percent(self.present, self.total)
    }
}

/// `present / total * 100`, or `0` when there is nothing to divide by.
pub fn percent(present: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        f64::from(present) / f64::from(total) * 100.0
    }
}

/// Groups attendance rows by subject (case-sensitive) and computes presence per subject.
///
/// Subjects come back sorted by name so the output is stable for a given set of rows.
pub fn summarize(records: &[Attendance]) -> Vec<SubjectSummary> {
    let mut by_subject: BTreeMap<&str, Totals> = BTreeMap::new();
    for record in records {
        by_subject
            .entry(record.subject.as_str())
            .or_default()
            .add(record.status);
    }

    by_subject
        .into_iter()
        .map(|(subject, totals)| SubjectSummary {
            subject: subject.to_string(),
            total: totals.total,
            present: totals.present,
            absent: totals.absent,
            percent_present: totals.percent_present(),
        })
        .collect()
}

/// Sums the rows regardless of subject.
pub fn overall(records: &[Attendance]) -> Totals {
    records.iter().fold(Totals::default(), |mut totals, record| {
        totals.add(record.status);
        totals
    })
}
