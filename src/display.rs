use crate::error::Result;
use crate::manager::AttendanceManager;
use crate::models::{SectionKey, Student};
use tabled::{Table, Tabled, settings::Style};

#[derive(Tabled)]
struct RosterRow {
    id: i32,
    name: String,
    email: String,
}

impl From<Student> for RosterRow {
    fn from(student: Student) -> Self {
        Self {
            id: student.id,
            name: student.name,
            email: student.email,
        }
    }
}

/// Renders the roster of a section as a table.
pub fn roster_table(students: Vec<Student>) -> String {
    let mut table = Table::new(students.into_iter().map(RosterRow::from));
    table.with(Style::modern());
    table.to_string()
}

/// Pretty prints every student in a section.
pub fn show_roster(manager: &mut AttendanceManager, section: &SectionKey) -> Result<()> {
    let roster = manager.load_roster(section)?;

    if roster.is_empty() {
        println!("No students in {section}.");
    } else {
        println!("Roster for {section}:\n{}", roster_table(roster));
    }

    Ok(())
}

/// Pretty prints a student's attendance, one row per subject.
pub fn show_student_summary(manager: &mut AttendanceManager, email: &str) -> Result<()> {
    let Some(student) = manager.find_student_by_email(email)? else {
        eprintln!("Student with email '{email}' not found.");
        return Ok(());
    };

    let summaries = manager.summarize(student.id)?;
    println!("{} <{}>, {}", student.name, student.email, student.section());

    if summaries.is_empty() {
        println!("No attendance recorded yet.");
    } else {
        let mut table = Table::new(summaries);
        table.with(Style::modern());
        println!("{table}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roster_table_lists_students_without_hashes() {
        let table = roster_table(vec![Student {
            id: 3,
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            semester: "3".to_string(),
            stream: "CS".to_string(),
            division: "A".to_string(),
        }]);

        assert!(table.contains("ada@example.com"));
        assert!(!table.contains("argon2"));
    }
}
