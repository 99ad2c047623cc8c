//! Sample data for a fresh install: one student and four tickets covering
//! every status.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use domains::{Comment, Result, Student, Ticket, TicketCategory, TicketStatus, TicketSubmission};

use crate::memory::InMemoryTicketRepository;

pub const SAMPLE_STUDENT_ID: &str = "S12345";

pub fn sample_student() -> Student {
    Student {
        id: SAMPLE_STUDENT_ID.into(),
        name: "John Doe".into(),
        department: "Computer Science".into(),
        year: "3rd Year".into(),
        profile_image: Some("https://api.dicebear.com/7.x/avataaars/svg?seed=john".into()),
        notifications: 2,
    }
}

fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(9, 0, 0))
        .map(|naive| naive.and_utc())
        .unwrap_or_default()
}

fn ticket(
    id: &str,
    category: TicketCategory,
    title: &str,
    description: &str,
    opened: DateTime<Utc>,
    path: &[(TicketStatus, i64, Option<&str>)],
) -> Result<Ticket> {
    let submission = TicketSubmission {
        category: Some(category),
        title: title.into(),
        description: description.into(),
        attachments: Vec::new(),
    };
    let mut t = Ticket::open(id.into(), SAMPLE_STUDENT_ID, submission, opened)?;
    for (status, hours_later, note) in path {
        t.record_status(*status, opened + Duration::hours(*hours_later), note.map(str::to_string))?;
    }
    Ok(t)
}

pub fn sample_tickets() -> Result<Vec<Ticket>> {
    let mut grade = ticket(
        "T-002",
        TicketCategory::GradeConsultation,
        "Grade Discrepancy in Biology",
        "I believe there was an error in grading my last biology exam.",
        day(2023, 5, 10),
        &[(TicketStatus::InProgress, 28, Some("Assigned to Biology Department"))],
    )?;
    grade.push_comment(Comment {
        id: "c1".into(),
        author: "Admin".into(),
        content: "We've received your complaint and forwarded it to the department for review."
            .into(),
        timestamp: day(2023, 5, 11) + Duration::hours(6),
    });

    Ok(vec![
        ticket(
            "T-001",
            TicketCategory::Bullying,
            "Classroom Bullying Incident",
            "I've been experiencing bullying from a group of students in my math class.",
            day(2023, 5, 15),
            &[],
        )?,
        grade,
        ticket(
            "T-003",
            TicketCategory::Other,
            "Cafeteria Food Quality",
            "The quality of food in the cafeteria has significantly declined.",
            day(2023, 5, 1),
            &[
                (TicketStatus::InProgress, 24, None),
                (TicketStatus::Resolved, 96, Some("New supplier from next week")),
            ],
        )?,
        ticket(
            "T-004",
            TicketCategory::SchoolViolence,
            "Altercation in Hallway",
            "I witnessed a physical altercation between two students in the east hallway.",
            day(2023, 4, 28),
            &[
                (TicketStatus::InProgress, 2, None),
                (TicketStatus::Resolved, 30, None),
                (TicketStatus::Closed, 72, None),
            ],
        )?,
    ])
}

/// Loads [`sample_tickets`] into `repo`.
pub fn seed_repository(repo: &InMemoryTicketRepository) -> Result<usize> {
    let tickets = sample_tickets()?;
    let count = tickets.len();
    for t in tickets {
        repo.insert(t);
    }
    Ok(count)
}
