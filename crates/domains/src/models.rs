//! # Domain Models
//!
//! These structs represent the core entities of TickSolve.
//! Ticket ids are assigned by the persistence boundary, never by the client.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::errors::{DomainError, Result};

/// Stable, globally unique ticket identifier (e.g. "T-001").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(String);

impl TicketId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TicketId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Fixed, closed set of complaint categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketCategory {
    Bullying,
    GradeConsultation,
    SchoolViolence,
    FacilityIssue,
    TeacherComplaint,
    Other,
}

impl TicketCategory {
    pub const ALL: [TicketCategory; 6] = [
        TicketCategory::Bullying,
        TicketCategory::GradeConsultation,
        TicketCategory::SchoolViolence,
        TicketCategory::FacilityIssue,
        TicketCategory::TeacherComplaint,
        TicketCategory::Other,
    ];

    /// Wire value, e.g. `grade_consultation`.
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketCategory::Bullying => "bullying",
            TicketCategory::GradeConsultation => "grade_consultation",
            TicketCategory::SchoolViolence => "school_violence",
            TicketCategory::FacilityIssue => "facility_issue",
            TicketCategory::TeacherComplaint => "teacher_complaint",
            TicketCategory::Other => "other",
        }
    }

    /// Human label shown in pickers and summaries.
    pub fn label(&self) -> &'static str {
        match self {
            TicketCategory::Bullying => "Bullying",
            TicketCategory::GradeConsultation => "Grade Consultation",
            TicketCategory::SchoolViolence => "School Violence",
            TicketCategory::FacilityIssue => "Facility Issue",
            TicketCategory::TeacherComplaint => "Teacher Complaint",
            TicketCategory::Other => "Other",
        }
    }
}

impl fmt::Display for TicketCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts either the wire value or the label, case-insensitively.
impl FromStr for TicketCategory {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        TicketCategory::ALL
            .into_iter()
            .find(|c| {
                c.as_str().eq_ignore_ascii_case(wanted) || c.label().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| DomainError::validation(format!("unknown ticket category '{s}'")))
    }
}

/// Ticket lifecycle status. Declaration order is the board's status sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Resolved => "resolved",
            TicketStatus::Closed => "closed",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TicketStatus::Open => "Open",
            TicketStatus::InProgress => "In Progress",
            TicketStatus::Resolved => "Resolved",
            TicketStatus::Closed => "Closed",
        }
    }

    /// Position in the fixed `open < in_progress < resolved < closed` order.
    pub fn rank(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(TicketStatus::Open),
            "in_progress" | "in-progress" | "in progress" => Ok(TicketStatus::InProgress),
            "resolved" => Ok(TicketStatus::Resolved),
            "closed" => Ok(TicketStatus::Closed),
            _ => Err(DomainError::validation(format!("unknown ticket status '{s}'"))),
        }
    }
}

/// One entry of a ticket's append-only status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: TicketStatus,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Assigned by the persistence boundary.
    pub id: String,
    pub author: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// A file reference attached to a complaint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub file_name: String,
    /// Guessed from the extension; `None` when unknown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default)]
    pub size_bytes: u64,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, size_bytes: u64) -> Self {
        let file_name = file_name.into();
        let content_type = mime_guess::from_path(&file_name)
            .first()
            .map(|m| m.essence_str().to_string());
        Self {
            file_name,
            content_type,
            size_bytes,
        }
    }
}

/// The transient, client-held draft of a ticket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketSubmission {
    pub category: Option<TicketCategory>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl TicketSubmission {
    pub fn has_category(&self) -> bool {
        self.category.is_some()
    }

    /// Surrounding whitespace only matters here; the title is stored as typed.
    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.has_category() && self.has_title()
    }

    /// Checks completeness and returns the category, the one field the
    /// persistence boundary cannot accept as optional.
    pub fn validate(&self) -> Result<TicketCategory> {
        let category = self
            .category
            .ok_or_else(|| DomainError::validation("Please select a complaint category"))?;
        if !self.has_title() {
            return Err(DomainError::validation("Please enter a complaint title"));
        }
        Ok(category)
    }
}

/// The canonical complaint record owned by the persistence boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: TicketId,
    pub student_id: String,
    pub title: String,
    pub category: TicketCategory,
    pub description: String,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status_history: Vec<StatusUpdate>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl Ticket {
    /// Materializes a submission as a freshly opened ticket.
    pub fn open(
        id: TicketId,
        student_id: impl Into<String>,
        submission: TicketSubmission,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let category = submission.validate()?;
        Ok(Self {
            id,
            student_id: student_id.into(),
            title: submission.title,
            category,
            description: submission.description,
            status: TicketStatus::Open,
            created_at: now,
            updated_at: now,
            status_history: vec![StatusUpdate {
                status: TicketStatus::Open,
                timestamp: now,
                comment: None,
            }],
            comments: Vec::new(),
            attachments: submission.attachments,
        })
    }

    /// Appends a status transition. History timestamps never go backwards.
    pub fn record_status(
        &mut self,
        status: TicketStatus,
        at: DateTime<Utc>,
        comment: Option<String>,
    ) -> Result<()> {
        if let Some(last) = self.status_history.last() {
            if at < last.timestamp {
                return Err(DomainError::validation(format!(
                    "status update at {at} precedes the last history entry at {}",
                    last.timestamp
                )));
            }
        }
        self.status_history.push(StatusUpdate {
            status,
            timestamp: at,
            comment,
        });
        self.status = status;
        self.updated_at = at;
        Ok(())
    }

    pub fn push_comment(&mut self, comment: Comment) {
        if comment.timestamp > self.updated_at {
            self.updated_at = comment.timestamp;
        }
        self.comments.push(comment);
    }
}

/// The logged-in student shown in the dashboard header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    pub department: String,
    pub year: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(default)]
    pub notifications: u32,
}

impl Student {
    /// Avatar fallback: first letter of each name part ("John Doe" -> "JD").
    pub fn initials(&self) -> String {
        self.name
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .collect()
    }
}

/// Login form input. The password never appears in `Debug` output.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub student_id: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(student_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            student_id: student_id.into(),
            password: SecretString::from(password.into()),
        }
    }
}

/// Outcome of a successful login: an opaque token plus where to go next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub student_id: String,
    pub redirect: String,
}
