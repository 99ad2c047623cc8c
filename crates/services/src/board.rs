//! # TicketBoard
//!
//! Holds the student's ticket collection and derives the filtered, sorted
//! list shown on the dashboard. Selection is by id and survives a refresh
//! only if the ticket is still present.

use std::cmp::Ordering;

use domains::{Ticket, TicketCategory, TicketId, TicketStatus};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A filter value with a distinguished "match everything" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter<T> {
    All,
    Only(T),
}

impl<T> Default for Filter<T> {
    fn default() -> Self {
        Filter::All
    }
}

impl<T: PartialEq> Filter<T> {
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Filter::All => true,
            Filter::Only(wanted) => wanted == value,
        }
    }
}

/// Sort field for the ticket list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    #[default]
    Date,
    Status,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Equal keys compare `Equal` in both directions, so a stable sort keeps
    /// input order for ties.
    pub fn compare(&self, a: &Ticket, b: &Ticket) -> Ordering {
        let ord = match self.field {
            SortField::Date => a.created_at.cmp(&b.created_at),
            SortField::Status => a.status.rank().cmp(&b.status.rank()),
        };
        match self.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    }
}

/// Inputs to [`TicketBoard::query`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketQuery {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub status: Filter<TicketStatus>,
    #[serde(default)]
    pub category: Filter<TicketCategory>,
    #[serde(default)]
    pub sort: SortSpec,
}

impl TicketQuery {
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = term.into();
        self
    }

    pub fn status(mut self, status: Filter<TicketStatus>) -> Self {
        self.status = status;
        self
    }

    pub fn category(mut self, category: Filter<TicketCategory>) -> Self {
        self.category = category;
        self
    }

    pub fn sort(mut self, field: SortField, direction: SortDirection) -> Self {
        self.sort = SortSpec::new(field, direction);
        self
    }
}

/// Case-insensitive substring match on title or description.
fn matches_search(ticket: &Ticket, needle: &str) -> bool {
    needle.is_empty()
        || ticket.title.to_lowercase().contains(needle)
        || ticket.description.to_lowercase().contains(needle)
}

#[derive(Debug, Clone, Default)]
pub struct TicketBoard {
    tickets: Vec<Ticket>,
    selected: Option<TicketId>,
    sort: SortSpec,
}

impl TicketBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the working collection as-is; duplicates are kept.
    pub fn set_tickets(&mut self, tickets: Vec<Ticket>) {
        debug!(count = tickets.len(), "board collection replaced");
        self.tickets = tickets;
    }

    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    /// Swaps in a newer copy of a ticket already on the board.
    pub fn replace_ticket(&mut self, updated: Ticket) -> bool {
        match self.tickets.iter_mut().find(|t| t.id == updated.id) {
            Some(slot) => {
                *slot = updated;
                true
            }
            None => false,
        }
    }

    /// Filters conjunctively, then stable-sorts. Pure: no state is touched.
    pub fn query(&self, query: &TicketQuery) -> Vec<&Ticket> {
        let needle = query.search.to_lowercase();
        let mut rows: Vec<&Ticket> = self
            .tickets
            .iter()
            .filter(|t| matches_search(t, &needle))
            .filter(|t| query.status.matches(&t.status))
            .filter(|t| query.category.matches(&t.category))
            .collect();
        rows.sort_by(|a, b| query.sort.compare(a, b));
        rows
    }

    /// Same as [`query`](Self::query) but with the board's own sort settings.
    pub fn view(
        &self,
        search: &str,
        status: Filter<TicketStatus>,
        category: Filter<TicketCategory>,
    ) -> Vec<&Ticket> {
        let query = TicketQuery {
            search: search.to_string(),
            status,
            category,
            sort: self.sort,
        };
        self.query(&query)
    }

    pub fn sort(&self) -> SortSpec {
        self.sort
    }

    /// Same field flips direction; a new field starts descending.
    pub fn toggle_sort(&mut self, field: SortField) -> SortSpec {
        self.sort = if self.sort.field == field {
            SortSpec::new(field, self.sort.direction.flipped())
        } else {
            SortSpec::new(field, SortDirection::Desc)
        };
        self.sort
    }

    /// Selects a ticket for the detail view. Unknown ids leave the current
    /// selection untouched.
    pub fn select(&mut self, id: &TicketId) -> bool {
        if self.tickets.iter().any(|t| &t.id == id) {
            self.selected = Some(id.clone());
            true
        } else {
            debug!(ticket_id = %id, "ignoring selection of unknown ticket");
            false
        }
    }

    pub fn selected(&self) -> Option<&Ticket> {
        let id = self.selected.as_ref()?;
        self.tickets.iter().find(|t| &t.id == id)
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }
}
