//! Partial-merge updates for tickets.
//!
//! A [`TicketPatch`] names only the fields it changes. Applying it overwrites
//! those fields, always refreshes `updated_at`/`updated_by`, and leaves every
//! other field alone. `region`, identity and creation fields are never touched.

use crate::domain::{ChangeLead, ChangeOwner, LeadId, Ticket, TicketStatus, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A partial ticket update. `None` means "leave as is".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketPatch {
    /// New status
    pub status: Option<TicketStatus>,
    /// New owner
    pub owner_id: Option<UserId>,
    /// New lead
    pub lead_id: Option<LeadId>,
    /// New target date
    pub target_date: Option<DateTime<Utc>>,
    /// New closing time
    pub closed_at: Option<DateTime<Utc>>,
    /// Who is writing; always applied
    pub updated_by: String,
}

impl TicketPatch {
    /// Empty patch attributed to `updated_by`.
    #[must_use]
    pub fn new(updated_by: impl Into<String>) -> Self {
        Self {
            updated_by: updated_by.into(),
            ..Self::default()
        }
    }

    /// Set the status.
    #[must_use]
    pub fn with_status(mut self, status: TicketStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Set the owner.
    #[must_use]
    pub fn with_owner(mut self, owner_id: UserId) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    /// Set the lead.
    #[must_use]
    pub fn with_lead(mut self, lead_id: LeadId) -> Self {
        self.lead_id = Some(lead_id);
        self
    }

    /// Set the target date.
    #[must_use]
    pub fn with_target_date(mut self, target_date: DateTime<Utc>) -> Self {
        self.target_date = Some(target_date);
        self
    }

    /// Set the closing time.
    #[must_use]
    pub fn with_closed_at(mut self, closed_at: DateTime<Utc>) -> Self {
        self.closed_at = Some(closed_at);
        self
    }

    /// True when no field besides the audit fields would change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.owner_id.is_none()
            && self.lead_id.is_none()
            && self.target_date.is_none()
            && self.closed_at.is_none()
    }

    /// Merge into `ticket` in place.
    pub fn merge_into(&self, ticket: &mut Ticket, now: DateTime<Utc>) {
        ticket.updated_at = now;
        ticket.updated_by.clone_from(&self.updated_by);

        if let Some(status) = self.status {
            ticket.status = status;
        }
        if let Some(owner_id) = &self.owner_id {
            ticket.owner_id = Some(owner_id.clone());
        }
        if let Some(lead_id) = &self.lead_id {
            ticket.lead_id = Some(lead_id.clone());
        }
        if let Some(target_date) = self.target_date {
            ticket.target_date = Some(target_date);
        }
        if let Some(closed_at) = self.closed_at {
            ticket.closed_at = Some(closed_at);
        }
    }

    /// Pure form of [`merge_into`](Self::merge_into): `apply(ticket, patch) → ticket`.
    #[must_use]
    pub fn apply(&self, mut ticket: Ticket, now: DateTime<Utc>) -> Ticket {
        self.merge_into(&mut ticket, now);
        ticket
    }
}

impl From<ChangeOwner> for TicketPatch {
    fn from(change: ChangeOwner) -> Self {
        Self::new(change.updated_by)
            .with_owner(change.owner_id)
            .with_status(change.status)
    }
}

impl From<ChangeLead> for TicketPatch {
    fn from(change: ChangeLead) -> Self {
        Self::new(change.updated_by)
            .with_lead(change.lead_id)
            .with_status(change.status)
            .with_target_date(change.target_date)
    }
}
