//! Ticket workflow reducer.
//!
//! The reducer decides what a command does to a ticket and which side effects
//! follow. It never performs I/O; [`crate::engine::WorkflowEngine`] fetches the
//! ticket, calls [`TicketWorkflowReducer::reduce`], and executes the returned
//! effects in order.

use crm_core::domain::{
    ChangeLead, ChangeOwner, ChangeStatus, Comment, CommentId, CommentType, NewComment, Ticket,
    TicketStatus,
};
use crm_core::environment::{Clock, IdGenerator};
use crm_core::error::CrmError;
use crm_core::patch::TicketPatch;
use crm_core::reducer::Reducer;
use crm_core::{SmallVec, smallvec};
use std::sync::Arc;

/// Commands accepted by the ticket workflow.
#[derive(Clone, Debug, PartialEq)]
pub enum TicketCommand {
    /// Reassign the ticket to an operator
    ChangeOwner(ChangeOwner),
    /// Move the ticket to another status, optionally leaving a note
    ChangeStatus(ChangeStatus),
    /// Assign a lead and target date
    ChangeLead(ChangeLead),
    /// Apply an arbitrary partial update
    Update(TicketPatch),
}

impl TicketCommand {
    /// Operation name used in logs and metric labels.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ChangeOwner(_) => "change_owner",
            Self::ChangeStatus(_) => "change_status",
            Self::ChangeLead(_) => "change_lead",
            Self::Update(_) => "update_ticket",
        }
    }
}

/// Side effects requested by the reducer, executed in the order returned.
#[derive(Clone, Debug, PartialEq)]
pub enum WorkflowEffect {
    /// Store a derived comment
    CreateComment(Comment),
    /// Write the reduced ticket back to the ticket store
    PersistTicket,
}

/// Injected dependencies of the workflow reducer.
#[derive(Clone)]
pub struct WorkflowEnvironment {
    /// Time source for audit fields
    pub clock: Arc<dyn Clock>,
    /// Identifier source for derived comments
    pub ids: Arc<dyn IdGenerator>,
}

impl WorkflowEnvironment {
    /// Create an environment from its parts.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Self { clock, ids }
    }
}

impl std::fmt::Debug for WorkflowEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowEnvironment").finish_non_exhaustive()
    }
}

/// Comment type recorded when a status change carries a note.
///
/// `WaitingLead` notes describe the claim, `Report` notes are the lead's
/// resolution and `Canceled` notes explain the rejection. Anything else is a
/// plain comment.
#[must_use]
pub const fn comment_type_for(status: TicketStatus) -> CommentType {
    match status {
        TicketStatus::WaitingLead => CommentType::Content,
        TicketStatus::Report => CommentType::Resolution,
        TicketStatus::Canceled => CommentType::Rejection,
        _ => CommentType::Comment,
    }
}

/// Pure decision logic for ticket transitions.
#[derive(Clone, Copy, Debug, Default)]
pub struct TicketWorkflowReducer;

impl Reducer for TicketWorkflowReducer {
    type State = Ticket;
    type Action = TicketCommand;
    type Environment = WorkflowEnvironment;
    type Effect = WorkflowEffect;

    fn reduce(
        &self,
        ticket: &mut Ticket,
        command: TicketCommand,
        env: &WorkflowEnvironment,
    ) -> Result<SmallVec<[WorkflowEffect; 4]>, CrmError> {
        let now = env.clock.now();

        match command {
            TicketCommand::ChangeOwner(change) => {
                if change.owner_id.is_empty() {
                    return Err(CrmError::validation("owner_id is required"));
                }
                TicketPatch::from(change).merge_into(ticket, now);
                Ok(smallvec![WorkflowEffect::PersistTicket])
            }
            TicketCommand::ChangeStatus(change) => {
                TicketPatch::new(change.updated_by.clone())
                    .with_status(change.status)
                    .merge_into(ticket, now);

                let Some(content) = change.content else {
                    return Ok(smallvec![WorkflowEffect::PersistTicket]);
                };

                let comment = Comment::new(
                    CommentId::new(env.ids.next_id()),
                    ticket.ticket_id.clone(),
                    NewComment {
                        content,
                        comment_type: comment_type_for(change.status),
                        attachments: change.attachments,
                        author: change.updated_by,
                    },
                    now,
                );

                Ok(smallvec![
                    WorkflowEffect::CreateComment(comment),
                    WorkflowEffect::PersistTicket
                ])
            }
            TicketCommand::ChangeLead(change) => {
                if change.lead_id.is_empty() {
                    return Err(CrmError::validation("lead_id is required"));
                }
                TicketPatch::from(change).merge_into(ticket, now);
                Ok(smallvec![WorkflowEffect::PersistTicket])
            }
            TicketCommand::Update(patch) => {
                patch.merge_into(ticket, now);
                Ok(smallvec![WorkflowEffect::PersistTicket])
            }
        }
    }
}
