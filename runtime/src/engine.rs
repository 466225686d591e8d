//! Workflow engine: the async shell around [`TicketWorkflowReducer`].
//!
//! Every mutating operation follows the same loop: fetch the ticket, let the
//! reducer decide, then execute the returned effects in order. Effects are not
//! transactional; a derived comment written before a failed ticket update
//! stays written.

use crate::aggregator::ReportAggregator;
use crate::assembler::{DocumentAssembler, ReportDocument};
use crate::metrics::{ReportMetrics, WorkflowMetrics};
use crate::template::TemplateRegistry;
use crate::workflow::{TicketCommand, TicketWorkflowReducer, WorkflowEffect, WorkflowEnvironment};
use crm_core::domain::{
    ChangeLead, ChangeOwner, ChangeStatus, Comment, CommentId, NewComment, NewTicket, Page,
    Product, ProductId, Role, Ticket, TicketFilters, TicketId, TicketStatus, UserFilters,
};
use crm_core::environment::{Clock, IdGenerator};
use crm_core::error::CrmError;
use crm_core::patch::TicketPatch;
use crm_core::ports::{
    CommentStore, CustomerLookup, ProductLookup, TicketStore, UserLookup, WorkflowPorts,
};
use crm_core::reducer::Reducer;
use std::sync::Arc;
use std::time::Instant;

/// Entry point for every ticket operation.
#[derive(Clone)]
pub struct WorkflowEngine {
    tickets: Arc<dyn TicketStore>,
    comments: Arc<dyn CommentStore>,
    customers: Arc<dyn CustomerLookup>,
    products: Arc<dyn ProductLookup>,
    users: Arc<dyn UserLookup>,
    aggregator: ReportAggregator,
    assembler: DocumentAssembler,
    reducer: TicketWorkflowReducer,
    env: WorkflowEnvironment,
}

fn require_ticket_id(ticket_id: &TicketId) -> Result<(), CrmError> {
    if ticket_id.is_empty() {
        return Err(CrmError::validation("ticket_id is required"));
    }
    Ok(())
}

impl WorkflowEngine {
    /// Build an engine from its collaborators.
    #[must_use]
    pub fn new(ports: WorkflowPorts, registry: TemplateRegistry, env: WorkflowEnvironment) -> Self {
        let aggregator = ReportAggregator::new(
            Arc::clone(&ports.customers),
            Arc::clone(&ports.products),
            Arc::clone(&ports.comments),
            ports.leads,
            ports.tenants,
        );
        let assembler = DocumentAssembler::new(
            registry,
            ports.templates,
            ports.attachments,
            Arc::clone(&env.clock),
        );

        Self {
            tickets: ports.tickets,
            comments: ports.comments,
            customers: ports.customers,
            products: ports.products,
            users: ports.users,
            aggregator,
            assembler,
            reducer: TicketWorkflowReducer,
            env,
        }
    }

    /// Open a new ticket.
    ///
    /// Resolves the customer's region, assigns an active operator of that
    /// region when there is one (status `CustomerInfo`), registers the product
    /// and persists the ticket.
    ///
    /// # Errors
    ///
    /// - [`CrmError::Validation`] when tenant or customer is missing
    /// - [`CrmError::NotFound`] when the customer does not exist
    /// - any user search error other than `NotFound`, and any store error
    #[tracing::instrument(
        skip(self, new_ticket),
        fields(tenant_id = %new_ticket.tenant_id, customer_id = %new_ticket.customer_id)
    )]
    pub async fn create_ticket(&self, new_ticket: NewTicket) -> Result<TicketId, CrmError> {
        if new_ticket.tenant_id.is_empty() {
            return Err(CrmError::validation("tenant_id is required"));
        }
        if new_ticket.customer_id.is_empty() {
            return Err(CrmError::validation("customer_id is required"));
        }

        let customer = self.customers.get_by_id(&new_ticket.customer_id).await?;
        let now = self.env.clock.now();
        let mut ticket = Ticket::new(
            TicketId::new(self.env.ids.next_id()),
            &new_ticket,
            customer.region(),
            now,
        );

        self.assign_owner(&mut ticket).await?;

        let product = Product::new(
            ProductId::new(self.env.ids.next_id()),
            new_ticket.product,
            &new_ticket.created_by,
            now,
        );
        ticket.product_id = Some(self.products.create(product).await?);

        let status = ticket.status;
        let ticket_id = self.tickets.create(ticket).await?;

        WorkflowMetrics::record_transition("create_ticket");
        tracing::info!(ticket_id = %ticket_id, status = %status, "Ticket created");
        Ok(ticket_id)
    }

    /// Give `ticket` to the first active operator serving its region.
    async fn assign_owner(&self, ticket: &mut Ticket) -> Result<(), CrmError> {
        let filters = UserFilters {
            regions: vec![ticket.region],
            roles: vec![Role::Operator],
            active: Some(true),
        };

        let operators = match self.users.search(filters).await {
            Ok(users) => users,
            Err(error) if error.is_not_found() => Vec::new(),
            Err(error) => return Err(error),
        };

        match operators.into_iter().next() {
            Some(operator) => {
                tracing::debug!(region = %ticket.region, owner_id = %operator.user_id, "Operator assigned");
                ticket.owner_id = Some(operator.user_id);
                ticket.status = TicketStatus::CustomerInfo;
            }
            None => {
                tracing::debug!(region = %ticket.region, "No active operator for region");
            }
        }
        Ok(())
    }

    /// Reassign a ticket.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::NotFound`] when the ticket does not exist and
    /// [`CrmError::Validation`] on an empty ticket or owner id.
    #[tracing::instrument(skip(self, change), fields(ticket_id = %ticket_id))]
    pub async fn change_owner(&self, ticket_id: &TicketId, change: ChangeOwner) -> Result<(), CrmError> {
        self.execute(ticket_id, TicketCommand::ChangeOwner(change)).await
    }

    /// Move a ticket to another status, recording `content` as a comment.
    ///
    /// The comment is written before the ticket update.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::NotFound`] when the ticket does not exist, or the
    /// comment or ticket store error.
    #[tracing::instrument(skip(self, change), fields(ticket_id = %ticket_id, status = %change.status))]
    pub async fn change_status(&self, ticket_id: &TicketId, change: ChangeStatus) -> Result<(), CrmError> {
        self.execute(ticket_id, TicketCommand::ChangeStatus(change)).await
    }

    /// Assign a lead and target date.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::NotFound`] when the ticket does not exist and
    /// [`CrmError::Validation`] on an empty ticket or lead id.
    #[tracing::instrument(skip(self, change), fields(ticket_id = %ticket_id))]
    pub async fn change_lead(&self, ticket_id: &TicketId, change: ChangeLead) -> Result<(), CrmError> {
        self.execute(ticket_id, TicketCommand::ChangeLead(change)).await
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::NotFound`] when the ticket does not exist.
    #[tracing::instrument(skip(self, patch), fields(ticket_id = %ticket_id))]
    pub async fn update_ticket(&self, ticket_id: &TicketId, patch: TicketPatch) -> Result<(), CrmError> {
        self.execute(ticket_id, TicketCommand::Update(patch)).await
    }

    async fn execute(&self, ticket_id: &TicketId, command: TicketCommand) -> Result<(), CrmError> {
        require_ticket_id(ticket_id)?;

        let mut ticket = self.tickets.get_by_id(ticket_id).await?;
        let operation = command.name();
        let effects = self.reducer.reduce(&mut ticket, command, &self.env)?;

        for effect in effects {
            match effect {
                WorkflowEffect::CreateComment(comment) => {
                    let comment_type = comment.comment_type;
                    let comment_id = self.comments.create(comment).await?;
                    WorkflowMetrics::record_derived_comment(comment_type);
                    tracing::debug!(comment_id = %comment_id, comment_type = %comment_type, "Derived comment created");
                }
                WorkflowEffect::PersistTicket => {
                    self.tickets.update(ticket.clone()).await?;
                }
            }
        }

        WorkflowMetrics::record_transition(operation);
        tracing::info!(operation, status = %ticket.status, "Ticket updated");
        Ok(())
    }

    /// Render the report document of a ticket.
    ///
    /// # Errors
    ///
    /// - [`CrmError::Validation`] on an empty id, or when the ticket is not in
    ///   `Report`, `Payment`, `Receipt` or `Closed` (context `status`)
    /// - [`CrmError::NotFound`] when the ticket does not exist
    /// - [`CrmError::Aggregation`] when a report source fails
    /// - [`CrmError::Template`] when the document cannot be rendered
    #[tracing::instrument(skip(self), fields(ticket_id = %ticket_id))]
    pub async fn generate_report(&self, ticket_id: &TicketId) -> Result<ReportDocument, CrmError> {
        let started = Instant::now();

        match self.render_report(ticket_id).await {
            Ok(document) => {
                ReportMetrics::record_generated(document.content.len(), started.elapsed());
                tracing::info!(
                    filename = %document.filename,
                    bytes = document.content.len(),
                    "Report generated"
                );
                Ok(document)
            }
            Err(error) => {
                ReportMetrics::record_failure(&error);
                tracing::warn!(error = %error, "Report generation failed");
                Err(error)
            }
        }
    }

    async fn render_report(&self, ticket_id: &TicketId) -> Result<ReportDocument, CrmError> {
        require_ticket_id(ticket_id)?;

        let ticket = self.tickets.get_by_id(ticket_id).await?;
        if !ticket.status.is_reportable() {
            return Err(
                CrmError::validation("ticket is not in status REPORT").with_context("status", ticket.status)
            );
        }

        let snapshot = self.aggregator.aggregate(ticket).await?;
        self.assembler.assemble(&snapshot).await
    }

    /// Fetch one ticket.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::Validation`] on an empty id and
    /// [`CrmError::NotFound`] when the ticket does not exist.
    #[tracing::instrument(skip(self), fields(ticket_id = %ticket_id))]
    pub async fn get_ticket(&self, ticket_id: &TicketId) -> Result<Ticket, CrmError> {
        require_ticket_id(ticket_id)?;
        self.tickets.get_by_id(ticket_id).await
    }

    /// Query tickets.
    ///
    /// # Errors
    ///
    /// Propagates the ticket store error.
    #[tracing::instrument(skip(self, filters))]
    pub async fn search_tickets(&self, filters: TicketFilters) -> Result<Page<Ticket>, CrmError> {
        let page = self.tickets.search(filters).await?;
        tracing::debug!(total = page.total, returned = page.items.len(), "Tickets searched");
        Ok(page)
    }

    /// Add a comment to a ticket.
    ///
    /// # Errors
    ///
    /// - [`CrmError::Validation`] on an empty ticket id or empty content
    /// - [`CrmError::NotFound`] when the ticket does not exist
    #[tracing::instrument(skip(self, new_comment), fields(ticket_id = %ticket_id))]
    pub async fn add_comment(&self, ticket_id: &TicketId, new_comment: NewComment) -> Result<CommentId, CrmError> {
        require_ticket_id(ticket_id)?;
        if new_comment.content.trim().is_empty() {
            return Err(CrmError::validation("content is required"));
        }

        let ticket = self.tickets.get_by_id(ticket_id).await?;
        let comment = Comment::new(
            CommentId::new(self.env.ids.next_id()),
            ticket.ticket_id,
            new_comment,
            self.env.clock.now(),
        );
        let comment_type = comment.comment_type;
        let comment_id = self.comments.create(comment).await?;

        tracing::info!(comment_id = %comment_id, comment_type = %comment_type, "Comment added");
        Ok(comment_id)
    }

    /// Comments of a ticket, in store order.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::Validation`] on an empty id, or the comment store
    /// error.
    #[tracing::instrument(skip(self), fields(ticket_id = %ticket_id))]
    pub async fn list_comments(&self, ticket_id: &TicketId) -> Result<Vec<Comment>, CrmError> {
        require_ticket_id(ticket_id)?;
        self.comments.get_by_ticket_id(ticket_id).await
    }
}
