//! Collaborator ports consumed by the workflow.
//!
//! Each trait covers exactly one capability of an external system (document
//! store, blob store, template storage). Implementations are injected at
//! construction time as `Arc<dyn Port>`.
//!
//! # Dyn Compatibility
//!
//! These traits use explicit `Pin<Box<dyn Future>>` returns instead of
//! `async fn` so they can be used as trait objects and shared across the
//! concurrent report fetches.
//!
//! # Errors
//!
//! Lookups return [`CrmError::NotFound`] when the record is absent and
//! [`CrmError::Storage`] for any other failure.

use crate::domain::{
    Comment, CommentId, Customer, CustomerId, Lead, LeadId, Page, Product, ProductId, Tenant,
    TenantId, Ticket, TicketFilters, TicketId, User, UserFilters,
};
use crate::error::CrmError;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future returned by every port method.
pub type PortFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, CrmError>> + Send + 'a>>;

/// Ticket persistence.
pub trait TicketStore: Send + Sync {
    /// Insert a new ticket and return its id.
    fn create(&self, ticket: Ticket) -> PortFuture<'_, TicketId>;

    /// Fetch a ticket by id.
    fn get_by_id<'a>(&'a self, ticket_id: &'a TicketId) -> PortFuture<'a, Ticket>;

    /// Replace a stored ticket with `ticket`.
    fn update(&self, ticket: Ticket) -> PortFuture<'_, ()>;

    /// Query tickets.
    fn search(&self, filters: TicketFilters) -> PortFuture<'_, Page<Ticket>>;
}

/// Comment persistence. Comments are append-only.
pub trait CommentStore: Send + Sync {
    /// Insert a new comment and return its id.
    fn create(&self, comment: Comment) -> PortFuture<'_, CommentId>;

    /// Fetch a comment by id.
    fn get_by_id<'a>(&'a self, comment_id: &'a CommentId) -> PortFuture<'a, Comment>;

    /// All comments of a ticket, in store order.
    fn get_by_ticket_id<'a>(&'a self, ticket_id: &'a TicketId) -> PortFuture<'a, Vec<Comment>>;
}

/// Customer lookup.
pub trait CustomerLookup: Send + Sync {
    /// Fetch a customer by id.
    fn get_by_id<'a>(&'a self, customer_id: &'a CustomerId) -> PortFuture<'a, Customer>;
}

/// Product lookup and registration.
pub trait ProductLookup: Send + Sync {
    /// Fetch a product by id.
    fn get_by_id<'a>(&'a self, product_id: &'a ProductId) -> PortFuture<'a, Product>;

    /// Register a product and return its id.
    fn create(&self, product: Product) -> PortFuture<'_, ProductId>;
}

/// Lead lookup.
pub trait LeadLookup: Send + Sync {
    /// Fetch a lead by id.
    fn get_by_id<'a>(&'a self, lead_id: &'a LeadId) -> PortFuture<'a, Lead>;
}

/// Tenant lookup.
pub trait TenantLookup: Send + Sync {
    /// Fetch a tenant by id.
    fn get_by_id<'a>(&'a self, tenant_id: &'a TenantId) -> PortFuture<'a, Tenant>;
}

/// User directory, used for owner auto-assignment.
pub trait UserLookup: Send + Sync {
    /// Users matching `filters`. May return `NotFound` instead of an empty list.
    fn search(&self, filters: UserFilters) -> PortFuture<'_, Vec<User>>;
}

/// Binary blob download.
pub trait AttachmentStore: Send + Sync {
    /// Download the blob stored under `key`.
    fn download<'a>(&'a self, key: &'a str) -> PortFuture<'a, Vec<u8>>;
}

/// Raw report template storage.
pub trait TemplateSource: Send + Sync {
    /// Load the template body registered as `template_id`.
    fn load<'a>(&'a self, template_id: &'a str) -> PortFuture<'a, Vec<u8>>;
}

/// Every collaborator the workflow is built from.
#[derive(Clone)]
pub struct WorkflowPorts {
    /// Ticket persistence
    pub tickets: Arc<dyn TicketStore>,
    /// Comment persistence
    pub comments: Arc<dyn CommentStore>,
    /// Customer lookup
    pub customers: Arc<dyn CustomerLookup>,
    /// Product lookup and registration
    pub products: Arc<dyn ProductLookup>,
    /// Lead lookup
    pub leads: Arc<dyn LeadLookup>,
    /// Tenant lookup
    pub tenants: Arc<dyn TenantLookup>,
    /// User directory
    pub users: Arc<dyn UserLookup>,
    /// Attachment blobs
    pub attachments: Arc<dyn AttachmentStore>,
    /// Report templates
    pub templates: Arc<dyn TemplateSource>,
}
