//! In-memory port implementations for testing
//!
//! Provides fast, deterministic stand-ins for every collaborator port:
//! - [`InMemoryTicketStore`] and [`InMemoryCommentStore`]: persistence
//! - [`InMemoryLookup`]: customers, products, leads and tenants
//! - [`InMemoryUsers`], [`InMemoryAttachments`], [`InMemoryTemplates`]
//! - [`FailingLookup`]: a port that always fails
//! - [`InMemoryBackend`]: all of the above, wired as [`WorkflowPorts`]
//!
//! Every store records how often each method was called and can be told to
//! fail or to stall a method, via its [`CallLog`].

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Lock poisoning only follows a failed test

use crm_core::domain::{
    Comment, CommentId, Customer, CustomerId, Lead, LeadId, Page, Product, ProductId, Tenant,
    TenantId, Ticket, TicketFilters, TicketId, User, UserFilters,
};
use crm_core::error::CrmError;
use crm_core::ports::{
    AttachmentStore, CommentStore, CustomerLookup, LeadLookup, PortFuture, ProductLookup,
    TemplateSource, TenantLookup, TicketStore, UserLookup, WorkflowPorts,
};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

// ============================================================================
// Call log
// ============================================================================

/// Per-method call counters plus injected failures and delays.
#[derive(Debug, Default)]
pub struct CallLog {
    calls: RwLock<HashMap<&'static str, usize>>,
    completions: RwLock<HashMap<&'static str, usize>>,
    failures: RwLock<HashMap<&'static str, CrmError>>,
    delays: RwLock<HashMap<&'static str, Duration>>,
}

impl CallLog {
    /// Record a call to `method`, apply its delay and return its injected
    /// failure, if any.
    pub async fn enter(&self, method: &'static str) -> Result<(), CrmError> {
        Self::bump(&self.calls, method);

        let delay = self.delays.read().unwrap().get(method).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        Self::bump(&self.completions, method);
        let failure = self.failures.read().unwrap().get(method).cloned();
        failure.map_or(Ok(()), Err)
    }

    fn bump(counters: &RwLock<HashMap<&'static str, usize>>, method: &'static str) {
        *counters.write().unwrap().entry(method).or_insert(0) += 1;
    }

    /// How often `method` was called.
    #[must_use]
    pub fn calls(&self, method: &str) -> usize {
        self.calls.read().unwrap().get(method).copied().unwrap_or(0)
    }

    /// How often `method` ran to the end (was not cancelled).
    #[must_use]
    pub fn completions(&self, method: &str) -> usize {
        self.completions.read().unwrap().get(method).copied().unwrap_or(0)
    }

    /// Make every call to `method` fail with `error`.
    pub fn fail_on(&self, method: &'static str, error: CrmError) {
        self.failures.write().unwrap().insert(method, error);
    }

    /// Make every call to `method` wait `delay` before answering.
    pub fn delay(&self, method: &'static str, delay: Duration) {
        self.delays.write().unwrap().insert(method, delay);
    }

    /// Remove every injected failure and delay.
    pub fn reset_faults(&self) {
        self.failures.write().unwrap().clear();
        self.delays.write().unwrap().clear();
    }
}

macro_rules! call_log_accessors {
    () => {
        /// How often `method` was called.
        #[must_use]
        pub fn calls(&self, method: &str) -> usize {
            self.log.calls(method)
        }

        /// How often `method` ran to the end.
        #[must_use]
        pub fn completions(&self, method: &str) -> usize {
            self.log.completions(method)
        }

        /// Make every call to `method` fail with `error`.
        pub fn fail_on(&self, method: &'static str, error: CrmError) {
            self.log.fail_on(method, error);
        }

        /// Make every call to `method` wait `delay` before answering.
        pub fn delay(&self, method: &'static str, delay: Duration) {
            self.log.delay(method, delay);
        }

        /// Remove every injected failure and delay.
        pub fn reset_faults(&self) {
            self.log.reset_faults();
        }
    };
}

// ============================================================================
// Tickets
// ============================================================================

/// In-memory ticket store.
#[derive(Clone, Debug, Default)]
pub struct InMemoryTicketStore {
    tickets: Arc<RwLock<HashMap<TicketId, Ticket>>>,
    log: Arc<CallLog>,
}

impl InMemoryTicketStore {
    /// Create a new empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a ticket directly, bypassing the call log.
    pub fn insert(&self, ticket: Ticket) {
        self.tickets
            .write()
            .unwrap()
            .insert(ticket.ticket_id.clone(), ticket);
    }

    /// Stored ticket by id.
    #[must_use]
    pub fn get(&self, ticket_id: &TicketId) -> Option<Ticket> {
        self.tickets.read().unwrap().get(ticket_id).cloned()
    }

    /// Number of stored tickets
    #[must_use]
    pub fn len(&self) -> usize {
        self.tickets.read().unwrap().len()
    }

    /// Check if the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tickets.read().unwrap().is_empty()
    }

    call_log_accessors!();
}

impl TicketStore for InMemoryTicketStore {
    fn create(&self, ticket: Ticket) -> PortFuture<'_, TicketId> {
        Box::pin(async move {
            self.log.enter("create").await?;
            let mut tickets = self.tickets.write().unwrap();
            if tickets.contains_key(&ticket.ticket_id) {
                return Err(CrmError::storage(format!(
                    "ticket {} already exists",
                    ticket.ticket_id
                )));
            }
            let ticket_id = ticket.ticket_id.clone();
            tickets.insert(ticket_id.clone(), ticket);
            Ok(ticket_id)
        })
    }

    fn get_by_id<'a>(&'a self, ticket_id: &'a TicketId) -> PortFuture<'a, Ticket> {
        Box::pin(async move {
            self.log.enter("get_by_id").await?;
            self.get(ticket_id).ok_or_else(|| {
                CrmError::not_found("no ticket found with this id").with_context("ticket_id", ticket_id)
            })
        })
    }

    fn update(&self, ticket: Ticket) -> PortFuture<'_, ()> {
        Box::pin(async move {
            self.log.enter("update").await?;
            let mut tickets = self.tickets.write().unwrap();
            match tickets.get_mut(&ticket.ticket_id) {
                Some(stored) => {
                    *stored = ticket;
                    Ok(())
                }
                None => Err(CrmError::not_found("no ticket found with this id")
                    .with_context("ticket_id", &ticket.ticket_id)),
            }
        })
    }

    fn search(&self, filters: TicketFilters) -> PortFuture<'_, Page<Ticket>> {
        Box::pin(async move {
            self.log.enter("search").await?;
            let mut matching: Vec<Ticket> = self
                .tickets
                .read()
                .unwrap()
                .values()
                .filter(|ticket| filters.matches(ticket))
                .cloned()
                .collect();
            matching.sort_by(|a, b| {
                a.created_at
                    .cmp(&b.created_at)
                    .then_with(|| a.ticket_id.cmp(&b.ticket_id))
            });

            let total = matching.len();
            let limit = if filters.limit == 0 { total } else { filters.limit };
            let items = matching.into_iter().skip(filters.offset).take(limit).collect();

            Ok(Page {
                items,
                total,
                limit: filters.limit,
                offset: filters.offset,
            })
        })
    }
}

// ============================================================================
// Comments
// ============================================================================

/// In-memory comment store. Keeps insertion order.
#[derive(Clone, Debug, Default)]
pub struct InMemoryCommentStore {
    comments: Arc<RwLock<Vec<Comment>>>,
    log: Arc<CallLog>,
}

impl InMemoryCommentStore {
    /// Create a new empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a comment directly, bypassing the call log.
    pub fn insert(&self, comment: Comment) {
        self.comments.write().unwrap().push(comment);
    }

    /// Every stored comment, in insertion order.
    #[must_use]
    pub fn all(&self) -> Vec<Comment> {
        self.comments.read().unwrap().clone()
    }

    /// Number of stored comments
    #[must_use]
    pub fn len(&self) -> usize {
        self.comments.read().unwrap().len()
    }

    /// Check if the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.comments.read().unwrap().is_empty()
    }

    call_log_accessors!();
}

impl CommentStore for InMemoryCommentStore {
    fn create(&self, comment: Comment) -> PortFuture<'_, CommentId> {
        Box::pin(async move {
            self.log.enter("create").await?;
            let comment_id = comment.comment_id.clone();
            self.insert(comment);
            Ok(comment_id)
        })
    }

    fn get_by_id<'a>(&'a self, comment_id: &'a CommentId) -> PortFuture<'a, Comment> {
        Box::pin(async move {
            self.log.enter("get_by_id").await?;
            self.comments
                .read()
                .unwrap()
                .iter()
                .find(|comment| &comment.comment_id == comment_id)
                .cloned()
                .ok_or_else(|| {
                    CrmError::not_found("no comment found with this id")
                        .with_context("comment_id", comment_id)
                })
        })
    }

    fn get_by_ticket_id<'a>(&'a self, ticket_id: &'a TicketId) -> PortFuture<'a, Vec<Comment>> {
        Box::pin(async move {
            self.log.enter("get_by_ticket_id").await?;
            Ok(self
                .comments
                .read()
                .unwrap()
                .iter()
                .filter(|comment| &comment.ticket_id == ticket_id)
                .cloned()
                .collect())
        })
    }
}

// ============================================================================
// Entity lookups
// ============================================================================

/// An entity served by [`InMemoryLookup`].
pub trait Record: Clone + Send + Sync + 'static {
    /// Entity name used in not-found messages
    const ENTITY: &'static str;
    /// Context key of the identifier
    const ID_FIELD: &'static str;

    /// Identifier of this record
    fn record_id(&self) -> &str;
}

impl Record for Customer {
    const ENTITY: &'static str = "customer";
    const ID_FIELD: &'static str = "customer_id";

    fn record_id(&self) -> &str {
        self.customer_id.as_str()
    }
}

impl Record for Product {
    const ENTITY: &'static str = "product";
    const ID_FIELD: &'static str = "product_id";

    fn record_id(&self) -> &str {
        self.product_id.as_str()
    }
}

impl Record for Lead {
    const ENTITY: &'static str = "lead";
    const ID_FIELD: &'static str = "lead_id";

    fn record_id(&self) -> &str {
        self.lead_id.as_str()
    }
}

impl Record for Tenant {
    const ENTITY: &'static str = "tenant";
    const ID_FIELD: &'static str = "tenant_id";

    fn record_id(&self) -> &str {
        self.tenant_id.as_str()
    }
}

/// In-memory lookup keyed by record id.
#[derive(Clone, Debug)]
pub struct InMemoryLookup<T: Record> {
    records: Arc<RwLock<HashMap<String, T>>>,
    log: Arc<CallLog>,
}

/// In-memory customer lookup
pub type InMemoryCustomers = InMemoryLookup<Customer>;
/// In-memory product lookup and registry
pub type InMemoryProducts = InMemoryLookup<Product>;
/// In-memory lead lookup
pub type InMemoryLeads = InMemoryLookup<Lead>;
/// In-memory tenant lookup
pub type InMemoryTenants = InMemoryLookup<Tenant>;

impl<T: Record> Default for InMemoryLookup<T> {
    fn default() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            log: Arc::new(CallLog::default()),
        }
    }
}

impl<T: Record> InMemoryLookup<T> {
    /// Create a new empty lookup
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record.
    pub fn insert(&self, record: T) {
        self.records
            .write()
            .unwrap()
            .insert(record.record_id().to_string(), record);
    }

    /// Stored record by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<T> {
        self.records.read().unwrap().get(id).cloned()
    }

    /// Number of stored records
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }

    /// Check if the lookup is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().unwrap().is_empty()
    }

    call_log_accessors!();

    fn fetch<'a>(&'a self, id: &'a str) -> PortFuture<'a, T> {
        Box::pin(async move {
            self.log.enter("get_by_id").await?;
            self.get(id).ok_or_else(|| {
                CrmError::not_found(format!("no {} found with this id", T::ENTITY))
                    .with_context(T::ID_FIELD, id)
            })
        })
    }
}

impl CustomerLookup for InMemoryCustomers {
    fn get_by_id<'a>(&'a self, customer_id: &'a CustomerId) -> PortFuture<'a, Customer> {
        self.fetch(customer_id.as_str())
    }
}

impl ProductLookup for InMemoryProducts {
    fn get_by_id<'a>(&'a self, product_id: &'a ProductId) -> PortFuture<'a, Product> {
        self.fetch(product_id.as_str())
    }

    fn create(&self, product: Product) -> PortFuture<'_, ProductId> {
        Box::pin(async move {
            self.log.enter("create").await?;
            let product_id = product.product_id.clone();
            self.insert(product);
            Ok(product_id)
        })
    }
}

impl LeadLookup for InMemoryLeads {
    fn get_by_id<'a>(&'a self, lead_id: &'a LeadId) -> PortFuture<'a, Lead> {
        self.fetch(lead_id.as_str())
    }
}

impl TenantLookup for InMemoryTenants {
    fn get_by_id<'a>(&'a self, tenant_id: &'a TenantId) -> PortFuture<'a, Tenant> {
        self.fetch(tenant_id.as_str())
    }
}

// ============================================================================
// Users, attachments, templates
// ============================================================================

/// In-memory user directory.
#[derive(Clone, Debug, Default)]
pub struct InMemoryUsers {
    users: Arc<RwLock<Vec<User>>>,
    log: Arc<CallLog>,
}

impl InMemoryUsers {
    /// Create a new empty directory
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user.
    pub fn insert(&self, user: User) {
        self.users.write().unwrap().push(user);
    }

    call_log_accessors!();
}

impl UserLookup for InMemoryUsers {
    fn search(&self, filters: UserFilters) -> PortFuture<'_, Vec<User>> {
        Box::pin(async move {
            self.log.enter("search").await?;
            Ok(self
                .users
                .read()
                .unwrap()
                .iter()
                .filter(|user| filters.matches(user))
                .cloned()
                .collect())
        })
    }
}

/// In-memory blob store. Records the order of downloads.
#[derive(Clone, Debug, Default)]
pub struct InMemoryAttachments {
    blobs: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    downloaded: Arc<RwLock<Vec<String>>>,
    log: Arc<CallLog>,
}

impl InMemoryAttachments {
    /// Create a new empty blob store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `bytes` under `key`.
    pub fn insert(&self, key: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.blobs.write().unwrap().insert(key.into(), bytes.into());
    }

    /// Keys downloaded so far, in download order.
    #[must_use]
    pub fn downloaded(&self) -> Vec<String> {
        self.downloaded.read().unwrap().clone()
    }

    call_log_accessors!();
}

impl AttachmentStore for InMemoryAttachments {
    fn download<'a>(&'a self, key: &'a str) -> PortFuture<'a, Vec<u8>> {
        Box::pin(async move {
            self.log.enter("download").await?;
            let blob = self.blobs.read().unwrap().get(key).cloned();
            let blob = blob.ok_or_else(|| {
                CrmError::not_found("no attachment found with this key").with_context("key", key)
            })?;
            self.downloaded.write().unwrap().push(key.to_string());
            Ok(blob)
        })
    }
}

/// In-memory template storage.
#[derive(Clone, Debug, Default)]
pub struct InMemoryTemplates {
    templates: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    log: Arc<CallLog>,
}

impl InMemoryTemplates {
    /// Create a new empty template storage
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a template body.
    pub fn insert(&self, template_id: impl Into<String>, body: impl Into<Vec<u8>>) {
        self.templates
            .write()
            .unwrap()
            .insert(template_id.into(), body.into());
    }

    call_log_accessors!();
}

impl TemplateSource for InMemoryTemplates {
    fn load<'a>(&'a self, template_id: &'a str) -> PortFuture<'a, Vec<u8>> {
        Box::pin(async move {
            self.log.enter("load").await?;
            self.templates
                .read()
                .unwrap()
                .get(template_id)
                .cloned()
                .ok_or_else(|| {
                    CrmError::not_found("no template found with this id")
                        .with_context("template_id", template_id)
                })
        })
    }
}

// ============================================================================
// Failing port
// ============================================================================

/// A port whose every call fails with the same error.
#[derive(Clone, Debug)]
pub struct FailingLookup {
    error: CrmError,
}

impl FailingLookup {
    /// Fail every call with `error`.
    #[must_use]
    pub const fn new(error: CrmError) -> Self {
        Self { error }
    }

    /// Fail every call with a storage error.
    #[must_use]
    pub fn storage(message: &str) -> Self {
        Self::new(CrmError::storage(message))
    }

    fn fail<'a, T: Send + 'a>(&self) -> PortFuture<'a, T> {
        let error = self.error.clone();
        Box::pin(async move { Err(error) })
    }
}

impl CommentStore for FailingLookup {
    fn create(&self, _comment: Comment) -> PortFuture<'_, CommentId> {
        self.fail()
    }

    fn get_by_id<'a>(&'a self, _comment_id: &'a CommentId) -> PortFuture<'a, Comment> {
        self.fail()
    }

    fn get_by_ticket_id<'a>(&'a self, _ticket_id: &'a TicketId) -> PortFuture<'a, Vec<Comment>> {
        self.fail()
    }
}

impl CustomerLookup for FailingLookup {
    fn get_by_id<'a>(&'a self, _customer_id: &'a CustomerId) -> PortFuture<'a, Customer> {
        self.fail()
    }
}

impl ProductLookup for FailingLookup {
    fn get_by_id<'a>(&'a self, _product_id: &'a ProductId) -> PortFuture<'a, Product> {
        self.fail()
    }

    fn create(&self, _product: Product) -> PortFuture<'_, ProductId> {
        self.fail()
    }
}

impl LeadLookup for FailingLookup {
    fn get_by_id<'a>(&'a self, _lead_id: &'a LeadId) -> PortFuture<'a, Lead> {
        self.fail()
    }
}

impl TenantLookup for FailingLookup {
    fn get_by_id<'a>(&'a self, _tenant_id: &'a TenantId) -> PortFuture<'a, Tenant> {
        self.fail()
    }
}

impl UserLookup for FailingLookup {
    fn search(&self, _filters: UserFilters) -> PortFuture<'_, Vec<User>> {
        self.fail()
    }
}

impl AttachmentStore for FailingLookup {
    fn download<'a>(&'a self, _key: &'a str) -> PortFuture<'a, Vec<u8>> {
        self.fail()
    }
}

impl TemplateSource for FailingLookup {
    fn load<'a>(&'a self, _template_id: &'a str) -> PortFuture<'a, Vec<u8>> {
        self.fail()
    }
}

// ============================================================================
// Backend
// ============================================================================

/// One in-memory instance of every port.
#[derive(Clone, Debug, Default)]
pub struct InMemoryBackend {
    /// Tickets
    pub tickets: Arc<InMemoryTicketStore>,
    /// Comments
    pub comments: Arc<InMemoryCommentStore>,
    /// Customers
    pub customers: Arc<InMemoryCustomers>,
    /// Products
    pub products: Arc<InMemoryProducts>,
    /// Leads
    pub leads: Arc<InMemoryLeads>,
    /// Tenants
    pub tenants: Arc<InMemoryTenants>,
    /// Users
    pub users: Arc<InMemoryUsers>,
    /// Attachment blobs
    pub attachments: Arc<InMemoryAttachments>,
    /// Report templates
    pub templates: Arc<InMemoryTemplates>,
}

impl InMemoryBackend {
    /// Create an empty backend
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The backend as engine ports.
    #[must_use]
    pub fn ports(&self) -> WorkflowPorts {
        WorkflowPorts {
            tickets: self.tickets.clone(),
            comments: self.comments.clone(),
            customers: self.customers.clone(),
            products: self.products.clone(),
            leads: self.leads.clone(),
            tenants: self.tenants.clone(),
            users: self.users.clone(),
            attachments: self.attachments.clone(),
            templates: self.templates.clone(),
        }
    }

    /// Store the default customer fixture under `customer_id`.
    pub fn seed_default_customer(&self, customer_id: &CustomerId) {
        let mut customer = crate::fixtures::customer_fixture("customer-1");
        customer.customer_id = customer_id.clone();
        self.customers.insert(customer);
    }
}
