//! Concurrent report data aggregation.
//!
//! A report needs five independent records besides the ticket itself. They
//! are fetched concurrently in the caller's task; the first failure drops the
//! remaining fetches and fails the whole aggregation.

use crate::metrics::ReportMetrics;
use crm_core::domain::{Comment, Customer, Lead, Product, Tenant, Ticket};
use crm_core::error::{CrmError, ReportSource};
use crm_core::ports::{CommentStore, CustomerLookup, LeadLookup, ProductLookup, TenantLookup};
use std::future::Future;
use std::sync::Arc;

/// Everything a report render reads, fetched for one request.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportSnapshot {
    /// The ticket being reported on
    pub ticket: Ticket,
    /// Ticket customer
    pub customer: Customer,
    /// Product under claim
    pub product: Product,
    /// Ticket comments, in store order
    pub comments: Vec<Comment>,
    /// Assigned lead
    pub lead: Lead,
    /// Owning tenant
    pub tenant: Tenant,
}

/// Fetches a [`ReportSnapshot`] from the five lookups.
#[derive(Clone)]
pub struct ReportAggregator {
    customers: Arc<dyn CustomerLookup>,
    products: Arc<dyn ProductLookup>,
    comments: Arc<dyn CommentStore>,
    leads: Arc<dyn LeadLookup>,
    tenants: Arc<dyn TenantLookup>,
}

impl ReportAggregator {
    /// Create an aggregator over the given lookups.
    #[must_use]
    pub fn new(
        customers: Arc<dyn CustomerLookup>,
        products: Arc<dyn ProductLookup>,
        comments: Arc<dyn CommentStore>,
        leads: Arc<dyn LeadLookup>,
        tenants: Arc<dyn TenantLookup>,
    ) -> Self {
        Self {
            customers,
            products,
            comments,
            leads,
            tenants,
        }
    }

    /// Fetch all report sources for `ticket`.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::Aggregation`] naming the first source that failed.
    /// A ticket without a product or lead fails that source with a validation
    /// error. No partial snapshot is ever returned.
    #[tracing::instrument(skip(self, ticket), fields(ticket_id = %ticket.ticket_id))]
    pub async fn aggregate(&self, ticket: Ticket) -> Result<ReportSnapshot, CrmError> {
        let (customer, product, comments, lead, tenant) = tokio::try_join!(
            fetch(ReportSource::Customer, self.customers.get_by_id(&ticket.customer_id)),
            fetch(ReportSource::Product, async {
                let product_id = ticket
                    .product_id
                    .as_ref()
                    .ok_or_else(|| unassigned(&ticket, "product_id"))?;
                self.products.get_by_id(product_id).await
            }),
            fetch(ReportSource::Comments, self.comments.get_by_ticket_id(&ticket.ticket_id)),
            fetch(ReportSource::Lead, async {
                let lead_id = ticket
                    .lead_id
                    .as_ref()
                    .ok_or_else(|| unassigned(&ticket, "lead_id"))?;
                self.leads.get_by_id(lead_id).await
            }),
            fetch(ReportSource::Tenant, self.tenants.get_by_id(&ticket.tenant_id)),
        )?;

        tracing::debug!(comments = comments.len(), "Report sources fetched");

        Ok(ReportSnapshot {
            ticket,
            customer,
            product,
            comments,
            lead,
            tenant,
        })
    }
}

fn unassigned(ticket: &Ticket, field: &str) -> CrmError {
    CrmError::validation(format!("ticket has no {field}")).with_context("ticket_id", &ticket.ticket_id)
}

async fn fetch<T>(
    origin: ReportSource,
    lookup: impl Future<Output = Result<T, CrmError>>,
) -> Result<T, CrmError> {
    lookup.await.map_err(|cause| {
        tracing::warn!(source = %origin, error = %cause, "Report source fetch failed");
        ReportMetrics::record_aggregation_failure(origin);
        CrmError::aggregation(origin, cause)
    })
}
