//! Domain types for the support CRM.
//!
//! This module contains identifiers, entities, workflow payloads and query
//! types. Tickets reference every other entity by identifier only; nothing here
//! embeds a foreign record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps an existing identifier.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// True when the identifier is blank.
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Unique identifier for a support ticket
    TicketId
);
string_id!(
    /// Unique identifier for a comment
    CommentId
);
string_id!(
    /// Unique identifier for a customer
    CustomerId
);
string_id!(
    /// Unique identifier for a product
    ProductId
);
string_id!(
    /// Unique identifier for a lead (field contractor)
    LeadId
);
string_id!(
    /// Unique identifier for a tenant (the insurer/company owning the ticket)
    TenantId
);
string_id!(
    /// Unique identifier for a platform user
    UserId
);

// ============================================================================
// Region
// ============================================================================

/// Service region derived from a postal state.
///
/// Regions group states into the five macro-regions operators are assigned to.
/// `0` means the state is unknown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Region(u8);

impl Region {
    /// Region for states missing from the table
    pub const UNKNOWN: Self = Self(0);

    /// Wraps a raw region number.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Raw region number
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Resolve the region for a two-letter state code (case-insensitive).
    #[must_use]
    pub fn from_state(state: &str) -> Self {
        let region = match state.trim().to_ascii_uppercase().as_str() {
            "AC" | "AP" | "AM" | "PA" | "RO" | "RR" | "TO" => 1,
            "AL" | "BA" | "CE" | "MA" | "PB" | "PE" | "PI" | "RN" | "SE" => 2,
            "DF" | "GO" | "MT" | "MS" => 3,
            "ES" | "MG" | "RJ" | "SP" => 4,
            "PR" | "RS" | "SC" => 5,
            _ => 0,
        };
        Self(region)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Shared value objects
// ============================================================================

/// Postal address
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Street line
    pub address: String,
    /// City
    pub city: String,
    /// Two-letter state code
    pub state: String,
    /// Postal code
    pub zip_code: String,
}

/// Contact channels
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Contact name
    pub name: String,
    /// Email address
    pub email: String,
    /// Phone number
    pub phone_number: String,
}

// ============================================================================
// Ticket
// ============================================================================

/// Ticket workflow status
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TicketStatus {
    /// Freshly created, no owner yet
    #[default]
    New,
    /// Owner assigned, collecting customer information
    CustomerInfo,
    /// Waiting for a lead to be assigned
    WaitingLead,
    /// Lead is working on the ticket
    Ongoing,
    /// Lead delivered the technical report
    Report,
    /// Awaiting payment
    Payment,
    /// Payment receipt issued
    Receipt,
    /// Finished
    Closed,
    /// Rejected or abandoned
    Canceled,
}

impl TicketStatus {
    /// Every status, in workflow order
    pub const ALL: [Self; 9] = [
        Self::New,
        Self::CustomerInfo,
        Self::WaitingLead,
        Self::Ongoing,
        Self::Report,
        Self::Payment,
        Self::Receipt,
        Self::Closed,
        Self::Canceled,
    ];

    /// Statuses from which a report may be generated
    pub const REPORTABLE: [Self; 4] = [Self::Report, Self::Payment, Self::Receipt, Self::Closed];

    /// Stable name of the status
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "New",
            Self::CustomerInfo => "CustomerInfo",
            Self::WaitingLead => "WaitingLead",
            Self::Ongoing => "Ongoing",
            Self::Report => "Report",
            Self::Payment => "Payment",
            Self::Receipt => "Receipt",
            Self::Closed => "Closed",
            Self::Canceled => "Canceled",
        }
    }

    /// True when a report may be generated in this status.
    #[must_use]
    pub fn is_reportable(self) -> bool {
        Self::REPORTABLE.contains(&self)
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ticket priority
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TicketPriority {
    /// Low priority
    Low,
    /// Medium priority (default)
    #[default]
    Medium,
    /// High priority
    High,
}

/// A customer support case tracked through the status workflow.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    /// Ticket identifier
    pub ticket_id: TicketId,
    /// Owning tenant
    pub tenant_id: TenantId,
    /// Customer who opened the case
    pub customer_id: CustomerId,
    /// Assigned lead, once chosen
    pub lead_id: Option<LeadId>,
    /// Assigned operator, once chosen
    pub owner_id: Option<UserId>,
    /// Product under claim, once registered
    pub product_id: Option<ProductId>,
    /// Channel the ticket came in through
    pub origin_channel: String,
    /// Free-form ticket type
    pub ticket_type: String,
    /// Short description
    pub subject: String,
    /// Priority
    pub priority: TicketPriority,
    /// Workflow status
    pub status: TicketStatus,
    /// Region resolved from the customer's address at creation
    pub region: Region,
    /// Contractual due date
    pub due_date: Option<DateTime<Utc>>,
    /// Tenant-side claim reference
    pub external_reference: String,
    /// Date the lead committed to
    pub target_date: Option<DateTime<Utc>>,
    /// When the ticket was closed
    pub closed_at: Option<DateTime<Utc>>,
    /// Author of the ticket
    pub created_by: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last writer
    pub updated_by: String,
    /// Last write time
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    /// Build a new ticket in status `New` with `Medium` priority.
    #[must_use]
    pub fn new(ticket_id: TicketId, new_ticket: &NewTicket, region: Region, now: DateTime<Utc>) -> Self {
        Self {
            ticket_id,
            tenant_id: new_ticket.tenant_id.clone(),
            customer_id: new_ticket.customer_id.clone(),
            lead_id: None,
            owner_id: None,
            product_id: None,
            origin_channel: new_ticket.origin_channel.clone(),
            ticket_type: new_ticket.ticket_type.clone(),
            subject: new_ticket.subject.clone(),
            priority: TicketPriority::Medium,
            status: TicketStatus::New,
            region,
            due_date: new_ticket.due_date,
            external_reference: new_ticket.external_reference.clone(),
            target_date: None,
            closed_at: None,
            created_by: new_ticket.created_by.clone(),
            created_at: now,
            updated_by: new_ticket.created_by.clone(),
            updated_at: now,
        }
    }
}

// ============================================================================
// Comments & attachments
// ============================================================================

/// Semantic category of a comment
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommentType {
    /// Description of the claim content
    Content,
    /// General remark
    #[default]
    Comment,
    /// Resolution delivered by the lead
    Resolution,
    /// Reason the ticket was rejected
    Rejection,
}

impl CommentType {
    /// Stable name of the comment type
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Content => "Content",
            Self::Comment => "Comment",
            Self::Resolution => "Resolution",
            Self::Rejection => "Rejection",
        }
    }
}

impl fmt::Display for CommentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to a binary blob held by the attachment store
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Content-store locator
    pub key: String,
    /// Original file name
    pub file_name: String,
    /// MIME type
    pub content_type: String,
    /// Size in bytes
    pub size: u64,
}

impl Attachment {
    /// Attachment with only its store key set
    #[must_use]
    pub fn from_key(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }
}

/// An immutable note on a ticket.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// Comment identifier
    pub comment_id: CommentId,
    /// Owning ticket
    pub ticket_id: TicketId,
    /// Text body
    pub content: String,
    /// Semantic category
    pub comment_type: CommentType,
    /// Attached files
    pub attachments: Vec<Attachment>,
    /// Author
    pub created_by: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last writer (equals author; comments are never edited)
    pub updated_by: String,
    /// Last write time
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    /// Build a new comment.
    #[must_use]
    pub fn new(
        comment_id: CommentId,
        ticket_id: TicketId,
        new_comment: NewComment,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            comment_id,
            ticket_id,
            content: new_comment.content,
            comment_type: new_comment.comment_type,
            attachments: new_comment.attachments,
            created_by: new_comment.author.clone(),
            created_at: now,
            updated_by: new_comment.author,
            updated_at: now,
        }
    }
}

// ============================================================================
// Related entities
// ============================================================================

/// The person who opened the case
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Customer identifier
    pub customer_id: CustomerId,
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Tax document, possibly punctuated
    pub document: String,
    /// Where the product is
    pub shipping_address: Address,
    /// Where invoices go
    pub billing_address: Address,
    /// Personal contact
    pub personal_contact: Contact,
}

impl Customer {
    /// Region of the customer's shipping address
    #[must_use]
    pub fn region(&self) -> Region {
        Region::from_state(&self.shipping_address.state)
    }

    /// `"{first} {last}"`
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// The item under claim
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product identifier
    pub product_id: ProductId,
    /// Commercial name
    pub name: String,
    /// Manufacturer brand
    pub brand: String,
    /// Model
    pub model: String,
    /// Serial number
    pub serial_number: String,
    /// Free-form description
    pub description: String,
    /// Author
    pub created_by: String,
    /// Creation time
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Build a product record from its creation payload.
    #[must_use]
    pub fn new(product_id: ProductId, new_product: NewProduct, author: &str, now: DateTime<Utc>) -> Self {
        Self {
            product_id,
            name: new_product.name,
            brand: new_product.brand,
            model: new_product.model,
            serial_number: new_product.serial_number,
            description: new_product.description,
            created_by: author.to_string(),
            created_at: Some(now),
        }
    }
}

/// A field contractor assigned to tickets
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    /// Lead identifier
    pub lead_id: LeadId,
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Company name
    pub company_name: String,
    /// Tax document
    pub document: String,
    /// Address
    pub shipping_address: Address,
    /// Whether the lead is taking work
    pub active: bool,
}

impl Lead {
    /// `"{first} {last}"`
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// The company a ticket is handled for
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    /// Tenant identifier
    pub tenant_id: TenantId,
    /// Trade name; keys the report template
    pub company_name: String,
    /// Registered name
    pub legal_name: String,
    /// Tax document
    pub document: String,
    /// Business contact
    pub business_contact: Contact,
    /// Whether the tenant is active
    pub active: bool,
}

/// Platform user role
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Administrator
    Admin,
    /// Ticket operator; candidates for auto-assignment
    Operator,
    /// Lead-facing user
    Lead,
    /// Read-only
    #[default]
    Viewer,
}

/// A platform user
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User identifier
    pub user_id: UserId,
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Email
    pub email: String,
    /// Role
    pub role: Role,
    /// Region served
    pub region: Region,
    /// Whether the account is active
    pub active: bool,
}

// ============================================================================
// Workflow payloads
// ============================================================================

/// Product details supplied with a new ticket
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    /// Commercial name
    pub name: String,
    /// Manufacturer brand
    pub brand: String,
    /// Model
    pub model: String,
    /// Serial number
    pub serial_number: String,
    /// Free-form description
    pub description: String,
}

/// Payload for ticket creation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewTicket {
    /// Owning tenant
    pub tenant_id: TenantId,
    /// Customer who opened the case
    pub customer_id: CustomerId,
    /// Channel the ticket came in through
    pub origin_channel: String,
    /// Free-form ticket type
    pub ticket_type: String,
    /// Short description
    pub subject: String,
    /// Contractual due date
    pub due_date: Option<DateTime<Utc>>,
    /// Tenant-side claim reference
    pub external_reference: String,
    /// Author
    pub created_by: String,
    /// Product under claim
    pub product: NewProduct,
}

/// Reassign a ticket to an operator
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeOwner {
    /// New owner
    pub owner_id: UserId,
    /// Status to move to
    pub status: TicketStatus,
    /// Who made the change
    pub updated_by: String,
}

/// Move a ticket to another status, optionally leaving a note
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeStatus {
    /// Target status
    pub status: TicketStatus,
    /// Who made the change
    pub updated_by: String,
    /// Note to record as a derived comment
    pub content: Option<String>,
    /// Files for the derived comment
    pub attachments: Vec<Attachment>,
}

/// Assign a lead and commit to a target date
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeLead {
    /// Lead taking the ticket
    pub lead_id: LeadId,
    /// Status to move to
    pub status: TicketStatus,
    /// Date the lead committed to
    pub target_date: DateTime<Utc>,
    /// Who made the change
    pub updated_by: String,
}

/// Payload for a new comment
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComment {
    /// Text body
    pub content: String,
    /// Semantic category
    pub comment_type: CommentType,
    /// Attached files
    pub attachments: Vec<Attachment>,
    /// Author
    pub author: String,
}

// ============================================================================
// Queries
// ============================================================================

/// Ticket search filters. Empty lists match everything.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketFilters {
    /// Tenants to include
    pub tenant_ids: Vec<TenantId>,
    /// Owners to include
    pub owner_ids: Vec<UserId>,
    /// Customers to include
    pub customer_ids: Vec<CustomerId>,
    /// Leads to include
    pub lead_ids: Vec<LeadId>,
    /// Statuses to include
    pub statuses: Vec<TicketStatus>,
    /// Regions to include
    pub regions: Vec<Region>,
    /// Page size; `0` means unbounded
    pub limit: usize,
    /// Items to skip
    pub offset: usize,
}

impl TicketFilters {
    /// True when `ticket` satisfies every non-empty filter.
    #[must_use]
    pub fn matches(&self, ticket: &Ticket) -> bool {
        fn allows<T: PartialEq>(filter: &[T], value: Option<&T>) -> bool {
            filter.is_empty() || value.is_some_and(|v| filter.contains(v))
        }

        allows(&self.tenant_ids, Some(&ticket.tenant_id))
            && allows(&self.owner_ids, ticket.owner_id.as_ref())
            && allows(&self.customer_ids, Some(&ticket.customer_id))
            && allows(&self.lead_ids, ticket.lead_id.as_ref())
            && allows(&self.statuses, Some(&ticket.status))
            && allows(&self.regions, Some(&ticket.region))
    }
}

/// User search filters. Empty lists match everything.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserFilters {
    /// Regions to include
    pub regions: Vec<Region>,
    /// Roles to include
    pub roles: Vec<Role>,
    /// Restrict to active (`Some(true)`) or inactive users
    pub active: Option<bool>,
}

impl UserFilters {
    /// True when `user` satisfies every filter.
    #[must_use]
    pub fn matches(&self, user: &User) -> bool {
        (self.regions.is_empty() || self.regions.contains(&user.region))
            && (self.roles.is_empty() || self.roles.contains(&user.role))
            && self.active.is_none_or(|active| user.active == active)
    }
}

/// One page of query results
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// Total matches before paging
    pub total: usize,
    /// Requested page size
    pub limit: usize,
    /// Requested offset
    pub offset: usize,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_ticket() -> Ticket {
        let new_ticket = NewTicket {
            tenant_id: TenantId::new("tenant-1"),
            customer_id: CustomerId::new("customer-1"),
            origin_channel: "phone".to_string(),
            ticket_type: "claim".to_string(),
            subject: "Fridge not cooling".to_string(),
            due_date: None,
            external_reference: "REF-1".to_string(),
            created_by: "agent".to_string(),
            product: NewProduct::default(),
        };
        Ticket::new(TicketId::new("T1"), &new_ticket, Region::new(4), Utc::now())
    }

    #[test]
    fn test_new_ticket_defaults() {
        let ticket = sample_ticket();
        assert_eq!(ticket.status, TicketStatus::New);
        assert_eq!(ticket.priority, TicketPriority::Medium);
        assert!(ticket.owner_id.is_none());
        assert!(ticket.lead_id.is_none());
        assert_eq!(ticket.created_at, ticket.updated_at);
    }

    #[test]
    fn test_region_from_state() {
        assert_eq!(Region::from_state("SP"), Region::new(4));
        assert_eq!(Region::from_state(" rs "), Region::new(5));
        assert_eq!(Region::from_state("BA"), Region::new(2));
        assert_eq!(Region::from_state("XX"), Region::UNKNOWN);
        assert_eq!(Region::from_state(""), Region::UNKNOWN);
    }

    #[test]
    fn test_reportable_statuses() {
        let reportable: Vec<_> = TicketStatus::ALL
            .into_iter()
            .filter(|status| status.is_reportable())
            .collect();
        assert_eq!(reportable, TicketStatus::REPORTABLE.to_vec());
    }

    #[test]
    fn test_status_serializes_as_name() {
        let json = serde_json::to_string(&TicketStatus::WaitingLead).unwrap();
        assert_eq!(json, "\"WaitingLead\"");
        assert_eq!(TicketStatus::CustomerInfo.to_string(), "CustomerInfo");
    }

    #[test]
    fn test_ticket_filters() {
        let mut ticket = sample_ticket();
        assert!(TicketFilters::default().matches(&ticket));

        let by_owner = TicketFilters {
            owner_ids: vec![UserId::new("op-1")],
            ..TicketFilters::default()
        };
        assert!(!by_owner.matches(&ticket));

        ticket.owner_id = Some(UserId::new("op-1"));
        assert!(by_owner.matches(&ticket));

        let by_status = TicketFilters {
            statuses: vec![TicketStatus::Closed],
            ..TicketFilters::default()
        };
        assert!(!by_status.matches(&ticket));
    }

    #[test]
    fn test_user_filters() {
        let user = User {
            user_id: UserId::new("op-1"),
            role: Role::Operator,
            region: Region::new(4),
            active: true,
            ..User::default()
        };
        let filters = UserFilters {
            regions: vec![Region::new(4)],
            roles: vec![Role::Operator],
            active: Some(true),
        };
        assert!(filters.matches(&user));

        let inactive = User {
            active: false,
            ..user.clone()
        };
        assert!(!filters.matches(&inactive));

        let elsewhere = User {
            region: Region::new(1),
            ..user
        };
        assert!(!filters.matches(&elsewhere));
    }

    #[test]
    fn test_blank_ids_are_empty() {
        assert!(TicketId::new("").is_empty());
        assert!(TicketId::new("  ").is_empty());
        assert!(!TicketId::from("T1").is_empty());
    }
}
