//! Deterministic domain fixtures.
//!
//! All timestamps come from [`test_clock`](crate::test_clock), so fixtures
//! built twice compare equal.

use crate::docx::docx_from_lines;
use crate::stores::InMemoryBackend;
use crate::test_clock;
use chrono::{DateTime, Duration, Utc};
use crm_core::domain::{
    Address, Attachment, Comment, CommentId, CommentType, Contact, Customer, CustomerId, Lead,
    LeadId, NewComment, NewProduct, NewTicket, Product, ProductId, Region, Role, Tenant, TenantId,
    Ticket, TicketId, TicketStatus, User, UserId,
};
use crm_core::environment::Clock;

/// Template identifier registered for the `sample` company by default.
pub const SAMPLE_TEMPLATE_ID: &str = "sample_template.docx";

/// Text of the sample report, one paragraph per line, using every
/// placeholder once.
pub const SAMPLE_TEMPLATE: &str = "\
Claim: $claim
Issued: $actual_date
Client: $client ($document)
Address: $address, $zip_code
Product: $product / $brand / $serial_number
Summary: $summary
Lead: $lead until $target_date
Content:
$content
$image_content
Comments:
$comments
$image_comment
Resolution:
$resolution
$image_resolution
";

/// [`SAMPLE_TEMPLATE`] packaged as a DOCX.
#[must_use]
pub fn sample_template() -> Vec<u8> {
    let lines: Vec<&str> = SAMPLE_TEMPLATE.lines().collect();
    docx_from_lines(&lines)
}

fn now() -> DateTime<Utc> {
    test_clock().now()
}

/// Creation payload for a ticket of `customer-1` under `tenant-1`.
#[must_use]
pub fn new_ticket_fixture() -> NewTicket {
    NewTicket {
        tenant_id: TenantId::new("tenant-1"),
        customer_id: CustomerId::new("customer-1"),
        origin_channel: "phone".to_string(),
        ticket_type: "claim".to_string(),
        subject: "Fridge not cooling".to_string(),
        due_date: Some(now() + Duration::days(30)),
        external_reference: "REF-1".to_string(),
        created_by: "agent".to_string(),
        product: NewProduct {
            name: "Fridge".to_string(),
            brand: "Acme".to_string(),
            model: "F-200".to_string(),
            serial_number: "SN-0001".to_string(),
            description: "Double door".to_string(),
        },
    }
}

/// A `New` ticket in region 4, created at the test clock.
#[must_use]
pub fn ticket_fixture(ticket_id: &str) -> Ticket {
    Ticket::new(
        TicketId::new(ticket_id),
        &new_ticket_fixture(),
        Region::new(4),
        now(),
    )
}

/// A ticket in status `Report` with a lead, a product and a target date.
#[must_use]
pub fn reportable_ticket(ticket_id: &str) -> Ticket {
    let mut ticket = ticket_fixture(ticket_id);
    ticket.status = TicketStatus::Report;
    ticket.owner_id = Some(UserId::new("op-1"));
    ticket.lead_id = Some(LeadId::new("lead-1"));
    ticket.product_id = Some(ProductId::new("product-1"));
    ticket.target_date = Some(now() + Duration::days(7));
    ticket
}

/// A customer living in São Paulo.
#[must_use]
pub fn customer_fixture(customer_id: &str) -> Customer {
    let address = Address {
        address: "Rua Augusta 100".to_string(),
        city: "São Paulo".to_string(),
        state: "SP".to_string(),
        zip_code: "01304-000".to_string(),
    };
    Customer {
        customer_id: CustomerId::new(customer_id),
        first_name: "Maria".to_string(),
        last_name: "Silva".to_string(),
        document: "123.456.789-09".to_string(),
        shipping_address: address.clone(),
        billing_address: address,
        personal_contact: Contact {
            name: "Maria Silva".to_string(),
            email: "maria@example.com".to_string(),
            phone_number: "+55 11 99999-0000".to_string(),
        },
    }
}

/// The product registered with [`new_ticket_fixture`].
#[must_use]
pub fn product_fixture(product_id: &str) -> Product {
    Product::new(
        ProductId::new(product_id),
        new_ticket_fixture().product,
        "agent",
        now(),
    )
}

/// An active lead.
#[must_use]
pub fn lead_fixture(lead_id: &str) -> Lead {
    Lead {
        lead_id: LeadId::new(lead_id),
        first_name: "João".to_string(),
        last_name: "Souza".to_string(),
        company_name: "Souza Reparos".to_string(),
        document: "12.345.678/0001-95".to_string(),
        shipping_address: Address::default(),
        active: true,
    }
}

/// An active tenant trading as `company_name`.
#[must_use]
pub fn tenant_fixture(tenant_id: &str, company_name: &str) -> Tenant {
    Tenant {
        tenant_id: TenantId::new(tenant_id),
        company_name: company_name.to_string(),
        legal_name: format!("{company_name} Seguros S.A."),
        document: "98.765.432/0001-10".to_string(),
        business_contact: Contact::default(),
        active: true,
    }
}

/// An active operator serving `region`.
#[must_use]
pub fn operator_fixture(user_id: &str, region: u8) -> User {
    User {
        user_id: UserId::new(user_id),
        first_name: "Operator".to_string(),
        last_name: user_id.to_string(),
        email: format!("{user_id}@example.com"),
        role: Role::Operator,
        region: Region::new(region),
        active: true,
    }
}

/// A comment on `ticket_id` created at `created_at`, with one attachment per
/// key.
#[must_use]
pub fn comment_fixture(
    comment_id: &str,
    ticket_id: &str,
    comment_type: CommentType,
    content: &str,
    created_at: DateTime<Utc>,
    attachment_keys: &[&str],
) -> Comment {
    Comment::new(
        CommentId::new(comment_id),
        TicketId::new(ticket_id),
        NewComment {
            content: content.to_string(),
            comment_type,
            attachments: attachment_keys.iter().copied().map(Attachment::from_key).collect(),
            author: "operator".to_string(),
        },
        created_at,
    )
}

/// Store every record a report on `ticket` needs: its customer, product,
/// lead, the `sample` tenant and the sample template.
///
/// Comments are left to the caller.
pub fn seed_report_sources(backend: &InMemoryBackend, ticket: &Ticket) {
    let mut customer = customer_fixture("customer-1");
    customer.customer_id = ticket.customer_id.clone();
    backend.customers.insert(customer);

    if let Some(product_id) = &ticket.product_id {
        backend.products.insert(product_fixture(product_id.as_str()));
    }
    if let Some(lead_id) = &ticket.lead_id {
        backend.leads.insert(lead_fixture(lead_id.as_str()));
    }

    backend
        .tenants
        .insert(tenant_fixture(ticket.tenant_id.as_str(), "sample"));
    backend.templates.insert(SAMPLE_TEMPLATE_ID, sample_template());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixtures_are_deterministic() {
        assert_eq!(ticket_fixture("T1"), ticket_fixture("T1"));
        assert_eq!(reportable_ticket("T1"), reportable_ticket("T1"));
    }

    #[test]
    fn test_reportable_ticket_is_reportable() {
        assert!(reportable_ticket("T1").status.is_reportable());
        assert!(!ticket_fixture("T1").status.is_reportable());
    }

    #[test]
    fn test_sample_template_keeps_every_line() {
        let text = crate::docx::document_text(&sample_template());
        assert_eq!(text, SAMPLE_TEMPLATE);
    }

    #[test]
    fn test_customer_lives_in_region_four() {
        assert_eq!(customer_fixture("c").region(), Region::new(4));
    }
}
