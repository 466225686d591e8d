//! Support CRM Demo
//!
//! Walks one claim through the whole workflow against in-memory stores:
//! - Ticket creation with regional operator assignment
//! - Claim details, lead assignment and resolution as status changes
//! - Report generation from the DOCX template folder
//!
//! # Usage
//!
//! ```bash
//! # Optional: REPORT_FOLDER, REPORT_TEMPLATES, RUST_LOG, METRICS_ENABLED
//! cargo run -p support-crm --bin demo
//! ```

use chrono::{Duration, Utc};
use crm_core::domain::{Attachment, ChangeLead, ChangeStatus, LeadId, TicketStatus};
use crm_testing::InMemoryBackend;
use crm_testing::fixtures::{
    customer_fixture, lead_fixture, new_ticket_fixture, operator_fixture, tenant_fixture,
};
use support_crm::{ApplicationBuilder, Config};

/// A 1x1 PNG standing in for a claim photo.
const CLAIM_PHOTO: [u8; 69] = [
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d,
    0x49, 0x48, 0x44, 0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01,
    0x08, 0x02, 0x00, 0x00, 0x00, 0x90, 0x77, 0x53, 0xde, 0x00, 0x00, 0x00,
    0x0c, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9c, 0x63, 0xb0, 0xe9, 0xb9, 0x06,
    0x00, 0x02, 0xa6, 0x01, 0x9f, 0x38, 0x3f, 0x8c, 0x91, 0x00, 0x00, 0x00,
    0x00, 0x49, 0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
];

/// Seed the stores a single claim needs.
fn seed(backend: &InMemoryBackend) {
    backend.customers.insert(customer_fixture("customer-1"));
    backend.users.insert(operator_fixture("op-sp", 4));
    backend.leads.insert(lead_fixture("lead-1"));
    backend.tenants.insert(tenant_fixture("tenant-1", "sample"));
    backend
        .attachments
        .insert("claims/front-panel.png", CLAIM_PHOTO.to_vec());
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let backend = InMemoryBackend::new();
    seed(&backend);

    let app = ApplicationBuilder::new()
        .with_config(Config::from_env()?)
        .with_tracing()?
        .with_metrics()?
        .with_ports(backend.ports())
        .build()?;
    let engine = app.engine();

    println!("\n============================================");
    println!("   Support CRM - Claim Walkthrough");
    println!("============================================\n");

    // Step 1: open the ticket
    let ticket_id = engine.create_ticket(new_ticket_fixture()).await?;
    let ticket = engine.get_ticket(&ticket_id).await?;
    println!("1. Ticket {ticket_id} opened");
    println!(
        "   status={} region={} owner={}",
        ticket.status,
        ticket.region,
        ticket.owner_id.as_ref().map_or("-", |id| id.as_str())
    );

    // Step 2: claim details with a photo
    engine
        .change_status(
            &ticket_id,
            ChangeStatus {
                status: TicketStatus::WaitingLead,
                updated_by: "op-sp".to_string(),
                content: Some("Fridge stopped cooling after a power surge".to_string()),
                attachments: vec![Attachment::from_key("claims/front-panel.png")],
            },
        )
        .await?;
    println!("2. Claim details recorded, waiting for a lead");

    // Step 3: lead takes the visit
    engine
        .change_lead(
            &ticket_id,
            ChangeLead {
                lead_id: LeadId::new("lead-1"),
                status: TicketStatus::Ongoing,
                target_date: Utc::now() + Duration::days(3),
                updated_by: "op-sp".to_string(),
            },
        )
        .await?;
    println!("3. Lead assigned");

    // Step 4: resolution
    engine
        .change_status(
            &ticket_id,
            ChangeStatus {
                status: TicketStatus::Report,
                updated_by: "lead-1".to_string(),
                content: Some("Compressor relay replaced, unit cooling normally".to_string()),
                attachments: Vec::new(),
            },
        )
        .await?;
    let comments = engine.list_comments(&ticket_id).await?;
    println!("4. Resolution delivered ({} comments on file)", comments.len());

    // Step 5: report
    let report = engine.generate_report(&ticket_id).await?;
    let path = format!("{}.docx", report.filename);
    tokio::fs::write(&path, &report.content).await?;
    println!(
        "5. Report written to {path} ({} bytes, template {})",
        report.content.len(),
        report.template_id
    );

    if let Some(metrics) = app.render_metrics() {
        if let Some(addr) = app.metrics_addr() {
            println!("\n--- metrics (a host server would serve these on {addr}) ---");
        }
        println!("{metrics}");
    }

    println!("\nDone.");
    Ok(())
}
