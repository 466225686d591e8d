//! Integration tests for report generation
//!
//! Covers the reportable-status gate, per-source aggregation failures,
//! cancellation of in-flight fetches, comment bucketing, DOCX output and the
//! template failure modes, all against the in-memory backend.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use chrono::Duration as ChronoDuration;
use crm_core::domain::{CommentType, TicketId, TicketStatus};
use crm_core::environment::Clock;
use crm_core::error::{CrmError, ReportSource, TemplateError};
use crm_runtime::{TemplateRegistry, WorkflowEngine, WorkflowEnvironment};
use crm_testing::fixtures::{
    SAMPLE_TEMPLATE_ID, comment_fixture, customer_fixture, reportable_ticket, seed_report_sources,
    tenant_fixture, ticket_fixture,
};
use crm_testing::docx::{
    DOCUMENT_PART, document_text, docx_from_lines, docx_parts, part_names, read_part,
    read_text_part,
};
use crm_testing::properties::non_reportable_status;
use crm_testing::{InMemoryBackend, SequentialIds, test_clock};
use proptest::prelude::*;
use std::io::{Cursor, Read};
use std::sync::Arc;
use std::time::Duration;
use zip::{CompressionMethod, ZipArchive};

// ============================================================================
// Test Fixtures
// ============================================================================

fn engine(backend: &InMemoryBackend) -> WorkflowEngine {
    WorkflowEngine::new(
        backend.ports(),
        TemplateRegistry::default(),
        WorkflowEnvironment::new(Arc::new(test_clock()), Arc::new(SequentialIds::new("id"))),
    )
}

/// Backend holding a reportable ticket `T1` and everything its report reads.
fn reportable_backend() -> InMemoryBackend {
    let backend = InMemoryBackend::new();
    let ticket = reportable_ticket("T1");
    seed_report_sources(&backend, &ticket);
    backend.tickets.insert(ticket);
    backend
}

fn at_hour(hour: i64) -> chrono::DateTime<chrono::Utc> {
    test_clock().now() + ChronoDuration::hours(hour)
}

fn aggregation_origin(error: &CrmError) -> ReportSource {
    match error {
        CrmError::Aggregation { origin, .. } => *origin,
        other => panic!("expected aggregation error, got {other:?}"),
    }
}

// ============================================================================
// Reportable status gate
// ============================================================================

proptest! {
    #[test]
    fn non_reportable_ticket_never_aggregates(status in non_reportable_status()) {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        let backend = reportable_backend();
        let mut ticket = reportable_ticket("T1");
        ticket.status = status;
        backend.tickets.insert(ticket);

        let error = runtime
            .block_on(engine(&backend).generate_report(&TicketId::new("T1")))
            .unwrap_err();

        let expected = CrmError::validation("ticket is not in status REPORT")
            .with_context("status", status);
        prop_assert_eq!(error, expected);
        prop_assert_eq!(backend.customers.calls("get_by_id"), 0);
        prop_assert_eq!(backend.products.calls("get_by_id"), 0);
        prop_assert_eq!(backend.comments.calls("get_by_ticket_id"), 0);
        prop_assert_eq!(backend.leads.calls("get_by_id"), 0);
        prop_assert_eq!(backend.tenants.calls("get_by_id"), 0);
        prop_assert_eq!(backend.templates.calls("load"), 0);
    }
}

#[tokio::test]
async fn test_every_reportable_status_renders() {
    for status in TicketStatus::REPORTABLE {
        let backend = reportable_backend();
        let mut ticket = reportable_ticket("T1");
        ticket.status = status;
        backend.tickets.insert(ticket);

        let report = engine(&backend).generate_report(&TicketId::new("T1")).await;
        assert!(report.is_ok(), "status {status} should be reportable: {report:?}");
    }
}

#[tokio::test]
async fn test_new_ticket_report_names_status() {
    let backend = reportable_backend();
    backend.tickets.insert(ticket_fixture("T1"));

    let error = engine(&backend)
        .generate_report(&TicketId::new("T1"))
        .await
        .unwrap_err();

    assert!(matches!(error, CrmError::Validation { .. }));
    assert_eq!(
        error.context().and_then(|c| c.get("status")).map(String::as_str),
        Some("New")
    );
}

#[tokio::test]
async fn test_missing_ticket_is_not_found() {
    let backend = InMemoryBackend::new();

    let error = engine(&backend)
        .generate_report(&TicketId::new("nope"))
        .await
        .unwrap_err();

    assert!(error.is_not_found());
}

// ============================================================================
// Aggregation failures
// ============================================================================

#[tokio::test]
async fn test_each_failing_source_is_named() {
    let cases = [
        (ReportSource::Customer, "customers"),
        (ReportSource::Product, "products"),
        (ReportSource::Comments, "comments"),
        (ReportSource::Lead, "leads"),
        (ReportSource::Tenant, "tenants"),
    ];

    for (source, store) in cases {
        let backend = reportable_backend();
        let outage = CrmError::storage(format!("{store} offline"));
        match source {
            ReportSource::Customer => backend.customers.fail_on("get_by_id", outage.clone()),
            ReportSource::Product => backend.products.fail_on("get_by_id", outage.clone()),
            ReportSource::Comments => backend.comments.fail_on("get_by_ticket_id", outage.clone()),
            ReportSource::Lead => backend.leads.fail_on("get_by_id", outage.clone()),
            ReportSource::Tenant => backend.tenants.fail_on("get_by_id", outage.clone()),
        }

        let error = engine(&backend)
            .generate_report(&TicketId::new("T1"))
            .await
            .unwrap_err();

        assert_eq!(aggregation_origin(&error), source);
        assert_eq!(error.root_cause(), &outage);
        assert_eq!(backend.templates.calls("load"), 0, "{store}: no render after failure");
    }
}

#[tokio::test]
async fn test_missing_lead_record_is_not_found() {
    let backend = InMemoryBackend::new();
    let mut ticket = reportable_ticket("T1");
    ticket.lead_id = None;
    seed_report_sources(&backend, &ticket);
    ticket.lead_id = Some("lead-unknown".into());
    backend.tickets.insert(ticket);

    let error = engine(&backend)
        .generate_report(&TicketId::new("T1"))
        .await
        .unwrap_err();

    assert_eq!(aggregation_origin(&error), ReportSource::Lead);
    assert!(error.is_not_found());
}

#[tokio::test(start_paused = true)]
async fn test_failure_cancels_pending_fetches() {
    let backend = reportable_backend();
    backend.customers.delay("get_by_id", Duration::from_secs(1));
    backend
        .customers
        .fail_on("get_by_id", CrmError::storage("customer service timeout"));
    backend.tenants.delay("get_by_id", Duration::from_secs(60));
    backend.comments.delay("get_by_ticket_id", Duration::from_secs(60));

    let started = tokio::time::Instant::now();
    let error = engine(&backend)
        .generate_report(&TicketId::new("T1"))
        .await
        .unwrap_err();

    assert_eq!(aggregation_origin(&error), ReportSource::Customer);
    assert!(started.elapsed() < Duration::from_secs(60));

    // Both slow fetches started but were dropped before finishing
    assert_eq!(backend.tenants.calls("get_by_id"), 1);
    assert_eq!(backend.tenants.completions("get_by_id"), 0);
    assert_eq!(backend.comments.calls("get_by_ticket_id"), 1);
    assert_eq!(backend.comments.completions("get_by_ticket_id"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_fetches_run_concurrently() {
    let backend = reportable_backend();
    backend.customers.delay("get_by_id", Duration::from_secs(5));
    backend.products.delay("get_by_id", Duration::from_secs(5));
    backend.comments.delay("get_by_ticket_id", Duration::from_secs(5));
    backend.leads.delay("get_by_id", Duration::from_secs(5));
    backend.tenants.delay("get_by_id", Duration::from_secs(5));

    let started = tokio::time::Instant::now();
    engine(&backend)
        .generate_report(&TicketId::new("T1"))
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(10));
}

// ============================================================================
// Rendering
// ============================================================================

const PHOTO_1: &[u8] = b"\x89PNG\r\n\x1a\nIMG1";
const PHOTO_2: &[u8] = b"\x89PNG\r\n\x1a\nIMG2";

#[tokio::test]
async fn test_report_document_is_fully_rendered() {
    let backend = reportable_backend();
    backend.attachments.insert("img-1", PHOTO_1);
    backend.attachments.insert("img-2", PHOTO_2);
    for comment in [
        comment_fixture("c1", "T1", CommentType::Content, "a", at_hour(10), &["img-1", "img-2"]),
        comment_fixture("c2", "T1", CommentType::Content, "b", at_hour(11), &[]),
        comment_fixture("c3", "T1", CommentType::Rejection, "rejected for fraud", at_hour(11), &[]),
        comment_fixture("c4", "T1", CommentType::Resolution, "fixed", at_hour(12), &[]),
        comment_fixture("c5", "T2", CommentType::Comment, "other ticket", at_hour(12), &[]),
    ] {
        backend.comments.insert(comment);
    }

    let report = engine(&backend)
        .generate_report(&TicketId::new("T1"))
        .await
        .unwrap();

    let expected = "\
Claim: REF-1
Issued: 01/Jan/2025
Client: Maria Silva (12345678909)
Address: Rua Augusta 100, 01304-000
Product: Fridge / Acme / SN-0001
Summary: Fridge not cooling
Lead: João Souza until 08/Jan/2025
Content:
01/Jan/2025 10:00 - a
01/Jan/2025 11:00 - b
[image:crm_image_content]
Comments:

$image_comment
Resolution:
01/Jan/2025 12:00 - fixed
$image_resolution
";
    assert_eq!(document_text(&report.content), expected);
    assert_eq!(report.filename, "sample-REF-1-01_01_2025_00_00_00");
    assert_eq!(report.template_id, SAMPLE_TEMPLATE_ID);
    assert_eq!(backend.attachments.downloaded(), ["img-1", "img-2"]);

    // Only the first attachment of the content bucket is embedded
    let media: Vec<_> = part_names(&report.content)
        .into_iter()
        .filter(|name| name.starts_with("word/media/"))
        .collect();
    assert_eq!(media, ["word/media/crm_image_content.png"]);
    assert_eq!(
        read_part(&report.content, "word/media/crm_image_content.png").unwrap(),
        PHOTO_1
    );
}

#[tokio::test]
async fn test_report_is_a_docx_package() {
    let backend = reportable_backend();

    let report = engine(&backend)
        .generate_report(&TicketId::new("T1"))
        .await
        .unwrap();

    let mut archive = ZipArchive::new(Cursor::new(report.content.as_slice())).unwrap();
    for part in ["[Content_Types].xml", "_rels/.rels", "word/_rels/document.xml.rels"] {
        assert!(archive.by_name(part).is_ok(), "{part} should be kept");
    }
    let mut document = archive.by_name(DOCUMENT_PART).unwrap();
    assert_eq!(document.compression(), CompressionMethod::Deflated);
    let mut xml = String::new();
    document.read_to_string(&mut xml).unwrap();

    assert!(xml.contains("Claim: REF-1"));
    assert!(!xml.contains("$claim"));
    assert!(xml.starts_with("<?xml"));
}

#[tokio::test]
async fn test_substituted_values_are_not_rescanned() {
    let backend = reportable_backend();
    let mut customer = customer_fixture("customer-1");
    customer.first_name = "$claim".to_string();
    backend.customers.insert(customer);

    let report = engine(&backend)
        .generate_report(&TicketId::new("T1"))
        .await
        .unwrap();

    let content = document_text(&report.content);
    assert!(content.contains("Client: $claim Silva (12345678909)"));
    assert!(content.contains("Claim: REF-1"));
}

#[tokio::test]
async fn test_markup_in_values_is_escaped() {
    let backend = reportable_backend();
    let mut customer = customer_fixture("customer-1");
    customer.last_name = "Silva & <Filhos>".to_string();
    backend.customers.insert(customer);

    let report = engine(&backend)
        .generate_report(&TicketId::new("T1"))
        .await
        .unwrap();

    let xml = read_text_part(&report.content, DOCUMENT_PART).unwrap();
    assert!(xml.contains("Client: Maria Silva &amp; &lt;Filhos&gt; (12345678909)"));
    assert!(document_text(&report.content).contains("Client: Maria Silva & <Filhos> (12345678909)"));
}

#[tokio::test]
async fn test_failed_attachment_download_fails_report() {
    let backend = reportable_backend();
    backend.comments.insert(comment_fixture(
        "c1",
        "T1",
        CommentType::Comment,
        "photo",
        at_hour(1),
        &["missing-blob"],
    ));

    let error = engine(&backend)
        .generate_report(&TicketId::new("T1"))
        .await
        .unwrap_err();

    assert!(error.is_not_found());
    assert!(!matches!(error, CrmError::Aggregation { .. }));
}

// ============================================================================
// Template failures
// ============================================================================

#[tokio::test]
async fn test_unknown_company_has_no_template() {
    let backend = reportable_backend();
    backend.tenants.insert(tenant_fixture("tenant-1", "globex"));

    let error = engine(&backend)
        .generate_report(&TicketId::new("T1"))
        .await
        .unwrap_err();

    assert_eq!(
        error,
        CrmError::Template(TemplateError::NoTemplate {
            company: "globex".to_string()
        })
    );
    assert_eq!(backend.templates.calls("load"), 0);
}

#[tokio::test]
async fn test_unreadable_template_is_a_load_error() {
    let backend = reportable_backend();
    backend
        .templates
        .fail_on("load", CrmError::storage("disk unavailable"));

    let error = engine(&backend)
        .generate_report(&TicketId::new("T1"))
        .await
        .unwrap_err();

    match error {
        CrmError::Template(TemplateError::Load { template, reason }) => {
            assert_eq!(template, SAMPLE_TEMPLATE_ID);
            assert!(reason.contains("disk unavailable"));
        }
        other => panic!("expected load error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_plain_text_template_is_malformed() {
    let backend = reportable_backend();
    backend.templates.insert(SAMPLE_TEMPLATE_ID, "Claim: $claim");

    let error = engine(&backend)
        .generate_report(&TicketId::new("T1"))
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        CrmError::Template(TemplateError::Malformed { .. })
    ));
}

#[tokio::test]
async fn test_package_without_document_is_malformed() {
    let backend = reportable_backend();
    backend
        .templates
        .insert(SAMPLE_TEMPLATE_ID, docx_parts(&[("word/styles.xml", b"<w:styles/>".as_slice())]));

    let error = engine(&backend)
        .generate_report(&TicketId::new("T1"))
        .await
        .unwrap_err();

    assert_eq!(
        error,
        CrmError::Template(TemplateError::Malformed {
            template: SAMPLE_TEMPLATE_ID.to_string(),
            reason: "missing word/document.xml".to_string(),
        })
    );
}

#[tokio::test]
async fn test_custom_registry_routes_company() {
    let backend = reportable_backend();
    backend.tenants.insert(tenant_fixture("tenant-1", "globex"));
    backend
        .templates
        .insert("globex.docx", docx_from_lines(&["Claim $claim for $client"]));

    let engine = WorkflowEngine::new(
        backend.ports(),
        TemplateRegistry::default().with_template("globex", "globex.docx"),
        WorkflowEnvironment::new(Arc::new(test_clock()), Arc::new(SequentialIds::new("id"))),
    );
    let report = engine.generate_report(&TicketId::new("T1")).await.unwrap();

    assert_eq!(document_text(&report.content), "Claim REF-1 for Maria Silva\n");
    assert_eq!(report.template_id, "globex.docx");
    assert!(report.filename.starts_with("globex-REF-1-"));
}
