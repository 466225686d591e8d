//! Report document assembly.
//!
//! Turns a [`ReportSnapshot`] into a DOCX package: pick the tenant's template,
//! partition comments into buckets, download attachments and substitute every
//! placeholder in one pass.

use crate::aggregator::ReportSnapshot;
use crate::template::{Substitutions, Template, TemplateRegistry};
use chrono::{DateTime, Utc};
use crm_core::domain::{Comment, CommentType};
use crm_core::environment::Clock;
use crm_core::error::{CrmError, TemplateError};
use crm_core::ports::{AttachmentStore, TemplateSource};
use std::sync::Arc;

/// Format of report date fields (`05/Mar/2025`).
pub const REPORT_DATE_FORMAT: &str = "%d/%b/%Y";

/// Format of comment timestamps (`05/Mar/2025 14:30`).
pub const COMMENT_TIMESTAMP_FORMAT: &str = "%d/%b/%Y %H:%M";

/// Format of the timestamp suffix of report file names.
pub const FILENAME_TIMESTAMP_FORMAT: &str = "%d_%m_%Y_%H_%M_%S";

/// Separator between bucket entries.
pub const ENTRY_SEPARATOR: &str = "\r\n";

/// A rendered report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportDocument {
    /// Rendered DOCX package
    pub content: Vec<u8>,
    /// `"{company}-{external_reference}-{timestamp}"`
    pub filename: String,
    /// Template the document was rendered from
    pub template_id: String,
}

/// Strip `.`, `-` and `/` from a tax document number.
#[must_use]
pub fn normalize_document(document: &str) -> String {
    document
        .chars()
        .filter(|c| !matches!(c, '.' | '-' | '/'))
        .collect()
}

/// Report file name for a tenant and claim at `now` (UTC).
#[must_use]
pub fn report_filename(company: &str, external_reference: &str, now: DateTime<Utc>) -> String {
    format!(
        "{company}-{external_reference}-{}",
        now.format(FILENAME_TIMESTAMP_FORMAT)
    )
}

/// Comments of one type, formatted for the report.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Bucket {
    entries: Vec<String>,
    first_attachment: Option<Vec<u8>>,
    downloads: usize,
}

impl Bucket {
    /// Formatted `"{timestamp} - {content}"` entries in comment order.
    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Entries joined with CRLF.
    #[must_use]
    pub fn joined(&self) -> String {
        self.entries.join(ENTRY_SEPARATOR)
    }

    /// First attachment downloaded for this bucket.
    #[must_use]
    pub fn first_attachment(&self) -> Option<&[u8]> {
        self.first_attachment.as_deref()
    }

    /// Number of attachments downloaded for this bucket.
    #[must_use]
    pub const fn downloads(&self) -> usize {
        self.downloads
    }
}

/// Comments partitioned by the types rendered into a report.
///
/// Rejection comments have no bucket.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommentBuckets {
    /// `Content` comments
    pub content: Bucket,
    /// `Comment` comments
    pub comment: Bucket,
    /// `Resolution` comments
    pub resolution: Bucket,
}

impl CommentBuckets {
    fn bucket_mut(&mut self, comment_type: CommentType) -> Option<&mut Bucket> {
        match comment_type {
            CommentType::Content => Some(&mut self.content),
            CommentType::Comment => Some(&mut self.comment),
            CommentType::Resolution => Some(&mut self.resolution),
            CommentType::Rejection => None,
        }
    }

    /// Partition `comments`, downloading every attachment sequentially.
    ///
    /// # Errors
    ///
    /// Propagates the first failed download.
    pub async fn collect(
        comments: &[Comment],
        attachments: &dyn AttachmentStore,
    ) -> Result<Self, CrmError> {
        let mut buckets = Self::default();

        for comment in comments {
            let Some(bucket) = buckets.bucket_mut(comment.comment_type) else {
                continue;
            };

            for attachment in &comment.attachments {
                let bytes = attachments.download(&attachment.key).await?;
                bucket.downloads += 1;
                if bucket.first_attachment.is_none() {
                    bucket.first_attachment = Some(bytes);
                }
            }

            bucket.entries.push(format!(
                "{} - {}",
                comment.created_at.format(COMMENT_TIMESTAMP_FORMAT),
                comment.content
            ));
        }

        Ok(buckets)
    }
}

/// Placeholder values for `snapshot` rendered at `now`.
///
/// # Errors
///
/// Returns [`TemplateError::InvalidPlaceholder`] if a placeholder name is
/// rejected.
pub fn report_substitutions(
    snapshot: &ReportSnapshot,
    buckets: &CommentBuckets,
    now: DateTime<Utc>,
) -> Result<Substitutions, TemplateError> {
    let ReportSnapshot {
        ticket,
        customer,
        product,
        lead,
        ..
    } = snapshot;

    let target_date = ticket
        .target_date
        .map(|date| date.format(REPORT_DATE_FORMAT).to_string())
        .unwrap_or_default();

    let mut subs = Substitutions::new();
    subs.text("$claim", ticket.external_reference.as_str())?
        .text("$actual_date", now.format(REPORT_DATE_FORMAT).to_string())?
        .text("$client", customer.full_name())?
        .text("$brand", product.brand.as_str())?
        .text("$summary", ticket.subject.as_str())?
        .text("$lead", lead.full_name())?
        .text("$target_date", target_date)?
        .text("$document", normalize_document(&customer.document))?
        .text("$address", customer.shipping_address.address.as_str())?
        .text("$zip_code", customer.shipping_address.zip_code.as_str())?
        .text("$product", product.name.as_str())?
        .text("$serial_number", product.serial_number.as_str())?
        .text("$content", buckets.content.joined())?
        .text("$comments", buckets.comment.joined())?
        .text("$resolution", buckets.resolution.joined())?;

    for (placeholder, bucket) in [
        ("$image_content", &buckets.content),
        ("$image_comment", &buckets.comment),
        ("$image_resolution", &buckets.resolution),
    ] {
        if let Some(image) = bucket.first_attachment() {
            subs.image(placeholder, image.to_vec())?;
        }
    }

    Ok(subs)
}

/// Renders report documents from snapshots.
#[derive(Clone)]
pub struct DocumentAssembler {
    registry: TemplateRegistry,
    templates: Arc<dyn TemplateSource>,
    attachments: Arc<dyn AttachmentStore>,
    clock: Arc<dyn Clock>,
}

impl DocumentAssembler {
    /// Create an assembler.
    #[must_use]
    pub fn new(
        registry: TemplateRegistry,
        templates: Arc<dyn TemplateSource>,
        attachments: Arc<dyn AttachmentStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            templates,
            attachments,
            clock,
        }
    }

    /// Render the report for `snapshot`.
    ///
    /// # Errors
    ///
    /// - [`TemplateError::NoTemplate`] when the tenant has no template
    /// - [`TemplateError::Load`] when the template cannot be read
    /// - [`TemplateError::Malformed`] when the template is not a DOCX package
    /// - [`TemplateError::Write`] when the rendered package cannot be written
    /// - any attachment download error, unchanged
    #[tracing::instrument(
        skip(self, snapshot),
        fields(ticket_id = %snapshot.ticket.ticket_id, company = %snapshot.tenant.company_name)
    )]
    pub async fn assemble(&self, snapshot: &ReportSnapshot) -> Result<ReportDocument, CrmError> {
        let company = snapshot.tenant.company_name.as_str();
        let template_id = self.registry.resolve(company)?;

        let body = self
            .templates
            .load(template_id)
            .await
            .map_err(|error| TemplateError::Load {
                template: template_id.to_string(),
                reason: error.to_string(),
            })?;
        let template = Template::parse(template_id, body)?;

        let buckets = CommentBuckets::collect(&snapshot.comments, self.attachments.as_ref()).await?;
        tracing::debug!(
            template = template_id,
            content = buckets.content.entries().len(),
            comments = buckets.comment.entries().len(),
            resolution = buckets.resolution.entries().len(),
            "Comment buckets collected"
        );

        let now = self.clock.now();
        let substitutions = report_substitutions(snapshot, &buckets, now)?;
        let content = template.render(&substitutions)?;

        Ok(ReportDocument {
            content,
            filename: report_filename(company, &snapshot.ticket.external_reference, now),
            template_id: template_id.to_string(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_normalize_document() {
        assert_eq!(normalize_document("123.456.789-09"), "12345678909");
        assert_eq!(normalize_document("12.345.678/0001-95"), "12345678000195");
        assert_eq!(normalize_document(""), "");
    }

    #[test]
    fn test_report_filename() {
        let now = Utc.with_ymd_and_hms(2025, 3, 5, 14, 7, 9).unwrap();
        assert_eq!(
            report_filename("sample", "REF-1", now),
            "sample-REF-1-05_03_2025_14_07_09"
        );
    }

    #[test]
    fn test_date_formats() {
        let at = Utc.with_ymd_and_hms(2025, 3, 5, 14, 7, 9).unwrap();
        assert_eq!(at.format(REPORT_DATE_FORMAT).to_string(), "05/Mar/2025");
        assert_eq!(at.format(COMMENT_TIMESTAMP_FORMAT).to_string(), "05/Mar/2025 14:07");
    }

    #[test]
    fn test_empty_bucket_joins_to_empty_string() {
        let bucket = Bucket::default();
        assert_eq!(bucket.joined(), "");
        assert!(bucket.first_attachment().is_none());
    }
}
