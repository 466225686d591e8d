//! Filesystem-backed report template source.

use crm_core::error::CrmError;
use crm_core::ports::{PortFuture, TemplateSource};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

/// Reads templates from a directory; the template id is the file name.
#[derive(Clone, Debug)]
pub struct FsTemplateSource {
    folder: PathBuf,
}

impl FsTemplateSource {
    /// Serve templates from `folder`.
    #[must_use]
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
        }
    }

    /// Directory templates are read from.
    #[must_use]
    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Path of `template_id` inside the folder.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::Validation`] when the id is empty or is not a
    /// plain file name.
    pub fn path_of(&self, template_id: &str) -> Result<PathBuf, CrmError> {
        let mut components = Path::new(template_id).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.folder.join(template_id)),
            _ => Err(CrmError::validation("template id must be a plain file name")
                .with_context("template_id", template_id)),
        }
    }
}

impl TemplateSource for FsTemplateSource {
    fn load<'a>(&'a self, template_id: &'a str) -> PortFuture<'a, Vec<u8>> {
        Box::pin(async move {
            let path = self.path_of(template_id)?;
            let body = tokio::fs::read(&path).await.map_err(|error| match error.kind() {
                ErrorKind::NotFound => CrmError::not_found("no template file found")
                    .with_context("path", path.display()),
                _ => CrmError::storage(format!("reading {}: {error}", path.display())),
            })?;

            tracing::debug!(template = template_id, bytes = body.len(), "Template loaded");
            Ok(body)
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("support-crm-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_load_reads_file() {
        let dir = scratch_dir("load");
        std::fs::write(dir.join("sample_template.docx"), "Claim $claim").unwrap();

        let source = FsTemplateSource::new(&dir);
        let body = source.load("sample_template.docx").await.unwrap();

        assert_eq!(body, b"Claim $claim");
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let source = FsTemplateSource::new(scratch_dir("missing"));
        let error = source.load("absent.docx").await.unwrap_err();
        assert!(error.is_not_found());
    }

    #[test]
    fn test_only_plain_file_names_resolve() {
        let source = FsTemplateSource::new("/srv/reports");

        assert_eq!(
            source.path_of("sample.docx").unwrap(),
            PathBuf::from("/srv/reports/sample.docx")
        );
        for bad in ["", "../secret", "nested/file.docx", "/etc/passwd", "."] {
            assert!(source.path_of(bad).is_err(), "{bad:?} should be rejected");
        }
    }
}
