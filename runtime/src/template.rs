//! Report templates and placeholder substitution.
//!
//! A template is a DOCX package whose main document part holds `$name`
//! placeholders. Rendering is a single left-to-right pass over
//! `word/document.xml`: at every `$` the longest registered placeholder is
//! replaced by its value, and the value is copied to the output without being
//! scanned again. Unregistered placeholders are left as they are.
//!
//! Text values are XML-escaped and their line breaks become `<w:br/>`. Image
//! values become inline pictures backed by a part under `word/media/`. Every
//! other part of the package is copied through unchanged.

use crm_core::error::TemplateError;
use std::collections::{BTreeMap, HashMap};
use std::io::{Cursor, Read, Write};
use zip::result::ZipResult;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Built-in mapping of tenant company name to template identifier.
pub const DEFAULT_TEMPLATES: [(&str, &str); 1] = [("sample", "sample_template.docx")];

/// Main document part of a DOCX package.
pub const DOCUMENT_PART: &str = "word/document.xml";

const RELATIONSHIPS_PART: &str = "word/_rels/document.xml.rels";
const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

const IMAGE_RELATIONSHIP: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

// 15 x 10 cm, in EMU
const IMAGE_WIDTH_EMU: u64 = 5_400_000;
const IMAGE_HEIGHT_EMU: u64 = 3_600_000;

const LINE_BREAK: &str = r#"</w:t><w:br/><w:t xml:space="preserve">"#;

const fn is_name_byte(byte: u8) -> bool {
    matches!(byte, b'a'..=b'z' | b'_')
}

fn validate_placeholder(placeholder: &str) -> Result<(), TemplateError> {
    let valid = placeholder
        .strip_prefix('$')
        .is_some_and(|name| !name.is_empty() && name.bytes().all(is_name_byte));

    if valid {
        Ok(())
    } else {
        Err(TemplateError::InvalidPlaceholder {
            placeholder: placeholder.to_string(),
        })
    }
}

/// A placeholder value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    /// Text, escaped on render
    Text(String),
    /// Image bytes, embedded as a picture
    Image(Vec<u8>),
}

/// Placeholder values for one render.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Substitutions {
    values: BTreeMap<String, Value>,
}

impl Substitutions {
    /// No values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a text value.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::InvalidPlaceholder`] unless `placeholder`
    /// matches `$[a-z_]+`.
    pub fn text(
        &mut self,
        placeholder: &str,
        value: impl Into<String>,
    ) -> Result<&mut Self, TemplateError> {
        self.insert(placeholder, Value::Text(value.into()))
    }

    /// Register an image.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::InvalidPlaceholder`] unless `placeholder`
    /// matches `$[a-z_]+`.
    pub fn image(&mut self, placeholder: &str, bytes: Vec<u8>) -> Result<&mut Self, TemplateError> {
        self.insert(placeholder, Value::Image(bytes))
    }

    fn insert(&mut self, placeholder: &str, value: Value) -> Result<&mut Self, TemplateError> {
        validate_placeholder(placeholder)?;
        self.values.insert(placeholder.to_string(), value);
        Ok(self)
    }

    /// Value registered for `placeholder`.
    #[must_use]
    pub fn get(&self, placeholder: &str) -> Option<&Value> {
        self.values.get(placeholder)
    }

    /// True when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Longest registered placeholder at the start of `text`.
    fn longest_match(&self, text: &str) -> Option<(&str, &Value)> {
        let run = text
            .bytes()
            .skip(1)
            .take_while(|byte| is_name_byte(*byte))
            .count();

        (1..=run).rev().find_map(|len| {
            self.values
                .get_key_value(&text[..=len])
                .map(|(placeholder, value)| (placeholder.as_str(), value))
        })
    }
}

/// File extension and content type of an image, sniffed from its header.
fn image_format(bytes: &[u8]) -> (&'static str, &'static str) {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        ("png", "image/png")
    } else if bytes.starts_with(&[0xff, 0xd8, 0xff]) {
        ("jpeg", "image/jpeg")
    } else if bytes.starts_with(b"GIF8") {
        ("gif", "image/gif")
    } else if bytes.starts_with(b"BM") {
        ("bmp", "image/bmp")
    } else {
        ("bin", "application/octet-stream")
    }
}

/// An image placeholder that occurs in the rendered document.
struct EmbeddedImage<'a> {
    name: &'a str,
    bytes: &'a [u8],
    extension: &'static str,
    content_type: &'static str,
}

impl<'a> EmbeddedImage<'a> {
    fn new(placeholder: &'a str, bytes: &'a [u8]) -> Self {
        let (extension, content_type) = image_format(bytes);
        Self {
            name: placeholder.trim_start_matches('$'),
            bytes,
            extension,
            content_type,
        }
    }

    fn relationship_id(&self) -> String {
        format!("crm_{}", self.name)
    }

    fn target(&self) -> String {
        format!("media/crm_{}.{}", self.name, self.extension)
    }

    fn part_name(&self) -> String {
        format!("word/{}", self.target())
    }

    fn relationship(&self) -> String {
        format!(
            r#"<Relationship Id="{}" Type="{IMAGE_RELATIONSHIP}" Target="{}"/>"#,
            self.relationship_id(),
            self.target()
        )
    }

    fn drawing(&self, drawing_id: usize) -> String {
        let id = self.relationship_id();
        format!(
            r#"</w:t><w:drawing xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><wp:inline distT="0" distB="0" distL="0" distR="0"><wp:extent cx="{IMAGE_WIDTH_EMU}" cy="{IMAGE_HEIGHT_EMU}"/><wp:docPr id="{drawing_id}" name="{id}_{drawing_id}"/><a:graphic xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture"><pic:pic xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture"><pic:nvPicPr><pic:cNvPr id="{drawing_id}" name="{id}"/><pic:cNvPicPr/></pic:nvPicPr><pic:blipFill><a:blip r:embed="{id}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill><pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{IMAGE_WIDTH_EMU}" cy="{IMAGE_HEIGHT_EMU}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr></pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing><w:t xml:space="preserve">"#
        )
    }
}

fn push_escaped(output: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            '\'' => output.push_str("&apos;"),
            c if c.is_control() && c != '\t' => {}
            c => output.push(c),
        }
    }
}

fn push_text(output: &mut String, text: &str) {
    for (index, line) in text.split('\n').enumerate() {
        if index > 0 {
            output.push_str(LINE_BREAK);
        }
        push_escaped(output, line.strip_suffix('\r').unwrap_or(line));
    }
}

fn insert_before(xml: &str, closing_tag: &str, addition: &str) -> Option<String> {
    xml.rfind(closing_tag)
        .map(|at| format!("{}{addition}{}", &xml[..at], &xml[at..]))
}

fn with_relationships(xml: &str, images: &BTreeMap<&str, EmbeddedImage<'_>>) -> String {
    let entries: String = images.values().map(EmbeddedImage::relationship).collect();
    insert_before(xml, "</Relationships>", &entries).unwrap_or_else(|| relationships_part(&entries))
}

fn relationships_part(entries: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{entries}</Relationships>"#
    )
}

fn with_content_types(xml: &str, images: &BTreeMap<&str, EmbeddedImage<'_>>) -> String {
    let mut defaults = String::new();
    for image in images.values() {
        let declared = format!(r#"Extension="{}""#, image.extension);
        if !xml.contains(&declared) && !defaults.contains(&declared) {
            defaults.push_str(&format!(
                r#"<Default {declared} ContentType="{}"/>"#,
                image.content_type
            ));
        }
    }
    insert_before(xml, "</Types>", &defaults).unwrap_or_else(|| xml.to_string())
}

fn read_document(package: &[u8]) -> Result<String, String> {
    let mut archive = ZipArchive::new(Cursor::new(package))
        .map_err(|error| format!("not a DOCX package: {error}"))?;
    let mut part = archive
        .by_name(DOCUMENT_PART)
        .map_err(|_| format!("missing {DOCUMENT_PART}"))?;

    let mut document = String::new();
    part.read_to_string(&mut document)
        .map_err(|error| format!("unreadable {DOCUMENT_PART}: {error}"))?;
    Ok(document)
}

/// A parsed DOCX report template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template {
    id: String,
    package: Vec<u8>,
    document: String,
}

impl Template {
    /// Parse a template package.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Malformed`] when the bytes are not a zip
    /// archive or the archive has no UTF-8 `word/document.xml`.
    pub fn parse(id: impl Into<String>, package: Vec<u8>) -> Result<Self, TemplateError> {
        let id = id.into();
        match read_document(&package) {
            Ok(document) => Ok(Self {
                id,
                package,
                document,
            }),
            Err(reason) => Err(TemplateError::Malformed {
                template: id,
                reason,
            }),
        }
    }

    /// Template identifier
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Main document XML, placeholders included
    #[must_use]
    pub fn document(&self) -> &str {
        &self.document
    }

    /// Render with `substitutions` into a new DOCX package.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Write`] when the package cannot be rewritten.
    pub fn render(&self, substitutions: &Substitutions) -> Result<Vec<u8>, TemplateError> {
        let mut images = BTreeMap::new();
        let document = self.substitute(substitutions, &mut images);

        self.write_package(&document, &images)
            .map_err(|error| TemplateError::Write {
                template: self.id.clone(),
                reason: error.to_string(),
            })
    }

    fn substitute<'s>(
        &self,
        substitutions: &'s Substitutions,
        images: &mut BTreeMap<&'s str, EmbeddedImage<'s>>,
    ) -> String {
        let mut output = String::with_capacity(self.document.len());
        let mut drawings = 0;
        let mut rest = self.document.as_str();

        while let Some(at) = rest.find('$') {
            output.push_str(&rest[..at]);
            let candidate = &rest[at..];

            match substitutions.longest_match(candidate) {
                Some((placeholder, Value::Text(text))) => {
                    push_text(&mut output, text);
                    rest = &candidate[placeholder.len()..];
                }
                Some((placeholder, Value::Image(bytes))) => {
                    drawings += 1;
                    let image = images
                        .entry(placeholder)
                        .or_insert_with(|| EmbeddedImage::new(placeholder, bytes));
                    output.push_str(&image.drawing(drawings));
                    rest = &candidate[placeholder.len()..];
                }
                None => {
                    output.push('$');
                    rest = &candidate[1..];
                }
            }
        }

        output.push_str(rest);
        output
    }

    fn write_package(
        &self,
        document: &str,
        images: &BTreeMap<&str, EmbeddedImage<'_>>,
    ) -> ZipResult<Vec<u8>> {
        let mut archive = ZipArchive::new(Cursor::new(self.package.as_slice()))?;
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut has_relationships = false;

        for index in 0..archive.len() {
            let mut entry = archive.by_index(index)?;
            let name = entry.name().to_string();
            if entry.is_dir() {
                writer.add_directory(name, options)?;
                continue;
            }

            let mut body = Vec::new();
            entry.read_to_end(&mut body)?;
            let body = match name.as_str() {
                DOCUMENT_PART => document.as_bytes().to_vec(),
                RELATIONSHIPS_PART if !images.is_empty() => {
                    has_relationships = true;
                    with_relationships(&String::from_utf8_lossy(&body), images).into_bytes()
                }
                CONTENT_TYPES_PART if !images.is_empty() => {
                    with_content_types(&String::from_utf8_lossy(&body), images).into_bytes()
                }
                _ => body,
            };

            writer.start_file(name.as_str(), options)?;
            writer.write_all(&body)?;
        }

        if !images.is_empty() && !has_relationships {
            writer.start_file(RELATIONSHIPS_PART, options)?;
            writer.write_all(with_relationships("", images).as_bytes())?;
        }
        for image in images.values() {
            writer.start_file(image.part_name(), options)?;
            writer.write_all(image.bytes)?;
        }

        Ok(writer.finish()?.into_inner())
    }
}

/// Mapping of tenant company name to template identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplateRegistry {
    templates: HashMap<String, String>,
}

impl TemplateRegistry {
    /// Registry without any mapping.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            templates: HashMap::new(),
        }
    }

    /// Add or replace a mapping.
    #[must_use]
    pub fn with_template(mut self, company: impl Into<String>, template_id: impl Into<String>) -> Self {
        self.insert(company, template_id);
        self
    }

    /// Add or replace a mapping in place.
    pub fn insert(&mut self, company: impl Into<String>, template_id: impl Into<String>) {
        self.templates.insert(company.into(), template_id.into());
    }

    /// Template identifier for `company`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::NoTemplate`] when the company has no mapping.
    pub fn resolve(&self, company: &str) -> Result<&str, TemplateError> {
        self.templates
            .get(company)
            .map(String::as_str)
            .ok_or_else(|| TemplateError::NoTemplate {
                company: company.to_string(),
            })
    }

    /// Number of mappings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// True when there are no mappings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        DEFAULT_TEMPLATES
            .into_iter()
            .fold(Self::empty(), |registry, (company, template_id)| {
                registry.with_template(company, template_id)
            })
    }
}

impl<C: Into<String>, T: Into<String>> Extend<(C, T)> for TemplateRegistry {
    fn extend<I: IntoIterator<Item = (C, T)>>(&mut self, iter: I) {
        for (company, template_id) in iter {
            self.insert(company, template_id);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crm_testing::docx::{
        document_text, docx_from_lines, docx_parts, document_xml, part_names, read_part,
        read_text_part,
    };
    use proptest::prelude::*;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake-pixels";

    fn template(line: &str) -> Template {
        Template::parse("test.docx", docx_from_lines(&[line])).unwrap()
    }

    fn rendered(line: &str, subs: &Substitutions) -> String {
        document_text(&template(line).render(subs).unwrap())
    }

    #[test]
    fn test_parse_reads_main_document() {
        let template = template("Claim $claim");
        assert_eq!(template.id(), "test.docx");
        assert!(template.document().contains("Claim $claim"));
    }

    #[test]
    fn test_replaces_every_occurrence() {
        let mut subs = Substitutions::new();
        subs.text("$claim", "REF-1").unwrap();

        assert_eq!(rendered("Claim $claim / again $claim.", &subs), "Claim REF-1 / again REF-1.\n");
    }

    #[test]
    fn test_longest_placeholder_wins() {
        let mut subs = Substitutions::new();
        subs.text("$content", "text").unwrap();
        subs.text("$con", "short").unwrap();

        assert_eq!(rendered("[$content] [$con]", &subs), "[text] [short]\n");
    }

    #[test]
    fn test_placeholder_followed_by_name_bytes() {
        let mut subs = Substitutions::new();
        subs.text("$lead", "Ana Souza").unwrap();

        assert_eq!(rendered("$lead_name", &subs), "Ana Souza_name\n");
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let mut subs = Substitutions::new();
        subs.text("$summary", "costs $claim").unwrap();
        subs.text("$claim", "REF-1").unwrap();

        assert_eq!(rendered("$summary", &subs), "costs $claim\n");
    }

    #[test]
    fn test_unknown_placeholders_stay() {
        let subs = Substitutions::new();
        assert_eq!(
            rendered("$image_content and $ 5", &subs),
            "$image_content and $ 5\n"
        );
    }

    #[test]
    fn test_text_is_escaped_and_breaks_lines() {
        let mut subs = Substitutions::new();
        subs.text("$client", "Silva & Filhos <Ltda>").unwrap();
        subs.text("$content", "first\r\nsecond").unwrap();

        let package = template("$client: $content").render(&subs).unwrap();
        let xml = read_text_part(&package, DOCUMENT_PART).unwrap();

        assert!(xml.contains("Silva &amp; Filhos &lt;Ltda&gt;"));
        assert!(xml.contains(r#"first</w:t><w:br/><w:t xml:space="preserve">second"#));
        assert_eq!(document_text(&package), "Silva & Filhos <Ltda>: first\nsecond\n");
    }

    #[test]
    fn test_image_is_embedded_as_picture() {
        let mut subs = Substitutions::new();
        subs.image("$image_content", PNG.to_vec()).unwrap();

        let package = template("Photo: $image_content.").render(&subs).unwrap();

        assert_eq!(document_text(&package), "Photo: [image:crm_image_content].\n");
        assert_eq!(
            read_part(&package, "word/media/crm_image_content.png").unwrap(),
            PNG
        );
        let relationships = read_text_part(&package, RELATIONSHIPS_PART).unwrap();
        assert!(relationships.contains(
            r#"<Relationship Id="crm_image_content" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/crm_image_content.png"/></Relationships>"#
        ));
        let content_types = read_text_part(&package, CONTENT_TYPES_PART).unwrap();
        assert!(content_types.contains(r#"<Default Extension="png" ContentType="image/png"/>"#));
    }

    #[test]
    fn test_repeated_image_is_stored_once() {
        let mut subs = Substitutions::new();
        subs.image("$image_comment", vec![0xff, 0xd8, 0xff, 0xe0]).unwrap();

        let package = template("$image_comment $image_comment").render(&subs).unwrap();
        let xml = read_text_part(&package, DOCUMENT_PART).unwrap();

        assert_eq!(xml.matches("<w:drawing").count(), 2);
        assert!(xml.contains(r#"<wp:docPr id="1""#) && xml.contains(r#"<wp:docPr id="2""#));
        let media: Vec<_> = part_names(&package)
            .into_iter()
            .filter(|name| name.starts_with("word/media/"))
            .collect();
        assert_eq!(media, ["word/media/crm_image_comment.jpeg"]);
    }

    #[test]
    fn test_image_without_relationships_part_creates_it() {
        let xml = document_xml(&["$image_resolution"]);
        let package = docx_parts(&[(DOCUMENT_PART, xml.as_bytes())]);
        let mut subs = Substitutions::new();
        subs.image("$image_resolution", PNG.to_vec()).unwrap();

        let rendered = Template::parse("bare.docx", package).unwrap().render(&subs).unwrap();

        let relationships = read_text_part(&rendered, RELATIONSHIPS_PART).unwrap();
        assert!(relationships.contains(r#"Id="crm_image_resolution""#));
        assert!(relationships.ends_with("</Relationships>"));
    }

    #[test]
    fn test_other_parts_are_copied() {
        let xml = document_xml(&["$claim"]);
        let package = docx_parts(&[
            (DOCUMENT_PART, xml.as_bytes()),
            ("word/styles.xml", b"<w:styles/>".as_slice()),
            ("docProps/core.xml", b"<cp:coreProperties/>".as_slice()),
        ]);
        let mut subs = Substitutions::new();
        subs.text("$claim", "REF-1").unwrap();

        let rendered = Template::parse("t.docx", package).unwrap().render(&subs).unwrap();

        assert_eq!(
            part_names(&rendered),
            [DOCUMENT_PART, "word/styles.xml", "docProps/core.xml"]
        );
        assert_eq!(read_part(&rendered, "word/styles.xml").unwrap(), b"<w:styles/>");
        assert_eq!(document_text(&rendered), "REF-1\n");
    }

    #[test]
    fn test_non_zip_template_is_malformed() {
        let error = Template::parse("broken.docx", b"Claim $claim".to_vec()).unwrap_err();
        assert!(matches!(
            error,
            TemplateError::Malformed { ref template, ref reason }
                if template == "broken.docx" && reason.starts_with("not a DOCX package")
        ));
    }

    #[test]
    fn test_package_without_document_is_malformed() {
        let package = docx_parts(&[("word/styles.xml", b"<w:styles/>".as_slice())]);
        assert_eq!(
            Template::parse("empty.docx", package).unwrap_err(),
            TemplateError::Malformed {
                template: "empty.docx".to_string(),
                reason: "missing word/document.xml".to_string(),
            }
        );
    }

    #[test]
    fn test_invalid_placeholder_names() {
        let mut subs = Substitutions::new();
        for name in ["claim", "$", "$Claim", "$claim1", "$zip-code"] {
            assert_eq!(
                subs.text(name, "x").unwrap_err(),
                TemplateError::InvalidPlaceholder {
                    placeholder: name.to_string()
                }
            );
        }
        assert!(subs.is_empty());
        assert!(subs.get("$claim").is_none());
    }

    #[test]
    fn test_later_value_replaces_earlier() {
        let mut subs = Substitutions::new();
        subs.text("$claim", "REF-1").unwrap();
        subs.image("$claim", PNG.to_vec()).unwrap();

        assert_eq!(subs.get("$claim"), Some(&Value::Image(PNG.to_vec())));
    }

    #[test]
    fn test_multibyte_text_survives() {
        let mut subs = Substitutions::new();
        subs.text("$client", "João Conceição").unwrap();

        assert_eq!(
            rendered("Cliente: $client – ok", &subs),
            "Cliente: João Conceição – ok\n"
        );
    }

    #[test]
    fn test_image_format_sniffing() {
        assert_eq!(image_format(PNG), ("png", "image/png"));
        assert_eq!(image_format(&[0xff, 0xd8, 0xff, 0xdb]), ("jpeg", "image/jpeg"));
        assert_eq!(image_format(b"GIF89a"), ("gif", "image/gif"));
        assert_eq!(image_format(b"BM...."), ("bmp", "image/bmp"));
        assert_eq!(image_format(b"IMG1"), ("bin", "application/octet-stream"));
    }

    #[test]
    fn test_registry_defaults_and_overrides() {
        let registry = TemplateRegistry::default();
        assert_eq!(registry.resolve("sample").unwrap(), "sample_template.docx");
        assert_eq!(
            registry.resolve("acme").unwrap_err(),
            TemplateError::NoTemplate {
                company: "acme".to_string()
            }
        );

        let mut registry = registry.with_template("acme", "acme.docx");
        registry.extend([("sample", "sample_v2.docx")]);
        assert_eq!(registry.resolve("acme").unwrap(), "acme.docx");
        assert_eq!(registry.resolve("sample").unwrap(), "sample_v2.docx");
        assert_eq!(registry.len(), 2);
    }

    proptest! {
        #[test]
        fn prop_document_without_dollar_is_unchanged(line in "[^$]{0,200}") {
            let original = docx_from_lines(&[line.as_str()]);
            let mut subs = Substitutions::new();
            subs.text("$claim", "REF-1").unwrap();

            let rendered = Template::parse("t.docx", original.clone()).unwrap().render(&subs).unwrap();
            prop_assert_eq!(
                read_part(&rendered, DOCUMENT_PART),
                read_part(&original, DOCUMENT_PART)
            );
        }
    }
}
