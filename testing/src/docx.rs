//! In-memory DOCX packages for report tests.
//!
//! Builds minimal WordprocessingML packages and reads rendered ones back as
//! plain text, so assertions stay readable.

#![allow(clippy::unwrap_used)]
#![allow(clippy::missing_panics_doc)]

use std::io::{Cursor, Read, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Main document part.
pub const DOCUMENT_PART: &str = "word/document.xml";

/// Relationships of the main document part.
pub const DOCUMENT_RELATIONSHIPS_PART: &str = "word/_rels/document.xml.rels";

/// Package content types.
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const PACKAGE_RELATIONSHIPS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_RELATIONSHIPS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"></Relationships>"#;

/// Zip `parts` in order, deflating each one.
#[must_use]
pub fn docx_parts(parts: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, body) in parts {
        writer.start_file(*name, options).unwrap();
        writer.write_all(body).unwrap();
    }

    writer.finish().unwrap().into_inner()
}

/// A complete package around `document_xml`.
#[must_use]
pub fn docx_with_document(document_xml: &str) -> Vec<u8> {
    docx_parts(&[
        (CONTENT_TYPES_PART, CONTENT_TYPES.as_bytes()),
        ("_rels/.rels", PACKAGE_RELATIONSHIPS.as_bytes()),
        (DOCUMENT_PART, document_xml.as_bytes()),
        (DOCUMENT_RELATIONSHIPS_PART, DOCUMENT_RELATIONSHIPS.as_bytes()),
    ])
}

/// Main document XML with one paragraph per line.
#[must_use]
pub fn document_xml(lines: &[&str]) -> String {
    let paragraphs: String = lines
        .iter()
        .map(|line| format!(r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#, escape(line)))
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{paragraphs}</w:body></w:document>"#
    )
}

/// A package with one paragraph per line.
#[must_use]
pub fn docx_from_lines(lines: &[&str]) -> Vec<u8> {
    docx_with_document(&document_xml(lines))
}

/// Body of part `name`, if present.
#[must_use]
pub fn read_part(package: &[u8], name: &str) -> Option<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(package)).unwrap();
    let mut part = archive.by_name(name).ok()?;
    let mut body = Vec::new();
    part.read_to_end(&mut body).unwrap();
    Some(body)
}

/// Body of part `name` as text.
#[must_use]
pub fn read_text_part(package: &[u8], name: &str) -> Option<String> {
    read_part(package, name).map(|body| String::from_utf8(body).unwrap())
}

/// Names of every part, in archive order.
#[must_use]
pub fn part_names(package: &[u8]) -> Vec<String> {
    let mut archive = ZipArchive::new(Cursor::new(package)).unwrap();
    (0..archive.len())
        .map(|index| archive.by_index(index).unwrap().name().to_string())
        .collect()
}

/// Visible text of the main document.
///
/// Paragraphs and `<w:br/>` end a line; an embedded picture reads as
/// `[image:{relationship id}]`.
#[must_use]
pub fn document_text(package: &[u8]) -> String {
    let xml = read_text_part(package, DOCUMENT_PART).unwrap();
    let mut text = String::new();
    let mut in_text = false;
    let mut rest = xml.as_str();

    while let Some(open) = rest.find('<') {
        if in_text {
            text.push_str(&unescape(&rest[..open]));
        }
        let close = open + rest[open..].find('>').unwrap();
        let tag = &rest[open + 1..close];

        if let Some(closing) = tag.strip_prefix('/') {
            match closing {
                "w:t" => in_text = false,
                "w:p" => text.push('\n'),
                _ => {}
            }
        } else {
            match tag.split(|c: char| c == ' ' || c == '/').next().unwrap_or_default() {
                "w:t" => in_text = !tag.ends_with('/'),
                "w:br" => text.push('\n'),
                "a:blip" => text.push_str(&format!("[image:{}]", attribute(tag, "r:embed"))),
                _ => {}
            }
        }
        rest = &rest[close + 1..];
    }

    text
}

fn attribute<'a>(tag: &'a str, key: &str) -> &'a str {
    tag.split_once(&format!("{key}=\""))
        .and_then(|(_, value)| value.split_once('"'))
        .map_or("", |(value, _)| value)
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_read_back_as_text() {
        let package = docx_from_lines(&["Claim: $claim", "", "a < b & c"]);
        assert_eq!(document_text(&package), "Claim: $claim\n\na < b & c\n");
    }

    #[test]
    fn test_package_parts_are_deflated() {
        let package = docx_from_lines(&["x"]);
        assert_eq!(
            part_names(&package),
            [CONTENT_TYPES_PART, "_rels/.rels", DOCUMENT_PART, DOCUMENT_RELATIONSHIPS_PART]
        );

        let mut archive = ZipArchive::new(Cursor::new(package.as_slice())).unwrap();
        assert_eq!(
            archive.by_name(DOCUMENT_PART).unwrap().compression(),
            CompressionMethod::Deflated
        );
        assert!(read_part(&package, "word/missing.xml").is_none());
    }

    #[test]
    fn test_breaks_and_pictures_in_text() {
        let xml = r#"<w:document><w:body><w:p><w:r><w:t>a</w:t><w:br/><w:t xml:space="preserve">b</w:t><w:drawing><a:blip r:embed="img1"/></w:drawing></w:r></w:p></w:body></w:document>"#;
        assert_eq!(document_text(&docx_with_document(xml)), "a\nb[image:img1]\n");
    }
}
