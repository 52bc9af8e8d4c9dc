use std::fs::File;
use std::io::Read;
use std::path::Path;

use regex::Regex;

use super::ExtractError;

const DOCUMENT_PART: &str = "word/document.xml";

/// Paragraph texts of the main document part, joined with "\n".
pub(super) fn extract(path: &Path) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(File::open(path)?)?;
    let mut xml = String::new();
    archive.by_name(DOCUMENT_PART)?.read_to_string(&mut xml)?;
    paragraphs_from_xml(&xml)
}

fn paragraphs_from_xml(xml: &str) -> Result<String, ExtractError> {
    // `<w:p>` / `<w:p w:rsidR=..>` / `<w:p/>`, but not `<w:pPr>`.
    let paragraph = Regex::new(r"(?s)<w:p(?:\s[^>]*)?/>|<w:p(?:\s[^>]*)?>(.*?)</w:p>")?;
    // `<w:t>` and `<w:t xml:space=..>`, but not `<w:tab/>` or `<w:tbl>`.
    let run_text = Regex::new(r"(?s)<w:t(?:\s[^>]*)?>(.*?)</w:t>")?;

    let paragraphs: Vec<String> = paragraph
        .captures_iter(xml)
        .map(|p| match p.get(1) {
            Some(body) => run_text
                .captures_iter(body.as_str())
                .filter_map(|t| t.get(1))
                .map(|t| decode_entities(t.as_str()))
                .collect::<String>(),
            None => String::new(),
        })
        .collect();

    Ok(paragraphs.join("\n"))
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
