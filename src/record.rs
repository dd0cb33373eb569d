use std::sync::LazyLock;

use chrono::{SecondsFormat, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::ExtractConfig;
use crate::parser;
use crate::tree::{Node, Tag};

static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript"];

/// A rendered page handed over by the acquisition side.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PageCapture {
    #[serde(default)]
    pub url: Option<String>,
    pub root: Node,
}

/// Result record returned to callers of the extraction service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub url: String,
    pub timestamp: String,
}

/// How a capture's section came out, for batch bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Converted,
    NoStartMarker,
    NoContent,
    Failed,
}

impl PageCapture {
    /// Parse a capture without serde_json's nesting limit; the converter's
    /// depth guard is the only bound on tree depth.
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        let mut de = serde_json::Deserializer::from_str(raw);
        de.disable_recursion_limit();
        let capture = PageCapture::deserialize(serde_stacker::Deserializer::new(&mut de))?;
        de.end()?;
        Ok(capture)
    }
}

impl ExtractionRecord {
    pub fn from_capture(capture: &PageCapture, config: &ExtractConfig) -> (Self, Outcome) {
        let url = capture.url.clone().unwrap_or_default();
        let timestamp = now_iso8601();
        let text = Some(page_text(&capture.root));

        match parser::extract_section(&capture.root, config) {
            Ok(section) => {
                let outcome = match section {
                    parser::SectionMarkdown::Markdown(_) => Outcome::Converted,
                    parser::SectionMarkdown::NoStartMarker => Outcome::NoStartMarker,
                    parser::SectionMarkdown::NoContentBetweenMarkers => Outcome::NoContent,
                };
                let record = ExtractionRecord {
                    success: true,
                    text,
                    markdown: Some(section.as_output().to_string()),
                    error: None,
                    url,
                    timestamp,
                };
                (record, outcome)
            }
            Err(e) => {
                let record = ExtractionRecord {
                    success: false,
                    text,
                    markdown: None,
                    error: Some(e.to_string()),
                    url,
                    timestamp,
                };
                (record, Outcome::Failed)
            }
        }
    }
}

/// Visible plain text of the whole page. Text nodes are joined by a space and
/// whitespace runs collapse to one space.
pub fn page_text(root: &Node) -> String {
    let mut parts: Vec<&str> = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        match node {
            Node::Text(t) => parts.push(t),
            Node::Element(el) if is_hidden(&el.kind()) => {}
            Node::Element(el) => stack.extend(el.children.iter().rev()),
        }
    }
    WS_RE.replace_all(&parts.join(" "), " ").trim().to_string()
}

fn is_hidden(tag: &Tag) -> bool {
    matches!(tag, Tag::Other(name) if HIDDEN_TAGS.contains(&name.as_str()))
}

fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
