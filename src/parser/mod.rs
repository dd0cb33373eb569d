pub mod blocks;
pub mod sections;
pub mod table;
pub mod whitespace;

use tracing::debug;

use crate::config::ExtractConfig;
use crate::error::ConvertError;
use crate::tree::Node;
use blocks::BlockConverter;
use sections::SectionResult;

pub const NO_START_MARKER: &str = "No \"Policy\" h2 header found";
pub const NO_CONTENT: &str = "No content found between Policy and Background headers";

/// Outcome of a section extraction. The two sentinel states stay distinct from
/// real Markdown until they are rendered with [`SectionMarkdown::as_output`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionMarkdown {
    Markdown(String),
    NoStartMarker,
    NoContentBetweenMarkers,
}

impl SectionMarkdown {
    /// Output bytes as existing consumers expect them, sentinels included.
    pub fn as_output(&self) -> &str {
        match self {
            SectionMarkdown::Markdown(md) => md,
            SectionMarkdown::NoStartMarker => NO_START_MARKER,
            SectionMarkdown::NoContentBetweenMarkers => NO_CONTENT,
        }
    }
}

/// Three-pass pipeline: section → raw markdown → normalized markdown.
pub fn extract_section(root: &Node, config: &ExtractConfig) -> Result<SectionMarkdown, ConvertError> {
    let section = match sections::find_section(root, &config.start_marker, &config.end_marker) {
        SectionResult::Found(section) => section,
        SectionResult::NoStartMarker => return Ok(SectionMarkdown::NoStartMarker),
        SectionResult::NoContentBetweenMarkers => {
            return Ok(SectionMarkdown::NoContentBetweenMarkers)
        }
    };

    let converter = BlockConverter::new(config.max_depth);
    let mut raw = blocks::heading(1, &section.title());
    raw.push_str(&converter.nodes_to_markdown(section.nodes)?);
    debug!(raw_len = raw.len(), "section converted");

    Ok(SectionMarkdown::Markdown(whitespace::normalize(&raw)))
}
