use anyhow::{bail, Result};
use clap::Args;

pub const DEFAULT_START_MARKER: &str = "policy";
pub const DEFAULT_END_MARKER: &str = "background";
pub const DEFAULT_MAX_DEPTH: usize = 500;

/// Marker headings and limits for one extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractConfig {
    pub start_marker: String,
    pub end_marker: String,
    pub max_depth: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            start_marker: DEFAULT_START_MARKER.to_string(),
            end_marker: DEFAULT_END_MARKER.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Command-line / environment overrides for [`ExtractConfig`].
#[derive(Debug, Clone, Args)]
pub struct ExtractArgs {
    /// Substring (case-insensitive) identifying the heading that opens the section
    #[arg(long, env = "SECTION_START_MARKER", default_value = DEFAULT_START_MARKER)]
    pub start: String,
    /// Substring (case-insensitive) identifying the heading that closes the section
    #[arg(long, env = "SECTION_END_MARKER", default_value = DEFAULT_END_MARKER)]
    pub end: String,
    /// Maximum element nesting depth before a tree is rejected as malformed
    #[arg(long, env = "SECTION_MAX_DEPTH", default_value_t = DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,
}

impl ExtractArgs {
    pub fn into_config(self) -> Result<ExtractConfig> {
        if self.start.trim().is_empty() || self.end.trim().is_empty() {
            bail!("section markers must not be empty");
        }
        if self.max_depth == 0 {
            bail!("--max-depth must be at least 1");
        }
        Ok(ExtractConfig {
            start_marker: self.start,
            end_marker: self.end,
            max_depth: self.max_depth,
        })
    }
}
