use thiserror::Error;

/// Failure of a single conversion call. Missing markers are not errors; see
/// [`crate::parser::SectionMarkdown`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConvertError {
    #[error("malformed tree: nesting depth {depth} exceeds the limit of {max}")]
    MalformedTree { depth: usize, max: usize },
}
