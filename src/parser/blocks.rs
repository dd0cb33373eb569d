use std::sync::LazyLock;

use regex::Regex;

use super::table;
use crate::error::ConvertError;
use crate::tree::{Element, Node, Tag};

static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Recursive Markdown renderer. Holds only the depth limit, so one instance can
/// be shared by any number of conversions.
#[derive(Debug, Clone, Copy)]
pub struct BlockConverter {
    max_depth: usize,
}

impl BlockConverter {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Convert one node. Never fails on unknown markup; fails only when the
    /// tree nests deeper than the configured limit.
    pub fn to_markdown(&self, node: &Node) -> Result<String, ConvertError> {
        let mut out = String::new();
        self.convert(node, 0, &mut out)?;
        Ok(out)
    }

    /// Convert a run of sibling nodes into one buffer.
    pub fn nodes_to_markdown(&self, nodes: &[Node]) -> Result<String, ConvertError> {
        let mut out = String::new();
        for node in nodes {
            out.push_str(&self.to_markdown(node)?);
        }
        Ok(out)
    }

    fn convert(&self, node: &Node, depth: usize, out: &mut String) -> Result<(), ConvertError> {
        if depth > self.max_depth {
            return Err(ConvertError::MalformedTree {
                depth,
                max: self.max_depth,
            });
        }
        match node {
            Node::Text(t) => {
                let t = t.trim();
                if !t.is_empty() {
                    out.push_str(t);
                    out.push(' ');
                }
            }
            Node::Element(el) => self.convert_element(el, depth, out)?,
        }
        Ok(())
    }

    fn children(&self, el: &Element, depth: usize) -> Result<String, ConvertError> {
        let mut buf = String::new();
        for child in &el.children {
            self.convert(child, depth + 1, &mut buf)?;
        }
        Ok(buf)
    }

    fn convert_element(
        &self,
        el: &Element,
        depth: usize,
        out: &mut String,
    ) -> Result<(), ConvertError> {
        match el.kind() {
            Tag::Heading(level) => {
                out.push_str(&heading(level, el.text_content().trim()));
            }
            Tag::Paragraph | Tag::Figure => {
                let inner = self.children(el, depth)?;
                let inner = inner.trim();
                if !inner.is_empty() {
                    out.push_str(&format!("\n{}\n\n", inner));
                }
            }
            Tag::Strong => wrap_inline(out, "**", el),
            Tag::Emphasis => wrap_inline(out, "*", el),
            Tag::Code => wrap_inline(out, "`", el),
            Tag::Anchor => {
                let text = el.text_content();
                let text = text.trim();
                match el.attr("href") {
                    Some(href) if !href.trim().is_empty() && !text.is_empty() => {
                        out.push_str(&format!("[{}]({})", text, href));
                    }
                    _ => out.push_str(text),
                }
            }
            kind @ (Tag::UnorderedList | Tag::OrderedList) => {
                let items = el.find_descendants(|t| *t == Tag::ListItem, |_| true);
                out.push('\n');
                for (i, item) in items.iter().enumerate() {
                    let content = self.children(item, depth + 1)?;
                    if kind == Tag::OrderedList {
                        out.push_str(&format!("{}. {}\n", i + 1, content.trim()));
                    } else {
                        out.push_str(&format!("- {}\n", content.trim()));
                    }
                }
                out.push('\n');
            }
            Tag::DefinitionList => {
                let terms = el.find_descendants(|t| *t == Tag::Term, |_| true);
                let descs = el.find_descendants(|t| *t == Tag::Description, |_| true);
                for (dt, dd) in terms.iter().zip(descs.iter()) {
                    out.push_str(&format!(
                        "**{}**: {}\n\n",
                        dt.text_content().trim(),
                        dd.text_content().trim()
                    ));
                }
            }
            Tag::Blockquote => {
                let flat = el.text_content();
                let flat = WS_RE.replace_all(flat.trim(), " ");
                out.push_str(&format!("\n> {}\n\n", flat));
            }
            Tag::Pre => {
                out.push_str(&format!("\n```\n{}\n```\n\n", el.text_content()));
            }
            Tag::LineBreak => out.push('\n'),
            Tag::Rule => out.push_str("\n---\n\n"),
            Tag::Table => {
                out.push_str(&format!("\n{}\n\n", table::to_markdown_table(el)));
            }
            Tag::Container => {
                let inner = self.children(el, depth)?;
                if !inner.trim().is_empty() {
                    out.push_str(&inner);
                    out.push_str("\n\n");
                }
            }
            Tag::Figcaption => {
                out.push_str(&format!("\n*{}*\n\n", el.text_content().trim()));
            }
            // Structural parts rendered by their parent, and unknown tags,
            // contribute their children unchanged.
            Tag::ListItem
            | Tag::Term
            | Tag::Description
            | Tag::Row
            | Tag::Cell
            | Tag::Other(_) => {
                out.push_str(&self.children(el, depth)?);
            }
        }
        Ok(())
    }
}

/// `## Title` block with the surrounding newlines every heading carries.
pub fn heading(level: u8, text: &str) -> String {
    format!("\n{} {}\n\n", "#".repeat(level as usize), text)
}

fn wrap_inline(out: &mut String, marker: &str, el: &Element) {
    out.push_str(marker);
    out.push_str(el.text_content().trim());
    out.push_str(marker);
}
