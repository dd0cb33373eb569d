use std::collections::BTreeMap;
use std::fmt;

use serde::de::value::MapAccessDeserializer;
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// A node of an already-parsed document tree.
///
/// On the wire a text node is a bare JSON string and an element is an object
/// `{"tag": "p", "attrs": {...}, "children": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Node {
    Text(String),
    Element(Element),
}

// Every nesting level is read straight from the input deserializer, never
// from a buffered copy.
impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(NodeVisitor)
    }
}

struct NodeVisitor;

impl<'de> Visitor<'de> for NodeVisitor {
    type Value = Node;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a text string or an element object")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Node, E> {
        Ok(Node::Text(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Node, E> {
        Ok(Node::Text(v))
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Node, A::Error> {
        Element::deserialize(MapAccessDeserializer::new(map)).map(Node::Element)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub tag: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

/// Closed set of tags the converter knows how to render. Anything else is
/// `Other` and passes its children through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tag {
    Heading(u8),
    Paragraph,
    Strong,
    Emphasis,
    Anchor,
    UnorderedList,
    OrderedList,
    ListItem,
    DefinitionList,
    Term,
    Description,
    Blockquote,
    Code,
    Pre,
    LineBreak,
    Rule,
    Table,
    Row,
    Cell,
    Container,
    Figure,
    Figcaption,
    Other(String),
}

impl Tag {
    pub fn parse(name: &str) -> Tag {
        let lower = name.trim().to_ascii_lowercase();
        match lower.as_str() {
            "h1" => Tag::Heading(1),
            "h2" => Tag::Heading(2),
            "h3" => Tag::Heading(3),
            "h4" => Tag::Heading(4),
            "h5" => Tag::Heading(5),
            "h6" => Tag::Heading(6),
            "p" => Tag::Paragraph,
            "strong" | "b" => Tag::Strong,
            "em" | "i" => Tag::Emphasis,
            "a" => Tag::Anchor,
            "ul" => Tag::UnorderedList,
            "ol" => Tag::OrderedList,
            "li" => Tag::ListItem,
            "dl" => Tag::DefinitionList,
            "dt" => Tag::Term,
            "dd" => Tag::Description,
            "blockquote" => Tag::Blockquote,
            "code" => Tag::Code,
            "pre" => Tag::Pre,
            "br" => Tag::LineBreak,
            "hr" => Tag::Rule,
            "table" => Tag::Table,
            "tr" => Tag::Row,
            "td" | "th" => Tag::Cell,
            "div" | "section" | "article" | "main" | "aside" | "header" | "footer" | "nav" => {
                Tag::Container
            }
            "figure" => Tag::Figure,
            "figcaption" => Tag::Figcaption,
            _ => Tag::Other(lower),
        }
    }
}

impl Element {
    pub fn kind(&self) -> Tag {
        Tag::parse(&self.tag)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Flattened text: every text node below `self`, concatenated in document order.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }

    /// Descendant elements (excluding `self`) whose tag satisfies `wanted`, in
    /// document order. Subtrees of elements rejected by `enter` are not searched,
    /// although the rejected element itself can still match.
    pub fn find_descendants(
        &self,
        wanted: impl Fn(&Tag) -> bool,
        enter: impl Fn(&Element) -> bool,
    ) -> Vec<&Element> {
        let mut found = Vec::new();
        let mut stack: Vec<&Node> = self.children.iter().rev().collect();
        while let Some(node) = stack.pop() {
            let Node::Element(el) = node else { continue };
            if wanted(&el.kind()) {
                found.push(el);
            }
            if enter(el) {
                stack.extend(el.children.iter().rev());
            }
        }
        found
    }

    /// True if `self` is `target` or holds it somewhere below.
    pub fn contains(&self, target: &Element) -> bool {
        if std::ptr::eq(self, target) {
            return true;
        }
        let mut stack: Vec<&Node> = self.children.iter().collect();
        while let Some(node) = stack.pop() {
            if let Node::Element(el) = node {
                if std::ptr::eq(el, target) {
                    return true;
                }
                stack.extend(el.children.iter());
            }
        }
        false
    }
}

// Iterative so that deeply nested input cannot overflow the stack here.
fn collect_text(nodes: &[Node], out: &mut String) {
    let mut stack: Vec<&Node> = nodes.iter().rev().collect();
    while let Some(node) = stack.pop() {
        match node {
            Node::Text(t) => out.push_str(t),
            Node::Element(el) => stack.extend(el.children.iter().rev()),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::build::*;
    use super::*;

    #[test]
    fn tag_parse_is_case_insensitive() {
        assert_eq!(Tag::parse("H2"), Tag::Heading(2));
        assert_eq!(Tag::parse("B"), Tag::Strong);
        assert_eq!(Tag::parse("Section"), Tag::Container);
        assert_eq!(Tag::parse("TH"), Tag::Cell);
        assert_eq!(Tag::parse("Span"), Tag::Other("span".to_string()));
    }

    #[test]
    fn text_content_flattens_in_order() {
        let tree = el("p", vec![text("a "), leaf("b", "bold"), text(" c")]);
        assert_eq!(element(&tree).text_content(), "a bold c");
    }

    #[test]
    fn find_descendants_respects_enter() {
        let tree = el(
            "table",
            vec![el(
                "tr",
                vec![el("td", vec![el("table", vec![el("tr", vec![leaf("td", "inner")])])])],
            )],
        );
        let table = element(&tree);
        let all_rows = table.find_descendants(|t| *t == Tag::Row, |_| true);
        assert_eq!(all_rows.len(), 2);
        let own_rows = table.find_descendants(|t| *t == Tag::Row, |e| e.kind() != Tag::Table);
        assert_eq!(own_rows.len(), 1);
    }

    #[test]
    fn attr_lookup_ignores_case() {
        let node = el_attrs("a", &[("HREF", "https://example.com")], vec![text("x")]);
        assert_eq!(element(&node).attr("href"), Some("https://example.com"));
        assert_eq!(element(&node).attr("title"), None);
    }

    #[test]
    fn deserializes_untagged_json() {
        let json = r#"{"tag":"div","children":["hi",{"tag":"a","attrs":{"href":"/x"},"children":["go"]}]}"#;
        let node: Node = serde_json::from_str(json).unwrap();
        let div = element(&node);
        assert_eq!(div.children.len(), 2);
        assert_eq!(div.children[0], text("hi"));
        let a = element(&div.children[1]);
        assert_eq!(a.attr("href"), Some("/x"));
    }

    #[test]
    fn rejects_non_node_json() {
        let err = serde_json::from_str::<Node>("42").unwrap_err();
        assert!(err.to_string().contains("a text string or an element object"));
        assert!(serde_json::from_str::<Node>(r#"{"children": []}"#).is_err());
    }

    #[test]
    fn contains_finds_nested_element() {
        let tree = el("div", vec![el("section", vec![leaf("h2", "Background")])]);
        let div = element(&tree);
        let section = element(&div.children[0]);
        let heading = element(&section.children[0]);
        assert!(div.contains(heading));
        assert!(heading.contains(heading));
        assert!(!heading.contains(div));
    }
}
