use tracing::debug;

use crate::tree::{Element, Node, Tag};

/// The sibling run between the start marker heading and the end marker.
#[derive(Debug, Clone, Copy)]
pub struct Section<'a> {
    pub heading: &'a Element,
    pub nodes: &'a [Node],
}

impl Section<'_> {
    pub fn title(&self) -> String {
        self.heading.text_content().trim().to_string()
    }
}

#[derive(Debug, Clone, Copy)]
pub enum SectionResult<'a> {
    Found(Section<'a>),
    NoStartMarker,
    NoContentBetweenMarkers,
}

/// Locate the section opened by the first heading containing `start` and closed
/// by the first later heading containing `end` (both case-insensitive).
///
/// The section is a contiguous run of the start heading's following siblings.
/// It stops before the sibling that is, or contains, the end heading; without
/// an end heading it runs to the end of the parent.
pub fn find_section<'a>(root: &'a Node, start: &str, end: &str) -> SectionResult<'a> {
    let start = start.to_lowercase();
    let end = end.to_lowercase();

    let mut opened: Option<(&'a [Node], usize)> = None;
    let mut closing: Option<&'a Element> = None;

    // Pre-order walk; each entry is (siblings, index) so the parent slice of a
    // match is at hand.
    let mut stack: Vec<(&'a [Node], usize)> = vec![(std::slice::from_ref(root), 0)];
    while let Some((siblings, idx)) = stack.pop() {
        if idx + 1 < siblings.len() {
            stack.push((siblings, idx + 1));
        }
        let Node::Element(el) = &siblings[idx] else { continue };

        if matches!(el.kind(), Tag::Heading(_)) {
            let text = el.text_content().to_lowercase();
            if opened.is_none() {
                if text.contains(&start) {
                    debug!(heading = %text.trim(), "start marker found");
                    opened = Some((siblings, idx));
                    continue;
                }
            } else if text.contains(&end) {
                debug!(heading = %text.trim(), "end marker found");
                closing = Some(el);
                break;
            }
        }

        if !el.children.is_empty() {
            stack.push((el.children.as_slice(), 0));
        }
    }

    let Some((siblings, idx)) = opened else {
        return SectionResult::NoStartMarker;
    };
    let Node::Element(heading) = &siblings[idx] else {
        return SectionResult::NoStartMarker;
    };

    let following = &siblings[idx + 1..];
    let stop = closing
        .and_then(|end_el| {
            following.iter().position(|n| match n {
                Node::Element(el) => el.contains(end_el),
                Node::Text(_) => false,
            })
        })
        .unwrap_or(following.len());
    let nodes = &following[..stop];

    let has_content = nodes.iter().any(|n| match n {
        Node::Element(_) => true,
        Node::Text(t) => !t.trim().is_empty(),
    });
    debug!(nodes = nodes.len(), has_content, "section collected");

    if has_content {
        SectionResult::Found(Section { heading, nodes })
    } else {
        SectionResult::NoContentBetweenMarkers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::build::*;

    fn found<'a>(result: SectionResult<'a>) -> Section<'a> {
        match result {
            SectionResult::Found(s) => s,
            other => panic!("expected a section, got {:?}", other),
        }
    }

    #[test]
    fn section_between_markers() {
        let body = el(
            "body",
            vec![
                leaf("h1", "Intro"),
                leaf("p", "before"),
                leaf("h2", "Policy"),
                leaf("p", "one"),
                leaf("p", "two"),
                leaf("h2", "Background"),
                leaf("p", "after"),
            ],
        );
        let s = found(find_section(&body, "policy", "background"));
        assert_eq!(s.title(), "Policy");
        assert_eq!(s.nodes.len(), 2);
        assert_eq!(s.nodes[0], leaf("p", "one"));
        assert_eq!(s.nodes[1], leaf("p", "two"));
    }

    #[test]
    fn earlier_end_marker_is_ignored() {
        let body = el(
            "body",
            vec![
                leaf("h2", "Background"),
                leaf("h2", "Policy"),
                leaf("p", "one"),
                leaf("p", "two"),
            ],
        );
        let s = found(find_section(&body, "policy", "background"));
        assert_eq!(s.nodes.len(), 2);
    }

    #[test]
    fn later_end_marker_still_closes() {
        let body = el(
            "body",
            vec![
                leaf("h2", "Background"),
                leaf("h2", "Policy"),
                leaf("p", "one"),
                leaf("h3", "More background"),
                leaf("p", "after"),
            ],
        );
        let s = found(find_section(&body, "policy", "background"));
        assert_eq!(s.nodes, &[leaf("p", "one")][..]);
    }

    #[test]
    fn first_start_marker_wins() {
        let body = el(
            "body",
            vec![
                leaf("h2", "Privacy Policy"),
                leaf("p", "first"),
                leaf("h2", "Refund policy"),
                leaf("p", "second"),
            ],
        );
        let s = found(find_section(&body, "policy", "background"));
        assert_eq!(s.title(), "Privacy Policy");
        // No end marker: runs to the end of the parent.
        assert_eq!(s.nodes.len(), 3);
    }

    #[test]
    fn marker_match_is_case_insensitive() {
        let body = el(
            "body",
            vec![leaf("h3", "POLICY"), leaf("p", "x"), leaf("h3", "BACKGROUND")],
        );
        let s = found(find_section(&body, "Policy", "Background"));
        assert_eq!(s.nodes.len(), 1);
    }

    #[test]
    fn missing_start_marker() {
        let body = el("body", vec![leaf("h2", "Intro"), leaf("p", "text about policy")]);
        assert!(matches!(
            find_section(&body, "policy", "background"),
            SectionResult::NoStartMarker
        ));
    }

    #[test]
    fn adjacent_markers_are_empty() {
        let body = el(
            "body",
            vec![leaf("h2", "Policy"), text("\n  "), leaf("h2", "Background")],
        );
        assert!(matches!(
            find_section(&body, "policy", "background"),
            SectionResult::NoContentBetweenMarkers
        ));
    }

    #[test]
    fn start_marker_last_sibling_is_empty() {
        let body = el("body", vec![el("div", vec![leaf("h2", "Policy")]), leaf("p", "outside")]);
        assert!(matches!(
            find_section(&body, "policy", "background"),
            SectionResult::NoContentBetweenMarkers
        ));
    }

    #[test]
    fn nested_marker_collects_own_siblings_only() {
        let body = el(
            "body",
            vec![
                el(
                    "main",
                    vec![el(
                        "article",
                        vec![leaf("h2", "Policy"), leaf("p", "inside"), leaf("h2", "Background")],
                    )],
                ),
                leaf("p", "outside"),
            ],
        );
        let s = found(find_section(&body, "policy", "background"));
        assert_eq!(s.nodes, &[leaf("p", "inside")][..]);
    }

    #[test]
    fn end_marker_inside_following_sibling_stops_there() {
        let body = el(
            "body",
            vec![
                leaf("h2", "Policy"),
                leaf("p", "kept"),
                el("section", vec![leaf("h2", "Background"), leaf("p", "dropped")]),
            ],
        );
        let s = found(find_section(&body, "policy", "background"));
        assert_eq!(s.nodes, &[leaf("p", "kept")][..]);
    }

    #[test]
    fn section_is_contiguous_slice_of_parent() {
        let body = el(
            "body",
            vec![leaf("h2", "Policy"), leaf("p", "a"), text("loose"), leaf("p", "b")],
        );
        let s = found(find_section(&body, "policy", "background"));
        let parent = &element(&body).children;
        assert!(std::ptr::eq(s.nodes.as_ptr(), parent[1..].as_ptr()));
        assert_eq!(s.nodes.len(), 3);
    }
}
