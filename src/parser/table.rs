use std::sync::LazyLock;

use regex::Regex;

use crate::tree::{Element, Node, Tag};

static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Rows of escaped cell text, in document order.
pub type TableRows = Vec<Vec<String>>;

/// Render a table element as a pipe table. The first non-empty row becomes the
/// header. Returns an empty string when the table has no non-empty rows.
pub fn to_markdown_table(table: &Element) -> String {
    let rows: TableRows = table_rows(table)
        .into_iter()
        .filter(|row| row.iter().any(|c| !c.trim().is_empty()))
        .collect();

    let Some((header, body)) = rows.split_first() else {
        return String::new();
    };

    let mut out = String::new();
    push_row(&mut out, header);
    let separator = vec!["---".to_string(); header.len()];
    push_row(&mut out, &separator);
    for row in body {
        push_row(&mut out, row);
    }
    out
}

/// Rows that belong to `table` itself; rows of nested tables are not included.
pub fn table_rows(table: &Element) -> TableRows {
    table
        .find_descendants(|t| *t == Tag::Row, not_a_table)
        .into_iter()
        .map(|row| {
            row.find_descendants(|t| *t == Tag::Cell, not_a_table)
                .into_iter()
                .map(cell_text)
                .collect()
        })
        .collect()
}

fn not_a_table(el: &Element) -> bool {
    el.kind() != Tag::Table
}

/// Direct text children verbatim, plus the flattened text of every direct
/// element child that is not a table.
fn cell_text(cell: &Element) -> String {
    let mut raw = String::new();
    for child in &cell.children {
        match child {
            Node::Text(t) => raw.push_str(t),
            Node::Element(el) if el.kind() == Tag::Table => {}
            Node::Element(el) => {
                raw.push(' ');
                raw.push_str(&el.text_content());
            }
        }
    }
    let collapsed = WS_RE.replace_all(&raw, " ");
    let escaped = collapsed.trim().replace('|', "\\|");
    if escaped.is_empty() {
        " ".to_string()
    } else {
        escaped
    }
}

fn push_row(out: &mut String, cells: &[String]) {
    out.push('|');
    for cell in cells {
        out.push(' ');
        out.push_str(cell);
        out.push_str(" |");
    }
    out.push('\n');
}
