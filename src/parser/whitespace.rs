use std::sync::LazyLock;

use regex::Regex;

static BLANK_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n(?:[ \t]*\n){2,}").unwrap());
static SPACE_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]{2,}").unwrap());

/// Clean up assembled Markdown: at most one blank line between blocks, single
/// spaces, no indentation after a newline, no leading/trailing whitespace.
///
/// Idempotent: `normalize(&normalize(s)) == normalize(s)`.
pub fn normalize(text: &str) -> String {
    let text = BLANK_RUN_RE.replace_all(text, "\n\n");
    let text = SPACE_RUN_RE.replace_all(&text, " ");
    let text = text.replace("\n ", "\n");
    let text = BLANK_RUN_RE.replace_all(&text, "\n\n");
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn collapses_blank_lines() {
        assert_eq!(normalize("a\n\n\n\nb"), "a\n\nb");
        assert_eq!(normalize("a\n \n\t\n b"), "a\n\nb");
    }

    #[test]
    fn keeps_paragraph_breaks() {
        assert_eq!(normalize("a\n\nb\nc"), "a\n\nb\nc");
    }

    #[test]
    fn collapses_spaces_and_strips_indent() {
        assert_eq!(normalize("a   b\t\tc"), "a b c");
        assert_eq!(normalize("x\n   y"), "x\ny");
    }

    #[test]
    fn indented_blank_lines_collapse() {
        assert_eq!(normalize("a\n \n \n b"), "a\n\nb");
    }

    #[test]
    fn trims_whole_text() {
        assert_eq!(normalize("\n\n  # Title\n\n"), "# Title");
        assert_eq!(normalize("   "), "");
    }

    proptest! {
        #[test]
        fn idempotent(s in "[a-c \t\n|*#-]{0,64}") {
            let once = normalize(&s);
            prop_assert_eq!(normalize(&once), once);
        }

        #[test]
        fn idempotent_any_text(s in ".{0,64}") {
            let once = normalize(&s);
            prop_assert_eq!(normalize(&once), once);
        }
    }
}
