//! Line wrapping and page breaking for monospaced text

use crate::config::{LayoutConfig, TAB_WIDTH};
use crate::domain::Page;

/// Lines of one physical page, already wrapped to the line width
pub type Sheet = Vec<String>;

/// Expand tabs to the next multiple of [`TAB_WIDTH`].
pub fn expand_tabs(line: &str) -> String {
    if !line.contains('\t') {
        return line.to_string();
    }
    let mut out = String::with_capacity(line.len() + TAB_WIDTH);
    let mut column = 0;
    for ch in line.chars() {
        if ch == '\t' {
            let pad = TAB_WIDTH - column % TAB_WIDTH;
            out.extend(std::iter::repeat(' ').take(pad));
            column += pad;
        } else {
            out.push(ch);
            column += 1;
        }
    }
    out
}

/// Hard-wrap `line` every `width` characters. An empty line stays one empty line.
pub fn wrap_line(line: &str, width: usize) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    if chars.is_empty() || width == 0 {
        return vec![String::new()];
    }
    chars.chunks(width).map(|chunk| chunk.iter().collect()).collect()
}

/// Split on `\n`, `\r\n` and lone `\r`. A trailing line break adds no empty line.
pub fn body_lines(body: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = body;
    while !rest.is_empty() {
        match rest.find(['\r', '\n']) {
            Some(idx) => {
                lines.push(&rest[..idx]);
                let skip = if rest[idx..].starts_with("\r\n") { 2 } else { 1 };
                rest = &rest[idx + skip..];
            }
            None => {
                lines.push(rest);
                break;
            }
        }
    }
    lines
}

/// Header, blank separator, then the body, all wrapped to `width`.
pub fn page_lines(page: &Page, width: usize) -> Vec<String> {
    let mut lines = wrap_line(&expand_tabs(&page.header), width);
    lines.push(String::new());
    for line in body_lines(&page.body) {
        lines.extend(wrap_line(&expand_tabs(line), width));
    }
    lines
}

/// Lay out one logical page onto as many sheets as it needs.
///
/// Every logical page starts on a fresh sheet.
pub fn paginate(page: &Page, layout: &LayoutConfig) -> Vec<Sheet> {
    let lines = page_lines(page, layout.chars_per_line());
    lines.chunks(layout.lines_per_page().max(1)).map(<[String]>::to_vec).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(body: &str) -> Page {
        Page { header: "// File: a.kt".to_string(), body: body.to_string() }
    }

    #[test]
    fn tabs_expand_to_stops() {
        assert_eq!(expand_tabs("\tx"), "    x");
        assert_eq!(expand_tabs("ab\tc"), "ab  c");
        assert_eq!(expand_tabs("none"), "none");
    }

    #[test]
    fn long_lines_wrap_at_width() {
        assert_eq!(wrap_line("abcdefg", 3), vec!["abc", "def", "g"]);
        assert_eq!(wrap_line("", 3), vec![""]);
        assert_eq!(wrap_line("héllo", 2), vec!["hé", "ll", "o"]);
    }

    #[test]
    fn header_is_followed_by_blank_line_and_body() {
        let lines = page_lines(&page("fun main() {}\n\nclass B\n"), 80);
        assert_eq!(lines, vec!["// File: a.kt", "", "fun main() {}", "", "class B"]);
    }

    #[test]
    fn crlf_line_endings_are_normalised() {
        let lines = page_lines(&page("a\r\nb\r\n"), 80);
        assert_eq!(lines, vec!["// File: a.kt", "", "a", "b"]);
    }

    #[test]
    fn lone_carriage_returns_break_lines() {
        assert_eq!(body_lines("a\rb\r"), vec!["a", "b"]);
        assert_eq!(body_lines("a\r\rb"), vec!["a", "", "b"]);
        assert_eq!(body_lines("a\n\nb\r\n"), vec!["a", "", "b"]);
        assert!(body_lines("").is_empty());

        let lines = page_lines(&page("fun a()\rfun b()\r"), 80);
        assert_eq!(lines, vec!["// File: a.kt", "", "fun a()", "fun b()"]);
    }

    #[test]
    fn overflowing_pages_break_onto_new_sheets() {
        let layout = LayoutConfig::default();
        let per_page = layout.lines_per_page();
        let body: String = (0..per_page * 2).map(|i| format!("line {i}\n")).collect();

        let sheets = paginate(&page(&body), &layout);
        // header + blank + 2 * per_page body lines
        assert_eq!(sheets.len(), 3);
        assert_eq!(sheets[0].len(), per_page);
        assert_eq!(sheets[0][0], "// File: a.kt");
        assert_eq!(sheets[2].len(), 2);
    }

    #[test]
    fn short_page_fits_one_sheet() {
        let sheets = paginate(&page("class B"), &LayoutConfig::default());
        let expected = vec!["// File: a.kt".to_string(), String::new(), "class B".to_string()];
        assert_eq!(sheets, vec![expected]);
    }
}
