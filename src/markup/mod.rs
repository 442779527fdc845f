//! Inline styling for record content.
//!
//! Record content is a small HTML subset: `<b>`/`<strong>`, `<i>`/`<em>` and `<u>`
//! carry styles, every other element is an inert container. [`parse_markup`] turns
//! that into [`StyledSpan`]s for rendering and [`apply_style`] wraps a selection
//! while editing.

mod lexer;

use crate::util::utf16_to_byte_idx;
use lexer::{decode_entities, tokenize, Token};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strum::{Display, EnumIter};

#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Display,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Style {
    Bold,
    Italic,
    Underline,
}

impl Style {
    /// Style contributed by an element, if any. `name` must already be lowercase.
    pub fn from_tag_name(name: &str) -> Option<Self> {
        match name {
            "b" | "strong" => Some(Self::Bold),
            "i" | "em" => Some(Self::Italic),
            "u" => Some(Self::Underline),
            _ => None,
        }
    }

    /// Canonical opening tag written by the editor.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Bold => "<b>",
            Self::Italic => "<i>",
            Self::Underline => "<u>",
        }
    }
}

pub type StyleSet = BTreeSet<Style>;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct StyledSpan {
    pub text: String,
    pub styles: StyleSet,
}

impl StyledSpan {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            styles: StyleSet::new(),
        }
    }

    pub fn has(&self, style: Style) -> bool {
        self.styles.contains(&style)
    }
}

/// Elements that never have content, so an unclosed `<br>` must not swallow what follows.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

struct OpenElement {
    name: String,
    style: Option<Style>,
}

/// Decode markup into styled spans, in reading order.
///
/// Each text node becomes one span whose style set is the union of the styles of all
/// enclosing elements. Never fails: anything that is not a well-formed tag is text,
/// stray closing tags are ignored and unclosed elements run to the end of the input.
pub fn parse_markup(markup: &str) -> Vec<StyledSpan> {
    let mut out: Vec<StyledSpan> = Vec::new();
    let mut stack: Vec<OpenElement> = Vec::new();

    for tok in tokenize(markup) {
        match tok {
            Token::Text(raw) => {
                let text = decode_entities(&raw);
                if text.is_empty() {
                    continue;
                }
                let styles = stack.iter().filter_map(|e| e.style).collect::<StyleSet>();
                out.push(StyledSpan { text, styles });
            }
            Token::Open { name, self_closing } => {
                if self_closing || VOID_ELEMENTS.contains(&name.as_str()) {
                    continue;
                }
                let style = Style::from_tag_name(&name);
                stack.push(OpenElement { name, style });
            }
            Token::Close(name) => {
                // Closing an outer element implicitly closes anything opened inside it.
                if let Some(pos) = stack.iter().rposition(|e| e.name == name) {
                    stack.truncate(pos);
                }
            }
        }
    }

    out
}

/// Text with all markup removed.
pub fn plain_text(markup: &str) -> String {
    parse_markup(markup)
        .into_iter()
        .map(|s| s.text)
        .collect::<String>()
}

/// Wrap `text[selection_start..selection_end]` in `tag` and its closing counterpart.
///
/// Offsets are UTF-16 code units. They are clamped to the text and swapped if reversed.
/// An empty selection inserts an empty pair at the cursor. Applying the same style twice
/// nests the tags again; decoding still yields the right style set.
pub fn apply_style(text: &str, selection_start: usize, selection_end: usize, tag: &str) -> String {
    let Some(name) = tag_name(tag) else {
        return text.to_string();
    };

    // Keep a complete opening tag (attributes included); anything else is rebuilt.
    let trimmed = tag.trim();
    let open = if trimmed.starts_with('<') && trimmed.ends_with('>') && !trimmed.ends_with("/>") {
        trimmed.to_string()
    } else {
        format!("<{name}>")
    };
    let close = format!("</{name}>");

    let (lo, hi) = if selection_start <= selection_end {
        (selection_start, selection_end)
    } else {
        (selection_end, selection_start)
    };
    let start = utf16_to_byte_idx(text, lo);
    let end = utf16_to_byte_idx(text, hi);

    let mut out = String::with_capacity(text.len() + open.len() + close.len());
    out.push_str(&text[..start]);
    out.push_str(&open);
    out.push_str(&text[start..end]);
    out.push_str(&close);
    out.push_str(&text[end..]);
    out
}

/// Element name of `"<b>"`, `"<span class=x>"` or a bare `"u"`.
fn tag_name(tag: &str) -> Option<&str> {
    let inner = tag
        .trim()
        .trim_start_matches('<')
        .trim_end_matches('>')
        .trim_end_matches('/');
    let name = inner.split_whitespace().next()?;
    if name.is_empty() || name.starts_with('/') {
        None
    } else {
        Some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    fn span(text: &str, styles: &[Style]) -> StyledSpan {
        StyledSpan {
            text: text.to_string(),
            styles: styles.iter().copied().collect(),
        }
    }

    #[test]
    fn test_parse_bold_then_plain() {
        assert_eq!(
            parse_markup("<b>hi</b> there"),
            vec![span("hi", &[Style::Bold]), span(" there", &[])]
        );
    }

    #[test]
    fn test_parse_nested_styles_merge() {
        assert_eq!(
            parse_markup("<b><i>x</i></b>"),
            vec![span("x", &[Style::Bold, Style::Italic])]
        );
    }

    #[test]
    fn test_parse_aliases_and_underline() {
        assert_eq!(
            parse_markup("<strong>a</strong><em>b</em><u>c</u>"),
            vec![
                span("a", &[Style::Bold]),
                span("b", &[Style::Italic]),
                span("c", &[Style::Underline]),
            ]
        );
    }

    #[test]
    fn test_parse_siblings_do_not_leak() {
        assert_eq!(
            parse_markup("<b>one</b><i>two</i>three"),
            vec![
                span("one", &[Style::Bold]),
                span("two", &[Style::Italic]),
                span("three", &[]),
            ]
        );
    }

    #[test]
    fn test_parse_unknown_tags_are_containers() {
        assert_eq!(
            parse_markup("<p>a <span><b>b</b></span></p>"),
            vec![span("a ", &[]), span("b", &[Style::Bold])]
        );
    }

    #[test]
    fn test_parse_mixed_depths_in_document_order() {
        assert_eq!(
            parse_markup("x<b>y<i>z</i>w</b>v"),
            vec![
                span("x", &[]),
                span("y", &[Style::Bold]),
                span("z", &[Style::Bold, Style::Italic]),
                span("w", &[Style::Bold]),
                span("v", &[]),
            ]
        );
    }

    #[test]
    fn test_parse_malformed_degrades_to_text() {
        assert_eq!(parse_markup("a < b"), vec![span("a < b", &[])]);
        assert_eq!(parse_markup("</b>plain"), vec![span("plain", &[])]);
        assert_eq!(
            parse_markup("<b>open to end"),
            vec![span("open to end", &[Style::Bold])]
        );
        assert_eq!(parse_markup(""), Vec::<StyledSpan>::new());
    }

    #[test]
    fn test_parse_misnested_close_pops_inner() {
        // </b> closes the <i> opened inside it as well.
        assert_eq!(
            parse_markup("<b><i>x</b>y</i>z"),
            vec![span("x", &[Style::Bold, Style::Italic]), span("y", &[]), span("z", &[])]
        );
    }

    #[test]
    fn test_parse_void_and_entities() {
        assert_eq!(
            parse_markup("<b>a<br>b &amp; c</b>"),
            vec![span("a", &[Style::Bold]), span("b & c", &[Style::Bold])]
        );
    }

    #[test]
    fn test_parse_redundant_nesting_is_still_one_style() {
        assert_eq!(parse_markup("<b><b>x</b></b>"), vec![span("x", &[Style::Bold])]);
    }

    #[test]
    fn test_style_tags_decode_to_their_style() {
        for style in Style::iter() {
            let name = style.tag().trim_matches(|c| c == '<' || c == '>');
            assert_eq!(Style::from_tag_name(name), Some(style));

            let spans = parse_markup(&apply_style("x", 0, 1, style.tag()));
            assert!(spans[0].has(style));
            assert_eq!(spans[0].styles.len(), 1);
        }
    }

    #[test]
    fn test_plain_span_has_no_styles() {
        let s = StyledSpan::plain("x");
        assert_eq!(parse_markup("x"), vec![s.clone()]);
        assert!(Style::iter().all(|style| !s.has(style)));
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(plain_text("<b>hello</b> <i>world</i>"), "hello world");
    }

    #[test]
    fn test_apply_style_wraps_selection() {
        assert_eq!(apply_style("hello world", 0, 5, "<b>"), "<b>hello</b> world");
        assert_eq!(apply_style("hello world", 6, 11, "<i>"), "hello <i>world</i>");
    }

    #[test]
    fn test_apply_style_empty_selection_inserts_pair() {
        assert_eq!(apply_style("abc", 1, 1, "<u>"), "a<u></u>bc");
    }

    #[test]
    fn test_apply_style_twice_nests() {
        let once = apply_style("hello", 0, 5, "<b>");
        let twice = apply_style(&once, 0, once.encode_utf16().count(), "<b>");
        assert_eq!(twice, "<b><b>hello</b></b>");
        assert_eq!(parse_markup(&twice), vec![span("hello", &[Style::Bold])]);
    }

    #[test]
    fn test_apply_style_clamps_and_swaps() {
        assert_eq!(apply_style("abc", 2, 99, "<b>"), "ab<b>c</b>");
        assert_eq!(apply_style("abc", 2, 0, "<b>"), "<b>ab</b>c");
    }

    #[test]
    fn test_apply_style_utf16_offsets() {
        // "😀" is two UTF-16 units.
        assert_eq!(apply_style("😀ok", 2, 4, "<i>"), "😀<i>ok</i>");
    }

    #[test]
    fn test_apply_style_bare_name_and_style_tag() {
        assert_eq!(apply_style("ab", 0, 1, "u"), "<u>a</u>b");
        assert_eq!(apply_style("ab", 0, 2, Style::Italic.tag()), "<i>ab</i>");
        assert_eq!(apply_style("ab", 0, 2, ""), "ab");
        assert_eq!(apply_style("ab", 0, 2, "<u/>"), "<u>ab</u>");
    }

    #[test]
    fn test_apply_style_unterminated_tag_is_rebuilt() {
        let styled = apply_style("hello", 0, 5, "<b");
        assert_eq!(styled, "<b>hello</b>");
        assert_eq!(parse_markup(&styled), vec![span("hello", &[Style::Bold])]);
    }

    #[test]
    fn test_apply_style_keeps_attributes() {
        let styled = apply_style("hi", 0, 2, r#"<b class="x">"#);
        assert_eq!(styled, r#"<b class="x">hi</b>"#);
        assert!(parse_markup(&styled)[0].has(Style::Bold));
    }
}
