#![forbid(unsafe_code)]

//! Paste handling.
//!
//! Pasted text that looks like markdown is parsed and inserted as blocks;
//! anything else goes in as literal text. Detection is a cheap byte scan,
//! run on every paste.

use crate::editor::{RichTextEngine, Selection};
use crate::error::DocError;
use crate::parse::parse_blocks;

/// Result of [`is_likely_markdown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkdownDetection {
    /// Number of markdown indicators found.
    pub indicators: u8,
}

impl MarkdownDetection {
    /// Two or more indicators.
    #[must_use]
    pub const fn is_likely(self) -> bool {
        self.indicators >= 2
    }

    /// Four or more indicators.
    #[must_use]
    pub const fn is_confident(self) -> bool {
        self.indicators >= 4
    }

    /// Score from 0.0 to 1.0.
    #[must_use]
    pub fn confidence(self) -> f32 {
        (f32::from(self.indicators) / 6.0).min(1.0)
    }
}

/// Stop scanning once this many indicators are found.
const ENOUGH: u8 = 6;

/// Count markdown indicators in `text`: headings, quotes, list and task
/// markers, table rows and rules at line starts; fences, code spans,
/// emphasis, strike, highlight, links and sub/sup tags anywhere.
///
/// ```
/// use quire_markdown::is_likely_markdown;
///
/// assert!(is_likely_markdown("# Hello\n**bold**").is_likely());
/// assert!(!is_likely_markdown("just plain text").is_likely());
/// assert!(is_likely_markdown("```rust\ncode\n```").is_confident());
/// ```
#[must_use]
pub fn is_likely_markdown(text: &str) -> MarkdownDetection {
    let bytes = text.as_bytes();
    let mut indicators: u8 = 0;

    for line in text.lines() {
        indicators = indicators.saturating_add(line_start_indicators(line.as_bytes()));
        if indicators >= ENOUGH {
            return MarkdownDetection { indicators };
        }
    }

    let mut i = 0;
    while i < bytes.len() && indicators < ENOUGH {
        let rest = &bytes[i..];
        let (found, skip) = match rest {
            [b'`', b'`', b'`', ..] => (2, 3),
            [b'`', ..] => (1, 1),
            [b'*', b'*', ..] | [b'_', b'_', ..] | [b'~', b'~', ..] | [b'=', b'=', ..] => (1, 2),
            [b'*', ..] if i > 0 && !bytes[i - 1].is_ascii_whitespace() => (1, 1),
            [b'[', b' ' | b'x' | b'X', b']', ..] => (1, 3),
            [b'[', ..] if closes_link(&rest[1..]) => (1, 1),
            [b'<', ..] if is_inline_tag(&rest[1..]) => (1, 1),
            _ => (0, 1),
        };
        indicators = indicators.saturating_add(found);
        i += skip;
    }
    MarkdownDetection { indicators }
}

fn line_start_indicators(line: &[u8]) -> u8 {
    match line {
        [b'#', ..] | [b'>', ..] | [b'|', ..] => 1,
        [b'-', b'-', b'-', ..] => 1,
        [b'-' | b'*' | b'+', b' ', ..] => 1,
        [digit, b'.' | b')', b' ', ..] if digit.is_ascii_digit() => 1,
        _ => 0,
    }
}

/// `](` before the end of the line, within a short distance.
fn closes_link(after_bracket: &[u8]) -> bool {
    after_bracket
        .iter()
        .take(100)
        .take_while(|b| **b != b'\n')
        .zip(after_bracket.iter().skip(1))
        .any(|(close, open)| *close == b']' && *open == b'(')
}

fn is_inline_tag(after_lt: &[u8]) -> bool {
    const TAGS: [&[u8]; 6] = [b"sub>", b"sup>", b"mark>", b"br", b"/sub>", b"/sup>"];
    TAGS.iter().any(|tag| after_lt.starts_with(tag))
}

/// How a paste was inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasteKind {
    Structured,
    Plain,
}

/// Replace the selection with pasted `text` and put the cursor after it.
pub fn paste<E: RichTextEngine + ?Sized>(engine: &mut E, text: &str) -> Result<PasteKind, DocError> {
    let selection = engine.selection();
    let (from, to) = (selection.from(), selection.to());
    engine.delete_range(from, to)?;
    let before = engine.document().len();

    let blocks = if is_likely_markdown(text).is_likely() {
        parse_blocks(text)
    } else {
        Vec::new()
    };
    let kind = if blocks.is_empty() {
        engine.insert_text(from, text)?;
        PasteKind::Plain
    } else {
        engine.insert_blocks(from, blocks)?;
        PasteKind::Structured
    };

    let end = from + engine.document().len().saturating_sub(before);
    engine.set_selection(Selection::cursor(end))?;
    tracing::debug!(?kind, from, end, "pasted");
    Ok(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::MarkdownEditor;

    #[test]
    fn plain_prose_is_not_markdown() {
        let detection = is_likely_markdown("Meeting moved to 3pm, see you there.");
        assert_eq!(detection.indicators, 0);
        assert!(!detection.is_likely());
        assert_eq!(detection.confidence(), 0.0);
    }

    #[test]
    fn block_markers_count_per_line() {
        let detection = is_likely_markdown("# Title\n- one\n- two\n> quote");
        assert_eq!(detection.indicators, 4);
        assert!(detection.is_confident());
    }

    #[test]
    fn inline_markers_count() {
        assert!(is_likely_markdown("some **bold** and `code`").is_likely());
        assert!(is_likely_markdown("a [link](x) and ==mark==").is_likely());
        assert!(is_likely_markdown("H<sub>2</sub>O").is_likely());
        assert!(!is_likely_markdown("2 * 3 = 6").is_likely());
    }

    #[test]
    fn markdown_paste_inserts_structure() {
        let mut editor = MarkdownEditor::from_markdown("start end\n");
        editor.set_selection(Selection::cursor(6)).expect("cursor");
        let kind = paste(&mut editor, "**bold** and `code`").expect("paste");
        assert_eq!(kind, PasteKind::Structured);
        assert_eq!(editor.to_markdown(), "start **bold** and `code`end\n");
        assert_eq!(editor.selection(), Selection::cursor(19));
    }

    #[test]
    fn plain_paste_replaces_the_selection() {
        let mut editor = MarkdownEditor::from_markdown("hello world\n");
        editor.set_selection(Selection::new(6, 11)).expect("select");
        let kind = paste(&mut editor, "there").expect("paste");
        assert_eq!(kind, PasteKind::Plain);
        assert_eq!(editor.to_markdown(), "hello there\n");
        assert_eq!(editor.selection(), Selection::cursor(11));
    }

    #[test]
    fn multi_block_paste_splits_the_paragraph() {
        let mut editor = MarkdownEditor::from_markdown("ab\n");
        editor.set_selection(Selection::cursor(1)).expect("cursor");
        paste(&mut editor, "# Head\n\n- item\n- item two\n").expect("paste");
        assert_eq!(
            editor.to_markdown(),
            "a\n\n# Head\n\n- item\n- item two\n\nb\n"
        );
    }
}
