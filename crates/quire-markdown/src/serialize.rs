#![forbid(unsafe_code)]

//! [`Document`] to canonical markdown.
//!
//! The output is the form [`parse_markdown`](crate::parse_markdown) reads
//! back to the same document: blocks separated by one blank line, `-`
//! bullets, `**`/`*`/`~~`/`==` delimiters, fenced code, `<sub>`/`<sup>`
//! inline HTML, and a single trailing newline. Comment anchors are not part
//! of the markdown; comment records carry them.

use crate::document::{Alignment, Block, Document, Inline, List, Table};
use crate::marks::{Link, MarkSet, Marks};
use quire_core::CommentId;

/// Serialize a document.
#[must_use]
pub fn to_markdown(doc: &Document) -> String {
    let mut out = blocks_markdown(doc.blocks(), false);
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

// ---------------------------------------------------------------------------
// Inline walk shared with the HTML renderer
// ---------------------------------------------------------------------------

/// A wrapper opened or closed around inline content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Wrap {
    Link(Link),
    Style(MarkSet),
    Comment(CommentId),
}

pub(crate) enum Piece<'a> {
    Open(Wrap),
    Close(Wrap),
    Text { text: &'a str, code: bool },
    Image(&'a Inline),
    HardBreak,
}

fn wraps_of(marks: &Marks, with_comments: bool) -> Vec<Wrap> {
    let mut wraps = Vec::new();
    if with_comments {
        wraps.extend(marks.comments.iter().copied().map(Wrap::Comment));
    }
    if let Some(link) = &marks.link {
        wraps.push(Wrap::Link(link.clone()));
    }
    wraps.extend(
        MarkSet::ORDER
            .into_iter()
            .filter(|flag| marks.style.contains(*flag))
            .map(Wrap::Style),
    );
    wraps
}

/// Walk inlines as properly nested open/close pieces. Wrappers shared with
/// the previous inline stay open.
pub(crate) fn walk_inlines<'a>(
    inlines: &'a [Inline],
    with_comments: bool,
    mut emit: impl FnMut(Piece<'a>),
) {
    let mut open: Vec<Wrap> = Vec::new();
    for inline in inlines {
        let wanted = match inline.marks() {
            Some(marks) => wraps_of(marks, with_comments),
            None => open.clone(),
        };
        let keep = open
            .iter()
            .zip(&wanted)
            .take_while(|(open, wanted)| open == wanted)
            .count();
        while open.len() > keep {
            if let Some(wrap) = open.pop() {
                emit(Piece::Close(wrap));
            }
        }
        for wrap in &wanted[keep..] {
            emit(Piece::Open(wrap.clone()));
            open.push(wrap.clone());
        }
        match inline {
            Inline::Text { text, marks } => emit(Piece::Text {
                text,
                code: marks.style.contains(MarkSet::CODE),
            }),
            Inline::Image { .. } => emit(Piece::Image(inline)),
            Inline::HardBreak => emit(Piece::HardBreak),
        }
    }
    while let Some(wrap) = open.pop() {
        emit(Piece::Close(wrap));
    }
}

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

fn blocks_markdown(blocks: &[Block], tight: bool) -> String {
    let separator = if tight { "\n" } else { "\n\n" };
    blocks
        .iter()
        .filter(|block| !matches!(block, Block::Paragraph { content } if content.is_empty()))
        .map(block_markdown)
        .collect::<Vec<_>>()
        .join(separator)
}

fn block_markdown(block: &Block) -> String {
    match block {
        Block::Heading { level, content } => {
            let hashes = "#".repeat(usize::from((*level).clamp(1, 6)));
            let text = inline_markdown(content, Context::Heading);
            if text.is_empty() {
                hashes
            } else {
                format!("{hashes} {text}")
            }
        }
        Block::Paragraph { content } => inline_markdown(content, Context::Body),
        Block::CodeBlock { language, code } => {
            let fence = "`".repeat(longest_run(code, '`').max(2) + 1);
            let language = language.as_deref().unwrap_or("");
            if code.is_empty() {
                format!("{fence}{language}\n{fence}")
            } else {
                format!("{fence}{language}\n{code}\n{fence}")
            }
        }
        Block::BlockQuote { blocks } => prefix_lines(&blocks_markdown(blocks, false), "> ", ">"),
        Block::List(list) => list_markdown(list),
        Block::Table(table) => table_markdown(table),
        Block::Rule => "---".to_string(),
    }
}

fn list_markdown(list: &List) -> String {
    let items: Vec<String> = list
        .items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let marker = match list.start {
                Some(start) => format!("{}{} ", start + i as u64, list.delimiter.as_char()),
                None => "- ".to_string(),
            };
            let task = match item.checked {
                Some(true) => "[x] ",
                Some(false) => "[ ] ",
                None => "",
            };
            let body = blocks_markdown(&item.blocks, list.tight);
            let indent = " ".repeat(marker.len());
            let mut lines = body.lines();
            let first = lines.next().unwrap_or("");
            let mut out = format!("{marker}{task}{first}").trim_end().to_string();
            for line in lines {
                out.push('\n');
                if !line.is_empty() {
                    out.push_str(&indent);
                    out.push_str(line);
                }
            }
            out
        })
        .collect();
    items.join(if list.tight { "\n" } else { "\n\n" })
}

fn table_markdown(table: &Table) -> String {
    let row = |cells: &[Vec<Inline>]| {
        let cells: Vec<String> = cells
            .iter()
            .map(|cell| inline_markdown(cell, Context::Cell))
            .collect();
        format!("| {} |", cells.join(" | "))
    };
    let columns = table.header.len();
    let delimiter: Vec<&str> = (0..columns)
        .map(|i| match table.alignments.get(i).copied().unwrap_or_default() {
            Alignment::None => "---",
            Alignment::Left => ":--",
            Alignment::Center => ":-:",
            Alignment::Right => "--:",
        })
        .collect();
    let mut lines = vec![row(&table.header), format!("| {} |", delimiter.join(" | "))];
    lines.extend(table.rows.iter().map(|cells| row(cells)));
    lines.join("\n")
}

fn prefix_lines(text: &str, prefix: &str, empty_prefix: &str) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                empty_prefix.to_string()
            } else {
                format!("{prefix}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Inlines
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    Body,
    Heading,
    Cell,
}

impl Context {
    /// Whether line breaks have to be flattened to spaces.
    const fn single_line(self) -> bool {
        !matches!(self, Self::Body)
    }
}

fn inline_markdown(inlines: &[Inline], context: Context) -> String {
    let inlines = expel_whitespace(inlines);
    let mut out = String::new();
    walk_inlines(&inlines, false, |piece| match piece {
        Piece::Open(wrap) => out.push_str(open_delimiter(&wrap)),
        Piece::Close(wrap) => out.push_str(&close_delimiter(&wrap)),
        Piece::Text { text, code: true } => out.push_str(&code_span(text, context)),
        Piece::Text { text, code: false } => {
            let text = if context.single_line() {
                text.replace('\n', " ")
            } else {
                text.to_string()
            };
            let at_line_start = out.is_empty() || out.ends_with('\n');
            out.push_str(&escape_text(&text, at_line_start));
        }
        Piece::Image(Inline::Image { src, alt, title, .. }) => {
            out.push_str("![");
            out.push_str(&escape_text(alt, false));
            out.push_str("](");
            out.push_str(&destination(src, title));
            out.push(')');
        }
        Piece::Image(_) => {}
        Piece::HardBreak => {
            if context.single_line() {
                out.push(' ');
            } else {
                out.push_str("\\\n");
            }
        }
    });
    out
}

fn open_delimiter(wrap: &Wrap) -> &'static str {
    match wrap {
        Wrap::Link(_) => "[",
        Wrap::Style(flag) => style_delimiters(*flag).0,
        Wrap::Comment(_) => "",
    }
}

fn close_delimiter(wrap: &Wrap) -> String {
    match wrap {
        Wrap::Link(link) => format!("]({})", destination(&link.href, &link.title)),
        Wrap::Style(flag) => style_delimiters(*flag).1.to_string(),
        Wrap::Comment(_) => String::new(),
    }
}

fn style_delimiters(flag: MarkSet) -> (&'static str, &'static str) {
    if flag == MarkSet::BOLD {
        ("**", "**")
    } else if flag == MarkSet::ITALIC {
        ("*", "*")
    } else if flag == MarkSet::STRIKE {
        ("~~", "~~")
    } else if flag == MarkSet::HIGHLIGHT {
        ("==", "==")
    } else if flag == MarkSet::SUPERSCRIPT {
        ("<sup>", "</sup>")
    } else if flag == MarkSet::SUBSCRIPT {
        ("<sub>", "</sub>")
    } else {
        ("", "")
    }
}

fn destination(href: &str, title: &str) -> String {
    let href = if href.contains([' ', '(', ')']) {
        format!("<{href}>")
    } else {
        href.to_string()
    };
    if title.is_empty() {
        href
    } else {
        format!("{href} \"{}\"", title.replace('"', "\\\""))
    }
}

fn code_span(text: &str, context: Context) -> String {
    let text = if context.single_line() {
        text.replace('\n', " ")
    } else {
        text.to_string()
    };
    let text = if context == Context::Cell {
        text.replace('|', "\\|")
    } else {
        text
    };
    let fence = "`".repeat(longest_run(&text, '`') + 1);
    let pad = text.starts_with('`')
        || text.ends_with('`')
        || (text.starts_with(' ') && text.ends_with(' ') && !text.trim().is_empty());
    let pad = if pad { " " } else { "" };
    format!("{fence}{pad}{text}{pad}{fence}")
}

fn longest_run(text: &str, ch: char) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in text.chars() {
        if c == ch {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

/// Backslash-escape characters that would otherwise read as markup.
///
/// Only characters that could change the parse get a backslash, so ordinary
/// prose (`2 * 3`, `snake_case`, `a & b`, `<tag>`) is written as is. The
/// text around a piece is unknown, so characters at either edge are treated
/// as if they touched markup.
fn escape_text(text: &str, at_line_start: bool) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    for (i, &c) in chars.iter().enumerate() {
        let prev = i.checked_sub(1).map(|j| chars[j]);
        let next = chars.get(i + 1).copied();
        let line_head = || at_line_head(&chars, i, at_line_start);
        let escape = match c {
            '\\' => next.is_none_or(|n| n == '\n' || n.is_ascii_punctuation()),
            '`' | '~' | '|' => true,
            '*' | '_' => {
                let (run_start, run_end) = run_bounds(&chars, i);
                let before = run_start.checked_sub(1).map(|j| chars[j]);
                let after = chars.get(run_end).copied();
                let inert = match (before, after) {
                    (Some(b), Some(a)) if is_blank(b) && is_blank(a) => true,
                    (Some(b), Some(a)) => c == '_' && b.is_alphanumeric() && a.is_alphanumeric(),
                    _ => false,
                };
                !inert || at_line_head(&chars, run_start, at_line_start)
            }
            '[' => next == Some('^') || line_head() || !closes_plainly(&chars, i),
            ']' => next.is_none_or(|n| matches!(n, '(' | '[' | ':')),
            '<' => opens_html(&chars[i + 1..]) && (line_head() || recognized_tag(&chars[i..])),
            '&' => starts_entity(&chars[i + 1..]),
            '=' => prev == Some('=') || next == Some('='),
            '#' | '>' | '-' | '+' => line_head(),
            '.' | ')' => {
                // `12.` at the start of a line reads as a list marker.
                line_start_index(&chars, i, at_line_start).is_some_and(|start| {
                    start < i && chars[start..i].iter().all(char::is_ascii_digit)
                })
            }
            _ => false,
        };
        if escape {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

const fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t')
}

/// The run of identical characters around `i`, as `start..end`.
fn run_bounds(chars: &[char], i: usize) -> (usize, usize) {
    let c = chars[i];
    let start = chars[..i].iter().rposition(|x| *x != c).map_or(0, |j| j + 1);
    let end = chars[i..].iter().position(|x| *x != c).map_or(chars.len(), |j| i + j);
    (start, end)
}

/// Index where the line containing `i` starts, if that is a real line
/// start.
fn line_start_index(chars: &[char], i: usize, at_line_start: bool) -> Option<usize> {
    match chars[..i].iter().rposition(|c| *c == '\n') {
        Some(newline) => Some(newline + 1),
        None if at_line_start => Some(0),
        None => None,
    }
}

/// Whether only indentation precedes `i` on its line.
fn at_line_head(chars: &[char], i: usize, at_line_start: bool) -> bool {
    line_start_index(chars, i, at_line_start)
        .is_some_and(|start| chars[start..i].iter().all(|c| is_blank(*c)))
}

/// `[` whose matching `]` is in this piece and not followed by link syntax.
fn closes_plainly(chars: &[char], i: usize) -> bool {
    chars[i + 1..]
        .iter()
        .position(|c| *c == ']')
        .is_some_and(|j| !matches!(chars.get(i + 1 + j + 1), None | Some('(' | '[' | ':')))
}

/// `rest` (after a `<`) could start a tag or an autolink.
fn opens_html(rest: &[char]) -> bool {
    let Some(&first) = rest.first() else {
        return true;
    };
    first.is_ascii_alphabetic() || matches!(first, '/' | '!' | '?')
}

/// Inline HTML the parser turns into marks or breaks, or an autolink.
fn recognized_tag(from_lt: &[char]) -> bool {
    let Some(close) = from_lt.iter().position(|c| *c == '>') else {
        // Unterminated; a later piece may close it.
        return !from_lt.iter().any(|c| c.is_whitespace());
    };
    let inner: String = from_lt[1..close].iter().collect();
    let inner = inner.trim_end_matches('/').trim().to_ascii_lowercase();
    if matches!(
        inner.as_str(),
        "sub" | "/sub" | "sup" | "/sup" | "mark" | "/mark" | "br" | "/br"
    ) {
        return true;
    }
    !inner.contains(char::is_whitespace) && (inner.contains(':') || inner.contains('@'))
}

/// `rest` (after a `&`) spells a character reference such as `&amp;` or
/// `&#35;`.
fn starts_entity(rest: &[char]) -> bool {
    let Some(semi) = rest.iter().position(|c| *c == ';') else {
        return false;
    };
    let body = &rest[..semi];
    match body {
        ['#', 'x' | 'X', hex @ ..] => !hex.is_empty() && hex.iter().all(char::is_ascii_hexdigit),
        ['#', digits @ ..] => !digits.is_empty() && digits.iter().all(char::is_ascii_digit),
        [first, tail @ ..] => {
            first.is_ascii_alphabetic() && tail.iter().all(char::is_ascii_alphanumeric)
        }
        [] => false,
    }
}

/// Move whitespace at the edges of marked spans outside the delimiters, so
/// the delimiters stay flanking.
fn expel_whitespace(inlines: &[Inline]) -> Vec<Inline> {
    let mut out = Vec::with_capacity(inlines.len());
    for (i, inline) in inlines.iter().enumerate() {
        let Inline::Text { text, marks } = inline else {
            out.push(inline.clone());
            continue;
        };
        if marks.style.contains(MarkSet::CODE) || (marks.style.is_empty() && marks.link.is_none()) {
            out.push(inline.clone());
            continue;
        }
        let core = text.trim();
        if core.is_empty() {
            let prev = i.checked_sub(1).and_then(|j| inlines[j].marks());
            out.push(Inline::marked(text.clone(), shared_marks(prev, Some(marks))));
            continue;
        }
        let leading = &text[..text.len() - text.trim_start().len()];
        let trailing = &text[text.trim_end().len()..];
        if !leading.is_empty() {
            let prev = i.checked_sub(1).and_then(|j| inlines[j].marks());
            out.push(Inline::marked(leading, shared_marks(prev, Some(marks))));
        }
        out.push(Inline::marked(core, marks.clone()));
        if !trailing.is_empty() {
            let next = inlines.get(i + 1).and_then(Inline::marks);
            out.push(Inline::marked(trailing, shared_marks(Some(marks), next)));
        }
    }
    crate::document::normalize_inlines(&mut out);
    out
}

fn shared_marks(a: Option<&Marks>, b: Option<&Marks>) -> Marks {
    match (a, b) {
        (Some(a), Some(b)) => Marks {
            style: (a.style & b.style) - MarkSet::CODE,
            link: if a.link == b.link { a.link.clone() } else { None },
            comments: a.comments.intersection(&b.comments).copied().collect(),
        },
        _ => Marks::default(),
    }
}
