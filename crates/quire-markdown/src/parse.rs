#![forbid(unsafe_code)]

//! Markdown text to [`Document`].
//!
//! Parses GitHub-Flavored Markdown with [pulldown-cmark] and builds the block
//! tree from its event stream. On top of GFM:
//!
//! - `==text==` is highlight
//! - `<sub>`/`<sup>` and `<mark>` inline HTML become the matching marks
//!
//! Anything the model has no node for (HTML blocks, footnotes, math) is kept
//! as literal text, so parsing never fails.

use std::ops::Range;

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use crate::document::{Alignment, Block, Document, Inline, List, ListDelimiter, ListItem, Table};
use crate::marks::{Link, MarkSet, Marks};

/// Parse markdown into a document.
#[must_use]
pub fn parse_markdown(markdown: &str) -> Document {
    Document::from_blocks(parse_blocks(markdown))
}

/// Parse markdown into blocks (for structured paste).
#[must_use]
pub fn parse_blocks(markdown: &str) -> Vec<Block> {
    let options = Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TABLES
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_GFM;
    let parser = Parser::new_ext(markdown, options).into_offset_iter();

    let mut builder = DocBuilder::new();
    builder.process(markdown, parser);
    builder.finish()
}

/// An open container while building.
#[derive(Debug)]
enum Frame {
    Root(Vec<Block>),
    BlockQuote(Vec<Block>),
    List(List),
    Item(ListItem),
    Table {
        table: Table,
        row: Vec<Vec<Inline>>,
        in_head: bool,
    },
}

/// Who receives the inline content being collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InlineTarget {
    Paragraph,
    Heading(u8),
    Cell,
    /// Text directly inside a tight list item.
    Implicit,
}

#[derive(Debug)]
struct Image {
    src: String,
    title: String,
    alt: String,
}

struct DocBuilder {
    frames: Vec<Frame>,
    inline: Vec<Inline>,
    target: Option<InlineTarget>,
    style_stack: Vec<MarkSet>,
    link_stack: Vec<Link>,
    /// Index into `inline` where an open `==` highlight began.
    highlight_from: Option<usize>,
    code: Option<(Option<String>, String)>,
    image: Option<Image>,
}

impl DocBuilder {
    fn new() -> Self {
        Self {
            frames: vec![Frame::Root(Vec::new())],
            inline: Vec::new(),
            target: None,
            style_stack: Vec::new(),
            link_stack: Vec::new(),
            highlight_from: None,
            code: None,
            image: None,
        }
    }

    fn process<'a>(
        &mut self,
        source: &str,
        parser: impl Iterator<Item = (Event<'a>, Range<usize>)>,
    ) {
        for (event, range) in parser {
            match event {
                Event::Start(tag) => {
                    let span = source.get(range).unwrap_or_default();
                    self.start_tag(tag, span);
                }
                Event::End(tag) => self.end_tag(tag),
                Event::Text(text) => self.text(&text),
                Event::Code(code) => self.inline_code(&code),
                Event::SoftBreak => self.text("\n"),
                Event::HardBreak => self.hard_break(),
                Event::Rule => {
                    self.flush_implicit();
                    self.push_block(Block::Rule);
                }
                Event::TaskListMarker(checked) => {
                    if let Some(Frame::Item(item)) = self.frames.last_mut() {
                        item.checked = Some(checked);
                    }
                }
                Event::FootnoteReference(label) => self.text(&format!("[^{label}]")),
                Event::InlineMath(latex) => self.text(&format!("${latex}$")),
                Event::DisplayMath(latex) => self.text(&format!("$${latex}$$")),
                Event::Html(html) => self.text(&html),
                Event::InlineHtml(html) => self.inline_html(&html),
            }
        }
    }

    /// `span` is the source text the tag covers.
    fn start_tag(&mut self, tag: Tag, span: &str) {
        match tag {
            Tag::Paragraph => {
                self.flush_implicit();
                let in_item = matches!(self.frames.last(), Some(Frame::Item(_)));
                if in_item && let Some(Frame::List(list)) = self.frames.iter_mut().rev().nth(1) {
                    list.tight = false;
                }
                self.begin_inline(InlineTarget::Paragraph);
            }
            Tag::Heading { level, .. } => {
                self.flush_implicit();
                self.begin_inline(InlineTarget::Heading(heading_level(level)));
            }
            Tag::CodeBlock(kind) => {
                self.flush_implicit();
                let language = match kind {
                    CodeBlockKind::Fenced(lang) if !lang.is_empty() => Some(lang.to_string()),
                    CodeBlockKind::Fenced(_) | CodeBlockKind::Indented => None,
                };
                self.code = Some((language, String::new()));
            }
            Tag::BlockQuote(_) => {
                self.flush_implicit();
                self.frames.push(Frame::BlockQuote(Vec::new()));
            }
            Tag::List(start) => {
                self.flush_implicit();
                self.frames.push(Frame::List(List {
                    start,
                    delimiter: list_delimiter(span),
                    tight: true,
                    items: Vec::new(),
                }));
            }
            Tag::Item => self.frames.push(Frame::Item(ListItem {
                checked: None,
                blocks: Vec::new(),
            })),
            Tag::Table(alignments) => {
                self.flush_implicit();
                self.frames.push(Frame::Table {
                    table: Table {
                        alignments: alignments.into_iter().map(alignment).collect(),
                        header: Vec::new(),
                        rows: Vec::new(),
                    },
                    row: Vec::new(),
                    in_head: false,
                });
            }
            Tag::TableHead => {
                if let Some(Frame::Table { in_head, .. }) = self.frames.last_mut() {
                    *in_head = true;
                }
            }
            Tag::TableRow => {}
            Tag::TableCell => self.begin_inline(InlineTarget::Cell),
            Tag::Emphasis => self.style_stack.push(MarkSet::ITALIC),
            Tag::Strong => self.style_stack.push(MarkSet::BOLD),
            Tag::Strikethrough => self.style_stack.push(MarkSet::STRIKE),
            Tag::Link {
                dest_url, title, ..
            } => self
                .link_stack
                .push(Link::new(dest_url.to_string()).with_title(title.to_string())),
            Tag::Image {
                dest_url, title, ..
            } => {
                self.image = Some(Image {
                    src: dest_url.to_string(),
                    title: title.to_string(),
                    alt: String::new(),
                });
            }
            _ => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                let content = self.end_inline();
                self.push_block(Block::Paragraph { content });
            }
            TagEnd::Heading(_) => {
                let level = match self.target {
                    Some(InlineTarget::Heading(level)) => level,
                    _ => 1,
                };
                let content = self.end_inline();
                self.push_block(Block::Heading { level, content });
            }
            TagEnd::CodeBlock => {
                if let Some((language, mut code)) = self.code.take() {
                    if code.ends_with('\n') {
                        code.pop();
                    }
                    self.push_block(Block::CodeBlock { language, code });
                }
            }
            TagEnd::BlockQuote(_) => {
                self.flush_implicit();
                if let Some(Frame::BlockQuote(blocks)) = self.frames.pop() {
                    self.push_block(Block::BlockQuote { blocks });
                }
            }
            TagEnd::Item => {
                self.flush_implicit();
                if let Some(Frame::Item(mut item)) = self.frames.pop() {
                    if item.blocks.is_empty() {
                        item.blocks.push(Block::Paragraph {
                            content: Vec::new(),
                        });
                    }
                    if let Some(Frame::List(list)) = self.frames.last_mut() {
                        list.items.push(item);
                    }
                }
            }
            TagEnd::List(_) => {
                if let Some(Frame::List(list)) = self.frames.pop() {
                    self.push_block(Block::List(list));
                }
            }
            TagEnd::TableCell => {
                let cell = self.end_inline();
                if let Some(Frame::Table { row, .. }) = self.frames.last_mut() {
                    row.push(cell);
                }
            }
            TagEnd::TableHead => {
                if let Some(Frame::Table {
                    table,
                    row,
                    in_head,
                }) = self.frames.last_mut()
                {
                    if !row.is_empty() {
                        table.header = std::mem::take(row);
                    }
                    *in_head = false;
                }
            }
            TagEnd::TableRow => {
                if let Some(Frame::Table {
                    table,
                    row,
                    in_head,
                }) = self.frames.last_mut()
                {
                    if *in_head {
                        table.header = std::mem::take(row);
                    } else {
                        table.rows.push(std::mem::take(row));
                    }
                }
            }
            TagEnd::Table => {
                if let Some(Frame::Table { table, .. }) = self.frames.pop() {
                    self.push_block(Block::Table(table));
                }
            }
            TagEnd::Emphasis => self.pop_style(MarkSet::ITALIC),
            TagEnd::Strong => self.pop_style(MarkSet::BOLD),
            TagEnd::Strikethrough => self.pop_style(MarkSet::STRIKE),
            TagEnd::Link => {
                self.link_stack.pop();
            }
            TagEnd::Image => {
                if let Some(image) = self.image.take() {
                    self.ensure_inline();
                    let marks = self.current_marks();
                    self.inline.push(Inline::Image {
                        src: image.src,
                        alt: image.alt,
                        title: image.title,
                        marks,
                    });
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if let Some((_, code)) = &mut self.code {
            code.push_str(text);
            return;
        }
        if let Some(image) = &mut self.image {
            image.alt.push_str(text);
            return;
        }
        self.ensure_inline();
        let mut pieces = text.split("==");
        if let Some(first) = pieces.next() {
            self.push_text(first, MarkSet::empty());
        }
        for piece in pieces {
            self.toggle_highlight();
            self.push_text(piece, MarkSet::empty());
        }
    }

    fn inline_code(&mut self, code: &str) {
        if let Some(image) = &mut self.image {
            image.alt.push_str(code);
            return;
        }
        self.ensure_inline();
        self.push_text(code, MarkSet::CODE);
    }

    fn hard_break(&mut self) {
        self.ensure_inline();
        self.inline.push(Inline::HardBreak);
    }

    fn inline_html(&mut self, html: &str) {
        let tag = html.trim().to_ascii_lowercase();
        let (flag, closing) = match tag.as_str() {
            "<sub>" => (MarkSet::SUBSCRIPT, false),
            "</sub>" => (MarkSet::SUBSCRIPT, true),
            "<sup>" => (MarkSet::SUPERSCRIPT, false),
            "</sup>" => (MarkSet::SUPERSCRIPT, true),
            "<mark>" => (MarkSet::HIGHLIGHT, false),
            "</mark>" => (MarkSet::HIGHLIGHT, true),
            "<br>" | "<br/>" | "<br />" => return self.hard_break(),
            _ => return self.text(html),
        };
        if closing {
            self.pop_style(flag);
        } else {
            self.style_stack.push(flag);
        }
    }

    fn push_text(&mut self, text: &str, extra: MarkSet) {
        if text.is_empty() {
            return;
        }
        let mut marks = self.current_marks();
        marks.style |= extra;
        self.inline.push(Inline::Text {
            text: text.to_string(),
            marks,
        });
    }

    fn current_marks(&self) -> Marks {
        let mut style = self
            .style_stack
            .iter()
            .fold(MarkSet::empty(), |acc, flag| acc | *flag);
        if self.highlight_from.is_some() {
            style |= MarkSet::HIGHLIGHT;
        }
        Marks {
            style,
            link: self.link_stack.last().cloned(),
            comments: Default::default(),
        }
    }

    fn pop_style(&mut self, flag: MarkSet) {
        if let Some(index) = self.style_stack.iter().rposition(|entry| *entry == flag) {
            self.style_stack.remove(index);
        }
    }

    fn toggle_highlight(&mut self) {
        match self.highlight_from {
            Some(_) => self.highlight_from = None,
            None => self.highlight_from = Some(self.inline.len()),
        }
    }

    fn begin_inline(&mut self, target: InlineTarget) {
        self.target = Some(target);
        self.inline.clear();
        self.highlight_from = None;
    }

    /// Start an implicit paragraph for text outside any inline container.
    fn ensure_inline(&mut self) {
        if self.target.is_none() {
            self.begin_inline(InlineTarget::Implicit);
        }
    }

    fn end_inline(&mut self) -> Vec<Inline> {
        // An unmatched `==` was literal text.
        if let Some(from) = self.highlight_from.take() {
            for inline in &mut self.inline[from..] {
                if let Some(marks) = inline.marks_mut() {
                    marks.style.remove(MarkSet::HIGHLIGHT);
                }
            }
            let marks = match self.inline.get(from).and_then(Inline::marks) {
                Some(marks) => marks.clone(),
                None => self.current_marks(),
            };
            self.inline.insert(from, Inline::marked("==", marks));
        }
        self.target = None;
        let mut content = std::mem::take(&mut self.inline);
        crate::document::normalize_inlines(&mut content);
        content
    }

    fn flush_implicit(&mut self) {
        if self.target == Some(InlineTarget::Implicit) {
            let content = self.end_inline();
            self.push_block(Block::Paragraph { content });
        }
    }

    fn push_block(&mut self, block: Block) {
        match self.frames.last_mut() {
            Some(Frame::Root(blocks) | Frame::BlockQuote(blocks)) => blocks.push(block),
            Some(Frame::Item(item)) => item.blocks.push(block),
            // Blocks cannot live directly in lists or tables; wrap them.
            Some(Frame::List(list)) => list.items.push(ListItem {
                checked: None,
                blocks: vec![block],
            }),
            Some(Frame::Table { .. }) | None => {}
        }
    }

    fn finish(mut self) -> Vec<Block> {
        self.flush_implicit();
        if let Some((language, code)) = self.code.take() {
            self.push_block(Block::CodeBlock { language, code });
        }
        while self.frames.len() > 1 {
            match self.frames.pop() {
                Some(Frame::BlockQuote(blocks)) => self.push_block(Block::BlockQuote { blocks }),
                Some(Frame::List(list)) => self.push_block(Block::List(list)),
                Some(Frame::Item(item)) => {
                    if let Some(Frame::List(list)) = self.frames.last_mut() {
                        list.items.push(item);
                    }
                }
                Some(Frame::Table { table, .. }) => self.push_block(Block::Table(table)),
                Some(Frame::Root(_)) | None => {}
            }
        }
        match self.frames.pop() {
            Some(Frame::Root(blocks)) => blocks,
            _ => Vec::new(),
        }
    }
}

/// The delimiter of the first marker in `span`; `1)` vs `1.`.
fn list_delimiter(span: &str) -> ListDelimiter {
    let marker = span.trim_start().trim_start_matches(|c: char| c.is_ascii_digit());
    if marker.starts_with(')') {
        ListDelimiter::Paren
    } else {
        ListDelimiter::Period
    }
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn alignment(alignment: pulldown_cmark::Alignment) -> Alignment {
    match alignment {
        pulldown_cmark::Alignment::None => Alignment::None,
        pulldown_cmark::Alignment::Left => Alignment::Left,
        pulldown_cmark::Alignment::Center => Alignment::Center,
        pulldown_cmark::Alignment::Right => Alignment::Right,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn styled(text: &str, style: MarkSet) -> Inline {
        Inline::marked(text, Marks::styled(style))
    }

    #[test]
    fn headings_and_emphasis() {
        let doc = parse_markdown("## Title\n\nSome **bold** and *it*.");
        assert_eq!(
            doc.blocks(),
            &[
                Block::heading(2, "Title"),
                Block::Paragraph {
                    content: vec![
                        Inline::text("Some "),
                        styled("bold", MarkSet::BOLD),
                        Inline::text(" and "),
                        styled("it", MarkSet::ITALIC),
                        Inline::text("."),
                    ]
                },
            ]
        );
    }

    #[test]
    fn tight_task_list() {
        let doc = parse_markdown("- [ ] todo\n- [x] done\n");
        let Block::List(list) = &doc.blocks()[0] else {
            panic!("list expected");
        };
        assert!(list.tight);
        assert_eq!(list.start, None);
        assert_eq!(list.items[0].checked, Some(false));
        assert_eq!(list.items[1].checked, Some(true));
        assert_eq!(list.items[1].blocks, vec![Block::paragraph("done")]);
    }

    #[test]
    fn loose_ordered_list() {
        let doc = parse_markdown("3. a\n\n4. b\n");
        let Block::List(list) = &doc.blocks()[0] else {
            panic!("list expected");
        };
        assert!(!list.tight);
        assert_eq!(list.start, Some(3));
        assert_eq!(list.delimiter, ListDelimiter::Period);
        assert_eq!(list.items.len(), 2);
    }

    #[test]
    fn paren_delimiter_is_kept() {
        let doc = parse_markdown("1) paren
2) list
");
        let Block::List(list) = &doc.blocks()[0] else {
            panic!("list expected");
        };
        assert_eq!(list.delimiter, ListDelimiter::Paren);
    }

    #[test]
    fn highlight_sub_and_sup() {
        let doc = parse_markdown("a ==hi== H<sub>2</sub>O x<sup>2</sup>");
        assert_eq!(
            doc.blocks()[0],
            Block::Paragraph {
                content: vec![
                    Inline::text("a "),
                    styled("hi", MarkSet::HIGHLIGHT),
                    Inline::text(" H"),
                    styled("2", MarkSet::SUBSCRIPT),
                    Inline::text("O x"),
                    styled("2", MarkSet::SUPERSCRIPT),
                ]
            }
        );
    }

    #[test]
    fn unmatched_highlight_is_literal() {
        let doc = parse_markdown("a == b");
        assert_eq!(doc.blocks()[0], Block::paragraph("a == b"));
    }

    #[test]
    fn code_block_and_inline_code() {
        let doc = parse_markdown("```rust\nfn main() {}\n```\n\nuse `x`");
        assert_eq!(
            doc.blocks()[0],
            Block::CodeBlock {
                language: Some("rust".into()),
                code: "fn main() {}".into()
            }
        );
        assert_eq!(
            doc.blocks()[1],
            Block::Paragraph {
                content: vec![Inline::text("use "), styled("x", MarkSet::CODE)]
            }
        );
    }

    #[test]
    fn links_and_images() {
        let doc = parse_markdown("[site](https://a.io \"A\") ![logo](l.png)");
        let Block::Paragraph { content } = &doc.blocks()[0] else {
            panic!("paragraph expected");
        };
        assert_eq!(
            content[0],
            Inline::marked(
                "site",
                Marks {
                    link: Some(Link::new("https://a.io").with_title("A")),
                    ..Marks::default()
                }
            )
        );
        assert_eq!(
            content[2],
            Inline::Image {
                src: "l.png".into(),
                alt: "logo".into(),
                title: String::new(),
                marks: Marks::default()
            }
        );
    }

    #[test]
    fn table_with_alignment() {
        let doc = parse_markdown("| a | b |\n| :-- | --: |\n| 1 | 2 |\n");
        let Block::Table(table) = &doc.blocks()[0] else {
            panic!("table expected");
        };
        assert_eq!(table.alignments, vec![Alignment::Left, Alignment::Right]);
        assert_eq!(table.header, vec![vec![Inline::text("a")], vec![Inline::text("b")]]);
        assert_eq!(table.rows, vec![vec![vec![Inline::text("1")], vec![Inline::text("2")]]]);
    }

    #[test]
    fn blockquote_and_rule() {
        let doc = parse_markdown("> quoted\n\n---\n");
        assert_eq!(
            doc.blocks(),
            &[
                Block::BlockQuote {
                    blocks: vec![Block::paragraph("quoted")]
                },
                Block::Rule,
            ]
        );
    }

    #[test]
    fn empty_input_is_one_empty_paragraph() {
        let doc = parse_markdown("");
        assert_eq!(doc, Document::new());
    }
}
