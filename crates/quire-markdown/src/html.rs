#![forbid(unsafe_code)]

//! HTML rendering.
//!
//! The document is lowered to pulldown-cmark events and rendered with its
//! HTML writer. Marks the writer has no tag for go out as inline HTML.

use pulldown_cmark::{
    Alignment as CmarkAlignment, CodeBlockKind, CowStr, Event, HeadingLevel, LinkType, Tag, TagEnd,
};

use crate::document::{Alignment, Block, Document, Inline, List, Table};
use crate::marks::MarkSet;
use crate::parse::parse_markdown;
use crate::serialize::{Piece, Wrap, walk_inlines};

/// Render a document as HTML. Comment anchors become
/// `<span class="comment" data-comment-id="..">` wrappers.
#[must_use]
pub fn to_html(doc: &Document) -> String {
    let mut events = Vec::new();
    push_blocks(doc.blocks(), false, &mut events);
    let mut out = String::new();
    pulldown_cmark::html::push_html(&mut out, events.into_iter());
    out
}

/// Parse markdown and render it as HTML.
#[must_use]
pub fn markdown_to_html(markdown: &str) -> String {
    to_html(&parse_markdown(markdown))
}

fn push_blocks(blocks: &[Block], tight: bool, events: &mut Vec<Event<'static>>) {
    for block in blocks {
        match block {
            Block::Heading { level, content } => {
                let level = heading_level(*level);
                events.push(Event::Start(Tag::Heading {
                    level,
                    id: None,
                    classes: Vec::new(),
                    attrs: Vec::new(),
                }));
                push_inlines(content, events);
                events.push(Event::End(TagEnd::Heading(level)));
            }
            Block::Paragraph { content } if tight => push_inlines(content, events),
            Block::Paragraph { content } => {
                events.push(Event::Start(Tag::Paragraph));
                push_inlines(content, events);
                events.push(Event::End(TagEnd::Paragraph));
            }
            Block::CodeBlock { language, code } => {
                let info = CowStr::from(language.clone().unwrap_or_default());
                events.push(Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))));
                if !code.is_empty() {
                    events.push(Event::Text(format!("{code}\n").into()));
                }
                events.push(Event::End(TagEnd::CodeBlock));
            }
            Block::BlockQuote { blocks } => {
                events.push(Event::Start(Tag::BlockQuote(None)));
                push_blocks(blocks, false, events);
                events.push(Event::End(TagEnd::BlockQuote(None)));
            }
            Block::List(list) => push_list(list, events),
            Block::Table(table) => push_table(table, events),
            Block::Rule => events.push(Event::Rule),
        }
    }
}

fn push_list(list: &List, events: &mut Vec<Event<'static>>) {
    events.push(Event::Start(Tag::List(list.start)));
    for item in &list.items {
        events.push(Event::Start(Tag::Item));
        if let Some(checked) = item.checked {
            events.push(Event::TaskListMarker(checked));
        }
        push_blocks(&item.blocks, list.tight, events);
        events.push(Event::End(TagEnd::Item));
    }
    events.push(Event::End(TagEnd::List(list.start.is_some())));
}

fn push_table(table: &Table, events: &mut Vec<Event<'static>>) {
    let alignments = table
        .alignments
        .iter()
        .map(|alignment| match alignment {
            Alignment::None => CmarkAlignment::None,
            Alignment::Left => CmarkAlignment::Left,
            Alignment::Center => CmarkAlignment::Center,
            Alignment::Right => CmarkAlignment::Right,
        })
        .collect();
    events.push(Event::Start(Tag::Table(alignments)));
    events.push(Event::Start(Tag::TableHead));
    push_cells(&table.header, events);
    events.push(Event::End(TagEnd::TableHead));
    for row in &table.rows {
        events.push(Event::Start(Tag::TableRow));
        push_cells(row, events);
        events.push(Event::End(TagEnd::TableRow));
    }
    events.push(Event::End(TagEnd::Table));
}

fn push_cells(cells: &[Vec<Inline>], events: &mut Vec<Event<'static>>) {
    for cell in cells {
        events.push(Event::Start(Tag::TableCell));
        push_inlines(cell, events);
        events.push(Event::End(TagEnd::TableCell));
    }
}

fn push_inlines(inlines: &[Inline], events: &mut Vec<Event<'static>>) {
    walk_inlines(inlines, true, |piece| match piece {
        Piece::Open(wrap) => events.push(open_event(&wrap)),
        Piece::Close(wrap) => events.push(close_event(&wrap)),
        Piece::Text { text, code: true } => events.push(Event::Code(text.to_string().into())),
        Piece::Text { text, code: false } => {
            // Soft breaks are kept as newlines in the model.
            let mut lines = text.split('\n');
            if let Some(first) = lines.next()
                && !first.is_empty()
            {
                events.push(Event::Text(first.to_string().into()));
            }
            for line in lines {
                events.push(Event::SoftBreak);
                if !line.is_empty() {
                    events.push(Event::Text(line.to_string().into()));
                }
            }
        }
        Piece::Image(Inline::Image { src, alt, title, .. }) => {
            events.push(Event::Start(Tag::Image {
                link_type: LinkType::Inline,
                dest_url: src.clone().into(),
                title: title.clone().into(),
                id: CowStr::Borrowed(""),
            }));
            if !alt.is_empty() {
                events.push(Event::Text(alt.clone().into()));
            }
            events.push(Event::End(TagEnd::Image));
        }
        Piece::Image(_) => {}
        Piece::HardBreak => events.push(Event::HardBreak),
    });
}

fn open_event(wrap: &Wrap) -> Event<'static> {
    match wrap {
        Wrap::Link(link) => Event::Start(Tag::Link {
            link_type: LinkType::Inline,
            dest_url: link.href.clone().into(),
            title: link.title.clone().into(),
            id: CowStr::Borrowed(""),
        }),
        Wrap::Comment(id) => Event::InlineHtml(
            format!("<span class=\"comment\" data-comment-id=\"{}\">", id.get()).into(),
        ),
        Wrap::Style(flag) if *flag == MarkSet::BOLD => Event::Start(Tag::Strong),
        Wrap::Style(flag) if *flag == MarkSet::ITALIC => Event::Start(Tag::Emphasis),
        Wrap::Style(flag) if *flag == MarkSet::STRIKE => Event::Start(Tag::Strikethrough),
        Wrap::Style(flag) => Event::InlineHtml(format!("<{}>", html_tag(*flag)).into()),
    }
}

fn close_event(wrap: &Wrap) -> Event<'static> {
    match wrap {
        Wrap::Link(_) => Event::End(TagEnd::Link),
        Wrap::Comment(_) => Event::InlineHtml(CowStr::Borrowed("</span>")),
        Wrap::Style(flag) if *flag == MarkSet::BOLD => Event::End(TagEnd::Strong),
        Wrap::Style(flag) if *flag == MarkSet::ITALIC => Event::End(TagEnd::Emphasis),
        Wrap::Style(flag) if *flag == MarkSet::STRIKE => Event::End(TagEnd::Strikethrough),
        Wrap::Style(flag) => Event::InlineHtml(format!("</{}>", html_tag(*flag)).into()),
    }
}

fn html_tag(flag: MarkSet) -> &'static str {
    if flag == MarkSet::SUPERSCRIPT {
        "sup"
    } else if flag == MarkSet::SUBSCRIPT {
        "sub"
    } else {
        "mark"
    }
}

fn heading_level(level: u8) -> HeadingLevel {
    match level {
        0 | 1 => HeadingLevel::H1,
        2 => HeadingLevel::H2,
        3 => HeadingLevel::H3,
        4 => HeadingLevel::H4,
        5 => HeadingLevel::H5,
        _ => HeadingLevel::H6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marks::Mark;
    use quire_core::CommentId;

    #[test]
    fn renders_common_blocks() {
        let html = markdown_to_html("# Hi\n\nSome **bold** text.\n\n- a\n- b\n");
        assert_eq!(
            html,
            "<h1>Hi</h1>\n<p>Some <strong>bold</strong> text.</p>\n<ul>\n<li>a</li>\n<li>b</li>\n</ul>\n"
        );
    }

    #[test]
    fn extension_marks_render_as_tags() {
        let html = markdown_to_html("==hi== H<sub>2</sub>O\n");
        assert_eq!(html, "<p><mark>hi</mark> H<sub>2</sub>O</p>\n");
    }

    #[test]
    fn comments_render_as_spans() {
        let mut doc = parse_markdown("hello world\n");
        let id = CommentId::new(7).expect("non-zero");
        doc.add_mark(0, 5, &Mark::Comment(id)).expect("mark");
        assert_eq!(
            to_html(&doc),
            "<p><span class=\"comment\" data-comment-id=\"7\">hello</span> world</p>\n"
        );
    }

    #[test]
    fn code_is_escaped() {
        let html = markdown_to_html("```\n<b>\n```\n");
        assert_eq!(html, "<pre><code>&lt;b&gt;\n</code></pre>\n");
    }
}
