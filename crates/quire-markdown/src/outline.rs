#![forbid(unsafe_code)]

//! Heading outline.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::document::{Block, Document, Inline, inline_len};

/// One heading in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineEntry {
    /// Anchor slug, unique within the outline (`intro`, `intro-1`, ...).
    pub id: String,
    /// 1 to 6.
    pub level: u8,
    pub text: String,
    /// Position of the heading's first character.
    pub position: usize,
}

/// Collect every heading, including those nested in quotes and lists.
#[must_use]
pub fn extract_outline(doc: &Document) -> Vec<OutlineEntry> {
    let mut entries = Vec::new();
    let mut pos = 0;
    walk(doc.blocks(), &mut pos, &mut entries);

    let mut seen: HashMap<String, usize> = HashMap::new();
    for entry in &mut entries {
        let base = slug(&entry.text);
        let count = seen.entry(base.clone()).or_insert(0);
        entry.id = if *count == 0 {
            base
        } else {
            format!("{base}-{count}")
        };
        *count += 1;
    }
    entries
}

fn walk(blocks: &[Block], pos: &mut usize, out: &mut Vec<OutlineEntry>) {
    for block in blocks {
        match block {
            Block::Heading { level, content } => {
                out.push(OutlineEntry {
                    id: String::new(),
                    level: *level,
                    text: plain_text(content),
                    position: *pos,
                });
                *pos += inline_len(content) + 1;
            }
            Block::Paragraph { content } => *pos += inline_len(content) + 1,
            Block::CodeBlock { code, .. } => *pos += code.chars().count() + 1,
            Block::BlockQuote { blocks } => walk(blocks, pos, out),
            Block::List(list) => {
                for item in &list.items {
                    walk(&item.blocks, pos, out);
                }
            }
            Block::Table(table) => {
                *pos += table
                    .all_rows()
                    .flatten()
                    .map(|cell| inline_len(cell) + 1)
                    .sum::<usize>();
            }
            Block::Rule => {}
        }
    }
}

fn plain_text(inlines: &[Inline]) -> String {
    let mut text = String::new();
    for inline in inlines {
        match inline {
            Inline::Text { text: chunk, .. } => text.push_str(chunk),
            Inline::Image { alt, .. } => text.push_str(alt),
            Inline::HardBreak => text.push(' '),
        }
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn slug(text: &str) -> String {
    let slug: String = text
        .chars()
        .filter_map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                Some(c.to_lowercase().next().unwrap_or(c))
            } else if c.is_whitespace() {
                Some('-')
            } else {
                None
            }
        })
        .collect();
    if slug.is_empty() {
        "heading".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_markdown;

    #[test]
    fn headings_in_document_order() {
        let doc = parse_markdown("# Intro\n\nbody text\n\n## Details *here*\n\n> ### Quoted\n");
        let outline = extract_outline(&doc);
        let summary: Vec<_> = outline
            .iter()
            .map(|entry| (entry.level, entry.text.as_str(), entry.position))
            .collect();
        assert_eq!(
            summary,
            vec![(1, "Intro", 0), (2, "Details here", 16), (3, "Quoted", 29)]
        );
        assert_eq!(outline[1].id, "details-here");
    }

    #[test]
    fn positions_point_at_heading_text() {
        let doc = parse_markdown("para\n\n| a | b |\n| --- | --- |\n| c | d |\n\n## After\n");
        let outline = extract_outline(&doc);
        let text = doc.text();
        let start = outline[0].position;
        assert_eq!(text.chars().skip(start).take(5).collect::<String>(), "After");
    }

    #[test]
    fn duplicate_slugs_are_numbered() {
        let doc = parse_markdown("# Notes\n\n# Notes\n\n# Notes!\n\n# ???\n");
        let ids: Vec<_> = extract_outline(&doc).into_iter().map(|entry| entry.id).collect();
        assert_eq!(ids, vec!["notes", "notes-1", "notes-2", "heading"]);
    }

    #[test]
    fn no_headings_no_outline() {
        assert!(extract_outline(&parse_markdown("just text\n")).is_empty());
    }
}
