#![forbid(unsafe_code)]

//! Structured document model.
//!
//! A [`Document`] is a list of [`Block`]s. Leaf blocks that hold text
//! (headings, paragraphs, code blocks, table cells) are *textblocks*.
//!
//! # Position space
//!
//! Positions count characters of the flattened document: textblocks in
//! document order, joined by one separator unit. Images and hard breaks are
//! one unit each. Rules hold no text and take no space. Position `p` belongs
//! to exactly one textblock: the one whose `[start, start + len]` contains it,
//! where the position after a separator is the start of the next textblock.
//!
//! [`Document::text`] renders this space literally (separators as `\n`,
//! images as U+FFFC), so character offsets into it are document positions.

use crate::error::DocError;
use crate::marks::{Mark, Marks};

/// Placeholder character for images in flattened text.
pub const OBJECT_REPLACEMENT: char = '\u{FFFC}';

/// Inline content of a textblock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text {
        text: String,
        marks: Marks,
    },
    Image {
        src: String,
        alt: String,
        title: String,
        marks: Marks,
    },
    HardBreak,
}

impl Inline {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            marks: Marks::default(),
        }
    }

    #[must_use]
    pub fn marked(text: impl Into<String>, marks: Marks) -> Self {
        Self::Text {
            text: text.into(),
            marks,
        }
    }

    /// Size in the position space.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Text { text, .. } => text.chars().count(),
            Self::Image { .. } | Self::HardBreak => 1,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn marks(&self) -> Option<&Marks> {
        match self {
            Self::Text { marks, .. } | Self::Image { marks, .. } => Some(marks),
            Self::HardBreak => None,
        }
    }

    pub(crate) fn marks_mut(&mut self) -> Option<&mut Marks> {
        match self {
            Self::Text { marks, .. } | Self::Image { marks, .. } => Some(marks),
            Self::HardBreak => None,
        }
    }

    fn push_flat(&self, out: &mut String) {
        match self {
            Self::Text { text, .. } => out.push_str(text),
            Self::Image { .. } => out.push(OBJECT_REPLACEMENT),
            Self::HardBreak => out.push('\n'),
        }
    }
}

/// Column alignment of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    None,
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    /// `Some` for task items.
    pub checked: Option<bool>,
    pub blocks: Vec<Block>,
}

impl ListItem {
    #[must_use]
    pub fn paragraph(content: Vec<Inline>) -> Self {
        Self {
            checked: None,
            blocks: vec![Block::Paragraph { content }],
        }
    }
}

/// What follows the number of an ordered list marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListDelimiter {
    /// `1.`
    #[default]
    Period,
    /// `1)`
    Paren,
}

impl ListDelimiter {
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Period => '.',
            Self::Paren => ')',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct List {
    /// Start number of an ordered list; `None` for bullets.
    pub start: Option<u64>,
    /// Ignored for bullet lists.
    pub delimiter: ListDelimiter,
    /// Items are separated without blank lines.
    pub tight: bool,
    pub items: Vec<ListItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub alignments: Vec<Alignment>,
    pub header: Vec<Vec<Inline>>,
    pub rows: Vec<Vec<Vec<Inline>>>,
}

impl Table {
    /// Header row followed by body rows.
    pub fn all_rows(&self) -> impl Iterator<Item = &Vec<Vec<Inline>>> {
        std::iter::once(&self.header).chain(self.rows.iter())
    }

    pub(crate) fn all_rows_mut(&mut self) -> impl Iterator<Item = &mut Vec<Vec<Inline>>> {
        std::iter::once(&mut self.header).chain(self.rows.iter_mut())
    }

    fn cell_count(&self) -> usize {
        self.all_rows().map(Vec::len).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading {
        level: u8,
        content: Vec<Inline>,
    },
    Paragraph {
        content: Vec<Inline>,
    },
    CodeBlock {
        language: Option<String>,
        code: String,
    },
    BlockQuote {
        blocks: Vec<Block>,
    },
    List(List),
    Table(Table),
    Rule,
}

impl Block {
    #[must_use]
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::Paragraph {
            content: vec![Inline::text(text)],
        }
    }

    #[must_use]
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Self::Heading {
            level: level.clamp(1, 6),
            content: vec![Inline::text(text)],
        }
    }

    #[must_use]
    pub const fn is_textblock(&self) -> bool {
        matches!(
            self,
            Self::Heading { .. } | Self::Paragraph { .. } | Self::CodeBlock { .. }
        )
    }
}

/// Read view of one textblock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Textblock<'a> {
    Inline(&'a [Inline]),
    Code(&'a str),
}

impl Textblock<'_> {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Inline(inlines) => inline_len(inlines),
            Self::Code(code) => code.chars().count(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push_flat(&self, out: &mut String) {
        match self {
            Self::Inline(inlines) => inlines.iter().for_each(|inline| inline.push_flat(out)),
            Self::Code(code) => out.push_str(code),
        }
    }
}

pub(crate) enum TextblockMut<'a> {
    Inline(&'a mut Vec<Inline>),
    Code(&'a mut String),
}

/// One step of a structural path from the document root to a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Seg {
    /// Index into a block list.
    Block(usize),
    /// Index into the items of the list the previous segment points at.
    Item(usize),
    /// Cell of the table the previous segment points at; row 0 is the header.
    Cell(usize, usize),
}

/// A position resolved to its textblock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPos {
    /// Textblock index in document order.
    pub index: usize,
    /// Offset inside the textblock.
    pub offset: usize,
    /// Position of the textblock's first character.
    pub start: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub(crate) blocks: Vec<Block>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// A document with one empty paragraph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            blocks: vec![Block::Paragraph {
                content: Vec::new(),
            }],
        }
    }

    /// Wrap `blocks`, adding an empty paragraph if they hold no textblock.
    #[must_use]
    pub fn from_blocks(mut blocks: Vec<Block>) -> Self {
        let mut count = 0;
        count_textblocks(&blocks, &mut count);
        if count == 0 {
            blocks.push(Block::Paragraph {
                content: Vec::new(),
            });
        }
        Self { blocks }
    }

    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    #[must_use]
    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }

    /// Textblocks in document order.
    #[must_use]
    pub fn textblocks(&self) -> Vec<Textblock<'_>> {
        let mut out = Vec::new();
        collect_textblocks(&self.blocks, &mut out);
        out
    }

    pub(crate) fn textblocks_mut(&mut self) -> Vec<TextblockMut<'_>> {
        let mut out = Vec::new();
        collect_textblocks_mut(&mut self.blocks, &mut out);
        out
    }

    /// Structural path of every textblock, in document order.
    pub(crate) fn textblock_paths(&self) -> Vec<Vec<Seg>> {
        let mut out = Vec::new();
        collect_paths(&self.blocks, &mut Vec::new(), &mut out);
        out
    }

    /// Size of the position space.
    #[must_use]
    pub fn len(&self) -> usize {
        let blocks = self.textblocks();
        let chars: usize = blocks.iter().map(Textblock::len).sum();
        chars + blocks.len().saturating_sub(1)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The flattened text; character offsets are document positions.
    #[must_use]
    pub fn text(&self) -> String {
        let mut out = String::new();
        for (i, block) in self.textblocks().iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            block.push_flat(&mut out);
        }
        out
    }

    /// Flattened text of `[from, to)`.
    pub fn text_between(&self, from: usize, to: usize) -> Result<String, DocError> {
        self.check_range(from, to)?;
        Ok(self.text().chars().skip(from).take(to - from).collect())
    }

    pub fn resolve(&self, pos: usize) -> Result<ResolvedPos, DocError> {
        let mut start = 0;
        for (index, block) in self.textblocks().iter().enumerate() {
            let len = block.len();
            if pos <= start + len {
                return Ok(ResolvedPos {
                    index,
                    offset: pos.saturating_sub(start),
                    start,
                });
            }
            start += len + 1;
        }
        Err(DocError::PositionOutOfRange {
            pos,
            len: self.len(),
        })
    }

    /// Position of the first character of textblock `index`.
    #[must_use]
    pub fn textblock_start(&self, index: usize) -> Option<usize> {
        let blocks = self.textblocks();
        if index >= blocks.len() {
            return None;
        }
        Some(blocks[..index].iter().map(|block| block.len() + 1).sum())
    }

    pub(crate) fn check_range(&self, from: usize, to: usize) -> Result<(), DocError> {
        if from > to || to > self.len() {
            return Err(DocError::InvalidRange { from, to });
        }
        Ok(())
    }

    /// Smallest range covering every inline carrying a mark that matches
    /// `predicate`.
    #[must_use]
    pub fn find_mark_range(&self, predicate: impl Fn(&Marks) -> bool) -> Option<(usize, usize)> {
        let mut found: Option<(usize, usize)> = None;
        let mut pos = 0;
        for block in self.textblocks() {
            match block {
                Textblock::Inline(inlines) => {
                    for inline in inlines {
                        let len = inline.len();
                        if len > 0 && inline.marks().is_some_and(&predicate) {
                            found = Some(match found {
                                Some((from, _)) => (from, pos + len),
                                None => (pos, pos + len),
                            });
                        }
                        pos += len;
                    }
                }
                Textblock::Code(code) => pos += code.chars().count(),
            }
            pos += 1;
        }
        found
    }

    /// Whether any inline carries `mark`.
    #[must_use]
    pub fn has_mark(&self, mark: &Mark) -> bool {
        self.find_mark_range(|marks| marks.contains(mark)).is_some()
    }

    /// Whether every markable inline overlapping `[from, to)` carries
    /// `mark`. Code blocks are skipped; a range with nothing markable has no
    /// mark.
    #[must_use]
    pub fn range_has_mark(&self, from: usize, to: usize, mark: &Mark) -> bool {
        let mut pos = 0;
        let mut seen = false;
        for block in self.textblocks() {
            match block {
                Textblock::Inline(inlines) => {
                    for inline in inlines {
                        let len = inline.len();
                        let overlaps = pos < to && from < pos + len;
                        if overlaps && let Some(marks) = inline.marks() {
                            if !marks.contains(mark) {
                                return false;
                            }
                            seen = true;
                        }
                        pos += len;
                    }
                }
                Textblock::Code(code) => pos += code.chars().count(),
            }
            pos += 1;
        }
        seen
    }
}

fn count_textblocks(blocks: &[Block], count: &mut usize) {
    for block in blocks {
        match block {
            Block::Heading { .. } | Block::Paragraph { .. } | Block::CodeBlock { .. } => *count += 1,
            Block::BlockQuote { blocks } => count_textblocks(blocks, count),
            Block::List(list) => list
                .items
                .iter()
                .for_each(|item| count_textblocks(&item.blocks, count)),
            Block::Table(table) => *count += table.cell_count(),
            Block::Rule => {}
        }
    }
}

fn collect_textblocks<'a>(blocks: &'a [Block], out: &mut Vec<Textblock<'a>>) {
    for block in blocks {
        match block {
            Block::Heading { content, .. } | Block::Paragraph { content } => {
                out.push(Textblock::Inline(content));
            }
            Block::CodeBlock { code, .. } => out.push(Textblock::Code(code)),
            Block::BlockQuote { blocks } => collect_textblocks(blocks, out),
            Block::List(list) => {
                for item in &list.items {
                    collect_textblocks(&item.blocks, out);
                }
            }
            Block::Table(table) => {
                for row in table.all_rows() {
                    out.extend(row.iter().map(|cell| Textblock::Inline(cell)));
                }
            }
            Block::Rule => {}
        }
    }
}

fn collect_textblocks_mut<'a>(blocks: &'a mut [Block], out: &mut Vec<TextblockMut<'a>>) {
    for block in blocks {
        match block {
            Block::Heading { content, .. } | Block::Paragraph { content } => {
                out.push(TextblockMut::Inline(content));
            }
            Block::CodeBlock { code, .. } => out.push(TextblockMut::Code(code)),
            Block::BlockQuote { blocks } => collect_textblocks_mut(blocks, out),
            Block::List(list) => {
                for item in &mut list.items {
                    collect_textblocks_mut(&mut item.blocks, out);
                }
            }
            Block::Table(table) => {
                for row in table.all_rows_mut() {
                    out.extend(row.iter_mut().map(TextblockMut::Inline));
                }
            }
            Block::Rule => {}
        }
    }
}

fn collect_paths(blocks: &[Block], prefix: &mut Vec<Seg>, out: &mut Vec<Vec<Seg>>) {
    for (index, block) in blocks.iter().enumerate() {
        prefix.push(Seg::Block(index));
        match block {
            Block::Heading { .. } | Block::Paragraph { .. } | Block::CodeBlock { .. } => {
                out.push(prefix.clone());
            }
            Block::BlockQuote { blocks } => collect_paths(blocks, prefix, out),
            Block::List(list) => {
                for (item_index, item) in list.items.iter().enumerate() {
                    prefix.push(Seg::Item(item_index));
                    collect_paths(&item.blocks, prefix, out);
                    prefix.pop();
                }
            }
            Block::Table(table) => {
                for (row, cells) in table.all_rows().enumerate() {
                    for col in 0..cells.len() {
                        let mut path = prefix.clone();
                        path.push(Seg::Cell(row, col));
                        out.push(path);
                    }
                }
            }
            Block::Rule => {}
        }
        prefix.pop();
    }
}

/// The block list a path of `Block`/`Item` segments leads into.
pub(crate) fn container_mut<'a>(
    mut blocks: &'a mut Vec<Block>,
    path: &[Seg],
) -> Option<&'a mut Vec<Block>> {
    let mut segs = path.iter();
    while let Some(seg) = segs.next() {
        let Seg::Block(index) = *seg else {
            return None;
        };
        blocks = match blocks.get_mut(index)? {
            Block::BlockQuote { blocks: inner } => inner,
            Block::List(list) => {
                let Some(Seg::Item(item)) = segs.next() else {
                    return None;
                };
                &mut list.items.get_mut(*item)?.blocks
            }
            _ => return None,
        };
    }
    Some(blocks)
}

// ---------------------------------------------------------------------------
// Inline helpers
// ---------------------------------------------------------------------------

pub(crate) fn inline_len(inlines: &[Inline]) -> usize {
    inlines.iter().map(Inline::len).sum()
}

/// Byte index of the `chars`-th character (or the end).
pub(crate) fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices().nth(chars).map_or(text.len(), |(i, _)| i)
}

/// Make `offset` an inline boundary. Returns the index of the first inline
/// at or after it.
pub(crate) fn split_inlines_at(inlines: &mut Vec<Inline>, offset: usize) -> usize {
    let mut pos = 0;
    for index in 0..inlines.len() {
        if pos == offset {
            return index;
        }
        let len = inlines[index].len();
        if offset < pos + len {
            if let Inline::Text { text, marks } = &mut inlines[index] {
                let tail = text.split_off(byte_offset(text, offset - pos));
                let marks = marks.clone();
                inlines.insert(index + 1, Inline::Text { text: tail, marks });
            }
            return index + 1;
        }
        pos += len;
    }
    inlines.len()
}

/// Remove and return the inlines covering `[from, to)`.
pub(crate) fn cut_inlines(inlines: &mut Vec<Inline>, from: usize, to: usize) -> Vec<Inline> {
    let start = split_inlines_at(inlines, from);
    let end = split_inlines_at(inlines, to);
    inlines.drain(start..end).collect()
}

/// Marks of the inline just before `offset` and the one at it.
pub(crate) fn marks_around(inlines: &[Inline], offset: usize) -> (Option<&Marks>, Option<&Marks>) {
    let mut pos = 0;
    let mut before = None;
    for inline in inlines {
        let len = inline.len();
        if len == 0 {
            continue;
        }
        if offset > pos && offset < pos + len {
            return (inline.marks(), inline.marks());
        }
        if offset == pos {
            return (before, inline.marks());
        }
        before = inline.marks();
        pos += len;
    }
    (before, None)
}

/// Drop empty text and merge neighbours with identical marks.
pub(crate) fn normalize_inlines(inlines: &mut Vec<Inline>) {
    let mut out: Vec<Inline> = Vec::with_capacity(inlines.len());
    for inline in inlines.drain(..) {
        if let Inline::Text { text, .. } = &inline
            && text.is_empty()
        {
            continue;
        }
        if let (
            Some(Inline::Text {
                text: prev,
                marks: prev_marks,
            }),
            Inline::Text { text, marks },
        ) = (out.last_mut(), &inline)
            && prev_marks == marks
        {
            prev.push_str(text);
            continue;
        }
        out.push(inline);
    }
    *inlines = out;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marks::MarkSet;

    fn sample() -> Document {
        Document::from_blocks(vec![
            Block::heading(1, "Title"),
            Block::paragraph("body"),
            Block::Rule,
            Block::List(List {
                start: None,
                delimiter: ListDelimiter::Period,
                tight: true,
                items: vec![
                    ListItem::paragraph(vec![Inline::text("one")]),
                    ListItem::paragraph(vec![Inline::text("two")]),
                ],
            }),
        ])
    }

    #[test]
    fn flattened_text_joins_textblocks() {
        let doc = sample();
        assert_eq!(doc.text(), "Title\nbody\none\ntwo");
        assert_eq!(doc.len(), 18);
        assert_eq!(doc.text().chars().count(), doc.len());
    }

    #[test]
    fn resolve_maps_positions_to_textblocks() {
        let doc = sample();
        assert_eq!(
            doc.resolve(5),
            Ok(ResolvedPos {
                index: 0,
                offset: 5,
                start: 0
            })
        );
        assert_eq!(
            doc.resolve(6),
            Ok(ResolvedPos {
                index: 1,
                offset: 0,
                start: 6
            })
        );
        assert_eq!(doc.resolve(18).map(|r| r.index), Ok(3));
        assert!(doc.resolve(19).is_err());
        assert_eq!(doc.textblock_start(2), Some(11));
    }

    #[test]
    fn empty_blocks_get_a_paragraph() {
        let doc = Document::from_blocks(vec![Block::Rule]);
        assert_eq!(doc.textblocks().len(), 1);
        assert_eq!(doc.len(), 0);
    }

    #[test]
    fn cut_inlines_splits_text() {
        let mut inlines = vec![
            Inline::text("hello "),
            Inline::marked("world", Marks::styled(MarkSet::BOLD)),
        ];
        let cut = cut_inlines(&mut inlines, 3, 8);
        assert_eq!(
            cut,
            vec![
                Inline::text("lo "),
                Inline::marked("wo", Marks::styled(MarkSet::BOLD))
            ]
        );
        assert_eq!(
            inlines,
            vec![
                Inline::text("hel"),
                Inline::marked("rld", Marks::styled(MarkSet::BOLD))
            ]
        );
    }

    #[test]
    fn normalize_merges_equal_marks() {
        let mut inlines = vec![
            Inline::text("a"),
            Inline::text(""),
            Inline::text("b"),
            Inline::HardBreak,
            Inline::text("c"),
        ];
        normalize_inlines(&mut inlines);
        assert_eq!(
            inlines,
            vec![Inline::text("ab"), Inline::HardBreak, Inline::text("c")]
        );
    }

    #[test]
    fn mark_ranges_span_inlines() {
        let comment = quire_core::CommentId::MIN;
        let mut marks = Marks::default();
        marks.comments.insert(comment);
        let doc = Document::from_blocks(vec![Block::Paragraph {
            content: vec![
                Inline::text("ab"),
                Inline::marked("cd", marks.clone()),
                Inline::marked("e", marks),
            ],
        }]);
        assert_eq!(
            doc.find_mark_range(|m| m.comments.contains(&comment)),
            Some((2, 5))
        );
        assert!(doc.has_mark(&Mark::Comment(comment)));
    }

    #[test]
    fn range_has_mark_needs_full_coverage() {
        let bold = Mark::Style(MarkSet::BOLD);
        let doc = Document::from_blocks(vec![Block::Paragraph {
            content: vec![
                Inline::text("ab"),
                Inline::marked("cd", Marks::styled(MarkSet::BOLD)),
            ],
        }]);
        assert!(doc.range_has_mark(2, 4, &bold));
        assert!(doc.range_has_mark(3, 4, &bold));
        assert!(!doc.range_has_mark(1, 4, &bold));
        assert!(!doc.range_has_mark(4, 4, &bold));
    }
}
