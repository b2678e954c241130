#![forbid(unsafe_code)]

//! Content edits on [`Document`].
//!
//! Every edit that moves positions returns the [`StepMap`] describing it.
//! Mark edits never move positions.

use crate::document::{
    Block, Document, Inline, Seg, Textblock, TextblockMut, byte_offset, container_mut, cut_inlines,
    inline_len, marks_around, normalize_inlines, split_inlines_at,
};
use crate::error::DocError;
use crate::mapping::StepMap;
use crate::marks::{Mark, Marks};

impl Document {
    /// Insert plain text at `pos`. The text takes the marks of the character
    /// before it (links and comment anchors only when typing inside them).
    pub fn insert_text(&mut self, pos: usize, text: &str) -> Result<StepMap, DocError> {
        let resolved = self.resolve(pos)?;
        if text.is_empty() {
            return Ok(StepMap::IDENTITY);
        }
        if let Some(block) = self.textblocks_mut().get_mut(resolved.index) {
            insert_into(block, resolved.offset, text);
        }
        tracing::trace!(pos, len = text.chars().count(), "text inserted");
        Ok(StepMap::insert(pos, text.chars().count()))
    }

    /// Delete `[from, to)`. A range spanning textblocks joins the tail of the
    /// last one onto the first and drops the blocks in between.
    pub fn delete_range(&mut self, from: usize, to: usize) -> Result<StepMap, DocError> {
        self.check_range(from, to)?;
        if from == to {
            return Ok(StepMap::IDENTITY);
        }
        let start = self.resolve(from)?;
        let end = self.resolve(to)?;
        if start.index == end.index {
            let mut blocks = self.textblocks_mut();
            if let Some(block) = blocks.get_mut(start.index) {
                cut_block(block, start.offset, end.offset);
            }
        } else {
            self.join_across(start.index, start.offset, end.index, end.offset);
        }
        tracing::trace!(from, to, "range deleted");
        Ok(StepMap::delete(from, to))
    }

    /// Replace `[from, to)` with plain text.
    pub fn replace_range(&mut self, from: usize, to: usize, text: &str) -> Result<StepMap, DocError> {
        self.check_range(from, to)?;
        let marks = self.marks_at(from);
        self.delete_range(from, to)?;
        if !text.is_empty() {
            let resolved = self.resolve(from)?;
            let mut blocks = self.textblocks_mut();
            match blocks.get_mut(resolved.index) {
                Some(TextblockMut::Inline(inlines)) if to > from => {
                    let index = split_inlines_at(inlines, resolved.offset);
                    inlines.insert(index, Inline::marked(text, marks));
                    normalize_inlines(inlines);
                }
                Some(block) => insert_into(block, resolved.offset, text),
                None => {}
            }
        }
        Ok(StepMap::replace(from, to - from, text.chars().count()))
    }

    /// Marks of the character at `pos`, minus anchors that do not spread.
    fn marks_at(&self, pos: usize) -> Marks {
        let Ok(resolved) = self.resolve(pos) else {
            return Marks::default();
        };
        match self.textblocks().get(resolved.index) {
            Some(Textblock::Inline(inlines)) => {
                let (_, at) = marks_around(inlines, resolved.offset);
                at.map(|marks| Marks::styled(marks.style)).unwrap_or_default()
            }
            _ => Marks::default(),
        }
    }

    /// Add `mark` to every inline in `[from, to)`. Code blocks take no marks.
    pub fn add_mark(&mut self, from: usize, to: usize, mark: &Mark) -> Result<(), DocError> {
        self.for_each_inline_in(from, to, |marks| {
            marks.add(mark);
            0
        })?;
        Ok(())
    }

    /// Remove every mark matching `predicate` from `[from, to)`. Returns how
    /// many individual marks were removed.
    pub fn remove_marks_where(
        &mut self,
        from: usize,
        to: usize,
        predicate: &dyn Fn(&Mark) -> bool,
    ) -> Result<usize, DocError> {
        self.for_each_inline_in(from, to, |marks| marks.remove_where(predicate))
    }

    fn for_each_inline_in(
        &mut self,
        from: usize,
        to: usize,
        mut apply: impl FnMut(&mut Marks) -> usize,
    ) -> Result<usize, DocError> {
        self.check_range(from, to)?;
        let mut total = 0;
        let mut pos = 0;
        for block in self.textblocks_mut() {
            let inlines = match block {
                TextblockMut::Inline(inlines) => inlines,
                TextblockMut::Code(code) => {
                    pos += code.chars().count() + 1;
                    continue;
                }
            };
            let len = inline_len(inlines);
            let lo = from.max(pos);
            let hi = to.min(pos + len);
            if lo < hi {
                let first = split_inlines_at(inlines, lo - pos);
                let last = split_inlines_at(inlines, hi - pos);
                for inline in &mut inlines[first..last] {
                    if let Some(marks) = inline.marks_mut() {
                        total += apply(marks);
                    }
                }
                normalize_inlines(inlines);
            }
            pos += len + 1;
        }
        Ok(total)
    }

    /// Insert parsed blocks at `pos`.
    ///
    /// A single paragraph is inserted inline. Otherwise the textblock at
    /// `pos` is split, leading and trailing paragraphs are merged into the
    /// two halves, and the rest become sibling blocks. Inside code blocks
    /// and table cells the blocks are inserted as plain text.
    pub fn insert_blocks(&mut self, pos: usize, blocks: Vec<Block>) -> Result<StepMap, DocError> {
        let resolved = self.resolve(pos)?;
        if blocks.is_empty() {
            return Ok(StepMap::IDENTITY);
        }
        let old_len = self.len();

        if let [Block::Paragraph { content }] = blocks.as_slice() {
            let content = content.clone();
            let added = inline_len(&content);
            let mut textblocks = self.textblocks_mut();
            match textblocks.get_mut(resolved.index) {
                Some(TextblockMut::Inline(inlines)) => {
                    let index = split_inlines_at(inlines, resolved.offset);
                    inlines.splice(index..index, content);
                    normalize_inlines(inlines);
                }
                Some(block) => {
                    let text = Document::from_blocks(blocks).text();
                    insert_into(block, resolved.offset, &text);
                }
                None => {}
            }
            return Ok(StepMap::insert(pos, added));
        }

        let paths = self.textblock_paths();
        let Some(path) = paths.get(resolved.index) else {
            return Err(DocError::PositionOutOfRange { pos, len: old_len });
        };
        let Some((Seg::Block(index), parent)) = path.split_last() else {
            return self.insert_as_text(pos, blocks);
        };
        let index = *index;
        let Some(container) = container_mut(&mut self.blocks, parent) else {
            return self.insert_as_text(pos, blocks);
        };
        let (head_empty, mut tail) = match container.get_mut(index) {
            Some(Block::Paragraph { content } | Block::Heading { content, .. }) => {
                let len = inline_len(content);
                let tail = cut_inlines(content, resolved.offset, len);
                (content.is_empty(), tail)
            }
            _ => return self.insert_as_text(pos, blocks),
        };

        let mut blocks = blocks;
        // Merge a leading paragraph into the head, a trailing one into the tail.
        if !head_empty
            && matches!(blocks.first(), Some(Block::Paragraph { .. }))
            && let Block::Paragraph { content } = blocks.remove(0)
            && let Some(Block::Paragraph { content: head } | Block::Heading { content: head, .. }) =
                container.get_mut(index)
        {
            head.extend(content);
            normalize_inlines(head);
        }
        if matches!(blocks.last(), Some(Block::Paragraph { .. }))
            && let Some(Block::Paragraph { content: mut last }) = blocks.pop()
        {
            last.append(&mut tail);
            normalize_inlines(&mut last);
            tail = last;
        }
        if !tail.is_empty() {
            blocks.push(Block::Paragraph { content: tail });
        }

        let mut insert_at = index + 1;
        if head_empty {
            container.remove(index);
            insert_at = index;
        }
        let inserted = blocks.len();
        container.splice(insert_at..insert_at, blocks);
        if container.is_empty() {
            container.push(Block::Paragraph {
                content: Vec::new(),
            });
        }

        let new_len = self.len();
        tracing::debug!(pos, blocks = inserted, "blocks inserted");
        Ok(StepMap::replace(pos, 0, new_len.saturating_sub(old_len)))
    }

    fn insert_as_text(&mut self, pos: usize, blocks: Vec<Block>) -> Result<StepMap, DocError> {
        let text = Document::from_blocks(blocks).text();
        self.insert_text(pos, &text)
    }

    fn join_across(&mut self, first: usize, first_offset: usize, last: usize, last_offset: usize) {
        let mut textblocks = self.textblocks_mut();
        let tail = match textblocks.get_mut(last) {
            Some(TextblockMut::Inline(inlines)) => {
                let len = inline_len(inlines);
                Tail::Inline(cut_inlines(inlines, last_offset, len))
            }
            Some(TextblockMut::Code(code)) => {
                let at = byte_offset(code, last_offset);
                Tail::Text(code.split_off(at))
            }
            None => Tail::Text(String::new()),
        };
        for block in textblocks.iter_mut().take(last + 1).skip(first + 1) {
            match block {
                TextblockMut::Inline(inlines) => inlines.clear(),
                TextblockMut::Code(code) => code.clear(),
            }
        }
        if let Some(block) = textblocks.get_mut(first) {
            let len = match block {
                TextblockMut::Inline(inlines) => inline_len(inlines),
                TextblockMut::Code(code) => code.chars().count(),
            };
            cut_block(block, first_offset, len);
            match (block, tail) {
                (TextblockMut::Inline(inlines), Tail::Inline(tail)) => {
                    inlines.extend(tail);
                    normalize_inlines(inlines);
                }
                (TextblockMut::Inline(inlines), Tail::Text(text)) => {
                    inlines.push(Inline::text(text));
                    normalize_inlines(inlines);
                }
                (TextblockMut::Code(code), tail) => code.push_str(&tail.into_text()),
            }
        }
        drop(textblocks);

        let mut counter = 0;
        prune_range(&mut self.blocks, &mut counter, first, last);
        if self.textblocks().is_empty() {
            self.blocks.push(Block::Paragraph {
                content: Vec::new(),
            });
        }
    }
}

enum Tail {
    Inline(Vec<Inline>),
    Text(String),
}

impl Tail {
    fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Inline(inlines) => {
                let mut doc = Document::from_blocks(Vec::new());
                if let Some(Block::Paragraph { content }) = doc.blocks.first_mut() {
                    *content = inlines;
                }
                doc.text()
            }
        }
    }
}

fn insert_into(block: &mut TextblockMut<'_>, offset: usize, text: &str) {
    match block {
        TextblockMut::Inline(inlines) => {
            let (before, after) = marks_around(inlines, offset);
            let marks = Marks::inherited(before, after);
            let index = split_inlines_at(inlines, offset);
            inlines.insert(index, Inline::marked(text, marks));
            normalize_inlines(inlines);
        }
        TextblockMut::Code(code) => {
            let at = byte_offset(code, offset);
            code.insert_str(at, text);
        }
    }
}

fn cut_block(block: &mut TextblockMut<'_>, from: usize, to: usize) {
    match block {
        TextblockMut::Inline(inlines) => {
            cut_inlines(inlines, from, to);
            normalize_inlines(inlines);
        }
        TextblockMut::Code(code) => {
            let start = byte_offset(code, from);
            let end = byte_offset(code, to);
            code.replace_range(start..end, "");
        }
    }
}

/// Drop textblocks `(first, last]` (already emptied) and the rules between
/// them, then containers left with nothing in them. Table cells stay; a
/// table disappears only when all of its cells were in range.
fn prune_range(blocks: &mut Vec<Block>, counter: &mut usize, first: usize, last: usize) {
    let in_range = |index: usize| index > first && index <= last;
    blocks.retain_mut(|block| match block {
        Block::Heading { .. } | Block::Paragraph { .. } | Block::CodeBlock { .. } => {
            let index = *counter;
            *counter += 1;
            !in_range(index)
        }
        Block::Rule => !in_range(*counter),
        Block::BlockQuote { blocks } => {
            prune_range(blocks, counter, first, last);
            !blocks.is_empty()
        }
        Block::List(list) => {
            list.items.retain_mut(|item| {
                prune_range(&mut item.blocks, counter, first, last);
                !item.blocks.is_empty()
            });
            !list.items.is_empty()
        }
        Block::Table(table) => {
            let cells: usize = table.all_rows().map(Vec::len).sum();
            let begin = *counter;
            *counter += cells;
            !(cells > 0 && in_range(begin) && in_range(begin + cells - 1))
        }
    });
}
