#![forbid(unsafe_code)]

//! The rich-text engine seam.
//!
//! Higher layers (comments, search, outline, the session) talk to an editor
//! only through [`RichTextEngine`]. [`MarkdownEditor`] is the in-process
//! implementation over [`Document`]; a host embedding another editor
//! component implements the trait against it instead.

use crate::document::{Block, Document};
use crate::error::DocError;
use crate::mapping::{Assoc, Mapping, StepMap};
use crate::marks::Mark;
use crate::parse::parse_markdown;
use crate::serialize::to_markdown;

/// A text selection. `anchor` stays put while `head` moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub anchor: usize,
    pub head: usize,
}

impl Selection {
    #[must_use]
    pub const fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    #[must_use]
    pub const fn cursor(pos: usize) -> Self {
        Self {
            anchor: pos,
            head: pos,
        }
    }

    #[must_use]
    pub fn from(&self) -> usize {
        self.anchor.min(self.head)
    }

    #[must_use]
    pub fn to(&self) -> usize {
        self.anchor.max(self.head)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.anchor == self.head
    }

    fn map(self, mapping: &Mapping) -> Self {
        Self {
            anchor: mapping.map(self.anchor, Assoc::After),
            head: mapping.map(self.head, Assoc::After),
        }
    }
}

/// Where a scrolled-to range should land in the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollAlign {
    #[default]
    Nearest,
    Center,
}

/// A pending request for the view to bring a range into sight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollRequest {
    pub from: usize,
    pub to: usize,
    pub align: ScrollAlign,
    /// Also move keyboard focus to the editor.
    pub focus_editor: bool,
}

/// Operations the rest of the crate needs from an editor.
///
/// Content edits record their [`StepMap`]s; [`take_changes`] drains them so
/// dependants can remap stored positions.
///
/// [`take_changes`]: RichTextEngine::take_changes
pub trait RichTextEngine {
    fn document(&self) -> &Document;

    /// Replace the whole document. The selection collapses to the start and
    /// pending changes are dropped, since old positions mean nothing in the
    /// new content.
    fn set_document(&mut self, doc: Document);

    fn insert_text(&mut self, pos: usize, text: &str) -> Result<(), DocError>;
    fn delete_range(&mut self, from: usize, to: usize) -> Result<(), DocError>;
    fn replace_range(&mut self, from: usize, to: usize, text: &str) -> Result<(), DocError>;
    fn insert_blocks(&mut self, pos: usize, blocks: Vec<Block>) -> Result<(), DocError>;

    fn add_mark(&mut self, from: usize, to: usize, mark: &Mark) -> Result<(), DocError>;
    /// Remove marks matching `predicate` in `[from, to)`; returns how many
    /// inline marks were removed.
    fn remove_marks_where(
        &mut self,
        from: usize,
        to: usize,
        predicate: &dyn Fn(&Mark) -> bool,
    ) -> Result<usize, DocError>;

    fn sink_list_item(&mut self, pos: usize) -> Result<bool, DocError>;
    fn lift_list_item(&mut self, pos: usize) -> Result<bool, DocError>;

    fn selection(&self) -> Selection;
    fn set_selection(&mut self, selection: Selection) -> Result<(), DocError>;
    fn scroll_into_view(&mut self, request: ScrollRequest);
    fn take_scroll_request(&mut self) -> Option<ScrollRequest>;

    /// Bumped by every change to content or marks.
    fn revision(&self) -> u64;
    /// Position changes since the last call, or `None` if there were none.
    fn take_changes(&mut self) -> Option<Mapping>;
}

/// [`RichTextEngine`] over an owned [`Document`].
#[derive(Debug, Clone, Default)]
pub struct MarkdownEditor {
    doc: Document,
    selection: Selection,
    revision: u64,
    pending: Mapping,
    scroll: Option<ScrollRequest>,
}

impl MarkdownEditor {
    #[must_use]
    pub fn new(doc: Document) -> Self {
        Self {
            doc,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn from_markdown(markdown: &str) -> Self {
        Self::new(parse_markdown(markdown))
    }

    #[must_use]
    pub fn to_markdown(&self) -> String {
        to_markdown(&self.doc)
    }

    fn record(&mut self, map: StepMap) {
        self.revision += 1;
        if map.is_identity() {
            return;
        }
        self.selection = self.selection.map(&Mapping::from(map));
        self.pending.push(map);
    }
}

impl RichTextEngine for MarkdownEditor {
    fn document(&self) -> &Document {
        &self.doc
    }

    fn set_document(&mut self, doc: Document) {
        self.doc = doc;
        self.selection = Selection::default();
        self.pending = Mapping::new();
        self.revision += 1;
    }

    fn insert_text(&mut self, pos: usize, text: &str) -> Result<(), DocError> {
        let map = self.doc.insert_text(pos, text)?;
        self.record(map);
        Ok(())
    }

    fn delete_range(&mut self, from: usize, to: usize) -> Result<(), DocError> {
        let map = self.doc.delete_range(from, to)?;
        self.record(map);
        Ok(())
    }

    fn replace_range(&mut self, from: usize, to: usize, text: &str) -> Result<(), DocError> {
        let map = self.doc.replace_range(from, to, text)?;
        self.record(map);
        Ok(())
    }

    fn insert_blocks(&mut self, pos: usize, blocks: Vec<Block>) -> Result<(), DocError> {
        let map = self.doc.insert_blocks(pos, blocks)?;
        self.record(map);
        Ok(())
    }

    fn add_mark(&mut self, from: usize, to: usize, mark: &Mark) -> Result<(), DocError> {
        self.doc.add_mark(from, to, mark)?;
        self.revision += 1;
        Ok(())
    }

    fn remove_marks_where(
        &mut self,
        from: usize,
        to: usize,
        predicate: &dyn Fn(&Mark) -> bool,
    ) -> Result<usize, DocError> {
        let removed = self.doc.remove_marks_where(from, to, predicate)?;
        if removed > 0 {
            self.revision += 1;
        }
        Ok(removed)
    }

    fn sink_list_item(&mut self, pos: usize) -> Result<bool, DocError> {
        let changed = self.doc.sink_list_item(pos)?;
        if changed {
            self.revision += 1;
        }
        Ok(changed)
    }

    fn lift_list_item(&mut self, pos: usize) -> Result<bool, DocError> {
        let changed = self.doc.lift_list_item(pos)?;
        if changed {
            self.revision += 1;
        }
        Ok(changed)
    }

    fn selection(&self) -> Selection {
        self.selection
    }

    fn set_selection(&mut self, selection: Selection) -> Result<(), DocError> {
        let len = self.doc.len();
        if selection.to() > len {
            return Err(DocError::PositionOutOfRange {
                pos: selection.to(),
                len,
            });
        }
        self.selection = selection;
        Ok(())
    }

    fn scroll_into_view(&mut self, request: ScrollRequest) {
        self.scroll = Some(request);
    }

    fn take_scroll_request(&mut self) -> Option<ScrollRequest> {
        self.scroll.take()
    }

    fn revision(&self) -> u64 {
        self.revision
    }

    fn take_changes(&mut self) -> Option<Mapping> {
        if self.pending.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.pending))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_follows_edits() {
        let mut editor = MarkdownEditor::from_markdown("hello world\n");
        editor.set_selection(Selection::new(6, 11)).expect("in range");
        editor.insert_text(0, ">> ").expect("insert");
        assert_eq!(editor.selection(), Selection::new(9, 14));
        editor.delete_range(0, 3).expect("delete");
        assert_eq!(editor.selection(), Selection::new(6, 11));
    }

    #[test]
    fn changes_are_drained_once() {
        let mut editor = MarkdownEditor::from_markdown("abc\n");
        assert!(editor.take_changes().is_none());
        editor.insert_text(3, "d").expect("insert");
        editor.insert_text(0, "z").expect("insert");
        let changes = editor.take_changes().expect("two steps");
        assert_eq!(changes.maps().len(), 2);
        assert_eq!(changes.map(3, Assoc::After), 5);
        assert!(editor.take_changes().is_none());
        assert_eq!(editor.revision(), 2);
    }

    #[test]
    fn mark_edits_do_not_produce_changes() {
        let mut editor = MarkdownEditor::from_markdown("abc\n");
        editor
            .add_mark(0, 2, &Mark::Style(crate::marks::MarkSet::BOLD))
            .expect("mark");
        assert!(editor.take_changes().is_none());
        assert_eq!(editor.to_markdown(), "**ab**c\n");
    }

    #[test]
    fn selection_out_of_range_is_rejected() {
        let mut editor = MarkdownEditor::from_markdown("abc\n");
        assert!(editor.set_selection(Selection::cursor(9)).is_err());
        assert_eq!(editor.selection(), Selection::cursor(0));
    }

    #[test]
    fn set_document_resets_state() {
        let mut editor = MarkdownEditor::from_markdown("abc\n");
        editor.insert_text(0, "x").expect("insert");
        editor.set_document(parse_markdown("new\n"));
        assert!(editor.take_changes().is_none());
        assert_eq!(editor.selection(), Selection::default());
    }
}
