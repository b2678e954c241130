#![forbid(unsafe_code)]

//! Comments anchored to document ranges.
//!
//! Each comment has a record here and a [`Mark::Comment`] over its range in
//! the document. The mark moves with the text; after every change the
//! session maps the stored anchors through the step maps and then re-reads
//! them from the marks. A comment whose range was deleted is orphaned: it
//! keeps its record but has no place in the text.

use std::time::SystemTime;

use quire_core::{CommentId, IdAllocator};
use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::editor::{RichTextEngine, ScrollAlign, ScrollRequest, Selection};
use crate::error::DocError;
use crate::mapping::{Assoc, Mapping};
use crate::marks::Mark;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentStatus {
    #[default]
    Open,
    Resolved,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    /// The file the comment belongs to.
    pub file_id: String,
    pub text: String,
    pub status: CommentStatus,
    /// Anchor start, kept current through edits.
    pub start: usize,
    /// Anchor end (exclusive).
    pub end: usize,
    /// The anchored text when the comment was made.
    pub selected_text: String,
    pub created_at: SystemTime,
    /// The anchored text is gone.
    #[serde(default)]
    pub orphaned: bool,
}

/// Comment records of one document.
#[derive(Debug, Clone)]
pub struct CommentStore {
    file_id: String,
    comments: Vec<Comment>,
    ids: IdAllocator,
}

impl CommentStore {
    #[must_use]
    pub fn new(file_id: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
            comments: Vec::new(),
            ids: IdAllocator::new(),
        }
    }

    #[must_use]
    pub fn file_id(&self) -> &str {
        &self.file_id
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.comments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: CommentId) -> Option<&Comment> {
        self.comments.iter().find(|comment| comment.id == id)
    }

    /// Comments ordered by anchor; orphaned ones last.
    #[must_use]
    pub fn list(&self) -> Vec<&Comment> {
        let mut list: Vec<&Comment> = self.comments.iter().collect();
        list.sort_by_key(|comment| (comment.orphaned, comment.start, comment.end, comment.id));
        list
    }

    /// Comment on the engine's current selection.
    pub fn add<E: RichTextEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        text: impl Into<String>,
        now: SystemTime,
    ) -> Result<CommentId, DocError> {
        let selection = engine.selection();
        if selection.is_empty() {
            return Err(DocError::EmptySelection);
        }
        let (start, end) = (selection.from(), selection.to());
        let selected_text = engine.document().text_between(start, end)?;
        let id = self.ids.allocate_comment();
        engine.add_mark(start, end, &Mark::Comment(id))?;
        if anchor_from_marks(engine.document(), id).is_none() {
            return Err(DocError::NotMarkable {
                from: start,
                to: end,
            });
        }
        self.comments.push(Comment {
            id,
            file_id: self.file_id.clone(),
            text: text.into(),
            status: CommentStatus::Open,
            start,
            end,
            selected_text,
            created_at: now,
            orphaned: false,
        });
        tracing::debug!(comment_id = %id, start, end, "comment added");
        Ok(id)
    }

    pub fn update_text(&mut self, id: CommentId, text: impl Into<String>) -> Result<(), DocError> {
        self.get_mut(id)?.text = text.into();
        Ok(())
    }

    pub fn resolve(&mut self, id: CommentId) -> Result<(), DocError> {
        self.get_mut(id)?.status = CommentStatus::Resolved;
        Ok(())
    }

    pub fn reopen(&mut self, id: CommentId) -> Result<(), DocError> {
        self.get_mut(id)?.status = CommentStatus::Open;
        Ok(())
    }

    /// Remove the record and strip its mark from the whole document.
    pub fn delete<E: RichTextEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        id: CommentId,
    ) -> Result<Comment, DocError> {
        let index = self
            .comments
            .iter()
            .position(|comment| comment.id == id)
            .ok_or(DocError::UnknownComment(id))?;
        let len = engine.document().len();
        let stripped =
            engine.remove_marks_where(0, len, &|mark: &Mark| mark.comment_id() == Some(id))?;
        let comment = self.comments.remove(index);
        tracing::debug!(comment_id = %id, stripped, "comment deleted");
        Ok(comment)
    }

    /// Select the anchored range and scroll it into view.
    pub fn activate<E: RichTextEngine + ?Sized>(
        &self,
        engine: &mut E,
        id: CommentId,
    ) -> Result<(), DocError> {
        let comment = self.get(id).ok_or(DocError::UnknownComment(id))?;
        let len = engine.document().len();
        let (start, end) = (comment.start.min(len), comment.end.min(len));
        engine.set_selection(Selection::new(start, end))?;
        engine.scroll_into_view(ScrollRequest {
            from: start,
            to: end,
            align: ScrollAlign::Center,
            focus_editor: true,
        });
        Ok(())
    }

    /// Map every anchor through `mapping`. Starts stick after insertions at
    /// the boundary and ends before, so text typed at an edge stays outside.
    pub fn remap(&mut self, mapping: &Mapping) {
        for comment in &mut self.comments {
            if comment.orphaned {
                continue;
            }
            let start = mapping.map(comment.start, Assoc::After);
            let end = mapping.map(comment.end, Assoc::Before);
            if start >= end {
                comment.start = start;
                comment.end = start;
                comment.orphaned = true;
                tracing::debug!(comment_id = %comment.id, "comment anchor orphaned");
            } else {
                comment.start = start;
                comment.end = end;
            }
        }
    }

    /// Overwrite mapped anchors with the ranges of their marks, where the
    /// document still carries them.
    pub fn refresh_from_marks(&mut self, doc: &Document) {
        for comment in &mut self.comments {
            if let Some((start, end)) = anchor_from_marks(doc, comment.id) {
                comment.start = start;
                comment.end = end;
                comment.orphaned = false;
            }
        }
    }

    /// Put marks back for comments loaded from storage. Anchors that no
    /// longer fit the document are orphaned.
    pub fn reattach<E: RichTextEngine + ?Sized>(&mut self, engine: &mut E) {
        let len = engine.document().len();
        for comment in &mut self.comments {
            if comment.orphaned || anchor_from_marks(engine.document(), comment.id).is_some() {
                continue;
            }
            let fits = comment.start < comment.end && comment.end <= len;
            if !fits || engine
                .add_mark(comment.start, comment.end, &Mark::Comment(comment.id))
                .is_err()
            {
                comment.orphaned = true;
                tracing::warn!(comment_id = %comment.id, "comment anchor does not fit the document");
            }
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.comments)
    }

    /// Load records written by [`to_json`](Self::to_json). New ids continue
    /// after the largest loaded one.
    pub fn from_json(file_id: impl Into<String>, json: &str) -> Result<Self, serde_json::Error> {
        let comments: Vec<Comment> = serde_json::from_str(json)?;
        let next = comments
            .iter()
            .map(|comment| comment.id.get())
            .max()
            .map_or(1, |max| max.saturating_add(1));
        Ok(Self {
            file_id: file_id.into(),
            comments,
            ids: IdAllocator::with_next(next),
        })
    }

    fn get_mut(&mut self, id: CommentId) -> Result<&mut Comment, DocError> {
        self.comments
            .iter_mut()
            .find(|comment| comment.id == id)
            .ok_or(DocError::UnknownComment(id))
    }
}

/// Range covered by the mark of comment `id`, if any text carries it.
#[must_use]
pub fn anchor_from_marks(doc: &Document, id: CommentId) -> Option<(usize, usize)> {
    doc.find_mark_range(|marks| marks.comments.contains(&id))
}
