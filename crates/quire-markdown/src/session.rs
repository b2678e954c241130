#![forbid(unsafe_code)]

//! One open markdown document with its derived views.
//!
//! A [`MarkdownSession`] owns the editing engine plus the outline, search
//! and comment state built on top of it. Every operation that can change the
//! document ends in [`refresh`](MarkdownSession::refresh), which drains the
//! engine's step maps into the comment anchors and recomputes the outline
//! and search matches.

use std::time::{Instant, SystemTime};

use quire_core::{CommentId, QuireConfig};

use crate::comments::{Comment, CommentStore};
use crate::editor::{MarkdownEditor, RichTextEngine, ScrollAlign, ScrollRequest, Selection};
use crate::error::DocError;
use crate::html::to_html;
use crate::mapping::Mapping;
use crate::marks::{Link, Mark, MarkSet};
use crate::outline::{OutlineEntry, extract_outline};
use crate::parse::parse_markdown;
use crate::paste::{PasteKind, paste};
use crate::search::{SearchDecoration, SearchMatch, SearchState};
use crate::serialize::to_markdown;

#[derive(Debug)]
pub struct MarkdownSession<E: RichTextEngine = MarkdownEditor> {
    engine: E,
    outline: Vec<OutlineEntry>,
    search: SearchState,
    comments: CommentStore,
    seen_revision: u64,
}

impl MarkdownSession<MarkdownEditor> {
    /// Open `markdown` in the built-in editor.
    #[must_use]
    pub fn new(file_id: impl Into<String>, markdown: &str, config: &QuireConfig) -> Self {
        Self::with_engine(file_id, MarkdownEditor::from_markdown(markdown), config)
    }
}

impl<E: RichTextEngine> MarkdownSession<E> {
    pub fn with_engine(file_id: impl Into<String>, engine: E, config: &QuireConfig) -> Self {
        let mut session = Self {
            engine,
            outline: Vec::new(),
            search: SearchState::new(config.search_debounce()),
            comments: CommentStore::new(file_id),
            seen_revision: 0,
        };
        session.engine.take_changes();
        session.recompute();
        session
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Direct engine access. Call [`refresh`](Self::refresh) after editing
    /// through it.
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn file_id(&self) -> &str {
        self.comments.file_id()
    }

    pub fn markdown(&self) -> String {
        to_markdown(self.engine.document())
    }

    pub fn html(&self) -> String {
        to_html(self.engine.document())
    }

    /// Replace the content, e.g. after an external change. Comment marks are
    /// put back where the stored anchors still fit.
    pub fn load_markdown(&mut self, markdown: &str) {
        self.engine.set_document(parse_markdown(markdown));
        self.comments.reattach(&mut self.engine);
        self.engine.take_changes();
        self.recompute();
        tracing::debug!(file_id = %self.file_id(), "markdown loaded");
    }

    /// Fold pending engine changes into the derived views.
    pub fn refresh(&mut self) {
        let changes = self.engine.take_changes();
        if let Some(changes) = &changes {
            self.comments.remap(changes);
        }
        if self.engine.revision() != self.seen_revision {
            self.comments.refresh_from_marks(self.engine.document());
            self.recompute_with(changes.as_ref());
        }
    }

    fn recompute(&mut self) {
        self.recompute_with(None);
    }

    fn recompute_with(&mut self, changes: Option<&Mapping>) {
        let doc = self.engine.document();
        self.outline = extract_outline(doc);
        let text = doc.text();
        match changes {
            Some(changes) => self.search.recompute_mapped(&text, changes),
            None => self.search.recompute(&text),
        }
        self.seen_revision = self.engine.revision();
    }

    // -- editing ------------------------------------------------------------

    pub fn selection(&self) -> Selection {
        self.engine.selection()
    }

    pub fn set_selection(&mut self, selection: Selection) -> Result<(), DocError> {
        self.engine.set_selection(selection)
    }

    /// Type `text` over the selection.
    pub fn insert_text(&mut self, text: &str) -> Result<(), DocError> {
        let selection = self.engine.selection();
        let from = selection.from();
        self.engine.replace_range(from, selection.to(), text)?;
        self.engine
            .set_selection(Selection::cursor(from + text.chars().count()))?;
        self.refresh();
        Ok(())
    }

    pub fn delete_selection(&mut self) -> Result<(), DocError> {
        let selection = self.engine.selection();
        self.engine.delete_range(selection.from(), selection.to())?;
        self.refresh();
        Ok(())
    }

    /// Add `style` to the selection, or remove it if the whole selection
    /// already has it.
    pub fn toggle_style(&mut self, style: MarkSet) -> Result<(), DocError> {
        let selection = self.engine.selection();
        if selection.is_empty() {
            return Err(DocError::EmptySelection);
        }
        let (from, to) = (selection.from(), selection.to());
        let mark = Mark::Style(style);
        if self.engine.document().range_has_mark(from, to, &mark) {
            self.engine
                .remove_marks_where(from, to, &|m: &Mark| *m == mark)?;
        } else {
            self.engine.add_mark(from, to, &mark)?;
        }
        self.refresh();
        Ok(())
    }

    pub fn set_link(&mut self, link: Link) -> Result<(), DocError> {
        let selection = self.engine.selection();
        if selection.is_empty() {
            return Err(DocError::EmptySelection);
        }
        self.engine
            .add_mark(selection.from(), selection.to(), &Mark::Link(link))?;
        self.refresh();
        Ok(())
    }

    pub fn remove_link(&mut self) -> Result<(), DocError> {
        let selection = self.engine.selection();
        self.engine.remove_marks_where(
            selection.from(),
            selection.to(),
            &|m: &Mark| matches!(m, Mark::Link(_)),
        )?;
        self.refresh();
        Ok(())
    }

    pub fn paste(&mut self, text: &str) -> Result<PasteKind, DocError> {
        let kind = paste(&mut self.engine, text)?;
        self.refresh();
        Ok(kind)
    }

    /// Tab / Shift+Tab. Inside a list item this indents or outdents the item
    /// and returns `true`; elsewhere it returns `false` and the caller
    /// inserts the tab.
    pub fn handle_tab(&mut self, shift: bool) -> Result<bool, DocError> {
        let head = self.engine.selection().head;
        if !self.engine.document().in_list_item(head)? {
            return Ok(false);
        }
        let moved = if shift {
            self.engine.lift_list_item(head)?
        } else {
            self.engine.sink_list_item(head)?
        };
        tracing::trace!(shift, moved, "tab in list item");
        self.refresh();
        Ok(true)
    }

    pub fn take_scroll_request(&mut self) -> Option<ScrollRequest> {
        self.engine.take_scroll_request()
    }

    // -- outline ------------------------------------------------------------

    pub fn outline(&self) -> &[OutlineEntry] {
        &self.outline
    }

    /// Put the cursor on heading `id` and scroll to it.
    pub fn select_heading(&mut self, id: &str) -> bool {
        let Some(position) = self
            .outline
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.position)
        else {
            return false;
        };
        if self
            .engine
            .set_selection(Selection::cursor(position))
            .is_err()
        {
            return false;
        }
        self.engine.scroll_into_view(ScrollRequest {
            from: position,
            to: position,
            align: ScrollAlign::Center,
            focus_editor: true,
        });
        true
    }

    // -- search -------------------------------------------------------------

    pub fn search(&self) -> &SearchState {
        &self.search
    }

    pub fn open_search(&mut self) {
        self.search.open();
    }

    pub fn set_search_query(&mut self, query: &str, now: Instant) {
        self.search.set_query(query, now);
    }

    /// Drive the query debounce. When a query is applied the first match is
    /// revealed; returns whether that happened.
    pub fn poll_search(&mut self, now: Instant) -> bool {
        let text = self.engine.document().text();
        let applied = self.search.poll(now, &text);
        if applied {
            self.reveal_current_match();
        }
        applied
    }

    pub fn toggle_search_case(&mut self) {
        let text = self.engine.document().text();
        self.search.toggle_case_sensitive(&text);
        self.reveal_current_match();
    }

    pub fn search_next(&mut self) -> Option<SearchMatch> {
        let found = self.search.next();
        self.reveal_current_match();
        found
    }

    pub fn search_prev(&mut self) -> Option<SearchMatch> {
        let found = self.search.prev();
        self.reveal_current_match();
        found
    }

    pub fn search_decorations(&self) -> Vec<SearchDecoration> {
        self.search.decorations()
    }

    pub fn close_search(&mut self) {
        self.search.close();
    }

    /// Select the current match and center it, leaving focus in the search
    /// input.
    fn reveal_current_match(&mut self) {
        let Some(current) = self.search.current() else {
            return;
        };
        if self
            .engine
            .set_selection(Selection::new(current.from, current.to))
            .is_ok()
        {
            self.engine.scroll_into_view(ScrollRequest {
                from: current.from,
                to: current.to,
                align: ScrollAlign::Center,
                focus_editor: false,
            });
        }
    }

    // -- comments -----------------------------------------------------------

    pub fn comments(&self) -> Vec<&Comment> {
        self.comments.list()
    }

    pub fn comment(&self, id: CommentId) -> Option<&Comment> {
        self.comments.get(id)
    }

    pub fn add_comment(&mut self, text: &str, now: SystemTime) -> Result<CommentId, DocError> {
        let id = self.comments.add(&mut self.engine, text, now)?;
        self.refresh();
        Ok(id)
    }

    pub fn update_comment(&mut self, id: CommentId, text: &str) -> Result<(), DocError> {
        self.comments.update_text(id, text)
    }

    pub fn resolve_comment(&mut self, id: CommentId) -> Result<(), DocError> {
        self.comments.resolve(id)
    }

    pub fn reopen_comment(&mut self, id: CommentId) -> Result<(), DocError> {
        self.comments.reopen(id)
    }

    pub fn delete_comment(&mut self, id: CommentId) -> Result<Comment, DocError> {
        let comment = self.comments.delete(&mut self.engine, id)?;
        self.refresh();
        Ok(comment)
    }

    pub fn activate_comment(&mut self, id: CommentId) -> Result<(), DocError> {
        self.comments.activate(&mut self.engine, id)
    }

    pub fn comments_json(&self) -> Result<String, serde_json::Error> {
        self.comments.to_json()
    }

    /// Replace the comment records with stored ones and mark their anchors.
    pub fn load_comments(&mut self, json: &str) -> Result<(), serde_json::Error> {
        let mut comments = CommentStore::from_json(self.comments.file_id(), json)?;
        comments.reattach(&mut self.engine);
        self.comments = comments;
        self.refresh();
        Ok(())
    }
}
