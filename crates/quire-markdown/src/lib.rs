#![forbid(unsafe_code)]

//! Markdown rich-text core for Quire.
//!
//! Markdown is parsed into a structured [`Document`] and edited there;
//! buffers store the canonical markdown written back by [`to_markdown`].
//!
//! - [`Document`] - blocks, inlines, marks and the flat position space
//! - [`StepMap`] / [`Mapping`] - how each edit moves positions
//! - [`RichTextEngine`] - the editor seam, implemented by [`MarkdownEditor`]
//! - [`MarkdownSession`] - an editor plus outline, search and comments
//!
//! # Example
//! ```
//! use std::time::{Duration, Instant};
//! use quire_core::QuireConfig;
//! use quire_markdown::{MarkdownSession, SearchMatch};
//!
//! let mut session = MarkdownSession::new("notes.md", "# Notes\n\nfoo bar foo\n", &QuireConfig::default());
//! assert_eq!(session.outline()[0].text, "Notes");
//!
//! let now = Instant::now();
//! session.set_search_query("foo", now);
//! session.poll_search(now + Duration::from_millis(100));
//! assert_eq!(session.search().matches().len(), 2);
//! assert_eq!(session.search_next(), Some(SearchMatch { from: 14, to: 17 }));
//! ```

pub mod comments;
pub mod document;
pub mod edit;
pub mod editor;
pub mod error;
pub mod html;
pub mod list;
pub mod mapping;
pub mod marks;
pub mod outline;
pub mod parse;
pub mod paste;
pub mod search;
pub mod serialize;
pub mod session;

pub use comments::{Comment, CommentStatus, CommentStore, anchor_from_marks};
pub use document::{
    Alignment, Block, Document, Inline, List, ListDelimiter, ListItem, OBJECT_REPLACEMENT, Table,
    Textblock,
};
pub use editor::{MarkdownEditor, RichTextEngine, ScrollAlign, ScrollRequest, Selection};
pub use error::DocError;
pub use html::{markdown_to_html, to_html};
pub use mapping::{Assoc, MapResult, Mapping, StepMap};
pub use marks::{Link, Mark, MarkSet, Marks};
pub use outline::{OutlineEntry, extract_outline};
pub use parse::{parse_blocks, parse_markdown};
pub use paste::{MarkdownDetection, PasteKind, is_likely_markdown, paste};
pub use search::{SearchDecoration, SearchMatch, SearchOptions, SearchState, find_matches};
pub use serialize::to_markdown;
pub use session::MarkdownSession;
