#![forbid(unsafe_code)]

//! In-document text search.
//!
//! Matches are found in the flattened document text, so a match may span
//! inline boundaries (`foo **bar**` matches `foo bar`). Query changes go
//! through a [`Debouncer`]; document edits recompute immediately.

use std::time::{Duration, Instant};

use quire_core::Debouncer;

use crate::mapping::{Assoc, Mapping};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchOptions {
    pub case_sensitive: bool,
}

/// A match as a `[from, to)` position range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchMatch {
    pub from: usize,
    pub to: usize,
}

/// A highlight the view should paint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchDecoration {
    pub from: usize,
    pub to: usize,
    pub current: bool,
}

fn fold(c: char, options: SearchOptions) -> char {
    if options.case_sensitive {
        return c;
    }
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(single), None) => single,
        _ => c,
    }
}

/// All non-overlapping occurrences of `query` in `text`, left to right.
/// Offsets are in characters.
#[must_use]
pub fn find_matches(text: &str, query: &str, options: SearchOptions) -> Vec<SearchMatch> {
    let needle: Vec<char> = query.chars().map(|c| fold(c, options)).collect();
    if needle.is_empty() {
        return Vec::new();
    }
    let haystack: Vec<char> = text.chars().map(|c| fold(c, options)).collect();
    let mut matches = Vec::new();
    let mut i = 0;
    while i + needle.len() <= haystack.len() {
        if haystack[i..i + needle.len()] == needle[..] {
            matches.push(SearchMatch {
                from: i,
                to: i + needle.len(),
            });
            i += needle.len();
        } else {
            i += 1;
        }
    }
    matches
}

/// Search panel state: query, options, matches and the current match.
#[derive(Debug)]
pub struct SearchState {
    open: bool,
    query: String,
    options: SearchOptions,
    matches: Vec<SearchMatch>,
    current: Option<usize>,
    pending: Debouncer<String>,
}

impl SearchState {
    #[must_use]
    pub fn new(debounce: Duration) -> Self {
        Self {
            open: false,
            query: String::new(),
            options: SearchOptions::default(),
            matches: Vec::new(),
            current: None,
            pending: Debouncer::new(debounce),
        }
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    /// The applied query (not a still-pending one).
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub const fn options(&self) -> SearchOptions {
        self.options
    }

    /// Queue a query change; it applies once typing pauses.
    pub fn set_query(&mut self, query: impl Into<String>, now: Instant) {
        self.open = true;
        self.pending.schedule(query.into(), now);
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_pending()
    }

    /// Apply a pending query whose quiet window has elapsed. Returns `true`
    /// if the matches were recomputed.
    pub fn poll(&mut self, now: Instant, text: &str) -> bool {
        match self.pending.poll(now) {
            Some(query) => {
                self.apply_query(query, text);
                true
            }
            None => false,
        }
    }

    /// Apply a pending query right away.
    pub fn flush(&mut self, text: &str) -> bool {
        match self.pending.flush() {
            Some(query) => {
                self.apply_query(query, text);
                true
            }
            None => false,
        }
    }

    fn apply_query(&mut self, query: String, text: &str) {
        self.query = query;
        self.current = None;
        self.recompute(text);
        tracing::debug!(
            query = %self.query,
            matches = self.matches.len(),
            "search query applied"
        );
    }

    pub fn set_case_sensitive(&mut self, case_sensitive: bool, text: &str) {
        if self.options.case_sensitive != case_sensitive {
            self.options.case_sensitive = case_sensitive;
            self.current = None;
            self.recompute(text);
        }
    }

    pub fn toggle_case_sensitive(&mut self, text: &str) {
        self.set_case_sensitive(!self.options.case_sensitive, text);
    }

    /// Recompute matches against new document text. The current match stays
    /// on the first match at or after where it was.
    pub fn recompute(&mut self, text: &str) {
        let previous = self.current().map(|m| m.from);
        self.recompute_from(text, previous);
    }

    /// Like [`recompute`](Self::recompute), for text produced by `changes`.
    /// The old current match is mapped through the edit first, so it stays
    /// on the same occurrence when text before it changes.
    pub fn recompute_mapped(&mut self, text: &str, changes: &Mapping) {
        let previous = self.current().map(|m| changes.map(m.from, Assoc::Before));
        self.recompute_from(text, previous);
    }

    fn recompute_from(&mut self, text: &str, previous: Option<usize>) {
        if !self.open {
            return;
        }
        self.matches = find_matches(text, &self.query, self.options);
        self.current = if self.matches.is_empty() {
            None
        } else {
            Some(match previous {
                Some(from) => self
                    .matches
                    .iter()
                    .position(|m| m.from >= from)
                    .unwrap_or(self.matches.len() - 1),
                None => 0,
            })
        };
    }

    #[must_use]
    pub fn matches(&self) -> &[SearchMatch] {
        &self.matches
    }

    #[must_use]
    pub const fn current_index(&self) -> Option<usize> {
        self.current
    }

    #[must_use]
    pub fn current(&self) -> Option<SearchMatch> {
        self.current.and_then(|index| self.matches.get(index).copied())
    }

    /// Advance to the next match, wrapping after the last.
    pub fn next(&mut self) -> Option<SearchMatch> {
        let count = self.matches.len();
        if count == 0 {
            return None;
        }
        self.current = Some(self.current.map_or(0, |index| (index + 1) % count));
        self.current()
    }

    /// Step back to the previous match, wrapping before the first.
    pub fn prev(&mut self) -> Option<SearchMatch> {
        let count = self.matches.len();
        if count == 0 {
            return None;
        }
        self.current = Some(
            self.current
                .map_or(count - 1, |index| (index + count - 1) % count),
        );
        self.current()
    }

    #[must_use]
    pub fn decorations(&self) -> Vec<SearchDecoration> {
        self.matches
            .iter()
            .enumerate()
            .map(|(index, m)| SearchDecoration {
                from: m.from,
                to: m.to,
                current: Some(index) == self.current,
            })
            .collect()
    }

    /// Clear the query, matches and highlights.
    pub fn close(&mut self) {
        self.open = false;
        self.query.clear();
        self.matches.clear();
        self.current = None;
        self.pending.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::StepMap;
    use proptest::prelude::*;

    const WINDOW: Duration = Duration::from_millis(100);

    fn applied(text: &str, query: &str) -> SearchState {
        let mut state = SearchState::new(WINDOW);
        let now = Instant::now();
        state.set_query(query, now);
        assert!(state.poll(now + WINDOW, text));
        state
    }

    #[test]
    fn finds_case_insensitive_matches() {
        let matches = find_matches("Foo bar FOO", "foo", SearchOptions::default());
        assert_eq!(
            matches,
            vec![SearchMatch { from: 0, to: 3 }, SearchMatch { from: 8, to: 11 }]
        );
        let sensitive = find_matches(
            "Foo bar FOO",
            "foo",
            SearchOptions {
                case_sensitive: true,
            },
        );
        assert!(sensitive.is_empty());
    }

    #[test]
    fn matches_do_not_overlap() {
        let matches = find_matches("aaaa", "aa", SearchOptions::default());
        assert_eq!(
            matches,
            vec![SearchMatch { from: 0, to: 2 }, SearchMatch { from: 2, to: 4 }]
        );
    }

    #[test]
    fn offsets_count_characters() {
        let matches = find_matches("é€x", "x", SearchOptions::default());
        assert_eq!(matches, vec![SearchMatch { from: 2, to: 3 }]);
    }

    #[test]
    fn query_waits_for_the_debounce_window() {
        let mut state = SearchState::new(WINDOW);
        let start = Instant::now();
        state.set_query("f", start);
        state.set_query("fo", start + Duration::from_millis(50));
        assert!(!state.poll(start + Duration::from_millis(120), "foo"));
        assert!(state.poll(start + Duration::from_millis(150), "foo"));
        assert_eq!(state.query(), "fo");
        assert_eq!(state.matches().len(), 1);
    }

    #[test]
    fn navigation_wraps() {
        let mut state = applied("foo bar foo baz foo", "foo");
        assert_eq!(state.current_index(), Some(0));
        assert_eq!(state.next(), Some(SearchMatch { from: 8, to: 11 }));
        assert_eq!(state.next(), Some(SearchMatch { from: 16, to: 19 }));
        assert_eq!(state.next(), Some(SearchMatch { from: 0, to: 3 }));
        assert_eq!(state.prev(), Some(SearchMatch { from: 16, to: 19 }));
    }

    #[test]
    fn decorations_mark_the_current_match() {
        let mut state = applied("ab ab", "ab");
        state.next();
        let current: Vec<bool> = state.decorations().iter().map(|d| d.current).collect();
        assert_eq!(current, vec![false, true]);
    }

    #[test]
    fn recompute_keeps_position() {
        let mut state = applied("foo foo foo", "foo");
        state.next();
        state.recompute("xx foo foo foo");
        assert_eq!(state.current(), Some(SearchMatch { from: 7, to: 10 }));
    }

    #[test]
    fn mapped_recompute_follows_upstream_deletes() {
        let mut state = applied("foo bar foo baz foo", "foo");
        state.next();
        assert_eq!(state.current(), Some(SearchMatch { from: 8, to: 11 }));

        let mut changes = Mapping::default();
        changes.push(StepMap::delete(0, 4));
        state.recompute_mapped("bar foo baz foo", &changes);
        assert_eq!(
            state.matches(),
            &[SearchMatch { from: 4, to: 7 }, SearchMatch { from: 12, to: 15 }]
        );
        assert_eq!(state.current(), Some(SearchMatch { from: 4, to: 7 }));
    }

    #[test]
    fn close_resets_everything() {
        let mut state = applied("foo", "foo");
        state.close();
        assert!(!state.is_open());
        assert!(state.matches().is_empty());
        assert!(state.decorations().is_empty());
        assert_eq!(state.query(), "");
        assert_eq!(state.next(), None);
    }

    proptest! {
        #[test]
        fn finds_every_planted_occurrence(
            gaps in prop::collection::vec("[a-e ]{0,6}", 1..8),
        ) {
            // "xyz" cannot occur in the filler, so each planted copy is a match.
            let text = gaps.join("XyZ");
            let matches = find_matches(&text, "xyz", SearchOptions::default());
            prop_assert_eq!(matches.len(), gaps.len() - 1);
            for pair in matches.windows(2) {
                prop_assert!(pair[0].to <= pair[1].from);
            }
        }
    }
}
