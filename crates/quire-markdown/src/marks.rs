#![forbid(unsafe_code)]

//! Inline marks.
//!
//! Style marks are a bit set. Links and comment anchors carry data and are
//! stored next to it in [`Marks`]. [`Mark`] names one individual mark for
//! add/remove operations.

use std::collections::BTreeSet;

use quire_core::CommentId;

bitflags::bitflags! {
    /// Formatting marks without attributes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MarkSet: u8 {
        const BOLD        = 0b0000_0001;
        const ITALIC      = 0b0000_0010;
        const STRIKE      = 0b0000_0100;
        /// Inline code. Always the innermost mark when serialized.
        const CODE        = 0b0000_1000;
        const HIGHLIGHT   = 0b0001_0000;
        const SUBSCRIPT   = 0b0010_0000;
        const SUPERSCRIPT = 0b0100_0000;
    }
}

impl MarkSet {
    /// Style flags in serialization order, outermost first.
    pub const ORDER: [Self; 6] = [
        Self::BOLD,
        Self::ITALIC,
        Self::STRIKE,
        Self::HIGHLIGHT,
        Self::SUPERSCRIPT,
        Self::SUBSCRIPT,
    ];
}

/// Hyperlink target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Link {
    pub href: String,
    pub title: String,
}

impl Link {
    #[must_use]
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            title: String::new(),
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

/// The full mark state of one inline span.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Marks {
    pub style: MarkSet,
    pub link: Option<Link>,
    /// Comment anchors covering this span.
    pub comments: BTreeSet<CommentId>,
}

impl Marks {
    #[must_use]
    pub fn plain() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn styled(style: MarkSet) -> Self {
        Self {
            style,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_plain(&self) -> bool {
        self.style.is_empty() && self.link.is_none() && self.comments.is_empty()
    }

    #[must_use]
    pub fn contains(&self, mark: &Mark) -> bool {
        match mark {
            Mark::Style(flags) => self.style.contains(*flags),
            Mark::Link(link) => self.link.as_ref() == Some(link),
            Mark::Comment(id) => self.comments.contains(id),
        }
    }

    pub fn add(&mut self, mark: &Mark) {
        match mark {
            Mark::Style(flags) => self.style.insert(*flags),
            Mark::Link(link) => self.link = Some(link.clone()),
            Mark::Comment(id) => {
                self.comments.insert(*id);
            }
        }
    }

    /// Remove every individual mark matching `predicate`. Returns how many
    /// were removed.
    pub fn remove_where(&mut self, predicate: &dyn Fn(&Mark) -> bool) -> usize {
        let mut removed = 0;
        for flag in MarkSet::all().iter() {
            if self.style.contains(flag) && predicate(&Mark::Style(flag)) {
                self.style.remove(flag);
                removed += 1;
            }
        }
        if self
            .link
            .as_ref()
            .is_some_and(|link| predicate(&Mark::Link(link.clone())))
        {
            self.link = None;
            removed += 1;
        }
        let before = self.comments.len();
        self.comments.retain(|id| !predicate(&Mark::Comment(*id)));
        removed + (before - self.comments.len())
    }

    /// Marks that text typed right after a span carrying `self` inherits.
    /// Links and comment anchors do not grow at their edges.
    #[must_use]
    pub(crate) fn inherited(before: Option<&Self>, after: Option<&Self>) -> Self {
        let Some(before) = before else {
            return Self::default();
        };
        let mut marks = Self::styled(before.style);
        if let Some(after) = after {
            if before.link.is_some() && before.link == after.link {
                marks.link = before.link.clone();
            }
            marks.comments = before
                .comments
                .intersection(&after.comments)
                .copied()
                .collect();
        }
        marks
    }
}

/// One individual mark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mark {
    Style(MarkSet),
    Link(Link),
    Comment(CommentId),
}

impl Mark {
    #[must_use]
    pub const fn comment_id(&self) -> Option<CommentId> {
        match self {
            Self::Comment(id) => Some(*id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(n: u64) -> CommentId {
        CommentId::new(n).expect("non-zero")
    }

    #[test]
    fn remove_where_counts_individual_marks() {
        let mut marks = Marks::styled(MarkSet::BOLD | MarkSet::ITALIC);
        marks.add(&Mark::Comment(comment(1)));
        marks.add(&Mark::Comment(comment(2)));
        let removed = marks.remove_where(&|mark| {
            *mark == Mark::Style(MarkSet::BOLD) || *mark == Mark::Comment(comment(2))
        });
        assert_eq!(removed, 2);
        assert_eq!(marks.style, MarkSet::ITALIC);
        assert_eq!(marks.comments, BTreeSet::from([comment(1)]));
    }

    #[test]
    fn typing_after_a_link_does_not_extend_it() {
        let mut linked = Marks::styled(MarkSet::BOLD);
        linked.link = Some(Link::new("https://example.com"));
        linked.comments.insert(comment(1));

        let at_end = Marks::inherited(Some(&linked), Some(&Marks::plain()));
        assert_eq!(at_end.style, MarkSet::BOLD);
        assert_eq!(at_end.link, None);
        assert!(at_end.comments.is_empty());

        let inside = Marks::inherited(Some(&linked), Some(&linked));
        assert_eq!(inside, linked);

        assert!(Marks::inherited(None, Some(&linked)).is_plain());
    }
}
