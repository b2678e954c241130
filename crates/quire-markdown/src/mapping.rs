#![forbid(unsafe_code)]

//! Position mapping across edits.
//!
//! Every edit replaces one contiguous range `[start, start + old_size)` with
//! `new_size` positions. A [`StepMap`] records that replacement and maps old
//! positions to new ones; a [`Mapping`] chains several.
//!
//! Positions strictly before the range are unchanged and positions after it
//! shift by `new_size - old_size`. A position at the start of a non-empty
//! replaced range stays at the start, one at its end moves to the end of the
//! new content, and positions inside (or at a pure insertion point) follow
//! their [`Assoc`] bias.

/// Which side of an edit a position sticks to when it is ambiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Assoc {
    /// Stay before inserted content.
    Before,
    /// Move past inserted content.
    #[default]
    After,
}

/// A mapped position plus whether the content around it was deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapResult {
    pub pos: usize,
    /// The original position lay strictly inside a replaced range.
    pub deleted: bool,
}

/// The map of a single replacement step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepMap {
    range: Option<Replaced>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Replaced {
    start: usize,
    old_size: usize,
    new_size: usize,
}

impl StepMap {
    /// A step that moved nothing (mark changes, structural moves).
    pub const IDENTITY: Self = Self { range: None };

    #[must_use]
    pub const fn replace(start: usize, old_size: usize, new_size: usize) -> Self {
        if old_size == 0 && new_size == 0 {
            return Self::IDENTITY;
        }
        Self {
            range: Some(Replaced {
                start,
                old_size,
                new_size,
            }),
        }
    }

    #[must_use]
    pub const fn insert(pos: usize, len: usize) -> Self {
        Self::replace(pos, 0, len)
    }

    #[must_use]
    pub const fn delete(from: usize, to: usize) -> Self {
        Self::replace(from, to.saturating_sub(from), 0)
    }

    #[must_use]
    pub const fn is_identity(&self) -> bool {
        self.range.is_none()
    }

    /// Net change in document size.
    #[must_use]
    pub fn size_delta(&self) -> isize {
        self.range.map_or(0, |r| r.new_size as isize - r.old_size as isize)
    }

    #[must_use]
    pub fn map(&self, pos: usize, assoc: Assoc) -> usize {
        self.map_result(pos, assoc).pos
    }

    #[must_use]
    pub fn map_result(&self, pos: usize, assoc: Assoc) -> MapResult {
        let Some(Replaced {
            start,
            old_size,
            new_size,
        }) = self.range
        else {
            return MapResult {
                pos,
                deleted: false,
            };
        };
        let end = start + old_size;
        if pos < start {
            return MapResult {
                pos,
                deleted: false,
            };
        }
        if pos > end {
            return MapResult {
                pos: pos - old_size + new_size,
                deleted: false,
            };
        }
        let stick_before = if old_size == 0 {
            assoc == Assoc::Before
        } else if pos == start {
            true
        } else if pos == end {
            false
        } else {
            assoc == Assoc::Before
        };
        MapResult {
            pos: if stick_before { start } else { start + new_size },
            deleted: pos > start && pos < end,
        }
    }
}

/// An ordered chain of step maps.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Mapping {
    maps: Vec<StepMap>,
}

impl Mapping {
    #[must_use]
    pub const fn new() -> Self {
        Self { maps: Vec::new() }
    }

    pub fn push(&mut self, map: StepMap) {
        if !map.is_identity() {
            self.maps.push(map);
        }
    }

    pub fn extend(&mut self, other: Mapping) {
        self.maps.extend(other.maps);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    pub fn maps(&self) -> &[StepMap] {
        &self.maps
    }

    #[must_use]
    pub fn map(&self, pos: usize, assoc: Assoc) -> usize {
        self.map_result(pos, assoc).pos
    }

    #[must_use]
    pub fn map_result(&self, pos: usize, assoc: Assoc) -> MapResult {
        self.maps.iter().fold(
            MapResult {
                pos,
                deleted: false,
            },
            |acc, map| {
                let next = map.map_result(acc.pos, assoc);
                MapResult {
                    pos: next.pos,
                    deleted: acc.deleted || next.deleted,
                }
            },
        )
    }
}

impl From<StepMap> for Mapping {
    fn from(map: StepMap) -> Self {
        let mut mapping = Self::new();
        mapping.push(map);
        mapping
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insertion_shifts_following_positions() {
        let map = StepMap::insert(4, 3);
        assert_eq!(map.map(2, Assoc::After), 2);
        assert_eq!(map.map(4, Assoc::Before), 4);
        assert_eq!(map.map(4, Assoc::After), 7);
        assert_eq!(map.map(9, Assoc::Before), 12);
    }

    #[test]
    fn deletion_collapses_interior() {
        let map = StepMap::delete(2, 6);
        assert_eq!(map.map(1, Assoc::After), 1);
        assert_eq!(
            map.map_result(4, Assoc::After),
            MapResult {
                pos: 2,
                deleted: true
            }
        );
        assert_eq!(map.map(6, Assoc::Before), 2);
        assert_eq!(map.map(10, Assoc::Before), 6);
    }

    #[test]
    fn replacement_edges_follow_content() {
        let map = StepMap::replace(5, 2, 4);
        assert_eq!(map.map(5, Assoc::After), 5);
        assert_eq!(map.map(7, Assoc::Before), 9);
        assert_eq!(map.map(6, Assoc::Before), 5);
        assert_eq!(map.map(6, Assoc::After), 9);
    }

    #[test]
    fn mapping_chains_steps() {
        let mut mapping = Mapping::new();
        mapping.push(StepMap::insert(0, 5));
        mapping.push(StepMap::IDENTITY);
        mapping.push(StepMap::delete(0, 2));
        assert_eq!(mapping.maps().len(), 2);
        assert_eq!(mapping.map(3, Assoc::After), 6);
        assert!(Mapping::new().is_empty());
    }
}
