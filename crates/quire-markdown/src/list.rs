#![forbid(unsafe_code)]

//! List indentation (Tab / Shift+Tab inside list items).
//!
//! Both operations only move blocks around; textblock order is preserved,
//! so positions do not change.

use crate::document::{Block, Document, List, ListItem, Seg, container_mut};
use crate::error::DocError;

/// Where the innermost list item around a position sits.
struct ItemPath {
    /// Path to the block list containing the list.
    container: Vec<Seg>,
    /// Index of the list in that container.
    list: usize,
    item: usize,
}

impl Document {
    /// Whether `pos` lies inside a list item.
    pub fn in_list_item(&self, pos: usize) -> Result<bool, DocError> {
        Ok(self.item_path(pos, 0)?.is_some())
    }

    /// Nest the list item at `pos` under its previous sibling. Returns
    /// `false` if there is no item or it is the first in its list.
    pub fn sink_list_item(&mut self, pos: usize) -> Result<bool, DocError> {
        let Some(target) = self.item_path(pos, 0)? else {
            return Ok(false);
        };
        if target.item == 0 {
            return Ok(false);
        }
        let Some(Block::List(list)) = container_mut(&mut self.blocks, &target.container)
            .and_then(|container| container.get_mut(target.list))
        else {
            return Ok(false);
        };
        let item = list.items.remove(target.item);
        let (start, delimiter, tight) = (list.start, list.delimiter, list.tight);
        let previous = &mut list.items[target.item - 1];
        match previous.blocks.last_mut() {
            Some(Block::List(nested)) if nested.start.is_some() == start.is_some() => {
                nested.items.push(item);
            }
            _ => previous.blocks.push(Block::List(List {
                start: start.map(|_| 1),
                delimiter,
                tight,
                items: vec![item],
            })),
        }
        tracing::trace!(pos, "list item sunk");
        Ok(true)
    }

    /// Move the list item at `pos` out one level. Following siblings become
    /// its children; at the outermost level its blocks leave the list.
    /// Returns `false` if `pos` is not in a list item.
    pub fn lift_list_item(&mut self, pos: usize) -> Result<bool, DocError> {
        let Some(target) = self.item_path(pos, 0)? else {
            return Ok(false);
        };
        match self.item_path(pos, 1)? {
            Some(parent) => self.lift_into_parent(&target, &parent),
            None => self.lift_out_of_list(&target),
        }
        tracing::trace!(pos, "list item lifted");
        Ok(true)
    }

    fn lift_into_parent(&mut self, target: &ItemPath, parent: &ItemPath) {
        let Some(Block::List(outer)) = container_mut(&mut self.blocks, &parent.container)
            .and_then(|container| container.get_mut(parent.list))
        else {
            return;
        };
        let Some(owner) = outer.items.get_mut(parent.item) else {
            return;
        };
        let Some(Block::List(inner)) = owner.blocks.get_mut(target.list) else {
            return;
        };
        let mut lifted = inner.items.remove(target.item);
        let rest: Vec<ListItem> = inner.items.drain(target.item..).collect();
        let rest_list = List {
            start: inner.start.map(|_| 1),
            delimiter: inner.delimiter,
            tight: inner.tight,
            items: rest,
        };
        let inner_empty = inner.items.is_empty();
        let trailing: Vec<Block> = owner.blocks.drain(target.list + 1..).collect();
        if inner_empty {
            owner.blocks.remove(target.list);
        }
        if !rest_list.items.is_empty() {
            lifted.blocks.push(Block::List(rest_list));
        }
        lifted.blocks.extend(trailing);

        let at = if owner.blocks.is_empty() {
            outer.items.remove(parent.item);
            parent.item
        } else {
            parent.item + 1
        };
        outer.items.insert(at, lifted);
    }

    fn lift_out_of_list(&mut self, target: &ItemPath) {
        let Some(container) = container_mut(&mut self.blocks, &target.container) else {
            return;
        };
        let Some(Block::List(list)) = container.get_mut(target.list) else {
            return;
        };
        let after: Vec<ListItem> = list.items.drain(target.item + 1..).collect();
        let Some(item) = list.items.pop() else {
            return;
        };
        let mut replacement = Vec::new();
        if !list.items.is_empty() {
            replacement.push(Block::List(List {
                start: list.start,
                delimiter: list.delimiter,
                tight: list.tight,
                items: std::mem::take(&mut list.items),
            }));
        }
        replacement.extend(item.blocks);
        if !after.is_empty() {
            replacement.push(Block::List(List {
                start: list.start.map(|start| start + target.item as u64 + 1),
                delimiter: list.delimiter,
                tight: list.tight,
                items: after,
            }));
        }
        container.splice(target.list..=target.list, replacement);
    }

    /// The `depth`-th enclosing list item of `pos`, innermost first.
    fn item_path(&self, pos: usize, depth: usize) -> Result<Option<ItemPath>, DocError> {
        let resolved = self.resolve(pos)?;
        let paths = self.textblock_paths();
        let Some(path) = paths.get(resolved.index) else {
            return Ok(None);
        };
        let Some(at) = path
            .iter()
            .enumerate()
            .filter(|(_, seg)| matches!(seg, Seg::Item(_)))
            .map(|(i, _)| i)
            .rev()
            .nth(depth)
        else {
            return Ok(None);
        };
        let (Seg::Item(item), Some(Seg::Block(list))) = (path[at], at.checked_sub(1).map(|i| path[i]))
        else {
            return Ok(None);
        };
        Ok(Some(ItemPath {
            container: path[..at - 1].to_vec(),
            list,
            item,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Inline, ListDelimiter};

    fn item(text: &str) -> ListItem {
        ListItem::paragraph(vec![Inline::text(text)])
    }

    fn list(items: Vec<ListItem>) -> Block {
        Block::List(List {
            start: None,
            delimiter: ListDelimiter::Period,
            tight: true,
            items,
        })
    }

    fn three_items() -> Document {
        Document::from_blocks(vec![list(vec![item("a"), item("b"), item("c")])])
    }

    #[test]
    fn sink_nests_under_previous_sibling() {
        let mut doc = three_items();
        let text = doc.text();
        assert!(doc.sink_list_item(2).expect("sink"));
        assert_eq!(doc.text(), text);
        assert_eq!(
            doc.blocks()[0],
            list(vec![
                ListItem {
                    checked: None,
                    blocks: vec![Block::paragraph("a"), list(vec![item("b")])],
                },
                item("c"),
            ])
        );

        // Sinking "c" joins the existing nested list.
        assert!(doc.sink_list_item(4).expect("sink"));
        let Block::List(outer) = &doc.blocks()[0] else {
            panic!("list expected");
        };
        assert_eq!(outer.items.len(), 1);
        assert_eq!(outer.items[0].blocks[1], list(vec![item("b"), item("c")]));
    }

    #[test]
    fn first_item_cannot_sink() {
        let mut doc = three_items();
        assert!(!doc.sink_list_item(0).expect("sink"));
        assert_eq!(doc, three_items());
    }

    #[test]
    fn lift_reverses_sink() {
        let mut doc = three_items();
        doc.sink_list_item(2).expect("sink");
        assert!(doc.lift_list_item(2).expect("lift"));
        assert_eq!(doc, three_items());
    }

    #[test]
    fn lift_keeps_following_siblings_as_children() {
        let mut doc = Document::from_blocks(vec![list(vec![ListItem {
            checked: None,
            blocks: vec![
                Block::paragraph("a"),
                list(vec![item("b"), item("c")]),
            ],
        }])]);
        assert!(doc.lift_list_item(2).expect("lift"));
        assert_eq!(doc.text(), "a\nb\nc");
        assert_eq!(
            doc.blocks()[0],
            list(vec![
                item("a"),
                ListItem {
                    checked: None,
                    blocks: vec![Block::paragraph("b"), list(vec![item("c")])],
                },
            ])
        );
    }

    #[test]
    fn lift_at_top_level_leaves_the_list() {
        let mut doc = three_items();
        assert!(doc.lift_list_item(2).expect("lift"));
        assert_eq!(
            doc.blocks(),
            &[
                list(vec![item("a")]),
                Block::paragraph("b"),
                list(vec![item("c")]),
            ]
        );
        assert_eq!(doc.text(), "a\nb\nc");
    }

    #[test]
    fn outside_lists_nothing_happens() {
        let mut doc = Document::from_blocks(vec![Block::paragraph("plain")]);
        assert!(!doc.in_list_item(1).expect("pos"));
        assert!(!doc.sink_list_item(1).expect("sink"));
        assert!(!doc.lift_list_item(1).expect("lift"));
    }
}
