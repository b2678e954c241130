#![forbid(unsafe_code)]

//! Drop-zone resolution for tab and file drags.
//!
//! Each measurable pane contributes four edge bands (split toward that side)
//! and its full rectangle (drop into the pane). All edge zones are tested
//! before any center zone, so a pointer near a border splits instead of
//! merely retargeting. The first zone containing the pointer wins.
//!
//! Panes the geometry provider cannot measure are skipped for that frame.

use quire_core::{PaneId, Point, Rect, Side};
use serde::{Deserialize, Serialize};

use crate::geometry::PaneGeometry;
use crate::model::{Placement, SplitDirection};

/// What a zone does when the drag is released over it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "zone", content = "side", rename_all = "snake_case")]
pub enum DropZoneKind {
    /// Drop into the existing pane.
    Center,
    /// Split the pane toward this side and drop into the new half.
    Edge(Side),
}

impl DropZoneKind {
    /// Split direction and placement for an edge zone.
    #[must_use]
    pub const fn split(self) -> Option<(SplitDirection, Placement)> {
        match self {
            Self::Center => None,
            Self::Edge(Side::Left) => Some((SplitDirection::Vertical, Placement::Before)),
            Self::Edge(Side::Right) => Some((SplitDirection::Vertical, Placement::After)),
            Self::Edge(Side::Top) => Some((SplitDirection::Horizontal, Placement::Before)),
            Self::Edge(Side::Bottom) => Some((SplitDirection::Horizontal, Placement::After)),
        }
    }

    /// Lower is tested first.
    #[must_use]
    pub const fn priority(self) -> u8 {
        match self {
            Self::Edge(_) => 0,
            Self::Center => 1,
        }
    }
}

/// A screen-space target for a drop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DropZone {
    pub pane_id: PaneId,
    pub kind: DropZoneKind,
    pub rect: Rect,
}

impl DropZone {
    #[must_use]
    pub const fn priority(&self) -> u8 {
        self.kind.priority()
    }
}

/// All zones for `panes`, in hit-test order.
#[must_use]
pub fn drop_zones(panes: &[PaneId], geometry: &dyn PaneGeometry, threshold: f32) -> Vec<DropZone> {
    let measured: Vec<(PaneId, Rect)> = panes
        .iter()
        .filter_map(|pane_id| match geometry.pane_rect(*pane_id) {
            Some(rect) if !rect.is_empty() => Some((*pane_id, rect)),
            _ => {
                tracing::trace!(pane_id = %pane_id, "pane not measurable; skipped for drop zones");
                None
            }
        })
        .collect();

    let edges = measured.iter().flat_map(|(pane_id, rect)| {
        Side::ALL.into_iter().map(move |side| DropZone {
            pane_id: *pane_id,
            kind: DropZoneKind::Edge(side),
            rect: rect.edge_band(side, threshold),
        })
    });
    let centers = measured.iter().map(|(pane_id, rect)| DropZone {
        pane_id: *pane_id,
        kind: DropZoneKind::Center,
        rect: *rect,
    });
    edges
        .chain(centers)
        .filter(|zone| !zone.rect.is_empty())
        .collect()
}

/// The zone under `point`, or `None` if the drop would be a no-op.
#[must_use]
pub fn resolve_drop_target(
    point: Point,
    panes: &[PaneId],
    geometry: &dyn PaneGeometry,
    threshold: f32,
) -> Option<DropZone> {
    drop_zones(panes, geometry, threshold)
        .into_iter()
        .find(|zone| zone.rect.contains(point))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn pane(n: u64) -> PaneId {
        PaneId::new(n).expect("non-zero")
    }

    fn side_by_side() -> BTreeMap<PaneId, Rect> {
        BTreeMap::from([
            (pane(1), Rect::new(0.0, 0.0, 400.0, 600.0)),
            (pane(2), Rect::new(400.0, 0.0, 400.0, 600.0)),
        ])
    }

    #[test]
    fn edge_beats_center() {
        let geo = side_by_side();
        let zone = resolve_drop_target(Point::new(390.0, 300.0), &[pane(1), pane(2)], &geo, 48.0)
            .expect("zone");
        assert_eq!(zone.pane_id, pane(1));
        assert_eq!(zone.kind, DropZoneKind::Edge(Side::Right));
    }

    #[test]
    fn interior_point_hits_center() {
        let geo = side_by_side();
        let zone = resolve_drop_target(Point::new(600.0, 300.0), &[pane(1), pane(2)], &geo, 48.0)
            .expect("zone");
        assert_eq!(zone.pane_id, pane(2));
        assert_eq!(zone.kind, DropZoneKind::Center);
    }

    #[test]
    fn outside_everything_is_none() {
        let geo = side_by_side();
        assert_eq!(
            resolve_drop_target(Point::new(900.0, 10.0), &[pane(1), pane(2)], &geo, 48.0),
            None
        );
    }

    #[test]
    fn unmeasured_panes_are_skipped() {
        let geo = side_by_side();
        let zones = drop_zones(&[pane(1), pane(3)], &geo, 48.0);
        assert!(zones.iter().all(|zone| zone.pane_id == pane(1)));
        assert_eq!(zones.len(), 5);
        assert!(zones[..4].iter().all(|zone| zone.priority() == 0));
        assert_eq!(zones[4].kind, DropZoneKind::Center);
    }

    #[test]
    fn edge_sides_map_to_split_direction() {
        assert_eq!(
            DropZoneKind::Edge(Side::Right).split(),
            Some((SplitDirection::Vertical, Placement::After))
        );
        assert_eq!(
            DropZoneKind::Edge(Side::Top).split(),
            Some((SplitDirection::Horizontal, Placement::Before))
        );
        assert_eq!(DropZoneKind::Center.split(), None);
    }

    #[test]
    fn zero_threshold_leaves_only_centers() {
        let geo = side_by_side();
        let zones = drop_zones(&[pane(1), pane(2)], &geo, 0.0);
        assert!(zones.iter().all(|zone| zone.kind == DropZoneKind::Center));
    }
}
