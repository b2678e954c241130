#![forbid(unsafe_code)]

//! Drag and drop of tabs and files onto panes.
//!
//! A [`DragSession`] lives from `begin` to `drop` or `cancel`. While it is
//! alive, `hover` resolves the pointer to a [`DropZone`]; the workspace
//! applies the drop.
//!
//! ## Failure Modes
//!
//! | Failure | Cause | Fallback |
//! |---------|-------|----------|
//! | No zone under the pointer | Released outside every pane | Drag cancelled, no change |
//! | Pane not measurable | Not mounted this frame | Pane skipped for zones |
//! | Payload decode failure | Foreign or stale drag data | [`WorkspaceError::Payload`](crate::WorkspaceError::Payload) |

use std::path::PathBuf;

use quire_core::{BufferId, PaneId, Point};
use quire_layout::{DropZone, PaneGeometry, resolve_drop_target};
use serde::{Deserialize, Serialize};

use crate::error::WorkspaceError;

/// What is being dragged. Travels through the platform drag channel as
/// JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DragPayload {
    Tab {
        buffer_id: BufferId,
        source_pane_id: PaneId,
    },
    /// A file dragged in from a file list.
    File { path: PathBuf },
}

impl DragPayload {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// An active drag.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    payload: DragPayload,
    hovered: Option<DropZone>,
}

impl DragSession {
    #[must_use]
    pub fn begin(payload: DragPayload) -> Self {
        tracing::debug!(?payload, "drag started");
        Self {
            payload,
            hovered: None,
        }
    }

    /// Resume a drag from the JSON carried by the platform drag channel.
    pub fn from_transfer(json: &str) -> Result<Self, WorkspaceError> {
        Ok(Self::begin(DragPayload::from_json(json)?))
    }

    #[must_use]
    pub const fn payload(&self) -> &DragPayload {
        &self.payload
    }

    /// Zone highlighted by the last `hover`.
    #[must_use]
    pub const fn hovered(&self) -> Option<DropZone> {
        self.hovered
    }

    /// Resolve the zone under `point` and remember it.
    pub fn hover(
        &mut self,
        point: Point,
        panes: &[PaneId],
        geometry: &dyn PaneGeometry,
        threshold: f32,
    ) -> Option<DropZone> {
        self.hovered = resolve_drop_target(point, panes, geometry, threshold);
        self.hovered
    }

    pub fn cancel(self) {
        tracing::debug!(payload = ?self.payload, "drag cancelled");
    }
}

/// What a drop did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    /// The buffer now shows in an existing pane.
    Moved { buffer_id: BufferId, pane_id: PaneId },
    /// A pane was split and the buffer shows in the new half.
    Split { buffer_id: BufferId, new_pane_id: PaneId },
}

impl DropOutcome {
    /// The pane the buffer landed in.
    #[must_use]
    pub const fn pane_id(&self) -> PaneId {
        match self {
            Self::Moved { pane_id, .. } => *pane_id,
            Self::Split { new_pane_id, .. } => *new_pane_id,
        }
    }

    #[must_use]
    pub const fn buffer_id(&self) -> BufferId {
        match self {
            Self::Moved { buffer_id, .. } | Self::Split { buffer_id, .. } => *buffer_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_core::Rect;
    use quire_layout::DropZoneKind;
    use std::collections::BTreeMap;

    #[test]
    fn payload_json_is_tagged() {
        let payload = DragPayload::Tab {
            buffer_id: BufferId::new(3).expect("non-zero"),
            source_pane_id: PaneId::new(1).expect("non-zero"),
        };
        let json = payload.to_json().expect("encode");
        assert_eq!(json, r#"{"kind":"tab","buffer_id":3,"source_pane_id":1}"#);
        assert_eq!(DragPayload::from_json(&json).expect("decode"), payload);

        let file = DragPayload::from_json(r#"{"kind":"file","path":"notes/todo.md"}"#).expect("decode");
        assert_eq!(
            file,
            DragPayload::File {
                path: PathBuf::from("notes/todo.md")
            }
        );
        assert!(DragPayload::from_json(r#"{"kind":"folder"}"#).is_err());
        assert!(matches!(
            DragSession::from_transfer("not json"),
            Err(WorkspaceError::Payload(_))
        ));
    }

    #[test]
    fn hover_tracks_the_zone_under_the_pointer() {
        let pane = PaneId::new(1).expect("non-zero");
        let geometry = BTreeMap::from([(pane, Rect::new(0.0, 0.0, 400.0, 300.0))]);
        let mut session = DragSession::begin(DragPayload::File {
            path: PathBuf::from("a.md"),
        });
        let zone = session.hover(Point::new(200.0, 150.0), &[pane], &geometry, 48.0);
        assert_eq!(zone.map(|z| z.kind), Some(DropZoneKind::Center));
        assert_eq!(session.hover(Point::new(900.0, 150.0), &[pane], &geometry, 48.0), None);
        assert_eq!(session.hovered(), None);
    }
}
