#![forbid(unsafe_code)]

//! Pane/tab controller state: the active pane and per-pane close
//! confirmations.
//!
//! Closing a tab whose buffer has unsaved changes asks a
//! [`ConfirmationPrompt`]. A prompt may answer on the spot or leave the
//! question open; an open question is parked on its pane until
//! [`Workspace::resolve_confirmation`](crate::Workspace::resolve_confirmation)
//! answers it. Each pane holds at most one open question, so several panes
//! can each have their own dialog up.

use std::collections::BTreeMap;

use quire_core::{BufferId, PaneId};

/// The user's answer to an unsaved-changes dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmChoice {
    /// Save, then close.
    Save,
    /// Close without saving.
    Discard,
    /// Leave everything as it was.
    Cancel,
}

/// What the dialog is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationRequest {
    pub pane_id: PaneId,
    pub buffer_id: BufferId,
    pub file_name: String,
}

/// The unsaved-changes dialog collaborator.
pub trait ConfirmationPrompt {
    /// Present `request`. Return the choice if it is known now, or `None`
    /// to answer later through `resolve_confirmation`.
    fn confirm(&mut self, request: &ConfirmationRequest) -> Option<ConfirmChoice>;
}

/// A prompt that always answers the same way.
impl ConfirmationPrompt for ConfirmChoice {
    fn confirm(&mut self, _request: &ConfirmationRequest) -> Option<ConfirmChoice> {
        Some(*self)
    }
}

/// A prompt that always defers.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeferredPrompt;

impl ConfirmationPrompt for DeferredPrompt {
    fn confirm(&mut self, _request: &ConfirmationRequest) -> Option<ConfirmChoice> {
        None
    }
}

/// Result of a close request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// The tab is gone. `buffer_destroyed` is set when no other pane showed
    /// the buffer, so it was closed in the store too.
    Closed { buffer_destroyed: bool },
    /// The dialog is open; nothing changed yet.
    AwaitingConfirmation,
    /// The user cancelled; nothing changed.
    Cancelled,
}

#[derive(Debug, Clone, Default)]
pub struct TabController {
    active_pane: Option<PaneId>,
    pending: BTreeMap<PaneId, ConfirmationRequest>,
}

impl TabController {
    #[must_use]
    pub fn new(active_pane: PaneId) -> Self {
        Self {
            active_pane: Some(active_pane),
            pending: BTreeMap::new(),
        }
    }

    #[must_use]
    pub const fn active_pane(&self) -> Option<PaneId> {
        self.active_pane
    }

    pub fn set_active_pane(&mut self, pane_id: PaneId) {
        if self.active_pane != Some(pane_id) {
            tracing::debug!(pane_id = %pane_id, "active pane changed");
        }
        self.active_pane = Some(pane_id);
    }

    #[must_use]
    pub fn pending(&self, pane_id: PaneId) -> Option<&ConfirmationRequest> {
        self.pending.get(&pane_id)
    }

    pub fn pending_requests(&self) -> impl Iterator<Item = &ConfirmationRequest> {
        self.pending.values()
    }

    /// Park `request` on its pane. Returns `false` if the pane already has
    /// one.
    pub(crate) fn park(&mut self, request: ConfirmationRequest) -> bool {
        if self.pending.contains_key(&request.pane_id) {
            return false;
        }
        tracing::debug!(
            pane_id = %request.pane_id,
            buffer_id = %request.buffer_id,
            "close confirmation pending"
        );
        self.pending.insert(request.pane_id, request);
        true
    }

    pub(crate) fn take(&mut self, pane_id: PaneId) -> Option<ConfirmationRequest> {
        self.pending.remove(&pane_id)
    }

    /// Drop everything parked on a pane that no longer exists.
    pub(crate) fn forget_pane(&mut self, pane_id: PaneId) {
        self.pending.remove(&pane_id);
    }
}
