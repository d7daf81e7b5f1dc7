//! Inline title editing and keyboard navigation.

use horizon_arbor_core::logging::targets;

use super::ListProjection;
use crate::error::{Error, Result};
use crate::store::{NodeId, TreeStore};
use crate::validate::{TitleError, sanitize_title, validate_title};
use crate::view_state::{CollapseState, Key};

/// A title written to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleChange {
    pub node_id: NodeId,
    pub title: String,
}

/// Result of [`ListProjection::commit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The title was valid and has been stored. Edit mode ended.
    Committed(TitleChange),
    /// The title was invalid. The edit text now holds the sanitized title, a
    /// warning is shown and the node stays in edit mode.
    Rejected {
        node_id: NodeId,
        error: TitleError,
        sanitized: String,
    },
}

impl CommitOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed(_))
    }

    /// The stored title, if the commit went through.
    pub fn change(&self) -> Option<&TitleChange> {
        match self {
            Self::Committed(change) => Some(change),
            Self::Rejected { .. } => None,
        }
    }
}

impl ListProjection {
    /// Puts `id` into edit mode.
    ///
    /// Only one node edits at a time: an edit in progress elsewhere is
    /// auto-committed first and its outcome returned. If that commit is
    /// rejected the other node keeps editing and `id` does not enter edit
    /// mode.
    #[tracing::instrument(skip(self, store), target = "horizon_arbor::edit", level = "trace")]
    pub fn begin_edit(
        &mut self,
        store: &mut TreeStore,
        id: NodeId,
    ) -> Result<Option<CommitOutcome>> {
        let title = store
            .get(id)
            .filter(|_| !id.is_root())
            .map(|n| n.payload().title.clone())
            .ok_or(Error::NodeNotFound { node_id: id })?;
        if self.editing == Some(id) {
            return Ok(None);
        }
        let previous = self.auto_commit(store);
        if let Some(editing) = self.editing {
            tracing::debug!(
                target: targets::EDIT,
                node = %id,
                %editing,
                "edit not started, pending title rejected"
            );
            return Ok(previous);
        }

        if let Some(row) = self.row_mut(id) {
            row.view.enter_edit(title);
        }
        self.editing = Some(id);
        tracing::debug!(target: targets::EDIT, node = %id, "edit started");
        Ok(previous)
    }

    /// Validates `title` and stores it if valid.
    pub fn commit(
        &mut self,
        store: &mut TreeStore,
        id: NodeId,
        title: &str,
    ) -> Result<CommitOutcome> {
        if self.editing != Some(id) {
            return Err(Error::NotEditing { node_id: id });
        }
        match validate_title(title) {
            Ok(()) => {
                let change = self.apply_title(store, id, title.to_string())?;
                Ok(CommitOutcome::Committed(change))
            }
            Err(error) => {
                let sanitized = sanitize_title(title);
                if let Some(row) = self.row_mut(id) {
                    row.view.edit_text = Some(sanitized.clone());
                    row.view.show_warning(error.to_string());
                }
                tracing::debug!(target: targets::EDIT, node = %id, %error, "title rejected");
                Ok(CommitOutcome::Rejected {
                    node_id: id,
                    error,
                    sanitized,
                })
            }
        }
    }

    /// Commits the pending edit text of the editing node.
    pub fn commit_pending(&mut self, store: &mut TreeStore) -> Result<Option<CommitOutcome>> {
        let Some(id) = self.editing else {
            return Ok(None);
        };
        let text = self.pending_text(store, id);
        self.commit(store, id, &text).map(Some)
    }

    /// Updates the pending text and raises or clears the validation warning.
    pub fn text_change(&mut self, id: NodeId, text: &str) -> Result<Option<TitleError>> {
        if self.editing != Some(id) {
            return Err(Error::NotEditing { node_id: id });
        }
        let result = validate_title(text).err();
        if let Some(row) = self.row_mut(id) {
            row.view.edit_text = Some(text.to_string());
            match &result {
                Some(error) => row.view.show_warning(error.to_string()),
                None => row.view.clear_tooltip(),
            }
        }
        Ok(result)
    }

    /// Leaves edit mode without touching the stored title.
    pub fn cancel_edit(&mut self) -> Option<NodeId> {
        let id = self.editing.take()?;
        if let Some(row) = self.row_mut(id) {
            row.view.finish_edit();
        }
        tracing::debug!(target: targets::EDIT, node = %id, "edit cancelled");
        Some(id)
    }

    /// Commits the pending text of the edit in progress.
    ///
    /// Invalid text is rejected exactly as by [`commit`](Self::commit): the
    /// node keeps editing with the sanitized text and a warning.
    pub(crate) fn auto_commit(&mut self, store: &mut TreeStore) -> Option<CommitOutcome> {
        let id = self.editing?;
        let text = self.pending_text(store, id);
        self.commit(store, id, &text).ok()
    }

    fn pending_text(&self, store: &TreeStore, id: NodeId) -> String {
        self.view(id)
            .and_then(|view| view.edit_text.clone())
            .or_else(|| store.get(id).map(|n| n.payload().title.clone()))
            .unwrap_or_default()
    }

    fn apply_title(
        &mut self,
        store: &mut TreeStore,
        id: NodeId,
        title: String,
    ) -> Result<TitleChange> {
        let payload = store
            .payload_mut(id)
            .ok_or(Error::NodeNotFound { node_id: id })?;
        payload.title = title.clone();
        if let Some(row) = self.row_mut(id) {
            row.view.finish_edit();
        }
        self.editing = None;
        tracing::debug!(target: targets::EDIT, node = %id, %title, "title committed");
        Ok(TitleChange { node_id: id, title })
    }

    /// Keyboard navigation over visible rows.
    ///
    /// Returns the title change when `Tab` commits an edit.
    #[tracing::instrument(skip(self, store), target = "horizon_arbor::projection", level = "trace")]
    pub fn key_down(&mut self, store: &mut TreeStore, key: Key) -> Option<TitleChange> {
        match key {
            Key::Escape => {
                if self.cancel_edit().is_none() {
                    self.drag_leave();
                }
                None
            }
            Key::Tab => match self.commit_pending(store) {
                Ok(Some(CommitOutcome::Committed(change))) => Some(change),
                _ => None,
            },
            Key::Up | Key::Down | Key::Home | Key::End => {
                self.move_selection(key);
                None
            }
            Key::Left => {
                let id = self.selected?;
                let row = self.row(id)?;
                if row.is_folder && self.collapse_state(id) == CollapseState::Expanded {
                    self.set_expanded(store, id, false);
                } else if !row.parent_id.is_root() {
                    let parent = row.parent_id;
                    self.select(Some(parent));
                }
                None
            }
            Key::Right => {
                let id = self.selected?;
                let row = self.row(id)?;
                if !row.is_folder {
                    return None;
                }
                if self.collapse_state(id) == CollapseState::Collapsed {
                    self.set_expanded(store, id, true);
                } else if let Some(&child) = store.children(id).first() {
                    self.select(Some(child));
                }
                None
            }
        }
    }

    fn move_selection(&mut self, key: Key) {
        let current = self.selected.and_then(|id| self.visible_index_of(id));
        let count = self.visible_count();
        if count == 0 {
            return;
        }
        let next = match (key, current) {
            (Key::Home, _) | (Key::Down, None) => 0,
            (Key::End, _) | (Key::Up, None) => count - 1,
            (Key::Up, Some(i)) => i.saturating_sub(1),
            (Key::Down, Some(i)) => (i + 1).min(count - 1),
            _ => return,
        };
        if let Some(pos) = self.backing_index(next) {
            let id = self.rows[pos].id;
            self.select(Some(id));
        }
    }
}
