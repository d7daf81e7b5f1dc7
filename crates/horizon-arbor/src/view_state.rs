//! Per-row view state and the interaction state machine.

/// Collapse state of a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CollapseState {
    /// Children are visible when the folder itself is.
    Expanded,
    /// Children are hidden.
    #[default]
    Collapsed,
}

impl CollapseState {
    /// The opposite state.
    pub fn toggled(self) -> Self {
        match self {
            Self::Expanded => Self::Collapsed,
            Self::Collapsed => Self::Expanded,
        }
    }

    /// Returns `true` for [`CollapseState::Expanded`].
    pub fn is_expanded(self) -> bool {
        self == Self::Expanded
    }
}

/// Tooltip attached to a row. At most one kind is shown at a time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Tooltip {
    /// Nothing shown.
    #[default]
    None,
    /// Hover hint carrying the full title.
    Hint(String),
    /// Validation warning shown while editing.
    Warning(String),
}

/// Discrete pointer and focus events delivered to a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionEvent {
    TouchDown,
    TouchUp,
    Hover,
    HoverExit,
    Focus,
    Blur,
    RightClick,
    DragStart,
}

/// Structural operations offered by a row's context menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuOperation {
    AddNode,
    RemoveNode,
    ModifyNode,
    CommitNode,
}

/// Keys understood by keyboard navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    Escape,
    Tab,
}

/// Interaction state of a single row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InteractionState {
    #[default]
    Normal,
    Selected,
    Editing,
    FinishedEditing,
    /// Highlighted as the drop-into target of the active drag.
    DragInsertTarget,
    /// Received the last drop.
    FinishedDragInsertTarget,
}

impl InteractionState {
    /// Transition for a pointer or focus event.
    ///
    /// Rows in edit mode ignore everything except `Blur`, which finishes the
    /// edit.
    pub fn on_event(self, event: InteractionEvent) -> Self {
        use InteractionEvent::*;
        use InteractionState::*;
        match (self, event) {
            (Editing, Blur) => FinishedEditing,
            (Editing, _) => Editing,
            (_, TouchDown | TouchUp | Focus | RightClick | DragStart) => Selected,
            (_, Blur) => Normal,
            (state, Hover | HoverExit) => state,
        }
    }

    /// Transition for a context-menu operation.
    pub fn on_menu(self, op: MenuOperation) -> Self {
        match op {
            MenuOperation::AddNode | MenuOperation::ModifyNode => Self::Editing,
            MenuOperation::CommitNode if self == Self::Editing => Self::FinishedEditing,
            MenuOperation::CommitNode => self,
            MenuOperation::RemoveNode => Self::Normal,
        }
    }

    /// Returns `true` while the row is in edit mode.
    pub fn is_editing(self) -> bool {
        self == Self::Editing
    }
}

/// Ephemeral UI state of one node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeViewState {
    /// False while any ancestor is collapsed.
    pub is_visible: bool,
    /// Zero when hidden.
    pub row_height: f32,
    pub is_selected: bool,
    /// The row is the current drop-into target.
    pub is_highlighted: bool,
    pub is_editing: bool,
    pub can_show_insert_line_above: bool,
    pub can_show_insert_line_below: bool,
    /// The pointer is below the last visible row, which is this one.
    pub is_past_last_row: bool,
    pub border_width: f32,
    pub tooltip: Tooltip,
    pub interaction: InteractionState,
    /// Pending text while in edit mode.
    pub edit_text: Option<String>,
}

impl NodeViewState {
    /// A fresh state, visible or hidden.
    pub fn new(visible: bool, row_height: f32) -> Self {
        Self {
            is_visible: visible,
            row_height: if visible { row_height } else { 0.0 },
            is_selected: false,
            is_highlighted: false,
            is_editing: false,
            can_show_insert_line_above: false,
            can_show_insert_line_below: false,
            is_past_last_row: false,
            border_width: 0.0,
            tooltip: Tooltip::None,
            interaction: InteractionState::Normal,
            edit_text: None,
        }
    }

    /// Shows or hides the row.
    pub fn set_visible(&mut self, visible: bool, row_height: f32) {
        self.is_visible = visible;
        self.row_height = if visible { row_height } else { 0.0 };
    }

    /// Returns `true` if an insertion caret is drawn on this row.
    pub fn has_caret(&self) -> bool {
        self.can_show_insert_line_above || self.can_show_insert_line_below || self.is_past_last_row
    }

    /// Removes any insertion caret.
    pub fn clear_caret(&mut self) {
        self.can_show_insert_line_above = false;
        self.can_show_insert_line_below = false;
        self.is_past_last_row = false;
    }

    /// Shows a hover hint unless a warning is up.
    pub fn show_hint(&mut self, text: impl Into<String>) {
        if !matches!(self.tooltip, Tooltip::Warning(_)) {
            self.tooltip = Tooltip::Hint(text.into());
        }
    }

    /// Shows a warning, replacing any hint.
    pub fn show_warning(&mut self, text: impl Into<String>) {
        self.tooltip = Tooltip::Warning(text.into());
    }

    /// Clears a hint, leaving a warning in place.
    pub fn clear_hint(&mut self) {
        if matches!(self.tooltip, Tooltip::Hint(_)) {
            self.tooltip = Tooltip::None;
        }
    }

    pub fn clear_tooltip(&mut self) {
        self.tooltip = Tooltip::None;
    }

    /// Enters edit mode with `text` as the pending title.
    pub fn enter_edit(&mut self, text: impl Into<String>) {
        self.is_editing = true;
        self.interaction = self.interaction.on_menu(MenuOperation::ModifyNode);
        self.edit_text = Some(text.into());
    }

    /// Leaves edit mode and clears the tooltip.
    pub fn finish_edit(&mut self) {
        self.is_editing = false;
        self.interaction = self.interaction.on_menu(MenuOperation::CommitNode);
        self.edit_text = None;
        self.clear_tooltip();
    }

    /// Copies the ephemeral fields of `previous` that survive a rebuild.
    pub(crate) fn carry_over(&mut self, previous: &NodeViewState) {
        self.is_selected = previous.is_selected;
        self.is_editing = previous.is_editing;
        self.edit_text = previous.edit_text.clone();
        self.tooltip = previous.tooltip.clone();
        self.interaction = previous.interaction;
        self.border_width = previous.border_width;
    }
}

impl Default for NodeViewState {
    fn default() -> Self {
        Self::new(false, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_transitions() {
        let state = InteractionState::Normal;
        let state = state.on_event(InteractionEvent::TouchDown);
        assert_eq!(state, InteractionState::Selected);
        assert_eq!(state.on_event(InteractionEvent::Hover), InteractionState::Selected);
        assert_eq!(state.on_event(InteractionEvent::Blur), InteractionState::Normal);
    }

    #[test]
    fn test_editing_is_sticky_until_blur() {
        let state = InteractionState::Selected.on_menu(MenuOperation::ModifyNode);
        assert!(state.is_editing());
        assert_eq!(state.on_event(InteractionEvent::RightClick), InteractionState::Editing);
        assert_eq!(state.on_event(InteractionEvent::Blur), InteractionState::FinishedEditing);
        assert_eq!(state.on_menu(MenuOperation::CommitNode), InteractionState::FinishedEditing);
        assert_eq!(
            InteractionState::Selected.on_menu(MenuOperation::CommitNode),
            InteractionState::Selected
        );
    }

    #[test]
    fn test_tooltip_exclusivity() {
        let mut view = NodeViewState::new(true, 48.0);
        view.show_hint("full title");
        assert_eq!(view.tooltip, Tooltip::Hint("full title".into()));
        view.show_warning("bad char");
        view.show_hint("full title");
        assert_eq!(view.tooltip, Tooltip::Warning("bad char".into()));
        view.clear_hint();
        assert_eq!(view.tooltip, Tooltip::Warning("bad char".into()));
        view.clear_tooltip();
        assert_eq!(view.tooltip, Tooltip::None);
    }

    #[test]
    fn test_hidden_rows_have_no_height() {
        let mut view = NodeViewState::new(false, 48.0);
        assert_eq!(view.row_height, 0.0);
        view.set_visible(true, 48.0);
        assert_eq!(view.row_height, 48.0);
        assert_eq!(CollapseState::default().toggled(), CollapseState::Expanded);
    }
}
