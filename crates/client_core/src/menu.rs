//! The edit/delete popover shown in the detail dialog header.

use shared::domain::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuCommand {
    Edit,
    Delete,
}

impl MenuCommand {
    pub const ALL: [MenuCommand; 2] = [MenuCommand::Edit, MenuCommand::Delete];

    pub fn label(self) -> &'static str {
        match self {
            MenuCommand::Edit => "Edit",
            MenuCommand::Delete => "Delete",
        }
    }
}

/// Intent emitted upward by a click on an enabled command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuIntent {
    StartEdit,
    ConfirmDelete,
}

/// Stateless: both commands are enabled only for the record's owner. Delete
/// confirmation belongs to the card, not the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionMenu {
    owner: UserId,
    viewer: UserId,
}

impl ActionMenu {
    pub fn new(owner: UserId, viewer: UserId) -> Self {
        Self { owner, viewer }
    }

    pub fn is_enabled(&self, _command: MenuCommand) -> bool {
        self.owner == self.viewer
    }

    /// One click, at most one intent. Disabled commands emit nothing.
    pub fn click(&self, command: MenuCommand) -> Option<MenuIntent> {
        if !self.is_enabled(command) {
            tracing::debug!(
                command = command.label(),
                viewer = self.viewer.0,
                owner = self.owner.0,
                "ignored click on disabled menu command"
            );
            return None;
        }
        Some(match command {
            MenuCommand::Edit => MenuIntent::StartEdit,
            MenuCommand::Delete => MenuIntent::ConfirmDelete,
        })
    }

    /// Like [`ActionMenu::click`], but hands the intent to the matching callback.
    pub fn dispatch(
        &self,
        command: MenuCommand,
        on_edit: impl FnOnce(),
        on_delete: impl FnOnce(),
    ) {
        match self.click(command) {
            Some(MenuIntent::StartEdit) => on_edit(),
            Some(MenuIntent::ConfirmDelete) => on_delete(),
            None => {}
        }
    }
}
