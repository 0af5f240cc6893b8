//! Species card: summary, detail dialog and the view/edit/delete state machine.
//!
//! ```text
//! Closed --open--> Viewing --edit (owner)--> Editing
//!   ^                 |  ^                      |
//!   +-----close-------+  +--cancel / saved------+
//!   +-----------------close---------------------+
//! ```
//!
//! Mutations are split into a synchronous `begin_*` that hands out a ticket and a
//! `complete_*` that applies the store's answer. Closing the dialog or cancelling
//! an edit bumps the card's epoch and orphans the outstanding ticket. The card
//! stays busy until an orphaned answer lands; a committed write then still
//! refreshes the list, but the dialog is left as the user put it.

use std::{fmt, str::FromStr};

use shared::{
    domain::{Kingdom, Species, SpeciesFields, SpeciesId, UserId},
    protocol::{Notification, OwnerScope},
};
use tracing::{debug, info, warn};

use crate::{
    draft::FormDraft,
    error::{CardError, StoreError},
    fields::FieldName,
    menu::ActionMenu,
    summary::{display_name, CardSummary},
    CardServices, ConfirmPrompt, NotificationSink, RefreshHandle,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CardMode {
    #[default]
    Closed,
    Viewing,
    Editing,
}

impl CardMode {
    pub fn as_str(self) -> &'static str {
        match self {
            CardMode::Closed => "closed",
            CardMode::Viewing => "viewing",
            CardMode::Editing => "editing",
        }
    }

    pub fn view_state(self) -> ViewState {
        ViewState {
            is_open: self != CardMode::Closed,
            is_read_only: self != CardMode::Editing,
        }
    }
}

/// Dialog flags as a renderer sees them. Never `{ is_open: false, is_read_only: false }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewState {
    pub is_open: bool,
    pub is_read_only: bool,
}

/// Where the dialog lands after a successful save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AfterSave {
    #[default]
    Close,
    View,
}

impl fmt::Display for AfterSave {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AfterSave::Close => "close",
            AfterSave::View => "view",
        })
    }
}

impl FromStr for AfterSave {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "close" | "closed" => Ok(AfterSave::Close),
            "view" | "viewing" => Ok(AfterSave::View),
            other => Err(format!("expected 'close' or 'view', got '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Save,
    Delete,
}

impl Pending {
    fn as_str(self) -> &'static str {
        match self {
            Pending::Save => "save",
            Pending::Delete => "delete",
        }
    }
}

/// An owner-scoped update waiting for the store's answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveTicket {
    epoch: u64,
    scope: OwnerScope,
    fields: SpeciesFields,
}

impl SaveTicket {
    pub fn scope(&self) -> OwnerScope {
        self.scope
    }

    pub fn fields(&self) -> &SpeciesFields {
        &self.fields
    }
}

/// An owner-scoped delete waiting for the store's answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteTicket {
    epoch: u64,
    scope: OwnerScope,
}

impl DeleteTicket {
    pub fn scope(&self) -> OwnerScope {
        self.scope
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    Failed(StoreError),
    /// The dialog was closed or the edit cancelled before the answer arrived.
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Declined,
    Deleted,
    Failed(StoreError),
    Stale,
}

pub struct SpeciesCard {
    species: Species,
    viewer: UserId,
    mode: CardMode,
    draft: Option<FormDraft>,
    pending: Option<Pending>,
    epoch: u64,
    after_save: AfterSave,
    removed: bool,
}

impl SpeciesCard {
    pub fn new(species: Species, viewer: UserId) -> Self {
        Self {
            species,
            viewer,
            mode: CardMode::Closed,
            draft: None,
            pending: None,
            epoch: 0,
            after_save: AfterSave::default(),
            removed: false,
        }
    }

    pub fn with_after_save(mut self, after_save: AfterSave) -> Self {
        self.after_save = after_save;
        self
    }

    pub fn species(&self) -> &Species {
        &self.species
    }

    pub fn id(&self) -> SpeciesId {
        self.species.id
    }

    pub fn viewer(&self) -> UserId {
        self.viewer
    }

    pub fn mode(&self) -> CardMode {
        self.mode
    }

    pub fn view_state(&self) -> ViewState {
        self.mode.view_state()
    }

    pub fn is_owner(&self) -> bool {
        self.species.is_owned_by(self.viewer)
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// True once a delete for this card has been confirmed by the store.
    pub fn is_removed(&self) -> bool {
        self.removed
    }

    pub fn summary(&self) -> CardSummary {
        CardSummary::of(&self.species)
    }

    pub fn action_menu(&self) -> ActionMenu {
        ActionMenu::new(self.species.owner, self.viewer)
    }

    pub fn draft(&self) -> Option<&FormDraft> {
        self.draft.as_ref()
    }

    /// Takes a fresh copy of the record from a list reload. An open draft is
    /// left alone so the user's edits survive.
    pub fn sync(&mut self, species: Species) {
        if species.id == self.species.id {
            self.species = species;
        }
    }

    pub fn request_open(&mut self) {
        if self.removed {
            return;
        }
        if self.mode == CardMode::Closed {
            self.mode = CardMode::Viewing;
        }
    }

    /// Always allowed. Drops any draft and orphans in-flight requests; the card
    /// stays busy until their answers arrive.
    pub fn request_close(&mut self) {
        self.mode = CardMode::Closed;
        self.draft = None;
        self.epoch += 1;
    }

    pub fn request_edit(&mut self) -> Result<(), CardError> {
        self.expect_mode("edit", CardMode::Viewing)?;
        self.ensure_owner()?;
        self.ensure_idle()?;
        self.draft = Some(FormDraft::from_species(&self.species));
        self.mode = CardMode::Editing;
        Ok(())
    }

    /// Leaves edit mode without writing anything.
    pub fn cancel_edit(&mut self) -> Result<(), CardError> {
        self.expect_mode("cancel", CardMode::Editing)?;
        self.draft = None;
        self.epoch += 1;
        self.mode = CardMode::Viewing;
        Ok(())
    }

    /// Updates one field of the draft. The field's own validation result is kept
    /// on the draft; only a call outside edit mode is an error.
    pub fn set_field(&mut self, field: FieldName, input: impl Into<String>) -> Result<(), CardError> {
        let draft = self.editing_draft("set_field")?;
        let _ = draft.set(field, input);
        Ok(())
    }

    pub fn set_kingdom(&mut self, kingdom: Kingdom) -> Result<(), CardError> {
        self.editing_draft("set_kingdom")?.set_kingdom(kingdom);
        Ok(())
    }

    /// Whether the save control should be enabled.
    pub fn can_save(&self) -> bool {
        self.mode == CardMode::Editing
            && self.pending.is_none()
            && self.draft.as_ref().is_some_and(FormDraft::is_valid)
    }

    pub fn begin_save(&mut self) -> Result<SaveTicket, CardError> {
        self.expect_mode("save", CardMode::Editing)?;
        self.ensure_idle()?;
        self.ensure_owner()?;
        let fields = match &self.draft {
            Some(draft) => draft.build()?,
            None => FormDraft::from_species(&self.species).build()?,
        };
        self.pending = Some(Pending::Save);
        debug!(species_id = self.species.id.0, "species save dispatched");
        Ok(SaveTicket {
            epoch: self.epoch,
            scope: self.scope(),
            fields,
        })
    }

    pub fn complete_save(
        &mut self,
        ticket: SaveTicket,
        result: Result<(), StoreError>,
        notifier: &dyn NotificationSink,
        refresher: &dyn RefreshHandle,
    ) -> SaveOutcome {
        if !self.settle(Pending::Save, ticket.scope) {
            debug!(species_id = ticket.scope.id.0, "dropping unexpected save result");
            return SaveOutcome::Stale;
        }
        if ticket.epoch != self.epoch {
            if result.is_ok() {
                debug!(species_id = ticket.scope.id.0, "orphaned save landed");
                if self.mode != CardMode::Closed {
                    self.species.apply(ticket.fields);
                }
                refresher.refresh();
            } else {
                debug!(species_id = ticket.scope.id.0, "dropping orphaned save failure");
            }
            return SaveOutcome::Stale;
        }

        match result {
            Ok(()) => {
                self.species.apply(ticket.fields);
                self.draft = None;
                match self.after_save {
                    AfterSave::Close => self.request_close(),
                    AfterSave::View => self.mode = CardMode::Viewing,
                }
                info!(species_id = self.species.id.0, "species saved");
                refresher.refresh();
                SaveOutcome::Saved
            }
            Err(err) => {
                warn!(species_id = self.species.id.0, error = %err, "species save failed");
                notifier.notify(Notification::error(
                    format!("Could not save {}", display_name(&self.species)),
                    err.to_string(),
                ));
                SaveOutcome::Failed(err)
            }
        }
    }

    /// Asks for confirmation and, if given, hands out a delete ticket. A declined
    /// prompt returns `Ok(None)` and changes nothing.
    pub fn request_delete(
        &mut self,
        confirm: &dyn ConfirmPrompt,
    ) -> Result<Option<DeleteTicket>, CardError> {
        if self.mode == CardMode::Closed {
            return Err(self.invalid("delete"));
        }
        self.ensure_owner()?;
        self.ensure_idle()?;

        let name = display_name(&self.species).to_string();
        if !confirm.confirm(
            "Delete species",
            &format!("Delete {name}? This cannot be undone."),
        ) {
            debug!(species_id = self.species.id.0, "species delete declined");
            return Ok(None);
        }

        self.pending = Some(Pending::Delete);
        Ok(Some(DeleteTicket {
            epoch: self.epoch,
            scope: self.scope(),
        }))
    }

    pub fn complete_delete(
        &mut self,
        ticket: DeleteTicket,
        result: Result<(), StoreError>,
        notifier: &dyn NotificationSink,
        refresher: &dyn RefreshHandle,
    ) -> DeleteOutcome {
        if !self.settle(Pending::Delete, ticket.scope) {
            debug!(species_id = ticket.scope.id.0, "dropping unexpected delete result");
            return DeleteOutcome::Stale;
        }
        if ticket.epoch != self.epoch {
            if result.is_ok() {
                debug!(species_id = ticket.scope.id.0, "orphaned delete landed");
                refresher.refresh();
            } else {
                debug!(species_id = ticket.scope.id.0, "dropping orphaned delete failure");
            }
            return DeleteOutcome::Stale;
        }

        match result {
            Ok(()) => {
                self.request_close();
                self.removed = true;
                info!(species_id = self.species.id.0, "species deleted");
                refresher.refresh();
                DeleteOutcome::Deleted
            }
            Err(err) => {
                warn!(species_id = self.species.id.0, error = %err, "species delete failed");
                notifier.notify(Notification::error(
                    format!("Could not delete {}", display_name(&self.species)),
                    err.to_string(),
                ));
                DeleteOutcome::Failed(err)
            }
        }
    }

    /// Validates, writes and applies the draft in one go.
    pub async fn save(&mut self, services: &CardServices<'_>) -> Result<SaveOutcome, CardError> {
        let ticket = self.begin_save()?;
        let result = services.store.update(ticket.scope, &ticket.fields).await;
        Ok(self.complete_save(ticket, result, services.notifier, services.refresher))
    }

    pub async fn delete(
        &mut self,
        confirm: &dyn ConfirmPrompt,
        services: &CardServices<'_>,
    ) -> Result<DeleteOutcome, CardError> {
        let Some(ticket) = self.request_delete(confirm)? else {
            return Ok(DeleteOutcome::Declined);
        };
        let result = services.store.delete(ticket.scope).await;
        Ok(self.complete_delete(ticket, result, services.notifier, services.refresher))
    }

    fn scope(&self) -> OwnerScope {
        OwnerScope::new(self.species.id, self.viewer)
    }

    /// Clears the busy flag if `scope` answers the request this card is waiting on.
    fn settle(&mut self, kind: Pending, scope: OwnerScope) -> bool {
        if scope.id != self.species.id || self.pending != Some(kind) {
            return false;
        }
        self.pending = None;
        true
    }

    fn editing_draft(&mut self, operation: &'static str) -> Result<&mut FormDraft, CardError> {
        if self.mode != CardMode::Editing {
            return Err(self.invalid(operation));
        }
        let species = &self.species;
        Ok(self
            .draft
            .get_or_insert_with(|| FormDraft::from_species(species)))
    }

    fn expect_mode(&self, operation: &'static str, expected: CardMode) -> Result<(), CardError> {
        if self.mode == expected {
            Ok(())
        } else {
            Err(self.invalid(operation))
        }
    }

    fn invalid(&self, operation: &'static str) -> CardError {
        debug!(
            species_id = self.species.id.0,
            operation,
            mode = self.mode.as_str(),
            "rejected card transition"
        );
        CardError::InvalidTransition {
            operation,
            mode: self.mode.as_str(),
        }
    }

    fn ensure_owner(&self) -> Result<(), CardError> {
        if self.is_owner() {
            return Ok(());
        }
        warn!(
            species_id = self.species.id.0,
            viewer = self.viewer.0,
            owner = self.species.owner.0,
            "viewer attempted an owner-only action"
        );
        Err(CardError::AuthorizationMismatch {
            viewer: self.viewer,
            species: self.species.id,
        })
    }

    fn ensure_idle(&self) -> Result<(), CardError> {
        match self.pending {
            Some(pending) => Err(CardError::Busy(pending.as_str())),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "tests/card_tests.rs"]
mod tests;
