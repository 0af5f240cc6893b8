//! Headless species catalog client: form validation, the card state machine and
//! the collaborators it talks to.

use async_trait::async_trait;
use shared::{
    domain::{Species, SpeciesFields, SpeciesId, UserId},
    protocol::{Notification, OwnerScope},
};

pub mod card;
pub mod creator;
pub mod draft;
pub mod error;
pub mod fields;
pub mod menu;
mod store;
pub mod summary;

pub use card::{
    AfterSave, CardMode, DeleteOutcome, DeleteTicket, SaveOutcome, SaveTicket, SpeciesCard,
    ViewState,
};
pub use creator::{CreateOutcome, CreateTicket, SpeciesCreator};
pub use draft::FormDraft;
pub use error::{CardError, FieldError, StoreError, ValidationErrors};
pub use fields::{FieldInput, FieldName, FieldSpec, SPECIES_FIELDS};
pub use menu::{ActionMenu, MenuCommand, MenuIntent};
pub use summary::CardSummary;

/// The hosted table the catalog reads and writes. Mutations are scoped by id and
/// owner; a scope that matches nothing is a [`StoreError::NoMatch`].
#[async_trait]
pub trait SpeciesStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Species>, StoreError>;
    async fn insert(&self, owner: UserId, fields: &SpeciesFields) -> Result<SpeciesId, StoreError>;
    async fn update(&self, scope: OwnerScope, fields: &SpeciesFields) -> Result<(), StoreError>;
    async fn delete(&self, scope: OwnerScope) -> Result<(), StoreError>;
}

/// User-visible toast/banner output.
pub trait NotificationSink {
    fn notify(&self, notification: Notification);
}

/// Asks whatever owns the species list to fetch it again.
pub trait RefreshHandle {
    fn refresh(&self);
}

/// Blocking yes/no question to the user.
pub trait ConfirmPrompt {
    fn confirm(&self, title: &str, message: &str) -> bool;
}

/// Collaborators needed to run a mutation end to end.
#[derive(Clone, Copy)]
pub struct CardServices<'a> {
    pub store: &'a dyn SpeciesStore,
    pub notifier: &'a dyn NotificationSink,
    pub refresher: &'a dyn RefreshHandle,
}
