use std::{
    cell::{Cell, RefCell},
    sync::Mutex,
};

use async_trait::async_trait;
use shared::{domain::KINGDOMS, protocol::Severity};

use super::*;
use crate::{error::FieldError, SpeciesStore};

const OWNER: UserId = UserId(10);
const STRANGER: UserId = UserId(11);

#[derive(Default)]
struct RecordingNotifier {
    seen: RefCell<Vec<Notification>>,
}

impl NotificationSink for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen.borrow_mut().push(notification);
    }
}

#[derive(Default)]
struct CountingRefresher {
    calls: Cell<usize>,
}

impl RefreshHandle for CountingRefresher {
    fn refresh(&self) {
        self.calls.set(self.calls.get() + 1);
    }
}

struct ScriptedConfirm {
    answer: bool,
    asked: Cell<usize>,
}

impl ScriptedConfirm {
    fn answering(answer: bool) -> Self {
        Self {
            answer,
            asked: Cell::new(0),
        }
    }
}

impl ConfirmPrompt for ScriptedConfirm {
    fn confirm(&self, _title: &str, _message: &str) -> bool {
        self.asked.set(self.asked.get() + 1);
        self.answer
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum StoreCall {
    Update(OwnerScope, SpeciesFields),
    Delete(OwnerScope),
}

#[derive(Default)]
struct RecordingStore {
    calls: Mutex<Vec<StoreCall>>,
    fail_with: Option<String>,
}

impl RecordingStore {
    fn failing(message: impl Into<String>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_with: Some(message.into()),
        }
    }

    fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    fn answer(&self) -> Result<(), StoreError> {
        match &self.fail_with {
            Some(message) => Err(StoreError::Backend(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SpeciesStore for RecordingStore {
    async fn list(&self) -> Result<Vec<Species>, StoreError> {
        Ok(Vec::new())
    }

    async fn insert(&self, _owner: UserId, _fields: &SpeciesFields) -> Result<SpeciesId, StoreError> {
        Err(StoreError::Backend("insert not scripted".to_string()))
    }

    async fn update(&self, scope: OwnerScope, fields: &SpeciesFields) -> Result<(), StoreError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push(StoreCall::Update(scope, fields.clone()));
        self.answer()
    }

    async fn delete(&self, scope: OwnerScope) -> Result<(), StoreError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push(StoreCall::Delete(scope));
        self.answer()
    }
}

struct Harness {
    store: RecordingStore,
    notifier: RecordingNotifier,
    refresher: CountingRefresher,
}

impl Harness {
    fn new(store: RecordingStore) -> Self {
        Self {
            store,
            notifier: RecordingNotifier::default(),
            refresher: CountingRefresher::default(),
        }
    }

    fn services(&self) -> CardServices<'_> {
        CardServices {
            store: &self.store,
            notifier: &self.notifier,
            refresher: &self.refresher,
        }
    }
}

fn mushroom() -> Species {
    Species {
        id: SpeciesId(42),
        owner: OWNER,
        scientific_name: "Amanita muscaria".to_string(),
        common_name: Some("Fly agaric".to_string()),
        kingdom: Kingdom::Fungi,
        total_population: None,
        description: Some("Red cap with white spots.".to_string()),
        image: None,
        created_at: "2024-01-01T00:00:00Z".parse().expect("timestamp"),
    }
}

fn editing_card() -> SpeciesCard {
    let mut card = SpeciesCard::new(mushroom(), OWNER);
    card.request_open();
    card.request_edit().expect("owner may edit");
    card
}

#[test]
fn open_close_cycle_follows_the_state_machine() {
    let mut card = SpeciesCard::new(mushroom(), STRANGER);
    assert_eq!(card.mode(), CardMode::Closed);
    assert_eq!(
        card.view_state(),
        ViewState {
            is_open: false,
            is_read_only: true
        }
    );

    card.request_open();
    assert_eq!(card.mode(), CardMode::Viewing);
    assert!(card.view_state().is_open);

    card.request_close();
    assert_eq!(card.mode(), CardMode::Closed);
}

#[test]
fn close_from_editing_lands_read_only_and_drops_draft() {
    let mut card = editing_card();
    card.set_field(FieldName::CommonName, "Toadstool")
        .expect("editing");

    card.request_close();
    assert_eq!(
        card.view_state(),
        ViewState {
            is_open: false,
            is_read_only: true
        }
    );
    assert!(card.draft().is_none());

    card.request_open();
    assert_eq!(card.mode(), CardMode::Viewing);
    assert_eq!(card.species().common_name.as_deref(), Some("Fly agaric"));
}

#[test]
fn edit_requires_an_open_dialog() {
    let mut card = SpeciesCard::new(mushroom(), OWNER);
    assert!(matches!(
        card.request_edit(),
        Err(CardError::InvalidTransition { .. })
    ));
    assert_eq!(card.mode(), CardMode::Closed);
}

#[test]
fn entering_edit_seeds_the_draft_from_the_record() {
    let card = editing_card();
    let draft = card.draft().expect("draft");
    assert_eq!(draft.input(FieldName::ScientificName), "Amanita muscaria");
    assert_eq!(draft.input(FieldName::Kingdom), "Fungi");
    assert_eq!(draft.input(FieldName::TotalPopulation), "");
    assert!(card.can_save());
}

#[test]
fn cancel_discards_the_draft_and_returns_to_viewing() {
    let mut card = editing_card();
    card.set_field(FieldName::Description, "changed").expect("editing");

    card.cancel_edit().expect("cancel");
    assert_eq!(card.mode(), CardMode::Viewing);
    assert!(card.draft().is_none());
    assert_eq!(
        card.species().description.as_deref(),
        Some("Red cap with white spots.")
    );

    card.request_edit().expect("re-enter edit");
    assert_eq!(
        card.draft().expect("draft").input(FieldName::Description),
        "Red cap with white spots."
    );
}

#[tokio::test]
async fn save_is_unreachable_while_viewing() {
    let harness = Harness::new(RecordingStore::default());
    let mut card = SpeciesCard::new(mushroom(), OWNER);
    card.request_open();

    assert!(!card.can_save());
    let err = card.save(&harness.services()).await.expect_err("viewing");
    assert!(matches!(err, CardError::InvalidTransition { .. }));
    assert_eq!(card.mode(), CardMode::Viewing);
    assert!(harness.store.calls().is_empty());
}

#[tokio::test]
async fn blank_scientific_name_blocks_save() {
    let harness = Harness::new(RecordingStore::default());
    let mut card = editing_card();
    card.set_field(FieldName::ScientificName, "").expect("editing");

    assert!(!card.can_save());
    assert_eq!(
        card.draft().expect("draft").error(FieldName::ScientificName),
        Some(&FieldError::Required)
    );
    let err = card.save(&harness.services()).await.expect_err("invalid");
    match err {
        CardError::Validation(errors) => {
            assert_eq!(errors.get(FieldName::ScientificName), Some(&FieldError::Required));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(card.mode(), CardMode::Editing);
    assert!(harness.store.calls().is_empty());
    assert!(harness.notifier.seen.borrow().is_empty());
}

#[tokio::test]
async fn zero_population_blocks_save() {
    let harness = Harness::new(RecordingStore::default());
    let mut card = editing_card();
    card.set_field(FieldName::TotalPopulation, "0").expect("editing");

    assert!(!card.can_save());
    let err = card.save(&harness.services()).await.expect_err("invalid");
    assert!(matches!(err, CardError::Validation(_)));
    assert_eq!(card.mode(), CardMode::Editing);
    assert!(harness.store.calls().is_empty());
}

#[tokio::test]
async fn non_owner_cannot_edit_or_delete() {
    let harness = Harness::new(RecordingStore::default());
    let confirm = ScriptedConfirm::answering(true);
    let mut card = SpeciesCard::new(mushroom(), STRANGER);
    card.request_open();

    let menu = card.action_menu();
    for command in crate::menu::MenuCommand::ALL {
        assert!(!menu.is_enabled(command));
    }

    assert!(matches!(
        card.request_edit(),
        Err(CardError::AuthorizationMismatch { .. })
    ));
    assert_eq!(card.mode(), CardMode::Viewing);
    assert!(card.draft().is_none());

    let err = card
        .delete(&confirm, &harness.services())
        .await
        .expect_err("stranger delete");
    assert!(matches!(err, CardError::AuthorizationMismatch { .. }));
    assert_eq!(confirm.asked.get(), 0);
    assert!(harness.store.calls().is_empty());
    assert!(!card.is_removed());
    assert_eq!(card.mode(), CardMode::Viewing);
}

#[tokio::test]
async fn declined_delete_dispatches_nothing() {
    let harness = Harness::new(RecordingStore::default());
    let confirm = ScriptedConfirm::answering(false);
    let mut card = SpeciesCard::new(mushroom(), OWNER);
    card.request_open();

    let outcome = card
        .delete(&confirm, &harness.services())
        .await
        .expect("declined is not an error");
    assert_eq!(outcome, DeleteOutcome::Declined);
    assert_eq!(confirm.asked.get(), 1);
    assert!(harness.store.calls().is_empty());
    assert_eq!(harness.refresher.calls.get(), 0);
    assert_eq!(card.mode(), CardMode::Viewing);
    assert!(!card.is_busy());
}

#[tokio::test]
async fn confirmed_delete_is_owner_scoped_and_refreshes_once() {
    let harness = Harness::new(RecordingStore::default());
    let confirm = ScriptedConfirm::answering(true);
    let mut card = SpeciesCard::new(mushroom(), OWNER);
    card.request_open();

    let outcome = card
        .delete(&confirm, &harness.services())
        .await
        .expect("delete");
    assert_eq!(outcome, DeleteOutcome::Deleted);
    assert_eq!(
        harness.store.calls(),
        vec![StoreCall::Delete(OwnerScope::new(SpeciesId(42), OWNER))]
    );
    assert_eq!(harness.refresher.calls.get(), 1);
    assert!(card.is_removed());
    assert_eq!(card.mode(), CardMode::Closed);

    card.request_open();
    assert_eq!(card.mode(), CardMode::Closed);
}

#[tokio::test]
async fn failed_delete_keeps_the_card_and_notifies() {
    let harness = Harness::new(RecordingStore::failing("permission denied for table species"));
    let confirm = ScriptedConfirm::answering(true);
    let mut card = SpeciesCard::new(mushroom(), OWNER);
    card.request_open();

    let outcome = card
        .delete(&confirm, &harness.services())
        .await
        .expect("delete attempt");
    assert!(matches!(outcome, DeleteOutcome::Failed(_)));
    assert!(!card.is_removed());
    assert_eq!(card.mode(), CardMode::Viewing);
    let seen = harness.notifier.seen.borrow();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].description, "permission denied for table species");
    assert_eq!(harness.refresher.calls.get(), 0);
}

#[tokio::test]
async fn failed_save_stays_editing_and_notifies_once() {
    let harness = Harness::new(RecordingStore::failing("connection reset by peer"));
    let mut card = editing_card();
    card.set_field(FieldName::CommonName, "Fly amanita")
        .expect("editing");

    let outcome = card.save(&harness.services()).await.expect("save attempt");
    assert_eq!(
        outcome,
        SaveOutcome::Failed(StoreError::Backend("connection reset by peer".to_string()))
    );
    assert_eq!(card.mode(), CardMode::Editing);
    assert_eq!(card.species().common_name.as_deref(), Some("Fly agaric"));
    assert_eq!(
        card.draft().expect("draft kept").input(FieldName::CommonName),
        "Fly amanita"
    );

    let seen = harness.notifier.seen.borrow();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].severity, Severity::Error);
    assert_eq!(seen[0].description, "connection reset by peer");
    assert_eq!(harness.refresher.calls.get(), 0);
    assert!(card.can_save(), "user can retry after a failure");
}

#[tokio::test]
async fn successful_save_sends_normalized_fields_scoped_by_owner() {
    let harness = Harness::new(RecordingStore::default());
    let mut card = editing_card();
    card.set_field(FieldName::ScientificName, "  Amanita muscaria var. guessowii ")
        .expect("editing");
    card.set_field(FieldName::CommonName, "   ").expect("editing");
    card.set_field(FieldName::TotalPopulation, " 5000 ")
        .expect("editing");
    card.set_kingdom(KINGDOMS[2]).expect("editing");

    let outcome = card.save(&harness.services()).await.expect("save");
    assert_eq!(outcome, SaveOutcome::Saved);

    let expected = SpeciesFields {
        scientific_name: "Amanita muscaria var. guessowii".to_string(),
        common_name: None,
        kingdom: Kingdom::Fungi,
        total_population: Some(5000),
        description: Some("Red cap with white spots.".to_string()),
        image: None,
    };
    assert_eq!(
        harness.store.calls(),
        vec![StoreCall::Update(
            OwnerScope::new(SpeciesId(42), OWNER),
            expected.clone()
        )]
    );
    assert_eq!(card.species().fields(), expected);
    assert_eq!(card.mode(), CardMode::Closed);
    assert_eq!(harness.refresher.calls.get(), 1);
    assert!(harness.notifier.seen.borrow().is_empty());
}

#[tokio::test]
async fn after_save_view_drops_back_to_viewing() {
    let harness = Harness::new(RecordingStore::default());
    let mut card = SpeciesCard::new(mushroom(), OWNER).with_after_save(AfterSave::View);
    card.request_open();
    card.request_edit().expect("edit");

    card.save(&harness.services()).await.expect("save");
    assert_eq!(card.mode(), CardMode::Viewing);
    assert!(card.view_state().is_read_only);
}

#[test]
fn second_save_is_rejected_while_one_is_in_flight() {
    let mut card = editing_card();
    let _ticket = card.begin_save().expect("first save");

    assert!(card.is_busy());
    assert!(!card.can_save());
    assert_eq!(card.begin_save(), Err(CardError::Busy("save")));
}

#[test]
fn result_arriving_after_close_is_ignored() {
    let notifier = RecordingNotifier::default();
    let refresher = CountingRefresher::default();
    let mut card = editing_card();
    card.set_field(FieldName::CommonName, "Toadstool")
        .expect("editing");
    let ticket = card.begin_save().expect("save");

    card.request_close();
    let outcome = card.complete_save(
        ticket,
        Err(StoreError::Backend("late failure".to_string())),
        &notifier,
        &refresher,
    );

    assert_eq!(outcome, SaveOutcome::Stale);
    assert_eq!(card.mode(), CardMode::Closed);
    assert_eq!(card.species().common_name.as_deref(), Some("Fly agaric"));
    assert!(notifier.seen.borrow().is_empty());
    assert_eq!(refresher.calls.get(), 0);
    assert!(!card.is_busy());
}

#[test]
fn late_delete_result_after_reopen_is_ignored() {
    let notifier = RecordingNotifier::default();
    let refresher = CountingRefresher::default();
    let confirm = ScriptedConfirm::answering(true);
    let mut card = SpeciesCard::new(mushroom(), OWNER);
    card.request_open();
    let ticket = card
        .request_delete(&confirm)
        .expect("delete")
        .expect("confirmed");

    card.request_close();
    card.request_open();
    let outcome = card.complete_delete(ticket, Ok(()), &notifier, &refresher);

    assert_eq!(outcome, DeleteOutcome::Stale);
    assert!(!card.is_removed());
    assert_eq!(card.mode(), CardMode::Viewing);
    assert!(notifier.seen.borrow().is_empty());
    assert_eq!(refresher.calls.get(), 1, "committed delete still reloads the list");
    assert!(!card.is_busy());
}

#[test]
fn cancel_then_resave_is_busy_until_first_save_lands() {
    let notifier = RecordingNotifier::default();
    let refresher = CountingRefresher::default();
    let mut card = editing_card();
    card.set_field(FieldName::ScientificName, "Amanita pantherina")
        .expect("editing");
    let first = card.begin_save().expect("first save");

    card.cancel_edit().expect("cancel while saving");
    assert!(card.is_busy());
    assert_eq!(card.request_edit(), Err(CardError::Busy("save")));
    assert_eq!(card.mode(), CardMode::Viewing);

    let outcome = card.complete_save(first, Ok(()), &notifier, &refresher);
    assert_eq!(outcome, SaveOutcome::Stale);
    assert!(!card.is_busy());

    card.request_edit().expect("idle again");
    let second = card.begin_save().expect("second save");
    assert_eq!(second.fields().scientific_name, "Amanita pantherina");
}

#[test]
fn save_landing_after_cancel_updates_the_open_dialog() {
    let notifier = RecordingNotifier::default();
    let refresher = CountingRefresher::default();
    let mut card = editing_card();
    card.set_field(FieldName::ScientificName, "Amanita pantherina")
        .expect("editing");
    let ticket = card.begin_save().expect("save");

    card.cancel_edit().expect("cancel");
    let outcome = card.complete_save(ticket, Ok(()), &notifier, &refresher);

    assert_eq!(outcome, SaveOutcome::Stale);
    assert_eq!(card.mode(), CardMode::Viewing);
    assert_eq!(card.species().scientific_name, "Amanita pantherina");
    assert_eq!(refresher.calls.get(), 1);
    assert!(notifier.seen.borrow().is_empty());
}

#[test]
fn save_landing_after_close_reloads_but_keeps_dialog_closed() {
    let notifier = RecordingNotifier::default();
    let refresher = CountingRefresher::default();
    let mut card = editing_card();
    card.set_field(FieldName::ScientificName, "Amanita pantherina")
        .expect("editing");
    let ticket = card.begin_save().expect("save");

    card.request_close();
    assert!(card.is_busy());
    let outcome = card.complete_save(ticket, Ok(()), &notifier, &refresher);

    assert_eq!(outcome, SaveOutcome::Stale);
    assert_eq!(card.mode(), CardMode::Closed);
    assert_eq!(card.species().scientific_name, "Amanita muscaria");
    assert_eq!(refresher.calls.get(), 1);
    assert!(!card.is_busy());
}

#[test]
fn edit_is_rejected_while_a_delete_is_pending() {
    let confirm = ScriptedConfirm::answering(true);
    let mut card = SpeciesCard::new(mushroom(), OWNER);
    card.request_open();
    let _ticket = card
        .request_delete(&confirm)
        .expect("delete")
        .expect("confirmed");

    assert_eq!(card.request_edit(), Err(CardError::Busy("delete")));
    assert_eq!(card.mode(), CardMode::Viewing);
    assert!(card.draft().is_none());
}

#[test]
fn create_landing_after_close_reloads_and_frees_the_creator() {
    let notifier = RecordingNotifier::default();
    let refresher = CountingRefresher::default();
    let mut creator = crate::SpeciesCreator::new(OWNER);
    creator.open();
    creator
        .set_field(FieldName::ScientificName, "Lynx lynx")
        .expect("open");
    let ticket = creator.begin_submit().expect("submit");

    creator.close();
    creator.open();
    assert!(creator.is_busy());
    assert_eq!(creator.begin_submit(), Err(CardError::Busy("create")));

    let outcome = creator.complete_submit(ticket, Ok(SpeciesId(7)), &notifier, &refresher);
    assert_eq!(outcome, crate::CreateOutcome::Stale);
    assert_eq!(refresher.calls.get(), 1);
    assert!(!creator.is_busy());
    assert!(creator.is_open());
}

#[test]
fn sync_refreshes_baseline_but_keeps_open_draft() {
    let mut card = editing_card();
    card.set_field(FieldName::CommonName, "Toadstool")
        .expect("editing");

    let mut reloaded = mushroom();
    reloaded.total_population = Some(77);
    card.sync(reloaded);

    assert_eq!(card.species().total_population, Some(77));
    assert_eq!(
        card.draft().expect("draft").input(FieldName::CommonName),
        "Toadstool"
    );
}

#[test]
fn after_save_parses_from_config_text() {
    assert_eq!("close".parse::<AfterSave>(), Ok(AfterSave::Close));
    assert_eq!(" View ".parse::<AfterSave>(), Ok(AfterSave::View));
    assert!("reopen".parse::<AfterSave>().is_err());
}
