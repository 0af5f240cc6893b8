use shared::{
    domain::{Kingdom, SpeciesFields, SpeciesId, UserId},
    protocol::Notification,
};
use tracing::{debug, info, warn};

use crate::{
    draft::FormDraft,
    error::{CardError, StoreError},
    fields::FieldName,
    CardServices, NotificationSink, RefreshHandle,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTicket {
    epoch: u64,
    owner: UserId,
    fields: SpeciesFields,
}

impl CreateTicket {
    pub fn owner(&self) -> UserId {
        self.owner
    }

    pub fn fields(&self) -> &SpeciesFields {
        &self.fields
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(SpeciesId),
    Failed(StoreError),
    Stale,
}

/// "Add species" dialog. The new record is owned by the viewer.
pub struct SpeciesCreator {
    viewer: UserId,
    open: bool,
    draft: FormDraft,
    pending: bool,
    epoch: u64,
}

impl SpeciesCreator {
    pub fn new(viewer: UserId) -> Self {
        Self {
            viewer,
            open: false,
            draft: FormDraft::blank(),
            pending: false,
            epoch: 0,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_busy(&self) -> bool {
        self.pending
    }

    pub fn draft(&self) -> &FormDraft {
        &self.draft
    }

    pub fn open(&mut self) {
        if !self.open {
            self.draft = FormDraft::blank();
            self.open = true;
        }
    }

    /// Hides the dialog. An insert already dispatched keeps the creator busy
    /// until its answer arrives.
    pub fn close(&mut self) {
        self.open = false;
        self.draft = FormDraft::blank();
        self.epoch += 1;
    }

    pub fn set_field(&mut self, field: FieldName, input: impl Into<String>) -> Result<(), CardError> {
        self.ensure_open("set_field")?;
        let _ = self.draft.set(field, input);
        Ok(())
    }

    pub fn set_kingdom(&mut self, kingdom: Kingdom) -> Result<(), CardError> {
        self.ensure_open("set_kingdom")?;
        self.draft.set_kingdom(kingdom);
        Ok(())
    }

    pub fn can_submit(&self) -> bool {
        self.open && !self.pending && self.draft.is_valid()
    }

    pub fn begin_submit(&mut self) -> Result<CreateTicket, CardError> {
        self.ensure_open("create")?;
        if self.pending {
            return Err(CardError::Busy("create"));
        }
        let fields = self.draft.build()?;
        self.pending = true;
        debug!(owner = self.viewer.0, "species insert dispatched");
        Ok(CreateTicket {
            epoch: self.epoch,
            owner: self.viewer,
            fields,
        })
    }

    pub fn complete_submit(
        &mut self,
        ticket: CreateTicket,
        result: Result<SpeciesId, StoreError>,
        notifier: &dyn NotificationSink,
        refresher: &dyn RefreshHandle,
    ) -> CreateOutcome {
        if !self.pending {
            debug!("dropping unexpected create result");
            return CreateOutcome::Stale;
        }
        self.pending = false;
        if ticket.epoch != self.epoch {
            if let Ok(species_id) = result {
                debug!(species_id = species_id.0, "orphaned insert landed");
                refresher.refresh();
            }
            return CreateOutcome::Stale;
        }

        match result {
            Ok(species_id) => {
                info!(species_id = species_id.0, "species created");
                self.close();
                refresher.refresh();
                CreateOutcome::Created(species_id)
            }
            Err(err) => {
                warn!(error = %err, "species insert failed");
                notifier.notify(Notification::error(
                    format!("Could not add {}", ticket.fields.scientific_name),
                    err.to_string(),
                ));
                CreateOutcome::Failed(err)
            }
        }
    }

    pub async fn submit(&mut self, services: &CardServices<'_>) -> Result<CreateOutcome, CardError> {
        let ticket = self.begin_submit()?;
        let result = services.store.insert(ticket.owner, &ticket.fields).await;
        Ok(self.complete_submit(ticket, result, services.notifier, services.refresher))
    }

    fn ensure_open(&self, operation: &'static str) -> Result<(), CardError> {
        if self.open {
            Ok(())
        } else {
            Err(CardError::InvalidTransition {
                operation,
                mode: "closed",
            })
        }
    }
}
