//! Backend worker: owns the tokio runtime and the database handle, drains the UI
//! command queue and reports back through `UiEvent`s.

use std::thread;

use client_core::SpeciesStore;
use crossbeam_channel::{Receiver, Sender, TrySendError};
use storage::Storage;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

pub fn launch(database_url: String, cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    thread::spawn(move || {
        emit(&ui_tx, UiEvent::Info("Backend worker starting...".to_string()));
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                emit(
                    &ui_tx,
                    UiEvent::Error(UiError::from_message(
                        UiErrorContext::BackendStartup,
                        format!("backend worker startup failure: failed to build runtime: {err}"),
                    )),
                );
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let storage = match Storage::new(&database_url).await {
                Ok(storage) => storage,
                Err(err) => {
                    tracing::error!(database_url = %database_url, "failed to open database: {err:#}");
                    emit(
                        &ui_tx,
                        UiEvent::Error(UiError::from_message(
                            UiErrorContext::BackendStartup,
                            format!("backend worker startup failure: database unavailable: {err:#}"),
                        )),
                    );
                    return;
                }
            };
            tracing::info!(database_url = %database_url, "backend worker ready");
            emit(&ui_tx, UiEvent::Info("Connected to species database".to_string()));

            while let Ok(cmd) = cmd_rx.recv() {
                let event = run_command(&storage, cmd).await;
                emit(&ui_tx, event);
            }
            tracing::info!("ui command queue closed; backend worker exiting");
        });
    });
}

async fn run_command(store: &dyn SpeciesStore, cmd: BackendCommand) -> UiEvent {
    tracing::debug!(command = cmd.name(), "running backend command");
    match cmd {
        BackendCommand::LoadSpecies => match store.list().await {
            Ok(species) => UiEvent::SpeciesLoaded(species),
            Err(err) => UiEvent::Error(UiError::from_message(
                UiErrorContext::LoadSpecies,
                format!("failed to load species: {err}"),
            )),
        },
        BackendCommand::SaveSpecies(ticket) => {
            let result = store.update(ticket.scope(), ticket.fields()).await;
            UiEvent::SaveFinished { ticket, result }
        }
        BackendCommand::DeleteSpecies(ticket) => {
            let result = store.delete(ticket.scope()).await;
            UiEvent::DeleteFinished { ticket, result }
        }
        BackendCommand::CreateSpecies(ticket) => {
            let result = store.insert(ticket.owner(), ticket.fields()).await;
            UiEvent::CreateFinished { ticket, result }
        }
    }
}

fn emit(ui_tx: &Sender<UiEvent>, event: UiEvent) {
    if event.settles_ticket() {
        if ui_tx.send(event).is_err() {
            tracing::warn!("ui event queue closed; dropping completion");
        }
        return;
    }
    match ui_tx.try_send(event) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => {
            tracing::warn!("ui event queue full; dropping backend event");
        }
        Err(TrySendError::Disconnected(_)) => {
            tracing::warn!("ui event queue closed; dropping backend event");
        }
    }
}
