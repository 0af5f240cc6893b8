use std::time::{Duration, Instant};

use client_core::{
    AfterSave, CardError, ConfirmPrompt, NotificationSink, SpeciesCard, SpeciesCreator,
    StoreError,
};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use shared::{
    domain::{Species, UserId},
    error::ApiError,
    protocol::Notification,
};

use crate::backend_bridge::commands::BackendCommand;
use crate::config::Settings;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};
use crate::controller::orchestration::dispatch_backend_command;
use crate::ui::card_view::{show_creator, show_dialog, show_tile, CardAction, CreatorAction};
use crate::ui::form::FormEdit;
use crate::ui::toasts::{NativeConfirm, RefreshFlag, ToastQueue};

#[derive(Debug, Clone)]
struct StatusBanner {
    message: String,
}

pub struct SpeciesCatalogApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    viewer: UserId,
    after_save: AfterSave,
    cards: Vec<SpeciesCard>,
    creator: SpeciesCreator,
    toasts: ToastQueue,
    refresh: RefreshFlag,
    confirm: Box<dyn ConfirmPrompt>,
    status: String,
    status_banner: Option<StatusBanner>,
    filter: String,
    only_mine: bool,
    loaded: bool,
}

impl SpeciesCatalogApp {
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        settings: &Settings,
    ) -> Self {
        Self::with_confirm(cmd_tx, ui_rx, settings, Box::new(NativeConfirm))
    }

    fn with_confirm(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        settings: &Settings,
        confirm: Box<dyn ConfirmPrompt>,
    ) -> Self {
        let mut app = Self {
            cmd_tx,
            ui_rx,
            viewer: settings.viewer_id,
            after_save: settings.after_save,
            cards: Vec::new(),
            creator: SpeciesCreator::new(settings.viewer_id),
            toasts: ToastQueue::new(Duration::from_secs(settings.toast_seconds)),
            refresh: RefreshFlag::default(),
            confirm,
            status: "Loading species...".to_string(),
            status_banner: None,
            filter: String::new(),
            only_mine: false,
            loaded: false,
        };
        app.queue(BackendCommand::LoadSpecies);
        app
    }

    fn queue(&mut self, cmd: BackendCommand) {
        let Some(rejected) = dispatch_backend_command(&self.cmd_tx, cmd, &mut self.status) else {
            return;
        };
        let err = StoreError::Backend(self.status.clone());
        match rejected {
            BackendCommand::LoadSpecies => {}
            BackendCommand::SaveSpecies(ticket) => {
                if let Some(card) = self.cards.iter_mut().find(|c| c.id() == ticket.scope().id) {
                    card.complete_save(ticket, Err(err), &self.toasts, &self.refresh);
                }
            }
            BackendCommand::DeleteSpecies(ticket) => {
                if let Some(card) = self.cards.iter_mut().find(|c| c.id() == ticket.scope().id) {
                    card.complete_delete(ticket, Err(err), &self.toasts, &self.refresh);
                }
            }
            BackendCommand::CreateSpecies(ticket) => {
                self.creator
                    .complete_submit(ticket, Err(err), &self.toasts, &self.refresh);
            }
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => {
                    self.status = message;
                }
                UiEvent::Error(err) => self.report(err),
                UiEvent::SpeciesLoaded(species) => {
                    let count = species.len();
                    merge_species(&mut self.cards, species, self.viewer, self.after_save);
                    self.loaded = true;
                    self.status_banner = None;
                    self.status = format!("{count} species loaded");
                }
                UiEvent::SaveFinished { ticket, result } => {
                    match self.cards.iter_mut().find(|c| c.id() == ticket.scope().id) {
                        Some(card) => {
                            card.complete_save(ticket, result, &self.toasts, &self.refresh);
                        }
                        None => tracing::debug!("save result for a card no longer listed"),
                    }
                }
                UiEvent::DeleteFinished { ticket, result } => {
                    match self.cards.iter_mut().find(|c| c.id() == ticket.scope().id) {
                        Some(card) => {
                            card.complete_delete(ticket, result, &self.toasts, &self.refresh);
                        }
                        None => tracing::debug!("delete result for a card no longer listed"),
                    }
                    self.cards.retain(|card| !card.is_removed());
                }
                UiEvent::CreateFinished { ticket, result } => {
                    self.creator
                        .complete_submit(ticket, result, &self.toasts, &self.refresh);
                }
            }
        }

        if self.refresh.take() {
            self.queue(BackendCommand::LoadSpecies);
        }
    }

    fn report(&mut self, err: UiError) {
        tracing::warn!(context = ?err.context(), "{}", err.message());
        self.status = format!("{} error: {}", err.category().label(), err.message());
        if err.wants_banner() {
            self.status_banner = Some(StatusBanner {
                message: self.status.clone(),
            });
        } else {
            self.toasts.notify(Notification::error(
                format!("{} error", err.category().label()),
                err.message(),
            ));
        }
    }

    fn apply_card_action(&mut self, index: usize, action: CardAction) {
        let Some(card) = self.cards.get_mut(index) else {
            return;
        };
        let context = match action {
            CardAction::Save => UiErrorContext::SaveSpecies,
            CardAction::Delete => UiErrorContext::DeleteSpecies,
            _ => UiErrorContext::General,
        };
        let result = match action {
            CardAction::Open => {
                card.request_open();
                Ok(())
            }
            CardAction::Close => {
                card.request_close();
                Ok(())
            }
            CardAction::Edit => card.request_edit(),
            CardAction::CancelEdit => card.cancel_edit(),
            CardAction::Field(FormEdit::Text(field, text)) => card.set_field(field, text),
            CardAction::Field(FormEdit::Kingdom(kingdom)) => card.set_kingdom(kingdom),
            CardAction::Save => card
                .begin_save()
                .map(|ticket| self.queue(BackendCommand::SaveSpecies(ticket))),
            CardAction::Delete => card.request_delete(self.confirm.as_ref()).map(|ticket| {
                if let Some(ticket) = ticket {
                    self.queue(BackendCommand::DeleteSpecies(ticket));
                }
            }),
        };
        if let Err(err) = result {
            self.report_card_error(context, &err);
        }
    }

    fn apply_creator_action(&mut self, action: CreatorAction) {
        let result = match action {
            CreatorAction::Close => {
                self.creator.close();
                Ok(())
            }
            CreatorAction::Field(FormEdit::Text(field, text)) => self.creator.set_field(field, text),
            CreatorAction::Field(FormEdit::Kingdom(kingdom)) => self.creator.set_kingdom(kingdom),
            CreatorAction::Submit => self
                .creator
                .begin_submit()
                .map(|ticket| self.queue(BackendCommand::CreateSpecies(ticket))),
        };
        if let Err(err) = result {
            self.report_card_error(UiErrorContext::CreateSpecies, &err);
        }
    }

    fn report_card_error(&mut self, context: UiErrorContext, err: &CardError) {
        self.report(UiError::from_api(context, &ApiError::from(err)));
    }

    fn visible_cards(&self) -> Vec<usize> {
        self.cards
            .iter()
            .enumerate()
            .filter(|(_, card)| !self.only_mine || card.is_owner())
            .filter(|(_, card)| matches_filter(card.species(), &self.filter))
            .map(|(index, _)| index)
            .collect()
    }

    fn show_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("catalog_top_bar").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                ui.heading("Species Catalog");
                ui.separator();
                if ui.button("Add species").clicked() {
                    self.creator.open();
                }
                if ui.button("Reload").clicked() {
                    self.queue(BackendCommand::LoadSpecies);
                }
                ui.separator();
                ui.checkbox(&mut self.only_mine, "Only mine");
                ui.add(
                    egui::TextEdit::singleline(&mut self.filter)
                        .hint_text("Filter by name")
                        .desired_width(200.0),
                );
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.small(format!("Signed in as user {}", self.viewer));
                });
            });
            ui.add_space(4.0);
            self.show_status_banner(ui);
        });
    }

    fn show_status_banner(&mut self, ui: &mut egui::Ui) {
        let Some(banner) = self.status_banner.clone() else {
            return;
        };

        egui::Frame::NONE
            .fill(egui::Color32::from_rgb(111, 53, 53))
            .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(175, 96, 96)))
            .corner_radius(8.0)
            .inner_margin(egui::Margin::symmetric(10, 8))
            .show(ui, |ui| {
                ui.horizontal_wrapped(|ui| {
                    ui.label(egui::RichText::new(&banner.message).color(egui::Color32::WHITE));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("Retry").clicked() {
                            self.queue(BackendCommand::LoadSpecies);
                        }
                        if ui.button("Dismiss").clicked() {
                            self.status_banner = None;
                        }
                    });
                });
            });
        ui.add_space(4.0);
    }

    fn show_card_grid(&mut self, ctx: &egui::Context) {
        let mut actions = Vec::new();
        let visible = self.visible_cards();

        egui::CentralPanel::default().show(ctx, |ui| {
            if !self.loaded {
                ui.centered_and_justified(|ui| {
                    ui.spinner();
                });
                return;
            }
            if visible.is_empty() {
                ui.centered_and_justified(|ui| {
                    ui.weak("No species to show.");
                });
                return;
            }

            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.horizontal_wrapped(|ui| {
                    for &index in &visible {
                        let card = &self.cards[index];
                        if let Some(action) = show_tile(ui, &card.summary(), card.is_owner()) {
                            actions.push((index, action));
                        }
                    }
                });
            });
        });

        for (index, action) in actions {
            self.apply_card_action(index, action);
        }
    }

    fn show_dialogs(&mut self, ctx: &egui::Context) {
        for index in 0..self.cards.len() {
            for action in show_dialog(ctx, &self.cards[index]) {
                self.apply_card_action(index, action);
            }
        }
        self.cards.retain(|card| !card.is_removed());

        for action in show_creator(ctx, &self.creator) {
            self.apply_creator_action(action);
        }
    }
}

/// Reconciles the card list with a fresh store listing: existing cards keep
/// their dialog state, unknown ids get new cards and missing ids are dropped.
fn merge_species(
    cards: &mut Vec<SpeciesCard>,
    species: Vec<Species>,
    viewer: UserId,
    after_save: AfterSave,
) {
    let mut previous = std::mem::take(cards);
    for record in species {
        match previous.iter().position(|card| card.id() == record.id) {
            Some(pos) => {
                let mut card = previous.swap_remove(pos);
                card.sync(record);
                cards.push(card);
            }
            None => cards.push(SpeciesCard::new(record, viewer).with_after_save(after_save)),
        }
    }
    if !previous.is_empty() {
        tracing::debug!(dropped = previous.len(), "species no longer listed");
    }
}

fn matches_filter(species: &Species, filter: &str) -> bool {
    let needle = filter.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    species.scientific_name.to_lowercase().contains(&needle)
        || species
            .common_name
            .as_deref()
            .is_some_and(|name| name.to_lowercase().contains(&needle))
}

impl eframe::App for SpeciesCatalogApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();
        self.toasts.prune(Instant::now());

        self.show_top_bar(ctx);
        egui::TopBottomPanel::bottom("catalog_status_bar").show(ctx, |ui| {
            ui.small(self.status.as_str());
        });
        self.show_card_grid(ctx);
        self.show_dialogs(ctx);
        self.toasts.show(ctx);

        ctx.request_repaint_after(Duration::from_millis(100));
    }
}

#[cfg(test)]
#[path = "tests/app_tests.rs"]
mod tests;
