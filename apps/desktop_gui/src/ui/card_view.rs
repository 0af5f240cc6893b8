//! Card tile, detail dialog and the "add species" dialog. Rendering only: every
//! user interaction comes back as an action for the app to apply.

use client_core::{
    CardMode, CardSummary, MenuCommand, MenuIntent, SpeciesCard, SpeciesCreator,
};

use crate::ui::form::{show_form, FormEdit, FormSource};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardAction {
    Open,
    Close,
    Edit,
    CancelEdit,
    Save,
    Delete,
    Field(FormEdit),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreatorAction {
    Close,
    Submit,
    Field(FormEdit),
}

const TILE_WIDTH: f32 = 260.0;

pub fn show_tile(ui: &mut egui::Ui, summary: &CardSummary, is_own: bool) -> Option<CardAction> {
    let mut action = None;
    let visuals = ui.visuals().clone();

    egui::Frame::NONE
        .fill(visuals.faint_bg_color)
        .stroke(visuals.widgets.noninteractive.bg_stroke)
        .corner_radius(8.0)
        .inner_margin(egui::Margin::symmetric(12, 10))
        .show(ui, |ui| {
            ui.set_width(TILE_WIDTH);
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new(&summary.title).strong().size(16.0));
                if is_own {
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.small("yours");
                    });
                }
            });
            ui.label(egui::RichText::new(&summary.scientific_name).italics().weak());
            if let Some(image) = &summary.image {
                ui.hyperlink_to("Image", image.as_str());
            }
            if !summary.excerpt.is_empty() {
                ui.add_space(4.0);
                ui.add(egui::Label::new(summary.excerpt.as_str()).wrap());
            }
            ui.add_space(6.0);
            if ui.button("View details").clicked() {
                action = Some(CardAction::Open);
            }
        });

    action
}

/// Detail dialog for an open card. Returns every action the user took this frame.
pub fn show_dialog(ctx: &egui::Context, card: &SpeciesCard) -> Vec<CardAction> {
    let mut actions = Vec::new();
    if !card.view_state().is_open {
        return actions;
    }

    let summary = card.summary();
    let salt = format!("species_{}", card.id());
    let mut keep_open = true;

    egui::Window::new(summary.title.as_str())
        .id(egui::Id::new(("species_card", card.id().0)))
        .open(&mut keep_open)
        .collapsible(false)
        .resizable(true)
        .default_width(460.0)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new(&summary.scientific_name).italics());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if card.mode() == CardMode::Viewing {
                        show_action_menu(ui, card, &mut actions);
                    }
                    if card.is_busy() {
                        ui.spinner();
                    }
                });
            });
            ui.separator();

            let source = match (card.mode(), card.draft()) {
                (CardMode::Editing, Some(draft)) => FormSource::Draft(draft),
                _ => FormSource::ReadOnly(card.species()),
            };
            actions.extend(
                show_form(ui, &salt, source)
                    .into_iter()
                    .map(CardAction::Field),
            );

            if card.mode() == CardMode::Editing {
                ui.separator();
                ui.horizontal(|ui| {
                    if ui
                        .add_enabled(card.can_save(), egui::Button::new("Save"))
                        .clicked()
                    {
                        actions.push(CardAction::Save);
                    }
                    if ui.button("Cancel").clicked() {
                        actions.push(CardAction::CancelEdit);
                    }
                });
            }
        });

    if !keep_open {
        actions.push(CardAction::Close);
    }
    actions
}

fn show_action_menu(ui: &mut egui::Ui, card: &SpeciesCard, actions: &mut Vec<CardAction>) {
    let menu = card.action_menu();
    ui.add_enabled_ui(!card.is_busy(), |ui| {
        ui.menu_button("...", |ui| {
            for command in MenuCommand::ALL {
                let clicked = ui
                    .add_enabled(menu.is_enabled(command), egui::Button::new(command.label()))
                    .on_disabled_hover_text("Only the owner can change this species")
                    .clicked();
                if !clicked {
                    continue;
                }
                match menu.click(command) {
                    Some(MenuIntent::StartEdit) => actions.push(CardAction::Edit),
                    Some(MenuIntent::ConfirmDelete) => actions.push(CardAction::Delete),
                    None => {}
                }
                ui.close();
            }
        });
    });
}

pub fn show_creator(ctx: &egui::Context, creator: &SpeciesCreator) -> Vec<CreatorAction> {
    let mut actions = Vec::new();
    if !creator.is_open() {
        return actions;
    }

    let mut keep_open = true;
    egui::Window::new("Add species")
        .id(egui::Id::new("species_creator"))
        .open(&mut keep_open)
        .collapsible(false)
        .resizable(true)
        .default_width(460.0)
        .show(ctx, |ui| {
            actions.extend(
                show_form(ui, "creator", FormSource::Draft(creator.draft()))
                    .into_iter()
                    .map(CreatorAction::Field),
            );
            ui.separator();
            ui.horizontal(|ui| {
                if ui
                    .add_enabled(creator.can_submit(), egui::Button::new("Add"))
                    .clicked()
                {
                    actions.push(CreatorAction::Submit);
                }
                if ui.button("Cancel").clicked() {
                    actions.push(CreatorAction::Close);
                }
                if creator.is_busy() {
                    ui.spinner();
                }
            });
        });

    if !keep_open {
        actions.push(CreatorAction::Close);
    }
    actions
}
