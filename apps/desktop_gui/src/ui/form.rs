//! Species form, rendered by walking the shared field table.

use client_core::{fields::input_for, FieldInput, FieldName, FormDraft, SPECIES_FIELDS};
use shared::domain::{Kingdom, Species};

pub enum FormSource<'a> {
    ReadOnly(&'a Species),
    Draft(&'a FormDraft),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEdit {
    Text(FieldName, String),
    Kingdom(Kingdom),
}

const ERROR_COLOR: egui::Color32 = egui::Color32::from_rgb(220, 90, 90);

pub fn show_form(ui: &mut egui::Ui, id_salt: &str, source: FormSource<'_>) -> Vec<FormEdit> {
    let mut edits = Vec::new();

    egui::Grid::new(("species_form", id_salt))
        .num_columns(2)
        .spacing([12.0, 8.0])
        .striped(false)
        .show(ui, |ui| {
            for spec in &SPECIES_FIELDS {
                let label = if spec.required && matches!(source, FormSource::Draft(_)) {
                    format!("{} *", spec.label)
                } else {
                    spec.label.to_string()
                };
                ui.label(egui::RichText::new(label).strong());

                match &source {
                    FormSource::ReadOnly(species) => show_value(ui, species, spec.name),
                    FormSource::Draft(draft) => {
                        ui.vertical(|ui| {
                            edits.extend(edit_field(ui, id_salt, draft, spec.name, spec.input));
                            if let Some(err) = draft.error(spec.name) {
                                ui.label(
                                    egui::RichText::new(err.to_string())
                                        .small()
                                        .color(ERROR_COLOR),
                                );
                            }
                        });
                    }
                }
                ui.end_row();
            }
        });

    edits
}

fn show_value(ui: &mut egui::Ui, species: &Species, field: FieldName) {
    let value = read_only_value(species, field);
    match field {
        FieldName::Image if !value.is_empty() => {
            ui.hyperlink_to(value.as_str(), value.as_str());
        }
        FieldName::Description => {
            ui.add(egui::Label::new(value.as_str()).wrap());
        }
        _ if value.is_empty() => {
            ui.weak("Not provided");
        }
        _ => {
            ui.label(value);
        }
    }
}

/// Text shown for `field` in the read-only dialog.
pub fn read_only_value(species: &Species, field: FieldName) -> String {
    match field {
        FieldName::TotalPopulation if species.total_population.is_none() => "N/A".to_string(),
        _ => input_for(species, field),
    }
}

fn edit_field(
    ui: &mut egui::Ui,
    id_salt: &str,
    draft: &FormDraft,
    field: FieldName,
    input: FieldInput,
) -> Option<FormEdit> {
    let widget_id = (id_salt, field.label());
    match input {
        FieldInput::Choice(choices) => {
            let current = draft.input(field).parse::<Kingdom>().ok();
            let mut picked = None;
            egui::ComboBox::from_id_salt(widget_id)
                .selected_text(current.map(|kingdom| kingdom.as_str()).unwrap_or("Select..."))
                .show_ui(ui, |ui| {
                    for choice in choices {
                        if ui
                            .selectable_label(current == Some(*choice), choice.as_str())
                            .clicked()
                        {
                            picked = Some(*choice);
                        }
                    }
                });
            picked
                .filter(|choice| current != Some(*choice))
                .map(FormEdit::Kingdom)
        }
        FieldInput::SingleLine | FieldInput::Count | FieldInput::MultiLine => {
            let mut text = draft.input(field).to_string();
            let edit = match input {
                FieldInput::MultiLine => egui::TextEdit::multiline(&mut text).desired_rows(4),
                FieldInput::Count => egui::TextEdit::singleline(&mut text).hint_text("e.g. 25000"),
                _ => egui::TextEdit::singleline(&mut text),
            };
            let response = ui.add(edit.id_salt(widget_id).desired_width(320.0));
            response.changed().then(|| FormEdit::Text(field, text))
        }
    }
}
