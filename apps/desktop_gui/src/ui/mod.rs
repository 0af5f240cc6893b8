//! UI layer: app shell, card tiles and dialogs, the species form and toasts.

pub mod app;
pub mod card_view;
pub mod form;
pub mod toasts;

pub use app::SpeciesCatalogApp;
