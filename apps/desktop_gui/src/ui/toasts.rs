//! In-window implementations of the card collaborators: toast queue, refresh
//! flag and the native confirmation box.

use std::{
    cell::{Cell, RefCell},
    time::{Duration, Instant},
};

use client_core::{ConfirmPrompt, NotificationSink, RefreshHandle};
use shared::protocol::{Notification, Severity};

struct Toast {
    notification: Notification,
    expires_at: Instant,
}

pub struct ToastQueue {
    ttl: Duration,
    toasts: RefCell<Vec<Toast>>,
}

impl ToastQueue {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            toasts: RefCell::new(Vec::new()),
        }
    }

    pub fn prune(&self, now: Instant) {
        self.toasts.borrow_mut().retain(|toast| toast.expires_at > now);
    }

    pub fn dismiss(&self, index: usize) {
        let mut toasts = self.toasts.borrow_mut();
        if index < toasts.len() {
            toasts.remove(index);
        }
    }

    pub fn len(&self) -> usize {
        self.toasts.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.borrow().is_empty()
    }

    pub fn snapshot(&self) -> Vec<Notification> {
        self.toasts
            .borrow()
            .iter()
            .map(|toast| toast.notification.clone())
            .collect()
    }

    pub fn show(&self, ctx: &egui::Context) {
        if self.is_empty() {
            return;
        }

        let mut dismissed = None;
        egui::Area::new(egui::Id::new("species_toasts"))
            .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-12.0, -12.0))
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                for (index, notification) in self.snapshot().iter().enumerate() {
                    let (fill, stroke) = severity_colors(notification.severity);
                    egui::Frame::NONE
                        .fill(fill)
                        .stroke(egui::Stroke::new(1.0, stroke))
                        .corner_radius(8.0)
                        .inner_margin(egui::Margin::symmetric(10, 8))
                        .show(ui, |ui| {
                            ui.set_max_width(320.0);
                            ui.horizontal(|ui| {
                                ui.label(
                                    egui::RichText::new(&notification.title)
                                        .strong()
                                        .color(egui::Color32::WHITE),
                                );
                                if ui.small_button("x").clicked() {
                                    dismissed = Some(index);
                                }
                            });
                            if !notification.description.is_empty() {
                                ui.label(
                                    egui::RichText::new(&notification.description)
                                        .color(egui::Color32::from_gray(230)),
                                );
                            }
                        });
                    ui.add_space(6.0);
                }
            });

        if let Some(index) = dismissed {
            self.dismiss(index);
        }
    }
}

impl NotificationSink for ToastQueue {
    fn notify(&self, notification: Notification) {
        tracing::debug!(title = %notification.title, "toast queued");
        self.toasts.borrow_mut().push(Toast {
            notification,
            expires_at: Instant::now() + self.ttl,
        });
    }
}

fn severity_colors(severity: Severity) -> (egui::Color32, egui::Color32) {
    match severity {
        Severity::Error => (
            egui::Color32::from_rgb(111, 53, 53),
            egui::Color32::from_rgb(175, 96, 96),
        ),
        Severity::Success => (
            egui::Color32::from_rgb(45, 95, 60),
            egui::Color32::from_rgb(90, 160, 110),
        ),
        Severity::Info => (
            egui::Color32::from_rgb(50, 62, 90),
            egui::Color32::from_rgb(100, 120, 170),
        ),
    }
}

/// Set by a card after a successful mutation; the app turns it into one
/// `LoadSpecies` command per frame.
#[derive(Default)]
pub struct RefreshFlag(Cell<bool>);

impl RefreshFlag {
    pub fn take(&self) -> bool {
        self.0.replace(false)
    }
}

impl RefreshHandle for RefreshFlag {
    fn refresh(&self) {
        self.0.set(true);
    }
}

pub struct NativeConfirm;

impl ConfirmPrompt for NativeConfirm {
    fn confirm(&self, title: &str, message: &str) -> bool {
        let answer = rfd::MessageDialog::new()
            .set_level(rfd::MessageLevel::Warning)
            .set_title(title)
            .set_description(message)
            .set_buttons(rfd::MessageButtons::YesNo)
            .show();
        matches!(answer, rfd::MessageDialogResult::Yes)
    }
}
