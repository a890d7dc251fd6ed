//! Transient notifications
//!
//! Time is passed in explicitly so expiry can be driven by the frame clock
//! and tested without sleeping.

use egui::{Align2, Color32, RichText};
use std::time::{Duration, Instant};

use crate::theme;

/// How long a toast stays on screen
pub const TOAST_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Error,
}

impl ToastKind {
    fn color(&self) -> Color32 {
        match self {
            ToastKind::Info => theme::accent_color(),
            ToastKind::Success => theme::success_color(),
            ToastKind::Error => theme::error_color(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub kind: ToastKind,
    pub title: String,
    pub message: String,
    pub created: Instant,
}

#[derive(Debug, Default)]
pub struct Toasts {
    items: Vec<Toast>,
}

impl Toasts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        kind: ToastKind,
        title: impl Into<String>,
        message: impl Into<String>,
        now: Instant,
    ) {
        self.items.push(Toast {
            kind,
            title: title.into(),
            message: message.into(),
            created: now,
        });
    }

    pub fn error(&mut self, title: impl Into<String>, message: impl Into<String>) {
        self.push(ToastKind::Error, title, message, Instant::now());
    }

    pub fn success(&mut self, title: impl Into<String>, message: impl Into<String>) {
        self.push(ToastKind::Success, title, message, Instant::now());
    }

    pub fn info(&mut self, title: impl Into<String>, message: impl Into<String>) {
        self.push(ToastKind::Info, title, message, Instant::now());
    }

    /// Drop toasts older than [`TOAST_TTL`]
    pub fn expire(&mut self, now: Instant) {
        self.items
            .retain(|t| now.saturating_duration_since(t.created) < TOAST_TTL);
    }

    pub fn items(&self) -> &[Toast] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Expire old toasts and draw the rest in the bottom-right corner
    pub fn show(&mut self, ctx: &egui::Context) {
        self.expire(Instant::now());
        if self.items.is_empty() {
            return;
        }

        let mut dismissed = None;
        egui::Area::new("toasts")
            .anchor(Align2::RIGHT_BOTTOM, egui::vec2(-12.0, -12.0))
            .show(ctx, |ui| {
                for (i, toast) in self.items.iter().enumerate() {
                    egui::Frame::popup(ui.style())
                        .stroke(egui::Stroke::new(1.0, toast.kind.color()))
                        .show(ui, |ui| {
                            ui.set_max_width(320.0);
                            ui.horizontal(|ui| {
                                ui.label(
                                    RichText::new(toast.title.as_str())
                                        .strong()
                                        .color(toast.kind.color()),
                                );
                                if ui.small_button("×").clicked() {
                                    dismissed = Some(i);
                                }
                            });
                            if !toast.message.is_empty() {
                                ui.label(toast.message.as_str());
                            }
                        });
                }
            });

        if let Some(i) = dismissed {
            self.items.remove(i);
        }
        ctx.request_repaint_after(Duration::from_millis(500));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toasts_expire_after_ttl() {
        let start = Instant::now();
        let mut toasts = Toasts::new();
        toasts.push(ToastKind::Error, "Export failed", "busy", start);
        toasts.push(ToastKind::Info, "Saved", "", start + Duration::from_secs(3));

        toasts.expire(start + Duration::from_secs(4));
        assert_eq!(toasts.items().len(), 2);

        toasts.expire(start + TOAST_TTL);
        assert_eq!(toasts.items().len(), 1);
        assert_eq!(toasts.items()[0].title, "Saved");

        toasts.expire(start + Duration::from_secs(9));
        assert!(toasts.is_empty());
    }
}
