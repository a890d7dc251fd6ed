use egui::{Color32, Context, FontFamily, FontId, Rounding, Stroke, Style, TextStyle, Visuals};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Theme configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    pub dark_mode: bool,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            name: "Insight Dark".to_string(),
            dark_mode: true,
        }
    }
}

impl Theme {
    pub fn light() -> Self {
        Self {
            name: "Insight Light".to_string(),
            dark_mode: false,
        }
    }
}

/// Apply the dashboard theme
pub fn apply_theme(ctx: &Context, theme: &Theme) {
    let mut style = Style::default();
    let accent = accent_color();

    let mut visuals = if theme.dark_mode {
        let mut visuals = Visuals::dark();
        let panel_bg = Color32::from_rgb(17, 24, 39); // slate-900
        let widget_bg = Color32::from_rgb(30, 41, 59); // slate-800
        let text = Color32::from_rgb(226, 232, 240);

        visuals.window_fill = panel_bg;
        visuals.panel_fill = panel_bg;
        visuals.extreme_bg_color = Color32::from_rgb(2, 6, 23);
        visuals.faint_bg_color = widget_bg;

        visuals.widgets.noninteractive.bg_fill = widget_bg;
        visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, text);
        visuals.widgets.inactive.bg_fill = widget_bg;
        visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, text);
        visuals.widgets.hovered.bg_fill = Color32::from_rgb(51, 65, 85);
        visuals.widgets.active.bg_fill = Color32::from_rgb(71, 85, 105);
        visuals
    } else {
        let mut visuals = Visuals::light();
        visuals.panel_fill = Color32::from_rgb(248, 250, 252);
        visuals.faint_bg_color = Color32::from_rgb(241, 245, 249);
        visuals
    };

    for widgets in [
        &mut visuals.widgets.noninteractive,
        &mut visuals.widgets.inactive,
        &mut visuals.widgets.hovered,
        &mut visuals.widgets.active,
    ] {
        widgets.rounding = Rounding::same(6.0);
    }
    visuals.widgets.active.bg_stroke = Stroke::new(1.0, accent);
    visuals.selection.bg_fill = accent.linear_multiply(0.35);
    visuals.selection.stroke = Stroke::new(1.0, accent);
    visuals.hyperlink_color = accent;

    style.spacing.item_spacing = egui::vec2(8.0, 6.0);
    style.spacing.button_padding = egui::vec2(8.0, 4.0);

    let mut font_sizes = BTreeMap::new();
    font_sizes.insert(TextStyle::Small, FontId::new(11.0, FontFamily::Proportional));
    font_sizes.insert(TextStyle::Body, FontId::new(13.0, FontFamily::Proportional));
    font_sizes.insert(TextStyle::Button, FontId::new(13.0, FontFamily::Proportional));
    font_sizes.insert(TextStyle::Heading, FontId::new(17.0, FontFamily::Proportional));
    font_sizes.insert(TextStyle::Monospace, FontId::new(12.0, FontFamily::Monospace));
    style.text_styles = font_sizes;

    ctx.set_style(style);
    ctx.set_visuals(visuals);
    debug!("Applied theme '{}'", theme.name);
}

/// Indigo accent shared by every widget
pub fn accent_color() -> Color32 {
    Color32::from_rgb(99, 102, 241)
}

pub fn error_color() -> Color32 {
    Color32::from_rgb(239, 68, 68)
}

pub fn warning_color() -> Color32 {
    Color32::from_rgb(245, 158, 11)
}

pub fn success_color() -> Color32 {
    Color32::from_rgb(16, 185, 129)
}
