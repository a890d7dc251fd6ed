//! egui rendering of chart frames

use dash_core::{ChartType, Rgb};
use egui::{Color32, RichText, Stroke, Ui};
use egui_plot::{Bar, BarChart, Line, Plot, PlotPoints, PlotUi, Points, Polygon, Text};
use std::f64::consts::{FRAC_PI_2, TAU};

use crate::chart::{ChartFrame, ChartView, FrameBody, PieSlice, SeriesData};
use crate::export::{segments, ExportFormat};

const PLOT_HEIGHT: f32 = 260.0;

/// What the user asked for while the chart was drawn
#[derive(Debug, Clone, PartialEq)]
pub enum ChartAction {
    ToggleSeries(String),
    ZoomIn,
    ZoomOut,
    SetPan(f64),
    ResetView,
    Export(ExportFormat),
    ToggleCompare,
}

impl ChartAction {
    /// Apply view-state actions to `view`. Returns false for actions the
    /// owner has to handle (export, comparison).
    pub fn apply_to(&self, view: &ChartView) -> bool {
        match self {
            ChartAction::ToggleSeries(key) => view.toggle_series(key),
            ChartAction::ZoomIn => view.zoom_in(),
            ChartAction::ZoomOut => view.zoom_out(),
            ChartAction::SetPan(pan) => view.set_pan(*pan),
            ChartAction::ResetView => view.reset_view(),
            ChartAction::Export(_) | ChartAction::ToggleCompare => return false,
        }
        true
    }
}

/// How the chart sits in the comparison workflow
#[derive(Debug, Clone, Copy, Default)]
pub struct CompareChrome {
    pub selecting: bool,
    pub selected: bool,
}

pub fn color32(c: Rgb) -> Color32 {
    Color32::from_rgb(c.0, c.1, c.2)
}

/// Draw one chart card: title, controls, plot and legend
pub fn chart_card(
    ui: &mut Ui,
    id: usize,
    view: &ChartView,
    frame: &ChartFrame,
    compare: CompareChrome,
) -> Vec<ChartAction> {
    let mut actions = Vec::new();
    let capturing = view.is_capturing();

    ui.horizontal(|ui| {
        ui.heading(frame.title.as_str());
        if view.is_shared() {
            ui.label(RichText::new("synced").small().weak());
        }
        if capturing {
            return;
        }
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if compare.selecting {
                let mut selected = compare.selected;
                if ui.checkbox(&mut selected, "Compare").changed() {
                    actions.push(ChartAction::ToggleCompare);
                }
            }
            ui.menu_button("Export", |ui| {
                for format in [ExportFormat::Png, ExportFormat::Svg] {
                    if ui.button(format.filter_name()).clicked() {
                        actions.push(ChartAction::Export(format));
                        ui.close_menu();
                    }
                }
            });
        });
    });

    if !capturing && frame.chart_type.is_windowed() {
        view_controls(ui, view, frame, &mut actions);
    }

    plot(ui, id, frame);

    if !frame.legend.is_empty() {
        ui.horizontal_wrapped(|ui| {
            for entry in &frame.legend {
                let (rect, _) =
                    ui.allocate_exact_size(egui::vec2(10.0, 10.0), egui::Sense::hover());
                ui.painter().rect_filled(rect, 2.0, color32(entry.swatch()));
                let text = if entry.hidden {
                    RichText::new(entry.key.as_str()).weak().strikethrough()
                } else {
                    RichText::new(entry.key.as_str())
                };
                let response = ui.selectable_label(!entry.hidden, text);
                if response.clicked() && !capturing {
                    actions.push(ChartAction::ToggleSeries(entry.key.clone()));
                }
            }
        });
    }
    actions
}

fn view_controls(
    ui: &mut Ui,
    view: &ChartView,
    frame: &ChartFrame,
    actions: &mut Vec<ChartAction>,
) {
    let state = view.view_state();
    ui.horizontal(|ui| {
        if ui
            .add_enabled(state.zoom > dash_core::view_state::MIN_ZOOM, egui::Button::new("−"))
            .on_hover_text("Zoom out")
            .clicked()
        {
            actions.push(ChartAction::ZoomOut);
        }
        ui.label(format!("{:.1}×", state.zoom));
        if ui
            .add_enabled(state.zoom < dash_core::view_state::MAX_ZOOM, egui::Button::new("+"))
            .on_hover_text("Zoom in")
            .clicked()
        {
            actions.push(ChartAction::ZoomIn);
        }

        if state.is_zoomed() {
            let mut pan = state.pan;
            if ui
                .add(egui::Slider::new(&mut pan, 0.0..=1.0).show_value(false).text("Pan"))
                .changed()
            {
                actions.push(ChartAction::SetPan(pan));
            }
        }
        if ui.small_button("Reset").clicked() {
            actions.push(ChartAction::ResetView);
        }
        if frame.window.total > 0 {
            ui.label(RichText::new(frame.window.to_string()).small().weak());
        }
    });
}

fn plot(ui: &mut Ui, id: usize, frame: &ChartFrame) {
    match &frame.body {
        FrameBody::Empty(reason) => {
            ui.allocate_ui(egui::vec2(ui.available_width(), PLOT_HEIGHT), |ui| {
                ui.centered_and_justified(|ui| {
                    ui.label(RichText::new(reason.message()).weak());
                });
            });
        }
        FrameBody::Sequential { labels, series } => {
            let labels = labels.clone();
            Plot::new(("chart", id))
                .height(PLOT_HEIGHT)
                .allow_zoom(false)
                .allow_drag(false)
                .allow_scroll(false)
                .x_axis_formatter(move |val, _range, _specs| {
                    let idx = val.round();
                    if (val - idx).abs() > 1e-6 || idx < 0.0 {
                        return String::new();
                    }
                    labels.get(idx as usize).cloned().unwrap_or_default()
                })
                .show(ui, |plot_ui| sequential(plot_ui, frame.chart_type, series));
        }
        FrameBody::Radar { axes, series } => {
            Plot::new(("chart", id))
                .height(PLOT_HEIGHT)
                .data_aspect(1.0)
                .show_axes(false)
                .show_grid(false)
                .allow_zoom(false)
                .allow_drag(false)
                .allow_scroll(false)
                .show(ui, |plot_ui| radar(plot_ui, axes, series));
        }
        FrameBody::Pie { slices } => {
            Plot::new(("chart", id))
                .height(PLOT_HEIGHT)
                .data_aspect(1.0)
                .show_axes(false)
                .show_grid(false)
                .allow_zoom(false)
                .allow_drag(false)
                .allow_scroll(false)
                .show(ui, |plot_ui| pie(plot_ui, slices));
        }
        FrameBody::Scatter { groups } => {
            Plot::new(("chart", id))
                .height(PLOT_HEIGHT)
                .x_axis_label(frame.x_axis.as_str())
                .y_axis_label(frame.y_axis.as_str())
                .show(ui, |plot_ui| {
                    for group in groups.iter().filter(|g| !g.hidden) {
                        let points: Vec<[f64; 2]> =
                            group.points.iter().map(|p| [p.0, p.1]).collect();
                        plot_ui.points(
                            Points::new(PlotPoints::new(points))
                                .color(color32(group.color))
                                .radius(3.0)
                                .name(&group.key),
                        );
                    }
                });
        }
    }
}

fn sequential(plot_ui: &mut PlotUi, chart_type: ChartType, series: &[SeriesData]) {
    let visible: Vec<&SeriesData> = series.iter().filter(|s| !s.hidden).collect();
    match chart_type {
        ChartType::Bar => {
            let slot = 0.8 / visible.len().max(1) as f64;
            for (k, s) in visible.iter().enumerate() {
                let bars = s
                    .values
                    .iter()
                    .enumerate()
                    .filter_map(|(i, v)| {
                        let x = i as f64 - 0.4 + slot * (k as f64 + 0.5);
                        Some(Bar::new(x, (*v)?).width(slot * 0.9))
                    })
                    .collect();
                plot_ui.bar_chart(BarChart::new(bars).color(color32(s.color)).name(&s.key));
            }
        }
        _ => {
            for s in visible {
                let color = color32(s.color);
                for run in segments(&s.values) {
                    let points: Vec<[f64; 2]> = run.into_iter().map(|(x, y)| [x, y]).collect();
                    let line = Line::new(PlotPoints::new(points))
                        .color(color)
                        .width(2.0)
                        .name(&s.key);
                    let line = if chart_type == ChartType::Area { line.fill(0.0) } else { line };
                    plot_ui.line(line);
                }
            }
        }
    }
}

fn radar(plot_ui: &mut PlotUi, axes: &[String], series: &[SeriesData]) {
    let n = axes.len();
    if n == 0 {
        return;
    }
    let angle = |i: usize| FRAC_PI_2 - TAU * i as f64 / n as f64;
    let at = |i: usize, r: f64| [r * angle(i).cos(), r * angle(i).sin()];
    let grid = Color32::from_gray(150);

    for ring in [0.25, 0.5, 0.75, 1.0] {
        let mut outline: Vec<[f64; 2]> = (0..n).map(|i| at(i, ring)).collect();
        outline.push(at(0, ring));
        plot_ui.line(Line::new(PlotPoints::new(outline)).color(grid).width(0.5));
    }
    for (i, label) in axes.iter().enumerate() {
        let spoke = PlotPoints::new(vec![[0.0, 0.0], at(i, 1.0)]);
        plot_ui.line(Line::new(spoke).color(grid).width(0.5));
        plot_ui.text(Text::new(at(i, 1.12).into(), label.as_str()).color(grid));
    }

    let max = series
        .iter()
        .filter(|s| !s.hidden)
        .flat_map(|s| s.values.iter().flatten().copied())
        .fold(0.0f64, f64::max);
    if max <= 0.0 {
        return;
    }
    for s in series.iter().filter(|s| !s.hidden) {
        let color = color32(s.color);
        let points: Vec<[f64; 2]> = s
            .values
            .iter()
            .enumerate()
            .map(|(i, v)| at(i, v.unwrap_or(0.0).max(0.0) / max))
            .collect();
        plot_ui.polygon(
            Polygon::new(PlotPoints::new(points))
                .fill_color(color.linear_multiply(0.25))
                .stroke(Stroke::new(2.0, color))
                .name(&s.key),
        );
    }
}

fn pie(plot_ui: &mut PlotUi, slices: &[PieSlice]) {
    let visible: Vec<&PieSlice> = slices.iter().filter(|s| !s.hidden).collect();
    let total: f64 = visible.iter().map(|s| s.value).sum();
    if total <= 0.0 {
        return;
    }
    let mut start = FRAC_PI_2;
    for slice in visible {
        let sweep = slice.value / total * TAU;
        let steps = ((sweep / TAU) * 96.0).ceil().max(2.0) as usize;
        let mut points = vec![[0.0, 0.0]];
        points.extend((0..=steps).map(|i| {
            let a = start - sweep * i as f64 / steps as f64;
            [a.cos(), a.sin()]
        }));
        let color = color32(slice.color);
        plot_ui.polygon(
            Polygon::new(PlotPoints::new(points))
                .fill_color(color)
                .stroke(Stroke::new(1.0, Color32::WHITE))
                .name(&slice.label),
        );

        let mid = start - sweep / 2.0;
        let label = format!("{:.0}%", slice.value / total * 100.0);
        let anchor = [mid.cos() * 0.7, mid.sin() * 0.7];
        plot_ui.text(Text::new(anchor.into(), label).color(Color32::WHITE));
        start -= sweep;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dash_core::{row, ChartConfig};

    #[test]
    fn test_view_actions_apply_and_owner_actions_do_not() {
        let rows = vec![row! { "x" => "a", "y" => 1 }, row! { "x" => "b", "y" => 2 }];
        let view = ChartView::new(ChartConfig::new(ChartType::Line, "T", "x", "y"), &rows);

        assert!(ChartAction::ZoomIn.apply_to(&view));
        assert!(ChartAction::SetPan(0.0).apply_to(&view));
        assert!(ChartAction::ToggleSeries("y".into()).apply_to(&view));
        let state = view.view_state();
        assert_eq!((state.zoom, state.pan), (1.5, 0.0));
        assert!(state.hidden.is_hidden("y"));

        assert!(!ChartAction::Export(ExportFormat::Png).apply_to(&view));
        assert!(!ChartAction::ToggleCompare.apply_to(&view));
        assert!(ChartAction::ResetView.apply_to(&view));
        assert_eq!(view.view_state(), dash_core::ViewState::default());
    }
}
