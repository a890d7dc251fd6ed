//! Summary, statistics, insights and performance pulse of a report

use dash_core::Report;
use egui::{RichText, Ui};

use crate::theme;

pub fn report_summary(ui: &mut Ui, report: &Report) {
    let analysis = &report.analysis;
    ui.horizontal(|ui| {
        ui.heading(report.name.as_str());
        ui.label(RichText::new(report.date.as_str()).weak());
    });
    ui.label(analysis.summary.as_str());

    if !analysis.statistics.is_empty() {
        ui.add_space(6.0);
        ui.horizontal_wrapped(|ui| {
            for stat in &analysis.statistics {
                egui::Frame::group(ui.style()).show(ui, |ui| {
                    ui.vertical(|ui| {
                        ui.label(RichText::new(stat.label.as_str()).small().weak());
                        ui.label(
                            RichText::new(stat.value.to_string())
                                .heading()
                                .color(theme::accent_color()),
                        );
                    });
                });
            }
        });
    }

    if !analysis.insights.is_empty() {
        ui.add_space(6.0);
        ui.label(RichText::new("Insights").strong());
        for insight in &analysis.insights {
            ui.label(format!("• {}", insight));
        }
    }

    let pulse = &analysis.performance_pulse;
    if !pulse.strengths.is_empty() || !pulse.risks.is_empty() {
        ui.add_space(6.0);
        ui.columns(2, |cols| {
            cols[0].label(RichText::new("Strengths").strong().color(theme::success_color()));
            for item in &pulse.strengths {
                cols[0].label(format!("▲ {}", item));
            }
            cols[1].label(RichText::new("Risks").strong().color(theme::error_color()));
            for item in &pulse.risks {
                cols[1].label(format!("▼ {}", item));
            }
        });
    }
}
