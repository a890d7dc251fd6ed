//! Main application state

use dash_core::events::events::{ComparisonStarted, DatasetCleaned, ExportFailed};
use dash_core::{column_union, DashboardSettings, EventBus, Report};
use dash_data::cleaning::CleaningOptions;
use dash_data::store::{add_report, delete_report, ReportStore, StoreStatus};
use dash_data::LocalAnalysisService;
use dash_ui::{
    cleaning_panel, comparison_tray, filter_bar, icon_button, report_summary, ComparisonAction,
    FilterBarAction, FilterDraft, Theme, ToastKind, Toasts,
};
use dash_views::{
    chart_card, data_table, ChartAction, CompareChrome, Dashboard, ExportArtifact, ExportError,
    TableAction,
};
use eframe::egui::{self, Context, RichText, ScrollArea, Ui};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, error, info, warn};

use crate::dispatch::{AnalysisDispatcher, AnalysisDone};

/// Notification raised from an event handler, shown on the next frame
type Notice = (ToastKind, String, String);

pub struct DashboardApp {
    settings: DashboardSettings,
    store: ReportStore,
    /// Saved reports, newest first
    reports: Vec<Report>,
    dashboard: Option<Dashboard>,
    events: Arc<EventBus>,
    notices: Arc<Mutex<Vec<Notice>>>,
    dispatcher: AnalysisDispatcher,
    results: UnboundedReceiver<AnalysisDone>,
    /// Analyses still running
    pending: usize,
    toasts: Toasts,
    filter_draft: FilterDraft,
    cleaning: CleaningOptions,
    show_cleaning: bool,
    theme: Theme,
    /// Keeps the worker threads alive for the app's lifetime
    _runtime: Runtime,
}

impl DashboardApp {
    pub fn new(cc: &eframe::CreationContext<'_>, runtime: Runtime) -> Self {
        let theme = Theme::default();
        dash_ui::apply_theme(&cc.egui_ctx, &theme);

        let settings = DashboardSettings::load();
        let store_dir = settings
            .store_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(".insight-dashboard"));
        let store = ReportStore::new(store_dir)
            .with_quota(settings.storage_quota_bytes)
            .with_preview_rows(settings.preview_rows);
        let reports = store.load();
        info!("{} saved reports in {}", reports.len(), store.path().display());

        let events = Arc::new(EventBus::new());
        let notices = Arc::new(Mutex::new(Vec::new()));
        subscribe_notices(&events, &notices);

        let (dispatcher, results) = AnalysisDispatcher::new(
            runtime.handle().clone(),
            Arc::new(LocalAnalysisService::new()),
            cc.egui_ctx.clone(),
        );

        let mut app = Self {
            settings,
            store,
            reports,
            dashboard: None,
            events,
            notices,
            dispatcher,
            results,
            pending: 0,
            toasts: Toasts::new(),
            filter_draft: FilterDraft::default(),
            cleaning: CleaningOptions::default(),
            show_cleaning: false,
            theme,
            _runtime: runtime,
        };
        if let Some(latest) = app.reports.first().cloned() {
            app.open_report(latest);
        }
        app
    }

    fn open_report(&mut self, report: Report) {
        self.filter_draft = FilterDraft::default();
        self.dashboard = Some(Dashboard::with_events(
            report,
            self.settings.clone(),
            self.events.clone(),
        ));
    }

    fn open_dataset(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Datasets", &["csv", "json"])
            .add_filter("CSV rows", &["csv"])
            .add_filter("JSON rows", &["json"])
            .pick_file()
        else {
            return;
        };
        match dash_data::load_dataset(&path) {
            Ok(rows) => {
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "dataset".to_string());
                let loaded = rows.len();
                let rows = dash_data::sample_rows(rows, self.settings.sampling_rate);
                if rows.len() < loaded {
                    info!("Kept {} of {} rows from {}", rows.len(), loaded, file_name);
                }
                self.dispatcher.analyze(rows, &file_name);
                self.pending += 1;
            }
            Err(e) => {
                error!("Failed to load {}: {}", path.display(), e);
                self.toasts.error("Could not open dataset", e.to_string());
            }
        }
    }

    /// Pick up finished analyses
    fn drain_results(&mut self) {
        while let Ok(done) = self.results.try_recv() {
            self.pending = self.pending.saturating_sub(1);
            match done.result {
                Ok(analysis) => {
                    let report = Report::new(&done.file_name, analysis, done.rows);
                    info!("Analysis of {} finished", done.file_name);
                    self.reports = add_report(&self.reports, report.clone());
                    self.persist();
                    self.open_report(report);
                }
                Err(e) => {
                    warn!("Analysis of {} failed: {}", done.file_name, e);
                    self.toasts.error("Analysis failed", e.to_string());
                }
            }
        }
    }

    fn persist(&mut self) {
        match self.store.save(&self.reports) {
            Ok(StoreStatus::Saved { .. }) => {}
            Ok(StoreStatus::Trimmed { dropped, .. }) => {
                self.toasts.info(
                    "Storage full",
                    format!("Removed {} oldest reports to make room", dropped),
                );
            }
            Ok(StoreStatus::CouldNotSave) => {
                self.toasts.error("Could not save", "The report is too large for local storage");
            }
            Err(e) => {
                error!("Failed to save reports: {}", e);
                self.toasts.error("Could not save", e.to_string());
            }
        }
    }

    fn delete(&mut self, id: &str) {
        self.reports = delete_report(&self.reports, id);
        if self.dashboard.as_ref().is_some_and(|d| d.report().id == id) {
            self.dashboard = None;
        }
        self.persist();
    }

    /// Ask where to put `artifact` and write it
    fn save_artifact(&mut self, result: Result<ExportArtifact, ExportError>) {
        // failures already reached the toasts through ExportFailed
        let Ok(artifact) = result else { return };
        let extension = artifact.file_name.rsplit('.').next().unwrap_or_default().to_string();
        let Some(path) = rfd::FileDialog::new()
            .set_file_name(&artifact.file_name)
            .add_filter(artifact.mime, &[extension.as_str()])
            .save_file()
        else {
            return;
        };
        match std::fs::write(&path, &artifact.bytes) {
            Ok(()) => {
                debug!("Wrote {} bytes to {}", artifact.bytes.len(), path.display());
                self.toasts.success("Exported", path.display().to_string());
            }
            Err(e) => {
                error!("Failed to write {}: {}", path.display(), e);
                self.toasts.error("Export failed", e.to_string());
            }
        }
    }

    fn show_menu(&mut self, ui: &mut Ui) {
        egui::menu::bar(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Open dataset…").clicked() {
                    ui.close_menu();
                    self.open_dataset();
                }
            });

            let has_dashboard = self.dashboard.is_some();
            ui.add_enabled_ui(has_dashboard, |ui| {
                ui.menu_button("Export", |ui| {
                    let Some(dashboard) = &self.dashboard else { return };
                    let picked = if ui.button("Filtered rows (CSV)").clicked() {
                        Some(dashboard.export_csv())
                    } else if ui.button("Report (Markdown)").clicked() {
                        Some(Ok(dashboard.export_markdown()))
                    } else if ui.button("Report (PDF)").clicked() {
                        Some(Ok(dashboard.export_pdf()))
                    } else if ui.button("Dashboard snapshot (PNG)").clicked() {
                        Some(dashboard.export_snapshot_png())
                    } else if ui.button("Dashboard snapshot (PDF)").clicked() {
                        Some(dashboard.export_snapshot_pdf())
                    } else {
                        None
                    };
                    if let Some(result) = picked {
                        ui.close_menu();
                        self.save_artifact(result);
                    }
                });
                ui.toggle_value(&mut self.show_cleaning, "Clean data");
            });

            let label = if self.theme.dark_mode { "🌙" } else { "☀" };
            if icon_button(ui, label, "Toggle theme").clicked() {
                self.theme = if self.theme.dark_mode { Theme::light() } else { Theme::default() };
                dash_ui::apply_theme(ui.ctx(), &self.theme);
            }

            if self.pending > 0 {
                ui.spinner();
                ui.label(RichText::new("Analysing…").weak());
            }

            if let Some(dashboard) = &mut self.dashboard {
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if let Some(action) = comparison_tray(ui, dashboard.comparison()) {
                        let result = match action {
                            ComparisonAction::Begin => dashboard.begin_comparison(),
                            ComparisonAction::Cancel => dashboard.cancel_comparison(),
                            ComparisonAction::Synthesize => dashboard.synthesize_comparison(),
                            ComparisonAction::Reset => dashboard.reset_comparison(),
                            ComparisonAction::Close => dashboard.close_comparison(),
                        };
                        if let Err(e) = result {
                            self.toasts.error("Comparison", e.to_string());
                        }
                    }
                });
            }
        });
    }

    fn show_report_list(&mut self, ui: &mut Ui) {
        ui.heading("Reports");
        if self.reports.is_empty() {
            ui.label(RichText::new("Open a JSON dataset to start").weak());
            return;
        }

        let open_id = self.dashboard.as_ref().map(|d| d.report().id.clone());
        let mut selected = None;
        let mut deleted = None;
        ScrollArea::vertical().id_source("report_list").show(ui, |ui| {
            for report in &self.reports {
                ui.horizontal(|ui| {
                    let is_open = open_id.as_deref() == Some(report.id.as_str());
                    if ui.selectable_label(is_open, report.name.as_str()).clicked() && !is_open {
                        selected = Some(report.clone());
                    }
                    if icon_button(ui, "🗑", "Delete report").clicked() {
                        deleted = Some(report.id.clone());
                    }
                });
                ui.label(RichText::new(report.date.as_str()).small().weak());
            }
        });

        if let Some(report) = selected {
            self.open_report(report);
        }
        if let Some(id) = deleted {
            self.delete(&id);
        }
    }

    fn show_dashboard(&mut self, ui: &mut Ui) {
        let Some(dashboard) = &mut self.dashboard else {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No report open").weak());
            });
            return;
        };

        let mut exports = Vec::new();
        ScrollArea::vertical().id_source("dashboard").show(ui, |ui| {
            report_summary(ui, dashboard.report());
            ui.separator();

            let columns = column_union(dashboard.rows());
            for action in filter_bar(ui, &columns, &mut self.filter_draft, dashboard.filters()) {
                match action {
                    FilterBarAction::Add(rule) => {
                        dashboard.add_filter(rule);
                    }
                    FilterBarAction::Remove(id) => {
                        dashboard.remove_filter(&id);
                    }
                    FilterBarAction::Clear => dashboard.clear_filters(),
                }
            }
            ui.label(
                RichText::new(format!(
                    "{} of {} rows",
                    dashboard.filtered_rows().len(),
                    dashboard.rows().len()
                ))
                .weak(),
            );
            ui.separator();

            let mut chart_actions = Vec::new();
            let selecting = dashboard.comparison().is_selecting();
            for (i, frame) in dashboard.frames().iter().enumerate() {
                let Some(view) = dashboard.chart(i) else { continue };
                let chrome = CompareChrome {
                    selecting,
                    selected: dashboard.comparison().is_selected(i),
                };
                egui::Frame::group(ui.style()).show(ui, |ui| {
                    for action in chart_card(ui, i, view, frame, chrome) {
                        chart_actions.push((i, action));
                    }
                });
                ui.add_space(8.0);
            }
            for (i, action) in chart_actions {
                let handled = dashboard.chart(i).is_some_and(|view| action.apply_to(view));
                if handled {
                    continue;
                }
                match action {
                    ChartAction::Export(format) => exports.push(dashboard.export_chart(i, format)),
                    ChartAction::ToggleCompare => {
                        if let Err(e) = dashboard.toggle_compared(i) {
                            self.toasts.error("Comparison", e.to_string());
                        }
                    }
                    _ => {}
                }
            }

            ui.separator();
            ui.heading("Data");
            let page = dashboard.table_page();
            for action in data_table(ui, &page, dashboard.table_query()) {
                match action {
                    TableAction::Search(text) => dashboard.set_search(text),
                    TableAction::Sort(column) => dashboard.sort_by(&column),
                    TableAction::Page(p) => dashboard.set_page(p),
                }
            }
        });

        for result in exports {
            self.save_artifact(result);
        }
    }

    fn show_cleaning_panel(&mut self, ctx: &Context) {
        if !self.show_cleaning {
            return;
        }
        let Some(dashboard) = &self.dashboard else { return };
        let diagnostics = dashboard.diagnostics();
        let mut requested = None;
        egui::SidePanel::right("cleaning_panel")
            .default_width(280.0)
            .show(ctx, |ui| {
                requested = cleaning_panel(ui, &diagnostics, &mut self.cleaning);
            });
        if let Some(options) = requested {
            dashboard.clean(&options, &self.dispatcher);
            self.pending += 1;
        }
    }

    /// Move event-handler notices into the toast list
    fn flush_notices(&mut self) {
        for (kind, title, message) in self.notices.lock().drain(..) {
            self.toasts.push(kind, title, message, std::time::Instant::now());
        }
    }
}

fn subscribe_notices(events: &EventBus, notices: &Arc<Mutex<Vec<Notice>>>) {
    let sink = notices.clone();
    events.on::<ExportFailed, _>(move |e| {
        sink.lock().push((
            ToastKind::Error,
            "Export failed".to_string(),
            format!("{}: {}", e.target, e.error),
        ));
    });

    let sink = notices.clone();
    events.on::<DatasetCleaned, _>(move |e| {
        sink.lock().push((
            ToastKind::Info,
            "Dataset cleaned".to_string(),
            format!("{} → {} rows, re-analysing", e.rows_before, e.rows_after),
        ));
    });

    let sink = notices.clone();
    events.on::<ComparisonStarted, _>(move |e| {
        sink.lock().push((
            ToastKind::Info,
            "Comparison synced".to_string(),
            format!("{} charts share zoom, pan and legend", e.charts.len()),
        ));
    });
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.drain_results();

        egui::TopBottomPanel::top("menu").show(ctx, |ui| self.show_menu(ui));
        egui::SidePanel::left("reports")
            .default_width(220.0)
            .show(ctx, |ui| self.show_report_list(ui));
        self.show_cleaning_panel(ctx);
        egui::CentralPanel::default().show(ctx, |ui| self.show_dashboard(ui));

        self.flush_notices();
        self.toasts.show(ctx);
    }
}
